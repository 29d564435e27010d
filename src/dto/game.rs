use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use crate::{
    dto::{
        format_system_time,
        phase::VisibleGamePhase,
        validation::{validate_column_sum, validate_roster},
    },
    state::{
        board::Column,
        combinations::legal_pairings_for_roll,
        game::{GameState, LogEntry, Participant, Room},
        state_machine::GamePhase,
    },
};

/// Payload used to start a game in a room.
#[derive(Debug, Deserialize, ToSchema)]
pub struct StartGameRequest {
    /// Players in turn order; the first one rolls first.
    pub participants: Vec<ParticipantInput>,
}

impl Validate for StartGameRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Err(e) = validate_roster(&self.participants) {
            errors.add("participants", e);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Player joining a new game.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ParticipantInput {
    /// Identity the player will send in `x-player-id`.
    pub id: Uuid,
    /// Display name used in game logs.
    pub name: String,
}

impl From<ParticipantInput> for Participant {
    fn from(value: ParticipantInput) -> Self {
        Self {
            id: value.id,
            name: value.name.trim().to_string(),
        }
    }
}

/// Pairing picked by the turn holder.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ChooseCombinationRequest {
    /// The two column sums, in any order.
    pub sums: [u8; 2],
}

impl Validate for ChooseCombinationRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        for sum in self.sums {
            if let Err(e) = validate_column_sum(sum) {
                errors.add("sums", e);
                break;
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Result of a roll.
#[derive(Debug, Serialize, ToSchema)]
pub struct RollResponse {
    /// The four dice.
    pub dice_values: [u8; 4],
    /// Distinct pairings the player may choose from. Empty on a bust.
    pub legal_pairings: Vec<[u8; 2]>,
    /// False when the roll busted and the turn passed.
    pub can_continue: bool,
    /// New turn holder after a bust.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_player_id: Option<Uuid>,
}

/// Acknowledgement of choose and continue.
#[derive(Debug, Serialize, ToSchema)]
pub struct ActionResponse {
    /// Phase the game moved to.
    pub phase: VisibleGamePhase,
    /// Columns completed by this action.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub completed_columns: Vec<u8>,
}

/// Result of stopping.
#[derive(Debug, Serialize, ToSchema)]
pub struct StopResponse {
    /// Whether the stop won the game.
    pub game_ended: bool,
    /// Winner when the game ended.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winner: Option<Uuid>,
    /// New turn holder when the game goes on.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_player_id: Option<Uuid>,
    /// Columns completed while banking.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub completed_columns: Vec<u8>,
}

/// Full snapshot of a room's game.
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct GameStateView {
    pub room_id: Uuid,
    pub participants: Vec<ParticipantView>,
    pub current_turn_user_id: Uuid,
    pub turn_number: u32,
    pub phase: VisibleGamePhase,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winner: Option<Uuid>,
    /// All eleven columns, ascending.
    pub columns: Vec<ColumnView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dice_values: Option<[u8; 4]>,
    /// Choices open to the turn holder while choosing.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub legal_pairings: Vec<[u8; 2]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_combination: Option<[u8; 2]>,
    pub logs: Vec<LogEntryView>,
    pub started_at: String,
    pub updated_at: String,
    /// Storage revision of this snapshot.
    pub version: u64,
}

#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct ParticipantView {
    pub id: Uuid,
    pub name: String,
}

/// One column of the board.
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct ColumnView {
    pub column: u8,
    pub height: u8,
    /// Banked progress, only for players who moved.
    pub progress: Vec<ProgressView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_by: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temp_marker: Option<TempMarkerView>,
}

#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct ProgressView {
    pub player_id: Uuid,
    pub steps: u8,
}

/// Marker of the current turn. `position` is where it stands on the column.
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct TempMarkerView {
    pub player_id: Uuid,
    pub position: u8,
}

#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct LogEntryView {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player_id: Option<Uuid>,
    pub at: String,
}

impl From<LogEntry> for LogEntryView {
    fn from(value: LogEntry) -> Self {
        Self {
            message: value.message,
            player_id: value.player_id,
            at: format_system_time(value.at),
        }
    }
}

impl From<(&Room, GameState)> for GameStateView {
    fn from((room, state): (&Room, GameState)) -> Self {
        let data = &state.game_data;

        let columns = Column::all()
            .map(|column| ColumnView {
                column: column.number(),
                height: column.height(),
                progress: data
                    .columns
                    .get(&column)
                    .map(|players| {
                        players
                            .iter()
                            .filter(|(_, steps)| **steps > 0)
                            .map(|(player_id, steps)| ProgressView {
                                player_id: *player_id,
                                steps: *steps,
                            })
                            .collect()
                    })
                    .unwrap_or_default(),
                completed_by: data.completed_columns.get(&column).copied(),
                temp_marker: data.temp_markers.get(&column).map(|marker| TempMarkerView {
                    player_id: marker.player,
                    position: data
                        .effective_progress(column, marker.player)
                        .min(column.height()),
                }),
            })
            .collect();

        let legal_pairings = match (state.phase, data.dice_values) {
            (GamePhase::Choosing, Some(dice)) => {
                legal_pairings_for_roll(dice, data, state.current_turn_user_id)
                    .into_iter()
                    .map(|pairing| pairing.sums())
                    .collect()
            }
            _ => Vec::new(),
        };

        Self {
            room_id: state.room_id,
            participants: room
                .participants
                .values()
                .map(|participant| ParticipantView {
                    id: participant.id,
                    name: participant.name.clone(),
                })
                .collect(),
            current_turn_user_id: state.current_turn_user_id,
            turn_number: state.turn_number,
            phase: state.phase.into(),
            winner: state.winner,
            columns,
            dice_values: data.dice_values.map(|dice| dice.faces()),
            legal_pairings,
            selected_combination: data.selected_combination.map(|pairing| pairing.sums()),
            logs: state
                .game_data
                .logs
                .iter()
                .cloned()
                .map(Into::into)
                .collect(),
            started_at: format_system_time(state.started_at),
            updated_at: format_system_time(state.updated_at),
            version: state.version,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::SystemTime;

    use indexmap::IndexMap;

    use super::*;
    use crate::state::{dice::Dice, game::RoomStatus};

    #[test]
    fn snapshot_lists_every_column_and_the_open_choices() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let now = SystemTime::now();
        let participants: IndexMap<_, _> = [(a, "Ada"), (b, "Bob")]
            .into_iter()
            .map(|(id, name)| {
                (
                    id,
                    Participant {
                        id,
                        name: name.into(),
                    },
                )
            })
            .collect();
        let room = Room {
            id: Uuid::new_v4(),
            participants,
            status: RoomStatus::Playing,
            created_at: now,
            updated_at: now,
        };
        let mut state = GameState::new(room.id, a, now);
        state.phase = GamePhase::Choosing;
        state.game_data.dice_values = Some(Dice::new([3, 3, 4, 4]).unwrap());

        let view = GameStateView::from((&room, state));
        assert_eq!(view.columns.len(), 11);
        assert_eq!(view.columns[5].column, 7);
        assert_eq!(view.columns[5].height, 13);
        assert_eq!(view.legal_pairings, vec![[6, 8], [7, 7]]);
        assert_eq!(view.participants.len(), 2);
        assert_eq!(view.phase, VisibleGamePhase::Choosing);
    }

    #[test]
    fn choose_request_rejects_off_board_sums() {
        assert!(ChooseCombinationRequest { sums: [7, 7] }.validate().is_ok());
        assert!(ChooseCombinationRequest { sums: [1, 7] }.validate().is_err());
        assert!(ChooseCombinationRequest { sums: [7, 13] }.validate().is_err());
    }
}

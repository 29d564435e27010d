use std::{collections::BTreeMap, time::SystemTime};

use indexmap::IndexMap;
use thiserror::Error;
use uuid::Uuid;

use crate::{
    dao::models::{
        ColumnProgressEntity, CompletedColumnEntity, GameDataEntity, GamePhaseEntity,
        GameStateEntity, LogEntryEntity, ParticipantEntity, RoomEntity, RoomStatusEntity,
        TempMarkerEntity,
    },
    state::{
        board::{Column, InvalidColumn},
        combinations::Pairing,
        dice::{Dice, InvalidDie},
        state_machine::GamePhase,
    },
};

/// Identifier of a player, as resolved by the identity provider.
pub type PlayerId = Uuid;
/// Identifier of a persistent room.
pub type RoomId = Uuid;

/// Player seated in a room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    /// Stable player identifier.
    pub id: PlayerId,
    /// Display name used in game logs.
    pub name: String,
}

/// Lifecycle of a room as far as the rules engine is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomStatus {
    /// Players are gathering; no game data exists yet.
    Waiting,
    /// A game is in progress.
    Playing,
    /// The last game ended with a winner.
    Finished,
}

/// Persistent room with its participants in join order.
#[derive(Debug, Clone)]
pub struct Room {
    /// Primary key of the room.
    pub id: RoomId,
    /// Participants keyed by id, iterated in join order.
    pub participants: IndexMap<PlayerId, Participant>,
    /// Current lifecycle status.
    pub status: RoomStatus,
    /// Creation timestamp.
    pub created_at: SystemTime,
    /// Last time the room record changed.
    pub updated_at: SystemTime,
}

impl Room {
    /// Participant ids in join order.
    pub fn turn_order(&self) -> Vec<PlayerId> {
        self.participants.keys().copied().collect()
    }
}

/// Provisional climb held by the turn holder on one column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TempMarker {
    /// Player holding the marker.
    pub player: PlayerId,
    /// Steps climbed on top of the player's banked progress this turn.
    pub steps: u8,
}

/// Human readable event appended to the game log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    /// Text shown to players.
    pub message: String,
    /// Player the event is attributed to, if any.
    pub player_id: Option<PlayerId>,
    /// When the event happened.
    pub at: SystemTime,
}

/// Mutable board payload of a game.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GameData {
    /// Banked progress per column and player.
    pub columns: BTreeMap<Column, BTreeMap<PlayerId, u8>>,
    /// Provisional markers of the turn holder, at most three.
    pub temp_markers: BTreeMap<Column, TempMarker>,
    /// Columns closed for good and who closed them.
    pub completed_columns: BTreeMap<Column, PlayerId>,
    /// Dice of the pending roll.
    pub dice_values: Option<Dice>,
    /// Append-only event log.
    pub logs: Vec<LogEntry>,
    /// Pairing chosen this roll and not yet applied.
    pub selected_combination: Option<Pairing>,
}

impl GameData {
    /// Whether the column has been closed.
    pub fn is_completed(&self, column: Column) -> bool {
        self.completed_columns.contains_key(&column)
    }

    /// Whether `player` holds the temp marker on `column`.
    pub fn holds_marker(&self, column: Column, player: PlayerId) -> bool {
        self.temp_markers
            .get(&column)
            .is_some_and(|marker| marker.player == player)
    }

    /// Number of distinct columns carrying a temp marker.
    pub fn marker_count(&self) -> usize {
        self.temp_markers.len()
    }

    /// Banked progress of `player` on `column`.
    pub fn progress(&self, column: Column, player: PlayerId) -> u8 {
        self.columns
            .get(&column)
            .and_then(|players| players.get(&player))
            .copied()
            .unwrap_or(0)
    }

    /// Banked progress plus the steps climbed this turn.
    pub fn effective_progress(&self, column: Column, player: PlayerId) -> u8 {
        let steps = self
            .temp_markers
            .get(&column)
            .filter(|marker| marker.player == player)
            .map_or(0, |marker| marker.steps);
        self.progress(column, player).saturating_add(steps)
    }

    /// Number of columns `player` has completed.
    pub fn completed_count(&self, player: PlayerId) -> usize {
        self.completed_columns
            .values()
            .filter(|owner| **owner == player)
            .count()
    }

    /// Columns where `player` holds a marker, ascending.
    pub fn marker_columns(&self, player: PlayerId) -> Vec<Column> {
        self.temp_markers
            .iter()
            .filter(|(_, marker)| marker.player == player)
            .map(|(column, _)| *column)
            .collect()
    }

    /// Append a log entry.
    pub fn push_log(&mut self, message: String, player_id: Option<PlayerId>, at: SystemTime) {
        self.logs.push(LogEntry {
            message,
            player_id,
            at,
        });
    }
}

/// Persisted game record for one room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameState {
    /// Room the game belongs to.
    pub room_id: RoomId,
    /// Player allowed to act.
    pub current_turn_user_id: PlayerId,
    /// Turn counter, starting at 1 and bumped whenever the turn passes.
    pub turn_number: u32,
    /// Board payload.
    pub game_data: GameData,
    /// Phase driving which actions are allowed.
    pub phase: GamePhase,
    /// Winner once the game is finished.
    pub winner: Option<PlayerId>,
    /// When the game started.
    pub started_at: SystemTime,
    /// Last committed change.
    pub updated_at: SystemTime,
    /// Storage revision used for compare-and-swap saves.
    pub version: u64,
}

impl GameState {
    /// Fresh game where `first_player` rolls first.
    pub fn new(room_id: RoomId, first_player: PlayerId, now: SystemTime) -> Self {
        Self {
            room_id,
            current_turn_user_id: first_player,
            turn_number: 1,
            game_data: GameData::default(),
            phase: GamePhase::Rolling,
            winner: None,
            started_at: now,
            updated_at: now,
            version: 0,
        }
    }

    /// Whether the game accepts no further actions.
    pub fn is_finished(&self) -> bool {
        matches!(self.phase, GamePhase::Finished)
    }
}

/// Raised when a stored record cannot be turned back into a game.
#[derive(Debug, Error)]
pub enum InvalidRecord {
    /// A stored column number is off the board.
    #[error(transparent)]
    Column(#[from] InvalidColumn),
    /// A stored die face is not between 1 and 6.
    #[error(transparent)]
    Die(#[from] InvalidDie),
    /// Stored progress is higher than the column allows.
    #[error("progress {steps} on column {column} exceeds its height")]
    ProgressOverflow {
        /// Offending column.
        column: Column,
        /// Stored progress.
        steps: u8,
    },
}

impl From<GamePhase> for GamePhaseEntity {
    fn from(value: GamePhase) -> Self {
        match value {
            GamePhase::Rolling => GamePhaseEntity::Rolling,
            GamePhase::Choosing => GamePhaseEntity::Choosing,
            GamePhase::Deciding => GamePhaseEntity::Deciding,
            GamePhase::Finished => GamePhaseEntity::Finished,
        }
    }
}

impl From<GamePhaseEntity> for GamePhase {
    fn from(value: GamePhaseEntity) -> Self {
        match value {
            GamePhaseEntity::Rolling => GamePhase::Rolling,
            GamePhaseEntity::Choosing => GamePhase::Choosing,
            GamePhaseEntity::Deciding => GamePhase::Deciding,
            GamePhaseEntity::Finished => GamePhase::Finished,
        }
    }
}

impl From<LogEntry> for LogEntryEntity {
    fn from(value: LogEntry) -> Self {
        Self {
            message: value.message,
            player_id: value.player_id,
            at: value.at,
        }
    }
}

impl From<LogEntryEntity> for LogEntry {
    fn from(value: LogEntryEntity) -> Self {
        Self {
            message: value.message,
            player_id: value.player_id,
            at: value.at,
        }
    }
}

impl From<GameData> for GameDataEntity {
    fn from(value: GameData) -> Self {
        let columns = value
            .columns
            .into_iter()
            .flat_map(|(column, players)| {
                players
                    .into_iter()
                    .map(move |(player_id, steps)| ColumnProgressEntity {
                        column: column.number(),
                        player_id,
                        steps,
                    })
            })
            .collect();

        let temp_markers = value
            .temp_markers
            .into_iter()
            .map(|(column, marker)| TempMarkerEntity {
                column: column.number(),
                player_id: marker.player,
                steps: marker.steps,
            })
            .collect();

        let completed_columns = value
            .completed_columns
            .into_iter()
            .map(|(column, player_id)| CompletedColumnEntity {
                column: column.number(),
                player_id,
            })
            .collect();

        Self {
            columns,
            temp_markers,
            completed_columns,
            dice_values: value.dice_values.map(|dice| dice.faces()),
            logs: value.logs.into_iter().map(Into::into).collect(),
            selected_combination: value.selected_combination.map(|pairing| pairing.sums()),
        }
    }
}

impl TryFrom<GameDataEntity> for GameData {
    type Error = InvalidRecord;

    fn try_from(value: GameDataEntity) -> Result<Self, Self::Error> {
        let mut columns: BTreeMap<Column, BTreeMap<PlayerId, u8>> = BTreeMap::new();
        for entry in value.columns {
            let column = Column::new(entry.column)?;
            if entry.steps > column.height() {
                return Err(InvalidRecord::ProgressOverflow {
                    column,
                    steps: entry.steps,
                });
            }
            columns
                .entry(column)
                .or_default()
                .insert(entry.player_id, entry.steps);
        }

        let temp_markers = value
            .temp_markers
            .into_iter()
            .map(|entry| {
                Ok((
                    Column::new(entry.column)?,
                    TempMarker {
                        player: entry.player_id,
                        steps: entry.steps,
                    },
                ))
            })
            .collect::<Result<BTreeMap<_, _>, InvalidRecord>>()?;

        let completed_columns = value
            .completed_columns
            .into_iter()
            .map(|entry| Ok((Column::new(entry.column)?, entry.player_id)))
            .collect::<Result<BTreeMap<_, _>, InvalidRecord>>()?;

        let dice_values = value.dice_values.map(Dice::new).transpose()?;
        let selected_combination = value
            .selected_combination
            .map(|[a, b]| Pairing::from_sums(a, b))
            .transpose()?;

        Ok(Self {
            columns,
            temp_markers,
            completed_columns,
            dice_values,
            logs: value.logs.into_iter().map(Into::into).collect(),
            selected_combination,
        })
    }
}

impl From<GameState> for GameStateEntity {
    fn from(value: GameState) -> Self {
        Self {
            room_id: value.room_id,
            current_turn_user_id: value.current_turn_user_id,
            turn_number: value.turn_number,
            game_data: value.game_data.into(),
            phase: value.phase.into(),
            winner: value.winner,
            started_at: value.started_at,
            updated_at: value.updated_at,
            version: value.version,
        }
    }
}

impl TryFrom<GameStateEntity> for GameState {
    type Error = InvalidRecord;

    fn try_from(value: GameStateEntity) -> Result<Self, Self::Error> {
        Ok(Self {
            room_id: value.room_id,
            current_turn_user_id: value.current_turn_user_id,
            turn_number: value.turn_number,
            game_data: value.game_data.try_into()?,
            phase: value.phase.into(),
            winner: value.winner,
            started_at: value.started_at,
            updated_at: value.updated_at,
            version: value.version,
        })
    }
}

impl From<ParticipantEntity> for Participant {
    fn from(value: ParticipantEntity) -> Self {
        Self {
            id: value.id,
            name: value.name,
        }
    }
}

impl From<Participant> for ParticipantEntity {
    fn from(value: Participant) -> Self {
        Self {
            id: value.id,
            name: value.name,
        }
    }
}

impl From<RoomStatusEntity> for RoomStatus {
    fn from(value: RoomStatusEntity) -> Self {
        match value {
            RoomStatusEntity::Waiting => RoomStatus::Waiting,
            RoomStatusEntity::Playing => RoomStatus::Playing,
            RoomStatusEntity::Finished => RoomStatus::Finished,
        }
    }
}

impl From<RoomStatus> for RoomStatusEntity {
    fn from(value: RoomStatus) -> Self {
        match value {
            RoomStatus::Waiting => RoomStatusEntity::Waiting,
            RoomStatus::Playing => RoomStatusEntity::Playing,
            RoomStatus::Finished => RoomStatusEntity::Finished,
        }
    }
}

impl From<RoomEntity> for Room {
    fn from(value: RoomEntity) -> Self {
        Self {
            id: value.id,
            participants: value
                .participants
                .into_iter()
                .map(|participant| (participant.id, participant.into()))
                .collect(),
            status: value.status.into(),
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

impl From<Room> for RoomEntity {
    fn from(value: Room) -> Self {
        Self {
            id: value.id,
            participants: value.participants.into_values().map(Into::into).collect(),
            status: value.status.into(),
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

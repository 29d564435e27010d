use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use uuid::Uuid;

/// Player seated in a room, in the shape stored by every backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParticipantEntity {
    /// Stable player identifier.
    pub id: Uuid,
    /// Display name used in game logs.
    pub name: String,
}

/// Room lifecycle status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RoomStatusEntity {
    /// Waiting for a game to start.
    Waiting,
    /// A game is in progress.
    Playing,
    /// The last game has a winner.
    Finished,
}

/// Room record holding the participants in join order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoomEntity {
    /// Primary key of the room.
    pub id: Uuid,
    /// Participants in join order; this order drives turn rotation.
    pub participants: Vec<ParticipantEntity>,
    /// Current lifecycle status.
    pub status: RoomStatusEntity,
    /// Creation timestamp for auditing/debugging.
    pub created_at: SystemTime,
    /// Last time the room record was updated.
    pub updated_at: SystemTime,
}

/// Banked progress of one player on one column.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ColumnProgressEntity {
    /// Column number (2..=12).
    pub column: u8,
    /// Player owning the progress.
    pub player_id: Uuid,
    /// Steps banked so far.
    pub steps: u8,
}

/// Provisional marker of the turn holder.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TempMarkerEntity {
    /// Column number (2..=12).
    pub column: u8,
    /// Player holding the marker.
    pub player_id: Uuid,
    /// Steps climbed this turn.
    pub steps: u8,
}

/// Column closed by a player.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CompletedColumnEntity {
    /// Column number (2..=12).
    pub column: u8,
    /// Player who completed it.
    pub player_id: Uuid,
}

/// Stored game log line.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LogEntryEntity {
    /// Text shown to players.
    pub message: String,
    /// Player the entry is attributed to.
    pub player_id: Option<Uuid>,
    /// When the event happened.
    pub at: SystemTime,
}

/// Board payload flattened into lists so every backend can store it as-is.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameDataEntity {
    /// Banked progress entries.
    pub columns: Vec<ColumnProgressEntity>,
    /// Markers of the current turn.
    pub temp_markers: Vec<TempMarkerEntity>,
    /// Closed columns.
    pub completed_columns: Vec<CompletedColumnEntity>,
    /// Dice of the pending roll.
    pub dice_values: Option<[u8; 4]>,
    /// Event log.
    pub logs: Vec<LogEntryEntity>,
    /// Staged pairing sums.
    pub selected_combination: Option<[u8; 2]>,
}

/// Game phase as stored.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GamePhaseEntity {
    /// Waiting for the turn holder to roll.
    Rolling,
    /// Waiting for a pairing to be chosen.
    Choosing,
    /// Waiting for continue or stop.
    Deciding,
    /// Game over.
    Finished,
}

/// Aggregate game record, one per room.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameStateEntity {
    /// Room the game belongs to (also the record key).
    pub room_id: Uuid,
    /// Player allowed to act.
    pub current_turn_user_id: Uuid,
    /// Turn counter.
    pub turn_number: u32,
    /// Board payload.
    pub game_data: GameDataEntity,
    /// Current phase.
    pub phase: GamePhaseEntity,
    /// Winner once finished.
    pub winner: Option<Uuid>,
    /// When the game started.
    pub started_at: SystemTime,
    /// Last time the game record was updated.
    pub updated_at: SystemTime,
    /// Revision checked by compare-and-swap saves.
    pub version: u64,
}

/// Cumulative win counter of a player in a room.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WinEntity {
    /// Room the counter belongs to.
    pub room_id: Uuid,
    /// Player the counter belongs to.
    pub player_id: Uuid,
    /// Games won in this room.
    pub wins: u32,
}

/// Immutable record of a finished game.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HistoryEntity {
    /// Primary key of the record.
    pub id: Uuid,
    /// Room the game was played in.
    pub room_id: Uuid,
    /// Player who won.
    pub winner_id: Uuid,
    /// Everyone who played, in join order.
    pub participant_ids: Vec<Uuid>,
    /// Wall-clock duration of the game.
    pub duration_seconds: u64,
    /// When the game ended.
    pub finished_at: SystemTime,
}

use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    dao::models::{HistoryEntity, WinEntity},
    dto::format_system_time,
};

/// Cumulative wins of one player in a room.
#[derive(Debug, Serialize, ToSchema)]
pub struct WinView {
    pub player_id: Uuid,
    pub wins: u32,
}

impl From<WinEntity> for WinView {
    fn from(value: WinEntity) -> Self {
        Self {
            player_id: value.player_id,
            wins: value.wins,
        }
    }
}

/// One finished game.
#[derive(Debug, Serialize, ToSchema)]
pub struct HistoryView {
    pub id: Uuid,
    pub winner_id: Uuid,
    /// Players in join order.
    pub participant_ids: Vec<Uuid>,
    pub duration_seconds: u64,
    /// RFC 3339 timestamp.
    pub finished_at: String,
}

impl From<HistoryEntity> for HistoryView {
    fn from(value: HistoryEntity) -> Self {
        Self {
            id: value.id,
            winner_id: value.winner_id,
            participant_ids: value.participant_ids,
            duration_seconds: value.duration_seconds,
            finished_at: format_system_time(value.finished_at),
        }
    }
}

use serde::Serialize;
use utoipa::ToSchema;

use crate::state::state_machine::GamePhase;

/// Game phase exposed to clients (REST/SSE).
#[derive(Debug, Serialize, ToSchema, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VisibleGamePhase {
    /// The turn holder must roll.
    Rolling,
    /// The turn holder must pick one of the legal pairings.
    Choosing,
    /// The turn holder must continue or stop.
    Deciding,
    /// The game has a winner.
    Finished,
}

impl From<GamePhase> for VisibleGamePhase {
    fn from(value: GamePhase) -> Self {
        match value {
            GamePhase::Rolling => VisibleGamePhase::Rolling,
            GamePhase::Choosing => VisibleGamePhase::Choosing,
            GamePhase::Deciding => VisibleGamePhase::Deciding,
            GamePhase::Finished => VisibleGamePhase::Finished,
        }
    }
}

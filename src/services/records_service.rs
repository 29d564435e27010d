use std::{sync::Arc, time::SystemTime};

use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    dao::{game_store::GameStore, models::HistoryEntity},
    dto::records::{HistoryView, WinView},
    error::ServiceError,
    state::{
        SharedState,
        game::{GameState, Room, RoomId, RoomStatus},
    },
};

/// Record a finished game: bump the winner's counter, append the history entry
/// and mark the room finished.
///
/// Runs after the finished state is committed. Every failure is logged and
/// swallowed; the game itself stays finished either way.
pub async fn record_victory(state: &SharedState, room: &Room, game: &GameState) {
    let Some(winner_id) = game.winner else {
        warn!(room_id = %room.id, "finished game has no winner; nothing to record");
        return;
    };
    let store = match state.require_game_store().await {
        Ok(store) => store,
        Err(err) => {
            warn!(room_id = %room.id, error = %err, "cannot record victory");
            return;
        }
    };

    if let Err(err) = store.record_win(room.id, winner_id).await {
        warn!(room_id = %room.id, winner_id = %winner_id, error = %err, "failed to record win");
    }

    let entry = history_entry(room, game, winner_id);
    if let Err(err) = store.record_history(entry).await {
        warn!(room_id = %room.id, error = %err, "failed to record game history");
    }

    mark_room_finished(&store, room, game.updated_at).await;
    info!(room_id = %room.id, winner_id = %winner_id, "victory recorded");
}

fn history_entry(room: &Room, game: &GameState, winner_id: Uuid) -> HistoryEntity {
    let duration_seconds = game
        .updated_at
        .duration_since(game.started_at)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or(0);

    HistoryEntity {
        id: Uuid::new_v4(),
        room_id: room.id,
        winner_id,
        participant_ids: room.turn_order(),
        duration_seconds,
        finished_at: game.updated_at,
    }
}

async fn mark_room_finished(store: &Arc<dyn GameStore>, room: &Room, at: SystemTime) {
    let mut finished = room.clone();
    finished.status = RoomStatus::Finished;
    finished.updated_at = at;
    if let Err(err) = store.save_room(finished.into()).await {
        warn!(room_id = %room.id, error = %err, "failed to mark room finished");
    }
}

/// Win counters of a room, most wins first.
pub async fn list_wins(state: &SharedState, room_id: RoomId) -> Result<Vec<WinView>, ServiceError> {
    let store = state.require_game_store().await?;
    let mut wins = store.list_wins(room_id).await?;
    wins.sort_by(|a, b| b.wins.cmp(&a.wins));
    Ok(wins.into_iter().map(Into::into).collect())
}

/// Finished games of a room, oldest first.
pub async fn list_history(
    state: &SharedState,
    room_id: RoomId,
) -> Result<Vec<HistoryView>, ServiceError> {
    let store = state.require_game_store().await?;
    let history = store.list_history(room_id).await?;
    Ok(history.into_iter().map(Into::into).collect())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::state::game::Participant;

    #[test]
    fn history_keeps_join_order_and_elapsed_seconds() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let start = SystemTime::now();
        let room = Room {
            id: Uuid::new_v4(),
            participants: [a, b]
                .into_iter()
                .map(|id| {
                    (
                        id,
                        Participant {
                            id,
                            name: id.to_string(),
                        },
                    )
                })
                .collect(),
            status: RoomStatus::Playing,
            created_at: start,
            updated_at: start,
        };
        let mut game = GameState::new(room.id, a, start);
        game.updated_at = start + Duration::from_secs(95);

        let entry = history_entry(&room, &game, b);
        assert_eq!(entry.participant_ids, vec![a, b]);
        assert_eq!(entry.winner_id, b);
        assert_eq!(entry.duration_seconds, 95);
        assert_eq!(entry.finished_at, game.updated_at);
    }
}

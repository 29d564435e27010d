use serde::Serialize;
use tracing::warn;

use crate::{
    dto::{
        game::GameStateView,
        sse::{GameFinishedEvent, ServerEvent},
    },
    state::{
        SharedState,
        game::{GameState, PlayerId, Room, RoomId},
    },
};

const EVENT_GAME_STATE: &str = "game.state";
const EVENT_GAME_FINISHED: &str = "game.finished";

/// Broadcast the full snapshot of a room's game after a committed write.
pub fn broadcast_game_state(state: &SharedState, room: &Room, game: &GameState) {
    if state.existing_room_sse(room.id).is_none() {
        return;
    }
    let view = GameStateView::from((room, game.clone()));
    send_room_event(state, room.id, EVENT_GAME_STATE, &view);
}

/// Broadcast that a stop won the game.
pub fn broadcast_game_finished(state: &SharedState, room_id: RoomId, winner_id: PlayerId) {
    let payload = GameFinishedEvent { room_id, winner_id };
    send_room_event(state, room_id, EVENT_GAME_FINISHED, &payload);
}

fn send_room_event(state: &SharedState, room_id: RoomId, event: &str, payload: &impl Serialize) {
    let Some(hub) = state.existing_room_sse(room_id) else {
        return;
    };
    match ServerEvent::json(Some(event.to_string()), payload) {
        Ok(event) => hub.broadcast(event),
        Err(err) => warn!(event, room_id = %room_id, error = %err, "failed to serialize room SSE payload"),
    }
}

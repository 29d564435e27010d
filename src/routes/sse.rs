use std::convert::Infallible;

use axum::{
    Router,
    extract::{Path, State},
    response::sse::{Event, Sse},
    routing::get,
};
use futures::Stream;
use tracing::info;
use uuid::Uuid;

use crate::{services::sse_service, state::SharedState};

#[utoipa::path(
    get,
    path = "/rooms/{room_id}/events",
    tag = "sse",
    params(("room_id" = Uuid, Path, description = "Room to follow")),
    responses((status = 200, description = "Room SSE stream: `info`, `game.state`, `game.finished`", content_type = "text/event-stream", body = String))
)]
/// Stream the events of one room to connected frontends.
pub async fn room_stream(
    State(state): State<SharedState>,
    Path(room_id): Path<Uuid>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let receiver = sse_service::subscribe_room(&state, room_id);
    info!(room_id = %room_id, "new room SSE connection");
    let degraded = state.is_degraded().await;
    sse_service::broadcast_room_info(&state.room_sse(room_id), room_id, degraded);
    sse_service::to_sse_stream(receiver, state, room_id)
}

/// Configure the SSE endpoints.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/rooms/{room_id}/events", get(room_stream))
}

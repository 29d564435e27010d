use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::records::{HistoryView, WinView},
    error::{AppError, ErrorBody},
    services::records_service,
    state::SharedState,
};

/// Read-only projections of finished games.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/rooms/{room_id}/wins", get(list_wins))
        .route("/rooms/{room_id}/history", get(list_history))
}

/// Win counters of every player who won in the room.
#[utoipa::path(
    get,
    path = "/rooms/{room_id}/wins",
    tag = "records",
    params(("room_id" = Uuid, Path, description = "Room to report on")),
    responses(
        (status = 200, description = "Win counters, most wins first", body = [WinView]),
        (status = 503, description = "Storage unavailable", body = ErrorBody)
    )
)]
pub async fn list_wins(
    State(state): State<SharedState>,
    Path(room_id): Path<Uuid>,
) -> Result<Json<Vec<WinView>>, AppError> {
    Ok(Json(records_service::list_wins(&state, room_id).await?))
}

/// Finished games of the room.
#[utoipa::path(
    get,
    path = "/rooms/{room_id}/history",
    tag = "records",
    params(("room_id" = Uuid, Path, description = "Room to report on")),
    responses(
        (status = 200, description = "Finished games, oldest first", body = [HistoryView]),
        (status = 503, description = "Storage unavailable", body = ErrorBody)
    )
)]
pub async fn list_history(
    State(state): State<SharedState>,
    Path(room_id): Path<Uuid>,
) -> Result<Json<Vec<HistoryView>>, AppError> {
    Ok(Json(records_service::list_history(&state, room_id).await?))
}

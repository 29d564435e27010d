use axum::{
    Json, Router,
    extract::{FromRequestParts, Path, State},
    http::request::Parts,
    routing::post,
};
use axum_valid::Valid;
use uuid::Uuid;

use crate::{
    dto::game::{
        ActionResponse, ChooseCombinationRequest, GameStateView, RollResponse, StartGameRequest,
        StopResponse,
    },
    error::{AppError, ErrorBody},
    services::game_service,
    state::{SharedState, game::PlayerId},
};

/// Header carrying the identity of the acting player.
pub const PLAYER_HEADER: &str = "x-player-id";

/// Acting player, read from the `x-player-id` header.
///
/// The identity provider sits in front of this service; the header is trusted as-is.
#[derive(Debug, Clone, Copy)]
pub struct ActingPlayer(pub PlayerId);

impl<S> FromRequestParts<S> for ActingPlayer
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(PLAYER_HEADER)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized(format!("missing `{PLAYER_HEADER}` header")))?;

        Uuid::parse_str(raw.trim())
            .map(Self)
            .map_err(|_| AppError::Unauthorized(format!("`{PLAYER_HEADER}` is not a valid id")))
    }
}

/// Game start, the four turn actions and the snapshot.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/rooms/{room_id}/game", post(start_game).get(get_game))
        .route("/rooms/{room_id}/game/roll", post(roll))
        .route("/rooms/{room_id}/game/choose", post(choose_combination))
        .route("/rooms/{room_id}/game/continue", post(continue_turn))
        .route("/rooms/{room_id}/game/stop", post(stop))
}

/// Start a game with an ordered participant list; the first participant rolls first.
#[utoipa::path(
    post,
    path = "/rooms/{room_id}/game",
    tag = "game",
    params(("room_id" = Uuid, Path, description = "Room to start the game in")),
    request_body = StartGameRequest,
    responses(
        (status = 200, description = "Game started", body = GameStateView),
        (status = 400, description = "Invalid participant list"),
        (status = 409, description = "A game is already in progress", body = ErrorBody),
        (status = 503, description = "Storage unavailable", body = ErrorBody)
    )
)]
pub async fn start_game(
    State(state): State<SharedState>,
    Path(room_id): Path<Uuid>,
    Valid(Json(payload)): Valid<Json<StartGameRequest>>,
) -> Result<Json<GameStateView>, AppError> {
    let view = game_service::start_game(&state, room_id, payload).await?;
    Ok(Json(view))
}

/// Current snapshot of the room's game.
#[utoipa::path(
    get,
    path = "/rooms/{room_id}/game",
    tag = "game",
    params(("room_id" = Uuid, Path, description = "Room of the game")),
    responses(
        (status = 200, description = "Game snapshot", body = GameStateView),
        (status = 404, description = "No game in this room", body = ErrorBody)
    )
)]
pub async fn get_game(
    State(state): State<SharedState>,
    Path(room_id): Path<Uuid>,
) -> Result<Json<GameStateView>, AppError> {
    Ok(Json(game_service::snapshot(&state, room_id).await?))
}

/// Throw the four dice.
#[utoipa::path(
    post,
    path = "/rooms/{room_id}/game/roll",
    tag = "game",
    params(
        ("room_id" = Uuid, Path, description = "Room of the game"),
        ("x-player-id" = Uuid, Header, description = "Acting player")
    ),
    responses(
        (status = 200, description = "Dice rolled; `can_continue` is false on a bust", body = RollResponse),
        (status = 403, description = "Not your turn", body = ErrorBody),
        (status = 409, description = "Rolling is not allowed now", body = ErrorBody)
    )
)]
pub async fn roll(
    State(state): State<SharedState>,
    Path(room_id): Path<Uuid>,
    ActingPlayer(actor): ActingPlayer,
) -> Result<Json<RollResponse>, AppError> {
    Ok(Json(game_service::roll(&state, room_id, actor).await?))
}

/// Stage one of the legal pairings of the current roll.
#[utoipa::path(
    post,
    path = "/rooms/{room_id}/game/choose",
    tag = "game",
    params(
        ("room_id" = Uuid, Path, description = "Room of the game"),
        ("x-player-id" = Uuid, Header, description = "Acting player")
    ),
    request_body = ChooseCombinationRequest,
    responses(
        (status = 200, description = "Pairing staged", body = ActionResponse),
        (status = 403, description = "Not your turn", body = ErrorBody),
        (status = 409, description = "Choosing is not allowed now", body = ErrorBody),
        (status = 422, description = "Pairing is not legal for this roll", body = ErrorBody)
    )
)]
pub async fn choose_combination(
    State(state): State<SharedState>,
    Path(room_id): Path<Uuid>,
    ActingPlayer(actor): ActingPlayer,
    Valid(Json(payload)): Valid<Json<ChooseCombinationRequest>>,
) -> Result<Json<ActionResponse>, AppError> {
    let response = game_service::choose_combination(&state, room_id, actor, payload).await?;
    Ok(Json(response))
}

/// Apply the staged pairing and roll again later.
#[utoipa::path(
    post,
    path = "/rooms/{room_id}/game/continue",
    tag = "game",
    params(
        ("room_id" = Uuid, Path, description = "Room of the game"),
        ("x-player-id" = Uuid, Header, description = "Acting player")
    ),
    responses(
        (status = 200, description = "Climb applied", body = ActionResponse),
        (status = 403, description = "Not your turn", body = ErrorBody),
        (status = 409, description = "Nothing staged or wrong phase", body = ErrorBody)
    )
)]
pub async fn continue_turn(
    State(state): State<SharedState>,
    Path(room_id): Path<Uuid>,
    ActingPlayer(actor): ActingPlayer,
) -> Result<Json<ActionResponse>, AppError> {
    Ok(Json(
        game_service::continue_turn(&state, room_id, actor).await?,
    ))
}

/// Bank the turn's climbs and pass the dice.
#[utoipa::path(
    post,
    path = "/rooms/{room_id}/game/stop",
    tag = "game",
    params(
        ("room_id" = Uuid, Path, description = "Room of the game"),
        ("x-player-id" = Uuid, Header, description = "Acting player")
    ),
    responses(
        (status = 200, description = "Turn banked, or game won", body = StopResponse),
        (status = 403, description = "Not your turn", body = ErrorBody),
        (status = 409, description = "Nothing to bank or wrong phase", body = ErrorBody)
    )
)]
pub async fn stop(
    State(state): State<SharedState>,
    Path(room_id): Path<Uuid>,
    ActingPlayer(actor): ActingPlayer,
) -> Result<Json<StopResponse>, AppError> {
    Ok(Json(game_service::stop(&state, room_id, actor).await?))
}

use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the Can't Stop backend.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::sse::room_stream,
        crate::routes::game::start_game,
        crate::routes::game::get_game,
        crate::routes::game::roll,
        crate::routes::game::choose_combination,
        crate::routes::game::continue_turn,
        crate::routes::game::stop,
        crate::routes::records::list_wins,
        crate::routes::records::list_history,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::sse::Handshake,
            crate::dto::sse::GameFinishedEvent,
            crate::dto::game::StartGameRequest,
            crate::dto::game::ParticipantInput,
            crate::dto::game::ChooseCombinationRequest,
            crate::dto::game::RollResponse,
            crate::dto::game::ActionResponse,
            crate::dto::game::StopResponse,
            crate::dto::game::GameStateView,
            crate::dto::records::WinView,
            crate::dto::records::HistoryView,
            crate::error::ErrorBody,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "sse", description = "Server-sent events streams"),
        (name = "game", description = "Game start, turn actions and snapshots"),
        (name = "records", description = "Win counters and finished games"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_game_route_is_documented() {
        let doc = ApiDoc::openapi();
        for path in [
            "/rooms/{room_id}/game",
            "/rooms/{room_id}/game/roll",
            "/rooms/{room_id}/game/choose",
            "/rooms/{room_id}/game/continue",
            "/rooms/{room_id}/game/stop",
            "/rooms/{room_id}/events",
        ] {
            assert!(doc.paths.paths.contains_key(path), "{path} missing");
        }
    }
}

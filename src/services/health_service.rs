use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Probe the storage backend and report `ok` or `degraded`.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    let store = match state.require_game_store().await {
        Ok(store) => store,
        Err(err) => {
            warn!(error = %err, "health probe without storage");
            return HealthResponse::degraded(None);
        }
    };

    if let Err(err) = store.health_check().await {
        warn!(error = %err, "storage health check failed");
        return HealthResponse::degraded(Some(err.to_string()));
    }

    if state.is_degraded().await {
        HealthResponse::degraded(None)
    } else {
        HealthResponse::ok()
    }
}

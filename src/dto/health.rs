use serde::Serialize;
use utoipa::ToSchema;

/// Simple health response returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Health status ("ok" or "degraded").
    pub status: String,
    /// Last storage failure seen by the probe, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_error: Option<String>,
}

impl HealthResponse {
    /// Storage reachable.
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            storage_error: None,
        }
    }

    /// Running without usable storage.
    pub fn degraded(storage_error: Option<String>) -> Self {
        Self {
            status: "degraded".to_string(),
            storage_error,
        }
    }
}

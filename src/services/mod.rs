/// OpenAPI documentation generation.
pub mod documentation;
/// Game start, player actions and snapshots.
pub mod game_service;
/// Health check service.
pub mod health_service;
/// Win counters and finished-game history.
pub mod records_service;
/// Server-Sent Events message generation.
pub mod sse_events;
/// Server-Sent Events broadcasting service.
pub mod sse_service;
/// Storage connection watchdog driving degraded mode.
pub mod storage_supervisor;

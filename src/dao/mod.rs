/// Persistence backends behind the [`game_store::GameStore`] trait.
pub mod game_store;
/// Records exactly as they are persisted.
pub mod models;
/// Backend-independent storage errors.
pub mod storage;

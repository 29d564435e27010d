#[cfg(feature = "couch-store")]
pub mod couchdb;
pub mod memory;
#[cfg(feature = "mongo-store")]
pub mod mongodb;

use crate::dao::models::{GameStateEntity, HistoryEntity, RoomEntity, WinEntity};
use crate::dao::storage::StorageResult;
use futures::future::BoxFuture;
use uuid::Uuid;

/// Abstraction over the persistence layer for rooms, games and their records.
pub trait GameStore: Send + Sync {
    /// Room with its participants in join order.
    fn load_room(&self, room_id: Uuid) -> BoxFuture<'static, StorageResult<Option<RoomEntity>>>;
    /// Create or replace a room record.
    fn save_room(&self, room: RoomEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Current game record of a room.
    fn load_game_state(
        &self,
        room_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<GameStateEntity>>>;
    /// Compare-and-swap write of a game record.
    ///
    /// With `expected_version` set, the stored record must still carry that version.
    /// With `None`, no record may exist for the room yet. Otherwise the save fails
    /// with [`StorageError::Conflict`](crate::dao::storage::StorageError::Conflict)
    /// and nothing is written.
    fn save_game_state(
        &self,
        state: GameStateEntity,
        expected_version: Option<u64>,
    ) -> BoxFuture<'static, StorageResult<()>>;
    /// Add one win to the player's counter in the room, creating it if needed.
    fn record_win(&self, room_id: Uuid, player_id: Uuid) -> BoxFuture<'static, StorageResult<()>>;
    /// Append an immutable finished-game record.
    fn record_history(&self, entry: HistoryEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Win counters of a room.
    fn list_wins(&self, room_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<WinEntity>>>;
    /// Finished games of a room, oldest first.
    fn list_history(&self, room_id: Uuid)
    -> BoxFuture<'static, StorageResult<Vec<HistoryEntity>>>;
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}

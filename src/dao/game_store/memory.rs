//! In-process store for tests, demos and local runs without a database.

use std::sync::Arc;

use dashmap::{DashMap, mapref::entry::Entry};
use futures::future::BoxFuture;
use uuid::Uuid;

use crate::dao::{
    game_store::GameStore,
    models::{GameStateEntity, HistoryEntity, RoomEntity, WinEntity},
    storage::{StorageError, StorageResult},
};

/// [`GameStore`] keeping every record in concurrent maps.
///
/// Clones share the same data.
#[derive(Clone, Default)]
pub struct MemoryGameStore {
    inner: Arc<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    rooms: DashMap<Uuid, RoomEntity>,
    games: DashMap<Uuid, GameStateEntity>,
    wins: DashMap<Uuid, Vec<WinEntity>>,
    history: DashMap<Uuid, Vec<HistoryEntity>>,
}

impl MemoryGameStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn compare_and_swap(
        &self,
        state: GameStateEntity,
        expected_version: Option<u64>,
    ) -> StorageResult<()> {
        let key = format!("game::{}", state.room_id);
        match (self.inner.games.entry(state.room_id), expected_version) {
            (Entry::Vacant(slot), None) => {
                slot.insert(state);
                Ok(())
            }
            (Entry::Occupied(mut slot), Some(expected)) if slot.get().version == expected => {
                slot.insert(state);
                Ok(())
            }
            _ => Err(StorageError::conflict(key)),
        }
    }

    fn increment_win(&self, room_id: Uuid, player_id: Uuid) {
        let mut wins = self.inner.wins.entry(room_id).or_default();
        match wins.iter_mut().find(|entry| entry.player_id == player_id) {
            Some(entry) => entry.wins += 1,
            None => wins.push(WinEntity {
                room_id,
                player_id,
                wins: 1,
            }),
        }
    }
}

impl GameStore for MemoryGameStore {
    fn load_room(&self, room_id: Uuid) -> BoxFuture<'static, StorageResult<Option<RoomEntity>>> {
        let room = self.inner.rooms.get(&room_id).map(|entry| entry.clone());
        Box::pin(async move { Ok(room) })
    }

    fn save_room(&self, room: RoomEntity) -> BoxFuture<'static, StorageResult<()>> {
        self.inner.rooms.insert(room.id, room);
        Box::pin(async { Ok(()) })
    }

    fn load_game_state(
        &self,
        room_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<GameStateEntity>>> {
        let game = self.inner.games.get(&room_id).map(|entry| entry.clone());
        Box::pin(async move { Ok(game) })
    }

    fn save_game_state(
        &self,
        state: GameStateEntity,
        expected_version: Option<u64>,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let result = self.compare_and_swap(state, expected_version);
        Box::pin(async move { result })
    }

    fn record_win(&self, room_id: Uuid, player_id: Uuid) -> BoxFuture<'static, StorageResult<()>> {
        self.increment_win(room_id, player_id);
        Box::pin(async { Ok(()) })
    }

    fn record_history(&self, entry: HistoryEntity) -> BoxFuture<'static, StorageResult<()>> {
        self.inner
            .history
            .entry(entry.room_id)
            .or_default()
            .push(entry);
        Box::pin(async { Ok(()) })
    }

    fn list_wins(&self, room_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<WinEntity>>> {
        let wins = self
            .inner
            .wins
            .get(&room_id)
            .map(|entry| entry.clone())
            .unwrap_or_default();
        Box::pin(async move { Ok(wins) })
    }

    fn list_history(
        &self,
        room_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<HistoryEntity>>> {
        let history = self
            .inner
            .history
            .get(&room_id)
            .map(|entry| entry.clone())
            .unwrap_or_default();
        Box::pin(async move { Ok(history) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}

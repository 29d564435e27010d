pub mod board;
pub mod combinations;
pub mod dice;
pub mod game;
pub mod rotation;
mod sse;
pub mod state_machine;
pub mod transitions;

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock, watch};

use crate::{
    config::AppConfig,
    dao::game_store::GameStore,
    error::ServiceError,
    state::{
        dice::{DiceRoller, RandomDice},
        game::RoomId,
    },
};

pub use self::sse::SseHub;
use self::sse::SseState;

pub type SharedState = Arc<AppState>;

/// Central application state: storage handle, per-room hubs and gates, dice and config.
pub struct AppState {
    game_store: RwLock<Option<Arc<dyn GameStore>>>,
    sse: SseState,
    room_gates: DashMap<RoomId, Arc<Mutex<()>>>,
    dice: Arc<dyn DiceRoller>,
    config: AppConfig,
    degraded: watch::Sender<bool>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a storage backend is installed.
    pub fn new(config: AppConfig) -> SharedState {
        Self::build(None, Arc::new(RandomDice), config)
    }

    /// State with a store already installed and a chosen dice source.
    pub fn with_components(
        store: Arc<dyn GameStore>,
        dice: Arc<dyn DiceRoller>,
        config: AppConfig,
    ) -> SharedState {
        Self::build(Some(store), dice, config)
    }

    fn build(
        store: Option<Arc<dyn GameStore>>,
        dice: Arc<dyn DiceRoller>,
        config: AppConfig,
    ) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(store.is_none());
        Arc::new(Self {
            game_store: RwLock::new(store),
            sse: SseState::new(config.event_capacity()),
            room_gates: DashMap::new(),
            dice,
            config,
            degraded: degraded_tx,
        })
    }

    /// Obtain a handle to the current game store, if one is installed.
    pub async fn game_store(&self) -> Option<Arc<dyn GameStore>> {
        let guard = self.game_store.read().await;
        guard.as_ref().cloned()
    }

    /// Current game store, or [`ServiceError::Degraded`] when none is installed.
    pub async fn require_game_store(&self) -> Result<Arc<dyn GameStore>, ServiceError> {
        self.game_store().await.ok_or(ServiceError::Degraded)
    }

    /// Install a new game store implementation and leave degraded mode.
    pub async fn set_game_store(&self, store: Arc<dyn GameStore>) {
        {
            let mut guard = self.game_store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false).await;
    }

    /// Current degraded flag.
    pub async fn is_degraded(&self) -> bool {
        if self.game_store.read().await.is_none() {
            return true;
        }
        *self.degraded.borrow()
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Update and broadcast the degraded flag when the value changes.
    pub async fn update_degraded(&self, value: bool) {
        self.degraded.send_if_modified(|current| {
            if *current == value {
                return false;
            }
            *current = value;
            true
        });
    }

    /// Broadcast hub of a room, created on first use.
    pub fn room_sse(&self, room_id: RoomId) -> Arc<SseHub> {
        self.sse.room(room_id)
    }

    /// Broadcast hub of a room if it has ever been subscribed to.
    pub fn existing_room_sse(&self, room_id: RoomId) -> Option<Arc<SseHub>> {
        self.sse.existing(room_id)
    }

    /// Forget an idle room hub.
    pub fn release_room_sse(&self, room_id: RoomId) {
        self.sse.release(room_id);
    }

    /// Hold the in-process gate serialising writes to one room.
    ///
    /// The gate is forgotten when the last holder or waiter lets go.
    pub async fn lock_room(&self, room_id: RoomId) -> RoomGuard<'_> {
        let gate = self.room_gates.entry(room_id).or_default().clone();
        RoomGuard {
            state: self,
            room_id,
            guard: Some(gate.lock_owned().await),
        }
    }

    fn release_room_gate(&self, room_id: RoomId) {
        self.room_gates
            .remove_if(&room_id, |_, gate| Arc::strong_count(gate) == 1);
    }

    /// Source of dice rolls.
    pub fn dice(&self) -> &dyn DiceRoller {
        self.dice.as_ref()
    }

    /// Runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}

/// Exclusive access to one room; see [`AppState::lock_room`].
pub struct RoomGuard<'a> {
    state: &'a AppState,
    room_id: RoomId,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for RoomGuard<'_> {
    fn drop(&mut self) {
        // The owned guard keeps its own handle on the gate.
        drop(self.guard.take());
        self.state.release_room_gate(self.room_id);
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    #[tokio::test]
    async fn room_gates_are_dropped_once_released() {
        let state = AppState::new(AppConfig::default());
        let room = Uuid::new_v4();

        let guard = state.lock_room(room).await;
        assert!(state.room_gates.contains_key(&room));

        drop(guard);
        assert!(state.room_gates.is_empty());
    }

    #[tokio::test]
    async fn a_waiting_writer_keeps_the_gate_alive() {
        let state = AppState::new(AppConfig::default());
        let room = Uuid::new_v4();

        let first = state.lock_room(room).await;
        let waiter = {
            let state = state.clone();
            tokio::spawn(async move {
                let _second = state.lock_room(room).await;
            })
        };
        tokio::task::yield_now().await;

        drop(first);
        assert!(state.room_gates.contains_key(&room));

        waiter.await.unwrap();
        assert!(state.room_gates.is_empty());
    }
}

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::broadcast;

use crate::{dto::sse::ServerEvent, state::game::RoomId};

/// SSE-specific sub-state carved out from [`AppState`](super::AppState): one hub per room.
pub struct SseState {
    rooms: DashMap<RoomId, Arc<SseHub>>,
    capacity: usize,
}

impl SseState {
    /// Hubs created later get a channel of `capacity` events.
    pub fn new(capacity: usize) -> Self {
        Self {
            rooms: DashMap::new(),
            capacity: capacity.max(1),
        }
    }

    /// Hub of `room_id`, created on first use.
    pub fn room(&self, room_id: RoomId) -> Arc<SseHub> {
        self.rooms
            .entry(room_id)
            .or_insert_with(|| Arc::new(SseHub::new(self.capacity)))
            .clone()
    }

    /// Hub of `room_id` if anyone ever subscribed to it.
    pub fn existing(&self, room_id: RoomId) -> Option<Arc<SseHub>> {
        self.rooms.get(&room_id).map(|hub| hub.clone())
    }

    /// Drop the hub of `room_id` once its last subscriber left.
    pub fn release(&self, room_id: RoomId) {
        self.rooms
            .remove_if(&room_id, |_, hub| hub.receiver_count() == 0);
    }
}

/// Simple broadcast hub wrapper used by the SSE services.
pub struct SseHub {
    sender: broadcast::Sender<ServerEvent>,
}

impl SseHub {
    /// Construct a new hub backed by a Tokio broadcast channel with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _receiver) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Register a new subscriber that will receive subsequent events.
    pub fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        self.sender.subscribe()
    }

    /// Send an event to all current subscribers, ignoring delivery errors.
    pub fn broadcast(&self, event: ServerEvent) {
        let _ = self.sender.send(event);
    }

    /// Number of live subscribers.
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    #[test]
    fn rooms_do_not_share_events() {
        let sse = SseState::new(4);
        let (left, right) = (Uuid::new_v4(), Uuid::new_v4());
        let mut left_rx = sse.room(left).subscribe();
        let mut right_rx = sse.room(right).subscribe();

        sse.room(left)
            .broadcast(ServerEvent::new(Some("info".into()), "hello".into()));

        assert_eq!(left_rx.try_recv().unwrap().data, "hello");
        assert!(right_rx.try_recv().is_err());
    }

    #[test]
    fn released_hubs_are_dropped_only_when_idle() {
        let sse = SseState::new(4);
        let room = Uuid::new_v4();
        let receiver = sse.room(room).subscribe();

        sse.release(room);
        assert!(sse.existing(room).is_some());

        drop(receiver);
        sse.release(room);
        assert!(sse.existing(room).is_none());
    }
}

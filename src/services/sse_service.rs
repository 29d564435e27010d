use std::{convert::Infallible, time::Duration};

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use tokio::sync::{
    broadcast::{self, error::RecvError},
    mpsc,
};
use tokio_stream::wrappers::ReceiverStream;
use tracing::{info, warn};

use crate::{
    dto::sse::{Handshake, ServerEvent},
    state::{SharedState, SseHub, game::RoomId},
};

/// Subscribe to the SSE stream of one room.
pub fn subscribe_room(state: &SharedState, room_id: RoomId) -> broadcast::Receiver<ServerEvent> {
    state.room_sse(room_id).subscribe()
}

/// Convert a room receiver into an SSE response, forwarding events and
/// releasing the room hub once its last client disconnects.
pub fn to_sse_stream(
    mut receiver: broadcast::Receiver<ServerEvent>,
    state: SharedState,
    room_id: RoomId,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let (tx, rx) = mpsc::channel::<Result<Event, Infallible>>(8);

    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = tx.closed() => break,
                recv_result = receiver.recv() => {
                    match recv_result {
                        Ok(payload) => {
                            let mut event = Event::default().data(payload.data);
                            if let Some(name) = payload.event {
                                event = event.event(name);
                            }

                            if tx.send(Ok(event)).await.is_err() {
                                break;
                            }
                        }
                        Err(RecvError::Closed) => break,
                        Err(RecvError::Lagged(skipped)) => {
                            // Clients refetch the snapshot on the next game.state anyway.
                            warn!(room_id = %room_id, skipped, "room SSE subscriber lagged");
                        }
                    }
                }
            }
        }

        drop(receiver);
        state.release_room_sse(room_id);
        info!(room_id = %room_id, "room SSE stream disconnected");
    });

    let stream = ReceiverStream::new(rx);
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

/// Greet subscribers of a room with an `info` event.
pub fn broadcast_room_info(hub: &SseHub, room_id: RoomId, degraded: bool) {
    let handshake = Handshake {
        room_id,
        message: "room stream connected".into(),
        degraded,
    };
    match ServerEvent::json(Some("info".to_string()), &handshake) {
        Ok(event) => hub.broadcast(event),
        Err(err) => warn!(room_id = %room_id, error = %err, "failed to serialize SSE handshake"),
    }
}

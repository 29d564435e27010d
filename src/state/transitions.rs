use std::time::SystemTime;

use tracing::{debug, warn};

use crate::{
    dao::storage::StorageError,
    error::ServiceError,
    state::{
        SharedState,
        game::{GameState, PlayerId, Room, RoomId},
        state_machine::{GameAction, Transition, TurnContext, apply_action},
    },
};

/// A transition that made it to storage.
#[derive(Debug, Clone)]
pub struct Committed {
    /// Room the game belongs to, as read for the winning attempt.
    pub room: Room,
    /// The new state together with its outcome. `state.version` is the stored revision.
    pub transition: Transition,
}

/// Apply one player action to a room and persist it with compare-and-swap.
///
/// `action` is asked for a fresh action on every attempt so a roll is redrawn
/// when the previous attempt lost the race. Rule errors are returned as soon as
/// they occur; storage conflicts are retried up to the configured number of
/// attempts before giving up with [`ServiceError::ConcurrentModification`].
pub async fn run_action<F>(
    state: &SharedState,
    room_id: RoomId,
    actor: PlayerId,
    mut action: F,
) -> Result<Committed, ServiceError>
where
    F: FnMut() -> GameAction,
{
    let _gate = state.lock_room(room_id).await;

    let attempts = state.config().save_attempts();
    for attempt in 1..=attempts {
        let (room, current) = load_game(state, room_id).await?;

        let ctx = TurnContext {
            participants: &room.participants,
            now: SystemTime::now(),
        };
        let mut transition = apply_action(&current, actor, action(), &ctx)?;
        transition.state.version = next_version(&current)?;

        let store = state.require_game_store().await?;
        match store
            .save_game_state(transition.state.clone().into(), Some(current.version))
            .await
        {
            Ok(()) => {
                debug!(
                    room_id = %room_id,
                    version = transition.state.version,
                    attempt,
                    "game state committed"
                );
                return Ok(Committed { room, transition });
            }
            Err(StorageError::Conflict { key }) => {
                warn!(
                    room_id = %room_id,
                    attempt,
                    key = %key,
                    "game state changed underneath; retrying"
                );
            }
            Err(err) => return Err(err.into()),
        }
    }

    Err(ServiceError::ConcurrentModification(format!(
        "room `{room_id}` kept changing; gave up after {attempts} attempts"
    )))
}

/// Load the room and its decoded game, failing with `NotFound` when either is missing.
pub async fn load_game(
    state: &SharedState,
    room_id: RoomId,
) -> Result<(Room, GameState), ServiceError> {
    let store = state.require_game_store().await?;

    let Some(room) = store.load_room(room_id).await? else {
        return Err(ServiceError::NotFound(format!("room `{room_id}` not found")));
    };
    let Some(entity) = store.load_game_state(room_id).await? else {
        return Err(ServiceError::NotFound(format!(
            "no game has been started in room `{room_id}`"
        )));
    };

    let game = GameState::try_from(entity)
        .map_err(|source| ServiceError::Corrupted { room_id, source })?;
    Ok((room.into(), game))
}

fn next_version(current: &GameState) -> Result<u64, ServiceError> {
    current.version.checked_add(1).ok_or_else(|| {
        ServiceError::InvalidState(format!(
            "game of room `{}` cannot be updated any further",
            current.room_id
        ))
    })
}

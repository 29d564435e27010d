use std::time::SystemTime;

use tracing::{info, warn};

use crate::{
    dao::models::GamePhaseEntity,
    dto::game::{
        ActionResponse, ChooseCombinationRequest, GameStateView, RollResponse, StartGameRequest,
        StopResponse,
    },
    error::ServiceError,
    services::{records_service, sse_events},
    state::{
        SharedState,
        combinations::Pairing,
        game::{GameState, Participant, PlayerId, Room, RoomId, RoomStatus},
        state_machine::{GameAction, TurnOutcome},
        transitions::{self, Committed},
    },
};

/// Start a game in `room_id` with the given participants in turn order.
///
/// A room whose previous game finished can start a new one; a game still in
/// progress is never replaced.
pub async fn start_game(
    state: &SharedState,
    room_id: RoomId,
    request: StartGameRequest,
) -> Result<GameStateView, ServiceError> {
    let _gate = state.lock_room(room_id).await;

    let store = state.require_game_store().await?;
    let previous = store.load_game_state(room_id).await?;
    if previous
        .as_ref()
        .is_some_and(|game| !matches!(game.phase, GamePhaseEntity::Finished))
    {
        return Err(ServiceError::InvalidState(format!(
            "a game is already in progress in room `{room_id}`"
        )));
    }
    let created_at = store
        .load_room(room_id)
        .await?
        .map(|room| room.created_at);

    let participants: Vec<Participant> = request.participants.into_iter().map(Into::into).collect();
    let Some(first) = participants.first().map(|participant| participant.id) else {
        return Err(ServiceError::InvalidInput(
            "a game needs at least one participant".into(),
        ));
    };

    let now = SystemTime::now();
    let room = Room {
        id: room_id,
        participants: participants
            .into_iter()
            .map(|participant| (participant.id, participant))
            .collect(),
        status: RoomStatus::Playing,
        created_at: created_at.unwrap_or(now),
        updated_at: now,
    };

    let expected_version = previous.as_ref().map(|game| game.version);
    let mut game = GameState::new(room_id, first, now);
    game.version = match expected_version {
        None => 1,
        Some(version) => version.checked_add(1).ok_or_else(|| {
            ServiceError::InvalidState(format!("room `{room_id}` cannot host another game"))
        })?,
    };
    let names: Vec<&str> = room
        .participants
        .values()
        .map(|participant| participant.name.as_str())
        .collect();
    game.game_data
        .push_log(format!("Game started: {}", names.join(", ")), None, now);

    // Room is written only once the game commits.
    store
        .save_game_state(game.clone().into(), expected_version)
        .await?;
    store.save_room(room.clone().into()).await?;

    info!(
        room_id = %room_id,
        participants = room.participants.len(),
        first_player = %first,
        "game started"
    );
    sse_events::broadcast_game_state(state, &room, &game);

    Ok(GameStateView::from((&room, game)))
}

/// Current snapshot of the game in `room_id`.
pub async fn snapshot(state: &SharedState, room_id: RoomId) -> Result<GameStateView, ServiceError> {
    let (room, game) = transitions::load_game(state, room_id).await?;
    Ok(GameStateView::from((&room, game)))
}

/// Throw the dice for the turn holder.
pub async fn roll(
    state: &SharedState,
    room_id: RoomId,
    actor: PlayerId,
) -> Result<RollResponse, ServiceError> {
    let committed = perform_action(state, room_id, actor, || {
        GameAction::Roll(state.dice().roll())
    })
    .await?;

    let outcome = committed.transition.outcome;
    let can_continue = outcome.can_continue();
    match outcome {
        TurnOutcome::Rolled { dice, options } => Ok(RollResponse {
            dice_values: dice.faces(),
            legal_pairings: options.iter().map(Pairing::sums).collect(),
            can_continue,
            next_player_id: None,
        }),
        TurnOutcome::Busted { dice, next_player } => Ok(RollResponse {
            dice_values: dice.faces(),
            legal_pairings: Vec::new(),
            can_continue,
            next_player_id: Some(next_player),
        }),
        other => Err(unexpected(other)),
    }
}

/// Stage one of the legal pairings of the current roll.
pub async fn choose_combination(
    state: &SharedState,
    room_id: RoomId,
    actor: PlayerId,
    request: ChooseCombinationRequest,
) -> Result<ActionResponse, ServiceError> {
    let [a, b] = request.sums;
    let pairing =
        Pairing::from_sums(a, b).map_err(|err| ServiceError::InvalidInput(err.to_string()))?;

    let committed = perform_action(state, room_id, actor, || {
        GameAction::ChooseCombination(pairing)
    })
    .await?;

    Ok(ActionResponse {
        phase: committed.transition.state.phase.into(),
        completed_columns: Vec::new(),
    })
}

/// Apply the staged pairing and keep the turn.
pub async fn continue_turn(
    state: &SharedState,
    room_id: RoomId,
    actor: PlayerId,
) -> Result<ActionResponse, ServiceError> {
    let committed = perform_action(state, room_id, actor, || GameAction::Continue).await?;

    match committed.transition.outcome {
        TurnOutcome::Continued { completed } => Ok(ActionResponse {
            phase: committed.transition.state.phase.into(),
            completed_columns: completed.iter().map(|c| c.number()).collect(),
        }),
        other => Err(unexpected(other)),
    }
}

/// Bank every climb of the turn and pass the dice, or win.
pub async fn stop(
    state: &SharedState,
    room_id: RoomId,
    actor: PlayerId,
) -> Result<StopResponse, ServiceError> {
    let committed = perform_action(state, room_id, actor, || GameAction::Stop).await?;

    match committed.transition.outcome {
        TurnOutcome::Stopped {
            next_player,
            completed,
        } => Ok(StopResponse {
            game_ended: false,
            winner: None,
            next_player_id: Some(next_player),
            completed_columns: completed.iter().map(|c| c.number()).collect(),
        }),
        TurnOutcome::Victory { winner } => Ok(StopResponse {
            game_ended: true,
            winner: Some(winner),
            next_player_id: None,
            completed_columns: Vec::new(),
        }),
        other => Err(unexpected(other)),
    }
}

/// Commit an action, then run the side effects that must never undo it.
async fn perform_action<F>(
    state: &SharedState,
    room_id: RoomId,
    actor: PlayerId,
    action: F,
) -> Result<Committed, ServiceError>
where
    F: FnMut() -> GameAction,
{
    let committed = match transitions::run_action(state, room_id, actor, action).await {
        Ok(committed) => committed,
        Err(err) => {
            info!(room_id = %room_id, player_id = %actor, error = %err, "action rejected");
            return Err(err);
        }
    };

    let Committed { room, transition } = &committed;
    info!(
        room_id = %room_id,
        player_id = %actor,
        phase = %transition.state.phase,
        turn = transition.state.turn_number,
        "action applied"
    );

    if let Some(winner) = transition.outcome.winner() {
        records_service::record_victory(state, room, &transition.state).await;
        sse_events::broadcast_game_finished(state, room_id, winner);
    }
    sse_events::broadcast_game_state(state, room, &transition.state);

    Ok(committed)
}

fn unexpected(outcome: TurnOutcome) -> ServiceError {
    warn!(?outcome, "action produced an unexpected outcome");
    ServiceError::InvalidState(format!("unexpected outcome {outcome:?}"))
}

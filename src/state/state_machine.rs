use std::{fmt, time::SystemTime};

use indexmap::IndexMap;
use thiserror::Error;

use crate::state::{
    board::Column,
    combinations::{Pairing, legal_pairings_for_roll},
    dice::Dice,
    game::{GameData, GameState, Participant, PlayerId, TempMarker},
    rotation::{RotationError, next_player},
};

/// Completed columns a player needs to win.
pub const WINNING_COLUMNS: usize = 3;

/// Phases of a running game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    /// The turn holder must roll.
    Rolling,
    /// Dice are on the table; the turn holder must pick a pairing.
    Choosing,
    /// A pairing is staged; the turn holder continues or stops.
    Deciding,
    /// A player reached the winning column count.
    Finished,
}

impl fmt::Display for GamePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            GamePhase::Rolling => "rolling",
            GamePhase::Choosing => "choosing",
            GamePhase::Deciding => "deciding",
            GamePhase::Finished => "finished",
        };
        f.write_str(label)
    }
}

/// Actions a player can take on their turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameAction {
    /// Throw the dice. The roll itself is drawn by the caller.
    Roll(Dice),
    /// Pick one of the legal pairings of the current roll.
    ChooseCombination(Pairing),
    /// Apply the staged pairing and keep the turn.
    Continue,
    /// Bank every climb of this turn and pass the dice.
    Stop,
}

impl GameAction {
    /// Payload-free discriminant, used in errors and logs.
    pub fn kind(&self) -> ActionKind {
        match self {
            GameAction::Roll(_) => ActionKind::Roll,
            GameAction::ChooseCombination(_) => ActionKind::ChooseCombination,
            GameAction::Continue => ActionKind::Continue,
            GameAction::Stop => ActionKind::Stop,
        }
    }
}

/// Discriminant of [`GameAction`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    /// See [`GameAction::Roll`].
    Roll,
    /// See [`GameAction::ChooseCombination`].
    ChooseCombination,
    /// See [`GameAction::Continue`].
    Continue,
    /// See [`GameAction::Stop`].
    Stop,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ActionKind::Roll => "roll",
            ActionKind::ChooseCombination => "choose combination",
            ActionKind::Continue => "continue",
            ActionKind::Stop => "stop",
        };
        f.write_str(label)
    }
}

/// Reasons an action is rejected. A rejected action never changes the game.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleError {
    /// The acting player does not hold the turn.
    #[error("it is `{expected}`'s turn, not `{actual}`'s")]
    TurnMismatch {
        /// Turn holder.
        expected: PlayerId,
        /// Player who tried to act.
        actual: PlayerId,
    },
    /// The action is not allowed in the current phase.
    #[error("{action} is not allowed while the game is {phase}")]
    PhaseMismatch {
        /// Phase the game is in.
        phase: GamePhase,
        /// Rejected action.
        action: ActionKind,
    },
    /// The pairing is not among the legal pairings of the current roll.
    #[error("pairing {sums:?} is not a legal choice for the current roll")]
    InvalidCombination {
        /// Submitted sums, ascending.
        sums: [u8; 2],
    },
    /// Continue was requested without a staged pairing.
    #[error("no combination has been chosen for this roll")]
    NoStagedCombination,
    /// Stop was requested without any climb to bank.
    #[error("there is no climb to bank this turn")]
    NothingToBank,
    /// Turn order could not be resolved from the participant list.
    #[error(transparent)]
    Rotation(#[from] RotationError),
}

/// What happened as the result of an accepted action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// Dice rolled with at least one legal pairing.
    Rolled {
        /// Rolled dice.
        dice: Dice,
        /// Distinct legal pairings.
        options: Vec<Pairing>,
    },
    /// Dice rolled without any legal pairing; the turn passed.
    Busted {
        /// Rolled dice.
        dice: Dice,
        /// New turn holder.
        next_player: PlayerId,
    },
    /// A pairing was staged.
    Chose {
        /// Staged pairing.
        pairing: Pairing,
    },
    /// The staged pairing was applied; the same player rolls again.
    Continued {
        /// Columns completed by this climb.
        completed: Vec<Column>,
    },
    /// Climbs were banked and the turn passed.
    Stopped {
        /// New turn holder.
        next_player: PlayerId,
        /// Columns completed while banking.
        completed: Vec<Column>,
    },
    /// Climbs were banked and the player won.
    Victory {
        /// Winning player.
        winner: PlayerId,
    },
}

impl TurnOutcome {
    /// Whether the acting player still holds the turn.
    pub fn can_continue(&self) -> bool {
        !matches!(
            self,
            TurnOutcome::Busted { .. } | TurnOutcome::Stopped { .. } | TurnOutcome::Victory { .. }
        )
    }

    /// Winner, when the action ended the game.
    pub fn winner(&self) -> Option<PlayerId> {
        match self {
            TurnOutcome::Victory { winner } => Some(*winner),
            _ => None,
        }
    }
}

/// Next state computed for an accepted action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    /// State to persist.
    pub state: GameState,
    /// Outcome reported to the caller.
    pub outcome: TurnOutcome,
}

/// Read-only inputs the rules need besides the game itself.
#[derive(Debug, Clone, Copy)]
pub struct TurnContext<'a> {
    /// Participants in join order.
    pub participants: &'a IndexMap<PlayerId, Participant>,
    /// Timestamp stamped on log entries and the state.
    pub now: SystemTime,
}

impl TurnContext<'_> {
    fn turn_order(&self) -> Vec<PlayerId> {
        self.participants.keys().copied().collect()
    }

    fn name_of(&self, player: PlayerId) -> String {
        self.participants
            .get(&player)
            .map(|participant| participant.name.clone())
            .unwrap_or_else(|| player.to_string())
    }
}

/// Validate `action` by `actor` against `current` and compute the next state.
///
/// `current` is never modified: on error nothing changes, on success the caller
/// receives a new state to persist.
pub fn apply_action(
    current: &GameState,
    actor: PlayerId,
    action: GameAction,
    ctx: &TurnContext<'_>,
) -> Result<Transition, RuleError> {
    if current.is_finished() {
        return Err(RuleError::PhaseMismatch {
            phase: current.phase,
            action: action.kind(),
        });
    }

    if actor != current.current_turn_user_id {
        return Err(RuleError::TurnMismatch {
            expected: current.current_turn_user_id,
            actual: actor,
        });
    }

    let mut next = current.clone();
    let outcome = match (current.phase, action) {
        (GamePhase::Rolling, GameAction::Roll(dice)) => roll(&mut next, actor, dice, ctx)?,
        (GamePhase::Choosing, GameAction::ChooseCombination(pairing)) => {
            choose(&mut next, actor, pairing, ctx)?
        }
        (GamePhase::Deciding, GameAction::Continue) => advance(&mut next, actor, ctx)?,
        (GamePhase::Rolling | GamePhase::Choosing | GamePhase::Deciding, GameAction::Stop) => {
            stop(&mut next, actor, ctx)?
        }
        (phase, action) => {
            return Err(RuleError::PhaseMismatch {
                phase,
                action: action.kind(),
            });
        }
    };

    next.updated_at = ctx.now;
    Ok(Transition {
        state: next,
        outcome,
    })
}

fn roll(
    next: &mut GameState,
    actor: PlayerId,
    dice: Dice,
    ctx: &TurnContext<'_>,
) -> Result<TurnOutcome, RuleError> {
    let options = legal_pairings_for_roll(dice, &next.game_data, actor);
    let name = ctx.name_of(actor);

    if options.is_empty() {
        let successor = next_player(actor, &ctx.turn_order())?;
        let data = &mut next.game_data;
        data.temp_markers.retain(|_, marker| marker.player != actor);
        data.selected_combination = None;
        data.dice_values = None;
        data.push_log(
            format!("{name} rolled {dice} and busted"),
            Some(actor),
            ctx.now,
        );
        pass_turn(next, successor);
        return Ok(TurnOutcome::Busted {
            dice,
            next_player: successor,
        });
    }

    next.game_data.dice_values = Some(dice);
    next.game_data
        .push_log(format!("{name} rolled {dice}"), Some(actor), ctx.now);
    next.phase = GamePhase::Choosing;
    Ok(TurnOutcome::Rolled { dice, options })
}

fn choose(
    next: &mut GameState,
    actor: PlayerId,
    pairing: Pairing,
    ctx: &TurnContext<'_>,
) -> Result<TurnOutcome, RuleError> {
    let invalid = RuleError::InvalidCombination {
        sums: pairing.sums(),
    };
    let dice = next.game_data.dice_values.ok_or_else(|| invalid.clone())?;

    // Re-derive the options from the stored roll; never trust the client's list.
    if !legal_pairings_for_roll(dice, &next.game_data, actor).contains(&pairing) {
        return Err(invalid);
    }

    let data = &mut next.game_data;
    for column in pairing.distinct_columns() {
        data.temp_markers.entry(column).or_insert(TempMarker {
            player: actor,
            steps: 0,
        });
    }
    data.selected_combination = Some(pairing);
    data.push_log(
        format!("{} chose {pairing}", ctx.name_of(actor)),
        Some(actor),
        ctx.now,
    );
    next.phase = GamePhase::Deciding;
    Ok(TurnOutcome::Chose { pairing })
}

fn advance(
    next: &mut GameState,
    actor: PlayerId,
    ctx: &TurnContext<'_>,
) -> Result<TurnOutcome, RuleError> {
    let pairing = next
        .game_data
        .selected_combination
        .take()
        .ok_or(RuleError::NoStagedCombination)?;
    let name = ctx.name_of(actor);

    let completed = climb(&mut next.game_data, actor, pairing, &name, ctx.now);
    next.game_data.dice_values = None;
    next.game_data.push_log(
        format!("{name} advanced on {pairing} and keeps rolling"),
        Some(actor),
        ctx.now,
    );
    next.phase = GamePhase::Rolling;
    Ok(TurnOutcome::Continued { completed })
}

fn stop(
    next: &mut GameState,
    actor: PlayerId,
    ctx: &TurnContext<'_>,
) -> Result<TurnOutcome, RuleError> {
    if next.game_data.marker_columns(actor).is_empty() {
        return Err(RuleError::NothingToBank);
    }
    let name = ctx.name_of(actor);

    let mut completed = Vec::new();
    if let Some(pairing) = next.game_data.selected_combination.take() {
        completed.extend(climb(&mut next.game_data, actor, pairing, &name, ctx.now));
    }
    let banked = next.game_data.marker_columns(actor);
    completed.extend(bank(&mut next.game_data, actor, &name, ctx.now));
    next.game_data.dice_values = None;

    let banked = banked
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    next.game_data.push_log(
        format!("{name} stopped and banked columns {banked}"),
        Some(actor),
        ctx.now,
    );

    if next.game_data.completed_count(actor) >= WINNING_COLUMNS {
        next.phase = GamePhase::Finished;
        next.winner = Some(actor);
        next.game_data
            .push_log(format!("{name} wins the game"), Some(actor), ctx.now);
        return Ok(TurnOutcome::Victory { winner: actor });
    }

    let successor = next_player(actor, &ctx.turn_order())?;
    pass_turn(next, successor);
    Ok(TurnOutcome::Stopped {
        next_player: successor,
        completed,
    })
}

/// Apply each touch of `pairing` as one step, checking completion after every step.
fn climb(
    data: &mut GameData,
    player: PlayerId,
    pairing: Pairing,
    name: &str,
    now: SystemTime,
) -> Vec<Column> {
    let mut completed = Vec::new();

    for column in pairing.columns() {
        if data.is_completed(column) {
            continue;
        }

        let banked = data.progress(column, player);
        let Some(marker) = data
            .temp_markers
            .get_mut(&column)
            .filter(|marker| marker.player == player)
        else {
            continue;
        };

        if banked.saturating_add(marker.steps) >= column.height() {
            continue;
        }
        marker.steps += 1;

        if banked + marker.steps == column.height() {
            complete_column(data, column, player, name, now);
            completed.push(column);
        }
    }

    completed
}

/// Turn every marker of `player` into banked progress and remove the markers.
fn bank(data: &mut GameData, player: PlayerId, name: &str, now: SystemTime) -> Vec<Column> {
    let mut completed = Vec::new();

    for column in data.marker_columns(player) {
        let Some(marker) = data.temp_markers.remove(&column) else {
            continue;
        };
        if data.is_completed(column) {
            continue;
        }

        let height = column.height();
        let progress = data
            .columns
            .entry(column)
            .or_default()
            .entry(player)
            .or_insert(0);
        *progress = progress.saturating_add(marker.steps).min(height);

        if *progress == height {
            complete_column(data, column, player, name, now);
            completed.push(column);
        }
    }

    completed
}

/// Close `column` for good in favour of `player`.
fn complete_column(
    data: &mut GameData,
    column: Column,
    player: PlayerId,
    name: &str,
    now: SystemTime,
) {
    data.columns
        .entry(column)
        .or_default()
        .insert(player, column.height());
    if let Some(marker) = data.temp_markers.get_mut(&column) {
        marker.steps = 0;
    }
    data.completed_columns.insert(column, player);
    data.push_log(format!("{name} completed column {column}"), Some(player), now);
}

fn pass_turn(next: &mut GameState, successor: PlayerId) {
    next.current_turn_user_id = successor;
    next.turn_number += 1;
    next.phase = GamePhase::Rolling;
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    struct Table {
        participants: IndexMap<PlayerId, Participant>,
        a: PlayerId,
        b: PlayerId,
    }

    impl Table {
        fn new() -> Self {
            let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
            let participants = [(a, "Ada"), (b, "Bob")]
                .into_iter()
                .map(|(id, name)| {
                    (
                        id,
                        Participant {
                            id,
                            name: name.into(),
                        },
                    )
                })
                .collect();
            Self { participants, a, b }
        }

        fn ctx(&self) -> TurnContext<'_> {
            TurnContext {
                participants: &self.participants,
                now: SystemTime::now(),
            }
        }

        fn game(&self) -> GameState {
            GameState::new(Uuid::new_v4(), self.a, SystemTime::now())
        }
    }

    fn dice(faces: [u8; 4]) -> Dice {
        Dice::new(faces).unwrap()
    }

    fn col(n: u8) -> Column {
        Column::new(n).unwrap()
    }

    fn pairing(a: u8, b: u8) -> Pairing {
        Pairing::from_sums(a, b).unwrap()
    }

    fn apply(table: &Table, state: &GameState, actor: PlayerId, action: GameAction) -> Transition {
        apply_action(state, actor, action, &table.ctx()).unwrap()
    }

    fn reject(table: &Table, state: &GameState, actor: PlayerId, action: GameAction) -> RuleError {
        apply_action(state, actor, action, &table.ctx()).unwrap_err()
    }

    #[test]
    fn scenario_double_seven_completes_column() {
        let table = Table::new();
        let mut state = table.game();
        state
            .game_data
            .columns
            .entry(col(7))
            .or_default()
            .insert(table.a, col(7).height() - 1);

        let rolled = apply(&table, &state, table.a, GameAction::Roll(dice([3, 3, 4, 4])));
        assert_eq!(
            rolled.outcome,
            TurnOutcome::Rolled {
                dice: dice([3, 3, 4, 4]),
                options: vec![pairing(6, 8), pairing(7, 7)],
            }
        );
        assert!(rolled.outcome.can_continue());
        assert_eq!(rolled.state.phase, GamePhase::Choosing);

        let chose = apply(
            &table,
            &rolled.state,
            table.a,
            GameAction::ChooseCombination(pairing(7, 7)),
        );
        assert_eq!(chose.state.phase, GamePhase::Deciding);
        assert_eq!(chose.state.game_data.temp_markers.len(), 1);
        assert!(chose.state.game_data.holds_marker(col(7), table.a));

        let continued = apply(&table, &chose.state, table.a, GameAction::Continue);
        let data = &continued.state.game_data;
        assert_eq!(
            continued.outcome,
            TurnOutcome::Continued {
                completed: vec![col(7)]
            }
        );
        assert_eq!(data.progress(col(7), table.a), 13);
        assert_eq!(data.completed_columns.get(&col(7)), Some(&table.a));
        assert_eq!(data.selected_combination, None);
        assert_eq!(continued.state.phase, GamePhase::Rolling);
        assert_eq!(continued.state.current_turn_user_id, table.a);
        assert_eq!(continued.state.turn_number, 1);
    }

    #[test]
    fn double_pairing_climbs_two_steps() {
        let table = Table::new();
        let state = table.game();

        let rolled = apply(&table, &state, table.a, GameAction::Roll(dice([3, 3, 4, 4])));
        let chose = apply(
            &table,
            &rolled.state,
            table.a,
            GameAction::ChooseCombination(pairing(7, 7)),
        );
        let continued = apply(&table, &chose.state, table.a, GameAction::Continue);

        assert_eq!(
            continued.state.game_data.effective_progress(col(7), table.a),
            2
        );
        assert_eq!(continued.state.game_data.progress(col(7), table.a), 0);
    }

    #[test]
    fn bust_drops_markers_and_passes_the_turn() {
        let table = Table::new();
        let mut state = table.game();
        state.game_data.completed_columns.insert(col(2), table.b);
        state.game_data.temp_markers.insert(
            col(9),
            TempMarker {
                player: table.a,
                steps: 2,
            },
        );

        let busted = apply(&table, &state, table.a, GameAction::Roll(dice([1, 1, 1, 1])));
        assert_eq!(
            busted.outcome,
            TurnOutcome::Busted {
                dice: dice([1, 1, 1, 1]),
                next_player: table.b,
            }
        );
        assert!(!busted.outcome.can_continue());
        assert!(busted.state.game_data.temp_markers.is_empty());
        assert_eq!(busted.state.game_data.progress(col(9), table.a), 0);
        assert_eq!(busted.state.current_turn_user_id, table.b);
        assert_eq!(busted.state.turn_number, 2);
        assert_eq!(busted.state.phase, GamePhase::Rolling);
        assert!(
            busted
                .state
                .game_data
                .logs
                .last()
                .is_some_and(|entry| entry.message.contains("busted"))
        );
    }

    #[test]
    fn stop_banks_markers_and_rotates() {
        let table = Table::new();
        let state = table.game();

        let rolled = apply(&table, &state, table.a, GameAction::Roll(dice([1, 2, 3, 4])));
        let chose = apply(
            &table,
            &rolled.state,
            table.a,
            GameAction::ChooseCombination(pairing(3, 7)),
        );
        let continued = apply(&table, &chose.state, table.a, GameAction::Continue);
        let stopped = apply(&table, &continued.state, table.a, GameAction::Stop);

        let data = &stopped.state.game_data;
        assert_eq!(data.progress(col(3), table.a), 1);
        assert_eq!(data.progress(col(7), table.a), 1);
        assert!(data.temp_markers.is_empty());
        assert_eq!(
            stopped.outcome,
            TurnOutcome::Stopped {
                next_player: table.b,
                completed: vec![],
            }
        );
        assert_eq!(stopped.state.turn_number, 2);
        assert_eq!(stopped.state.current_turn_user_id, table.b);
    }

    #[test]
    fn stop_from_deciding_applies_the_staged_pairing_first() {
        let table = Table::new();
        let state = table.game();

        let rolled = apply(&table, &state, table.a, GameAction::Roll(dice([1, 2, 3, 4])));
        let chose = apply(
            &table,
            &rolled.state,
            table.a,
            GameAction::ChooseCombination(pairing(4, 6)),
        );
        let stopped = apply(&table, &chose.state, table.a, GameAction::Stop);

        let data = &stopped.state.game_data;
        assert_eq!(data.progress(col(4), table.a), 1);
        assert_eq!(data.progress(col(6), table.a), 1);
        assert_eq!(data.selected_combination, None);
    }

    #[test]
    fn stop_while_choosing_banks_the_held_markers() {
        let table = Table::new();
        let state = table.game();

        let rolled = apply(&table, &state, table.a, GameAction::Roll(dice([1, 2, 3, 4])));
        let chose = apply(
            &table,
            &rolled.state,
            table.a,
            GameAction::ChooseCombination(pairing(3, 7)),
        );
        let continued = apply(&table, &chose.state, table.a, GameAction::Continue);
        let rolled = apply(
            &table,
            &continued.state,
            table.a,
            GameAction::Roll(dice([1, 2, 3, 4])),
        );
        assert_eq!(rolled.state.phase, GamePhase::Choosing);

        let stopped = apply(&table, &rolled.state, table.a, GameAction::Stop);

        let data = &stopped.state.game_data;
        assert_eq!(data.progress(col(3), table.a), 1);
        assert_eq!(data.progress(col(7), table.a), 1);
        assert!(data.temp_markers.is_empty());
        assert_eq!(data.dice_values, None);
        assert_eq!(stopped.state.phase, GamePhase::Rolling);
        assert_eq!(stopped.state.current_turn_user_id, table.b);
    }

    #[test]
    fn third_completed_column_wins_on_stop() {
        let table = Table::new();
        let mut state = table.game();
        for n in [2, 12] {
            state.game_data.completed_columns.insert(col(n), table.a);
            state
                .game_data
                .columns
                .entry(col(n))
                .or_default()
                .insert(table.a, 3);
        }
        state.game_data.temp_markers.insert(
            col(3),
            TempMarker {
                player: table.a,
                steps: 5,
            },
        );

        let won = apply(&table, &state, table.a, GameAction::Stop);
        assert_eq!(won.outcome, TurnOutcome::Victory { winner: table.a });
        assert_eq!(won.outcome.winner(), Some(table.a));
        assert_eq!(won.state.phase, GamePhase::Finished);
        assert_eq!(won.state.winner, Some(table.a));
        assert_eq!(won.state.turn_number, 1);
    }

    #[test]
    fn two_completed_columns_do_not_end_the_game() {
        let table = Table::new();
        let mut state = table.game();
        state.game_data.completed_columns.insert(col(2), table.a);
        state.game_data.temp_markers.insert(
            col(12),
            TempMarker {
                player: table.a,
                steps: 3,
            },
        );

        let stopped = apply(&table, &state, table.a, GameAction::Stop);
        assert_eq!(stopped.state.game_data.completed_count(table.a), 2);
        assert!(matches!(stopped.outcome, TurnOutcome::Stopped { .. }));
        assert_eq!(stopped.state.phase, GamePhase::Rolling);
        assert_eq!(stopped.state.winner, None);
    }

    #[test]
    fn completed_columns_are_never_touched_again() {
        let table = Table::new();
        let mut state = table.game();
        state.game_data.completed_columns.insert(col(7), table.b);
        state
            .game_data
            .columns
            .entry(col(7))
            .or_default()
            .insert(table.b, 13);
        state
            .game_data
            .columns
            .entry(col(7))
            .or_default()
            .insert(table.a, 4);
        // Markers left on a closed column by an older record must not move it.
        state.game_data.temp_markers.insert(
            col(7),
            TempMarker {
                player: table.a,
                steps: 2,
            },
        );
        state.game_data.temp_markers.insert(
            col(5),
            TempMarker {
                player: table.a,
                steps: 0,
            },
        );
        state.game_data.selected_combination = Some(pairing(5, 7));
        state.phase = GamePhase::Deciding;

        let continued = apply(&table, &state, table.a, GameAction::Continue);
        let stopped = apply(&table, &continued.state, table.a, GameAction::Stop);

        for data in [&continued.state.game_data, &stopped.state.game_data] {
            assert_eq!(data.columns.get(&col(7)), state.game_data.columns.get(&col(7)));
            assert_eq!(data.completed_columns.get(&col(7)), Some(&table.b));
        }
        assert_eq!(stopped.state.game_data.progress(col(5), table.a), 1);
    }

    #[test]
    fn climbing_stops_at_the_top() {
        let table = Table::new();
        let mut state = table.game();
        state
            .game_data
            .columns
            .entry(col(12))
            .or_default()
            .insert(table.a, 2);
        state.game_data.temp_markers.insert(
            col(12),
            TempMarker {
                player: table.a,
                steps: 0,
            },
        );
        state.game_data.selected_combination = Some(pairing(12, 12));
        state.phase = GamePhase::Deciding;

        let continued = apply(&table, &state, table.a, GameAction::Continue);
        let data = &continued.state.game_data;
        assert_eq!(data.progress(col(12), table.a), 3);
        assert_eq!(data.effective_progress(col(12), table.a), 3);
        assert_eq!(data.completed_columns.get(&col(12)), Some(&table.a));
        assert_eq!(
            data.logs
                .iter()
                .filter(|entry| entry.message.contains("completed column 12"))
                .count(),
            1
        );
    }

    #[test]
    fn wrong_player_is_rejected() {
        let table = Table::new();
        let state = table.game();

        let err = reject(&table, &state, table.b, GameAction::Roll(dice([1, 2, 3, 4])));
        assert_eq!(
            err,
            RuleError::TurnMismatch {
                expected: table.a,
                actual: table.b,
            }
        );
    }

    #[test]
    fn actions_outside_their_phase_are_rejected() {
        let table = Table::new();
        let state = table.game();

        assert_eq!(
            reject(&table, &state, table.a, GameAction::Continue),
            RuleError::PhaseMismatch {
                phase: GamePhase::Rolling,
                action: ActionKind::Continue,
            }
        );
        assert_eq!(
            reject(
                &table,
                &state,
                table.a,
                GameAction::ChooseCombination(pairing(6, 8))
            ),
            RuleError::PhaseMismatch {
                phase: GamePhase::Rolling,
                action: ActionKind::ChooseCombination,
            }
        );

        let rolled = apply(&table, &state, table.a, GameAction::Roll(dice([1, 2, 3, 4])));
        assert!(matches!(
            reject(&table, &rolled.state, table.a, GameAction::Roll(dice([1, 1, 2, 2]))),
            RuleError::PhaseMismatch { .. }
        ));
        assert_eq!(
            reject(&table, &rolled.state, table.a, GameAction::Stop),
            RuleError::NothingToBank
        );
    }

    #[test]
    fn stop_without_climbs_is_rejected() {
        let table = Table::new();
        let state = table.game();
        assert_eq!(
            reject(&table, &state, table.a, GameAction::Stop),
            RuleError::NothingToBank
        );
    }

    #[test]
    fn continue_without_staged_pairing_is_rejected() {
        let table = Table::new();
        let mut state = table.game();
        state.phase = GamePhase::Deciding;
        assert_eq!(
            reject(&table, &state, table.a, GameAction::Continue),
            RuleError::NoStagedCombination
        );
    }

    #[test]
    fn illegal_or_replayed_combinations_are_rejected() {
        let table = Table::new();
        let state = table.game();

        let rolled = apply(&table, &state, table.a, GameAction::Roll(dice([3, 3, 4, 4])));
        assert_eq!(
            reject(
                &table,
                &rolled.state,
                table.a,
                GameAction::ChooseCombination(pairing(2, 12))
            ),
            RuleError::InvalidCombination { sums: [2, 12] }
        );

        // Client order does not matter.
        let chose = apply(
            &table,
            &rolled.state,
            table.a,
            GameAction::ChooseCombination(Pairing::new(col(8), col(6))),
        );
        let continued = apply(&table, &chose.state, table.a, GameAction::Continue);

        // The consumed roll cannot be chosen from again.
        let mut replay = continued.state.clone();
        replay.phase = GamePhase::Choosing;
        assert_eq!(
            reject(
                &table,
                &replay,
                table.a,
                GameAction::ChooseCombination(pairing(6, 8))
            ),
            RuleError::InvalidCombination { sums: [6, 8] }
        );
    }

    #[test]
    fn rejected_actions_leave_the_state_untouched() {
        let table = Table::new();
        let state = table.game();
        let rolled = apply(&table, &state, table.a, GameAction::Roll(dice([3, 3, 4, 4])));
        let before = rolled.state.clone();

        let _ = reject(&table, &rolled.state, table.b, GameAction::Stop);
        let _ = reject(&table, &rolled.state, table.a, GameAction::Continue);
        let _ = reject(
            &table,
            &rolled.state,
            table.a,
            GameAction::ChooseCombination(pairing(2, 2)),
        );
        assert_eq!(rolled.state, before);
    }

    #[test]
    fn finished_games_accept_nothing() {
        let table = Table::new();
        let mut state = table.game();
        state.phase = GamePhase::Finished;
        state.winner = Some(table.a);

        assert!(matches!(
            reject(&table, &state, table.a, GameAction::Roll(dice([1, 2, 3, 4]))),
            RuleError::PhaseMismatch {
                phase: GamePhase::Finished,
                ..
            }
        ));
    }

    #[test]
    fn unknown_turn_holder_cannot_pass_the_turn() {
        let table = Table::new();
        let stranger = Uuid::new_v4();
        let mut state = table.game();
        state.current_turn_user_id = stranger;
        state.game_data.completed_columns.insert(col(2), table.b);

        assert_eq!(
            reject(&table, &state, stranger, GameAction::Roll(dice([1, 1, 1, 1]))),
            RuleError::Rotation(RotationError::NotAParticipant(stranger))
        );
    }
}

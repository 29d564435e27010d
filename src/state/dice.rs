//! Dice values and the injectable source the game draws rolls from.

use std::{
    fmt,
    sync::atomic::{AtomicUsize, Ordering},
};

use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of dice thrown on every roll.
pub const DICE_PER_ROLL: usize = 4;

/// Raised when a die face is outside `1..=6`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("die face {0} is not between 1 and 6")]
pub struct InvalidDie(pub u8);

/// Four die faces from a single roll, each in `1..=6`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "[u8; 4]", into = "[u8; 4]")]
pub struct Dice([u8; DICE_PER_ROLL]);

impl Dice {
    /// Validate four faces.
    pub fn new(faces: [u8; DICE_PER_ROLL]) -> Result<Self, InvalidDie> {
        match faces.iter().find(|face| !(1..=6).contains(*face)) {
            Some(face) => Err(InvalidDie(*face)),
            None => Ok(Self(faces)),
        }
    }

    /// Faces in the order they were rolled.
    pub fn faces(&self) -> [u8; DICE_PER_ROLL] {
        self.0
    }
}

impl fmt::Display for Dice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d] = self.0;
        write!(f, "{a}, {b}, {c}, {d}")
    }
}

impl TryFrom<[u8; DICE_PER_ROLL]> for Dice {
    type Error = InvalidDie;

    fn try_from(value: [u8; DICE_PER_ROLL]) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Dice> for [u8; DICE_PER_ROLL] {
    fn from(value: Dice) -> Self {
        value.0
    }
}

/// Source of dice rolls. Injected into the shared state so tests can script games.
pub trait DiceRoller: Send + Sync {
    /// Throw four independent dice.
    fn roll(&self) -> Dice;
}

/// Uniform rolls drawn from the thread-local generator.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomDice;

impl DiceRoller for RandomDice {
    fn roll(&self) -> Dice {
        let mut rng = rand::rng();
        Dice(std::array::from_fn(|_| rng.random_range(1..=6)))
    }
}

/// Replays a scripted list of rolls, wrapping around once exhausted.
#[derive(Debug)]
pub struct FixedDice {
    rolls: Vec<Dice>,
    next: AtomicUsize,
}

impl FixedDice {
    /// Start a script with its first roll.
    pub fn new(first: Dice) -> Self {
        Self {
            rolls: vec![first],
            next: AtomicUsize::new(0),
        }
    }

    /// Append another roll to the script.
    pub fn then(mut self, dice: Dice) -> Self {
        self.rolls.push(dice);
        self
    }
}

impl DiceRoller for FixedDice {
    fn roll(&self) -> Dice {
        let index = self.next.fetch_add(1, Ordering::Relaxed) % self.rolls.len();
        self.rolls[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn faces_outside_range_are_rejected() {
        assert_eq!(Dice::new([1, 2, 7, 3]), Err(InvalidDie(7)));
        assert_eq!(Dice::new([0, 2, 3, 3]), Err(InvalidDie(0)));
        assert!(Dice::new([6, 6, 1, 1]).is_ok());
    }

    #[test]
    fn random_rolls_stay_on_the_die() {
        let roller = RandomDice;
        for _ in 0..500 {
            let dice = roller.roll();
            assert!(dice.faces().iter().all(|face| (1..=6).contains(face)));
        }
    }

    #[test]
    fn fixed_dice_replay_in_order_and_wrap() {
        let first = Dice::new([1, 1, 1, 1]).unwrap();
        let second = Dice::new([6, 5, 4, 3]).unwrap();
        let roller = FixedDice::new(first).then(second);

        assert_eq!(roller.roll(), first);
        assert_eq!(roller.roll(), second);
        assert_eq!(roller.roll(), first);
    }
}

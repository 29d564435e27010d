//! Dice pairing: the three ways to split four dice into two column sums and
//! which of those the acting player may apply.

use std::fmt;

use crate::state::{
    board::{Column, InvalidColumn},
    dice::Dice,
    game::{GameData, PlayerId},
};

/// Maximum number of columns a player may climb during one turn.
pub const MAX_TEMP_MARKERS: usize = 3;

/// Two column sums produced by grouping the dice in pairs.
///
/// Sums are kept sorted so equal pairings compare equal regardless of dice order.
/// The two entries are ordered touches: `[7, 7]` advances column 7 twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pairing([Column; 2]);

impl Pairing {
    /// Build a pairing from two columns in any order.
    pub fn new(a: Column, b: Column) -> Self {
        if a <= b { Self([a, b]) } else { Self([b, a]) }
    }

    /// Build a pairing from raw sums, typically submitted by a client.
    pub fn from_sums(a: u8, b: u8) -> Result<Self, InvalidColumn> {
        Ok(Self::new(Column::new(a)?, Column::new(b)?))
    }

    /// Columns touched, in ascending order.
    pub fn columns(&self) -> [Column; 2] {
        self.0
    }

    /// Raw sums, in ascending order.
    pub fn sums(&self) -> [u8; 2] {
        [self.0[0].number(), self.0[1].number()]
    }

    /// Columns touched, each listed once.
    pub fn distinct_columns(&self) -> impl Iterator<Item = Column> {
        let [low, high] = self.0;
        std::iter::once(low).chain((low != high).then_some(high))
    }
}

impl fmt::Display for Pairing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} + {}", self.0[0], self.0[1])
    }
}

/// The three ways to partition four dice into two pairs.
pub fn all_pairings(dice: Dice) -> [Pairing; 3] {
    let [d0, d1, d2, d3] = dice.faces();
    [
        Pairing::new(Column::from_faces(d0, d1), Column::from_faces(d2, d3)),
        Pairing::new(Column::from_faces(d0, d2), Column::from_faces(d1, d3)),
        Pairing::new(Column::from_faces(d0, d3), Column::from_faces(d1, d2)),
    ]
}

/// Whether `player` may apply `pairing` to the board as it stands.
///
/// Every column must be open, and the columns the player does not already
/// climb must fit under [`MAX_TEMP_MARKERS`] once added to the markers in play.
pub fn is_legal(pairing: &Pairing, data: &GameData, player: PlayerId) -> bool {
    if pairing
        .distinct_columns()
        .any(|column| data.is_completed(column))
    {
        return false;
    }

    let new_climbs = pairing
        .distinct_columns()
        .filter(|column| !data.holds_marker(*column, player))
        .count();

    data.marker_count() + new_climbs <= MAX_TEMP_MARKERS
}

/// Filter `pairings` down to the distinct ones `player` may apply.
///
/// An empty result means the roll busts.
pub fn legal_pairings(pairings: &[Pairing], data: &GameData, player: PlayerId) -> Vec<Pairing> {
    let mut legal: Vec<Pairing> = Vec::with_capacity(pairings.len());
    for pairing in pairings {
        if !legal.contains(pairing) && is_legal(pairing, data, player) {
            legal.push(*pairing);
        }
    }
    legal
}

/// Shortcut combining [`all_pairings`] and [`legal_pairings`] for a fresh roll.
pub fn legal_pairings_for_roll(dice: Dice, data: &GameData, player: PlayerId) -> Vec<Pairing> {
    legal_pairings(&all_pairings(dice), data, player)
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::state::game::TempMarker;

    fn dice(faces: [u8; 4]) -> Dice {
        Dice::new(faces).unwrap()
    }

    fn col(n: u8) -> Column {
        Column::new(n).unwrap()
    }

    fn pairing(a: u8, b: u8) -> Pairing {
        Pairing::from_sums(a, b).unwrap()
    }

    #[test]
    fn three_pairings_use_every_die_once() {
        for faces in [[1, 2, 3, 4], [6, 6, 6, 6], [5, 1, 2, 6], [3, 3, 4, 4]] {
            let pairings = all_pairings(dice(faces));
            assert_eq!(pairings.len(), 3);

            let total: u8 = faces.iter().sum();
            for pairing in pairings {
                let [a, b] = pairing.sums();
                assert_eq!(a + b, total, "pairing {pairing} for {faces:?}");
            }

            let [d0, d1, d2, d3] = faces;
            let mut expected = vec![d0 + d1, d2 + d3, d0 + d2, d1 + d3, d0 + d3, d1 + d2];
            let mut actual: Vec<u8> = pairings.iter().flat_map(|p| p.sums()).collect();
            expected.sort_unstable();
            actual.sort_unstable();
            assert_eq!(actual, expected);
        }
    }

    #[test]
    fn pairings_are_sorted() {
        let pairings = all_pairings(dice([6, 6, 1, 1]));
        assert_eq!(pairings[0].sums(), [2, 12]);
        assert_eq!(pairings[1].sums(), [7, 7]);
        assert_eq!(pairings[2].sums(), [7, 7]);
    }

    #[test]
    fn duplicate_pairings_are_offered_once() {
        let player = Uuid::new_v4();
        let legal = legal_pairings_for_roll(dice([3, 3, 4, 4]), &GameData::default(), player);
        assert_eq!(legal, vec![pairing(6, 8), pairing(7, 7)]);
    }

    #[test]
    fn completed_column_busts_all_ones() {
        let player = Uuid::new_v4();
        let mut data = GameData::default();
        data.completed_columns.insert(col(2), Uuid::new_v4());

        let legal = legal_pairings_for_roll(dice([1, 1, 1, 1]), &data, player);
        assert!(legal.is_empty());
    }

    #[test]
    fn three_marker_cap_rejects_a_fourth_column() {
        let player = Uuid::new_v4();
        let mut data = GameData::default();
        for n in [4, 6, 8] {
            data.temp_markers
                .insert(col(n), TempMarker { player, steps: 1 });
        }

        assert!(!is_legal(&pairing(5, 6), &data, player));
        assert!(!is_legal(&pairing(9, 9), &data, player));
        assert!(is_legal(&pairing(4, 8), &data, player));
        assert!(is_legal(&pairing(6, 6), &data, player));
    }

    #[test]
    fn cap_counts_distinct_columns_not_slots() {
        let player = Uuid::new_v4();
        let mut data = GameData::default();
        for n in [4, 6] {
            data.temp_markers
                .insert(col(n), TempMarker { player, steps: 1 });
        }

        // One free slot: a double on a new column fits, two new columns do not.
        assert!(is_legal(&pairing(7, 7), &data, player));
        assert!(is_legal(&pairing(4, 9), &data, player));
        assert!(!is_legal(&pairing(7, 9), &data, player));
    }

    #[test]
    fn a_pairing_touching_a_completed_column_is_dropped() {
        let player = Uuid::new_v4();
        let mut data = GameData::default();
        data.completed_columns.insert(col(7), player);

        assert!(!is_legal(&pairing(7, 5), &data, player));
        assert!(is_legal(&pairing(5, 6), &data, player));
    }
}

use thiserror::Error;

use crate::state::game::PlayerId;

/// Raised when the turn order cannot be resolved.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RotationError {
    /// The participant list is empty.
    #[error("no participants to rotate through")]
    NoParticipants,
    /// The current player is not part of the participant list.
    #[error("player `{0}` is not a participant of this game")]
    NotAParticipant(PlayerId),
}

/// Next player in join order, wrapping from the last participant back to the first.
pub fn next_player(current: PlayerId, ordered: &[PlayerId]) -> Result<PlayerId, RotationError> {
    if ordered.is_empty() {
        return Err(RotationError::NoParticipants);
    }

    let position = ordered
        .iter()
        .position(|id| *id == current)
        .ok_or(RotationError::NotAParticipant(current))?;

    Ok(ordered[(position + 1) % ordered.len()])
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    #[test]
    fn rotation_follows_join_order_and_wraps() {
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let order = [a, b, c];

        assert_eq!(next_player(a, &order), Ok(b));
        assert_eq!(next_player(b, &order), Ok(c));
        assert_eq!(next_player(c, &order), Ok(a));
    }

    #[test]
    fn single_participant_keeps_the_turn() {
        let a = Uuid::new_v4();
        assert_eq!(next_player(a, &[a]), Ok(a));
    }

    #[test]
    fn unknown_player_is_an_error() {
        let stranger = Uuid::new_v4();
        assert_eq!(
            next_player(stranger, &[Uuid::new_v4()]),
            Err(RotationError::NotAParticipant(stranger))
        );
        assert_eq!(
            next_player(stranger, &[]),
            Err(RotationError::NoParticipants)
        );
    }
}

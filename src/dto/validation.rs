//! Validation helpers for DTOs.

use std::collections::HashSet;

use validator::ValidationError;

use crate::{
    dto::game::ParticipantInput,
    state::board::{MAX_COLUMN, MIN_COLUMN},
};

/// Smallest table that can play.
pub const MIN_PARTICIPANTS: usize = 2;
/// Largest table the board supports.
pub const MAX_PARTICIPANTS: usize = 4;
/// Longest display name accepted.
pub const MAX_NAME_LEN: usize = 32;

fn error(code: &'static str, message: String) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(message.into());
    err
}

/// Validates a starting roster: 2 to 4 players, unique ids, non-blank names.
pub fn validate_roster(participants: &[ParticipantInput]) -> Result<(), ValidationError> {
    if !(MIN_PARTICIPANTS..=MAX_PARTICIPANTS).contains(&participants.len()) {
        return Err(error(
            "participants_count",
            format!(
                "A game needs {MIN_PARTICIPANTS} to {MAX_PARTICIPANTS} participants (got {})",
                participants.len()
            ),
        ));
    }

    let mut seen = HashSet::with_capacity(participants.len());
    if let Some(duplicate) = participants.iter().find(|p| !seen.insert(p.id)) {
        return Err(error(
            "participants_unique",
            format!("Participant `{}` is listed twice", duplicate.id),
        ));
    }

    if let Some(blank) = participants.iter().find(|p| p.name.trim().is_empty()) {
        return Err(error(
            "participant_name_blank",
            format!("Participant `{}` has an empty name", blank.id),
        ));
    }

    if let Some(long) = participants
        .iter()
        .find(|p| p.name.chars().count() > MAX_NAME_LEN)
    {
        return Err(error(
            "participant_name_length",
            format!(
                "Participant `{}` has a name longer than {MAX_NAME_LEN} characters",
                long.id
            ),
        ));
    }

    Ok(())
}

/// Validates that a pairing sum names a board column.
pub fn validate_column_sum(sum: u8) -> Result<(), ValidationError> {
    if (MIN_COLUMN..=MAX_COLUMN).contains(&sum) {
        Ok(())
    } else {
        Err(error(
            "column_range",
            format!("Sum {sum} is not a column between {MIN_COLUMN} and {MAX_COLUMN}"),
        ))
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    fn player(name: &str) -> ParticipantInput {
        ParticipantInput {
            id: Uuid::new_v4(),
            name: name.into(),
        }
    }

    #[test]
    fn test_validate_roster_size() {
        assert!(validate_roster(&[player("a")]).is_err());
        assert!(validate_roster(&[player("a"), player("b")]).is_ok());
        assert!(validate_roster(&[player("a"), player("b"), player("c"), player("d")]).is_ok());
        assert!(
            validate_roster(&[
                player("a"),
                player("b"),
                player("c"),
                player("d"),
                player("e")
            ])
            .is_err()
        );
    }

    #[test]
    fn test_validate_roster_identity() {
        let a = player("a");
        let twin = ParticipantInput {
            id: a.id,
            name: "again".into(),
        };
        assert!(validate_roster(&[a, twin]).is_err());
        assert!(validate_roster(&[player("a"), player("   ")]).is_err());
        assert!(validate_roster(&[player("a"), player(&"x".repeat(33))]).is_err());
    }

    #[test]
    fn test_validate_column_sum() {
        assert!(validate_column_sum(2).is_ok());
        assert!(validate_column_sum(12).is_ok());
        assert!(validate_column_sum(1).is_err());
        assert!(validate_column_sum(13).is_err());
    }
}

use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;
use validator::ValidationErrors;

use crate::{
    dao::storage::StorageError,
    state::{
        game::{InvalidRecord, RoomId},
        rotation::RotationError,
        state_machine::RuleError,
    },
};

/// Errors that can occur in service layer operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The game rules rejected the action.
    #[error(transparent)]
    Rule(#[from] RuleError),
    /// Every save attempt lost the compare-and-swap race.
    #[error("{0}")]
    ConcurrentModification(String),
    /// Storage backend is unavailable.
    #[error("storage unavailable")]
    Unavailable(#[source] StorageError),
    /// Application is running in degraded mode without storage.
    #[error("storage unavailable (degraded mode)")]
    Degraded,
    /// A stored record could not be decoded.
    #[error("stored game of room `{room_id}` is corrupted")]
    Corrupted {
        /// Room whose record is broken.
        room_id: RoomId,
        /// Decoding failure.
        #[source]
        source: InvalidRecord,
    },
    /// Unauthorized access attempt.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// Invalid input provided by the client.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Operation cannot be performed in the current state.
    #[error("invalid state: {0}")]
    InvalidState(String),
    /// Requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Conflict { key } => {
                ServiceError::ConcurrentModification(format!("concurrent modification of `{key}`"))
            }
            other => ServiceError::Unavailable(other),
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(err: ValidationErrors) -> Self {
        AppError::BadRequest(format!("validation failed: {}", err))
    }
}

/// Application-level errors that are converted to HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad request with invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),
    /// Missing or malformed caller identity.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// The caller may not perform this action right now.
    #[error("{message}")]
    Forbidden {
        /// Machine-readable reason.
        code: &'static str,
        /// Human-readable reason.
        message: String,
    },
    /// Requested resource not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// Conflict with current state.
    #[error("{message}")]
    Conflict {
        /// Machine-readable reason.
        code: &'static str,
        /// Human-readable reason.
        message: String,
    },
    /// Well-formed request the rules refuse.
    #[error("{message}")]
    Unprocessable {
        /// Machine-readable reason.
        code: &'static str,
        /// Human-readable reason.
        message: String,
    },
    /// Service unavailable or degraded.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Machine-readable error code sent alongside the message.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::BadRequest(_) => "bad_request",
            AppError::Unauthorized(_) => "unauthorized",
            AppError::NotFound(_) => "not_found",
            AppError::ServiceUnavailable(_) => "unavailable",
            AppError::Internal(_) => "internal",
            AppError::Forbidden { code, .. }
            | AppError::Conflict { code, .. }
            | AppError::Unprocessable { code, .. } => *code,
        }
    }

    /// HTTP status of the response.
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden { .. } => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict { .. } => StatusCode::CONFLICT,
            AppError::Unprocessable { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn conflict(code: &'static str, message: impl ToString) -> Self {
        AppError::Conflict {
            code,
            message: message.to_string(),
        }
    }
}

impl From<RuleError> for AppError {
    fn from(err: RuleError) -> Self {
        let message = err.to_string();
        match err {
            RuleError::TurnMismatch { .. } => AppError::Forbidden {
                code: "turn_mismatch",
                message,
            },
            RuleError::PhaseMismatch { .. } => AppError::conflict("phase_mismatch", message),
            RuleError::InvalidCombination { .. } => AppError::Unprocessable {
                code: "invalid_combination",
                message,
            },
            RuleError::NoStagedCombination => {
                AppError::conflict("no_staged_combination", message)
            }
            RuleError::NothingToBank => AppError::conflict("nothing_to_bank", message),
            RuleError::Rotation(RotationError::NotAParticipant(_)) => AppError::Forbidden {
                code: "not_a_participant",
                message,
            },
            RuleError::Rotation(RotationError::NoParticipants) => {
                AppError::conflict("invalid_state", message)
            }
        }
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Rule(rule) => rule.into(),
            ServiceError::ConcurrentModification(message) => {
                AppError::conflict("concurrent_modification", message)
            }
            ServiceError::Unavailable(source) => AppError::ServiceUnavailable(source.to_string()),
            ServiceError::Degraded => AppError::ServiceUnavailable("degraded mode".into()),
            corrupted @ ServiceError::Corrupted { .. } => AppError::Internal(corrupted.to_string()),
            ServiceError::Unauthorized(message) => AppError::Unauthorized(message),
            ServiceError::InvalidInput(message) => AppError::BadRequest(message),
            ServiceError::InvalidState(message) => AppError::conflict("invalid_state", message),
            ServiceError::NotFound(message) => AppError::NotFound(message),
        }
    }
}

/// JSON body of every error response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Human-readable description.
    pub message: String,
    /// Stable machine-readable code, e.g. `turn_mismatch`.
    pub code: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        let payload = Json(ErrorBody {
            message: self.to_string(),
            code: self.code().to_string(),
        });

        (status, payload).into_response()
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::state::state_machine::{ActionKind, GamePhase};

    fn mapped(err: ServiceError) -> (StatusCode, &'static str) {
        let app: AppError = err.into();
        (app.status(), app.code())
    }

    #[test]
    fn rule_errors_map_to_their_codes() {
        let cases = [
            (
                RuleError::TurnMismatch {
                    expected: Uuid::new_v4(),
                    actual: Uuid::new_v4(),
                },
                StatusCode::FORBIDDEN,
                "turn_mismatch",
            ),
            (
                RuleError::PhaseMismatch {
                    phase: GamePhase::Rolling,
                    action: ActionKind::Continue,
                },
                StatusCode::CONFLICT,
                "phase_mismatch",
            ),
            (
                RuleError::InvalidCombination { sums: [2, 12] },
                StatusCode::UNPROCESSABLE_ENTITY,
                "invalid_combination",
            ),
            (
                RuleError::NoStagedCombination,
                StatusCode::CONFLICT,
                "no_staged_combination",
            ),
            (
                RuleError::NothingToBank,
                StatusCode::CONFLICT,
                "nothing_to_bank",
            ),
        ];

        for (rule, status, code) in cases {
            assert_eq!(mapped(ServiceError::Rule(rule)), (status, code));
        }
    }

    #[test]
    fn storage_conflicts_become_concurrent_modification() {
        let err: ServiceError = StorageError::conflict("game::1").into();
        assert_eq!(
            mapped(err),
            (StatusCode::CONFLICT, "concurrent_modification")
        );
        assert_eq!(
            mapped(ServiceError::Degraded),
            (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
        );
    }
}

//! Error types for the demand engine.

use thiserror::Error;

use crate::services::availability::AvailabilityError;
use crate::types::DemandStatus;
use crate::validator::TransitionError;

/// Errors surfaced by the demand lifecycle engine.
///
/// Every variant except `Database` and `Internal` is a domain error the
/// boundary layer translates to a 4xx response; `Database`/`Internal` are
/// infrastructure failures (5xx) and the only class a caller may retry.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DemandError {
    /// Referenced entity does not exist or is outside the actor's scope.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// The actor's role or ownership does not allow the operation.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// The requested status edge does not exist in the graph.
    #[error("illegal status transition from {from} to {to}")]
    IllegalTransition {
        from: DemandStatus,
        to: DemandStatus,
    },

    /// The requested booking slot is unusable.
    #[error(transparent)]
    Availability(#[from] AvailabilityError),

    /// Client input failed validation.
    #[error("validation error: {0}")]
    Validation(String),

    /// Invariant violation inside the engine or a collaborator.
    #[error("internal error: {0}")]
    Internal(String),

    /// The persistence collaborator failed for infrastructure reasons.
    #[error("database error")]
    Database(#[from] sqlx::Error),
}

impl From<TransitionError> for DemandError {
    fn from(err: TransitionError) -> Self {
        match err {
            TransitionError::IllegalEdge { from, to } => Self::IllegalTransition { from, to },
            denied @ (TransitionError::CannotLeave { .. } | TransitionError::CannotEnter { .. }) => {
                Self::Forbidden(denied.to_string())
            }
        }
    }
}

impl DemandError {
    /// Whether this error is an availability conflict (wrong working day or
    /// occupied slot).
    #[must_use]
    pub fn is_availability_conflict(&self) -> bool {
        matches!(self, Self::Availability(_))
    }
}

/// Convenience Result type for the demand engine.
pub type Result<T> = std::result::Result<T, DemandError>;

use thiserror::Error;

use crate::tutor::InvalidTransition;

/// Failures surfaced by [`TutorController`](crate::tutor::TutorController).
///
/// Tag parsing never appears here: malformed in-band tags always resolve to
/// defaults.
#[derive(Debug, Error)]
pub enum TutorError {
    /// The generation service errored or timed out.
    #[error("generation failed: {0}")]
    GenerationFailure(String),

    /// The grading response could not be read as a grading payload at all.
    #[error("grading response could not be parsed: {0}")]
    MalformedGradingPayload(String),

    #[error("store unavailable: {0}")]
    StoreUnavailable(#[from] anyhow::Error),

    #[error("student {0} not found")]
    StudentNotFound(String),

    #[error("interaction {0} not found")]
    InteractionNotFound(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),
}

pub type TutorResult<T> = Result<T, TutorError>;

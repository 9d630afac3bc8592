use thiserror::Error;

/// Errors surfaced by the rating engine, goal model, and prediction
/// service. Nothing here is retried or corrected silently: the model is
/// deterministic, so a repeated call with the same inputs fails the same
/// way. Retries belong to the I/O layers.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PredictError {
    /// Malformed or out-of-contract input: an unordered replay, a match
    /// without a final score where one is required, or a team with no
    /// rating history.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Numeric degeneracy: an expected-goals rate that is non-positive
    /// or non-finite.
    #[error("model degeneracy: {0}")]
    Model(String),
}

pub type Result<T> = std::result::Result<T, PredictError>;

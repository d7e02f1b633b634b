use thiserror::Error as ThisError;

/// Trait for checking invariants in datastructures
pub trait InvariantCheck<E: std::error::Error> {
    fn is_correct(&self) -> std::result::Result<(), E>;
}

#[derive(Debug, ThisError)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("communication failure on rank {rank}: {reason}")]
    CommunicationFailure { rank: usize, reason: String },
    #[error("local search did not converge in any of {trials} trials")]
    NotConverged { trials: usize },
    #[error("invalid tour: {0}")]
    InvalidTour(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn invalid_configuration(message: impl Into<String>) -> Self {
        Self::InvalidConfiguration(message.into())
    }

    pub fn communication(rank: usize, reason: impl Into<String>) -> Self {
        Self::CommunicationFailure {
            rank,
            reason: reason.into(),
        }
    }
}

use core::fmt;
use thiserror::Error;

use crate::SessionState;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("URL is required")]
    MissingUrl,
    #[error("Invalid URL format: {0}")]
    InvalidUrl(String),
}

/// Which half of the fetch pipeline produced an [`UpstreamError`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FetchStep {
    Screenshot,
    Stats,
}

impl fmt::Display for FetchStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Screenshot => "screenshot",
            Self::Stats => "stats",
        })
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{step} request failed: {message}")]
pub struct UpstreamError {
    pub step: FetchStep,
    pub message: String,
}

impl UpstreamError {
    pub fn new(step: FetchStep, message: impl fmt::Display) -> Self {
        Self {
            step,
            message: message.to_string(),
        }
    }
}

/// Error reported by a screenshot or stats collaborator, turned into an [`UpstreamError`] by the controller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct ServiceError(pub String);

impl ServiceError {
    pub fn new(message: impl fmt::Display) -> Self {
        Self(message.to_string())
    }
}

impl From<CardError> for ServiceError {
    fn from(err: CardError) -> Self {
        Self(err.to_string())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CardError {
    #[error("Unknown rank {0:?}")]
    InvalidRank(String),
    #[error("{field} must be within 1..=10, got {value}")]
    PowerOutOfRange { field: &'static str, value: i64 },
    #[error("Hidden advantage is empty")]
    EmptyHiddenAdvantage,
    #[error("Hidden advantage is {0} characters long, at most 100 are allowed")]
    HiddenAdvantageTooLong(usize),
    #[error("Screenshot is not a data URI")]
    InvalidScreenshot,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    #[error("Storage quota exceeded")]
    QuotaExceeded,
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Non-fatal failure to persist history, the in-memory list is still updated.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Failed to save card history: {0}")]
pub struct PersistenceWarning(pub String);

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
    #[error("{event} is not accepted while the session is {state:?}")]
    Rejected {
        state: SessionState,
        event: &'static str,
    },
}

pub type Result<T> = core::result::Result<T, SessionError>;

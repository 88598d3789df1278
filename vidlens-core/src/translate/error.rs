use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TranslationError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("translation provider returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed translation response: {0}")]
    MalformedResponse(String),
    #[error("translation timed out after {0:?}")]
    Timeout(Duration),
    #[error("{} field(s) failed to translate", .failures.len())]
    Incomplete { failures: Vec<FieldFailure> },
}

impl TranslationError {
    /// Worth another attempt: the provider may answer differently next time.
    pub fn is_transient(&self) -> bool {
        match self {
            TranslationError::Transport(_) | TranslationError::Timeout(_) => true,
            TranslationError::Status { status, .. } => *status == 429 || *status >= 500,
            TranslationError::MalformedResponse(_) | TranslationError::Incomplete { .. } => false,
        }
    }
}

/// One field that kept its original text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldFailure {
    pub field: String,
    pub reason: String,
}

impl fmt::Display for FieldFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.reason)
    }
}

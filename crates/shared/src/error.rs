use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    InvalidState,
    InvalidKeyFormat,
    InvalidMessage,
    InvalidConfig,
    Serialization,
    Store,
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Invalid state name - {0}")]
    InvalidState(String),
    #[error("Invalid key format - {0}")]
    InvalidKeyFormat(String),
    #[error("Invalid message at index {index}: {reason}")]
    InvalidMessage { index: usize, reason: String },
    #[error("Invalid pipeline configuration: {0}")]
    InvalidConfig(String),
    #[error("action codec failed: {0}")]
    Serialization(#[source] anyhow::Error),
    #[error("store operation failed: {0}")]
    Store(#[source] anyhow::Error),
    /// A per-member move stopped part way; `moved` members already live at `to`.
    #[error("move {from} -> {to} stopped after {moved} of {attempted} members: {source}")]
    PartialMove {
        from: String,
        to: String,
        moved: usize,
        attempted: usize,
        #[source]
        source: anyhow::Error,
    },
    /// At least `registered` messages reached the store before the failure.
    #[error("registration stopped after {registered} of {total} messages: {source}")]
    PartialRegistration {
        registered: usize,
        total: usize,
        #[source]
        source: anyhow::Error,
    },
}

impl PipelineError {
    pub fn invalid_message(index: usize, reason: impl Into<String>) -> Self {
        Self::InvalidMessage {
            index,
            reason: reason.into(),
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidState(_) => ErrorCode::InvalidState,
            Self::InvalidKeyFormat(_) => ErrorCode::InvalidKeyFormat,
            Self::InvalidMessage { .. } => ErrorCode::InvalidMessage,
            Self::InvalidConfig(_) => ErrorCode::InvalidConfig,
            Self::Serialization(_) => ErrorCode::Serialization,
            Self::Store(_) | Self::PartialMove { .. } | Self::PartialRegistration { .. } => {
                ErrorCode::Store
            }
        }
    }

    /// True for the errors raised before any store call was issued.
    pub fn is_validation(&self) -> bool {
        matches!(
            self.code(),
            ErrorCode::InvalidState
                | ErrorCode::InvalidKeyFormat
                | ErrorCode::InvalidMessage
                | ErrorCode::InvalidConfig
        )
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;

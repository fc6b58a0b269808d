//! Error taxonomy shared by every macromaker crate
//!
//! Precondition violations (`InvalidState`, `OutOfRange`, `NotFound`,
//! `InvalidShortcut`) go straight back to the caller. I/O-adjacent failures
//! (`Deserialization`, `PlaybackInjectionFailed`, `Io`) are the ones the
//! controller recovers from and turns into a user-visible message.

use serde::{Deserialize, Serialize, Serializer};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("index {index} out of range for {len} shortcuts")]
    OutOfRange { index: usize, len: usize },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid shortcut: {0}")]
    InvalidShortcut(String),

    #[error("could not read macro: {0}")]
    Deserialization(String),

    #[error("could not inject action: {0}")]
    PlaybackInjectionFailed(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Stable machine-readable code for each error kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    InvalidState,
    OutOfRange,
    NotFound,
    InvalidShortcut,
    DeserializationError,
    PlaybackInjectionFailed,
    Io,
}

impl Error {
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState(message.into())
    }

    pub fn not_found(name: &str) -> Self {
        Self::NotFound(format!("no shortcut registered as '{}'", name))
    }

    pub fn invalid_shortcut(spec: &str, reason: &str) -> Self {
        Self::InvalidShortcut(format!("'{}': {}", spec, reason))
    }

    pub fn deserialization(message: impl Into<String>) -> Self {
        Self::Deserialization(message.into())
    }

    pub fn injection_failed(message: impl Into<String>) -> Self {
        Self::PlaybackInjectionFailed(message.into())
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidState(_) => ErrorCode::InvalidState,
            Self::OutOfRange { .. } => ErrorCode::OutOfRange,
            Self::NotFound(_) => ErrorCode::NotFound,
            Self::InvalidShortcut(_) => ErrorCode::InvalidShortcut,
            Self::Deserialization(_) => ErrorCode::DeserializationError,
            Self::PlaybackInjectionFailed(_) => ErrorCode::PlaybackInjectionFailed,
            Self::Io(_) => ErrorCode::Io,
        }
    }

    /// True for failures caused by the outside world rather than API misuse.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Deserialization(_) | Self::PlaybackInjectionFailed(_) | Self::Io(_)
        )
    }
}

#[derive(Serialize)]
struct Report<'a> {
    code: ErrorCode,
    message: &'a str,
}

impl Serialize for Error {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let message = self.to_string();
        Report {
            code: self.code(),
            message: &message,
        }
        .serialize(serializer)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::Deserialization(e.to_string())
    }
}

//! Error types for YM file parsing and playback.

use thiserror::Error;

/// Result type for YM operations.
pub type Result<T> = std::result::Result<T, YmError>;

/// Errors raised while loading a YM file.
///
/// Parsers fail fast: no chip or player state is touched before the whole
/// file has decoded successfully.
#[derive(Error, Debug)]
pub enum YmError {
    /// The file does not start with a known YM magic.
    #[error("not a YM file (unknown magic)")]
    InvalidMagic,

    /// A structural problem: truncation, bad signature, inconsistent field.
    #[error("malformed YM file: {0}")]
    MalformedFile(String),

    /// The frame count exceeds the sanity limit.
    #[error("YM frame count {frames} exceeds limit of {limit}")]
    TooLarge {
        /// Frame count declared by the file.
        frames: u32,
        /// Maximum accepted frame count.
        limit: u32,
    },

    /// A recognised but unsupported YM variant.
    #[error("unsupported YM version: {0}")]
    UnsupportedVersion(String),
}

impl From<String> for YmError {
    fn from(message: String) -> Self {
        YmError::MalformedFile(message)
    }
}

impl From<&str> for YmError {
    fn from(message: &str) -> Self {
        YmError::MalformedFile(message.to_string())
    }
}

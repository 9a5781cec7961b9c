//! Error types for PT3 module parsing.

use thiserror::Error;

/// Result type for PT3 operations.
pub type Result<T> = std::result::Result<T, Pt3Error>;

/// Errors raised while loading a PT3 module.
#[derive(Error, Debug)]
pub enum Pt3Error {
    /// The header carries neither a ProTracker nor a Vortex Tracker
    /// signature.
    #[error("not a PT3 module (missing tracker signature)")]
    InvalidMagic,

    /// A structural problem: truncation, inconsistent pointer, bad loop.
    #[error("malformed PT3 module: {0}")]
    MalformedFile(String),

    /// A pattern bytecode stream has no terminator within the safety cap.
    #[error("pattern stream for channel {channel} exceeds {limit} bytes")]
    TooLarge {
        /// Channel index (0-2) of the runaway stream.
        channel: usize,
        /// Safety cap in bytes.
        limit: usize,
    },
}

impl From<String> for Pt3Error {
    fn from(message: String) -> Self {
        Pt3Error::MalformedFile(message)
    }
}

impl From<&str> for Pt3Error {
    fn from(message: &str) -> Self {
        Pt3Error::MalformedFile(message.to_string())
    }
}

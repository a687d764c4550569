//! Error types for faststart-media.

use thiserror::Error;

/// Result type for faststart-media operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for faststart-media operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// Fewer unread bytes than a get or bulk copy requires.
    #[error("Buffer underflow: need {need} bytes, have {have}")]
    BufferUnderflow { need: u64, have: u64 },

    /// Less room left than a put requires.
    #[error("Buffer overflow: need {need} bytes, have {have}")]
    BufferOverflow { need: u64, have: u64 },

    /// Position past the readable extent.
    #[error("Position {position} is bigger than size {size}")]
    BadPosition { position: u64, size: u64 },

    /// Limit past the buffer capacity.
    #[error("New limit {limit} is bigger than capacity {capacity}")]
    BadLimit { limit: u64, capacity: u64 },

    /// Source offset past the end of the source slice.
    #[error("Index {index} out of bounds in length {length}")]
    IndexOutOfBounds { index: u64, length: u64 },

    /// Backing storage could not grow.
    #[error("Failed to allocate {requested} bytes")]
    AllocationFailure { requested: u64 },

    /// Structural inconsistency inside the moov atom.
    #[error("Malformed atom: {0}")]
    MalformedAtom(String),

    /// A nested atom claims more bytes than are available.
    #[error("Bad atom size: {size} exceeds remaining {remaining}")]
    BadAtomSize { size: u64, remaining: u64 },

    /// The moov atom is compressed (cmov).
    #[error("Compressed moov atoms are not supported")]
    CompressedMoov,
}

impl Error {
    /// Create a malformed atom error.
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedAtom(msg.into())
    }

    /// Whether this error is a cursor or storage contract violation rather
    /// than a problem with the container itself.
    pub fn is_buffer_error(&self) -> bool {
        matches!(
            self,
            Self::BufferUnderflow { .. }
                | Self::BufferOverflow { .. }
                | Self::BadPosition { .. }
                | Self::BadLimit { .. }
                | Self::IndexOutOfBounds { .. }
                | Self::AllocationFailure { .. }
        )
    }
}

//! Error types for the max3ds library.

use thiserror::Error;

/// Main error type for 3DS decoding and scene building.
///
/// Every decode error is terminal: no partial model or scene survives a
/// failed decode, and retry is the caller's responsibility.
#[derive(Error, Debug)]
pub enum Error {
    /// Unrecognized top-level chunk id
    #[error("Bad magic number: unrecognized top-level chunk id {0:#06x}")]
    BadMagicNumber(u16),

    /// Chunk declared a length smaller than its own 6-byte header
    #[error("Malformed chunk {id:#06x}: declared length {length} is below the header size")]
    MalformedChunk { id: u16, length: u32 },

    /// Consumed bytes differ from the declared length at chunk release
    #[error("Chunk {id:#06x} length mismatch: declared {expected} bytes, consumed {actual}")]
    ChunkLengthMismatch { id: u16, expected: u32, actual: u32 },

    /// Buffer exhausted before a required read completed
    #[error("Unexpected end of data at offset {0}")]
    UnexpectedEof(usize),

    /// A chunk expected to carry one of several alternative value encodings
    /// closed without any
    #[error("Chunk {id:#06x} closed without a recognized value")]
    MissingRequiredValue { id: u16 },

    /// A hierarchy node referenced a parent id that was never declared
    #[error("Node {name:?} references parent id {parent_id} that was never declared")]
    InconsistentHierarchy { name: String, parent_id: i16 },

    /// Archive entry not found by name
    #[error("Entry not found: {0}")]
    EntryNotFound(String),

    /// I/O error from the archive boundary
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an "other" error from a string.
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }
}

/// Result type alias for 3DS operations.
pub type Result<T> = std::result::Result<T, Error>;

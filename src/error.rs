//! BLOOMFILE - Custom Error Types
//! Defines the error hierarchy for filter construction, membership and persistence.

use std::fmt;

use thiserror::Error;

/// Custom Result type for the bloomfile crate.
pub type Result<T> = std::result::Result<T, BloomError>;

/// The file operation that was in progress when an I/O error occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoStage {
    Open,
    WriteHeader,
    WriteData,
    Flush,
    ReadHeader,
    ReadData,
}

impl fmt::Display for IoStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            IoStage::Open => "opening file",
            IoStage::WriteHeader => "writing header",
            IoStage::WriteData => "writing bit data",
            IoStage::Flush => "flushing file",
            IoStage::ReadHeader => "reading header",
            IoStage::ReadData => "reading bit data",
        };
        f.write_str(s)
    }
}

/// Error types for the Bloom filter.
#[derive(Error, Debug)]
pub enum BloomError {
    /// Construction parameters outside their valid range.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// The bit buffer or scratch array could not be allocated.
    #[error("Out of memory: failed to allocate {bytes} bytes")]
    OutOfMemory { bytes: usize },

    /// The filter holds no buffers (never built, released, or a failed load).
    #[error("Filter is not ready")]
    NotReady,

    /// I/O errors from save/load, tagged with the failing step.
    #[error("I/O error while {stage}: {source}")]
    Io {
        stage: IoStage,
        #[source]
        source: std::io::Error,
    },

    /// The file is not a filter dump, or its header disagrees with itself.
    #[error("Corrupt filter file: {0}")]
    CorruptFormat(String),
}

impl BloomError {
    pub(crate) fn io(stage: IoStage, source: std::io::Error) -> Self {
        BloomError::Io { stage, source }
    }

    /// Returns true for errors caused by file content rather than the file system.
    pub fn is_corrupt(&self) -> bool {
        matches!(self, BloomError::CorruptFormat(_))
    }
}

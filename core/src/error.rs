use thiserror::Error;

use crate::extract::FileType;

/// Invalid chunking parameters. Raised eagerly, never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("chunk_size must be at least 1")]
    ZeroChunkSize,
    #[error("overlap ({overlap}) must be less than chunk_size ({chunk_size})")]
    OverlapTooLarge { chunk_size: usize, overlap: usize },
}

/// Failure to turn uploaded bytes into plain text.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("text extraction from {0} files is not supported")]
    Unsupported(FileType),
    #[error("file is not valid UTF-8 text: {0}")]
    Decode(#[from] std::str::Utf8Error),
    #[error("no text content found")]
    Empty,
}

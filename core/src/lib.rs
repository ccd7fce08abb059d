//! In-memory TF-IDF search over chunks of uploaded documents.

pub mod chunker;
pub mod config;
pub mod error;
pub mod extract;
pub mod index;
pub mod tokenizer;
pub mod vector;

pub use chunker::{chunk, Chunker};
pub use config::ChunkingConfig;
pub use error::{ConfigError, ExtractionError};
pub use extract::{extract_text, FileType};
pub use index::{Chunk, ChunkVectors, DocumentIndex, IndexStats, Recompute, SearchHit, SharedIndex};
pub use tokenizer::{tokenize, Term};

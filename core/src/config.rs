use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_CHUNK_SIZE: usize = 500;
pub const DEFAULT_OVERLAP: usize = 50;
pub const DEFAULT_K: usize = 5;

/// Word-window parameters used when splitting a document into chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkingConfig {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_overlap")]
    pub overlap: usize,
}

fn default_chunk_size() -> usize { DEFAULT_CHUNK_SIZE }
fn default_overlap() -> usize { DEFAULT_OVERLAP }

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self { chunk_size: DEFAULT_CHUNK_SIZE, overlap: DEFAULT_OVERLAP }
    }
}

impl ChunkingConfig {
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self, ConfigError> {
        let cfg = Self { chunk_size, overlap };
        cfg.validate()?;
        Ok(cfg)
    }

    /// Checks that the window advances by at least one word per step.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunk_size == 0 {
            return Err(ConfigError::ZeroChunkSize);
        }
        if self.overlap >= self.chunk_size {
            return Err(ConfigError::OverlapTooLarge { chunk_size: self.chunk_size, overlap: self.overlap });
        }
        Ok(())
    }

    pub fn stride(&self) -> usize {
        self.chunk_size - self.overlap
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = ChunkingConfig::default();
        assert_eq!(cfg.validate(), Ok(()));
        assert_eq!(cfg.stride(), 450);
    }

    #[test]
    fn rejects_bad_windows() {
        assert_eq!(ChunkingConfig::new(0, 0), Err(ConfigError::ZeroChunkSize));
        assert_eq!(
            ChunkingConfig::new(3, 3),
            Err(ConfigError::OverlapTooLarge { chunk_size: 3, overlap: 3 })
        );
        assert!(ChunkingConfig::new(3, 7).is_err());
        assert!(ChunkingConfig::new(1, 0).is_ok());
    }
}

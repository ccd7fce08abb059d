use crate::config::ChunkingConfig;
use crate::error::ConfigError;

/// Splits documents into overlapping windows of whitespace-separated words.
#[derive(Debug, Clone, Copy, Default)]
pub struct Chunker {
    config: ChunkingConfig,
}

impl Chunker {
    pub fn new(config: ChunkingConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> ChunkingConfig {
        self.config
    }

    /// Windows of up to `chunk_size` words, each starting `stride` words after
    /// the previous one. The last window may be short and is always emitted.
    pub fn chunk(&self, text: &str) -> Vec<String> {
        let words: Vec<&str> = text.split_whitespace().collect();
        let size = self.config.chunk_size;
        let stride = self.config.stride();

        let mut chunks = Vec::new();
        let mut start = 0;
        while start < words.len() {
            let end = (start + size).min(words.len());
            chunks.push(words[start..end].join(" "));
            if end == words.len() {
                break;
            }
            start += stride;
        }
        chunks
    }
}

/// One-shot chunking that validates the window parameters first.
pub fn chunk(text: &str, chunk_size: usize, overlap: usize) -> Result<Vec<String>, ConfigError> {
    let chunker = Chunker::new(ChunkingConfig::new(chunk_size, overlap)?)?;
    Ok(chunker.chunk(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlapping_windows() {
        let chunks = chunk("a b c d e f g", 3, 1).unwrap();
        assert_eq!(chunks, vec!["a b c", "c d e", "e f g"]);
    }

    #[test]
    fn short_final_window_is_emitted() {
        let chunks = chunk("a b c d e f", 3, 1).unwrap();
        assert_eq!(chunks, vec!["a b c", "c d e", "e f"]);
    }

    #[test]
    fn text_shorter_than_window() {
        assert_eq!(chunk("  one\ttwo\n", 5, 2).unwrap(), vec!["one two"]);
    }

    #[test]
    fn empty_text_yields_no_chunks() {
        assert!(chunk("", 3, 1).unwrap().is_empty());
        assert!(chunk(" \n\t ", 3, 1).unwrap().is_empty());
    }

    #[test]
    fn default_uses_default_config() {
        let chunker = Chunker::default();
        assert_eq!(chunker.config(), ChunkingConfig::default());
        let words = vec!["w"; 600].join(" ");
        let chunks = chunker.chunk(&words);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[1].split_whitespace().count(), 150);
    }

    #[test]
    fn no_overlap() {
        assert_eq!(chunk("a b c d", 2, 0).unwrap(), vec!["a b", "c d"]);
    }

    #[test]
    fn overlap_not_smaller_than_size_is_rejected() {
        assert!(matches!(chunk("a b c", 3, 3), Err(ConfigError::OverlapTooLarge { .. })));
        assert!(matches!(chunk("a b c", 2, 5), Err(ConfigError::OverlapTooLarge { .. })));
        assert_eq!(chunk("a b c", 0, 0), Err(ConfigError::ZeroChunkSize));
    }
}

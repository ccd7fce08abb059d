use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::chunker::Chunker;
use crate::tokenizer::{tokenize, Term};
use crate::vector::{cosine_similarity, term_frequency, CorpusStats, TfIdfVector};

/// A stored window of a document's text. Identified by its position in the index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub document_id: String,
    pub filename: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub document_id: String,
    pub filename: String,
    pub chunk_text: String,
    pub score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IndexStats {
    pub documents: usize,
    pub chunks: usize,
    pub vocabulary: usize,
}

/// Source of per-chunk TF-IDF vectors during a search.
///
/// Vectors depend on global corpus statistics, so any implementation that
/// keeps state between searches must drop it in `invalidate`, which the index
/// calls after every ingestion.
pub trait ChunkVectors: Send + Sync {
    fn vector(&self, position: usize, chunk: &Chunk, stats: &CorpusStats<'_>) -> TfIdfVector;

    fn invalidate(&mut self) {}
}

/// Recomputes every chunk vector on each query: O(chunks x chunk length).
#[derive(Debug, Default, Clone, Copy)]
pub struct Recompute;

impl ChunkVectors for Recompute {
    fn vector(&self, _position: usize, chunk: &Chunk, stats: &CorpusStats<'_>) -> TfIdfVector {
        stats.tfidf(&term_frequency(&tokenize(&chunk.text)))
    }
}

/// In-memory TF-IDF index over document chunks.
///
/// The vocabulary is the key set of `doc_freq`; every entry is at least 1
/// and at most the number of stored chunks.
pub struct DocumentIndex<V: ChunkVectors = Recompute> {
    chunks: Vec<Chunk>,
    doc_freq: HashMap<Term, u32>,
    vectors: V,
}

impl Default for DocumentIndex<Recompute> {
    fn default() -> Self { Self::new() }
}

impl DocumentIndex<Recompute> {
    pub fn new() -> Self { Self::with_vectors(Recompute) }
}

impl<V: ChunkVectors> DocumentIndex<V> {
    pub fn with_vectors(vectors: V) -> Self {
        Self { chunks: Vec::new(), doc_freq: HashMap::new(), vectors }
    }

    /// Store each chunk and count its distinct terms once in `doc_freq`.
    pub fn ingest<I, S>(&mut self, document_id: &str, filename: &str, chunks: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let before = self.chunks.len();
        for text in chunks {
            let text = text.into();
            let unique: HashSet<Term> = tokenize(&text).into_iter().collect();
            for term in unique {
                *self.doc_freq.entry(term).or_insert(0) += 1;
            }
            self.chunks.push(Chunk { document_id: document_id.to_string(), filename: filename.to_string(), text });
        }
        self.vectors.invalidate();
        tracing::debug!(
            document_id,
            filename,
            added = self.chunks.len() - before,
            total_chunks = self.chunks.len(),
            vocabulary = self.doc_freq.len(),
            "ingested document"
        );
    }

    /// Chunk `text` and ingest it. Returns the number of chunks stored.
    pub fn ingest_text(&mut self, document_id: &str, filename: &str, text: &str, chunker: &Chunker) -> usize {
        let chunks = chunker.chunk(text);
        let n = chunks.len();
        self.ingest(document_id, filename, chunks);
        n
    }

    pub fn corpus_stats(&self) -> CorpusStats<'_> {
        CorpusStats::new(&self.doc_freq, self.chunks.len())
    }

    /// Rank chunks by cosine similarity to `query`, best first, at most `k`.
    /// Chunks scoring zero are left out; equal scores keep ingestion order.
    pub fn search(&self, query: &str, k: usize) -> Vec<SearchHit> {
        if k == 0 || self.chunks.is_empty() {
            return Vec::new();
        }
        let stats = self.corpus_stats();
        let query_vec = stats.tfidf(&term_frequency(&tokenize(query)));
        if query_vec.is_empty() {
            return Vec::new();
        }

        let mut scored: Vec<(usize, f64)> = self
            .chunks
            .iter()
            .enumerate()
            .filter_map(|(pos, chunk)| {
                let sim = cosine_similarity(&query_vec, &self.vectors.vector(pos, chunk, &stats));
                (sim > 0.0).then_some((pos, sim))
            })
            .collect();
        // stable: ties stay in ingestion order
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        scored.truncate(k);
        tracing::debug!(query, k, hits = scored.len(), total_chunks = stats.total_chunks, "search");

        scored
            .into_iter()
            .map(|(pos, score)| {
                let chunk = &self.chunks[pos];
                SearchHit {
                    document_id: chunk.document_id.clone(),
                    filename: chunk.filename.clone(),
                    chunk_text: chunk.text.clone(),
                    score,
                }
            })
            .collect()
    }

    pub fn len(&self) -> usize { self.chunks.len() }

    pub fn is_empty(&self) -> bool { self.chunks.is_empty() }

    pub fn chunks(&self) -> &[Chunk] { &self.chunks }

    pub fn doc_freq(&self, term: &str) -> u32 {
        self.doc_freq.get(term).copied().unwrap_or(0)
    }

    pub fn vocabulary(&self) -> impl Iterator<Item = &str> {
        self.doc_freq.keys().map(String::as_str)
    }

    pub fn vocabulary_size(&self) -> usize { self.doc_freq.len() }

    /// Chunks of one document in ingestion order.
    pub fn document_chunks(&self, document_id: &str) -> Vec<&Chunk> {
        self.chunks.iter().filter(|c| c.document_id == document_id).collect()
    }

    pub fn document_count(&self) -> usize {
        self.chunks.iter().map(|c| c.document_id.as_str()).collect::<HashSet<_>>().len()
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats { documents: self.document_count(), chunks: self.len(), vocabulary: self.vocabulary_size() }
    }
}

/// Cloneable handle to one index shared across request handlers.
///
/// Ingestion holds the write lock for the whole document; searches hold the
/// read lock, so each query sees one consistent corpus snapshot.
pub struct SharedIndex<V: ChunkVectors = Recompute> {
    inner: Arc<RwLock<DocumentIndex<V>>>,
}

impl<V: ChunkVectors> Clone for SharedIndex<V> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl Default for SharedIndex<Recompute> {
    fn default() -> Self { Self::new(DocumentIndex::new()) }
}

impl<V: ChunkVectors> SharedIndex<V> {
    pub fn new(index: DocumentIndex<V>) -> Self {
        Self { inner: Arc::new(RwLock::new(index)) }
    }

    pub fn ingest<I, S>(&self, document_id: &str, filename: &str, chunks: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inner.write().ingest(document_id, filename, chunks);
    }

    pub fn ingest_text(&self, document_id: &str, filename: &str, text: &str, chunker: &Chunker) -> usize {
        // chunk outside the lock; only the index update is exclusive
        let chunks = chunker.chunk(text);
        let n = chunks.len();
        self.inner.write().ingest(document_id, filename, chunks);
        n
    }

    pub fn search(&self, query: &str, k: usize) -> Vec<SearchHit> {
        self.inner.read().search(query, k)
    }

    pub fn stats(&self) -> IndexStats {
        self.inner.read().stats()
    }

    pub fn document_chunks(&self, document_id: &str) -> Vec<Chunk> {
        self.inner.read().document_chunks(document_id).into_iter().cloned().collect()
    }

    /// Run `f` against a consistent read-locked view of the index.
    pub fn read<R>(&self, f: impl FnOnce(&DocumentIndex<V>) -> R) -> R {
        f(&self.inner.read())
    }
}

use std::collections::{BTreeMap, HashMap};

use crate::tokenizer::Term;

/// Relative frequency of each term within one chunk or query.
///
/// Ordered maps keep summation order fixed, so equal inputs always produce
/// bit-identical scores.
pub type TermFrequencyVector = BTreeMap<Term, f64>;
pub type TfIdfVector = BTreeMap<Term, f64>;

/// Corpus-wide statistics a TF-IDF vector is computed against.
#[derive(Debug, Clone, Copy)]
pub struct CorpusStats<'a> {
    pub doc_freq: &'a HashMap<Term, u32>,
    pub total_chunks: usize,
}

impl<'a> CorpusStats<'a> {
    pub fn new(doc_freq: &'a HashMap<Term, u32>, total_chunks: usize) -> Self {
        Self { doc_freq, total_chunks }
    }

    /// ln(N / (1 + df)); `None` for terms never seen in the corpus.
    pub fn idf(&self, term: &str) -> Option<f64> {
        let df = *self.doc_freq.get(term)?;
        Some((self.total_chunks as f64 / (1.0 + df as f64)).ln())
    }

    pub fn tfidf(&self, tf: &TermFrequencyVector) -> TfIdfVector {
        tfidf(tf, self.doc_freq, self.total_chunks)
    }
}

pub fn term_frequency<S: AsRef<str>>(terms: &[S]) -> TermFrequencyVector {
    let mut counts: BTreeMap<Term, u32> = BTreeMap::new();
    for t in terms {
        *counts.entry(t.as_ref().to_string()).or_insert(0) += 1;
    }
    let total = terms.len() as f64;
    counts.into_iter().map(|(t, c)| (t, c as f64 / total)).collect()
}

/// Weights each known term by `tf * ln(N / (1 + df))`. Terms missing from
/// `doc_freq` are dropped rather than zero-filled.
pub fn tfidf(tf: &TermFrequencyVector, doc_freq: &HashMap<Term, u32>, total_chunks: usize) -> TfIdfVector {
    if total_chunks == 0 {
        return TfIdfVector::new();
    }
    let stats = CorpusStats::new(doc_freq, total_chunks);
    tf.iter()
        .filter_map(|(term, tf_value)| Some((term.clone(), tf_value * stats.idf(term)?)))
        .collect()
}

fn norm(v: &TfIdfVector) -> f64 {
    v.values().map(|w| w * w).sum::<f64>().sqrt()
}

/// Cosine of the angle between two sparse vectors. Zero when either vector
/// has zero norm.
pub fn cosine_similarity(a: &TfIdfVector, b: &TfIdfVector) -> f64 {
    let (na, nb) = (norm(a), norm(b));
    if na == 0.0 || nb == 0.0 {
        return 0.0;
    }
    // keys present in only one vector contribute nothing to the dot product;
    // shared keys contribute tf_a * tf_b * idf^2, so the sum is never negative
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    let dot: f64 = small
        .iter()
        .filter_map(|(term, w)| large.get(term).map(|o| w * o))
        .sum();
    // rounding can push identical vectors just past 1
    (dot / (na * nb)).min(1.0)
}

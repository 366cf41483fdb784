use std::collections::HashMap;

use crate::text::tokenize;

const BM25_K1: f32 = 1.5;
const BM25_B: f32 = 0.75;

/// Okapi BM25 over a fixed corpus.
///
/// There is no incremental update: growing the corpus means fitting a new
/// index so that document frequencies and the average length describe the
/// whole current corpus.
#[derive(Debug, Clone, Default)]
pub struct Bm25Index {
    term_freqs: Vec<HashMap<String, u32>>,
    doc_lengths: Vec<usize>,
    doc_freqs: HashMap<String, usize>,
    avg_doc_length: f32,
}

impl Bm25Index {
    #[must_use]
    pub fn fit<S: AsRef<str>>(corpus: &[S]) -> Self {
        let mut term_freqs = Vec::with_capacity(corpus.len());
        let mut doc_lengths = Vec::with_capacity(corpus.len());
        let mut doc_freqs = HashMap::<String, usize>::new();

        for doc in corpus {
            let tokens = tokenize(doc.as_ref());
            doc_lengths.push(tokens.len());
            let mut tf = HashMap::<String, u32>::new();
            for token in tokens {
                *tf.entry(token).or_default() += 1;
            }
            for term in tf.keys() {
                *doc_freqs.entry(term.clone()).or_default() += 1;
            }
            term_freqs.push(tf);
        }

        let total_length = doc_lengths.iter().sum::<usize>();
        let avg_doc_length = if doc_lengths.is_empty() {
            0.0
        } else {
            total_length as f32 / doc_lengths.len() as f32
        };

        Self {
            term_freqs,
            doc_lengths,
            doc_freqs,
            avg_doc_length,
        }
    }

    #[must_use]
    pub fn corpus_size(&self) -> usize {
        self.doc_lengths.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.doc_lengths.is_empty()
    }

    #[must_use]
    pub fn document_frequency(&self, term: &str) -> usize {
        self.doc_freqs.get(term).copied().unwrap_or(0)
    }

    /// Raw BM25 score per document, aligned with corpus order.
    ///
    /// Repeated query tokens count once per occurrence. Unknown tokens add
    /// nothing.
    #[must_use]
    pub fn score(&self, query: &str) -> Vec<f32> {
        let mut scores = vec![0.0f32; self.corpus_size()];
        if scores.is_empty() {
            return scores;
        }

        let n = self.corpus_size() as f32;
        // An all-empty corpus has no length to normalize against.
        let avg_doc_length = if self.avg_doc_length > 0.0 {
            self.avg_doc_length
        } else {
            1.0
        };

        for token in tokenize(query) {
            let Some(&df) = self.doc_freqs.get(&token) else {
                continue;
            };
            let df = df as f32;
            let idf = ((n - df + 0.5) / (df + 0.5) + 1.0).ln();

            for (doc_idx, tf_map) in self.term_freqs.iter().enumerate() {
                let Some(&tf) = tf_map.get(&token) else {
                    continue;
                };
                let tf = tf as f32;
                let dl = self.doc_lengths[doc_idx] as f32;
                let denom = tf + BM25_K1 * (1.0 - BM25_B + BM25_B * dl / avg_doc_length);
                scores[doc_idx] += idf * tf * (BM25_K1 + 1.0) / denom;
            }
        }
        scores
    }
}

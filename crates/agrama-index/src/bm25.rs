//! BM25 inverted index.
//!
//! Term → posting list of (doc, term frequency), per-document lengths,
//! and corpus-level document frequency. Length normalization runs against
//! the running mean document length; ties break by ascending doc id so
//! output is stable.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use tracing::trace;

use agrama_core::config::Bm25Config;
use agrama_core::models::NodeId;

/// One scored lexical hit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LexicalHit {
    pub id: NodeId,
    pub score: f32,
}

/// The inverted index.
pub struct Bm25Index {
    config: Bm25Config,
    /// term → postings sorted by doc id.
    postings: DashMap<String, Vec<(NodeId, u32)>>,
    /// doc id → token count.
    doc_len: DashMap<NodeId, u32>,
    /// doc id → its terms, kept for removal.
    doc_terms: DashMap<NodeId, Vec<String>>,
    total_len: AtomicU64,
}

impl Bm25Index {
    pub fn new(config: Bm25Config) -> Self {
        Self {
            config,
            postings: DashMap::new(),
            doc_len: DashMap::new(),
            doc_terms: DashMap::new(),
            total_len: AtomicU64::new(0),
        }
    }

    /// Index (or re-index) a document from its token stream.
    pub fn index(&self, doc: NodeId, tokens: &[String]) {
        self.remove(doc);

        let mut tf: HashMap<&str, u32> = HashMap::new();
        for tok in tokens {
            *tf.entry(tok.as_str()).or_default() += 1;
        }

        for (term, count) in &tf {
            let mut list = self.postings.entry(term.to_string()).or_default();
            let pos = list.partition_point(|(id, _)| *id < doc);
            list.insert(pos, (doc, *count));
        }
        self.doc_len.insert(doc, tokens.len() as u32);
        self.doc_terms
            .insert(doc, tf.keys().map(|t| t.to_string()).collect());
        self.total_len
            .fetch_add(tokens.len() as u64, Ordering::Relaxed);
        trace!(doc = %doc, terms = tf.len(), "document indexed");
    }

    /// Drop a document from the index. Unknown ids are a no-op.
    pub fn remove(&self, doc: NodeId) {
        let Some((_, terms)) = self.doc_terms.remove(&doc) else {
            return;
        };
        for term in terms {
            let emptied = {
                let Some(mut list) = self.postings.get_mut(&term) else {
                    continue;
                };
                list.retain(|(id, _)| *id != doc);
                list.is_empty()
            };
            if emptied {
                self.postings.remove_if(&term, |_, list| list.is_empty());
            }
        }
        if let Some((_, len)) = self.doc_len.remove(&doc) {
            self.total_len.fetch_sub(len as u64, Ordering::Relaxed);
        }
    }

    pub fn doc_count(&self) -> usize {
        self.doc_len.len()
    }

    fn mean_doc_len(&self) -> f32 {
        let docs = self.doc_len.len();
        if docs == 0 {
            return 0.0;
        }
        self.total_len.load(Ordering::Relaxed) as f32 / docs as f32
    }

    /// Top-k documents for the query tokens, best first, ties by ascending
    /// doc id. Empty query or empty index returns an empty list.
    pub fn search(&self, query_tokens: &[String], k: usize) -> Vec<LexicalHit> {
        if k == 0 || query_tokens.is_empty() {
            return Vec::new();
        }
        let n = self.doc_count() as f32;
        if n == 0.0 {
            return Vec::new();
        }
        let mean_len = self.mean_doc_len().max(f32::EPSILON);
        let (k1, b) = (self.config.k1, self.config.b);

        let mut scores: HashMap<NodeId, f32> = HashMap::new();
        let mut seen_terms: std::collections::HashSet<&str> = std::collections::HashSet::new();
        for term in query_tokens {
            // Repeated query terms score once.
            if !seen_terms.insert(term.as_str()) {
                continue;
            }
            let Some(list) = self.postings.get(term.as_str()) else {
                continue;
            };
            let df = list.len() as f32;
            let idf = ((n - df + 0.5) / (df + 0.5) + 1.0).ln();
            for &(doc, tf) in list.iter() {
                let len = self.doc_len.get(&doc).map(|l| *l).unwrap_or(0) as f32;
                let tf = tf as f32;
                let denom = tf + k1 * (1.0 - b + b * len / mean_len);
                *scores.entry(doc).or_default() += idf * tf * (k1 + 1.0) / denom;
            }
        }

        let mut hits: Vec<LexicalHit> = scores
            .into_iter()
            .map(|(id, score)| LexicalHit { id, score })
            .collect();
        hits.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.id.cmp(&b.id))
        });
        hits.truncate(k);
        hits
    }
}

//! # agrama-index
//!
//! The two query indices and the embedding machinery behind the semantic
//! one: 32-byte-aligned Matryoshka embeddings with prefix resolutions, a
//! deterministic statistical fallback embedder, a hierarchical navigable
//! small-world graph for approximate nearest neighbors, and a BM25
//! inverted index with a pluggable tokenizer.

pub mod bm25;
pub mod embedding;
pub mod fallback;
pub mod hnsw;
pub mod simd;
pub mod tokenizer;

pub use bm25::Bm25Index;
pub use embedding::Embedding;
pub use fallback::StatisticalEmbedder;
pub use hnsw::HnswIndex;
pub use tokenizer::DefaultTokenizer;

/// Semantic and lexical index errors.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("unsupported matryoshka resolution {resolution} (full dimension {full})")]
    BadResolution { resolution: usize, full: usize },

    #[error("no embedding indexed for node {id:#x}")]
    EmbeddingNotFound { id: u64 },
}

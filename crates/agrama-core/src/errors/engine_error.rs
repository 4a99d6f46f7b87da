/// Primitive-engine errors.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("deadline exceeded after {elapsed_ms} ms")]
    DeadlineExceeded { elapsed_ms: u64 },

    #[error("too many in-flight primitives: {in_flight} >= {max}")]
    ResourceExhausted { in_flight: usize, max: usize },

    #[error("internal invariant violated: {detail}")]
    Internal { detail: String },
}

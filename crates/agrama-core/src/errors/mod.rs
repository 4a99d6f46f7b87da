//! Error taxonomy for the engine.
//!
//! One enum per failure domain, wrapped by [`AgramaError`]. Every variant
//! carries the offending values so a failure can be localized without a
//! debugger, and [`AgramaError::kind`] gives transports a stable
//! machine-readable discriminator.

pub mod crdt_error;
pub mod engine_error;
pub mod graph_error;
pub mod index_error;
pub mod storage_error;
pub mod validation_error;

pub use crdt_error::CrdtError;
pub use engine_error::EngineError;
pub use graph_error::GraphError;
pub use index_error::IndexError;
pub use storage_error::StorageError;
pub use validation_error::ValidationError;

/// Workspace-wide result alias.
pub type AgramaResult<T> = Result<T, AgramaError>;

/// Top-level error wrapping every failure domain.
#[derive(Debug, thiserror::Error)]
pub enum AgramaError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Index(#[from] IndexError),

    #[error(transparent)]
    Crdt(#[from] CrdtError),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

impl AgramaError {
    /// Stable machine-readable error kind for the wire.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Storage(StorageError::NotFound { .. }) => "not_found",
            Self::Storage(_) => "storage",
            Self::Graph(GraphError::NodeNotFound { .. }) => "not_found",
            Self::Graph(_) => "graph",
            Self::Index(IndexError::EmbeddingNotFound { .. }) => "not_found",
            Self::Index(_) => "index",
            Self::Crdt(CrdtError::MissingDependency { .. }) => "conflict",
            Self::Crdt(_) => "crdt",
            Self::Engine(EngineError::DeadlineExceeded { .. }) => "cancelled",
            Self::Engine(EngineError::Internal { .. }) => "internal",
            Self::Engine(_) => "engine",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_are_stable() {
        let e: AgramaError = ValidationError::NullByte.into();
        assert_eq!(e.kind(), "validation");

        let e: AgramaError = StorageError::NotFound {
            path: "a/b".into(),
        }
        .into();
        assert_eq!(e.kind(), "not_found");

        let e: AgramaError = EngineError::DeadlineExceeded { elapsed_ms: 10 }.into();
        assert_eq!(e.kind(), "cancelled");
    }
}

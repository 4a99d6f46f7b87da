/// Graph-store and traversal errors.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("no such node: {id:#x}")]
    NodeNotFound { id: u64 },

    #[error("edge endpoint missing: {src:#x} -> {dst:#x} ({which} does not exist)")]
    EndpointMissing { src: u64, dst: u64, which: &'static str },

    #[error("negative edge weight rejected: {weight}")]
    NegativeWeight { weight: f64 },
}

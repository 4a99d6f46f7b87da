/// Argument and path validation failures. Produced before any mutation.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("empty path")]
    EmptyPath,

    #[error("absolute path rejected: {path}")]
    AbsolutePath { path: String },

    #[error("parent-directory traversal rejected: {path}")]
    PathTraversal { path: String },

    #[error("path contains a null byte")]
    NullByte,

    #[error("path separator {separator:?} outside the configured set")]
    InvalidSeparator { separator: char },

    #[error("path escapes the configured root after normalization: {path}")]
    OutsideRoot { path: String },

    #[error("path too long: {length} bytes, max {max}")]
    PathTooLong { length: usize, max: usize },

    #[error("malformed argument {name}: {reason}")]
    MalformedArgument { name: String, reason: String },

    #[error("unknown primitive: {name}")]
    UnknownPrimitive { name: String },

    #[error("unknown transform: {name}")]
    UnknownTransform { name: String },

    #[error("invalid fusion weights: alpha={alpha}, beta={beta}, gamma={gamma} (each must be >= 0, sum <= 1)")]
    InvalidWeights { alpha: f32, beta: f32, gamma: f32 },
}

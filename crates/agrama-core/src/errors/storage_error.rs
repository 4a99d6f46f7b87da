/// Content-store errors.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("no content stored at path: {path}")]
    NotFound { path: String },

    #[error("path denied by policy: {path} ({reason})")]
    PathDenied { path: String, reason: String },

    #[error("out of space: write of {needed} bytes exceeds remaining budget {remaining}")]
    OutOfSpace { needed: u64, remaining: u64 },

    #[error("history reconstruction failed for {path} at version {version}: {reason}")]
    CorruptHistory {
        path: String,
        version: usize,
        reason: String,
    },
}

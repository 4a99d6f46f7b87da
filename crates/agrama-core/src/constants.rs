/// Agrama system version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Maximum history versions returned by the retrieve primitive.
pub const MAX_RETRIEVE_HISTORY: usize = 10;

/// Text values longer than this are queued for semantic + lexical indexing.
pub const INDEXING_THRESHOLD_BYTES: usize = 50;

/// Maximum path length accepted by the content store.
pub const MAX_PATH_BYTES: usize = 4096;

/// Maximum length of a single path segment.
pub const MAX_PATH_SEGMENT_BYTES: usize = 255;

/// Alignment (bytes) required for embedding buffers so width-8 f32
/// loads need no fix-ups.
pub const EMBEDDING_ALIGN: usize = 32;

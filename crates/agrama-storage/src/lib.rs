//! # agrama-storage
//!
//! The temporal content store: validated paths, current bytes plus an
//! ordered per-path version log, anchor+delta physical representation.
//! Reads are non-blocking; a failed write leaves the store unchanged.

pub mod delta;
pub mod path;
pub mod store;

pub use path::validate_path;
pub use store::{ContentStore, StoreStats};

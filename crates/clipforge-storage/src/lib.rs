//! Filesystem-backed persistence for generated artifacts.
//!
//! This crate provides:
//! - The artifact cache index (normalized prompt -> artifact path)
//! - The artifact store (collision-free files, published atomically)
//! - Atomic write helpers shared by both

pub mod artifacts;
pub mod cache;
pub mod error;
pub mod fs_utils;

pub use artifacts::ArtifactStore;
pub use cache::{ArtifactCache, FileArtifactCache, MemoryArtifactCache};
pub use error::{StorageError, StorageResult};

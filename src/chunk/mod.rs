//! Low-level 3DS chunk container format.
//!
//! A 3DS file is a tree of chunks. Every chunk starts with a 6-byte header:
//! a little-endian `u16` id followed by a little-endian `u32` total length
//! that includes the header itself. Chunks nest to arbitrary depth and a
//! container chunk ends exactly when its declared length is consumed.
//!
//! - [`format`] - The fixed chunk id table
//! - [`ChunkStream`] - Cursor with per-chunk byte accounting

pub mod format;
mod stream;

pub use stream::{ChunkState, ChunkStream};

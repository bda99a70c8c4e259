//! # max3ds
//!
//! Rust decoder for the 3D Studio (.3ds) binary mesh interchange format.
//!
//! The format is a length-delimited container of arbitrarily nested chunks,
//! each carrying a 2-byte id and a 4-byte total length. This crate parses
//! that container with strict byte accounting, decodes materials, triangle
//! meshes and the keyframe hierarchy into intermediate records, reconstructs
//! smoothed per-corner normals, and assembles everything into a renderable
//! transform/shape graph.
//!
//! ## Modules
//!
//! - [`util`] - Errors and math re-exports
//! - [`chunk`] - Low-level chunk stream and the chunk id table
//! - [`model`] - Intermediate records produced by the decode phase
//! - [`decode`] - Chunk dispatcher plus material/mesh/hierarchy decoders
//! - [`geom`] - Smoothed normal reconstruction
//! - [`scene`] - Scene graph types, assembler and incremental builder
//! - [`archive`] - Entry-access boundary used for texture resolution
//!
//! ## Example
//!
//! ```ignore
//! use max3ds::build_scene;
//!
//! let data = std::fs::read("table.3ds")?;
//! let scene = build_scene(&data, "table.3ds", None)?;
//! println!("{} shapes", scene.shape_count());
//! ```

pub mod archive;
pub mod chunk;
pub mod decode;
pub mod geom;
pub mod model;
pub mod scene;
pub mod util;

// Re-export commonly used types
pub use decode::decode;
pub use scene::builder::build_scene;
pub use util::{Error, Result};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::archive::{DirectoryArchive, MemoryArchive, ModelArchive};
    pub use crate::decode::decode;
    pub use crate::model::Model;
    pub use crate::scene::builder::{
        build_scene, BuildObserver, BuildPhase, ModelBuilder, SceneBuild,
    };
    pub use crate::scene::Scene;
    pub use crate::util::{Error, Result};
}

//! Computational geometry over decoded mesh records.

pub mod normals;

//! Mesh construction from accumulated geometry.

pub mod mesh_builder;
pub mod tangents;

pub use mesh_builder::{BuildError, MeshBuilder, MeshPart};
pub use tangents::{compute_flat_normals, compute_tangents};

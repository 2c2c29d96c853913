//! # OBJ Importer
//!
//! A runtime importer for Wavefront OBJ models with MTL material support.
//!
//! ## Features
//!
//! - **Resumable Parsing**: geometry is parsed in bounded line chunks
//! - **Object/Group Hierarchy**: `o`/`g`/`usemtl` handling with material
//!   continuity across boundaries
//! - **Mesh Splitting**: large groups are split under a configurable
//!   vertex/index ceiling
//! - **Tangent Generation**: per-vertex tangent space for normal mapping
//! - **Material Synthesis**: blend-mode classification plus albedo, normal
//!   and gloss image generation from Phong attributes and textures
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use obj_importer::import::{ImportOptions, Importer};
//! use obj_importer::materials::TextureSet;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let obj_text = std::fs::read_to_string("model.obj")?;
//!     let importer = Importer::new(
//!         "model.obj",
//!         obj_text,
//!         None,
//!         TextureSet::new(),
//!         ImportOptions::default(),
//!     )?;
//!     let model = importer.run();
//!     println!("built {} mesh parts", model.parts.len());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions, clippy::similar_names)]

pub mod builder;
pub mod dataset;
pub mod foundation;
pub mod import;
pub mod loaders;
pub mod materials;

pub use builder::{BuildError, MeshBuilder, MeshPart};
pub use dataset::DataSet;
pub use import::{ImportError, ImportEvent, ImportOptions, ImportedModel, Importer};
pub use loaders::{MtlParser, ObjParser};
pub use materials::{
    MaterialData, MaterialSynthesizer, SynthesizedMaterial, TextureData, TextureSet,
};

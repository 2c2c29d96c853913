//! Material descriptors, textures and material synthesis.

pub mod material_data;
pub mod material_map;
pub mod synthesizer;
pub mod texture;

pub use material_data::MaterialData;
pub use material_map::MaterialMap;
pub use synthesizer::{BlendMode, MaterialSynthesizer, ShaderPath, SynthesizedMaterial};
pub use texture::{TextureData, TextureError, TextureSet};

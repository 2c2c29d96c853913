//! Options controlling how a model is parsed and built.

use serde::{Deserialize, Serialize};

/// Default vertex/index ceiling for one mesh buffer.
pub const DEFAULT_MESH_BUFFER_CEILING: usize = 65_000;

/// Options to define how the model will be loaded and imported.
///
/// Mirrors the knobs a caller can turn per import job: axis conversion,
/// uniform rescaling, shading preferences and the mesh buffer ceiling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportOptions {
    /// Load the file assuming its vertical axis is Z instead of Y.
    pub z_up: bool,
    /// Consider the diffuse map as already lit (select an unlit shading path)
    /// when no other texture is present.
    pub lit_diffuse: bool,
    /// Select the specular-setup shading variant instead of the standard
    /// metallic workflow.
    pub specular_workflow: bool,
    /// Uniform rescaling for the model (1 = no rescaling).
    pub model_scaling: f32,
    /// Maximum number of vertices/indices per built mesh buffer. Rounded down
    /// to a multiple of 3 for triangle alignment when applied.
    pub mesh_buffer_ceiling: usize,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            z_up: true,
            lit_diffuse: false,
            specular_workflow: false,
            model_scaling: 1.0,
            mesh_buffer_ceiling: DEFAULT_MESH_BUFFER_CEILING,
        }
    }
}

//! Progress reporting for import jobs.

/// Phase an import job is currently in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImportPhase {
    /// Parsing OBJ geometry text
    #[default]
    Geometry,
    /// Parsing the material library
    MaterialLibrary,
    /// Synthesizing materials
    Materials,
    /// Building mesh parts
    Meshes,
    /// All phases complete
    Done,
}

/// Counters describing how far an import job has advanced.
///
/// Updated after every [`crate::import::Importer::advance`] call; totals
/// become known as their phase starts.
#[derive(Debug, Clone, Default)]
pub struct ImportProgress {
    /// Current phase
    pub phase: ImportPhase,
    /// Geometry lines consumed
    pub lines_parsed: usize,
    /// Total geometry lines
    pub lines_total: usize,
    /// Materials synthesized
    pub materials_built: usize,
    /// Total material descriptors
    pub materials_total: usize,
    /// Mesh parts emitted
    pub parts_built: usize,
    /// Objects fully built
    pub objects_built: usize,
    /// Total objects parsed
    pub objects_total: usize,
    /// Face groups fully consumed by the builder
    pub groups_built: usize,
    /// Total face groups parsed
    pub groups_total: usize,
}

impl ImportProgress {
    /// True once every phase has completed.
    pub fn is_done(&self) -> bool {
        self.phase == ImportPhase::Done
    }
}

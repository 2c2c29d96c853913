//! Import job orchestrator
//!
//! [`Importer`] drives one model import through its phases: geometry parsing,
//! material library parsing, material synthesis and mesh building. Every
//! [`Importer::advance`] call performs one bounded unit of work and returns an
//! [`ImportEvent`], so a caller-driven scheduler can interleave imports with
//! other work. Stopping between calls leaves the job incomplete but
//! internally consistent.

use thiserror::Error;

use crate::builder::{BuildError, MeshBuilder, MeshPart};
use crate::dataset::DEFAULT_NAME;
use crate::import::{ImportOptions, ImportPhase, ImportProgress};
use crate::loaders::obj_parser::{ObjParser, ParseProgress, ParsedGeometry};
use crate::loaders::MtlParser;
use crate::materials::{MaterialMap, MaterialSynthesizer, SynthesizedMaterial, TextureSet};

/// Job-fatal import errors. Everything else is logged and recovered from.
#[derive(Error, Debug)]
pub enum ImportError {
    /// The source name does not carry a supported extension.
    #[error("unsupported model format '{0}', expected a .obj file")]
    UnsupportedFormat(String),
    /// The source text holds no parseable content.
    #[error("source '{0}' is empty")]
    EmptyInput(String),
}

/// Notification returned by one [`Importer::advance`] call.
#[derive(Debug)]
pub enum ImportEvent {
    /// A chunk of geometry lines was parsed.
    GeometryProgress {
        /// Lines consumed so far
        lines_parsed: usize,
        /// Total line count
        lines_total: usize,
    },
    /// Geometry parsing completed.
    GeometryParsed {
        /// Number of parsed objects
        object_count: usize,
    },
    /// The material library was parsed (or found absent).
    MaterialLibraryParsed {
        /// Number of parsed descriptors
        material_count: usize,
    },
    /// One material was synthesized.
    MaterialBuilt {
        /// Material name
        name: String,
    },
    /// One mesh part was built.
    MeshPartBuilt {
        /// Part name
        name: String,
    },
    /// An object failed its build invariant; later objects continue.
    ObjectFailed {
        /// The invariant violation
        error: BuildError,
    },
    /// All phases are complete.
    Finished,
}

/// Finished import: mesh parts, synthesized materials and their pairing.
#[derive(Debug)]
pub struct ImportedModel {
    /// Built mesh parts across all objects, in build order
    pub parts: Vec<MeshPart>,
    /// Synthesized materials, in descriptor order (duplicates removed)
    pub materials: Vec<SynthesizedMaterial>,
    /// For each part, the index of its material in `materials`
    pub material_indices: Vec<Option<usize>>,
}

enum Phase {
    Geometry(ObjParser),
    MaterialLibrary(ParsedGeometry),
    Materials {
        synthesizer: MaterialSynthesizer,
        geometry: ParsedGeometry,
    },
    Meshes(MeshBuilder),
    Done,
}

/// Single-threaded, resumable import job for one OBJ source.
pub struct Importer {
    source_name: String,
    mtl_text: Option<String>,
    textures: Option<TextureSet>,
    options: ImportOptions,
    phase: Phase,
    progress: ImportProgress,
    materials: Vec<SynthesizedMaterial>,
    parts: Vec<MeshPart>,
    failures: Vec<BuildError>,
}

impl Importer {
    /// Create an import job.
    ///
    /// `source_name` identifies the model (its extension is validated up
    /// front); `mtl_text` is the material library content when the caller
    /// could resolve one; `textures` holds decoded images for the texture
    /// paths the library references.
    pub fn new(
        source_name: &str,
        obj_text: String,
        mtl_text: Option<String>,
        textures: TextureSet,
        options: ImportOptions,
    ) -> Result<Self, ImportError> {
        let lowercase = source_name.to_ascii_lowercase();
        if !lowercase.ends_with(".obj") {
            return Err(ImportError::UnsupportedFormat(source_name.to_string()));
        }
        if obj_text.trim().is_empty() {
            return Err(ImportError::EmptyInput(source_name.to_string()));
        }

        let parser = ObjParser::new(obj_text, &options);
        Ok(Self {
            source_name: source_name.to_string(),
            mtl_text,
            textures: Some(textures),
            options,
            phase: Phase::Geometry(parser),
            progress: ImportProgress::default(),
            materials: Vec::new(),
            parts: Vec::new(),
            failures: Vec::new(),
        })
    }

    /// Progress counters, consistent after every `advance` call.
    pub fn progress(&self) -> &ImportProgress {
        &self.progress
    }

    /// True once `advance` has returned [`ImportEvent::Finished`].
    pub fn is_finished(&self) -> bool {
        matches!(self.phase, Phase::Done)
    }

    /// Build errors collected so far.
    pub fn failures(&self) -> &[BuildError] {
        &self.failures
    }

    /// Perform one bounded unit of work.
    pub fn advance(&mut self) -> ImportEvent {
        match std::mem::replace(&mut self.phase, Phase::Done) {
            Phase::Geometry(mut parser) => match parser.step() {
                ParseProgress::InProgress {
                    lines_parsed,
                    lines_total,
                } => {
                    self.progress.lines_parsed = lines_parsed;
                    self.progress.lines_total = lines_total;
                    self.phase = Phase::Geometry(parser);
                    ImportEvent::GeometryProgress {
                        lines_parsed,
                        lines_total,
                    }
                }
                ParseProgress::Done => {
                    let geometry = parser.finish();
                    self.progress.lines_parsed = self.progress.lines_total;
                    self.progress.objects_total = geometry.data_set.objects.len();
                    self.progress.groups_total = geometry.data_set.group_count();
                    self.progress.phase = ImportPhase::MaterialLibrary;
                    if geometry.data_set.is_empty() {
                        log::warn!("'{}' contains no vertices", self.source_name);
                    }
                    let object_count = geometry.data_set.objects.len();
                    self.phase = Phase::MaterialLibrary(geometry);
                    ImportEvent::GeometryParsed { object_count }
                }
            },

            Phase::MaterialLibrary(geometry) => {
                let descriptors = match (&geometry.material_lib, &self.mtl_text) {
                    (Some(_), Some(text)) => MtlParser::parse(text),
                    (Some(lib), None) => {
                        log::warn!(
                            "material library '{}' referenced by '{}' was not provided",
                            lib,
                            self.source_name
                        );
                        Vec::new()
                    }
                    (None, _) => Vec::new(),
                };
                let material_count = descriptors.len();
                self.progress.materials_total = material_count.max(1);
                self.progress.phase = ImportPhase::Materials;

                let textures = self.textures.take().unwrap_or_default();
                let synthesizer = MaterialSynthesizer::new(descriptors, textures, &self.options);
                self.phase = Phase::Materials {
                    synthesizer,
                    geometry,
                };
                ImportEvent::MaterialLibraryParsed { material_count }
            }

            Phase::Materials {
                mut synthesizer,
                geometry,
            } => match synthesizer.build_next() {
                Some(material) => {
                    let name = material.name.clone();
                    self.materials.push(material);
                    self.progress.materials_built = self.materials.len();
                    self.phase = Phase::Materials {
                        synthesizer,
                        geometry,
                    };
                    ImportEvent::MaterialBuilt { name }
                }
                None => {
                    self.progress.phase = ImportPhase::Meshes;
                    self.phase =
                        Phase::Meshes(MeshBuilder::new(geometry.data_set, &self.options));
                    if self.materials.is_empty() {
                        log::warn!("no material library defined, using the default material");
                        self.materials.push(MaterialSynthesizer::default_material());
                        self.progress.materials_built = 1;
                        return ImportEvent::MaterialBuilt {
                            name: DEFAULT_NAME.to_string(),
                        };
                    }
                    // no material left to emit, move straight to meshes
                    self.advance()
                }
            },

            Phase::Meshes(mut builder) => match builder.build_next() {
                Some(Ok(part)) => {
                    let name = part.name.clone();
                    self.parts.push(part);
                    self.progress.parts_built = builder.parts_built();
                    self.progress.objects_built = builder.objects_built();
                    self.progress.groups_built = builder.groups_built();
                    self.phase = Phase::Meshes(builder);
                    ImportEvent::MeshPartBuilt { name }
                }
                Some(Err(error)) => {
                    log::error!("{}", error);
                    self.progress.objects_built = builder.objects_built();
                    self.progress.groups_built = builder.groups_built();
                    self.phase = Phase::Meshes(builder);
                    self.failures.push(error.clone());
                    ImportEvent::ObjectFailed { error }
                }
                None => {
                    self.progress.objects_built = builder.objects_built();
                    self.progress.groups_built = builder.groups_built();
                    self.progress.phase = ImportPhase::Done;
                    self.phase = Phase::Done;
                    ImportEvent::Finished
                }
            },

            Phase::Done => ImportEvent::Finished,
        }
    }

    /// Drive the job to completion and return the assembled model.
    pub fn run(mut self) -> ImportedModel {
        while !matches!(self.advance(), ImportEvent::Finished) {}
        self.into_model()
    }

    /// Assemble the final model from the work done so far.
    ///
    /// Parts are paired with materials by name; a part whose material is
    /// unknown is left unpaired with a warning.
    pub fn into_model(self) -> ImportedModel {
        let map = MaterialMap::from_names(self.materials.iter().map(|m| m.name.as_str()));
        let material_indices = self
            .parts
            .iter()
            .map(|part| {
                let name = part.material_name.as_deref().unwrap_or(DEFAULT_NAME);
                let index = map.get(name);
                if index.is_none() {
                    log::warn!("material '{}' for part '{}' not found", name, part.name);
                }
                index
            })
            .collect();
        ImportedModel {
            parts: self.parts,
            materials: self.materials,
            material_indices,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::materials::{BlendMode, TextureData};

    const CUBE_OBJ: &str = "\
mtllib box.mtl
o Box
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
usemtl Red
f 1 2 3 4
";

    const BOX_MTL: &str = "\
newmtl Red
Kd 1.0 0.0 0.0
d 0.5
";

    fn import(obj: &str, mtl: Option<&str>) -> ImportedModel {
        Importer::new(
            "model.obj",
            obj.to_string(),
            mtl.map(|s| s.to_string()),
            TextureSet::new(),
            ImportOptions::default(),
        )
        .expect("importer created")
        .run()
    }

    #[test]
    fn test_rejects_unsupported_extension() {
        let result = Importer::new(
            "model.fbx",
            "v 0 0 0\n".to_string(),
            None,
            TextureSet::new(),
            ImportOptions::default(),
        );
        assert!(matches!(result, Err(ImportError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_rejects_empty_source() {
        let result = Importer::new(
            "model.obj",
            "  \n".to_string(),
            None,
            TextureSet::new(),
            ImportOptions::default(),
        );
        assert!(matches!(result, Err(ImportError::EmptyInput(_))));
    }

    #[test]
    fn test_extension_check_is_case_insensitive() {
        let result = Importer::new(
            "MODEL.OBJ",
            "v 0 0 0\n".to_string(),
            None,
            TextureSet::new(),
            ImportOptions::default(),
        );
        assert!(result.is_ok());
    }

    #[test]
    fn test_full_import_with_material() {
        let model = import(CUBE_OBJ, Some(BOX_MTL));
        assert_eq!(model.parts.len(), 1);
        assert_eq!(model.materials.len(), 1);
        assert_eq!(model.materials[0].name, "Red");
        assert_eq!(model.materials[0].blend_mode, BlendMode::Transparent);
        assert_eq!(model.material_indices, vec![Some(0)]);
        // one quad, two triangles
        assert_eq!(model.parts[0].triangle_indices.len(), 6);
    }

    #[test]
    fn test_missing_library_gets_default_material() {
        let model = import(CUBE_OBJ, None);
        assert_eq!(model.materials.len(), 1);
        assert_eq!(model.materials[0].name, "default");
        // the part references "Red", which nothing provides
        assert_eq!(model.material_indices, vec![None]);
    }

    #[test]
    fn test_unreferenced_material_pairing_falls_back_to_default() {
        let obj = "\
o Plain
v 0 0 0
v 1 0 0
v 0 1 0
f 1 2 3
";
        let model = import(obj, None);
        assert_eq!(model.materials[0].name, "default");
        assert_eq!(model.material_indices, vec![Some(0)]);
    }

    #[test]
    fn test_event_sequence() {
        let mut importer = Importer::new(
            "model.obj",
            CUBE_OBJ.to_string(),
            Some(BOX_MTL.to_string()),
            TextureSet::new(),
            ImportOptions::default(),
        )
        .unwrap();

        assert!(matches!(
            importer.advance(),
            ImportEvent::GeometryParsed { object_count: 1 }
        ));
        assert!(matches!(
            importer.advance(),
            ImportEvent::MaterialLibraryParsed { material_count: 1 }
        ));
        assert!(matches!(importer.advance(), ImportEvent::MaterialBuilt { .. }));
        assert!(matches!(importer.advance(), ImportEvent::MeshPartBuilt { .. }));
        assert!(matches!(importer.advance(), ImportEvent::Finished));
        assert!(importer.is_finished());
        assert!(importer.progress().is_done());
    }

    #[test]
    fn test_progress_counters() {
        let mut importer = Importer::new(
            "model.obj",
            CUBE_OBJ.to_string(),
            Some(BOX_MTL.to_string()),
            TextureSet::new(),
            ImportOptions::default(),
        )
        .unwrap();
        while !matches!(importer.advance(), ImportEvent::Finished) {}
        let progress = importer.progress();
        assert_eq!(progress.objects_total, 1);
        assert_eq!(progress.objects_built, 1);
        assert_eq!(progress.groups_total, 1);
        assert_eq!(progress.groups_built, 1);
        assert_eq!(progress.materials_built, 1);
        assert_eq!(progress.parts_built, 1);
    }

    #[test]
    fn test_textures_reach_synthesis() {
        let mtl = "\
newmtl Mat
map_Kd skin.png
";
        let obj = "\
mtllib any.mtl
v 0 0 0
v 1 0 0
v 0 1 0
usemtl Mat
f 1 2 3
";
        let mut textures = TextureSet::new();
        textures.insert("skin.png", TextureData::solid_color(2, 2, [10, 20, 30, 128]));
        let model = Importer::new(
            "model.obj",
            obj.to_string(),
            Some(mtl.to_string()),
            textures,
            ImportOptions::default(),
        )
        .unwrap()
        .run();
        assert_eq!(model.materials[0].blend_mode, BlendMode::Fade);
        assert_eq!(model.materials[0].albedo.width, 2);
    }
}

//! Import job orchestration.

pub mod importer;
pub mod options;
pub mod progress;

pub use importer::{ImportError, ImportEvent, ImportedModel, Importer};
pub use options::{ImportOptions, DEFAULT_MESH_BUFFER_CEILING};
pub use progress::{ImportPhase, ImportProgress};

//! Text parsers for the supported model formats.

pub mod mtl_parser;
pub mod obj_parser;

pub use mtl_parser::MtlParser;
pub use obj_parser::{material_lib_name, ObjParser, ParseProgress, ParsedGeometry};

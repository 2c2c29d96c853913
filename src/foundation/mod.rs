//! Foundation utilities shared by every importer stage.

pub mod logging;
pub mod math;

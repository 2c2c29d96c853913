//! Math utilities and types
//!
//! Provides the fundamental math types used by the importer pipeline.

pub use nalgebra::{Vector2, Vector3, Vector4};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// RGBA color with components in `[0, 1]`
pub type Color = Vector4<f32>;

/// Clamp a value to the `[0, 1]` range; non-finite input clamps to 0.
pub fn clamp01(value: f32) -> f32 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 1.0)
}

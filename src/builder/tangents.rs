//! Tangent space and normal computation for built mesh parts.

use crate::foundation::math::{Vec2, Vec3, Vec4};

const DEGENERATE_EPSILON: f32 = 1e-12;

/// Compute per-vertex tangents for a triangle mesh.
///
/// Per-triangle `sdir`/`tdir` contributions are accumulated on the incident
/// vertices, then each vertex tangent is Gram-Schmidt orthogonalized against
/// its normal. Triangles whose UV mapping is degenerate (zero UV determinant)
/// contribute nothing. The returned `w` component carries handedness, `-1` or
/// `+1`.
pub fn compute_tangents(
    positions: &[Vec3],
    uvs: &[Vec2],
    normals: &[Vec3],
    indices: &[u32],
) -> Vec<Vec4> {
    let count = positions.len();
    let mut tan1 = vec![Vec3::zeros(); count];
    let mut tan2 = vec![Vec3::zeros(); count];

    for tri in indices.chunks_exact(3) {
        let (i1, i2, i3) = (tri[0] as usize, tri[1] as usize, tri[2] as usize);

        let e1 = positions[i2] - positions[i1];
        let e2 = positions[i3] - positions[i1];

        let s1 = uvs[i2].x - uvs[i1].x;
        let s2 = uvs[i3].x - uvs[i1].x;
        let t1 = uvs[i2].y - uvs[i1].y;
        let t2 = uvs[i3].y - uvs[i1].y;

        let denom = s1 * t2 - s2 * t1;
        if denom.abs() < f32::EPSILON {
            // degenerate UV mapping, no usable tangent direction
            continue;
        }
        let r = 1.0 / denom;

        let sdir = Vec3::new(
            (t2 * e1.x - t1 * e2.x) * r,
            (t2 * e1.y - t1 * e2.y) * r,
            (t2 * e1.z - t1 * e2.z) * r,
        );
        let tdir = Vec3::new(
            (s1 * e2.x - s2 * e1.x) * r,
            (s1 * e2.y - s2 * e1.y) * r,
            (s1 * e2.z - s2 * e1.z) * r,
        );

        tan1[i1] += sdir;
        tan1[i2] += sdir;
        tan1[i3] += sdir;

        tan2[i1] += tdir;
        tan2[i2] += tdir;
        tan2[i3] += tdir;
    }

    let mut tangents = Vec::with_capacity(count);
    for i in 0..count {
        let n = normals[i];
        let t = tan1[i];

        // Gram-Schmidt orthogonalize against the normal
        let mut tangent = t - n * n.dot(&t);
        if tangent.norm_squared() < DEGENERATE_EPSILON {
            tangent = fallback_tangent(&n);
        } else {
            tangent.normalize_mut();
        }

        let w = if n.cross(&tangent).dot(&tan2[i]) < 0.0 {
            -1.0
        } else {
            1.0
        };
        tangents.push(Vec4::new(tangent.x, tangent.y, tangent.z, w));
    }
    tangents
}

/// Axis-aligned tangent perpendicular to the normal, used when the
/// accumulated tangent vanished.
fn fallback_tangent(normal: &Vec3) -> Vec3 {
    let axis = if normal.x.abs() < 0.9 {
        Vec3::x()
    } else {
        Vec3::y()
    };
    let mut tangent = axis - normal * normal.dot(&axis);
    if tangent.norm_squared() < DEGENERATE_EPSILON {
        return Vec3::x();
    }
    tangent.normalize_mut();
    tangent
}

/// Recompute face-averaged normals for a mesh without authored normals.
///
/// Face normals are accumulated unnormalized, which weights each face by its
/// area, then the per-vertex sums are normalized.
pub fn compute_flat_normals(positions: &[Vec3], indices: &[u32]) -> Vec<Vec3> {
    let mut normals = vec![Vec3::zeros(); positions.len()];

    for tri in indices.chunks_exact(3) {
        let (i1, i2, i3) = (tri[0] as usize, tri[1] as usize, tri[2] as usize);
        let e1 = positions[i2] - positions[i1];
        let e2 = positions[i3] - positions[i1];
        let face_normal = e1.cross(&e2);
        normals[i1] += face_normal;
        normals[i2] += face_normal;
        normals[i3] += face_normal;
    }

    for normal in &mut normals {
        if normal.norm_squared() < DEGENERATE_EPSILON {
            *normal = Vec3::y();
        } else {
            normal.normalize_mut();
        }
    }
    normals
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit_quad() -> (Vec<Vec3>, Vec<Vec2>, Vec<Vec3>, Vec<u32>) {
        let positions = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        ];
        let uvs = vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(0.0, 1.0),
        ];
        let normals = vec![Vec3::z(); 4];
        let indices = vec![0, 1, 2, 0, 2, 3];
        (positions, uvs, normals, indices)
    }

    #[test]
    fn test_tangents_follow_u_direction() {
        let (positions, uvs, normals, indices) = unit_quad();
        let tangents = compute_tangents(&positions, &uvs, &normals, &indices);
        assert_eq!(tangents.len(), 4);
        for t in &tangents {
            assert_relative_eq!(t.x, 1.0, epsilon = 1e-5);
            assert_relative_eq!(t.y, 0.0, epsilon = 1e-5);
            assert_relative_eq!(t.z, 0.0, epsilon = 1e-5);
            assert!(t.w == 1.0 || t.w == -1.0);
        }
    }

    #[test]
    fn test_tangents_are_unit_length() {
        let (positions, uvs, normals, indices) = unit_quad();
        for t in compute_tangents(&positions, &uvs, &normals, &indices) {
            let len = (t.x * t.x + t.y * t.y + t.z * t.z).sqrt();
            assert_relative_eq!(len, 1.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_degenerate_uvs_get_fallback() {
        let positions = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        ];
        // all UVs collapse to one point, determinant is zero
        let uvs = vec![Vec2::new(0.5, 0.5); 3];
        let normals = vec![Vec3::z(); 3];
        let indices = vec![0, 1, 2];
        let tangents = compute_tangents(&positions, &uvs, &normals, &indices);
        for t in &tangents {
            let len = (t.x * t.x + t.y * t.y + t.z * t.z).sqrt();
            assert_relative_eq!(len, 1.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_flat_normals_for_planar_triangle() {
        let positions = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        ];
        let indices = vec![0, 1, 2];
        let normals = compute_flat_normals(&positions, &indices);
        for n in &normals {
            assert_relative_eq!(*n, Vec3::z(), epsilon = 1e-5);
        }
    }

    #[test]
    fn test_flat_normals_unused_vertex_defaults_up() {
        let positions = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(5.0, 5.0, 5.0),
        ];
        let indices = vec![0, 1, 2];
        let normals = compute_flat_normals(&positions, &indices);
        assert_relative_eq!(normals[3], Vec3::y());
    }
}

//! Step-wise mesh construction
//!
//! [`MeshBuilder`] consumes a [`DataSet`] and emits one [`MeshPart`] per
//! [`MeshBuilder::build_next`] call, so large models can be built without
//! blocking the caller. Groups whose geometry exceeds the configured buffer
//! ceiling are split across several parts.

use std::collections::{HashMap, HashSet};

use thiserror::Error;

use crate::builder::tangents::{compute_flat_normals, compute_tangents};
use crate::dataset::{DataSet, FaceIndices};
use crate::foundation::math::{Vec2, Vec3, Vec4};
use crate::import::ImportOptions;

/// Errors surfaced while building mesh parts.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    /// The faces emitted for an object do not add up to its face list.
    #[error("object '{object}': consumed {consumed} face indices, expected {expected}")]
    FaceCountMismatch {
        /// Object name
        object: String,
        /// Face indices consumed across the object's parts
        consumed: usize,
        /// Length of the object's flattened face list
        expected: usize,
    },
}

/// One renderable chunk of an object: dense vertex attributes plus triangle
/// indices, all local to the part.
#[derive(Debug, Clone)]
pub struct MeshPart {
    /// Part name: the group name, or `<group>_MeshPart<n>` for split groups
    pub name: String,
    /// Material applied to the part's faces, if any
    pub material_name: Option<String>,
    /// Vertex positions
    pub positions: Vec<Vec3>,
    /// Texture coordinates; empty when the model has none
    pub uvs: Vec<Vec2>,
    /// Vertex normals, authored or recomputed
    pub normals: Vec<Vec3>,
    /// Tangents with handedness in `w`; empty without UVs
    pub tangents: Vec<Vec4>,
    /// Triangle indices into the part's local attribute arrays
    pub triangle_indices: Vec<u32>,
}

/// Builds mesh parts from a [`DataSet`], one part per call.
///
/// Objects are processed in source order, groups within an object in source
/// order. A group that would exceed the vertex or index ceiling is split;
/// the split counter restarts for every group.
pub struct MeshBuilder {
    data_set: DataSet,
    vertex_bound: usize,
    index_bound: usize,
    object_index: usize,
    group_index: usize,
    face_resume: usize,
    part_counter: usize,
    consumed_faces: usize,
    parts_built: usize,
    groups_built: usize,
}

impl MeshBuilder {
    /// Create a builder over accumulated geometry.
    pub fn new(data_set: DataSet, options: &ImportOptions) -> Self {
        // round down to whole triangles, but always fit at least one
        let bound = (options.mesh_buffer_ceiling / 3 * 3).max(3);
        Self {
            data_set,
            vertex_bound: bound,
            index_bound: bound,
            object_index: 0,
            group_index: 0,
            face_resume: 0,
            part_counter: 0,
            consumed_faces: 0,
            parts_built: 0,
            groups_built: 0,
        }
    }

    /// The geometry being built.
    pub fn data_set(&self) -> &DataSet {
        &self.data_set
    }

    /// Number of objects fully built so far.
    pub fn objects_built(&self) -> usize {
        self.object_index.min(self.data_set.objects.len())
    }

    /// Total number of objects in the data set.
    pub fn objects_total(&self) -> usize {
        self.data_set.objects.len()
    }

    /// Number of parts emitted so far.
    pub fn parts_built(&self) -> usize {
        self.parts_built
    }

    /// Number of face groups fully consumed so far.
    pub fn groups_built(&self) -> usize {
        self.groups_built
    }

    /// Total number of face groups across all objects.
    pub fn groups_total(&self) -> usize {
        self.data_set.group_count()
    }

    /// Build the next mesh part.
    ///
    /// Returns `None` once every object is consumed. A face-count mismatch
    /// fails the affected object only; later objects keep building.
    pub fn build_next(&mut self) -> Option<Result<MeshPart, BuildError>> {
        loop {
            let object = self.data_set.objects.get(self.object_index)?;

            if self.group_index >= object.face_groups.len() {
                let expected = object.all_faces.len();
                let consumed = self.consumed_faces;
                let name = object.name.clone();
                self.object_index += 1;
                self.group_index = 0;
                self.face_resume = 0;
                self.part_counter = 0;
                self.consumed_faces = 0;
                if consumed != expected {
                    return Some(Err(BuildError::FaceCountMismatch {
                        object: name,
                        consumed,
                        expected,
                    }));
                }
                continue;
            }

            let group = &object.face_groups[self.group_index];
            if group.faces.is_empty() {
                self.group_index += 1;
                self.groups_built += 1;
                continue;
            }

            let mut part_faces: Vec<FaceIndices> = Vec::new();
            let mut unique_positions: HashSet<i32> = HashSet::new();
            let mut split = false;
            let mut cursor = self.face_resume;
            let faces = &group.faces;

            while cursor < faces.len() {
                let remaining = faces.len() - cursor;
                if remaining < 3 {
                    log::warn!(
                        "group '{}' ends with a partial triangle, {} indices dropped",
                        group.name,
                        remaining
                    );
                    self.consumed_faces += remaining;
                    cursor = faces.len();
                    break;
                }

                let tri = &faces[cursor..cursor + 3];
                let new_unique = tri
                    .iter()
                    .map(|fi| fi.vert_idx)
                    .filter(|v| !unique_positions.contains(v))
                    .collect::<HashSet<_>>()
                    .len();
                if unique_positions.len() + new_unique > self.vertex_bound
                    || part_faces.len() + 3 > self.index_bound
                {
                    split = true;
                    log::warn!(
                        "mesh buffer ceiling reached, splitting group '{}' at face index {}",
                        group.name,
                        cursor
                    );
                    break;
                }

                self.consumed_faces += 3;
                cursor += 3;

                if !triangle_in_range(tri, &self.data_set) {
                    log::warn!("face with out-of-range indices skipped in group '{}'", group.name);
                    continue;
                }
                for fi in tri {
                    unique_positions.insert(fi.vert_idx);
                    part_faces.push(*fi);
                }
            }

            self.face_resume = cursor;

            if split || self.part_counter > 0 {
                self.part_counter += 1;
            }
            let name = if self.part_counter > 0 {
                format!("{}_MeshPart{}", group.name, self.part_counter)
            } else {
                group.name.clone()
            };
            let material_name = group.material_name.clone();
            let has_normals = object.has_normals;

            if !split {
                self.face_resume = 0;
                self.group_index += 1;
                self.part_counter = 0;
                self.groups_built += 1;
            }

            if part_faces.is_empty() {
                continue;
            }

            let part = self.assemble_part(name, material_name, &part_faces, has_normals);
            self.parts_built += 1;
            return Some(Ok(part));
        }
    }

    /// Deduplicate face triplets into dense attribute arrays and finish the
    /// part's normals and tangents.
    fn assemble_part(
        &self,
        name: String,
        material_name: Option<String>,
        faces: &[FaceIndices],
        has_normals: bool,
    ) -> MeshPart {
        let data_set = &self.data_set;
        let has_uvs = !data_set.uvs.is_empty();
        let use_authored_normals = has_normals && !data_set.normals.is_empty();

        let mut local_index: HashMap<FaceIndices, u32> = HashMap::new();
        let mut positions: Vec<Vec3> = Vec::new();
        let mut uvs: Vec<Vec2> = Vec::new();
        let mut normals: Vec<Vec3> = Vec::new();
        let mut triangle_indices: Vec<u32> = Vec::with_capacity(faces.len());

        for fi in faces {
            let index = match local_index.get(fi) {
                Some(&k) => k,
                None => {
                    let k = positions.len() as u32;
                    positions.push(data_set.vertices[fi.vert_idx as usize]);
                    if has_uvs {
                        let uv = data_set
                            .uvs
                            .get(fi.uv_idx as usize)
                            .copied()
                            .unwrap_or_else(Vec2::zeros);
                        uvs.push(uv);
                    }
                    if use_authored_normals {
                        let normal = if fi.has_normal() {
                            data_set.normals[fi.norm_idx as usize]
                        } else {
                            Vec3::zeros()
                        };
                        normals.push(normal);
                    }
                    local_index.insert(*fi, k);
                    k
                }
            };
            triangle_indices.push(index);
        }

        if !use_authored_normals {
            normals = compute_flat_normals(&positions, &triangle_indices);
        }
        let tangents = if has_uvs && !normals.is_empty() {
            compute_tangents(&positions, &uvs, &normals, &triangle_indices)
        } else {
            Vec::new()
        };

        MeshPart {
            name,
            material_name,
            positions,
            uvs,
            normals,
            tangents,
            triangle_indices,
        }
    }
}

impl Iterator for MeshBuilder {
    type Item = Result<MeshPart, BuildError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.build_next()
    }
}

fn triangle_in_range(tri: &[FaceIndices], data_set: &DataSet) -> bool {
    tri.iter().all(|fi| {
        let vert_ok = fi.vert_idx >= 0 && (fi.vert_idx as usize) < data_set.vertices.len();
        let norm_ok = !fi.has_normal() || (fi.norm_idx as usize) < data_set.normals.len();
        vert_ok && norm_ok
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn options_with_ceiling(ceiling: usize) -> ImportOptions {
        ImportOptions {
            mesh_buffer_ceiling: ceiling,
            ..Default::default()
        }
    }

    /// Data set with one group of `n` independent triangles.
    fn triangle_soup(n: usize) -> DataSet {
        let mut ds = DataSet::new();
        for i in 0..n {
            let base = (i * 3) as f32;
            ds.add_vertex(Vec3::new(base, 0.0, 0.0));
            ds.add_vertex(Vec3::new(base + 1.0, 0.0, 0.0));
            ds.add_vertex(Vec3::new(base, 1.0, 0.0));
            for v in 0..3 {
                ds.add_face_indices(FaceIndices::without_normal((i * 3 + v) as i32, 0));
            }
        }
        ds
    }

    #[test]
    fn test_single_triangle_one_part() {
        let ds = triangle_soup(1);
        let mut builder = MeshBuilder::new(ds, &ImportOptions::default());
        let part = builder.build_next().unwrap().unwrap();
        assert_eq!(part.name, "default");
        assert_eq!(part.positions.len(), 3);
        assert_eq!(part.triangle_indices, vec![0, 1, 2]);
        assert!(builder.build_next().is_none());
        assert_eq!(builder.parts_built(), 1);
        assert_eq!(builder.objects_built(), 1);
    }

    #[test]
    fn test_triplet_deduplication() {
        let mut ds = DataSet::new();
        ds.add_vertex(Vec3::new(0.0, 0.0, 0.0));
        ds.add_vertex(Vec3::new(1.0, 0.0, 0.0));
        ds.add_vertex(Vec3::new(1.0, 1.0, 0.0));
        ds.add_vertex(Vec3::new(0.0, 1.0, 0.0));
        // two triangles sharing the diagonal 0-2
        for v in [0, 1, 2, 0, 2, 3] {
            ds.add_face_indices(FaceIndices::without_normal(v, 0));
        }
        let mut builder = MeshBuilder::new(ds, &ImportOptions::default());
        let part = builder.build_next().unwrap().unwrap();
        assert_eq!(part.positions.len(), 4);
        assert_eq!(part.triangle_indices.len(), 6);
    }

    #[test]
    fn test_same_position_different_normal_not_deduplicated() {
        let mut ds = DataSet::new();
        for v in [
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        ] {
            ds.add_vertex(v);
        }
        ds.add_normal(Vec3::z());
        ds.add_normal(Vec3::y());
        for n in [0, 1] {
            for v in 0..3 {
                ds.add_face_indices(FaceIndices::new(v, 0, n));
            }
        }
        let mut builder = MeshBuilder::new(ds, &ImportOptions::default());
        let part = builder.build_next().unwrap().unwrap();
        // three positions, each duplicated for the second normal
        assert_eq!(part.positions.len(), 6);
    }

    #[test]
    fn test_group_split_and_naming() {
        // ceiling 6 fits two triangles per part
        let ds = triangle_soup(3);
        let mut builder = MeshBuilder::new(ds, &options_with_ceiling(6));
        let first = builder.build_next().unwrap().unwrap();
        let second = builder.build_next().unwrap().unwrap();
        assert!(builder.build_next().is_none());
        assert_eq!(first.name, "default_MeshPart1");
        assert_eq!(second.name, "default_MeshPart2");
        assert_eq!(first.triangle_indices.len(), 6);
        assert_eq!(second.triangle_indices.len(), 3);
    }

    #[test]
    fn test_part_counter_resets_per_group() {
        let mut ds = DataSet::new();
        let add_triangles = |ds: &mut DataSet, n: usize| {
            let start = ds.vertices.len();
            for i in 0..n {
                let base = (start + i * 3) as f32;
                ds.add_vertex(Vec3::new(base, 0.0, 0.0));
                ds.add_vertex(Vec3::new(base + 1.0, 0.0, 0.0));
                ds.add_vertex(Vec3::new(base, 1.0, 0.0));
                for v in 0..3 {
                    ds.add_face_indices(FaceIndices::without_normal((start + i * 3 + v) as i32, 0));
                }
            }
        };
        ds.add_group(Some("A"));
        add_triangles(&mut ds, 3);
        ds.add_group(Some("B"));
        add_triangles(&mut ds, 3);

        let builder = MeshBuilder::new(ds, &options_with_ceiling(6));
        let names: Vec<String> = builder.map(|p| p.unwrap().name).collect();
        assert_eq!(
            names,
            vec!["A_MeshPart1", "A_MeshPart2", "B_MeshPart1", "B_MeshPart2"]
        );
    }

    #[test]
    fn test_ceiling_plus_one_splits_into_two_parts() {
        let ceiling = 99;
        // 34 triangles, 102 unique vertices, first part takes 33 of them
        let ds = triangle_soup(34);
        let builder = MeshBuilder::new(ds, &options_with_ceiling(ceiling));
        let parts: Vec<MeshPart> = builder.map(|p| p.unwrap()).collect();
        assert_eq!(parts.len(), 2);
        for part in &parts {
            assert!(part.positions.len() <= ceiling);
            assert!(part.triangle_indices.len() <= ceiling);
        }
    }

    #[test]
    fn test_rebuild_is_deterministic() {
        let ds = triangle_soup(5);
        let options = options_with_ceiling(6);
        let first: Vec<MeshPart> = MeshBuilder::new(ds.clone(), &options)
            .map(|p| p.unwrap())
            .collect();
        let second: Vec<MeshPart> = MeshBuilder::new(ds, &options)
            .map(|p| p.unwrap())
            .collect();
        assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(&second) {
            assert_eq!(a.name, b.name);
            assert_eq!(a.positions.len(), b.positions.len());
            assert_eq!(a.triangle_indices, b.triangle_indices);
        }
    }

    #[test]
    fn test_face_count_invariant_across_parts() {
        let ds = triangle_soup(5);
        let expected = ds.objects[0].all_faces.len();
        let builder = MeshBuilder::new(ds, &options_with_ceiling(6));
        let total: usize = builder.map(|p| p.unwrap().triangle_indices.len()).sum();
        assert_eq!(total, expected);
    }

    #[test]
    fn test_face_count_mismatch_reported() {
        let mut ds = triangle_soup(1);
        // corrupt the flattened list so the invariant cannot hold
        ds.objects[0]
            .all_faces
            .push(FaceIndices::without_normal(0, 0));
        let mut builder = MeshBuilder::new(ds, &ImportOptions::default());
        let first = builder.build_next().unwrap();
        assert!(first.is_ok());
        let second = builder.build_next().unwrap();
        assert!(matches!(
            second,
            Err(BuildError::FaceCountMismatch { consumed: 3, expected: 4, .. })
        ));
        assert!(builder.build_next().is_none());
    }

    #[test]
    fn test_flat_normals_recomputed_without_authored() {
        let ds = triangle_soup(1);
        let mut builder = MeshBuilder::new(ds, &ImportOptions::default());
        let part = builder.build_next().unwrap().unwrap();
        assert_eq!(part.normals.len(), part.positions.len());
        for n in &part.normals {
            assert_relative_eq!(n.norm(), 1.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_authored_normals_used() {
        let mut ds = DataSet::new();
        for v in [
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        ] {
            ds.add_vertex(v);
        }
        ds.add_normal(Vec3::x());
        for v in 0..3 {
            ds.add_face_indices(FaceIndices::new(v, 0, 0));
        }
        let mut builder = MeshBuilder::new(ds, &ImportOptions::default());
        let part = builder.build_next().unwrap().unwrap();
        for n in &part.normals {
            assert_relative_eq!(*n, Vec3::x());
        }
    }

    #[test]
    fn test_tangents_only_with_uvs() {
        let ds = triangle_soup(1);
        let mut builder = MeshBuilder::new(ds, &ImportOptions::default());
        let part = builder.build_next().unwrap().unwrap();
        assert!(part.uvs.is_empty());
        assert!(part.tangents.is_empty());

        let mut ds = DataSet::new();
        for v in [
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        ] {
            ds.add_vertex(v);
        }
        for uv in [
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(0.0, 1.0),
        ] {
            ds.add_uv(uv);
        }
        for v in 0..3 {
            ds.add_face_indices(FaceIndices::without_normal(v, v));
        }
        let mut builder = MeshBuilder::new(ds, &ImportOptions::default());
        let part = builder.build_next().unwrap().unwrap();
        assert_eq!(part.tangents.len(), part.positions.len());
    }

    #[test]
    fn test_out_of_range_face_skipped() {
        let mut ds = triangle_soup(1);
        for v in [0, 1, 99] {
            ds.add_face_indices(FaceIndices::without_normal(v, 0));
        }
        let mut builder = MeshBuilder::new(ds, &ImportOptions::default());
        let part = builder.build_next().unwrap().unwrap();
        // the bad triangle is dropped, the good one survives
        assert_eq!(part.triangle_indices.len(), 3);
        assert!(builder.build_next().is_none());
    }

    #[test]
    fn test_multiple_objects_in_order() {
        let mut ds = DataSet::new();
        ds.add_object("First");
        ds.add_vertex(Vec3::zeros());
        ds.add_vertex(Vec3::x());
        ds.add_vertex(Vec3::y());
        for v in 0..3 {
            ds.add_face_indices(FaceIndices::without_normal(v, 0));
        }
        ds.add_object("Second");
        ds.add_group(Some("Lid"));
        for v in 0..3 {
            ds.add_face_indices(FaceIndices::without_normal(v, 0));
        }
        let builder = MeshBuilder::new(ds, &ImportOptions::default());
        let names: Vec<String> = builder.map(|p| p.unwrap().name).collect();
        assert_eq!(names, vec!["default", "Lid"]);
    }

    #[test]
    fn test_material_name_carried_to_part() {
        let mut ds = DataSet::new();
        ds.add_material_name("Red");
        ds.add_vertex(Vec3::zeros());
        ds.add_vertex(Vec3::x());
        ds.add_vertex(Vec3::y());
        for v in 0..3 {
            ds.add_face_indices(FaceIndices::without_normal(v, 0));
        }
        let mut builder = MeshBuilder::new(ds, &ImportOptions::default());
        let part = builder.build_next().unwrap().unwrap();
        assert_eq!(part.material_name.as_deref(), Some("Red"));
        assert_eq!(part.name, "Red");
    }
}

//! Intermediate accumulation model for parsed geometry
//!
//! A [`DataSet`] collects the raw output of the geometry parser in a neutral
//! form: global vertex/UV/normal pools plus a hierarchy of named objects, each
//! holding one or more face groups. The parser drives it through the `add_*`
//! operations; the mesh builder later consumes it read-only.
//!
//! The split/rename/prune rules of [`DataSet::add_object`],
//! [`DataSet::add_group`] and [`DataSet::add_material_name`] decide how faces
//! are attributed to materials across `o`/`g`/`usemtl` sequences in any order,
//! so their exact semantics matter for correct imports.

use crate::foundation::math::{Color, Vec2, Vec3};

/// Name used for the synthetic placeholder object and group.
pub const DEFAULT_NAME: &str = "default";

/// Index triplet for one vertex of a face.
///
/// Indices reference the global pools of the owning [`DataSet`]. A missing
/// normal is encoded as [`FaceIndices::NO_NORMAL`]; a missing UV reference
/// defaults to 0 and is only meaningful when the UV pool is non-empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FaceIndices {
    /// Index into the vertex pool
    pub vert_idx: i32,
    /// Index into the UV pool
    pub uv_idx: i32,
    /// Index into the normal pool, or [`FaceIndices::NO_NORMAL`]
    pub norm_idx: i32,
}

impl FaceIndices {
    /// Sentinel for an absent normal reference.
    pub const NO_NORMAL: i32 = -1;

    /// Create a triplet with an explicit normal index.
    pub fn new(vert_idx: i32, uv_idx: i32, norm_idx: i32) -> Self {
        Self {
            vert_idx,
            uv_idx,
            norm_idx,
        }
    }

    /// Create a triplet without a normal reference.
    pub fn without_normal(vert_idx: i32, uv_idx: i32) -> Self {
        Self {
            vert_idx,
            uv_idx,
            norm_idx: Self::NO_NORMAL,
        }
    }

    /// True if this triplet carries a normal reference.
    pub fn has_normal(&self) -> bool {
        self.norm_idx >= 0
    }
}

/// Named subset of an object's faces sharing one material.
#[derive(Debug, Clone)]
pub struct FaceGroupData {
    /// Group name
    pub name: String,
    /// Material applied to the group's faces, if any
    pub material_name: Option<String>,
    /// Face index triplets, three per triangle, in emission order
    pub faces: Vec<FaceIndices>,
}

impl FaceGroupData {
    fn new(name: String, material_name: Option<String>) -> Self {
        Self {
            name,
            material_name,
            faces: Vec::new(),
        }
    }

    /// True if no faces have been added yet.
    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }
}

/// One named object of the model: its groups plus a flattened face list.
#[derive(Debug, Clone)]
pub struct ObjectData {
    /// Object name
    pub name: String,
    /// Face groups in source order; never empty
    pub face_groups: Vec<FaceGroupData>,
    /// Concatenation of all group faces, in group order
    pub all_faces: Vec<FaceIndices>,
    /// True once any face carried a normal reference
    pub has_normals: bool,
}

impl ObjectData {
    fn new(name: String) -> Self {
        Self {
            name,
            face_groups: Vec::new(),
            all_faces: Vec::new(),
            has_normals: false,
        }
    }
}

/// Stateful accumulator turning parser callbacks into an object/group/face
/// hierarchy plus global vertex/UV/normal/color pools.
///
/// Created with one placeholder object and group named `"default"`; the
/// placeholders are pruned as soon as named replacements arrive, provided they
/// received no content.
#[derive(Debug, Clone)]
pub struct DataSet {
    /// Parsed objects in source order
    pub objects: Vec<ObjectData>,
    /// Global vertex pool
    pub vertices: Vec<Vec3>,
    /// Global UV pool
    pub uvs: Vec<Vec2>,
    /// Global normal pool
    pub normals: Vec<Vec3>,
    /// Optional per-vertex colors (parallel to `vertices` when present)
    pub colors: Vec<Color>,
    unnamed_group_index: u32,
}

impl DataSet {
    /// Create an empty data set holding the placeholder object and group.
    pub fn new() -> Self {
        let mut placeholder = ObjectData::new(DEFAULT_NAME.to_string());
        placeholder
            .face_groups
            .push(FaceGroupData::new(DEFAULT_NAME.to_string(), None));
        Self {
            objects: vec![placeholder],
            vertices: Vec::new(),
            uvs: Vec::new(),
            normals: Vec::new(),
            colors: Vec::new(),
            unnamed_group_index: 1,
        }
    }

    /// True while no vertex has been added.
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    fn current_object(&self) -> &ObjectData {
        self.objects.last().expect("DataSet always holds an object")
    }

    fn current_object_mut(&mut self) -> &mut ObjectData {
        self.objects
            .last_mut()
            .expect("DataSet always holds an object")
    }

    fn current_group(&self) -> &FaceGroupData {
        self.current_object()
            .face_groups
            .last()
            .expect("every object holds a group")
    }

    fn current_group_mut(&mut self) -> &mut FaceGroupData {
        self.current_object_mut()
            .face_groups
            .last_mut()
            .expect("every object holds a group")
    }

    /// Start a new object.
    ///
    /// The last-used material name carries over into the new object's initial
    /// group, so material continuity survives `o` boundaries. If no geometry
    /// has been parsed yet the placeholder object is dropped.
    pub fn add_object(&mut self, object_name: &str) {
        let current_material = self.current_group().material_name.clone();

        if self.is_empty() {
            self.objects.pop();
        }

        let mut object = ObjectData::new(object_name.to_string());
        object.face_groups.push(FaceGroupData::new(
            DEFAULT_NAME.to_string(),
            current_material,
        ));
        self.objects.push(object);
    }

    /// Start a new group within the current object.
    ///
    /// A preceding group that received no faces is pruned. The last-used
    /// material name carries over. Passing `None` auto-names the group
    /// `"Unnamed-<n>"` with a monotonically increasing counter.
    pub fn add_group(&mut self, group_name: Option<&str>) {
        let current_material = self.current_group().material_name.clone();

        if self.current_group().is_empty() {
            self.current_object_mut().face_groups.pop();
        }

        let name = match group_name {
            Some(name) => name.to_string(),
            None => {
                let name = format!("Unnamed-{}", self.unnamed_group_index);
                self.unnamed_group_index += 1;
                name
            }
        };
        self.current_object_mut()
            .face_groups
            .push(FaceGroupData::new(name, current_material));
    }

    /// Apply a material name to the current group.
    ///
    /// If the current group already has faces it is closed and a new group is
    /// split off; an empty group still named `"default"` is renamed in place.
    pub fn add_material_name(&mut self, material_name: &str) {
        if !self.current_group().is_empty() {
            self.add_group(Some(material_name));
        }
        let group = self.current_group_mut();
        if group.name == DEFAULT_NAME {
            group.name = material_name.to_string();
        }
        group.material_name = Some(material_name.to_string());
    }

    /// Append a vertex to the global pool.
    pub fn add_vertex(&mut self, vertex: Vec3) {
        self.vertices.push(vertex);
    }

    /// Append a texture coordinate to the global pool.
    pub fn add_uv(&mut self, uv: Vec2) {
        self.uvs.push(uv);
    }

    /// Append a normal to the global pool.
    pub fn add_normal(&mut self, normal: Vec3) {
        self.normals.push(normal);
    }

    /// Append a per-vertex color to the global pool.
    pub fn add_color(&mut self, color: Color) {
        self.colors.push(color);
    }

    /// Append a face index triplet to the current group and to the current
    /// object's flattened face list.
    pub fn add_face_indices(&mut self, face: FaceIndices) {
        let has_normal = face.has_normal();
        self.current_group_mut().faces.push(face);
        let object = self.current_object_mut();
        object.all_faces.push(face);
        if has_normal {
            object.has_normals = true;
        }
    }

    /// Total number of face groups across all objects.
    pub fn group_count(&self) -> usize {
        self.objects.iter().map(|o| o.face_groups.len()).sum()
    }
}

impl Default for DataSet {
    fn default() -> Self {
        Self::new()
    }
}

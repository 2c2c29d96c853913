//! OBJ geometry parser
//!
//! Line-oriented parser for Wavefront OBJ text. Parsing is resumable: each
//! [`ObjParser::step`] call processes a bounded number of lines so callers can
//! interleave other work between chunks. Malformed lines are logged and
//! skipped; parsing itself never fails.

use crate::dataset::{DataSet, FaceIndices};
use crate::foundation::math::{Color, Vec2, Vec3};
use crate::import::ImportOptions;

/// Number of lines processed per [`ObjParser::step`] call.
pub const PARSE_CHUNK_LINES: usize = 7000;

/// Outcome of one parsing step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseProgress {
    /// More lines remain; counters report how far parsing has advanced.
    InProgress {
        /// Lines consumed so far
        lines_parsed: usize,
        /// Total line count of the source
        lines_total: usize,
    },
    /// The whole source has been consumed.
    Done,
}

/// Result of a completed parse: the accumulated geometry plus the material
/// library reference, when the source declared one.
#[derive(Debug)]
pub struct ParsedGeometry {
    /// Accumulated objects, groups and attribute pools
    pub data_set: DataSet,
    /// Name from the last non-empty `mtllib` directive
    pub material_lib: Option<String>,
}

/// Resumable parser turning OBJ text into a [`DataSet`].
///
/// The parser owns its source text and walks it by precomputed line spans, so
/// a suspended parse holds no borrows and can be stored or sent freely.
pub struct ObjParser {
    text: String,
    line_spans: Vec<(usize, usize)>,
    next_line: usize,
    data_set: DataSet,
    material_lib: Option<String>,
    // face index sign convention, locked by the first face of each group
    first_face_in_group: bool,
    index_is_absolute: bool,
    scaling: f32,
    z_up: bool,
}

impl ObjParser {
    /// Create a parser over the given OBJ text.
    pub fn new(text: String, options: &ImportOptions) -> Self {
        let line_spans = line_spans(&text);
        Self {
            text,
            line_spans,
            next_line: 0,
            data_set: DataSet::new(),
            material_lib: None,
            first_face_in_group: true,
            index_is_absolute: true,
            scaling: options.model_scaling,
            z_up: options.z_up,
        }
    }

    /// Parse the next chunk of lines.
    pub fn step(&mut self) -> ParseProgress {
        let chunk_end = (self.next_line + PARSE_CHUNK_LINES).min(self.line_spans.len());
        while self.next_line < chunk_end {
            let (start, end) = self.line_spans[self.next_line];
            self.next_line += 1;
            self.handle_line(start, end);
        }
        if self.next_line >= self.line_spans.len() {
            ParseProgress::Done
        } else {
            ParseProgress::InProgress {
                lines_parsed: self.next_line,
                lines_total: self.line_spans.len(),
            }
        }
    }

    /// Run the parse to completion and return the accumulated geometry.
    pub fn finish(mut self) -> ParsedGeometry {
        while self.step() != ParseProgress::Done {}
        ParsedGeometry {
            data_set: self.data_set,
            material_lib: self.material_lib,
        }
    }

    /// Parse a whole OBJ source in one call.
    pub fn parse(text: String, options: &ImportOptions) -> ParsedGeometry {
        Self::new(text, options).finish()
    }

    /// Geometry accumulated so far. Consistent at every step boundary.
    pub fn data_set(&self) -> &DataSet {
        &self.data_set
    }

    /// Material library name seen so far, if any.
    pub fn material_lib(&self) -> Option<&str> {
        self.material_lib.as_deref()
    }

    fn handle_line(&mut self, start: usize, end: usize) {
        let line = self.text[start..end].trim();
        if line.is_empty() || line.starts_with('#') {
            return;
        }

        let tokens: Vec<&str> = line.split_whitespace().collect();
        let directive = tokens[0];
        // everything after the directive keyword, with inner spacing intact
        let parameters = line[directive.len()..].trim();

        match directive {
            "o" => {
                self.data_set.add_object(parameters);
                self.first_face_in_group = true;
            }
            "g" => {
                let name = (!parameters.is_empty()).then_some(parameters);
                self.data_set.add_group(name);
                self.first_face_in_group = true;
            }
            "v" => {
                if let Some(v) = parse_vec3_tokens(&tokens) {
                    self.data_set
                        .add_vertex(convert_vec3(v, self.scaling, self.z_up));
                    if tokens.len() >= 7 {
                        if let Some(c) = parse_color_tokens(&tokens) {
                            self.data_set.add_color(c);
                        }
                    }
                } else {
                    log::warn!("malformed vertex line skipped: '{}'", line);
                }
            }
            "vt" => {
                if let Some(uv) = parse_vec2_tokens(&tokens) {
                    self.data_set.add_uv(uv);
                } else {
                    log::warn!("malformed texture coordinate line skipped: '{}'", line);
                }
            }
            "vn" => {
                if let Some(n) = parse_vec3_tokens(&tokens) {
                    self.data_set
                        .add_normal(convert_vec3(n, self.scaling, self.z_up));
                } else {
                    log::warn!("malformed normal line skipped: '{}'", line);
                }
            }
            "f" => handle_face(
                &mut self.data_set,
                &mut self.first_face_in_group,
                &mut self.index_is_absolute,
                &tokens,
                line,
            ),
            "mtllib" => {
                if !parameters.is_empty() {
                    self.material_lib = Some(parameters.to_string());
                }
            }
            "usemtl" => {
                if !parameters.is_empty() {
                    self.data_set.add_material_name(parameters);
                }
            }
            _ => {
                log::debug!("unrecognized directive '{}' skipped", directive);
            }
        }
    }
}

fn handle_face(
    data_set: &mut DataSet,
    first_face_in_group: &mut bool,
    index_is_absolute: &mut bool,
    tokens: &[&str],
    line: &str,
) {
    let refs = &tokens[1..];
    if refs.len() < 3 {
        log::warn!("face with fewer than 3 vertices skipped: '{}'", line);
        return;
    }

    if *first_face_in_group {
        let first_vert = refs[0]
            .split('/')
            .next()
            .and_then(|t| t.parse::<i32>().ok());
        match first_vert {
            Some(vi) => {
                *first_face_in_group = false;
                *index_is_absolute = vi >= 0;
            }
            None => {
                log::warn!("malformed face line skipped: '{}'", line);
                return;
            }
        }
    }

    let mut faces: Vec<FaceIndices> = Vec::with_capacity(refs.len());
    for face_ref in refs {
        match resolve_face_ref(face_ref, *index_is_absolute, data_set) {
            Some(fi) => faces.push(fi),
            None => {
                log::warn!("face with invalid vertex reference skipped: '{}'", line);
                return;
            }
        }
    }

    // reverse winding while fan-triangulating
    match faces.len() {
        3 => {
            data_set.add_face_indices(faces[0]);
            data_set.add_face_indices(faces[2]);
            data_set.add_face_indices(faces[1]);
        }
        4 => {
            data_set.add_face_indices(faces[0]);
            data_set.add_face_indices(faces[3]);
            data_set.add_face_indices(faces[1]);
            data_set.add_face_indices(faces[3]);
            data_set.add_face_indices(faces[2]);
            data_set.add_face_indices(faces[1]);
        }
        n => {
            log::warn!("face with {} vertices not supported, skipped", n);
        }
    }
}

/// Extract the material library name from OBJ text without a full parse.
pub fn material_lib_name(text: &str) -> Option<String> {
    for line in text.lines() {
        let line = line.trim();
        if let Some(rest) = line.strip_prefix("mtllib") {
            // reject directives that merely start with the keyword
            if !rest.starts_with(char::is_whitespace) {
                continue;
            }
            let rest = rest.trim();
            if !rest.is_empty() {
                return Some(rest.to_string());
            }
        }
    }
    None
}

/// Byte spans of the lines of `text`, excluding line terminators.
fn line_spans(text: &str) -> Vec<(usize, usize)> {
    let bytes = text.as_bytes();
    let mut spans = Vec::new();
    let mut start = 0;
    for (i, &b) in bytes.iter().enumerate() {
        if b == b'\n' {
            spans.push((start, i));
            start = i + 1;
        }
    }
    if start < bytes.len() {
        spans.push((start, bytes.len()));
    }
    spans
}

/// Resolve one `v[/vt[/vn]]` reference against the current pool sizes.
///
/// Absolute references are 1-based; relative (negative) references count back
/// from the end of each attribute's own pool. Out-of-range results reject the
/// reference.
fn resolve_face_ref(face_ref: &str, absolute: bool, data_set: &DataSet) -> Option<FaceIndices> {
    let mut parts = face_ref.split('/');

    let vi: i32 = parts.next()?.parse().ok()?;
    let vert_idx = if absolute {
        vi - 1
    } else {
        data_set.vertices.len() as i32 + vi
    };
    if vert_idx < 0 || vert_idx >= data_set.vertices.len() as i32 {
        return None;
    }

    let mut fi = FaceIndices::without_normal(vert_idx, 0);

    if let Some(uv_token) = parts.next() {
        if !uv_token.is_empty() {
            let vu: i32 = uv_token.parse().ok()?;
            fi.uv_idx = if absolute {
                vu - 1
            } else {
                data_set.uvs.len() as i32 + vu
            };
            if fi.uv_idx < 0 || fi.uv_idx >= data_set.uvs.len() as i32 {
                return None;
            }
        }
    }

    if let Some(norm_token) = parts.next() {
        if !norm_token.is_empty() {
            let vn: i32 = norm_token.parse().ok()?;
            fi.norm_idx = if absolute {
                vn - 1
            } else {
                data_set.normals.len() as i32 + vn
            };
            if fi.norm_idx < 0 || fi.norm_idx >= data_set.normals.len() as i32 {
                return None;
            }
        }
    }

    Some(fi)
}

/// Apply scaling and axis conversion to a parsed coordinate triple.
///
/// The X flip corrects handedness; with `z_up` the vertical axis is remapped
/// as well.
fn convert_vec3(v: Vec3, scaling: f32, z_up: bool) -> Vec3 {
    let (x, y, z) = (v.x * scaling, v.y * scaling, v.z * scaling);
    if z_up {
        Vec3::new(-x, z, -y)
    } else {
        Vec3::new(-x, y, z)
    }
}

fn parse_vec3_tokens(tokens: &[&str]) -> Option<Vec3> {
    if tokens.len() < 4 {
        return None;
    }
    let x: f32 = tokens[1].parse().ok()?;
    let y: f32 = tokens[2].parse().ok()?;
    let z: f32 = tokens[3].parse().ok()?;
    Some(Vec3::new(x, y, z))
}

fn parse_vec2_tokens(tokens: &[&str]) -> Option<Vec2> {
    if tokens.len() < 3 {
        return None;
    }
    let u: f32 = tokens[1].parse().ok()?;
    let v: f32 = tokens[2].parse().ok()?;
    Some(Vec2::new(u, v))
}

/// Optional vertex color trailing a `v` line (`v x y z r g b`).
fn parse_color_tokens(tokens: &[&str]) -> Option<Color> {
    let r: f32 = tokens[4].parse().ok()?;
    let g: f32 = tokens[5].parse().ok()?;
    let b: f32 = tokens[6].parse().ok()?;
    Some(Color::new(r, g, b, 1.0))
}

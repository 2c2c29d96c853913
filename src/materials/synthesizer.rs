//! Material synthesis
//!
//! Turns parsed [`MaterialData`] descriptors plus their decoded textures into
//! renderer-ready materials: blend-mode classification, metallic/smoothness
//! derivation from the Phong exponent, and synthesized albedo, normal and
//! gloss images. One material is produced per [`MaterialSynthesizer::build_next`]
//! call so large libraries stay cooperative.

use std::collections::HashSet;

use crate::foundation::math::{clamp01, Color};
use crate::import::ImportOptions;
use crate::materials::{MaterialData, TextureData, TextureSet};

/// Alpha below this value counts as fully punched out.
const ALPHA_CUTOUT_THRESHOLD: f32 = 1.0 / 255.0;

/// Intensity scale applied when the bump texture is already a normal map.
const NORMAL_MAP_SCALE: f32 = 0.25;

/// File-name tag marking a bump texture as a ready normal map.
const NORMAL_MAP_TAG: &str = "_normal_map";

/// How a material's transparency is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendMode {
    /// No transparency
    Opaque,
    /// Binary alpha, punch-through holes
    Cutout,
    /// Per-pixel alpha blending modulated by the overall alpha
    Fade,
    /// Uniform transparency from the overall alpha
    Transparent,
}

/// Shading path selected for a material.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderPath {
    /// Standard lit, metallic workflow
    Standard,
    /// Standard lit, specular workflow
    StandardSpecular,
    /// Unlit textured path for prelit diffuse maps
    Unlit,
}

/// Renderer-ready material derived from one descriptor.
#[derive(Debug, Clone)]
pub struct SynthesizedMaterial {
    /// Descriptor name
    pub name: String,
    /// Selected shading path
    pub shader_path: ShaderPath,
    /// Transparency classification
    pub blend_mode: BlendMode,
    /// Metallic factor derived from shininess
    pub metallic: f32,
    /// Smoothness factor derived from shininess
    pub smoothness: f32,
    /// Flat base color (diffuse RGB with the overall alpha)
    pub base_color: Color,
    /// Albedo image; a 1x1 flat image when no texture contributed
    pub albedo: TextureData,
    /// Normal map, when a bump texture was available
    pub normal_map: Option<TextureData>,
    /// Intensity scale to apply to the normal map
    pub normal_scale: f32,
    /// Metallic/gloss image, when a specular texture was available
    pub gloss_map: Option<TextureData>,
}

/// Step-wise synthesis over a descriptor list and its decoded textures.
///
/// Descriptors are processed in declaration order; duplicate names are
/// skipped with a warning so the first declaration wins.
pub struct MaterialSynthesizer {
    materials: Vec<MaterialData>,
    textures: TextureSet,
    lit_diffuse: bool,
    specular_workflow: bool,
    next_index: usize,
    seen_names: HashSet<String>,
    built: usize,
}

impl MaterialSynthesizer {
    /// Create a synthesizer over parsed descriptors and decoded textures.
    pub fn new(materials: Vec<MaterialData>, textures: TextureSet, options: &ImportOptions) -> Self {
        Self {
            materials,
            textures,
            lit_diffuse: options.lit_diffuse,
            specular_workflow: options.specular_workflow,
            next_index: 0,
            seen_names: HashSet::new(),
            built: 0,
        }
    }

    /// Total number of descriptors, duplicates included.
    pub fn total(&self) -> usize {
        self.materials.len()
    }

    /// Number of materials synthesized so far.
    pub fn built(&self) -> usize {
        self.built
    }

    /// Synthesize the next material, or `None` when the list is exhausted.
    pub fn build_next(&mut self) -> Option<SynthesizedMaterial> {
        while self.next_index < self.materials.len() {
            let index = self.next_index;
            self.next_index += 1;
            if !self.seen_names.insert(self.materials[index].name.clone()) {
                log::warn!(
                    "duplicate material '{}' skipped, first declaration wins",
                    self.materials[index].name
                );
                continue;
            }
            let material = synthesize(
                &self.materials[index],
                &self.textures,
                self.lit_diffuse,
                self.specular_workflow,
            );
            self.built += 1;
            return Some(material);
        }
        None
    }

    /// Fallback material used when a model declares no material library.
    pub fn default_material() -> SynthesizedMaterial {
        synthesize(
            &MaterialData::new(crate::dataset::DEFAULT_NAME),
            &TextureSet::new(),
            false,
            false,
        )
    }
}

impl Iterator for MaterialSynthesizer {
    type Item = SynthesizedMaterial;

    fn next(&mut self) -> Option<Self::Item> {
        self.build_next()
    }
}

fn synthesize(
    md: &MaterialData,
    textures: &TextureSet,
    lit_diffuse: bool,
    specular_workflow: bool,
) -> SynthesizedMaterial {
    let shin_log = md.shininess.log2();
    let metallic = clamp01(shin_log / 10.0);
    let mut smoothness = metallic;

    let mut mode = if md.overall_alpha < 1.0 {
        BlendMode::Transparent
    } else {
        BlendMode::Opaque
    };

    let diffuse_tex = lookup(textures, md.diffuse_tex_path.as_deref(), &md.name);
    let opacity_tex = lookup(textures, md.opacity_tex_path.as_deref(), &md.name);
    let bump_tex = lookup(textures, md.bump_tex_path.as_deref(), &md.name);
    let specular_tex = lookup(textures, md.specular_tex_path.as_deref(), &md.name);

    let use_unlit = lit_diffuse
        && diffuse_tex.is_some()
        && bump_tex.is_none()
        && opacity_tex.is_none()
        && specular_tex.is_none()
        && !md.has_reflection_tex;

    // the unlit path is only valid for fully opaque diffuse maps
    let mut diffuse_is_transparent = None;
    if use_unlit {
        if let Some(diffuse) = diffuse_tex {
            diffuse_is_transparent = Some(scan_transparent_pixels(diffuse, &mut mode));
        }
    }

    let shader_path = if use_unlit && diffuse_is_transparent == Some(false) {
        ShaderPath::Unlit
    } else if specular_workflow {
        ShaderPath::StandardSpecular
    } else {
        ShaderPath::Standard
    };

    let albedo = match (diffuse_tex, opacity_tex) {
        (Some(diffuse), Some(opacity)) => {
            // the opacity value multiplies the diffuse alpha, so blending
            // varies per pixel
            mode = BlendMode::Fade;
            blend_diffuse_opacity(diffuse, opacity)
        }
        (Some(diffuse), None) => {
            if diffuse_is_transparent.is_none() {
                scan_transparent_pixels(diffuse, &mut mode);
            }
            diffuse.clone()
        }
        (None, Some(opacity)) => {
            mode = BlendMode::Fade;
            flat_color_with_opacity(md, opacity, &mut mode)
        }
        (None, None) => {
            let flat = Color::new(
                md.diffuse_color.x,
                md.diffuse_color.y,
                md.diffuse_color.z,
                md.overall_alpha,
            );
            let mut albedo = TextureData::new(1, 1);
            albedo.set_pixel(0, 0, flat);
            albedo
        }
    };

    let mut base_color = Color::new(
        md.diffuse_color.x,
        md.diffuse_color.y,
        md.diffuse_color.z,
        md.overall_alpha,
    );

    let (normal_map, normal_scale) = match bump_tex {
        Some(bump) => {
            let path = md.bump_tex_path.as_deref().unwrap_or("");
            if path.contains(NORMAL_MAP_TAG) {
                (Some(bump.clone()), NORMAL_MAP_SCALE)
            } else {
                (Some(height_to_normal_map(bump)), 1.0)
            }
        }
        None => (None, 1.0),
    };

    let gloss_map =
        specular_tex.map(|s| build_gloss_map(s, metallic, smoothness, md.has_reflection_tex));

    if md.has_reflection_tex {
        if md.overall_alpha < 1.0 {
            base_color = Color::new(1.0, 1.0, 1.0, md.overall_alpha);
            mode = BlendMode::Fade;
        }
        // reflection maps are taken as sharp
        smoothness = 1.0;
    }

    SynthesizedMaterial {
        name: md.name.clone(),
        shader_path,
        blend_mode: mode,
        metallic,
        smoothness,
        base_color,
        albedo,
        normal_map,
        normal_scale,
        gloss_map,
    }
}

fn lookup<'a>(textures: &'a TextureSet, path: Option<&str>, material: &str) -> Option<&'a TextureData> {
    let path = path?;
    let texture = textures.get(path);
    if texture.is_none() {
        log::warn!(
            "texture '{}' referenced by material '{}' was not provided, skipping",
            path,
            material
        );
    }
    texture
}

/// Classify one alpha value, latching the first classification past opaque.
fn detect_fade_or_cutout(alpha: f32, mode: &mut BlendMode, detected: &mut bool) {
    if *detected || alpha >= 1.0 {
        return;
    }
    *mode = if alpha < ALPHA_CUTOUT_THRESHOLD {
        BlendMode::Cutout
    } else {
        BlendMode::Fade
    };
    *detected = true;
}

/// Scan a texture's alpha channel; stops at the first non-opaque pixel.
/// Returns true when any transparency was found.
fn scan_transparent_pixels(texture: &TextureData, mode: &mut BlendMode) -> bool {
    let mut detected = false;
    for y in 0..texture.height {
        for x in 0..texture.width {
            let alpha = texture.get_pixel(x, y).w;
            detect_fade_or_cutout(alpha, mode, &mut detected);
            if detected {
                return true;
            }
        }
    }
    false
}

/// Merge a diffuse texture with an opacity map into one albedo image.
fn blend_diffuse_opacity(diffuse: &TextureData, opacity: &TextureData) -> TextureData {
    let mut albedo = TextureData::new(diffuse.width, diffuse.height);
    for y in 0..diffuse.height {
        for x in 0..diffuse.width {
            let mut color = diffuse.get_pixel(x, y);
            let ox = x.min(opacity.width - 1);
            let oy = y.min(opacity.height - 1);
            color.w *= opacity.grayscale(ox, oy);
            albedo.set_pixel(x, y, color);
        }
    }
    albedo
}

/// Albedo from the flat diffuse color with per-pixel opacity, classifying
/// Cutout/Fade from the resulting alpha values.
fn flat_color_with_opacity(
    md: &MaterialData,
    opacity: &TextureData,
    mode: &mut BlendMode,
) -> TextureData {
    let mut albedo = TextureData::new(opacity.width, opacity.height);
    let mut detected = false;
    for y in 0..opacity.height {
        for x in 0..opacity.width {
            let alpha = md.overall_alpha * opacity.grayscale(x, y);
            detect_fade_or_cutout(alpha, mode, &mut detected);
            albedo.set_pixel(
                x,
                y,
                Color::new(
                    md.diffuse_color.x,
                    md.diffuse_color.y,
                    md.diffuse_color.z,
                    alpha,
                ),
            );
        }
    }
    albedo
}

/// Gloss image from a specular texture: RGB carries the metallic response,
/// alpha the smoothness response.
fn build_gloss_map(
    specular: &TextureData,
    metallic: f32,
    smoothness: f32,
    has_reflection: bool,
) -> TextureData {
    let mut gloss = TextureData::new(specular.width, specular.height);
    for y in 0..specular.height {
        for x in 0..specular.width {
            let gray = specular.grayscale(x, y);
            let m = metallic * gray;
            let a = if has_reflection { gray } else { gray * smoothness };
            gloss.set_pixel(x, y, Color::new(m, m, m, a));
        }
    }
    gloss
}

/// Convert a height map into a tangent-space normal map using centered
/// finite differences, clamping samples at the borders.
pub fn height_to_normal_map(height: &TextureData) -> TextureData {
    let mut normal = TextureData::new(height.width, height.height);
    let max_x = height.width - 1;
    let max_y = height.height - 1;
    for y in 0..height.height {
        for x in 0..height.width {
            let left = height.grayscale(x.saturating_sub(1), y);
            let right = height.grayscale((x + 1).min(max_x), y);
            let up = height.grayscale(x, y.saturating_sub(1));
            let down = height.grayscale(x, (y + 1).min(max_y));
            let dx = ((left - right) + 1.0) * 0.5;
            let dy = ((up - down) + 1.0) * 0.5;
            normal.set_pixel(x, y, Color::new(dx, dy, 1.0, dy));
        }
    }
    normal
}

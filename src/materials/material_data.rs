//! Material descriptor parsed from a material library

use crate::foundation::math::Color;

/// Parsed material description (Wavefront Phong model).
///
/// One descriptor is created per `newmtl` directive and mutated by the
/// attribute directives that follow it. Defaults apply to attributes the
/// library never sets.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialData {
    /// Material name
    pub name: String,
    /// Ambient color (Ka)
    pub ambient_color: Color,
    /// Diffuse color (Kd)
    pub diffuse_color: Color,
    /// Specular color (Ks)
    pub specular_color: Color,
    /// Specular exponent (Ns)
    pub shininess: f32,
    /// Overall opacity in `[0, 1]` (`d`, or `1 - Tr`)
    pub overall_alpha: f32,
    /// Illumination model (illum): 1 diffuse, 2 diffuse + specular
    pub illum_type: i32,
    /// Diffuse texture path (map_Kd)
    pub diffuse_tex_path: Option<String>,
    /// Bump or normal map path (map_bump / bump)
    pub bump_tex_path: Option<String>,
    /// Specular texture path (map_Ks / map_Ns)
    pub specular_tex_path: Option<String>,
    /// Opacity texture path (map_d / map_opacity)
    pub opacity_tex_path: Option<String>,
    /// True when a reflection map (refl) was declared
    pub has_reflection_tex: bool,
}

impl MaterialData {
    /// Create a descriptor with default attributes.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ambient_color: Color::new(1.0, 1.0, 1.0, 1.0),
            diffuse_color: Color::new(0.8, 0.8, 0.8, 1.0),
            specular_color: Color::new(0.5, 0.5, 0.5, 1.0),
            shininess: 250.0,
            overall_alpha: 1.0,
            illum_type: 2,
            diffuse_tex_path: None,
            bump_tex_path: None,
            specular_tex_path: None,
            opacity_tex_path: None,
            has_reflection_tex: false,
        }
    }

    /// All texture paths referenced by this descriptor, without duplicates.
    pub fn texture_paths(&self) -> Vec<&str> {
        let mut paths: Vec<&str> = Vec::new();
        for path in [
            self.diffuse_tex_path.as_deref(),
            self.bump_tex_path.as_deref(),
            self.specular_tex_path.as_deref(),
            self.opacity_tex_path.as_deref(),
        ]
        .into_iter()
        .flatten()
        {
            if !paths.contains(&path) {
                paths.push(path);
            }
        }
        paths
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_defaults() {
        let mat = MaterialData::new("M");
        assert_eq!(mat.name, "M");
        assert_eq!(mat.diffuse_color, Color::new(0.8, 0.8, 0.8, 1.0));
        assert_eq!(mat.shininess, 250.0);
        assert_eq!(mat.overall_alpha, 1.0);
        assert_eq!(mat.illum_type, 2);
        assert!(!mat.has_reflection_tex);
    }

    #[test]
    fn test_texture_paths_skips_unset() {
        let mut mat = MaterialData::new("M");
        assert!(mat.texture_paths().is_empty());
        mat.diffuse_tex_path = Some("a.png".to_string());
        mat.opacity_tex_path = Some("b.png".to_string());
        assert_eq!(mat.texture_paths(), vec!["a.png", "b.png"]);
    }
}

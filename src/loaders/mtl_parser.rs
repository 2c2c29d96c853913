//! MTL (Material Template Library) parser
//!
//! Parses material library text into an ordered list of [`MaterialData`]
//! descriptors. Malformed attribute lines are logged and skipped so a partly
//! broken library still yields usable materials.

use crate::foundation::math::Color;
use crate::materials::MaterialData;

/// Bump option flags with their value arity. `-o`, `-s` and `-t` take up to
/// three numeric values; the rest take exactly one token.
const BUMP_OPTIONS: &[(&str, bool, usize, usize)] = &[
    ("bm", false, 1, 1),
    ("clamp", false, 1, 1),
    ("blendu", false, 1, 1),
    ("blendv", false, 1, 1),
    ("imfchan", false, 1, 1),
    ("mm", false, 1, 1),
    ("o", true, 1, 3),
    ("s", true, 1, 3),
    ("t", true, 1, 3),
    ("texres", false, 1, 1),
];

/// MTL text parser
pub struct MtlParser;

impl MtlParser {
    /// Parse material library text into descriptors, in declaration order.
    ///
    /// Duplicate `newmtl` names enter the list as independent descriptors;
    /// the lookup layer decides which one wins. Attribute directives before
    /// the first `newmtl` have no target and are dropped.
    pub fn parse(text: &str) -> Vec<MaterialData> {
        let mut materials: Vec<MaterialData> = Vec::new();

        for (line_num, raw_line) in text.lines().enumerate() {
            // a '#' starts a comment anywhere in the line
            let line = match raw_line.find('#') {
                Some(pos) => raw_line[..pos].trim(),
                None => raw_line.trim(),
            };
            if line.is_empty() {
                continue;
            }

            let tokens: Vec<&str> = line.split_whitespace().collect();
            let directive = tokens[0];
            let parameters = line[directive.len()..].trim();

            if directive == "newmtl" {
                materials.push(MaterialData::new(parameters));
                continue;
            }

            let Some(current) = materials.last_mut() else {
                log::warn!(
                    "line {}: attribute '{}' before any newmtl, skipped",
                    line_num + 1,
                    directive
                );
                continue;
            };

            match directive {
                "Ka" => {
                    if let Some(c) = parse_color(&tokens) {
                        current.ambient_color = c;
                    } else {
                        warn_malformed(line_num, line);
                    }
                }
                "Kd" => {
                    if let Some(c) = parse_color(&tokens) {
                        current.diffuse_color = c;
                    } else {
                        warn_malformed(line_num, line);
                    }
                }
                "Ks" => {
                    if let Some(c) = parse_color(&tokens) {
                        current.specular_color = c;
                    } else {
                        warn_malformed(line_num, line);
                    }
                }
                "Ns" => match parse_f32(&tokens) {
                    Some(v) => current.shininess = v,
                    None => warn_malformed(line_num, line),
                },
                // d and Tr write the same field, later directive wins; a bare
                // directive means fully opaque
                "d" => match tokens.get(1) {
                    None => current.overall_alpha = 1.0,
                    Some(token) => match token.parse::<f32>() {
                        Ok(v) => current.overall_alpha = v,
                        Err(_) => warn_malformed(line_num, line),
                    },
                },
                "Tr" => match tokens.get(1) {
                    None => current.overall_alpha = 1.0,
                    Some(token) => match token.parse::<f32>() {
                        Ok(v) => current.overall_alpha = 1.0 - v,
                        Err(_) => warn_malformed(line_num, line),
                    },
                },
                "illum" => match parse_i32(&tokens) {
                    Some(v) => current.illum_type = v,
                    None => warn_malformed(line_num, line),
                },
                "map_Kd" => {
                    if !parameters.is_empty() {
                        current.diffuse_tex_path = Some(parameters.to_string());
                    }
                }
                "map_Ks" | "map_Ns" => {
                    if !parameters.is_empty() {
                        current.specular_tex_path = Some(parameters.to_string());
                    }
                }
                "map_bump" | "map_Bump" => {
                    if !parameters.is_empty() {
                        current.bump_tex_path = Some(parameters.to_string());
                    }
                }
                "bump" => {
                    parse_bump_parameters(&tokens, current);
                }
                "map_d" | "map_opacity" => {
                    if !parameters.is_empty() {
                        current.opacity_tex_path = Some(parameters.to_string());
                    }
                }
                "refl" => {
                    if !parameters.is_empty() {
                        current.has_reflection_tex = true;
                    }
                }
                "map_Ka" => {
                    log::debug!("line {}: ambient map not supported: '{}'", line_num + 1, line);
                }
                _ => {
                    log::debug!("line {}: unprocessed directive: '{}'", line_num + 1, line);
                }
            }
        }

        materials
    }
}

fn warn_malformed(line_num: usize, line: &str) {
    log::warn!("line {}: malformed material attribute skipped: '{}'", line_num + 1, line);
}

fn parse_f32(tokens: &[&str]) -> Option<f32> {
    tokens.get(1)?.parse().ok()
}

fn parse_i32(tokens: &[&str]) -> Option<i32> {
    tokens.get(1)?.parse().ok()
}

fn parse_color(tokens: &[&str]) -> Option<Color> {
    if tokens.len() < 4 {
        return None;
    }
    let r: f32 = tokens[1].parse().ok()?;
    let g: f32 = tokens[2].parse().ok()?;
    let b: f32 = tokens[3].parse().ok()?;
    Some(Color::new(r, g, b, 1.0))
}

/// Walk a `bump` statement's tokens, skipping option flags and their values;
/// the last token that is not part of an option is the map filename.
fn parse_bump_parameters(tokens: &[&str], material: &mut MaterialData) {
    let mut pos = 1;
    let mut filename: Option<&str> = None;
    while pos < tokens.len() {
        let token = tokens[pos];
        if !token.starts_with('-') {
            filename = Some(token);
            pos += 1;
            continue;
        }

        let option = &token[1..];
        pos += 1;
        let Some(&(_, numeric, min, max)) = BUMP_OPTIONS.iter().find(|def| def.0 == option) else {
            continue;
        };

        let mut taken = 0;
        while taken < max && pos < tokens.len() {
            if numeric && !is_plain_number(tokens[pos]) {
                break;
            }
            pos += 1;
            taken += 1;
            if !numeric && taken >= min {
                break;
            }
        }
        if taken < min {
            log::debug!(
                "not enough values for bump option '-{}' of material '{}'",
                option,
                material.name
            );
        }
    }
    if let Some(name) = filename {
        material.bump_tex_path = Some(name.to_string());
    }
}

/// Plain decimal literal: optional sign, optional integer part, optional dot,
/// at least one trailing digit. No exponents.
fn is_plain_number(token: &str) -> bool {
    let body = token.strip_prefix(['-', '+']).unwrap_or(token);
    let mut parts = body.splitn(2, '.');
    let integer = parts.next().unwrap_or("");
    match parts.next() {
        Some(fraction) => {
            !fraction.is_empty()
                && integer.chars().all(|c| c.is_ascii_digit())
                && fraction.chars().all(|c| c.is_ascii_digit())
        }
        None => !integer.is_empty() && integer.chars().all(|c| c.is_ascii_digit()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_material() {
        let text = r#"
# simple material
newmtl TestMaterial
Ka 1.0 1.0 1.0
Kd 0.8 0.2 0.2
Ks 0.5 0.5 0.5
Ns 96.0
d 1.0
illum 2
"#;
        let materials = MtlParser::parse(text);
        assert_eq!(materials.len(), 1);
        let mat = &materials[0];
        assert_eq!(mat.name, "TestMaterial");
        assert_eq!(mat.diffuse_color, Color::new(0.8, 0.2, 0.2, 1.0));
        assert_eq!(mat.shininess, 96.0);
        assert_eq!(mat.overall_alpha, 1.0);
    }

    #[test]
    fn test_later_alpha_directive_wins() {
        let text = "newmtl M\nd 0.5\nTr 0.2\n";
        let materials = MtlParser::parse(text);
        assert!((materials[0].overall_alpha - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_alpha_missing_value_defaults_opaque() {
        let materials = MtlParser::parse("newmtl M\nd 0.25\nd\n");
        assert_eq!(materials[0].overall_alpha, 1.0);
        let materials = MtlParser::parse("newmtl M\nd 0.25\nTr\n");
        assert_eq!(materials[0].overall_alpha, 1.0);
    }

    #[test]
    fn test_malformed_alpha_value_skipped() {
        let materials = MtlParser::parse("newmtl M\nd 0.25\nd abc\n");
        assert_eq!(materials[0].overall_alpha, 0.25);
        let materials = MtlParser::parse("newmtl M\nd 0.25\nTr abc\n");
        assert_eq!(materials[0].overall_alpha, 0.25);
    }

    #[test]
    fn test_declaration_order_and_duplicates_kept() {
        let text = "newmtl A\nKd 1 0 0\nnewmtl B\nnewmtl A\nKd 0 0 1\n";
        let materials = MtlParser::parse(text);
        let names: Vec<&str> = materials.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B", "A"]);
        assert_eq!(materials[0].diffuse_color, Color::new(1.0, 0.0, 0.0, 1.0));
        assert_eq!(materials[2].diffuse_color, Color::new(0.0, 0.0, 1.0, 1.0));
    }

    #[test]
    fn test_inline_comment_stripped() {
        let text = "newmtl M\nKd 0.1 0.2 0.3 # rgb\n";
        let materials = MtlParser::parse(text);
        assert_eq!(materials[0].diffuse_color, Color::new(0.1, 0.2, 0.3, 1.0));
    }

    #[test]
    fn test_texture_path_with_spaces() {
        let text = "newmtl M\nmap_Kd textures/my diffuse.png\n";
        let materials = MtlParser::parse(text);
        assert_eq!(
            materials[0].diffuse_tex_path.as_deref(),
            Some("textures/my diffuse.png")
        );
    }

    #[test]
    fn test_material_name_with_spaces() {
        let materials = MtlParser::parse("newmtl Brushed Steel\n");
        assert_eq!(materials[0].name, "Brushed Steel");
    }

    #[test]
    fn test_bump_statement_with_options() {
        let text = "newmtl M\nbump -bm 0.5 -s 1 1 1 normal.png\n";
        let materials = MtlParser::parse(text);
        assert_eq!(materials[0].bump_tex_path.as_deref(), Some("normal.png"));
    }

    #[test]
    fn test_bump_filename_before_options() {
        let text = "newmtl M\nbump height.png -o 0 0\n";
        let materials = MtlParser::parse(text);
        assert_eq!(materials[0].bump_tex_path.as_deref(), Some("height.png"));
    }

    #[test]
    fn test_specular_and_opacity_maps() {
        let text = "newmtl M\nmap_Ns spec.png\nmap_d mask.png\nrefl env.png\n";
        let materials = MtlParser::parse(text);
        assert_eq!(materials[0].specular_tex_path.as_deref(), Some("spec.png"));
        assert_eq!(materials[0].opacity_tex_path.as_deref(), Some("mask.png"));
        assert!(materials[0].has_reflection_tex);
    }

    #[test]
    fn test_attribute_before_newmtl_dropped() {
        let materials = MtlParser::parse("Kd 1 0 0\nnewmtl M\n");
        assert_eq!(materials.len(), 1);
        assert_eq!(materials[0].diffuse_color, Color::new(0.8, 0.8, 0.8, 1.0));
    }

    #[test]
    fn test_plain_number_matcher() {
        assert!(is_plain_number("1"));
        assert!(is_plain_number("-0.5"));
        assert!(is_plain_number("+.25"));
        assert!(!is_plain_number("1."));
        assert!(!is_plain_number("1e3"));
        assert!(!is_plain_number("-"));
        assert!(!is_plain_number("x"));
    }
}

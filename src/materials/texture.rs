//! Decoded texture data for material synthesis
//!
//! Textures are held as plain RGBA8 pixel buffers with per-pixel access, the
//! form the synthesizer reads and writes. Decoding goes through the `image`
//! crate.

use std::collections::HashMap;
use std::path::Path;

use thiserror::Error;

use crate::foundation::math::Color;

/// Errors raised while decoding texture images.
#[derive(Error, Debug)]
pub enum TextureError {
    /// Reading the image file failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// The image bytes could not be decoded
    #[error("failed to decode image: {0}")]
    Decode(String),
}

/// Decoded image held as raw RGBA8 pixels.
#[derive(Debug, Clone)]
pub struct TextureData {
    /// Raw RGBA pixel data, row-major from the top-left corner
    pub data: Vec<u8>,
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
}

impl TextureData {
    /// Create a zero-filled (transparent black) texture.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            data: vec![0; (width as usize) * (height as usize) * 4],
            width,
            height,
        }
    }

    /// Create a solid color texture.
    pub fn solid_color(width: u32, height: u32, color: [u8; 4]) -> Self {
        let pixel_count = (width as usize) * (height as usize);
        let mut data = Vec::with_capacity(pixel_count * 4);
        for _ in 0..pixel_count {
            data.extend_from_slice(&color);
        }
        Self {
            data,
            width,
            height,
        }
    }

    /// Decode a texture from an image file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, TextureError> {
        let path_ref = path.as_ref();
        log::debug!("loading texture from {:?}", path_ref);
        let bytes = std::fs::read(path_ref)?;
        Self::from_bytes(&bytes)
    }

    /// Decode a texture from in-memory image bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TextureError> {
        let img = image::load_from_memory(bytes).map_err(|e| TextureError::Decode(e.to_string()))?;
        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();
        log::debug!("decoded texture {}x{}", width, height);
        Ok(Self {
            data: rgba.into_raw(),
            width,
            height,
        })
    }

    fn offset(&self, x: u32, y: u32) -> usize {
        ((y as usize) * (self.width as usize) + (x as usize)) * 4
    }

    /// Read a pixel as a normalized RGBA color. Coordinates must be in range.
    pub fn get_pixel(&self, x: u32, y: u32) -> Color {
        let i = self.offset(x, y);
        Color::new(
            self.data[i] as f32 / 255.0,
            self.data[i + 1] as f32 / 255.0,
            self.data[i + 2] as f32 / 255.0,
            self.data[i + 3] as f32 / 255.0,
        )
    }

    /// Write a pixel from a normalized RGBA color, clamping each channel.
    pub fn set_pixel(&mut self, x: u32, y: u32, color: Color) {
        let i = self.offset(x, y);
        self.data[i] = (color.x.clamp(0.0, 1.0) * 255.0).round() as u8;
        self.data[i + 1] = (color.y.clamp(0.0, 1.0) * 255.0).round() as u8;
        self.data[i + 2] = (color.z.clamp(0.0, 1.0) * 255.0).round() as u8;
        self.data[i + 3] = (color.w.clamp(0.0, 1.0) * 255.0).round() as u8;
    }

    /// Perceptual luminance of a pixel in `[0, 1]`.
    pub fn grayscale(&self, x: u32, y: u32) -> f32 {
        let c = self.get_pixel(x, y);
        0.299 * c.x + 0.587 * c.y + 0.114 * c.z
    }
}

/// Decoded textures keyed by the path that referenced them.
///
/// Texture decoding is the caller's concern; the importer only consumes the
/// set. A path missing from the set is reported and the dependent synthesis
/// step is skipped.
#[derive(Debug, Clone, Default)]
pub struct TextureSet {
    textures: HashMap<String, TextureData>,
}

impl TextureSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a decoded texture under the path materials refer to it by.
    pub fn insert(&mut self, path: &str, texture: TextureData) {
        self.textures.insert(path.to_string(), texture);
    }

    /// Look up a texture by path.
    pub fn get(&self, path: &str) -> Option<&TextureData> {
        self.textures.get(path)
    }

    /// Number of registered textures.
    pub fn len(&self) -> usize {
        self.textures.len()
    }

    /// True when no texture has been registered.
    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }
}

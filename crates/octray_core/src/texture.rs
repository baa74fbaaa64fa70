//! Bilinear texture sampling for texture-driven vertex reflectance.
//!
//! Decoding images from disk is left to the caller; a [`Texture`] is built
//! from pixels already in memory (or from an `image::RgbImage`).

use octray_math::{DVec2, DVec3};
use thiserror::Error;

/// Errors that can occur while building a texture.
#[derive(Error, Debug, PartialEq)]
pub enum TextureError {
    #[error("Texture has zero size ({width}x{height})")]
    Empty { width: u32, height: u32 },

    #[error("Expected {expected} pixels for a {width}x{height} texture, got {actual}")]
    DimensionMismatch {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
}

pub type TextureResult<T> = Result<T, TextureError>;

/// Anything that can answer an RGB value for a UV coordinate.
pub trait TextureSampler: Send + Sync {
    /// Sample the RGB value at `uv`, with (0, 0) at the bottom-left.
    fn sample(&self, uv: DVec2) -> DVec3;
}

/// A loaded texture with linear RGB pixel data.
#[derive(Clone, Debug)]
pub struct Texture {
    /// Texture width in pixels
    pub width: u32,

    /// Texture height in pixels
    pub height: u32,

    /// Linear RGB, row-major, top row first
    pixels: Vec<DVec3>,
}

impl Texture {
    /// Create a new texture from pixel data.
    pub fn new(width: u32, height: u32, pixels: Vec<DVec3>) -> TextureResult<Self> {
        if width == 0 || height == 0 {
            return Err(TextureError::Empty { width, height });
        }

        let expected = width as usize * height as usize;
        if pixels.len() != expected {
            return Err(TextureError::DimensionMismatch {
                width,
                height,
                expected,
                actual: pixels.len(),
            });
        }

        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Create a solid color texture (1x1).
    pub fn solid_color(color: DVec3) -> Self {
        Self {
            width: 1,
            height: 1,
            pixels: vec![color],
        }
    }

    /// Convert an 8-bit sRGB image into a linear texture.
    pub fn from_rgb_image(image: &image::RgbImage) -> TextureResult<Self> {
        let (width, height) = image.dimensions();
        let pixels = image
            .pixels()
            .map(|p| {
                DVec3::new(
                    srgb_to_linear(p[0]),
                    srgb_to_linear(p[1]),
                    srgb_to_linear(p[2]),
                )
            })
            .collect();

        Self::new(width, height, pixels)
    }

    /// Get pixel at integer coordinates.
    fn get_pixel(&self, x: u32, y: u32) -> DVec3 {
        let idx = y as usize * self.width as usize + x as usize;
        self.pixels.get(idx).copied().unwrap_or(DVec3::ZERO)
    }
}

impl TextureSampler for Texture {
    /// Bilinear filtering with wrapped UV coordinates.
    fn sample(&self, uv: DVec2) -> DVec3 {
        let u = uv.x.rem_euclid(1.0);
        let v = uv.y.rem_euclid(1.0);

        // Convert to pixel coordinates
        let x = u * (self.width as f64 - 1.0);
        let y = (1.0 - v) * (self.height as f64 - 1.0); // Flip V for image coordinates

        let x0 = (x.floor() as u32).min(self.width - 1);
        let y0 = (y.floor() as u32).min(self.height - 1);
        let x1 = (x0 + 1).min(self.width - 1);
        let y1 = (y0 + 1).min(self.height - 1);

        let fx = x.fract();
        let fy = y.fract();

        let top = self.get_pixel(x0, y0).lerp(self.get_pixel(x1, y0), fx);
        let bottom = self.get_pixel(x0, y1).lerp(self.get_pixel(x1, y1), fx);

        top.lerp(bottom, fy)
    }
}

/// Convert sRGB byte value to linear float.
fn srgb_to_linear(value: u8) -> f64 {
    let v = value as f64 / 255.0;
    if v <= 0.04045 {
        v / 12.92
    } else {
        ((v + 0.055) / 1.055).powf(2.4)
    }
}

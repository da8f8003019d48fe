use std::path::Path;

use glam::{Vec2, Vec3, Vec4};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced while loading or constructing textures.
#[derive(Debug, Error)]
pub enum TextureError {
    #[error("failed to read texture {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to decode texture {path}: {source}")]
    Decode {
        path: String,
        source: image::ImageError,
    },
    #[error("texture data is {actual} bytes, expected {expected} for {width}x{height}")]
    SizeMismatch {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
    #[error("texture dimensions must be non-zero")]
    ZeroExtent,
}

/// Texel filtering used by [`Sampler`] and the present blit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterMode {
    Nearest,
    #[default]
    Bilinear,
}

/// How texture coordinates outside [0, 1] are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressMode {
    #[default]
    Repeat,
    Clamp,
}

/// Sampling parameters applied when reading a [`Texture`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Sampler {
    pub filter: FilterMode,
    pub address: AddressMode,
}

impl Sampler {
    /// Bilinear filtering with repeat addressing, the mesh-texture default.
    pub fn repeating() -> Self {
        Self {
            filter: FilterMode::Bilinear,
            address: AddressMode::Repeat,
        }
    }

    fn resolve(&self, coord: f32, size: u32) -> f32 {
        let size = size as f32;
        match self.address {
            AddressMode::Repeat => {
                let wrapped = coord.rem_euclid(size);
                if wrapped >= size {
                    0.0
                } else {
                    wrapped
                }
            }
            AddressMode::Clamp => coord.clamp(0.0, size - 1.0),
        }
    }
}

/// An RGBA8 image sampled by the shading stage.
#[derive(Debug, Clone, PartialEq)]
pub struct Texture {
    width: u32,
    height: u32,
    texels: Vec<[u8; 4]>,
}

impl Texture {
    /// Wraps raw RGBA8 data as a texture.
    pub fn from_rgba8(width: u32, height: u32, data: Vec<u8>) -> Result<Self, TextureError> {
        if width == 0 || height == 0 {
            return Err(TextureError::ZeroExtent);
        }
        let expected = width as usize * height as usize * 4;
        if data.len() != expected {
            return Err(TextureError::SizeMismatch {
                width,
                height,
                expected,
                actual: data.len(),
            });
        }
        let texels = data
            .chunks_exact(4)
            .map(|c| [c[0], c[1], c[2], c[3]])
            .collect();
        Ok(Self {
            width,
            height,
            texels,
        })
    }

    /// Loads an image file and converts it to RGBA8.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TextureError> {
        let path = path.as_ref();
        let display = path.display().to_string();
        let bytes = std::fs::read(path).map_err(|source| TextureError::Io {
            path: display.clone(),
            source,
        })?;
        let decoded = image::load_from_memory(&bytes).map_err(|source| TextureError::Decode {
            path: display,
            source,
        })?;
        let rgba = decoded.to_rgba8();
        let (width, height) = rgba.dimensions();
        Self::from_rgba8(width, height, rgba.into_raw())
    }

    /// A 1x1 texture of the given color, used when an object has no texture.
    pub fn solid(color: Vec4) -> Self {
        let to_byte = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        Self {
            width: 1,
            height: 1,
            texels: vec![[
                to_byte(color.x),
                to_byte(color.y),
                to_byte(color.z),
                to_byte(color.w),
            ]],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    fn texel(&self, x: u32, y: u32) -> Vec4 {
        let [r, g, b, a] = self.texels[(y * self.width + x) as usize];
        Vec4::new(
            r as f32 / 255.0,
            g as f32 / 255.0,
            b as f32 / 255.0,
            a as f32 / 255.0,
        )
    }

    /// Samples the texture at normalized coordinates, returning linear [0, 1] RGBA.
    pub fn sample(&self, uv: Vec2, sampler: &Sampler) -> Vec4 {
        match sampler.filter {
            FilterMode::Nearest => {
                let x = sampler.resolve((uv.x * self.width as f32).floor(), self.width);
                let y = sampler.resolve((uv.y * self.height as f32).floor(), self.height);
                self.texel(x as u32, y as u32)
            }
            FilterMode::Bilinear => {
                // Texel centers sit at integer + 0.5.
                let x = uv.x * self.width as f32 - 0.5;
                let y = uv.y * self.height as f32 - 0.5;
                let x0 = x.floor();
                let y0 = y.floor();
                let fx = x - x0;
                let fy = y - y0;
                let sample_at = |tx: f32, ty: f32| {
                    let rx = sampler.resolve(tx, self.width);
                    let ry = sampler.resolve(ty, self.height);
                    self.texel(rx as u32, ry as u32)
                };
                let c00 = sample_at(x0, y0);
                let c10 = sample_at(x0 + 1.0, y0);
                let c01 = sample_at(x0, y0 + 1.0);
                let c11 = sample_at(x0 + 1.0, y0 + 1.0);
                let top = c00.lerp(c10, fx);
                let bottom = c01.lerp(c11, fx);
                top.lerp(bottom, fy)
            }
        }
    }

    /// Samples a tangent-space normal map and decodes the stored direction.
    ///
    /// The green channel is flipped first (texture-origin convention), then
    /// each channel is remapped from [0, 1] to [-1, 1] and the result is
    /// normalized. A degenerate texel decodes to the unperturbed +Z normal.
    pub fn sample_normal(&self, uv: Vec2, sampler: &Sampler) -> Vec3 {
        let texel = self.sample(uv, sampler);
        let flipped = Vec3::new(texel.x, 1.0 - texel.y, texel.z);
        let direction = flipped * 2.0 - Vec3::ONE;
        if direction.length_squared() <= f32::EPSILON {
            Vec3::Z
        } else {
            direction.normalize()
        }
    }
}

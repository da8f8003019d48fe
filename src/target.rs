use std::path::Path;

use anyhow::{anyhow, Context, Result};
use glam::{Vec2, Vec4};

use crate::texture::FilterMode;

/// Linear-color render target with a depth buffer.
///
/// Color stays in f32 linear space for the whole pipeline; conversion to
/// RGBA8 happens only on readback.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderTarget {
    width: u32,
    height: u32,
    color: Vec<Vec4>,
    depth: Vec<f32>,
}

impl RenderTarget {
    pub fn new(width: u32, height: u32) -> Self {
        let len = width as usize * height as usize;
        Self {
            width,
            height,
            color: vec![Vec4::ZERO; len],
            depth: vec![1.0; len],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Clears color to the given value and depth to the far plane.
    pub fn clear(&mut self, color: Vec4) {
        self.color.fill(color);
        self.depth.fill(1.0);
    }

    fn index(&self, x: u32, y: u32) -> usize {
        debug_assert!(x < self.width && y < self.height);
        (y * self.width + x) as usize
    }

    pub fn color_at(&self, x: u32, y: u32) -> Vec4 {
        self.color[self.index(x, y)]
    }

    pub fn set_color(&mut self, x: u32, y: u32, color: Vec4) {
        let idx = self.index(x, y);
        self.color[idx] = color;
    }

    pub fn depth_at(&self, x: u32, y: u32) -> f32 {
        self.depth[self.index(x, y)]
    }

    pub fn set_depth(&mut self, x: u32, y: u32, depth: f32) {
        let idx = self.index(x, y);
        self.depth[idx] = depth;
    }

    /// Samples the color buffer at normalized coordinates with clamp-to-edge
    /// addressing, as the present blit reads the offscreen image.
    pub fn sample(&self, uv: Vec2, filter: FilterMode) -> Vec4 {
        match filter {
            FilterMode::Nearest => {
                let x = ((uv.x * self.width as f32).floor()).clamp(0.0, self.width as f32 - 1.0);
                let y = ((uv.y * self.height as f32).floor()).clamp(0.0, self.height as f32 - 1.0);
                self.color_at(x as u32, y as u32)
            }
            FilterMode::Bilinear => {
                let x = uv.x * self.width as f32 - 0.5;
                let y = uv.y * self.height as f32 - 0.5;
                let x0 = x.floor();
                let y0 = y.floor();
                let fx = x - x0;
                let fy = y - y0;
                let fetch = |tx: f32, ty: f32| {
                    let cx = tx.clamp(0.0, self.width as f32 - 1.0) as u32;
                    let cy = ty.clamp(0.0, self.height as f32 - 1.0) as u32;
                    self.color_at(cx, cy)
                };
                let c00 = fetch(x0, y0);
                let c10 = fetch(x0 + 1.0, y0);
                let c01 = fetch(x0, y0 + 1.0);
                let c11 = fetch(x0 + 1.0, y0 + 1.0);
                c00.lerp(c10, fx).lerp(c01.lerp(c11, fx), fy)
            }
        }
    }

    /// Converts the color buffer to tightly packed RGBA8 bytes, clamping to
    /// [0, 1].
    pub fn to_rgba8(&self) -> Vec<u8> {
        let texels: Vec<[u8; 4]> = self
            .color
            .iter()
            .map(|c| {
                let to_byte = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
                [to_byte(c.x), to_byte(c.y), to_byte(c.z), to_byte(c.w)]
            })
            .collect();
        bytemuck::cast_slice(&texels).to_vec()
    }

    /// Writes the color buffer as a PNG file.
    pub fn save_png(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let buffer = image::RgbaImage::from_raw(self.width, self.height, self.to_rgba8())
            .ok_or_else(|| anyhow!("render target dimensions do not match pixel data"))?;
        buffer
            .save(path)
            .with_context(|| format!("failed to write image {}", path.display()))?;
        Ok(())
    }
}

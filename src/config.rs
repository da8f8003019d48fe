use std::path::Path;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

use crate::texture::FilterMode;

/// Render settings, usually loaded from an options file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Dimensions of the offscreen target the scene is rendered into.
    pub render_width: u32,
    pub render_height: u32,
    /// Dimensions of the presented output image.
    pub output_width: u32,
    pub output_height: u32,
    /// Horizontal field of view in degrees.
    pub horizontal_fov: f32,
    pub near_plane: f32,
    pub far_plane: f32,
    /// Filter used when the present blit rescales the render target.
    pub blit_filter: FilterMode,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            render_width: 640,
            render_height: 360,
            output_width: 1280,
            output_height: 720,
            horizontal_fov: 90.0,
            near_plane: 1.0,
            far_plane: 1000.0,
            blit_filter: FilterMode::Bilinear,
        }
    }
}

impl Config {
    /// Reads a JSON options file.
    pub fn read_config(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read options file {}", path.display()))?;
        let config: Config = serde_json::from_str(&contents)
            .with_context(|| format!("invalid options file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the settings for values the renderer cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.render_width == 0 || self.render_height == 0 {
            return Err(anyhow!("render dimensions must be non-zero"));
        }
        if self.output_width == 0 || self.output_height == 0 {
            return Err(anyhow!("output dimensions must be non-zero"));
        }
        if !(self.horizontal_fov > 0.0 && self.horizontal_fov < 180.0) {
            return Err(anyhow!(
                "horizontal FOV must be in (0, 180), got {}",
                self.horizontal_fov
            ));
        }
        if !(self.near_plane > 0.0 && self.near_plane < self.far_plane) {
            return Err(anyhow!(
                "near/far planes must satisfy 0 < near < far, got {} / {}",
                self.near_plane,
                self.far_plane
            ));
        }
        Ok(())
    }

    /// Aspect ratio of the render target.
    pub fn aspect_ratio(&self) -> f32 {
        self.render_width as f32 / self.render_height as f32
    }
}

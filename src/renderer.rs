use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use glam::{Mat4, Vec3, Vec4};
use log::{error, warn};

use crate::camera::{projection_matrix, Camera};
use crate::config::Config;
use crate::mesh::{self, Mesh};
use crate::pipeline::{
    rasterize_triangle, shade_fragment, transform_vertex, LightParams, ShadingSpace,
    SurfaceMaterial, TransformBlock, MAX_LIGHTS,
};
use crate::scene::{PointLight, SceneObject};
use crate::target::RenderTarget;
use crate::texture::{FilterMode, Sampler, Texture};

const CLEAR_COLOR: Vec4 = Vec4::new(0.03, 0.03, 0.05, 1.0);

/// Software renderer: draws scene snapshots into an offscreen target and
/// presents them to an output-sized image.
pub struct Renderer {
    projection: Mat4,
    main_pass: MainPass,
    present_pass: PresentPass,
    assets: AssetCache,
}

impl Renderer {
    pub fn new(config: &Config, asset_root: impl Into<PathBuf>) -> Self {
        Self {
            projection: projection_matrix(
                config.horizontal_fov,
                config.aspect_ratio(),
                config.near_plane,
                config.far_plane,
            ),
            main_pass: MainPass {
                target: RenderTarget::new(config.render_width, config.render_height),
            },
            present_pass: PresentPass {
                target: RenderTarget::new(config.output_width, config.output_height),
                filter: config.blit_filter,
            },
            assets: AssetCache::new(asset_root),
        }
    }

    /// Renders one frame and returns the presented image.
    pub fn render(
        &mut self,
        objects: &[SceneObject],
        lights: &[PointLight],
        camera: &Camera,
    ) -> &RenderTarget {
        let view = camera.view_matrix();
        self.main_pass
            .draw(objects, lights, view, self.projection, &mut self.assets);
        self.present_pass.present(&self.main_pass.target)
    }

    /// The most recently presented image.
    pub fn presented(&self) -> &RenderTarget {
        &self.present_pass.target
    }
}

/// Scene pass rendering into the offscreen target.
struct MainPass {
    target: RenderTarget,
}

impl MainPass {
    fn draw(
        &mut self,
        objects: &[SceneObject],
        lights: &[PointLight],
        view: Mat4,
        projection: Mat4,
        assets: &mut AssetCache,
    ) {
        self.target.clear(CLEAR_COLOR);

        if lights.len() > MAX_LIGHTS {
            warn!(
                "scene has {} lights, using the first {MAX_LIGHTS}",
                lights.len()
            );
        }
        let lights = &lights[..lights.len().min(MAX_LIGHTS)];
        let light_positions: Vec<Vec3> = lights
            .iter()
            .map(|light| view.transform_point3(light.position))
            .collect();
        let light_params: Vec<LightParams> = lights
            .iter()
            .map(|light| LightParams {
                color: light.color,
                radius: light.radius,
            })
            .collect();

        for object in objects.iter().filter(|o| o.object_type == "mesh") {
            if let Some(path) = object.mesh.as_deref() {
                assets.ensure_mesh(path);
            }
            if let Some(path) = object.texture.as_deref() {
                assets.ensure_texture(path);
            }
            if let Some(path) = object.normal_map.as_deref() {
                assets.ensure_texture(path);
            }
        }

        for object in objects.iter().filter(|o| o.object_type == "mesh") {
            let mesh = assets.mesh(object.mesh.as_deref());
            let color_texture = object.texture.as_deref().and_then(|p| assets.texture(p));
            let normal_map = object.normal_map.as_deref().and_then(|p| assets.texture(p));

            let block = TransformBlock::new(object.model_matrix(), view, projection);
            let space = if normal_map.is_some() {
                ShadingSpace::Tangent
            } else {
                ShadingSpace::View
            };
            let material = SurfaceMaterial {
                base_color: object.color,
                shininess: object.shininess,
                color_texture,
                normal_map,
                sampler: Sampler::repeating(),
            };

            for triangle in mesh.triangles() {
                let staged = [
                    transform_vertex(&block, &light_positions, &triangle[0], space),
                    transform_vertex(&block, &light_positions, &triangle[1], space),
                    transform_vertex(&block, &light_positions, &triangle[2], space),
                ];
                rasterize_triangle(&mut self.target, &staged, |fragment| {
                    shade_fragment(fragment, &light_params, &material)
                });
            }
        }
    }
}

/// Present pass blitting the offscreen image to the output extent.
struct PresentPass {
    target: RenderTarget,
    filter: FilterMode,
}

impl PresentPass {
    fn present(&mut self, source: &RenderTarget) -> &RenderTarget {
        crate::pipeline::present(source, &mut self.target, self.filter);
        &self.target
    }
}

/// Meshes and textures loaded from disk, cached by scene-relative path.
///
/// Load failures are reported once and the object falls back to the built-in
/// cuboid (meshes) or flat color (textures).
struct AssetCache {
    root: PathBuf,
    meshes: HashMap<String, Mesh>,
    textures: HashMap<String, Texture>,
    missing: HashSet<String>,
    default_mesh: Mesh,
}

impl AssetCache {
    fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            meshes: HashMap::new(),
            textures: HashMap::new(),
            missing: HashSet::new(),
            default_mesh: mesh::cuboid(1.0, 1.0, 1.0),
        }
    }

    fn ensure_mesh(&mut self, path: &str) {
        if self.meshes.contains_key(path) || self.missing.contains(path) {
            return;
        }
        let full = self.root.join(path);
        let loaded = std::fs::read_to_string(&full)
            .map_err(anyhow::Error::from)
            .and_then(|contents| mesh::load_obj_from_str(&contents));
        match loaded {
            Ok(mesh) => {
                self.meshes.insert(path.to_string(), mesh);
            }
            Err(err) => {
                error!("failed to load mesh {}: {err:?}", full.display());
                self.missing.insert(path.to_string());
            }
        }
    }

    fn ensure_texture(&mut self, path: &str) {
        if self.textures.contains_key(path) || self.missing.contains(path) {
            return;
        }
        match Texture::load(self.root.join(path)) {
            Ok(texture) => {
                self.textures.insert(path.to_string(), texture);
            }
            Err(err) => {
                error!("failed to load texture {path}: {err}");
                self.missing.insert(path.to_string());
            }
        }
    }

    fn mesh(&self, path: Option<&str>) -> &Mesh {
        path.and_then(|p| self.meshes.get(p))
            .unwrap_or(&self.default_mesh)
    }

    fn texture(&self, path: &str) -> Option<&Texture> {
        self.textures.get(path)
    }
}

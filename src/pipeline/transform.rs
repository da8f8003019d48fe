use bytemuck::{Pod, Zeroable};
use glam::{Mat3, Mat4, Vec2, Vec3, Vec4};

use crate::mesh::Vertex;

/// Maximum number of lights a single draw consumes.
pub const MAX_LIGHTS: usize = 4;

/// Per-draw matrix block handed to the vertex stage.
///
/// Laid out like the push-constant block the matrices travel in: model,
/// model-view, model-view-projection, view.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct TransformBlock {
    pub model: Mat4,
    pub model_view: Mat4,
    pub mvp: Mat4,
    pub view: Mat4,
}

impl TransformBlock {
    /// Combines the per-object and per-frame matrices for one draw.
    pub fn new(model: Mat4, view: Mat4, projection: Mat4) -> Self {
        let model_view = view * model;
        Self {
            model,
            model_view,
            mvp: projection * model_view,
            view,
        }
    }
}

/// Space the shading stage receives its vectors in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShadingSpace {
    /// Eye/light vectors and the normal stay in view space.
    View,
    /// Eye/light vectors are projected into the surface's tangent frame;
    /// the normal comes from a normal map.
    Tangent,
}

/// Vertex-stage output, interpolated across each triangle.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct VertexOutput {
    /// Clip-space position consumed by the rasterizer.
    pub clip_position: Vec4,
    /// Unnormalized vector toward the eye, in the shading space.
    pub eye_dir: Vec3,
    /// Unnormalized vectors toward each light, in the shading space.
    /// Their length is measured against the light radius for attenuation.
    pub light_dirs: [Vec3; MAX_LIGHTS],
    /// Surface normal in view space; +Z placeholder in tangent space where
    /// the normal map supplies it.
    pub normal: Vec3,
    pub uv: Vec2,
}

impl VertexOutput {
    /// Weighted combination of three vertices, used by the rasterizer after
    /// computing perspective-correct weights.
    pub fn weighted(a: &Self, b: &Self, c: &Self, w: [f32; 3]) -> Self {
        let mut light_dirs = [Vec3::ZERO; MAX_LIGHTS];
        for (i, slot) in light_dirs.iter_mut().enumerate() {
            *slot = a.light_dirs[i] * w[0] + b.light_dirs[i] * w[1] + c.light_dirs[i] * w[2];
        }
        Self {
            clip_position: a.clip_position * w[0] + b.clip_position * w[1] + c.clip_position * w[2],
            eye_dir: a.eye_dir * w[0] + b.eye_dir * w[1] + c.eye_dir * w[2],
            light_dirs,
            normal: a.normal * w[0] + b.normal * w[1] + c.normal * w[2],
            uv: a.uv * w[0] + b.uv * w[1] + c.uv * w[2],
        }
    }
}

/// The vertex transform stage.
///
/// Positions transform as points (w = 1), normals and tangents as directions
/// (w = 0). `lights` holds view-space light positions, at most [`MAX_LIGHTS`].
/// No vector is renormalized here; the shading stage normalizes after
/// interpolation.
pub fn transform_vertex(
    block: &TransformBlock,
    lights: &[Vec3],
    vertex: &Vertex,
    space: ShadingSpace,
) -> VertexOutput {
    debug_assert!(lights.len() <= MAX_LIGHTS);

    let position = vertex.position().extend(1.0);
    let clip_position = block.mvp * position;
    let view_pos = (block.model_view * position).truncate();

    let direction_matrix = Mat3::from_mat4(block.model_view);
    let normal = direction_matrix * vertex.normal();
    let eye_dir = -view_pos;

    let mut light_dirs = [Vec3::ZERO; MAX_LIGHTS];
    for (slot, light) in light_dirs.iter_mut().zip(lights) {
        *slot = *light - view_pos;
    }

    match space {
        ShadingSpace::View => VertexOutput {
            clip_position,
            eye_dir,
            light_dirs,
            normal,
            uv: vertex.tex_uv(),
        },
        ShadingSpace::Tangent => {
            let tangent = direction_matrix * vertex.tangent();
            let bitangent = direction_matrix * vertex.bitangent();
            // The basis is treated as orthogonal, so the transpose projects
            // into tangent space; non-uniform scale is not compensated.
            let to_tangent =
                |v: Vec3| Vec3::new(tangent.dot(v), bitangent.dot(v), normal.dot(v));
            for slot in light_dirs.iter_mut() {
                *slot = to_tangent(*slot);
            }
            VertexOutput {
                clip_position,
                eye_dir: to_tangent(eye_dir),
                light_dirs,
                normal: Vec3::Z,
                uv: vertex.tex_uv(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::projection_matrix;

    fn test_vertex() -> Vertex {
        Vertex {
            position: [1.0, 2.0, 3.0],
            normal: [0.0, 0.0, 1.0],
            tangent: [1.0, 0.0, 0.0],
            bitangent: [0.0, 1.0, 0.0],
            tex_uv: [0.5, 0.5],
        }
    }

    #[test]
    fn block_matches_push_constant_layout() {
        assert_eq!(std::mem::size_of::<TransformBlock>(), 4 * 64);
    }

    #[test]
    fn mv_then_projection_equals_mvp() {
        let model = Mat4::from_rotation_y(0.7) * Mat4::from_translation(Vec3::new(1.0, -2.0, 3.0));
        let view = Mat4::look_at_rh(Vec3::new(0.0, 1.0, 5.0), Vec3::ZERO, Vec3::Y);
        let projection = projection_matrix(90.0, 16.0 / 9.0, 0.5, 200.0);
        let block = TransformBlock::new(model, view, projection);

        let p = Vec4::new(0.3, -0.8, 1.2, 1.0);
        let two_step = projection * (block.model_view * p);
        let one_step = block.mvp * p;
        assert!((two_step - one_step).length() < 1e-4);
    }

    #[test]
    fn translation_does_not_move_directions() {
        let block = TransformBlock::new(
            Mat4::from_translation(Vec3::new(10.0, 20.0, 30.0)),
            Mat4::IDENTITY,
            Mat4::IDENTITY,
        );
        let out = transform_vertex(&block, &[], &test_vertex(), ShadingSpace::View);
        assert!((out.normal - Vec3::Z).length() < 1e-6);
    }

    #[test]
    fn light_vectors_point_from_vertex_to_light() {
        let block = TransformBlock::new(Mat4::IDENTITY, Mat4::IDENTITY, Mat4::IDENTITY);
        let light = Vec3::new(1.0, 2.0, 8.0);
        let out = transform_vertex(&block, &[light], &test_vertex(), ShadingSpace::View);
        assert!((out.light_dirs[0] - Vec3::new(0.0, 0.0, 5.0)).length() < 1e-6);
    }

    #[test]
    fn tangent_space_projects_through_transpose() {
        let block = TransformBlock::new(Mat4::IDENTITY, Mat4::IDENTITY, Mat4::IDENTITY);
        // Canonical basis: tangent space equals view space.
        let out = transform_vertex(
            &block,
            &[Vec3::new(1.0, 2.0, 8.0)],
            &test_vertex(),
            ShadingSpace::Tangent,
        );
        assert!((out.light_dirs[0] - Vec3::new(0.0, 0.0, 5.0)).length() < 1e-6);
        assert!((out.eye_dir - Vec3::new(-1.0, -2.0, -3.0)).length() < 1e-6);
        assert_eq!(out.normal, Vec3::Z);
    }

    #[test]
    fn rotated_tangent_frame_changes_components_not_length() {
        let mut vertex = test_vertex();
        // Frame rotated 90 degrees about Z: tangent +Y, bitangent -X.
        vertex.tangent = [0.0, 1.0, 0.0];
        vertex.bitangent = [-1.0, 0.0, 0.0];
        let block = TransformBlock::new(Mat4::IDENTITY, Mat4::IDENTITY, Mat4::IDENTITY);
        let out = transform_vertex(&block, &[Vec3::ZERO], &vertex, ShadingSpace::Tangent);
        let view_space = Vec3::new(-1.0, -2.0, -3.0);
        assert!((out.light_dirs[0].length() - view_space.length()).abs() < 1e-5);
        assert!((out.light_dirs[0] - Vec3::new(-2.0, 1.0, -3.0)).length() < 1e-5);
    }

    #[test]
    fn interpolation_weights_blend_attributes() {
        let block = TransformBlock::new(Mat4::IDENTITY, Mat4::IDENTITY, Mat4::IDENTITY);
        let mut a = transform_vertex(&block, &[], &test_vertex(), ShadingSpace::View);
        let mut b = a;
        let c = a;
        a.uv = Vec2::ZERO;
        b.uv = Vec2::ONE;
        let mid = VertexOutput::weighted(&a, &b, &c, [0.5, 0.5, 0.0]);
        assert!((mid.uv - Vec2::splat(0.5)).length() < 1e-6);
    }
}

use glam::{Vec2, Vec3};

use crate::target::RenderTarget;

use super::transform::VertexOutput;

/// Triangles with any vertex this close to (or behind) the eye plane are
/// dropped instead of clipped.
const MIN_CLIP_W: f32 = 1e-5;

fn edge(a: Vec2, b: Vec2, c: Vec2) -> f32 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

/// Rasterizes one triangle of vertex-stage outputs into the target.
///
/// Fixed-function glue between the programmable stages: perspective divide,
/// viewport transform, edge-function traversal, perspective-correct attribute
/// interpolation, and a less-or-equal depth test. Both windings are drawn
/// (no back-face culling).
pub fn rasterize_triangle<F>(target: &mut RenderTarget, vertices: &[VertexOutput; 3], mut shade: F)
where
    F: FnMut(&VertexOutput) -> Vec3,
{
    if vertices.iter().any(|v| v.clip_position.w <= MIN_CLIP_W) {
        return;
    }

    let width = target.width() as f32;
    let height = target.height() as f32;

    let inv_w = [
        1.0 / vertices[0].clip_position.w,
        1.0 / vertices[1].clip_position.w,
        1.0 / vertices[2].clip_position.w,
    ];
    let ndc: Vec<Vec3> = vertices
        .iter()
        .zip(inv_w)
        .map(|(v, iw)| v.clip_position.truncate() * iw)
        .collect();
    // NDC y already points down (Vulkan conventions), so no flip here.
    let screen: Vec<Vec2> = ndc
        .iter()
        .map(|n| Vec2::new((n.x * 0.5 + 0.5) * width, (n.y * 0.5 + 0.5) * height))
        .collect();

    let area = edge(screen[0], screen[1], screen[2]);
    if area.abs() < f32::EPSILON {
        return;
    }

    let min_x = screen.iter().map(|p| p.x).fold(f32::MAX, f32::min).floor().max(0.0) as u32;
    let max_x = (screen.iter().map(|p| p.x).fold(f32::MIN, f32::max).ceil() as i64)
        .clamp(0, target.width() as i64) as u32;
    let min_y = screen.iter().map(|p| p.y).fold(f32::MAX, f32::min).floor().max(0.0) as u32;
    let max_y = (screen.iter().map(|p| p.y).fold(f32::MIN, f32::max).ceil() as i64)
        .clamp(0, target.height() as i64) as u32;

    for y in min_y..max_y {
        for x in min_x..max_x {
            let p = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
            let w0 = edge(screen[1], screen[2], p);
            let w1 = edge(screen[2], screen[0], p);
            let w2 = edge(screen[0], screen[1], p);
            // Coverage for either winding: all edge values on the area's side.
            let inside = if area > 0.0 {
                w0 >= 0.0 && w1 >= 0.0 && w2 >= 0.0
            } else {
                w0 <= 0.0 && w1 <= 0.0 && w2 <= 0.0
            };
            if !inside {
                continue;
            }

            let b = [w0 / area, w1 / area, w2 / area];
            // NDC depth interpolates linearly in screen space.
            let depth = b[0] * ndc[0].z + b[1] * ndc[1].z + b[2] * ndc[2].z;
            if !(0.0..=1.0).contains(&depth) {
                continue;
            }
            if depth > target.depth_at(x, y) {
                continue;
            }

            // Perspective-correct attribute weights.
            let persp = [b[0] * inv_w[0], b[1] * inv_w[1], b[2] * inv_w[2]];
            let sum = persp[0] + persp[1] + persp[2];
            let weights = [persp[0] / sum, persp[1] / sum, persp[2] / sum];

            let fragment = VertexOutput::weighted(&vertices[0], &vertices[1], &vertices[2], weights);
            let color = shade(&fragment);
            target.set_color(x, y, color.extend(1.0));
            target.set_depth(x, y, depth);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    fn clip_vertex(x: f32, y: f32, z: f32, w: f32) -> VertexOutput {
        VertexOutput {
            clip_position: Vec4::new(x, y, z, w),
            ..VertexOutput::default()
        }
    }

    fn coverage(target: &RenderTarget) -> usize {
        let mut count = 0;
        for y in 0..target.height() {
            for x in 0..target.width() {
                if target.color_at(x, y) != Vec4::ZERO {
                    count += 1;
                }
            }
        }
        count
    }

    #[test]
    fn fullscreen_triangle_covers_everything() {
        let mut target = RenderTarget::new(8, 8);
        let vertices = [
            clip_vertex(-1.0, -1.0, 0.5, 1.0),
            clip_vertex(3.0, -1.0, 0.5, 1.0),
            clip_vertex(-1.0, 3.0, 0.5, 1.0),
        ];
        rasterize_triangle(&mut target, &vertices, |_| Vec3::ONE);
        assert_eq!(coverage(&target), 64);
        assert!((target.depth_at(4, 4) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn half_screen_triangle_covers_half() {
        let mut target = RenderTarget::new(16, 16);
        let vertices = [
            clip_vertex(-1.0, -1.0, 0.5, 1.0),
            clip_vertex(1.0, -1.0, 0.5, 1.0),
            clip_vertex(-1.0, 1.0, 0.5, 1.0),
        ];
        rasterize_triangle(&mut target, &vertices, |_| Vec3::ONE);
        let covered = coverage(&target);
        assert!((100..=156).contains(&covered), "covered {covered}");
    }

    #[test]
    fn depth_test_keeps_nearer_fragment() {
        let mut target = RenderTarget::new(4, 4);
        let far = [
            clip_vertex(-1.0, -1.0, 0.9, 1.0),
            clip_vertex(3.0, -1.0, 0.9, 1.0),
            clip_vertex(-1.0, 3.0, 0.9, 1.0),
        ];
        let near = [
            clip_vertex(-1.0, -1.0, 0.1, 1.0),
            clip_vertex(3.0, -1.0, 0.1, 1.0),
            clip_vertex(-1.0, 3.0, 0.1, 1.0),
        ];
        rasterize_triangle(&mut target, &near, |_| Vec3::ONE);
        rasterize_triangle(&mut target, &far, |_| Vec3::splat(0.5));
        assert_eq!(target.color_at(2, 2), Vec4::ONE);
        assert!((target.depth_at(2, 2) - 0.1).abs() < 1e-6);
    }

    #[test]
    fn equal_depth_passes() {
        // LessOrEqual: a redraw at the same depth wins.
        let mut target = RenderTarget::new(4, 4);
        let tri = [
            clip_vertex(-1.0, -1.0, 0.5, 1.0),
            clip_vertex(3.0, -1.0, 0.5, 1.0),
            clip_vertex(-1.0, 3.0, 0.5, 1.0),
        ];
        rasterize_triangle(&mut target, &tri, |_| Vec3::splat(0.25));
        rasterize_triangle(&mut target, &tri, |_| Vec3::ONE);
        assert_eq!(target.color_at(1, 1), Vec4::ONE);
    }

    #[test]
    fn opposite_winding_still_draws() {
        let mut target = RenderTarget::new(8, 8);
        let vertices = [
            clip_vertex(-1.0, -1.0, 0.5, 1.0),
            clip_vertex(-1.0, 3.0, 0.5, 1.0),
            clip_vertex(3.0, -1.0, 0.5, 1.0),
        ];
        rasterize_triangle(&mut target, &vertices, |_| Vec3::ONE);
        assert_eq!(coverage(&target), 64);
    }

    #[test]
    fn behind_eye_triangle_is_dropped() {
        let mut target = RenderTarget::new(8, 8);
        let vertices = [
            clip_vertex(-1.0, -1.0, 0.5, -1.0),
            clip_vertex(3.0, -1.0, 0.5, 1.0),
            clip_vertex(-1.0, 3.0, 0.5, 1.0),
        ];
        rasterize_triangle(&mut target, &vertices, |_| Vec3::ONE);
        assert_eq!(coverage(&target), 0);
    }

    #[test]
    fn degenerate_triangle_is_dropped() {
        let mut target = RenderTarget::new(8, 8);
        let v = clip_vertex(0.0, 0.0, 0.5, 1.0);
        rasterize_triangle(&mut target, &[v, v, v], |_| Vec3::ONE);
        assert_eq!(coverage(&target), 0);
    }

    #[test]
    fn perspective_correct_uv_interpolation() {
        // Fullscreen triangle over a single pixel; vertex b is four times as
        // far (w = 4) with its clip position scaled so NDC stays put.
        let mut a = clip_vertex(-1.0, -1.0, 0.5, 1.0);
        let mut b = clip_vertex(12.0, -4.0, 2.0, 4.0);
        let mut c = clip_vertex(-1.0, 3.0, 0.5, 1.0);
        a.uv = Vec2::ZERO;
        b.uv = Vec2::new(1.0, 0.0);
        c.uv = Vec2::ZERO;

        let mut target = RenderTarget::new(1, 1);
        let mut sampled = Vec2::ZERO;
        rasterize_triangle(&mut target, &[a, b, c], |frag| {
            sampled = frag.uv;
            Vec3::ONE
        });
        assert_eq!(target.color_at(0, 0), Vec4::ONE);
        // Barycentric weights at the pixel center are (0.5, 0.25, 0.25);
        // perspective correction turns b's weight into
        // (0.25 / 4) / (0.5 + 0.25 / 4 + 0.25) = 1/13.
        assert!((sampled.x - 1.0 / 13.0).abs() < 1e-4);
    }
}

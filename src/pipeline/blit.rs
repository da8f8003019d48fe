use glam::Vec2;

use crate::target::RenderTarget;
use crate::texture::FilterMode;

/// One entry of the fullscreen-quad lookup table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlitVertex {
    /// NDC position (y down).
    pub position: Vec2,
    pub uv: Vec2,
}

const fn blit_vertex(x: f32, y: f32, u: f32, v: f32) -> BlitVertex {
    BlitVertex {
        position: Vec2::new(x, y),
        uv: Vec2::new(u, v),
    }
}

/// Fullscreen quad as two triangles, indexed by vertex id alone; no vertex
/// buffer is bound for the present draw. UV (0,0)-(1,1) spans the full
/// source extent.
pub const FULLSCREEN_QUAD: [BlitVertex; 6] = [
    blit_vertex(-1.0, -1.0, 0.0, 0.0),
    blit_vertex(1.0, -1.0, 1.0, 0.0),
    blit_vertex(-1.0, 1.0, 0.0, 1.0),
    blit_vertex(-1.0, 1.0, 0.0, 1.0),
    blit_vertex(1.0, -1.0, 1.0, 0.0),
    blit_vertex(1.0, 1.0, 1.0, 1.0),
];

fn edge(a: Vec2, b: Vec2, c: Vec2) -> f32 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

/// The present pass: composites the offscreen render target onto the
/// destination by drawing [`FULLSCREEN_QUAD`] and sampling the source per
/// covered pixel. Handles differing extents through the filter mode;
/// clamp-to-edge addressing keeps the borders artifact-free.
pub fn present(source: &RenderTarget, dest: &mut RenderTarget, filter: FilterMode) {
    let width = dest.width() as f32;
    let height = dest.height() as f32;
    let to_screen = |v: &BlitVertex| {
        Vec2::new(
            (v.position.x * 0.5 + 0.5) * width,
            (v.position.y * 0.5 + 0.5) * height,
        )
    };

    for triangle in FULLSCREEN_QUAD.chunks_exact(3) {
        let screen = [
            to_screen(&triangle[0]),
            to_screen(&triangle[1]),
            to_screen(&triangle[2]),
        ];
        let area = edge(screen[0], screen[1], screen[2]);
        if area.abs() < f32::EPSILON {
            continue;
        }
        for y in 0..dest.height() {
            for x in 0..dest.width() {
                let p = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
                let w0 = edge(screen[1], screen[2], p);
                let w1 = edge(screen[2], screen[0], p);
                let w2 = edge(screen[0], screen[1], p);
                let inside = if area > 0.0 {
                    w0 >= 0.0 && w1 >= 0.0 && w2 >= 0.0
                } else {
                    w0 <= 0.0 && w1 <= 0.0 && w2 <= 0.0
                };
                if !inside {
                    continue;
                }
                let b = [w0 / area, w1 / area, w2 / area];
                let uv = triangle[0].uv * b[0] + triangle[1].uv * b[1] + triangle[2].uv * b[2];
                dest.set_color(x, y, source.sample(uv, filter));
            }
        }
    }
}

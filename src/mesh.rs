use std::collections::HashMap;

use anyhow::{anyhow, Context, Result};
use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};

/// A single mesh vertex.
///
/// Field order matches the pipeline's attribute locations 0..4:
/// position, normal, tangent, bitangent, texture coordinate.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub tangent: [f32; 3],
    pub bitangent: [f32; 3],
    pub tex_uv: [f32; 2],
}

impl Vertex {
    pub fn position(&self) -> Vec3 {
        Vec3::from_array(self.position)
    }

    pub fn normal(&self) -> Vec3 {
        Vec3::from_array(self.normal)
    }

    pub fn tangent(&self) -> Vec3 {
        Vec3::from_array(self.tangent)
    }

    pub fn bitangent(&self) -> Vec3 {
        Vec3::from_array(self.bitangent)
    }

    pub fn tex_uv(&self) -> Vec2 {
        Vec2::from_array(self.tex_uv)
    }
}

/// Indexed triangle mesh consumed by the rasterizer.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl Mesh {
    /// Iterates the mesh as vertex triples, one per triangle.
    pub fn triangles(&self) -> impl Iterator<Item = [Vertex; 3]> + '_ {
        self.indices.chunks_exact(3).map(|tri| {
            [
                self.vertices[tri[0] as usize],
                self.vertices[tri[1] as usize],
                self.vertices[tri[2] as usize],
            ]
        })
    }
}

/// Parses an OBJ file from memory into the full vertex layout.
///
/// Normals are computed from face geometry when the file omits them, and
/// tangent/bitangent vectors are always derived from the UV parameterization
/// afterwards.
pub fn load_obj_from_str(data: &str) -> Result<Mesh> {
    let mut positions = Vec::new();
    let mut normals = Vec::new();
    let mut uvs = Vec::new();
    let mut faces: Vec<[FaceIndex; 3]> = Vec::new();

    for (line_no, line) in data.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let mut parts = trimmed.split_whitespace();
        let Some(tag) = parts.next() else {
            continue;
        };
        match tag {
            "v" => positions.push(
                parse_vec3(parts)
                    .with_context(|| format!("invalid vertex on line {}", line_no + 1))?,
            ),
            "vn" => normals.push(
                parse_vec3(parts)
                    .with_context(|| format!("invalid normal on line {}", line_no + 1))?,
            ),
            "vt" => uvs.push(
                parse_vec2(parts)
                    .with_context(|| format!("invalid texture coordinate on line {}", line_no + 1))?,
            ),
            "f" => {
                let polygon = parse_face(parts)
                    .with_context(|| format!("invalid face on line {}", line_no + 1))?;
                triangulate_face(&polygon, &mut faces);
            }
            _ => {}
        }
    }

    if positions.is_empty() {
        return Err(anyhow!("OBJ file does not define any vertices"));
    }

    let mut mesh = build_mesh(&positions, &normals, &uvs, &faces)?;
    if needs_normals(&mesh.vertices) {
        compute_normals(&mut mesh);
    }
    compute_tangents(&mut mesh);
    Ok(mesh)
}

fn parse_vec3<'a>(mut parts: impl Iterator<Item = &'a str>) -> Result<Vec3> {
    let x = next_component(&mut parts)?;
    let y = next_component(&mut parts)?;
    let z = next_component(&mut parts)?;
    Ok(Vec3::new(x, y, z))
}

fn parse_vec2<'a>(mut parts: impl Iterator<Item = &'a str>) -> Result<Vec2> {
    let u = next_component(&mut parts)?;
    let v = next_component(&mut parts)?;
    Ok(Vec2::new(u, v))
}

fn next_component<'a>(parts: &mut impl Iterator<Item = &'a str>) -> Result<f32> {
    Ok(parts
        .next()
        .ok_or_else(|| anyhow!("missing vector component"))?
        .parse::<f32>()?)
}

fn parse_face<'a>(parts: impl Iterator<Item = &'a str>) -> Result<Vec<FaceIndex>> {
    let mut indices = Vec::new();
    for part in parts {
        let mut segments = part.split('/');
        let v = segments
            .next()
            .ok_or_else(|| anyhow!("missing vertex index"))?
            .parse::<i32>()?;
        let vt = segments
            .next()
            .map(|s| if s.is_empty() { 0 } else { s.parse::<i32>().unwrap_or(0) })
            .unwrap_or(0);
        let vn = segments
            .next()
            .map(|s| if s.is_empty() { 0 } else { s.parse::<i32>().unwrap_or(0) })
            .unwrap_or(0);
        indices.push(FaceIndex { v, vt, vn });
    }
    if indices.len() < 3 {
        return Err(anyhow!("faces must reference at least 3 vertices"));
    }
    Ok(indices)
}

fn triangulate_face(polygon: &[FaceIndex], faces: &mut Vec<[FaceIndex; 3]>) {
    if polygon.len() < 3 {
        return;
    }
    for i in 1..(polygon.len() - 1) {
        faces.push([polygon[0], polygon[i], polygon[i + 1]]);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct Key {
    position: usize,
    uv: Option<usize>,
    normal: Option<usize>,
}

#[derive(Debug, Clone, Copy)]
struct FaceIndex {
    v: i32,
    vt: i32,
    vn: i32,
}

fn build_mesh(
    positions: &[Vec3],
    normals: &[Vec3],
    uvs: &[Vec2],
    faces: &[[FaceIndex; 3]],
) -> Result<Mesh> {
    let mut lookup: HashMap<Key, u32> = HashMap::new();
    let mut vertices: Vec<Vertex> = Vec::new();
    let mut indices = Vec::new();

    for face in faces {
        for idx in face {
            let pos_index =
                fix_index(idx.v, positions.len()).ok_or_else(|| anyhow!("invalid vertex index"))?;
            let uv_index = fix_index(idx.vt, uvs.len());
            let normal_index = fix_index(idx.vn, normals.len());
            let key = Key {
                position: pos_index,
                uv: uv_index,
                normal: normal_index,
            };
            let next_index = vertices.len() as u32;
            let entry = lookup.entry(key).or_insert_with(|| {
                let normal = normal_index.map(|i| normals[i]).unwrap_or(Vec3::ZERO);
                let uv = uv_index.map(|i| uvs[i]).unwrap_or(Vec2::ZERO);
                vertices.push(Vertex {
                    position: positions[pos_index].to_array(),
                    normal: normal.to_array(),
                    tangent: [0.0; 3],
                    bitangent: [0.0; 3],
                    tex_uv: uv.to_array(),
                });
                next_index
            });
            indices.push(*entry);
        }
    }

    Ok(Mesh { vertices, indices })
}

fn fix_index(index: i32, len: usize) -> Option<usize> {
    if index > 0 {
        let zero_based = index as usize - 1;
        (zero_based < len).then_some(zero_based)
    } else if index < 0 {
        let abs = (-index) as usize;
        (abs <= len).then_some(len - abs)
    } else {
        None
    }
}

fn needs_normals(vertices: &[Vertex]) -> bool {
    vertices.iter().any(|v| v.normal == [0.0; 3])
}

fn compute_normals(mesh: &mut Mesh) {
    let mut accum = vec![Vec3::ZERO; mesh.vertices.len()];

    for triangle in mesh.indices.chunks_exact(3) {
        let i0 = triangle[0] as usize;
        let i1 = triangle[1] as usize;
        let i2 = triangle[2] as usize;
        let p0 = mesh.vertices[i0].position();
        let p1 = mesh.vertices[i1].position();
        let p2 = mesh.vertices[i2].position();
        let normal = (p1 - p0).cross(p2 - p0);
        if normal.length_squared() > f32::EPSILON {
            let normal = normal.normalize();
            accum[i0] += normal;
            accum[i1] += normal;
            accum[i2] += normal;
        }
    }

    for (vertex, normal) in mesh.vertices.iter_mut().zip(accum) {
        vertex.normal = normal.normalize_or_zero().to_array();
    }
}

/// Derives per-vertex tangent/bitangent vectors from UV-space edge deltas.
///
/// Faces with a degenerate UV mapping fall back to an arbitrary basis
/// perpendicular to the vertex normal so normal mapping stays well defined.
fn compute_tangents(mesh: &mut Mesh) {
    let mut tangents = vec![Vec3::ZERO; mesh.vertices.len()];
    let mut bitangents = vec![Vec3::ZERO; mesh.vertices.len()];

    for triangle in mesh.indices.chunks_exact(3) {
        let i0 = triangle[0] as usize;
        let i1 = triangle[1] as usize;
        let i2 = triangle[2] as usize;
        let p0 = mesh.vertices[i0].position();
        let edge1 = mesh.vertices[i1].position() - p0;
        let edge2 = mesh.vertices[i2].position() - p0;
        let uv0 = mesh.vertices[i0].tex_uv();
        let duv1 = mesh.vertices[i1].tex_uv() - uv0;
        let duv2 = mesh.vertices[i2].tex_uv() - uv0;

        let det = duv1.x * duv2.y - duv2.x * duv1.y;
        if det.abs() <= f32::EPSILON {
            continue;
        }
        let inv_det = 1.0 / det;
        let tangent = (edge1 * duv2.y - edge2 * duv1.y) * inv_det;
        let bitangent = (edge2 * duv1.x - edge1 * duv2.x) * inv_det;
        for &i in &[i0, i1, i2] {
            tangents[i] += tangent;
            bitangents[i] += bitangent;
        }
    }

    for (i, vertex) in mesh.vertices.iter_mut().enumerate() {
        let normal = vertex.normal();
        let mut tangent = tangents[i];
        // Gram-Schmidt against the normal.
        tangent -= normal * normal.dot(tangent);
        let tangent = if tangent.length_squared() > f32::EPSILON {
            tangent.normalize()
        } else {
            fallback_tangent(normal)
        };
        let bitangent = if bitangents[i].length_squared() > f32::EPSILON {
            // Preserve the UV handedness instead of assuming right-handed.
            let sign = if normal.cross(tangent).dot(bitangents[i]) < 0.0 {
                -1.0
            } else {
                1.0
            };
            (normal.cross(tangent) * sign).normalize()
        } else {
            normal.cross(tangent).normalize_or_zero()
        };
        vertex.tangent = tangent.to_array();
        vertex.bitangent = bitangent.to_array();
    }
}

fn fallback_tangent(normal: Vec3) -> Vec3 {
    let axis = if normal.x.abs() < 0.9 { Vec3::X } else { Vec3::Y };
    (axis - normal * normal.dot(axis)).normalize_or_zero()
}

/// Builds a flat quad in the XY plane with the given half extents, facing +Z.
pub fn quad(half_width: f32, half_height: f32) -> Mesh {
    let normal = [0.0, 0.0, 1.0];
    let tangent = [1.0, 0.0, 0.0];
    let bitangent = [0.0, 1.0, 0.0];
    let corners = [
        ([-half_width, -half_height, 0.0], [0.0, 0.0]),
        ([half_width, -half_height, 0.0], [1.0, 0.0]),
        ([-half_width, half_height, 0.0], [0.0, 1.0]),
        ([half_width, half_height, 0.0], [1.0, 1.0]),
    ];
    let vertices = corners
        .iter()
        .map(|&(position, tex_uv)| Vertex {
            position,
            normal,
            tangent,
            bitangent,
            tex_uv,
        })
        .collect();
    Mesh {
        vertices,
        indices: vec![0, 1, 3, 0, 3, 2],
    }
}

/// Builds an axis-aligned cuboid centered at the origin.
///
/// Each face carries its own four vertices so normals and tangents stay flat,
/// with UVs spanning [0, 1] per face.
pub fn cuboid(width: f32, height: f32, depth: f32) -> Mesh {
    let hw = width / 2.0;
    let hh = height / 2.0;
    let hd = depth / 2.0;

    // (normal, tangent) per face; bitangent = normal x tangent.
    let faces = [
        (Vec3::Z, Vec3::X),
        (Vec3::NEG_Z, Vec3::NEG_X),
        (Vec3::X, Vec3::NEG_Z),
        (Vec3::NEG_X, Vec3::Z),
        (Vec3::Y, Vec3::X),
        (Vec3::NEG_Y, Vec3::X),
    ];

    let mut vertices = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);
    let half = Vec3::new(hw, hh, hd);

    for (normal, tangent) in faces {
        let bitangent = normal.cross(tangent);
        let base = vertices.len() as u32;
        for (sx, sy) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
            let position = (normal + tangent * sx + bitangent * sy) * half;
            vertices.push(Vertex {
                position: position.to_array(),
                normal: normal.to_array(),
                tangent: tangent.to_array(),
                bitangent: bitangent.to_array(),
                tex_uv: [(sx + 1.0) / 2.0, (sy + 1.0) / 2.0],
            });
        }
        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    Mesh { vertices, indices }
}

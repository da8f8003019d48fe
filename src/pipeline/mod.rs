//! The software render pipeline: vertex transform, rasterization, fragment
//! shading, and the present blit.

pub mod blit;
pub mod raster;
pub mod shading;
pub mod transform;

pub use blit::{present, BlitVertex, FULLSCREEN_QUAD};
pub use raster::rasterize_triangle;
pub use shading::{radius_attenuation, shade_fragment, LightParams, SurfaceMaterial};
pub use transform::{transform_vertex, ShadingSpace, TransformBlock, VertexOutput, MAX_LIGHTS};

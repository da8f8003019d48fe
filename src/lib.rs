//! Software rendering core of the Peril prototype.
//!
//! The crate exposes the render pipeline as composable, headless building
//! blocks: scene descriptions are parsed into a data model, the pipeline
//! transforms and shades them on the CPU, and the present blit composites the
//! offscreen image for readback. Window/GPU integration is intentionally kept
//! outside of the crate so that the code remains testable and easy to embed
//! in tooling.

pub mod camera;
pub mod config;
pub mod data_model;
pub mod mesh;
pub mod pipeline;
pub mod renderer;
pub mod scene;
pub mod spline;
pub mod target;
pub mod texture;

pub use camera::Camera;
pub use config::Config;
pub use data_model::DataModel;
pub use mesh::{load_obj_from_str, Mesh, Vertex};
pub use renderer::Renderer;
pub use scene::{PointLight, Scene, SceneObject};
pub use spline::{NurbSpline, Order};
pub use target::RenderTarget;
pub use texture::{AddressMode, FilterMode, Sampler, Texture};

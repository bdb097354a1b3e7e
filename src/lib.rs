//! Lumen: a parallel software rasterizer
//!
//! Renders polygon meshes on the CPU with frustum clipping,
//! perspective-correct interpolation, Phong shading, filmic tone mapping
//! and Gaussian bloom. [`Plotter`] is the entry point: give it a
//! [`world::RenderConfig`] and a [`rasterizer::Mesh`] and ask for frames.

/// Version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod rasterizer;
pub mod world;
mod plotter;

pub use plotter::{Plotter, TransformState};

//! Software rasterizer
//!
//! Features:
//! - Sutherland-Hodgman clipping against the camera frustum
//! - Shortest-diagonal ear tesselation of clipped polygons
//! - Perspective-correct scanline filling with half-open pixel coverage
//! - Per-pixel locked depth buffer, faces rendered in parallel
//! - Phong lighting with diffuse, normal, specular and bloom maps
//! - Filmic tone mapping, gamma and Gaussian bloom

mod math;
mod types;
mod point;
mod camera;
mod clip;
mod tesselate;
mod scanline;
mod framebuffer;
mod shade;
mod bloom;
mod render;

pub use math::*;
pub use types::*;
pub use point::*;
pub use camera::*;
pub use clip::*;
pub use tesselate::*;
pub use scanline::*;
pub use framebuffer::*;
pub use shade::*;
pub use render::*;
pub use bloom::{gaussian_blur, gaussian_kernel};

/// Default window resolution
pub const WIDTH: usize = 800;
pub const HEIGHT: usize = 600;

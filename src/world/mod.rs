//! Scene data and persistence
//!
//! - Built-in demo meshes and bounds helpers
//! - Wavefront OBJ/MTL model loading
//! - RON renderer configuration

mod geometry;
mod obj;
mod config;

pub use geometry::*;
pub use obj::*;
pub use config::*;

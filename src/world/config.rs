//! Renderer configuration loading and saving
//!
//! Uses RON (Rusty Object Notation) for human-readable config files. Every
//! field has a default, so a config file only needs the values it changes.

use std::fs;
use std::path::Path;
use serde::{Serialize, Deserialize};
use crate::rasterizer::{BloomSettings, Color, ShadingSettings, Vec3, HEIGHT, WIDTH};

/// Error type for config loading
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(ron::error::SpannedError),
    Serialize(ron::Error),
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<ron::error::SpannedError> for ConfigError {
    fn from(e: ron::error::SpannedError) -> Self {
        ConfigError::Parse(e)
    }
}

impl From<ron::Error> for ConfigError {
    fn from(e: ron::Error) -> Self {
        ConfigError::Serialize(e)
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Serialize(e) => write!(f, "Serialize error: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Everything needed to set up a [`crate::Plotter`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub width: usize,
    pub height: usize,
    /// Vertical field of view in degrees
    pub fov_y: f32,
    pub near: f32,
    pub far: f32,
    pub camera_position: Vec3,
    /// Radians per pixel of cursor movement
    pub mouse_sensitivity: f32,
    pub model_translation: Vec3,
    /// Degrees around X, Y, Z
    pub model_rotation: Vec3,
    pub model_scale: f32,
    pub backface_cull: bool,
    pub clear_color: Color,
    /// OBJ file to load; the built-in cube when absent
    pub mesh_path: Option<String>,
    pub shading: ShadingSettings,
    pub bloom: BloomSettings,
    /// Viewer tick period in milliseconds
    pub tick_ms: u64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: WIDTH,
            height: HEIGHT,
            fov_y: 70.0,
            near: 0.1,
            far: 100.0,
            camera_position: Vec3::new(-5.0, 0.0, 0.0),
            mouse_sensitivity: 0.001,
            model_translation: Vec3::ZERO,
            model_rotation: Vec3::ZERO,
            model_scale: 1.0,
            backface_cull: true,
            clear_color: Color::BLACK,
            mesh_path: None,
            shading: ShadingSettings::default(),
            bloom: BloomSettings::default(),
            tick_ms: 16,
        }
    }
}

impl RenderConfig {
    pub fn aspect(&self) -> f32 {
        self.width.max(1) as f32 / self.height.max(1) as f32
    }
}

/// Load a config from a RON file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<RenderConfig, ConfigError> {
    let contents = fs::read_to_string(path)?;
    load_config_from_str(&contents)
}

/// Save a config to a RON file
pub fn save_config<P: AsRef<Path>>(config: &RenderConfig, path: P) -> Result<(), ConfigError> {
    let pretty = ron::ser::PrettyConfig::new()
        .depth_limit(3)
        .indentor("  ".to_string());

    let contents = ron::ser::to_string_pretty(config, pretty)?;
    fs::write(path, contents)?;
    Ok(())
}

/// Load a config from a RON string (for embedded configs or testing)
pub fn load_config_from_str(s: &str) -> Result<RenderConfig, ConfigError> {
    let config: RenderConfig = ron::from_str(s)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let cfg = load_config_from_str("(width: 320, height: 200, shading: (ambient: 0.5))").unwrap();
        assert_eq!(cfg.width, 320);
        assert_eq!(cfg.height, 200);
        assert_eq!(cfg.shading.ambient, 0.5);
        assert_eq!(cfg.shading.gamma, 2.2);
        assert_eq!(cfg.fov_y, 70.0);
        assert!(cfg.bloom.enabled);
        assert!((cfg.aspect() - 1.6).abs() < 1e-6);
    }

    #[test]
    fn test_save_and_load() {
        let mut cfg = RenderConfig::default();
        cfg.mesh_path = Some("models/teapot.obj".to_string());
        cfg.camera_position = Vec3::new(1.0, 2.0, 3.0);
        cfg.bloom.sigma = 5.0;

        let path = std::env::temp_dir().join(format!("lumen-raster-config-{}.ron", std::process::id()));
        save_config(&cfg, &path).unwrap();
        let loaded = load_config(&path).unwrap();
        let _ = fs::remove_file(&path);
        assert_eq!(loaded, cfg);
    }

    #[test]
    fn test_errors() {
        assert!(matches!(load_config_from_str("(width: \"wide\")"), Err(ConfigError::Parse(_))));
        assert!(matches!(load_config("/nonexistent/config.ron"), Err(ConfigError::Io(_))));
    }
}

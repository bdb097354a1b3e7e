//! Core types for the rasterizer

use std::sync::Arc;
use serde::{Serialize, Deserialize};
use super::math::Vec3;

/// RGBA color (0-255 per channel)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color { r: 0, g: 0, b: 0, a: 255 };
    pub const WHITE: Color = Color { r: 255, g: 255, b: 255, a: 255 };
    pub const RED: Color = Color { r: 255, g: 0, b: 0, a: 255 };
    pub const GREEN: Color = Color { r: 0, g: 255, b: 0, a: 255 };
    pub const BLUE: Color = Color { r: 0, g: 0, b: 255, a: 255 };

    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub fn with_alpha(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Quantize a [0, 1] color to 8 bits per channel
    pub fn from_vec3(c: Vec3) -> Self {
        let q = |v: f32| (v.clamp(0.0, 1.0) * 255.0 + 0.5) as u8;
        Self::new(q(c.x), q(c.y), q(c.z))
    }

    /// Channels as [0, 1] floats
    pub fn to_vec3(self) -> Vec3 {
        Vec3::new(
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
        )
    }

    /// Per-channel saturating add
    pub fn saturating_add(self, other: Color) -> Self {
        Self {
            r: self.r.saturating_add(other.r),
            g: self.g.saturating_add(other.g),
            b: self.b.saturating_add(other.b),
            a: self.a,
        }
    }

    pub fn is_black(self) -> bool {
        self.r == 0 && self.g == 0 && self.b == 0
    }

    /// Convert to u32 (0xAARRGGBB)
    pub fn to_argb_u32(self) -> u32 {
        ((self.a as u32) << 24) | ((self.r as u32) << 16) | ((self.g as u32) << 8) | (self.b as u32)
    }

    /// Convert to [u8; 4] for framebuffer
    pub fn to_bytes(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// Simple texture (array of colors)
#[derive(Debug, Clone)]
pub struct Texture {
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<Color>,
    pub name: String,
}

impl Texture {
    pub fn solid(width: usize, height: usize, color: Color) -> Self {
        Self {
            width,
            height,
            pixels: vec![color; width * height],
            name: String::new(),
        }
    }

    /// Load texture from an image file (PNG, JPEG or BMP)
    pub fn from_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self, String> {
        let path = path.as_ref();
        let img = image::open(path)
            .map_err(|e| format!("Failed to load {}: {}", path.display(), e))?;

        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();

        Ok(Self::from_image(img, name))
    }

    fn from_image(img: image::DynamicImage, name: String) -> Self {
        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();

        let pixels: Vec<Color> = rgba
            .pixels()
            .map(|p| Color::with_alpha(p[0], p[1], p[2], p[3]))
            .collect();

        Self {
            width: width as usize,
            height: height as usize,
            pixels,
            name,
        }
    }

    /// Create a checkerboard test texture
    pub fn checkerboard(width: usize, height: usize, color1: Color, color2: Color) -> Self {
        let mut pixels = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                let checker = ((x / 4) + (y / 4)) % 2 == 0;
                pixels.push(if checker { color1 } else { color2 });
            }
        }
        Self { width, height, pixels, name: "checkerboard".to_string() }
    }

    /// Sample at a texture coordinate with wrap-around addressing.
    /// V runs bottom-up, so `v = 0` is the last image row.
    pub fn sample(&self, u: f32, v: f32) -> Color {
        if self.width == 0 || self.height == 0 {
            return Color::WHITE;
        }
        let tx = ((u * self.width as f32).floor() as i64).rem_euclid(self.width as i64) as usize;
        let ty = (((1.0 - v) * self.height as f32).floor() as i64).rem_euclid(self.height as i64) as usize;
        self.pixels[ty * self.width + tx]
    }
}

/// Per-material texture bundle. Any image may be absent.
#[derive(Debug, Clone)]
pub struct TexInfo {
    pub name: String,
    pub diffuse: Option<Arc<Texture>>,
    pub normal: Option<Arc<Texture>>,
    /// Specular mask
    pub bump: Option<Arc<Texture>>,
    pub bloom: Option<Arc<Texture>>,
    /// Base color, multiplied with the diffuse sample
    pub color: Vec3,
}

impl Default for TexInfo {
    fn default() -> Self {
        Self {
            name: String::from("default"),
            diffuse: None,
            normal: None,
            bump: None,
            bloom: None,
            color: Vec3::ONE,
        }
    }
}

impl TexInfo {
    pub fn with_color(name: &str, color: Vec3) -> Self {
        Self {
            name: name.to_string(),
            color,
            ..Default::default()
        }
    }

    /// Diffuse sample, white when absent
    pub fn sample_diffuse(&self, u: f32, v: f32) -> Vec3 {
        self.diffuse.as_ref().map_or(Vec3::ONE, |t| t.sample(u, v).to_vec3())
    }

    /// Normal-map sample in [0, 1], mid-gray (no perturbation) when absent
    pub fn sample_normal(&self, u: f32, v: f32) -> Vec3 {
        self.normal.as_ref().map_or(Vec3::splat(0.5), |t| t.sample(u, v).to_vec3())
    }

    /// Specular mask, zero when absent
    pub fn sample_specular(&self, u: f32, v: f32) -> f32 {
        self.bump.as_ref().map_or(0.0, |t| t.sample(u, v).to_vec3().x)
    }

    /// Bloom mask, zero when absent
    pub fn sample_bloom(&self, u: f32, v: f32) -> Vec3 {
        self.bloom.as_ref().map_or(Vec3::ZERO, |t| t.sample(u, v).to_vec3())
    }
}

/// One corner of a face: indices into the mesh arrays
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaceVertex {
    pub vertex: usize,
    pub normal: Option<usize>,
    pub texcoord: Option<usize>,
}

impl FaceVertex {
    pub fn new(vertex: usize, normal: Option<usize>, texcoord: Option<usize>) -> Self {
        Self { vertex, normal, texcoord }
    }
}

/// A polygon face with three or more corners
#[derive(Debug, Clone, PartialEq)]
pub struct Face {
    pub vertices: Vec<FaceVertex>,
    /// Index into [`Mesh::materials`]
    pub material: usize,
}

impl Face {
    pub fn new(vertices: Vec<FaceVertex>, material: usize) -> Self {
        Self { vertices, material }
    }

    /// Face using only position indices
    pub fn from_indices(indices: &[usize], material: usize) -> Self {
        Self {
            vertices: indices.iter().map(|&v| FaceVertex::new(v, None, None)).collect(),
            material,
        }
    }
}

/// Mesh data, read-only while a frame renders
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub vertices: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    /// Third component is usually unused
    pub texcoords: Vec<Vec3>,
    /// Optional per-vertex tint; white when missing
    pub colors: Vec<Vec3>,
    pub faces: Vec<Face>,
    pub materials: Vec<TexInfo>,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a vertex and return its index
    pub fn add_vertex(&mut self, p: Vec3) -> usize {
        self.vertices.push(p);
        self.vertices.len() - 1
    }

    pub fn add_normal(&mut self, n: Vec3) -> usize {
        self.normals.push(n);
        self.normals.len() - 1
    }

    pub fn add_texcoord(&mut self, t: Vec3) -> usize {
        self.texcoords.push(t);
        self.texcoords.len() - 1
    }

    pub fn add_material(&mut self, material: TexInfo) -> usize {
        self.materials.push(material);
        self.materials.len() - 1
    }

    pub fn add_face(&mut self, face: Face) {
        self.faces.push(face);
    }

    /// A face renders only if it has three corners and every index resolves
    pub fn face_is_valid(&self, face: &Face) -> bool {
        face.vertices.len() >= 3
            && face.vertices.iter().all(|fv| {
                fv.vertex < self.vertices.len()
                    && fv.normal.map_or(true, |n| n < self.normals.len())
                    && fv.texcoord.map_or(true, |t| t < self.texcoords.len())
            })
    }

    /// Number of faces the renderer will skip
    pub fn invalid_face_count(&self) -> usize {
        self.faces.iter().filter(|f| !self.face_is_valid(f)).count()
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }
}

/// Lighting and tone-mapping constants
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShadingSettings {
    pub ambient: f32,
    pub diffuse: f32,
    pub specular: f32,
    pub shininess: f32,
    /// Power of the camera-mounted light; divided by squared distance
    pub light_power: f32,
    /// Lower bound on light distance before squaring
    pub min_light_distance: f32,
    pub exposure: f32,
    /// Filmic curve `x(ax+b) / (x(cx+d)+e)`
    pub tone_a: f32,
    pub tone_b: f32,
    pub tone_c: f32,
    pub tone_d: f32,
    pub tone_e: f32,
    pub gamma: f32,
}

impl Default for ShadingSettings {
    fn default() -> Self {
        Self {
            ambient: 0.15,
            diffuse: 1.0,
            specular: 0.6,
            shininess: 32.0,
            light_power: 12.0,
            min_light_distance: 0.25,
            exposure: 1.0,
            tone_a: 2.51,
            tone_b: 0.03,
            tone_c: 2.43,
            tone_d: 0.59,
            tone_e: 0.14,
            gamma: 2.2,
        }
    }
}

/// Bloom post-process settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BloomSettings {
    pub enabled: bool,
    pub sigma: f32,
    pub iterations: u32,
    pub strength: f32,
}

impl Default for BloomSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            sigma: 3.0,
            iterations: 1,
            strength: 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_wraps_around() {
        let mut tex = Texture::solid(4, 4, Color::BLACK);
        tex.pixels[3 * 4 + 1] = Color::RED; // x = 1, bottom row
        assert_eq!(tex.sample(0.3, 0.1), Color::RED);
        assert_eq!(tex.sample(1.3, 1.1), Color::RED);
        assert_eq!(tex.sample(-0.7, -0.9), Color::RED);
    }

    #[test]
    fn test_missing_images_fall_back_to_neutral() {
        let info = TexInfo::default();
        assert_eq!(info.sample_diffuse(0.2, 0.7), Vec3::ONE);
        assert_eq!(info.sample_normal(0.2, 0.7), Vec3::splat(0.5));
        assert_eq!(info.sample_specular(0.2, 0.7), 0.0);
        assert_eq!(info.sample_bloom(0.2, 0.7), Vec3::ZERO);
    }

    #[test]
    fn test_color_quantize_roundtrip_endpoints() {
        assert_eq!(Color::from_vec3(Vec3::ONE), Color::WHITE);
        assert_eq!(Color::from_vec3(Vec3::new(-1.0, 0.0, 2.0)), Color::new(0, 0, 255));
        assert_eq!(Color::WHITE.to_argb_u32(), 0xFFFF_FFFF);
    }
}

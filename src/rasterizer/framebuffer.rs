//! Shared color/depth target
//!
//! Every pixel owns a mutex guarding its depth, color and bloom. Workers
//! rendering different faces write through `&Framebuffer`; the depth test
//! and the store happen under the same lock, so the nearest fragment wins
//! regardless of the order faces finish in.

use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use super::bloom;
use super::math::Vec3;
use super::types::{BloomSettings, Color};

#[derive(Debug, Clone, Copy)]
struct Sample {
    depth: f32,
    color: Color,
    bloom: Vec3,
}

impl Sample {
    fn cleared(color: Color) -> Self {
        Self { depth: f32::INFINITY, color, bloom: Vec3::ZERO }
    }
}

pub struct Framebuffer {
    pub width: usize,
    pub height: usize,
    samples: Vec<Mutex<Sample>>,
}

impl Framebuffer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            samples: (0..width * height)
                .map(|_| Mutex::new(Sample::cleared(Color::BLACK)))
                .collect(),
        }
    }

    /// Reset depth to infinity, color to `clear_color` and bloom to zero
    pub fn clear(&mut self, clear_color: Color) {
        for s in &mut self.samples {
            *s.get_mut().unwrap_or_else(|e| e.into_inner()) = Sample::cleared(clear_color);
        }
    }

    fn lock(&self, index: usize) -> MutexGuard<'_, Sample> {
        // A panicked writer can only leave a fully written or untouched sample
        self.samples[index].lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Depth-tested write. `shade` runs under the pixel lock and only when
    /// `depth` is strictly nearer than the stored value. Returns whether
    /// the pixel was written.
    pub fn write_with<F>(&self, x: usize, y: usize, depth: f32, shade: F) -> bool
    where
        F: FnOnce() -> (Color, Vec3),
    {
        if x >= self.width || y >= self.height {
            return false;
        }
        let mut sample = self.lock(y * self.width + x);
        if depth.is_nan() || depth >= sample.depth {
            return false;
        }
        let (color, bloom) = shade();
        sample.depth = depth;
        sample.color = color;
        sample.bloom = bloom;
        true
    }

    pub fn write(&self, x: usize, y: usize, depth: f32, color: Color, bloom: Vec3) -> bool {
        self.write_with(x, y, depth, || (color, bloom))
    }

    pub fn depth_at(&self, x: usize, y: usize) -> f32 {
        if x >= self.width || y >= self.height {
            return f32::INFINITY;
        }
        self.lock(y * self.width + x).depth
    }

    pub fn color_at(&self, x: usize, y: usize) -> Color {
        if x >= self.width || y >= self.height {
            return Color::BLACK;
        }
        self.lock(y * self.width + x).color
    }

    /// Blur and add bloom, then pack the result into an RGBA frame
    pub fn resolve(&mut self, settings: &BloomSettings, render_time: Duration) -> Frame {
        let (mut colors, mut glow): (Vec<Color>, Vec<Vec3>) = self
            .samples
            .iter_mut()
            .map(|s| {
                let s = s.get_mut().unwrap_or_else(|e| e.into_inner());
                (s.color, s.bloom)
            })
            .unzip();

        bloom::apply(&mut colors, &mut glow, self.width, self.height, settings);

        Frame {
            width: self.width,
            height: self.height,
            pixels: colors.iter().flat_map(|c| c.to_bytes()).collect(),
            render_time,
        }
    }
}

/// A finished image, row-major RGBA8 with row 0 at the top
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<u8>,
    pub render_time: Duration,
}

impl Frame {
    pub fn pixel(&self, x: usize, y: usize) -> Color {
        if x >= self.width || y >= self.height {
            return Color::BLACK;
        }
        let i = (y * self.width + x) * 4;
        Color::with_alpha(self.pixels[i], self.pixels[i + 1], self.pixels[i + 2], self.pixels[i + 3])
    }

    /// Pixels packed as 0xAARRGGBB
    pub fn to_argb_u32(&self) -> Vec<u32> {
        self.pixels
            .chunks_exact(4)
            .map(|p| Color::with_alpha(p[0], p[1], p[2], p[3]).to_argb_u32())
            .collect()
    }

    pub fn count_non_black(&self) -> usize {
        self.pixels
            .chunks_exact(4)
            .filter(|p| p[0] != 0 || p[1] != 0 || p[2] != 0)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rayon::prelude::*;

    #[test]
    fn test_nearest_write_wins_in_any_order() {
        let fb = Framebuffer::new(4, 4);
        assert!(fb.write(1, 1, 5.0, Color::RED, Vec3::ZERO));
        assert!(fb.write(1, 1, 2.0, Color::GREEN, Vec3::ZERO));
        assert!(!fb.write(1, 1, 3.0, Color::BLUE, Vec3::ZERO));
        assert_eq!(fb.color_at(1, 1), Color::GREEN);
        assert_eq!(fb.depth_at(1, 1), 2.0);

        // Equal depth does not overwrite
        assert!(!fb.write(1, 1, 2.0, Color::BLUE, Vec3::ZERO));
        assert_eq!(fb.color_at(1, 1), Color::GREEN);
    }

    #[test]
    fn test_occluded_fragment_is_not_shaded() {
        let fb = Framebuffer::new(2, 2);
        fb.write(0, 0, 1.0, Color::RED, Vec3::ZERO);
        let mut shaded = false;
        fb.write_with(0, 0, 4.0, || {
            shaded = true;
            (Color::BLUE, Vec3::ZERO)
        });
        assert!(!shaded);
    }

    #[test]
    fn test_parallel_writes_keep_minimum_depth() {
        let fb = Framebuffer::new(8, 8);
        (0..512u32).into_par_iter().for_each(|i| {
            let depth = 1.0 + ((i * 37) % 512) as f32;
            let color = if depth == 1.0 { Color::WHITE } else { Color::new(10, 10, 10) };
            fb.write((i % 8) as usize, 3, depth, color, Vec3::ZERO);
        });
        for x in 0..8 {
            assert!(fb.depth_at(x, 3) <= 512.0);
        }
        let min = (0..8).map(|x| fb.depth_at(x, 3)).fold(f32::INFINITY, f32::min);
        assert_eq!(min, 1.0);
    }

    #[test]
    fn test_clear_and_resolve() {
        let mut fb = Framebuffer::new(3, 2);
        fb.write(2, 1, 1.0, Color::RED, Vec3::ZERO);
        fb.clear(Color::new(1, 2, 3));
        assert_eq!(fb.depth_at(2, 1), f32::INFINITY);

        fb.write(0, 1, 1.0, Color::GREEN, Vec3::ZERO);
        let frame = fb.resolve(&BloomSettings::default(), Duration::ZERO);
        assert_eq!(frame.pixels.len(), 3 * 2 * 4);
        assert_eq!(frame.pixel(0, 1), Color::GREEN);
        assert_eq!(frame.pixel(1, 0), Color::new(1, 2, 3));
        assert_eq!(frame.to_argb_u32()[3], 0xFF00_FF00);
    }

    #[test]
    fn test_resolve_adds_blurred_bloom_around_source() {
        let mut fb = Framebuffer::new(16, 16);
        fb.write(8, 8, 1.0, Color::new(100, 100, 100), Vec3::ONE);
        let frame = fb.resolve(&BloomSettings { sigma: 1.0, ..Default::default() }, Duration::ZERO);
        assert!(!frame.pixel(9, 8).is_black());
        assert!(frame.pixel(15, 15).is_black());
    }
}

//! Separable Gaussian bloom
//!
//! The bloom buffer holds per-pixel glow in [0, 1] display space. It is
//! blurred horizontally then vertically with clamp-to-edge addressing and
//! added on top of the shaded colors.

use super::math::Vec3;
use super::types::{BloomSettings, Color};

/// Normalized 1D Gaussian of radius `ceil(3 sigma)`
pub fn gaussian_kernel(sigma: f32) -> Vec<f32> {
    if sigma <= 0.0 {
        return vec![1.0];
    }
    let radius = (3.0 * sigma).ceil() as i32;
    let two_sigma_sq = 2.0 * sigma * sigma;
    let mut kernel: Vec<f32> = (-radius..=radius)
        .map(|i| (-((i * i) as f32) / two_sigma_sq).exp())
        .collect();
    let sum: f32 = kernel.iter().sum();
    for k in &mut kernel {
        *k /= sum;
    }
    kernel
}

pub fn blur_horizontal(src: &[Vec3], dst: &mut [Vec3], width: usize, height: usize, kernel: &[f32]) {
    let radius = (kernel.len() / 2) as i64;
    let max_x = width as i64 - 1;
    for y in 0..height {
        let row = &src[y * width..(y + 1) * width];
        for x in 0..width {
            let mut acc = Vec3::ZERO;
            for (k, &weight) in kernel.iter().enumerate() {
                let sx = (x as i64 + k as i64 - radius).clamp(0, max_x) as usize;
                acc += row[sx] * weight;
            }
            dst[y * width + x] = acc;
        }
    }
}

pub fn blur_vertical(src: &[Vec3], dst: &mut [Vec3], width: usize, height: usize, kernel: &[f32]) {
    let radius = (kernel.len() / 2) as i64;
    let max_y = height as i64 - 1;
    for y in 0..height {
        for x in 0..width {
            let mut acc = Vec3::ZERO;
            for (k, &weight) in kernel.iter().enumerate() {
                let sy = (y as i64 + k as i64 - radius).clamp(0, max_y) as usize;
                acc += src[sy * width + x] * weight;
            }
            dst[y * width + x] = acc;
        }
    }
}

/// Blur `buf` in place, `iterations` times
pub fn gaussian_blur(buf: &mut [Vec3], width: usize, height: usize, sigma: f32, iterations: u32) {
    if width == 0 || height == 0 || buf.len() != width * height {
        return;
    }
    let kernel = gaussian_kernel(sigma);
    let mut tmp = vec![Vec3::ZERO; buf.len()];
    for _ in 0..iterations {
        blur_horizontal(buf, &mut tmp, width, height, &kernel);
        blur_vertical(&tmp, buf, width, height, &kernel);
    }
}

/// Add the bloom buffer to `colors`, saturating each channel
pub fn compose(colors: &mut [Color], bloom: &[Vec3], strength: f32) {
    for (c, &b) in colors.iter_mut().zip(bloom) {
        *c = c.saturating_add(Color::from_vec3(b * strength));
    }
}

/// Blur and compose according to `settings`
pub fn apply(colors: &mut [Color], bloom: &mut [Vec3], width: usize, height: usize, settings: &BloomSettings) {
    if !settings.enabled || settings.strength <= 0.0 {
        return;
    }
    if bloom.iter().all(|&b| b == Vec3::ZERO) {
        return;
    }
    gaussian_blur(bloom, width, height, settings.sigma, settings.iterations);
    compose(colors, bloom, settings.strength);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kernel_is_normalized_and_symmetric() {
        let k = gaussian_kernel(2.0);
        assert_eq!(k.len(), 13);
        let sum: f32 = k.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);
        for i in 0..k.len() / 2 {
            assert!((k[i] - k[k.len() - 1 - i]).abs() < 1e-7);
        }
        assert!(k[6] > k[5]);
        assert_eq!(gaussian_kernel(0.0), vec![1.0]);
    }

    #[test]
    fn test_blur_spreads_and_preserves_energy() {
        let (w, h) = (21, 21);
        let mut buf = vec![Vec3::ZERO; w * h];
        buf[10 * w + 10] = Vec3::ONE;
        gaussian_blur(&mut buf, w, h, 1.5, 1);

        let total: f32 = buf.iter().map(|v| v.x).sum();
        assert!((total - 1.0).abs() < 1e-4);
        assert!(buf[10 * w + 11].x > 0.0);
        assert!(buf[10 * w + 10].x > buf[10 * w + 12].x);
        assert!((buf[9 * w + 10].x - buf[10 * w + 9].x).abs() < 1e-6);
    }

    #[test]
    fn test_blur_clamps_at_edges() {
        let (w, h) = (8, 4);
        let mut buf = vec![Vec3::splat(0.5); w * h];
        gaussian_blur(&mut buf, w, h, 2.0, 2);
        for v in &buf {
            assert!(v.approx_eq(Vec3::splat(0.5), 1e-5));
        }
    }

    #[test]
    fn test_compose_saturates() {
        let mut colors = vec![Color::new(250, 10, 0)];
        compose(&mut colors, &[Vec3::new(0.5, 0.5, 0.0)], 1.0);
        assert_eq!(colors[0], Color::new(255, 138, 0));
    }

    #[test]
    fn test_disabled_bloom_leaves_colors() {
        let mut colors = vec![Color::BLACK; 4];
        let mut bloom = vec![Vec3::ONE; 4];
        let settings = BloomSettings { enabled: false, ..Default::default() };
        apply(&mut colors, &mut bloom, 2, 2, &settings);
        assert!(colors.iter().all(|c| c.is_black()));
    }
}

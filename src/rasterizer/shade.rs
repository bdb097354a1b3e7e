//! Per-fragment lighting
//!
//! A single point light rides on the camera. Fragments get ambient plus
//! Lambert diffuse and Phong specular, both falling off with the squared
//! distance to the light. The result goes through exposure, a filmic
//! tone curve and gamma before being quantized.

use super::math::Vec3;
use super::point::Point;
use super::types::{Color, ShadingSettings, TexInfo};

/// Filmic curve `x(ax+b) / (x(cx+d)+e)`, clamped to [0, 1]
pub fn tone_map(x: f32, s: &ShadingSettings) -> f32 {
    let x = x.max(0.0);
    let num = x * (s.tone_a * x + s.tone_b);
    let den = x * (s.tone_c * x + s.tone_d) + s.tone_e;
    if den <= 0.0 {
        return 0.0;
    }
    (num / den).clamp(0.0, 1.0)
}

pub fn gamma_correct(x: f32, gamma: f32) -> f32 {
    x.max(0.0).powf(1.0 / gamma)
}

/// Exposure, tone curve and gamma on a linear HDR color
pub fn to_display(hdr: Vec3, s: &ShadingSettings) -> Vec3 {
    (hdr * s.exposure).map(|c| gamma_correct(tone_map(c, s), s.gamma))
}

/// Unit normal after applying a tangent-free normal map sample in [0, 1]
fn perturb_normal(normal: Vec3, sample: Vec3) -> Vec3 {
    let offset = sample * 2.0 - Vec3::ONE;
    let n = (normal + offset).normalize();
    if n == Vec3::ZERO {
        normal.normalize()
    } else {
        n
    }
}

/// Shade one fragment.
///
/// Returns the display color and the bloom contribution for this pixel.
/// `point.world` and `point.normal` are world space; `eye` is the light and
/// viewer position.
pub fn shade_fragment(point: &Point, material: &TexInfo, eye: Vec3, s: &ShadingSettings) -> (Color, Vec3) {
    let (u, v) = (point.texcoord.x, point.texcoord.y);

    let base = material
        .color
        .mul_elem(material.sample_diffuse(u, v))
        .mul_elem(point.color);
    let normal = perturb_normal(point.normal, material.sample_normal(u, v));

    let to_light = eye - point.world;
    let dist = to_light.len().max(s.min_light_distance);
    let falloff = s.light_power / (dist * dist);
    let l = to_light.normalize();

    let n_dot_l = normal.dot(l).max(0.0);
    let diffuse = s.diffuse * n_dot_l * falloff;

    // Viewer and light coincide, so the view vector is `l`
    let specular = if n_dot_l > 0.0 {
        let r = (-l).reflect(normal);
        s.specular * material.sample_specular(u, v) * r.dot(l).max(0.0).powf(s.shininess) * falloff
    } else {
        0.0
    };

    let hdr = base * (s.ambient + diffuse) + Vec3::splat(specular);
    let display = to_display(hdr, s);
    let bloom = material.sample_bloom(u, v).mul_elem(display);

    (Color::from_vec3(display), bloom)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use crate::rasterizer::types::Texture;

    fn fragment(world: Vec3, normal: Vec3) -> Point {
        let mut p = Point::new(Vec3::ZERO);
        p.world = world;
        p.normal = normal;
        p
    }

    #[test]
    fn test_tone_map_is_monotonic_and_bounded() {
        let s = ShadingSettings::default();
        assert_eq!(tone_map(0.0, &s), 0.0);
        assert_eq!(tone_map(-3.0, &s), 0.0);
        let mut last = 0.0;
        for i in 1..100 {
            let y = tone_map(i as f32 * 0.1, &s);
            assert!(y >= last);
            assert!(y <= 1.0);
            last = y;
        }
        assert!(tone_map(1000.0, &s) > 0.99);
    }

    #[test]
    fn test_gamma_brightens_midtones() {
        assert!(gamma_correct(0.25, 2.2) > 0.25);
        assert!((gamma_correct(1.0, 2.2) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_facing_surface_is_brighter_than_grazing() {
        let s = ShadingSettings::default();
        let mat = TexInfo::default();
        let eye = Vec3::new(0.0, 0.0, 3.0);
        let (facing, _) = shade_fragment(&fragment(Vec3::ZERO, Vec3::new(0.0, 0.0, 1.0)), &mat, eye, &s);
        let (grazing, _) = shade_fragment(&fragment(Vec3::ZERO, Vec3::new(1.0, 0.0, 0.05)), &mat, eye, &s);
        assert!(facing.r > grazing.r);
    }

    #[test]
    fn test_back_facing_gets_ambient_only() {
        let s = ShadingSettings::default();
        let mat = TexInfo::default();
        let eye = Vec3::new(0.0, 0.0, 3.0);
        let (color, _) = shade_fragment(&fragment(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0)), &mat, eye, &s);
        let ambient = Color::from_vec3(to_display(Vec3::splat(s.ambient), &s));
        assert_eq!(color, ambient);
        assert!(!color.is_black());
    }

    #[test]
    fn test_light_falls_off_with_distance() {
        let s = ShadingSettings::default();
        let mat = TexInfo::default();
        let p = fragment(Vec3::ZERO, Vec3::new(0.0, 0.0, 1.0));
        let (near, _) = shade_fragment(&p, &mat, Vec3::new(0.0, 0.0, 2.0), &s);
        let (far, _) = shade_fragment(&p, &mat, Vec3::new(0.0, 0.0, 8.0), &s);
        assert!(near.r > far.r);
    }

    #[test]
    fn test_bloom_needs_mask() {
        let s = ShadingSettings::default();
        let eye = Vec3::new(0.0, 0.0, 2.0);
        let p = fragment(Vec3::ZERO, Vec3::new(0.0, 0.0, 1.0));

        let (_, none) = shade_fragment(&p, &TexInfo::default(), eye, &s);
        assert_eq!(none, Vec3::ZERO);

        let mut glowing = TexInfo::default();
        glowing.bloom = Some(Arc::new(Texture::solid(2, 2, Color::WHITE)));
        let (color, bloom) = shade_fragment(&p, &glowing, eye, &s);
        assert!(bloom.approx_eq(color.to_vec3(), 2.0 / 255.0));
    }

    #[test]
    fn test_diffuse_texture_tints_result() {
        let s = ShadingSettings::default();
        let mut mat = TexInfo::default();
        mat.diffuse = Some(Arc::new(Texture::solid(1, 1, Color::RED)));
        let (color, _) = shade_fragment(&fragment(Vec3::ZERO, Vec3::new(0.0, 0.0, 1.0)), &mat, Vec3::new(0.0, 0.0, 2.0), &s);
        assert!(color.r > 0);
        assert_eq!(color.g, 0);
        assert_eq!(color.b, 0);
    }
}

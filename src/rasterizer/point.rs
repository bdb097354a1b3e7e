//! Attribute-bearing vertices
//!
//! A [`Point`] is interpolated as a whole: clipping, slopes and per-pixel
//! recovery all go through its arithmetic so every attribute stays in step.

use std::ops::{Add, Mul, Sub};
use super::math::Vec3;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Point {
    /// Camera space before projection, `(pixel x, pixel y, view depth)` after
    pub position: Vec3,
    pub normal: Vec3,
    pub color: Vec3,
    pub world: Vec3,
    pub texcoord: Vec3,
    /// Not interpolated; arithmetic keeps the left operand's id
    pub material: usize,
}

impl Point {
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            color: Vec3::ONE,
            ..Default::default()
        }
    }

    pub fn lerp(self, other: Point, t: f32) -> Point {
        self + (other - self) * t
    }
}

impl Add for Point {
    type Output = Point;
    fn add(self, o: Point) -> Point {
        Point {
            position: self.position + o.position,
            normal: self.normal + o.normal,
            color: self.color + o.color,
            world: self.world + o.world,
            texcoord: self.texcoord + o.texcoord,
            material: self.material,
        }
    }
}

impl Sub for Point {
    type Output = Point;
    fn sub(self, o: Point) -> Point {
        Point {
            position: self.position - o.position,
            normal: self.normal - o.normal,
            color: self.color - o.color,
            world: self.world - o.world,
            texcoord: self.texcoord - o.texcoord,
            material: self.material,
        }
    }
}

impl Mul<f32> for Point {
    type Output = Point;
    fn mul(self, s: f32) -> Point {
        Point {
            position: self.position * s,
            normal: self.normal * s,
            color: self.color * s,
            world: self.world * s,
            texcoord: self.texcoord * s,
            material: self.material,
        }
    }
}

/// Screen-space triangle ready for the scanline filler
#[derive(Debug, Clone, Copy)]
pub struct Triangle {
    pub points: [Point; 3],
}

impl Triangle {
    pub fn new(a: Point, b: Point, c: Point) -> Self {
        Self { points: [a, b, c] }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lerp_interpolates_every_attribute() {
        let mut a = Point::new(Vec3::new(0.0, 0.0, -1.0));
        a.texcoord = Vec3::new(0.0, 0.0, 0.0);
        a.normal = Vec3::new(0.0, 0.0, 1.0);
        a.material = 3;
        let mut b = Point::new(Vec3::new(2.0, 4.0, -3.0));
        b.texcoord = Vec3::new(1.0, 0.5, 0.0);
        b.color = Vec3::new(0.0, 0.0, 1.0);
        b.material = 7;

        let m = a.lerp(b, 0.25);
        assert!(m.position.approx_eq(Vec3::new(0.5, 1.0, -1.5), 1e-6));
        assert!(m.texcoord.approx_eq(Vec3::new(0.25, 0.125, 0.0), 1e-6));
        assert!(m.color.approx_eq(Vec3::new(0.75, 0.75, 1.0), 1e-6));
        assert!(m.normal.approx_eq(Vec3::new(0.0, 0.0, 0.75), 1e-6));
        assert_eq!(m.material, 3);
    }
}

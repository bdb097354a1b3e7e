//! Frustum planes and Sutherland-Hodgman polygon clipping in camera space
//!
//! The clipper accepts any plane set whose inside is the positive half-space,
//! and interpolates every [`Point`] attribute at the crossings.

use super::math::{Mat4, Plane, Vec3};
use super::point::Point;

/// Six camera-space clip planes: near, far, then the four sides
#[derive(Debug, Clone, Copy)]
pub struct Frustum {
    planes: [Plane; 6],
}

impl Frustum {
    /// Build the frustum of a perspective projection
    pub fn from_projection(projection: &Mat4, near: f32, far: f32) -> Self {
        Self::from_inverse_projection(&projection.inverse_or_identity(), near, far)
    }

    /// Build the frustum from an inverse perspective projection.
    ///
    /// Side planes pass through the eye and two adjacent far corners of the
    /// NDC cube, unprojected back into camera space.
    pub fn from_inverse_projection(inverse: &Mat4, near: f32, far: f32) -> Self {
        let eye = Vec3::ZERO;
        let inside = Vec3::new(0.0, 0.0, -(near + far) * 0.5);

        let corners = [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)]
            .map(|(x, y)| inverse.transform_point_projective(Vec3::new(x, y, 1.0)));

        let side = |a: Vec3, b: Vec3| orient(Plane::new(eye, a, b), inside);

        Self {
            planes: [
                Plane::from_normal_point(Vec3::new(0.0, 0.0, -1.0), Vec3::new(0.0, 0.0, -near)),
                Plane::from_normal_point(Vec3::new(0.0, 0.0, 1.0), Vec3::new(0.0, 0.0, -far)),
                side(corners[0], corners[1]),
                side(corners[1], corners[2]),
                side(corners[2], corners[3]),
                side(corners[3], corners[0]),
            ],
        }
    }

    pub fn planes(&self) -> &[Plane] {
        &self.planes
    }

    pub fn contains(&self, p: Vec3) -> bool {
        self.planes.iter().all(|plane| plane.distance_to(p) >= 0.0)
    }
}

fn orient(plane: Plane, inside: Vec3) -> Plane {
    if plane.distance_to(inside) < 0.0 {
        plane.flipped()
    } else {
        plane
    }
}

/// Clip `polygon` against every plane in turn, in place.
///
/// `scratch` is reused between planes to avoid per-plane allocation.
/// A result with fewer than three vertices is cleared.
pub fn clip_polygon(polygon: &mut Vec<Point>, scratch: &mut Vec<Point>, planes: &[Plane]) {
    for plane in planes {
        if polygon.len() < 3 {
            break;
        }
        clip_against_plane(polygon, plane, scratch);
        std::mem::swap(polygon, scratch);
    }
    if polygon.len() < 3 {
        polygon.clear();
    }
}

/// One Sutherland-Hodgman pass: `input` clipped by `plane` into `output`
pub fn clip_against_plane(input: &[Point], plane: &Plane, output: &mut Vec<Point>) {
    output.clear();
    let n = input.len();

    for i in 0..n {
        let current = input[i];
        let next = input[(i + 1) % n];
        let d_current = plane.distance_to(current.position);
        let d_next = plane.distance_to(next.position);

        if d_current >= 0.0 {
            output.push(current);
        }

        // Vertices on the plane count as inside and never spawn a crossing
        if (d_current > 0.0 && d_next < 0.0) || (d_current < 0.0 && d_next > 0.0) {
            let t = d_current / (d_current - d_next);
            output.push(current + (next - current) * t);
        }
    }
}

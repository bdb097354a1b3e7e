//! Built-in geometry and mesh helpers
//!
//! Procedural meshes used when no model file is given, plus bounds
//! queries used to frame the camera on a loaded model.

use std::sync::Arc;
use serde::{Serialize, Deserialize};
use crate::rasterizer::{Color, Face, FaceVertex, Mesh, TexInfo, Texture, Vec3};

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Box around a set of points; `None` when empty
    pub fn from_points(points: &[Vec3]) -> Option<Self> {
        let (&first, rest) = points.split_first()?;
        let mut aabb = Self::new(first, first);
        for &p in rest {
            aabb.expand(p);
        }
        Some(aabb)
    }

    /// Check if a point is inside the box
    pub fn contains(&self, point: Vec3) -> bool {
        point.x >= self.min.x && point.x <= self.max.x
            && point.y >= self.min.y && point.y <= self.max.y
            && point.z >= self.min.z && point.z <= self.max.z
    }

    /// Expand bounds to include a point
    pub fn expand(&mut self, point: Vec3) {
        self.min.x = self.min.x.min(point.x);
        self.min.y = self.min.y.min(point.y);
        self.min.z = self.min.z.min(point.z);
        self.max.x = self.max.x.max(point.x);
        self.max.y = self.max.y.max(point.y);
        self.max.z = self.max.z.max(point.z);
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Half the diagonal length
    pub fn radius(&self) -> f32 {
        (self.max - self.min).len() * 0.5
    }
}

/// Bounds of every vertex of a mesh
pub fn mesh_bounds(mesh: &Mesh) -> Option<Aabb> {
    Aabb::from_points(&mesh.vertices)
}

/// Camera distance that fits a bounding sphere of `radius` into `fov_y_degrees`
pub fn framing_distance(radius: f32, fov_y_degrees: f32) -> f32 {
    let half = (fov_y_degrees.to_radians() * 0.5).max(0.01);
    radius / half.sin()
}

/// Unit-texcoord quad corners, counter-clockwise
const QUAD_UVS: [(f32, f32); 4] = [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)];

/// Add a counter-clockwise quad with one flat normal and unit texcoords
fn push_quad(mesh: &mut Mesh, corners: [Vec3; 4], normal: Vec3, material: usize) {
    let n = mesh.add_normal(normal);
    let vertices = corners
        .iter()
        .zip(QUAD_UVS)
        .map(|(&p, (u, v))| {
            let vi = mesh.add_vertex(p);
            let ti = mesh.add_texcoord(Vec3::new(u, v, 0.0));
            FaceVertex::new(vi, Some(n), Some(ti))
        })
        .collect();
    mesh.add_face(Face::new(vertices, material));
}

/// Checkerboard-textured cube of edge 2 centered on the origin, faces outward
pub fn test_cube() -> Mesh {
    let mut mesh = Mesh::new();
    let mut material = TexInfo::with_color("checker", Vec3::ONE);
    material.diffuse = Some(Arc::new(Texture::checkerboard(
        32,
        32,
        Color::new(230, 230, 230),
        Color::new(200, 80, 60),
    )));
    let mat = mesh.add_material(material);

    let c = |x: f32, y: f32, z: f32| Vec3::new(x, y, z);
    let sides = [
        ([c(-1., -1., 1.), c(1., -1., 1.), c(1., 1., 1.), c(-1., 1., 1.)], c(0., 0., 1.)),
        ([c(1., -1., -1.), c(-1., -1., -1.), c(-1., 1., -1.), c(1., 1., -1.)], c(0., 0., -1.)),
        ([c(1., -1., 1.), c(1., -1., -1.), c(1., 1., -1.), c(1., 1., 1.)], c(1., 0., 0.)),
        ([c(-1., -1., -1.), c(-1., -1., 1.), c(-1., 1., 1.), c(-1., 1., -1.)], c(-1., 0., 0.)),
        ([c(-1., 1., 1.), c(1., 1., 1.), c(1., 1., -1.), c(-1., 1., -1.)], c(0., 1., 0.)),
        ([c(-1., -1., -1.), c(1., -1., -1.), c(1., -1., 1.), c(-1., -1., 1.)], c(0., -1., 0.)),
    ];
    for (corners, normal) in sides {
        push_quad(&mut mesh, corners, normal, mat);
    }
    mesh
}

/// Square of side `size` in the XY plane at the origin, facing +Z
pub fn quad(size: f32, material: TexInfo) -> Mesh {
    let mut mesh = Mesh::new();
    let mat = mesh.add_material(material);
    let h = size * 0.5;
    push_quad(
        &mut mesh,
        [
            Vec3::new(-h, -h, 0.0),
            Vec3::new(h, -h, 0.0),
            Vec3::new(h, h, 0.0),
            Vec3::new(-h, h, 0.0),
        ],
        Vec3::new(0.0, 0.0, 1.0),
        mat,
    );
    mesh
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aabb_from_points() {
        assert!(Aabb::from_points(&[]).is_none());
        let b = Aabb::from_points(&[Vec3::new(1.0, -2.0, 0.0), Vec3::new(-1.0, 4.0, 2.0)]).unwrap();
        assert_eq!(b.min, Vec3::new(-1.0, -2.0, 0.0));
        assert_eq!(b.max, Vec3::new(1.0, 4.0, 2.0));
        assert_eq!(b.center(), Vec3::new(0.0, 1.0, 1.0));
        assert!(b.contains(Vec3::new(0.0, 0.0, 1.0)));
        assert!(!b.contains(Vec3::new(0.0, 5.0, 1.0)));
    }

    #[test]
    fn test_cube_faces_point_outward() {
        let cube = test_cube();
        assert_eq!(cube.faces.len(), 6);
        assert_eq!(cube.invalid_face_count(), 0);
        for face in &cube.faces {
            let p: Vec<Vec3> = face.vertices.iter().map(|fv| cube.vertices[fv.vertex]).collect();
            let winding = (p[1] - p[0]).cross(p[2] - p[0]);
            let center = (p[0] + p[2]) * 0.5;
            assert!(winding.dot(center) > 0.0);
            let n = cube.normals[face.vertices[0].normal.unwrap()];
            assert!(n.dot(center) > 0.0);
        }
    }

    #[test]
    fn test_quad_bounds() {
        let q = quad(2.0, TexInfo::default());
        let b = mesh_bounds(&q).unwrap();
        assert!((b.radius() - 2.0f32.sqrt()).abs() < 1e-6);
        assert!(framing_distance(1.0, 60.0) > 1.9);
    }
}

//! Frame pipeline
//!
//! Vertices are transformed once per frame. Faces are then processed in
//! parallel: assemble, cull, clip, project, tesselate, rasterize and shade
//! straight into the shared [`Framebuffer`].

use rayon::prelude::*;
use super::clip::{clip_polygon, Frustum};
use super::framebuffer::Framebuffer;
use super::math::{Mat4, Vec3};
use super::point::{Point, Triangle};
use super::scanline::rasterize_triangle;
use super::shade::shade_fragment;
use super::tesselate::tesselate;
use super::types::{Face, Mesh, ShadingSettings, TexInfo};

/// Everything a frame needs besides the mesh and the target
#[derive(Debug, Clone)]
pub struct RenderParams {
    pub model: Mat4,
    pub view: Mat4,
    pub projection: Mat4,
    pub viewport: Mat4,
    pub frustum: Frustum,
    /// World-space eye, also the light position
    pub eye: Vec3,
    pub backface_cull: bool,
    pub shading: ShadingSettings,
}

/// Per-frame counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub faces_drawn: usize,
    pub faces_culled: usize,
    pub faces_clipped: usize,
    pub faces_invalid: usize,
    pub triangles: usize,
}

impl RenderStats {
    fn merge(self, o: RenderStats) -> RenderStats {
        RenderStats {
            faces_drawn: self.faces_drawn + o.faces_drawn,
            faces_culled: self.faces_culled + o.faces_culled,
            faces_clipped: self.faces_clipped + o.faces_clipped,
            faces_invalid: self.faces_invalid + o.faces_invalid,
            triangles: self.triangles + o.triangles,
        }
    }
}

/// Vertex data after the per-frame transform
struct Transformed {
    camera: Vec<Vec3>,
    world: Vec<Vec3>,
    normals: Vec<Vec3>,
}

impl Transformed {
    fn new(mesh: &Mesh, params: &RenderParams) -> Self {
        let model_view = params.view * params.model;
        Self {
            camera: mesh.vertices.par_iter().map(|&v| model_view.transform_point(v)).collect(),
            world: mesh.vertices.par_iter().map(|&v| params.model.transform_point(v)).collect(),
            normals: mesh
                .normals
                .par_iter()
                .map(|&n| params.model.transform_direction(n).normalize())
                .collect(),
        }
    }
}

/// Per-worker buffers, reused across faces
#[derive(Default)]
struct Scratch {
    polygon: Vec<Point>,
    clip: Vec<Point>,
    screen: Vec<Point>,
    positions: Vec<Vec3>,
    triangles: Vec<[usize; 3]>,
}

/// Polygon normal by Newell's method; robust for non-planar n-gons
fn polygon_normal(points: impl Iterator<Item = Vec3> + Clone) -> Vec3 {
    let next = points.clone().cycle().skip(1);
    points.zip(next).fold(Vec3::ZERO, |n, (a, b)| {
        n + Vec3::new(
            (a.y - b.y) * (a.z + b.z),
            (a.z - b.z) * (a.x + b.x),
            (a.x - b.x) * (a.y + b.y),
        )
    })
}

/// Build the camera-space polygon for a face. `None` if an index is out of range.
fn assemble(mesh: &Mesh, t: &Transformed, face: &Face, out: &mut Vec<Point>) -> Option<()> {
    out.clear();
    if face.vertices.len() < 3 {
        return None;
    }

    for fv in &face.vertices {
        let mut p = Point::new(*t.camera.get(fv.vertex)?);
        p.world = t.world[fv.vertex];
        p.color = mesh.colors.get(fv.vertex).copied().unwrap_or(Vec3::ONE);
        p.texcoord = match fv.texcoord {
            Some(i) => *mesh.texcoords.get(i)?,
            None => Vec3::ZERO,
        };
        p.normal = match fv.normal {
            Some(i) => *t.normals.get(i)?,
            None => Vec3::ZERO,
        };
        p.material = face.material;
        out.push(p);
    }

    // Faces without normals get the flat world-space face normal
    if face.vertices.iter().any(|fv| fv.normal.is_none()) {
        let flat = polygon_normal(out.iter().map(|p| p.world)).normalize();
        for (p, fv) in out.iter_mut().zip(&face.vertices) {
            if fv.normal.is_none() {
                p.normal = flat;
            }
        }
    }
    Some(())
}

fn render_face(
    fb: &Framebuffer,
    mesh: &Mesh,
    t: &Transformed,
    params: &RenderParams,
    fallback: &TexInfo,
    face: &Face,
    s: &mut Scratch,
) -> RenderStats {
    let mut stats = RenderStats::default();

    if assemble(mesh, t, face, &mut s.polygon).is_none() {
        stats.faces_invalid = 1;
        return stats;
    }

    // Counter-clockwise faces point at a camera sitting at the origin
    if params.backface_cull {
        let n = polygon_normal(s.polygon.iter().map(|p| p.position));
        if n.dot(s.polygon[0].position) >= 0.0 {
            stats.faces_culled = 1;
            return stats;
        }
    }

    clip_polygon(&mut s.polygon, &mut s.clip, params.frustum.planes());
    if s.polygon.is_empty() {
        stats.faces_clipped = 1;
        return stats;
    }

    s.screen.clear();
    for p in &s.polygon {
        let [x, y, z, w] = params.projection.transform_vec4([p.position.x, p.position.y, p.position.z, 1.0]);
        let ndc = Vec3::new(x / w, y / w, z / w);
        let pixel = params.viewport.transform_point(ndc);
        let mut sp = *p;
        // Keep view depth (clip w) for perspective-correct interpolation
        sp.position = Vec3::new(pixel.x, pixel.y, w);
        s.screen.push(sp);
    }

    s.positions.clear();
    s.positions.extend(s.screen.iter().map(|p| p.position));
    tesselate(&s.positions, &mut s.triangles);

    let material = mesh.materials.get(face.material).unwrap_or(fallback);
    for &[a, b, c] in &s.triangles {
        let tri = Triangle::new(s.screen[a], s.screen[b], s.screen[c]);
        rasterize_triangle(&tri, fb.width, fb.height, |x, y, depth, p| {
            fb.write_with(x, y, depth, || shade_fragment(p, material, params.eye, &params.shading));
        });
    }

    stats.faces_drawn = 1;
    stats.triangles = s.triangles.len();
    stats
}

/// Render every face of `mesh` into `fb` in parallel
pub fn render_mesh(fb: &Framebuffer, mesh: &Mesh, params: &RenderParams) -> RenderStats {
    let transformed = Transformed::new(mesh, params);
    let fallback = TexInfo::default();

    let stats = mesh
        .faces
        .par_iter()
        .map_init(Scratch::default, |scratch, face| {
            render_face(fb, mesh, &transformed, params, &fallback, face, scratch)
        })
        .reduce(RenderStats::default, RenderStats::merge);

    if stats.faces_invalid > 0 {
        log::warn!("skipped {} faces with out-of-range indices", stats.faces_invalid);
    }
    log::trace!(
        "faces: {} drawn, {} culled, {} clipped, {} triangles",
        stats.faces_drawn,
        stats.faces_culled,
        stats.faces_clipped,
        stats.triangles
    );
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rasterizer::types::{BloomSettings, Color};
    use std::time::Duration;

    const W: usize = 64;
    const H: usize = 48;

    fn params(model: Mat4, cull: bool) -> RenderParams {
        let projection = Mat4::perspective(W as f32 / H as f32, 60.0, 0.1, 100.0);
        RenderParams {
            model,
            view: Mat4::identity(),
            projection,
            viewport: Mat4::viewport(0.0, 0.0, W as f32, H as f32),
            frustum: Frustum::from_projection(&projection, 0.1, 100.0),
            eye: Vec3::ZERO,
            backface_cull: cull,
            shading: ShadingSettings::default(),
        }
    }

    /// Counter-clockwise triangle at depth `z` (camera looks down -Z)
    fn triangle_mesh(z: f32, color: Vec3) -> Mesh {
        let mut mesh = Mesh::new();
        mesh.add_vertex(Vec3::new(-1.0, -1.0, z));
        mesh.add_vertex(Vec3::new(1.0, -1.0, z));
        mesh.add_vertex(Vec3::new(0.0, 1.0, z));
        mesh.add_material(TexInfo::with_color("tri", color));
        mesh.add_face(Face::from_indices(&[0, 1, 2], 0));
        mesh
    }

    fn draw(fb: &Framebuffer, mesh: &Mesh, cull: bool) -> RenderStats {
        render_mesh(fb, mesh, &params(Mat4::identity(), cull))
    }

    #[test]
    fn test_front_face_is_drawn_back_face_is_culled() {
        let fb = Framebuffer::new(W, H);
        let mesh = triangle_mesh(-4.0, Vec3::ONE);
        let stats = draw(&fb, &mesh, true);
        assert_eq!(stats.faces_drawn, 1);
        assert!(fb.depth_at(W / 2, H / 2) < f32::INFINITY);

        let mut flipped = mesh.clone();
        flipped.faces[0] = Face::from_indices(&[0, 2, 1], 0);
        let fb = Framebuffer::new(W, H);
        let stats = draw(&fb, &flipped, true);
        assert_eq!(stats.faces_culled, 1);
        assert_eq!(fb.depth_at(W / 2, H / 2), f32::INFINITY);

        let fb = Framebuffer::new(W, H);
        draw(&fb, &flipped, false);
        assert!(fb.depth_at(W / 2, H / 2) < f32::INFINITY);
    }

    #[test]
    fn test_depth_is_view_distance() {
        let fb = Framebuffer::new(W, H);
        draw(&fb, &triangle_mesh(-4.0, Vec3::ONE), true);
        assert!((fb.depth_at(W / 2, H / 2) - 4.0).abs() < 1e-3);
    }

    #[test]
    fn test_nearer_face_wins_regardless_of_order() {
        let mut mesh = triangle_mesh(-6.0, Vec3::new(1.0, 0.0, 0.0));
        let red = mesh.faces[0].clone();
        let base = mesh.vertices.len();
        for v in [(-1.0, -1.0), (1.0, -1.0), (0.0, 1.0)] {
            mesh.add_vertex(Vec3::new(v.0, v.1, -3.0));
        }
        let green_mat = mesh.add_material(TexInfo::with_color("green", Vec3::new(0.0, 1.0, 0.0)));
        let green = Face::from_indices(&[base, base + 1, base + 2], green_mat);

        for order in [[red.clone(), green.clone()], [green.clone(), red.clone()]] {
            let mut m = mesh.clone();
            m.faces = order.to_vec();
            let fb = Framebuffer::new(W, H);
            draw(&fb, &m, true);
            let c = fb.color_at(W / 2, H / 2);
            assert!(c.g > 0 && c.r == 0, "{:?}", c);
        }
    }

    #[test]
    fn test_face_behind_camera_draws_nothing() {
        let mut fb = Framebuffer::new(W, H);
        let stats = draw(&fb, &triangle_mesh(3.0, Vec3::ONE), false);
        assert_eq!(stats.faces_clipped, 1);
        let frame = fb.resolve(&BloomSettings::default(), Duration::ZERO);
        assert_eq!(frame.count_non_black(), 0);
    }

    #[test]
    fn test_invalid_face_is_skipped() {
        let mut mesh = triangle_mesh(-4.0, Vec3::ONE);
        mesh.add_face(Face::from_indices(&[0, 1, 99], 0));
        mesh.add_face(Face::from_indices(&[0, 1], 0));
        let fb = Framebuffer::new(W, H);
        let stats = draw(&fb, &mesh, true);
        assert_eq!(stats.faces_drawn, 1);
        assert_eq!(stats.faces_invalid, 2);
    }

    #[test]
    fn test_straddling_face_is_clipped_not_dropped() {
        let mut mesh = Mesh::new();
        mesh.add_vertex(Vec3::new(-1.0, -0.5, -3.0));
        mesh.add_vertex(Vec3::new(1.0, -0.5, -3.0));
        mesh.add_vertex(Vec3::new(0.0, -0.5, 2.0));
        mesh.add_face(Face::from_indices(&[0, 1, 2], 0));
        let fb = Framebuffer::new(W, H);
        let stats = draw(&fb, &mesh, false);
        assert_eq!(stats.faces_drawn, 1);
        for y in 0..H {
            for x in 0..W {
                assert!(fb.depth_at(x, y) >= 0.1 - 1e-4);
            }
        }
    }

    #[test]
    fn test_unknown_material_falls_back_to_white() {
        let mut mesh = triangle_mesh(-4.0, Vec3::ONE);
        mesh.materials.clear();
        let fb = Framebuffer::new(W, H);
        draw(&fb, &mesh, true);
        let c = fb.color_at(W / 2, H / 2);
        assert!(c.r == c.g && c.g == c.b && c != Color::BLACK);
    }
}

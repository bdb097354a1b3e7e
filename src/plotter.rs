//! Frame producer
//!
//! [`Plotter`] owns everything that persists between frames: the camera,
//! the model transform accumulators, the pause flag and the framebuffer.
//! Input handlers mutate it; `plot` turns the current state into a [`Frame`].

use std::time::Instant;
use crate::rasterizer::{
    render_mesh, Camera, Frame, Framebuffer, Frustum, Mat4, Mesh, RenderParams, RenderStats, Vec3,
};
use crate::world::RenderConfig;

/// Accumulated model transform: translate * rotate(x, y, z) * scale
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformState {
    pub translation: Vec3,
    /// Degrees around X, Y and Z
    pub rotation: Vec3,
    pub scale: f32,
}

impl Default for TransformState {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: 1.0,
        }
    }
}

impl TransformState {
    pub fn rotate(&mut self, dx: f32, dy: f32, dz: f32) {
        self.rotation += Vec3::new(dx, dy, dz);
    }

    pub fn translate(&mut self, dx: f32, dy: f32, dz: f32) {
        self.translation += Vec3::new(dx, dy, dz);
    }

    /// Multiplicative; factors <= 0 are ignored
    pub fn zoom(&mut self, factor: f32) {
        if factor > 0.0 {
            self.scale *= factor;
        }
    }

    pub fn matrix(&self) -> Mat4 {
        let r = self.rotation;
        Mat4::translation(self.translation)
            * Mat4::rotation_x(r.x)
            * Mat4::rotation_y(r.y)
            * Mat4::rotation_z(r.z)
            * Mat4::scale(Vec3::splat(self.scale))
    }
}

pub struct Plotter {
    config: RenderConfig,
    camera: Camera,
    transform: TransformState,
    mesh: Mesh,
    framebuffer: Framebuffer,
    projection: Mat4,
    viewport: Mat4,
    frustum: Frustum,
    paused: bool,
    last_stats: RenderStats,
}

impl Plotter {
    pub fn new(config: RenderConfig, mesh: Mesh) -> Self {
        let camera = Camera::new(config.camera_position, config.mouse_sensitivity);
        let transform = TransformState {
            translation: config.model_translation,
            rotation: config.model_rotation,
            scale: config.model_scale,
        };
        let width = config.width.max(1);
        let height = config.height.max(1);
        let projection = Mat4::perspective(config.aspect(), config.fov_y, config.near, config.far);

        Self {
            camera,
            transform,
            framebuffer: Framebuffer::new(width, height),
            projection,
            viewport: Mat4::viewport(0.0, 0.0, width as f32, height as f32),
            frustum: Frustum::from_projection(&projection, config.near, config.far),
            mesh,
            config,
            paused: false,
            last_stats: RenderStats::default(),
        }
    }

    pub fn set_mesh(&mut self, mesh: Mesh) {
        let invalid = mesh.invalid_face_count();
        if invalid > 0 {
            log::warn!("mesh has {} faces that will be skipped", invalid);
        }
        self.mesh = mesh;
    }

    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    pub fn transform(&self) -> &TransformState {
        &self.transform
    }

    pub fn last_stats(&self) -> RenderStats {
        self.last_stats
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
        log::info!("rendering {}", if self.paused { "paused" } else { "resumed" });
    }

    pub fn move_camera(&mut self, forward: f32, side: f32, up: f32) {
        self.camera.move_forward(forward);
        self.camera.move_side(side);
        self.camera.move_up(up);
    }

    /// Feed an absolute cursor position; the camera turns by the delta
    pub fn rotate_camera(&mut self, x: f32, y: f32) {
        self.camera.rotate(x, y);
    }

    /// Start a drag at cursor `(x, y)` without turning
    pub fn reset_cursor(&mut self, x: f32, y: f32) {
        self.camera.reset(x, y);
    }

    pub fn rotate_model(&mut self, dx: f32, dy: f32, dz: f32) {
        self.transform.rotate(dx, dy, dz);
    }

    pub fn move_model(&mut self, dx: f32, dy: f32, dz: f32) {
        self.transform.translate(dx, dy, dz);
    }

    pub fn zoom(&mut self, factor: f32) {
        self.transform.zoom(factor);
    }

    /// Render a frame unless paused
    pub fn tick(&mut self) -> Option<Frame> {
        if self.paused {
            None
        } else {
            Some(self.plot())
        }
    }

    /// Render the current state into a new frame
    pub fn plot(&mut self) -> Frame {
        let start = Instant::now();
        self.framebuffer.clear(self.config.clear_color);

        let params = RenderParams {
            model: self.transform.matrix(),
            view: self.camera.view(),
            projection: self.projection,
            viewport: self.viewport,
            frustum: self.frustum,
            eye: self.camera.pos(),
            backface_cull: self.config.backface_cull,
            shading: self.config.shading,
        };
        self.last_stats = render_mesh(&self.framebuffer, &self.mesh, &params);

        let mut frame = self.framebuffer.resolve(&self.config.bloom, start.elapsed());
        frame.render_time = start.elapsed();
        log::debug!(
            "frame {}x{} in {:.2} ms ({} faces, {} triangles)",
            frame.width,
            frame.height,
            frame.render_time.as_secs_f64() * 1000.0,
            self.last_stats.faces_drawn,
            self.last_stats.triangles
        );
        frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rasterizer::{Color, Face, TexInfo};
    use crate::world::{quad, test_cube};

    const W: usize = 64;
    const H: usize = 48;

    fn small_config() -> RenderConfig {
        RenderConfig {
            width: W,
            height: H,
            fov_y: 60.0,
            camera_position: Vec3::new(-4.0, 0.0, 0.0),
            ..Default::default()
        }
    }

    /// White quad facing the camera, which looks down +X from x = -4
    fn facing_quad() -> Mesh {
        let mut mesh = quad(2.0, TexInfo::default());
        // Face -X: rotate the +Z quad by -90 degrees about Y
        let rot = Mat4::rotation_y(-90.0);
        for v in &mut mesh.vertices {
            *v = rot.transform_point(*v);
        }
        for n in &mut mesh.normals {
            *n = rot.transform_direction(*n);
        }
        mesh
    }

    fn projected_bounds(plotter: &Plotter, mesh: &Mesh) -> (f32, f32, f32, f32) {
        let m = plotter.viewport * plotter.projection * plotter.camera.view() * plotter.transform.matrix();
        mesh.vertices.iter().fold(
            (f32::MAX, f32::MAX, f32::MIN, f32::MIN),
            |(x0, y0, x1, y1), &v| {
                let p = m.transform_point_projective(v);
                (x0.min(p.x), y0.min(p.y), x1.max(p.x), y1.max(p.y))
            },
        )
    }

    #[test]
    fn test_quad_covers_its_projection() {
        let mesh = facing_quad();
        let mut plotter = Plotter::new(small_config(), mesh.clone());
        let frame = plotter.plot();
        assert_eq!(frame.pixels.len(), W * H * 4);
        assert_eq!(plotter.last_stats().faces_drawn, 1);

        let (x0, y0, x1, y1) = projected_bounds(&plotter, &mesh);
        for y in 0..H {
            for x in 0..W {
                let (cx, cy) = (x as f32 + 0.5, y as f32 + 0.5);
                let lit = !frame.pixel(x, y).is_black();
                if cx > x0 + 1.0 && cx < x1 - 1.0 && cy > y0 + 1.0 && cy < y1 - 1.0 {
                    assert!(lit, "hole at {},{}", x, y);
                }
                if cx < x0 - 1.0 || cx > x1 + 1.0 || cy < y0 - 1.0 || cy > y1 + 1.0 {
                    assert!(!lit, "spill at {},{}", x, y);
                }
            }
        }
    }

    #[test]
    fn test_plot_is_deterministic() {
        let mut plotter = Plotter::new(small_config(), test_cube());
        plotter.zoom(0.6);
        plotter.rotate_model(30.0, 45.0, 10.0);
        let a = plotter.plot();
        let b = plotter.plot();
        assert_eq!(a.pixels, b.pixels);
        assert!(a.count_non_black() > 0);
    }

    #[test]
    fn test_geometry_behind_near_plane_draws_nothing() {
        let mut mesh = facing_quad();
        for v in &mut mesh.vertices {
            v.x -= 4.05; // just behind the eye at x = -4
        }
        let mut plotter = Plotter::new(small_config(), mesh);
        let frame = plotter.plot();
        assert_eq!(frame.count_non_black(), 0);
    }

    #[test]
    fn test_nearer_polygon_wins() {
        let mut mesh = facing_quad();
        let red = mesh.add_material(TexInfo::with_color("red", Vec3::new(1.0, 0.0, 0.0)));
        let base = mesh.vertices.len();
        // Smaller red quad in front of the white one
        for (y, z) in [(-0.5, -0.5), (-0.5, 0.5), (0.5, 0.5), (0.5, -0.5)] {
            mesh.add_vertex(Vec3::new(-1.0, y, z));
        }
        mesh.add_face(Face::from_indices(&[base, base + 1, base + 2, base + 3], red));

        let mut reversed = mesh.clone();
        reversed.faces.reverse();

        for m in [mesh, reversed] {
            let mut plotter = Plotter::new(small_config(), m);
            let c = plotter.plot().pixel(W / 2, H / 2);
            assert!(c.r > 0 && c.g == 0 && c.b == 0, "{:?}", c);
        }
    }

    #[test]
    fn test_camera_round_trip_restores_frame() {
        let mut plotter = Plotter::new(small_config(), test_cube());
        plotter.zoom(0.6);
        let before = plotter.plot();
        plotter.move_camera(-1.0, 0.0, 0.0);
        let moved = plotter.plot();
        plotter.move_camera(1.0, 0.0, 0.0);
        let after = plotter.plot();
        assert_ne!(before.pixels, moved.pixels);
        assert_eq!(before.pixels, after.pixels);
    }

    #[test]
    fn test_pause_skips_frames() {
        let mut plotter = Plotter::new(small_config(), test_cube());
        assert!(plotter.tick().is_some());
        plotter.toggle_pause();
        assert!(plotter.is_paused());
        assert!(plotter.tick().is_none());
        plotter.toggle_pause();
        assert!(plotter.tick().is_some());
    }

    #[test]
    fn test_transform_accumulates() {
        let mut t = TransformState::default();
        t.zoom(0.5);
        t.zoom(0.5);
        t.zoom(-2.0);
        assert!((t.scale - 0.25).abs() < 1e-6);
        t.rotate(0.0, 90.0, 0.0);
        t.translate(1.0, 0.0, 0.0);
        let p = t.matrix().transform_point(Vec3::new(0.0, 0.0, 4.0));
        assert!(p.approx_eq(Vec3::new(2.0, 0.0, 0.0), 1e-5));
    }

    #[test]
    fn test_clear_color_fills_background() {
        let mut cfg = small_config();
        cfg.clear_color = Color::new(0, 0, 40);
        let mut plotter = Plotter::new(cfg, Mesh::new());
        let frame = plotter.plot();
        assert_eq!(frame.pixel(0, 0), Color::new(0, 0, 40));
        assert_eq!(frame.count_non_black(), W * H);
    }
}

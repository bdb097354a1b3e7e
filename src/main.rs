//! Lumen viewer
//!
//! Interactive front end for the software rasterizer:
//! - WASD / QE move the camera, right mouse drag looks around
//! - Arrow keys and N / M rotate the model, mouse wheel zooms it
//! - P pauses rendering, Escape quits
//!
//! Usage: `lumen-raster [config.ron]`

use std::time::{Duration, Instant};
use macroquad::prelude::*;
use lumen_raster::rasterizer::{Frame, Mesh, Vec3, HEIGHT, WIDTH};
use lumen_raster::world::{framing_distance, load_config, load_obj, mesh_bounds, test_cube, RenderConfig};
use lumen_raster::{Plotter, VERSION};

/// Camera units per second
const MOVE_SPEED: f32 = 3.0;
/// Model degrees per second
const ROTATE_SPEED: f32 = 90.0;

fn window_conf() -> Conf {
    Conf {
        window_title: format!("Lumen v{}", VERSION),
        window_width: WIDTH as i32,
        window_height: HEIGHT as i32,
        window_resizable: true,
        high_dpi: true,
        ..Default::default()
    }
}

fn load_settings() -> RenderConfig {
    match std::env::args().nth(1) {
        Some(path) => match load_config(&path) {
            Ok(cfg) => {
                log::info!("loaded config {}", path);
                cfg
            }
            Err(e) => {
                log::error!("failed to load config {}: {}, using defaults", path, e);
                RenderConfig::default()
            }
        },
        None => RenderConfig::default(),
    }
}

fn load_mesh(config: &RenderConfig) -> Mesh {
    let Some(path) = config.mesh_path.as_deref() else {
        return test_cube();
    };
    match load_obj(path) {
        Ok(mesh) if !mesh.is_empty() => mesh,
        Ok(_) => {
            log::warn!("{} has no faces, showing the demo cube", path);
            test_cube()
        }
        Err(e) => {
            log::error!("{}, showing the demo cube", e);
            test_cube()
        }
    }
}

fn upload(frame: &Frame) -> Texture2D {
    let texture = Texture2D::from_rgba8(frame.width as u16, frame.height as u16, &frame.pixels);
    texture.set_filter(FilterMode::Nearest);
    texture
}

#[macroquad::main(window_conf)]
async fn main() {
    #[cfg(not(target_arch = "wasm32"))]
    env_logger::init();

    let config = load_settings();
    let mesh = load_mesh(&config);

    // Back the camera off far enough to see a loaded model whole
    let mut start_position = config.camera_position;
    if config.mesh_path.is_some() {
        if let Some(bounds) = mesh_bounds(&mesh) {
            let distance = framing_distance(bounds.radius() * config.model_scale, config.fov_y);
            start_position = bounds.center() * config.model_scale - Vec3::new(distance, 0.0, 0.0);
            log::info!("model radius {:.2}, camera at {:.2} units", bounds.radius(), distance);
        }
    }
    let tick = Duration::from_millis(config.tick_ms);

    let mut plotter = Plotter::new(config, mesh);
    plotter.camera_mut().position = start_position;

    let mut texture = upload(&plotter.plot());
    let mut render_ms = 0.0;
    let mut last_tick = Instant::now();

    loop {
        if is_key_pressed(KeyCode::Escape) {
            break;
        }
        let dt = get_frame_time();

        // Camera
        let step = MOVE_SPEED * dt;
        let axis = |pos: KeyCode, neg: KeyCode| {
            (is_key_down(pos) as i32 - is_key_down(neg) as i32) as f32
        };
        let forward = axis(KeyCode::W, KeyCode::S);
        let side = axis(KeyCode::D, KeyCode::A);
        let up = axis(KeyCode::E, KeyCode::Q);
        if forward != 0.0 || side != 0.0 || up != 0.0 {
            plotter.move_camera(forward * step, side * step, up * step);
        }

        let (mx, my) = mouse_position();
        if is_mouse_button_pressed(MouseButton::Right) {
            plotter.reset_cursor(mx, my);
        } else if is_mouse_button_down(MouseButton::Right) {
            plotter.rotate_camera(mx, my);
        }

        // Model
        let turn = ROTATE_SPEED * dt;
        let rx = axis(KeyCode::Down, KeyCode::Up);
        let ry = axis(KeyCode::Right, KeyCode::Left);
        let rz = axis(KeyCode::M, KeyCode::N);
        if rx != 0.0 || ry != 0.0 || rz != 0.0 {
            plotter.rotate_model(rx * turn, ry * turn, rz * turn);
        }

        let wheel = mouse_wheel().1;
        if wheel != 0.0 {
            plotter.zoom(1.0 + wheel.signum() * 0.1);
        }

        if is_key_pressed(KeyCode::P) {
            plotter.toggle_pause();
        }

        if last_tick.elapsed() >= tick {
            last_tick = Instant::now();
            if let Some(frame) = plotter.tick() {
                render_ms = frame.render_time.as_secs_f64() * 1000.0;
                texture = upload(&frame);
            }
        }

        clear_background(BLACK);
        draw_texture_ex(
            &texture,
            0.0,
            0.0,
            WHITE,
            DrawTextureParams {
                dest_size: Some(vec2(screen_width(), screen_height())),
                ..Default::default()
            },
        );

        let cam = plotter.camera();
        let (p, d) = (cam.pos(), cam.dir());
        draw_text(
            &format!(
                "{:.1} ms  pos ({:.2}, {:.2}, {:.2})  dir ({:.2}, {:.2}, {:.2}){}",
                render_ms,
                p.x, p.y, p.z,
                d.x, d.y, d.z,
                if plotter.is_paused() { "  [paused]" } else { "" },
            ),
            8.0,
            20.0,
            18.0,
            WHITE,
        );

        next_frame().await;
    }
}

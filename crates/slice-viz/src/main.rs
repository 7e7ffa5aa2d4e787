//! Interactive slice plane demo.
//!
//! Left mouse drives the current mode, right mouse orbits the camera and the
//! wheel zooms. Keys: 1/2/3 select rotation, normal and segment mode;
//! Ctrl+Z / Ctrl+Y undo and redo; X, Y and Z reset the plane orientation;
//! Delete removes the selection; PageUp/PageDown push or pull it.

use clap::Parser;
use log::{error, info};
use macroquad::prelude::*;
use nalgebra::Vector3;
use slice_plane::interaction::InteractionMode;
use slice_plane::{Session, SessionConfig};
use slice_viz::{draw_selection_rect, draw_session, CameraViewport, Controls, OrbitCamera};

/// Command-line arguments for the slice plane demo
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Image stack size in pixels
    #[arg(long, num_args = 3, value_names = ["X", "Y", "Z"], default_values_t = [100.0, 100.0, 60.0])]
    dimensions: Vec<f64>,

    /// Voxel scale per axis
    #[arg(long, num_args = 3, value_names = ["X", "Y", "Z"], default_values_t = [1.0, 1.0, 1.0])]
    scale: Vec<f64>,

    /// Initial plane normal
    #[arg(long, num_args = 3, value_names = ["X", "Y", "Z"], default_values_t = [0.0, 0.0, 1.0])]
    normal: Vec<f64>,
}

fn vector(values: &[f64]) -> Vector3<f64> {
    Vector3::from_iterator(values.iter().copied())
}

#[macroquad::main("Slice Plane")]
async fn main() {
    env_logger::init();
    let args = Args::parse();

    let config = SessionConfig::new()
        .with_dimensions_px(vector(&args.dimensions))
        .with_scale(vector(&args.scale))
        .with_normal(vector(&args.normal));

    let mut camera = OrbitCamera::framing(&slice_plane::Cuboid::new(config.dimensions()));
    let config = config.with_view(camera.view_parameters());

    let mut session = match Session::new(&config) {
        Ok(session) => session,
        Err(err) => {
            error!("cannot start session: {err}");
            return;
        }
    };
    info!("session started with {:?}", config);

    let mut controls = Controls::new();
    let mut orbiting = false;
    let mut recorded_view = session.state().view();

    loop {
        let was_orbiting = orbiting;
        orbiting = !controls.is_dragging() && camera.update();
        if was_orbiting && !orbiting {
            if let Err(err) = session.change_view(camera.view_parameters()) {
                error!("cannot record view: {err}");
            }
            recorded_view = session.state().view();
        }

        let viewport = CameraViewport::new(&camera);
        if !orbiting {
            controls.forward_mouse(&mut session, &viewport);
        }
        for action in controls.poll_actions() {
            controls.apply(action, &mut session, &viewport);
        }
        // Undo and redo may have restored an earlier camera.
        if session.state().view() != recorded_view {
            recorded_view = session.state().view();
            camera.set_view(&recorded_view);
        }

        clear_background(Color::from_rgba(15, 15, 25, 255));
        set_camera(&camera.to_camera3d());
        draw_session(&session);
        set_default_camera();

        if let Some(rect) = session.selection_rect() {
            draw_selection_rect(rect);
        }

        let state = session.state();
        draw_text(
            &format!(
                "Mode: {:?} | Points: {} ({} on plane, {} selected)",
                session.mode().kind(),
                state.points().len(),
                state.points_on_plane().len(),
                state.selection().len(),
            ),
            10.0,
            25.0,
            20.0,
            WHITE,
        );
        let normal = state.plane().normal();
        let point = state.plane().rotation_point();
        draw_text(
            &format!(
                "Normal: ({:.3}, {:.3}, {:.3}) | Point: ({:.1}, {:.1}, {:.1})",
                normal.x, normal.y, normal.z, point.x, point.y, point.z
            ),
            10.0,
            45.0,
            18.0,
            GRAY,
        );
        draw_text(
            &format!(
                "Undo: {} | Redo: {}",
                session.history().undo_label().unwrap_or("-"),
                session.history().redo_label().unwrap_or("-"),
            ),
            10.0,
            65.0,
            18.0,
            GRAY,
        );
        draw_text(
            "Ctrl+click: add/move point | Shift+click/drag: select (Alt adds)",
            10.0,
            85.0,
            16.0,
            DARKGRAY,
        );
        draw_text(&format!("FPS: {}", get_fps()), 10.0, 105.0, 16.0, DARKGRAY);

        next_frame().await
    }
}

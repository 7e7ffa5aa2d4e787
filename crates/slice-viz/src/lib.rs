//! Rendering and camera utilities for the slice plane demo.

use macroquad::models::{draw_mesh, Mesh, Vertex};
use macroquad::prelude::*;
use nalgebra::{Point3, Vector3};
use slice_plane::interaction::{InteractionMode, ModeKind, ViewParameters, Viewport};
use slice_plane::{CrossSection, Cuboid, Session};

pub mod controls;
pub use controls::{Action, Controls};

const SECTION_FILL: Color = Color::new(0.2, 0.6, 0.9, 0.35);
const SECTION_EDGE: Color = Color::new(0.4, 0.8, 1.0, 1.0);
const BOX_EDGE: Color = Color::new(0.6, 0.6, 0.6, 1.0);

fn to_vec3(p: &Point3<f64>) -> Vec3 {
    vec3(p.x as f32, p.y as f32, p.z as f32)
}

fn to_point(v: Vec3) -> Point3<f64> {
    Point3::new(v.x as f64, v.y as f64, v.z as f64)
}

/// Draws the twelve edges of the box.
pub fn draw_box(cuboid: &Cuboid) {
    let corners = cuboid.corners();
    for (i, a) in corners.iter().enumerate() {
        for b in &corners[i + 1..] {
            // Corners one axis apart share an edge.
            let shared = (0..3).filter(|k| a[*k] == b[*k]).count();
            if shared == 2 {
                draw_line_3d(to_vec3(a), to_vec3(b), BOX_EDGE);
            }
        }
    }
}

/// Draws the cut as a fan from its first vertex, plus its outline.
pub fn draw_cross_section(section: &CrossSection) {
    let verts = section.vertices();
    if verts.len() < 3 {
        return;
    }

    let mesh_vertices: Vec<Vertex> = verts
        .iter()
        .map(|p| Vertex::new2(to_vec3(p), vec2(0.0, 0.0), SECTION_FILL))
        .collect();

    let mut indices: Vec<u16> = Vec::with_capacity((verts.len() - 2) * 3);
    for i in 1..verts.len() - 1 {
        indices.push(0);
        indices.push(i as u16);
        indices.push((i + 1) as u16);
    }

    draw_mesh(&Mesh {
        vertices: mesh_vertices,
        indices,
        texture: None,
    });

    for (a, b) in verts.iter().zip(verts.iter().cycle().skip(1)) {
        draw_line_3d(to_vec3(a), to_vec3(b), SECTION_EDGE);
    }
}

/// Handle colour per mode, so the user can tell what a drag will do.
pub fn handle_color(kind: ModeKind) -> Color {
    match kind {
        ModeKind::Rotation => ORANGE,
        ModeKind::Normal => MAGENTA,
        ModeKind::Segment => LIME,
    }
}

/// Draws the box, the cut, the handle and every annotated point.
pub fn draw_session(session: &Session) {
    let state = session.state();
    draw_box(&state.cuboid());
    if let Some(section) = state.cross_section() {
        draw_cross_section(&section);
    }

    draw_sphere(
        to_vec3(&state.handle()),
        state.handle_size() as f32,
        None,
        handle_color(session.mode().kind()),
    );

    let on_plane = state.points_on_plane();
    let size = (state.handle_size() * 0.6) as f32;
    for point in state.points().iter() {
        let color = if state.selection().contains(point.id) {
            YELLOW
        } else if on_plane.contains(&point.id) {
            GREEN
        } else {
            DARKGRAY
        };
        let scene = state.to_scene(&point.location);
        draw_cube(to_vec3(&scene), vec3(size, size, size), None, color);
    }

    if let Some(pending) = session.pending_point() {
        draw_sphere(to_vec3(&state.to_scene(&pending)), size, None, WHITE);
    }
}

/// Outline of a rubber-band selection, in screen space.
pub fn draw_selection_rect(rect: ((f64, f64), (f64, f64))) {
    let ((x0, y0), (x1, y1)) = rect;
    let (x, y) = (x0.min(x1) as f32, y0.min(y1) as f32);
    let (w, h) = ((x1 - x0).abs() as f32, (y1 - y0).abs() as f32);
    draw_rectangle_lines(x, y, w, h, 1.5, YELLOW);
}

/// Simple orbit camera for 3D scene navigation.
pub struct OrbitCamera {
    pub distance: f32,
    pub yaw: f32,
    pub pitch: f32,
    pub target: Vec3,
    /// Multiplier for scroll wheel zoom
    pub zoom_speed: f32,
    /// Minimum distance from target
    pub min_distance: f32,
    /// Maximum distance from target
    pub max_distance: f32,
}

impl OrbitCamera {
    pub fn new(distance: f32, yaw: f32, pitch: f32) -> Self {
        Self {
            distance,
            yaw,
            pitch,
            target: vec3(0.0, 0.0, 0.0),
            zoom_speed: 5.0,
            min_distance: 10.0,
            max_distance: 200.0,
        }
    }

    /// A camera looking at the middle of the box from far enough to see all of it.
    pub fn framing(cuboid: &Cuboid) -> Self {
        let extent = cuboid.dimensions().norm() as f32;
        Self::new(extent * 1.5, 0.6, 0.4)
            .with_zoom(extent * 0.05, extent * 0.3, extent * 5.0)
            .with_target(to_vec3(&cuboid.centre()))
    }

    /// Sets the zoom configuration (speed and distance limits).
    pub fn with_zoom(mut self, speed: f32, min: f32, max: f32) -> Self {
        self.zoom_speed = speed;
        self.min_distance = min;
        self.max_distance = max;
        self
    }

    pub fn with_target(mut self, target: Vec3) -> Self {
        self.target = target;
        self
    }

    /// Orbits with the right mouse button and zooms with the wheel.
    /// Returns `true` while the camera is being dragged.
    ///
    /// The left button is left to the session.
    pub fn update(&mut self) -> bool {
        let dragging = is_mouse_button_down(MouseButton::Right);
        if dragging {
            let delta = mouse_delta_position();
            self.yaw -= delta.x * 2.0;
            self.pitch -= delta.y * 2.0;
        }

        // Clamp pitch to avoid gimbal lock
        self.pitch = self.pitch.clamp(-1.5, 1.5);

        let scroll = mouse_wheel().1;
        self.distance -= scroll * self.zoom_speed;
        self.distance = self.distance.clamp(self.min_distance, self.max_distance);
        dragging
    }

    pub fn position(&self) -> Vec3 {
        let x = self.distance * self.pitch.cos() * self.yaw.sin();
        let y = self.distance * self.pitch.sin();
        let z = self.distance * self.pitch.cos() * self.yaw.cos();
        self.target + vec3(x, y, z)
    }

    pub fn to_camera3d(&self) -> Camera3D {
        Camera3D {
            position: self.position(),
            up: vec3(0.0, 1.0, 0.0),
            target: self.target,
            ..Default::default()
        }
    }

    /// The camera as recorded in the session history.
    pub fn view_parameters(&self) -> ViewParameters {
        ViewParameters::new(
            to_point(self.position()),
            to_point(self.target),
            Vector3::y(),
        )
    }

    /// Moves the camera to a recorded view. The up vector is always +y here.
    pub fn set_view(&mut self, view: &ViewParameters) {
        self.target = to_vec3(&view.lookat);
        let offset = to_vec3(&view.eye) - self.target;
        let distance = offset.length();
        if distance <= f32::EPSILON {
            return;
        }
        self.distance = distance.clamp(self.min_distance, self.max_distance);
        self.pitch = (offset.y / distance).asin().clamp(-1.5, 1.5);
        self.yaw = offset.x.atan2(offset.z);
    }
}

/// Maps between window pixels and the scene through the frame's camera.
pub struct CameraViewport {
    matrix: Mat4,
    inverse: Mat4,
    width: f32,
    height: f32,
    view: ViewParameters,
}

impl CameraViewport {
    pub fn new(camera: &OrbitCamera) -> Self {
        let matrix = camera.to_camera3d().matrix();
        Self {
            matrix,
            inverse: matrix.inverse(),
            width: screen_width(),
            height: screen_height(),
            view: camera.view_parameters(),
        }
    }
}

impl Viewport for CameraViewport {
    fn unproject(&self, x: f64, y: f64, depth: f64) -> Point3<f64> {
        let ndc = vec4(
            2.0 * x as f32 / self.width - 1.0,
            1.0 - 2.0 * y as f32 / self.height,
            depth as f32,
            1.0,
        );
        let world = self.inverse * ndc;
        to_point(world.truncate() / world.w)
    }

    fn project(&self, point: &Point3<f64>) -> Point3<f64> {
        let clip = self.matrix * to_vec3(point).extend(1.0);
        let ndc = clip.truncate() / clip.w;
        Point3::new(
            ((ndc.x + 1.0) * 0.5 * self.width) as f64,
            ((1.0 - ndc.y) * 0.5 * self.height) as f64,
            ndc.z as f64,
        )
    }

    fn size(&self) -> (f64, f64) {
        (self.width as f64, self.height as f64)
    }

    fn view_parameters(&self) -> ViewParameters {
        self.view
    }
}

use crate::scene::camera::{Camera, Orientation};
use crate::scene::transform::Transformable;
use nalgebra::Vector3;
use std::collections::HashSet;
use std::f32::consts::FRAC_PI_2;

/// Movement keys the controller understands (WASD plus vertical).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MoveKey {
    Forward,
    Backward,
    Left,
    Right,
    Up,
    Down,
}

/// Window-system independent input, fed in by whatever front end drives the viewer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    KeyDown(MoveKey),
    KeyUp(MoveKey),
    /// Starts a look drag at the given window position.
    MouseDown { x: f32, y: f32 },
    MouseMove { x: f32, y: f32 },
    MouseUp,
    /// Positive values zoom in.
    Scroll(f32),
}

pub struct CameraController {
    // Movement parameters
    pub speed: f32,
    /// Degrees of rotation per pixel dragged.
    pub sensitivity: f32,

    // Rotation state
    pub yaw: f32,
    pub pitch: f32,

    // FOV control state
    pub fov: f32, // radians
    pub min_fov: f32,
    pub max_fov: f32,

    /// Degrees of FOV per scroll unit.
    pub zoom_speed: f32,

    held: HashSet<MoveKey>,
    last_mouse_pos: Option<(f32, f32)>,
}

const PITCH_LIMIT: f32 = FRAC_PI_2 - 0.01;

impl CameraController {
    /// Creates a controller synced to the camera's current orientation.
    pub fn new(speed: f32, sensitivity: f32, initial_fov_degrees: f32, zoom_speed: f32, camera: &Camera) -> Self {
        let (pitch, yaw) = camera.angles();
        Self {
            speed,
            sensitivity,
            yaw,
            pitch,
            fov: initial_fov_degrees.to_radians(),
            min_fov: 10.0f32.to_radians(),
            max_fov: 120.0f32.to_radians(),
            zoom_speed,
            held: HashSet::new(),
            last_mouse_pos: None,
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.last_mouse_pos.is_some()
    }

    /// Applies one input event. Rotation and zoom take effect immediately;
    /// key presses only change which keys are held until [`Self::update`].
    pub fn handle_event(&mut self, event: InputEvent, camera: &mut Camera) {
        match event {
            InputEvent::KeyDown(key) => {
                self.held.insert(key);
            }
            InputEvent::KeyUp(key) => {
                self.held.remove(&key);
            }
            InputEvent::MouseDown { x, y } => {
                // Re-sync in case something else moved the camera.
                (self.pitch, self.yaw) = camera.angles();
                self.last_mouse_pos = Some((x, y));
            }
            InputEvent::MouseMove { x, y } => {
                if let Some((last_x, last_y)) = self.last_mouse_pos {
                    self.rotate(x - last_x, y - last_y, camera);
                    self.last_mouse_pos = Some((x, y));
                }
            }
            InputEvent::MouseUp => self.last_mouse_pos = None,
            InputEvent::Scroll(amount) => self.zoom(amount, camera),
        }
    }

    /// Moves the camera along the held keys for `dt` seconds.
    pub fn update(&mut self, camera: &mut Camera, dt: f32) {
        let forward = camera.direction();
        let right = forward
            .cross(&camera.up)
            .try_normalize(1e-6)
            .unwrap_or_else(Vector3::x);
        let up = Vector3::y(); // World Up

        let mut move_dir = Vector3::zeros();
        for key in &self.held {
            move_dir += match key {
                MoveKey::Forward => forward,
                MoveKey::Backward => -forward,
                MoveKey::Left => -right,
                MoveKey::Right => right,
                MoveKey::Up => up,
                MoveKey::Down => -up,
            };
        }

        if move_dir.norm_squared() > 1e-6 {
            let offset = move_dir.normalize() * self.speed * dt;
            camera.translate(&offset);
            // A fixed target moves along so the view direction is kept.
            if let Orientation::Target(target) = &mut camera.orientation {
                *target += offset;
            }
        }
    }

    fn rotate(&mut self, dx: f32, dy: f32, camera: &mut Camera) {
        self.yaw += (dx * self.sensitivity).to_radians();
        self.pitch -= (dy * self.sensitivity).to_radians();
        self.pitch = self.pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT);
        camera.set_angles(self.pitch, self.yaw);
    }

    fn zoom(&mut self, amount: f32, camera: &mut Camera) {
        self.fov -= (amount * self.zoom_speed).to_radians();
        self.fov = self.fov.clamp(self.min_fov, self.max_fov);
        camera.set_fov(self.fov);
    }
}

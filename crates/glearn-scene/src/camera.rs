use glam::{Mat4, Vec3};

/// Movement directions understood by [`Camera::move_in`].
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Direction {
    Forward,
    Backward,
    Left,
    Right,
}

/// Tunables shared by the camera and its mouse-look adapter.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraConfig {
    /// World units per second.
    pub speed: f32,
    /// Degrees per pixel of cursor travel.
    pub sensitivity: f32,
    pub min_fov: f32,
    pub max_fov: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            speed: 2.5,
            sensitivity: 0.05,
            min_fov: 1.0,
            max_fov: 45.0,
            near: 0.1,
            far: 100.0,
        }
    }
}

const PITCH_LIMIT: f32 = 89.0;

/// Free-flying fly-through camera driven by Euler angles (degrees).
#[derive(Debug, Clone)]
pub struct Camera {
    position: Vec3,
    direction: Vec3,
    up: Vec3,
    yaw: f32,
    pitch: f32,
    fov: f32,
    config: CameraConfig,
}

impl Camera {
    /// Looks down -Z (yaw -90°, pitch 0) from `position`.
    pub fn new(position: Vec3, up: Vec3) -> Self {
        Self::with_config(position, up, CameraConfig::default())
    }

    pub fn with_config(position: Vec3, up: Vec3, config: CameraConfig) -> Self {
        let mut camera = Self {
            position,
            direction: Vec3::NEG_Z,
            up: up.normalize_or(Vec3::Y),
            yaw: -90.0,
            pitch: 0.0,
            fov: config.max_fov,
            config,
        };
        camera.update_direction();
        camera
    }

    /// Moves `dt` seconds' worth of travel along `direction`.
    pub fn move_in(&mut self, direction: Direction, dt: f32) {
        let distance = self.config.speed * dt;
        let right = self.direction.cross(self.up).normalize_or_zero();
        self.position += match direction {
            Direction::Forward => self.direction * distance,
            Direction::Backward => -self.direction * distance,
            Direction::Right => right * distance,
            Direction::Left => -right * distance,
        };
    }

    /// Adds yaw/pitch offsets in degrees. Pitch stays within ±89° so the view never flips.
    pub fn rotate(&mut self, yaw_offset: f32, pitch_offset: f32) {
        self.yaw += yaw_offset;
        self.pitch = (self.pitch + pitch_offset).clamp(-PITCH_LIMIT, PITCH_LIMIT);
        self.update_direction();
    }

    /// Scroll-wheel zoom: narrows the field of view for positive `offset`.
    pub fn zoom(&mut self, offset: f32) {
        self.fov = (self.fov - offset).clamp(self.config.min_fov, self.config.max_fov);
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.position + self.direction, self.up)
    }

    pub fn projection(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh_gl(self.fov.to_radians(), aspect, self.config.near, self.config.far)
    }

    fn update_direction(&mut self) {
        let (yaw, pitch) = (self.yaw.to_radians(), self.pitch.to_radians());
        self.direction = Vec3::new(yaw.cos() * pitch.cos(), pitch.sin(), yaw.sin() * pitch.cos()).normalize();
    }

    #[inline]
    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    #[inline]
    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    #[inline]
    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    #[inline]
    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    /// Field of view in degrees.
    #[inline]
    pub fn fov(&self) -> f32 {
        self.fov
    }

    #[inline]
    pub fn config(&self) -> &CameraConfig {
        &self.config
    }
}

/// Turns absolute cursor positions into camera rotation offsets.
///
/// The first event only records the cursor; window y grows downwards, so the
/// pitch offset is inverted.
#[derive(Debug, Clone)]
pub struct MouseLook {
    last: Option<(f32, f32)>,
    sensitivity: f32,
}

impl MouseLook {
    pub fn new(sensitivity: f32) -> Self {
        Self { last: None, sensitivity }
    }

    /// Returns `(yaw_offset, pitch_offset)` in degrees, or `None` for the first event.
    pub fn offsets(&mut self, x: f32, y: f32) -> Option<(f32, f32)> {
        let previous = self.last.replace((x, y))?;
        let dx = (x - previous.0) * self.sensitivity;
        let dy = (previous.1 - y) * self.sensitivity;
        Some((dx, dy))
    }

    /// Feeds one cursor event straight into `camera`.
    pub fn apply(&mut self, camera: &mut Camera, x: f32, y: f32) {
        if let Some((dx, dy)) = self.offsets(x, y) {
            camera.rotate(dx, dy);
        }
    }

    /// Forgets the last position, e.g. after the cursor was released.
    pub fn reset(&mut self) {
        self.last = None;
    }
}

impl Default for MouseLook {
    fn default() -> Self {
        Self::new(CameraConfig::default().sensitivity)
    }
}

//! Perspective camera, orbit controls, and the frame clock.

use std::f32::consts::PI;
use std::time::Instant;

use glam::{Mat4, Vec3};

use crate::config::{CameraConfig, RotationConfig};
use crate::constants::{ROTATION_MAX_POLAR, ROTATION_MIN_POLAR};

const EPS: f32 = 1e-6;

#[derive(Debug, Clone, PartialEq)]
pub struct PerspectiveCamera {
    /// Vertical field of view in degrees
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub position: Vec3,
    pub target: Vec3,
}

impl PerspectiveCamera {
    pub fn new(config: &CameraConfig, aspect: f32) -> Self {
        Self {
            fov: config.fov,
            aspect,
            near: config.near,
            far: config.far,
            position: Vec3::from(config.default_position),
            target: Vec3::ZERO,
        }
    }

    pub fn look_at(&mut self, target: Vec3) {
        self.target = target;
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, Vec3::Y)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh_gl(self.fov.to_radians(), self.aspect.max(EPS), self.near, self.far)
    }

    pub fn distance(&self) -> f32 {
        (self.position - self.target).length()
    }
}

/// Spherical coordinates around the orbit target, `phi` measured from +Y.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
struct Spherical {
    radius: f32,
    phi: f32,
    theta: f32,
}

impl Spherical {
    fn from_offset(offset: Vec3) -> Self {
        let radius = offset.length();
        if radius < EPS {
            return Self::default();
        }
        Self {
            radius,
            theta: offset.x.atan2(offset.z),
            phi: (offset.y / radius).clamp(-1.0, 1.0).acos(),
        }
    }

    fn to_offset(self) -> Vec3 {
        let sin_phi = self.phi.sin();
        Vec3::new(
            self.radius * sin_phi * self.theta.sin(),
            self.radius * self.phi.cos(),
            self.radius * sin_phi * self.theta.cos(),
        )
    }
}

/// Orbit camera controller: auto-rotation, damping, drag rotation and dolly.
#[derive(Debug, Clone)]
pub struct OrbitControls {
    pub auto_rotate: bool,
    pub auto_rotate_speed: f32,
    pub enable_damping: bool,
    pub damping_factor: f32,
    pub rotate_speed: f32,
    pub zoom_scale: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub min_polar_angle: f32,
    pub max_polar_angle: f32,
    pub target: Vec3,
    delta: Spherical,
    scale: f32,
    saved_target: Vec3,
    saved_position: Vec3,
}

impl OrbitControls {
    /// Creates controls and saves the camera's current placement for `reset`.
    pub fn new(
        camera: &PerspectiveCamera,
        camera_config: &CameraConfig,
        rotation: &RotationConfig,
    ) -> Self {
        Self {
            auto_rotate: true,
            auto_rotate_speed: rotation.default_speed,
            enable_damping: rotation.damping,
            damping_factor: rotation.damping_factor,
            rotate_speed: rotation.rotate_speed,
            zoom_scale: rotation.zoom_scale,
            min_distance: camera_config.min_distance,
            max_distance: camera_config.max_distance,
            min_polar_angle: ROTATION_MIN_POLAR,
            max_polar_angle: ROTATION_MAX_POLAR,
            target: camera.target,
            delta: Spherical::default(),
            scale: 1.0,
            saved_target: camera.target,
            saved_position: camera.position,
        }
    }

    fn auto_rotation_angle(&self, delta_seconds: f32) -> f32 {
        2.0 * PI / 60.0 * self.auto_rotate_speed * delta_seconds
    }

    pub fn rotate_left(&mut self, angle: f32) {
        self.delta.theta -= angle;
    }

    pub fn rotate_up(&mut self, angle: f32) {
        self.delta.phi -= angle;
    }

    /// Rotates from a pointer drag measured in terminal cells.
    ///
    /// Cells are twice as tall as wide, so vertical deltas count double
    /// against a viewport height expressed in cell widths.
    pub fn rotate_by_drag(&mut self, dx_cells: f32, dy_cells: f32, viewport_rows: u16) {
        let height = (viewport_rows.max(1) as f32) * 2.0;
        self.rotate_left(2.0 * PI * dx_cells / height * self.rotate_speed);
        self.rotate_up(2.0 * PI * (dy_cells * 2.0) / height * self.rotate_speed);
    }

    pub fn dolly_in(&mut self) {
        self.scale *= self.zoom_scale;
    }

    pub fn dolly_out(&mut self) {
        self.scale /= self.zoom_scale;
    }

    /// Applies pending motion to the camera. Returns true if the camera moved.
    pub fn update(&mut self, camera: &mut PerspectiveCamera, delta_seconds: f32) -> bool {
        let offset = camera.position - self.target;
        let mut spherical = Spherical::from_offset(offset);

        if self.auto_rotate {
            let angle = self.auto_rotation_angle(delta_seconds);
            self.rotate_left(angle);
        }

        if self.enable_damping {
            spherical.theta += self.delta.theta * self.damping_factor;
            spherical.phi += self.delta.phi * self.damping_factor;
        } else {
            spherical.theta += self.delta.theta;
            spherical.phi += self.delta.phi;
        }

        spherical.phi = spherical
            .phi
            .clamp(self.min_polar_angle, self.max_polar_angle)
            .clamp(EPS, PI - EPS);
        spherical.radius = (spherical.radius * self.scale).clamp(self.min_distance, self.max_distance);

        let previous = camera.position;
        camera.position = self.target + spherical.to_offset();
        camera.look_at(self.target);

        if self.enable_damping {
            self.delta.theta *= 1.0 - self.damping_factor;
            self.delta.phi *= 1.0 - self.damping_factor;
        } else {
            self.delta = Spherical::default();
        }
        self.scale = 1.0;

        (camera.position - previous).length_squared() > EPS
    }

    /// Moves the camera along its current direction to `distance` from the
    /// origin, then lets `update` clamp it into range.
    pub fn set_distance(&mut self, camera: &mut PerspectiveCamera, distance: f32) {
        let direction = if camera.position.length_squared() > EPS {
            camera.position.normalize()
        } else {
            Vec3::Z
        };
        camera.position = direction * distance;
        self.update(camera, 0.0);
    }

    /// Restores the placement saved at construction.
    pub fn reset(&mut self, camera: &mut PerspectiveCamera) {
        self.target = self.saved_target;
        camera.position = self.saved_position;
        camera.look_at(self.target);
        self.delta = Spherical::default();
        self.scale = 1.0;
        self.update(camera, 0.0);
    }
}

/// Frame clock. A stopped clock reports zero elapsed time.
#[derive(Debug, Clone)]
pub struct Clock {
    running: bool,
    last: Instant,
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock {
    pub fn new() -> Self {
        Self {
            running: true,
            last: Instant::now(),
        }
    }

    pub fn start(&mut self) {
        self.start_at(Instant::now());
    }

    /// Resumes measuring from `now`; time spent stopped is never reported.
    pub fn start_at(&mut self, now: Instant) {
        self.running = true;
        self.last = now;
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Seconds since the previous call.
    pub fn get_delta(&mut self) -> f32 {
        self.delta_at(Instant::now())
    }

    pub fn delta_at(&mut self, now: Instant) -> f32 {
        if !self.running {
            return 0.0;
        }
        let delta = now.saturating_duration_since(self.last).as_secs_f32();
        self.last = now;
        delta
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use std::time::Duration;

    fn rig() -> (PerspectiveCamera, OrbitControls) {
        let config = Config::default();
        let camera = PerspectiveCamera::new(&config.camera, 2.0);
        let controls = OrbitControls::new(&camera, &config.camera, &config.rotation);
        (camera, controls)
    }

    #[test]
    fn spherical_round_trip() {
        let offset = Vec3::new(0.0, 150.0, 900.0);
        let back = Spherical::from_offset(offset).to_offset();
        assert!((back - offset).length() < 1e-3);
    }

    #[test]
    fn auto_rotation_moves_camera_around_target() {
        let (mut camera, mut controls) = rig();
        controls.enable_damping = false;
        let before = camera.position;
        assert!(controls.update(&mut camera, 1.0));
        assert!((camera.distance() - before.length()).abs() < 1e-2);
        assert!((camera.position.y - before.y).abs() < 1e-2);
    }

    #[test]
    fn auto_rotation_off_keeps_camera_still() {
        let (mut camera, mut controls) = rig();
        controls.auto_rotate = false;
        let before = camera.position;
        controls.update(&mut camera, 1.0);
        assert!((camera.position - before).length() < 1e-3);
    }

    #[test]
    fn set_distance_is_clamped() {
        let (mut camera, mut controls) = rig();
        controls.auto_rotate = false;
        controls.set_distance(&mut camera, 10.0);
        assert!((camera.distance() - 250.0).abs() < 1e-2);
        controls.set_distance(&mut camera, 10_000.0);
        assert!((camera.distance() - 3000.0).abs() < 1e-1);
        controls.set_distance(&mut camera, 1200.0);
        assert!((camera.distance() - 1200.0).abs() < 1e-1);
    }

    #[test]
    fn dolly_changes_distance() {
        let (mut camera, mut controls) = rig();
        controls.auto_rotate = false;
        let before = camera.distance();
        controls.dolly_in();
        controls.update(&mut camera, 0.0);
        assert!(camera.distance() < before);
    }

    #[test]
    fn reset_restores_saved_position() {
        let (mut camera, mut controls) = rig();
        controls.auto_rotate = false;
        let original = camera.position;
        controls.rotate_by_drag(10.0, 4.0, 40);
        controls.set_distance(&mut camera, 2000.0);
        controls.reset(&mut camera);
        assert!((camera.position - original).length() < 1e-2);
    }

    #[test]
    fn polar_angle_never_flips_over_the_pole() {
        let (mut camera, mut controls) = rig();
        assert_eq!(
            (controls.min_polar_angle, controls.max_polar_angle),
            (ROTATION_MIN_POLAR, ROTATION_MAX_POLAR)
        );
        controls.auto_rotate = false;
        controls.enable_damping = false;
        controls.rotate_up(10.0);
        controls.update(&mut camera, 0.0);
        assert!(camera.position.is_finite());
        assert!(camera.position.y > 0.99 * camera.distance());
    }

    #[test]
    fn stopped_clock_reports_zero() {
        let mut clock = Clock::new();
        let start = Instant::now();
        clock.delta_at(start);
        clock.stop();
        assert_eq!(clock.delta_at(start + Duration::from_secs(5)), 0.0);
        assert!(!clock.is_running());
    }

    #[test]
    fn restarted_clock_skips_paused_time() {
        let mut clock = Clock::new();
        let start = Instant::now();
        clock.delta_at(start);
        clock.stop();
        let resumed = start + Duration::from_secs(60);
        clock.start_at(resumed);
        let delta = clock.delta_at(resumed + Duration::from_millis(16));
        assert!((delta - 0.016).abs() < 1e-4);
    }

    #[test]
    fn clock_measures_elapsed_time() {
        let mut clock = Clock::new();
        let start = Instant::now();
        clock.delta_at(start);
        let delta = clock.delta_at(start + Duration::from_millis(500));
        assert!((delta - 0.5).abs() < 1e-3);
    }
}

//! Default values for every tunable in the viewer.
//!
//! The config file overrides these; nothing else should hard-code them.

use std::f32::consts::PI;

// ASCII rendering
pub const ASCII_DEFAULT_SCALE: f32 = 1.2;
pub const ASCII_MIN_SCALE: f32 = 0.5;
pub const ASCII_MAX_SCALE: f32 = 3.0;
/// Upper bound on the number of palette characters taken from the defaults.
pub const ASCII_BASE_DENSITY: usize = 50_000;
pub const ASCII_DEFAULT_CHARS: &str =
    " .'`^\",:;Il!i~+_-?][}{1)(|\\/tfjrxnuvczXYUJCLQ0OZmwqpdbkhao*#MW&8%B@$";
/// Minimum palette length a custom character set is repeated up to.
pub const ASCII_CUSTOM_TARGET_LENGTH: usize = 50;
/// Sub-pixels per character cell. Terminal cells are twice as tall as wide,
/// so 2x4 keeps every sub-pixel square.
pub const SUBPIXELS_X: usize = 2;
pub const SUBPIXELS_Y: usize = 4;

// Camera
pub const CAMERA_FOV: f32 = 70.0;
pub const CAMERA_NEAR: f32 = 1.0;
pub const CAMERA_FAR: f32 = 5000.0;
pub const CAMERA_DEFAULT_POSITION: [f32; 3] = [0.0, 150.0, 900.0];
pub const CAMERA_MIN_DISTANCE: f32 = 250.0;
pub const CAMERA_MAX_DISTANCE: f32 = 3000.0;
pub const CAMERA_DISTANCE_STEP: f32 = 50.0;

// Animation
pub const ANIMATION_DEFAULT_SPEED: f32 = 0.6;
pub const ANIMATION_MIN_SPEED: f32 = 0.1;
pub const ANIMATION_MAX_SPEED: f32 = 3.0;
/// Largest frame delta fed to the mixer (30 FPS floor).
pub const ANIMATION_MAX_DELTA: f32 = 0.033;

// Rotation
pub const ROTATION_DEFAULT_SPEED: f32 = 0.3;
pub const ROTATION_MIN_SPEED: f32 = 0.0;
pub const ROTATION_MAX_SPEED: f32 = 2.0;
pub const ROTATION_DAMPING: bool = true;
pub const ROTATION_DAMPING_FACTOR: f32 = 0.05;
pub const ROTATION_ROTATE_SPEED: f32 = 0.8;
pub const ROTATION_ZOOM_SCALE: f32 = 0.95;
pub const ROTATION_MIN_POLAR: f32 = 0.0;
pub const ROTATION_MAX_POLAR: f32 = PI;

// Lighting
pub const LIGHT_INTENSITY_MIN: f32 = 0.0;
pub const LIGHT_INTENSITY_MAX: f32 = 20.0;
pub const LIGHT_MAIN_POSITION: [f32; 3] = [0.0, 150.0, 800.0];
pub const LIGHT_RED_POSITION: [f32; 3] = [200.0, 50.0, 200.0];
pub const LIGHT_BLUE_POSITION: [f32; 3] = [-200.0, 50.0, 200.0];
pub const LIGHT_SPOT_POSITION: [f32; 3] = [0.0, 400.0, 0.0];
pub const LIGHT_COLOR_WHITE: u32 = 0xffffff;
pub const LIGHT_COLOR_RED: u32 = 0xff2222;
pub const LIGHT_COLOR_BLUE: u32 = 0x2222ff;
pub const SPOT_ANGLE: f32 = PI / 4.0;
pub const SPOT_PENUMBRA: f32 = 0.2;
pub const DEFAULT_PRESET: &str = "default";

// Models
pub const MODEL_DESIRED_SIZE: f32 = 150.0;
pub const UPLOAD_SCALE_MULTIPLIER: f32 = 6.0;
pub const UPLOAD_MAX_SIZE_MB: u64 = 50;
pub const UPLOAD_EXTENSIONS: [&str; 2] = [".glb", ".gltf"];

// UI
pub const NOTIFICATION_DURATION_MS: u64 = 3000;
pub const MESSAGE_DURATION_MS: u64 = 5000;
pub const RESIZE_DEBOUNCE_MS: u64 = 250;
pub const FRAME_INTERVAL_MS: u64 = 16;

// Scene
pub const BACKGROUND_COLOR: u32 = 0x000000;

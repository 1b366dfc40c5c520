//! Animated glTF models rendered as live ASCII art in the terminal.

pub mod animation;
pub mod app;
pub mod ascii;
pub mod camera;
pub mod config;
pub mod constants;
pub mod error;
pub mod export;
pub mod graphics;
pub mod lighting;
pub mod loader;
pub mod logging;
pub mod math;
pub mod models;
pub mod render;
pub mod scene;
pub mod state;
pub mod term;
pub mod ui;
pub mod utils;
pub mod vertex;
pub mod widget;

pub use app::{App, LoadEvent};
pub use config::{Config, Theme};
pub use error::{ConfigError, ModelError, RenderError};

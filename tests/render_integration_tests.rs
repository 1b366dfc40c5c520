//! Integration tests for the frame pipeline: render, ASCII conversion,
//! HUD painting and export.

mod common;

use std::fs;
use std::time::{Duration, Instant};

use ascii_animator::state::ViewerState;
use ascii_animator::term::FrameBuffer;
use ascii_animator::widget::ViewerWidget;
use ascii_animator::App;
use common::{config_with_triangle, has_ink};
use crossterm::event::{Event, KeyCode, KeyEvent, KeyModifiers};
use tempfile::TempDir;

fn loaded_app(dir: &TempDir, viewport: (usize, usize)) -> App {
    let mut app = App::new(config_with_triangle(dir.path()), viewport);
    app.initialize(Some("tri")).unwrap();
    app.wait_for_load(Duration::from_secs(10)).unwrap();
    app.animate_with_delta(0.016);
    app
}

#[test]
fn test_ascii_grid_follows_density() {
    let dir = TempDir::new().unwrap();
    let mut app = loaded_app(&dir, (40, 20));

    let text = app.ascii_text();
    let rows: Vec<_> = text.lines().collect();
    assert_eq!(rows.len(), 24);
    assert!(rows.iter().all(|r| r.chars().count() == 48));

    app.set_ascii_density(0.5);
    app.animate_with_delta(0.016);
    let text = app.ascii_text();
    assert_eq!(text.lines().count(), 10);
    assert!(has_ink(&text));

    // The visible area always matches the viewport
    let visible = app.ascii().visible_lines();
    assert_eq!(visible.len(), 20);
    assert!(visible.iter().all(|r| r.chars().count() == 40));
}

#[test]
fn test_custom_palette_limits_output() {
    let dir = TempDir::new().unwrap();
    let mut app = loaded_app(&dir, (40, 20));
    app.update_ascii_characters("#");
    app.animate_with_delta(0.016);

    let text = app.ascii_text();
    assert!(text.chars().all(|c| matches!(c, ' ' | '.' | '#' | '\n')));
    assert!(text.contains('#'));
}

#[test]
fn test_lights_off_renders_blank() {
    let dir = TempDir::new().unwrap();
    let mut app = loaded_app(&dir, (40, 20));
    for light in ascii_animator::lighting::LightName::ALL {
        app.set_light_intensity(light, 0.0);
    }
    app.animate_with_delta(0.016);
    assert!(!has_ink(&app.ascii_text()));
}

#[test]
fn test_download_key_writes_art() {
    let dir = TempDir::new().unwrap();
    let mut app = loaded_app(&dir, (40, 20));
    let mut widget = ViewerWidget::new(
        (40, 21),
        Duration::from_millis(3000),
        Duration::from_millis(5000),
    );
    let mut state = ViewerState::default();
    let mut sink = Vec::new();

    let key = Event::Key(KeyEvent::new(KeyCode::Char('s'), KeyModifiers::NONE));
    widget.event(&key, &mut app, &mut state, &mut sink, Instant::now());

    let exports: Vec<_> = fs::read_dir(dir.path().join("exports"))
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect();
    assert_eq!(exports.len(), 1);
    let name = exports[0].file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("ascii-art-tri-"));
    assert_eq!(fs::read_to_string(&exports[0]).unwrap(), app.ascii_text());
}

#[test]
fn test_paint_shows_model_and_animation() {
    let dir = TempDir::new().unwrap();
    let app = loaded_app(&dir, (60, 20));
    let mut widget = ViewerWidget::new(
        (60, 21),
        Duration::from_millis(3000),
        Duration::from_millis(5000),
    );
    let state = ViewerState::default();

    let mut fb = FrameBuffer::new(60, 21);
    widget.paint(&mut fb, &app, &state, Instant::now());
    assert!(fb.row_text(20).starts_with(" Tri | slide (2/2) | Density 1.2"));
}

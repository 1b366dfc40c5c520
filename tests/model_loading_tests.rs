//! Integration tests for loading models from disk through the app
//!
//! These tests verify:
//! - Library models load in the background and start their preferred clip
//! - User files are validated, then loaded with their file name reported
//! - Superseded loads never replace a newer one
//! - Failed loads fall back to the placeholder cube

mod common;

use std::fs;
use std::time::Duration;

use ascii_animator::loader::load_path;
use ascii_animator::models::ModelManager;
use ascii_animator::{App, LoadEvent, ModelError};
use common::{config_with_triangle, has_ink, write_triangle_gltf};
use tempfile::TempDir;

const TIMEOUT: Duration = Duration::from_secs(10);

#[test]
fn test_loader_reads_external_buffer() {
    let dir = TempDir::new().unwrap();
    let path = write_triangle_gltf(dir.path());

    let asset = load_path(&path).unwrap();
    assert_eq!(asset.triangle_count(), 1);
    let names: Vec<_> = asset.animations.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["idle", "slide"]);
}

#[test]
fn test_library_model_plays_preferred_animation() {
    let dir = TempDir::new().unwrap();
    let mut app = App::new(config_with_triangle(dir.path()), (40, 20));
    app.initialize(Some("tri")).unwrap();
    assert!(app.is_loading());

    match app.wait_for_load(TIMEOUT) {
        Some(LoadEvent::Loaded {
            name,
            file_name,
            animations,
        }) => {
            assert_eq!(name, "tri");
            assert_eq!(file_name, None);
            assert_eq!(animations, 2);
        }
        other => panic!("expected a loaded model, got {other:?}"),
    }

    let info = app.animation_info();
    assert_eq!(info.current_name.as_deref(), Some("slide"));
    assert_eq!(info.current_index, 1);

    // Cycling wraps back to the first clip
    let next = app.switch_animation().unwrap();
    assert_eq!((next.name.as_str(), next.index, next.total), ("idle", 0, 2));

    app.animate_with_delta(0.016);
    assert!(has_ink(&app.ascii_text()));
}

#[test]
fn test_user_file_reports_file_name() {
    let dir = TempDir::new().unwrap();
    let mut app = App::new(config_with_triangle(dir.path()), (40, 20));
    let path = dir.path().join("scene.gltf");

    app.load_model_from_file(&path).unwrap();
    match app.wait_for_load(TIMEOUT) {
        Some(LoadEvent::Loaded { file_name, .. }) => {
            assert_eq!(file_name.as_deref(), Some("scene.gltf"));
        }
        other => panic!("expected a loaded model, got {other:?}"),
    }
    // User files start on the first clip
    assert_eq!(app.animation_info().current_index, 0);
    // The status line names the file on screen, not the library entry
    assert_eq!(app.current_model_name(), "scene.gltf");
}

#[test]
fn test_cyclic_node_graph_fails_to_load() {
    let dir = TempDir::new().unwrap();
    let mut app = App::new(config_with_triangle(dir.path()), (40, 20));
    let json = fs::read_to_string(write_triangle_gltf(dir.path())).unwrap();
    let cyclic = dir.path().join("loop.gltf");
    fs::write(
        &cyclic,
        json.replace(
            r#""nodes": [{"name": "tri", "mesh": 0}]"#,
            r#""nodes": [{"name": "tri", "mesh": 0, "children": [1]}, {"name": "loop", "children": [0]}]"#,
        ),
    )
    .unwrap();

    app.load_model_from_file(&cyclic).unwrap();
    match app.wait_for_load(TIMEOUT) {
        Some(LoadEvent::Failed { error, placeholder }) => {
            assert!(matches!(error, ModelError::InvalidHierarchy(_)));
            assert!(placeholder);
        }
        other => panic!("expected a failure, got {other:?}"),
    }
    app.animate_with_delta(0.016);
    assert!(has_ink(&app.ascii_text()));
}

#[test]
fn test_user_file_validation_happens_before_loading() {
    let dir = TempDir::new().unwrap();
    let mut app = App::new(config_with_triangle(dir.path()), (40, 20));

    let obj = dir.path().join("model.obj");
    fs::write(&obj, b"o cube").unwrap();
    let err = app.load_model_from_file(&obj).unwrap_err();
    assert!(matches!(err, ModelError::UnsupportedExtension(..)));

    let upper = dir.path().join("MODEL.GLB");
    fs::write(&upper, b"glTF").unwrap();
    assert!(app.load_model_from_file(&upper).is_ok());
    // Not a real GLB, so the background load fails
    assert!(matches!(
        app.wait_for_load(TIMEOUT),
        Some(LoadEvent::Failed { .. })
    ));
}

#[test]
fn test_oversized_file_is_rejected() {
    let dir = TempDir::new().unwrap();
    let mut config = config_with_triangle(dir.path());
    config.models.max_upload_mb = 0;
    let mut app = App::new(config, (40, 20));

    let err = app
        .load_model_from_file(&dir.path().join("scene.gltf"))
        .unwrap_err();
    assert!(matches!(err, ModelError::FileTooLarge { limit_mb: 0, .. }));
    assert!(!app.is_loading());
}

#[test]
fn test_superseded_load_is_dropped() {
    let dir = TempDir::new().unwrap();
    let config = config_with_triangle(dir.path());
    let mut models = ModelManager::new(config.models.clone());

    let first = models.load_model("ghost").unwrap();
    let second = models.load_model("tri").unwrap();
    assert!(second > first);

    // The ghost failure arrives first or second but is never reported
    let result = models.wait(TIMEOUT).expect("load should finish");
    let loaded = result.unwrap();
    assert_eq!(loaded.name, "tri");
    assert_eq!(models.current_model_name(), "tri");
    assert!(models.current_model().is_some());
}

#[test]
fn test_missing_initial_model_shows_placeholder() {
    let dir = TempDir::new().unwrap();
    let mut app = App::new(config_with_triangle(dir.path()), (40, 20));
    app.initialize(Some("ghost")).unwrap();

    match app.wait_for_load(TIMEOUT) {
        Some(LoadEvent::Failed { error, placeholder }) => {
            assert!(placeholder);
            assert!(matches!(error, ModelError::Io { .. }));
        }
        other => panic!("expected a failure, got {other:?}"),
    }
    app.animate_with_delta(0.016);
    assert!(has_ink(&app.ascii_text()));
}

#[test]
fn test_switch_model_cycles_library() {
    let dir = TempDir::new().unwrap();
    let mut app = App::new(config_with_triangle(dir.path()), (40, 20));
    app.initialize(None).unwrap();
    assert_eq!(app.current_model_name(), "tri");

    assert_eq!(app.switch_model().unwrap(), "ghost");
    assert_eq!(app.switch_model().unwrap(), "tri");
    assert_eq!(app.current_model_name(), "tri");
}

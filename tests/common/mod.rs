//! Shared fixtures: a tiny animated glTF written to disk.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use ascii_animator::config::{Config, ModelEntry};

/// Writes `scene.gltf` + `scene.bin` into `dir`: one triangle facing +Z on
/// node 0, with two translation clips (`idle` and `slide`).
pub fn write_triangle_gltf(dir: &Path) -> PathBuf {
    let mut bin = Vec::new();
    let mut push = |values: &[f32]| {
        for v in values {
            bin.extend_from_slice(&v.to_le_bytes());
        }
    };
    // positions (36 bytes)
    push(&[-1.0, -1.0, 0.0, 1.0, -1.0, 0.0, 0.0, 1.0, 0.0]);
    // normals (36 bytes)
    push(&[0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0]);
    // key times (8 bytes)
    push(&[0.0, 1.0]);
    // idle translations (24 bytes)
    push(&[0.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
    // slide translations (24 bytes)
    push(&[0.0, 0.0, 0.0, 0.5, 0.0, 0.0]);

    fs::write(dir.join("scene.bin"), &bin).unwrap();

    let json = format!(
        r#"{{
  "asset": {{"version": "2.0"}},
  "scene": 0,
  "scenes": [{{"nodes": [0]}}],
  "nodes": [{{"name": "tri", "mesh": 0}}],
  "meshes": [{{"primitives": [{{"attributes": {{"POSITION": 0, "NORMAL": 1}}}}]}}],
  "animations": [
    {{"name": "idle",
      "channels": [{{"sampler": 0, "target": {{"node": 0, "path": "translation"}}}}],
      "samplers": [{{"input": 2, "output": 3}}]}},
    {{"name": "slide",
      "channels": [{{"sampler": 0, "target": {{"node": 0, "path": "translation"}}}}],
      "samplers": [{{"input": 2, "output": 4}}]}}
  ],
  "buffers": [{{"byteLength": {len}, "uri": "scene.bin"}}],
  "bufferViews": [
    {{"buffer": 0, "byteOffset": 0, "byteLength": 36}},
    {{"buffer": 0, "byteOffset": 36, "byteLength": 36}},
    {{"buffer": 0, "byteOffset": 72, "byteLength": 8}},
    {{"buffer": 0, "byteOffset": 80, "byteLength": 24}},
    {{"buffer": 0, "byteOffset": 104, "byteLength": 24}}
  ],
  "accessors": [
    {{"bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3", "min": [-1,-1,0], "max": [1,1,0]}},
    {{"bufferView": 1, "componentType": 5126, "count": 3, "type": "VEC3"}},
    {{"bufferView": 2, "componentType": 5126, "count": 2, "type": "SCALAR", "min": [0], "max": [1]}},
    {{"bufferView": 3, "componentType": 5126, "count": 2, "type": "VEC3"}},
    {{"bufferView": 4, "componentType": 5126, "count": 2, "type": "VEC3"}}
  ]
}}"#,
        len = bin.len()
    );
    let path = dir.join("scene.gltf");
    fs::write(&path, json).unwrap();
    path
}

/// Default config whose library is the triangle plus one missing file.
pub fn config_with_triangle(dir: &Path) -> Config {
    let path = write_triangle_gltf(dir);
    let mut config = Config::default();
    config.models.library = vec![
        ModelEntry {
            name: "tri".to_string(),
            path,
            scale_multiplier: 4.0,
            preferred_animation: Some("slide".to_string()),
        },
        ModelEntry {
            name: "ghost".to_string(),
            path: dir.join("ghost.glb"),
            scale_multiplier: 6.0,
            preferred_animation: None,
        },
    ];
    config.ui.export_dir = dir.join("exports");
    config
}

/// True if `text` contains anything besides spaces and newlines.
pub fn has_ink(text: &str) -> bool {
    text.chars().any(|c| c != ' ' && c != '\n')
}

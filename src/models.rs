//! Model library and background loading.
//!
//! Loads run on a worker thread and report back over a channel. Every load
//! bumps a version counter; completions that arrive for an older version
//! are dropped, so only the most recently requested model is ever shown.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::thread;
use std::time::{Duration, Instant};

use glam::{Mat4, Quat, Vec3};
use tracing::{debug, error, info};

use crate::animation::AnimationClip;
use crate::config::{ModelEntry, ModelsConfig};
use crate::error::ModelError;
use crate::loader;
use crate::scene::{Material, MaterialKind, Model, ModelAsset, Transform};
use crate::utils::{validate_file_extension, validate_file_size};

/// What a load needs besides the file itself.
#[derive(Debug, Clone, PartialEq)]
struct LoadRequest {
    name: String,
    path: PathBuf,
    scale_multiplier: f32,
    preferred_animation: Option<String>,
    file_name: Option<String>,
}

struct LoadMessage {
    version: u64,
    request: LoadRequest,
    outcome: Result<ModelAsset, ModelError>,
}

/// A completed, current load. The model itself is kept by the manager.
#[derive(Debug, Clone)]
pub struct LoadResult {
    pub name: String,
    pub animations: Vec<AnimationClip>,
    pub preferred_animation: Option<String>,
    /// Set for user-supplied files.
    pub file_name: Option<String>,
}

pub struct ModelManager {
    config: ModelsConfig,
    current_model: Option<Model>,
    current_model_index: usize,
    model_load_version: u64,
    pending: Option<u64>,
    tx: Sender<LoadMessage>,
    rx: Receiver<LoadMessage>,
}

impl ModelManager {
    pub fn new(config: ModelsConfig) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            config,
            current_model: None,
            current_model_index: 0,
            model_load_version: 0,
            pending: None,
            tx,
            rx,
        }
    }

    pub fn library(&self) -> &[ModelEntry] {
        &self.config.library
    }

    pub fn current_model(&self) -> Option<&Model> {
        self.current_model.as_ref()
    }

    pub fn current_model_mut(&mut self) -> Option<&mut Model> {
        self.current_model.as_mut()
    }

    pub fn load_version(&self) -> u64 {
        self.model_load_version
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    /// Starts loading a library model by name.
    pub fn load_model(&mut self, name: &str) -> Result<u64, ModelError> {
        self.dispose_current_model();
        self.model_load_version += 1;

        let index = self
            .config
            .library
            .iter()
            .position(|entry| entry.name == name)
            .ok_or_else(|| ModelError::UnknownModel(name.to_string()))?;
        self.current_model_index = index;

        let entry = &self.config.library[index];
        let request = LoadRequest {
            name: entry.name.clone(),
            path: entry.path.clone(),
            scale_multiplier: entry.scale_multiplier,
            preferred_animation: entry.preferred_animation.clone(),
            file_name: None,
        };
        self.spawn(request)
    }

    /// Validates then starts loading a user-supplied file.
    pub fn load_model_from_file(&mut self, path: &Path) -> Result<u64, ModelError> {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        if !validate_file_extension(path, &self.config.allowed_extensions) {
            return Err(ModelError::UnsupportedExtension(
                file_name,
                self.config.allowed_extensions.join(", "),
            ));
        }

        let size = fs::metadata(path)
            .map_err(|source| ModelError::Io {
                path: path.to_path_buf(),
                source,
            })?
            .len();
        if !validate_file_size(size, self.config.max_upload_mb) {
            return Err(ModelError::FileTooLarge {
                name: file_name,
                size,
                limit_mb: self.config.max_upload_mb,
            });
        }

        self.dispose_current_model();
        self.model_load_version += 1;

        let request = LoadRequest {
            name: file_name.clone(),
            path: path.to_path_buf(),
            scale_multiplier: self.config.upload_scale_multiplier,
            preferred_animation: None,
            file_name: Some(file_name),
        };
        self.spawn(request)
    }

    fn spawn(&mut self, request: LoadRequest) -> Result<u64, ModelError> {
        let version = self.model_load_version;
        let tx = self.tx.clone();
        let path = request.path.clone();
        info!("Loading model {} from {} (v{})", request.name, path.display(), version);

        thread::Builder::new()
            .name(format!("model-load-{version}"))
            .spawn(move || {
                let outcome = loader::load_path(&request.path);
                // The receiver only goes away when the manager is dropped.
                let _ = tx.send(LoadMessage {
                    version,
                    request,
                    outcome,
                });
            })
            .map_err(|source| ModelError::Io { path, source })?;

        self.pending = Some(version);
        Ok(version)
    }

    /// Returns the current load's outcome if it has arrived.
    pub fn poll(&mut self) -> Option<Result<LoadResult, ModelError>> {
        loop {
            match self.rx.try_recv() {
                Ok(message) => {
                    if let Some(result) = self.complete(message) {
                        return Some(result);
                    }
                }
                Err(TryRecvError::Empty) => return None,
                Err(TryRecvError::Disconnected) => return Some(Err(ModelError::Disconnected)),
            }
        }
    }

    /// Blocks until the current load completes or `timeout` passes.
    pub fn wait(&mut self, timeout: Duration) -> Option<Result<LoadResult, ModelError>> {
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.rx.recv_timeout(remaining) {
                Ok(message) => {
                    if let Some(result) = self.complete(message) {
                        return Some(result);
                    }
                }
                Err(RecvTimeoutError::Timeout) => return None,
                Err(RecvTimeoutError::Disconnected) => return Some(Err(ModelError::Disconnected)),
            }
        }
    }

    fn complete(&mut self, message: LoadMessage) -> Option<Result<LoadResult, ModelError>> {
        if message.version != self.model_load_version {
            debug!(
                "Dropping stale load of {} (v{}, current v{})",
                message.request.name, message.version, self.model_load_version
            );
            return None;
        }
        self.pending = None;

        let request = message.request;
        match message.outcome {
            Ok(mut asset) => {
                let animations = std::mem::take(&mut asset.animations);
                let mut model = Model::new(request.name.clone(), asset);
                self.process_model(&mut model, request.scale_multiplier);
                info!(
                    "Loaded model {} ({} triangles, {} animations)",
                    request.name,
                    model.asset.triangle_count(),
                    animations.len()
                );
                self.current_model = Some(model);
                Some(Ok(LoadResult {
                    name: request.name,
                    animations,
                    preferred_animation: request.preferred_animation,
                    file_name: request.file_name,
                }))
            }
            Err(err) => {
                error!("Failed to load model {}: {}", request.name, err);
                Some(Err(err))
            }
        }
    }

    /// Shows the built-in cube in place of a model that failed to load.
    pub fn load_placeholder(&mut self) -> LoadResult {
        self.dispose_current_model();
        let mut model = Model::new("placeholder", ModelAsset::cube());
        self.process_model(&mut model, 1.0);
        self.current_model = Some(model);
        LoadResult {
            name: "placeholder".to_string(),
            animations: Vec::new(),
            preferred_animation: None,
            file_name: None,
        }
    }

    /// Scales the model to the desired size, centers it on the origin, and
    /// makes every material respond to the light rig.
    pub fn process_model(&self, model: &mut Model, scale_multiplier: f32) {
        let bounds = model.asset.bounds(Mat4::IDENTITY);
        let size = bounds.size();
        let center = bounds.center();

        let mut max_dim = size.max_element();
        if !max_dim.is_finite() || max_dim <= 0.0 {
            max_dim = 1.0;
        }
        let scale = (self.config.desired_size / max_dim) * scale_multiplier;

        model.root = Transform {
            translation: -center * scale,
            rotation: Quat::IDENTITY,
            scale: Vec3::splat(scale),
        };
        model.original_position = model.root.translation;

        for material in model.materials_mut() {
            configure_material(material);
        }
    }

    pub fn dispose_current_model(&mut self) {
        if let Some(model) = self.current_model.take() {
            debug!("Disposed model {}", model.name);
        }
    }

    /// Advances to the next library model and starts loading it.
    pub fn switch_to_next(&mut self) -> Result<String, ModelError> {
        if self.config.library.is_empty() {
            return Err(ModelError::UnknownModel(String::new()));
        }
        self.current_model_index = (self.current_model_index + 1) % self.config.library.len();
        let name = self.config.library[self.current_model_index].name.clone();
        self.load_model(&name)?;
        Ok(name)
    }

    pub fn current_model_name(&self) -> &str {
        self.config
            .library
            .get(self.current_model_index)
            .map(|e| e.name.as_str())
            .unwrap_or_default()
    }
}

/// Adjusts a material so it is lit by the rig.
pub fn configure_material(material: &mut Material) {
    match material.kind {
        MaterialKind::Standard | MaterialKind::Physical => {
            material.metalness = 0.1;
            material.roughness = 0.8;
        }
        MaterialKind::Lambert => {}
        MaterialKind::Basic => {
            material.kind = MaterialKind::Lambert;
        }
        MaterialKind::Other => {
            *material = Material {
                kind: MaterialKind::Lambert,
                color: Some(material.color.unwrap_or(Vec3::ONE)),
                opacity: Some(material.opacity.unwrap_or(1.0)),
                transparent: material.transparent,
                ..Material::default()
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn manager_with(library: Vec<ModelEntry>) -> ModelManager {
        let mut config = Config::default().models;
        config.library = library;
        ModelManager::new(config)
    }

    #[test]
    fn unknown_model_is_an_error() {
        let mut manager = ModelManager::new(Config::default().models);
        let err = manager.load_model("dragon").unwrap_err();
        assert!(matches!(err, ModelError::UnknownModel(name) if name == "dragon"));
        assert_eq!(manager.load_version(), 1);
    }

    #[test]
    fn stale_load_is_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("first.glb");
        let second = dir.path().join("second.glb");
        let mut manager = manager_with(vec![
            ModelEntry::new("first", &first.to_string_lossy(), 1.0, None),
            ModelEntry::new("second", &second.to_string_lossy(), 1.0, None),
        ]);

        manager.load_model("first").unwrap();
        manager.load_model("second").unwrap();

        match manager.wait(Duration::from_secs(5)) {
            Some(Err(ModelError::Io { path, .. })) => assert_eq!(path, second),
            other => panic!("expected the second load's error, got {other:?}"),
        }
        assert!(!manager.is_loading());
        assert!(manager.wait(Duration::from_millis(100)).is_none());
    }

    #[test]
    fn switch_to_next_wraps_around() {
        let mut manager = ModelManager::new(Config::default().models);
        assert_eq!(manager.current_model_name(), "duck");
        let names: Vec<String> = (0..4).map(|_| manager.switch_to_next().unwrap()).collect();
        assert_eq!(names, ["rat", "doge", "alien", "duck"]);
        assert_eq!(manager.load_version(), 4);
    }

    #[test]
    fn file_validation_happens_before_loading() {
        let dir = tempfile::tempdir().unwrap();
        let obj = dir.path().join("model.obj");
        fs::write(&obj, b"o cube").unwrap();

        let mut manager = ModelManager::new(Config::default().models);
        let err = manager.load_model_from_file(&obj).unwrap_err();
        assert!(matches!(err, ModelError::UnsupportedExtension(..)));
        assert_eq!(manager.load_version(), 0);
    }

    #[test]
    fn oversized_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let big = dir.path().join("big.GLB");
        let file = fs::File::create(&big).unwrap();
        file.set_len(1024 * 1024 + 1).unwrap();

        let mut config = Config::default().models;
        config.max_upload_mb = 1;
        let mut manager = ModelManager::new(config);
        let err = manager.load_model_from_file(&big).unwrap_err();
        assert!(matches!(err, ModelError::FileTooLarge { limit_mb: 1, .. }));
    }

    #[test]
    fn process_model_scales_and_centers() {
        let manager = ModelManager::new(Config::default().models);
        let mut model = Model::new("cube", ModelAsset::cube());
        manager.process_model(&mut model, 2.0);

        // Cube spans 2 units: 150 / 2 * 2
        assert_eq!(model.root.scale, Vec3::splat(150.0));
        let bounds = model.asset.bounds(model.root.matrix());
        assert!(bounds.center().length() < 1e-3);
        assert!((bounds.size().x - 300.0).abs() < 1e-3);
        assert_eq!(model.original_position, model.root.translation);
    }

    #[test]
    fn zero_extent_model_does_not_blow_up() {
        let manager = ModelManager::new(Config::default().models);
        let mut model = Model::new("empty", ModelAsset::default());
        manager.process_model(&mut model, 1.0);
        assert!(model.root.scale.is_finite());
        assert_eq!(model.root.scale, Vec3::splat(150.0));
    }

    #[test]
    fn configure_material_rules() {
        let mut standard = Material::default();
        configure_material(&mut standard);
        assert_eq!((standard.metalness, standard.roughness), (0.1, 0.8));

        let mut basic = Material {
            kind: MaterialKind::Basic,
            color: Some(Vec3::new(1.0, 0.0, 0.0)),
            opacity: Some(0.5),
            transparent: true,
            ..Material::default()
        };
        configure_material(&mut basic);
        assert_eq!(basic.kind, MaterialKind::Lambert);
        assert_eq!(basic.color, Some(Vec3::new(1.0, 0.0, 0.0)));
        assert_eq!(basic.opacity, Some(0.5));
        assert!(basic.transparent);

        let mut other = Material {
            kind: MaterialKind::Other,
            color: None,
            opacity: None,
            ..Material::default()
        };
        configure_material(&mut other);
        assert_eq!(other.kind, MaterialKind::Lambert);
        assert_eq!(other.color, Some(Vec3::ONE));
        assert_eq!(other.opacity, Some(1.0));
    }

    #[test]
    fn placeholder_replaces_current_model() {
        let mut manager = ModelManager::new(Config::default().models);
        let result = manager.load_placeholder();
        assert!(result.animations.is_empty());
        assert_eq!(manager.current_model().map(|m| m.asset.triangle_count()), Some(12));
    }
}

//! Application controller: owns the scene and every manager, drives one
//! frame per `animate` call.

use std::path::Path;
use std::time::{Duration, Instant};

use glam::Vec3;
use tracing::{error, info, warn};

use crate::animation::{AnimationInfo, AnimationManager, AnimationSwitch};
use crate::ascii::AsciiManager;
use crate::camera::{Clock, OrbitControls, PerspectiveCamera};
use crate::config::{Config, Theme};
use crate::constants::ANIMATION_MAX_DELTA;
use crate::error::{ModelError, RenderError};
use crate::lighting::{LightIntensities, LightName, LightingManager};
use crate::math::clamp_range;
use crate::models::{LoadResult, ModelManager};
use crate::render::SceneRenderer;
use crate::utils::Debouncer;

/// Outcome of a background model load, for the UI to report.
#[derive(Debug)]
pub enum LoadEvent {
    Loaded {
        name: String,
        file_name: Option<String>,
        animations: usize,
    },
    Failed {
        error: ModelError,
        /// The placeholder cube is shown instead
        placeholder: bool,
    },
}

pub struct App {
    config: Config,
    camera: PerspectiveCamera,
    controls: OrbitControls,
    clock: Clock,
    lighting: LightingManager,
    models: ModelManager,
    animation: AnimationManager,
    ascii: AsciiManager,
    renderer: SceneRenderer,
    resize: Debouncer<(usize, usize)>,
    running: bool,
    render_error: Option<RenderError>,
    has_loaded: bool,
    theme: Theme,
}

impl App {
    /// Builds the scene for a viewport of `cols` x `rows` cells.
    pub fn new(config: Config, viewport: (usize, usize)) -> Self {
        let ascii = AsciiManager::new(&config.ascii, viewport);
        let (width, height) = ascii.raster_size();
        let mut renderer = SceneRenderer::default();
        if let Err(err) = renderer.set_size(width, height) {
            warn!("{}", err);
        }

        let mut camera = PerspectiveCamera::new(&config.camera, renderer.aspect());
        camera.look_at(Vec3::ZERO);
        let controls = OrbitControls::new(&camera, &config.camera, &config.rotation);

        let mut app = Self {
            lighting: LightingManager::new(config.lighting.presets.clone()),
            models: ModelManager::new(config.models.clone()),
            animation: AnimationManager::new(config.animation.default_speed),
            resize: Debouncer::new(Duration::from_millis(config.ui.resize_debounce_ms)),
            theme: config.ui.theme,
            camera,
            controls,
            clock: Clock::new(),
            ascii,
            renderer,
            running: true,
            render_error: None,
            has_loaded: false,
            config,
        };
        app.set_theme(app.theme);
        app
    }

    /// Starts loading `model`, or the first library model.
    pub fn initialize(&mut self, model: Option<&str>) -> Result<(), ModelError> {
        let name = match model {
            Some(name) => name.to_string(),
            None => self
                .models
                .library()
                .first()
                .map(|e| e.name.clone())
                .ok_or_else(|| ModelError::UnknownModel(String::new()))?,
        };
        info!("Initializing with model {}", name);
        match self.models.load_model(&name) {
            Ok(_) => Ok(()),
            Err(err) => {
                self.show_placeholder();
                Err(err)
            }
        }
    }

    fn show_placeholder(&mut self) {
        let result = self.models.load_placeholder();
        self.animation.initialize(result.animations, None);
        self.has_loaded = true;
    }

    fn on_loaded(&mut self, result: LoadResult) -> LoadEvent {
        let count = result.animations.len();
        self.animation
            .initialize(result.animations, result.preferred_animation.as_deref());
        self.camera.look_at(Vec3::ZERO);
        self.has_loaded = true;
        LoadEvent::Loaded {
            name: result.name,
            file_name: result.file_name,
            animations: count,
        }
    }

    fn on_load_result(&mut self, result: Result<LoadResult, ModelError>) -> LoadEvent {
        match result {
            Ok(result) => self.on_loaded(result),
            Err(error) => {
                let placeholder = !self.has_loaded;
                if placeholder {
                    self.show_placeholder();
                }
                LoadEvent::Failed { error, placeholder }
            }
        }
    }

    /// Applies settled resizes and finished loads.
    pub fn update(&mut self, now: Instant) -> Option<LoadEvent> {
        if let Some((cols, rows)) = self.resize.poll(now) {
            self.apply_resize(cols, rows);
        }
        let result = self.models.poll()?;
        Some(self.on_load_result(result))
    }

    /// Blocks until the pending load finishes or `timeout` passes.
    pub fn wait_for_load(&mut self, timeout: Duration) -> Option<LoadEvent> {
        let result = self.models.wait(timeout)?;
        Some(self.on_load_result(result))
    }

    /// Runs one frame using the clock.
    pub fn animate(&mut self) {
        let delta = self.clock.get_delta();
        self.animate_with_delta(delta);
    }

    /// Runs one frame of `raw_delta` seconds: animation, controls, render.
    pub fn animate_with_delta(&mut self, raw_delta: f32) {
        if !self.running {
            return;
        }
        let delta = raw_delta.min(ANIMATION_MAX_DELTA);

        if let Some(model) = self.models.current_model_mut() {
            self.animation.update(delta, &mut model.pose);
        }
        self.controls.update(&mut self.camera, delta);

        match self
            .renderer
            .render(self.models.current_model(), &self.camera, &self.lighting)
        {
            Ok(()) => self.ascii.render(self.renderer.buffer()),
            Err(err) => self.handle_render_error(err),
        }
    }

    /// Stops the frame loop until `reload`.
    pub fn handle_render_error(&mut self, err: RenderError) {
        error!("Render error: {}", err);
        self.running = false;
        self.render_error = Some(err);
    }

    /// Restarts the frame loop and reloads the current library model.
    pub fn reload(&mut self) -> Result<(), ModelError> {
        info!("Reloading after render error");
        self.running = true;
        self.render_error = None;
        self.clock.start();
        self.clock.get_delta();
        let name = self.models.current_model_name().to_string();
        self.models.load_model(&name).map(|_| ())
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn render_error(&self) -> Option<&RenderError> {
        self.render_error.as_ref()
    }

    /// Queues a viewport change; applied once resizing settles.
    pub fn on_window_resize(&mut self, cols: usize, rows: usize, now: Instant) {
        self.resize.call((cols, rows), now);
    }

    fn apply_resize(&mut self, cols: usize, rows: usize) {
        info!("Viewport resized to {}x{}", cols, rows);
        self.ascii.set_viewport(cols, rows);
        self.sync_raster_size();
    }

    fn sync_raster_size(&mut self) {
        let (width, height) = self.ascii.raster_size();
        match self.renderer.set_size(width, height) {
            Ok(()) => self.camera.aspect = self.renderer.aspect(),
            Err(err) => self.handle_render_error(err),
        }
    }

    /// Pauses the clock while unfocused; resuming discards the gap.
    pub fn on_focus_change(&mut self, focused: bool, now: Instant) {
        if focused {
            self.clock.start_at(now);
        } else {
            self.clock.stop();
        }
    }

    /// Starts loading the next library model and returns its name.
    pub fn switch_model(&mut self) -> Result<String, ModelError> {
        self.models.switch_to_next()
    }

    pub fn load_model_from_file(&mut self, path: &Path) -> Result<(), ModelError> {
        self.models.load_model_from_file(path).map(|_| ())
    }

    pub fn is_loading(&self) -> bool {
        self.models.is_loading()
    }

    /// Starts the next clip. Nodes the old clip moved return to rest first.
    pub fn switch_animation(&mut self) -> Option<AnimationSwitch> {
        let switch = self.animation.switch_to_next()?;
        if let Some(model) = self.models.current_model_mut() {
            model.reset_pose();
        }
        Some(switch)
    }

    pub fn animation_info(&self) -> AnimationInfo {
        self.animation.info()
    }

    pub fn animation_time(&self) -> Option<f32> {
        self.animation.current_time()
    }

    pub fn set_ascii_density(&mut self, scale: f32) {
        let a = &self.config.ascii;
        self.ascii
            .set_scale(clamp_range(scale, a.min_scale, a.max_scale));
        self.sync_raster_size();
    }

    pub fn ascii_density(&self) -> f32 {
        self.ascii.scale_factor()
    }

    pub fn update_ascii_characters(&mut self, chars: &str) {
        self.ascii.update_characters(chars);
    }

    pub fn set_animation_speed(&mut self, speed: f32) {
        let a = &self.config.animation;
        self.animation
            .set_speed(clamp_range(speed, a.min_speed, a.max_speed));
    }

    pub fn animation_speed(&self) -> f32 {
        self.animation.speed()
    }

    pub fn toggle_auto_rotation(&mut self) -> bool {
        self.controls.auto_rotate = !self.controls.auto_rotate;
        self.controls.auto_rotate
    }

    pub fn set_rotation_speed(&mut self, speed: f32) {
        let r = &self.config.rotation;
        self.controls.auto_rotate_speed = clamp_range(speed, r.min_speed, r.max_speed);
    }

    pub fn rotation_speed(&self) -> f32 {
        self.controls.auto_rotate_speed
    }

    pub fn auto_rotate(&self) -> bool {
        self.controls.auto_rotate
    }

    pub fn set_camera_distance(&mut self, distance: f32) {
        self.controls.set_distance(&mut self.camera, distance);
    }

    pub fn camera_distance(&self) -> f32 {
        self.camera.distance()
    }

    pub fn rotate_by_drag(&mut self, dx: f32, dy: f32) {
        let rows = self.ascii.viewport().1.min(u16::MAX as usize) as u16;
        self.controls.rotate_by_drag(dx, dy, rows);
    }

    /// Wheel zoom; `zoom_in` moves the camera closer.
    pub fn zoom(&mut self, zoom_in: bool) {
        if zoom_in {
            self.controls.dolly_in();
        } else {
            self.controls.dolly_out();
        }
    }

    /// Restores the camera, density, and lighting defaults.
    pub fn reset_camera(&mut self) {
        self.controls.reset(&mut self.camera);
        self.set_ascii_density(self.config.ascii.default_scale);
        self.lighting.set_preset(crate::constants::DEFAULT_PRESET);
    }

    pub fn set_lighting_preset(&mut self, preset: &str) -> bool {
        self.lighting.set_preset(preset)
    }

    pub fn set_light_intensity(&mut self, light: LightName, intensity: f32) {
        use crate::constants::{LIGHT_INTENSITY_MAX, LIGHT_INTENSITY_MIN};
        self.lighting.set_intensity(
            light,
            clamp_range(intensity, LIGHT_INTENSITY_MIN, LIGHT_INTENSITY_MAX),
        );
    }

    pub fn light_intensities(&self) -> LightIntensities {
        self.lighting.intensities()
    }

    pub fn preset_names(&self) -> Vec<String> {
        self.lighting.preset_names().map(str::to_string).collect()
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.theme = theme;
        self.ascii.set_theme(theme);
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn ascii(&self) -> &AsciiManager {
        &self.ascii
    }

    pub fn ascii_text(&self) -> String {
        self.ascii.text()
    }

    /// Name of the model on screen, or of the library entry being loaded.
    pub fn current_model_name(&self) -> &str {
        match self.models.current_model() {
            Some(model) => &model.name,
            None => self.models.current_model_name(),
        }
    }

    /// Triangle count of the model on screen, if any.
    pub fn triangle_count(&self) -> Option<usize> {
        self.models.current_model().map(|m| m.asset.triangle_count())
    }

    /// Triangles that survived culling in the last frame.
    pub fn triangles_drawn(&self) -> usize {
        self.renderer.triangles_drawn()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn app() -> App {
        App::new(Config::default(), (40, 20))
    }

    fn app_with_cube() -> App {
        let mut app = app();
        app.show_placeholder();
        app
    }

    /// Moves node 0 from the origin to x = 5 over one second.
    fn slide_clip(name: &str) -> crate::animation::AnimationClip {
        use crate::animation::{AnimationClip, Interpolation, Track, TrackValues};
        AnimationClip::new(
            name,
            vec![Track {
                node: 0,
                interpolation: Interpolation::Linear,
                times: vec![0.0, 1.0],
                values: TrackValues::Translation(vec![Vec3::ZERO, Vec3::new(5.0, 0.0, 0.0)]),
            }],
        )
    }

    #[test]
    fn placeholder_renders_visible_art() {
        let mut app = app_with_cube();
        app.animate_with_delta(0.016);
        let text = app.ascii_text();
        assert!(text.chars().any(|c| c != ' ' && c != '\n'));
    }

    #[test]
    fn empty_scene_renders_only_spaces() {
        let mut app = app();
        app.animate_with_delta(0.016);
        let text = app.ascii_text();
        assert!(!text.is_empty());
        assert!(text.chars().all(|c| c == ' ' || c == '\n'));
    }

    #[test]
    fn failed_initial_load_shows_placeholder() {
        let mut app = app();
        let err = app.initialize(Some("dragon")).unwrap_err();
        assert!(matches!(err, ModelError::UnknownModel(_)));
        assert_eq!(app.triangle_count(), Some(12));
    }

    #[test]
    fn missing_library_file_falls_back_to_placeholder() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.models.library[0].path = dir.path().join("nope.glb");
        let mut app = App::new(config, (20, 10));
        app.initialize(None).unwrap();

        match app.wait_for_load(Duration::from_secs(5)) {
            Some(LoadEvent::Failed { placeholder, .. }) => assert!(placeholder),
            other => panic!("expected a failed load, got {other:?}"),
        }
        assert_eq!(app.triangle_count(), Some(12));
    }

    #[test]
    fn render_error_stops_loop_until_reload() {
        let mut app = app_with_cube();
        app.handle_render_error(RenderError::NonFiniteTransform(0));
        assert!(!app.is_running());
        assert!(app.render_error().is_some());

        // Reload restarts the loop even though the library file is missing
        let _ = app.reload();
        assert!(app.is_running());
        assert!(app.render_error().is_none());
    }

    #[test]
    fn resize_is_debounced() {
        let mut app = app();
        let start = Instant::now();
        app.on_window_resize(100, 30, start);
        app.update(start + Duration::from_millis(100));
        assert_eq!(app.ascii().viewport(), (40, 20));
        app.update(start + Duration::from_millis(260));
        assert_eq!(app.ascii().viewport(), (100, 30));
        assert_eq!(app.ascii().grid_size(), (120, 36));
    }

    #[test]
    fn reset_camera_restores_defaults() {
        let mut app = app();
        app.set_ascii_density(2.5);
        app.set_lighting_preset("dramatic");
        app.set_camera_distance(2000.0);
        app.reset_camera();

        assert_eq!(app.ascii_density(), 1.2);
        assert_eq!(app.light_intensities(), LightIntensities::new(10.0, 0.1, 10.0, 10.0, 3.0));
        let expected = Vec3::from(Config::default().camera.default_position).length();
        assert!((app.camera_distance() - expected).abs() < 1.0);
    }

    #[test]
    fn focus_loss_pauses_the_clock() {
        let mut app = app_with_cube();
        let lost = Instant::now();
        app.clock.delta_at(lost);
        app.on_focus_change(false, lost);
        assert_eq!(app.clock.delta_at(lost + Duration::from_secs(30)), 0.0);

        // Regaining focus a minute later resumes from that moment
        let regained = lost + Duration::from_secs(60);
        app.on_focus_change(true, regained);
        let delta = app.clock.delta_at(regained + Duration::from_millis(16));
        assert!((delta - 0.016).abs() < 1e-4);
    }

    #[test]
    fn focus_regain_advances_animation_by_one_frame_at_most() {
        let mut app = app_with_cube();
        app.animation.initialize(vec![slide_clip("walk")], None);
        app.on_focus_change(false, Instant::now());
        std::thread::sleep(Duration::from_millis(50));
        app.animate();
        assert_eq!(app.animation_time(), Some(0.0));

        app.on_focus_change(true, Instant::now());
        app.animate();
        let time = app.animation_time().unwrap();
        assert!(time <= ANIMATION_MAX_DELTA * app.animation_speed() + 1e-6);
    }

    #[test]
    fn switching_clips_restores_rest_pose() {
        use crate::animation::{AnimationClip, Interpolation, Track, TrackValues};

        let mut app = app_with_cube();
        let grow = AnimationClip::new(
            "grow",
            vec![Track {
                node: 0,
                interpolation: Interpolation::Linear,
                times: vec![0.0, 1.0],
                values: TrackValues::Scale(vec![Vec3::ONE, Vec3::splat(2.0)]),
            }],
        );
        app.animation.initialize(vec![slide_clip("slide"), grow], None);
        app.animate_with_delta(0.03);
        let pose = |app: &App| app.models.current_model().unwrap().pose[0];
        assert!(pose(&app).translation.x > 0.0);

        let switch = app.switch_animation().unwrap();
        assert_eq!(switch.name, "grow");
        assert_eq!(pose(&app).translation, Vec3::ZERO);

        // The scale-only clip leaves translation at rest
        app.animate_with_delta(0.03);
        assert_eq!(pose(&app).translation, Vec3::ZERO);
        assert!(pose(&app).scale.x > 1.0);
    }

    #[test]
    fn toggle_auto_rotation_flips() {
        let mut app = app();
        assert!(app.auto_rotate());
        assert!(!app.toggle_auto_rotation());
        assert!(app.toggle_auto_rotation());
    }

    #[test]
    fn theme_reaches_ascii_style() {
        let mut app = app();
        app.set_theme(Theme::Light);
        assert_eq!(app.ascii().style().background, crossterm::style::Color::White);
    }

    proptest! {
        #[test]
        fn setters_clamp(value in -100.0f32..100.0) {
            let mut app = app();
            app.set_ascii_density(value);
            app.set_animation_speed(value);
            app.set_rotation_speed(value);
            app.set_light_intensity(LightName::Red, value);

            prop_assert!((0.5..=3.0).contains(&app.ascii_density()));
            prop_assert!((0.1..=3.0).contains(&app.animation_speed()));
            prop_assert!((0.0..=2.0).contains(&app.rotation_speed()));
            prop_assert!((0.0..=20.0).contains(&app.light_intensities().red));
        }
    }
}

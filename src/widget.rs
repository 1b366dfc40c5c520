use std::io::Write;
use std::path::Path;
use std::time::{Duration, Instant};

use crossterm::event::{
    Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::style::Color;
use tracing::warn;

use crate::app::{App, LoadEvent};
use crate::export::{copy_to_clipboard, download_text};
use crate::lighting::LightName;
use crate::state::{InputMode, ViewerState};
use crate::term::{CellStyle, FrameBuffer};
use crate::ui::{
    animation_text, model_loaded_text, preset_applied_text, NotificationKind, UiManager,
    HELP_LINES, RENDER_ERROR_TEXT,
};
use crate::utils::capitalize;

/// Presets bound to the number keys, in order.
const PRESET_KEYS: [&str; 4] = ["studio", "dramatic", "natural", "minimal"];

const DENSITY_STEP: f32 = 0.1;
const SPEED_STEP: f32 = 0.1;
const DISTANCE_STEP: f32 = crate::constants::CAMERA_DISTANCE_STEP;

/// Rounds slider-like values to one decimal so repeated steps don't drift.
fn step(value: f32, delta: f32) -> f32 {
    ((value + delta) * 10.0).round() / 10.0
}

/// ASCII viewer widget: binds terminal input to the app and paints the HUD.
pub struct ViewerWidget {
    frames_since_last_update: usize,
    last_fps_calculation: Instant,
    fps: f64,
    /// Is the user currently dragging for rotation?
    dragging_rotation: bool,
    /// Last mouse position
    last_mouse_pos: (u16, u16),
    /// Terminal size
    size: (u16, u16),
    ui: UiManager,
}

impl ViewerWidget {
    pub fn new(size: (u16, u16), notification_duration: Duration, message_duration: Duration) -> Self {
        ViewerWidget {
            frames_since_last_update: 0,
            last_fps_calculation: Instant::now(),
            fps: 0.0,
            dragging_rotation: false,
            last_mouse_pos: (0, 0),
            size,
            ui: UiManager::new(notification_duration, message_duration),
        }
    }

    /// Viewport for a terminal of `size`: everything above the status line.
    pub fn viewport(size: (u16, u16)) -> (usize, usize) {
        (size.0.max(1) as usize, size.1.saturating_sub(1).max(1) as usize)
    }

    /// Terminal size in cells, as of the last resize event.
    pub fn size(&self) -> (u16, u16) {
        self.size
    }

    pub fn ui(&self) -> &UiManager {
        &self.ui
    }

    /// Advances one frame: settles loads and resizes, expires overlays,
    /// then animates and renders.
    pub fn tick(&mut self, app: &mut App, now: Instant) {
        if let Some(event) = app.update(now) {
            self.on_load_event(event, app, now);
        }
        self.ui.prune(now);
        app.animate();
    }

    /// Reports a finished load.
    pub fn on_load_event(&mut self, event: LoadEvent, app: &App, now: Instant) {
        match event {
            LoadEvent::Loaded {
                name,
                file_name,
                animations,
            } => {
                let text = match file_name {
                    Some(file) => format!("Loaded {file}"),
                    None => model_loaded_text(&name),
                };
                self.ui.show_notification(text, NotificationKind::Success, now);
                if animations > 0 {
                    let info = app.animation_info();
                    if let Some(current) = info.current_name {
                        self.ui
                            .show_message(animation_text(&current, info.current_index, info.count), now);
                    }
                }
            }
            LoadEvent::Failed { error, placeholder } => {
                self.ui.show_notification(
                    format!("Failed to load model: {error}"),
                    NotificationKind::Error,
                    now,
                );
                if placeholder {
                    self.ui
                        .show_notification("Showing placeholder cube", NotificationKind::Warning, now);
                }
            }
        }
    }

    /// Handles one terminal event. `clipboard` receives OSC 52 sequences.
    pub fn event<W: Write>(
        &mut self,
        event: &Event,
        app: &mut App,
        state: &mut ViewerState,
        clipboard: &mut W,
        now: Instant,
    ) {
        match event {
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                self.key(key, app, state, clipboard, now);
            }
            Event::Mouse(mouse) => self.mouse(mouse, app, now),
            Event::Paste(text) => {
                if let Some(buffer) = state.input_mode.buffer_mut() {
                    buffer.extend(text.chars().filter(|c| !c.is_control()));
                }
            }
            Event::Resize(cols, rows) => {
                self.size = (*cols, *rows);
                let (cols, rows) = Self::viewport(self.size);
                app.on_window_resize(cols, rows, now);
            }
            Event::FocusGained => app.on_focus_change(true, now),
            Event::FocusLost => {
                self.dragging_rotation = false;
                app.on_focus_change(false, now);
            }
            _ => {}
        }
    }

    fn key<W: Write>(
        &mut self,
        key: &KeyEvent,
        app: &mut App,
        state: &mut ViewerState,
        clipboard: &mut W,
        now: Instant,
    ) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            state.quit = true;
            return;
        }

        if state.input_mode != InputMode::Normal {
            self.input_key(key, app, state, now);
            return;
        }

        if state.help_visible {
            if matches!(
                key.code,
                KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q' | 'h' | '?')
            ) {
                state.help_visible = false;
            }
            return;
        }

        let KeyCode::Char(ch) = key.code else {
            let distance = app.camera_distance();
            match key.code {
                KeyCode::Esc => state.quit = true,
                KeyCode::PageUp => self.set_distance(app, distance - DISTANCE_STEP, now),
                KeyCode::PageDown => self.set_distance(app, distance + DISTANCE_STEP, now),
                _ => {}
            }
            return;
        };

        match ch {
            'q' => state.quit = true,
            'n' => match app.switch_model() {
                Ok(name) => self.ui.show_message(format!("Loading {name}..."), now),
                Err(err) => {
                    self.ui
                        .show_notification(err.to_string(), NotificationKind::Error, now)
                }
            },
            'a' => self.switch_animation(app, now),
            '+' | '=' => {
                app.set_ascii_density(step(app.ascii_density(), DENSITY_STEP));
                self.ui
                    .show_message(format!("ASCII density: {:.1}", app.ascii_density()), now);
            }
            '-' | '_' => {
                app.set_ascii_density(step(app.ascii_density(), -DENSITY_STEP));
                self.ui
                    .show_message(format!("ASCII density: {:.1}", app.ascii_density()), now);
            }
            '>' | '.' => {
                app.set_animation_speed(step(app.animation_speed(), SPEED_STEP));
                self.ui
                    .show_message(format!("Animation speed: {:.1}x", app.animation_speed()), now);
            }
            '<' | ',' => {
                app.set_animation_speed(step(app.animation_speed(), -SPEED_STEP));
                self.ui
                    .show_message(format!("Animation speed: {:.1}x", app.animation_speed()), now);
            }
            '}' => {
                app.set_rotation_speed(step(app.rotation_speed(), SPEED_STEP));
                self.ui
                    .show_message(format!("Rotation speed: {:.1}", app.rotation_speed()), now);
            }
            '{' => {
                app.set_rotation_speed(step(app.rotation_speed(), -SPEED_STEP));
                self.ui
                    .show_message(format!("Rotation speed: {:.1}", app.rotation_speed()), now);
            }
            ' ' => {
                let on = app.toggle_auto_rotation();
                let text = if on { "Auto rotation on" } else { "Auto rotation off" };
                self.ui.show_notification(text, NotificationKind::Info, now);
            }
            'r' => {
                if app.render_error().is_some() {
                    if let Err(err) = app.reload() {
                        self.ui
                            .show_notification(err.to_string(), NotificationKind::Error, now);
                    }
                } else {
                    app.reset_camera();
                    state.active_preset = Some(crate::constants::DEFAULT_PRESET.to_string());
                    self.ui.show_notification("Camera reset", NotificationKind::Info, now);
                }
            }
            '1'..='4' => {
                let preset = PRESET_KEYS[(ch as u8 - b'1') as usize];
                if app.set_lighting_preset(preset) {
                    state.active_preset = Some(preset.to_string());
                    self.ui.show_notification(
                        preset_applied_text(preset),
                        NotificationKind::Success,
                        now,
                    );
                } else {
                    warn!("Preset {} is not configured", preset);
                    self.ui.show_notification(
                        format!("Unknown preset: {preset}"),
                        NotificationKind::Warning,
                        now,
                    );
                }
            }
            'l' => {
                state.selected_light = state.selected_light.next();
                self.show_light(app, state.selected_light, now);
            }
            '[' | ']' => {
                let light = state.selected_light;
                let delta = if ch == ']' { light.step() } else { -light.step() };
                app.set_light_intensity(light, app.light_intensities().get(light) + delta);
                state.active_preset = None;
                self.show_light(app, light, now);
            }
            'c' => state.input_mode = InputMode::Characters(String::new()),
            'x' => {
                app.update_ascii_characters("");
                self.ui
                    .show_notification("Reset to default characters", NotificationKind::Info, now);
            }
            'o' => state.input_mode = InputMode::FilePath(String::new()),
            'y' => match copy_to_clipboard(clipboard, &app.ascii_text()) {
                Ok(()) => self.ui.show_notification(
                    "ASCII art copied to clipboard!",
                    NotificationKind::Success,
                    now,
                ),
                Err(err) => {
                    warn!("Clipboard write failed: {}", err);
                    self.ui.show_notification(
                        "Failed to copy to clipboard",
                        NotificationKind::Error,
                        now,
                    );
                }
            },
            's' => {
                let dir = app.config().ui.export_dir.clone();
                match download_text(&dir, app.current_model_name(), &app.ascii_text()) {
                    Ok(_) => self.ui.show_notification(
                        "ASCII art downloaded!",
                        NotificationKind::Success,
                        now,
                    ),
                    Err(err) => self.ui.show_notification(
                        format!("Download failed: {err}"),
                        NotificationKind::Error,
                        now,
                    ),
                }
            }
            't' => {
                state.theme = state.theme.toggled();
                app.set_theme(state.theme);
            }
            'd' => state.debug = !state.debug,
            'h' | '?' => state.help_visible = true,
            _ => {}
        }
    }

    fn input_key(&mut self, key: &KeyEvent, app: &mut App, state: &mut ViewerState, now: Instant) {
        match key.code {
            KeyCode::Esc => state.input_mode = InputMode::Normal,
            KeyCode::Backspace => {
                if let Some(buffer) = state.input_mode.buffer_mut() {
                    buffer.pop();
                }
            }
            KeyCode::Char(c) => {
                if let Some(buffer) = state.input_mode.buffer_mut() {
                    buffer.push(c);
                }
            }
            KeyCode::Enter => match std::mem::take(&mut state.input_mode) {
                InputMode::Characters(chars) => {
                    app.update_ascii_characters(&chars);
                    let (text, kind) = if chars.trim().is_empty() {
                        ("Reset to default characters", NotificationKind::Info)
                    } else {
                        ("Custom characters applied!", NotificationKind::Success)
                    };
                    self.ui.show_notification(text, kind, now);
                }
                InputMode::FilePath(path) => self.open_file(app, path.trim(), now),
                InputMode::Normal => {}
            },
            _ => {}
        }
    }

    fn open_file(&mut self, app: &mut App, path: &str, now: Instant) {
        if path.is_empty() {
            return;
        }
        let path = Path::new(path);
        match app.load_model_from_file(path) {
            Ok(()) => {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                self.ui
                    .show_notification(format!("Selected file: {name}"), NotificationKind::Info, now);
            }
            Err(err) => self
                .ui
                .show_notification(err.to_string(), NotificationKind::Error, now),
        }
    }

    fn mouse(&mut self, mouse: &MouseEvent, app: &mut App, now: Instant) {
        let pos = (mouse.column, mouse.row);
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                self.dragging_rotation = true;
                self.last_mouse_pos = pos;
            }
            MouseEventKind::Drag(MouseButton::Left) if self.dragging_rotation => {
                let dx = pos.0 as f32 - self.last_mouse_pos.0 as f32;
                let dy = pos.1 as f32 - self.last_mouse_pos.1 as f32;
                app.rotate_by_drag(dx, dy);
                self.last_mouse_pos = pos;
            }
            MouseEventKind::Up(MouseButton::Left) => self.dragging_rotation = false,
            MouseEventKind::Down(MouseButton::Right) => self.switch_animation(app, now),
            MouseEventKind::ScrollUp => app.zoom(true),
            MouseEventKind::ScrollDown => app.zoom(false),
            _ => {}
        }
    }

    fn switch_animation(&mut self, app: &mut App, now: Instant) {
        match app.switch_animation() {
            Some(switch) => self
                .ui
                .show_message(animation_text(&switch.name, switch.index, switch.total), now),
            None => self
                .ui
                .show_notification("No animations available", NotificationKind::Info, now),
        }
    }

    fn set_distance(&mut self, app: &mut App, distance: f32, now: Instant) {
        app.set_camera_distance(distance);
        self.ui
            .show_message(format!("Camera distance: {:.0}", app.camera_distance()), now);
    }

    fn show_light(&mut self, app: &App, light: LightName, now: Instant) {
        let value = app.light_intensities().get(light);
        self.ui.show_message(
            format!(
                "Light: {} ({:.*})",
                light.as_str(),
                light.decimals(),
                value
            ),
            now,
        );
    }

    /// Paints the art and every overlay into `fb`.
    pub fn paint(&mut self, fb: &mut FrameBuffer, app: &App, state: &ViewerState, now: Instant) {
        // Update FPS calculation
        self.frames_since_last_update += 1;
        let duration = now.saturating_duration_since(self.last_fps_calculation);
        if duration.as_secs_f64() >= 1.0 {
            self.fps = self.frames_since_last_update as f64 / duration.as_secs_f64();
            self.frames_since_last_update = 0;
            self.last_fps_calculation = now;
        }

        let art = app.ascii().style();
        let base = CellStyle::new(art.foreground, art.background);
        fb.clear(base);

        for (y, line) in app.ascii().visible_lines().iter().enumerate() {
            if y as u16 >= fb.height().saturating_sub(1) {
                break;
            }
            fb.put_str(0, y as u16, line, base);
        }

        self.paint_status(fb, app, state, base);
        if state.debug {
            self.paint_debug(fb, app, state, base);
        }
        self.paint_notifications(fb);
        if let Some(message) = self.ui.message() {
            let x = fb.width().saturating_sub(message.chars().count() as u16 + 2) / 2;
            fb.put_str(x, 1, &format!(" {message} "), base.reversed());
        }
        if state.help_visible {
            paint_box(fb, HELP_LINES, base.reversed());
        }
        if app.render_error().is_some() {
            let style = CellStyle::new(Color::White, Color::DarkRed).bold();
            paint_box(fb, &[RENDER_ERROR_TEXT], style);
        }
    }

    fn paint_status(&self, fb: &mut FrameBuffer, app: &App, state: &ViewerState, base: CellStyle) {
        let y = fb.height().saturating_sub(1);
        let style = base.reversed();
        fb.fill_rect(0, y, fb.width(), 1, style);

        if let Some((label, buffer)) = state.input_mode.prompt() {
            let x = fb.put_str(0, y, &format!(" {label}: {buffer}"), style.bold());
            fb.put_str(x, y, "_", style);
            return;
        }

        let info = app.animation_info();
        let animation = match info.current_name {
            Some(name) if info.has_animations => {
                format!("{} ({}/{})", name, info.current_index + 1, info.count)
            }
            _ => "No animation".to_string(),
        };
        let mut status = format!(
            " {} | {} | Density {:.1}",
            capitalize(app.current_model_name()),
            animation,
            app.ascii_density()
        );
        if app.is_loading() {
            status.push_str(" | Loading...");
        }
        fb.put_str(0, y, &status, style);

        let hint = "h help  q quit ";
        let x = fb.width().saturating_sub(hint.len() as u16);
        if x as usize > status.chars().count() {
            fb.put_str(x, y, hint, style);
        }
    }

    fn paint_debug(&self, fb: &mut FrameBuffer, app: &App, state: &ViewerState, base: CellStyle) {
        let info = app.animation_info();
        let lights = app.light_intensities();
        let (cols, rows) = app.ascii().grid_size();
        let lines = [
            format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
            format!(
                "Model: {} ({} triangles, {} drawn)",
                app.current_model_name(),
                app.triangle_count().unwrap_or(0),
                app.triangles_drawn()
            ),
            format!(
                "Animation: {} t={:.2}s x{:.1}",
                info.current_name.as_deref().unwrap_or("-"),
                app.animation_time().unwrap_or(0.0),
                app.animation_speed()
            ),
            format!("FPS: {:.2}", self.fps),
            format!("Scale: {:.1} grid {}x{}", app.ascii_density(), cols, rows),
            format!(
                "Camera: {:.0} auto {} x{:.1}",
                app.camera_distance(),
                if app.auto_rotate() { "on" } else { "off" },
                app.rotation_speed()
            ),
            format!(
                "Lights: main {:.1} amb {:.2} red {:.1} blue {:.1} spot {:.1}",
                lights.main, lights.ambient, lights.red, lights.blue, lights.spotlight
            ),
            format!(
                "Preset: {}  selected: {}",
                state.active_preset.as_deref().unwrap_or("custom"),
                state.selected_light.as_str()
            ),
        ];
        for (y, line) in lines.iter().enumerate() {
            fb.put_str(0, y as u16, line, base.bold());
        }
    }

    fn paint_notifications(&self, fb: &mut FrameBuffer) {
        for (i, notification) in self.ui.notifications().enumerate() {
            let text = format!(" {} ", notification.message);
            let x = fb.width().saturating_sub(text.chars().count() as u16);
            let style = CellStyle::new(Color::White, notification.kind.color());
            fb.put_str(x, i as u16, &text, style);
        }
    }
}

/// Draws `lines` in a bordered box centered on the screen.
fn paint_box(fb: &mut FrameBuffer, lines: &[&str], style: CellStyle) {
    let inner = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0) as u16 + 2;
    let width = (inner + 2).min(fb.width());
    let height = (lines.len() as u16 + 2).min(fb.height());
    let x = (fb.width() - width) / 2;
    let y = (fb.height() - height) / 2;

    fb.fill_rect(x, y, width, height, style);
    let horizontal = "─".repeat(width.saturating_sub(2) as usize);
    fb.put_str(x, y, &format!("┌{horizontal}┐"), style);
    fb.put_str(x, y + height.saturating_sub(1), &format!("└{horizontal}┘"), style);
    for row in 1..height.saturating_sub(1) {
        fb.put_str(x, y + row, "│", style);
        fb.put_str((x + width).saturating_sub(1), y + row, "│", style);
        if let Some(line) = lines.get(row as usize - 1) {
            fb.put_str(x + 2, y + row, line, style);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, Theme};

    fn setup() -> (ViewerWidget, App, ViewerState) {
        let widget = ViewerWidget::new(
            (40, 21),
            Duration::from_millis(3000),
            Duration::from_millis(5000),
        );
        let app = App::new(Config::default(), ViewerWidget::viewport((40, 21)));
        (widget, app, ViewerState::default())
    }

    fn press(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn send(
        widget: &mut ViewerWidget,
        app: &mut App,
        state: &mut ViewerState,
        events: &[Event],
    ) -> Vec<u8> {
        let mut clipboard = Vec::new();
        for event in events {
            widget.event(event, app, state, &mut clipboard, Instant::now());
        }
        clipboard
    }

    #[test]
    fn viewport_reserves_status_line() {
        assert_eq!(ViewerWidget::viewport((80, 24)), (80, 23));
        assert_eq!(ViewerWidget::viewport((0, 0)), (1, 1));
    }

    #[test]
    fn theme_and_debug_toggle() {
        let (mut widget, mut app, mut state) = setup();
        send(
            &mut widget,
            &mut app,
            &mut state,
            &[press(KeyCode::Char('t')), press(KeyCode::Char('d'))],
        );
        assert_eq!(state.theme, Theme::Light);
        assert_eq!(app.theme(), Theme::Light);
        assert!(state.debug);
    }

    #[test]
    fn density_keys_step_by_tenths() {
        let (mut widget, mut app, mut state) = setup();
        send(&mut widget, &mut app, &mut state, &[press(KeyCode::Char('+'))]);
        assert_eq!(app.ascii_density(), 1.3);
        let events = vec![press(KeyCode::Char('-')); 20];
        send(&mut widget, &mut app, &mut state, &events);
        assert_eq!(app.ascii_density(), 0.5);
        assert_eq!(widget.ui().message(), Some("ASCII density: 0.5"));
    }

    #[test]
    fn copy_writes_osc52_and_notifies() {
        let (mut widget, mut app, mut state) = setup();
        app.animate_with_delta(0.0);
        let out = send(&mut widget, &mut app, &mut state, &[press(KeyCode::Char('y'))]);
        assert!(out.starts_with(b"\x1b]52;c;"));
        let first = widget.ui().notifications().next().map(|n| n.kind);
        assert_eq!(first, Some(NotificationKind::Success));
    }

    #[test]
    fn custom_characters_are_typed_and_applied() {
        let (mut widget, mut app, mut state) = setup();
        let default = app.ascii().characters();
        send(
            &mut widget,
            &mut app,
            &mut state,
            &[
                press(KeyCode::Char('c')),
                press(KeyCode::Char('a')),
                press(KeyCode::Char('q')),
                press(KeyCode::Backspace),
                press(KeyCode::Char('b')),
            ],
        );
        assert_eq!(state.input_mode, InputMode::Characters("ab".to_string()));
        assert!(!state.quit);

        send(&mut widget, &mut app, &mut state, &[press(KeyCode::Enter)]);
        assert_eq!(state.input_mode, InputMode::Normal);
        assert_ne!(app.ascii().characters(), default);

        send(&mut widget, &mut app, &mut state, &[press(KeyCode::Char('x'))]);
        assert_eq!(app.ascii().characters(), default);
    }

    #[test]
    fn escape_cancels_input_without_quitting() {
        let (mut widget, mut app, mut state) = setup();
        send(
            &mut widget,
            &mut app,
            &mut state,
            &[press(KeyCode::Char('o')), press(KeyCode::Esc)],
        );
        assert_eq!(state.input_mode, InputMode::Normal);
        assert!(!state.quit);
    }

    #[test]
    fn bad_file_path_reports_error() {
        let (mut widget, mut app, mut state) = setup();
        let mut events = vec![press(KeyCode::Char('o'))];
        events.extend("model.obj".chars().map(|c| press(KeyCode::Char(c))));
        events.push(press(KeyCode::Enter));
        send(&mut widget, &mut app, &mut state, &events);

        let kinds: Vec<_> = widget.ui().notifications().map(|n| n.kind).collect();
        assert_eq!(kinds, vec![NotificationKind::Error]);
    }

    #[test]
    fn help_overlay_swallows_quit() {
        let (mut widget, mut app, mut state) = setup();
        send(
            &mut widget,
            &mut app,
            &mut state,
            &[press(KeyCode::Char('h')), press(KeyCode::Char('q'))],
        );
        assert!(!state.help_visible);
        assert!(!state.quit);
        send(&mut widget, &mut app, &mut state, &[press(KeyCode::Char('q'))]);
        assert!(state.quit);
    }

    #[test]
    fn light_adjustment_clears_preset() {
        let (mut widget, mut app, mut state) = setup();
        send(
            &mut widget,
            &mut app,
            &mut state,
            &[
                press(KeyCode::Char('2')),
                press(KeyCode::Char('l')),
                press(KeyCode::Char(']')),
            ],
        );
        assert_eq!(state.selected_light, LightName::Ambient);
        assert_eq!(state.active_preset, None);
        assert!((app.light_intensities().ambient - 0.10).abs() < 1e-4);
    }

    #[test]
    fn number_keys_apply_presets() {
        let (mut widget, mut app, mut state) = setup();
        send(&mut widget, &mut app, &mut state, &[press(KeyCode::Char('4'))]);
        assert_eq!(state.active_preset.as_deref(), Some("minimal"));
        assert_eq!(app.light_intensities().red, 0.0);
        let first = widget.ui().notifications().next().map(|n| n.message.clone());
        assert_eq!(first.as_deref(), Some("Minimal lighting applied"));
    }

    #[test]
    fn resize_event_reaches_app_after_debounce() {
        let (mut widget, mut app, mut state) = setup();
        let start = Instant::now();
        let mut sink = Vec::new();
        widget.event(&Event::Resize(60, 31), &mut app, &mut state, &mut sink, start);
        app.update(start + Duration::from_millis(300));
        assert_eq!(app.ascii().viewport(), (60, 30));
    }

    #[test]
    fn paint_shows_status_and_art() {
        let (mut widget, mut app, state) = setup();
        app.initialize(Some("missing")).unwrap_err();
        app.animate_with_delta(0.016);

        let mut fb = FrameBuffer::new(40, 21);
        widget.paint(&mut fb, &app, &state, Instant::now());
        assert!(fb.row_text(20).starts_with(" Placeholder | No animation | Density 1.2"));
        let art: String = (0..20).map(|y| fb.row_text(y)).collect();
        assert!(art.chars().any(|c| c != ' '));
    }

    #[test]
    fn boxes_fit_zero_width_terminal() {
        let (mut widget, mut app, mut state) = setup();
        state.help_visible = true;
        app.handle_render_error(crate::error::RenderError::NonFiniteTransform(0));
        let mut fb = FrameBuffer::new(0, 21);
        widget.paint(&mut fb, &app, &state, Instant::now());
        assert_eq!(fb.row_text(10), "");
    }

    #[test]
    fn paint_shows_render_error_box() {
        let (mut widget, mut app, state) = setup();
        app.handle_render_error(crate::error::RenderError::NonFiniteTransform(0));
        let mut fb = FrameBuffer::new(60, 21);
        widget.paint(&mut fb, &app, &state, Instant::now());
        let all: String = (0..21).map(|y| fb.row_text(y)).collect::<Vec<_>>().join("\n");
        assert!(all.contains(RENDER_ERROR_TEXT));
    }
}

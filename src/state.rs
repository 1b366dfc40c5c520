use crate::config::Theme;
use crate::lighting::LightName;

/// What typed characters are currently feeding.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum InputMode {
    #[default]
    Normal,
    /// Editing a custom character palette
    Characters(String),
    /// Editing a model file path
    FilePath(String),
}

impl InputMode {
    pub fn buffer_mut(&mut self) -> Option<&mut String> {
        match self {
            InputMode::Normal => None,
            InputMode::Characters(buffer) | InputMode::FilePath(buffer) => Some(buffer),
        }
    }

    pub fn prompt(&self) -> Option<(&'static str, &str)> {
        match self {
            InputMode::Normal => None,
            InputMode::Characters(buffer) => Some(("Characters", buffer)),
            InputMode::FilePath(buffer) => Some(("Open file", buffer)),
        }
    }
}

/// Viewer state
#[derive(Debug, Clone, PartialEq)]
pub struct ViewerState {
    pub theme: Theme,
    /// Enable debug HUD
    pub debug: bool,
    pub input_mode: InputMode,
    /// Light adjusted by `[` and `]`
    pub selected_light: LightName,
    pub help_visible: bool,
    /// Preset last applied, cleared when a light is adjusted by hand
    pub active_preset: Option<String>,
    pub quit: bool,
}

impl ViewerState {
    pub fn new(theme: Theme, debug: bool) -> Self {
        Self {
            theme,
            debug,
            input_mode: InputMode::Normal,
            selected_light: LightName::Main,
            help_visible: false,
            active_preset: None,
            quit: false,
        }
    }
}

impl Default for ViewerState {
    fn default() -> Self {
        Self::new(Theme::Dark, false)
    }
}

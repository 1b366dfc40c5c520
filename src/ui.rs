//! Notifications, transient messages, and help text.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crossterm::style::Color;

use crate::utils::capitalize;

/// Most notifications shown at once; older ones are dropped first.
const MAX_NOTIFICATIONS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
    Info,
    Warning,
}

impl NotificationKind {
    pub fn color(self) -> Color {
        match self {
            NotificationKind::Success => Color::Rgb { r: 56, g: 161, b: 105 },
            NotificationKind::Error => Color::Rgb { r: 229, g: 62, b: 62 },
            NotificationKind::Info => Color::Rgb { r: 49, g: 130, b: 206 },
            NotificationKind::Warning => Color::Rgb { r: 221, g: 107, b: 32 },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub message: String,
    pub kind: NotificationKind,
    expires: Instant,
}

/// Timed overlays: corner notifications and a single centered message.
#[derive(Debug, Clone)]
pub struct UiManager {
    notification_duration: Duration,
    message_duration: Duration,
    notifications: VecDeque<Notification>,
    message: Option<(String, Instant)>,
}

impl UiManager {
    pub fn new(notification_duration: Duration, message_duration: Duration) -> Self {
        Self {
            notification_duration,
            message_duration,
            notifications: VecDeque::new(),
            message: None,
        }
    }

    pub fn show_notification(&mut self, message: impl Into<String>, kind: NotificationKind, now: Instant) {
        let message = message.into();
        tracing::debug!("Notification ({:?}): {}", kind, message);
        if self.notifications.len() == MAX_NOTIFICATIONS {
            self.notifications.pop_front();
        }
        self.notifications.push_back(Notification {
            message,
            kind,
            expires: now + self.notification_duration,
        });
    }

    /// Replaces the current message.
    pub fn show_message(&mut self, message: impl Into<String>, now: Instant) {
        self.message = Some((message.into(), now + self.message_duration));
    }

    /// Drops expired overlays.
    pub fn prune(&mut self, now: Instant) {
        self.notifications.retain(|n| n.expires > now);
        if matches!(&self.message, Some((_, expires)) if *expires <= now) {
            self.message = None;
        }
    }

    pub fn notifications(&self) -> impl Iterator<Item = &Notification> {
        self.notifications.iter()
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_ref().map(|(m, _)| m.as_str())
    }
}

pub fn model_loaded_text(name: &str) -> String {
    format!("Loaded {name} model")
}

pub fn preset_applied_text(preset: &str) -> String {
    format!("{} lighting applied", capitalize(preset))
}

pub fn animation_text(name: &str, index: usize, total: usize) -> String {
    format!("Animation: {} ({}/{})", name, index + 1, total)
}

pub const RENDER_ERROR_TEXT: &str = "Rendering Error - press R to reload";

pub const HELP_LINES: &[&str] = &[
    "How to Use ASCII Animator",
    "",
    "Mouse",
    "  Left drag         rotate view",
    "  Right click       change animation",
    "  Scroll            zoom in/out",
    "",
    "Model & animation",
    "  n                 next model",
    "  o                 open a .glb/.gltf file",
    "  a                 next animation",
    "  < >               animation speed",
    "",
    "Camera",
    "  space             start/stop rotation",
    "  { }               rotation speed",
    "  PgUp PgDn         camera distance",
    "  r                 reset camera",
    "",
    "Look",
    "  - +               ASCII density (lower = faster)",
    "  c / x             custom / default characters",
    "  t                 toggle theme",
    "  1 2 3 4           studio, dramatic, natural, minimal",
    "  l then [ ]        pick a light, adjust it",
    "",
    "Export",
    "  y                 copy to clipboard",
    "  s                 save to a text file",
    "",
    "  d debug   h help   q quit",
];

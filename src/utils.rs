use std::path::Path;
use std::time::{Duration, Instant};

/// Trailing-edge debouncer: only the last value passed to `call` is
/// delivered, once `wait` has elapsed with no further calls.
#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    wait: Duration,
    pending: Option<(T, Instant)>,
}

impl<T> Debouncer<T> {
    pub fn new(wait: Duration) -> Self {
        Self {
            wait,
            pending: None,
        }
    }

    /// Replaces any pending value and restarts the wait.
    pub fn call(&mut self, value: T, now: Instant) {
        self.pending = Some((value, now));
    }

    /// Returns the pending value once it has settled.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        match &self.pending {
            Some((_, at)) if now.saturating_duration_since(*at) >= self.wait => {
                self.pending.take().map(|(value, _)| value)
            }
            _ => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

/// True if `size` bytes fits within `max_size_mb` mebibytes (inclusive).
pub fn validate_file_size(size: u64, max_size_mb: u64) -> bool {
    size <= max_size_mb.saturating_mul(1024 * 1024)
}

/// True if the file name ends with one of `allowed` (e.g. `.glb`),
/// ignoring case.
pub fn validate_file_extension<S: AsRef<str>>(path: &Path, allowed: &[S]) -> bool {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    allowed
        .iter()
        .any(|ext| name.ends_with(&ext.as_ref().to_lowercase()))
}

pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

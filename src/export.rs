//! Text export: clipboard through OSC 52 and plain-text files.

use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use crossterm::{Command, ExecutableCommand};
use tracing::info;

/// Sets the system clipboard through the terminal (OSC 52).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyToClipboard(pub String);

impl Command for CopyToClipboard {
    fn write_ansi(&self, f: &mut impl fmt::Write) -> fmt::Result {
        write!(f, "\x1b]52;c;{}\x07", STANDARD.encode(self.0.as_bytes()))
    }

    #[cfg(windows)]
    fn execute_winapi(&self) -> io::Result<()> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "OSC 52 requires an ANSI terminal",
        ))
    }
}

pub fn copy_to_clipboard<W: Write>(out: &mut W, text: &str) -> io::Result<()> {
    out.execute(CopyToClipboard(text.to_string()))?;
    info!("Copied {} bytes to clipboard", text.len());
    Ok(())
}

/// `ascii-art-<model>-<unix ms>.txt`
pub fn download_file_name(model: &str, timestamp_ms: u128) -> String {
    format!("ascii-art-{model}-{timestamp_ms}.txt")
}

fn now_ms() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default()
}

/// Writes `text` to a timestamped file in `dir` and returns its path.
pub fn download_text(dir: &Path, model: &str, text: &str) -> io::Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(download_file_name(model, now_ms()));
    fs::write(&path, text)?;
    info!("Saved ASCII art to {}", path.display());
    Ok(path)
}

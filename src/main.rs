use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::{self, Event};
use tracing::{error, info, warn};

use ascii_animator::logging::setup_logging;
use ascii_animator::state::ViewerState;
use ascii_animator::term::{terminal_size, FrameBuffer, TerminalRenderer};
use ascii_animator::widget::ViewerWidget;
use ascii_animator::{App, Config, LoadEvent, ModelError, Theme};

/// How long a headless snapshot waits for the model to load
const SNAPSHOT_LOAD_TIMEOUT: Duration = Duration::from_secs(60);
const SNAPSHOT_FRAME_SECONDS: f32 = 1.0 / 60.0;

/// Animated glTF viewer rendered as ASCII art
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// YAML config file; defaults are used when it does not exist
    #[arg(short, long, default_value = "ascii-animator.yaml")]
    config: PathBuf,

    /// Library model to show first
    #[arg(short, long)]
    model: Option<String>,

    /// Load a .glb/.gltf file instead of a library model
    #[arg(short, long, conflicts_with = "model")]
    file: Option<PathBuf>,

    /// Custom characters, darkest first
    #[arg(long)]
    chars: Option<String>,

    /// ASCII density (scale factor)
    #[arg(long)]
    density: Option<f32>,

    #[arg(long, value_enum)]
    theme: Option<Theme>,

    /// Lighting preset applied at startup
    #[arg(long)]
    preset: Option<String>,

    #[arg(long, default_value = "logs")]
    log_dir: PathBuf,

    /// Enable debug logging and the debug HUD
    #[arg(short, long)]
    debug: bool,

    /// Render headless and write the art to this file ("-" for stdout)
    #[arg(long)]
    snapshot: Option<PathBuf>,

    /// Snapshot size in cells
    #[arg(long, value_parser = parse_size, default_value = "80x24")]
    size: (u16, u16),

    /// Animation time of the snapshot, in seconds
    #[arg(long, default_value_t = 0.0)]
    time: f32,
}

fn parse_size(s: &str) -> Result<(u16, u16), String> {
    let (cols, rows) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected COLSxROWS, got {s:?}"))?;
    let cols: u16 = cols.trim().parse().map_err(|e| format!("bad column count: {e}"))?;
    let rows: u16 = rows.trim().parse().map_err(|e| format!("bad row count: {e}"))?;
    if cols == 0 || rows == 0 {
        return Err("size must be at least 1x1".to_string());
    }
    Ok((cols, rows))
}

/// Builds the app with the command line overrides applied.
fn build_app(mut config: Config, cli: &Cli, viewport: (usize, usize)) -> App {
    if let Some(theme) = cli.theme {
        config.ui.theme = theme;
    }
    let mut app = App::new(config, viewport);

    if let Some(density) = cli.density {
        app.set_ascii_density(density);
    }
    if let Some(chars) = &cli.chars {
        app.update_ascii_characters(chars);
    }
    if let Some(preset) = &cli.preset {
        if !app.set_lighting_preset(preset) {
            warn!("Unknown lighting preset {:?}, keeping default", preset);
        }
    }
    app
}

/// Starts the first load: the file if given, else the library model.
fn start_loading(app: &mut App, cli: &Cli) -> Result<(), ModelError> {
    if let Some(path) = &cli.file {
        match app.load_model_from_file(path) {
            Ok(()) => return Ok(()),
            Err(err) => {
                error!("Cannot open {}: {}", path.display(), err);
                app.initialize(cli.model.as_deref())?;
                return Err(err);
            }
        }
    }
    app.initialize(cli.model.as_deref())
}

fn snapshot(config: Config, cli: &Cli, out: &Path) -> Result<()> {
    let viewport = (cli.size.0 as usize, cli.size.1 as usize);
    let mut app = build_app(config, cli, viewport);

    if let Err(err) = start_loading(&mut app, cli) {
        warn!("{}", err);
    }
    if app.is_loading() {
        match app.wait_for_load(SNAPSHOT_LOAD_TIMEOUT) {
            Some(LoadEvent::Failed { error, .. }) => warn!("{}", error),
            Some(_) => {}
            None => warn!("Timed out waiting for the model"),
        }
    }

    let frames = ((cli.time.max(0.0) / SNAPSHOT_FRAME_SECONDS).round() as usize).max(1);
    for _ in 0..frames {
        app.animate_with_delta(SNAPSHOT_FRAME_SECONDS);
    }
    if let Some(err) = app.render_error() {
        anyhow::bail!("Rendering failed: {err}");
    }

    let mut text = app.ascii_text();
    text.push('\n');
    if out == Path::new("-") {
        print!("{text}");
    } else {
        fs::write(out, text).with_context(|| format!("Failed to write {}", out.display()))?;
        info!("Wrote snapshot to {}", out.display());
    }
    Ok(())
}

fn interactive(config: Config, cli: &Cli) -> Result<()> {
    let size = terminal_size();
    let frame = Duration::from_millis(config.ui.frame_interval_ms.max(1));
    let mut widget = ViewerWidget::new(
        size,
        Duration::from_millis(config.ui.notification_duration_ms),
        Duration::from_millis(config.ui.message_duration_ms),
    );
    let mut state = ViewerState::new(cli.theme.unwrap_or(config.ui.theme), cli.debug);
    let mut app = build_app(config, cli, ViewerWidget::viewport(size));

    if let Err(err) = start_loading(&mut app, cli) {
        widget.on_load_event(
            LoadEvent::Failed {
                error: err,
                placeholder: !app.is_loading(),
            },
            &app,
            Instant::now(),
        );
    }

    let mut term = TerminalRenderer::stdout();
    term.enter()?;

    let result = run(&mut term, &mut app, &mut widget, &mut state, frame);

    // Always try to restore terminal state.
    let _ = term.exit();
    result
}

fn run(
    term: &mut TerminalRenderer,
    app: &mut App,
    widget: &mut ViewerWidget,
    state: &mut ViewerState,
    frame: Duration,
) -> Result<()> {
    let (w, h) = widget.size();
    let mut fb = FrameBuffer::new(w, h);

    loop {
        let frame_start = Instant::now();
        widget.tick(app, frame_start);

        let (w, h) = widget.size();
        fb.resize(w, h);
        widget.paint(&mut fb, app, state, frame_start);
        term.draw_swap(&mut fb)?;

        // Input until the next frame is due.
        let deadline = frame_start + frame;
        while event::poll(deadline.saturating_duration_since(Instant::now()))? {
            let event = event::read()?;
            if matches!(event, Event::Resize(..)) {
                term.invalidate();
            }
            widget.event(&event, app, state, term.writer(), Instant::now());
            if state.quit {
                info!("Quit requested");
                return Ok(());
            }
        }
    }
}

/// Main function
fn main() -> Result<()> {
    let cli = Cli::parse();
    let _guard = setup_logging(&cli.log_dir, "ascii-animator", cli.debug)?;
    info!("Starting {} v{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    let config = Config::load(&cli.config).context("Failed to load configuration")?;

    let result = match &cli.snapshot {
        Some(out) => snapshot(config, &cli, out),
        None => interactive(config, &cli),
    };
    if let Err(err) = &result {
        error!("{:#}", err);
    }
    info!("Shutdown complete");
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_parses_cols_by_rows() {
        assert_eq!(parse_size("120x40"), Ok((120, 40)));
        assert_eq!(parse_size("80X24"), Ok((80, 24)));
        assert!(parse_size("80").is_err());
        assert!(parse_size("0x10").is_err());
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn cli_overrides_reach_app() {
        let cli = Cli::parse_from([
            "ascii-animator",
            "--density",
            "9",
            "--theme",
            "light",
            "--preset",
            "natural",
        ]);
        let app = build_app(Config::default(), &cli, (40, 20));
        assert_eq!(app.ascii_density(), 3.0);
        assert_eq!(app.theme(), Theme::Light);
        assert_eq!(app.light_intensities().ambient, 0.6);
    }
}

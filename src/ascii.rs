//! Luminance-to-character conversion and density scaling.
//!
//! The scene is rendered onto a character grid `scale` times the size of the
//! visible area. A scale above 1 packs more, smaller characters into the
//! view; the grid is then mapped back onto the terminal through the inverse
//! scale so it always fills exactly the visible area.

use crossterm::style::Color;
use tracing::debug;

use crate::config::{AsciiConfig, Theme};
use crate::constants::{ASCII_CUSTOM_TARGET_LENGTH, SUBPIXELS_X, SUBPIXELS_Y};
use crate::graphics::RasterBuffer;
use crate::math::{brightness, clamp_range};

/// Foreground and background of the art.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AsciiStyle {
    pub foreground: Color,
    pub background: Color,
}

impl AsciiStyle {
    pub fn for_theme(theme: Theme) -> Self {
        match theme {
            Theme::Dark => Self {
                foreground: Color::White,
                background: Color::Black,
            },
            Theme::Light => Self {
                foreground: Color::Black,
                background: Color::White,
            },
        }
    }
}

/// Builds a dark-to-bright palette from user text.
///
/// Blank input yields `None` (use the defaults). Short inputs get extra
/// gradations and everything is repeated up to a minimum length so the
/// brightness mapping stays smooth.
pub fn build_palette(custom: &str) -> Option<String> {
    let user_text = custom.trim();
    if user_text.is_empty() {
        return None;
    }

    let mut chars = if user_text.chars().count() < 3 {
        format!("    .{}{}", user_text, user_text.to_uppercase())
    } else {
        format!("   {user_text}")
    };

    let len = chars.chars().count();
    if len < ASCII_CUSTOM_TARGET_LENGTH {
        chars = chars.repeat(ASCII_CUSTOM_TARGET_LENGTH.div_ceil(len));
    }
    Some(chars)
}

/// Index into a palette of `len` characters for brightness `b`. Dark maps to
/// the start of the palette.
pub fn char_index(b: f32, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    let b = clamp_range(b, 0.0, 1.0);
    let from_bright = ((1.0 - b) * (len - 1) as f32).floor() as usize;
    len - 1 - from_bright.min(len - 1)
}

pub struct AsciiManager {
    scale_factor: f32,
    min_scale: f32,
    max_scale: f32,
    default_chars: String,
    chars: Vec<char>,
    style: AsciiStyle,
    viewport: (usize, usize),
    grid: (usize, usize),
    /// Per grid cell, row-major
    brightness: Vec<f32>,
    rendered: bool,
}

impl AsciiManager {
    pub fn new(config: &AsciiConfig, viewport: (usize, usize)) -> Self {
        let default_chars: String = config.default_chars.chars().take(config.base_density).collect();
        let mut manager = Self {
            scale_factor: config.default_scale,
            min_scale: config.min_scale,
            max_scale: config.max_scale,
            chars: default_chars.chars().collect(),
            default_chars,
            style: AsciiStyle::for_theme(Theme::Light),
            viewport,
            grid: (1, 1),
            brightness: Vec::new(),
            rendered: false,
        };
        manager.update_scale();
        manager
    }

    pub fn scale_factor(&self) -> f32 {
        self.scale_factor
    }

    /// Sets the density, clamped to the configured range.
    pub fn set_scale(&mut self, factor: f32) {
        self.scale_factor = clamp_range(factor, self.min_scale, self.max_scale);
        self.update_scale();
    }

    pub fn set_viewport(&mut self, cols: usize, rows: usize) {
        self.viewport = (cols, rows);
        self.update_scale();
    }

    pub fn viewport(&self) -> (usize, usize) {
        self.viewport
    }

    /// Recomputes the grid from the viewport and scale.
    pub fn update_scale(&mut self) {
        let cols = ((self.viewport.0 as f32 * self.scale_factor).round() as usize).max(1);
        let rows = ((self.viewport.1 as f32 * self.scale_factor).round() as usize).max(1);
        if (cols, rows) != self.grid {
            debug!(
                "ASCII grid {}x{} for viewport {}x{} at scale {:.1}",
                cols, rows, self.viewport.0, self.viewport.1, self.scale_factor
            );
            self.grid = (cols, rows);
            self.brightness.clear();
            self.rendered = false;
        }
    }

    /// `(cols, rows)` of the character grid.
    pub fn grid_size(&self) -> (usize, usize) {
        self.grid
    }

    /// Sub-pixel size the scene should be rendered at.
    pub fn raster_size(&self) -> (usize, usize) {
        (self.grid.0 * SUBPIXELS_X, self.grid.1 * SUBPIXELS_Y)
    }

    /// Replaces the palette; blank input restores the defaults.
    pub fn update_characters(&mut self, custom: &str) {
        let chars = build_palette(custom).unwrap_or_else(|| self.default_chars.clone());
        debug!("Palette set to {} characters", chars.chars().count());
        self.chars = chars.chars().collect();
    }

    pub fn characters(&self) -> String {
        self.chars.iter().collect()
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.style = AsciiStyle::for_theme(theme);
    }

    pub fn style(&self) -> AsciiStyle {
        self.style
    }

    /// Samples the rendered image into per-cell brightness.
    pub fn render(&mut self, image: &RasterBuffer) {
        let (cols, rows) = self.grid;
        self.brightness.clear();
        self.brightness.reserve(cols * rows);
        self.rendered = true;

        let (width, height) = (image.width(), image.height());
        if width == 0 || height == 0 {
            self.brightness.resize(cols * rows, 0.0);
            return;
        }

        for row in 0..rows {
            let y0 = row * height / rows;
            let y1 = ((row + 1) * height / rows).max(y0 + 1).min(height);
            for col in 0..cols {
                let x0 = col * width / cols;
                let x1 = ((col + 1) * width / cols).max(x0 + 1).min(width);
                let mut sum = 0.0;
                for y in y0..y1 {
                    for x in x0..x1 {
                        sum += brightness(image.pixel(x, y));
                    }
                }
                let count = ((y1 - y0) * (x1 - x0)).max(1);
                self.brightness.push(sum / count as f32);
            }
        }
    }

    fn glyph(&self, b: f32) -> char {
        self.chars
            .get(char_index(b, self.chars.len()))
            .copied()
            .unwrap_or(' ')
    }

    /// Rows of the full-density grid.
    pub fn lines(&self) -> Vec<String> {
        if !self.rendered {
            return Vec::new();
        }
        self.brightness
            .chunks(self.grid.0.max(1))
            .map(|row| row.iter().map(|&b| self.glyph(b)).collect())
            .collect()
    }

    /// The art as plain text, rows joined with newlines. Empty before the
    /// first render.
    pub fn text(&self) -> String {
        self.lines().join("\n")
    }

    /// The grid mapped onto the visible area through the inverse scale.
    /// Denser grids are box-averaged, sparser ones sampled nearest.
    pub fn visible_lines(&self) -> Vec<String> {
        let (view_cols, view_rows) = self.viewport;
        let (cols, rows) = self.grid;
        if !self.rendered || self.brightness.len() != cols * rows {
            return vec![" ".repeat(view_cols); view_rows];
        }

        let span = |i: usize, from: usize, to: usize| -> (usize, usize) {
            let start = i * to / from;
            let end = ((i + 1) * to / from).max(start + 1).min(to);
            (start.min(to - 1), end)
        };

        (0..view_rows)
            .map(|vr| {
                (0..view_cols)
                    .map(|vc| {
                        let b = if self.scale_factor > 1.0 {
                            let (r0, r1) = span(vr, view_rows, rows);
                            let (c0, c1) = span(vc, view_cols, cols);
                            let mut sum = 0.0;
                            for r in r0..r1 {
                                for c in c0..c1 {
                                    sum += self.brightness[r * cols + c];
                                }
                            }
                            sum / ((r1 - r0) * (c1 - c0)).max(1) as f32
                        } else {
                            let r = ((vr * 2 + 1) * rows / (view_rows * 2)).min(rows - 1);
                            let c = ((vc * 2 + 1) * cols / (view_cols * 2)).min(cols - 1);
                            self.brightness[r * cols + c]
                        };
                        self.glyph(b)
                    })
                    .collect()
            })
            .collect()
    }
}

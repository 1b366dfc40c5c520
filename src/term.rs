//! Cell framebuffer and the crossterm renderer that flushes it.

use std::io::{self, Write};

use anyhow::{Context, Result};
use crossterm::{
    cursor,
    event::{
        DisableBracketedPaste, DisableFocusChange, DisableMouseCapture, EnableBracketedPaste,
        EnableFocusChange, EnableMouseCapture,
    },
    style::{
        Attribute, Color, Print, ResetColor, SetAttribute, SetBackgroundColor, SetForegroundColor,
    },
    terminal, QueueableCommand,
};
use tracing::debug;

/// Per-cell styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellStyle {
    pub fg: Color,
    pub bg: Color,
    pub bold: bool,
    pub reverse: bool,
}

impl CellStyle {
    pub const fn new(fg: Color, bg: Color) -> Self {
        Self {
            fg,
            bg,
            bold: false,
            reverse: false,
        }
    }

    pub const fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub const fn reversed(mut self) -> Self {
        self.reverse = true;
        self
    }
}

impl Default for CellStyle {
    fn default() -> Self {
        Self::new(Color::White, Color::Black)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub ch: char,
    pub style: CellStyle,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            ch: ' ',
            style: CellStyle::default(),
        }
    }
}

/// 2D framebuffer of styled character cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    width: u16,
    height: u16,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    pub fn new(width: u16, height: u16) -> Self {
        let len = (width as usize) * (height as usize);
        Self {
            width,
            height,
            cells: vec![Cell::default(); len],
        }
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    pub fn resize(&mut self, width: u16, height: u16) {
        if self.width == width && self.height == height {
            return;
        }
        self.width = width;
        self.height = height;
        self.cells = vec![Cell::default(); (width as usize) * (height as usize)];
    }

    fn idx(&self, x: u16, y: u16) -> Option<usize> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some((y as usize) * (self.width as usize) + (x as usize))
    }

    pub fn get(&self, x: u16, y: u16) -> Option<Cell> {
        self.idx(x, y).map(|i| self.cells[i])
    }

    pub fn set(&mut self, x: u16, y: u16, cell: Cell) {
        if let Some(i) = self.idx(x, y) {
            self.cells[i] = cell;
        }
    }

    pub fn clear(&mut self, style: CellStyle) {
        self.cells.fill(Cell { ch: ' ', style });
    }

    /// Writes `s` from `(x, y)`, clipped at the right edge. Returns the
    /// column after the last character written.
    pub fn put_str(&mut self, x: u16, y: u16, s: &str, style: CellStyle) -> u16 {
        let mut cx = x;
        for ch in s.chars() {
            if cx >= self.width {
                break;
            }
            self.set(cx, y, Cell { ch, style });
            cx += 1;
        }
        cx
    }

    pub fn fill_rect(&mut self, x: u16, y: u16, w: u16, h: u16, style: CellStyle) {
        for dy in 0..h {
            for dx in 0..w {
                self.set(x.saturating_add(dx), y.saturating_add(dy), Cell { ch: ' ', style });
            }
        }
    }

    /// Characters of row `y`, without styling.
    pub fn row_text(&self, y: u16) -> String {
        (0..self.width)
            .filter_map(|x| self.get(x, y).map(|c| c.ch))
            .collect()
    }
}

/// Flushes framebuffers to a terminal, redrawing only changed runs.
pub struct TerminalRenderer<W: Write = io::Stdout> {
    out: W,
    last: Option<FrameBuffer>,
}

impl TerminalRenderer<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> TerminalRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out, last: None }
    }

    pub fn enter(&mut self) -> Result<()> {
        terminal::enable_raw_mode().context("Failed to enable raw mode")?;
        self.out.queue(terminal::EnterAlternateScreen)?;
        self.out.queue(cursor::Hide)?;
        self.out.queue(terminal::DisableLineWrap)?;
        self.out.queue(EnableMouseCapture)?;
        self.out.queue(EnableFocusChange)?;
        self.out.queue(EnableBracketedPaste)?;
        self.out.flush()?;
        debug!("Entered alternate screen");
        Ok(())
    }

    pub fn exit(&mut self) -> Result<()> {
        self.out.queue(DisableBracketedPaste)?;
        self.out.queue(DisableFocusChange)?;
        self.out.queue(DisableMouseCapture)?;
        self.out.queue(ResetColor)?;
        self.out.queue(SetAttribute(Attribute::Reset))?;
        self.out.queue(terminal::EnableLineWrap)?;
        self.out.queue(cursor::Show)?;
        self.out.queue(terminal::LeaveAlternateScreen)?;
        self.out.flush()?;
        terminal::disable_raw_mode().context("Failed to disable raw mode")?;
        debug!("Left alternate screen");
        Ok(())
    }

    /// Forces the next draw to be a full redraw.
    pub fn invalidate(&mut self) {
        self.last = None;
    }

    /// Direct access to the output, for out-of-band escape sequences.
    pub fn writer(&mut self) -> &mut W {
        &mut self.out
    }

    /// Draws `fb`, then swaps it with the previous frame so the caller can
    /// reuse the allocation.
    pub fn draw_swap(&mut self, fb: &mut FrameBuffer) -> Result<()> {
        let mut prev = match self.last.take() {
            Some(prev) if prev.width() == fb.width() && prev.height() == fb.height() => {
                self.diff_redraw(fb, &prev)?;
                prev
            }
            _ => {
                self.full_redraw(fb)?;
                FrameBuffer::new(fb.width(), fb.height())
            }
        };

        std::mem::swap(&mut prev, fb);
        self.last = Some(prev);
        Ok(())
    }

    fn full_redraw(&mut self, fb: &FrameBuffer) -> Result<()> {
        self.out.queue(terminal::Clear(terminal::ClearType::All))?;
        self.out.queue(cursor::MoveTo(0, 0))?;

        let mut current_style: Option<CellStyle> = None;
        for y in 0..fb.height() {
            self.out.queue(cursor::MoveTo(0, y))?;
            for x in 0..fb.width() {
                let cell = fb.get(x, y).unwrap_or_default();
                if current_style != Some(cell.style) {
                    self.apply_style(cell.style)?;
                    current_style = Some(cell.style);
                }
                self.out.queue(Print(cell.ch))?;
            }
        }

        self.out.queue(ResetColor)?;
        self.out.queue(SetAttribute(Attribute::Reset))?;
        self.out.flush()?;
        Ok(())
    }

    fn diff_redraw(&mut self, next: &FrameBuffer, prev: &FrameBuffer) -> Result<()> {
        let mut current_style: Option<CellStyle> = None;
        let mut runs = Vec::new();
        for_each_changed_run(prev, next, |x, y, len| runs.push((x, y, len)));

        for (x, y, len) in runs {
            self.out.queue(cursor::MoveTo(x, y))?;
            for dx in 0..len {
                let cell = next.get(x + dx, y).unwrap_or_default();
                if current_style != Some(cell.style) {
                    self.apply_style(cell.style)?;
                    current_style = Some(cell.style);
                }
                self.out.queue(Print(cell.ch))?;
            }
        }

        self.out.queue(ResetColor)?;
        self.out.queue(SetAttribute(Attribute::Reset))?;
        self.out.flush()?;
        Ok(())
    }

    fn apply_style(&mut self, style: CellStyle) -> Result<()> {
        self.out.queue(SetAttribute(Attribute::Reset))?;
        self.out.queue(SetForegroundColor(style.fg))?;
        self.out.queue(SetBackgroundColor(style.bg))?;
        if style.bold {
            self.out.queue(SetAttribute(Attribute::Bold))?;
        }
        if style.reverse {
            self.out.queue(SetAttribute(Attribute::Reverse))?;
        }
        Ok(())
    }
}

fn for_each_changed_run(prev: &FrameBuffer, next: &FrameBuffer, mut f: impl FnMut(u16, u16, u16)) {
    let w = next.width();
    for y in 0..next.height() {
        let mut x = 0;
        while x < w {
            if prev.get(x, y) == next.get(x, y) {
                x += 1;
                continue;
            }
            let start = x;
            x += 1;
            while x < w && prev.get(x, y) != next.get(x, y) {
                x += 1;
            }
            f(start, y, x - start);
        }
    }
}

/// Terminal size in cells, falling back to `termsize` and then 80x24.
pub fn terminal_size() -> (u16, u16) {
    if let Ok((cols, rows)) = terminal::size() {
        if cols > 0 && rows > 0 {
            return (cols, rows);
        }
    }
    match termsize::get() {
        Some(size) if size.cols > 0 && size.rows > 0 => (size.cols, size.rows),
        _ => (80, 24),
    }
}

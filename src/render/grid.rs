// ── Cell grid ─────────────────────────────────────────────────────────────────
//
// The host's drawing target: a row-major grid of character cells, each with
// its own colours.  A wide glyph occupies its cell plus continuation cells
// that are skipped when the grid is written to the terminal.

use std::io::Write;

use crossterm::{
    cursor::MoveTo,
    queue,
    style::{Attribute, Color, Print, SetAttribute, SetBackgroundColor, SetForegroundColor},
};
use unicode_width::UnicodeWidthChar;

/// A rectangle of cells in host coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

impl Rect {
    pub const fn new(x: u16, y: u16, width: u16, height: u16) -> Self {
        Self { x, y, width, height }
    }

    pub fn right(&self) -> u16 {
        self.x.saturating_add(self.width)
    }

    pub fn bottom(&self) -> u16 {
        self.y.saturating_add(self.height)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Placeholder stored in the cells covered by the right half of a wide glyph.
pub const CONTINUATION: char = '\0';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub ch: char,
    pub fg: Color,
    pub bg: Color,
    pub bold: bool,
}

impl Default for Cell {
    fn default() -> Self {
        Self { ch: ' ', fg: Color::Reset, bg: Color::Reset, bold: false }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellGrid {
    width: u16,
    height: u16,
    cells: Vec<Cell>,
}

impl CellGrid {
    pub fn new(width: u16, height: u16) -> Self {
        Self { width, height, cells: vec![Cell::default(); usize::from(width) * usize::from(height)] }
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(0, 0, self.width, self.height)
    }

    /// Resize, clearing every cell.
    pub fn resize(&mut self, width: u16, height: u16) {
        *self = Self::new(width, height);
    }

    fn index(&self, x: u16, y: u16) -> Option<usize> {
        (x < self.width && y < self.height)
            .then(|| usize::from(y) * usize::from(self.width) + usize::from(x))
    }

    pub fn get(&self, x: u16, y: u16) -> Option<&Cell> {
        self.index(x, y).map(|i| &self.cells[i])
    }

    pub fn set(&mut self, x: u16, y: u16, cell: Cell) {
        if let Some(i) = self.index(x, y) {
            self.cells[i] = cell;
        }
    }

    /// Blank every cell of `area` (clipped to the grid) with background `bg`.
    pub fn fill(&mut self, area: Rect, bg: Color) {
        for y in area.y..area.bottom().min(self.height) {
            for x in area.x..area.right().min(self.width) {
                self.set(x, y, Cell { ch: ' ', fg: Color::Reset, bg, bold: false });
            }
        }
    }

    /// Write `text` starting at `(x, y)`, not past column `limit`.  Returns the
    /// column after the last cell written.
    pub fn put_str(
        &mut self,
        mut x: u16,
        y: u16,
        limit: u16,
        text: &str,
        fg: Color,
        bg: Color,
        bold: bool,
    ) -> u16 {
        let limit = limit.min(self.width);
        for ch in text.chars() {
            let w = UnicodeWidthChar::width(ch).unwrap_or(1).max(1) as u16;
            if x.saturating_add(w) > limit {
                break;
            }
            self.set(x, y, Cell { ch, fg, bg, bold });
            for extra in 1..w {
                self.set(x + extra, y, Cell { ch: CONTINUATION, fg, bg, bold });
            }
            x += w;
        }
        x
    }

    /// The characters of row `y`, continuation cells omitted.
    pub fn row_text(&self, y: u16) -> String {
        (0..self.width)
            .filter_map(|x| self.get(x, y))
            .map(|c| c.ch)
            .filter(|&ch| ch != CONTINUATION)
            .collect()
    }

    /// Queue the cells of `area` for output, changing colours only between
    /// runs that differ.
    pub fn flush(&self, out: &mut impl Write, area: Rect) -> std::io::Result<()> {
        let mut current: Option<(Color, Color, bool)> = None;
        for y in area.y..area.bottom().min(self.height) {
            queue!(out, MoveTo(area.x, y))?;
            for x in area.x..area.right().min(self.width) {
                let Some(cell) = self.get(x, y) else { continue };
                if cell.ch == CONTINUATION {
                    continue;
                }
                let look = (cell.fg, cell.bg, cell.bold);
                if current != Some(look) {
                    let weight = if cell.bold { Attribute::Bold } else { Attribute::NormalIntensity };
                    queue!(
                        out,
                        SetAttribute(weight),
                        SetForegroundColor(cell.fg),
                        SetBackgroundColor(cell.bg)
                    )?;
                    current = Some(look);
                }
                queue!(out, Print(cell.ch))?;
            }
        }
        queue!(out, SetAttribute(Attribute::Reset))?;
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

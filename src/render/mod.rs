// ── Render bridge ─────────────────────────────────────────────────────────────
//
// Implements the engine's drawing contract over a `CellGrid`.  The engine is
// configured by the cell profile so that its coordinates are whole cells: x is
// a column, and one text line (ascent + descent + extra descent) is one row.
// Rectangles arrive relative to the view; the surface offsets and clips them
// to the view's area of the grid.

pub mod color;
pub mod grid;

use tracing::trace;

use crate::editor::{Command, EditorHandle, EngineColor, PRect, RunStyle, Surface};
pub use color::{from_engine, to_engine, ColorAttr};
pub use grid::{Cell, CellGrid, Rect};

/// Cell metrics reported to the engine.
pub const CELL_ASCENT: f64 = 1.0;
pub const CELL_DESCENT: f64 = 1.0;

// ── CellSurface ───────────────────────────────────────────────────────────────

/// A `Surface` drawing into `area` of a grid.
pub struct CellSurface<'g> {
    grid: &'g mut CellGrid,
    area: Rect,
}

impl<'g> CellSurface<'g> {
    pub fn new(grid: &'g mut CellGrid, area: Rect) -> Self {
        Self { grid, area }
    }

    /// Engine rectangle → clipped grid columns and rows.
    fn cells(&self, rc: PRect) -> Option<(u16, u16, u16, u16)> {
        let clamp = |v: f64, lo: u16, hi: u16| -> u16 {
            (f64::from(lo) + v.max(0.0)).floor().min(f64::from(hi)) as u16
        };
        let (right, bottom) = (self.area.right(), self.area.bottom());
        let x0 = clamp(rc.left, self.area.x, right);
        let x1 = clamp(rc.right, self.area.x, right);
        let y0 = clamp(rc.top, self.area.y, bottom);
        let y1 = clamp(rc.bottom, self.area.y, bottom);
        (x0 < x1 && y0 < y1).then_some((x0, x1, y0, y1))
    }
}

impl Surface for CellSurface<'_> {
    fn ascent(&self) -> f64 {
        CELL_ASCENT
    }

    fn descent(&self) -> f64 {
        CELL_DESCENT
    }

    fn fill_rect(&mut self, rc: PRect, back: EngineColor) {
        if let Some((x0, x1, y0, y1)) = self.cells(rc) {
            self.grid.fill(Rect::new(x0, y0, x1 - x0, y1 - y0), from_engine(back));
        }
    }

    fn draw_text(&mut self, rc: PRect, _ybase: f64, text: &str, style: RunStyle) {
        let Some((x0, x1, y0, _)) = self.cells(rc) else { return };
        let (fg, bg) = (from_engine(style.fore), from_engine(style.back));
        self.grid.put_str(x0, y0, x1, text, fg, bg, style.bold);
    }
}

/// Let the engine paint `area` (in view cells) into the view's part of `grid`.
pub fn paint(handle: &mut EditorHandle, grid: &mut CellGrid, view: Rect, area: PRect) {
    trace!(?area, "paint");
    let mut surface = CellSurface::new(grid, view);
    handle.send(Command::Paint { surface: &mut surface, area });
}

// ── Style colours in host terms ───────────────────────────────────────────────

pub fn set_style_color(handle: &mut EditorHandle, style: u8, attr: ColorAttr) {
    let (fore, back) = attr.to_engine();
    handle.set_style_color(style, fore, back);
}

pub fn style_color(handle: &mut EditorHandle, style: u8) -> ColorAttr {
    let (fore, back) = handle.style_color(style);
    ColorAttr::from_engine(fore, back)
}

/// Selection highlight.  A `Reset` foreground keeps the text's own colour.
pub fn set_selection_color(handle: &mut EditorHandle, attr: ColorAttr) {
    let fore = (attr.fg != crossterm::style::Color::Reset).then(|| to_engine(attr.fg, EngineColor::BLACK));
    handle.set_selection_color(fore, to_engine(attr.bg, EngineColor::WHITE));
}

/// Whitespace colours.  `Reset` leaves that channel to the text style.
pub fn set_whitespace_color(handle: &mut EditorHandle, attr: ColorAttr) {
    let pick = |c, reset| (c != crossterm::style::Color::Reset).then(|| to_engine(c, reset));
    handle.set_whitespace_color(pick(attr.fg, EngineColor::BLACK), pick(attr.bg, EngineColor::WHITE));
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use crossterm::style::Color;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::editor::{MemoryClipboard, ParentCallback};

    struct Fixed(PRect);

    impl ParentCallback for Fixed {
        fn editor_size(&self) -> PRect {
            self.0
        }
    }

    #[test]
    fn surface_offsets_and_clips() {
        let mut grid = CellGrid::new(10, 3);
        let mut surface = CellSurface::new(&mut grid, Rect::new(2, 1, 4, 2));
        let style = RunStyle { fore: EngineColor::BLACK, back: EngineColor::WHITE, bold: false };
        surface.draw_text(PRect::new(0.0, 0.0, 8.0, 1.0), 1.0, "abcdefgh", style);
        surface.fill_rect(PRect::new(0.0, 1.0, 1.0, 5.0), EngineColor::rgb(1, 2, 3));
        assert_eq!(grid.row_text(0), "          ");
        assert_eq!(grid.row_text(1), "  abcd    ");
        assert_eq!(grid.get(2, 2).map(|c| c.bg), Some(Color::Rgb { r: 1, g: 2, b: 3 }));
        assert_eq!(grid.get(3, 2).map(|c| c.bg), Some(Color::Reset));
    }

    #[test]
    fn engine_paints_into_the_view() {
        let mut h = EditorHandle::create(Rc::new(MemoryClipboard::new()));
        let parent = Rc::new(RefCell::new(Fixed(PRect::new(0.0, 0.0, 5.0, 2.0))));
        h.attach(&parent);
        h.size_changed();
        h.dispatch(Command::AppendText(b"hello world")).unwrap();
        let mut grid = CellGrid::new(7, 3);
        paint(&mut h, &mut grid, Rect::new(1, 1, 5, 2), PRect::new(0.0, 0.0, 5.0, 2.0));
        assert_eq!(grid.row_text(1), " hello ");
        assert_eq!(grid.row_text(2), " world ");
        // Block caret on the first cell.
        let caret = grid.get(1, 1).copied().unwrap();
        assert_eq!(caret.bg, Color::Rgb { r: 0, g: 0, b: 0 });
    }

    #[test]
    fn style_colour_in_host_terms() {
        let mut h = EditorHandle::create(Rc::new(MemoryClipboard::new()));
        let attr = ColorAttr::new(Color::Rgb { r: 9, g: 8, b: 7 }, Color::Rgb { r: 1, g: 1, b: 1 });
        set_style_color(&mut h, 5, attr);
        assert_eq!(style_color(&mut h, 5), attr);
    }
}

// ── Painting ──────────────────────────────────────────────────────────────────
//
// Rows are painted top to bottom.  Each row is split into runs of glyphs that
// share one look (plain, whitespace, selected, caret) so the surface sees a
// handful of draw calls per row instead of one per glyph.

use super::{layout, PlainEngine, StyleDef};
use crate::editor::{
    engine::{RunStyle, Surface},
    messages::{CaretStyle, PRect, STYLE_LINENUMBER, STYLE_TEXT},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Look {
    Plain,
    Whitespace,
    Selected,
    Caret,
}

struct Run {
    x0: usize,
    x1: usize,
    text: String,
    style: RunStyle,
}

fn flush(surface: &mut dyn Surface, run: Option<Run>, y: f64, lh: f64, ybase: f64) {
    let Some(run) = run else { return };
    let rc = PRect::new(run.x0 as f64, y, run.x1 as f64, y + lh);
    surface.fill_rect(rc, run.style.back);
    surface.draw_text(rc, ybase, &run.text, run.style);
}

impl PlainEngine {
    fn run_style(&self, look: Look) -> RunStyle {
        let StyleDef { fore, back, bold } = self.styles[usize::from(STYLE_TEXT)];
        match look {
            Look::Plain => RunStyle { fore, back, bold },
            Look::Whitespace => RunStyle {
                fore: self.whitespace.fore.unwrap_or(fore),
                back: self.whitespace.back.unwrap_or(back),
                bold,
            },
            Look::Selected => {
                RunStyle { fore: self.selection.fore.unwrap_or(fore), back: self.selection.back, bold }
            }
            Look::Caret => RunStyle { fore: back, back: self.caret_fore, bold },
        }
    }

    fn block_caret_visible(&self) -> bool {
        let style = if self.overtype { self.overtype_caret_style } else { self.caret_style };
        self.caret_on && style == CaretStyle::Block
    }

    pub(super) fn paint(&mut self, surface: &mut dyn Surface, area: PRect) {
        let lh = self.line_height() as f64;
        let ybase_offset = surface.ascent();
        let width = self.view.width().max(0.0).floor() as usize;
        let screen_rows = (self.view.height().max(0.0) / lh).ceil() as usize;
        let number_width = self.line_number_width as usize;
        let text_left = self.text_left();
        let text_right = width.saturating_sub(self.margin_right as usize);
        let plain_back = self.styles[usize::from(STYLE_TEXT)].back;
        let numbers = self.styles[usize::from(STYLE_LINENUMBER)];
        let selection = self.selection();
        let block_caret = self.block_caret_visible();
        let caret = self.caret;

        let top = self.top_row;
        let caret_row = self.layout().row_of(caret);
        let rows: Vec<_> = self.layout().rows.iter().skip(top).take(screen_rows).copied().collect();

        for i in 0..screen_rows {
            let y = i as f64 * lh;
            if !area.intersects_rows(y, y + lh) {
                continue;
            }
            let ybase = y + ybase_offset;
            let row_rect = PRect::new(0.0, y, width as f64, y + lh);
            surface.fill_rect(row_rect, plain_back);
            let Some(row) = rows.get(i).copied() else { continue };

            if number_width > 0 {
                let rc = PRect::new(0.0, y, number_width as f64, y + lh);
                surface.fill_rect(rc, numbers.back);
                if row.first {
                    let label = format!("{:>number_width$}", row.line + 1);
                    let label = &label[label.len() - number_width..];
                    let style = RunStyle { fore: numbers.fore, back: numbers.back, bold: numbers.bold };
                    surface.draw_text(rc, ybase, label, style);
                }
            }

            let mut run: Option<Run> = None;
            let mut end_col = 0;
            for (col, g) in layout::glyphs(&self.doc, row.start, row.end, self.code_page, self.tab_width) {
                end_col = col + g.width;
                if col < self.x_offset {
                    continue;
                }
                let x = text_left + col - self.x_offset;
                if x >= text_right {
                    break;
                }
                let look = if block_caret && g.pos == caret {
                    Look::Caret
                } else if selection.contains(&g.pos) {
                    Look::Selected
                } else if g.whitespace {
                    Look::Whitespace
                } else {
                    Look::Plain
                };
                let style = self.run_style(look);
                let x1 = (x + g.width).min(text_right);
                if let Some(r) = run.as_mut().filter(|r| r.style == style && r.x1 == x) {
                    r.x1 = x1;
                    push_glyph(&mut r.text, g);
                    continue;
                }
                flush(surface, run.take(), y, lh, ybase);
                let mut text = String::new();
                push_glyph(&mut text, g);
                run = Some(Run { x0: x, x1, text, style });
            }
            flush(surface, run, y, lh, ybase);

            // Caret past the last glyph of its row.
            if block_caret && caret == row.end && caret_row == top + i {
                let x = (text_left + end_col).checked_sub(self.x_offset);
                if let Some(x) = x.filter(|&x| x < text_right) {
                    let rc = PRect::new(x as f64, y, x as f64 + 1.0, y + lh);
                    let style = self.run_style(Look::Caret);
                    surface.fill_rect(rc, style.back);
                    surface.draw_text(rc, ybase, " ", style);
                }
            }
        }
    }
}

fn push_glyph(text: &mut String, g: layout::Glyph) {
    if g.ch == ' ' {
        text.extend(std::iter::repeat(' ').take(g.width));
    } else {
        text.push(g.ch);
    }
}

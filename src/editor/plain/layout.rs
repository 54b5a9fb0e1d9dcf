// ── Line and row layout ───────────────────────────────────────────────────────
//
// Document lines are split by `\n`, `\r\n` or a lone `\r`.  Each line is laid
// out into one or more display rows (more than one only when wrapping).  All
// widths are in cells: the cell profile makes one engine unit one cell.

use unicode_width::UnicodeWidthChar;

use crate::editor::messages::CodePage;

/// One document line: `[start, end)` excludes the end-of-line bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct LineSpan {
    pub(super) start: usize,
    pub(super) end: usize,
}

/// One display row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct Row {
    pub(super) line: usize,
    pub(super) start: usize,
    pub(super) end: usize,
    /// First row of its document line.
    pub(super) first: bool,
}

#[derive(Debug, Default)]
pub(super) struct Layout {
    pub(super) lines: Vec<LineSpan>,
    pub(super) rows: Vec<Row>,
}

/// A single displayed glyph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct Glyph {
    pub(super) pos: usize,
    pub(super) len: usize,
    /// What is drawn in the first cell.
    pub(super) ch: char,
    pub(super) width: usize,
    pub(super) whitespace: bool,
}

// ── Lines ─────────────────────────────────────────────────────────────────────

pub(super) fn line_spans(doc: &[u8]) -> Vec<LineSpan> {
    let mut spans = Vec::new();
    let mut start = 0;
    let mut i = 0;
    while i < doc.len() {
        match doc[i] {
            b'\n' => {
                spans.push(LineSpan { start, end: i });
                i += 1;
                start = i;
            }
            b'\r' => {
                spans.push(LineSpan { start, end: i });
                i += if doc.get(i + 1) == Some(&b'\n') { 2 } else { 1 };
                start = i;
            }
            _ => i += 1,
        }
    }
    spans.push(LineSpan { start, end: doc.len() });
    spans
}

// ── Glyphs ────────────────────────────────────────────────────────────────────

/// Byte length of the character starting at `pos`.
pub(super) fn char_len(doc: &[u8], pos: usize, code_page: CodePage) -> usize {
    let Some(&lead) = doc.get(pos) else { return 0 };
    if code_page == CodePage::SingleByte || lead < 0x80 {
        return 1;
    }
    let want = match lead {
        0xC2..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF4 => 4,
        _ => return 1,
    };
    match doc.get(pos..pos + want) {
        Some(seq) if std::str::from_utf8(seq).is_ok() => want,
        _ => 1,
    }
}

/// The glyph at `pos`, drawn at column `col` (tabs depend on it).
pub(super) fn glyph_at(
    doc: &[u8],
    pos: usize,
    col: usize,
    code_page: CodePage,
    tab_width: usize,
) -> Glyph {
    let len = char_len(doc, pos, code_page).max(1);
    let byte = doc.get(pos).copied().unwrap_or(b' ');
    if byte == b'\t' {
        let tab = tab_width.max(1);
        return Glyph { pos, len, ch: ' ', width: tab - col % tab, whitespace: true };
    }
    let ch = if len == 1 {
        // Single-byte profile: bytes are Latin-1.
        char::from(byte)
    } else {
        std::str::from_utf8(&doc[pos..pos + len])
            .ok()
            .and_then(|s| s.chars().next())
            .unwrap_or(char::REPLACEMENT_CHARACTER)
    };
    if ch.is_control() {
        return Glyph { pos, len, ch: '?', width: 1, whitespace: false };
    }
    let width = UnicodeWidthChar::width(ch).unwrap_or(1).max(1);
    Glyph { pos, len, ch, width, whitespace: ch == ' ' }
}

/// Iterate glyphs over `[start, end)` beginning at column 0.
pub(super) fn glyphs(
    doc: &[u8],
    start: usize,
    end: usize,
    code_page: CodePage,
    tab_width: usize,
) -> impl Iterator<Item = (usize, Glyph)> + '_ {
    let mut pos = start;
    let mut col = 0;
    std::iter::from_fn(move || {
        if pos >= end {
            return None;
        }
        let g = glyph_at(doc, pos, col, code_page, tab_width);
        let at = col;
        col += g.width;
        pos += g.len;
        Some((at, g))
    })
}

/// Column of `pos` within `[start, end)`; positions past `end` clamp to it.
pub(super) fn column_of(
    doc: &[u8],
    start: usize,
    end: usize,
    pos: usize,
    code_page: CodePage,
    tab_width: usize,
) -> usize {
    let mut col = 0;
    for (at, g) in glyphs(doc, start, end, code_page, tab_width) {
        if g.pos >= pos {
            return at;
        }
        col = at + g.width;
    }
    col
}

/// Position of the glyph covering `target` column, or `end` when past it.
pub(super) fn position_at_column(
    doc: &[u8],
    start: usize,
    end: usize,
    target: usize,
    code_page: CodePage,
    tab_width: usize,
) -> usize {
    for (at, g) in glyphs(doc, start, end, code_page, tab_width) {
        if target < at + g.width {
            return g.pos;
        }
    }
    end
}

// ── Rows ──────────────────────────────────────────────────────────────────────

/// Lay out every line; `wrap_width = None` keeps one row per line.
pub(super) fn build(
    doc: &[u8],
    wrap_width: Option<usize>,
    code_page: CodePage,
    tab_width: usize,
) -> Layout {
    let lines = line_spans(doc);
    let mut rows = Vec::with_capacity(lines.len());
    for (line, span) in lines.iter().enumerate() {
        match wrap_width {
            Some(width) => wrap_line(doc, line, *span, width.max(1), code_page, tab_width, &mut rows),
            None => rows.push(Row { line, start: span.start, end: span.end, first: true }),
        }
    }
    Layout { lines, rows }
}

fn wrap_line(
    doc: &[u8],
    line: usize,
    span: LineSpan,
    width: usize,
    code_page: CodePage,
    tab_width: usize,
    rows: &mut Vec<Row>,
) {
    let mut seg_start = span.start;
    let mut pos = span.start;
    let mut col = 0;
    // End of the last whitespace glyph in the current row: preferred break.
    let mut last_break: Option<usize> = None;

    while pos < span.end {
        let g = glyph_at(doc, pos, col, code_page, tab_width);
        if col + g.width > width && col > 0 {
            // Whitespace that overflows hangs past the edge instead of
            // starting the next row.
            let brk = if g.whitespace {
                pos + g.len
            } else {
                last_break.filter(|&b| b > seg_start).unwrap_or(pos)
            };
            rows.push(Row { line, start: seg_start, end: brk, first: seg_start == span.start });
            seg_start = brk;
            pos = brk;
            col = 0;
            last_break = None;
            continue;
        }
        col += g.width;
        pos += g.len;
        if g.whitespace {
            last_break = Some(pos);
        }
    }
    rows.push(Row { line, start: seg_start, end: span.end, first: seg_start == span.start });
}

impl Layout {
    /// Index of the row displaying `pos`.
    pub(super) fn row_of(&self, pos: usize) -> usize {
        self.rows.partition_point(|r| r.start <= pos).saturating_sub(1)
    }

    /// Index of the line containing `pos`.
    pub(super) fn line_of(&self, pos: usize) -> usize {
        self.lines.partition_point(|l| l.start <= pos).saturating_sub(1)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spans_split_all_eol_styles() {
        let spans = line_spans(b"a\r\nbb\ncc\rd");
        let got: Vec<_> = spans.iter().map(|s| (s.start, s.end)).collect();
        assert_eq!(got, vec![(0, 1), (3, 5), (6, 8), (9, 10)]);
    }

    #[test]
    fn trailing_newline_yields_empty_last_line() {
        let spans = line_spans(b"x\n");
        assert_eq!(spans.len(), 2);
        assert_eq!((spans[1].start, spans[1].end), (2, 2));
        assert_eq!(line_spans(b"").len(), 1);
    }

    #[test]
    fn tabs_expand_to_next_stop() {
        let doc = b"a\tb";
        let cols: Vec<_> = glyphs(doc, 0, 3, CodePage::SingleByte, 4).map(|(c, _)| c).collect();
        assert_eq!(cols, vec![0, 1, 4]);
        assert_eq!(column_of(doc, 0, 3, 2, CodePage::SingleByte, 4), 4);
    }

    #[test]
    fn utf8_page_decodes_multibyte_glyphs() {
        let doc = "é漢x".as_bytes();
        let widths: Vec<_> =
            glyphs(doc, 0, doc.len(), CodePage::Utf8, 8).map(|(_, g)| (g.len, g.width)).collect();
        assert_eq!(widths, vec![(2, 1), (3, 2), (1, 1)]);
    }

    #[test]
    fn single_byte_page_is_one_cell_per_byte() {
        let doc = "é".as_bytes();
        assert_eq!(glyphs(doc, 0, doc.len(), CodePage::SingleByte, 8).count(), 2);
    }

    #[test]
    fn wrap_prefers_whitespace_breaks() {
        let doc = b"hello brave world";
        let layout = build(doc, Some(10), CodePage::SingleByte, 8);
        let rows: Vec<_> = layout.rows.iter().map(|r| &doc[r.start..r.end]).collect();
        assert_eq!(rows, vec![&b"hello "[..], &b"brave "[..], &b"world"[..]]);
        assert!(layout.rows[0].first);
        assert!(!layout.rows[1].first);
    }

    #[test]
    fn overflowing_space_stays_on_its_row() {
        let doc = b"hello world";
        let layout = build(doc, Some(5), CodePage::SingleByte, 8);
        let rows: Vec<_> = layout.rows.iter().map(|r| &doc[r.start..r.end]).collect();
        assert_eq!(rows, vec![&b"hello "[..], &b"world"[..]]);
    }

    #[test]
    fn wrap_hard_breaks_long_words() {
        let doc = b"abcdefgh";
        let layout = build(doc, Some(3), CodePage::SingleByte, 8);
        assert_eq!(layout.rows.len(), 3);
        assert_eq!((layout.rows[2].start, layout.rows[2].end), (6, 8));
    }

    #[test]
    fn row_lookup_at_boundaries() {
        let layout = build(b"ab\ncd", None, CodePage::SingleByte, 8);
        assert_eq!(layout.row_of(0), 0);
        assert_eq!(layout.row_of(2), 0);
        assert_eq!(layout.row_of(3), 1);
        assert_eq!(layout.line_of(5), 1);
    }

    #[test]
    fn position_at_column_clamps_to_row_end() {
        let doc = b"abc";
        assert_eq!(position_at_column(doc, 0, 3, 1, CodePage::SingleByte, 8), 1);
        assert_eq!(position_at_column(doc, 0, 3, 9, CodePage::SingleByte, 8), 3);
    }
}

// ── Document properties analyzer ──────────────────────────────────────────────
//
// Observes the byte stream of a load, one chunk at a time, and infers the
// document's line-ending and indentation conventions.  The scan is a byte-level
// state machine, so the conclusions do not depend on where chunks are split.
// Only new edits follow the inferred conventions; loaded bytes are untouched.

use tracing::debug;

use crate::editor::{Command, EditorHandle, EolMode};

/// Indentation width used when no indented line was observed.
pub const DEFAULT_INDENT: usize = 4;

/// Widest indentation step that counts as evidence.
const MAX_INDENT: usize = 8;

/// What the analyzer concluded about a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Conclusions {
    pub eol: EolMode,
    pub use_tabs: bool,
    pub indent: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineScan {
    /// Still inside the line's leading whitespace.
    Leading { first: Option<u8>, spaces: usize },
    /// Past the first non-blank byte.
    Body,
}

impl LineScan {
    const START: Self = Self::Leading { first: None, spaces: 0 };
}

/// Per-load accumulator.  Feed every chunk to [`analyze`](Self::analyze),
/// then consume it with [`apply`](Self::apply).
#[derive(Debug, Clone)]
pub struct DocumentProperties {
    crlf: usize,
    lf: usize,
    cr: usize,
    /// The previous chunk ended in `\r`; its meaning depends on the next byte.
    pending_cr: bool,
    line: LineScan,
    prev_indent: usize,
    tab_lines: usize,
    space_lines: usize,
    /// Occurrences of each positive indentation step, indexed by width.
    steps: [usize; MAX_INDENT + 1],
}

impl Default for DocumentProperties {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentProperties {
    pub fn new() -> Self {
        Self {
            crlf: 0,
            lf: 0,
            cr: 0,
            pending_cr: false,
            line: LineScan::START,
            prev_indent: 0,
            tab_lines: 0,
            space_lines: 0,
            steps: [0; MAX_INDENT + 1],
        }
    }

    /// Scan one chunk.
    pub fn analyze(&mut self, chunk: &[u8]) {
        for &b in chunk {
            if std::mem::take(&mut self.pending_cr) {
                if b == b'\n' {
                    self.crlf += 1;
                    continue;
                }
                self.cr += 1;
            }
            match b {
                b'\r' => {
                    self.pending_cr = true;
                    self.line = LineScan::START;
                }
                b'\n' => {
                    self.lf += 1;
                    self.line = LineScan::START;
                }
                b' ' | b'\t' => {
                    if let LineScan::Leading { first, spaces } = &mut self.line {
                        first.get_or_insert(b);
                        if b == b' ' {
                            *spaces += 1;
                        }
                    }
                }
                _ => {
                    if let LineScan::Leading { first, spaces } = self.line {
                        self.finish_indent(first, spaces);
                        self.line = LineScan::Body;
                    }
                }
            }
        }
    }

    fn finish_indent(&mut self, first: Option<u8>, spaces: usize) {
        match first {
            Some(b'\t') => self.tab_lines += 1,
            Some(_) => {
                self.space_lines += 1;
                if spaces > self.prev_indent {
                    let step = spaces - self.prev_indent;
                    if step <= MAX_INDENT {
                        self.steps[step] += 1;
                    }
                }
                self.prev_indent = spaces;
            }
            None => self.prev_indent = 0,
        }
    }

    /// The conventions implied by everything analyzed so far.
    pub fn conclusions(&self) -> Conclusions {
        let cr = self.cr + usize::from(self.pending_cr);
        let tally = [(EolMode::Crlf, self.crlf), (EolMode::Lf, self.lf), (EolMode::Cr, cr)];
        let best = tally.iter().map(|&(_, n)| n).max().unwrap_or(0);
        let leaders: Vec<_> = tally.iter().filter(|&&(_, n)| n == best).collect();
        let eol = match leaders.as_slice() {
            [(eol, n)] if *n > 0 => *eol,
            _ => EolMode::platform_default(),
        };

        // Ties resolve to the narrower width.
        let indent = (1..=MAX_INDENT)
            .filter(|&w| self.steps[w] > 0)
            .max_by(|&a, &b| self.steps[a].cmp(&self.steps[b]).then(b.cmp(&a)))
            .unwrap_or(DEFAULT_INDENT);

        Conclusions { eol, use_tabs: self.tab_lines > self.space_lines, indent }
    }

    /// Configure `handle` from the analysis.  Consumes the accumulator: it is
    /// applied once, after the last chunk.
    pub fn apply(self, handle: &mut EditorHandle) -> Conclusions {
        let found = self.conclusions();
        debug!(
            eol = found.eol.as_str(),
            use_tabs = found.use_tabs,
            indent = found.indent,
            crlf = self.crlf,
            lf = self.lf,
            cr = self.cr,
            "document properties applied"
        );
        handle.set_eol_mode(found.eol);
        handle.send(Command::SetUseTabs(found.use_tabs));
        handle.send(Command::SetIndent(found.indent));
        found
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn analyze_all(chunks: &[&[u8]]) -> Conclusions {
        let mut props = DocumentProperties::new();
        for chunk in chunks {
            props.analyze(chunk);
        }
        props.conclusions()
    }

    #[test]
    fn crlf_split_across_chunks_counts_once() {
        let mut props = DocumentProperties::new();
        props.analyze(b"a\r");
        props.analyze(b"\nb\r");
        props.analyze(b"\nc");
        assert_eq!((props.crlf, props.cr, props.lf), (2, 0, 0));
        assert_eq!(props.conclusions().eol, EolMode::Crlf);
    }

    #[test]
    fn trailing_cr_counts_as_cr() {
        let found = analyze_all(&[b"a\rb\r"]);
        assert_eq!(found.eol, EolMode::Cr);
    }

    #[test]
    fn majority_line_ending_wins() {
        assert_eq!(analyze_all(&[b"a\nb\nc\r\n"]).eol, EolMode::Lf);
        assert_eq!(analyze_all(&[b"a\r\nb\r\nc\n"]).eol, EolMode::Crlf);
    }

    #[test]
    fn ties_and_empty_fall_back_to_platform() {
        assert_eq!(analyze_all(&[b"a\nb\r\n"]).eol, EolMode::platform_default());
        assert_eq!(analyze_all(&[b"no newline"]).eol, EolMode::platform_default());
        assert_eq!(analyze_all(&[]).eol, EolMode::platform_default());
    }

    #[test]
    fn indentation_width_from_steps() {
        let src = b"fn a() {\n  if x {\n    y();\n  }\n}\nfn b() {\n  z();\n}\n";
        let found = analyze_all(&[src]);
        assert_eq!(found.indent, 2);
        assert!(!found.use_tabs);
    }

    #[test]
    fn blank_lines_do_not_reset_indentation() {
        let src = b"a\n    b\n\n        c\n";
        assert_eq!(analyze_all(&[src]).indent, 4);
    }

    #[test]
    fn tabs_majority_selects_tabs() {
        let found = analyze_all(&[b"a\n\tb\n\tc\n  d\n"]);
        assert!(found.use_tabs);
    }

    #[test]
    fn no_indentation_uses_default_width() {
        let found = analyze_all(&[b"a\nb\n"]);
        assert_eq!(found.indent, DEFAULT_INDENT);
        assert!(!found.use_tabs);
    }

    #[test]
    fn byte_at_a_time_matches_whole() {
        let src: &[u8] = b"x\r\n    y\r\n\tz\r\n        w\r";
        let whole = analyze_all(&[src]);
        let mut props = DocumentProperties::new();
        for b in src.chunks(1) {
            props.analyze(b);
        }
        assert_eq!(props.conclusions(), whole);
    }
}

// ── Language detection ────────────────────────────────────────────────────────
//
// Maps a file path (and, failing that, a `#!` line) to a `Language`.  The
// built-in table is what `FileEditorState` uses unless a host injects its own
// `LanguageDetector`.

use std::path::Path;

// ── Language enum ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Language {
    /// Nothing detected yet.
    #[default]
    None,
    C,
    Cpp,
    Python,
    Rust,
    JavaScript,
    TypeScript,
    Html,
    Xml,
    Css,
    Json,
    Sql,
    Toml,
    Ini,
    Batch,
    Makefile,
    Diff,
    Shell,
    Markdown,
    Yaml,
    PowerShell,
}

impl Language {
    /// Human-readable name for the status line.
    pub fn display_name(self) -> &'static str {
        match self {
            Language::None => "Plain Text",
            Language::C => "C",
            Language::Cpp => "C++",
            Language::Python => "Python",
            Language::Rust => "Rust",
            Language::JavaScript => "JavaScript",
            Language::TypeScript => "TypeScript",
            Language::Html => "HTML",
            Language::Xml => "XML",
            Language::Css => "CSS",
            Language::Json => "JSON",
            Language::Sql => "SQL",
            Language::Toml => "TOML",
            Language::Ini => "INI",
            Language::Batch => "Batch",
            Language::Makefile => "Makefile",
            Language::Diff => "Diff",
            Language::Shell => "Shell",
            Language::Markdown => "Markdown",
            Language::Yaml => "YAML",
            Language::PowerShell => "PowerShell",
        }
    }
}

// ── Detector seam ─────────────────────────────────────────────────────────────

/// Classifies a document.  `head` is the start of its content (may be empty).
pub trait LanguageDetector {
    fn detect(&self, path: &Path, head: &[u8]) -> Language;
}

/// Extension table, special file names, then the `#!` line.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinDetector;

impl LanguageDetector for BuiltinDetector {
    fn detect(&self, path: &Path, head: &[u8]) -> Language {
        match language_from_path(path) {
            Language::None => language_from_shebang(head),
            lang => lang,
        }
    }
}

// ── Detection by path ─────────────────────────────────────────────────────────

/// Detect from file name and extension.  `Language::None` when unknown.
pub fn language_from_path(path: &Path) -> Language {
    if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
        match name {
            "Makefile" | "GNUmakefile" | "makefile" => return Language::Makefile,
            "CMakeLists.txt" => return Language::None,
            ".bashrc" | ".bash_profile" | ".profile" | ".zshrc" => return Language::Shell,
            "Cargo.lock" => return Language::Toml,
            _ => {}
        }
    }

    let ext = path.extension().and_then(|e| e.to_str()).map(|e| e.to_ascii_lowercase());

    match ext.as_deref() {
        Some("c" | "h") => Language::C,
        Some("cpp" | "cc" | "cxx" | "hpp" | "hh" | "hxx" | "inl") => Language::Cpp,
        Some("py" | "pyw" | "pyi") => Language::Python,
        Some("rs") => Language::Rust,
        Some("js" | "mjs" | "cjs") => Language::JavaScript,
        Some("ts" | "mts" | "cts") => Language::TypeScript,
        Some("html" | "htm" | "xhtml" | "shtml") => Language::Html,
        Some("xml" | "xsl" | "xslt" | "svg" | "xaml" | "csproj" | "vbproj") => Language::Xml,
        Some("css" | "scss" | "less") => Language::Css,
        Some("json" | "jsonc") => Language::Json,
        Some("sql") => Language::Sql,
        Some("toml") => Language::Toml,
        Some("ini" | "cfg" | "conf" | "properties" | "editorconfig") => Language::Ini,
        Some("bat" | "cmd") => Language::Batch,
        Some("mk" | "mak") => Language::Makefile,
        Some("diff" | "patch") => Language::Diff,
        Some("sh" | "bash" | "zsh" | "ksh" | "ash") => Language::Shell,
        Some("md" | "markdown" | "mdown" | "mkd") => Language::Markdown,
        Some("yaml" | "yml") => Language::Yaml,
        Some("ps1" | "psm1" | "psd1") => Language::PowerShell,
        _ => Language::None,
    }
}

// ── Detection by content ──────────────────────────────────────────────────────

/// Detect from a `#!` interpreter line, e.g. `#!/usr/bin/env python3`.
pub fn language_from_shebang(head: &[u8]) -> Language {
    let Some(rest) = head.strip_prefix(b"#!") else {
        return Language::None;
    };
    let line_end = rest.iter().position(|&b| b == b'\n' || b == b'\r').unwrap_or(rest.len());
    let Ok(line) = std::str::from_utf8(&rest[..line_end]) else {
        return Language::None;
    };

    let mut words = line.split_whitespace();
    let Some(program) = words.next() else {
        return Language::None;
    };
    let mut interpreter = program.rsplit('/').next().unwrap_or(program);
    if interpreter == "env" {
        // Skip `env` options such as `-S`.
        interpreter = words.find(|w| !w.starts_with('-')).unwrap_or("");
    }

    match interpreter {
        i if i.starts_with("python") => Language::Python,
        "sh" | "bash" | "zsh" | "ksh" | "ash" | "dash" => Language::Shell,
        "node" | "nodejs" => Language::JavaScript,
        "pwsh" | "powershell" => Language::PowerShell,
        "make" => Language::Makefile,
        _ => Language::None,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn lang(path: &str) -> Language {
        language_from_path(Path::new(path))
    }

    #[test]
    fn detect_by_extension() {
        assert_eq!(lang("main.rs"), Language::Rust);
        assert_eq!(lang("foo.c"), Language::C);
        assert_eq!(lang("foo.hpp"), Language::Cpp);
        assert_eq!(lang("script.py"), Language::Python);
        assert_eq!(lang("index.mjs"), Language::JavaScript);
        assert_eq!(lang("page.htm"), Language::Html);
        assert_eq!(lang("fix.patch"), Language::Diff);
        assert_eq!(lang("ci.yml"), Language::Yaml);
    }

    #[test]
    fn extension_case_insensitive() {
        assert_eq!(lang("MAIN.RS"), Language::Rust);
        assert_eq!(lang("Setup.PS1"), Language::PowerShell);
    }

    #[test]
    fn detect_special_names() {
        assert_eq!(lang("Makefile"), Language::Makefile);
        assert_eq!(lang("/home/u/.bashrc"), Language::Shell);
        assert_eq!(lang("Cargo.lock"), Language::Toml);
    }

    #[test]
    fn unknown_is_none() {
        assert_eq!(lang("notes.txt"), Language::None);
        assert_eq!(lang("README"), Language::None);
        assert_eq!(lang(""), Language::None);
    }

    #[test]
    fn shebang_lines() {
        assert_eq!(language_from_shebang(b"#!/bin/sh\necho"), Language::Shell);
        assert_eq!(language_from_shebang(b"#!/usr/bin/env python3\n"), Language::Python);
        assert_eq!(language_from_shebang(b"#!/usr/bin/env -S node --flag\n"), Language::JavaScript);
        assert_eq!(language_from_shebang(b"#!\n"), Language::None);
        assert_eq!(language_from_shebang(b"print('hi')"), Language::None);
    }

    #[test]
    fn builtin_prefers_path_over_content() {
        let d = BuiltinDetector;
        assert_eq!(d.detect(Path::new("a.rs"), b"#!/bin/sh\n"), Language::Rust);
        assert_eq!(d.detect(Path::new("run"), b"#!/bin/bash\n"), Language::Shell);
        assert_eq!(d.detect(Path::new("run"), b""), Language::None);
    }

    #[test]
    fn display_names_are_nonempty() {
        for l in [Language::None, Language::Rust, Language::Yaml, Language::PowerShell] {
            assert!(!l.display_name().is_empty());
        }
    }
}

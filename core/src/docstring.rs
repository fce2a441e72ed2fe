//! Docstring structure adapter.
//!
//! Wraps the three per-style grammar parsers behind one output shape:
//! - style-mismatch detection before the declared parser runs, so a
//!   docstring written in the wrong style is parsed with the detected
//!   style instead of producing a wall of cascading mismatches
//! - cleandoc-style dedenting shared by parsing and detection
//! - qualifier stripping (`, optional`, `, default=...`) shared by all
//!   three parsers

use aho_corasick::{AhoCorasick, AhoCorasickBuilder};
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::args::ArgList;
use crate::google;
use crate::numpy;
use crate::sphinx;
use crate::DocstringStyle;

/// One entry of a Returns or Yields section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionEntry {
    pub name: String,
    /// Canonicalized; empty when the entry carries no type.
    pub type_hint: String,
    pub description: String,
}

/// Style-independent view of one parsed docstring.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocstringStructure {
    pub style: DocstringStyle,
    pub params: ArgList,
    pub attributes: ArgList,
    pub return_entries: Vec<SectionEntry>,
    pub yield_entries: Vec<SectionEntry>,
    /// Documented exception names in section order, duplicates kept.
    pub raises: Vec<String>,
    /// Param names whose documented type carried an optional/default
    /// qualifier before stripping.
    pub optional_params: Vec<String>,
    pub has_args_section: bool,
    pub has_returns_section: bool,
    pub has_yields_section: bool,
    pub has_raises_section: bool,
    pub has_attributes_section: bool,
    pub has_long_description: bool,
}

impl DocstringStructure {
    /// Summary only: no sections and no prose beyond the first block.
    pub fn is_short(&self) -> bool {
        !(self.has_args_section
            || self.has_returns_section
            || self.has_yields_section
            || self.has_raises_section
            || self.has_attributes_section
            || self.has_long_description)
    }

    /// Sentinel substituted when a grammar parser rejects the text.
    pub fn empty(style: DocstringStyle) -> Self {
        Self {
            style,
            ..Self::default()
        }
    }

    /// Types documented in the Returns section, skipping untyped rows.
    pub fn return_types(&self) -> Vec<&str> {
        self.return_entries
            .iter()
            .filter(|e| !e.type_hint.is_empty())
            .map(|e| e.type_hint.as_str())
            .collect()
    }

    /// Types documented in the Yields section, skipping untyped rows.
    pub fn yield_types(&self) -> Vec<&str> {
        self.yield_entries
            .iter()
            .filter(|e| !e.type_hint.is_empty())
            .map(|e| e.type_hint.as_str())
            .collect()
    }
}

/// Why a docstring body was rejected by a grammar parser.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocstringParseError {
    #[error("malformed entry under `{section}`: `{entry}` has no colon separator")]
    MalformedEntry { section: String, entry: String },
}

/// Parse dedented text with the grammar of `style`.
pub fn parse(text: &str, style: DocstringStyle) -> Result<DocstringStructure, DocstringParseError> {
    let body = dedent(text);
    let mut parsed = match style {
        DocstringStyle::Numpy => numpy::parse(&body),
        DocstringStyle::Google => google::parse(&body)?,
        DocstringStyle::Sphinx => sphinx::parse(&body),
    };
    parsed.style = style;
    Ok(parsed)
}

/// Outcome of scanning a docstring for style markers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StyleAssessment {
    /// The declared style matched, or nothing recognizable did.
    Consistent,
    /// Exactly one other style matched; parse with it instead.
    Mismatch(DocstringStyle),
    /// Markers of several styles found.
    Ambiguous(Vec<DocstringStyle>),
}

static NUMPY_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^(?:Parameters|Other Parameters|Returns|Yields|Raises|Attributes)\n-{3,}$")
        .expect("static regex")
});

static GOOGLE_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^(?:Args|Arguments|Returns|Yields|Raises|Attributes):$").expect("static regex")
});

static SPHINX_MARKERS: Lazy<AhoCorasick> = Lazy::new(|| {
    AhoCorasickBuilder::new().ascii_case_insensitive(true).build([
        ":param ",
        ":parameter ",
        ":arg ",
        ":argument ",
        ":key ",
        ":keyword ",
        ":type ",
        ":returns:",
        ":return:",
        ":rtype:",
        ":yields:",
        ":yield:",
        ":ytype:",
        ":raises ",
        ":raises:",
        ":raise ",
        ":except ",
        ":exception ",
        ":ivar ",
        ":cvar ",
        ":var ",
        ":vartype ",
    ])
});

/// Compare detected style markers against the declared style.
pub fn assess_style(text: &str, declared: DocstringStyle) -> StyleAssessment {
    let body = dedent(text);
    let mut found = Vec::new();
    if NUMPY_HEADER.is_match(&body) {
        found.push(DocstringStyle::Numpy);
    }
    if GOOGLE_HEADER.is_match(&body) {
        found.push(DocstringStyle::Google);
    }
    if body.lines().any(is_sphinx_field_line) {
        found.push(DocstringStyle::Sphinx);
    }
    match found.as_slice() {
        [] => StyleAssessment::Consistent,
        [single] if *single == declared => StyleAssessment::Consistent,
        [single] => StyleAssessment::Mismatch(*single),
        _ => StyleAssessment::Ambiguous(found),
    }
}

/// A field marker at the line's own start, not inside prose.
fn is_sphinx_field_line(line: &str) -> bool {
    SPHINX_MARKERS.find(line).map_or(false, |m| m.start() == 0)
}

/// Strip the common indentation of every line after the first and drop
/// trailing whitespace, the way `inspect.cleandoc` does. The margin is
/// measured in characters, not bytes, so non-ASCII whitespace (no-break
/// spaces and friends) cannot land a slice inside a code point.
pub(crate) fn dedent(text: &str) -> String {
    let lines: Vec<&str> = text.lines().collect();
    if lines.is_empty() {
        return String::new();
    }
    let margin = lines[1..]
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.chars().take_while(|c| c.is_whitespace()).count())
        .min()
        .unwrap_or(0);
    let mut out = vec![lines[0].trim().to_string()];
    for line in &lines[1..] {
        if line.trim().is_empty() {
            out.push(String::new());
        } else {
            out.push(strip_margin(line, margin).trim_end().to_string());
        }
    }
    while out.last().is_some_and(|l| l.is_empty()) {
        out.pop();
    }
    out.join("\n")
}

/// Drop up to `margin` leading whitespace characters.
fn strip_margin(line: &str, margin: usize) -> &str {
    let mut rest = line;
    for _ in 0..margin {
        match rest.chars().next() {
            Some(c) if c.is_whitespace() => rest = &rest[c.len_utf8()..],
            _ => break,
        }
    }
    rest
}

/// Prose beyond the summary block before the first section header.
pub(crate) fn preamble_has_long_description(lines: &[&str], first_section: usize) -> bool {
    let mut i = 0;
    while i < first_section && lines[i].trim().is_empty() {
        i += 1;
    }
    while i < first_section && !lines[i].trim().is_empty() {
        i += 1;
    }
    lines[i..first_section].iter().any(|l| !l.trim().is_empty())
}

/// Split `, optional` / `, default=...` qualifiers off a documented type.
///
/// Only top-level commas separate qualifiers; commas inside brackets
/// belong to the type. Returns the stripped type plus whether any
/// qualifier was present.
pub(crate) fn split_type_qualifiers(raw: &str) -> (String, bool) {
    let mut depth = 0usize;
    let mut parts: Vec<String> = vec![String::new()];
    for c in raw.chars() {
        match c {
            '[' | '(' => depth += 1,
            ']' | ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(String::new());
                continue;
            }
            _ => {}
        }
        if let Some(part) = parts.last_mut() {
            part.push(c);
        }
    }
    let mut kept: Vec<&str> = Vec::new();
    let mut had_qualifier = false;
    for (i, part) in parts.iter().enumerate() {
        let trimmed = part.trim();
        let lowered = trimmed.to_ascii_lowercase();
        if i > 0 && (lowered == "optional" || lowered.starts_with("default")) {
            had_qualifier = true;
        } else if !trimmed.is_empty() {
            kept.push(trimmed);
        }
    }
    (kept.join(", "), had_qualifier)
}

/// Sections the parsers recognize; everything else is prose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SectionKind {
    Args,
    Returns,
    Yields,
    Raises,
    Attributes,
}

pub(crate) fn is_indented(line: &str) -> bool {
    line.starts_with(' ') || line.starts_with('\t')
}

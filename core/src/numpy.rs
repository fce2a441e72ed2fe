//! numpydoc-style section parser.
//!
//! A section is a header line underlined with dashes. Entry lines sit at
//! the section's left edge; indented lines beneath an entry are its
//! description. Unknown underlined headers still bound the preceding
//! section so their content never leaks into it.

use crate::args::{Arg, ArgList};
use crate::canon::canonicalize;
use crate::docstring::{
    is_indented, preamble_has_long_description, split_type_qualifiers, DocstringStructure,
    SectionEntry, SectionKind,
};

pub(crate) fn parse(body: &str) -> DocstringStructure {
    let lines: Vec<&str> = body.lines().collect();
    let mut out = DocstringStructure::default();

    let mut headers: Vec<(usize, Option<SectionKind>)> = Vec::new();
    for i in 0..lines.len() {
        if is_header(&lines, i) {
            headers.push((i, section_kind(lines[i].trim())));
        }
    }
    let first = headers.first().map_or(lines.len(), |&(i, _)| i);
    out.has_long_description = preamble_has_long_description(&lines, first);

    let mut scratch = Vec::new();
    for (idx, &(start, kind)) in headers.iter().enumerate() {
        let end = headers.get(idx + 1).map_or(lines.len(), |&(i, _)| i);
        let content = &lines[(start + 2).min(end)..end];
        match kind {
            Some(SectionKind::Args) => {
                out.has_args_section = true;
                parse_params(content, &mut out.params, &mut out.optional_params);
            }
            Some(SectionKind::Attributes) => {
                out.has_attributes_section = true;
                parse_params(content, &mut out.attributes, &mut scratch);
            }
            Some(SectionKind::Returns) => {
                out.has_returns_section = true;
                parse_typed_entries(content, &mut out.return_entries);
            }
            Some(SectionKind::Yields) => {
                out.has_yields_section = true;
                parse_typed_entries(content, &mut out.yield_entries);
            }
            Some(SectionKind::Raises) => {
                out.has_raises_section = true;
                parse_raises(content, &mut out.raises);
            }
            None => {}
        }
    }
    out
}

/// Header = non-indented, non-underline line whose next line is dashes.
fn is_header(lines: &[&str], i: usize) -> bool {
    i + 1 < lines.len()
        && is_underline(lines[i + 1])
        && !lines[i].trim().is_empty()
        && !is_indented(lines[i])
        && !is_underline(lines[i])
}

fn is_underline(line: &str) -> bool {
    if is_indented(line) {
        return false;
    }
    let t = line.trim_end();
    t.len() >= 3 && t.chars().all(|c| c == '-')
}

fn section_kind(name: &str) -> Option<SectionKind> {
    match name.to_ascii_lowercase().as_str() {
        "parameters" | "params" | "arguments" | "args" | "other parameters" => {
            Some(SectionKind::Args)
        }
        "returns" | "return" => Some(SectionKind::Returns),
        "yields" | "yield" => Some(SectionKind::Yields),
        "raises" | "raise" => Some(SectionKind::Raises),
        "attributes" => Some(SectionKind::Attributes),
        _ => None,
    }
}

/// `name : type` entries; `x1, x2 : type` documents several names at once.
fn parse_params(lines: &[&str], list: &mut ArgList, optional: &mut Vec<String>) {
    for line in lines {
        if line.trim().is_empty() || is_indented(line) {
            continue;
        }
        let (names, type_part) = match line.split_once(':') {
            Some((n, t)) => (n.trim(), t.trim()),
            None => (line.trim(), ""),
        };
        let (stripped, had_qualifier) = split_type_qualifiers(type_part);
        let type_hint = if stripped.is_empty() {
            String::new()
        } else {
            canonicalize(&stripped)
        };
        for name in names.split(',') {
            let name = name.trim();
            if name.is_empty() {
                continue;
            }
            if had_qualifier {
                optional.push(name.to_string());
            }
            list.push(Arg::new(name, type_hint.clone()));
        }
    }
}

/// Returns/Yields rows: `name : type` or a bare type on its own line.
fn parse_typed_entries(lines: &[&str], entries: &mut Vec<SectionEntry>) {
    for line in lines {
        if line.trim().is_empty() {
            continue;
        }
        if is_indented(line) {
            if let Some(entry) = entries.last_mut() {
                if !entry.description.is_empty() {
                    entry.description.push(' ');
                }
                entry.description.push_str(line.trim());
            }
            continue;
        }
        let (name, type_part) = match line.split_once(':') {
            Some((n, t)) => (n.trim().to_string(), t.trim()),
            None => (String::new(), line.trim()),
        };
        let (stripped, _) = split_type_qualifiers(type_part);
        entries.push(SectionEntry {
            name,
            type_hint: if stripped.is_empty() {
                String::new()
            } else {
                canonicalize(&stripped)
            },
            description: String::new(),
        });
    }
}

fn parse_raises(lines: &[&str], raises: &mut Vec<String>) {
    for line in lines {
        if line.trim().is_empty() || is_indented(line) {
            continue;
        }
        let entry = line.trim();
        let name = entry.split(':').next().unwrap_or(entry).trim();
        if !name.is_empty() {
            raises.push(name.to_string());
        }
    }
}

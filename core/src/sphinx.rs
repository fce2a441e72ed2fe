//! Sphinx/reST field-list parser.
//!
//! Fields sit at the docstring's base indent: `:param type name: desc`,
//! `:type name: ...`, `:returns:` with `:rtype:`, `:yields:` with
//! `:ytype:`, `:raises Name:`, and `:ivar name:`/`:vartype name:` for
//! attributes. Indented lines continue the preceding field's value.

use crate::args::{Arg, ArgList};
use crate::canon::canonicalize;
use crate::docstring::{
    is_indented, preamble_has_long_description, split_type_qualifiers, DocstringStructure,
    SectionEntry,
};

pub(crate) fn parse(body: &str) -> DocstringStructure {
    let lines: Vec<&str> = body.lines().collect();
    let mut out = DocstringStructure::default();

    let first = lines
        .iter()
        .position(|l| split_field(l).is_some())
        .unwrap_or(lines.len());
    out.has_long_description = preamble_has_long_description(&lines, first);

    let mut fields: Vec<(Vec<String>, String)> = Vec::new();
    for line in &lines {
        if let Some((tokens, value)) = split_field(line) {
            let tokens = tokens.iter().map(|t| t.to_string()).collect();
            fields.push((tokens, value.to_string()));
        } else if is_indented(line) && !line.trim().is_empty() {
            if let Some((_, value)) = fields.last_mut() {
                if !value.is_empty() {
                    value.push(' ');
                }
                value.push_str(line.trim());
            }
        }
    }

    for (tokens, value) in &fields {
        apply_field(tokens, value, &mut out);
    }
    out
}

/// `:field arg1 arg2: value` at base indent. The second colon closes the
/// field spec; everything after it is the value.
fn split_field(line: &str) -> Option<(Vec<&str>, &str)> {
    if is_indented(line) {
        return None;
    }
    let rest = line.strip_prefix(':')?;
    let end = rest.find(':')?;
    let tokens: Vec<&str> = rest[..end].split_whitespace().collect();
    if tokens.is_empty() {
        return None;
    }
    Some((tokens, rest[end + 1..].trim()))
}

fn apply_field(tokens: &[String], value: &str, out: &mut DocstringStructure) {
    let field = tokens[0].to_ascii_lowercase();
    let rest = &tokens[1..];
    match field.as_str() {
        "param" | "parameter" | "arg" | "argument" | "key" | "keyword" => {
            out.has_args_section = true;
            let Some((name, inline_type)) = name_and_type(rest) else {
                return;
            };
            let type_hint = clean_type(&inline_type, name, &mut out.optional_params);
            if !type_hint.is_empty() && out.params.contains_name(name) {
                out.params.set_type(name, type_hint);
            } else if !out.params.contains_name(name) {
                out.params.push(Arg::new(name, type_hint));
            }
        }
        "type" => {
            out.has_args_section = true;
            let Some((name, _)) = name_and_type(rest) else {
                return;
            };
            let type_hint = clean_type(value, name, &mut out.optional_params);
            if !out.params.set_type(name, type_hint.clone()) {
                out.params.push(Arg::new(name, type_hint));
            }
        }
        "returns" | "return" => {
            out.has_returns_section = true;
            append_description(ensure_entry(&mut out.return_entries), value);
        }
        "rtype" => {
            out.has_returns_section = true;
            let mut scratch = Vec::new();
            ensure_entry(&mut out.return_entries).type_hint = clean_type(value, "", &mut scratch);
        }
        "yields" | "yield" => {
            out.has_yields_section = true;
            append_description(ensure_entry(&mut out.yield_entries), value);
        }
        "ytype" => {
            out.has_yields_section = true;
            let mut scratch = Vec::new();
            ensure_entry(&mut out.yield_entries).type_hint = clean_type(value, "", &mut scratch);
        }
        "raises" | "raise" | "except" | "exception" => {
            out.has_raises_section = true;
            let joined = rest.join(" ");
            for name in joined.split(',') {
                let name = name.trim();
                if !name.is_empty() {
                    out.raises.push(name.to_string());
                }
            }
        }
        "ivar" | "cvar" | "var" => {
            out.has_attributes_section = true;
            let Some((name, inline_type)) = name_and_type(rest) else {
                return;
            };
            let mut scratch = Vec::new();
            let type_hint = clean_type(&inline_type, name, &mut scratch);
            if !type_hint.is_empty() && out.attributes.contains_name(name) {
                out.attributes.set_type(name, type_hint);
            } else if !out.attributes.contains_name(name) {
                out.attributes.push(Arg::new(name, type_hint));
            }
        }
        "vartype" => {
            out.has_attributes_section = true;
            let Some((name, _)) = name_and_type(rest) else {
                return;
            };
            let mut scratch = Vec::new();
            let type_hint = clean_type(value, name, &mut scratch);
            if !out.attributes.set_type(name, type_hint.clone()) {
                out.attributes.push(Arg::new(name, type_hint));
            }
        }
        _ => {}
    }
}

/// The last token is the name; any tokens before it are an inline type
/// (`:param dict[str, int] mapping:`). reST star escapes are unwrapped.
fn name_and_type(rest: &[String]) -> Option<(&str, String)> {
    match rest {
        [] => None,
        [name] => Some((name.trim_start_matches('\\'), String::new())),
        [type_parts @ .., name] => {
            Some((name.trim_start_matches('\\'), type_parts.join(" ")))
        }
    }
}

fn clean_type(raw: &str, name: &str, optional: &mut Vec<String>) -> String {
    let (stripped, had_qualifier) = split_type_qualifiers(raw);
    if had_qualifier && !name.is_empty() {
        optional.push(name.to_string());
    }
    if stripped.is_empty() {
        String::new()
    } else {
        canonicalize(&stripped)
    }
}

fn ensure_entry(entries: &mut Vec<SectionEntry>) -> &mut SectionEntry {
    if entries.is_empty() {
        entries.push(SectionEntry::default());
    }
    let last = entries.len() - 1;
    &mut entries[last]
}

fn append_description(entry: &mut SectionEntry, value: &str) {
    if value.is_empty() {
        return;
    }
    if !entry.description.is_empty() {
        entry.description.push(' ');
    }
    entry.description.push_str(value);
}

//! Google-style section parser.
//!
//! `Header:` introduces a section; its entries are the indented lines
//! beneath it until the next non-indented line. Argument entries are
//! strict: an entry line without a colon separator is a parse error
//! rather than a silently dropped line, since a missing separator
//! usually means the whole section would be misread.

use crate::args::{Arg, ArgList};
use crate::canon::canonicalize;
use crate::docstring::{
    is_indented, preamble_has_long_description, split_type_qualifiers, DocstringParseError,
    DocstringStructure, SectionEntry, SectionKind,
};

pub(crate) fn parse(body: &str) -> Result<DocstringStructure, DocstringParseError> {
    let lines: Vec<&str> = body.lines().collect();
    let mut out = DocstringStructure::default();

    let first = lines
        .iter()
        .position(|l| header_kind(l).is_some())
        .unwrap_or(lines.len());
    out.has_long_description = preamble_has_long_description(&lines, first);

    let mut i = 0;
    while i < lines.len() {
        let Some(kind) = header_kind(lines[i]) else {
            i += 1;
            continue;
        };
        let start = i + 1;
        let mut end = start;
        while end < lines.len() && (lines[end].trim().is_empty() || is_indented(lines[end])) {
            end += 1;
        }
        let content = &lines[start..end];
        match kind {
            SectionKind::Args => {
                out.has_args_section = true;
                parse_arg_entries("Args", content, &mut out.params, &mut out.optional_params)?;
            }
            SectionKind::Attributes => {
                out.has_attributes_section = true;
                let mut scratch = Vec::new();
                parse_arg_entries("Attributes", content, &mut out.attributes, &mut scratch)?;
            }
            SectionKind::Returns => {
                out.has_returns_section = true;
                parse_typed_entries(content, &mut out.return_entries);
            }
            SectionKind::Yields => {
                out.has_yields_section = true;
                parse_typed_entries(content, &mut out.yield_entries);
            }
            SectionKind::Raises => {
                out.has_raises_section = true;
                parse_raises(content, &mut out.raises);
            }
        }
        i = end;
    }
    Ok(out)
}

fn header_kind(line: &str) -> Option<SectionKind> {
    if is_indented(line) {
        return None;
    }
    let name = line.trim_end().strip_suffix(':')?;
    match name {
        "Args" | "Arguments" => Some(SectionKind::Args),
        "Returns" | "Return" => Some(SectionKind::Returns),
        "Yields" | "Yield" => Some(SectionKind::Yields),
        "Raises" | "Raise" => Some(SectionKind::Raises),
        "Attributes" => Some(SectionKind::Attributes),
        _ => None,
    }
}

fn indent_of(line: &str) -> usize {
    line.len() - line.trim_start().len()
}

/// Entry lines sit at the smallest indent in the section; anything
/// deeper continues the entry above it.
fn base_indent(content: &[&str]) -> usize {
    content
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| indent_of(l))
        .min()
        .unwrap_or(0)
}

/// `name (type): description` or `name: description`.
fn parse_arg_entries(
    section: &str,
    content: &[&str],
    list: &mut ArgList,
    optional: &mut Vec<String>,
) -> Result<(), DocstringParseError> {
    let base = base_indent(content);
    for line in content {
        if line.trim().is_empty() || indent_of(line) > base {
            continue;
        }
        let entry = line.trim();
        let Some((head, _)) = split_entry_colon(entry) else {
            return Err(DocstringParseError::MalformedEntry {
                section: section.to_string(),
                entry: entry.to_string(),
            });
        };
        let head = head.trim();
        let (name, raw_type) = match head.split_once('(') {
            Some((name, rest)) => {
                let rest = rest.trim_end();
                (name.trim(), rest.strip_suffix(')').unwrap_or(rest).trim())
            }
            None => (head, ""),
        };
        if name.is_empty() {
            continue;
        }
        let (stripped, had_qualifier) = split_type_qualifiers(raw_type);
        if had_qualifier {
            optional.push(name.to_string());
        }
        let type_hint = if stripped.is_empty() {
            String::new()
        } else {
            canonicalize(&stripped)
        };
        list.push(Arg::new(name, type_hint));
    }
    Ok(())
}

/// `type: description` rows, or free description when the head does not
/// look like a type.
fn parse_typed_entries(content: &[&str], entries: &mut Vec<SectionEntry>) {
    let base = base_indent(content);
    for line in content {
        if line.trim().is_empty() {
            continue;
        }
        if indent_of(line) > base {
            if let Some(entry) = entries.last_mut() {
                if !entry.description.is_empty() {
                    entry.description.push(' ');
                }
                entry.description.push_str(line.trim());
            }
            continue;
        }
        let text = line.trim();
        match split_entry_colon(text) {
            Some((head, desc)) if looks_like_type(head.trim()) => {
                let (stripped, _) = split_type_qualifiers(head.trim());
                entries.push(SectionEntry {
                    name: String::new(),
                    type_hint: if stripped.is_empty() {
                        String::new()
                    } else {
                        canonicalize(&stripped)
                    },
                    description: desc.trim().to_string(),
                });
            }
            _ => entries.push(SectionEntry {
                name: String::new(),
                type_hint: String::new(),
                description: text.to_string(),
            }),
        }
    }
}

fn parse_raises(content: &[&str], raises: &mut Vec<String>) {
    let base = base_indent(content);
    for line in content {
        if line.trim().is_empty() || indent_of(line) > base {
            continue;
        }
        let text = line.trim();
        let name = match split_entry_colon(text) {
            Some((head, _)) => head.trim(),
            None => text,
        };
        if !name.is_empty() {
            raises.push(name.to_string());
        }
    }
}

/// First colon outside any brackets; colons inside `dict[str, int]` or a
/// parenthesized type do not split the entry.
fn split_entry_colon(text: &str) -> Option<(&str, &str)> {
    let mut depth = 0i32;
    for (i, c) in text.char_indices() {
        match c {
            '[' | '(' => depth += 1,
            ']' | ')' => depth -= 1,
            ':' if depth == 0 => return Some((&text[..i], &text[i + 1..])),
            _ => {}
        }
    }
    None
}

/// A head counts as a type when it has no spaces outside brackets.
fn looks_like_type(head: &str) -> bool {
    if head.is_empty() {
        return false;
    }
    let mut depth = 0i32;
    for c in head.chars() {
        match c {
            '[' | '(' => depth += 1,
            ']' | ')' => depth -= 1,
            c if c.is_whitespace() && depth == 0 => return false,
            _ => {}
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docstring::dedent;

    fn parse_text(text: &str) -> Result<DocstringStructure, DocstringParseError> {
        parse(&dedent(text))
    }

    #[test]
    fn parses_args_with_parenthesized_types() {
        let text = "Do a thing.\n\nArgs:\n    arg1 (int): First.\n    arg2 (str, optional): Second.\n    flag: Untyped.\n";
        let doc = parse_text(text).unwrap();
        assert!(doc.has_args_section);
        assert_eq!(doc.params.len(), 3);
        assert_eq!(doc.params.get("arg1").unwrap().type_hint, "int");
        assert_eq!(doc.params.get("arg2").unwrap().type_hint, "str");
        assert_eq!(doc.params.get("flag").unwrap().type_hint, "");
        assert_eq!(doc.optional_params, vec!["arg2"]);
    }

    #[test]
    fn bracketed_type_may_contain_colons_and_commas() {
        let text = "S.\n\nArgs:\n    mapping (dict[str, int]): Maps names.\n";
        let doc = parse_text(text).unwrap();
        assert_eq!(doc.params.get("mapping").unwrap().type_hint, "dict[str, int]");
    }

    #[test]
    fn star_arguments_keep_their_stars() {
        let text = "S.\n\nArgs:\n    *args: Extras.\n    **kwargs (Any): Options.\n";
        let doc = parse_text(text).unwrap();
        assert!(doc.params.contains_name("*args"));
        assert_eq!(doc.params.get("**kwargs").unwrap().type_hint, "Any");
    }

    #[test]
    fn entry_without_separator_is_a_parse_error() {
        let text = "S.\n\nArgs:\n    x missing its separator\n";
        let err = parse_text(text).unwrap_err();
        assert!(err.to_string().contains("Args"));
        assert!(err.to_string().contains("colon"));
    }

    #[test]
    fn typed_and_untyped_return_rows() {
        let text = "S.\n\nReturns:\n    bool: Whether it worked.\n";
        let doc = parse_text(text).unwrap();
        assert_eq!(doc.return_types(), vec!["bool"]);
        assert_eq!(doc.return_entries[0].description, "Whether it worked.");

        let text = "S.\n\nReturns:\n    The result, described in prose.\n";
        let doc = parse_text(text).unwrap();
        assert!(doc.has_returns_section);
        assert!(doc.return_types().is_empty());
    }

    #[test]
    fn compound_return_type_is_one_row() {
        let text = "S.\n\nReturns:\n    tuple[int, str]: Pair of code and message.\n";
        let doc = parse_text(text).unwrap();
        assert_eq!(doc.return_types(), vec!["tuple[int, str]"]);
    }

    #[test]
    fn yields_rows_parse_like_returns() {
        let text = "S.\n\nYields:\n    int: Next value.\n";
        let doc = parse_text(text).unwrap();
        assert!(doc.has_yields_section);
        assert_eq!(doc.yield_types(), vec!["int"]);
    }

    #[test]
    fn raises_entries_list_exception_names() {
        let text = "S.\n\nRaises:\n    ValueError: If empty.\n    KeyError: If missing.\n";
        let doc = parse_text(text).unwrap();
        assert_eq!(doc.raises, vec!["ValueError", "KeyError"]);
    }

    #[test]
    fn section_ends_at_first_unindented_line() {
        let text = "S.\n\nArgs:\n    x (int): Value.\nTrailing prose outside the section.\n";
        let doc = parse_text(text).unwrap();
        assert_eq!(doc.params.len(), 1);
    }

    #[test]
    fn description_continuations_attach_to_the_entry_above() {
        let text = "S.\n\nReturns:\n    int: First line\n        and the rest of it.\n";
        let doc = parse_text(text).unwrap();
        assert_eq!(
            doc.return_entries[0].description,
            "First line and the rest of it."
        );
    }
}

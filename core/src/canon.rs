//! Type-annotation canonicalization.
//!
//! Docstring type strings and signature annotations arrive with different
//! quoting, spacing, and wrapping habits. Both sides are pushed through the
//! same canonicalizer before any comparison:
//!
//! - surrounding backticks are stripped (up to two levels),
//! - quote characters are stripped except inside `Literal[...]`,
//! - the remainder is parsed as a Python expression and re-rendered with
//!   canonical token spacing (`dict[str, int]`, `int | None`), dropping
//!   trailing commas before closing brackets.
//!
//! Text that does not parse as a single expression is returned with collapsed
//! whitespace but otherwise unchanged, so canonicalization never loses input
//! and stays idempotent.

use tree_sitter::{Node, Parser};

/// Canonical form of a type string from either source.
pub fn canonicalize(raw: &str) -> String {
    let mut text = raw.trim();
    for _ in 0..2 {
        if text.len() >= 2 && text.starts_with('`') && text.ends_with('`') {
            text = text[1..text.len() - 1].trim();
        }
    }
    if text.is_empty() {
        return String::new();
    }

    let stripped = strip_quotes_outside_literal(text);
    let collapsed = collapse_whitespace(&stripped);
    match render_expression(&collapsed) {
        Some(rendered) => rendered,
        None => collapsed,
    }
}

/// Position-wise equality that treats `'` and `"` as the same character.
///
/// Quote presence still matters (a quoted and an unquoted value differ);
/// only the choice of quote character is forgiven. Used where one side
/// kept its quotes intact inside `Literal[...]` but the author quoted
/// differently.
pub fn quote_insensitive_eq(a: &str, b: &str) -> bool {
    fold_quotes(a).eq(fold_quotes(b))
}

/// Map `"` to `'` so position-wise comparison ignores quote style.
pub(crate) fn fold_quotes(s: &str) -> impl Iterator<Item = char> + '_ {
    s.chars().map(|c| if c == '"' { '\'' } else { c })
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Remove quote characters unless the position is inside a `Literal[...]`
/// subscript, where quoted values are meaningful.
fn strip_quotes_outside_literal(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    // One entry per open bracket: whether that span is Literal-protected.
    let mut brackets: Vec<bool> = Vec::new();
    let mut word = String::new();

    for ch in text.chars() {
        match ch {
            '[' => {
                let inherited = brackets.last().copied().unwrap_or(false);
                let own = word == "Literal" || word.ends_with(".Literal");
                brackets.push(inherited || own);
                word.clear();
                out.push(ch);
            }
            ']' => {
                brackets.pop();
                word.clear();
                out.push(ch);
            }
            '\'' | '"' => {
                if brackets.last().copied().unwrap_or(false) {
                    out.push(ch);
                }
                word.clear();
            }
            c if c.is_alphanumeric() || c == '_' || c == '.' => {
                word.push(c);
                out.push(c);
            }
            c => {
                word.clear();
                out.push(c);
            }
        }
    }
    out
}

/// Parse `text` as one Python expression and re-render its tokens with
/// canonical spacing. `None` when the fragment is not a single clean
/// expression.
fn render_expression(text: &str) -> Option<String> {
    let mut parser = Parser::new();
    let lang = tree_sitter_python::LANGUAGE;
    parser.set_language(&lang.into()).ok()?;
    let tree = parser.parse(text, None)?;
    let root = tree.root_node();
    if root.has_error() || root.named_child_count() != 1 {
        return None;
    }
    let stmt = root.named_child(0)?;
    if stmt.kind() != "expression_statement" {
        return None;
    }
    let expr = stmt.named_child(0)?;

    let mut tokens = Vec::new();
    collect_tokens(expr, text, &mut tokens);
    Some(join_tokens(&tokens))
}

fn collect_tokens(node: Node, src: &str, out: &mut Vec<String>) {
    // Strings are kept whole so their quote/content pieces never get spaced.
    if node.kind() == "string" || node.child_count() == 0 {
        let text = node.utf8_text(src.as_bytes()).unwrap_or("");
        if !text.is_empty() {
            out.push(text.to_string());
        }
        return;
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_tokens(child, src, out);
    }
}

fn join_tokens(tokens: &[String]) -> String {
    const NO_SPACE_BEFORE: &[&str] = &["[", "]", "(", ")", ",", ".", ":"];
    const NO_SPACE_AFTER: &[&str] = &["[", "(", ".", ":", "*", "**", "~", "-", "+"];

    let mut out = String::new();
    let mut prev: Option<&str> = None;
    for (i, tok) in tokens.iter().enumerate() {
        if tok == "," {
            // Trailing comma directly before a closer is dropped.
            if matches!(tokens.get(i + 1).map(String::as_str), Some("]") | Some(")")) {
                continue;
            }
        }
        if let Some(p) = prev {
            let tight = NO_SPACE_BEFORE.contains(&tok.as_str()) || NO_SPACE_AFTER.contains(&p);
            if !tight {
                out.push(' ');
            }
        }
        out.push_str(tok);
        prev = Some(tok.as_str());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_spacing_in_generics() {
        assert_eq!(canonicalize("dict[ str,int ]"), "dict[str, int]");
        assert_eq!(canonicalize("Dict[str,  int]"), "Dict[str, int]");
        assert_eq!(canonicalize("Callable[...,int]"), "Callable[..., int]");
        assert_eq!(canonicalize("Callable[[int ,str], bool]"), "Callable[[int, str], bool]");
    }

    #[test]
    fn normalizes_union_spacing() {
        assert_eq!(canonicalize("int|None"), "int | None");
        assert_eq!(canonicalize("int  |  None"), "int | None");
    }

    #[test]
    fn strips_surrounding_quotes_and_backticks() {
        assert_eq!(canonicalize("\"int\""), "int");
        assert_eq!(canonicalize("'int'"), "int");
        assert_eq!(canonicalize("`int`"), "int");
        assert_eq!(canonicalize("``Optional[int]``"), "Optional[int]");
    }

    #[test]
    fn strips_forward_reference_quotes() {
        assert_eq!(canonicalize("List[\"MyClass\"]"), canonicalize("List[MyClass]"));
    }

    #[test]
    fn keeps_quotes_inside_literal() {
        assert_eq!(canonicalize("Literal['a','b']"), "Literal['a', 'b']");
        assert_eq!(canonicalize("typing.Literal[\"on\", \"off\"]"), "typing.Literal[\"on\", \"off\"]");
    }

    #[test]
    fn drops_trailing_comma_before_closer() {
        assert_eq!(canonicalize("tuple[*Shape,]"), "tuple[*Shape]");
        assert_eq!(canonicalize("tuple[int, str,]"), "tuple[int, str]");
    }

    #[test]
    fn keeps_dotted_names_tight() {
        assert_eq!(canonicalize("typing . Dict[str, int]"), "typing.Dict[str, int]");
        assert_eq!(canonicalize("np.ndarray"), "np.ndarray");
    }

    #[test]
    fn negative_literal_stays_tight() {
        assert_eq!(canonicalize("Literal[-1, 1]"), "Literal[-1, 1]");
    }

    #[test]
    fn unparseable_text_collapses_whitespace_only() {
        assert_eq!(canonicalize("int or   None"), "int or None");
        assert_eq!(canonicalize("a :: b"), "a :: b");
    }

    #[test]
    fn canonicalize_is_idempotent() {
        for raw in [
            "dict[ str,int ]",
            "`Optional[int]`",
            "Literal['a','b']",
            "int|None",
            "some free-form prose type",
            "tuple[*Shape,]",
        ] {
            let once = canonicalize(raw);
            assert_eq!(canonicalize(&once), once, "not idempotent for {raw:?}");
        }
    }

    #[test]
    fn multiline_annotation_is_joined() {
        assert_eq!(canonicalize("int |\n    str"), "int | str");
    }

    #[test]
    fn quote_insensitive_eq_ignores_quote_style_only() {
        assert!(quote_insensitive_eq("Literal['a', 'b']", "Literal[\"a\", \"b\"]"));
        assert!(quote_insensitive_eq("int", "int"));
        assert!(!quote_insensitive_eq("int", "str"));
        // Presence and position of quotes still count.
        assert!(!quote_insensitive_eq("Literal['a']", "Literal[a]"));
        assert!(!quote_insensitive_eq("'ab", "ab'"));
    }

    #[test]
    fn empty_input_stays_empty() {
        assert_eq!(canonicalize(""), "");
        assert_eq!(canonicalize("   "), "");
        assert_eq!(canonicalize("``"), "");
    }
}

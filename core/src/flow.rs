//! Function-body reachability facts.
//!
//! Walks a parsed function body and records what the body can actually
//! do: return a value, return bare, yield, raise. Statements inside
//! nested `def`s and lambdas belong to the nested scope and are not
//! attributed to the enclosing function. Also analyzes return
//! annotations for generator-ness and extracts the yield/return type
//! parameters used by the yield checks.

use std::collections::HashMap;

use tree_sitter::{Node, Parser};

use crate::canon::canonicalize;

/// What a function body was observed to do.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReachabilityFacts {
    /// At least one `return <expr>` where the expression is not `None`.
    pub has_return_value: bool,
    /// At least one `return` or `return None`.
    pub has_bare_return: bool,
    pub has_yield: bool,
    pub has_raise: bool,
    /// Raised exception names, alias-resolved, sorted, deduplicated.
    pub raised: Vec<String>,
}

/// Collect reachability facts for one function body.
pub fn analyze_body(body: Node<'_>, src: &str) -> ReachabilityFacts {
    let mut facts = ReachabilityFacts::default();
    let mut aliases: HashMap<String, String> = HashMap::new();
    let mut raised: Vec<String> = Vec::new();

    let mut stack = vec![body];
    while let Some(node) = stack.pop() {
        match node.kind() {
            // Nested scopes own their control flow.
            "function_definition" | "lambda" => continue,
            "return_statement" => match node.named_child(0) {
                Some(expr) if expr.kind() != "none" => facts.has_return_value = true,
                _ => facts.has_bare_return = true,
            },
            "yield" => facts.has_yield = true,
            "raise_statement" => {
                facts.has_raise = true;
                if let Some(name) = raised_name(node, src) {
                    raised.push(name);
                }
            }
            "assignment" => record_alias(node, src, &mut aliases),
            _ => {}
        }
        for i in (0..node.child_count()).rev() {
            if let Some(child) = node.child(i) {
                stack.push(child);
            }
        }
    }

    let mut resolved: Vec<String> = raised
        .into_iter()
        .map(|name| {
            if name.contains('.') {
                name
            } else {
                aliases.get(&name).cloned().unwrap_or(name)
            }
        })
        .collect();
    resolved.sort();
    resolved.dedup();
    facts.raised = resolved;
    facts
}

/// Name of the exception in a `raise` statement, if it has one.
fn raised_name(node: Node<'_>, src: &str) -> Option<String> {
    let raised = node.named_child(0)?;
    let target = if raised.kind() == "call" {
        raised.child_by_field_name("function")?
    } else {
        raised
    };
    match target.kind() {
        "identifier" | "attribute" => Some(node_text(target, src)),
        _ => None,
    }
}

/// Record `name = SomeException` / `name = SomeException(...)` so a later
/// `raise name` resolves to the exception. Last assignment wins.
fn record_alias(node: Node<'_>, src: &str, aliases: &mut HashMap<String, String>) {
    let (Some(left), Some(right)) = (
        node.child_by_field_name("left"),
        node.child_by_field_name("right"),
    ) else {
        return;
    };
    if left.kind() != "identifier" {
        return;
    }
    let value = if right.kind() == "call" {
        match right.child_by_field_name("function") {
            Some(function) => function,
            None => return,
        }
    } else {
        right
    };
    if matches!(value.kind(), "identifier" | "attribute") {
        aliases.insert(node_text(left, src), node_text(value, src));
    }
}

const GENERATOR_NAMES: &[&str] = &[
    "Generator",
    "AsyncGenerator",
    "Iterator",
    "AsyncIterator",
    "Iterable",
    "AsyncIterable",
];

/// True when the return annotation denotes a generator or iterator,
/// including behind `Optional`, `Union`, or a PEP 604 union.
pub fn annotation_is_generator_like(anno: &str) -> bool {
    let canon = canonicalize(anno);
    if canon.is_empty() {
        return false;
    }
    with_parsed_expr(&canon, |expr, src| find_generator(expr, src).is_some()).unwrap_or(false)
}

/// The yield type carried by a generator-like annotation.
///
/// `Generator[Y, S, R]` and `AsyncGenerator[Y, S]` yield `Y`;
/// `Iterator[Y]` and the other single-parameter forms yield their sole
/// parameter. Anything else falls back to the whole annotation.
pub fn yield_type_of(anno: &str) -> String {
    let canon = canonicalize(anno);
    let extracted = with_parsed_expr(&canon, |expr, src| {
        let gen = find_generator(expr, src)?;
        if gen.kind() != "subscript" {
            return None;
        }
        subscript_params(gen, src).into_iter().next()
    })
    .flatten();
    match extracted {
        Some(param) => canonicalize(&param),
        None => canon,
    }
}

/// The return type slot of a three-parameter `Generator[Y, S, R]`.
pub fn generator_return_type(anno: &str) -> Option<String> {
    let canon = canonicalize(anno);
    with_parsed_expr(&canon, |expr, src| {
        let gen = find_generator(expr, src)?;
        if gen.kind() != "subscript" {
            return None;
        }
        let value = gen.child_by_field_name("value")?;
        let name = node_text(value, src);
        if last_component(&name) != "Generator" {
            return None;
        }
        let params = subscript_params(gen, src);
        if params.len() == 3 {
            params.into_iter().nth(2)
        } else {
            None
        }
    })
    .flatten()
    .map(|param| canonicalize(&param))
}

/// Elements of a decomposable tuple annotation.
///
/// numpy-style docstrings may document `tuple[int, str]` as one row per
/// element. Only a plain top-level `tuple`/`Tuple` subscript with at
/// least two elements and no `...` decomposes.
pub fn tuple_elements(anno: &str) -> Option<Vec<String>> {
    let canon = canonicalize(anno);
    with_parsed_expr(&canon, |expr, src| {
        if expr.kind() != "subscript" {
            return None;
        }
        let value = expr.child_by_field_name("value")?;
        let name = node_text(value, src);
        if !matches!(last_component(&name), "tuple" | "Tuple") {
            return None;
        }
        let params = subscript_params(expr, src);
        if params.len() < 2 || params.iter().any(|p| p == "...") {
            return None;
        }
        Some(params.iter().map(|p| canonicalize(p)).collect())
    })
    .flatten()
}

/// Locate the generator-like node inside an annotation expression.
fn find_generator<'a>(node: Node<'a>, src: &str) -> Option<Node<'a>> {
    match node.kind() {
        "subscript" => {
            let value = node.child_by_field_name("value")?;
            let name = node_text(value, src);
            let last = last_component(&name);
            if GENERATOR_NAMES.contains(&last) {
                return Some(node);
            }
            if matches!(last, "Optional" | "Union") {
                let params: Vec<Node> = {
                    let mut cursor = node.walk();
                    node.children_by_field_name("subscript", &mut cursor).collect()
                };
                for param in params {
                    if let Some(found) = find_generator(param, src) {
                        return Some(found);
                    }
                }
            }
            None
        }
        "binary_operator" => {
            let operator = node.child_by_field_name("operator")?;
            if node_text(operator, src) != "|" {
                return None;
            }
            let left = node.child_by_field_name("left")?;
            if let Some(found) = find_generator(left, src) {
                return Some(found);
            }
            find_generator(node.child_by_field_name("right")?, src)
        }
        "identifier" | "attribute" => {
            let name = node_text(node, src);
            if GENERATOR_NAMES.contains(&last_component(&name)) {
                Some(node)
            } else {
                None
            }
        }
        "parenthesized_expression" => find_generator(node.named_child(0)?, src),
        _ => None,
    }
}

/// Top-level subscript parameters of `value[a, b, c]`, as text.
fn subscript_params(node: Node<'_>, src: &str) -> Vec<String> {
    let mut cursor = node.walk();
    node.children_by_field_name("subscript", &mut cursor)
        .map(|param| node_text(param, src))
        .collect()
}

/// Parse `text` as a single Python expression and hand the expression
/// node to `f`. Returns `None` when the text does not parse cleanly.
fn with_parsed_expr<T>(text: &str, f: impl FnOnce(Node<'_>, &str) -> T) -> Option<T> {
    let mut parser = Parser::new();
    let lang = tree_sitter_python::LANGUAGE;
    if parser.set_language(&lang.into()).is_err() {
        return None;
    }
    let tree = parser.parse(text, None)?;
    let root = tree.root_node();
    if root.has_error() {
        return None;
    }
    let stmt = root.named_child(0)?;
    if stmt.kind() != "expression_statement" {
        return None;
    }
    let expr = stmt.named_child(0)?;
    Some(f(expr, text))
}

fn last_component(text: &str) -> &str {
    text.rsplit('.').next().unwrap_or(text)
}

fn node_text(node: Node<'_>, src: &str) -> String {
    node.utf8_text(src.as_bytes()).unwrap_or("").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn facts_of(src: &str) -> ReachabilityFacts {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_python::LANGUAGE.into())
            .unwrap();
        let tree = parser.parse(src, None).unwrap();
        let mut stack = vec![tree.root_node()];
        while let Some(node) = stack.pop() {
            if node.kind() == "function_definition" {
                let body = node.child_by_field_name("body").unwrap();
                return analyze_body(body, src);
            }
            for i in (0..node.child_count()).rev() {
                if let Some(child) = node.child(i) {
                    stack.push(child);
                }
            }
        }
        panic!("no function in test source");
    }

    #[test]
    fn return_with_value_is_detected() {
        let facts = facts_of("def f():\n    return 1\n");
        assert!(facts.has_return_value);
        assert!(!facts.has_bare_return);
    }

    #[test]
    fn bare_and_none_returns_are_grouped() {
        let facts = facts_of("def f(x):\n    if x:\n        return\n    return None\n");
        assert!(facts.has_bare_return);
        assert!(!facts.has_return_value);
    }

    #[test]
    fn nested_scopes_are_not_attributed() {
        let src = "def outer():\n    def inner():\n        yield 1\n    g = lambda: 5\n    inner()\n";
        let facts = facts_of(src);
        assert!(!facts.has_yield);
        assert!(!facts.has_return_value);
        assert!(!facts.has_raise);
    }

    #[test]
    fn yield_and_yield_from_are_detected() {
        let facts = facts_of("def f():\n    yield 1\n");
        assert!(facts.has_yield);
        let facts = facts_of("def f():\n    yield from range(3)\n");
        assert!(facts.has_yield);
    }

    #[test]
    fn raised_names_are_sorted_and_deduped() {
        let src =
            "def f():\n    raise ValueError('a')\n    raise errors.Custom\n    raise ValueError\n";
        let facts = facts_of(src);
        assert!(facts.has_raise);
        assert_eq!(facts.raised, vec!["ValueError", "errors.Custom"]);
    }

    #[test]
    fn raise_aliases_resolve_one_hop() {
        let src = "def f():\n    exc = errors.Bad('x')\n    raise exc\n";
        let facts = facts_of(src);
        assert_eq!(facts.raised, vec!["errors.Bad"]);
    }

    #[test]
    fn bare_raise_counts_without_a_name() {
        let src = "def f():\n    try:\n        g()\n    except KeyError:\n        raise\n";
        let facts = facts_of(src);
        assert!(facts.has_raise);
        assert!(facts.raised.is_empty());
    }

    #[test]
    fn generator_annotations_are_recognized() {
        assert!(annotation_is_generator_like("Iterator[int]"));
        assert!(annotation_is_generator_like("typing.Generator[int, None, None]"));
        assert!(annotation_is_generator_like("Optional[Iterator[str]]"));
        assert!(annotation_is_generator_like("Iterator[int] | None"));
        assert!(annotation_is_generator_like("Generator"));
        assert!(!annotation_is_generator_like("int"));
        assert!(!annotation_is_generator_like("list[int]"));
        assert!(!annotation_is_generator_like(""));
    }

    #[test]
    fn yield_type_is_extracted_per_family() {
        assert_eq!(yield_type_of("Generator[int, None, None]"), "int");
        assert_eq!(yield_type_of("AsyncIterator[str]"), "str");
        assert_eq!(yield_type_of("Iterator[tuple[int, str]]"), "tuple[int, str]");
        assert_eq!(yield_type_of("Optional[Iterator[bytes]]"), "bytes");
    }

    #[test]
    fn yield_type_falls_back_to_whole_annotation() {
        assert_eq!(yield_type_of("int"), "int");
        assert_eq!(yield_type_of("Generator"), "Generator");
    }

    #[test]
    fn tuple_annotations_decompose_only_when_concrete() {
        assert_eq!(
            tuple_elements("tuple[int, str]"),
            Some(vec!["int".to_string(), "str".to_string()])
        );
        assert_eq!(tuple_elements("Tuple[int, str, bool]").unwrap().len(), 3);
        assert_eq!(
            tuple_elements("typing.Tuple[dict[str, int], bytes]"),
            Some(vec!["dict[str, int]".to_string(), "bytes".to_string()])
        );
        assert_eq!(tuple_elements("tuple[int, ...]"), None);
        assert_eq!(tuple_elements("tuple[int]"), None);
        assert_eq!(tuple_elements("list[int]"), None);
        assert_eq!(tuple_elements("int"), None);
    }

    #[test]
    fn generator_return_slot_needs_three_params() {
        assert_eq!(
            generator_return_type("Generator[int, None, str]"),
            Some("str".to_string())
        );
        assert_eq!(generator_return_type("Iterator[int]"), None);
        assert_eq!(generator_return_type("AsyncGenerator[int, None]"), None);
        assert_eq!(generator_return_type("int"), None);
    }
}

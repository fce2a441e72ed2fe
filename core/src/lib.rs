//! Docguard core reconciliation engine.
//! Checks that Python docstrings agree with the code they document:
//! argument lists, type hints, return/yield sections, raised exceptions,
//! and class attributes, under a configurable strictness policy.

use serde::{Deserialize, Serialize};
use tree_sitter::{Node, Parser};

pub mod args;
pub mod baseline;
pub mod canon;
pub mod docstring;
pub mod flow;
mod google;
pub mod noqa;
mod numpy;
mod sphinx;
pub mod violation;
mod visitor;

pub use args::{Arg, ArgList};
pub use baseline::Baseline;
pub use canon::{canonicalize, quote_insensitive_eq};
pub use docstring::{DocstringParseError, DocstringStructure, SectionEntry, StyleAssessment};
pub use flow::ReachabilityFacts;
pub use violation::{Violation, ViolationCode};

/// Docstring section-header convention.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum DocstringStyle {
    Numpy,
    Google,
    Sphinx,
}

impl Default for DocstringStyle {
    fn default() -> Self {
        DocstringStyle::Numpy
    }
}

impl std::fmt::Display for DocstringStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            DocstringStyle::Numpy => "numpy",
            DocstringStyle::Google => "google",
            DocstringStyle::Sphinx => "sphinx",
        })
    }
}

/// Which line a `# noqa` comment must sit on to take effect.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum NoqaLocation {
    /// The definition's `def`/`class` header line.
    Definition,
    /// The line holding the docstring's closing quotes.
    Docstring,
    /// Suppression comments are ignored entirely.
    None,
}

impl Default for NoqaLocation {
    fn default() -> Self {
        NoqaLocation::Definition
    }
}

/// Top-level configuration for the checker.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub style: DocstringStyle,
    /// Compare type hints, not just argument names.
    pub check_type_hint: bool,
    /// Require docstring arguments in declaration order.
    pub check_arg_order: bool,
    /// Skip every check on summary-only docstrings.
    pub skip_checking_short_docstrings: bool,
    pub skip_checking_raises: bool,
    /// Let `__init__` carry its own docstring instead of the class one.
    pub allow_init_docstring: bool,
    pub require_return_section_when_returning_none: bool,
    pub require_yield_section_when_yielding_none: bool,
    pub check_return_types: bool,
    pub check_yield_types: bool,
    pub check_class_attributes: bool,
    /// Exempt `_`/`__` placeholder arguments from reconciliation.
    pub ignore_underscore_args: bool,
    /// Exempt `_name`-prefixed arguments from reconciliation.
    pub ignore_private_args: bool,
    /// Require `*args`/`**kwargs` to be documented like any argument.
    pub should_document_star_arguments: bool,
    /// Require defaulted arguments to be documented as optional.
    pub check_arg_defaults: bool,
    pub check_style_mismatch: bool,
    pub noqa_location: NoqaLocation,
    /// File globs the CLI skips when collecting inputs.
    pub exclude: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            style: DocstringStyle::Numpy,
            check_type_hint: true,
            check_arg_order: true,
            skip_checking_short_docstrings: true,
            skip_checking_raises: false,
            allow_init_docstring: false,
            require_return_section_when_returning_none: false,
            require_yield_section_when_yielding_none: false,
            check_return_types: true,
            check_yield_types: true,
            check_class_attributes: true,
            ignore_underscore_args: true,
            ignore_private_args: false,
            should_document_star_arguments: true,
            check_arg_defaults: false,
            check_style_mismatch: false,
            noqa_location: NoqaLocation::Definition,
            exclude: Vec::new(),
        }
    }
}

/// Compiled checker for one configuration, reusable across files.
pub struct Checker {
    config: Config,
}

impl Checker {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        // Fail fast if the grammar cannot be loaded; every other input
        // problem degrades into a violation instead of an error.
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_python::LANGUAGE.into())
            .map_err(|e| anyhow::anyhow!("failed to load Python grammar: {e}"))?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Check one file's source text.
    ///
    /// A file that does not parse yields a single file-level DOC002 and
    /// nothing else; otherwise the violations of every definition in the
    /// file, sorted by line then code.
    pub fn check_source(&self, src: &str) -> Vec<Violation> {
        let mut parser = Parser::new();
        if parser
            .set_language(&tree_sitter_python::LANGUAGE.into())
            .is_err()
        {
            return vec![file_error(1, "failed to load Python grammar")];
        }
        let Some(tree) = parser.parse(src, None) else {
            return vec![file_error(1, "parser produced no tree")];
        };
        let root = tree.root_node();
        if root.has_error() {
            let line = first_error_line(root);
            return vec![file_error(line, &format!("invalid syntax near line {line}"))];
        }
        visitor::check_tree(root, src, &self.config)
    }
}

fn file_error(line: usize, message: &str) -> Violation {
    Violation::with_suffix(line, ViolationCode::FileSyntaxError, "", message)
}

fn first_error_line(root: Node<'_>) -> usize {
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.is_error() || node.is_missing() {
            return node.start_position().row + 1;
        }
        for i in (0..node.child_count()).rev() {
            if let Some(child) = node.child(i) {
                stack.push(child);
            }
        }
    }
    1
}

//! Reconciliation engine.
//!
//! Walks the class/function tree of one parsed file, pairs every
//! definition with its docstring (including the class/constructor
//! special case), and runs the concern checks against the active
//! configuration: arguments, returns, yields, raises, class
//! attributes, style, and argument defaults. Definitions without a
//! docstring are skipped; whether docstrings must exist at all is a
//! different tool's concern.

use tree_sitter::Node;

use crate::args::{render_args, Arg, ArgList};
use crate::canon::{canonicalize, quote_insensitive_eq};
use crate::docstring::{self, DocstringStructure, StyleAssessment};
use crate::flow::{self, ReachabilityFacts};
use crate::noqa;
use crate::violation::{Violation, ViolationCode};
use crate::{Config, DocstringStyle, NoqaLocation};

pub(crate) fn check_tree(root: Node<'_>, src: &str, config: &Config) -> Vec<Violation> {
    let engine = Engine { src, config };
    let mut violations = Vec::new();
    engine.walk_block(root, &Parent::Module, &mut violations);
    violations.sort_by_key(|v| (v.line, v.code.value()));
    violations
}

/// What the current definition is nested in. Threaded by value through
/// the recursive walk instead of mutating a shared "current parent".
/// Carries the dotted path of the enclosing definition so nested names
/// render as `outer.inner` in violation prefixes.
#[derive(Debug, Clone)]
enum Parent {
    Module,
    Function {
        path: String,
    },
    Class {
        path: String,
        docstring: Option<DocstringText>,
    },
}

impl Parent {
    fn child_path(&self, name: &str) -> String {
        match self {
            Parent::Module => name.to_string(),
            Parent::Function { path } | Parent::Class { path, .. } => format!("{path}.{name}"),
        }
    }
}

/// A docstring literal with the lines noqa suppression can attach to.
#[derive(Debug, Clone)]
struct DocstringText {
    text: String,
    closing_line: usize,
}

/// Codes emitted by the list cascade, for arguments or attributes.
struct CascadeCodes {
    fewer: ViolationCode,
    more: ViolationCode,
    differ: ViolationCode,
    order: ViolationCode,
    types: ViolationCode,
    noun: &'static str,
    code_side: &'static str,
}

const ARG_CODES: CascadeCodes = CascadeCodes {
    fewer: ViolationCode::FewerArgsInDocstring,
    more: ViolationCode::MoreArgsInDocstring,
    differ: ViolationCode::ArgsDiffer,
    order: ViolationCode::ArgOrderDiffers,
    types: ViolationCode::ArgTypeHintsDiffer,
    noun: "Arguments",
    code_side: "the function signature",
};

const ATTR_CODES: CascadeCodes = CascadeCodes {
    fewer: ViolationCode::FewerAttrsInDocstring,
    more: ViolationCode::MoreAttrsInDocstring,
    differ: ViolationCode::AttrsDiffer,
    order: ViolationCode::AttrOrderDiffers,
    types: ViolationCode::AttrTypeHintsDiffer,
    noun: "Attributes",
    code_side: "the class definition",
};

struct Engine<'a> {
    src: &'a str,
    config: &'a Config,
}

impl Engine<'_> {
    fn walk_block(&self, node: Node<'_>, parent: &Parent, out: &mut Vec<Violation>) {
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            match child.kind() {
                "function_definition" => self.enter_function(child, &[], parent, out),
                "class_definition" => self.enter_class(child, parent, out),
                "decorated_definition" => {
                    let decorators = decorator_names(child, self.src);
                    if let Some(inner) = child.child_by_field_name("definition") {
                        match inner.kind() {
                            "function_definition" => {
                                self.enter_function(inner, &decorators, parent, out)
                            }
                            "class_definition" => self.enter_class(inner, parent, out),
                            _ => {}
                        }
                    }
                }
                _ => self.walk_block(child, parent, out),
            }
        }
    }

    fn enter_function(
        &self,
        node: Node<'_>,
        decorators: &[String],
        parent: &Parent,
        out: &mut Vec<Violation>,
    ) {
        let name = field_text(node, "name", self.src);
        self.check_function(node, &name, decorators, parent, out);
        if let Some(body) = node.child_by_field_name("body") {
            let parent = Parent::Function {
                path: parent.child_path(&name),
            };
            self.walk_block(body, &parent, out);
        }
    }

    fn enter_class(&self, node: Node<'_>, parent: &Parent, out: &mut Vec<Violation>) {
        let name = field_text(node, "name", self.src);
        let path = parent.child_path(&name);
        let Some(body) = node.child_by_field_name("body") else {
            return;
        };
        let class_doc = docstring_of(body, self.src);
        let init_has_doc = self.init_docstring_present(body);
        self.check_class(node, body, &path, class_doc.as_ref(), init_has_doc, out);
        let parent = Parent::Class {
            path,
            docstring: class_doc,
        };
        self.walk_block(body, &parent, out);
    }

    /// Whether the class body holds an `__init__` carrying its own
    /// docstring. The 304/305 redundancy checks only apply then; a
    /// docstring-less constructor is served by the class docstring, so
    /// its argument section belongs exactly where it is.
    fn init_docstring_present(&self, body: Node<'_>) -> bool {
        let mut cursor = body.walk();
        for child in body.named_children(&mut cursor) {
            let def = match child.kind() {
                "function_definition" => Some(child),
                "decorated_definition" => child.child_by_field_name("definition"),
                _ => None,
            };
            let Some(def) = def else {
                continue;
            };
            if def.kind() != "function_definition" {
                continue;
            }
            if field_text(def, "name", self.src) != "__init__" {
                continue;
            }
            return def
                .child_by_field_name("body")
                .and_then(|b| docstring_of(b, self.src))
                .is_some();
        }
        false
    }

    fn check_class(
        &self,
        node: Node<'_>,
        body: Node<'_>,
        path: &str,
        doc_text: Option<&DocstringText>,
        init_has_doc: bool,
        out: &mut Vec<Violation>,
    ) {
        let Some(doc_text) = doc_text else {
            return;
        };
        let line = node.start_position().row + 1;
        let label = format!("Class `{path}`");

        let (doc, mut local) = self.parse_docstring(doc_text, &label, line);
        if self.config.skip_checking_short_docstrings && doc.is_short() {
            self.apply_noqa(line, Some(doc_text), local, out);
            return;
        }

        if doc.has_returns_section {
            local.push(Violation::new(
                line,
                ViolationCode::ReturnsInClassDocstring,
                format!("{label}:"),
            ));
        }
        if doc.has_yields_section {
            local.push(Violation::new(
                line,
                ViolationCode::YieldsInClassDocstring,
                format!("{label}:"),
            ));
        }
        if self.config.allow_init_docstring && init_has_doc {
            if doc.has_args_section {
                local.push(Violation::new(
                    line,
                    ViolationCode::ArgsInClassDocstring,
                    format!("{label}:"),
                ));
            }
            if doc.has_raises_section {
                local.push(Violation::new(
                    line,
                    ViolationCode::RaisesInClassDocstring,
                    format!("{label}:"),
                ));
            }
        }

        if self.config.check_class_attributes {
            let attributes = self.class_attributes(body);
            let documented = doc.attributes.filter_names(|n| !n.starts_with('_'));
            self.compare_lists(&attributes, &documented, &ATTR_CODES, &label, line, &mut local);
        }

        self.apply_noqa(line, Some(doc_text), local, out);
    }

    /// Direct, non-underscore assignments in the class body. Statements
    /// inside methods are instance state, not class attributes.
    fn class_attributes(&self, body: Node<'_>) -> ArgList {
        let mut list = ArgList::new();
        let mut cursor = body.walk();
        for child in body.named_children(&mut cursor) {
            if child.kind() != "expression_statement" {
                continue;
            }
            let Some(expr) = child.named_child(0) else {
                continue;
            };
            if expr.kind() != "assignment" {
                continue;
            }
            let Some(left) = expr.child_by_field_name("left") else {
                continue;
            };
            if left.kind() != "identifier" {
                continue;
            }
            let name = node_text(left, self.src);
            if name.starts_with('_') {
                continue;
            }
            let type_hint = expr
                .child_by_field_name("type")
                .map(|t| canonicalize(&node_text(t, self.src)))
                .unwrap_or_default();
            list.push(Arg::new(name, type_hint));
        }
        list
    }

    fn check_function(
        &self,
        node: Node<'_>,
        name: &str,
        decorators: &[String],
        parent: &Parent,
        out: &mut Vec<Violation>,
    ) {
        if has_decorator(decorators, "overload") {
            return;
        }
        let line = node.start_position().row + 1;
        let Some(params_node) = node.child_by_field_name("parameters") else {
            return;
        };
        let Some(body) = node.child_by_field_name("body") else {
            return;
        };

        let own_doc = docstring_of(body, self.src);
        let (class_path, class_doc) = match parent {
            Parent::Class { path, docstring } => (Some(path.as_str()), docstring.as_ref()),
            _ => (None, None),
        };
        let is_init = class_path.is_some() && name == "__init__";

        let qual = parent.child_path(name);
        let label = match class_path {
            Some(_) => format!("Method `{qual}`"),
            None => format!("Function `{qual}`"),
        };

        let mut local: Vec<Violation> = Vec::new();
        let mut used_doc = own_doc.as_ref();
        let mut uses_own_init_doc = false;
        if is_init {
            match (&own_doc, self.config.allow_init_docstring) {
                (Some(_), false) => {
                    let class_label = match class_path {
                        Some(class) => format!("Class `{class}`:"),
                        None => format!("{label}:"),
                    };
                    local.push(Violation::new(
                        line,
                        ViolationCode::SeparateInitDocstring,
                        class_label,
                    ));
                    used_doc = class_doc;
                }
                (Some(_), true) => uses_own_init_doc = true,
                (None, _) => used_doc = class_doc,
            }
        }
        let Some(doc_text) = used_doc else {
            self.apply_noqa(line, None, local, out);
            return;
        };

        let (doc, parse_violations) = self.parse_docstring(doc_text, &label, line);
        local.extend(parse_violations);

        if self.config.skip_checking_short_docstrings && doc.is_short() {
            self.apply_noqa(line, Some(doc_text), local, out);
            return;
        }

        if uses_own_init_doc {
            let class_label = match class_path {
                Some(class) => format!("Class `{class}`:"),
                None => format!("{label}:"),
            };
            if doc.has_returns_section {
                local.push(Violation::new(
                    line,
                    ViolationCode::ReturnsInInitDocstring,
                    class_label.clone(),
                ));
            }
            if doc.has_yields_section {
                local.push(Violation::new(
                    line,
                    ViolationCode::YieldsInInitDocstring,
                    class_label,
                ));
            }
        }

        let drop_receiver = class_path.is_some() && !has_decorator(decorators, "staticmethod");
        let (sig, defaults) = self.signature_args(params_node, drop_receiver);
        self.check_arguments(&sig, &defaults, &doc, &label, line, &mut local);

        let facts = flow::analyze_body(body, self.src);
        let anno = node
            .child_by_field_name("return_type")
            .map(|t| canonicalize(&node_text(t, self.src)));

        if is_init {
            self.check_raises(&facts, &doc, &label, line, &mut local);
        } else {
            let generator_slot = anno.as_deref().and_then(flow::generator_return_type);
            let mixed = facts.has_yield && facts.has_return_value && generator_slot.is_none();
            if mixed {
                local.push(Violation::new(
                    line,
                    ViolationCode::MixedReturnAndYield,
                    label.clone(),
                ));
            }
            self.check_yields(&facts, anno.as_deref(), &doc, &label, line, &mut local);
            if !mixed {
                let is_property = has_decorator(decorators, "property")
                    || has_decorator(decorators, "cached_property");
                self.check_returns(
                    &facts,
                    anno.as_deref(),
                    generator_slot.as_deref(),
                    &doc,
                    is_property,
                    &label,
                    line,
                    &mut local,
                );
            }
            self.check_raises(&facts, &doc, &label, line, &mut local);
        }

        self.apply_noqa(line, Some(doc_text), local, out);
    }

    /// Scan for style markers, emit DOC003 as configured, then parse
    /// with the effective style. A grammar rejection degrades to an
    /// empty structure plus DOC001 so the remaining checks still run.
    fn parse_docstring(
        &self,
        doc_text: &DocstringText,
        label: &str,
        line: usize,
    ) -> (DocstringStructure, Vec<Violation>) {
        let mut local = Vec::new();
        let declared = self.config.style;
        let assessment = docstring::assess_style(&doc_text.text, declared);
        let effective = match &assessment {
            StyleAssessment::Mismatch(detected) => *detected,
            _ => declared,
        };
        if self.config.check_style_mismatch {
            match &assessment {
                StyleAssessment::Consistent => {}
                StyleAssessment::Mismatch(detected) => {
                    local.push(Violation::with_suffix(
                        line,
                        ViolationCode::StyleMismatch,
                        format!("{label}:"),
                        format!(
                            "You specified \"{declared}\" style, but this docstring is likely \
                             written in \"{detected}\" style."
                        ),
                    ));
                }
                StyleAssessment::Ambiguous(found) => {
                    let names: Vec<String> = found.iter().map(|s| format!("\"{s}\"")).collect();
                    local.push(Violation::with_suffix(
                        line,
                        ViolationCode::StyleMismatch,
                        format!("{label}:"),
                        format!(
                            "You specified \"{declared}\" style, but this docstring mixes \
                             markers of several styles: [{}].",
                            names.join(", ")
                        ),
                    ));
                }
            }
        }
        match docstring::parse(&doc_text.text, effective) {
            Ok(parsed) => (parsed, local),
            Err(err) => {
                local.push(Violation::with_suffix(
                    line,
                    ViolationCode::DocstringParseError,
                    format!("{label}:"),
                    err.to_string(),
                ));
                (DocstringStructure::empty(effective), local)
            }
        }
    }

    fn signature_args(&self, params: Node<'_>, drop_receiver: bool) -> (ArgList, Vec<String>) {
        let mut list = ArgList::new();
        let mut defaults = Vec::new();
        let mut cursor = params.walk();
        for child in params.named_children(&mut cursor) {
            match child.kind() {
                "identifier" => list.push(Arg::untyped(node_text(child, self.src))),
                "typed_parameter" => {
                    let Some(pattern) = child.named_child(0) else {
                        continue;
                    };
                    let type_hint = child
                        .child_by_field_name("type")
                        .map(|t| canonicalize(&node_text(t, self.src)))
                        .unwrap_or_default();
                    list.push(Arg::new(node_text(pattern, self.src), type_hint));
                }
                "default_parameter" => {
                    let Some(name_node) = child.child_by_field_name("name") else {
                        continue;
                    };
                    let name = node_text(name_node, self.src);
                    defaults.push(name.clone());
                    list.push(Arg::untyped(name));
                }
                "typed_default_parameter" => {
                    let Some(name_node) = child.child_by_field_name("name") else {
                        continue;
                    };
                    let name = node_text(name_node, self.src);
                    let type_hint = child
                        .child_by_field_name("type")
                        .map(|t| canonicalize(&node_text(t, self.src)))
                        .unwrap_or_default();
                    defaults.push(name.clone());
                    list.push(Arg::new(name, type_hint));
                }
                "list_splat_pattern" | "dictionary_splat_pattern" => {
                    list.push(Arg::untyped(node_text(child, self.src)));
                }
                _ => {}
            }
        }
        if drop_receiver {
            let is_receiver = list
                .iter()
                .next()
                .map_or(false, |first| first.name == "self" || first.name == "cls");
            if is_receiver {
                list.remove_first();
            }
        }
        (list, defaults)
    }

    fn check_arguments(
        &self,
        sig: &ArgList,
        defaults: &[String],
        doc: &DocstringStructure,
        label: &str,
        line: usize,
        out: &mut Vec<Violation>,
    ) {
        let cfg = self.config;
        let keep = |name: &str| {
            let bare = name.trim_start_matches('*');
            let underscores_only = !bare.is_empty() && bare.chars().all(|c| c == '_');
            if cfg.ignore_underscore_args && underscores_only {
                return false;
            }
            if cfg.ignore_private_args && bare.starts_with('_') && !underscores_only {
                return false;
            }
            true
        };
        let mut sig = sig.filter_names(keep);
        let mut documented = doc.params.filter_names(keep);

        if !cfg.should_document_star_arguments {
            documented = documented.with_stars_aligned(&sig);
            sig = sig.filter_names(|name| !name.starts_with('*') || documented.contains_name(name));
        }

        if cfg.check_type_hint {
            // Variadic parameters are conventionally left unhinted and
            // do not count toward hint coverage.
            let hintable = |list: &ArgList| -> (usize, usize) {
                let args: Vec<_> = list.iter().filter(|a| !a.name.starts_with('*')).collect();
                let typed = args.iter().filter(|a| a.has_type()).count();
                (typed, args.len())
            };
            let (typed, total) = hintable(&sig);
            if total > 0 {
                if typed == 0 {
                    out.push(Violation::new(
                        line,
                        ViolationCode::NoTypeHintsInSignature,
                        format!("{label}:"),
                    ));
                } else if typed < total {
                    out.push(Violation::new(
                        line,
                        ViolationCode::PartialTypeHintsInSignature,
                        format!("{label}:"),
                    ));
                }
            }
            let (typed, total) = hintable(&documented);
            if total > 0 {
                if typed == 0 {
                    out.push(Violation::new(
                        line,
                        ViolationCode::NoTypeHintsInDocstring,
                        format!("{label}:"),
                    ));
                } else if typed < total {
                    out.push(Violation::new(
                        line,
                        ViolationCode::PartialTypeHintsInDocstring,
                        format!("{label}:"),
                    ));
                }
            }
        }

        self.compare_lists(&sig, &documented, &ARG_CODES, label, line, out);

        if cfg.check_arg_defaults {
            let unmarked: Vec<Arg> = sig
                .iter()
                .filter(|a| defaults.contains(&a.name))
                .filter(|a| {
                    documented.contains_name(&a.name) && !doc.optional_params.contains(&a.name)
                })
                .cloned()
                .collect();
            if !unmarked.is_empty() {
                out.push(Violation::with_suffix(
                    line,
                    ViolationCode::ArgTypeHintsDiffer,
                    format!("{label}:"),
                    format!(
                        "{} (arguments with defaults should be documented as optional)",
                        render_args(&unmarked)
                    ),
                ));
            }
        }
    }

    /// The fixed cascade: length first (non-terminating), then the
    /// 4-way equality matrix to pick the most specific code(s).
    fn compare_lists(
        &self,
        reference: &ArgList,
        documented: &ArgList,
        codes: &CascadeCodes,
        label: &str,
        line: usize,
        out: &mut Vec<Violation>,
    ) {
        let ct = self.config.check_type_hint;
        let co = self.config.check_arg_order;
        if reference.is_empty() && documented.is_empty() {
            return;
        }
        if documented.len() < reference.len() {
            out.push(Violation::new(line, codes.fewer, format!("{label}:")));
        } else if documented.len() > reference.len() {
            out.push(Violation::new(line, codes.more, format!("{label}:")));
        }
        if documented.equals(reference, ct, co) {
            return;
        }
        if documented.equals(reference, false, false) {
            let order_ok = documented.equals(reference, false, true);
            let types_ok = documented.equals(reference, true, false);
            if co && !order_ok {
                out.push(Violation::new(line, codes.order, format!("{label}:")));
            }
            if ct && !types_ok {
                let mismatched: Vec<Arg> = reference
                    .type_mismatches(documented)
                    .into_iter()
                    .map(|(sig_arg, _)| sig_arg.clone())
                    .collect();
                out.push(Violation::with_suffix(
                    line,
                    codes.types,
                    format!("{label}:"),
                    render_args(&mismatched),
                ));
            }
        } else {
            let missing = reference.subtract(documented);
            let extra = documented.subtract(reference);
            let suffix = format!(
                "{noun} in {side} but not in the docstring: {missing}. \
                 {noun} in the docstring but not in {side}: {extra}.",
                noun = codes.noun,
                side = codes.code_side,
                missing = render_args(&missing),
                extra = render_args(&extra),
            );
            out.push(Violation::with_suffix(line, codes.differ, format!("{label}:"), suffix));
        }
    }

    fn check_returns(
        &self,
        facts: &ReachabilityFacts,
        anno: Option<&str>,
        generator_slot: Option<&str>,
        doc: &DocstringStructure,
        is_property: bool,
        label: &str,
        line: usize,
        out: &mut Vec<Violation>,
    ) {
        let cfg = self.config;
        let anno_is_none = anno == Some("None");
        let generator_like = anno.map_or(false, flow::annotation_is_generator_like);

        let needed = if facts.has_yield {
            // Only a Generator[..., R] with a meaningful R obliges the
            // docstring to describe a return value.
            facts.has_return_value && generator_slot.is_some_and(|slot| slot != "None")
        } else {
            !is_property
                && (facts.has_return_value
                    || (anno.is_some() && !anno_is_none && !generator_like)
                    || (cfg.require_return_section_when_returning_none
                        && (anno_is_none || (anno.is_none() && facts.has_bare_return))))
        };
        if needed && !doc.has_returns_section {
            out.push(Violation::new(
                line,
                ViolationCode::MissingReturnsSection,
                label,
            ));
        }

        if doc.has_returns_section
            && !facts.has_return_value
            && !facts.has_bare_return
            && !facts.has_yield
            && anno.is_none()
        {
            out.push(Violation::new(
                line,
                ViolationCode::UnnecessaryReturnsSection,
                label,
            ));
        }

        if cfg.check_return_types && doc.has_returns_section {
            let target = if facts.has_yield {
                generator_slot.map(str::to_string)
            } else {
                anno.map(str::to_string)
            };
            if let Some(target) = target {
                self.check_return_types(&target, doc, label, line, out);
            }
        }
    }

    /// Compare the annotation against the documented return rows.
    /// numpy style may decompose a tuple annotation into one row per
    /// element; either the combined or the decomposed form is accepted.
    fn check_return_types(
        &self,
        anno: &str,
        doc: &DocstringStructure,
        label: &str,
        line: usize,
        out: &mut Vec<Violation>,
    ) {
        let documented: Vec<String> = doc.return_types().iter().map(|s| s.to_string()).collect();
        let mut candidates: Vec<Vec<String>> = vec![vec![anno.to_string()]];
        if doc.style == DocstringStyle::Numpy {
            if let Some(elements) = flow::tuple_elements(anno) {
                candidates.push(elements);
            }
        }
        for candidate in &candidates {
            if type_lists_equal(candidate, &documented) {
                return;
            }
        }
        let best = candidates.iter().find(|c| c.len() == documented.len());
        let suffix = match best {
            Some(candidate) => format!(
                "Return annotation types: {}; docstring return section types: {}.",
                render_list(candidate),
                render_list(&documented)
            ),
            None => format!(
                "Return annotation has {} type(s); docstring return section has {} type(s).",
                candidates[0].len(),
                documented.len()
            ),
        };
        out.push(Violation::with_suffix(
            line,
            ViolationCode::ReturnTypesDiffer,
            label,
            suffix,
        ));
    }

    fn check_yields(
        &self,
        facts: &ReachabilityFacts,
        anno: Option<&str>,
        doc: &DocstringStructure,
        label: &str,
        line: usize,
        out: &mut Vec<Violation>,
    ) {
        let cfg = self.config;
        let generator_like = anno.map_or(false, flow::annotation_is_generator_like);

        if facts.has_yield && !doc.has_yields_section {
            let yields_nothing = anno.is_some_and(|a| flow::yield_type_of(a) == "None");
            if !(yields_nothing && !cfg.require_yield_section_when_yielding_none) {
                out.push(Violation::new(
                    line,
                    ViolationCode::MissingYieldsSection,
                    label,
                ));
            }
        }

        if doc.has_yields_section && (!facts.has_yield || (anno.is_some() && !generator_like)) {
            out.push(Violation::new(
                line,
                ViolationCode::UnnecessaryYieldsSection,
                label,
            ));
        }

        if cfg.check_yield_types && facts.has_yield && doc.has_yields_section && generator_like {
            if let Some(anno) = anno {
                let expected = vec![flow::yield_type_of(anno)];
                let documented: Vec<String> =
                    doc.yield_types().iter().map(|s| s.to_string()).collect();
                if !type_lists_equal(&expected, &documented) {
                    let suffix = if expected.len() == documented.len() {
                        format!(
                            "Yield annotation types: {}; docstring yield section types: {}.",
                            render_list(&expected),
                            render_list(&documented)
                        )
                    } else {
                        format!(
                            "Yield annotation has {} type(s); docstring yield section has {} type(s).",
                            expected.len(),
                            documented.len()
                        )
                    };
                    out.push(Violation::with_suffix(
                        line,
                        ViolationCode::YieldTypesDiffer,
                        label,
                        suffix,
                    ));
                }
            }
        }
    }

    fn check_raises(
        &self,
        facts: &ReachabilityFacts,
        doc: &DocstringStructure,
        label: &str,
        line: usize,
        out: &mut Vec<Violation>,
    ) {
        if self.config.skip_checking_raises {
            return;
        }
        if facts.has_raise && !doc.has_raises_section {
            out.push(Violation::new(
                line,
                ViolationCode::MissingRaisesSection,
                label,
            ));
        }
        if doc.has_raises_section && !facts.has_raise {
            out.push(Violation::new(
                line,
                ViolationCode::UnnecessaryRaisesSection,
                label,
            ));
        }
        if facts.has_raise && doc.has_raises_section {
            // Documented names compare as a set: a duplicated docstring
            // entry is collapsed and reported, not treated as unmatched.
            let mut sorted = doc.raises.clone();
            sorted.sort();
            let mut documented: Vec<String> = Vec::new();
            let mut duplicated: Vec<String> = Vec::new();
            for name in sorted {
                if documented.last() == Some(&name) {
                    if duplicated.last() != Some(&name) {
                        duplicated.push(name);
                    }
                } else {
                    documented.push(name);
                }
            }
            let body = &facts.raised;
            let mut used = vec![false; body.len()];
            let mut unmatched_doc = false;
            for name in &documented {
                let slot = body
                    .iter()
                    .enumerate()
                    .find(|(i, raised)| !used[*i] && raise_names_match(raised, name));
                match slot {
                    Some((i, _)) => used[i] = true,
                    None => unmatched_doc = true,
                }
            }
            let unmatched_body = used.iter().any(|u| !u);
            if unmatched_doc || unmatched_body || !duplicated.is_empty() {
                let mut suffix = format!(
                    "Raises values in the docstring: {}; raised exceptions in the body: {}.",
                    render_list(&documented),
                    render_list(body)
                );
                if !duplicated.is_empty() {
                    suffix.push_str(&format!(
                        " Duplicated docstring entries: {}.",
                        render_list(&duplicated)
                    ));
                }
                out.push(Violation::with_suffix(
                    line,
                    ViolationCode::RaisedExceptionsDiffer,
                    label,
                    suffix,
                ));
            }
        }
    }

    fn apply_noqa(
        &self,
        def_line: usize,
        doc: Option<&DocstringText>,
        local: Vec<Violation>,
        out: &mut Vec<Violation>,
    ) {
        if local.is_empty() {
            return;
        }
        let suppression = match self.config.noqa_location {
            NoqaLocation::Definition => noqa::suppression_at(self.src, def_line),
            NoqaLocation::Docstring => {
                doc.and_then(|d| noqa::suppression_at(self.src, d.closing_line))
            }
            NoqaLocation::None => None,
        };
        match suppression {
            Some(s) => out.extend(local.into_iter().filter(|v| !s.covers(v.code))),
            None => out.extend(local),
        }
    }
}

/// A documented name matches a raised one when they are equal or one is
/// a dotted-path suffix of the other.
fn raise_names_match(raised: &str, documented: &str) -> bool {
    raised == documented
        || raised.ends_with(&format!(".{documented}"))
        || documented.ends_with(&format!(".{raised}"))
}

fn type_lists_equal(expected: &[String], documented: &[String]) -> bool {
    expected.len() == documented.len()
        && expected
            .iter()
            .zip(documented)
            .all(|(e, d)| quote_insensitive_eq(e, d))
}

fn render_list(items: &[String]) -> String {
    let mut out = String::from("[");
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        out.push_str(item);
    }
    out.push(']');
    out
}

/// The leading string literal of a block, if any, with its content and
/// the line of its closing delimiter.
fn docstring_of(body: Node<'_>, src: &str) -> Option<DocstringText> {
    let stmt = body.named_child(0)?;
    if stmt.kind() != "expression_statement" {
        return None;
    }
    let expr = stmt.named_child(0)?;
    if expr.kind() != "string" {
        return None;
    }
    let mut text = String::new();
    let mut cursor = expr.walk();
    for child in expr.named_children(&mut cursor) {
        if child.kind() == "string_content" {
            text.push_str(&node_text(child, src));
        }
    }
    Some(DocstringText {
        text,
        closing_line: expr.end_position().row + 1,
    })
}

fn decorator_names(node: Node<'_>, src: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        if child.kind() != "decorator" {
            continue;
        }
        let Some(expr) = child.named_child(0) else {
            continue;
        };
        let target = if expr.kind() == "call" {
            expr.child_by_field_name("function")
        } else {
            Some(expr)
        };
        if let Some(target) = target {
            out.push(node_text(target, src));
        }
    }
    out
}

fn has_decorator(decorators: &[String], name: &str) -> bool {
    decorators
        .iter()
        .any(|d| d == name || d.ends_with(&format!(".{name}")))
}

fn field_text(node: Node<'_>, field: &str, src: &str) -> String {
    node.child_by_field_name(field)
        .map(|n| node_text(n, src))
        .unwrap_or_default()
}

fn node_text(node: Node<'_>, src: &str) -> String {
    node.utf8_text(src.as_bytes()).unwrap_or("").to_string()
}

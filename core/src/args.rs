//! Argument model shared by signatures and docstrings.
//!
//! Both sides of the reconciliation are reduced to an [`ArgList`] of
//! name/type pairs (types already canonicalized, empty when absent). The
//! list offers the 4-way equality used by the violation cascade
//! (name-only vs name+type, ordered vs unordered) and a sorted set
//! difference for the "fewer/more/different" messages.

use std::collections::BTreeSet;
use std::fmt;

/// One documented or declared argument.
///
/// Variadic parameters keep their `*`/`**` prefix in `name`, which makes
/// them sort and compare distinctly from plain names.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Arg {
    pub name: String,
    /// Canonical type hint; empty string when the source has none.
    pub type_hint: String,
}

impl Arg {
    pub fn new(name: impl Into<String>, type_hint: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_hint: type_hint.into(),
        }
    }

    pub fn untyped(name: impl Into<String>) -> Self {
        Self::new(name, "")
    }

    pub fn has_type(&self) -> bool {
        !self.type_hint.is_empty()
    }

    /// Name without the variadic star prefix.
    pub fn bare_name(&self) -> &str {
        self.name.trim_start_matches('*')
    }
}

impl fmt::Display for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.type_hint.is_empty() {
            f.write_str(&self.name)
        } else {
            write!(f, "{}: {}", self.name, self.type_hint)
        }
    }
}

/// Identity under comparison: exact name plus quote-style-folded type.
/// Folding keeps quote positions significant while equating `'` and `"`.
fn identity_key(arg: &Arg, check_type: bool) -> (String, String) {
    let type_part = if check_type {
        crate::canon::fold_quotes(&arg.type_hint).collect()
    } else {
        String::new()
    };
    (arg.name.clone(), type_part)
}

/// Ordered list of arguments from one source (signature or docstring).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArgList {
    args: Vec<Arg>,
}

impl ArgList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_args(args: Vec<Arg>) -> Self {
        Self { args }
    }

    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    pub fn push(&mut self, arg: Arg) {
        self.args.push(arg);
    }

    /// Drop the leading argument, used to shed `self`/`cls` receivers.
    pub fn remove_first(&mut self) {
        if !self.args.is_empty() {
            self.args.remove(0);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arg> {
        self.args.iter()
    }

    pub fn get(&self, name: &str) -> Option<&Arg> {
        self.args.iter().find(|a| a.name == name)
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Replace the stored type for `name`; false when no such arg.
    pub(crate) fn set_type(&mut self, name: &str, type_hint: impl Into<String>) -> bool {
        match self.args.iter_mut().find(|a| a.name == name) {
            Some(arg) => {
                arg.type_hint = type_hint.into();
                true
            }
            None => false,
        }
    }

    /// Structural equality under the configured policy.
    ///
    /// `check_type` folds type hints into identity (quote-insensitive);
    /// `order_matters` compares positionally instead of as a multiset.
    pub fn equals(&self, other: &ArgList, check_type: bool, order_matters: bool) -> bool {
        if self.args.len() != other.args.len() {
            return false;
        }
        if order_matters {
            self.args
                .iter()
                .zip(other.args.iter())
                .all(|(a, b)| identity_key(a, check_type) == identity_key(b, check_type))
        } else {
            let mut left: Vec<_> = self.args.iter().map(|a| identity_key(a, check_type)).collect();
            let mut right: Vec<_> = other.args.iter().map(|a| identity_key(a, check_type)).collect();
            left.sort();
            right.sort();
            left == right
        }
    }

    /// Args present here but absent from `other`, under full identity
    /// (name and type). Sorted and deduplicated for stable messages.
    pub fn subtract(&self, other: &ArgList) -> Vec<Arg> {
        let other_keys: BTreeSet<_> = other.args.iter().map(|a| identity_key(a, true)).collect();
        let mut missing: Vec<Arg> = self
            .args
            .iter()
            .filter(|a| !other_keys.contains(&identity_key(a, true)))
            .cloned()
            .collect();
        missing.sort();
        missing.dedup();
        missing
    }

    /// Pairs `(ours, theirs)` whose names match but whose types differ,
    /// in this list's order.
    pub fn type_mismatches<'a>(&'a self, other: &'a ArgList) -> Vec<(&'a Arg, &'a Arg)> {
        self.args
            .iter()
            .filter_map(|a| other.get(&a.name).map(|b| (a, b)))
            .filter(|(a, b)| identity_key(a, true).1 != identity_key(b, true).1)
            .collect()
    }

    /// Adopt the star prefixes of `reference` where bare names match.
    ///
    /// Docstrings routinely document `*args` as `args`; in lenient mode the
    /// docstring list is re-starred against the signature before comparing.
    pub fn with_stars_aligned(&self, reference: &ArgList) -> ArgList {
        let args = self
            .args
            .iter()
            .map(|arg| {
                if arg.name.starts_with('*') {
                    return arg.clone();
                }
                let starred = reference
                    .args
                    .iter()
                    .find(|r| r.name.starts_with('*') && r.bare_name() == arg.name);
                match starred {
                    Some(r) => Arg::new(r.name.clone(), arg.type_hint.clone()),
                    None => arg.clone(),
                }
            })
            .collect();
        ArgList { args }
    }

    /// Keep only args whose name satisfies the predicate.
    pub fn filter_names(&self, keep: impl Fn(&str) -> bool) -> ArgList {
        ArgList {
            args: self.args.iter().filter(|a| keep(&a.name)).cloned().collect(),
        }
    }
}

impl fmt::Display for ArgList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{arg}")?;
        }
        f.write_str("]")
    }
}

impl FromIterator<Arg> for ArgList {
    fn from_iter<T: IntoIterator<Item = Arg>>(iter: T) -> Self {
        ArgList {
            args: iter.into_iter().collect(),
        }
    }
}

/// Render a slice of args the way list suffixes expect: `[a: int, b]`.
pub(crate) fn render_args(args: &[Arg]) -> String {
    let mut out = String::from("[");
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        out.push_str(&arg.to_string());
    }
    out.push(']');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(args: &[(&str, &str)]) -> ArgList {
        args.iter().map(|(n, t)| Arg::new(*n, *t)).collect()
    }

    #[test]
    fn equals_full_strictness() {
        let a = list(&[("x", "int"), ("y", "str")]);
        let b = list(&[("x", "int"), ("y", "str")]);
        assert!(a.equals(&b, true, true));
    }

    #[test]
    fn equals_detects_order_difference() {
        let a = list(&[("x", "int"), ("y", "str")]);
        let b = list(&[("y", "str"), ("x", "int")]);
        assert!(!a.equals(&b, true, true));
        assert!(a.equals(&b, true, false));
    }

    #[test]
    fn equals_detects_type_difference() {
        let a = list(&[("x", "int")]);
        let b = list(&[("x", "str")]);
        assert!(!a.equals(&b, true, true));
        assert!(a.equals(&b, false, true));
    }

    #[test]
    fn stricter_equality_implies_looser() {
        let cases = [
            (list(&[("x", "int"), ("y", "str")]), list(&[("x", "int"), ("y", "str")])),
            (list(&[("a", ""), ("b", "int")]), list(&[("a", ""), ("b", "int")])),
        ];
        for (a, b) in &cases {
            if a.equals(b, true, true) {
                assert!(a.equals(b, true, false));
                assert!(a.equals(b, false, true));
                assert!(a.equals(b, false, false));
            }
        }
    }

    #[test]
    fn equals_is_quote_insensitive_on_types() {
        let a = list(&[("mode", "Literal['r', 'w']")]);
        let b = list(&[("mode", "Literal[\"r\", \"w\"]")]);
        assert!(a.equals(&b, true, true));
    }

    #[test]
    fn subtract_uses_full_identity() {
        let sig = list(&[("x", "int"), ("y", "str")]);
        let doc = list(&[("x", "float"), ("y", "str")]);
        let missing = sig.subtract(&doc);
        assert_eq!(missing, vec![Arg::new("x", "int")]);
    }

    #[test]
    fn subtract_results_are_disjoint() {
        let a = list(&[("x", "int"), ("y", "str"), ("z", "bool")]);
        let b = list(&[("y", "str"), ("z", "int"), ("w", "float")]);
        let a_minus_b = a.subtract(&b);
        let b_minus_a = b.subtract(&a);
        for arg in &a_minus_b {
            assert!(!b_minus_a.contains(arg));
        }
    }

    #[test]
    fn subtract_is_sorted_and_deduped() {
        let a = list(&[("z", "int"), ("a", "str"), ("z", "int")]);
        let b = ArgList::new();
        let diff = a.subtract(&b);
        assert_eq!(diff, vec![Arg::new("a", "str"), Arg::new("z", "int")]);
    }

    #[test]
    fn variadic_names_compare_distinctly() {
        let sig = list(&[("*args", ""), ("**kwargs", "")]);
        let doc = list(&[("args", ""), ("kwargs", "")]);
        assert!(!sig.equals(&doc, false, false));
        assert!(sig.equals(&doc.with_stars_aligned(&sig), false, false));
    }

    #[test]
    fn star_alignment_keeps_existing_stars() {
        let sig = list(&[("*args", "tuple")]);
        let doc = list(&[("*args", "tuple")]);
        let aligned = doc.with_stars_aligned(&sig);
        assert!(aligned.equals(&sig, true, true));
    }

    #[test]
    fn type_mismatches_follow_receiver_order() {
        let sig = list(&[("a", "int"), ("b", "str"), ("c", "bool")]);
        let doc = list(&[("c", "str"), ("a", "float"), ("b", "str")]);
        let pairs = sig.type_mismatches(&doc);
        let names: Vec<_> = pairs.iter().map(|(s, _)| s.name.as_str()).collect();
        assert_eq!(names, vec!["a", "c"]);
    }

    #[test]
    fn filter_names_drops_matching_entries() {
        let sig = list(&[("x", "int"), ("_hidden", "str"), ("_", "")]);
        let kept = sig.filter_names(|name| !name.starts_with('_'));
        assert_eq!(kept.len(), 1);
        assert!(kept.contains_name("x"));
    }

    #[test]
    fn display_renders_bracketed_pairs() {
        let a = list(&[("x", "int"), ("y", "")]);
        assert_eq!(a.to_string(), "[x: int, y]");
        assert_eq!(render_args(&[Arg::new("x", "int")]), "[x: int]");
    }
}

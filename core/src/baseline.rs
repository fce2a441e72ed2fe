//! Baseline snapshots of accepted violations.
//!
//! A baseline maps file paths to the rendered strings of violations the
//! project has decided to live with. Identity is the rendered string,
//! not the line number, so entries keep matching across unrelated edits
//! that shift lines, and stop matching as soon as the message content
//! changes.

use std::collections::{BTreeMap, BTreeSet};

use crate::violation::Violation;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Baseline {
    files: BTreeMap<String, BTreeSet<String>>,
}

impl Baseline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.files.values().all(|set| set.is_empty())
    }

    pub fn insert(&mut self, file: impl Into<String>, rendered: impl Into<String>) {
        self.files
            .entry(file.into())
            .or_default()
            .insert(rendered.into());
    }

    pub fn record_file(&mut self, file: impl Into<String>, violations: &[Violation]) {
        let entry = self.files.entry(file.into()).or_default();
        for violation in violations {
            entry.insert(violation.render());
        }
    }

    pub fn entries(&self, file: &str) -> Option<&BTreeSet<String>> {
        self.files.get(file)
    }

    /// One block per file with violations: the path on its own line, a
    /// tab-indented line per rendered violation, then a blank separator.
    pub fn generate(&self) -> String {
        let mut out = String::new();
        for (file, entries) in &self.files {
            if entries.is_empty() {
                continue;
            }
            out.push_str(file);
            out.push('\n');
            for entry in entries {
                out.push('\t');
                out.push_str(entry);
                out.push('\n');
            }
            out.push('\n');
        }
        out
    }

    /// Inverse of [`generate`](Self::generate). Indentation style does
    /// not affect the parsed content; tabs and spaces both mark entry
    /// lines.
    pub fn parse(text: &str) -> Self {
        let mut files: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        let mut current: Option<String> = None;
        for line in text.lines() {
            if line.trim().is_empty() {
                current = None;
                continue;
            }
            if line.starts_with(' ') || line.starts_with('\t') {
                if let Some(file) = &current {
                    if let Some(set) = files.get_mut(file) {
                        set.insert(line.trim().to_string());
                    }
                }
                continue;
            }
            let path = line.trim_end().to_string();
            files.entry(path.clone()).or_default();
            current = Some(path);
        }
        Self { files }
    }

    /// Split the current violations for `file` into already-known ones
    /// (their rendered strings, suppressed from output) and new ones.
    pub fn reconcile(&self, file: &str, current: &[Violation]) -> (Vec<String>, Vec<Violation>) {
        let known = self.files.get(file);
        let mut unfixed = Vec::new();
        let mut remaining = Vec::new();
        for violation in current {
            let rendered = violation.render();
            if known.is_some_and(|set| set.contains(&rendered)) {
                unfixed.push(rendered);
            } else {
                remaining.push(violation.clone());
            }
        }
        (unfixed, remaining)
    }

    /// True when some baselined violations for `file` no longer occur,
    /// meaning the snapshot is stale and should be re-taken.
    pub fn needs_regeneration(&self, file: &str, unfixed: &[String]) -> bool {
        let total = self.files.get(file).map_or(0, |set| set.len());
        let matched: BTreeSet<&String> = unfixed.iter().collect();
        matched.len() < total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::violation::ViolationCode;

    fn violation(line: usize, code: ViolationCode) -> Violation {
        Violation::new(line, code, "Function `f`:")
    }

    #[test]
    fn generate_then_parse_round_trips() {
        let mut baseline = Baseline::new();
        baseline.insert("a.py", "DOC101: Function `f`: fewer");
        baseline.insert("a.py", "DOC103: Function `f`: differ");
        baseline.insert("b/c.py", "DOC201: Function `g`: missing");
        let text = baseline.generate();
        assert_eq!(Baseline::parse(&text), baseline);
    }

    #[test]
    fn files_without_violations_are_omitted() {
        let mut baseline = Baseline::new();
        baseline.record_file("clean.py", &[]);
        baseline.insert("dirty.py", "DOC101: x");
        let text = baseline.generate();
        assert!(!text.contains("clean.py"));
        assert!(text.contains("dirty.py"));
    }

    #[test]
    fn spaces_and_tabs_parse_to_the_same_content() {
        let tabbed = "a.py\n\tDOC101: one\n\tDOC102: two\n\n";
        let spaced = "a.py\n    DOC101: one\n    DOC102: two\n\n";
        assert_eq!(Baseline::parse(tabbed), Baseline::parse(spaced));
    }

    #[test]
    fn generated_output_is_deterministic() {
        let mut first = Baseline::new();
        first.insert("b.py", "DOC102: z");
        first.insert("a.py", "DOC101: y");
        first.insert("a.py", "DOC101: x");
        let mut second = Baseline::new();
        second.insert("a.py", "DOC101: x");
        second.insert("a.py", "DOC101: y");
        second.insert("b.py", "DOC102: z");
        assert_eq!(first.generate(), second.generate());
        let text = first.generate();
        assert!(text.starts_with("a.py\n"));
    }

    #[test]
    fn reconcile_splits_known_from_new() {
        let old = vec![
            violation(3, ViolationCode::FewerArgsInDocstring),
            violation(9, ViolationCode::MissingReturnsSection),
        ];
        let mut baseline = Baseline::new();
        baseline.record_file("a.py", &old);

        // Unchanged file: everything suppressed.
        let (unfixed, remaining) = baseline.reconcile("a.py", &old);
        assert_eq!(unfixed.len(), 2);
        assert!(remaining.is_empty());
        assert!(!baseline.needs_regeneration("a.py", &unfixed));

        // One fixed, one new: the new one is reported, and the stale
        // entry signals regeneration.
        let current = vec![
            violation(3, ViolationCode::FewerArgsInDocstring),
            violation(20, ViolationCode::UnnecessaryRaisesSection),
        ];
        let (unfixed, remaining) = baseline.reconcile("a.py", &current);
        assert_eq!(unfixed.len(), 1);
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].code, ViolationCode::UnnecessaryRaisesSection);
        assert!(baseline.needs_regeneration("a.py", &unfixed));
    }

    #[test]
    fn line_drift_does_not_break_matching() {
        let mut baseline = Baseline::new();
        baseline.record_file("a.py", &[violation(3, ViolationCode::FewerArgsInDocstring)]);
        let moved = violation(42, ViolationCode::FewerArgsInDocstring);
        let (unfixed, remaining) = baseline.reconcile("a.py", &[moved]);
        assert_eq!(unfixed.len(), 1);
        assert!(remaining.is_empty());
    }

    #[test]
    fn unknown_files_report_everything_as_new() {
        let baseline = Baseline::new();
        let current = vec![violation(1, ViolationCode::ArgsDiffer)];
        let (unfixed, remaining) = baseline.reconcile("other.py", &current);
        assert!(unfixed.is_empty());
        assert_eq!(remaining.len(), 1);
    }
}

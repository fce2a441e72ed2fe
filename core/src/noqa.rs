//! `# noqa` suppression comments.
//!
//! A bare `# noqa` suppresses every check on the definition it is
//! attached to; `# noqa: DOC101, DOC103` suppresses only the listed
//! codes. Matching is case-insensitive with flexible spacing, and codes
//! belonging to other tools (`E501`, `F401`) are ignored rather than
//! rejected.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::violation::ViolationCode;

/// What a noqa comment suppresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Suppression {
    All,
    Codes(Vec<ViolationCode>),
}

impl Suppression {
    pub fn covers(&self, code: ViolationCode) -> bool {
        match self {
            Suppression::All => true,
            Suppression::Codes(codes) => codes.contains(&code),
        }
    }
}

static NOQA: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)#\s*noqa\b(?:\s*:\s*(?P<codes>[A-Za-z0-9 ,]+))?").expect("static regex")
});

/// Parse the noqa comment on one source line, if any.
pub fn parse_line(line: &str) -> Option<Suppression> {
    let caps = NOQA.captures(line)?;
    let Some(codes) = caps.name("codes") else {
        return Some(Suppression::All);
    };
    let mut out = Vec::new();
    for token in codes.as_str().split(',') {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        if let Some(code) = parse_code(token) {
            out.push(code);
        }
    }
    Some(Suppression::Codes(out))
}

/// The suppression attached to the 1-based `line` of `src`, if any.
pub fn suppression_at(src: &str, line: usize) -> Option<Suppression> {
    let text = src.lines().nth(line.checked_sub(1)?)?;
    parse_line(text)
}

/// `DOC101`, `doc101`, or bare `101`. Codes with another tool's prefix
/// and numbers outside the registry yield `None`.
fn parse_code(token: &str) -> Option<ViolationCode> {
    let split = token
        .find(|c: char| c.is_ascii_digit())
        .unwrap_or(token.len());
    let (prefix, digits) = token.split_at(split);
    if !prefix.is_empty() && !prefix.eq_ignore_ascii_case("doc") {
        return None;
    }
    let number: u16 = digits.parse().ok()?;
    ViolationCode::from_number(number)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_noqa_suppresses_everything() {
        let suppression = parse_line("def f():  # noqa").unwrap();
        assert!(suppression.covers(ViolationCode::FewerArgsInDocstring));
        assert!(suppression.covers(ViolationCode::RaisedExceptionsDiffer));
    }

    #[test]
    fn listed_codes_are_case_insensitive() {
        let suppression = parse_line("def f():  # NOQA: doc101,DOC103").unwrap();
        assert!(suppression.covers(ViolationCode::FewerArgsInDocstring));
        assert!(suppression.covers(ViolationCode::ArgsDiffer));
        assert!(!suppression.covers(ViolationCode::MoreArgsInDocstring));
    }

    #[test]
    fn flexible_spacing_is_accepted() {
        let suppression = parse_line("def f():  #noqa : DOC201 , DOC203").unwrap();
        assert!(suppression.covers(ViolationCode::MissingReturnsSection));
        assert!(suppression.covers(ViolationCode::ReturnTypesDiffer));
    }

    #[test]
    fn foreign_codes_are_ignored() {
        let suppression = parse_line("x = 1  # noqa: E501, DOC201").unwrap();
        assert!(suppression.covers(ViolationCode::MissingReturnsSection));
        assert!(!suppression.covers(ViolationCode::FewerArgsInDocstring));
    }

    #[test]
    fn bare_numbers_resolve_against_the_registry() {
        let suppression = parse_line("# noqa: 101, 999").unwrap();
        assert!(suppression.covers(ViolationCode::FewerArgsInDocstring));
        assert!(!suppression.covers(ViolationCode::MoreArgsInDocstring));
    }

    #[test]
    fn lines_without_noqa_yield_nothing() {
        assert_eq!(parse_line("def f():  # regular comment"), None);
        assert_eq!(parse_line("def f():"), None);
    }

    #[test]
    fn suppression_at_reads_the_requested_line() {
        let src = "def f():  # noqa: DOC101\n    pass\n";
        assert!(suppression_at(src, 1).is_some());
        assert!(suppression_at(src, 2).is_none());
        assert!(suppression_at(src, 0).is_none());
        assert!(suppression_at(src, 10).is_none());
    }
}

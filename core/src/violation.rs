//! Violation model and the fixed code registry.
//!
//! Every defect the checker can report maps to a stable `DOC` code. Codes are
//! grouped by concern: 00x parsing, 1xx arguments, 2xx returns, 3xx class and
//! constructor docstrings, 4xx yields, 5xx raises, 6xx class attributes.
//! The code-to-message mapping is part of the tool's contract: baselines store
//! rendered violations, so message bodies must stay byte-stable.

use serde::{Serialize, Serializer};

/// Stable identifier for a reconciliation defect.
///
/// Discriminants are the public `DOC` numbers. The enum is the registry:
/// constructing a violation with an unknown code is unrepresentable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u16)]
pub enum ViolationCode {
    DocstringParseError = 1,
    FileSyntaxError = 2,
    StyleMismatch = 3,
    FewerArgsInDocstring = 101,
    MoreArgsInDocstring = 102,
    ArgsDiffer = 103,
    ArgOrderDiffers = 104,
    ArgTypeHintsDiffer = 105,
    NoTypeHintsInSignature = 106,
    PartialTypeHintsInSignature = 107,
    UnwantedTypeHintsInSignature = 108,
    NoTypeHintsInDocstring = 109,
    PartialTypeHintsInDocstring = 110,
    UnwantedTypeHintsInDocstring = 111,
    MissingReturnsSection = 201,
    UnnecessaryReturnsSection = 202,
    ReturnTypesDiffer = 203,
    SeparateInitDocstring = 301,
    ReturnsInClassDocstring = 302,
    ReturnsInInitDocstring = 303,
    ArgsInClassDocstring = 304,
    RaisesInClassDocstring = 305,
    YieldsInClassDocstring = 306,
    YieldsInInitDocstring = 307,
    MissingYieldsSection = 402,
    UnnecessaryYieldsSection = 403,
    YieldTypesDiffer = 404,
    MixedReturnAndYield = 405,
    MissingRaisesSection = 501,
    UnnecessaryRaisesSection = 502,
    RaisedExceptionsDiffer = 503,
    FewerAttrsInDocstring = 601,
    MoreAttrsInDocstring = 602,
    AttrsDiffer = 603,
    AttrOrderDiffers = 604,
    AttrTypeHintsDiffer = 605,
}

impl ViolationCode {
    /// Numeric code as rendered in `DOC{code:03}`.
    pub fn value(self) -> u16 {
        self as u16
    }

    /// Look up a code by its public number, e.g. from a `# noqa: DOC105` list.
    pub fn from_number(number: u16) -> Option<Self> {
        use ViolationCode::*;
        let code = match number {
            1 => DocstringParseError,
            2 => FileSyntaxError,
            3 => StyleMismatch,
            101 => FewerArgsInDocstring,
            102 => MoreArgsInDocstring,
            103 => ArgsDiffer,
            104 => ArgOrderDiffers,
            105 => ArgTypeHintsDiffer,
            106 => NoTypeHintsInSignature,
            107 => PartialTypeHintsInSignature,
            108 => UnwantedTypeHintsInSignature,
            109 => NoTypeHintsInDocstring,
            110 => PartialTypeHintsInDocstring,
            111 => UnwantedTypeHintsInDocstring,
            201 => MissingReturnsSection,
            202 => UnnecessaryReturnsSection,
            203 => ReturnTypesDiffer,
            301 => SeparateInitDocstring,
            302 => ReturnsInClassDocstring,
            303 => ReturnsInInitDocstring,
            304 => ArgsInClassDocstring,
            305 => RaisesInClassDocstring,
            306 => YieldsInClassDocstring,
            307 => YieldsInInitDocstring,
            402 => MissingYieldsSection,
            403 => UnnecessaryYieldsSection,
            404 => YieldTypesDiffer,
            405 => MixedReturnAndYield,
            501 => MissingRaisesSection,
            502 => UnnecessaryRaisesSection,
            503 => RaisedExceptionsDiffer,
            601 => FewerAttrsInDocstring,
            602 => MoreAttrsInDocstring,
            603 => AttrsDiffer,
            604 => AttrOrderDiffers,
            605 => AttrTypeHintsDiffer,
            _ => return None,
        };
        Some(code)
    }

    /// Fixed message body for this code.
    pub fn message(self) -> &'static str {
        match self {
            ViolationCode::DocstringParseError => {
                "Potential formatting errors in docstring. Error message:"
            }
            ViolationCode::FileSyntaxError => {
                "Syntax errors; cannot parse this Python file. Error message:"
            }
            ViolationCode::StyleMismatch => "Docstring style mismatch.",
            ViolationCode::FewerArgsInDocstring => {
                "Docstring contains fewer arguments than in function signature."
            }
            ViolationCode::MoreArgsInDocstring => {
                "Docstring contains more arguments than in function signature."
            }
            ViolationCode::ArgsDiffer => {
                "Docstring arguments are different from function arguments."
            }
            ViolationCode::ArgOrderDiffers => {
                "Arguments are the same in the docstring and the function signature, \
                 but are in a different order."
            }
            ViolationCode::ArgTypeHintsDiffer => {
                "Argument names match, but type hints in these args do not match:"
            }
            ViolationCode::NoTypeHintsInSignature => {
                "The option `check-type-hint` is `true` but there are no argument \
                 type hints in the signature"
            }
            ViolationCode::PartialTypeHintsInSignature => {
                "The option `check-type-hint` is `true` but not all args in the \
                 signature have type hints"
            }
            ViolationCode::UnwantedTypeHintsInSignature => {
                "The option `check-type-hint` is `false` but there are argument \
                 type hints in the signature"
            }
            ViolationCode::NoTypeHintsInDocstring => {
                "The option `check-type-hint` is `true` but there are no argument \
                 type hints in the docstring"
            }
            ViolationCode::PartialTypeHintsInDocstring => {
                "The option `check-type-hint` is `true` but not all args in the \
                 docstring have type hints"
            }
            ViolationCode::UnwantedTypeHintsInDocstring => {
                "The option `check-type-hint` is `false` but there are argument \
                 type hints in the docstring"
            }
            ViolationCode::MissingReturnsSection => {
                "does not have a return section in docstring"
            }
            ViolationCode::UnnecessaryReturnsSection => {
                "has a return section in docstring, but there are no return \
                 statements or annotation"
            }
            ViolationCode::ReturnTypesDiffer => {
                "return type(s) in docstring not consistent with the return annotation."
            }
            ViolationCode::SeparateInitDocstring => {
                "__init__() should not have a docstring; please combine it with \
                 the docstring of the class."
            }
            ViolationCode::ReturnsInClassDocstring => {
                "The class docstring does not need a \"Returns\" section, because \
                 __init__() cannot return anything."
            }
            ViolationCode::ReturnsInInitDocstring => {
                "The __init__() docstring does not need a \"Returns\" section, \
                 because it cannot return anything."
            }
            ViolationCode::ArgsInClassDocstring => {
                "Class docstring has an argument/parameter section; please put it \
                 in the __init__() docstring."
            }
            ViolationCode::RaisesInClassDocstring => {
                "Class docstring has a \"Raises\" section; please put it in the \
                 __init__() docstring."
            }
            ViolationCode::YieldsInClassDocstring => {
                "The class docstring does not need a \"Yields\" section, because \
                 __init__() cannot yield anything."
            }
            ViolationCode::YieldsInInitDocstring => {
                "The __init__() docstring does not need a \"Yields\" section, \
                 because __init__() cannot yield anything."
            }
            ViolationCode::MissingYieldsSection => {
                "has \"yield\" statements, but the docstring does not have a \
                 \"Yields\" section"
            }
            ViolationCode::UnnecessaryYieldsSection => {
                "has a \"Yields\" section in the docstring, but there are no \
                 \"yield\" statements, or the return annotation is not a \
                 Generator/Iterator/Iterable."
            }
            ViolationCode::YieldTypesDiffer => {
                "yield type(s) in docstring not consistent with the return annotation."
            }
            ViolationCode::MixedReturnAndYield => {
                "has both \"return\" and \"yield\" statements. Please use \
                 Generator[YieldType, SendType, ReturnType] as the return type \
                 annotation."
            }
            ViolationCode::MissingRaisesSection => {
                "has \"raise\" statements, but the docstring does not have a \
                 \"Raises\" section"
            }
            ViolationCode::UnnecessaryRaisesSection => {
                "has a \"Raises\" section in the docstring, but there are not \
                 \"raise\" statements in the body"
            }
            ViolationCode::RaisedExceptionsDiffer => {
                "exceptions in the \"Raises\" section in the docstring do not \
                 match those in the body."
            }
            ViolationCode::FewerAttrsInDocstring => {
                "Class docstring contains fewer class attributes than actual \
                 class attributes."
            }
            ViolationCode::MoreAttrsInDocstring => {
                "Class docstring contains more class attributes than actual \
                 class attributes."
            }
            ViolationCode::AttrsDiffer => {
                "Class docstring attributes are different from actual class attributes."
            }
            ViolationCode::AttrOrderDiffers => {
                "Attributes are the same in docstring and class def, but are in \
                 a different order."
            }
            ViolationCode::AttrTypeHintsDiffer => {
                "Attribute names match, but type hints in these attributes do \
                 not match:"
            }
        }
    }
}

impl std::fmt::Display for ViolationCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DOC{:03}", self.value())
    }
}

impl Serialize for ViolationCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A single reconciliation defect attached to a definition (or file).
///
/// The line number is reported to users but excluded from `render()`: baseline
/// identity is the rendered string, so entries keep matching across line drift
/// from unrelated edits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub line: usize,
    pub code: ViolationCode,
    /// Definition label, e.g. ``Function `parse`:`` or ``Method `Config.load`:``.
    pub prefix: String,
    /// Violation-specific detail appended after the registry message.
    pub suffix: String,
}

impl Violation {
    pub fn new(line: usize, code: ViolationCode, prefix: impl Into<String>) -> Self {
        Self {
            line,
            code,
            prefix: prefix.into(),
            suffix: String::new(),
        }
    }

    pub fn with_suffix(
        line: usize,
        code: ViolationCode,
        prefix: impl Into<String>,
        suffix: impl Into<String>,
    ) -> Self {
        Self {
            line,
            code,
            prefix: prefix.into(),
            suffix: suffix.into(),
        }
    }

    /// Stable rendered form: `DOC{code:03}: {prefix} {body} {suffix}`.
    pub fn render(&self) -> String {
        let mut out = format!("{}:", self.code);
        if !self.prefix.is_empty() {
            out.push(' ');
            out.push_str(&self.prefix);
        }
        out.push(' ');
        out.push_str(self.code.message());
        if !self.suffix.is_empty() {
            out.push(' ');
            out.push_str(&self.suffix);
        }
        out
    }
}

use std::fmt;

/// The distinct ways a selector string can fail to parse.
///
/// Kept as its own enum (rather than collapsing everything into a single
/// string) so tests can assert on the exact failure mode instead of just
/// "it errored".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyntaxErrorKind {
    UnexpectedToken(String),
    MissingLeftOperand(String),
    MissingRightOperand(String),
    MalformedFilter,
    FilterNotClosed,
    InvalidSelectorToken(String),
}

impl fmt::Display for SyntaxErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedToken(t) => write!(f, "unexpected {t:?}"),
            Self::MissingLeftOperand(t) => write!(f, "{t:?} must follow a format selector"),
            Self::MissingRightOperand(t) => write!(f, "{t:?} must be followed by a format selector"),
            Self::MalformedFilter => write!(f, "filter start must be followed by a filter body"),
            Self::FilterNotClosed => write!(f, "filters must be closed with ']'"),
            Self::InvalidSelectorToken(t) => write!(f, "invalid format selector {t:?}"),
        }
    }
}

/// A compile-time failure while tokenizing or parsing a selector string.
///
/// Carries the original spec and a byte offset so the `Display` impl can
/// render a caret pointing at the offending position, mirroring how the
/// Python original embeds the input string and a caret in its
/// `SyntaxError` message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorError {
    pub spec: String,
    pub position: usize,
    pub kind: SyntaxErrorKind,
}

impl SelectorError {
    pub fn new(spec: impl Into<String>, position: usize, kind: SyntaxErrorKind) -> Self {
        let spec = spec.into();
        let position = position.min(spec.len());
        Self { spec, position, kind }
    }
}

impl fmt::Display for SelectorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "invalid format specification: {}", self.kind)?;
        writeln!(f, "\t{}", self.spec)?;
        write!(f, "\t{}^", " ".repeat(self.position))
    }
}

impl std::error::Error for SelectorError {}

pub type Result<T> = std::result::Result<T, SelectorError>;

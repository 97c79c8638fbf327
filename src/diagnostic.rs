use std::fmt;

use crate::span::Span;
use crate::template::Tag;

/// Internal lexer/parser error: a message attached to a byte span of the
/// fragment. Converted to a positioned [`ParseError`] by the fragment
/// layer, which knows the caller's start position.
#[derive(Clone, Debug)]
pub(crate) struct SyntaxError {
    pub message: String,
    pub span: Span,
}

impl SyntaxError {
    pub fn new(message: String, span: Span) -> Self {
        Self { message, span }
    }
}

/// A fragment failed to parse under every applicable grammar shape.
/// `at` is a 1-based (line, column) when one could be derived.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseError {
    pub message: String,
    pub at: Option<(u32, u32)>,
}

impl ParseError {
    pub fn new(message: impl Into<String>, at: Option<(u32, u32)>) -> Self {
        Self {
            message: message.into(),
            at,
        }
    }

    /// Render the error against the fragment source using ariadne.
    /// Only meaningful when the fragment was parsed from line 1, column 1.
    pub fn render(&self, name: &str, source: &str) {
        use ariadne::{Color, Label, Report, ReportKind, Source};

        let offset = self
            .at
            .and_then(|(line, col)| offset_of(source, line, col))
            .unwrap_or(0);
        let end = (offset + 1).min(source.len());

        let report = Report::build(ReportKind::Error, name, offset)
            .with_message(&self.message)
            .with_label(
                Label::new((name, offset..end))
                    .with_message(&self.message)
                    .with_color(Color::Red),
            )
            .finish();

        let _ = report.eprint((name, Source::from(source)));
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.at {
            Some((line, col)) => {
                write!(f, "{} at line {}, column {}", self.message, line, col)
            }
            None => f.write_str(&self.message),
        }
    }
}

/// Byte offset of a 1-based (line, column) position in `source`.
fn offset_of(source: &str, line: u32, col: u32) -> Option<usize> {
    let mut remaining = line.saturating_sub(1);
    let mut offset = 0;
    for l in source.split_inclusive('\n') {
        if remaining == 0 {
            return Some(offset + (col.saturating_sub(1) as usize).min(l.len()));
        }
        remaining -= 1;
        offset += l.len();
    }
    None
}

/// Malformed placeholder usage discovered while building a template.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TemplateError {
    /// A lift or group modifier on a bare leaf (or left over at the
    /// conversion root), where it cannot describe a child slot.
    BadMetavariable(String),
    /// A group placeholder sharing its slot with sibling elements.
    MisplacedGroupMetavariable(String),
    /// Two distinct lift names competing to replace the same node.
    ClashingMetavariables(String, String),
}

impl fmt::Display for TemplateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateError::BadMetavariable(name) => {
                write!(f, "bad metavariable: '{}'", name)
            }
            TemplateError::MisplacedGroupMetavariable(name) => {
                write!(f, "misplaced group metavariable: '{}'", name)
            }
            TemplateError::ClashingMetavariables(a, b) => {
                write!(f, "clashing metavariables: '{}' and '{}'", a, b)
            }
        }
    }
}

/// A substitution environment bound a name to a value of the wrong shape.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EnvError {
    /// A node-level name was bound to a list of trees.
    NodeBoundToList(Tag),
    /// A group-level name was bound to a single tree.
    GroupBoundToNode(Tag),
    /// A group-level placeholder stood where a single node is required.
    GroupInNodePosition(Tag),
}

impl fmt::Display for EnvError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnvError::NodeBoundToList(tag) => {
                write!(f, "metavariable '{}' is bound to a list of trees", tag)
            }
            EnvError::GroupBoundToNode(tag) => {
                write!(f, "group metavariable '{}' is bound to a single tree", tag)
            }
            EnvError::GroupInNodePosition(tag) => {
                write!(f, "group metavariable '{}' used in node position", tag)
            }
        }
    }
}

/// Any fatal error of the engine. Match failure is never an error; it is
/// an ordinary `None` result.
#[derive(Clone, Debug)]
pub enum Error {
    Parse(ParseError),
    Template(TemplateError),
    Env(EnvError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Parse(e) => write!(f, "{}", e),
            Error::Template(e) => write!(f, "{}", e),
            Error::Env(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for Error {}
impl std::error::Error for ParseError {}
impl std::error::Error for TemplateError {}
impl std::error::Error for EnvError {}

impl From<ParseError> for Error {
    fn from(e: ParseError) -> Self {
        Error::Parse(e)
    }
}

impl From<TemplateError> for Error {
    fn from(e: TemplateError) -> Self {
        Error::Template(e)
    }
}

impl From<EnvError> for Error {
    fn from(e: EnvError) -> Self {
        Error::Env(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_of() {
        let src = "abc\ndef\n";
        assert_eq!(offset_of(src, 1, 1), Some(0));
        assert_eq!(offset_of(src, 2, 2), Some(5));
        assert_eq!(offset_of(src, 3, 1), None);
    }

    #[test]
    fn test_display_with_position() {
        let e = ParseError::new("unexpected ')'", Some((2, 5)));
        assert_eq!(e.to_string(), "unexpected ')' at line 2, column 5");
    }
}

//! The fragment parser: text in, trees out, via layered grammar
//! fallback.
//!
//! A terminator token (`.`) anywhere in the stream means the caller
//! wrote complete declarations, so each `.`-delimited segment must parse
//! as one — any segment failure is fatal. Without a terminator the
//! fragment is ambiguous, and the stream is retried under progressively
//! more structural shapes: expression sequence, handler clauses, fun
//! clauses, if clauses. The first accepting shape wins.

use crate::diagnostic::{ParseError, SyntaxError};
use crate::lexeme::Lexeme;
use crate::lexer::Lexer;
use crate::parser::Parser;
use crate::span::{Span, Spanned};
use crate::tree::Tree;

/// Where the fragment starts in the caller's source, 1-based. Reported
/// error positions are relative to this.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Origin {
    pub line: u32,
    pub column: u32,
}

impl Default for Origin {
    fn default() -> Self {
        Self { line: 1, column: 1 }
    }
}

impl Origin {
    pub fn line(line: u32) -> Self {
        Self { line, column: 1 }
    }
}

/// Parse fragment text into an ordered sequence of one or more trees.
pub fn parse_fragment(text: &str, origin: Origin) -> Result<Vec<Tree>, ParseError> {
    let mut tokens = Lexer::new(text)
        .tokenize()
        .map_err(|e| to_parse_error(e, text, origin))?;
    tokens.pop(); // drop Eof; re-appended per attempt

    if tokens.iter().any(|t| t.node == Lexeme::Dot) {
        parse_declarations(tokens, text, origin)
    } else {
        parse_fallback(&tokens, text, origin)
    }
}

/// Terminated path: split at each `.` and parse every segment as a
/// standalone declaration.
fn parse_declarations(
    tokens: Vec<Spanned<Lexeme>>,
    text: &str,
    origin: Origin,
) -> Result<Vec<Tree>, ParseError> {
    let mut trees = Vec::new();
    let mut segment: Vec<Spanned<Lexeme>> = Vec::new();
    for token in tokens {
        let is_dot = token.node == Lexeme::Dot;
        segment.push(token);
        if is_dot {
            let mut seg = std::mem::take(&mut segment);
            seg.push(Spanned::synthetic(Lexeme::Eof));
            let tree = Parser::new(seg)
                .parse_form()
                .map_err(|e| to_parse_error(e, text, origin))?;
            trees.push(tree);
        }
    }
    if let Some(first) = segment.first() {
        return Err(ParseError::new(
            "incomplete form: not terminated by '.'",
            position_of(text, first.span, origin),
        ));
    }
    Ok(trees)
}

/// Unterminated path: try each shape in fixed priority order and keep
/// the per-attempt errors for selection if all fail.
fn parse_fallback(
    tokens: &[Spanned<Lexeme>],
    text: &str,
    origin: Origin,
) -> Result<Vec<Tree>, ParseError> {
    let mut errors = Vec::new();

    match attempt_exprs(tokens) {
        Ok(trees) => return Ok(trees),
        Err(e) => errors.push(to_parse_error(e, text, origin)),
    }

    // Handler clauses: `try x catch <tokens> end`, handlers are group 1.
    let handler_prefix = [
        Lexeme::Try,
        Lexeme::Atom("x".to_string()),
        Lexeme::Catch,
    ];
    match attempt_wrapped(tokens, &handler_prefix, 1) {
        Ok(trees) => return Ok(trees),
        Err(e) => errors.push(to_parse_error(e, text, origin)),
    }

    // Fun clauses: `fun <tokens> end`, clauses are group 0.
    match attempt_wrapped(tokens, &[Lexeme::Fun], 0) {
        Ok(trees) => return Ok(trees),
        Err(e) => errors.push(to_parse_error(e, text, origin)),
    }

    // If clauses: `if <tokens> end`, clauses are group 0.
    match attempt_wrapped(tokens, &[Lexeme::If], 0) {
        Ok(trees) => return Ok(trees),
        Err(e) => errors.push(to_parse_error(e, text, origin)),
    }

    Err(pick_error(errors))
}

/// Shape (a): the whole stream as a comma-separated expression sequence.
fn attempt_exprs(tokens: &[Spanned<Lexeme>]) -> Result<Vec<Tree>, SyntaxError> {
    let mut stream = tokens.to_vec();
    stream.push(Spanned::synthetic(Lexeme::Dot));
    stream.push(Spanned::synthetic(Lexeme::Eof));
    Parser::new(stream).parse_exprs()
}

/// Shapes (b)-(d): wrap the stream in synthetic boundary tokens, parse
/// the result as one expression, and extract the named child group.
fn attempt_wrapped(
    tokens: &[Spanned<Lexeme>],
    prefix: &[Lexeme],
    group: usize,
) -> Result<Vec<Tree>, SyntaxError> {
    let mut stream: Vec<Spanned<Lexeme>> =
        prefix.iter().cloned().map(Spanned::synthetic).collect();
    stream.extend(tokens.iter().cloned());
    stream.push(Spanned::synthetic(Lexeme::End));
    stream.push(Spanned::synthetic(Lexeme::Dot));
    stream.push(Spanned::synthetic(Lexeme::Eof));

    let mut exprs = Parser::new(stream).parse_exprs()?;
    // The wrapper must be the sole parsed expression. A trailing
    // expression means part of the stream escaped the clause body by
    // consuming the synthetic closing token; accepting it would drop
    // that tail from the output.
    if exprs.len() != 1 {
        return Err(SyntaxError::new(
            "unexpected expression after clauses".to_string(),
            exprs[1].span,
        ));
    }
    let wrapper = exprs.remove(0);
    Ok(wrapper.groups()[group].clone())
}

/// Select the error to report when every fallback shape rejected the
/// stream: prefer errors with a source position; among those take the
/// lexicographically greatest (line, column, message) — the attempt that
/// got furthest; otherwise any captured error; otherwise a generic one.
pub(crate) fn pick_error(errors: Vec<ParseError>) -> ParseError {
    if let Some(best) = errors
        .iter()
        .filter(|e| e.at.is_some())
        .max_by(|a, b| (a.at, &a.message).cmp(&(b.at, &b.message)))
    {
        return best.clone();
    }
    errors
        .into_iter()
        .next()
        .unwrap_or_else(|| ParseError::new("unknown parse error", None))
}

fn to_parse_error(e: SyntaxError, text: &str, origin: Origin) -> ParseError {
    ParseError::new(e.message, position_of(text, e.span, origin))
}

/// (line, column) of a span start, offset by the fragment's origin.
/// Synthetic spans have no position.
fn position_of(text: &str, span: Span, origin: Origin) -> Option<(u32, u32)> {
    if span.is_synthetic() {
        return None;
    }
    let offset = (span.start as usize).min(text.len());
    let before = &text[..offset];
    let newlines = before.matches('\n').count() as u32;
    let line_start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
    let column = (offset - line_start) as u32;
    if newlines == 0 {
        Some((origin.line, origin.column + column))
    } else {
        Some((origin.line + newlines, column + 1))
    }
}

//! Placeholder-aware syntax-tree templates.
//!
//! Source fragments with embedded metavariables (`@name`, `_@Name`,
//! integers >= 9090 spelled `909...`) parse into trees; trees convert to
//! templates; templates substitute bound subtrees or match against
//! ground trees to recover bindings. Everything is a pure function over
//! immutable inputs — safe to call from any number of threads.
//!
//! ```
//! use metatree::{match_pattern, quote, Binding, Tag};
//!
//! let pattern = &quote("call(_@fn, _@@args)").unwrap()[0];
//! let ground = &quote("call(foo, 1, 2, 3)").unwrap()[0];
//! let bindings = match_pattern(pattern, ground).unwrap().unwrap();
//! match bindings.get(&Tag::Name("args".into())) {
//!     Some(Binding::Seq(args)) => assert_eq!(args.len(), 3),
//!     _ => unreachable!(),
//! }
//! ```

pub mod diagnostic;
pub mod env;
pub mod fragment;
pub mod lexeme;
pub mod lexer;
pub mod matching;
pub mod meta;
pub mod parser;
pub mod span;
pub mod subst;
pub mod template;
pub mod tree;

pub use diagnostic::{EnvError, Error, ParseError, TemplateError};
pub use env::{Binding, Bindings, Env};
pub use fragment::{parse_fragment, Origin};
pub use span::{Span, Spanned};
pub use template::{Tag, Template, TemplateGroup};
pub use tree::{Scalar, Tree, TreeKind};

/// Parse fragment text into one or more trees.
pub fn quote(text: &str) -> Result<Vec<Tree>, Error> {
    parse_fragment(text, Origin::default()).map_err(Error::from)
}

/// Parse fragment text that starts at the given 1-based position of the
/// caller's source; error positions are reported relative to it.
pub fn quote_at(text: &str, line: u32, column: u32) -> Result<Vec<Tree>, Error> {
    parse_fragment(text, Origin { line, column }).map_err(Error::from)
}

/// Parse a sequence of source lines (joined with newlines) starting at
/// the given line.
pub fn quote_lines(lines: &[&str], line: u32) -> Result<Vec<Tree>, Error> {
    parse_fragment(&lines.join("\n"), Origin::line(line)).map_err(Error::from)
}

/// Substitute bound subtrees into a placeholder-bearing tree.
pub fn subst(tree: &Tree, env: &Env) -> Result<Tree, Error> {
    let template = Template::build(tree)?;
    Ok(subst::substitute(&template, env)?)
}

/// Parse fragment text and substitute in one step.
pub fn build(text: &str, env: &Env) -> Result<Vec<Tree>, Error> {
    quote(text)?.iter().map(|t| subst(t, env)).collect()
}

/// Match a ground tree against a placeholder-bearing pattern tree.
/// `Ok(None)` is ordinary match failure; `Err` means the pattern itself
/// is malformed.
pub fn match_pattern(pattern: &Tree, tree: &Tree) -> Result<Option<Bindings>, Error> {
    let template = Template::build(pattern)?;
    Ok(matching::match_template(&template, tree))
}

/// Match equal-length sequences pairwise, merging bindings; later pairs
/// overwrite earlier ones for the same name.
pub fn match_seq(patterns: &[Tree], trees: &[Tree]) -> Result<Option<Bindings>, Error> {
    let templates = patterns
        .iter()
        .map(Template::build)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(matching::match_template_seq(&templates, trees))
}

impl Template {
    /// Substitute bound subtrees into this template.
    pub fn substitute(&self, env: &Env) -> Result<Tree, EnvError> {
        subst::substitute(self, env)
    }

    /// Match a ground tree against this template.
    pub fn matches(&self, tree: &Tree) -> Option<Bindings> {
        matching::match_template(self, tree)
    }
}

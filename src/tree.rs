use std::fmt;

use crate::span::Span;

/// Node kinds of the host grammar. Leaves carry a scalar value; interior
/// kinds carry ordered groups of children.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TreeKind {
    // Leaves
    Atom,
    Var,
    Int,
    Str,
    Op,
    // Interior nodes
    Decl,
    Attribute,
    Function,
    Clause,
    Match,
    BinOp,
    UnOp,
    Call,
    Remote,
    Tuple,
    List,
    Case,
    If,
    Try,
    Fun,
}

impl TreeKind {
    pub fn name(self) -> &'static str {
        match self {
            TreeKind::Atom => "atom",
            TreeKind::Var => "var",
            TreeKind::Int => "int",
            TreeKind::Str => "str",
            TreeKind::Op => "op",
            TreeKind::Decl => "decl",
            TreeKind::Attribute => "attribute",
            TreeKind::Function => "function",
            TreeKind::Clause => "clause",
            TreeKind::Match => "match",
            TreeKind::BinOp => "binop",
            TreeKind::UnOp => "unop",
            TreeKind::Call => "call",
            TreeKind::Remote => "remote",
            TreeKind::Tuple => "tuple",
            TreeKind::List => "list",
            TreeKind::Case => "case",
            TreeKind::If => "if",
            TreeKind::Try => "try",
            TreeKind::Fun => "fun",
        }
    }
}

impl TreeKind {
    /// How many child groups an interior node of this kind carries.
    /// Leaves carry none.
    fn group_arity(self) -> std::ops::RangeInclusive<usize> {
        match self {
            TreeKind::Atom | TreeKind::Var | TreeKind::Int | TreeKind::Str | TreeKind::Op => 0..=0,
            TreeKind::Decl | TreeKind::Tuple | TreeKind::If | TreeKind::Fun => 1..=1,
            TreeKind::List => 1..=2,
            TreeKind::Attribute
            | TreeKind::Function
            | TreeKind::Match
            | TreeKind::UnOp
            | TreeKind::Call
            | TreeKind::Remote
            | TreeKind::Case
            | TreeKind::Try => 2..=2,
            TreeKind::Clause | TreeKind::BinOp => 3..=3,
        }
    }
}

impl fmt::Display for TreeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Scalar payload of a leaf node.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Scalar {
    Name(String),
    Int(i64),
    Text(String),
    Op(String),
}

/// An immutable syntax tree node: a kind tag, a span (opaque attribute,
/// ignored by all comparisons), and either a scalar value (leaf) or an
/// ordered list of child groups (interior node).
#[derive(Clone, Debug, serde::Serialize)]
pub struct Tree {
    pub kind: TreeKind,
    pub span: Span,
    value: Option<Scalar>,
    groups: Vec<Vec<Tree>>,
}

impl Tree {
    pub fn leaf(kind: TreeKind, span: Span, value: Scalar) -> Self {
        Self {
            kind,
            span,
            value: Some(value),
            groups: Vec::new(),
        }
    }

    pub fn node(kind: TreeKind, span: Span, groups: Vec<Vec<Tree>>) -> Self {
        debug_assert!(
            kind.group_arity().contains(&groups.len()),
            "{} node built with {} child groups",
            kind,
            groups.len()
        );
        Self {
            kind,
            span,
            value: None,
            groups,
        }
    }

    pub fn atom(name: impl Into<String>, span: Span) -> Self {
        Self::leaf(TreeKind::Atom, span, Scalar::Name(name.into()))
    }

    pub fn var(name: impl Into<String>, span: Span) -> Self {
        Self::leaf(TreeKind::Var, span, Scalar::Name(name.into()))
    }

    pub fn int(value: i64, span: Span) -> Self {
        Self::leaf(TreeKind::Int, span, Scalar::Int(value))
    }

    pub fn string(text: impl Into<String>, span: Span) -> Self {
        Self::leaf(TreeKind::Str, span, Scalar::Text(text.into()))
    }

    pub fn op(name: impl Into<String>, span: Span) -> Self {
        Self::leaf(TreeKind::Op, span, Scalar::Op(name.into()))
    }

    pub fn is_leaf(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn value(&self) -> Option<&Scalar> {
        self.value.as_ref()
    }

    pub fn groups(&self) -> &[Vec<Tree>] {
        &self.groups
    }

    /// Name of an `Atom` or `Var` leaf.
    pub fn leaf_name(&self) -> Option<&str> {
        match (&self.kind, &self.value) {
            (TreeKind::Atom | TreeKind::Var, Some(Scalar::Name(s))) => Some(s),
            _ => None,
        }
    }

    /// Value of an `Int` leaf.
    pub fn int_value(&self) -> Option<i64> {
        match (&self.kind, &self.value) {
            (TreeKind::Int, Some(Scalar::Int(n))) => Some(*n),
            _ => None,
        }
    }

    /// Deep structural equality, ignoring spans.
    pub fn deep_eq(&self, other: &Tree) -> bool {
        self.kind == other.kind
            && self.value == other.value
            && self.groups.len() == other.groups.len()
            && self
                .groups
                .iter()
                .zip(&other.groups)
                .all(|(a, b)| a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.deep_eq(y)))
    }
}

/// Binding strength of an expression form, used only for inserting
/// parentheses when rendering trees back to source text.
fn prec(tree: &Tree) -> u8 {
    match tree.kind {
        TreeKind::Match => 1,
        TreeKind::BinOp => match tree.groups.get(1).and_then(|g| g.first()).and_then(Tree::value) {
            Some(Scalar::Op(op)) => match op.as_str() {
                "==" | "/=" | "<" | "=<" | ">" | ">=" => 2,
                "+" | "-" | "++" => 3,
                _ => 4,
            },
            _ => 4,
        },
        TreeKind::UnOp => 5,
        _ => 6,
    }
}

fn fmt_seq(f: &mut fmt::Formatter<'_>, trees: &[Tree], sep: &str) -> fmt::Result {
    for (i, t) in trees.iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        write!(f, "{}", t)?;
    }
    Ok(())
}

fn fmt_wrapped(f: &mut fmt::Formatter<'_>, tree: &Tree, min: u8) -> fmt::Result {
    if prec(tree) < min {
        write!(f, "({})", tree)
    } else {
        write!(f, "{}", tree)
    }
}

/// One clause: `Patterns [when Guard] -> Body`, with fun clauses
/// parenthesising their pattern list.
fn fmt_clause(f: &mut fmt::Formatter<'_>, clause: &Tree, parens: bool) -> fmt::Result {
    let gs = clause.groups();
    let (pats, guard, body) = (&gs[0], &gs[1], &gs[2]);
    if parens {
        f.write_str("(")?;
        fmt_seq(f, pats, ", ")?;
        f.write_str(")")?;
    } else {
        fmt_seq(f, pats, ", ")?;
    }
    if !guard.is_empty() {
        if !pats.is_empty() || parens {
            f.write_str(" ")?;
        }
        f.write_str("when ")?;
        fmt_seq(f, guard, ", ")?;
    }
    if !pats.is_empty() || !guard.is_empty() || parens {
        f.write_str(" ")?;
    }
    f.write_str("-> ")?;
    fmt_seq(f, body, ", ")
}

impl fmt::Display for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.kind, &self.value) {
            (TreeKind::Atom | TreeKind::Var, Some(Scalar::Name(s))) => f.write_str(s),
            (TreeKind::Int, Some(Scalar::Int(n))) => write!(f, "{}", n),
            (TreeKind::Str, Some(Scalar::Text(s))) => {
                write!(f, "\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
            }
            (TreeKind::Op, Some(Scalar::Op(s))) => f.write_str(s),
            _ => {
                let gs = &self.groups;
                match self.kind {
                    TreeKind::Decl => {
                        write!(f, "{}.", gs[0][0])
                    }
                    TreeKind::Attribute => {
                        write!(f, "-{}(", gs[0][0])?;
                        fmt_seq(f, &gs[1], ", ")?;
                        f.write_str(").")
                    }
                    TreeKind::Function => {
                        for (i, clause) in gs[1].iter().enumerate() {
                            if i > 0 {
                                f.write_str(";\n")?;
                            }
                            write!(f, "{}", gs[0][0])?;
                            fmt_clause(f, clause, true)?;
                        }
                        f.write_str(".")
                    }
                    TreeKind::Clause => fmt_clause(f, self, false),
                    TreeKind::Match => {
                        fmt_wrapped(f, &gs[0][0], 2)?;
                        f.write_str(" = ")?;
                        fmt_wrapped(f, &gs[1][0], 1)
                    }
                    TreeKind::BinOp => {
                        let level = prec(self);
                        fmt_wrapped(f, &gs[0][0], level)?;
                        write!(f, " {} ", gs[1][0])?;
                        fmt_wrapped(f, &gs[2][0], level + 1)
                    }
                    TreeKind::UnOp => {
                        write!(f, "{}", gs[0][0])?;
                        fmt_wrapped(f, &gs[1][0], 5)
                    }
                    TreeKind::Call => {
                        fmt_wrapped(f, &gs[0][0], 6)?;
                        f.write_str("(")?;
                        fmt_seq(f, &gs[1], ", ")?;
                        f.write_str(")")
                    }
                    TreeKind::Remote => {
                        fmt_wrapped(f, &gs[0][0], 6)?;
                        f.write_str(":")?;
                        fmt_wrapped(f, &gs[1][0], 6)
                    }
                    TreeKind::Tuple => {
                        f.write_str("{")?;
                        fmt_seq(f, &gs[0], ", ")?;
                        f.write_str("}")
                    }
                    TreeKind::List => {
                        f.write_str("[")?;
                        fmt_seq(f, &gs[0], ", ")?;
                        if gs.len() > 1 {
                            f.write_str(" | ")?;
                            write!(f, "{}", gs[1][0])?;
                        }
                        f.write_str("]")
                    }
                    TreeKind::Case => {
                        write!(f, "case {} of ", gs[0][0])?;
                        fmt_seq(f, &gs[1], "; ")?;
                        f.write_str(" end")
                    }
                    TreeKind::If => {
                        f.write_str("if ")?;
                        fmt_seq(f, &gs[0], "; ")?;
                        f.write_str(" end")
                    }
                    TreeKind::Try => {
                        f.write_str("try ")?;
                        fmt_seq(f, &gs[0], ", ")?;
                        f.write_str(" catch ")?;
                        fmt_seq(f, &gs[1], "; ")?;
                        f.write_str(" end")
                    }
                    TreeKind::Fun => {
                        f.write_str("fun ")?;
                        for (i, clause) in gs[0].iter().enumerate() {
                            if i > 0 {
                                f.write_str("; ")?;
                            }
                            fmt_clause(f, clause, true)?;
                        }
                        f.write_str(" end")
                    }
                    // Leaf kinds are handled above; an interior node never
                    // carries a leaf kind.
                    _ => write!(f, "<{}>", self.kind),
                }
            }
        }
    }
}

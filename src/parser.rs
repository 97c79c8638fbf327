use crate::diagnostic::SyntaxError;
use crate::lexeme::Lexeme;
use crate::span::{Span, Spanned};
use crate::tree::{Tree, TreeKind};

const MAX_NESTING_DEPTH: u32 = 256;

type PResult<T> = Result<T, SyntaxError>;

/// Recursive-descent parser over one token stream. Fails on the first
/// syntax error; the fragment layer decides what to do with the failure.
pub(crate) struct Parser {
    tokens: Vec<Spanned<Lexeme>>,
    pos: usize,
    depth: u32,
}

impl Parser {
    pub(crate) fn new(tokens: Vec<Spanned<Lexeme>>) -> Self {
        Self {
            tokens,
            pos: 0,
            depth: 0,
        }
    }

    /// Parse one top-level declaration followed by its `.` terminator:
    /// an attribute, a function definition, or a bare expression wrapped
    /// in a `Decl` node.
    pub(crate) fn parse_form(mut self) -> PResult<Tree> {
        let form = self.form()?;
        self.expect(&Lexeme::Dot)?;
        self.expect(&Lexeme::Eof)?;
        Ok(form)
    }

    /// Parse a comma-separated expression sequence followed by `.`.
    pub(crate) fn parse_exprs(mut self) -> PResult<Vec<Tree>> {
        let exprs = self.comma_exprs()?;
        self.expect(&Lexeme::Dot)?;
        self.expect(&Lexeme::Eof)?;
        Ok(exprs)
    }

    fn form(&mut self) -> PResult<Tree> {
        let start = self.current_span();
        if self.at(&Lexeme::Minus) && matches!(self.peek_at(1), Lexeme::Atom(_)) {
            return self.attribute(start);
        }
        if self.function_head_ahead() {
            return self.function(start);
        }
        let expr = self.expr()?;
        let span = start.merge(self.prev_span());
        Ok(Tree::node(TreeKind::Decl, span, vec![vec![expr]]))
    }

    /// `-name(Args)`
    fn attribute(&mut self, start: Span) -> PResult<Tree> {
        self.expect(&Lexeme::Minus)?;
        let name = self.expect_atom_leaf()?;
        self.expect(&Lexeme::LParen)?;
        let args = if self.at(&Lexeme::RParen) {
            Vec::new()
        } else {
            self.comma_exprs()?
        };
        self.expect(&Lexeme::RParen)?;
        let span = start.merge(self.prev_span());
        Ok(Tree::node(TreeKind::Attribute, span, vec![vec![name], args]))
    }

    /// `name(Patterns) [when Guard] -> Body ; ...`
    fn function(&mut self, start: Span) -> PResult<Tree> {
        let mut name = None;
        let mut clauses = Vec::new();
        loop {
            let clause_start = self.current_span();
            let clause_name = self.expect_atom_leaf()?;
            if name.is_none() {
                name = Some(clause_name);
            }
            self.expect(&Lexeme::LParen)?;
            let pats = if self.at(&Lexeme::RParen) {
                Vec::new()
            } else {
                self.comma_patterns()?
            };
            self.expect(&Lexeme::RParen)?;
            let guard = self.opt_guard()?;
            self.expect(&Lexeme::Arrow)?;
            let body = self.comma_exprs()?;
            let span = clause_start.merge(self.prev_span());
            clauses.push(Tree::node(TreeKind::Clause, span, vec![pats, guard, body]));
            if !self.eat(&Lexeme::Semicolon) {
                break;
            }
        }
        let span = start.merge(self.prev_span());
        let name = name.expect("at least one clause was parsed");
        Ok(Tree::node(
            TreeKind::Function,
            span,
            vec![vec![name], clauses],
        ))
    }

    // ── Expressions ──

    fn comma_exprs(&mut self) -> PResult<Vec<Tree>> {
        let mut exprs = vec![self.expr()?];
        while self.eat(&Lexeme::Comma) {
            exprs.push(self.expr()?);
        }
        Ok(exprs)
    }

    fn expr(&mut self) -> PResult<Tree> {
        self.expr_bp(0)
    }

    fn expr_bp(&mut self, min_bp: u8) -> PResult<Tree> {
        self.enter_nesting()?;
        let start = self.current_span();

        let mut lhs = if self.at(&Lexeme::Minus) || self.at(&Lexeme::Plus) {
            let op = self.unary_op_leaf();
            let arg = self.expr_bp(9)?;
            let span = start.merge(self.prev_span());
            Tree::node(TreeKind::UnOp, span, vec![vec![op], vec![arg]])
        } else {
            self.apply_expr()?
        };

        while let Some((text, lbp, rbp)) = binary_op(self.peek()) {
            if lbp < min_bp {
                break;
            }
            let op_span = self.current_span();
            self.advance();
            let rhs = self.expr_bp(rbp)?;
            let span = start.merge(self.prev_span());
            lhs = if text == "=" {
                Tree::node(TreeKind::Match, span, vec![vec![lhs], vec![rhs]])
            } else {
                Tree::node(
                    TreeKind::BinOp,
                    span,
                    vec![vec![lhs], vec![Tree::op(text, op_span)], vec![rhs]],
                )
            };
        }

        self.exit_nesting();
        Ok(lhs)
    }

    /// Primary expression with call and remote-call suffixes:
    /// `f(..)`, `m:f(..)`.
    fn apply_expr(&mut self) -> PResult<Tree> {
        let start = self.current_span();
        let mut target = self.primary()?;

        if self.eat(&Lexeme::Colon) {
            let name = self.primary()?;
            let span = start.merge(self.prev_span());
            target = Tree::node(TreeKind::Remote, span, vec![vec![target], vec![name]]);
        }

        if self.eat(&Lexeme::LParen) {
            let args = if self.at(&Lexeme::RParen) {
                Vec::new()
            } else {
                self.comma_exprs()?
            };
            self.expect(&Lexeme::RParen)?;
            let span = start.merge(self.prev_span());
            target = Tree::node(TreeKind::Call, span, vec![vec![target], args]);
        }

        Ok(target)
    }

    fn primary(&mut self) -> PResult<Tree> {
        let span = self.current_span();
        match self.peek().clone() {
            Lexeme::Integer(n) => {
                self.advance();
                Ok(Tree::int(n, span))
            }
            Lexeme::Atom(name) => {
                self.advance();
                Ok(Tree::atom(name, span))
            }
            Lexeme::Var(name) => {
                self.advance();
                Ok(Tree::var(name, span))
            }
            Lexeme::Str(text) => {
                self.advance();
                Ok(Tree::string(text, span))
            }
            Lexeme::LBrace => {
                self.advance();
                let elems = if self.at(&Lexeme::RBrace) {
                    Vec::new()
                } else {
                    self.comma_exprs()?
                };
                self.expect(&Lexeme::RBrace)?;
                Ok(Tree::node(
                    TreeKind::Tuple,
                    span.merge(self.prev_span()),
                    vec![elems],
                ))
            }
            Lexeme::LBracket => {
                self.advance();
                self.list_rest(span, Self::comma_exprs, Self::expr)
            }
            Lexeme::LParen => {
                self.advance();
                let inner = self.expr()?;
                self.expect(&Lexeme::RParen)?;
                Ok(inner)
            }
            Lexeme::Case => self.case_expr(span),
            Lexeme::If => self.if_expr(span),
            Lexeme::Try => self.try_expr(span),
            Lexeme::Fun => self.fun_expr(span),
            other => Err(self.err_here(&format!(
                "expected expression, found {}",
                other.description()
            ))),
        }
    }

    /// `[Elems]` or `[Elems | Tail]`, after the opening bracket.
    fn list_rest(
        &mut self,
        start: Span,
        elems: fn(&mut Self) -> PResult<Vec<Tree>>,
        tail: fn(&mut Self) -> PResult<Tree>,
    ) -> PResult<Tree> {
        if self.eat(&Lexeme::RBracket) {
            return Ok(Tree::node(
                TreeKind::List,
                start.merge(self.prev_span()),
                vec![Vec::new()],
            ));
        }
        let elems = elems(self)?;
        let mut groups = vec![elems];
        if self.eat(&Lexeme::Bar) {
            groups.push(vec![tail(self)?]);
        }
        self.expect(&Lexeme::RBracket)?;
        Ok(Tree::node(
            TreeKind::List,
            start.merge(self.prev_span()),
            groups,
        ))
    }

    /// `case Subject of Clauses end`
    fn case_expr(&mut self, start: Span) -> PResult<Tree> {
        self.expect(&Lexeme::Case)?;
        let subject = self.expr()?;
        self.expect(&Lexeme::Of)?;
        let clauses = self.clause_seq(Self::case_clause)?;
        self.expect(&Lexeme::End)?;
        Ok(Tree::node(
            TreeKind::Case,
            start.merge(self.prev_span()),
            vec![vec![subject], clauses],
        ))
    }

    /// `if Clauses end`
    fn if_expr(&mut self, start: Span) -> PResult<Tree> {
        self.expect(&Lexeme::If)?;
        let clauses = self.clause_seq(Self::if_clause)?;
        self.expect(&Lexeme::End)?;
        Ok(Tree::node(
            TreeKind::If,
            start.merge(self.prev_span()),
            vec![clauses],
        ))
    }

    /// `try Body catch Handlers end`
    fn try_expr(&mut self, start: Span) -> PResult<Tree> {
        self.expect(&Lexeme::Try)?;
        let body = self.comma_exprs()?;
        self.expect(&Lexeme::Catch)?;
        let handlers = self.clause_seq(Self::case_clause)?;
        self.expect(&Lexeme::End)?;
        Ok(Tree::node(
            TreeKind::Try,
            start.merge(self.prev_span()),
            vec![body, handlers],
        ))
    }

    /// `fun Clauses end`
    fn fun_expr(&mut self, start: Span) -> PResult<Tree> {
        self.expect(&Lexeme::Fun)?;
        let clauses = self.clause_seq(Self::fun_clause)?;
        self.expect(&Lexeme::End)?;
        Ok(Tree::node(
            TreeKind::Fun,
            start.merge(self.prev_span()),
            vec![clauses],
        ))
    }

    // ── Clauses ──

    fn clause_seq(&mut self, clause: fn(&mut Self) -> PResult<Tree>) -> PResult<Vec<Tree>> {
        let mut clauses = vec![clause(self)?];
        while self.eat(&Lexeme::Semicolon) {
            clauses.push(clause(self)?);
        }
        Ok(clauses)
    }

    /// `Pattern [when Guard] -> Body` — case subjects and catch handlers.
    fn case_clause(&mut self) -> PResult<Tree> {
        let start = self.current_span();
        let pat = self.pattern()?;
        let guard = self.opt_guard()?;
        self.expect(&Lexeme::Arrow)?;
        let body = self.comma_exprs()?;
        let span = start.merge(self.prev_span());
        Ok(Tree::node(
            TreeKind::Clause,
            span,
            vec![vec![pat], guard, body],
        ))
    }

    /// `Guard -> Body` — no patterns at all.
    fn if_clause(&mut self) -> PResult<Tree> {
        let start = self.current_span();
        let guard = self.comma_exprs()?;
        self.expect(&Lexeme::Arrow)?;
        let body = self.comma_exprs()?;
        let span = start.merge(self.prev_span());
        Ok(Tree::node(
            TreeKind::Clause,
            span,
            vec![Vec::new(), guard, body],
        ))
    }

    /// `(Patterns) [when Guard] -> Body` — the head parentheses are what
    /// distinguishes fun clauses from handler clauses.
    fn fun_clause(&mut self) -> PResult<Tree> {
        let start = self.current_span();
        self.expect(&Lexeme::LParen)?;
        let pats = if self.at(&Lexeme::RParen) {
            Vec::new()
        } else {
            self.comma_patterns()?
        };
        self.expect(&Lexeme::RParen)?;
        let guard = self.opt_guard()?;
        self.expect(&Lexeme::Arrow)?;
        let body = self.comma_exprs()?;
        let span = start.merge(self.prev_span());
        Ok(Tree::node(TreeKind::Clause, span, vec![pats, guard, body]))
    }

    fn opt_guard(&mut self) -> PResult<Vec<Tree>> {
        if self.eat(&Lexeme::When) {
            self.comma_exprs()
        } else {
            Ok(Vec::new())
        }
    }

    // ── Patterns ──
    //
    // Patterns are a restricted expression form: literals, variables,
    // tuples, lists, and `=` matches. Parenthesised patterns do not
    // exist, so a leading '(' can only belong to a fun-clause head.

    fn comma_patterns(&mut self) -> PResult<Vec<Tree>> {
        let mut pats = vec![self.pattern()?];
        while self.eat(&Lexeme::Comma) {
            pats.push(self.pattern()?);
        }
        Ok(pats)
    }

    fn pattern(&mut self) -> PResult<Tree> {
        self.enter_nesting()?;
        let start = self.current_span();
        let lhs = self.pattern_primary()?;
        let result = if self.eat(&Lexeme::Eq) {
            let rhs = self.pattern()?;
            let span = start.merge(self.prev_span());
            Tree::node(TreeKind::Match, span, vec![vec![lhs], vec![rhs]])
        } else {
            lhs
        };
        self.exit_nesting();
        Ok(result)
    }

    fn pattern_primary(&mut self) -> PResult<Tree> {
        let span = self.current_span();
        match self.peek().clone() {
            Lexeme::Integer(n) => {
                self.advance();
                Ok(Tree::int(n, span))
            }
            Lexeme::Minus => {
                self.advance();
                if let Lexeme::Integer(n) = *self.peek() {
                    self.advance();
                    Ok(Tree::int(-n, span.merge(self.prev_span())))
                } else {
                    Err(self.err_here(&format!(
                        "expected integer after '-' in pattern, found {}",
                        self.peek().description()
                    )))
                }
            }
            Lexeme::Atom(name) => {
                self.advance();
                Ok(Tree::atom(name, span))
            }
            Lexeme::Var(name) => {
                self.advance();
                Ok(Tree::var(name, span))
            }
            Lexeme::Str(text) => {
                self.advance();
                Ok(Tree::string(text, span))
            }
            Lexeme::LBrace => {
                self.advance();
                let elems = if self.at(&Lexeme::RBrace) {
                    Vec::new()
                } else {
                    self.comma_patterns()?
                };
                self.expect(&Lexeme::RBrace)?;
                Ok(Tree::node(
                    TreeKind::Tuple,
                    span.merge(self.prev_span()),
                    vec![elems],
                ))
            }
            Lexeme::LBracket => {
                self.advance();
                self.list_rest(span, Self::comma_patterns, Self::pattern)
            }
            other => Err(self.err_here(&format!(
                "expected pattern, found {}",
                other.description()
            ))),
        }
    }

    // ── Lookahead ──

    /// True when the upcoming tokens form a function-definition head:
    /// `atom ( .. ) ->` or `atom ( .. ) when`. A call expression shares
    /// the prefix but is never followed by '->' or 'when'.
    fn function_head_ahead(&self) -> bool {
        if !matches!(self.peek(), Lexeme::Atom(_)) || !matches!(self.peek_at(1), Lexeme::LParen) {
            return false;
        }
        let mut i = self.pos + 2;
        let mut depth = 1u32;
        while depth > 0 {
            match self.tokens.get(i).map(|t| &t.node) {
                Some(Lexeme::LParen) => depth += 1,
                Some(Lexeme::RParen) => depth -= 1,
                Some(Lexeme::Eof) | None => return false,
                Some(_) => {}
            }
            i += 1;
        }
        matches!(
            self.tokens.get(i).map(|t| &t.node),
            Some(Lexeme::Arrow | Lexeme::When)
        )
    }

    // ── Token helpers ──

    fn peek(&self) -> &Lexeme {
        &self.tokens[self.pos.min(self.tokens.len() - 1)].node
    }

    fn peek_at(&self, offset: usize) -> &Lexeme {
        let i = (self.pos + offset).min(self.tokens.len() - 1);
        &self.tokens[i].node
    }

    fn current_span(&self) -> Span {
        self.tokens[self.pos.min(self.tokens.len() - 1)].span
    }

    fn prev_span(&self) -> Span {
        self.tokens[self.pos.saturating_sub(1).min(self.tokens.len() - 1)].span
    }

    fn advance(&mut self) {
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
    }

    fn at(&self, token: &Lexeme) -> bool {
        self.peek() == token
    }

    fn eat(&mut self, token: &Lexeme) -> bool {
        if self.at(token) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &Lexeme) -> PResult<Span> {
        if self.at(token) {
            let span = self.current_span();
            self.advance();
            Ok(span)
        } else {
            Err(self.err_here(&format!(
                "expected {}, found {}",
                token.description(),
                self.peek().description()
            )))
        }
    }

    fn expect_atom_leaf(&mut self) -> PResult<Tree> {
        if let Lexeme::Atom(name) = self.peek().clone() {
            let span = self.current_span();
            self.advance();
            Ok(Tree::atom(name, span))
        } else {
            Err(self.err_here(&format!(
                "expected atom, found {}",
                self.peek().description()
            )))
        }
    }

    fn unary_op_leaf(&mut self) -> Tree {
        let span = self.current_span();
        let text = if self.at(&Lexeme::Minus) { "-" } else { "+" };
        self.advance();
        Tree::op(text, span)
    }

    fn err_here(&self, message: &str) -> SyntaxError {
        SyntaxError::new(message.to_string(), self.current_span())
    }

    fn enter_nesting(&mut self) -> PResult<()> {
        self.depth += 1;
        if self.depth > MAX_NESTING_DEPTH {
            return Err(self.err_here("nesting depth exceeded (maximum 256 levels)"));
        }
        Ok(())
    }

    fn exit_nesting(&mut self) {
        self.depth -= 1;
    }
}

/// (operator text, left binding power, right binding power).
/// Higher binding power = higher precedence; `=` is right-associative.
fn binary_op(token: &Lexeme) -> Option<(&'static str, u8, u8)> {
    match token {
        Lexeme::Eq => Some(("=", 2, 1)),
        Lexeme::EqEq => Some(("==", 3, 4)),
        Lexeme::Neq => Some(("/=", 3, 4)),
        Lexeme::Lt => Some(("<", 3, 4)),
        Lexeme::Le => Some(("=<", 3, 4)),
        Lexeme::Gt => Some((">", 3, 4)),
        Lexeme::Ge => Some((">=", 3, 4)),
        Lexeme::Plus => Some(("+", 5, 6)),
        Lexeme::Minus => Some(("-", 5, 6)),
        Lexeme::PlusPlus => Some(("++", 5, 6)),
        Lexeme::Star => Some(("*", 7, 8)),
        Lexeme::Slash => Some(("/", 7, 8)),
        Lexeme::Div => Some(("div", 7, 8)),
        Lexeme::Rem => Some(("rem", 7, 8)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;
    use crate::tree::Scalar;

    fn form(source: &str) -> Tree {
        let tokens = Lexer::new(source).tokenize().unwrap();
        Parser::new(tokens).parse_form().unwrap()
    }

    fn exprs(source: &str) -> Vec<Tree> {
        let tokens = Lexer::new(source).tokenize().unwrap();
        Parser::new(tokens).parse_exprs().unwrap()
    }

    #[test]
    fn test_expression_form_wrapped_in_decl() {
        let tree = form("X = 1 + 2.");
        assert_eq!(tree.kind, TreeKind::Decl);
        let inner = &tree.groups()[0][0];
        assert_eq!(inner.kind, TreeKind::Match);
        assert_eq!(inner.groups()[1][0].kind, TreeKind::BinOp);
    }

    #[test]
    fn test_attribute_form() {
        let tree = form("-module(foo).");
        assert_eq!(tree.kind, TreeKind::Attribute);
        assert_eq!(tree.groups()[0][0].leaf_name(), Some("module"));
        assert_eq!(tree.groups()[1][0].leaf_name(), Some("foo"));
    }

    #[test]
    fn test_function_form() {
        let tree = form("f(X) -> X; f(0) when true -> 0.");
        assert_eq!(tree.kind, TreeKind::Function);
        assert_eq!(tree.groups()[0][0].leaf_name(), Some("f"));
        let clauses = &tree.groups()[1];
        assert_eq!(clauses.len(), 2);
        assert_eq!(clauses[0].kind, TreeKind::Clause);
        assert!(clauses[0].groups()[1].is_empty());
        assert_eq!(clauses[1].groups()[1].len(), 1);
    }

    #[test]
    fn test_call_is_not_a_function_head() {
        let tree = form("f(X).");
        assert_eq!(tree.kind, TreeKind::Decl);
        assert_eq!(tree.groups()[0][0].kind, TreeKind::Call);
    }

    #[test]
    fn test_precedence() {
        let es = exprs("1 + 2 * 3.");
        assert_eq!(es.len(), 1);
        let add = &es[0];
        assert_eq!(add.kind, TreeKind::BinOp);
        assert_eq!(add.groups()[1][0].value(), Some(&Scalar::Op("+".into())));
        assert_eq!(add.groups()[2][0].kind, TreeKind::BinOp);
    }

    #[test]
    fn test_match_right_associative() {
        let es = exprs("A = B = 1.");
        let outer = &es[0];
        assert_eq!(outer.kind, TreeKind::Match);
        assert_eq!(outer.groups()[0][0].leaf_name(), Some("A"));
        assert_eq!(outer.groups()[1][0].kind, TreeKind::Match);
    }

    #[test]
    fn test_remote_call() {
        let es = exprs("lists:reverse([1, 2]).");
        let call = &es[0];
        assert_eq!(call.kind, TreeKind::Call);
        assert_eq!(call.groups()[0][0].kind, TreeKind::Remote);
    }

    #[test]
    fn test_list_with_tail() {
        let es = exprs("[1, 2 | T].");
        let list = &es[0];
        assert_eq!(list.kind, TreeKind::List);
        assert_eq!(list.groups().len(), 2);
        assert_eq!(list.groups()[0].len(), 2);
        assert_eq!(list.groups()[1][0].leaf_name(), Some("T"));
    }

    #[test]
    fn test_case_expression() {
        let es = exprs("case X of 0 -> a; N when N > 0 -> b end.");
        let case = &es[0];
        assert_eq!(case.kind, TreeKind::Case);
        assert_eq!(case.groups()[1].len(), 2);
        let second = &case.groups()[1][1];
        assert_eq!(second.groups()[1].len(), 1);
    }

    #[test]
    fn test_try_catch() {
        let es = exprs("try f(X) catch failed -> 0 end.");
        let t = &es[0];
        assert_eq!(t.kind, TreeKind::Try);
        assert_eq!(t.groups()[0].len(), 1);
        assert_eq!(t.groups()[1][0].kind, TreeKind::Clause);
    }

    #[test]
    fn test_fun_clause_heads_are_parenthesised() {
        let es = exprs("fun (X) -> X; (0) -> 0 end.");
        let f = &es[0];
        assert_eq!(f.kind, TreeKind::Fun);
        assert_eq!(f.groups()[0].len(), 2);
    }

    #[test]
    fn test_pattern_rejects_parens() {
        let tokens = Lexer::new("case X of (Y) -> Y end.").tokenize().unwrap();
        assert!(Parser::new(tokens).parse_exprs().is_err());
    }

    #[test]
    fn test_if_clauses_have_no_patterns() {
        let es = exprs("if X > 0 -> pos; true -> neg end.");
        let clauses = &es[0].groups()[0];
        assert_eq!(clauses.len(), 2);
        assert!(clauses[0].groups()[0].is_empty());
        assert_eq!(clauses[0].groups()[1].len(), 1);
    }

    #[test]
    fn test_unterminated_exprs_fail() {
        let tokens = Lexer::new("1 + 2").tokenize().unwrap();
        assert!(Parser::new(tokens).parse_exprs().is_err());
    }
}

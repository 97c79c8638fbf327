use crate::diagnostic::SyntaxError;
use crate::lexeme::Lexeme;
use crate::span::{Span, Spanned};

/// Hand-written byte scanner for fragment text. Produces the full token
/// stream ending with `Eof`, or fails on the first malformed token.
pub struct Lexer<'src> {
    source: &'src [u8],
    pos: usize,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            source: source.as_bytes(),
            pos: 0,
        }
    }

    pub fn tokenize(mut self) -> Result<Vec<Spanned<Lexeme>>, SyntaxError> {
        let mut tokens = Vec::new();
        loop {
            let tok = self.next_token()?;
            let is_eof = tok.node == Lexeme::Eof;
            tokens.push(tok);
            if is_eof {
                break;
            }
        }
        Ok(tokens)
    }

    fn next_token(&mut self) -> Result<Spanned<Lexeme>, SyntaxError> {
        self.skip_whitespace_and_comments();

        if self.pos >= self.source.len() {
            return Ok(self.make_token(Lexeme::Eof, self.pos, self.pos));
        }

        let start = self.pos;
        let ch = self.source[self.pos];

        // Atoms: lowercase-initial names, or a '@'-initial metavariable atom
        if ch.is_ascii_lowercase() || ch == b'@' {
            return Ok(self.scan_atom());
        }

        // Variables: uppercase- or underscore-initial names
        if ch.is_ascii_uppercase() || ch == b'_' {
            return Ok(self.scan_var());
        }

        if ch.is_ascii_digit() {
            return self.scan_number();
        }

        if ch == b'"' {
            return self.scan_string();
        }

        self.scan_symbol(start)
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            while self.pos < self.source.len() && self.source[self.pos].is_ascii_whitespace() {
                self.pos += 1;
            }
            // '%' starts a comment running to end of line
            if self.pos < self.source.len() && self.source[self.pos] == b'%' {
                while self.pos < self.source.len() && self.source[self.pos] != b'\n' {
                    self.pos += 1;
                }
                continue;
            }
            break;
        }
    }

    fn scan_atom(&mut self) -> Spanned<Lexeme> {
        let start = self.pos;
        self.pos += 1;
        while self.pos < self.source.len() && is_name_continue(self.source[self.pos]) {
            self.pos += 1;
        }
        let text = std::str::from_utf8(&self.source[start..self.pos]).unwrap();
        let token = Lexeme::from_keyword(text).unwrap_or_else(|| Lexeme::Atom(text.to_string()));
        self.make_token(token, start, self.pos)
    }

    fn scan_var(&mut self) -> Spanned<Lexeme> {
        let start = self.pos;
        self.pos += 1;
        while self.pos < self.source.len() && is_name_continue(self.source[self.pos]) {
            self.pos += 1;
        }
        let text = std::str::from_utf8(&self.source[start..self.pos]).unwrap();
        self.make_token(Lexeme::Var(text.to_string()), start, self.pos)
    }

    fn scan_number(&mut self) -> Result<Spanned<Lexeme>, SyntaxError> {
        let start = self.pos;
        while self.pos < self.source.len() && self.source[self.pos].is_ascii_digit() {
            self.pos += 1;
        }
        let text = std::str::from_utf8(&self.source[start..self.pos]).unwrap();
        match text.parse::<i64>() {
            Ok(n) => Ok(self.make_token(Lexeme::Integer(n), start, self.pos)),
            Err(_) => Err(SyntaxError::new(
                format!("integer literal '{}' is too large", text),
                Span::new(start as u32, self.pos as u32),
            )),
        }
    }

    fn scan_string(&mut self) -> Result<Spanned<Lexeme>, SyntaxError> {
        let start = self.pos;
        self.pos += 1; // skip opening quote
        // Collected as raw bytes so multi-byte sequences pass through
        // untouched; decoded once at the closing quote.
        let mut bytes = Vec::new();
        while self.pos < self.source.len() {
            match self.source[self.pos] {
                b'"' => {
                    self.pos += 1;
                    let text = String::from_utf8(bytes).map_err(|_| {
                        SyntaxError::new(
                            "string literal is not valid utf-8".to_string(),
                            Span::new(start as u32, self.pos as u32),
                        )
                    })?;
                    return Ok(self.make_token(Lexeme::Str(text), start, self.pos));
                }
                b'\\' if self.pos + 1 < self.source.len() => {
                    let esc = self.source[self.pos + 1];
                    self.pos += 2;
                    bytes.push(match esc {
                        b'n' => b'\n',
                        b't' => b'\t',
                        other => other,
                    });
                }
                other => {
                    self.pos += 1;
                    bytes.push(other);
                }
            }
        }
        Err(SyntaxError::new(
            "unterminated string literal".to_string(),
            Span::new(start as u32, self.pos as u32),
        ))
    }

    fn scan_symbol(&mut self, start: usize) -> Result<Spanned<Lexeme>, SyntaxError> {
        let ch = self.source[self.pos];
        self.pos += 1;

        let token = match ch {
            b'(' => Lexeme::LParen,
            b')' => Lexeme::RParen,
            b'{' => Lexeme::LBrace,
            b'}' => Lexeme::RBrace,
            b'[' => Lexeme::LBracket,
            b']' => Lexeme::RBracket,
            b',' => Lexeme::Comma,
            b';' => Lexeme::Semicolon,
            b':' => Lexeme::Colon,
            b'|' => Lexeme::Bar,
            b'.' => Lexeme::Dot,
            b'*' => Lexeme::Star,
            b'<' => Lexeme::Lt,
            b'-' => {
                if self.peek() == Some(b'>') {
                    self.pos += 1;
                    Lexeme::Arrow
                } else {
                    Lexeme::Minus
                }
            }
            b'+' => {
                if self.peek() == Some(b'+') {
                    self.pos += 1;
                    Lexeme::PlusPlus
                } else {
                    Lexeme::Plus
                }
            }
            b'=' => {
                if self.peek() == Some(b'=') {
                    self.pos += 1;
                    Lexeme::EqEq
                } else if self.peek() == Some(b'<') {
                    self.pos += 1;
                    Lexeme::Le
                } else {
                    Lexeme::Eq
                }
            }
            b'/' => {
                if self.peek() == Some(b'=') {
                    self.pos += 1;
                    Lexeme::Neq
                } else {
                    Lexeme::Slash
                }
            }
            b'>' => {
                if self.peek() == Some(b'=') {
                    self.pos += 1;
                    Lexeme::Ge
                } else {
                    Lexeme::Gt
                }
            }
            other => {
                return Err(SyntaxError::new(
                    format!("unexpected character '{}'", other as char),
                    Span::new(start as u32, self.pos as u32),
                ));
            }
        };
        Ok(self.make_token(token, start, self.pos))
    }

    fn peek(&self) -> Option<u8> {
        self.source.get(self.pos).copied()
    }

    fn make_token(&self, token: Lexeme, start: usize, end: usize) -> Spanned<Lexeme> {
        Spanned::new(token, Span::new(start as u32, end as u32))
    }
}

fn is_name_continue(ch: u8) -> bool {
    ch.is_ascii_alphanumeric() || ch == b'_' || ch == b'@'
}

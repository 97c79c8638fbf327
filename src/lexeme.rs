/// All lexemes of the host grammar.
#[derive(Clone, Debug, PartialEq)]
pub enum Lexeme {
    // Keywords
    Case,
    Of,
    If,
    Fun,
    Try,
    Catch,
    When,
    End,
    Div,
    Rem,

    // Symbols
    LParen,   // (
    RParen,   // )
    LBrace,   // {
    RBrace,   // }
    LBracket, // [
    RBracket, // ]
    Comma,    // ,
    Semicolon, // ;
    Colon,    // :
    Bar,      // |
    Dot,      // .  (statement terminator)
    Arrow,    // ->
    Eq,       // =
    EqEq,     // ==
    Neq,      // /=
    Lt,       // <
    Le,       // =<
    Gt,       // >
    Ge,       // >=
    Plus,     // +
    Minus,    // -
    PlusPlus, // ++
    Star,     // *
    Slash,    // /

    // Literals
    Integer(i64),
    Atom(String),
    Var(String),
    Str(String),

    // End of input
    Eof,
}

impl Lexeme {
    /// Try to match an identifier string to a keyword lexeme.
    pub fn from_keyword(s: &str) -> Option<Lexeme> {
        match s {
            "case" => Some(Lexeme::Case),
            "of" => Some(Lexeme::Of),
            "if" => Some(Lexeme::If),
            "fun" => Some(Lexeme::Fun),
            "try" => Some(Lexeme::Try),
            "catch" => Some(Lexeme::Catch),
            "when" => Some(Lexeme::When),
            "end" => Some(Lexeme::End),
            "div" => Some(Lexeme::Div),
            "rem" => Some(Lexeme::Rem),
            _ => None,
        }
    }

    /// Human-readable description for error messages.
    pub fn description(&self) -> String {
        match self {
            Lexeme::Case => "'case'".to_string(),
            Lexeme::Of => "'of'".to_string(),
            Lexeme::If => "'if'".to_string(),
            Lexeme::Fun => "'fun'".to_string(),
            Lexeme::Try => "'try'".to_string(),
            Lexeme::Catch => "'catch'".to_string(),
            Lexeme::When => "'when'".to_string(),
            Lexeme::End => "'end'".to_string(),
            Lexeme::Div => "'div'".to_string(),
            Lexeme::Rem => "'rem'".to_string(),
            Lexeme::LParen => "'('".to_string(),
            Lexeme::RParen => "')'".to_string(),
            Lexeme::LBrace => "'{'".to_string(),
            Lexeme::RBrace => "'}'".to_string(),
            Lexeme::LBracket => "'['".to_string(),
            Lexeme::RBracket => "']'".to_string(),
            Lexeme::Comma => "','".to_string(),
            Lexeme::Semicolon => "';'".to_string(),
            Lexeme::Colon => "':'".to_string(),
            Lexeme::Bar => "'|'".to_string(),
            Lexeme::Dot => "'.'".to_string(),
            Lexeme::Arrow => "'->'".to_string(),
            Lexeme::Eq => "'='".to_string(),
            Lexeme::EqEq => "'=='".to_string(),
            Lexeme::Neq => "'/='".to_string(),
            Lexeme::Lt => "'<'".to_string(),
            Lexeme::Le => "'=<'".to_string(),
            Lexeme::Gt => "'>'".to_string(),
            Lexeme::Ge => "'>='".to_string(),
            Lexeme::Plus => "'+'".to_string(),
            Lexeme::Minus => "'-'".to_string(),
            Lexeme::PlusPlus => "'++'".to_string(),
            Lexeme::Star => "'*'".to_string(),
            Lexeme::Slash => "'/'".to_string(),
            Lexeme::Integer(n) => format!("integer '{}'", n),
            Lexeme::Atom(a) => format!("atom '{}'", a),
            Lexeme::Var(v) => format!("variable '{}'", v),
            Lexeme::Str(_) => "string literal".to_string(),
            Lexeme::Eof => "end of input".to_string(),
        }
    }
}

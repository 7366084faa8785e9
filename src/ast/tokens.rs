use crate::ast::Method;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Literals
    /// Decimal number, integer or fractional, optional exponent
    ///
    /// # Examples
    /// ```text
    /// 42
    /// 3.14
    /// 12.3e0
    /// ```
    Number(f64),

    /// String literal
    ///
    /// Both `'...'` and `"..."` forms normalize to the same token. The
    /// stored text has escapes already decoded.
    Str(String),

    /// Identifier: a variable (`$`, `$foo`, `@` is its own token) or a
    /// member name following `.`
    ///
    /// # Examples
    /// ```text
    /// $
    /// $docs
    /// name
    /// ```
    Ident(String),

    // Keywords, recognized only when the identifier stands alone
    /// `true`
    True,
    /// `false`
    False,
    /// `null`
    Null,
    /// `strict` mode prefix
    Strict,
    /// `lax` mode prefix
    Lax,
    /// `last`, largest valid index inside an array subscript
    Last,
    /// `to`, range separator in subscripts
    To,
    /// `exists` predicate
    Exists,
    /// `like_regex` predicate
    LikeRegex,
    /// `flag` clause of `like_regex`
    Flag,
    /// `starts` (first half of `starts with`)
    Starts,
    /// `with` (second half of `starts with`)
    With,
    /// `is` (first half of `is unknown`)
    Is,
    /// `unknown` (second half of `is unknown`)
    Unknown,

    /// Item method name, recognized only between `.` and `(`
    ///
    /// # Examples
    /// ```text
    /// $.type()
    /// $.size ()
    /// ```
    Func(Method),

    // Multi-character operators
    /// `==`
    EqEq,
    /// `!=` (also produced by `<>`)
    NotEq,
    /// `<=`
    LtEq,
    /// `>=`
    GtEq,
    /// `&&`
    AndAnd,
    /// `||`
    OrOr,
    /// `!`
    Bang,

    // Single-character tokens
    /// `.`
    Dot,
    /// `,`
    Comma,
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `[`
    LBracket,
    /// `]`
    RBracket,
    /// `*`
    Star,
    /// `/`
    Slash,
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `%`
    Percent,
    /// `<`
    Lt,
    /// `>`
    Gt,
    /// `?`
    Question,
    /// `@`
    At,

    /// End of input
    Eof,
}

impl Token {
    /// Canonical source text of the token. Strings render single-quoted
    /// with their decoded content.
    pub fn lexeme(&self) -> String {
        match self {
            Token::Number(n) => format!("{}", n),
            Token::Str(s) => format!("'{}'", s),
            Token::Ident(name) => name.clone(),
            Token::True => "true".to_string(),
            Token::False => "false".to_string(),
            Token::Null => "null".to_string(),
            Token::Strict => "strict".to_string(),
            Token::Lax => "lax".to_string(),
            Token::Last => "last".to_string(),
            Token::To => "to".to_string(),
            Token::Exists => "exists".to_string(),
            Token::LikeRegex => "like_regex".to_string(),
            Token::Flag => "flag".to_string(),
            Token::Starts => "starts".to_string(),
            Token::With => "with".to_string(),
            Token::Is => "is".to_string(),
            Token::Unknown => "unknown".to_string(),
            Token::Func(m) => m.name().to_string(),
            Token::EqEq => "==".to_string(),
            Token::NotEq => "!=".to_string(),
            Token::LtEq => "<=".to_string(),
            Token::GtEq => ">=".to_string(),
            Token::AndAnd => "&&".to_string(),
            Token::OrOr => "||".to_string(),
            Token::Bang => "!".to_string(),
            Token::Dot => ".".to_string(),
            Token::Comma => ",".to_string(),
            Token::LParen => "(".to_string(),
            Token::RParen => ")".to_string(),
            Token::LBracket => "[".to_string(),
            Token::RBracket => "]".to_string(),
            Token::Star => "*".to_string(),
            Token::Slash => "/".to_string(),
            Token::Plus => "+".to_string(),
            Token::Minus => "-".to_string(),
            Token::Percent => "%".to_string(),
            Token::Lt => "<".to_string(),
            Token::Gt => ">".to_string(),
            Token::Question => "?".to_string(),
            Token::At => "@".to_string(),
            Token::Eof => String::new(),
        }
    }

    /// Token description used in syntax error messages.
    pub fn describe(&self) -> String {
        match self {
            Token::Eof => "$end".to_string(),
            other => other.lexeme(),
        }
    }
}

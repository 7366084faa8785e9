use crate::ast::{Method, Token};

/// A lexical error, carrying the character span of the offending text.
#[derive(Debug, Clone, PartialEq)]
pub struct LexError {
    pub message: String,
    pub start: usize,
    pub end: usize,
}

impl LexError {
    fn new(message: String, start: usize, end: usize) -> Self {
        LexError {
            message,
            start,
            end,
        }
    }
}

impl std::fmt::Display for LexError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for LexError {}

fn valid_first_identifier_char(ch: char) -> bool {
    ch.is_alphabetic() || ch == '_' || ch == '$'
}

fn valid_identifier_char(ch: char) -> bool {
    ch.is_alphabetic() || ch.is_numeric() || ch == '_' || ch == '$'
}

pub struct Lexer {
    input: Vec<char>,
    position: usize,
    // Member names and method calls are only recognized right after `.`
    after_dot: bool,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Lexer {
            input: input.chars().collect(),
            position: 0,
            after_dot: false,
        }
    }

    fn current_char(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek_char(&self, offset: usize) -> Option<char> {
        self.input.get(self.position + offset).copied()
    }

    fn advance(&mut self) {
        self.position += 1;
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.current_char() {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn read_identifier(&mut self) -> String {
        let mut result = String::new();
        if let Some(ch) = self.current_char() {
            if valid_first_identifier_char(ch) {
                result.push(ch);
                self.advance();
            }
        }
        while let Some(ch) = self.current_char() {
            if valid_identifier_char(ch) {
                result.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        result
    }

    fn read_string(&mut self, quote: char, start: usize) -> Result<Token, LexError> {
        let mut result = String::new();
        self.advance(); // opening quote

        while let Some(ch) = self.current_char() {
            match ch {
                c if c == quote => {
                    self.advance();
                    return Ok(Token::Str(result));
                }
                '\\' => {
                    self.advance();
                    match self.current_char() {
                        Some('n') => result.push('\n'),
                        Some(c) if c == quote => result.push(quote),
                        Some(c) => {
                            return Err(LexError::new(
                                format!("invalid escape sequence \"\\{}\"", c),
                                self.position,
                                self.position + 1,
                            ));
                        }
                        None => {
                            return Err(LexError::new(
                                "unterminated string".to_string(),
                                start,
                                self.input.len(),
                            ));
                        }
                    }
                    self.advance();
                }
                _ => {
                    result.push(ch);
                    self.advance();
                }
            }
        }

        Err(LexError::new(
            "unterminated string".to_string(),
            start,
            self.input.len(),
        ))
    }

    fn read_number(&mut self, start: usize) -> Result<Token, LexError> {
        let mut number = String::new();

        while let Some(ch) = self.current_char() {
            if ch.is_ascii_digit() {
                number.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        if self.current_char() == Some('.') {
            number.push('.');
            self.advance();
            while let Some(ch) = self.current_char() {
                if ch.is_ascii_digit() {
                    number.push(ch);
                    self.advance();
                } else {
                    break;
                }
            }
        }
        if self.current_char() == Some('e') {
            number.push('e');
            self.advance();
            while let Some(ch) = self.current_char() {
                if ch.is_ascii_digit() {
                    number.push(ch);
                    self.advance();
                } else {
                    break;
                }
            }
        }

        match number.parse::<f64>() {
            Ok(n) => Ok(Token::Number(n)),
            Err(_) => Err(LexError::new(
                format!("invalid number \"{}\"", number),
                start,
                self.position,
            )),
        }
    }

    /// Classify an identifier standing alone: keywords are recognized,
    /// `$`-prefixed names pass through, anything else is an error.
    fn classify_keyword(&self, name: String, start: usize) -> Result<Token, LexError> {
        let token = match name.as_str() {
            "true" => Token::True,
            "false" => Token::False,
            "null" => Token::Null,
            "strict" => Token::Strict,
            "lax" => Token::Lax,
            "last" => Token::Last,
            "to" => Token::To,
            "exists" => Token::Exists,
            "like_regex" => Token::LikeRegex,
            "flag" => Token::Flag,
            "starts" => Token::Starts,
            "with" => Token::With,
            "is" => Token::Is,
            "unknown" => Token::Unknown,
            _ => {
                return Err(LexError::new(
                    format!("unrecognized keyword \"{}\"", name),
                    start,
                    self.position,
                ));
            }
        };
        Ok(token)
    }

    /// Classify an identifier that follows `.`: a method call if a `(`
    /// comes next (across optional whitespace), a plain member name
    /// otherwise. Keywords are not recognized here, so `$.last` is a
    /// member access.
    fn classify_member(&self, name: String, start: usize) -> Result<Token, LexError> {
        let mut offset = 0;
        while self.peek_char(offset).is_some_and(|c| c.is_whitespace()) {
            offset += 1;
        }
        if self.peek_char(offset) != Some('(') {
            return Ok(Token::Ident(name));
        }
        match Method::from_name(&name) {
            Some(method) => Ok(Token::Func(method)),
            None => Err(LexError::new(
                format!("invalid function \"{}\"", name),
                start,
                self.position,
            )),
        }
    }

    pub fn next_token(&mut self) -> Result<Token, LexError> {
        self.skip_whitespace();
        let start = self.position;
        let was_after_dot = self.after_dot;

        let token = match self.current_char() {
            None => Token::Eof,
            Some('$') => Token::Ident(self.read_identifier()),
            Some(ch) if ch.is_alphabetic() || ch == '_' => {
                let name = self.read_identifier();
                if was_after_dot {
                    self.classify_member(name, start)?
                } else {
                    self.classify_keyword(name, start)?
                }
            }
            Some(ch) if ch.is_ascii_digit() => self.read_number(start)?,
            Some('\'') => self.read_string('\'', start)?,
            Some('"') => self.read_string('"', start)?,
            Some('=') => {
                self.advance();
                if self.current_char() == Some('=') {
                    self.advance();
                    Token::EqEq
                } else {
                    return Err(LexError::new(
                        "use == instead of =".to_string(),
                        start,
                        start + 1,
                    ));
                }
            }
            Some('!') => {
                self.advance();
                if self.current_char() == Some('=') {
                    self.advance();
                    Token::NotEq
                } else {
                    Token::Bang
                }
            }
            Some('<') => {
                self.advance();
                match self.current_char() {
                    Some('=') => {
                        self.advance();
                        Token::LtEq
                    }
                    Some('>') => {
                        self.advance();
                        Token::NotEq
                    }
                    _ => Token::Lt,
                }
            }
            Some('>') => {
                self.advance();
                if self.current_char() == Some('=') {
                    self.advance();
                    Token::GtEq
                } else {
                    Token::Gt
                }
            }
            Some('&') => {
                self.advance();
                if self.current_char() == Some('&') {
                    self.advance();
                    Token::AndAnd
                } else {
                    return Err(LexError::new(
                        "& must be followed by &".to_string(),
                        start,
                        start + 1,
                    ));
                }
            }
            Some('|') => {
                self.advance();
                if self.current_char() == Some('|') {
                    self.advance();
                    Token::OrOr
                } else {
                    return Err(LexError::new(
                        "| must be followed by |".to_string(),
                        start,
                        start + 1,
                    ));
                }
            }
            Some('.') => {
                self.advance();
                Token::Dot
            }
            Some(',') => {
                self.advance();
                Token::Comma
            }
            Some('(') => {
                self.advance();
                Token::LParen
            }
            Some(')') => {
                self.advance();
                Token::RParen
            }
            Some('[') => {
                self.advance();
                Token::LBracket
            }
            Some(']') => {
                self.advance();
                Token::RBracket
            }
            Some('*') => {
                self.advance();
                Token::Star
            }
            Some('/') => {
                self.advance();
                Token::Slash
            }
            Some('+') => {
                self.advance();
                Token::Plus
            }
            Some('-') => {
                self.advance();
                Token::Minus
            }
            Some('%') => {
                self.advance();
                Token::Percent
            }
            Some('?') => {
                self.advance();
                Token::Question
            }
            Some('@') => {
                self.advance();
                Token::At
            }
            Some(ch) => {
                return Err(LexError::new(
                    format!("unexpected character '{}'", ch),
                    start,
                    start + 1,
                ));
            }
        };

        self.after_dot = token == Token::Dot;
        Ok(token)
    }

    /// Drain the remaining tokens, not including the trailing `Eof`.
    pub fn tokenize(mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            if token == Token::Eof {
                return Ok(tokens);
            }
            tokens.push(token);
        }
    }
}

#[test]
fn test_keywords_and_members() {
    let mut lexer = Lexer::new("lax $.last to last");
    assert_eq!(lexer.next_token().unwrap(), Token::Lax);
    assert_eq!(lexer.next_token().unwrap(), Token::Ident("$".to_string()));
    assert_eq!(lexer.next_token().unwrap(), Token::Dot);
    // `last` after a dot is a member name, not the keyword
    assert_eq!(lexer.next_token().unwrap(), Token::Ident("last".to_string()));
    assert_eq!(lexer.next_token().unwrap(), Token::To);
    assert_eq!(lexer.next_token().unwrap(), Token::Last);
    assert_eq!(lexer.next_token().unwrap(), Token::Eof);
}

#[test]
fn test_method_call_with_spaces() {
    let mut lexer = Lexer::new("$.floor   ()");
    assert_eq!(lexer.next_token().unwrap(), Token::Ident("$".to_string()));
    assert_eq!(lexer.next_token().unwrap(), Token::Dot);
    assert_eq!(lexer.next_token().unwrap(), Token::Func(Method::Floor));
    assert_eq!(lexer.next_token().unwrap(), Token::LParen);
    assert_eq!(lexer.next_token().unwrap(), Token::RParen);
    assert_eq!(lexer.next_token().unwrap(), Token::Eof);
}

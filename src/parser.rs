use crate::{
    ast::{
        Accessor, ArithOp, CmpOp, CompiledPattern, Expr, LogicOp, Method, Mode, Pred, Program,
        Subscript, Token, UnaryOp,
    },
    formatter,
    lexer::{LexError, Lexer},
};
use regex::RegexBuilder;
use std::mem;

// Parenthesis/filter nesting bound, so pathological inputs fail cleanly
// instead of exhausting the stack.
const MAX_DEPTH: usize = 512;

/// Errors that can occur while compiling a path program
#[derive(Debug, Clone)]
pub enum ParseError {
    /// Lexer error (with position)
    Lex(LexError),
    /// Syntax error, including the unexpected-token form
    Syntax(String),
    /// `like_regex` pattern rejected by the regex engine
    Regex(String),
    /// Context-sensitive rule violated
    Validation(String),
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::Lex(e) => write!(f, "{}", e),
            ParseError::Syntax(msg) => write!(f, "{}", msg),
            ParseError::Regex(msg) => write!(f, "{}", msg),
            ParseError::Validation(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ParseError::Lex(e) => Some(e),
            _ => None,
        }
    }
}

impl From<LexError> for ParseError {
    fn from(e: LexError) -> Self {
        ParseError::Lex(e)
    }
}

pub struct Parser {
    tokens: Vec<Token>,
    position: usize,
    depth: usize,
}

impl Parser {
    pub fn new(lexer: Lexer) -> Result<Self, ParseError> {
        let mut tokens = lexer.tokenize()?;
        tokens.push(Token::Eof);
        Ok(Parser {
            tokens,
            position: 0,
            depth: 0,
        })
    }

    fn current(&self) -> &Token {
        &self.tokens[self.position]
    }

    fn advance(&mut self) {
        if self.position + 1 < self.tokens.len() {
            self.position += 1;
        }
    }

    fn check(&self, token: &Token) -> bool {
        mem::discriminant(self.current()) == mem::discriminant(token)
    }

    fn expect(&mut self, expected: Token) -> Result<(), ParseError> {
        if !self.check(&expected) {
            return Err(self.unexpected());
        }
        self.advance();
        Ok(())
    }

    fn unexpected(&self) -> ParseError {
        ParseError::Syntax(format!(
            "syntax error: unexpected {}",
            self.current().describe()
        ))
    }

    fn enter(&mut self) -> Result<(), ParseError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(ParseError::Syntax(
                "syntax error: expression nesting too deep".to_string(),
            ));
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    /// Parse a complete program: an optional mode prefix followed by the
    /// root expression, consuming all input.
    pub fn parse_program(&mut self) -> Result<Program, ParseError> {
        let mode = match self.current() {
            Token::Strict => {
                self.advance();
                Some(Mode::Strict)
            }
            Token::Lax => {
                self.advance();
                Some(Mode::Lax)
            }
            _ => None,
        };

        let root = self.parse_expr()?;
        if *self.current() != Token::Eof {
            return Err(self.unexpected());
        }
        Ok(Program { mode, root })
    }

    pub fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        self.enter()?;
        let result = self.parse_additive();
        self.leave();
        result
    }

    fn parse_additive(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_term()?;

        loop {
            let op = match self.current() {
                Token::Plus => ArithOp::Add,
                Token::Minus => ArithOp::Subtract,
                _ => break,
            };

            self.advance();
            let right = self.parse_term()?;

            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_term(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_factor()?;

        loop {
            let op = match self.current() {
                Token::Star => ArithOp::Multiply,
                Token::Slash => ArithOp::Divide,
                Token::Percent => ArithOp::Modulo,
                _ => break,
            };

            self.advance();
            let right = self.parse_factor()?;

            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_factor(&mut self) -> Result<Expr, ParseError> {
        let op = match self.current() {
            Token::Plus => Some(UnaryOp::Plus),
            Token::Minus => Some(UnaryOp::Minus),
            _ => None,
        };
        if let Some(op) = op {
            self.advance();
            let expr = self.parse_factor()?;
            return Ok(Expr::Unary {
                op,
                expr: Box::new(expr),
            });
        }

        let mut expr = self.parse_primary()?;
        while let Some(accessor) = self.parse_accessor()? {
            expr = Expr::Access {
                left: Box::new(expr),
                accessor,
            };
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        // Tokens are cloned out rather than moved: the predicate parser may
        // rewind over consumed tokens.
        match self.current().clone() {
            Token::Number(n) => {
                self.advance();
                Ok(Expr::Number(n))
            }
            Token::Str(s) => {
                self.advance();
                Ok(Expr::Str(s))
            }
            Token::True => {
                self.advance();
                Ok(Expr::Bool(true))
            }
            Token::False => {
                self.advance();
                Ok(Expr::Bool(false))
            }
            Token::Null => {
                self.advance();
                Ok(Expr::Null)
            }
            Token::Ident(name) => {
                self.advance();
                Ok(Expr::Variable(name))
            }
            Token::At => {
                self.advance();
                Ok(Expr::Variable("@".to_string()))
            }
            Token::Last => {
                self.advance();
                Ok(Expr::Last)
            }
            Token::LParen => {
                self.advance();
                self.enter()?;
                let inner = self.parse_expr();
                self.leave();
                let inner = inner?;
                self.expect(Token::RParen)?;
                Ok(Expr::Paren(Box::new(inner)))
            }
            _ => Err(self.unexpected()),
        }
    }

    /// Parse one postfix accessor, or `None` when the next token does not
    /// start one.
    fn parse_accessor(&mut self) -> Result<Option<Accessor>, ParseError> {
        match self.current() {
            Token::Dot => {
                self.advance();
                Ok(Some(self.parse_dot_accessor()?))
            }
            Token::LBracket => {
                self.advance();
                Ok(Some(self.parse_bracket_accessor()?))
            }
            Token::Question => {
                self.advance();
                self.expect(Token::LParen)?;
                self.enter()?;
                let pred = self.parse_pred();
                self.leave();
                let pred = pred?;
                self.expect(Token::RParen)?;
                Ok(Some(Accessor::Filter(Box::new(pred))))
            }
            _ => Ok(None),
        }
    }

    fn parse_dot_accessor(&mut self) -> Result<Accessor, ParseError> {
        match self.current().clone() {
            Token::Star => {
                self.advance();
                Ok(Accessor::WildcardMember)
            }
            Token::Ident(name) => {
                self.advance();
                Ok(Accessor::Field {
                    name,
                    quoted: false,
                })
            }
            Token::Str(name) => {
                self.advance();
                Ok(Accessor::Field { name, quoted: true })
            }
            Token::Func(method) => {
                self.advance();
                self.expect(Token::LParen)?;
                let arg = if let Token::Str(s) = self.current().clone() {
                    if method != Method::Datetime {
                        return Err(self.unexpected());
                    }
                    self.advance();
                    Some(s)
                } else {
                    None
                };
                self.expect(Token::RParen)?;
                Ok(Accessor::Method { method, arg })
            }
            _ => Err(self.unexpected()),
        }
    }

    fn parse_bracket_accessor(&mut self) -> Result<Accessor, ParseError> {
        if self.check(&Token::Star) {
            self.advance();
            self.expect(Token::RBracket)?;
            return Ok(Accessor::WildcardElement);
        }

        let mut subscripts = vec![self.parse_subscript()?];
        while self.check(&Token::Comma) {
            self.advance();
            subscripts.push(self.parse_subscript()?);
        }
        self.expect(Token::RBracket)?;
        Ok(Accessor::Subscripts(subscripts))
    }

    fn parse_subscript(&mut self) -> Result<Subscript, ParseError> {
        let start = self.parse_expr()?;
        let end = if self.check(&Token::To) {
            self.advance();
            Some(self.parse_expr()?)
        } else {
            None
        };
        Ok(Subscript { start, end })
    }

    pub fn parse_pred(&mut self) -> Result<Pred, ParseError> {
        self.parse_pred_or()
    }

    fn parse_pred_or(&mut self) -> Result<Pred, ParseError> {
        let mut left = self.parse_pred_and()?;

        while self.check(&Token::OrOr) {
            self.advance();
            let right = self.parse_pred_and()?;

            left = Pred::Logic {
                op: LogicOp::Or,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_pred_and(&mut self) -> Result<Pred, ParseError> {
        let mut left = self.parse_pred_not()?;

        while self.check(&Token::AndAnd) {
            self.advance();
            let right = self.parse_pred_not()?;

            left = Pred::Logic {
                op: LogicOp::And,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_pred_not(&mut self) -> Result<Pred, ParseError> {
        if self.check(&Token::Bang) {
            self.advance();
            let inner = self.parse_pred_not()?;
            return Ok(Pred::Not(Box::new(inner)));
        }
        self.parse_pred_is_unknown()
    }

    fn parse_pred_is_unknown(&mut self) -> Result<Pred, ParseError> {
        let mut pred = self.parse_pred_base()?;

        while self.check(&Token::Is) {
            self.advance();
            self.expect(Token::Unknown)?;
            pred = Pred::IsUnknown(Box::new(pred));
        }
        Ok(pred)
    }

    fn parse_pred_base(&mut self) -> Result<Pred, ParseError> {
        if self.check(&Token::Exists) {
            self.advance();
            self.expect(Token::LParen)?;
            let expr = self.parse_expr()?;
            self.expect(Token::RParen)?;
            return Ok(Pred::Exists(Box::new(expr)));
        }

        // An open paren may group a predicate or an expression operand;
        // try the predicate reading first and rewind if it fails.
        if self.check(&Token::LParen) {
            let saved = self.position;
            self.advance();
            self.enter()?;
            let attempt = self.parse_pred();
            self.leave();
            match attempt {
                Ok(pred) => {
                    self.expect(Token::RParen)?;
                    return Ok(Pred::Paren(Box::new(pred)));
                }
                Err(_) => self.position = saved,
            }
        }

        let left = self.parse_expr()?;

        if let Some(op) = match self.current() {
            Token::EqEq => Some(CmpOp::Equal),
            Token::NotEq => Some(CmpOp::NotEqual),
            Token::Lt => Some(CmpOp::LessThan),
            Token::LtEq => Some(CmpOp::LessEqual),
            Token::Gt => Some(CmpOp::GreaterThan),
            Token::GtEq => Some(CmpOp::GreaterEqual),
            _ => None,
        } {
            self.advance();
            let right = self.parse_expr()?;
            return Ok(Pred::Compare {
                op,
                left: Box::new(left),
                right: Box::new(right),
            });
        }

        if self.check(&Token::LikeRegex) {
            self.advance();
            return self.parse_like_regex(left);
        }

        if self.check(&Token::Starts) {
            self.advance();
            self.expect(Token::With)?;
            let prefix = self.parse_expr()?;
            return Ok(Pred::StartsWith {
                expr: Box::new(left),
                prefix: Box::new(prefix),
            });
        }

        // A bare expression is not a predicate: filters test truth values,
        // not raw JSON.
        let rendered = formatter::format_expr(&left);
        Err(ParseError::Validation(format!(
            "filter expressions cannot be raw json values - if you expect `{}` to be boolean true, write `{} == true`",
            rendered, rendered
        )))
    }

    fn parse_like_regex(&mut self, left: Expr) -> Result<Pred, ParseError> {
        let raw = match self.current().clone() {
            Token::Str(s) => {
                self.advance();
                s
            }
            _ => return Err(self.unexpected()),
        };

        let flag = if self.check(&Token::Flag) {
            self.advance();
            match self.current().clone() {
                Token::Str(s) => {
                    self.advance();
                    Some(s)
                }
                _ => return Err(self.unexpected()),
            }
        } else {
            None
        };

        let regex = RegexBuilder::new(&raw)
            .case_insensitive(flag.as_deref().is_some_and(|f| f.contains('i')))
            .build()
            .map_err(|e| ParseError::Regex(e.to_string()))?;

        Ok(Pred::LikeRegex {
            expr: Box::new(left),
            pattern: CompiledPattern { raw, flag, regex },
        })
    }
}

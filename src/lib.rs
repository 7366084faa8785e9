pub mod ast;
pub mod evaluator;
pub mod formatter;
pub mod lexer;
pub mod parser;
pub mod validator;

pub use ast::{Accessor, Expr, Method, Mode, Pred, Program, Subscript, Token};
pub use evaluator::{EvalError, Evaluator, TriBool};
pub use formatter::format;
pub use lexer::{LexError, Lexer};
pub use parser::{ParseError, Parser};
pub use validator::Validator;

/// Compile path source text into a program: lex, parse, validate.
///
/// # Examples
///
/// ```
/// let program = sqlpath::parse("strict $.store.book[0 to last]").unwrap();
/// assert_eq!(sqlpath::format(&program), "strict $.store.book[0 to last]");
/// ```
pub fn parse(input: &str) -> Result<Program, ParseError> {
    let lexer = Lexer::new(input);
    let mut parser = Parser::new(lexer)?;
    let program = parser.parse_program()?;
    Validator::validate(&program)?;
    Ok(program)
}

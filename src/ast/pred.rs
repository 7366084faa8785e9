use crate::ast::{CmpOp, Expr, LogicOp};
use regex::Regex;

/// A `like_regex` pattern compiled at parse time.
///
/// The raw pattern and flag are kept for formatting; equality ignores the
/// compiled automaton so predicate nodes can be compared structurally.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    pub raw: String,
    pub flag: Option<String>,
    pub regex: Regex,
}

impl PartialEq for CompiledPattern {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw && self.flag == other.flag
    }
}

/// A predicate node. Evaluating a predicate produces one of the SQL/JSON
/// truth values: true, false, or unknown. Predicates appear only inside
/// filters and never produce JSON values themselves.
#[derive(Debug, Clone, PartialEq)]
pub enum Pred {
    /// Comparison between two expression sequences
    ///
    /// # Example
    /// ```text
    /// @.price < 100
    /// ```
    Compare {
        op: CmpOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },

    /// `&&` / `||` under three-valued logic
    Logic {
        op: LogicOp,
        left: Box<Pred>,
        right: Box<Pred>,
    },

    /// `!` negation; unknown stays unknown
    Not(Box<Pred>),

    /// Parenthesized predicate, kept so formatting round-trips
    Paren(Box<Pred>),

    /// `exists (expr)`: true when the expression produces a non-empty
    /// sequence, false when it produces nothing or fails
    Exists(Box<Expr>),

    /// `expr like_regex 'pattern' [flag 'i']`
    LikeRegex {
        expr: Box<Expr>,
        pattern: CompiledPattern,
    },

    /// `expr starts with prefix`
    StartsWith { expr: Box<Expr>, prefix: Box<Expr> },

    /// `(pred) is unknown`
    IsUnknown(Box<Pred>),
}

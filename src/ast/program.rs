use crate::ast::Expr;

/// Evaluation mode of a path program.
///
/// Lax mode absorbs structural mismatches by wrapping scalars, unwrapping
/// arrays, and skipping missing members; strict mode surfaces them as
/// errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Lax,
    Strict,
}

/// A compiled path program: an optional explicit mode and the root
/// expression.
///
/// `mode` is `None` when the source did not spell a mode prefix; evaluation
/// then defaults to lax, and formatting emits no prefix.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub mode: Option<Mode>,
    pub root: Expr,
}

impl Program {
    /// The mode evaluation runs under.
    pub fn effective_mode(&self) -> Mode {
        self.mode.unwrap_or(Mode::Lax)
    }
}

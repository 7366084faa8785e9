//! Context-sensitive checks the grammar cannot express.
//!
//! `@` and `last` parse anywhere an expression does, but `@` only means
//! something under a filter and `last` only inside an array subscript. A
//! single post-parse walk tracks both nesting depths and rejects the first
//! violation it finds.

use crate::ast::{Accessor, Expr, Pred, Program};
use crate::parser::ParseError;

#[derive(Default)]
pub struct Validator {
    filter_depth: usize,
    subscript_depth: usize,
}

impl Validator {
    pub fn validate(program: &Program) -> Result<(), ParseError> {
        Validator::default().check_expr(&program.root)
    }

    fn check_expr(&mut self, expr: &Expr) -> Result<(), ParseError> {
        match expr {
            Expr::Number(_) | Expr::Str(_) | Expr::Bool(_) | Expr::Null => Ok(()),
            Expr::Variable(name) => {
                if name == "@" && self.filter_depth == 0 {
                    return Err(ParseError::Validation(
                        "@ only allowed within filter expressions".to_string(),
                    ));
                }
                Ok(())
            }
            Expr::Last => {
                if self.subscript_depth == 0 {
                    return Err(ParseError::Validation(
                        "`last` can only appear inside an array subscript".to_string(),
                    ));
                }
                Ok(())
            }
            Expr::Binary { left, right, .. } => {
                self.check_expr(left)?;
                self.check_expr(right)
            }
            Expr::Unary { expr, .. } => self.check_expr(expr),
            Expr::Paren(inner) => self.check_expr(inner),
            Expr::Access { left, accessor } => {
                self.check_expr(left)?;
                self.check_accessor(accessor)
            }
        }
    }

    fn check_accessor(&mut self, accessor: &Accessor) -> Result<(), ParseError> {
        match accessor {
            Accessor::Field { .. }
            | Accessor::WildcardMember
            | Accessor::WildcardElement
            | Accessor::Method { .. } => Ok(()),
            Accessor::Subscripts(subscripts) => {
                self.subscript_depth += 1;
                let result = (|| {
                    for subscript in subscripts {
                        self.check_expr(&subscript.start)?;
                        if let Some(end) = &subscript.end {
                            self.check_expr(end)?;
                        }
                    }
                    Ok(())
                })();
                self.subscript_depth -= 1;
                result
            }
            Accessor::Filter(pred) => {
                self.filter_depth += 1;
                let result = self.check_pred(pred);
                self.filter_depth -= 1;
                result
            }
        }
    }

    fn check_pred(&mut self, pred: &Pred) -> Result<(), ParseError> {
        match pred {
            Pred::Compare { left, right, .. } => {
                self.check_expr(left)?;
                self.check_expr(right)
            }
            Pred::Logic { left, right, .. } => {
                self.check_pred(left)?;
                self.check_pred(right)
            }
            Pred::Not(inner) | Pred::Paren(inner) | Pred::IsUnknown(inner) => {
                self.check_pred(inner)
            }
            Pred::Exists(expr) => self.check_expr(expr),
            Pred::LikeRegex { expr, .. } => self.check_expr(expr),
            Pred::StartsWith { expr, prefix } => {
                self.check_expr(expr)?;
                self.check_expr(prefix)
            }
        }
    }
}

//! Canonical source rendering of path programs.
//!
//! Formatting is the inverse of parsing: for any accepted program text,
//! parsing the formatted output yields a structurally identical AST.
//! Parenthesization is never invented, so the canonical text of a parsed
//! program reflects exactly the grouping the source spelled out.
//!
//! Conventions:
//!
//! - the mode prefix (`lax ` / `strict `) appears only when the program
//!   spelled one;
//! - strings render double-quoted, escaping the quote, backslash, and
//!   newline;
//! - numbers use the shortest representation that reads back to the same
//!   value;
//! - binary operators and predicates are space-separated, filters render
//!   as ` ? (...)`.

use crate::ast::{Accessor, Expr, Method, Mode, Pred, Program, Subscript};

/// Render a compiled program back to path source text.
pub fn format(program: &Program) -> String {
    let mut out = String::new();
    match program.mode {
        Some(Mode::Lax) => out.push_str("lax "),
        Some(Mode::Strict) => out.push_str("strict "),
        None => {}
    }
    write_expr(&mut out, &program.root);
    out
}

/// Render a single expression, used both by [`format`] and by diagnostics
/// that quote an expression back at the user.
pub fn format_expr(expr: &Expr) -> String {
    let mut out = String::new();
    write_expr(&mut out, expr);
    out
}

fn write_expr(out: &mut String, expr: &Expr) {
    match expr {
        Expr::Number(n) => out.push_str(&format!("{}", n)),
        Expr::Str(s) => write_quoted(out, s),
        Expr::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Expr::Null => out.push_str("null"),
        Expr::Variable(name) => out.push_str(name),
        Expr::Last => out.push_str("last"),
        Expr::Binary { op, left, right } => {
            write_expr(out, left);
            out.push(' ');
            out.push_str(op.symbol());
            out.push(' ');
            write_expr(out, right);
        }
        Expr::Unary { op, expr } => {
            out.push_str(op.symbol());
            write_expr(out, expr);
        }
        Expr::Paren(inner) => {
            out.push('(');
            write_expr(out, inner);
            out.push(')');
        }
        Expr::Access { left, accessor } => {
            write_expr(out, left);
            write_accessor(out, accessor);
        }
    }
}

fn write_pred(out: &mut String, pred: &Pred) {
    match pred {
        Pred::Compare { op, left, right } => {
            write_expr(out, left);
            out.push(' ');
            out.push_str(op.symbol());
            out.push(' ');
            write_expr(out, right);
        }
        Pred::Logic { op, left, right } => {
            write_pred(out, left);
            out.push(' ');
            out.push_str(op.symbol());
            out.push(' ');
            write_pred(out, right);
        }
        Pred::Not(inner) => {
            out.push('!');
            write_pred(out, inner);
        }
        Pred::Paren(inner) => {
            out.push('(');
            write_pred(out, inner);
            out.push(')');
        }
        Pred::Exists(expr) => {
            out.push_str("exists (");
            write_expr(out, expr);
            out.push(')');
        }
        Pred::LikeRegex { expr, pattern } => {
            write_expr(out, expr);
            out.push_str(" like_regex ");
            write_quoted(out, &pattern.raw);
            if let Some(flag) = &pattern.flag {
                out.push_str(" flag ");
                write_quoted(out, flag);
            }
        }
        Pred::StartsWith { expr, prefix } => {
            write_expr(out, expr);
            out.push_str(" starts with ");
            write_expr(out, prefix);
        }
        Pred::IsUnknown(inner) => {
            write_pred(out, inner);
            out.push_str(" is unknown");
        }
    }
}

fn write_accessor(out: &mut String, accessor: &Accessor) {
    match accessor {
        Accessor::Field { name, quoted } => {
            out.push('.');
            if *quoted {
                write_quoted(out, name);
            } else {
                out.push_str(name);
            }
        }
        Accessor::WildcardMember => out.push_str(".*"),
        Accessor::Subscripts(subscripts) => {
            out.push('[');
            for (i, subscript) in subscripts.iter().enumerate() {
                if i != 0 {
                    out.push_str(", ");
                }
                write_subscript(out, subscript);
            }
            out.push(']');
        }
        Accessor::WildcardElement => out.push_str("[*]"),
        Accessor::Method { method, arg } => {
            out.push('.');
            out.push_str(method.name());
            out.push('(');
            if *method == Method::Datetime {
                if let Some(arg) = arg {
                    write_quoted(out, arg);
                }
            }
            out.push(')');
        }
        Accessor::Filter(pred) => {
            out.push_str(" ? (");
            write_pred(out, pred);
            out.push(')');
        }
    }
}

fn write_subscript(out: &mut String, subscript: &Subscript) {
    write_expr(out, &subscript.start);
    if let Some(end) = &subscript.end {
        out.push_str(" to ");
        write_expr(out, end);
    }
}

fn write_quoted(out: &mut String, s: &str) {
    out.push('"');
    for ch in s.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            _ => out.push(ch),
        }
    }
    out.push('"');
}

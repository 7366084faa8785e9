//! # SQL/JSON Path - Abstract Syntax Tree
//!
//! This module defines the Abstract Syntax Tree (AST) for SQL/JSON path
//! programs, the path language standardized in SQL:2016 for navigating,
//! filtering, and computing over JSON documents.
//!
//! ## Architecture Overview
//!
//! The AST module is organized into focused submodules:
//!
//! - **[tokens]** - Lexical tokens produced by the lexer
//! - **[operators]** - Arithmetic, comparison, and logical operators
//! - **[expr]** - Expression nodes (literals, variables, arithmetic, access)
//! - **[pred]** - Predicate nodes evaluated under three-valued logic
//! - **[accessor]** - Accessor nodes applied postfix to an expression
//! - **[program]** - The compiled program with its evaluation mode
//!
//! ## The Three Sorts
//!
//! Unlike a single-sorted expression tree, the nodes here are split by what
//! they produce:
//!
//! - An [`Expr`] produces a *sequence* of JSON values.
//! - A [`Pred`] produces a three-valued boolean (true/false/unknown).
//! - An [`Accessor`] consumes a sequence and produces a sequence.
//!
//! A predicate can only appear inside a filter (`? (...)`), and an accessor
//! only on the right-hand side of an access chain, so the split is enforced
//! by construction rather than by runtime checks.
//!
//! ## Examples
//!
//! ```text
//! $.phones[*] ? (exists (@.type)).type
//! ```
//!
//! This program unwraps the `phones` array, keeps elements carrying a
//! `type` field, and projects that field.
//!
//! ```text
//! strict $[0 to last].floor()
//! ```
//!
//! Subscript ranges may use `last`, the largest valid index of the array
//! being subscripted.
pub mod accessor;
pub mod expr;
pub mod operators;
pub mod pred;
pub mod program;
pub mod tokens;

pub use accessor::{Accessor, Method, Subscript};
pub use expr::Expr;
pub use operators::{ArithOp, CmpOp, LogicOp, UnaryOp};
pub use pred::{CompiledPattern, Pred};
pub use program::{Mode, Program};
pub use tokens::Token;

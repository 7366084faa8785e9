use crate::ast::{Expr, Pred};

/// An accessor node: consumes the sequence produced by the expression to
/// its left and produces a new sequence. Accessors only ever appear on the
/// right-hand side of an access chain.
#[derive(Debug, Clone, PartialEq)]
pub enum Accessor {
    /// Member access: `.name` or `."quoted name"`
    ///
    /// `quoted` records which form was parsed so formatting round-trips.
    Field { name: String, quoted: bool },

    /// `.*`, all member values of an object
    WildcardMember,

    /// `[s1, s2, ...]`, a list of subscripts applied in order
    Subscripts(Vec<Subscript>),

    /// `[*]`, all elements of an array
    WildcardElement,

    /// Item method call: `.type()`, `.size()`, ...
    ///
    /// Only `.datetime()` takes an argument, an uninterpreted template
    /// string.
    Method { method: Method, arg: Option<String> },

    /// Filter: `? (pred)`, keeps the elements for which the predicate is
    /// true
    Filter(Box<Pred>),
}

/// A single array subscript: an index, or an inclusive `start to end`
/// range.
#[derive(Debug, Clone, PartialEq)]
pub struct Subscript {
    pub start: Expr,
    pub end: Option<Expr>,
}

/// The item methods of the path language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Type,
    Size,
    Double,
    Ceiling,
    Floor,
    Abs,
    Datetime,
    Keyvalue,
}

impl Method {
    pub fn name(&self) -> &'static str {
        match self {
            Method::Type => "type",
            Method::Size => "size",
            Method::Double => "double",
            Method::Ceiling => "ceiling",
            Method::Floor => "floor",
            Method::Abs => "abs",
            Method::Datetime => "datetime",
            Method::Keyvalue => "keyvalue",
        }
    }

    /// Look up a method by its source name, as lexed between `.` and `(`.
    pub fn from_name(name: &str) -> Option<Method> {
        match name {
            "type" => Some(Method::Type),
            "size" => Some(Method::Size),
            "double" => Some(Method::Double),
            "ceiling" => Some(Method::Ceiling),
            "floor" => Some(Method::Floor),
            "abs" => Some(Method::Abs),
            "datetime" => Some(Method::Datetime),
            "keyvalue" => Some(Method::Keyvalue),
            _ => None,
        }
    }
}

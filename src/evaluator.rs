use serde_json::{Map, Value};

use crate::{
    ast::{Accessor, ArithOp, CmpOp, Expr, LogicOp, Method, Mode, Pred, Program, Subscript, UnaryOp},
    parser::ParseError,
};

/// The SQL/JSON three-valued boolean returned by predicates.
///
/// Distinct from the JSON boolean: `Unknown` marks comparisons across
/// mismatched types and contained evaluation errors, and never appears in a
/// result sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriBool {
    True,
    False,
    Unknown,
}

impl TriBool {
    pub fn and(self, other: TriBool) -> TriBool {
        match (self, other) {
            (TriBool::False, _) | (_, TriBool::False) => TriBool::False,
            (TriBool::True, TriBool::True) => TriBool::True,
            _ => TriBool::Unknown,
        }
    }

    pub fn or(self, other: TriBool) -> TriBool {
        match (self, other) {
            (TriBool::True, _) | (_, TriBool::True) => TriBool::True,
            (TriBool::False, TriBool::False) => TriBool::False,
            _ => TriBool::Unknown,
        }
    }

    pub fn negate(self) -> TriBool {
        match self {
            TriBool::True => TriBool::False,
            TriBool::False => TriBool::True,
            TriBool::Unknown => TriBool::Unknown,
        }
    }
}

/// Errors that can occur while evaluating a path program.
///
/// Only strict mode surfaces structural mismatches; in lax mode most of
/// them are absorbed by wrapping, unwrapping, or skipping. Errors raised
/// under a filter never escape it: the predicate folds them into unknown.
#[derive(Debug, Clone, PartialEq)]
pub enum EvalError {
    /// Wrong type for an operation
    Structural(String),

    /// An operation needing exactly one value saw zero or many
    Cardinality(String),

    /// Array index outside the array (strict mode)
    OutOfBounds(String),

    /// Variable with no binding
    UnknownVariable(String),

    /// Parsed but unevaluable function (`.datetime()`)
    Unimplemented(String),
}

impl std::fmt::Display for EvalError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EvalError::Structural(msg)
            | EvalError::Cardinality(msg)
            | EvalError::OutOfBounds(msg)
            | EvalError::Unimplemented(msg) => write!(f, "{}", msg),
            EvalError::UnknownVariable(name) => write!(f, "unknown variable {}", name),
        }
    }
}

impl std::error::Error for EvalError {}

/// Renders a value into an error message as compact JSON.
fn render(value: &Value) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "null".to_string())
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        _ => None,
    }
}

// Integral results render as JSON integers (`9`, not `9.0`)
fn number_value(n: f64) -> Result<Value, EvalError> {
    if n.fract() == 0.0 && n >= i64::MIN as f64 && n <= i64::MAX as f64 {
        return Ok(Value::Number(serde_json::Number::from(n as i64)));
    }
    serde_json::Number::from_f64(n)
        .map(Value::Number)
        .ok_or_else(|| EvalError::Structural("number result out of range".to_string()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CmpResult {
    Less,
    Equal,
    Greater,
    Unknown,
}

/// Compare two scalars. Objects and arrays never compare; null compares
/// equal only to null; values of different types are incomparable.
fn compare(x: &Value, y: &Value) -> CmpResult {
    if matches!(x, Value::Object(_) | Value::Array(_))
        || matches!(y, Value::Object(_) | Value::Array(_))
    {
        return CmpResult::Unknown;
    }
    match (x, y) {
        (Value::Null, Value::Null) => CmpResult::Equal,
        (Value::Null, _) | (_, Value::Null) => CmpResult::Unknown,
        (Value::Number(a), Value::Number(b)) => {
            match (a.as_f64(), b.as_f64()) {
                (Some(a), Some(b)) if a < b => CmpResult::Less,
                (Some(a), Some(b)) if a > b => CmpResult::Greater,
                (Some(_), Some(_)) => CmpResult::Equal,
                _ => CmpResult::Unknown,
            }
        }
        (Value::String(a), Value::String(b)) => match a.cmp(b) {
            std::cmp::Ordering::Less => CmpResult::Less,
            std::cmp::Ordering::Equal => CmpResult::Equal,
            std::cmp::Ordering::Greater => CmpResult::Greater,
        },
        (Value::Bool(a), Value::Bool(b)) => match (a, b) {
            (false, true) => CmpResult::Less,
            (true, false) => CmpResult::Greater,
            _ => CmpResult::Equal,
        },
        _ => CmpResult::Unknown,
    }
}

fn cmp_matches(op: CmpOp, result: CmpResult) -> bool {
    matches!(
        (op, result),
        (CmpOp::Equal, CmpResult::Equal)
            | (CmpOp::NotEqual, CmpResult::Less | CmpResult::Greater)
            | (CmpOp::LessThan, CmpResult::Less)
            | (CmpOp::LessEqual, CmpResult::Less | CmpResult::Equal)
            | (CmpOp::GreaterThan, CmpResult::Greater)
            | (CmpOp::GreaterEqual, CmpResult::Greater | CmpResult::Equal)
    )
}

/// Cartesian comparison of two sequences: any incomparable pair makes the
/// whole comparison unknown, otherwise any matching pair makes it true.
fn perform_cmp(op: CmpOp, left: &[Value], right: &[Value]) -> TriBool {
    let mut seen_true = false;
    for l in left {
        for r in right {
            match compare(l, r) {
                CmpResult::Unknown => return TriBool::Unknown,
                result => {
                    if cmp_matches(op, result) {
                        seen_true = true;
                    }
                }
            }
        }
    }
    if seen_true {
        TriBool::True
    } else {
        TriBool::False
    }
}

fn emit_index(
    idx: f64,
    items: &[Value],
    mode: Mode,
    result: &mut Vec<Value>,
) -> Result<(), EvalError> {
    if idx < 0.0 || idx >= items.len() as f64 {
        if mode == Mode::Strict {
            return Err(EvalError::OutOfBounds(format!(
                "array index {} out of bounds",
                idx as i64
            )));
        }
        return Ok(());
    }
    result.push(items[idx as usize].clone());
    Ok(())
}

/// Per-evaluation state: the `$` binding, the `@` bindings pushed by
/// enclosing filters, the `last` values pushed by enclosing subscripts, and
/// the mode. A fresh context is built for every run.
struct EvalContext {
    root: Value,
    at_stack: Vec<Value>,
    last_stack: Vec<f64>,
    mode: Mode,
}

impl EvalContext {
    fn new(root: Value, mode: Mode) -> Self {
        EvalContext {
            root,
            at_stack: Vec::new(),
            last_stack: Vec::new(),
            mode,
        }
    }

    /// Apply `f` to `e`, unwrapping one array level first in lax mode.
    fn iter_scalar<F>(&self, e: &Value, f: &mut F) -> Result<(), EvalError>
    where
        F: FnMut(&Value) -> Result<(), EvalError>,
    {
        match e {
            Value::Array(items) if self.mode == Mode::Lax => {
                for item in items {
                    f(item)?;
                }
                Ok(())
            }
            _ => f(e),
        }
    }

    fn eval_expr(&mut self, expr: &Expr) -> Result<Vec<Value>, EvalError> {
        match expr {
            Expr::Number(n) => Ok(vec![number_value(*n)?]),
            Expr::Str(s) => Ok(vec![Value::String(s.clone())]),
            Expr::Bool(b) => Ok(vec![Value::Bool(*b)]),
            Expr::Null => Ok(vec![Value::Null]),
            Expr::Variable(name) => match name.as_str() {
                "$" => Ok(vec![self.root.clone()]),
                "@" => match self.at_stack.last() {
                    Some(v) => Ok(vec![v.clone()]),
                    None => Err(EvalError::UnknownVariable("@".to_string())),
                },
                _ => Err(EvalError::UnknownVariable(name.clone())),
            },
            Expr::Last => match self.last_stack.last() {
                Some(n) => Ok(vec![number_value(*n)?]),
                None => Err(EvalError::UnknownVariable("last".to_string())),
            },
            Expr::Binary { op, left, right } => self.eval_binary(*op, left, right),
            Expr::Unary { op, expr } => self.eval_unary(*op, expr),
            Expr::Paren(inner) => self.eval_expr(inner),
            Expr::Access { left, accessor } => {
                let input = self.eval_expr(left)?;
                self.apply_accessor(accessor, input)
            }
        }
    }

    fn eval_binary(&mut self, op: ArithOp, left: &Expr, right: &Expr) -> Result<Vec<Value>, EvalError> {
        let left_seq = self.eval_expr(left)?;
        if left_seq.len() != 1 {
            return Err(EvalError::Cardinality(
                "binary operators can only operate on single values".to_string(),
            ));
        }
        let right_seq = self.eval_expr(right)?;
        if right_seq.len() != 1 {
            return Err(EvalError::Cardinality(
                "binary operators can only operate on single values".to_string(),
            ));
        }

        let (l, r) = match (as_number(&left_seq[0]), as_number(&right_seq[0])) {
            (Some(l), Some(r)) => (l, r),
            _ => return Err(EvalError::Structural("unknown op".to_string())),
        };

        let value = match op {
            ArithOp::Add => l + r,
            ArithOp::Subtract => l - r,
            ArithOp::Multiply => l * r,
            ArithOp::Divide => {
                if r == 0.0 {
                    return Err(EvalError::Structural("division by zero".to_string()));
                }
                l / r
            }
            // Integer-truncation modulo, widened back to a number
            ArithOp::Modulo => {
                if r as i64 == 0 {
                    return Err(EvalError::Structural("division by zero".to_string()));
                }
                ((l as i64) % (r as i64)) as f64
            }
        };
        Ok(vec![number_value(value)?])
    }

    fn eval_unary(&mut self, op: UnaryOp, expr: &Expr) -> Result<Vec<Value>, EvalError> {
        let seq = self.eval_expr(expr)?;
        let mut result = Vec::with_capacity(seq.len());
        for e in &seq {
            self.iter_scalar(e, &mut |elem| match as_number(elem) {
                Some(n) => {
                    let value = match op {
                        UnaryOp::Minus => -n,
                        UnaryOp::Plus => n,
                    };
                    result.push(number_value(value)?);
                    Ok(())
                }
                None => {
                    let which = match op {
                        UnaryOp::Minus => "minus",
                        UnaryOp::Plus => "plus",
                    };
                    Err(EvalError::Structural(format!(
                        "unary {} can only accept numbers",
                        which
                    )))
                }
            })?;
        }
        Ok(result)
    }

    fn apply_accessor(
        &mut self,
        accessor: &Accessor,
        input: Vec<Value>,
    ) -> Result<Vec<Value>, EvalError> {
        match accessor {
            Accessor::Field { name, .. } => self.apply_field(name, input),
            Accessor::WildcardMember => self.apply_wildcard_member(input),
            Accessor::Subscripts(subscripts) => self.apply_subscripts(subscripts, input),
            Accessor::WildcardElement => self.apply_wildcard_element(input),
            Accessor::Method { method, .. } => self.apply_method(*method, input),
            Accessor::Filter(pred) => Ok(self.apply_filter(pred, input)),
        }
    }

    fn apply_field(&mut self, name: &str, input: Vec<Value>) -> Result<Vec<Value>, EvalError> {
        let mode = self.mode;
        let mut result = Vec::with_capacity(input.len());
        for e in &input {
            self.iter_scalar(e, &mut |elem| match elem {
                Value::Object(map) => match map.get(name) {
                    Some(v) => {
                        result.push(v.clone());
                        Ok(())
                    }
                    None if mode == Mode::Strict => Err(EvalError::Structural(format!(
                        "object {} missing `{}` field",
                        render(elem),
                        name
                    ))),
                    None => Ok(()),
                },
                _ if mode == Mode::Strict => Err(EvalError::Structural(format!(
                    "cannot access field `{}` on non-object {}",
                    name,
                    render(elem)
                ))),
                _ => Ok(()),
            })?;
        }
        Ok(result)
    }

    fn apply_wildcard_member(&mut self, input: Vec<Value>) -> Result<Vec<Value>, EvalError> {
        let mode = self.mode;
        let mut result = Vec::new();
        for e in &input {
            self.iter_scalar(e, &mut |elem| match elem {
                Value::Object(map) => {
                    result.extend(map.values().cloned());
                    Ok(())
                }
                _ if mode == Mode::Strict => Err(EvalError::Structural(format!(
                    "can't .* non-object {}",
                    render(elem)
                ))),
                _ => Ok(()),
            })?;
        }
        Ok(result)
    }

    fn apply_wildcard_element(&mut self, input: Vec<Value>) -> Result<Vec<Value>, EvalError> {
        let mut result = Vec::with_capacity(input.len());
        for e in input {
            match e {
                Value::Array(items) => result.extend(items),
                other => {
                    if self.mode == Mode::Strict {
                        return Err(EvalError::Structural(format!(
                            "can't iterate non-array {}",
                            render(&other)
                        )));
                    }
                    // Lax mode treats a scalar as a one-element array
                    result.push(other);
                }
            }
        }
        Ok(result)
    }

    fn apply_subscripts(
        &mut self,
        subscripts: &[Subscript],
        input: Vec<Value>,
    ) -> Result<Vec<Value>, EvalError> {
        let mode = self.mode;
        self.last_stack.push(0.0);
        let outcome = self.apply_subscripts_inner(subscripts, input, mode);
        self.last_stack.pop();
        outcome
    }

    fn apply_subscripts_inner(
        &mut self,
        subscripts: &[Subscript],
        input: Vec<Value>,
        mode: Mode,
    ) -> Result<Vec<Value>, EvalError> {
        let mut result = Vec::with_capacity(input.len());
        for e in &input {
            let items: Vec<Value> = match e {
                Value::Array(items) => items.clone(),
                other => {
                    if mode == Mode::Strict {
                        return Err(EvalError::Structural(format!(
                            "can't index non-array {}",
                            render(other)
                        )));
                    }
                    vec![other.clone()]
                }
            };
            if let Some(last) = self.last_stack.last_mut() {
                *last = items.len() as f64 - 1.0;
            }

            for subscript in subscripts {
                let start = self.eval_subscript_index(&subscript.start)?;
                match &subscript.end {
                    None => emit_index(start.floor(), &items, mode, &mut result)?,
                    Some(end_expr) => {
                        let end = self.eval_subscript_index(end_expr)?;
                        let (from, to) = (start.floor(), end.floor());
                        if to < from {
                            if mode == Mode::Strict {
                                return Err(EvalError::OutOfBounds(
                                    "the end of a range can't come before the beginning"
                                        .to_string(),
                                ));
                            }
                            continue;
                        }
                        let mut i = from;
                        while i <= to {
                            emit_index(i, &items, mode, &mut result)?;
                            i += 1.0;
                        }
                    }
                }
            }
        }
        Ok(result)
    }

    /// Evaluate a subscript bound down to the single number it must be.
    fn eval_subscript_index(&mut self, expr: &Expr) -> Result<f64, EvalError> {
        let seq = self.eval_expr(expr)?;
        if seq.len() != 1 {
            return Err(EvalError::Cardinality(
                "indexes must return single value".to_string(),
            ));
        }
        as_number(&seq[0]).ok_or_else(|| {
            EvalError::Structural(format!(
                "array index must be a number, but found {}",
                render(&seq[0])
            ))
        })
    }

    fn apply_method(&mut self, method: Method, input: Vec<Value>) -> Result<Vec<Value>, EvalError> {
        match method {
            Method::Type => Ok(input
                .iter()
                .map(|e| Value::String(type_name(e).to_string()))
                .collect()),
            Method::Size => {
                let mut result = Vec::with_capacity(input.len());
                for e in &input {
                    let size = match e {
                        Value::Array(items) => items.len() as f64,
                        _ => 1.0,
                    };
                    result.push(number_value(size)?);
                }
                Ok(result)
            }
            Method::Double => {
                let mut result = Vec::with_capacity(input.len());
                for e in &input {
                    match e {
                        Value::Number(_) => result.push(e.clone()),
                        Value::String(s) => match s.parse::<f64>() {
                            Ok(n) => result.push(number_value(n)?),
                            Err(_) => {
                                return Err(EvalError::Structural(format!(
                                    ".double() can't convert {} to a number",
                                    render(e)
                                )));
                            }
                        },
                        _ => {
                            return Err(EvalError::Structural(
                                ".double() only defined on strings and numbers".to_string(),
                            ));
                        }
                    }
                }
                Ok(result)
            }
            Method::Ceiling => self.numeric_method(input, "ceiling", false, f64::ceil),
            Method::Floor => self.numeric_method(input, "floor", true, f64::floor),
            Method::Abs => self.numeric_method(input, "abs", false, f64::abs),
            Method::Keyvalue => self.apply_keyvalue(input),
            Method::Datetime => Err(EvalError::Unimplemented(
                "unimplemented function".to_string(),
            )),
        }
    }

    /// Shared shape of `.ceiling()`, `.floor()`, and `.abs()`. Only
    /// `.floor()` auto-unwraps arrays in lax mode.
    fn numeric_method(
        &mut self,
        input: Vec<Value>,
        name: &str,
        unwrap: bool,
        f: fn(f64) -> f64,
    ) -> Result<Vec<Value>, EvalError> {
        let mut result = Vec::with_capacity(input.len());
        let mut visit = |elem: &Value| match as_number(elem) {
            Some(n) => {
                result.push(number_value(f(n))?);
                Ok(())
            }
            None => Err(EvalError::Structural(format!(
                ".{}() only defined on numbers",
                name
            ))),
        };
        for e in &input {
            if unwrap {
                self.iter_scalar(e, &mut visit)?;
            } else {
                visit(e)?;
            }
        }
        Ok(result)
    }

    fn apply_keyvalue(&mut self, input: Vec<Value>) -> Result<Vec<Value>, EvalError> {
        let mut result = Vec::new();
        let mut index: u64 = 0;
        for e in &input {
            self.iter_scalar(e, &mut |elem| {
                match elem {
                    Value::Object(map) => {
                        for (key, value) in map {
                            let mut entry = Map::new();
                            entry.insert("name".to_string(), Value::String(key.clone()));
                            entry.insert("value".to_string(), value.clone());
                            entry.insert("id".to_string(), Value::Number(index.into()));
                            result.push(Value::Object(entry));
                        }
                    }
                    _ => {
                        return Err(EvalError::Structural(
                            ".keyvalue() only defined on objects".to_string(),
                        ));
                    }
                }
                index += 1;
                Ok(())
            })?;
        }
        Ok(result)
    }

    fn apply_filter(&mut self, pred: &Pred, input: Vec<Value>) -> Vec<Value> {
        let mut result = Vec::with_capacity(input.len());
        for e in input {
            self.at_stack.push(e.clone());
            let truth = self.eval_pred(pred);
            self.at_stack.pop();
            if truth == TriBool::True {
                result.push(e);
            }
        }
        result
    }

    /// Predicate evaluation is total: errors from the expressions under a
    /// predicate become unknown instead of failing the run.
    fn eval_pred(&mut self, pred: &Pred) -> TriBool {
        match pred {
            Pred::Compare { op, left, right } => {
                let Some(left_seq) = self.eval_contained(left) else {
                    return TriBool::Unknown;
                };
                let Some(right_seq) = self.eval_contained(right) else {
                    return TriBool::Unknown;
                };
                perform_cmp(*op, &left_seq, &right_seq)
            }
            Pred::Logic { op, left, right } => {
                let l = self.eval_pred(left);
                let r = self.eval_pred(right);
                match op {
                    LogicOp::And => l.and(r),
                    LogicOp::Or => l.or(r),
                }
            }
            Pred::Not(inner) => self.eval_pred(inner).negate(),
            Pred::Paren(inner) => self.eval_pred(inner),
            Pred::Exists(expr) => match self.eval_expr(expr) {
                Ok(seq) if !seq.is_empty() => TriBool::True,
                _ => TriBool::False,
            },
            Pred::LikeRegex { expr, pattern } => {
                let Some(seq) = self.eval_contained(expr) else {
                    return TriBool::Unknown;
                };
                for e in &seq {
                    if let Value::String(s) = e {
                        if pattern.regex.is_match(s) {
                            return TriBool::True;
                        }
                    }
                }
                TriBool::False
            }
            Pred::StartsWith { expr, prefix } => {
                let Some(left_seq) = self.eval_contained(expr) else {
                    return TriBool::Unknown;
                };
                let Some(right_seq) = self.eval_contained(prefix) else {
                    return TriBool::Unknown;
                };
                for l in &left_seq {
                    for r in &right_seq {
                        let Value::String(sr) = r else {
                            return TriBool::Unknown;
                        };
                        if let Value::String(sl) = l {
                            if sl.starts_with(sr.as_str()) {
                                return TriBool::True;
                            }
                        }
                    }
                }
                TriBool::False
            }
            Pred::IsUnknown(inner) => {
                if self.eval_pred(inner) == TriBool::Unknown {
                    TriBool::True
                } else {
                    TriBool::False
                }
            }
        }
    }

    fn eval_contained(&mut self, expr: &Expr) -> Option<Vec<Value>> {
        self.eval_expr(expr).ok()
    }
}

/// A compiled path program ready to evaluate.
///
/// Compilation happens once; `run` may then be called any number of times
/// against different roots, each run on fresh state.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use sqlpath::Evaluator;
///
/// let evaluator = Evaluator::compile("$.items[*] ? (@ > 2)").unwrap();
/// let result = evaluator.run(&json!({"items": [1, 2, 3, 4]})).unwrap();
/// assert_eq!(result, vec![json!(3), json!(4)]);
/// ```
pub struct Evaluator {
    program: Program,
}

impl Evaluator {
    /// Wrap an already-compiled program.
    pub fn new(program: Program) -> Self {
        Evaluator { program }
    }

    /// Compile path source text into a ready evaluator.
    pub fn compile(input: &str) -> Result<Self, ParseError> {
        Ok(Evaluator::new(crate::parse(input)?))
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    /// Evaluate against a root document, producing the result sequence.
    pub fn run(&self, root: &Value) -> Result<Vec<Value>, EvalError> {
        let mut ctx = EvalContext::new(root.clone(), self.program.effective_mode());
        ctx.eval_expr(&self.program.root)
    }
}

#[test]
fn test_compare_null_rules() {
    use serde_json::json;
    assert_eq!(compare(&json!(null), &json!(null)), CmpResult::Equal);
    assert_eq!(compare(&json!(null), &json!(1)), CmpResult::Unknown);
    assert_eq!(compare(&json!("a"), &json!(null)), CmpResult::Unknown);
}

#[test]
fn test_three_valued_tables() {
    use TriBool::*;
    assert_eq!(True.and(Unknown), Unknown);
    assert_eq!(False.and(Unknown), False);
    assert_eq!(True.or(Unknown), True);
    assert_eq!(False.or(Unknown), Unknown);
    assert_eq!(Unknown.negate(), Unknown);
}

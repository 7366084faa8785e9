// tests/eval_tests.rs

use serde_json::{json, Value};
use sqlpath::{EvalError, Evaluator};

fn eval(path: &str, root: Value) -> Result<Vec<Value>, EvalError> {
    Evaluator::compile(path)
        .unwrap_or_else(|e| panic!("compile failed for {}: {}", path, e))
        .run(&root)
}

/// Result sequences are unordered for comparison purposes: serialize each
/// value and sort.
fn eval_sorted(path: &str, root: Value) -> Vec<String> {
    let mut result: Vec<String> = eval(path, root.clone())
        .unwrap_or_else(|e| panic!("eval failed for {}: {}", path, e))
        .iter()
        .map(|v| serde_json::to_string(v).unwrap())
        .collect();
    result.sort();
    result
}

fn eval_err(path: &str, root: Value) -> String {
    eval(path, root).unwrap_err().to_string()
}

// ============================================================================
// Arithmetic
// ============================================================================

#[test]
fn test_arithmetic() {
    let test_cases = vec![
        ("1 + 1", json!({}), vec!["2"]),
        ("1 - 1", json!({}), vec!["0"]),
        ("2 * 3", json!({}), vec!["6"]),
        ("6 / 2", json!({}), vec!["3"]),
        ("6 % 4", json!({}), vec!["2"]),
        ("2 * 3 + 3", json!({}), vec!["9"]),
        ("1.5 + 1", json!({}), vec!["2.5"]),
        ("7 / 2", json!({}), vec!["3.5"]),
        ("$[0] + $[1]", json!([1, 2]), vec!["3"]),
        ("-$[*]", json!([1, 2]), vec!["-1", "-2"]),
        ("+$[*]", json!([1, 2]), vec!["1", "2"]),
    ];

    for (path, root, expected) in test_cases {
        assert_eq!(eval_sorted(path, root), expected, "Failed for path: {}", path);
    }
}

#[test]
fn test_arithmetic_errors() {
    let test_cases = vec![
        ("1 / 0", json!({}), "division by zero"),
        ("1 % 0", json!({}), "division by zero"),
        ("'a' + 1", json!({}), "unknown op"),
        ("1 + null", json!({}), "unknown op"),
        (
            "$[*] + 1",
            json!([1, 2]),
            "binary operators can only operate on single values",
        ),
        ("-$", json!("x"), "unary minus can only accept numbers"),
        ("+$", json!("x"), "unary plus can only accept numbers"),
    ];

    for (path, root, expected) in test_cases {
        assert_eq!(eval_err(path, root), expected, "Failed for path: {}", path);
    }
}

// ============================================================================
// Member Access
// ============================================================================

#[test]
fn test_member_access() {
    let test_cases = vec![
        ("$.foo", json!({"foo": 1}), vec!["1"]),
        ("$.foo.bar", json!({"foo": {"bar": 2}}), vec!["2"]),
        // Lax mode unwraps arrays one level and skips misses
        ("$.foo", json!([{"foo": 1}, {"bar": 2}]), vec!["1"]),
        ("$.foo", json!({}), vec![]),
        ("$.foo", json!(1), vec![]),
        ("$.'two words'", json!({"two words": 3}), vec!["3"]),
        ("$.*", json!({"foo": 1, "bar": 2}), vec!["1", "2"]),
        ("$.*", json!(1), vec![]),
    ];

    for (path, root, expected) in test_cases {
        assert_eq!(eval_sorted(path, root), expected, "Failed for path: {}", path);
    }
}

#[test]
fn test_member_access_strict_errors() {
    let test_cases = vec![
        ("strict $.foo", json!({}), "object {} missing `foo` field"),
        (
            "strict $.foo",
            json!(1),
            "cannot access field `foo` on non-object 1",
        ),
        ("strict $.*", json!(1), "can't .* non-object 1"),
    ];

    for (path, root, expected) in test_cases {
        assert_eq!(eval_err(path, root), expected, "Failed for path: {}", path);
    }
}

// ============================================================================
// Array Access
// ============================================================================

#[test]
fn test_array_access() {
    let test_cases = vec![
        ("$[0]", json!([1, 2, 3]), vec!["1"]),
        ("$[0, 2]", json!([1, 2, 3]), vec!["1", "3"]),
        ("$[last]", json!([1, 2, 3]), vec!["3"]),
        ("$[last]", json!([42]), vec!["42"]),
        ("$[last - 1]", json!([1, 2, 3]), vec!["2"]),
        ("$[$[last] - 1]", json!([1, 2, 3]), vec!["3"]),
        ("$[0 to 1]", json!([1, 2, 3]), vec!["1", "2"]),
        ("$[0 to 0]", json!([1, 2, 3]), vec!["1"]),
        ("$[0 to last]", json!([1, 2, 3]), vec!["1", "2", "3"]),
        ("$[last][last]", json!([[1, 2], [3, 4, 5]]), vec!["5"]),
        // Fractional indices truncate downward
        ("$[0.9]", json!([1, 2, 3]), vec!["1"]),
        // Lax: out-of-bounds skips, scalars wrap, bad ranges skip
        ("$[100]", json!([1, 2, 3]), vec![]),
        ("$[0 to 100]", json!([1, 2, 3]), vec!["1", "2", "3"]),
        ("$[1 to 0]", json!([1, 2, 3]), vec![]),
        ("$[0]", json!(1), vec!["1"]),
        ("$[*]", json!([1, 2, 3]), vec!["1", "2", "3"]),
        ("$[*]", json!([1, 2, [1, 2, 3]]), vec!["1", "2", "[1,2,3]"]),
        (
            "$[*][*]",
            json!([1, 2, [1, 2, 3]]),
            vec!["1", "1", "2", "2", "3"],
        ),
        ("$[*]", json!(1), vec!["1"]),
    ];

    for (path, root, expected) in test_cases {
        assert_eq!(eval_sorted(path, root), expected, "Failed for path: {}", path);
    }
}

#[test]
fn test_array_access_errors() {
    let test_cases = vec![
        (
            "$['hello']",
            json!([1, 2, 3]),
            "array index must be a number, but found \"hello\"",
        ),
        (
            "$[1 to 'z']",
            json!([1, 2, 3]),
            "array index must be a number, but found \"z\"",
        ),
        (
            "$['a' to 1]",
            json!([1, 2, 3]),
            "array index must be a number, but found \"a\"",
        ),
        (
            "$[$[*]]",
            json!([1, 2]),
            "indexes must return single value",
        ),
        (
            "strict $[100]",
            json!([1, 2, 3]),
            "array index 100 out of bounds",
        ),
        (
            "strict $[0 to 100]",
            json!([1, 2, 3]),
            "array index 3 out of bounds",
        ),
        (
            "strict $[1 to 0]",
            json!([1, 2, 3]),
            "the end of a range can't come before the beginning",
        ),
        ("strict $[0]", json!(1), "can't index non-array 1"),
        ("strict $[*]", json!(1), "can't iterate non-array 1"),
    ];

    for (path, root, expected) in test_cases {
        assert_eq!(eval_err(path, root), expected, "Failed for path: {}", path);
    }
}

// ============================================================================
// Item Methods
// ============================================================================

#[test]
fn test_type_method() {
    let test_cases = vec![
        (json!(null), "\"null\""),
        (json!(true), "\"boolean\""),
        (json!(1), "\"number\""),
        (json!("x"), "\"string\""),
        (json!([1, 2]), "\"array\""),
        (json!({"a": 1}), "\"object\""),
    ];

    for (root, expected) in test_cases {
        assert_eq!(eval_sorted("$.type()", root.clone()), vec![expected], "Failed for root: {}", root);
    }
}

#[test]
fn test_size_method() {
    let test_cases = vec![
        (json!([1, 2, 3]), "3"),
        (json!([]), "0"),
        (json!({"a": 1}), "1"),
        (json!("x"), "1"),
        (json!(null), "1"),
    ];

    for (root, expected) in test_cases {
        assert_eq!(eval_sorted("$.size()", root.clone()), vec![expected], "Failed for root: {}", root);
    }
}

#[test]
fn test_double_method() {
    assert_eq!(eval_sorted("$.double()", json!(3)), vec!["3"]);
    assert_eq!(eval_sorted("$.double()", json!("3")), vec!["3"]);
    assert_eq!(eval_sorted("$.double()", json!("3.5")), vec!["3.5"]);
    assert_eq!(
        eval_err("$.double()", json!(true)),
        ".double() only defined on strings and numbers"
    );
    assert_eq!(
        eval_err("$.double()", json!("abc")),
        ".double() can't convert \"abc\" to a number"
    );
}

#[test]
fn test_numeric_methods() {
    assert_eq!(eval_sorted("$.ceiling()", json!(1.3)), vec!["2"]);
    assert_eq!(eval_sorted("$.floor()", json!(1.7)), vec!["1"]);
    assert_eq!(eval_sorted("$.abs()", json!(-3)), vec!["3"]);
    assert_eq!(eval_sorted("$.abs()", json!(3)), vec!["3"]);
    // Only floor auto-unwraps arrays in lax mode
    assert_eq!(eval_sorted("$.floor()", json!([1.5, 2.7])), vec!["1", "2"]);
    assert_eq!(
        eval_err("$.ceiling()", json!([1.5])),
        ".ceiling() only defined on numbers"
    );
    assert_eq!(
        eval_err("$.floor()", json!("x")),
        ".floor() only defined on numbers"
    );
    assert_eq!(
        eval_err("$.abs()", json!(null)),
        ".abs() only defined on numbers"
    );
}

#[test]
fn test_keyvalue_method() {
    assert_eq!(
        eval_sorted("$.keyvalue()", json!({"b": 2, "a": 1})),
        vec![
            "{\"id\":0,\"name\":\"a\",\"value\":1}",
            "{\"id\":0,\"name\":\"b\",\"value\":2}",
        ]
    );
    assert_eq!(
        eval_err("$.keyvalue()", json!(1)),
        ".keyvalue() only defined on objects"
    );
}

#[test]
fn test_datetime_is_unevaluated() {
    assert_eq!(
        eval_err("$.datetime('yyyy')", json!("2020")),
        "unimplemented function"
    );
}

// ============================================================================
// Filters and Predicates
// ============================================================================

#[test]
fn test_filters() {
    let test_cases = vec![
        ("$[*] ? (@ > 2)", json!([1, 2, 3, 4]), vec!["3", "4"]),
        ("$[*] ? (@ == 2)", json!([1, 2, 3]), vec!["2"]),
        ("$[*] ? (@ != 2)", json!([1, 2, 3]), vec!["1", "3"]),
        (
            "$[*] ? (@.a >= 2 && @.a <= 3)",
            json!([{"a": 1}, {"a": 2}, {"a": 3}, {"a": 4}]),
            vec!["{\"a\":2}", "{\"a\":3}"],
        ),
        (
            "$[*] ? (@ == 1 || @ == 3)",
            json!([1, 2, 3]),
            vec!["1", "3"],
        ),
        ("$[*] ? (!(@ == 2))", json!([1, 2, 3]), vec!["1", "3"]),
        (
            "$[*] ? (exists (@.a))",
            json!([{"a": 1}, {"b": 2}]),
            vec!["{\"a\":1}"],
        ),
        // Nested filters rebind `@`
        (
            "$[*] ? (exists (@.items[*] ? (@ > 1)))",
            json!([{"items": [1]}, {"items": [2]}]),
            vec!["{\"items\":[2]}"],
        ),
        // Booleans order false < true
        ("$[*] ? (@ < true)", json!([true, false]), vec!["false"]),
        // Null compares equal only to null
        ("$[*] ? (@ == null)", json!([null, 1, "x"]), vec!["null"]),
    ];

    for (path, root, expected) in test_cases {
        assert_eq!(eval_sorted(path, root), expected, "Failed for path: {}", path);
    }
}

#[test]
fn test_predicate_error_containment() {
    // A structural error under a predicate folds into unknown; the element
    // is dropped instead of failing the run.
    assert_eq!(
        eval_sorted("strict $[*] ? (@.foo == 1)", json!([{"bar": 2}, {"foo": 1}])),
        vec!["{\"foo\":1}"]
    );
    // Mixed-type comparisons are unknown, not errors
    assert_eq!(
        eval_sorted("$[*] ? (@ > 1)", json!([0, "x", 2])),
        vec!["2"]
    );
}

#[test]
fn test_like_regex() {
    let test_cases = vec![
        (
            "$[*] ? (@ like_regex 'foo')",
            json!(["foo", "bar", "afoob"]),
            vec!["\"afoob\"", "\"foo\""],
        ),
        // Flag 'i' makes matching case-insensitive
        (
            "$[*] ? (@ like_regex 'FOO' flag 'i')",
            json!(["foo", "bar"]),
            vec!["\"foo\""],
        ),
        (
            "$[*] ? (@ like_regex '^a.c$')",
            json!(["abc", "abbc"]),
            vec!["\"abc\""],
        ),
        // Non-string elements are skipped
        (
            "$[*] ? (@ like_regex 'o')",
            json!([1, "foo"]),
            vec!["\"foo\""],
        ),
    ];

    for (path, root, expected) in test_cases {
        assert_eq!(eval_sorted(path, root), expected, "Failed for path: {}", path);
    }
}

#[test]
fn test_starts_with() {
    assert_eq!(
        eval_sorted(
            "$[*] ? (@ starts with 'ab')",
            json!(["abc", "abd", "xyz"])
        ),
        vec!["\"abc\"", "\"abd\""]
    );
    // A non-string prefix makes the predicate unknown, dropping everything
    assert_eq!(
        eval_sorted("$[*] ? (@ starts with 1)", json!(["abc"])),
        Vec::<String>::new()
    );
    // Non-string left elements are skipped
    assert_eq!(
        eval_sorted("$[*] ? (@ starts with 'a')", json!([1, "abc"])),
        vec!["\"abc\""]
    );
}

#[test]
fn test_is_unknown() {
    // Mixed-type comparison is unknown
    assert_eq!(
        eval_sorted("$ ? ((@ == 'one') is unknown)", json!(1)),
        vec!["1"]
    );
    // A known comparison is not unknown
    assert_eq!(
        eval_sorted("$ ? ((@ == 1) is unknown)", json!(1)),
        Vec::<String>::new()
    );
}

// ============================================================================
// Variables
// ============================================================================

#[test]
fn test_root_variable() {
    assert_eq!(eval_sorted("$", json!(42)), vec!["42"]);
    assert_eq!(eval_sorted("$", json!({"a": 1})), vec!["{\"a\":1}"]);
}

#[test]
fn test_unknown_variable() {
    assert_eq!(eval_err("$foo", json!({})), "unknown variable $foo");
}

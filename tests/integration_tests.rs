// tests/integration_tests.rs
//
// End-to-end scenarios: compile a program, run it against a root document,
// compare the serialized result sequence as sorted JSON lines.

use serde_json::{json, Value};
use sqlpath::{format, parse, Evaluator, Mode};

fn run_sorted(path: &str, root: Value) -> Vec<String> {
    let mut lines: Vec<String> = Evaluator::compile(path)
        .unwrap_or_else(|e| panic!("compile failed for {}: {}", path, e))
        .run(&root)
        .unwrap_or_else(|e| panic!("eval failed for {}: {}", path, e))
        .iter()
        .map(|v| serde_json::to_string(v).unwrap())
        .collect();
    lines.sort();
    lines
}

// ============================================================================
// End-to-End Scenarios
// ============================================================================

#[test]
fn test_arithmetic_program() {
    assert_eq!(run_sorted("lax 2 * 3 + 3", json!({})), vec!["9"]);
}

#[test]
fn test_member_access_unwraps_and_skips() {
    assert_eq!(
        run_sorted("lax $.foo", json!([{"foo": 1}, {"bar": 2}])),
        vec!["1"]
    );
}

#[test]
fn test_keyvalue_over_unwrapped_objects() {
    assert_eq!(
        run_sorted(
            "lax $[*].keyvalue()",
            json!([{"foo": 1, "bar": 2}, {"baz": 3}])
        ),
        vec![
            "{\"id\":0,\"name\":\"bar\",\"value\":2}",
            "{\"id\":0,\"name\":\"foo\",\"value\":1}",
            "{\"id\":1,\"name\":\"baz\",\"value\":3}",
        ]
    );
}

#[test]
fn test_filter_with_exists_then_project() {
    let root = json!({
        "phones": [
            {"type": "cell", "number": "abc-defg"},
            {"number": "pqr-wxyz"},
            {"type": "home", "number": "hij-klmn"}
        ]
    });
    assert_eq!(
        run_sorted("strict $.phones[*] ? (exists (@.type)).type", root),
        vec!["\"cell\"", "\"home\""]
    );
}

#[test]
fn test_filter_with_regex() {
    assert_eq!(
        run_sorted("lax $[*] ? (@ like_regex 'foo')", json!(["foo", "bar", "afoob"])),
        vec!["\"afoob\"", "\"foo\""]
    );
}

#[test]
fn test_unknown_comparison_detected() {
    assert_eq!(
        run_sorted("lax true ? ((1 == 'one') is unknown)", json!({})),
        vec!["true"]
    );
}

#[test]
fn test_strict_out_of_bounds_is_an_error() {
    let evaluator = Evaluator::compile("strict $[100]").unwrap();
    let err = evaluator.run(&json!([1, 2, 3])).unwrap_err();
    assert_eq!(err.to_string(), "array index 100 out of bounds");
}

// ============================================================================
// Boundary Behaviors
// ============================================================================

#[test]
fn test_last_in_single_element_array() {
    assert_eq!(run_sorted("$[last]", json!([7])), vec!["7"]);
}

#[test]
fn test_overlong_range_lax_vs_strict() {
    assert_eq!(
        run_sorted("$[0 to 100]", json!([1, 2, 3])),
        vec!["1", "2", "3"]
    );
    let err = Evaluator::compile("strict $[0 to 100]")
        .unwrap()
        .run(&json!([1, 2, 3]))
        .unwrap_err();
    assert_eq!(err.to_string(), "array index 3 out of bounds");
}

#[test]
fn test_missing_member_lax_vs_strict() {
    assert_eq!(run_sorted("$.foo", json!({})), Vec::<String>::new());
    let err = Evaluator::compile("strict $.foo")
        .unwrap()
        .run(&json!({}))
        .unwrap_err();
    assert_eq!(err.to_string(), "object {} missing `foo` field");
}

// ============================================================================
// Quantified Properties
// ============================================================================

const PROPERTY_CORPUS: &[&str] = &[
    "$",
    "lax $",
    "strict $.a.b.c",
    "$.foo[*]",
    "$[0, 1 to last]",
    "$[last - 1]",
    "2 * 3 + 3",
    "-$[0].floor()",
    "$.a.type()",
    "$.a.size()",
    "$[*].keyvalue()",
    "$.datetime('yyyy')",
    "$ ? (@ == 1)",
    "$ ? (@.a != null && exists (@.b))",
    "$ ? (@ like_regex 'x' flag 'i')",
    "$ ? (@.s starts with 'a')",
    "$ ? ((@ == 'x') is unknown)",
    "$ ? (!(@ == 1) || @ > 2)",
    "strict $.phones[*] ? (exists (@.type)).type",
];

#[test]
fn test_format_round_trip_over_corpus() {
    for program in PROPERTY_CORPUS {
        let once = parse(program).unwrap();
        let formatted = format(&once);
        let twice = parse(&formatted)
            .unwrap_or_else(|e| panic!("formatted output rejected for {}: {}", program, e));
        assert_eq!(once, twice, "Round-trip failed for: {}", program);
        // Formatting is a fixpoint
        assert_eq!(format(&twice), formatted);
    }
}

#[test]
fn test_mode_prefix_only_when_explicit() {
    assert_eq!(format(&parse("$.a").unwrap()), "$.a");
    assert_eq!(format(&parse("lax $.a").unwrap()), "lax $.a");
    assert_eq!(format(&parse("strict $.a").unwrap()), "strict $.a");
}

#[test]
fn test_default_mode_is_lax() {
    let program = parse("$").unwrap();
    assert_eq!(program.mode, None);
    assert_eq!(program.effective_mode(), Mode::Lax);
}

#[test]
fn test_mode_monotonicity() {
    // Whatever strict mode produces without error, lax produces too.
    let cases = vec![
        ("$.phones[*] ? (exists (@.type)).type",
         json!({"phones": [{"type": "a"}, {"type": "b"}]})),
        ("$[0 to last]", json!([1, 2, 3])),
        ("$.a.b", json!({"a": {"b": 1}})),
        ("$[*].size()", json!([[1], [1, 2]])),
    ];

    for (path, root) in cases {
        let strict = Evaluator::compile(&format!("strict {}", path))
            .unwrap()
            .run(&root)
            .unwrap_or_else(|e| panic!("strict eval failed for {}: {}", path, e));
        let lax = Evaluator::compile(&format!("lax {}", path))
            .unwrap()
            .run(&root)
            .unwrap();
        let mut strict_lines: Vec<String> =
            strict.iter().map(|v| v.to_string()).collect();
        let mut lax_lines: Vec<String> = lax.iter().map(|v| v.to_string()).collect();
        strict_lines.sort();
        lax_lines.sort();
        for line in &strict_lines {
            assert!(
                lax_lines.contains(line),
                "strict result {} missing from lax for {}",
                line,
                path
            );
        }
    }
}

#[test]
fn test_runs_are_independent() {
    // One compiled program, many roots; each run starts fresh.
    let evaluator = Evaluator::compile("$[*] ? (@ > 1)").unwrap();
    assert_eq!(evaluator.run(&json!([1, 2])).unwrap(), vec![json!(2)]);
    assert_eq!(evaluator.run(&json!([3])).unwrap(), vec![json!(3)]);
    assert_eq!(evaluator.run(&json!([0])).unwrap(), Vec::<Value>::new());
}

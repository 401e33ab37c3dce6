//! End-to-end compilation tests: source text → Compilation.

use tonec::dsl::{compile, Compilation, Compiler, ErrorKind};

fn messages(result: &Compilation) -> Vec<&str> {
    result.errors.iter().map(|e| e.message.as_str()).collect()
}

#[test]
fn assign_then_print() {
    let result = compile("tone = \"oeeaeO EEEEaE\"; tone;");
    assert!(result.errors.is_empty(), "{:?}", result.errors);
    assert_eq!(result.final_result.as_deref(), Some("oeeaeO EEEEaE"));
}

#[test]
fn repeat_string_by_number() {
    let result = compile("\"oa\" * 3;");
    assert!(result.errors.is_empty());
    assert_eq!(result.final_result.as_deref(), Some("oaoaoa"));
}

#[test]
fn number_first_repeat() {
    let result = compile("3 * \"oa\";");
    assert_eq!(result.final_result.as_deref(), Some("oaoaoa"));
}

#[test]
fn numeric_result_is_a_logical_error() {
    let result = compile("1 + 2;");
    assert_eq!(result.final_result, None);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].kind, ErrorKind::Logical);
    assert_eq!(result.errors[0].message, "Final statement should be a string.");
}

#[test]
fn undefined_variable_is_named() {
    let result = compile("x;");
    assert_eq!(result.final_result, None);
    assert!(result
        .errors
        .iter()
        .any(|e| e.kind == ErrorKind::Logical && e.line == 1 && e.message.contains('x')));
}

#[test]
fn dangling_operator_recovers_without_result() {
    let result = compile("\"o\" + ;");
    assert_eq!(result.final_result, None);
    let semantic: Vec<_> = result
        .errors
        .iter()
        .filter(|e| e.kind == ErrorKind::Semantic)
        .collect();
    assert!(!semantic.is_empty());
    assert!(semantic.iter().all(|e| e.line == 1));
}

#[test]
fn comment_is_invisible_to_the_parser() {
    let result = compile("// c\n\"o\";");
    assert!(result.errors.is_empty());
    assert_eq!(result.final_result.as_deref(), Some("o"));
}

#[test]
fn comment_does_not_shift_lines() {
    let result = compile("// leading comment\n\"o\" + 1;");
    assert_eq!(
        messages(&result),
        vec!["Adding unexpected values", "Final statement should be a string."]
    );
    assert!(result.errors.iter().all(|e| e.line == 2));
}

#[test]
fn bad_literal_is_lexical() {
    let result = compile("\"ox\";");
    assert_eq!(result.final_result, None);
    let lexical = result
        .errors
        .iter()
        .find(|e| e.kind == ErrorKind::Lexical)
        .expect("lexical error");
    assert_eq!(lexical.line, 1);
    assert!(lexical.message.contains("\"ox"));
}

#[test]
fn compiling_twice_is_identical() {
    let sources = [
        "a = \"o\"; b = a * 2; b + \"E\";",
        "\"o\" + ;",
        "x = \"o\" +",
        "\"oa\" )",
    ];
    let compiler = Compiler::new();
    for source in sources {
        assert_eq!(compiler.compile(source), compiler.compile(source));
        assert_eq!(compile(source), compiler.compile(source));
    }
}

#[test]
fn grouped_expression_with_variables() {
    let source = "\
// build a phrase
base = \"oe\";
n = 1 + 1;
phrase = (base + \" \") * n;
phrase + \"A\";
";
    let result = compile(source);
    assert!(result.errors.is_empty(), "{:?}", result.errors);
    assert_eq!(result.final_result.as_deref(), Some("oe oe A"));
}

#[test]
fn reassignment_uses_latest_value() {
    let result = compile("t = \"o\"; t = t + \"a\"; t;");
    assert_eq!(result.final_result.as_deref(), Some("oa"));
}

#[test]
fn zero_repeat_is_empty() {
    let result = compile("\"oa\" * 0;");
    assert!(result.errors.is_empty());
    assert_eq!(result.final_result.as_deref(), Some(""));
}

#[test]
fn huge_repetition_is_a_logical_error() {
    let result = compile("\"o\" * 100000000000000;");
    assert_eq!(result.final_result, None);
    assert_eq!(
        messages(&result),
        vec!["Repetition too large", "Final statement should be a string."]
    );
    assert!(result.errors.iter().all(|e| e.kind == ErrorKind::Logical));
}

#[test]
fn doubling_stops_at_the_text_limit() {
    let mut source = String::from("t = \"o\" * 65536;\n");
    for _ in 0..8 {
        source.push_str("t = t + t;\n");
    }
    source.push_str("t;\n");
    let result = compile(&source);
    assert_eq!(result.final_result, None);
    assert!(messages(&result).contains(&"Text too long"));
}

#[test]
fn hundred_thousand_statements() {
    let source = "\"o\";\n".repeat(100_000) + "\"ea\" + \"E\" * 2;\n";
    let result = compile(&source);
    assert!(result.errors.is_empty());
    assert_eq!(result.final_result.as_deref(), Some("eaEE"));
}

#[test]
fn truncated_literal_stops_compilation() {
    let result = compile("t = \"oa\";\nt; \"oa");
    assert_eq!(result.final_result, None);
    let last = result.errors.last().expect("truncation error");
    assert_eq!(last.kind, ErrorKind::Lexical);
    assert_eq!(last.line, 2);
    assert!(last.message.starts_with("Unexpected end of input"));
}

#[test]
fn errors_are_reported_in_source_order() {
    let result = compile("a = \"o\" @;\n) b;\n");
    let lines: Vec<usize> = result.errors.iter().map(|e| e.line).collect();
    let mut sorted = lines.clone();
    sorted.sort();
    assert_eq!(lines, sorted);
    assert_eq!(result.errors[0].kind, ErrorKind::Lexical);
}

#[test]
fn json_shape() {
    let result = compile("\"ox\";");
    let json: serde_json::Value = serde_json::to_value(&result).unwrap();
    let object = json.as_object().unwrap();
    assert_eq!(object.len(), 2);
    assert!(object["finalResult"].is_null());
    let first = &object["compilationErrors"][0];
    assert_eq!(first["kind"], "Lexical");
    assert_eq!(first["line"], 1);
    assert!(first["message"].as_str().unwrap().contains("\"ox"));

    let ok = serde_json::to_value(compile("\"e\";")).unwrap();
    assert_eq!(ok["finalResult"], "e");
    assert_eq!(ok["compilationErrors"], serde_json::json!([]));
}

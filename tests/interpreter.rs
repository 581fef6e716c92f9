use amaranth::{
    environment::Environment,
    parser,
    runtime::{Interpreter, evaluate},
    value::{Value, ValueKind},
};

fn eval(source: &str) -> Value {
    let (program, diagnostics) = parser::parse(source);
    assert!(
        diagnostics.is_empty(),
        "unexpected diagnostics: {diagnostics:?}"
    );
    evaluate(&program, &Environment::new())
}

fn expect_int(value: &Value) -> i64 {
    match &*value.0 {
        ValueKind::Integer(n) => *n,
        _ => panic!("expected INTEGER, found {}", value.type_name()),
    }
}

fn expect_bool(value: &Value) -> bool {
    match &*value.0 {
        ValueKind::Boolean(b) => *b,
        _ => panic!("expected BOOLEAN, found {}", value.type_name()),
    }
}

fn expect_error(value: &Value) -> &str {
    match &*value.0 {
        ValueKind::Error(message) => message,
        _ => panic!("expected ERROR, found {}", value.type_name()),
    }
}

#[test]
fn evaluates_integer_expressions() {
    let cases = [
        ("10", 10),
        ("-10", -10),
        ("5 + 5 + 5 + 5 - 10", 10),
        ("2 * (5 + 10)", 30),
        ("7 / 2", 3),
        ("10 * 420 / 69 + ((69 / 420) * 100)", 60),
    ];
    for (input, expected) in cases {
        assert_eq!(expect_int(&eval(input)), expected, "input: {input}");
    }
}

#[test]
fn evaluates_bang_and_not() {
    let cases = [
        ("not true", false),
        ("!true", false),
        ("!!true", true),
        ("not not true", true),
        ("!100", false),
        ("not 100", false),
        ("!!1000", true),
    ];
    for (input, expected) in cases {
        assert_eq!(expect_bool(&eval(input)), expected, "input: {input}");
    }
}

#[test]
fn evaluates_comparisons() {
    let cases = [
        ("1 < 2", true),
        ("2 <= 2", true),
        ("3 > 4", false),
        ("4 >= 4", true),
        ("1 == 1", true),
        ("1 is 1", true),
        ("1 != 2", true),
        ("1 is not 1", false),
        ("true is true", true),
        ("true is not false", true),
        ("false == false", true),
    ];
    for (input, expected) in cases {
        assert_eq!(expect_bool(&eval(input)), expected, "input: {input}");
    }
}

// Non-integer equality compares storage identity, so two independently
// built equal strings are not `is`-equal while the same binding is.
#[test]
fn string_equality_is_identity_based() {
    assert!(!expect_bool(&eval("\"a\" == \"a\"")));
    assert!(expect_bool(&eval("let s = \"a\"; s == s")));
}

#[test]
fn concatenates_strings() {
    let value = eval("\"Hello\" + \" \" + \"Misho\"");
    match &*value.0 {
        ValueKind::Str(s) => assert_eq!(s, "Hello Misho"),
        _ => panic!("expected STRING, found {}", value.type_name()),
    }
}

#[test]
fn conditional_without_else_yields_undefined() {
    let value = eval("if (false) { 69 }");
    assert!(matches!(&*value.0, ValueKind::Nil));
    assert_eq!(value.to_string(), "undefined");
}

#[test]
fn conditional_uses_truthiness() {
    assert_eq!(expect_int(&eval("if (true) { 69 }")), 69);
    assert_eq!(expect_int(&eval("if (5) { 1 } else { 2 }")), 1);
    assert_eq!(expect_int(&eval("if (0) { 1 } else { 2 }")), 1);
    assert_eq!(expect_int(&eval("if (1 > 2) { 1 } else { 2 }")), 2);
}

#[test]
fn let_bindings_resolve_in_scope() {
    let value = eval(
        "let something = 420; let notSomething = 69; let result = something + notSomething; result;",
    );
    assert_eq!(expect_int(&value), 489);
}

#[test]
fn functions_apply_arguments() {
    assert_eq!(expect_int(&eval("let something = fn(x) {x;}; something(69);")), 69);
    assert_eq!(
        expect_int(&eval("let add = fn(a, b) { a + b; }; add(add(1, 2), 3);")),
        6
    );
}

#[test]
fn return_stops_the_surrounding_sequence() {
    let cases = [
        ("return 10; 9", 10),
        ("5; return 2 * 5; 9", 10),
        (
            "let f = fn(x) { if (x > 1) { return 1; } return 0; }; f(2)",
            1,
        ),
        ("if (true) { if (true) { return 10; } return 1; }", 10),
    ];
    for (input, expected) in cases {
        assert_eq!(expect_int(&eval(input)), expected, "input: {input}");
    }
}

#[test]
fn closures_capture_their_definition_environment() {
    let value = eval(
        r#"
        let makeAdder = fn(x) {
            return fn(y) { x + y; };
        };
        let addTwo = makeAdder(2);
        addTwo(40)
        "#,
    );
    assert_eq!(expect_int(&value), 42);
}

#[test]
fn references_read_through_to_the_target() {
    let value = eval("let x = 5; let r = &x; *r");
    assert_eq!(expect_int(&value), 5);
}

#[test]
fn assignment_through_reference_mutates_the_target() {
    let value = eval("let x = 5; let r = &x; r = 10; x");
    assert_eq!(expect_int(&value), 10);
}

#[test]
fn assignment_through_reference_is_visible_to_closures() {
    let value = eval(
        r#"
        let x = 0;
        let r = &x;
        let bump = fn() { r = *r + 1; };
        bump();
        bump();
        x
        "#,
    );
    assert_eq!(expect_int(&value), 2);
}

#[test]
fn plain_assignment_rebinds_locally() {
    assert_eq!(expect_int(&eval("let x = 1; x = 7; x")), 7);
}

#[test]
fn dereferencing_a_non_reference_fails() {
    let value = eval("let x = 5; *x");
    assert_eq!(expect_error(&value), "cannot dereference INTEGER");
}

#[test]
fn stale_reference_fails_closed() {
    let value = eval(
        r#"
        let r = 0;
        for (let i = 0; i < 1; i + 1) {
            r = &i;
        }
        *r
        "#,
    );
    assert_eq!(expect_error(&value), "reference target `i` no longer exists");
}

#[test]
fn for_loop_accumulates() {
    let value = eval(
        r#"
        let sum = 0;
        for (let i = 1; i <= 4; i + 1) {
            sum = sum + i
        }
        sum
        "#,
    );
    assert_eq!(expect_int(&value), 10);
}

#[test]
fn for_loop_removes_its_binding_when_done() {
    let value = eval("for (let i = 0; i < 3; i + 1) { i } i");
    assert_eq!(expect_error(&value), "identifier not found: i");
}

#[test]
fn for_loop_steps_through_a_reference() {
    let value = eval(
        r#"
        let total = 5;
        for (let cursor = &total; cursor < 100; cursor * 2) {
            cursor
        }
        total
        "#,
    );
    assert_eq!(expect_int(&value), 160);
}

#[test]
fn for_loop_yields_empty_when_done() {
    let value = eval("for (let i = 0; i < 2; i + 1) { i }");
    assert!(matches!(&*value.0, ValueKind::Empty));
}

#[test]
fn for_loop_shape_errors() {
    let cases = [
        (
            "for (let i = 0; i < 2; i + 1) {}",
            "for loop requires a non-empty body",
        ),
        (
            "for (let i = true; i < 2; i + 1) { i }",
            "for loop binding must resolve to an INTEGER",
        ),
        (
            "for (let i = 0; true; i + 1) { i }",
            "for loop condition must compare an identifier against an integer literal",
        ),
        (
            "for (let i = 0; i < 2; i) { i }",
            "for loop increment must combine an identifier with an integer literal",
        ),
    ];
    for (input, expected) in cases {
        assert_eq!(expect_error(&eval(input)), expected, "input: {input}");
    }
}

#[test]
fn errors_propagate_without_being_consumed() {
    let cases = [
        ("5 + true", "type mismatch: INTEGER + BOOLEAN"),
        ("5 + true; 5", "type mismatch: INTEGER + BOOLEAN"),
        ("(1 + true) + 2", "type mismatch: INTEGER + BOOLEAN"),
        ("-true", "unknown operator: -BOOLEAN"),
        ("true + false", "unknown operator: BOOLEAN + BOOLEAN"),
        (
            "if (true) { true + false }",
            "unknown operator: BOOLEAN + BOOLEAN",
        ),
        ("foobar", "identifier not found: foobar"),
    ];
    for (input, expected) in cases {
        assert_eq!(expect_error(&eval(input)), expected, "input: {input}");
    }
}

#[test]
fn division_by_zero_is_a_runtime_error() {
    assert_eq!(expect_error(&eval("1 / 0")), "division by zero");
}

#[test]
fn errors_render_with_the_fixed_marker() {
    assert_eq!(eval("1 / 0").to_string(), "[ERROR]: division by zero");
}

#[test]
fn invoking_a_non_callable_fails() {
    assert_eq!(expect_error(&eval("5(1)")), "not a function: INTEGER");
}

#[test]
fn call_arity_is_validated() {
    let value = eval("let f = fn(a, b) { a + b; }; f(1)");
    assert_eq!(
        expect_error(&value),
        "wrong number of arguments: expected 2, received 1"
    );
}

#[test]
fn empty_function_body_is_rejected() {
    assert_eq!(
        expect_error(&eval("fn() {}")),
        "a function requires a non-empty body"
    );
}

#[test]
fn comment_yields_no_printable_result() {
    let value = eval("# just a note");
    assert!(matches!(&*value.0, ValueKind::Empty));
    assert_eq!(value.to_string(), "");
}

#[test]
fn native_log_yields_empty() {
    let value = eval("log(5)");
    assert!(matches!(&*value.0, ValueKind::Empty));
}

#[test]
fn native_loop_repeats_a_function() {
    let value = eval(
        r#"
        let x = 0;
        let r = &x;
        loop(3, fn() { r = *r + 1; });
        x
        "#,
    );
    assert_eq!(expect_int(&value), 3);
}

#[test]
fn native_loop_validates_its_arguments() {
    assert_eq!(
        expect_error(&eval("loop(1)")),
        "`loop` expects a count and a function, received 1 argument(s)"
    );
    assert_eq!(
        expect_error(&eval("loop(true, fn() { 1; })")),
        "`loop` count must be INTEGER, received BOOLEAN"
    );
}

#[test]
fn user_bindings_shadow_native_functions() {
    let value = eval("let log = 42; log");
    assert_eq!(expect_int(&value), 42);
}

#[test]
fn qualified_call_reaches_the_native_table() {
    let value = eval("console -> log(5)");
    assert!(matches!(&*value.0, ValueKind::Empty));
}

#[test]
fn reference_in_call_position_resolves_to_its_target() {
    let value = eval(
        r#"
        let f = fn() { 7; };
        let r = &f;
        r()
        "#,
    );
    assert_eq!(expect_int(&value), 7);
}

#[test]
fn repl_state_persists_across_inputs() {
    let mut interpreter = Interpreter::new();
    interpreter.eval_source("let x = 40;").expect("bind x");
    let value = interpreter.eval_source("x + 2").expect("read x");
    assert_eq!(expect_int(&value), 42);
}

#[test]
fn demo_scripts_parse_cleanly() {
    for script in [
        "demos/quickstart.am",
        "demos/loops.am",
        "demos/closures.am",
        "demos/conditionals.am",
    ] {
        let source = std::fs::read_to_string(script)
            .unwrap_or_else(|err| panic!("failed to read {script}: {err}"));
        let mut interpreter = Interpreter::new();
        let value = interpreter
            .eval_source(&source)
            .unwrap_or_else(|err| panic!("{script} should parse: {err}"));
        assert!(!value.is_error(), "{script} should run, got {value}");
    }
}

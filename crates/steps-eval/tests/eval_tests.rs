//! Integration tests for the Steps evaluator.
//!
//! Programs are parsed with the real front end, registered, and run against
//! captured I/O. Covers: output, calls and returns, risers, fixed
//! declarations, loops, attempt/problem_message, runtime error codes,
//! resource limits, input, tracing, and determinism.

use steps_eval::{
    CapturedIo, EvalConfig, Evaluator, ExitCode, Outcome, ProgramRegistry, Value,
};
use steps_parser::parse_source;
use steps_types::ast::{FileKind, Program};
use steps_types::{ErrorCode, SourceFile, StepsError};

// ══════════════════════════════════════════════════════════════════════════════
// Helpers
// ══════════════════════════════════════════════════════════════════════════════

/// Parse one file, panicking on any diagnostic.
fn parse_file(path: &str, source: &str) -> (Program, SourceFile) {
    let kind = match path.rsplit('.').next() {
        Some("building") => FileKind::Building,
        Some("floor") => FileKind::Floor,
        _ => FileKind::Step,
    };
    let sf = SourceFile::new(path, source);
    let result = parse_source(&sf, kind);
    if result.errors.has_errors() {
        for e in &result.errors.errors {
            eprintln!("  ERROR in {path}: {} ({})", e.message, e.code);
        }
        panic!("unexpected parse errors (see above)");
    }
    (result.program.expect("no program returned"), sf)
}

/// Build a registry from `(path, source)` pairs. A file's folder is the
/// part of its path before the first `/`.
fn project(files: &[(&str, &str)]) -> ProgramRegistry {
    let mut builder = ProgramRegistry::builder();
    for (path, source) in files {
        let folder = path.split('/').next().unwrap_or_default().to_string();
        builder = match parse_file(path, source) {
            (Program::Building(b), sf) => builder.building(b, sf),
            (Program::Floor(f), sf) => builder.floor(folder, f, sf),
            (Program::Step(s), sf) => builder.step(folder, s, sf),
        };
    }
    match builder.build() {
        Ok(registry) => registry,
        Err(errors) => {
            for e in &errors {
                eprintln!("  ERROR: {} ({})", e.message, e.code);
            }
            panic!("registry rejected the project (see above)");
        }
    }
}

fn run_with(files: &[(&str, &str)], config: EvalConfig, io: CapturedIo) -> (Outcome, CapturedIo) {
    let registry = project(files);
    let mut evaluator = Evaluator::new(&registry, config, io);
    let outcome = evaluator.run();
    (outcome, evaluator.into_io())
}

fn run(files: &[(&str, &str)]) -> (Outcome, Vec<String>) {
    let (outcome, io) = run_with(files, EvalConfig::default(), CapturedIo::new());
    (outcome, io.output().to_vec())
}

/// Run a building-only program and return its output, panicking on failure.
fn output_of(building: &str) -> Vec<String> {
    let (outcome, output) = run(&[("main.building", building)]);
    if let Some(error) = &outcome.error {
        panic!("program failed: [{}] {}", error.code, error.message);
    }
    output
}

/// Run a building-only program that must fail, returning the error.
fn error_of(building: &str) -> StepsError {
    let (outcome, _) = run(&[("main.building", building)]);
    assert_eq!(outcome.exit, ExitCode::Failed);
    outcome.error.expect("expected a runtime error")
}

const MATH_FLOOR: (&str, &str) = ("math/math.floor", "floor: math\n    step: double\n");

const DOUBLE_STEP: (&str, &str) = (
    "math/double.step",
    r#"step: double
    belongs to: math
    expects: n
    returns: result
    do:
        set result to n * 2
"#,
);

// ══════════════════════════════════════════════════════════════════════════════
// Output & expressions
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn display_arithmetic() {
    assert_eq!(output_of("building: b\n    display 1 + 2\n"), vec!["3"]);
}

#[test]
fn display_forms() {
    let output = output_of(
        r#"building: b
    display 7 / 2
    display [1, "two", true]
    display ["a": 1]
    display nothing
    display "n = " added to 4
    display 10 modulo 3
"#,
    );
    assert_eq!(output, vec!["3.5", "[1, two, true]", "[\"a\": 1]", "nothing", "n = 4", "1"]);
}

#[test]
fn short_circuit_skips_right_operand() {
    // The right side would fail with E401 if it were evaluated.
    let output = output_of(
        r#"building: b
    display false and missing
    display true or missing
"#,
    );
    assert_eq!(output, vec!["false", "true"]);
}

#[test]
fn conversions_and_type_checks() {
    let output = output_of(
        r#"building: b
    set n to "42" as number
    display n + 1
    display 3.14159 as decimal(2)
    display type of [1]
    display n is a number
    display "true" as boolean
"#,
    );
    assert_eq!(output, vec!["43", "3.14", "list", "true", "true"]);
}

#[test]
fn table_set_and_lookup() {
    let output = output_of(
        r#"building: b
    set ages to ["ada": 36]
    set ages["alan"] to 41
    display ages["alan"]
    display length of ages
"#,
    );
    assert_eq!(output, vec!["41", "2"]);
}

#[test]
fn text_membership_uses_display_form() {
    let output = output_of(
        r#"building: b
    display 5 is in "1456"
    display "1456" contains 7
"#,
    );
    assert_eq!(output, vec!["true", "false"]);
}

#[test]
fn huge_decimal_places_are_a_catchable_error() {
    let output = output_of(
        r#"building: b
    attempt:
        display 1 as decimal(70000) added to ""
    if unsuccessful:
        display problem_message
"#,
    );
    assert_eq!(output, vec!["Invalid decimal places: 70000."]);
}

// ══════════════════════════════════════════════════════════════════════════════
// Shared collections
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn assignment_shares_a_list() {
    let output = output_of(
        r#"building: b
    set a to [1, 2]
    set b to a
    add 3 to b
    display a
"#,
    );
    assert_eq!(output, vec!["[1, 2, 3]"]);
}

#[test]
fn nested_list_element_is_shared() {
    let output = output_of(
        r#"building: b
    set grid to [[1], [2]]
    set row to grid[0]
    add 9 to row
    set row[0] to 5
    display grid
"#,
    );
    assert_eq!(output, vec!["[[5, 9], [2]]"]);
}

#[test]
fn assignment_shares_a_table() {
    let output = output_of(
        r#"building: b
    set scores to ["ada": 1]
    set alias to scores
    set alias["alan"] to 2
    display scores
"#,
    );
    assert_eq!(output, vec![r#"["ada": 1, "alan": 2]"#]);
}

#[test]
fn list_cannot_be_added_to_itself() {
    let error = error_of("building: b\n    set items to [1]\n    add items to items\n");
    assert_eq!(error.code, ErrorCode::INVALID_OPERAND_TYPES);
    assert!(error.message.contains("inside itself"), "got: {}", error.message);
}

#[test]
fn returned_list_is_shared_with_the_caller() {
    let (_, output) = run(&[
        (
            "main.building",
            r#"building: app
    call make_list storing result in first
    set second to first
    add 4 to second
    display first
"#,
        ),
        ("lists/lists.floor", "floor: lists\n    step: make_list\n"),
        (
            "lists/make_list.step",
            r#"step: make_list
    belongs to: lists
    returns: items
    do:
        set items to [1]
"#,
        ),
    ]);
    assert_eq!(output, vec!["[1, 4]"]);
}

// ══════════════════════════════════════════════════════════════════════════════
// Calls, returns & risers
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn step_call_returns_declared_variable() {
    let (outcome, output) = run(&[
        (
            "main.building",
            "building: app\n    call double with 21 storing result in answer\n    display answer\n",
        ),
        MATH_FLOOR,
        DOUBLE_STEP,
    ]);
    assert_eq!(outcome.exit, ExitCode::Completed);
    assert_eq!(output, vec!["42"]);
}

#[test]
fn call_expression_and_explicit_return() {
    let (_, output) = run(&[
        (
            "main.building",
            "building: app\n    display call sign_of with -5\n    display call sign_of with 3\n",
        ),
        ("math/math.floor", "floor: math\n    step: sign_of\n"),
        (
            "math/sign_of.step",
            r#"step: sign_of
    belongs to: math
    expects: x
    do:
        if x is less than 0
            return "negative"
        return "positive"
"#,
        ),
    ]);
    assert_eq!(output, vec!["negative", "positive"]);
}

#[test]
fn step_without_returns_yields_nothing() {
    let (_, output) = run(&[
        ("main.building", "building: app\n    display call greet\n"),
        ("misc/misc.floor", "floor: misc\n    step: greet\n"),
        (
            "misc/greet.step",
            "step: greet\n    belongs to: misc\n    do:\n        display \"hi\"\n",
        ),
    ]);
    assert_eq!(output, vec!["hi", "nothing"]);
}

#[test]
fn arguments_are_copied_on_call() {
    let (_, output) = run(&[
        (
            "main.building",
            r#"building: app
    set nums to [1, 2, 3]
    call append_four with nums
    display length of nums
"#,
        ),
        ("lists/lists.floor", "floor: lists\n    step: append_four\n"),
        (
            "lists/append_four.step",
            r#"step: append_four
    belongs to: lists
    expects: items
    do:
        add 4 to items
        display length of items
"#,
        ),
    ]);
    assert_eq!(output, vec!["4", "3"]);
}

#[test]
fn riser_reads_step_variables() {
    let (_, output) = run(&[
        ("main.building", "building: app\n    display call scale with 5\n"),
        ("math/math.floor", "floor: math\n    step: scale\n"),
        (
            "math/scale.step",
            r#"step: scale
    belongs to: math
    expects: n
    returns: out
    riser: times_factor
        expects: v
        returns: r
        do:
            set r to v * factor
    do:
        set factor to 3
        call times_factor with n storing result in out
"#,
        ),
    ]);
    assert_eq!(output, vec!["15"]);
}

#[test]
fn riser_outside_its_step_is_not_accessible() {
    let files = [
        ("main.building", "building: app\n    call helper\n"),
        ("core/core.floor", "floor: core\n    step: owner\n"),
        (
            "core/owner.step",
            r#"step: owner
    belongs to: core
    riser: helper
        do:
            display "inside"
    do:
        call helper
"#,
        ),
    ];
    let (outcome, output) = run(&files);
    let error = outcome.error.expect("expected E411");
    assert_eq!(error.code, ErrorCode::RISER_NOT_ACCESSIBLE);
    assert!(error.message.contains("owner"));
    assert!(output.is_empty());
}

#[test]
fn unknown_step_is_undefined() {
    let (outcome, _) = run(&[
        ("main.building", "building: app\n    call doubel with 2\n"),
        MATH_FLOOR,
        DOUBLE_STEP,
    ]);
    let error = outcome.error.expect("expected E402");
    assert_eq!(error.code, ErrorCode::UNDEFINED_STEP);
    assert_eq!(error.message, "Step 'doubel' does not exist.");
    assert!(error.hint.unwrap().contains("Did you mean 'double'?"));
}

#[test]
fn wrong_argument_count() {
    let (outcome, _) = run(&[
        ("main.building", "building: app\n    call double with 1, 2\n"),
        MATH_FLOOR,
        DOUBLE_STEP,
    ]);
    let error = outcome.error.expect("expected E409");
    assert_eq!(error.code, ErrorCode::WRONG_ARGUMENT_COUNT);
    assert_eq!(error.message, "Step 'double' expects 1 argument(s), got 2.");
    assert_eq!(error.file, "main.building");
}

#[test]
fn errors_inside_a_step_point_at_its_file() {
    let (outcome, _) = run(&[
        ("main.building", "building: app\n    call double with \"x\"\n"),
        MATH_FLOOR,
        DOUBLE_STEP,
    ]);
    let error = outcome.error.expect("expected E302");
    assert_eq!(error.code, ErrorCode::INVALID_OPERAND_TYPES);
    assert_eq!(error.file, "math/double.step");
    assert_eq!(error.span.start_line, 6);
}

#[test]
fn exit_inside_step_ends_program() {
    let (outcome, output) = run(&[
        (
            "main.building",
            "building: app\n    display \"a\"\n    call stop\n    display \"b\"\n",
        ),
        ("misc/misc.floor", "floor: misc\n    step: stop\n"),
        ("misc/stop.step", "step: stop\n    belongs to: misc\n    do:\n        exit\n"),
    ]);
    assert_eq!(outcome.exit, ExitCode::Exited);
    assert_eq!(outcome.exit.code(), 0);
    assert!(outcome.error.is_none());
    assert_eq!(output, vec!["a"]);
}

// ══════════════════════════════════════════════════════════════════════════════
// Fixed declarations
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn fixed_reassignment_is_rejected_and_value_kept() {
    let (outcome, output) = run(&[
        ("main.building", "building: app\n    call limits\n"),
        ("cfg/cfg.floor", "floor: cfg\n    step: limits\n"),
        (
            "cfg/limits.step",
            r#"step: limits
    belongs to: cfg
    declare:
        limit as number fixed
    do:
        display limit
        set limit to 5
        attempt:
            set limit to "five"
        if unsuccessful:
            display problem_message
        display limit
"#,
        ),
    ]);
    assert_eq!(outcome.exit, ExitCode::Completed);
    assert_eq!(output[0], "0");
    assert!(output[1].contains("fixed"), "got: {}", output[1]);
    assert_eq!(output[2], "5");
}

#[test]
fn uncaught_fixed_reassignment_fails() {
    let (outcome, _) = run(&[
        ("main.building", "building: app\n    call limits\n"),
        ("cfg/cfg.floor", "floor: cfg\n    step: limits\n"),
        (
            "cfg/limits.step",
            "step: limits\n    belongs to: cfg\n    declare:\n        flag as boolean fixed\n    do:\n        set flag to 1\n",
        ),
    ]);
    assert_eq!(outcome.error.unwrap().code, ErrorCode::FIXED_TYPE_MISMATCH);
}

// ══════════════════════════════════════════════════════════════════════════════
// Loops
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn repeat_times_truncates_count() {
    let output = output_of("building: b\n    repeat 2.7 times\n        display \"x\"\n    repeat -1 times\n        display \"y\"\n");
    assert_eq!(output, vec!["x", "x"]);
}

#[test]
fn repeat_times_needs_a_number() {
    let error = error_of("building: b\n    repeat \"3\" times\n        display 1\n");
    assert_eq!(error.code, ErrorCode::INVALID_OPERAND_TYPES);
}

#[test]
fn for_each_over_text_and_table() {
    let output = output_of(
        r#"building: b
    repeat for each c in "hi"
        display c
    repeat for each k in ["x": 1, "y": 2]
        display k
"#,
    );
    assert_eq!(output, vec!["h", "i", "x", "y"]);
}

#[test]
fn for_each_iterates_a_snapshot() {
    let output = output_of(
        r#"building: b
    set nums to [1, 2]
    repeat for each n in nums
        add n to nums
    display nums
"#,
    );
    assert_eq!(output, vec!["[1, 2, 1, 2]"]);
}

#[test]
fn for_each_rejects_numbers() {
    let error = error_of("building: b\n    repeat for each n in 5\n        display n\n");
    assert_eq!(error.code, ErrorCode::NOT_ITERABLE);
}

#[test]
fn repeat_while_reevaluates_condition() {
    let output = output_of(
        r#"building: b
    set n to 0
    repeat while n is less than 3
        set n to n + 1
    display n
"#,
    );
    assert_eq!(output, vec!["3"]);
}

#[test]
fn remove_deletes_first_match() {
    let output = output_of(
        r#"building: b
    set items to [1, 2, 1]
    remove 1 from items
    remove 9 from items
    display items
"#,
    );
    assert_eq!(output, vec!["[2, 1]"]);
}

// ══════════════════════════════════════════════════════════════════════════════
// Attempt
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn attempt_binds_problem_message() {
    let output = output_of(
        r#"building: b
    attempt:
        display 10 / 0
        display "unreached"
    if unsuccessful:
        display problem_message
    then continue:
        display "done"
"#,
    );
    assert_eq!(output, vec!["Cannot divide by zero.", "done"]);
}

#[test]
fn problem_message_is_scoped_to_handler() {
    let error = error_of(
        r#"building: b
    attempt:
        set x to "abc" as number
    if unsuccessful:
        display "bad"
    display problem_message
"#,
    );
    assert_eq!(error.code, ErrorCode::UNDEFINED_VARIABLE);
}

#[test]
fn then_continue_runs_on_success() {
    let output = output_of(
        r#"building: b
    attempt:
        display "ok"
    if unsuccessful:
        display "bad"
    then continue:
        display "after"
"#,
    );
    assert_eq!(output, vec!["ok", "after"]);
}

#[test]
fn then_continue_runs_before_exit_propagates() {
    let (outcome, output) = run(&[(
        "main.building",
        r#"building: b
    attempt:
        exit
    then continue:
        display "cleanup"
    display "never"
"#,
    )]);
    assert_eq!(outcome.exit, ExitCode::Exited);
    assert_eq!(output, vec!["cleanup"]);
}

#[test]
fn handler_errors_propagate() {
    let error = error_of(
        r#"building: b
    attempt:
        display 1 / 0
    if unsuccessful:
        display missing
"#,
    );
    assert_eq!(error.code, ErrorCode::UNDEFINED_VARIABLE);
}

// ══════════════════════════════════════════════════════════════════════════════
// Runtime errors
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn index_out_of_bounds_reports_index_and_length() {
    let error = error_of("building: b\n    set items to [1, 2, 3, 4, 5]\n    display items[10]\n");
    assert_eq!(error.code, ErrorCode::INDEX_OUT_OF_BOUNDS);
    assert!(error.message.contains("10"));
    assert!(error.message.contains('5'));
    assert_eq!(error.data["index"], 10.0);
    assert_eq!(error.data["length"], 5);
    assert_eq!(error.span.start_line, 3);
}

#[test]
fn missing_key_lists_available_keys() {
    let error = error_of("building: b\n    set t to [\"a\": 1, \"b\": 2]\n    display t[\"c\"]\n");
    assert_eq!(error.code, ErrorCode::KEY_NOT_FOUND);
    assert_eq!(error.data["available_keys"], serde_json::json!(["a", "b"]));
}

#[test]
fn division_by_zero_names_the_variable() {
    let error = error_of("building: b\n    set count to 0\n    display 10 / count\n");
    assert_eq!(error.code, ErrorCode::DIVISION_BY_ZERO);
    assert!(error.message.contains("'count'"), "got: {}", error.message);
}

#[test]
fn undefined_variable_suggests_a_name() {
    let error = error_of("building: b\n    set total to 1\n    display totl\n");
    assert_eq!(error.code, ErrorCode::UNDEFINED_VARIABLE);
    assert_eq!(error.hint.as_deref(), Some("Did you mean 'total'?"));
    assert!(!error.context_lines.is_empty());
}

#[test]
fn comparison_of_lists_is_invalid() {
    let error = error_of("building: b\n    display [1] is less than [2]\n");
    assert_eq!(error.code, ErrorCode::INVALID_COMPARISON);
}

// ══════════════════════════════════════════════════════════════════════════════
// Resource limits
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn runaway_loop_hits_statement_limit() {
    let (outcome, output) = run_with(
        &[(
            "main.building",
            r#"building: b
    set n to 0
    attempt:
        repeat while true
            set n to n + 1
    if unsuccessful:
        display "caught"
"#,
        )],
        EvalConfig::default().with_max_statements(1_000),
        CapturedIo::new(),
    );
    assert_eq!(outcome.exit, ExitCode::Failed);
    assert_eq!(outcome.error.unwrap().code, ErrorCode::STATEMENT_LIMIT);
    assert_eq!(outcome.statements_executed, 1_001);
    assert!(output.output().is_empty());
}

#[test]
fn unbounded_recursion_hits_depth_limit() {
    let (outcome, _) = run(&[
        ("main.building", "building: app\n    call forever\n"),
        ("loop/loop.floor", "floor: loop\n    step: forever\n"),
        (
            "loop/forever.step",
            "step: forever\n    belongs to: loop\n    do:\n        call forever\n",
        ),
    ]);
    let error = outcome.error.expect("expected E408");
    assert_eq!(error.code, ErrorCode::RECURSION_LIMIT);
    assert!(error.hint.unwrap().contains("forever → forever"));
}

#[test]
fn recursion_limit_is_configurable() {
    let files = [
        ("main.building", "building: app\n    call count_down with 5\n"),
        ("loop/loop.floor", "floor: loop\n    step: count_down\n"),
        (
            "loop/count_down.step",
            r#"step: count_down
    belongs to: loop
    expects: n
    do:
        if n is greater than 0
            call count_down with n - 1
"#,
        ),
    ];
    let (ok, _) = run_with(&files, EvalConfig::default().with_max_call_depth(6), CapturedIo::new());
    assert_eq!(ok.exit, ExitCode::Completed);
    let (failed, _) = run_with(&files, EvalConfig::default().with_max_call_depth(5), CapturedIo::new());
    assert_eq!(failed.error.unwrap().code, ErrorCode::RECURSION_LIMIT);
}

// ══════════════════════════════════════════════════════════════════════════════
// Input, tracing & outcome
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn input_reads_lines() {
    let (outcome, io) = run_with(
        &[(
            "main.building",
            "building: b\n    set name to input\n    display \"Hello, \" added to name\n",
        )],
        EvalConfig::default(),
        CapturedIo::with_input(["Ada"]),
    );
    assert!(outcome.is_success());
    assert_eq!(io.output_text(), "Hello, Ada");
}

#[test]
fn exhausted_input_is_a_host_failure() {
    let error = error_of("building: b\n    set name to input\n");
    assert_eq!(error.code, ErrorCode::HOST_FAILURE);
}

#[test]
fn trace_records_calls() {
    let registry = project(&[
        (
            "main.building",
            "building: app\n    call double with 21 storing result in answer\n",
        ),
        MATH_FLOOR,
        DOUBLE_STEP,
    ]);
    let mut evaluator = Evaluator::new(
        &registry,
        EvalConfig::default().with_trace(true),
        CapturedIo::new(),
    );
    evaluator.run();
    assert_eq!(evaluator.trace(), ["enter double(21)", "leave double = 42"]);

    let mut quiet = Evaluator::new(&registry, EvalConfig::default(), CapturedIo::new());
    quiet.run();
    assert!(quiet.trace().is_empty());
}

#[test]
fn outcome_serializes_to_json() {
    let (outcome, _) = run(&[("main.building", "building: b\n    display 1 / 0\n")]);
    let json = serde_json::to_value(&outcome).unwrap();
    assert_eq!(json["exit"], "failed");
    assert_eq!(json["error"]["code"], "E404");
    assert_eq!(outcome.exit.code(), 1);
}

#[test]
fn execute_resets_state_between_runs() {
    let registry = project(&[("main.building", "building: b\n    display 1\n")]);
    let mut evaluator = Evaluator::new(&registry, EvalConfig::default(), CapturedIo::new());
    let first = evaluator.run();
    let second = evaluator.run();
    assert_eq!(first.statements_executed, 1);
    assert_eq!(second.statements_executed, 1);
    assert_eq!(evaluator.io().output(), ["1", "1"]);
}

#[test]
fn determinism_100_iterations() {
    let files = [
        (
            "main.building",
            r#"building: app
    set total to 0
    repeat for each n in [1, 2, 3, 4]
        call double with n storing result in d
        set total to total + d
    display total
    set items to [1]
    attempt:
        display items[5]
    if unsuccessful:
        display problem_message
"#,
        ),
        MATH_FLOOR,
        DOUBLE_STEP,
    ];
    let (first, first_output) = run(&files);
    assert_eq!(first_output[0], "20");
    for i in 0..100 {
        let (outcome, output) = run(&files);
        assert_eq!(output, first_output, "output diverged at iteration {i}");
        assert_eq!(
            outcome.statements_executed, first.statements_executed,
            "statement count diverged at iteration {i}"
        );
    }
}

#[test]
fn values_are_structurally_equal() {
    let output = output_of(
        r#"building: b
    display [1, ["a": 2]] is equal to [1, ["a": 2]]
    display 1 is equal to "1"
"#,
    );
    assert_eq!(output, vec!["true", "false"]);
    assert_eq!(Value::from(1.0), Value::Number(1.0));
}

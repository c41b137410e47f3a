//! Canonical printer round-trip tests.
//!
//! Printing a parsed program and parsing the output again must give the
//! same AST (spans aside), and printing is idempotent.

use steps_parser::{parse_source, print_program};
use steps_types::ast::{FileKind, Program};
use steps_types::ast_diff::AstDiff;
use steps_types::SourceFile;

// ─────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────

fn parse_ok(source: &str, kind: FileKind) -> Program {
    let result = parse_source(&SourceFile::new("roundtrip.step", source), kind);
    if result.errors.has_errors() {
        for e in &result.errors.errors {
            eprintln!("  ERROR: {} ({})", e.message, e.code);
        }
        eprintln!("--- source ---\n{source}");
        panic!("unexpected parse errors (see above)");
    }
    result.program.expect("no program returned")
}

/// Parse, print, re-parse; assert the two trees agree and printing is stable.
fn assert_round_trip(source: &str, kind: FileKind) {
    let first = parse_ok(source, kind);
    let printed = print_program(&first);
    let second = parse_ok(&printed, kind);
    let diff = AstDiff::diff(&first, &second);
    assert!(diff.is_empty(), "round trip changed the AST: {:?}\n{printed}", diff.changes);
    assert_eq!(print_program(&second), printed, "printing is not idempotent");
}

// ─────────────────────────────────────────────────────────────────────
// Files
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_building_round_trip() {
    assert_round_trip(
        r#"building: shopping
    note: keeps a running list
    set items to []
    set prices to ["apple": 1.25, "pear": 2]
    repeat 3 times
        display "Item? "
        set answer to input
        if answer is equal to ""
            exit
        otherwise if answer is in items
            display "Already have " added to answer
        otherwise
            add answer to items
    repeat for each name in items
        display name added to ": " added to prices[name] as decimal(2)
    remove "apple" from items
    display length of items
"#,
        FileKind::Building,
    );
}

#[test]
fn test_floor_round_trip() {
    assert_round_trip("floor: math\n    step: double\n    step: halve\n", FileKind::Floor);
}

#[test]
fn test_step_round_trip() {
    assert_round_trip(
        r#"step: grade
    belongs to: school
    expects: score as number, name
    returns: letter as text
    riser: clamp
        expects: n
        returns: nothing
        declare:
            limit as number fixed
        do:
            set limit to 100
            if n is greater than limit
                return limit
            return n
    declare:
        bonus as number
    do:
        call clamp with score storing result in score
        set letter to "F"
        if score is greater than or equal to 90
            set letter to "A"
"#,
        FileKind::Step,
    );
}

#[test]
fn test_step_sections_print_in_canonical_order() {
    let source = "step: s\n    do:\n        exit\n    belongs to: f\n";
    let printed = print_program(&parse_ok(source, FileKind::Step));
    assert_eq!(printed, "step: s\n    belongs to: f\n    do:\n        exit\n");
}

// ─────────────────────────────────────────────────────────────────────
// Expressions
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_expression_round_trips() {
    for expr in [
        "1 + 2 * 3",
        "(1 + 2) * 3",
        "10 - -3",
        "- x",
        "not a and b or c",
        "x is a number",
        "character at 0 of name",
        "\"a,b\" split by \",\"",
        "s starts with \"x\" and s ends with \"y\"",
        "grid[1][2]",
        "\"42\" as number + 1",
        "7 % 2",
        "type of [1, [2, 3]]",
        "[:]",
        "call double with 4",
        "\"tab\\tquote\\\"\"",
        "nothing",
    ] {
        assert_round_trip(&format!("building: b\n    display {expr}\n"), FileKind::Building);
    }
}

#[test]
fn test_note_block_round_trip() {
    assert_round_trip(
        r#"building: b
    note block:
        first line
        second line
    end note
    exit
"#,
        FileKind::Building,
    );
}

#[test]
fn test_attempt_round_trip() {
    assert_round_trip(
        r#"building: b
    attempt:
        set n to "abc" as number
    if unsuccessful:
        display problem_message
    then continue:
        display "done"
"#,
        FileKind::Building,
    );
}

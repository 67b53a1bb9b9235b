//! Full lex -> parse -> evaluate pipelines for the language's worked
//! scenarios. `print`/`whoops` write straight to the process's stdout, so
//! these assert on bindings left behind in scope instead of captured
//! output; the CLI driver's own tests cover the printed text.

use rill_eval::Interpreter;
use rill_lex::{Lexer, NumberLit};
use rill_par::value::Value;
use rill_par::{parse_program, Heap};
use rill_util::HeapId;

fn run(src: &str) -> (Interpreter, HeapId) {
    let tokens = Lexer::lex_all(src).unwrap();
    let mut heap = Heap::new();
    let root = parse_program(&tokens, &mut heap).unwrap();
    let mut interp = Interpreter::new(heap, root);
    let top_scope = interp.evaluate_node(root).unwrap();
    (interp, top_scope)
}

fn int(interp: &Interpreter, id: HeapId) -> i64 {
    match interp.heap().get(id) {
        Some(Value::Number(NumberLit::Int(n))) => *n,
        other => panic!("expected an int, got {other:?}"),
    }
}

fn string(interp: &Interpreter, id: HeapId) -> String {
    match interp.heap().get(id) {
        Some(Value::String(bytes)) => String::from_utf8_lossy(bytes).into_owned(),
        other => panic!("expected a string, got {other:?}"),
    }
}

#[test]
fn arithmetic_honors_precedence() {
    let (mut interp, top) = run("let result 1 + 2 * 3;");
    let value = interp.get_in_scope(top, b"result").unwrap().unwrap();
    assert_eq!(int(&interp, value), 7);
}

#[test]
fn adjacent_strings_concatenate_via_application() {
    let (mut interp, top) = run(r#"let result "hello" " " "world";"#);
    let value = interp.get_in_scope(top, b"result").unwrap().unwrap();
    assert_eq!(string(&interp, value), "hello world");
}

#[test]
fn closure_application_squares_its_argument() {
    let (mut interp, top) = run("let f (x => x * x); let result f 5;");
    let value = interp.get_in_scope(top, b"result").unwrap().unwrap();
    assert_eq!(int(&interp, value), 25);
}

#[test]
fn edit_then_access_round_trips_through_a_scope() {
    let (mut interp, top) = run("let s {}; edit s key 42; let result s.key;");
    let value = interp.get_in_scope(top, b"result").unwrap().unwrap();
    assert_eq!(int(&interp, value), 42);
}

#[test]
fn while_loop_counts_up_to_its_bound() {
    let (mut interp, top) = run("let i 0; while (i < 3) { set i i + 1; };");
    let value = interp.get_in_scope(top, b"i").unwrap().unwrap();
    assert_eq!(int(&interp, value), 3);
}

#[test]
fn nested_closures_capture_their_enclosing_argument() {
    let (mut interp, top) =
        run("let mkAdder (x => (y => x + y)); let add3 mkAdder 3; let result add3 4;");
    let value = interp.get_in_scope(top, b"result").unwrap().unwrap();
    assert_eq!(int(&interp, value), 7);
}

#[test]
fn undefined_variable_is_a_fatal_error() {
    let tokens = Lexer::lex_all("print missing;").unwrap();
    let mut heap = Heap::new();
    let root = parse_program(&tokens, &mut heap).unwrap();
    let mut interp = Interpreter::new(heap, root);
    let err = interp.run().unwrap_err();
    assert!(matches!(err, rill_util::Fatal::UndefinedVariable { .. }));
}

#[test]
fn accessing_a_missing_scope_key_is_a_fatal_error() {
    let tokens = Lexer::lex_all("let s {}; print s.missing;").unwrap();
    let mut heap = Heap::new();
    let root = parse_program(&tokens, &mut heap).unwrap();
    let mut interp = Interpreter::new(heap, root);
    let err = interp.run().unwrap_err();
    assert!(matches!(err, rill_util::Fatal::MissingScopeKey { .. }));
}

//! Statement-form dispatch: the thirteen built-in commands, plus the two
//! helpers that decide how a statement's raw, ungrouped tail folds into
//! arguments for a given command.
//!
//! The sequence builder in `rill-par` never folds a statement's tail through
//! the precedence resolver itself — only bracketed expression content gets
//! that treatment. Whether a run of bare tail tokens should fold into one
//! value, or stay apart from its neighbors, depends on which command is
//! dispatching, so that decision lives here rather than in the parser.

use rill_lex::NumberLit;
use rill_par::precedence;
use rill_par::value::{Statement, StmtElem, Value};
use rill_par::Heap;
use rill_util::{Fatal, HeapId, Result};

use crate::eval::Interpreter;
use crate::scope;

/// What a statement did to its enclosing Sequence's control flow.
pub enum Flow {
    Normal,
    Return(HeapId),
}

/// Folds a variadic command's tail into one value per argument: each
/// maximal run of bare tokens between groups folds into one value through
/// the precedence resolver, while each `Group` element stands alone as its
/// own argument (a hard boundary the resolver never crosses). This is what
/// makes `print "hello" " " "world";` fold into one concatenated argument
/// while `do (print i) (set i i + 1);` keeps its two parenthesized actions
/// separate.
pub fn split_variadic_args(heap: &mut Heap, tail: &[StmtElem]) -> Result<Vec<HeapId>> {
    let mut args = Vec::new();
    let mut run: Vec<HeapId> = Vec::new();
    for elem in tail {
        match elem {
            StmtElem::Token(id) => run.push(*id),
            StmtElem::Group(id) => {
                if !run.is_empty() {
                    args.push(precedence::resolve(heap, &run)?);
                    run.clear();
                }
                args.push(*id);
            }
        }
    }
    if !run.is_empty() {
        args.push(precedence::resolve(heap, &run)?);
    }
    Ok(args)
}

/// Splits a fixed-arity command's tail: the first `n_head` elements are
/// taken individually, verbatim — never folded with a neighbor, since a
/// command argument ahead of the final one is always written as a single
/// token or a single bracketed/braced group — and everything remaining is
/// folded into one final value through the resolver. This is what lets
/// `set i i + 1;` parse as `set(i, i + 1)` instead of misreading the second
/// `i` as part of the key.
pub fn split_fixed_args(
    heap: &mut Heap,
    tail: &[StmtElem],
    n_head: usize,
) -> Result<(Vec<HeapId>, Option<HeapId>)> {
    if tail.len() < n_head {
        return Ok((tail.iter().map(|e| e.id()).collect(), None));
    }
    let head: Vec<HeapId> = tail[..n_head].iter().map(|e| e.id()).collect();
    let rest = &tail[n_head..];
    if rest.is_empty() {
        Ok((head, None))
    } else {
        let rest_ids: Vec<HeapId> = rest.iter().map(|e| e.id()).collect();
        Ok((head, Some(precedence::resolve(heap, &rest_ids)?)))
    }
}

fn command_name(heap: &Heap, id: HeapId) -> Result<Vec<u8>> {
    match heap.get(id) {
        Some(Value::Variable(name)) => Ok(name.clone()),
        Some(other) => Err(Fatal::Message(format!(
            "a statement must start with a command name, found a {}",
            other.kind_name()
        ))),
        None => Err(Fatal::Message("dangling heap id".into())),
    }
}

fn require_string(heap: &Heap, id: HeapId) -> Result<Vec<u8>> {
    match heap.get(id) {
        Some(Value::String(bytes)) => Ok(bytes.clone()),
        Some(other) => Err(Fatal::TypeMismatch(format!(
            "expected a string, found {}",
            other.kind_name()
        ))),
        None => Err(Fatal::Message("dangling heap id".into())),
    }
}

fn arity_err(command: &'static str, expected: &'static str, got: usize) -> Fatal {
    Fatal::WrongArity {
        command,
        expected,
        got,
    }
}

pub fn dispatch_statement(interp: &mut Interpreter, stmt: &Statement) -> Result<Flow> {
    let name = command_name(&interp.heap, stmt.command)?;
    match name.as_slice() {
        b"do" => dispatch_do(interp, stmt),
        b"return" => dispatch_return(interp, stmt),
        b"print" => dispatch_print(interp, stmt, false),
        b"whoops" => dispatch_print(interp, stmt, true),
        b"input" => dispatch_input(interp, stmt),
        b"readfile" => dispatch_readfile(interp, stmt),
        b"writefile" => dispatch_writefile(interp, stmt),
        b"if" => dispatch_if(interp, stmt),
        b"while" => dispatch_while(interp, stmt),
        b"let" => dispatch_let(interp, stmt),
        b"set" => dispatch_set(interp, stmt),
        b"mut" => dispatch_mut(interp, stmt),
        b"edit" => dispatch_edit(interp, stmt),
        other => Err(Fatal::UnknownCommand {
            name: String::from_utf8_lossy(other).into_owned(),
        }),
    }
}

fn dispatch_do(interp: &mut Interpreter, stmt: &Statement) -> Result<Flow> {
    let args = split_variadic_args(&mut interp.heap, &stmt.tail)?;
    for arg in args {
        interp.evaluate(arg)?;
    }
    Ok(Flow::Normal)
}

fn dispatch_return(interp: &mut Interpreter, stmt: &Statement) -> Result<Flow> {
    let args = split_variadic_args(&mut interp.heap, &stmt.tail)?;
    if args.len() != 1 {
        return Err(arity_err("return", "1", args.len()));
    }
    let value = interp.evaluate(args[0])?;
    Ok(Flow::Return(value))
}

fn dispatch_print(interp: &mut Interpreter, stmt: &Statement, abort: bool) -> Result<Flow> {
    use std::io::Write;

    let args = split_variadic_args(&mut interp.heap, &stmt.tail)?;
    let mut out = String::new();
    for arg in args {
        let value = interp.evaluate(arg)?;
        out.push_str(&crate::print::render_nonliteral(&interp.heap, value)?);
    }
    print!("{out}");
    std::io::stdout().flush().ok();
    if abort {
        return Err(Fatal::Message(format!("whoops: {out}")));
    }
    Ok(Flow::Normal)
}

fn dispatch_input(interp: &mut Interpreter, stmt: &Statement) -> Result<Flow> {
    let (head, rest) = split_fixed_args(&mut interp.heap, &stmt.tail, 1)?;
    if head.len() != 1 || rest.is_some() {
        return Err(arity_err("input", "1", stmt.tail.len()));
    }
    let name_id = head[0];
    let mut line = String::new();
    std::io::stdin()
        .read_line(&mut line)
        .map_err(|e| Fatal::Message(format!("input: {e}")))?;
    let trimmed = line.trim_end_matches(['\n', '\r']);
    let value = interp.heap.insert(Value::String(trimmed.as_bytes().to_vec()));
    let collection = interp.current_collection();
    scope::set_variable(&mut interp.heap, collection, name_id, value, false)?;
    Ok(Flow::Normal)
}

fn dispatch_readfile(interp: &mut Interpreter, stmt: &Statement) -> Result<Flow> {
    let (head, rest) = split_fixed_args(&mut interp.heap, &stmt.tail, 1)?;
    if head.len() != 1 {
        return Err(arity_err("readfile", "2", stmt.tail.len()));
    }
    let name_id = head[0];
    let path_expr = rest.ok_or_else(|| arity_err("readfile", "2", stmt.tail.len()))?;
    let path_val = interp.evaluate(path_expr)?;
    let path = require_string(&interp.heap, path_val)?;
    let path_str = String::from_utf8_lossy(&path).into_owned();
    let value = match std::fs::read(&path_str) {
        Ok(bytes) => interp.heap.insert(Value::String(bytes)),
        Err(_) => interp.heap.insert(Value::Null),
    };
    let collection = interp.current_collection();
    scope::set_variable(&mut interp.heap, collection, name_id, value, false)?;
    Ok(Flow::Normal)
}

fn dispatch_writefile(interp: &mut Interpreter, stmt: &Statement) -> Result<Flow> {
    let (head, rest) = split_fixed_args(&mut interp.heap, &stmt.tail, 2)?;
    if head.len() != 2 {
        return Err(arity_err("writefile", "3", stmt.tail.len()));
    }
    let path_expr = rest.ok_or_else(|| arity_err("writefile", "3", stmt.tail.len()))?;
    let name_id = head[0];
    let payload_val = interp.evaluate(head[1])?;
    let payload = require_string(&interp.heap, payload_val)?;
    let path_val = interp.evaluate(path_expr)?;
    let path = require_string(&interp.heap, path_val)?;
    let path_str = String::from_utf8_lossy(&path).into_owned();
    let success = std::fs::write(&path_str, &payload).is_ok();
    let value = interp
        .heap
        .insert(Value::Number(NumberLit::Int(success as i64)));
    let collection = interp.current_collection();
    scope::set_variable(&mut interp.heap, collection, name_id, value, false)?;
    Ok(Flow::Normal)
}

fn dispatch_if(interp: &mut Interpreter, stmt: &Statement) -> Result<Flow> {
    let args = split_variadic_args(&mut interp.heap, &stmt.tail)?;
    if args.len() < 2 {
        return Err(arity_err("if", ">=2", args.len()));
    }
    let mut i = 0;
    while i + 1 < args.len() {
        let cond_val = interp.evaluate(args[i])?;
        if interp.is_truthy(cond_val) {
            interp.evaluate(args[i + 1])?;
            return Ok(Flow::Normal);
        }
        i += 2;
    }
    if i < args.len() {
        interp.evaluate(args[i])?;
    }
    Ok(Flow::Normal)
}

fn dispatch_while(interp: &mut Interpreter, stmt: &Statement) -> Result<Flow> {
    let args = split_variadic_args(&mut interp.heap, &stmt.tail)?;
    if args.len() != 2 {
        return Err(arity_err("while", "2", args.len()));
    }
    loop {
        let cond_val = interp.evaluate(args[0])?;
        if !interp.is_truthy(cond_val) {
            break;
        }
        interp.evaluate(args[1])?;
    }
    Ok(Flow::Normal)
}

fn dispatch_let(interp: &mut Interpreter, stmt: &Statement) -> Result<Flow> {
    let (head, rest) = split_fixed_args(&mut interp.heap, &stmt.tail, 1)?;
    if head.len() != 1 {
        return Err(arity_err("let", "2", stmt.tail.len()));
    }
    let key_id = head[0];
    let value_expr = rest.ok_or_else(|| arity_err("let", "2", stmt.tail.len()))?;
    let value = interp.evaluate(value_expr)?;
    let collection = interp.current_collection();
    scope::set_variable(&mut interp.heap, collection, key_id, value, true)?;
    Ok(Flow::Normal)
}

fn dispatch_set(interp: &mut Interpreter, stmt: &Statement) -> Result<Flow> {
    let (head, rest) = split_fixed_args(&mut interp.heap, &stmt.tail, 1)?;
    if head.len() != 1 {
        return Err(arity_err("set", "2", stmt.tail.len()));
    }
    let key_id = head[0];
    let value_expr = rest.ok_or_else(|| arity_err("set", "2", stmt.tail.len()))?;
    let value = interp.evaluate(value_expr)?;
    let collection = interp.current_collection();
    scope::set_variable(&mut interp.heap, collection, key_id, value, false)?;
    Ok(Flow::Normal)
}

fn dispatch_mut(interp: &mut Interpreter, stmt: &Statement) -> Result<Flow> {
    let (head, rest) = split_fixed_args(&mut interp.heap, &stmt.tail, 2)?;
    if head.len() != 2 {
        return Err(arity_err("mut", "3", stmt.tail.len()));
    }
    let value_expr = rest.ok_or_else(|| arity_err("mut", "3", stmt.tail.len()))?;
    let scope_val = interp.evaluate(head[0])?;
    interp.require_scope(scope_val)?;
    let key_val = interp.evaluate(head[1])?;
    let value_val = interp.evaluate(value_expr)?;
    scope::set(&mut interp.heap, scope_val, key_val, value_val)?;
    Ok(Flow::Normal)
}

fn dispatch_edit(interp: &mut Interpreter, stmt: &Statement) -> Result<Flow> {
    let (head, rest) = split_fixed_args(&mut interp.heap, &stmt.tail, 2)?;
    if head.len() != 2 {
        return Err(arity_err("edit", "3", stmt.tail.len()));
    }
    let value_expr = rest.ok_or_else(|| arity_err("edit", "3", stmt.tail.len()))?;
    let scope_val = interp.evaluate(head[0])?;
    interp.require_scope(scope_val)?;
    let key_id = head[1];
    let value_val = interp.evaluate(value_expr)?;
    scope::set(&mut interp.heap, scope_val, key_id, value_val)?;
    Ok(Flow::Normal)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(heap: &mut Heap, n: i64) -> HeapId {
        heap.insert(Value::Number(NumberLit::Int(n)))
    }

    fn token(id: HeapId) -> StmtElem {
        StmtElem::Token(id)
    }

    fn group(id: HeapId) -> StmtElem {
        StmtElem::Group(id)
    }

    fn op(heap: &mut Heap, kind: rill_lex::OperatorKind) -> HeapId {
        heap.insert(Value::Operation {
            op: kind,
            a: None,
            b: None,
        })
    }

    #[test]
    fn variadic_folds_bare_runs_but_keeps_groups_separate() {
        let mut heap = Heap::new();
        let one = num(&mut heap, 1);
        let plus = op(&mut heap, rill_lex::OperatorKind::Add);
        let two = num(&mut heap, 2);
        let g = heap.insert(Value::Null);
        let tail = vec![token(one), token(plus), token(two), group(g)];
        let args = split_variadic_args(&mut heap, &tail).unwrap();
        assert_eq!(args.len(), 2);
        assert_eq!(args[1], g);
        match heap.get(args[0]).unwrap() {
            Value::Operation {
                op: rill_lex::OperatorKind::Add,
                ..
            } => {}
            other => panic!("expected folded Add, got {other:?}"),
        }
    }

    #[test]
    fn fixed_args_takes_head_individually_and_folds_the_rest() {
        let mut heap = Heap::new();
        let key = heap.insert(Value::Variable(b"i".to_vec()));
        let i_ref = heap.insert(Value::Variable(b"i".to_vec()));
        let plus = op(&mut heap, rill_lex::OperatorKind::Add);
        let one = num(&mut heap, 1);
        let tail = vec![token(key), token(i_ref), token(plus), token(one)];
        let (head, rest) = split_fixed_args(&mut heap, &tail, 1).unwrap();
        assert_eq!(head, vec![key]);
        let rest_id = rest.unwrap();
        match heap.get(rest_id).unwrap() {
            Value::Operation {
                op: rill_lex::OperatorKind::Add,
                a: Some(a),
                b: Some(b),
            } => {
                assert_eq!(*a, i_ref);
                assert_eq!(*b, one);
            }
            other => panic!("expected folded Add, got {other:?}"),
        }
    }
}

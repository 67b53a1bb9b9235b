//! Property: a chain of the same left-associative operator always nests left
//! (spec property #6), regardless of chain length.

use proptest::prelude::*;
use rill_lex::Lexer;
use rill_par::value::{StmtElem, Value};
use rill_par::{parse_program, Heap};

fn left_spine_depth(heap: &Heap, mut id: rill_util::HeapId, op: rill_lex::OperatorKind) -> usize {
    let mut depth = 0;
    loop {
        match heap.get(id) {
            Some(Value::Operation {
                op: found,
                a: Some(a),
                ..
            }) if *found == op => {
                depth += 1;
                id = *a;
            }
            _ => break,
        }
    }
    depth
}

proptest! {
    #[test]
    fn chain_of_subtractions_nests_left(n in 2usize..8) {
        let mut src = String::from("let x (1");
        for i in 0..n {
            src.push_str(&format!(" - {}", i + 2));
        }
        src.push_str(");");

        let tokens = Lexer::lex_all(&src).unwrap();
        let mut heap = Heap::new();
        let root = parse_program(&tokens, &mut heap).unwrap();
        let stmts = match heap.get(root).unwrap() {
            Value::Sequence(s) => s.clone(),
            _ => unreachable!(),
        };
        let group = match stmts[0].tail[1] {
            StmtElem::Group(id) => id,
            StmtElem::Token(_) => panic!("expected a bracketed group"),
        };
        let depth = left_spine_depth(&heap, group, rill_lex::OperatorKind::Sub);
        prop_assert_eq!(depth, n);
    }
}

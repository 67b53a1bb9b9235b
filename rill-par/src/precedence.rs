//! The precedence resolver: folds a flat list of operand/operator values into
//! a tree.
//!
//! This is used twice: by the expression builder, for the content of a
//! bracketed sub-expression, and by `rill-eval`'s statement dispatch, which
//! folds a run of bare (non-grouped) tail elements into one argument the same
//! way. Both call sites share this module so the two places can never drift.

use rill_lex::OperatorKind;
use rill_util::{Fatal, HeapId, Result};

use crate::value::{Heap, Value};

/// Binding strength: larger binds looser. Juxtaposition (`Application`) is
/// not scanned for directly — it is the fallback when no operator token is
/// found in a window — but its nominal level is tightest, per the table in
/// the language reference.
pub fn precedence(op: OperatorKind) -> u8 {
    match op {
        OperatorKind::Application => 0,
        OperatorKind::Access => 1,
        OperatorKind::Pow => 2,
        OperatorKind::Mul | OperatorKind::Div | OperatorKind::Mod => 3,
        OperatorKind::Add | OperatorKind::Sub => 4,
        OperatorKind::Shl | OperatorKind::Shr => 5,
        OperatorKind::SubL | OperatorKind::SubR => 6,
        OperatorKind::Lt | OperatorKind::Gt | OperatorKind::Le | OperatorKind::Ge => 8,
        OperatorKind::Eq | OperatorKind::Ne => 9,
        OperatorKind::BitAnd => 10,
        OperatorKind::BitXor => 11,
        OperatorKind::BitOr => 12,
        OperatorKind::Closure => 13,
    }
}

pub fn is_right_associative(op: OperatorKind) -> bool {
    matches!(op, OperatorKind::Closure)
}

fn unbound_operator(heap: &Heap, id: HeapId) -> Option<OperatorKind> {
    match heap.get(id) {
        Some(Value::Operation {
            op,
            a: None,
            b: None,
        }) => Some(*op),
        _ => None,
    }
}

/// Folds `window` (must be non-empty) into a single value, wiring any
/// still-unbound `Operation` nodes it contains into a precedence-correct
/// tree. Consumes the window since the recursive calls only ever need
/// sub-slices of it.
pub fn resolve(heap: &mut Heap, window: &[HeapId]) -> Result<HeapId> {
    if window.is_empty() {
        return Err(Fatal::Parse("empty expression".into()));
    }
    if window.len() == 1 {
        return Ok(window[0]);
    }

    let mut pivot: Option<(usize, OperatorKind, u8)> = None;
    for (i, id) in window.iter().enumerate() {
        let Some(op) = unbound_operator(heap, *id) else {
            continue;
        };
        let prec = precedence(op);
        let dethrones = match pivot {
            None => true,
            Some((_, champ_op, champ_prec)) if is_right_associative(champ_op) => {
                prec > champ_prec
            }
            Some((_, _, champ_prec)) => prec >= champ_prec,
        };
        if dethrones {
            pivot = Some((i, op, prec));
        }
    }

    match pivot {
        Some((idx, op, _)) => {
            if idx == 0 || idx == window.len() - 1 {
                return Err(Fatal::Parse(format!(
                    "operator {op:?} is missing an operand"
                )));
            }
            let left = resolve(heap, &window[..idx])?;
            let right = resolve(heap, &window[idx + 1..])?;
            Ok(heap.insert(Value::Operation {
                op,
                a: Some(left),
                b: Some(right),
            }))
        }
        // No unbound operator anywhere in the window: juxtaposition.
        // Left-associative, so the rightmost element binds last: this
        // window is `Application(resolve(window[..-1]), window[-1])`.
        None => {
            let last = window[window.len() - 1];
            let left = resolve(heap, &window[..window.len() - 1])?;
            Ok(heap.insert(Value::Operation {
                op: OperatorKind::Application,
                a: Some(left),
                b: Some(last),
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rill_lex::NumberLit;

    fn num(heap: &mut Heap, n: i64) -> HeapId {
        heap.insert(Value::Number(NumberLit::Int(n)))
    }

    fn op(heap: &mut Heap, kind: OperatorKind) -> HeapId {
        heap.insert(Value::Operation {
            op: kind,
            a: None,
            b: None,
        })
    }

    #[test]
    fn single_element_window_is_returned_unchanged() {
        let mut heap = Heap::new();
        let a = num(&mut heap, 7);
        assert_eq!(resolve(&mut heap, &[a]).unwrap(), a);
    }

    #[test]
    fn mul_binds_tighter_than_add() {
        // 1 + 2 * 3  =>  Add(1, Mul(2, 3))
        let mut heap = Heap::new();
        let one = num(&mut heap, 1);
        let plus = op(&mut heap, OperatorKind::Add);
        let two = num(&mut heap, 2);
        let star = op(&mut heap, OperatorKind::Mul);
        let three = num(&mut heap, 3);
        let root = resolve(&mut heap, &[one, plus, two, star, three]).unwrap();
        match heap.get(root).unwrap() {
            Value::Operation {
                op: OperatorKind::Add,
                a: Some(a),
                b: Some(b),
            } => {
                assert_eq!(*a, one);
                match heap.get(*b).unwrap() {
                    Value::Operation {
                        op: OperatorKind::Mul,
                        a: Some(x),
                        b: Some(y),
                    } => {
                        assert_eq!(*x, two);
                        assert_eq!(*y, three);
                    }
                    other => panic!("expected Mul, got {other:?}"),
                }
            }
            other => panic!("expected Add at root, got {other:?}"),
        }
    }

    #[test]
    fn sub_is_left_associative() {
        // 1 - 2 - 3 => Sub(Sub(1,2),3)
        let mut heap = Heap::new();
        let one = num(&mut heap, 1);
        let m1 = op(&mut heap, OperatorKind::Sub);
        let two = num(&mut heap, 2);
        let m2 = op(&mut heap, OperatorKind::Sub);
        let three = num(&mut heap, 3);
        let root = resolve(&mut heap, &[one, m1, two, m2, three]).unwrap();
        match heap.get(root).unwrap() {
            Value::Operation {
                op: OperatorKind::Sub,
                a: Some(a),
                b: Some(b),
            } => {
                assert_eq!(*b, three);
                match heap.get(*a).unwrap() {
                    Value::Operation {
                        op: OperatorKind::Sub,
                        a: Some(x),
                        b: Some(y),
                    } => {
                        assert_eq!(*x, one);
                        assert_eq!(*y, two);
                    }
                    other => panic!("expected inner Sub, got {other:?}"),
                }
            }
            other => panic!("expected Sub at root, got {other:?}"),
        }
    }

    #[test]
    fn closure_arrow_is_right_associative() {
        // a => b => c  =>  Closure(a, Closure(b, c))
        let mut heap = Heap::new();
        use rill_lex::OperatorKind::Closure;
        let a = num(&mut heap, 1);
        let arrow1 = op(&mut heap, Closure);
        let b = num(&mut heap, 2);
        let arrow2 = op(&mut heap, Closure);
        let c = num(&mut heap, 3);
        let root = resolve(&mut heap, &[a, arrow1, b, arrow2, c]).unwrap();
        match heap.get(root).unwrap() {
            Value::Operation {
                op: Closure,
                a: Some(x),
                b: Some(y),
            } => {
                assert_eq!(*x, a);
                match heap.get(*y).unwrap() {
                    Value::Operation {
                        op: Closure,
                        a: Some(p),
                        b: Some(q),
                    } => {
                        assert_eq!(*p, b);
                        assert_eq!(*q, c);
                    }
                    other => panic!("expected inner Closure, got {other:?}"),
                }
            }
            other => panic!("expected Closure at root, got {other:?}"),
        }
    }

    #[test]
    fn no_operator_collapses_to_left_associative_application() {
        // "hello" " " "world" => Application(Application(hello, space), world)
        let mut heap = Heap::new();
        let hello = heap.insert(Value::String(b"hello".to_vec()));
        let space = heap.insert(Value::String(b" ".to_vec()));
        let world = heap.insert(Value::String(b"world".to_vec()));
        let root = resolve(&mut heap, &[hello, space, world]).unwrap();
        match heap.get(root).unwrap() {
            Value::Operation {
                op: OperatorKind::Application,
                a: Some(inner),
                b: Some(b),
            } => {
                assert_eq!(*b, world);
                match heap.get(*inner).unwrap() {
                    Value::Operation {
                        op: OperatorKind::Application,
                        a: Some(x),
                        b: Some(y),
                    } => {
                        assert_eq!(*x, hello);
                        assert_eq!(*y, space);
                    }
                    other => panic!("expected inner Application, got {other:?}"),
                }
            }
            other => panic!("expected Application at root, got {other:?}"),
        }
    }

    #[test]
    fn trailing_operator_is_a_parse_error() {
        let mut heap = Heap::new();
        let one = num(&mut heap, 1);
        let plus = op(&mut heap, OperatorKind::Add);
        assert!(matches!(
            resolve(&mut heap, &[one, plus]),
            Err(Fatal::Parse(_))
        ));
    }
}

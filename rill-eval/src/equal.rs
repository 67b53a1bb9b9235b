//! Structural equality: the single routine backing Scope key lookup,
//! `==`/`!=`, and every other place the language compares by content rather
//! than identity.

use rill_lex::NumberLit;
use rill_par::value::Value;
use rill_par::Heap;
use rill_util::HeapId;

/// Two Values are equal iff they share identity, or their kinds match and
/// agree under the rules below. Kind is a hard gate: a `String` and a
/// `Variable` with identical bytes are still unequal, matching the
/// reference's `if (a->type != b->type) return false;` before it ever
/// compares payloads.
pub fn values_equal(heap: &Heap, a: HeapId, b: HeapId) -> bool {
    if a == b {
        return true;
    }
    let (va, vb) = match (heap.get(a), heap.get(b)) {
        (Some(va), Some(vb)) => (va, vb),
        _ => return false,
    };
    match (va, vb) {
        (Value::Null, Value::Null) => true,
        (Value::Number(na), Value::Number(nb)) => numbers_equal(*na, *nb),
        (Value::String(sa), Value::String(sb)) => sa == sb,
        (Value::Variable(sa), Value::Variable(sb)) => sa == sb,
        (Value::Scope(ea), Value::Scope(eb)) => scopes_equal(heap, ea, eb),
        _ => false,
    }
}

fn numbers_equal(a: NumberLit, b: NumberLit) -> bool {
    match (a, b) {
        (NumberLit::Int(x), NumberLit::Int(y)) => x == y,
        (NumberLit::Float(x), NumberLit::Float(y)) => x == y,
        (NumberLit::Int(x), NumberLit::Float(y)) | (NumberLit::Float(y), NumberLit::Int(x)) => {
            x as f64 == y
        }
    }
}

fn scopes_equal(heap: &Heap, a: &[(HeapId, HeapId)], b: &[(HeapId, HeapId)]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().all(|(k, v)| {
        b.iter()
            .any(|(k2, v2)| values_equal(heap, *k, *k2) && values_equal(heap, *v, *v2))
    })
}

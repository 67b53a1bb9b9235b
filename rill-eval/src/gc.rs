//! Mark-and-sweep collector, run after each top-level statement and once
//! more at program end. Single-threaded, single generation: no concurrent
//! marking and no per-generation sweep, since the Non-goals this workspace
//! carries forward exclude both.

use rill_par::value::Value;
use rill_par::Heap;
use rill_util::HeapId;

/// Marks everything reachable from `ast_root` plus `scopes_stack` and
/// `call_stack`, then sweeps. For the final end-of-program cycle callers
/// pass empty slices for both stacks, per the collector's root rule.
pub fn collect(heap: &mut Heap, ast_root: HeapId, scopes_stack: &[HeapId], call_stack: &[HeapId]) {
    mark(heap, ast_root);
    for &id in scopes_stack {
        mark(heap, id);
    }
    for &id in call_stack {
        mark(heap, id);
    }
    let live_before = heap.live_count();
    let freed = heap.sweep();
    tracing::info!(live = live_before - freed, freed, "garbage collection cycle");
}

fn mark(heap: &Heap, id: HeapId) {
    // `Arena::mark` sets the bit through a `Cell`, so this needs no `&mut`
    // borrow; a value already marked has already had its children visited.
    if !heap.mark(id) {
        return;
    }
    match heap.get(id) {
        Some(Value::Operation { a, b, .. }) => {
            if let Some(a) = a {
                mark(heap, *a);
            }
            if let Some(b) = b {
                mark(heap, *b);
            }
        }
        Some(Value::Sequence(statements)) => {
            for stmt in statements {
                mark(heap, stmt.command);
                for elem in &stmt.tail {
                    mark(heap, elem.id());
                }
            }
        }
        Some(Value::ScopeCollection(scopes)) => {
            for &scope_id in scopes {
                mark(heap, scope_id);
            }
        }
        Some(Value::Scope(entries)) => {
            for &(k, v) in entries {
                mark(heap, k);
                mark(heap, v);
            }
        }
        Some(Value::Closure {
            body,
            param,
            captured,
        }) => {
            mark(heap, *body);
            if let Some(param) = param {
                mark(heap, *param);
            }
            mark(heap, *captured);
        }
        Some(Value::Null | Value::Number(_) | Value::String(_) | Value::Variable(_)) | None => {}
    }
}

//! Scope and ScopeCollection operations: linear-scan, structural-equality
//! key lookup, and the lexical variable-chain walk built on top of it.

use rill_par::value::Value;
use rill_par::Heap;
use rill_util::{Fatal, HeapId, Result};

use crate::equal::values_equal;

fn expect_scope<'h>(heap: &'h Heap, id: HeapId) -> Result<&'h Vec<(HeapId, HeapId)>> {
    match heap.get(id) {
        Some(Value::Scope(entries)) => Ok(entries),
        Some(other) => Err(Fatal::TypeMismatch(format!(
            "expected a scope, found {}",
            other.kind_name()
        ))),
        None => Err(Fatal::Message("dangling heap id".into())),
    }
}

fn expect_scope_mut<'h>(heap: &'h mut Heap, id: HeapId) -> Result<&'h mut Vec<(HeapId, HeapId)>> {
    match heap.get_mut(id) {
        Some(Value::Scope(entries)) => Ok(entries),
        Some(other) => Err(Fatal::TypeMismatch(format!(
            "expected a scope, found {}",
            other.kind_name()
        ))),
        None => Err(Fatal::Message("dangling heap id".into())),
    }
}

fn expect_collection<'h>(heap: &'h Heap, id: HeapId) -> Result<&'h Vec<HeapId>> {
    match heap.get(id) {
        Some(Value::ScopeCollection(scopes)) => Ok(scopes),
        Some(other) => Err(Fatal::TypeMismatch(format!(
            "expected a scope collection, found {}",
            other.kind_name()
        ))),
        None => Err(Fatal::Message("dangling heap id".into())),
    }
}

fn expect_collection_mut<'h>(heap: &'h mut Heap, id: HeapId) -> Result<&'h mut Vec<HeapId>> {
    match heap.get_mut(id) {
        Some(Value::ScopeCollection(scopes)) => Ok(scopes),
        Some(other) => Err(Fatal::TypeMismatch(format!(
            "expected a scope collection, found {}",
            other.kind_name()
        ))),
        None => Err(Fatal::Message("dangling heap id".into())),
    }
}

pub fn collection_scopes<'h>(heap: &'h Heap, id: HeapId) -> Result<&'h Vec<HeapId>> {
    expect_collection(heap, id)
}

fn find_index(heap: &Heap, scope_id: HeapId, key: HeapId) -> Result<Option<usize>> {
    let entries = expect_scope(heap, scope_id)?;
    Ok(entries.iter().position(|(k, _)| values_equal(heap, *k, key)))
}

/// Linear-scan lookup by structural equality. Returns the bound value, if
/// any mapping under `key` exists.
pub fn get(heap: &Heap, scope_id: HeapId, key: HeapId) -> Result<Option<HeapId>> {
    let entries = expect_scope(heap, scope_id)?;
    Ok(entries
        .iter()
        .find(|(k, _)| values_equal(heap, *k, key))
        .map(|(_, v)| *v))
}

pub fn has(heap: &Heap, scope_id: HeapId, key: HeapId) -> Result<bool> {
    Ok(get(heap, scope_id, key)?.is_some())
}

/// Updates the existing mapping in place if `key` is already present, else
/// appends a new one.
pub fn set(heap: &mut Heap, scope_id: HeapId, key: HeapId, value: HeapId) -> Result<()> {
    let idx = find_index(heap, scope_id, key)?;
    let entries = expect_scope_mut(heap, scope_id)?;
    match idx {
        Some(i) => entries[i].1 = value,
        None => entries.push((key, value)),
    }
    Ok(())
}

/// Removes at most one mapping, shifting later entries back. Returns whether
/// a mapping was removed.
pub fn delete(heap: &mut Heap, scope_id: HeapId, key: HeapId) -> Result<bool> {
    let idx = find_index(heap, scope_id, key)?;
    let entries = expect_scope_mut(heap, scope_id)?;
    match idx {
        Some(i) => {
            entries.remove(i);
            Ok(true)
        }
        None => Ok(false),
    }
}

/// Pushes a fresh, empty Scope onto the collection and returns its id.
pub fn push_scope(heap: &mut Heap, collection_id: HeapId) -> Result<HeapId> {
    let scope_id = heap.insert(Value::Scope(Vec::new()));
    let scopes = expect_collection_mut(heap, collection_id)?;
    scopes.push(scope_id);
    Ok(scope_id)
}

/// Pops the innermost Scope off the collection and returns it.
pub fn pop_scope(heap: &mut Heap, collection_id: HeapId) -> Result<HeapId> {
    let scopes = expect_collection_mut(heap, collection_id)?;
    scopes
        .pop()
        .ok_or_else(|| Fatal::Message("popped an empty scope collection".into()))
}

fn key_matches_name(heap: &Heap, key: HeapId, name: &[u8]) -> bool {
    match heap.get(key) {
        Some(Value::Variable(bytes)) | Some(Value::String(bytes)) => bytes == name,
        _ => false,
    }
}

/// Searches the collection's Scopes innermost-to-outermost for a binding
/// whose key is a Variable or String matching `name`.
pub fn lookup_variable(heap: &Heap, collection_id: HeapId, name: &[u8]) -> Result<Option<HeapId>> {
    let scopes = expect_collection(heap, collection_id)?.clone();
    for &scope_id in scopes.iter().rev() {
        let entries = expect_scope(heap, scope_id)?;
        if let Some((_, v)) = entries.iter().find(|(k, _)| key_matches_name(heap, *k, name)) {
            return Ok(Some(*v));
        }
    }
    Ok(None)
}

/// Implements both `let` (`local_only = true`: innermost scope only) and
/// `set`/`input` (`local_only = false`: nearest enclosing scope that
/// already binds `key`, else the innermost).
pub fn set_variable(
    heap: &mut Heap,
    collection_id: HeapId,
    key: HeapId,
    value: HeapId,
    local_only: bool,
) -> Result<()> {
    let scopes = expect_collection(heap, collection_id)?.clone();
    let innermost = *scopes
        .last()
        .ok_or_else(|| Fatal::Message("empty scope collection".into()))?;
    if local_only {
        return set(heap, innermost, key, value);
    }
    for &scope_id in scopes.iter().rev() {
        if has(heap, scope_id, key)? {
            return set(heap, scope_id, key, value);
        }
    }
    set(heap, innermost, key, value)
}

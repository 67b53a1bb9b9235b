//! Non-literal and literal printers. `print`/`whoops` use the non-literal
//! form at top level; anything nested inside a printed Scope's entries
//! always renders literally, so it reads back as a valid source value.

use rill_lex::NumberLit;
use rill_par::value::Value;
use rill_par::Heap;
use rill_util::{Fatal, HeapId, Result};

const INDENT: &str = "    ";

/// The printer `print`/`whoops` apply to each of their top-level arguments:
/// a String prints as raw bytes, everything else as the literal form.
pub fn render_nonliteral(heap: &Heap, id: HeapId) -> Result<String> {
    match heap.get(id) {
        Some(Value::String(bytes)) => Ok(String::from_utf8_lossy(bytes).into_owned()),
        _ => render(heap, id, 0),
    }
}

fn render(heap: &Heap, id: HeapId, depth: usize) -> Result<String> {
    match heap.get(id) {
        Some(Value::Null) => Ok("?".to_string()),
        Some(Value::Number(NumberLit::Int(n))) => Ok(n.to_string()),
        Some(Value::Number(NumberLit::Float(f))) => Ok(format!("{f}")),
        Some(Value::String(bytes)) => Ok(quote_string(bytes)),
        Some(Value::Variable(bytes)) => Ok(String::from_utf8_lossy(bytes).into_owned()),
        Some(Value::Scope(entries)) => render_scope(heap, entries, depth),
        Some(Value::Closure { .. }) => Ok("<closure>".to_string()),
        Some(Value::Operation { .. }) => Ok("<operation>".to_string()),
        Some(Value::Sequence(_)) => Ok("<sequence>".to_string()),
        Some(Value::ScopeCollection(_)) => Ok("<scope-collection>".to_string()),
        None => Err(Fatal::Message("dangling heap id".into())),
    }
}

fn render_scope(heap: &Heap, entries: &[(HeapId, HeapId)], depth: usize) -> Result<String> {
    let entry_indent = INDENT.repeat(depth + 1);
    let closing_indent = INDENT.repeat(depth);
    let mut out = String::from("{\n");
    for (k, v) in entries {
        let key = render_key(heap, *k)?;
        let value = render(heap, *v, depth + 1)?;
        out.push_str(&format!("{entry_indent}let {key} {value};\n"));
    }
    out.push_str(&closing_indent);
    out.push('}');
    Ok(out)
}

fn render_key(heap: &Heap, id: HeapId) -> Result<String> {
    match heap.get(id) {
        Some(Value::Variable(bytes)) | Some(Value::String(bytes)) => {
            Ok(String::from_utf8_lossy(bytes).into_owned())
        }
        Some(_) => render(heap, id, 0),
        None => Err(Fatal::Message("dangling heap id".into())),
    }
}

fn quote_string(bytes: &[u8]) -> String {
    let mut out = String::from("\"");
    for &b in bytes {
        match b {
            b'"' => out.push_str("\\\""),
            b'\\' => out.push_str("\\\\"),
            b'\n' => out.push_str("\\n"),
            b'\r' => out.push_str("\\r"),
            b'\t' => out.push_str("\\t"),
            0x20..=0x7e => out.push(b as char),
            _ => out.push_str(&format!("\\x{b:02x}")),
        }
    }
    out.push('"');
    out
}

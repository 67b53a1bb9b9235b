//! The tree-walking core: the `Interpreter` state (heap, AST root, the
//! scopes_stack and call_stack GC roots) and `evaluate`, the single dispatch
//! point every node kind passes through.

use rill_lex::{NumberLit, OperatorKind};
use rill_par::value::{Statement, Value};
use rill_par::Heap;
use rill_util::{Fatal, HeapId, Result};

use crate::dispatch::{self, Flow};
use crate::{equal, gc, scope};

/// Pops `scopes_stack`/`call_stack` back to their length at construction
/// time on every exit path — including one unwound by `?` — implementing
/// the closure-call protocol's "these pops must happen on every exit path"
/// requirement via RAII instead of a manual pop at each return site.
struct StackGuard<'i> {
    interp: &'i mut Interpreter,
    scopes_len: usize,
    call_len: usize,
}

impl Drop for StackGuard<'_> {
    fn drop(&mut self) {
        self.interp.scopes_stack.truncate(self.scopes_len);
        self.interp.call_stack.truncate(self.call_len);
    }
}

/// Owns the heap tracker and the two GC-root stacks for one `execute()`
/// call. `scopes_stack` holds one ScopeCollection id per active call frame;
/// `call_stack` holds the Closure id being called at each of those frames.
pub struct Interpreter {
    pub(crate) heap: Heap,
    ast_root: HeapId,
    pub(crate) scopes_stack: Vec<HeapId>,
    pub(crate) call_stack: Vec<HeapId>,
}

impl Interpreter {
    /// Builds an interpreter over an already-parsed program, with one empty
    /// Scope in one ScopeCollection as the initial lexical frame.
    pub fn new(mut heap: Heap, ast_root: HeapId) -> Self {
        let initial_scope = heap.insert(Value::Scope(Vec::new()));
        let initial_collection = heap.insert(Value::ScopeCollection(vec![initial_scope]));
        Self {
            heap,
            ast_root,
            scopes_stack: vec![initial_collection],
            call_stack: Vec::new(),
        }
    }

    /// Evaluates the top-level program, running the collector after each of
    /// its direct statements and once more, with no roots but the AST
    /// itself, at the end.
    pub fn run(&mut self) -> Result<HeapId> {
        let statements = match self.heap.get(self.ast_root) {
            Some(Value::Sequence(statements)) => statements.clone(),
            _ => return Err(Fatal::Message("AST root is not a top-level sequence".into())),
        };
        let collection = self.current_collection();
        let scope_id = scope::push_scope(&mut self.heap, collection)?;
        let mut result = scope_id;
        for stmt in &statements {
            let flow = dispatch::dispatch_statement(self, stmt)?;
            self.collect_garbage();
            if let Flow::Return(value) = flow {
                result = value;
                break;
            }
        }
        scope::pop_scope(&mut self.heap, collection)?;
        gc::collect(&mut self.heap, self.ast_root, &[], &[]);
        Ok(result)
    }

    /// Evaluates a single AST node directly, bypassing `run()`'s top-level
    /// program wrapper and its GC cadence. Useful for embedding a lone
    /// expression, or for tests that want the resulting value without the
    /// final collection discarding it.
    pub fn evaluate_node(&mut self, id: HeapId) -> Result<HeapId> {
        self.evaluate(id)
    }

    /// Read-only access to the heap, for inspecting values an embedder
    /// obtained from [`Interpreter::evaluate_node`] or [`Interpreter::run`].
    pub fn heap(&self) -> &Heap {
        &self.heap
    }

    /// Looks up `name` directly in a Scope value, e.g. one `evaluate_node`
    /// returned for a top-level program. Bypasses variable lookup's
    /// undefined-variable error, for embedders that just want a binding.
    pub fn get_in_scope(&mut self, scope_id: HeapId, name: &[u8]) -> Result<Option<HeapId>> {
        let key = self.heap.insert(Value::Variable(name.to_vec()));
        scope::get(&self.heap, scope_id, key)
    }

    pub(crate) fn current_collection(&self) -> HeapId {
        *self
            .scopes_stack
            .last()
            .expect("scopes_stack always holds at least the initial frame")
    }

    pub(crate) fn collect_garbage(&mut self) {
        gc::collect(&mut self.heap, self.ast_root, &self.scopes_stack, &self.call_stack);
    }

    pub(crate) fn is_truthy(&self, id: HeapId) -> bool {
        self.heap.get(id).map(|v| v.is_truthy()).unwrap_or(false)
    }

    pub(crate) fn require_scope(&self, id: HeapId) -> Result<()> {
        match self.heap.get(id) {
            Some(Value::Scope(_)) => Ok(()),
            Some(other) => Err(Fatal::TypeMismatch(format!(
                "expected a scope, found {}",
                other.kind_name()
            ))),
            None => Err(Fatal::Message("dangling heap id".into())),
        }
    }

    fn describe_key(&self, key: HeapId) -> String {
        match self.heap.get(key) {
            Some(Value::Variable(name)) | Some(Value::String(name)) => {
                String::from_utf8_lossy(name).into_owned()
            }
            Some(other) => format!("<{}>", other.kind_name()),
            None => "<dangling>".into(),
        }
    }

    /// The single dispatch point every node kind passes through.
    pub(crate) fn evaluate(&mut self, id: HeapId) -> Result<HeapId> {
        let value = self
            .heap
            .get(id)
            .cloned()
            .ok_or_else(|| Fatal::Message("dangling heap id".into()))?;
        tracing::trace!(kind = value.kind_name(), "evaluating node");
        match value {
            Value::Null
            | Value::Number(_)
            | Value::String(_)
            | Value::Scope(_)
            | Value::Closure { .. }
            | Value::ScopeCollection(_) => Ok(id),
            Value::Variable(name) => {
                let collection = self.current_collection();
                scope::lookup_variable(&self.heap, collection, &name)?.ok_or_else(|| {
                    Fatal::UndefinedVariable {
                        name: String::from_utf8_lossy(&name).into_owned(),
                    }
                })
            }
            Value::Sequence(statements) => self.eval_sequence(&statements),
            Value::Operation { op, a, b } => self.eval_operation(op, a, b),
        }
    }

    fn eval_sequence(&mut self, statements: &[Statement]) -> Result<HeapId> {
        let collection = self.current_collection();
        let scope_id = scope::push_scope(&mut self.heap, collection)?;
        let mut result = scope_id;
        for stmt in statements {
            if let Flow::Return(value) = dispatch::dispatch_statement(self, stmt)? {
                result = value;
                break;
            }
        }
        scope::pop_scope(&mut self.heap, collection)?;
        Ok(result)
    }

    fn eval_operation(&mut self, op: OperatorKind, a: Option<HeapId>, b: Option<HeapId>) -> Result<HeapId> {
        let (a_id, b_id) = match (a, b) {
            (Some(a), Some(b)) => (a, b),
            _ => return Err(Fatal::Message("operator missing an operand after parsing".into())),
        };
        match op {
            OperatorKind::Closure => self.eval_closure_operator(a_id, b_id),
            OperatorKind::Access => self.eval_access(a_id, b_id),
            OperatorKind::Application => {
                let av = self.evaluate(a_id)?;
                let bv = self.evaluate(b_id)?;
                self.apply(av, bv)
            }
            OperatorKind::Eq | OperatorKind::Ne => {
                let av = self.evaluate(a_id)?;
                let bv = self.evaluate(b_id)?;
                let eq = equal::values_equal(&self.heap, av, bv);
                let truth = if op == OperatorKind::Eq { eq } else { !eq };
                Ok(self.heap.insert(Value::Number(NumberLit::Int(truth as i64))))
            }
            OperatorKind::SubL | OperatorKind::SubR => {
                let av = self.evaluate(a_id)?;
                let bv = self.evaluate(b_id)?;
                self.eval_substring(op, av, bv)
            }
            OperatorKind::Shl
            | OperatorKind::Shr
            | OperatorKind::BitAnd
            | OperatorKind::BitXor
            | OperatorKind::BitOr => {
                let av = self.evaluate(a_id)?;
                let bv = self.evaluate(b_id)?;
                self.eval_bitwise(op, av, bv)
            }
            OperatorKind::Add
            | OperatorKind::Sub
            | OperatorKind::Mul
            | OperatorKind::Div
            | OperatorKind::Mod
            | OperatorKind::Pow
            | OperatorKind::Lt
            | OperatorKind::Gt
            | OperatorKind::Le
            | OperatorKind::Ge => {
                let av = self.evaluate(a_id)?;
                let bv = self.evaluate(b_id)?;
                self.eval_arith(op, av, bv)
            }
        }
    }

    fn eval_closure_operator(&mut self, a_id: HeapId, b_id: HeapId) -> Result<HeapId> {
        let collection = self.current_collection();
        let captured = self.shallow_copy_collection(collection)?;
        let param = match self.heap.get(a_id) {
            Some(Value::Null) => None,
            _ => Some(a_id),
        };
        Ok(self.heap.insert(Value::Closure {
            body: b_id,
            param,
            captured,
        }))
    }

    fn eval_access(&mut self, a_id: HeapId, b_id: HeapId) -> Result<HeapId> {
        let scope_val = self.evaluate(a_id)?;
        self.require_scope(scope_val)?;
        scope::get(&self.heap, scope_val, b_id)?
            .ok_or_else(|| Fatal::MissingScopeKey { key: self.describe_key(b_id) })
    }

    fn shallow_copy_collection(&mut self, collection_id: HeapId) -> Result<HeapId> {
        let scopes = scope::collection_scopes(&self.heap, collection_id)?.clone();
        Ok(self.heap.insert(Value::ScopeCollection(scopes)))
    }

    fn apply(&mut self, av: HeapId, bv: HeapId) -> Result<HeapId> {
        match self.heap.get(av).cloned() {
            Some(Value::Scope(_)) => scope::get(&self.heap, av, bv)?
                .ok_or_else(|| Fatal::MissingScopeKey { key: self.describe_key(bv) }),
            Some(Value::Closure { body, param, captured }) => {
                self.call_closure(av, body, param, captured, bv)
            }
            Some(Value::String(sa)) => match self.heap.get(bv) {
                Some(Value::String(sb)) => {
                    let mut combined = sa.clone();
                    combined.extend_from_slice(sb);
                    Ok(self.heap.insert(Value::String(combined)))
                }
                Some(other) => Err(Fatal::TypeMismatch(format!(
                    "cannot apply a string to a {}",
                    other.kind_name()
                ))),
                None => Err(Fatal::Message("dangling heap id".into())),
            },
            Some(other) => Err(Fatal::TypeMismatch(format!(
                "cannot apply a {}",
                other.kind_name()
            ))),
            None => Err(Fatal::Message("dangling heap id".into())),
        }
    }

    /// The closure-call protocol of 4.3.3: shallow-copy the captured
    /// ScopeCollection, bind the parameter (if any) in a fresh Scope atop
    /// it, push both GC roots, evaluate the body, and pop both roots again
    /// on every exit path via `StackGuard`.
    fn call_closure(
        &mut self,
        closure_id: HeapId,
        body: HeapId,
        param: Option<HeapId>,
        captured: HeapId,
        arg: HeapId,
    ) -> Result<HeapId> {
        let new_collection = self.shallow_copy_collection(captured)?;
        if let Some(param_id) = param {
            let scope_id = scope::push_scope(&mut self.heap, new_collection)?;
            scope::set(&mut self.heap, scope_id, param_id, arg)?;
        }
        let scopes_len = self.scopes_stack.len();
        let call_len = self.call_stack.len();
        self.scopes_stack.push(new_collection);
        self.call_stack.push(closure_id);
        tracing::debug!(depth = self.call_stack.len(), "entering closure call");
        let guard = StackGuard {
            interp: self,
            scopes_len,
            call_len,
        };
        let result = guard.interp.evaluate(body);
        tracing::debug!("exiting closure call");
        result
    }

    fn number_of(&self, id: HeapId) -> Result<NumberLit> {
        match self.heap.get(id) {
            Some(Value::Number(n)) => Ok(*n),
            Some(other) => Err(Fatal::TypeMismatch(format!(
                "expected a number, found {}",
                other.kind_name()
            ))),
            None => Err(Fatal::Message("dangling heap id".into())),
        }
    }

    fn int_of(&self, id: HeapId) -> Result<i64> {
        match self.number_of(id)? {
            NumberLit::Int(i) => Ok(i),
            NumberLit::Float(_) => Err(Fatal::TypeMismatch(
                "this operator requires integer operands".into(),
            )),
        }
    }

    fn eval_arith(&mut self, op: OperatorKind, av: HeapId, bv: HeapId) -> Result<HeapId> {
        let a = self.number_of(av)?;
        let b = self.number_of(bv)?;
        use OperatorKind::*;
        let result = match op {
            Add | Sub | Mul => match (a, b) {
                (NumberLit::Int(x), NumberLit::Int(y)) => NumberLit::Int(match op {
                    Add => x.wrapping_add(y),
                    Sub => x.wrapping_sub(y),
                    Mul => x.wrapping_mul(y),
                    _ => unreachable!(),
                }),
                _ => {
                    let (x, y) = (as_f64(a), as_f64(b));
                    NumberLit::Float(match op {
                        Add => x + y,
                        Sub => x - y,
                        Mul => x * y,
                        _ => unreachable!(),
                    })
                }
            },
            Div => match (a, b) {
                (NumberLit::Int(x), NumberLit::Int(y)) if y != 0 && x % y == 0 => {
                    NumberLit::Int(x / y)
                }
                _ => NumberLit::Float(as_f64(a) / as_f64(b)),
            },
            Mod => {
                let (NumberLit::Int(x), NumberLit::Int(y)) = (a, b) else {
                    return Err(Fatal::TypeMismatch("% requires integer operands".into()));
                };
                if y == 0 {
                    return Err(Fatal::Message("modulo by zero".into()));
                }
                NumberLit::Int(x % y)
            }
            Pow => NumberLit::Float(as_f64(a).powf(as_f64(b))),
            Lt | Gt | Le | Ge => {
                let (x, y) = (as_f64(a), as_f64(b));
                let truth = match op {
                    Lt => x < y,
                    Gt => x > y,
                    Le => x <= y,
                    Ge => x >= y,
                    _ => unreachable!(),
                };
                NumberLit::Int(truth as i64)
            }
            _ => unreachable!("eval_arith called with non-arithmetic operator {op:?}"),
        };
        Ok(self.heap.insert(Value::Number(result)))
    }

    fn eval_bitwise(&mut self, op: OperatorKind, av: HeapId, bv: HeapId) -> Result<HeapId> {
        let a = self.int_of(av)?;
        let b = self.int_of(bv)?;
        use OperatorKind::*;
        let result = match op {
            Shl => a.wrapping_shl(b as u32),
            Shr => a.wrapping_shr(b as u32),
            BitAnd => a & b,
            BitXor => a ^ b,
            BitOr => a | b,
            _ => unreachable!("eval_bitwise called with non-bitwise operator {op:?}"),
        };
        Ok(self.heap.insert(Value::Number(NumberLit::Int(result))))
    }

    fn eval_substring(&mut self, op: OperatorKind, av: HeapId, bv: HeapId) -> Result<HeapId> {
        let bytes = match self.heap.get(av) {
            Some(Value::String(b)) => b.clone(),
            Some(other) => {
                return Err(Fatal::TypeMismatch(format!(
                    "expected a string, found {}",
                    other.kind_name()
                )))
            }
            None => return Err(Fatal::Message("dangling heap id".into())),
        };
        let n = self.int_of(bv)?;
        if n < 0 {
            return Err(Fatal::TypeMismatch(
                "substring index must be non-negative".into(),
            ));
        }
        let n = n as usize;
        let result = match op {
            OperatorKind::SubL => bytes[..n.min(bytes.len())].to_vec(),
            OperatorKind::SubR => {
                if n >= bytes.len() {
                    Vec::new()
                } else {
                    bytes[n..].to_vec()
                }
            }
            _ => unreachable!("eval_substring called with non-substring operator {op:?}"),
        };
        Ok(self.heap.insert(Value::String(result)))
    }
}

fn as_f64(n: NumberLit) -> f64 {
    match n {
        NumberLit::Int(i) => i as f64,
        NumberLit::Float(f) => f,
    }
}

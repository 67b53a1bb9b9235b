//! The tagged-union `Value` every AST node and every runtime value is made
//! of, and the heap arena that tracks them.
//!
//! Unlike a conventional interpreter, this language's AST *is* its runtime
//! value representation: a parsed `Operation` node and a closure built while
//! evaluating one live in the same [`Heap`], addressed the same way, subject
//! to the same collector. The parser is what first populates the heap, so
//! the type lives here rather than in `rill-eval`.

use rill_lex::{NumberLit, OperatorKind};
use rill_util::{Arena, HeapId};

/// One element of a statement's token run, after the command name.
///
/// The sequence builder never folds a statement's tail through the
/// precedence resolver the way the expression builder folds bracket
/// content — it only resolves brackets/braces into single elements as it
/// meets them, exactly as the source's statement builder does. Whether a
/// run of bare elements between groups should later be folded into one
/// value (`print 1 + 2 * 3;`) or kept apart (`do (print i) (set i i+1);`)
/// depends on which built-in command is dispatching, so the distinction
/// between "a bare token" and "a parenthesized/braced group" has to survive
/// into `rill-eval` rather than being erased at parse time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StmtElem {
    /// A single un-grouped token: a literal, a variable, or a still-unbound
    /// operator waiting for the resolver.
    Token(HeapId),
    /// A `(...)` or `{...}` group, already fully resolved by the expression
    /// or sequence builder.
    Group(HeapId),
}

impl StmtElem {
    pub fn id(self) -> HeapId {
        match self {
            StmtElem::Token(id) | StmtElem::Group(id) => id,
        }
    }
}

/// A statement's head (command name) plus its raw, ungrouped tail.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub command: HeapId,
    pub tail: Vec<StmtElem>,
}

/// The tagged union underlying every AST node and every runtime value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Number(NumberLit),
    /// May contain arbitrary bytes, including embedded NULs.
    String(Vec<u8>),
    /// An identifier: a variable reference before evaluation, a bound name
    /// after.
    Variable(Vec<u8>),
    /// A binary operator node. `a`/`b` are `None` only transiently, while the
    /// precedence resolver is still wiring the tree together.
    Operation {
        op: OperatorKind,
        a: Option<HeapId>,
        b: Option<HeapId>,
    },
    /// A `{ ... }` block: an ordered list of statements.
    Sequence(Vec<Statement>),
    /// An ordered key/value mapping, compared and looked up structurally
    /// (§ structural equality), never by a derived hash.
    Scope(Vec<(HeapId, HeapId)>),
    /// A stack of `Scope`s forming a lexical lookup chain, innermost last.
    ScopeCollection(Vec<HeapId>),
    /// A first-class callable: a body expression, an optional parameter
    /// name, and the scope chain snapshot captured at construction time.
    Closure {
        body: HeapId,
        param: Option<HeapId>,
        captured: HeapId,
    },
}

impl Value {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Variable(_) => "variable",
            Value::Operation { .. } => "operation",
            Value::Sequence(_) => "sequence",
            Value::Scope(_) => "scope",
            Value::ScopeCollection(_) => "scope-collection",
            Value::Closure { .. } => "closure",
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Number(NumberLit::Int(n)) => *n != 0,
            Value::Number(NumberLit::Float(f)) => *f != 0.0,
            Value::String(bytes) => !bytes.is_empty(),
            // Every other kind is truthy by presence, matching the source's
            // "anything not Null/zero is true" rule.
            _ => true,
        }
    }
}

/// The heap: every `Value` ever constructed is registered here exactly once.
pub type Heap = Arena<Value>;

/// The closed set of built-in statement-form names, shared by the parser
/// (which uses it only to decide whether a parenthesized tail group should
/// be parsed as a nested statement rather than a plain expression — see
/// [`crate::parser`]) and `rill-eval`'s statement dispatch (which is the
/// component that actually knows what each one does).
pub const RESERVED_COMMANDS: &[&str] = &[
    "do", "return", "print", "whoops", "input", "readfile", "writefile", "if", "while", "let",
    "set", "mut", "edit",
];

pub fn is_reserved_command(name: &[u8]) -> bool {
    RESERVED_COMMANDS.iter().any(|c| c.as_bytes() == name)
}

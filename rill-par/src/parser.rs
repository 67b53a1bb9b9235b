//! Sequence and expression builders: the two mutually recursive passes that
//! turn a flat token stream into a tree of [`Value`]s on the heap.
//!
//! The split mirrors the source directly: a brace always opens a *sequence*
//! of statements, a bracket always opens an *expression*. Only the
//! expression builder folds its content through the precedence resolver —
//! a statement's tail is kept as a raw, ungrouped run of elements (see
//! [`StmtElem`]), because which parts of it get folded together depends on
//! which built-in command is dispatching, a decision `rill-eval` makes, not
//! the parser.

use rill_lex::{Token, TokenKind};
use rill_util::{Fatal, HeapId, Result};

use crate::precedence;
use crate::value::{is_reserved_command, Heap, Statement, StmtElem, Value};

/// A shared position into the token stream, advanced by both builders as
/// they recurse into each other.
struct TokenCursor<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> TokenCursor<'a> {
    fn new(tokens: &'a [Token]) -> Self {
        Self { tokens, pos: 0 }
    }

    fn peek(&self) -> Option<&'a TokenKind> {
        self.tokens.get(self.pos).map(|t| &t.kind)
    }

    fn advance(&mut self) -> Option<&'a Token> {
        let tok = self.tokens.get(self.pos);
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn at_closing_brace(&self) -> bool {
        matches!(self.peek(), Some(TokenKind::Brace { closing: true }))
    }

    fn at_closing_bracket(&self) -> bool {
        matches!(self.peek(), Some(TokenKind::Bracket { closing: true }))
    }
}

/// Parses a whole program: a top-level sequence with no enclosing braces,
/// terminated by end of input rather than a closing brace.
pub fn parse_program(tokens: &[Token], heap: &mut Heap) -> Result<HeapId> {
    let mut cursor = TokenCursor::new(tokens);
    let statements = parse_sequence(&mut cursor, heap)?;
    if !cursor.is_at_end() {
        return Err(Fatal::Parse(
            "unexpected closing brace at top level".into(),
        ));
    }
    Ok(heap.insert(Value::Sequence(statements)))
}

/// Builds one bare-token value: a literal, a variable, or a still-unbound
/// operator node.
fn build_token(tok: &Token) -> Result<Value> {
    Ok(match &tok.kind {
        TokenKind::Null => Value::Null,
        TokenKind::Number(n) => Value::Number(*n),
        TokenKind::String(bytes) => Value::String(bytes.clone()),
        TokenKind::Variable(bytes) => Value::Variable(bytes.clone()),
        TokenKind::Operation(op) => Value::Operation {
            op: *op,
            a: None,
            b: None,
        },
        other => {
            return Err(Fatal::Parse(format!(
                "unexpected token in this position: {other:?}"
            )))
        }
    })
}

/// Consumes statements until a (not-consumed) closing brace or end of input.
fn parse_sequence(cursor: &mut TokenCursor<'_>, heap: &mut Heap) -> Result<Vec<Statement>> {
    let mut statements = Vec::new();
    while !cursor.is_at_end() && !cursor.at_closing_brace() {
        statements.push(parse_statement(cursor, heap)?);
    }
    Ok(statements)
}

fn parse_statement(cursor: &mut TokenCursor<'_>, heap: &mut Heap) -> Result<Statement> {
    let head = cursor
        .advance()
        .ok_or_else(|| Fatal::Parse("expected a statement, found end of input".into()))?;
    let command = match &head.kind {
        TokenKind::Variable(name) => heap.insert(Value::Variable(name.clone())),
        other => {
            return Err(Fatal::Parse(format!(
                "a statement must start with a command name, found {other:?}"
            )))
        }
    };

    let mut tail = Vec::new();
    loop {
        match cursor.peek() {
            None | Some(TokenKind::Brace { closing: true }) => break,
            Some(TokenKind::Terminator) => {
                cursor.advance();
                break;
            }
            Some(TokenKind::Bracket { closing: false }) => {
                cursor.advance();
                let id = parse_bracket_group(cursor, heap)?;
                tail.push(StmtElem::Group(id));
            }
            Some(TokenKind::Brace { closing: false }) => {
                cursor.advance();
                let inner = parse_sequence(cursor, heap)?;
                expect_closing_brace(cursor)?;
                let id = heap.insert(Value::Sequence(inner));
                tail.push(StmtElem::Group(id));
            }
            Some(TokenKind::Bracket { closing: true }) => {
                return Err(Fatal::Parse("unmatched closing bracket".into()));
            }
            Some(_) => {
                let tok = cursor.advance().expect("peeked Some above");
                let value = build_token(tok)?;
                tail.push(StmtElem::Token(heap.insert(value)));
            }
        }
    }

    Ok(Statement { command, tail })
}

/// Whether the token right after an already-consumed opening bracket is a
/// bare variable naming a built-in command — the signal that this group
/// should be parsed as a nested statement rather than a plain expression.
fn at_reserved_command_head(cursor: &TokenCursor<'_>) -> bool {
    matches!(cursor.peek(), Some(TokenKind::Variable(name)) if is_reserved_command(name))
}

/// Parses the content of a `(...)` group, after its opening bracket has
/// already been consumed, and consumes the matching closing bracket itself.
///
/// Ordinarily this is a plain expression. But a statement like
/// `do (print i) (set i i + 1);` needs its two parenthesized actions to run
/// as statements, not as a juxtaposition expression that happens to be built
/// out of undefined variables named `print` and `set` — so a group whose
/// first token is a reserved command name is parsed as a single nested
/// statement instead, wrapped as a one-statement `Sequence` (which evaluates
/// exactly like any other block: push a scope, run the statement, pop it).
fn parse_bracket_group(cursor: &mut TokenCursor<'_>, heap: &mut Heap) -> Result<HeapId> {
    if at_reserved_command_head(cursor) {
        let stmt = parse_bracket_statement(cursor, heap)?;
        expect_closing_bracket(cursor)?;
        Ok(heap.insert(Value::Sequence(vec![stmt])))
    } else {
        let id = parse_expression(cursor, heap)?;
        expect_closing_bracket(cursor)?;
        Ok(id)
    }
}

/// Like [`parse_statement`], but for a nested statement written without its
/// own terminator inside a bracket group: its tail ends at the group's
/// closing bracket instead of at a `;`.
fn parse_bracket_statement(cursor: &mut TokenCursor<'_>, heap: &mut Heap) -> Result<Statement> {
    let head = cursor.advance().expect("caller confirmed a command head");
    let command = match &head.kind {
        TokenKind::Variable(name) => heap.insert(Value::Variable(name.clone())),
        other => unreachable!("caller confirmed a Variable head, found {other:?}"),
    };

    let mut tail = Vec::new();
    loop {
        match cursor.peek() {
            None => {
                return Err(Fatal::Parse(
                    "unterminated nested statement: missing closing bracket".into(),
                ))
            }
            Some(TokenKind::Bracket { closing: true }) => break,
            Some(TokenKind::Terminator) => {
                cursor.advance();
                break;
            }
            Some(TokenKind::Bracket { closing: false }) => {
                cursor.advance();
                let id = parse_bracket_group(cursor, heap)?;
                tail.push(StmtElem::Group(id));
            }
            Some(TokenKind::Brace { closing: false }) => {
                cursor.advance();
                let inner = parse_sequence(cursor, heap)?;
                expect_closing_brace(cursor)?;
                tail.push(StmtElem::Group(heap.insert(Value::Sequence(inner))));
            }
            Some(TokenKind::Brace { closing: true }) => {
                return Err(Fatal::Parse(
                    "unexpected closing brace inside a nested statement".into(),
                ))
            }
            Some(_) => {
                let tok = cursor.advance().expect("peeked Some above");
                let value = build_token(tok)?;
                tail.push(StmtElem::Token(heap.insert(value)));
            }
        }
    }

    Ok(Statement { command, tail })
}

/// Consumes a flat run of operand/operator elements until a (not-consumed)
/// closing bracket, then folds it with the precedence resolver.
fn parse_expression(cursor: &mut TokenCursor<'_>, heap: &mut Heap) -> Result<HeapId> {
    let mut elements = Vec::new();
    loop {
        match cursor.peek() {
            None => {
                return Err(Fatal::Parse(
                    "unterminated expression: missing closing bracket".into(),
                ))
            }
            Some(TokenKind::Bracket { closing: true }) => break,
            Some(TokenKind::Terminator) => {
                return Err(Fatal::Parse(
                    "unexpected statement terminator inside an expression".into(),
                ))
            }
            Some(TokenKind::Bracket { closing: false }) => {
                cursor.advance();
                let id = parse_bracket_group(cursor, heap)?;
                elements.push(id);
            }
            Some(TokenKind::Brace { closing: false }) => {
                cursor.advance();
                let inner = parse_sequence(cursor, heap)?;
                expect_closing_brace(cursor)?;
                elements.push(heap.insert(Value::Sequence(inner)));
            }
            Some(TokenKind::Brace { closing: true }) => {
                return Err(Fatal::Parse(
                    "unexpected closing brace inside an expression".into(),
                ))
            }
            Some(_) => {
                let tok = cursor.advance().expect("peeked Some above");
                let value = build_token(tok)?;
                elements.push(heap.insert(value));
            }
        }
    }
    precedence::resolve(heap, &elements)
}

fn expect_closing_bracket(cursor: &mut TokenCursor<'_>) -> Result<()> {
    if cursor.at_closing_bracket() {
        cursor.advance();
        Ok(())
    } else {
        Err(Fatal::Parse("expected a closing bracket".into()))
    }
}

fn expect_closing_brace(cursor: &mut TokenCursor<'_>) -> Result<()> {
    if cursor.at_closing_brace() {
        cursor.advance();
        Ok(())
    } else {
        Err(Fatal::Parse("expected a closing brace".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rill_lex::Lexer;

    fn parse_src(src: &str) -> (Heap, HeapId) {
        let mut heap = Heap::new();
        let tokens = Lexer::lex_all(src).unwrap();
        let root = parse_program(&tokens, &mut heap).unwrap();
        (heap, root)
    }

    fn root_statements(heap: &Heap, root: HeapId) -> Vec<Statement> {
        match heap.get(root).unwrap() {
            Value::Sequence(stmts) => stmts.clone(),
            other => panic!("expected Sequence, got {other:?}"),
        }
    }

    #[test]
    fn parses_single_statement_with_bare_tail() {
        let (heap, root) = parse_src("print 1 + 2 * 3;");
        let stmts = root_statements(&heap, root);
        assert_eq!(stmts.len(), 1);
        match heap.get(stmts[0].command).unwrap() {
            Value::Variable(name) => assert_eq!(name, b"print"),
            other => panic!("expected Variable, got {other:?}"),
        }
        assert_eq!(stmts[0].tail.len(), 5);
        assert!(stmts[0]
            .tail
            .iter()
            .all(|e| matches!(e, StmtElem::Token(_))));
    }

    #[test]
    fn bracket_groups_become_single_tail_elements() {
        let (heap, root) = parse_src("do (print i) (set i i + 1);");
        let stmts = root_statements(&heap, root);
        assert_eq!(stmts.len(), 1);
        assert_eq!(stmts[0].tail.len(), 2);
        assert!(stmts[0]
            .tail
            .iter()
            .all(|e| matches!(e, StmtElem::Group(_))));
    }

    #[test]
    fn reserved_command_head_in_brackets_becomes_nested_statement() {
        let (heap, root) = parse_src("do (print i) (set i i + 1);");
        let stmts = root_statements(&heap, root);
        let StmtElem::Group(first) = stmts[0].tail[0] else {
            panic!("expected Group")
        };
        match heap.get(first).unwrap() {
            Value::Sequence(inner) => {
                assert_eq!(inner.len(), 1);
                match heap.get(inner[0].command).unwrap() {
                    Value::Variable(name) => assert_eq!(name, b"print"),
                    other => panic!("expected Variable, got {other:?}"),
                }
                assert_eq!(inner[0].tail.len(), 1);
            }
            other => panic!("expected nested Sequence, got {other:?}"),
        }

        let StmtElem::Group(second) = stmts[0].tail[1] else {
            panic!("expected Group")
        };
        match heap.get(second).unwrap() {
            Value::Sequence(inner) => {
                assert_eq!(inner.len(), 1);
                match heap.get(inner[0].command).unwrap() {
                    Value::Variable(name) => assert_eq!(name, b"set"),
                    other => panic!("expected Variable, got {other:?}"),
                }
                // raw tail: i, i, +, 1 — four un-grouped elements.
                assert_eq!(inner[0].tail.len(), 4);
            }
            other => panic!("expected nested Sequence, got {other:?}"),
        }
    }

    #[test]
    fn plain_bracket_expression_is_not_mistaken_for_a_statement() {
        // `f` is not a reserved command, so `(f 5)` is an ordinary
        // application expression, not a nested statement.
        let (heap, root) = parse_src("print (f 5);");
        let stmts = root_statements(&heap, root);
        match &stmts[0].tail[0] {
            StmtElem::Group(id) => match heap.get(*id).unwrap() {
                Value::Operation {
                    op: rill_lex::OperatorKind::Application,
                    ..
                } => {}
                other => panic!("expected Application, got {other:?}"),
            },
            other => panic!("expected Group, got {other:?}"),
        }
    }

    #[test]
    fn brace_body_becomes_a_sequence_group() {
        let (heap, root) = parse_src("while (i < 3) { print i; };");
        let stmts = root_statements(&heap, root);
        assert_eq!(stmts.len(), 1);
        assert_eq!(stmts[0].tail.len(), 2);
        match &stmts[0].tail[1] {
            StmtElem::Group(id) => match heap.get(*id).unwrap() {
                Value::Sequence(inner) => assert_eq!(inner.len(), 1),
                other => panic!("expected nested Sequence, got {other:?}"),
            },
            other => panic!("expected Group, got {other:?}"),
        }
    }

    #[test]
    fn expression_inside_brackets_is_folded() {
        let (heap, root) = parse_src("let x (1 + 2 * 3);");
        let stmts = root_statements(&heap, root);
        match &stmts[0].tail[1] {
            StmtElem::Group(id) => match heap.get(*id).unwrap() {
                Value::Operation {
                    op: rill_lex::OperatorKind::Add,
                    ..
                } => {}
                other => panic!("expected folded Add at root, got {other:?}"),
            },
            other => panic!("expected Group, got {other:?}"),
        }
    }

    #[test]
    fn missing_terminator_before_eof_is_still_accepted() {
        let (heap, root) = parse_src("print 1");
        let stmts = root_statements(&heap, root);
        assert_eq!(stmts.len(), 1);
        assert_eq!(stmts[0].tail.len(), 1);
    }

    #[test]
    fn unmatched_closing_bracket_is_a_parse_error() {
        let tokens = Lexer::lex_all("print 1);").unwrap();
        let mut heap = Heap::new();
        assert!(matches!(
            parse_program(&tokens, &mut heap),
            Err(Fatal::Parse(_))
        ));
    }
}

//! Token kinds produced by the lexer.

use rill_util::Span;

/// The operator carried by an `Operation`-kind token. Precedence is not a
/// property of the token itself — `rill-par` owns the precedence table — but
/// the tag produced here is what that table is keyed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorKind {
    Access,
    Pow,
    Mul,
    Div,
    Mod,
    Add,
    Sub,
    Shl,
    Shr,
    SubL,
    SubR,
    Lt,
    Gt,
    Le,
    Ge,
    Eq,
    Ne,
    BitAnd,
    BitXor,
    BitOr,
    Closure,
    /// The default tag for juxtaposition-application, and the fallback for
    /// any operator-character run that doesn't match a known operator.
    Application,
}

impl OperatorKind {
    /// Resolves the text of an `Operation` token to its tag. Unrecognized
    /// text falls back to [`OperatorKind::Application`] rather than erroring
    /// — juxtaposition-application uses the same tag, so an unmatched run of
    /// operator characters is treated the same way two adjacent non-operator
    /// values would be.
    pub fn from_text(text: &[u8]) -> OperatorKind {
        match text {
            b"." => OperatorKind::Access,
            b"**" => OperatorKind::Pow,
            b"*" => OperatorKind::Mul,
            b"/" => OperatorKind::Div,
            b"%" => OperatorKind::Mod,
            b"+" => OperatorKind::Add,
            b"-" => OperatorKind::Sub,
            b"<<" => OperatorKind::Shl,
            b">>" => OperatorKind::Shr,
            b"</" => OperatorKind::SubL,
            b">/" => OperatorKind::SubR,
            b"<" => OperatorKind::Lt,
            b">" => OperatorKind::Gt,
            b"<=" => OperatorKind::Le,
            b">=" => OperatorKind::Ge,
            b"==" => OperatorKind::Eq,
            b"!=" => OperatorKind::Ne,
            b"&" => OperatorKind::BitAnd,
            b"^" => OperatorKind::BitXor,
            b"|" => OperatorKind::BitOr,
            b"=>" => OperatorKind::Closure,
            _ => OperatorKind::Application,
        }
    }
}

/// A numeric literal, either an integer or a double, decided at lex time by
/// the presence of a decimal point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NumberLit {
    Int(i64),
    Float(f64),
}

/// The payload-bearing kind of a token.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Null,
    Number(NumberLit),
    /// A string literal's decoded bytes (escapes already resolved).
    String(Vec<u8>),
    Variable(Vec<u8>),
    Operation(OperatorKind),
    /// `true` for a closing bracket.
    Bracket { closing: bool },
    /// `true` for a closing brace.
    Brace { closing: bool },
    Terminator,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }
}

//! The lexer: source bytes in, a stream of [`Token`]s out.
//!
//! The classification table and the escaped/in_string/comment flag state
//! machine below follow the same character-class boundaries a from-scratch
//! lexer for this language always ends up with: whitespace and the three
//! bracket-like characters are boundaries, everything else accumulates into
//! the current token until its provisional class changes.
//!
//! A single input byte can complete two tokens at once — for example `;`
//! flushes whatever token preceded it *and* is itself a complete
//! `Terminator` token — so finished tokens are pushed onto a small queue
//! and [`Iterator::next`] drains that queue before reading more input.

use std::collections::VecDeque;

use rill_util::{Fatal, Result, Span};

use crate::cursor::Cursor;
use crate::token::{NumberLit, OperatorKind, Token, TokenKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Provisional {
    Terminator,
    BracketOpen,
    BracketClose,
    BraceOpen,
    BraceClose,
    Null,
    Number,
    Operation,
    Variable,
}

fn is_boundary_kind(kind: Provisional) -> bool {
    matches!(
        kind,
        Provisional::Terminator
            | Provisional::BracketOpen
            | Provisional::BracketClose
            | Provisional::BraceOpen
            | Provisional::BraceClose
            | Provisional::Null
    )
}

/// Turns source text into tokens, one [`Token`] per call to [`Iterator::next`].
pub struct Lexer<'a> {
    cursor: Cursor<'a>,
    in_string: bool,
    in_comment: bool,
    escaped: bool,
    current_kind: Option<Provisional>,
    current_bytes: Vec<u8>,
    current_start: usize,
    current_line: u32,
    current_column: u32,
    ready: VecDeque<Token>,
    pending_error: Option<Fatal>,
    finished: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            cursor: Cursor::new(source.as_bytes()),
            in_string: false,
            in_comment: false,
            escaped: false,
            current_kind: None,
            current_bytes: Vec::new(),
            current_start: 0,
            current_line: 1,
            current_column: 1,
            ready: VecDeque::new(),
            pending_error: None,
            finished: false,
        }
    }

    /// Lexes the whole source in one pass, matching the `rill-drv`
    /// `--dump-tokens` code path and the property tests in `rill-par`.
    pub fn lex_all(source: &str) -> Result<Vec<Token>> {
        let mut lexer = Lexer::new(source);
        let mut tokens = Vec::new();
        while let Some(token) = lexer.next() {
            tokens.push(token);
        }
        if let Some(err) = lexer.pending_error.take() {
            return Err(err);
        }
        Ok(tokens)
    }

    fn classify(&self, byte: u8, next: Option<u8>) -> Provisional {
        match byte {
            b';' => Provisional::Terminator,
            b'(' => Provisional::BracketOpen,
            b')' => Provisional::BracketClose,
            b'{' => Provisional::BraceOpen,
            b'}' => Provisional::BraceClose,
            b'?' => Provisional::Null,
            b'.' => {
                if self.current_kind == Some(Provisional::Number) {
                    Provisional::Number
                } else {
                    Provisional::Operation
                }
            }
            b'-' => {
                if next.map_or(false, |b| b.is_ascii_digit()) {
                    Provisional::Number
                } else {
                    Provisional::Operation
                }
            }
            b'0'..=b'9' => {
                if self.current_kind == Some(Provisional::Variable) {
                    Provisional::Variable
                } else {
                    Provisional::Number
                }
            }
            b'+' | b'*' | b'/' | b'%' | b'=' | b'<' | b'>' | b'&' | b'|' | b'^' | b'!' | b'$' => {
                Provisional::Operation
            }
            _ => Provisional::Variable,
        }
    }

    /// Marks the start of a fresh accumulating token at the cursor's current
    /// position, before the triggering byte has been appended.
    fn begin(&mut self, kind: Provisional) {
        self.current_kind = Some(kind);
        self.current_bytes.clear();
        self.current_start = self.cursor.position();
        self.current_line = self.cursor.line();
        self.current_column = self.cursor.column();
    }

    fn span(&self) -> Span {
        Span::new(
            self.current_start,
            self.cursor.position(),
            self.current_line,
            self.current_column,
        )
    }

    /// Closes out whatever token is currently accumulating, if any, and
    /// queues it for emission.
    fn flush(&mut self) {
        let Some(kind) = self.current_kind.take() else {
            return;
        };
        let span = self.span();
        let bytes = std::mem::take(&mut self.current_bytes);
        let token_kind = match kind {
            Provisional::Terminator => TokenKind::Terminator,
            Provisional::BracketOpen => TokenKind::Bracket { closing: false },
            Provisional::BracketClose => TokenKind::Bracket { closing: true },
            Provisional::BraceOpen => TokenKind::Brace { closing: false },
            Provisional::BraceClose => TokenKind::Brace { closing: true },
            Provisional::Null => TokenKind::Null,
            Provisional::Variable => TokenKind::Variable(bytes),
            Provisional::Operation => TokenKind::Operation(OperatorKind::from_text(&bytes)),
            Provisional::Number => match parse_number(&bytes) {
                Ok(n) => TokenKind::Number(n),
                Err(e) => {
                    self.pending_error.get_or_insert(e);
                    return;
                }
            },
        };
        tracing::trace!(?token_kind, ?span, "lexed token");
        self.ready.push_back(Token::new(token_kind, span));
    }

    fn flush_string(&mut self) {
        let span = self.span();
        let bytes = std::mem::take(&mut self.current_bytes);
        self.current_kind = None;
        tracing::trace!(?span, "lexed string token");
        self.ready
            .push_back(Token::new(TokenKind::String(bytes), span));
    }

    /// Advances the state machine by exactly one input byte (or one `\xHH`
    /// escape, which consumes up to three), queueing any tokens it completes.
    fn step(&mut self) {
        let byte = self.cursor.current().expect("step called at end of input");

        if self.in_comment {
            self.cursor.advance();
            if byte == b'#' {
                self.in_comment = false;
            }
            return;
        }

        if self.in_string {
            if self.escaped {
                self.escaped = false;
                if byte == b'x' {
                    self.cursor.advance();
                    let hi = self.cursor.current();
                    if hi.is_some() {
                        self.cursor.advance();
                    }
                    let lo = self.cursor.current();
                    if lo.is_some() {
                        self.cursor.advance();
                    }
                    let value = (hi.map(hex_digit).unwrap_or(0) << 4) | lo.map(hex_digit).unwrap_or(0);
                    self.current_bytes.push(value);
                    return;
                }
                let resolved = match byte {
                    b'n' => b'\n',
                    b'r' => b'\r',
                    b't' => b'\t',
                    other => other,
                };
                self.current_bytes.push(resolved);
                self.cursor.advance();
                return;
            }
            if byte == b'\\' {
                self.escaped = true;
                self.cursor.advance();
                return;
            }
            if byte == b'"' {
                self.cursor.advance();
                self.in_string = false;
                self.flush_string();
                return;
            }
            self.current_bytes.push(byte);
            self.cursor.advance();
            return;
        }

        if self.escaped {
            self.escaped = false;
            if self.current_kind != Some(Provisional::Variable) {
                self.flush();
                self.begin(Provisional::Variable);
            }
            self.current_bytes.push(byte);
            self.cursor.advance();
            return;
        }

        if byte == b'\\' {
            self.escaped = true;
            self.cursor.advance();
            return;
        }

        if byte == b'#' {
            self.flush();
            self.in_comment = true;
            self.cursor.advance();
            return;
        }

        if byte == b'"' {
            self.flush();
            self.in_string = true;
            self.current_bytes.clear();
            self.current_start = self.cursor.position();
            self.current_line = self.cursor.line();
            self.current_column = self.cursor.column();
            self.cursor.advance();
            return;
        }

        if matches!(byte, b' ' | b'\t' | b'\r' | b'\n') {
            self.flush();
            self.cursor.advance();
            return;
        }

        let next_byte = self.cursor.peek(1);
        let provisional = self.classify(byte, next_byte);

        if Some(provisional) == self.current_kind && !is_boundary_kind(provisional) {
            self.current_bytes.push(byte);
            self.cursor.advance();
            return;
        }

        self.flush();
        self.begin(provisional);
        if !is_boundary_kind(provisional) {
            self.current_bytes.push(byte);
        }
        self.cursor.advance();
        if is_boundary_kind(provisional) {
            self.flush();
        }
    }

}

fn hex_digit(byte: u8) -> u8 {
    match byte {
        b'0'..=b'9' => byte - b'0',
        b'a'..=b'f' => byte - b'a' + 10,
        b'A'..=b'F' => byte - b'A' + 10,
        _ => 0,
    }
}

fn parse_number(bytes: &[u8]) -> Result<NumberLit> {
    let text = std::str::from_utf8(bytes)
        .map_err(|_| Fatal::Lex("number literal was not valid UTF-8".into()))?;
    if text.contains('.') {
        text.parse::<f64>()
            .map(NumberLit::Float)
            .map_err(|_| Fatal::Lex(format!("invalid number literal: {text}")))
    } else {
        text.parse::<i64>()
            .map(NumberLit::Int)
            .map_err(|_| Fatal::Lex(format!("invalid number literal: {text}")))
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        loop {
            if let Some(token) = self.ready.pop_front() {
                return Some(token);
            }
            if self.finished || self.pending_error.is_some() {
                return None;
            }
            if self.cursor.is_at_end() {
                self.finished = true;
                if self.in_string {
                    self.pending_error = Some(Fatal::Lex("unterminated string literal".into()));
                    return None;
                }
                self.flush();
                continue;
            }
            self.step();
        }
    }
}

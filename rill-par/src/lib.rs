//! Parser for the `rill` scripting language.
//!
//! Turns a token stream into a tree of heap-resident [`value::Value`]s. This
//! crate also owns the `Value` type and its heap arena (see
//! [`value`]'s module doc for why), since the parser is what first populates
//! it.

pub mod parser;
pub mod precedence;
pub mod value;

pub use parser::parse_program;
pub use value::{Heap, Statement, StmtElem, Value};

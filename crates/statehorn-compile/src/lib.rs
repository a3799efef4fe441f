#![cfg_attr(docsrs, feature(doc_cfg))]

//! # statehorn-compile
//!
//! A hand-written lexer and recursive-descent parser for statehorn's
//! textual protocol-description format (`spec.md` §6.1): `limit`, `init`,
//! and `query leak` directives, plus `rule` declarations with optional
//! guards and either stateless, state-consistent, or state-transferring
//! results.
//!
//! # Design Principles
//!
//! No parser-combinator crate: the grammar is small, line-oriented, and
//! benefits more from precise, hand-tracked source positions than from
//! combinator composability. [`compile`] never aborts on the first error —
//! it recovers to the next statement boundary and keeps going, so a single
//! file reports every diagnostic it can in one pass.

mod error;
mod lexer;
mod parser;

pub use error::ParseError;
pub use lexer::{Keyword, Lexer, Spanned, Token};
pub use parser::{compile, CompiledProgram};

//! The core of an LALR(1) parser generator.
//!
//! Given a declarative [`Specification`], [`compile`] validates it, builds
//! the augmented grammar, constructs the LR(0) automaton, resolves
//! conflicts by precedence, narrows the table to SLR(1) and then LALR(1)
//! via DeRemer–Pennello look-ahead sets, and emits a deterministic parse
//! table together with the residual-conflict diagnosis. The
//! [`charset`](crate::charset) module carries the interval-tree character
//! sets consumed by the companion lexer generator.

pub mod backend;
pub mod charset;
pub mod compile;
pub mod diagnostics;
pub mod digraph;
pub mod follow;
pub mod grammar;
pub mod lalr;
pub mod lr0;
pub mod precompile;
pub mod spec;
pub mod table;
pub mod types;

mod util;

pub use crate::{
    charset::CharSet,
    compile::{compile, CompileFailure, CompileOutput, ProcessedSpec},
    spec::Specification,
};

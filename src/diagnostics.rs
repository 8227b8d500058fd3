//! Compile-time diagnostics.
//!
//! Grammar problems are values, not panics: validators push onto a
//! diagnostic list and always run their phase to completion. Errors abort
//! the pipeline between phases; warnings are carried through to the result.

/// The broad classification of an [`Error`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Duplicate, conflicting or missing declarations.
    Declaration,
    /// Use of an undeclared symbol.
    Reference,
    /// Problems in the `%prec` / associativity tables.
    Precedence,
    /// The grammar itself is beyond LALR(1) repair.
    Grammar,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("terminal `{name}` redeclared with a different type")]
    TerminalTypeConflict { name: String },

    #[error("`{name}` is declared as both a terminal and a nonterminal")]
    SymbolKindConflict { name: String },

    #[error("duplicate production group for nonterminal `{name}`")]
    DuplicateProductionGroup { name: String },

    #[error("%type declaration applied to terminal `{name}`")]
    TypeOnTerminal { name: String },

    #[error("%type declaration for undeclared nonterminal `{name}`")]
    TypeOnUndeclared { name: String },

    #[error("%type for `{name}` conflicts with an earlier declaration")]
    TypeConflict { name: String },

    #[error("must declare at least one starting nonterminal")]
    NoStartSymbol,

    #[error("starting symbol `{name}` is not a declared nonterminal")]
    UndeclaredStart { name: String },

    #[error("starting nonterminal `{name}` has no %type declaration")]
    StartWithoutType { name: String },

    #[error("undeclared symbol `{symbol}` in a production for `{nonterminal}`")]
    UndeclaredSymbol { symbol: String, nonterminal: String },

    #[error("%prec `{name}` in a production for `{nonterminal}` refers to a nonterminal")]
    PrecOnNonterminal { name: String, nonterminal: String },

    #[error("Dummy terminal {name} requires associativity declaration")]
    DummyWithoutAssoc { name: String },

    #[error("associativity of `{name}` conflicts with earlier declaration")]
    AssocConflict { name: String },

    #[error("the grammar is not LR(k) for any k: cyclic reads on {trace}")]
    NotLrK { trace: String },
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        use Error::*;
        match self {
            TerminalTypeConflict { .. }
            | SymbolKindConflict { .. }
            | DuplicateProductionGroup { .. }
            | TypeOnTerminal { .. }
            | TypeOnUndeclared { .. }
            | TypeConflict { .. }
            | NoStartSymbol
            | UndeclaredStart { .. }
            | StartWithoutType { .. } => ErrorKind::Declaration,
            UndeclaredSymbol { .. } | PrecOnNonterminal { .. } => ErrorKind::Reference,
            DummyWithoutAssoc { .. } | AssocConflict { .. } => ErrorKind::Precedence,
            NotLrK { .. } => ErrorKind::Grammar,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Warning {
    #[error("terminal `{name}` redeclared with the same type")]
    TerminalRedeclared { name: String },

    #[error("%type for `{name}` repeats an earlier declaration")]
    TypeRedeclared { name: String },

    #[error("duplicate %start for `{name}`")]
    DuplicateStart { name: String },

    #[error("`{name}` listed twice in one associativity group")]
    DuplicateAssoc { name: String },

    #[error(
        "shift/reduce conflict in state {state} on `{token}` resolved as shift (dropped `{rule}`)"
    )]
    ShiftReduceResolved {
        state: u16,
        token: String,
        rule: String,
    },

    #[error(
        "reduce/reduce conflict in state {state} on `{token}` resolved as `{kept}` (dropped `{rule}`)"
    )]
    ReduceReduceResolved {
        state: u16,
        token: String,
        kept: String,
        rule: String,
    },
}

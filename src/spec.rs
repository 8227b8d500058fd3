//! The raw parser specification.
//!
//! A [`Specification`] is the record handed over by the grammar-file front
//! end: terminal and `%type` declarations, production groups with semantic
//! action bodies, the ordered associativity table and the `%start` list.
//! Identifiers are opaque strings at this level; nothing is validated until
//! [`precompile`](crate::precompile::precompile) runs.

use crate::types::Map;

/// Operator associativity, as written in the associativity table.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Assoc {
    Left,
    Right,
    Nonassoc,
}

/// One terminal declaration group: a shared optional type and its names.
#[derive(Debug, Clone)]
pub struct TerminalGroup {
    pub ty: Option<String>,
    pub names: Vec<String>,
}

/// A `%type` declaration for a nonterminal.
#[derive(Debug, Clone)]
pub struct TypeDecl {
    pub ty: String,
    pub name: String,
}

/// All alternatives declared for one nonterminal.
#[derive(Debug, Clone)]
pub struct ProductionGroup {
    pub left: String,
    pub alternatives: Vec<Alternative>,
}

/// A single right-hand side with its optional `%prec` override and the
/// opaque semantic action body.
#[derive(Debug, Clone)]
pub struct Alternative {
    pub symbols: Vec<String>,
    pub prec: Option<String>,
    pub action: String,
}

/// One `%left` / `%right` / `%nonassoc` group. Groups are ordered; the
/// earliest declared group has the lowest precedence.
#[derive(Debug, Clone)]
pub struct AssocGroup {
    pub assoc: Assoc,
    pub names: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct Specification {
    pub terminals: Vec<TerminalGroup>,
    pub types: Vec<TypeDecl>,
    pub productions: Vec<ProductionGroup>,
    pub associativities: Vec<AssocGroup>,
    pub starts: Vec<String>,
    /// Opaque to the core; forwarded to backends untouched.
    pub options: Map<String, String>,
}

impl Specification {
    /// Build a specification using the specified function.
    pub fn define<F>(f: F) -> Self
    where
        F: FnOnce(&mut Self),
    {
        let mut spec = Self::default();
        f(&mut spec);
        spec
    }

    /// Declare a group of terminals sharing one optional type.
    pub fn tokens<'a, I>(&mut self, ty: Option<&str>, names: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        self.terminals.push(TerminalGroup {
            ty: ty.map(str::to_owned),
            names: names.into_iter().map(str::to_owned).collect(),
        });
    }

    /// Declare a `%type` for a nonterminal.
    pub fn ty(&mut self, ty: &str, name: &str) {
        self.types.push(TypeDecl {
            ty: ty.to_owned(),
            name: name.to_owned(),
        });
    }

    /// Add a production. Consecutive rules for the same nonterminal join one
    /// group; a rule for a nonterminal whose group was closed earlier opens
    /// a (duplicate) second group.
    pub fn rule<'a, I>(&mut self, left: &str, symbols: I, action: &str)
    where
        I: IntoIterator<Item = &'a str>,
    {
        self.push_rule(left, symbols, None, action);
    }

    /// Add a production carrying a `%prec` override.
    pub fn rule_prec<'a, I>(&mut self, left: &str, symbols: I, prec: &str, action: &str)
    where
        I: IntoIterator<Item = &'a str>,
    {
        self.push_rule(left, symbols, Some(prec), action);
    }

    fn push_rule<'a, I>(&mut self, left: &str, symbols: I, prec: Option<&str>, action: &str)
    where
        I: IntoIterator<Item = &'a str>,
    {
        let alternative = Alternative {
            symbols: symbols.into_iter().map(str::to_owned).collect(),
            prec: prec.map(str::to_owned),
            action: action.to_owned(),
        };
        match self.productions.last_mut() {
            Some(group) if group.left == left => group.alternatives.push(alternative),
            _ => self.productions.push(ProductionGroup {
                left: left.to_owned(),
                alternatives: vec![alternative],
            }),
        }
    }

    pub fn left<'a, I>(&mut self, names: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        self.assoc_group(Assoc::Left, names);
    }

    pub fn right<'a, I>(&mut self, names: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        self.assoc_group(Assoc::Right, names);
    }

    pub fn nonassoc<'a, I>(&mut self, names: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        self.assoc_group(Assoc::Nonassoc, names);
    }

    fn assoc_group<'a, I>(&mut self, assoc: Assoc, names: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        self.associativities.push(AssocGroup {
            assoc,
            names: names.into_iter().map(str::to_owned).collect(),
        });
    }

    pub fn start(&mut self, name: &str) {
        self.starts.push(name.to_owned());
    }
}

/// Ready-made specifications used across tests and benches.
pub mod samples {
    use super::Specification;

    /// The classic ambiguous arithmetic grammar, disambiguated by the
    /// associativity table (`TIMES` binds tighter than `PLUS`).
    pub fn arithmetic() -> Specification {
        Specification::define(|s| {
            s.tokens(Some("i64"), ["NUM"]);
            s.tokens(None, ["PLUS", "TIMES", "LPAREN", "RPAREN"]);
            s.ty("i64", "E");
            s.left(["PLUS"]);
            s.left(["TIMES"]);
            s.rule("E", ["E", "PLUS", "E"], "$1 + $3");
            s.rule("E", ["E", "TIMES", "E"], "$1 * $3");
            s.rule("E", ["LPAREN", "E", "RPAREN"], "$2");
            s.rule("E", ["NUM"], "$1");
            s.start("E");
        })
    }

    /// The dangling-else grammar. No precedence is declared, so the
    /// shift/reduce conflict on `ELSE` survives to the default resolution.
    pub fn dangling_else() -> Specification {
        Specification::define(|s| {
            s.tokens(None, ["IF", "THEN", "ELSE", "X", "COND"]);
            s.ty("stmt", "S");
            s.rule("S", ["IF", "E", "THEN", "S"], "if1 $2 $4");
            s.rule("S", ["IF", "E", "THEN", "S", "ELSE", "S"], "if2 $2 $4 $6");
            s.rule("S", ["X"], "x");
            s.rule("E", ["COND"], "cond");
            s.start("S");
        })
    }

    /// Two nonterminals deriving the same terminal; reduce/reduce at end of
    /// input.
    pub fn reduce_reduce() -> Specification {
        Specification::define(|s| {
            s.tokens(None, ["X"]);
            s.ty("unit", "S");
            s.rule("S", ["A"], "a");
            s.rule("S", ["B"], "b");
            s.rule("A", ["X"], "x");
            s.rule("B", ["X"], "x");
            s.start("S");
        })
    }

    /// Unary minus borrowing precedence through a `%prec` dummy terminal.
    pub fn unary_minus() -> Specification {
        Specification::define(|s| {
            s.tokens(Some("i64"), ["NUM"]);
            s.tokens(None, ["MINUS"]);
            s.ty("i64", "E");
            s.left(["MINUS"]);
            s.right(["UMINUS"]);
            s.rule("E", ["E", "MINUS", "E"], "$1 - $3");
            s.rule_prec("E", ["MINUS", "E"], "UMINUS", "-$2");
            s.rule("E", ["NUM"], "$1");
            s.start("E");
        })
    }
}

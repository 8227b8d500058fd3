//! Grammar types.
//!
//! The augmented grammar: every user terminal and nonterminal is mapped to a
//! dense id, `$end` and `$start` are added, and one accept production
//! `$start : s $end` is created per declared starting nonterminal. Production
//! ids are the stable handles the rest of the pipeline trades in.

use crate::{
    precompile::Precompiled,
    spec::Assoc,
    types::{Map, Set},
    util::display_fn,
};
use std::fmt;

#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TerminalID(u16);

impl TerminalID {
    /// Reserved terminal that means the end of input.
    pub const EOI: Self = Self(0);
    const OFFSET: u16 = 1;

    pub const fn raw(self) -> u16 {
        self.0
    }
}

impl fmt::Debug for TerminalID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            &Self::EOI => write!(f, "T#End"),
            _ => write!(f, "T#{:03}", self.0),
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NonterminalID(u16);

impl NonterminalID {
    /// Reserved nonterminal reduced to by the accept productions.
    pub const START: Self = Self(0);
    const OFFSET: u16 = 1;
}

impl fmt::Debug for NonterminalID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            &Self::START => write!(f, "N#Start"),
            _ => write!(f, "N#{:03}", self.0),
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub enum SymbolID {
    T(TerminalID),
    N(NonterminalID),
}

impl fmt::Debug for SymbolID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::T(t) => write!(f, "{:?}", t),
            Self::N(n) => write!(f, "{:?}", n),
        }
    }
}

/// Dense production handle, stable within one compile. Accept productions
/// come first, user productions follow in declaration order.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProductionID(u16);

impl ProductionID {
    pub const fn raw(self) -> u16 {
        self.0
    }
}

impl fmt::Debug for ProductionID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P#{:03}", self.0)
    }
}

/// A precedence level paired with its associativity. Levels start at 1 and
/// higher levels bind tighter.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Precedence {
    pub level: u16,
    pub assoc: Assoc,
}

/// A set of terminals, backed by a bit set.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TerminalSet {
    inner: bit_set::BitSet,
}

impl TerminalSet {
    pub fn contains(&self, id: TerminalID) -> bool {
        self.inner.contains(id.0.into())
    }

    pub fn insert(&mut self, id: TerminalID) -> bool {
        self.inner.insert(id.0.into())
    }

    pub fn union_with(&mut self, other: &Self) {
        self.inner.union_with(&other.inner)
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = TerminalID> + '_ {
        self.inner
            .iter()
            .map(|raw| u16::try_from(raw).map(TerminalID).unwrap())
    }

    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(|f| {
            for (i, t) in self.iter().enumerate() {
                if i > 0 {
                    f.write_str(" ")?;
                }
                f.write_str(&g.terminals[&t].name)?;
            }
            Ok(())
        })
    }
}

impl FromIterator<TerminalID> for TerminalSet {
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = TerminalID>,
    {
        Self {
            inner: iter.into_iter().map(|t| t.0.into()).collect(),
        }
    }
}

impl crate::digraph::Set for TerminalSet {
    fn union_with(&mut self, other: &Self) {
        self.union_with(other)
    }
}

#[derive(Debug)]
pub struct TerminalData {
    pub name: String,
    pub ty: Option<String>,
    pub precedence: Option<Precedence>,
    /// Introduced by `%prec` only; hidden from backends.
    pub dummy: bool,
}

#[derive(Debug)]
pub struct NonterminalData {
    pub name: String,
    pub ty: Option<String>,
}

#[derive(Debug)]
pub struct Production {
    pub left: NonterminalID,
    pub right: Vec<SymbolID>,
    /// Effective precedence: the `%prec` override if present, else the
    /// precedence of the rightmost terminal on the right-hand side.
    pub precedence: Option<Precedence>,
    pub action: String,
}

impl Production {
    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(|f| {
            write!(f, "{} :", g.nonterminals[&self.left].name)?;
            if self.right.is_empty() {
                f.write_str(" ε")?;
            } else {
                for symbol in &self.right {
                    write!(f, " {}", g.symbol_name(*symbol))?;
                }
            }
            Ok(())
        })
    }
}

#[derive(Debug)]
pub struct Grammar {
    pub terminals: Map<TerminalID, TerminalData>,
    pub nonterminals: Map<NonterminalID, NonterminalData>,
    pub productions: Map<ProductionID, Production>,
    /// Production identity: `(left, right)` keys share one id.
    pub rule_ids: Map<(NonterminalID, Vec<SymbolID>), ProductionID>,
    /// Per declared start nonterminal, its accept production.
    pub starts: Vec<(NonterminalID, ProductionID)>,
    pub nullables: Set<NonterminalID>,
}

impl Grammar {
    /// Augments a validated precompilation state.
    ///
    /// Panics if the state still carries errors; `compile` checks first.
    pub fn from_precompiled(pre: &Precompiled) -> Self {
        assert!(
            pre.errors.is_empty(),
            "cannot augment a specification with errors"
        );

        let mut terminals = Map::default();
        terminals.insert(
            TerminalID::EOI,
            TerminalData {
                name: "$end".into(),
                ty: None,
                precedence: None,
                dummy: false,
            },
        );
        let mut terminal_ids = Map::<&str, TerminalID>::default();
        for (index, (name, decl)) in pre.terminals.iter().enumerate() {
            let id = TerminalID(TerminalID::OFFSET + index as u16);
            terminal_ids.insert(name, id);
            terminals.insert(
                id,
                TerminalData {
                    name: name.clone(),
                    ty: decl.ty.clone(),
                    precedence: pre.precedence.get(name).copied(),
                    dummy: decl.dummy,
                },
            );
        }

        let mut nonterminals = Map::default();
        nonterminals.insert(
            NonterminalID::START,
            NonterminalData {
                name: "$start".into(),
                ty: None,
            },
        );
        let mut nonterminal_ids = Map::<&str, NonterminalID>::default();
        for (index, (name, ty)) in pre.nonterminals.iter().enumerate() {
            let id = NonterminalID(NonterminalID::OFFSET + index as u16);
            nonterminal_ids.insert(name, id);
            nonterminals.insert(
                id,
                NonterminalData {
                    name: name.clone(),
                    ty: ty.clone(),
                },
            );
        }

        let mut productions = Map::default();
        let mut rule_ids = Map::<(NonterminalID, Vec<SymbolID>), ProductionID>::default();
        let mut push = |productions: &mut Map<ProductionID, Production>,
                        left: NonterminalID,
                        right: Vec<SymbolID>,
                        precedence: Option<Precedence>,
                        action: String| {
            if let Some(&id) = rule_ids.get(&(left, right.clone())) {
                return id;
            }
            let id = ProductionID(productions.len() as u16);
            rule_ids.insert((left, right.clone()), id);
            productions.insert(
                id,
                Production {
                    left,
                    right,
                    precedence,
                    action,
                },
            );
            id
        };

        let mut starts = Vec::with_capacity(pre.starts.len());
        for name in &pre.starts {
            let start = nonterminal_ids[name.as_str()];
            let accept = push(
                &mut productions,
                NonterminalID::START,
                vec![SymbolID::N(start), SymbolID::T(TerminalID::EOI)],
                None,
                String::new(),
            );
            starts.push((start, accept));
        }

        for (left_name, rules) in &pre.groups {
            let left = nonterminal_ids[left_name.as_str()];
            for rule in rules {
                let right: Vec<SymbolID> = rule
                    .symbols
                    .iter()
                    .map(|name| match terminal_ids.get(name.as_str()) {
                        Some(&t) => SymbolID::T(t),
                        None => SymbolID::N(nonterminal_ids[name.as_str()]),
                    })
                    .collect();
                let precedence = match &rule.prec {
                    Some(name) => terminals[&terminal_ids[name.as_str()]].precedence,
                    None => right
                        .iter()
                        .rev()
                        .find_map(|symbol| match symbol {
                            SymbolID::T(t) => Some(terminals[t].precedence),
                            SymbolID::N(_) => None,
                        })
                        .flatten(),
                };
                push(&mut productions, left, right, precedence, rule.action.clone());
            }
        }

        let mut nullables = Set::default();
        loop {
            let mut changed = false;
            for p in productions.values() {
                if p.right
                    .iter()
                    .all(|s| matches!(s, SymbolID::N(n) if nullables.contains(n)))
                {
                    changed |= nullables.insert(p.left);
                }
            }
            if !changed {
                break;
            }
        }

        Self {
            terminals,
            nonterminals,
            productions,
            rule_ids,
            starts,
            nullables,
        }
    }

    pub fn production(&self, id: ProductionID) -> &Production {
        &self.productions[&id]
    }

    pub fn symbol_name(&self, symbol: SymbolID) -> &str {
        match symbol {
            SymbolID::T(t) => &self.terminals[&t].name,
            SymbolID::N(n) => &self.nonterminals[&n].name,
        }
    }

    /// True for the productions `$start : s $end`.
    pub fn is_accept(&self, id: ProductionID) -> bool {
        self.productions[&id].left == NonterminalID::START
    }
}

impl fmt::Display for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#### terminals: ")?;
        for (i, t) in self.terminals.values().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str(&t.name)?;
        }
        write!(f, "\n#### nonterminals: ")?;
        for (i, n) in self.nonterminals.values().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str(&n.name)?;
        }
        writeln!(f, "\n#### productions:")?;
        for (id, p) in &self.productions {
            writeln!(f, "- [{:?}] {}", id, p.display(self))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{precompile::precompile, spec::samples};

    fn arithmetic() -> Grammar {
        Grammar::from_precompiled(&precompile(&samples::arithmetic()))
    }

    #[test]
    fn augmentation_adds_reserved_symbols() {
        let g = arithmetic();
        assert_eq!(g.terminals[&TerminalID::EOI].name, "$end");
        assert_eq!(g.nonterminals[&NonterminalID::START].name, "$start");
        assert_eq!(g.starts.len(), 1);
        let (start, accept) = g.starts[0];
        assert_eq!(
            g.production(accept).right,
            [SymbolID::N(start), SymbolID::T(TerminalID::EOI)]
        );
        assert!(g.is_accept(accept));
    }

    #[test]
    fn production_ids_are_dense_and_stable() {
        let g = arithmetic();
        let ids: Vec<u16> = g.productions.keys().map(|id| id.raw()).collect();
        assert_eq!(ids, (0..g.productions.len() as u16).collect::<Vec<_>>());
        // Accept production first, user rules in declaration order after it.
        assert!(g.is_accept(ProductionID(0)));
        assert_eq!(format!("{}", g.production(ProductionID(1)).display(&g)), "E : E PLUS E");
    }

    #[test]
    fn rightmost_terminal_gives_rule_precedence() {
        let g = arithmetic();
        let plus_rule = g
            .productions
            .values()
            .find(|p| format!("{}", p.display(&g)) == "E : E PLUS E")
            .unwrap();
        assert_eq!(plus_rule.precedence.unwrap().level, 1);
        let num_rule = g
            .productions
            .values()
            .find(|p| format!("{}", p.display(&g)) == "E : NUM")
            .unwrap();
        assert!(num_rule.precedence.is_none());
    }

    #[test]
    fn prec_override_wins_over_rightmost_terminal() {
        let g = Grammar::from_precompiled(&precompile(&samples::unary_minus()));
        let unary = g
            .productions
            .values()
            .find(|p| format!("{}", p.display(&g)) == "E : MINUS E")
            .unwrap();
        // MINUS is level 1; the UMINUS dummy is level 2.
        assert_eq!(unary.precedence.unwrap().level, 2);
        let dummy = g.terminals.values().find(|t| t.dummy).unwrap();
        assert_eq!(dummy.name, "UMINUS");
    }

    #[test]
    fn duplicate_rule_keys_share_an_id() {
        let spec = crate::spec::Specification::define(|s| {
            s.tokens(None, ["X"]);
            s.ty("t", "S");
            s.rule("S", ["X"], "first");
            s.rule("S", ["X"], "second");
            s.start("S");
        });
        let g = Grammar::from_precompiled(&precompile(&spec));
        // accept + one deduplicated user production
        assert_eq!(g.productions.len(), 2);
    }

    #[test]
    fn nullable_fixpoint() {
        let spec = crate::spec::Specification::define(|s| {
            s.tokens(None, ["A"]);
            s.ty("t", "S");
            s.rule("S", ["Opt", "A"], "");
            s.rule("Opt", ["Inner"], "");
            s.rule("Inner", [], "");
            s.start("S");
        });
        let g = Grammar::from_precompiled(&precompile(&spec));
        let names: Vec<&str> = g
            .nullables
            .iter()
            .map(|n| g.nonterminals[n].name.as_str())
            .collect();
        assert!(names.contains(&"Opt"));
        assert!(names.contains(&"Inner"));
        assert!(!names.contains(&"S"));
    }
}

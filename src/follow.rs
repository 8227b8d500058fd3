//! Calculation of FIRST and FOLLOW sets.

use crate::{
    grammar::{Grammar, NonterminalID, SymbolID, TerminalID, TerminalSet},
    types::Map,
};

#[derive(Debug)]
pub struct FirstSets {
    first: Map<NonterminalID, TerminalSet>,
}

impl FirstSets {
    pub fn new(g: &Grammar) -> Self {
        let mut first: Map<NonterminalID, TerminalSet> = g
            .nonterminals
            .keys()
            .map(|&n| (n, TerminalSet::default()))
            .collect();

        loop {
            let mut changed = false;
            for p in g.productions.values() {
                let mut addition = TerminalSet::default();
                for symbol in &p.right {
                    match symbol {
                        SymbolID::T(t) => {
                            addition.insert(*t);
                            break;
                        }
                        SymbolID::N(n) => {
                            addition.union_with(&first[n]);
                            if !g.nullables.contains(n) {
                                break;
                            }
                        }
                    }
                }
                let slot = &mut first[&p.left];
                let before = slot.len();
                slot.union_with(&addition);
                changed |= slot.len() != before;
            }
            if !changed {
                break;
            }
        }

        Self { first }
    }

    pub fn get(&self, n: NonterminalID) -> &TerminalSet {
        &self.first[&n]
    }

    /// `FIRST(symbols)` together with whether the whole string is nullable.
    pub fn of_symbols(&self, g: &Grammar, symbols: &[SymbolID]) -> (TerminalSet, bool) {
        let mut set = TerminalSet::default();
        for symbol in symbols {
            match symbol {
                SymbolID::T(t) => {
                    set.insert(*t);
                    return (set, false);
                }
                SymbolID::N(n) => {
                    set.union_with(&self.first[n]);
                    if !g.nullables.contains(n) {
                        return (set, false);
                    }
                }
            }
        }
        (set, true)
    }
}

#[derive(Debug)]
pub struct FollowSets {
    follow: Map<NonterminalID, TerminalSet>,
}

impl FollowSets {
    pub fn new(g: &Grammar, first: &FirstSets) -> Self {
        let mut follow: Map<NonterminalID, TerminalSet> = g
            .nonterminals
            .keys()
            .map(|&n| (n, TerminalSet::default()))
            .collect();
        follow[&NonterminalID::START].insert(TerminalID::EOI);

        loop {
            let mut changed = false;
            for p in g.productions.values() {
                for (i, symbol) in p.right.iter().enumerate() {
                    let b = match symbol {
                        SymbolID::N(b) => *b,
                        SymbolID::T(_) => continue,
                    };
                    let (mut addition, rest_nullable) = first.of_symbols(g, &p.right[i + 1..]);
                    if rest_nullable {
                        addition.union_with(&follow[&p.left]);
                    }
                    let slot = &mut follow[&b];
                    let before = slot.len();
                    slot.union_with(&addition);
                    changed |= slot.len() != before;
                }
            }
            if !changed {
                break;
            }
        }

        Self { follow }
    }

    pub fn get(&self, n: NonterminalID) -> &TerminalSet {
        &self.follow[&n]
    }
}

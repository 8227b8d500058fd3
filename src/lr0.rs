//! LR(0) automaton construction.

use crate::{
    grammar::{Grammar, NonterminalID, ProductionID, SymbolID, TerminalID},
    types::{Map, Set},
    util::display_fn,
};
use std::{collections::VecDeque, fmt};

#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateID(u16);

impl StateID {
    pub const fn raw(self) -> u16 {
        self.0
    }
}

impl fmt::Debug for StateID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S#{:03}", self.0)
    }
}

/// An LR(0) item: a production with a dot position.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LrItem {
    pub production: ProductionID,
    pub index: u16,
}

impl LrItem {
    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(|f| {
            let production = g.production(self.production);
            write!(f, "{} -> [", g.nonterminals[&production.left].name)?;
            for (i, symbol) in production.right.iter().enumerate() {
                if i == self.index as usize {
                    f.write_str(" .")?;
                }
                write!(f, " {}", g.symbol_name(*symbol))?;
            }
            if production.right.len() == self.index as usize {
                f.write_str(" .")?;
            }
            f.write_str(" ]")
        })
    }
}

#[derive(Debug, Clone)]
pub struct LrState {
    pub kernels: Vec<LrItem>,
    pub shifts: Map<TerminalID, StateID>,
    pub gotos: Map<NonterminalID, StateID>,
    pub reduces: Set<ProductionID>,
    /// The state holds `$start : s . $end`; the end of input is accepted
    /// here instead of shifted.
    pub accepting: bool,
}

impl LrState {
    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(|f| {
            writeln!(f, "## kernels:")?;
            for kernel in &self.kernels {
                writeln!(f, "- {}", kernel.display(g))?;
            }
            if !self.shifts.is_empty() {
                writeln!(f, "## shifts:")?;
                for (t, to) in &self.shifts {
                    writeln!(f, "- {} => {:?}", g.terminals[t].name, to)?;
                }
            }
            if !self.gotos.is_empty() {
                writeln!(f, "## gotos:")?;
                for (n, to) in &self.gotos {
                    writeln!(f, "- {} => {:?}", g.nonterminals[n].name, to)?;
                }
            }
            if !self.reduces.is_empty() {
                writeln!(f, "## reduces:")?;
                for reduce in &self.reduces {
                    writeln!(f, "- {}", g.production(*reduce).display(g))?;
                }
            }
            if self.accepting {
                writeln!(f, "## accepts on {}", g.terminals[&TerminalID::EOI].name)?;
            }
            Ok(())
        })
    }
}

#[derive(Debug)]
pub struct Automaton {
    pub states: Map<StateID, LrState>,
    /// Initial state of each declared start nonterminal.
    pub entries: Map<NonterminalID, StateID>,
}

/// Calculate the LR(0) automaton based on the specified grammar.
///
/// States are numbered breadth-first in discovery order; the initial states
/// of the start nonterminals come first, in declaration order.
pub fn automaton(g: &Grammar) -> Automaton {
    let nonkernels = nonkernels(g);

    let mut states = Map::<StateID, LrState>::default();
    let mut state_id = {
        let mut next_state_id = 0;
        move || {
            let id = StateID(next_state_id);
            next_state_id += 1;
            id
        }
    };

    let mut pending_states = VecDeque::<(StateID, Vec<LrItem>)>::new();
    let mut isocores = Map::<Vec<LrItem>, StateID>::default();
    let mut entries = Map::default();
    for &(start, accept) in &g.starts {
        let kernel = vec![LrItem {
            production: accept,
            index: 0,
        }];
        let id = state_id();
        isocores.insert(kernel.clone(), id);
        entries.insert(start, id);
        pending_states.push_back((id, kernel));
    }

    let mut items = Set::default();
    let mut new_kernels = Map::<SymbolID, Set<LrItem>>::default();
    while let Some((current, kernels)) = pending_states.pop_front() {
        items.clear();
        for kernel in &kernels {
            items.insert(*kernel);
            let production = g.production(kernel.production);
            if let Some(SymbolID::N(n)) = production.right.get::<usize>(kernel.index.into()) {
                items.extend(&nonkernels[n]);
            }
        }

        let mut reduces = Set::default();
        let mut accepting = false;
        new_kernels.clear();
        for item in items.drain(..) {
            let production = g.production(item.production);
            match production.right.get::<usize>(item.index.into()) {
                // $end appears in accept productions only; accept instead
                // of shifting into a dead state.
                Some(SymbolID::T(TerminalID::EOI)) => {
                    accepting = true;
                }
                Some(sym) => {
                    let new_kernel = new_kernels.entry(*sym).or_default();
                    new_kernel.insert(LrItem {
                        index: item.index + 1,
                        ..item
                    });
                }
                None => {
                    reduces.insert(item.production);
                }
            }
        }

        let mut shifts = Map::default();
        let mut gotos = Map::default();
        for (sym, new_kernel) in new_kernels.drain(..) {
            let mut new_kernel: Vec<_> = new_kernel.into_iter().collect();
            new_kernel.sort();
            let next = match isocores.get(&new_kernel) {
                Some(id) => *id,
                None => {
                    let id = state_id();
                    isocores.insert(new_kernel.clone(), id);
                    pending_states.push_back((id, new_kernel));
                    id
                }
            };
            match sym {
                SymbolID::T(t) => {
                    shifts.insert(t, next);
                }
                SymbolID::N(n) => {
                    gotos.insert(n, next);
                }
            }
        }

        states.insert(
            current,
            LrState {
                kernels,
                shifts,
                gotos,
                reduces,
                accepting,
            },
        );
    }

    tracing::debug!(states = states.len(), "constructed LR(0) automaton");
    Automaton { states, entries }
}

// Closure items [B -> . γ] per nonterminal, computed once up front.
fn nonkernels(g: &Grammar) -> Map<NonterminalID, Set<LrItem>> {
    let mut nonkernels: Map<NonterminalID, Set<LrItem>> = Map::default();
    for &n in g.nonterminals.keys() {
        let mut items = Set::default();
        for (id, p) in &g.productions {
            if p.left != n {
                continue;
            }
            items.insert(LrItem {
                production: *id,
                index: 0,
            });
        }

        let mut added = Set::default();
        loop {
            added.clear();
            for item in &items {
                let production = g.production(item.production);
                if let Some(SymbolID::N(n)) = production.right.first() {
                    for (id, p) in &g.productions {
                        if p.left != *n {
                            continue;
                        }
                        added.insert(LrItem {
                            production: *id,
                            index: 0,
                        });
                    }
                }
            }

            let changed = added
                .drain(..)
                .fold(false, |changed, item| changed | items.insert(item));
            if !changed {
                break;
            }
        }
        nonkernels.insert(n, items);
    }
    nonkernels
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{precompile::precompile, spec::samples};

    fn build(spec: &crate::spec::Specification) -> (Grammar, Automaton) {
        let g = Grammar::from_precompiled(&precompile(spec));
        let automaton = automaton(&g);
        (g, automaton)
    }

    #[test]
    fn entry_states_come_first() {
        let (g, automaton) = build(&samples::arithmetic());
        let (start, _) = g.starts[0];
        assert_eq!(automaton.entries[&start].raw(), 0);
    }

    #[test]
    fn every_transition_target_exists() {
        let (_, automaton) = build(&samples::arithmetic());
        for state in automaton.states.values() {
            for to in state.shifts.values().chain(state.gotos.values()) {
                assert!(automaton.states.contains_key(to));
            }
        }
    }

    #[test]
    fn accepting_state_is_not_a_shift_target_of_eoi() {
        let (_, automaton) = build(&samples::arithmetic());
        assert!(automaton.states.values().any(|s| s.accepting));
        for state in automaton.states.values() {
            assert!(!state.shifts.contains_key(&TerminalID::EOI));
        }
    }

    #[test]
    fn construction_is_deterministic() {
        let (g1, a) = build(&samples::dangling_else());
        let (g2, b) = build(&samples::dangling_else());
        assert_eq!(format!("{}", g1), format!("{}", g2));
        assert_eq!(a.states.len(), b.states.len());
        for (id, state) in &a.states {
            let mirror = &b.states[id];
            assert_eq!(
                format!("{}", state.display(&g1)),
                format!("{}", mirror.display(&g2))
            );
        }
    }

    #[test]
    fn closure_reaches_nested_nonterminals() {
        let (g, automaton) = build(&samples::reduce_reduce());
        // The initial state closes over S, A and B, so shifting X leads to a
        // state reducing both A -> X and B -> X.
        let initial = &automaton.states[&StateID(0)];
        let x_target = initial.shifts.values().next().copied().unwrap();
        let reduce_state = &automaton.states[&x_target];
        assert_eq!(reduce_state.reduces.len(), 2);
    }
}

//! LALR(1) look-ahead sets computation.
//!
//! The algorithm is DeRemer and Pennello's\[1\]: the Read sets are the
//! digraph closure of the direct-read sets over the `reads` relation, the
//! Follow sets are the digraph closure of the Read sets over the `includes`
//! relation, and the look-ahead set of a reduction is the union of the
//! Follow sets of its `lookback` transitions.
//!
//! \[1\]: DeRemer and Pennello, Efficient Computation of LALR(1) Look-Ahead
//!       Sets <https://dl.acm.org/doi/10.1145/69622.357187>

use crate::{
    diagnostics::Error,
    digraph::digraph,
    grammar::{Grammar, NonterminalID, ProductionID, SymbolID, TerminalID, TerminalSet},
    lr0::{Automaton, StateID},
    types::{Map, Set},
};
use std::fmt;

/// A nonterminal transition of the GOTO graph.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct Goto {
    pub from: StateID,
    pub symbol: NonterminalID,
}

impl fmt::Debug for Goto {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:?},{:?})", self.from, self.symbol)
    }
}

/// A reduction site: the production is complete in the state.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct Reduce {
    pub state: StateID,
    pub production: ProductionID,
}

impl fmt::Debug for Reduce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:?},{:?})", self.state, self.production)
    }
}

#[derive(Debug)]
pub struct LookaheadSets {
    lookaheads: Map<Reduce, TerminalSet>,
}

impl LookaheadSets {
    pub fn contains(&self, state: StateID, production: ProductionID, token: TerminalID) -> bool {
        self.lookaheads
            .get(&Reduce { state, production })
            .map_or(false, |la| la.contains(token))
    }

    pub fn get(&self, state: StateID, production: ProductionID) -> Option<&TerminalSet> {
        self.lookaheads.get(&Reduce { state, production })
    }
}

/// Compute the look-ahead sets of all reductions in the automaton.
///
/// Fails when the `reads` relation has a non-trivial strongly connected
/// component with a non-empty Read set, which proves the grammar is not
/// LR(k) for any k.
pub fn lookahead_sets(g: &Grammar, lr0: &Automaton) -> Result<LookaheadSets, Error> {
    // Goto transitions and their direct-read sets:
    //   DR(p,A) := { t | ACTION(goto(p,A), t) shifts or accepts }
    let mut gotos = Set::<Goto>::default();
    let mut read_sets = Map::<Goto, TerminalSet>::default();
    for (&from, state) in &lr0.states {
        for (&symbol, &to) in &state.gotos {
            let key = Goto { from, symbol };
            let target = &lr0.states[&to];
            let mut dr: TerminalSet = target.shifts.keys().copied().collect();
            if target.accepting {
                dr.insert(TerminalID::EOI);
            }
            gotos.insert(key);
            read_sets.insert(key, dr);
        }
    }

    // (p,A) reads (r,C)  <=>  p --(A)--> r --(C)--> and C =>* ε
    let mut reads = Map::<Goto, Set<Goto>>::default();
    for key in &gotos {
        let r = lr0.states[&key.from].gotos[&key.symbol];
        let successors: Set<Goto> = lr0.states[&r]
            .gotos
            .keys()
            .filter(|c| g.nullables.contains(*c))
            .map(|&c| Goto { from: r, symbol: c })
            .collect();
        if !successors.is_empty() {
            reads.insert(*key, successors);
        }
    }

    let components = digraph(&mut read_sets, &reads);
    for component in &components {
        if !read_sets[&component[0]].is_empty() {
            let trace = component
                .iter()
                .map(|t| format!("({:?} on {})", t.from, g.nonterminals[&t.symbol].name))
                .collect::<Vec<_>>()
                .join(", ");
            return Err(Error::NotLrK { trace });
        }
    }

    // (s,A) includes (p',B)  <=>  B -> β A γ, γ =>* ε, p' --(β)--> s
    //
    // Walk each production of B from every state that gotos on B; at each
    // nonterminal position with a nullable tail, the transition taken there
    // includes (p',B).
    let mut includes = Map::<Goto, Set<Goto>>::default();
    for b_key in &gotos {
        for p in g.productions.values() {
            if p.left != b_key.symbol {
                continue;
            }
            let mut current = b_key.from;
            for (i, symbol) in p.right.iter().enumerate() {
                if let SymbolID::N(a) = symbol {
                    let tail_nullable = p.right[i + 1..]
                        .iter()
                        .all(|s| matches!(s, SymbolID::N(n) if g.nullables.contains(n)));
                    if tail_nullable && lr0.states[&current].gotos.contains_key(a) {
                        includes
                            .entry(Goto {
                                from: current,
                                symbol: *a,
                            })
                            .or_default()
                            .insert(*b_key);
                    }
                }
                let next = match symbol {
                    SymbolID::T(t) => lr0.states[&current].shifts.get(t),
                    SymbolID::N(n) => lr0.states[&current].gotos.get(n),
                };
                match next {
                    Some(&next) => current = next,
                    None => break,
                }
            }
        }
    }

    // Follow(p,A) = Read(p,A) ∪ ⋃ { Follow(p',B) | (p,A) includes+ (p',B) }
    let mut follow_sets = read_sets;
    digraph(&mut follow_sets, &includes);

    // (q, A->ω) lookback (p,A)  <=>  p --(ω)--> q
    let mut lookbacks = Map::<Reduce, Set<Goto>>::default();
    for &from in lr0.states.keys() {
        for (&production, p) in &g.productions {
            if g.is_accept(production) || !lr0.states[&from].gotos.contains_key(&p.left) {
                continue;
            }
            let mut current = from;
            let mut complete = true;
            for symbol in &p.right {
                let next = match symbol {
                    SymbolID::T(t) => lr0.states[&current].shifts.get(t),
                    SymbolID::N(n) => lr0.states[&current].gotos.get(n),
                };
                match next {
                    Some(&next) => current = next,
                    None => {
                        complete = false;
                        break;
                    }
                }
            }
            if complete {
                lookbacks
                    .entry(Reduce {
                        state: current,
                        production,
                    })
                    .or_default()
                    .insert(Goto {
                        from,
                        symbol: p.left,
                    });
            }
        }
    }

    // LA(q, A->ω) = ⋃ { Follow(p,A) | (q, A->ω) lookback (p,A) }
    let mut lookaheads = Map::<Reduce, TerminalSet>::default();
    for (&state, lr0_state) in &lr0.states {
        let mut reduces: Vec<_> = lr0_state.reduces.iter().copied().collect();
        reduces.sort();
        for production in reduces {
            let key = Reduce { state, production };
            let mut la = TerminalSet::default();
            if let Some(sources) = lookbacks.get(&key) {
                for goto in sources {
                    if let Some(follow) = follow_sets.get(goto) {
                        la.union_with(follow);
                    }
                }
            }
            lookaheads.insert(key, la);
        }
    }

    tracing::debug!(
        transitions = gotos.len(),
        reductions = lookaheads.len(),
        "computed LALR(1) look-ahead sets"
    );
    Ok(LookaheadSets { lookaheads })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{lr0, precompile::precompile, spec::samples, spec::Specification};

    fn build(spec: &Specification) -> (Grammar, Automaton) {
        let g = Grammar::from_precompiled(&precompile(spec));
        let automaton = lr0::automaton(&g);
        (g, automaton)
    }

    fn names(g: &Grammar, set: &TerminalSet) -> Vec<String> {
        set.iter().map(|t| g.terminals[&t].name.clone()).collect()
    }

    #[test]
    fn reduce_reduce_lookaheads_are_end_of_input() {
        let (g, automaton) = build(&samples::reduce_reduce());
        let sets = lookahead_sets(&g, &automaton).unwrap();
        for (&state, lr0_state) in &automaton.states {
            for &production in &lr0_state.reduces {
                if g.production(production).right.len() == 1
                    && matches!(g.production(production).right[0], SymbolID::T(_))
                {
                    // A -> X and B -> X are both followed by $end only.
                    let la = sets.get(state, production).unwrap();
                    assert_eq!(names(&g, la), ["$end"]);
                }
            }
        }
    }

    #[test]
    fn dangling_else_sees_else_and_eoi() {
        let (g, automaton) = build(&samples::dangling_else());
        let sets = lookahead_sets(&g, &automaton).unwrap();
        let short_if = *g
            .productions
            .iter()
            .find(|(_, p)| p.right.len() == 4)
            .unwrap()
            .0;
        let (&state, _) = automaton
            .states
            .iter()
            .find(|(_, s)| s.reduces.contains(&short_if))
            .unwrap();
        let la = sets.get(state, short_if).unwrap();
        assert_eq!(names(&g, la), ["$end", "ELSE"]);
    }

    #[test]
    fn cyclic_reads_is_not_lr_k() {
        let spec = Specification::define(|s| {
            s.tokens(None, ["X"]);
            s.ty("t", "S");
            s.rule("S", ["M", "N", "S"], "");
            s.rule("S", ["X"], "");
            s.rule("M", [], "");
            s.rule("N", [], "");
            s.start("S");
        });
        let (g, automaton) = build(&spec);
        let err = lookahead_sets(&g, &automaton).unwrap_err();
        assert!(matches!(err, Error::NotLrK { .. }));
    }
}

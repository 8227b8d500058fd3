//! ACTION/GOTO tables and conflict resolution.
//!
//! The pipeline materializes the LR(0) table with multi-action cells, then
//! narrows it in place: precedence resolution, the SLR(1) FOLLOW
//! restriction, and the LALR(1) look-ahead restriction each only drop
//! actions. The final step resolves whatever conflicts remain by the
//! default policy and emits the deterministic [`ParseTable`].

use crate::{
    diagnostics::Warning,
    follow::FollowSets,
    grammar::{Grammar, NonterminalID, ProductionID, TerminalID},
    lalr::LookaheadSets,
    lr0::{Automaton, StateID},
    spec::Assoc,
    types::Map,
    util::display_fn,
};
use std::fmt;

/// The action an LR parser performs on a lookahead terminal.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Action {
    /// Read the lookahead and transition to the specified state.
    Shift(StateID),

    /// Reduce by the specified production.
    Reduce(ProductionID),

    Accept,

    /// Reject the lookahead. Behaves like a missing cell but is recorded
    /// explicitly when non-associativity drops both sides of a conflict.
    Fail,
}

/// One state of a table under construction. A cell holding more than one
/// action is a conflict.
#[derive(Debug, Clone)]
pub struct LrRow {
    pub actions: Map<TerminalID, Vec<Action>>,
    pub gotos: Map<NonterminalID, StateID>,
}

#[derive(Debug, Clone)]
pub struct LrTable {
    pub states: Map<StateID, LrRow>,
    pub entries: Map<NonterminalID, StateID>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ConflictKind {
    ShiftReduce,
    ReduceReduce,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Conflict {
    pub state: StateID,
    pub token: TerminalID,
    pub kind: ConflictKind,
}

impl LrTable {
    /// Conflicted cells, in state order.
    pub fn conflicts(&self) -> Vec<Conflict> {
        let mut conflicts = Vec::new();
        for (&state, row) in &self.states {
            for (&token, actions) in &row.actions {
                let shifts = actions
                    .iter()
                    .any(|a| matches!(a, Action::Shift(_) | Action::Accept));
                let reduces = actions
                    .iter()
                    .filter(|a| matches!(a, Action::Reduce(_)))
                    .count();
                if shifts && reduces > 0 {
                    conflicts.push(Conflict {
                        state,
                        token,
                        kind: ConflictKind::ShiftReduce,
                    });
                }
                if reduces > 1 {
                    conflicts.push(Conflict {
                        state,
                        token,
                        kind: ConflictKind::ReduceReduce,
                    });
                }
            }
        }
        conflicts
    }

    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(move |f| {
            for (i, (id, row)) in self.states.iter().enumerate() {
                if i > 0 {
                    writeln!(f)?;
                }
                writeln!(f, "#### State {:?}", id)?;
                for (token, actions) in &row.actions {
                    write!(f, "- {} =>", g.terminals[token].name)?;
                    for action in actions {
                        write!(f, " {}", action.display(g))?;
                    }
                    writeln!(f)?;
                }
                for (symbol, goto) in &row.gotos {
                    writeln!(f, "- {} => goto({:?})", g.nonterminals[symbol].name, goto)?;
                }
            }
            Ok(())
        })
    }
}

impl Action {
    fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(move |f| match self {
            Action::Shift(n) => write!(f, "shift({:?})", n),
            Action::Reduce(r) => write!(f, "reduce({})", g.production(*r).display(g)),
            Action::Accept => f.write_str("accept"),
            Action::Fail => f.write_str("fail"),
        })
    }
}

/// The LR(0) table: shifts from the automaton edges, `Accept` on `$end` in
/// accepting states, and every completed production reducing on every
/// terminal of the augmented alphabet.
pub fn lr0_table(g: &Grammar, automaton: &Automaton) -> LrTable {
    let mut states = Map::default();
    for (&id, state) in &automaton.states {
        let mut actions: Map<TerminalID, Vec<Action>> = Map::default();
        for (&t, &next) in &state.shifts {
            actions.entry(t).or_default().push(Action::Shift(next));
        }
        if state.accepting {
            actions
                .entry(TerminalID::EOI)
                .or_default()
                .push(Action::Accept);
        }
        let mut reduces: Vec<_> = state.reduces.iter().copied().collect();
        reduces.sort();
        for production in reduces {
            for &t in g.terminals.keys() {
                actions
                    .entry(t)
                    .or_default()
                    .push(Action::Reduce(production));
            }
        }
        states.insert(
            id,
            LrRow {
                actions,
                gotos: state.gotos.clone(),
            },
        );
    }
    LrTable {
        states,
        entries: automaton.entries.clone(),
    }
}

/// Resolves shift/reduce conflicts by precedence and associativity.
///
/// A pair with precedence on both sides drops its lower-precedence action;
/// equal precedence decides by the token's associativity, where
/// non-associativity drops both sides and records [`Action::Fail`]. A pair
/// lacking precedence on either side is left in place. Reduce/reduce
/// conflicts are never touched here.
pub fn apply_precedence(g: &Grammar, table: &mut LrTable) {
    for row in table.states.values_mut() {
        for (&token, cell) in row.actions.iter_mut() {
            let next = match cell.iter().find_map(|a| match a {
                Action::Shift(next) => Some(*next),
                _ => None,
            }) {
                Some(next) => next,
                None => continue,
            };
            let reduces: Vec<ProductionID> = cell
                .iter()
                .filter_map(|a| match a {
                    Action::Reduce(r) => Some(*r),
                    _ => None,
                })
                .collect();
            if reduces.is_empty() {
                continue;
            }

            let token_prec = g.terminals[&token].precedence;
            let mut keep_shift = true;
            let mut nonassoc = false;
            let mut kept = Vec::new();
            for &reduce in &reduces {
                match (token_prec, g.production(reduce).precedence) {
                    (Some(tp), Some(rp)) => {
                        if rp.level > tp.level {
                            keep_shift = false;
                            kept.push(reduce);
                        } else if rp.level == tp.level {
                            match tp.assoc {
                                Assoc::Left => {
                                    keep_shift = false;
                                    kept.push(reduce);
                                }
                                Assoc::Right => {}
                                Assoc::Nonassoc => {
                                    keep_shift = false;
                                    nonassoc = true;
                                }
                            }
                        }
                    }
                    // Undefined on either side: the conflict stays.
                    _ => kept.push(reduce),
                }
            }

            let mut resolved = Vec::new();
            if keep_shift {
                resolved.push(Action::Shift(next));
            }
            resolved.extend(kept.into_iter().map(Action::Reduce));
            if resolved.is_empty() && nonassoc {
                resolved.push(Action::Fail);
            }
            *cell = resolved;
        }
    }
}

/// The SLR(1) restriction: a reduction survives on a terminal only if the
/// terminal may follow the production's head.
pub fn restrict_by_follow(g: &Grammar, table: &mut LrTable, follow: &FollowSets) {
    for row in table.states.values_mut() {
        for (&token, cell) in row.actions.iter_mut() {
            cell.retain(|action| match action {
                Action::Reduce(r) => follow.get(g.production(*r).left).contains(token),
                _ => true,
            });
        }
        row.actions.retain(|_, cell| !cell.is_empty());
    }
}

/// The LALR(1) restriction: a reduction survives on a terminal only if the
/// terminal is in the look-ahead set of that (state, production) pair.
pub fn restrict_by_lookahead(table: &mut LrTable, sets: &LookaheadSets) {
    for (&state, row) in table.states.iter_mut() {
        for (&token, cell) in row.actions.iter_mut() {
            cell.retain(|action| match action {
                Action::Reduce(r) => sets.contains(state, *r, token),
                _ => true,
            });
        }
        row.actions.retain(|_, cell| !cell.is_empty());
    }
}

/// One state of the final deterministic table.
#[derive(Debug)]
pub struct Row {
    pub actions: Map<TerminalID, Action>,
    pub gotos: Map<NonterminalID, StateID>,
}

/// The emitted pushdown automaton.
#[derive(Debug)]
pub struct ParseTable {
    pub states: Map<StateID, Row>,
    /// Initial state of each declared start nonterminal.
    pub entries: Map<NonterminalID, StateID>,
}

impl ParseTable {
    pub fn action(&self, state: StateID, token: TerminalID) -> Option<Action> {
        self.states[&state].actions.get(&token).copied()
    }

    pub fn goto(&self, state: StateID, symbol: NonterminalID) -> Option<StateID> {
        self.states[&state].gotos.get(&symbol).copied()
    }

    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(move |f| {
            for (i, (id, row)) in self.states.iter().enumerate() {
                if i > 0 {
                    writeln!(f)?;
                }
                writeln!(f, "#### State {:?}", id)?;
                writeln!(f, "## actions")?;
                for (token, action) in &row.actions {
                    writeln!(f, "- {} => {}", g.terminals[token].name, action.display(g))?;
                }
                writeln!(f, "## gotos")?;
                for (symbol, goto) in &row.gotos {
                    writeln!(f, "- {} => goto({:?})", g.nonterminals[symbol].name, goto)?;
                }
            }
            Ok(())
        })
    }
}

/// Resolves the residual conflicts by the default policy and freezes the
/// table. Shift/reduce keeps the shift; reduce/reduce keeps the reduction
/// with the lowest production id. Every dropped reduction is reported.
pub fn resolve_defaults(g: &Grammar, table: LrTable) -> (ParseTable, Vec<Warning>) {
    let mut warnings = Vec::new();
    let mut states = Map::default();
    for (state, row) in table.states {
        let mut actions = Map::default();
        for (token, cell) in row.actions {
            let primary = cell
                .iter()
                .copied()
                .find(|a| matches!(a, Action::Shift(_) | Action::Accept | Action::Fail));
            let reduces: Vec<ProductionID> = cell
                .iter()
                .filter_map(|a| match a {
                    Action::Reduce(r) => Some(*r),
                    _ => None,
                })
                .collect();

            let resolved = match primary {
                Some(action) => {
                    for &reduce in &reduces {
                        warnings.push(Warning::ShiftReduceResolved {
                            state: state.raw(),
                            token: g.terminals[&token].name.clone(),
                            rule: g.production(reduce).display(g).to_string(),
                        });
                    }
                    action
                }
                None => {
                    let kept = reduces
                        .iter()
                        .copied()
                        .min()
                        .expect("an action cell cannot be empty");
                    for &reduce in &reduces {
                        if reduce != kept {
                            warnings.push(Warning::ReduceReduceResolved {
                                state: state.raw(),
                                token: g.terminals[&token].name.clone(),
                                kept: g.production(kept).display(g).to_string(),
                                rule: g.production(reduce).display(g).to_string(),
                            });
                        }
                    }
                    Action::Reduce(kept)
                }
            };
            actions.insert(token, resolved);
        }
        states.insert(
            state,
            Row {
                actions,
                gotos: row.gotos,
            },
        );
    }

    if !warnings.is_empty() {
        tracing::debug!(resolved = warnings.len(), "applied default conflict policy");
    }
    (
        ParseTable {
            states,
            entries: table.entries,
        },
        warnings,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        follow::{FirstSets, FollowSets},
        lr0, precompile::precompile, spec::samples, spec::Specification,
    };

    fn setup(spec: &Specification) -> (Grammar, Automaton, LrTable) {
        let g = Grammar::from_precompiled(&precompile(spec));
        let automaton = lr0::automaton(&g);
        let table = lr0_table(&g, &automaton);
        (g, automaton, table)
    }

    #[test]
    fn lr0_reduces_on_every_terminal() {
        let (g, _, table) = setup(&samples::reduce_reduce());
        let reduce_row = table
            .states
            .values()
            .find(|row| {
                row.actions
                    .values()
                    .any(|cell| cell.iter().filter(|a| matches!(a, Action::Reduce(_))).count() == 2)
            })
            .unwrap();
        for &t in g.terminals.keys() {
            assert_eq!(reduce_row.actions[&t].len(), 2);
        }
    }

    #[test]
    fn precedence_resolves_arithmetic() {
        let (g, _, mut table) = setup(&samples::arithmetic());
        assert!(!table.conflicts().is_empty());
        apply_precedence(&g, &mut table);
        assert!(table.conflicts().is_empty());
    }

    #[test]
    fn equal_precedence_left_associativity_reduces() {
        let (g, _, mut table) = setup(&samples::arithmetic());
        apply_precedence(&g, &mut table);
        let plus = *g
            .terminals
            .iter()
            .find(|(_, t)| t.name == "PLUS")
            .unwrap()
            .0;
        let plus_rule = g.rule_ids.values().copied().nth(1).unwrap();
        // In the state holding `E : E PLUS E .`, the PLUS cell reduces.
        let cell = table
            .states
            .values()
            .filter_map(|row| row.actions.get(&plus))
            .find(|cell| cell.contains(&Action::Reduce(plus_rule)))
            .unwrap();
        assert_eq!(cell[..], [Action::Reduce(plus_rule)]);
    }

    #[test]
    fn nonassoc_drops_both_sides() {
        let spec = Specification::define(|s| {
            s.tokens(None, ["EQ", "NUM"]);
            s.ty("t", "E");
            s.nonassoc(["EQ"]);
            s.rule("E", ["E", "EQ", "E"], "");
            s.rule("E", ["NUM"], "");
            s.start("E");
        });
        let (g, _, mut table) = setup(&spec);
        apply_precedence(&g, &mut table);
        let eq = *g.terminals.iter().find(|(_, t)| t.name == "EQ").unwrap().0;
        let fail_cells = table
            .states
            .values()
            .filter_map(|row| row.actions.get(&eq))
            .filter(|cell| cell[..] == [Action::Fail])
            .count();
        assert_eq!(fail_cells, 1);
    }

    #[test]
    fn missing_precedence_leaves_the_conflict() {
        let (g, _, mut table) = setup(&samples::dangling_else());
        let before = table.conflicts();
        apply_precedence(&g, &mut table);
        assert_eq!(table.conflicts(), before);
    }

    #[test]
    fn follow_restriction_only_drops_reductions() {
        let (g, _, mut table) = setup(&samples::arithmetic());
        apply_precedence(&g, &mut table);
        let reference = table.clone();
        let first = FirstSets::new(&g);
        let follow = FollowSets::new(&g, &first);
        restrict_by_follow(&g, &mut table, &follow);
        for (state, row) in &table.states {
            for (token, cell) in &row.actions {
                let wide = &reference.states[state].actions[token];
                for action in cell {
                    assert!(wide.contains(action));
                }
            }
        }
    }
}

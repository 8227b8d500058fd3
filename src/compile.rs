//! The compile pipeline.
//!
//! `Specification` → precompile → augment → LR(0) → precedence → SLR(1) →
//! LALR(1) → default resolution. Each stage is a value-to-value transform;
//! a non-empty error list stops the pipeline between stages.

use crate::{
    diagnostics::{Error, Warning},
    follow::{FirstSets, FollowSets},
    grammar::{Grammar, Precedence, TerminalID},
    lalr, lr0, precompile,
    spec::Specification,
    table::{self, ParseTable},
};

/// The declarations surviving validation, as exposed to backends. Dummy
/// terminals and the reserved symbols are filtered out.
#[derive(Debug)]
pub struct ProcessedSpec {
    pub terminals: Vec<(String, Option<String>)>,
    pub nonterminals: Vec<(String, Option<String>)>,
    /// The precedence table actually applied, dummies included.
    pub precedences: Vec<(String, Precedence)>,
    pub starts: Vec<String>,
}

impl ProcessedSpec {
    fn new(g: &Grammar) -> Self {
        let mut terminals = Vec::new();
        let mut precedences = Vec::new();
        for (&id, data) in &g.terminals {
            if let Some(precedence) = data.precedence {
                precedences.push((data.name.clone(), precedence));
            }
            if id == TerminalID::EOI || data.dummy {
                continue;
            }
            terminals.push((data.name.clone(), data.ty.clone()));
        }

        let nonterminals = g
            .nonterminals
            .iter()
            .filter(|(&n, _)| n != crate::grammar::NonterminalID::START)
            .map(|(_, data)| (data.name.clone(), data.ty.clone()))
            .collect();

        let starts = g
            .starts
            .iter()
            .map(|&(start, _)| g.nonterminals[&start].name.clone())
            .collect();

        Self {
            terminals,
            nonterminals,
            precedences,
            starts,
        }
    }
}

#[derive(Debug)]
pub struct CompileOutput {
    pub table: ParseTable,
    pub spec: ProcessedSpec,
    pub warnings: Vec<Warning>,
}

#[derive(Debug, thiserror::Error)]
#[error("specification rejected with {} error(s)", .errors.len())]
pub struct CompileFailure {
    pub errors: Vec<Error>,
    pub warnings: Vec<Warning>,
}

/// Compile a specification down to its LALR(1) parse table.
pub fn compile(spec: &Specification) -> Result<CompileOutput, CompileFailure> {
    let pre = precompile::precompile(spec);
    if !pre.errors.is_empty() {
        return Err(CompileFailure {
            errors: pre.errors,
            warnings: pre.warnings,
        });
    }

    let g = Grammar::from_precompiled(&pre);
    let mut warnings = pre.warnings;

    let automaton = lr0::automaton(&g);
    let mut table = table::lr0_table(&g, &automaton);
    tracing::debug!(conflicts = table.conflicts().len(), "built LR(0) table");

    table::apply_precedence(&g, &mut table);
    tracing::debug!(conflicts = table.conflicts().len(), "applied precedence");

    let first = FirstSets::new(&g);
    let follow = FollowSets::new(&g, &first);
    table::restrict_by_follow(&g, &mut table, &follow);
    tracing::debug!(conflicts = table.conflicts().len(), "restricted to SLR(1)");

    let sets = match lalr::lookahead_sets(&g, &automaton) {
        Ok(sets) => sets,
        Err(error) => {
            return Err(CompileFailure {
                errors: vec![error],
                warnings,
            })
        }
    };
    table::restrict_by_lookahead(&mut table, &sets);
    tracing::debug!(conflicts = table.conflicts().len(), "restricted to LALR(1)");

    let (table, resolutions) = table::resolve_defaults(&g, table);
    warnings.extend(resolutions);

    Ok(CompileOutput {
        table,
        spec: ProcessedSpec::new(&g),
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::samples;

    #[test]
    fn empty_specification_is_rejected() {
        let failure = compile(&Specification::default()).unwrap_err();
        assert!(failure.errors.contains(&Error::NoStartSymbol));
    }

    #[test]
    fn processed_spec_hides_reserved_and_dummy_terminals() {
        let output = compile(&samples::unary_minus()).unwrap();
        let names: Vec<&str> = output
            .spec
            .terminals
            .iter()
            .map(|(name, _)| name.as_str())
            .collect();
        assert_eq!(names, ["NUM", "MINUS"]);
        // The dummy still surfaces in the applied precedence table.
        assert!(output
            .spec
            .precedences
            .iter()
            .any(|(name, prec)| name == "UMINUS" && prec.level == 2));
    }
}

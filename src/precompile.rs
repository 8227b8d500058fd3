//! Specification validation and normalization.
//!
//! The precompiler checks the raw [`Specification`] against the declaration
//! rules and produces a normalized [`Precompiled`] state. It never fails
//! early: every rule is checked, every violation becomes a diagnostic, and
//! the caller decides based on the accumulated error list. Diagnostic order
//! follows source declaration order.

use crate::{
    diagnostics::{Error, Warning},
    grammar::Precedence,
    spec::Specification,
    types::Map,
};

/// A declared (or dummy) terminal after normalization.
#[derive(Debug, Clone)]
pub struct TerminalDecl {
    pub ty: Option<String>,
    /// Introduced by `%prec` only; must pick up an associativity and is
    /// hidden from backends.
    pub dummy: bool,
}

/// One normalized production.
#[derive(Debug, Clone)]
pub struct Rule {
    pub symbols: Vec<String>,
    pub prec: Option<String>,
    pub action: String,
}

/// The normalized precompilation state.
#[derive(Debug, Default)]
pub struct Precompiled {
    pub terminals: Map<String, TerminalDecl>,
    /// Nonterminal name to its `%type`, in production-group order.
    pub nonterminals: Map<String, Option<String>>,
    /// Production groups in source order, invalid groups dropped.
    pub groups: Map<String, Vec<Rule>>,
    pub precedence: Map<String, Precedence>,
    pub starts: Vec<String>,
    pub warnings: Vec<Warning>,
    pub errors: Vec<Error>,
}

pub fn precompile(spec: &Specification) -> Precompiled {
    let mut pre = Precompiled::default();

    declare_terminals(spec, &mut pre);
    declare_nonterminals(spec, &mut pre);
    apply_types(spec, &mut pre);
    collect_starts(spec, &mut pre);
    normalize_groups(spec, &mut pre);
    assign_precedence(spec, &mut pre);
    check_dummies(&mut pre);

    tracing::debug!(
        terminals = pre.terminals.len(),
        nonterminals = pre.nonterminals.len(),
        errors = pre.errors.len(),
        warnings = pre.warnings.len(),
        "precompiled specification"
    );
    pre
}

fn declare_terminals(spec: &Specification, pre: &mut Precompiled) {
    for group in &spec.terminals {
        for name in &group.names {
            match pre.terminals.get(name) {
                Some(decl) if decl.ty == group.ty => {
                    pre.warnings
                        .push(Warning::TerminalRedeclared { name: name.clone() });
                }
                Some(_) => {
                    pre.errors
                        .push(Error::TerminalTypeConflict { name: name.clone() });
                }
                None => {
                    pre.terminals.insert(
                        name.clone(),
                        TerminalDecl {
                            ty: group.ty.clone(),
                            dummy: false,
                        },
                    );
                }
            }
        }
    }
}

// A nonterminal is declared by carrying a production group.
fn declare_nonterminals(spec: &Specification, pre: &mut Precompiled) {
    for group in &spec.productions {
        if pre.terminals.contains_key(&group.left) {
            pre.errors.push(Error::SymbolKindConflict {
                name: group.left.clone(),
            });
        } else if pre.nonterminals.contains_key(&group.left) {
            pre.errors.push(Error::DuplicateProductionGroup {
                name: group.left.clone(),
            });
        } else {
            pre.nonterminals.insert(group.left.clone(), None);
        }
    }
}

fn apply_types(spec: &Specification, pre: &mut Precompiled) {
    for decl in &spec.types {
        if pre.terminals.contains_key(&decl.name) {
            pre.errors.push(Error::TypeOnTerminal {
                name: decl.name.clone(),
            });
        } else {
            match pre.nonterminals.get_mut(&decl.name) {
                None => pre.errors.push(Error::TypeOnUndeclared {
                    name: decl.name.clone(),
                }),
                Some(slot) => match slot.as_deref() {
                    None => *slot = Some(decl.ty.clone()),
                    Some(ty) if ty == decl.ty => pre.warnings.push(Warning::TypeRedeclared {
                        name: decl.name.clone(),
                    }),
                    Some(_) => pre.errors.push(Error::TypeConflict {
                        name: decl.name.clone(),
                    }),
                },
            }
        }
    }
}

fn collect_starts(spec: &Specification, pre: &mut Precompiled) {
    if spec.starts.is_empty() {
        pre.errors.push(Error::NoStartSymbol);
    }
    for name in &spec.starts {
        if pre.starts.contains(name) {
            pre.warnings
                .push(Warning::DuplicateStart { name: name.clone() });
            continue;
        }
        match pre.nonterminals.get(name) {
            None => pre
                .errors
                .push(Error::UndeclaredStart { name: name.clone() }),
            Some(ty) => {
                if ty.is_none() {
                    pre.errors
                        .push(Error::StartWithoutType { name: name.clone() });
                }
                pre.starts.push(name.clone());
            }
        }
    }
}

fn normalize_groups(spec: &Specification, pre: &mut Precompiled) {
    for group in &spec.productions {
        // Duplicate or terminal-colliding groups were already rejected; the
        // first valid group of a nonterminal is the one normalized.
        if !pre.nonterminals.contains_key(&group.left) || pre.groups.contains_key(&group.left) {
            continue;
        }

        let mut valid = true;
        let mut rules = Vec::with_capacity(group.alternatives.len());
        for alternative in &group.alternatives {
            for symbol in &alternative.symbols {
                if !pre.terminals.contains_key(symbol) && !pre.nonterminals.contains_key(symbol) {
                    pre.errors.push(Error::UndeclaredSymbol {
                        symbol: symbol.clone(),
                        nonterminal: group.left.clone(),
                    });
                    valid = false;
                }
            }
            if let Some(prec) = &alternative.prec {
                if pre.nonterminals.contains_key(prec) {
                    pre.errors.push(Error::PrecOnNonterminal {
                        name: prec.clone(),
                        nonterminal: group.left.clone(),
                    });
                    valid = false;
                } else if !pre.terminals.contains_key(prec) {
                    pre.terminals.insert(
                        prec.clone(),
                        TerminalDecl {
                            ty: None,
                            dummy: true,
                        },
                    );
                }
            }
            rules.push(Rule {
                symbols: alternative.symbols.clone(),
                prec: alternative.prec.clone(),
                action: alternative.action.clone(),
            });
        }

        if valid {
            pre.groups.insert(group.left.clone(), rules);
        }
    }
}

fn assign_precedence(spec: &Specification, pre: &mut Precompiled) {
    for (index, group) in spec.associativities.iter().enumerate() {
        let level = index as u16 + 1;
        let mut seen_here = Vec::new();
        for name in &group.names {
            if seen_here.contains(&name) {
                pre.warnings
                    .push(Warning::DuplicateAssoc { name: name.clone() });
                continue;
            }
            if pre.precedence.contains_key(name) {
                pre.errors.push(Error::AssocConflict { name: name.clone() });
                continue;
            }
            seen_here.push(name);
            pre.precedence.insert(
                name.clone(),
                Precedence {
                    level,
                    assoc: group.assoc,
                },
            );
        }
    }
}

fn check_dummies(pre: &mut Precompiled) {
    for (name, decl) in &pre.terminals {
        if decl.dummy && !pre.precedence.contains_key(name) {
            pre.errors
                .push(Error::DummyWithoutAssoc { name: name.clone() });
        }
    }
}

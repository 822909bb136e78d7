use fol_query_model::{Atom, FlatConjunction, Formula, QueryScope, Variable};
use itertools::Itertools;
use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};

/// A conjunctive query `Q(head) :- body.`
///
/// All variables belong to the scope of the query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConjunctiveQuery {
    head: Vec<Variable>,
    atoms: Vec<Atom>,
    scope: QueryScope,
}

impl ConjunctiveQuery {
    pub(crate) fn new(head: Vec<Variable>, atoms: Vec<Atom>, scope: QueryScope) -> Self {
        Self { head, atoms, scope }
    }

    pub fn head(&self) -> &[Variable] {
        &self.head
    }

    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    pub fn scope(&self) -> QueryScope {
        self.scope
    }

    /// Whether the query has no distinguished variables.
    pub fn is_boolean(&self) -> bool {
        self.head.is_empty()
    }

    /// Whether the equalities and inequalities of the body contradict each other, e.g. in
    /// `Q(x) :- C(x), x = y, y != x .`
    pub fn is_inconsistent(&self) -> bool {
        self.flat_body().is_contradiction()
    }

    pub fn flat_body(&self) -> FlatConjunction {
        FlatConjunction::new(self.atoms.iter().cloned())
    }

    /// The conjunction of the atoms. Every variable is free.
    pub fn body(&self) -> Formula {
        Formula::and(self.atoms.iter().cloned().map(Formula::from).collect())
    }

    /// The body with all variables that are not in the head existentially quantified.
    pub fn to_formula(&self) -> Formula {
        let body = self.body();
        let existential: BTreeSet<Variable> = body
            .free_variables()
            .into_iter()
            .filter(|variable| !self.head.contains(variable))
            .collect();
        if existential.is_empty() {
            body
        } else {
            Formula::exists(existential, body)
        }
    }
}

impl Display for ConjunctiveQuery {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Q({}) :- {} .",
            self.head.iter().join(", "),
            self.atoms.iter().join(", ")
        )
    }
}

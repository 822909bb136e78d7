//! The FOL formula tree.
//!
//! Formulas are plain values. Every rewrite consumes a formula and returns the rewritten one, so
//! a caller that wants to keep the original clones it first.

mod analysis;
mod normalize;
mod substitution;

use crate::{Atom, ComparisonAtom, PredicateAtom, Term, Variable};
use itertools::Itertools;
use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};

/// The two associative containers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerKind {
    Conjunction,
    Disjunction,
}

impl ContainerKind {
    /// Returns the other container kind.
    #[must_use]
    pub fn dual(self) -> Self {
        match self {
            ContainerKind::Conjunction => ContainerKind::Disjunction,
            ContainerKind::Disjunction => ContainerKind::Conjunction,
        }
    }

    fn operator(self) -> &'static str {
        match self {
            ContainerKind::Conjunction => "AND",
            ContainerKind::Disjunction => "OR",
        }
    }
}

/// The two quantifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuantifierKind {
    Exist,
    ForAll,
}

impl QuantifierKind {
    #[must_use]
    pub fn dual(self) -> Self {
        match self {
            QuantifierKind::Exist => QuantifierKind::ForAll,
            QuantifierKind::ForAll => QuantifierKind::Exist,
        }
    }

    fn symbol(self) -> &'static str {
        match self {
            QuantifierKind::Exist => "\\exists",
            QuantifierKind::ForAll => "\\forall",
        }
    }
}

/// A first-order formula.
///
/// Conjunctions and disjunctions are semantically sets, but keep the insertion order of their
/// children so that everything derived from them is deterministic. An empty conjunction is
/// equivalent to `TRUE` and an empty disjunction to `FALSE`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Formula {
    Atom(Atom),
    Conjunction(Vec<Formula>),
    Disjunction(Vec<Formula>),
    Negation(Box<Formula>),
    Exist {
        variables: BTreeSet<Variable>,
        body: Box<Formula>,
    },
    ForAll {
        variables: BTreeSet<Variable>,
        body: Box<Formula>,
    },
}

impl Formula {
    pub fn predicate(atom: PredicateAtom) -> Self {
        Formula::Atom(Atom::Predicate(atom))
    }

    pub fn comparison(atom: ComparisonAtom) -> Self {
        Formula::Atom(Atom::Comparison(atom))
    }

    /// Creates a new equality `left = right`.
    pub fn equal(left: Term, right: Term) -> Self {
        Self::comparison(ComparisonAtom::equal(left, right))
    }

    /// Creates a new strict inequality `left != right`.
    pub fn not_equal(left: Term, right: Term) -> Self {
        Self::comparison(ComparisonAtom::not_equal(left, right))
    }

    pub fn truth() -> Self {
        Formula::Atom(Atom::True)
    }

    pub fn falsity() -> Self {
        Formula::Atom(Atom::False)
    }

    pub fn and(children: Vec<Formula>) -> Self {
        Formula::Conjunction(children)
    }

    pub fn or(children: Vec<Formula>) -> Self {
        Formula::Disjunction(children)
    }

    pub fn not(content: Formula) -> Self {
        Formula::Negation(Box::new(content))
    }

    pub fn exists(variables: impl IntoIterator<Item = Variable>, body: Formula) -> Self {
        Self::quantifier(QuantifierKind::Exist, variables.into_iter().collect(), body)
    }

    pub fn for_all(variables: impl IntoIterator<Item = Variable>, body: Formula) -> Self {
        Self::quantifier(QuantifierKind::ForAll, variables.into_iter().collect(), body)
    }

    pub fn container(kind: ContainerKind, children: Vec<Formula>) -> Self {
        match kind {
            ContainerKind::Conjunction => Formula::Conjunction(children),
            ContainerKind::Disjunction => Formula::Disjunction(children),
        }
    }

    pub fn quantifier(kind: QuantifierKind, variables: BTreeSet<Variable>, body: Formula) -> Self {
        let body = Box::new(body);
        match kind {
            QuantifierKind::Exist => Formula::Exist { variables, body },
            QuantifierKind::ForAll => Formula::ForAll { variables, body },
        }
    }

    pub fn container_kind(&self) -> Option<ContainerKind> {
        match self {
            Formula::Conjunction(_) => Some(ContainerKind::Conjunction),
            Formula::Disjunction(_) => Some(ContainerKind::Disjunction),
            _ => None,
        }
    }

    /// The children of this formula if it is a container of the given kind.
    pub fn container_children(&self, kind: ContainerKind) -> Option<&[Formula]> {
        match (self, kind) {
            (Formula::Conjunction(children), ContainerKind::Conjunction)
            | (Formula::Disjunction(children), ContainerKind::Disjunction) => Some(children),
            _ => None,
        }
    }

    pub fn quantifier_kind(&self) -> Option<QuantifierKind> {
        match self {
            Formula::Exist { .. } => Some(QuantifierKind::Exist),
            Formula::ForAll { .. } => Some(QuantifierKind::ForAll),
            _ => None,
        }
    }

    pub fn as_predicate(&self) -> Option<&PredicateAtom> {
        match self {
            Formula::Atom(Atom::Predicate(atom)) => Some(atom),
            _ => None,
        }
    }

    /// Negates the formula, removing an outer negation instead of adding a second one.
    #[must_use]
    pub fn negate(self) -> Formula {
        match self {
            Formula::Negation(content) => *content,
            other => Formula::not(other),
        }
    }

    fn fmt_container(
        kind: ContainerKind,
        children: &[Formula],
        f: &mut Formatter<'_>,
    ) -> std::fmt::Result {
        match children {
            [] if kind == ContainerKind::Conjunction => Atom::True.fmt(f),
            [] => Atom::False.fmt(f),
            [child] => child.fmt(f),
            children => {
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        write!(f, " {} ", kind.operator())?;
                    }
                    match child {
                        Formula::Conjunction(nested) | Formula::Disjunction(nested)
                            if nested.len() > 1 =>
                        {
                            write!(f, "({child})")?;
                        }
                        _ => child.fmt(f)?,
                    }
                }
                Ok(())
            }
        }
    }

    fn fmt_quantifier(
        kind: QuantifierKind,
        variables: &BTreeSet<Variable>,
        body: &Formula,
        f: &mut Formatter<'_>,
    ) -> std::fmt::Result {
        write!(f, "{} {} ({body})", kind.symbol(), variables.iter().join(", "))
    }
}

impl Display for Formula {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Formula::Atom(atom) => atom.fmt(f),
            Formula::Conjunction(children) => {
                Self::fmt_container(ContainerKind::Conjunction, children, f)
            }
            Formula::Disjunction(children) => {
                Self::fmt_container(ContainerKind::Disjunction, children, f)
            }
            Formula::Negation(content) => write!(f, "NOT ({content})"),
            Formula::Exist { variables, body } => {
                Self::fmt_quantifier(QuantifierKind::Exist, variables, body, f)
            }
            Formula::ForAll { variables, body } => {
                Self::fmt_quantifier(QuantifierKind::ForAll, variables, body, f)
            }
        }
    }
}

impl From<Atom> for Formula {
    fn from(atom: Atom) -> Self {
        Formula::Atom(atom)
    }
}

impl From<PredicateAtom> for Formula {
    fn from(atom: PredicateAtom) -> Self {
        Formula::predicate(atom)
    }
}

impl From<ComparisonAtom> for Formula {
    fn from(atom: ComparisonAtom) -> Self {
        Formula::comparison(atom)
    }
}

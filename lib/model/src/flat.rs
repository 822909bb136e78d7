use crate::{Atom, ComparisonAtom, ComparisonOperator, Formula, PredicateAtom, Term, Variable};
use itertools::Itertools;
use rustc_hash::FxHashMap;
use std::fmt::{Display, Formatter};

/// A conjunction that consists only of atoms.
///
/// The equalities of the conjunction partition its terms into equivalence classes, which
/// allows deciding some contradictions and implications syntactically. All checks are sound
/// but not complete.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlatConjunction {
    atoms: Vec<Atom>,
}

impl FlatConjunction {
    /// Creates a conjunction of the given atoms. Duplicates are removed.
    pub fn new(atoms: impl IntoIterator<Item = Atom>) -> Self {
        Self {
            atoms: atoms.into_iter().unique().collect(),
        }
    }

    /// Collects the atoms of a formula that is an atom or a (nested) conjunction of atoms.
    pub fn from_formula(formula: &Formula) -> Option<Self> {
        fn collect(formula: &Formula, atoms: &mut Vec<Atom>) -> bool {
            match formula {
                Formula::Atom(atom) => {
                    atoms.push(atom.clone());
                    true
                }
                Formula::Conjunction(children) => {
                    children.iter().all(|child| collect(child, atoms))
                }
                _ => false,
            }
        }

        let mut atoms = Vec::new();
        collect(formula, &mut atoms).then(|| Self::new(atoms))
    }

    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    pub fn insert(&mut self, atom: Atom) {
        if !self.atoms.contains(&atom) {
            self.atoms.push(atom);
        }
    }

    pub fn predicate_atoms(&self) -> impl Iterator<Item = &PredicateAtom> {
        self.atoms.iter().filter_map(|atom| match atom {
            Atom::Predicate(atom) => Some(atom),
            _ => None,
        })
    }

    pub fn equalities(&self) -> impl Iterator<Item = &ComparisonAtom> {
        self.comparisons(ComparisonOperator::Equal)
    }

    pub fn inequalities(&self) -> impl Iterator<Item = &ComparisonAtom> {
        self.comparisons(ComparisonOperator::NotEqual)
    }

    fn comparisons(&self, operator: ComparisonOperator) -> impl Iterator<Item = &ComparisonAtom> {
        self.atoms.iter().filter_map(move |atom| match atom {
            Atom::Comparison(atom) if atom.operator() == operator => Some(atom),
            _ => None,
        })
    }

    /// The terms of the conjunction in order of their first occurrence.
    pub fn terms(&self) -> Vec<&Term> {
        self.atoms.iter().flat_map(Atom::terms).unique().collect()
    }

    /// The sets of terms that the equalities make equal, e.g. `{x, y, z}` and `{a, b}` for
    /// `x = y AND y = z AND a = b AND y != w`.
    pub fn equivalence_classes(&self) -> Vec<Vec<Term>> {
        let mut classes: Vec<Vec<Term>> = Vec::new();
        for equality in self.equalities() {
            let (left, right) = (equality.left(), equality.right());
            let (overlapping, mut disjoint): (Vec<_>, Vec<_>) = classes
                .into_iter()
                .partition(|class| class.contains(left) || class.contains(right));
            let mut merged: Vec<Term> = overlapping.into_iter().flatten().collect();
            for term in [left, right] {
                if !merged.contains(term) {
                    merged.push(term.clone());
                }
            }
            disjoint.push(merged);
            classes = disjoint;
        }
        classes
    }

    /// The terms equal to `term`, including the term itself.
    pub fn equivalent_terms(&self, term: &Term) -> Vec<Term> {
        self.equivalence_classes()
            .into_iter()
            .find(|class| class.contains(term))
            .unwrap_or_else(|| vec![term.clone()])
    }

    fn are_equivalent(classes: &[Vec<Term>], left: &Term, right: &Term) -> bool {
        left == right
            || classes
                .iter()
                .any(|class| class.contains(left) && class.contains(right))
    }

    /// Whether the conjunction is unsatisfiable because
    /// - it contains `FALSE`,
    /// - an inequality compares two equivalent terms, or
    /// - two distinct constants are equivalent.
    pub fn is_contradiction(&self) -> bool {
        if self.atoms.contains(&Atom::False) {
            return true;
        }
        let classes = self.equivalence_classes();
        let contradicted_inequality = self.inequalities().any(|inequality| {
            Self::are_equivalent(&classes, inequality.left(), inequality.right())
        });
        contradicted_inequality
            || classes.iter().any(|class| {
                class
                    .iter()
                    .filter(|term| term.is_constant())
                    .nth(1)
                    .is_some()
            })
    }

    /// Whether the conjunction only consists of trivial equalities and `TRUE`.
    pub fn is_tautology(&self) -> bool {
        self.atoms.iter().all(Atom::is_tautology)
    }

    /// Whether adding `inequality` keeps the conjunction free of contradicted inequalities.
    pub fn consistent_with(&self, inequality: &ComparisonAtom) -> bool {
        !Self::are_equivalent(
            &self.equivalence_classes(),
            inequality.left(),
            inequality.right(),
        )
    }

    /// All atoms obtained by replacing the terms of `atom` with equivalent ones.
    pub fn predicate_saturation(&self, atom: &PredicateAtom) -> Vec<PredicateAtom> {
        let classes = self.equivalence_classes();
        let equivalents = |term: &Term| {
            classes
                .iter()
                .find(|class| class.contains(term))
                .cloned()
                .unwrap_or_else(|| vec![term.clone()])
        };
        atom.terms()
            .iter()
            .map(equivalents)
            .multi_cartesian_product()
            .map(|terms| {
                let mut saturated = atom.clone();
                for (slot, term) in saturated.terms_mut().iter_mut().zip(terms) {
                    *slot = term;
                }
                saturated
            })
            .collect()
    }

    /// All atoms implied by the conjunction: every pair of equivalent terms as an equality, and
    /// every predicate atom and inequality with its terms replaced by equivalent ones.
    pub fn saturation(&self) -> FlatConjunction {
        let classes = self.equivalence_classes();
        let equalities = classes.iter().flat_map(|class| {
            class.iter().tuple_combinations().map(|(left, right)| {
                Atom::Comparison(ComparisonAtom::equal(left.clone(), right.clone()))
            })
        });
        let predicates = self
            .predicate_atoms()
            .flat_map(|atom| self.predicate_saturation(atom))
            .map(Atom::Predicate);
        let inequalities = self.inequalities().flat_map(|inequality| {
            let lefts = self.equivalent_terms(inequality.left());
            let rights = self.equivalent_terms(inequality.right());
            lefts
                .into_iter()
                .cartesian_product(rights)
                .map(|(left, right)| Atom::Comparison(ComparisonAtom::not_equal(left, right)))
        });
        FlatConjunction::new(equalities.chain(predicates).chain(inequalities))
    }

    /// Whether `atom` holds in every model of the conjunction, e.g. `R(x, x)` is implied by
    /// `R(x, y) AND x = y` and `a != c` is implied by `a = b AND b != c`.
    pub fn implies_atom(&self, atom: &Atom) -> bool {
        self.is_contradiction() || self.implies_consistently(&self.equivalence_classes(), atom)
    }

    fn implies_consistently(&self, classes: &[Vec<Term>], atom: &Atom) -> bool {
        let equivalent = |left: &Term, right: &Term| Self::are_equivalent(classes, left, right);
        match atom {
            Atom::True => true,
            Atom::False => false,
            Atom::Predicate(atom) => self.predicate_atoms().any(|own| {
                own.identifier() == atom.identifier()
                    && own.arity() == atom.arity()
                    && own
                        .terms()
                        .iter()
                        .zip(atom.terms())
                        .all(|(own, other)| equivalent(own, other))
            }),
            Atom::Comparison(atom) => match atom.operator() {
                ComparisonOperator::Equal => equivalent(atom.left(), atom.right()),
                ComparisonOperator::NotEqual => self.inequalities().any(|own| {
                    (equivalent(own.left(), atom.left()) && equivalent(own.right(), atom.right()))
                        || (equivalent(own.left(), atom.right())
                            && equivalent(own.right(), atom.left()))
                }),
            },
        }
    }

    /// Whether every atom of `other` is implied by this conjunction.
    pub fn implies(&self, other: &FlatConjunction) -> bool {
        if self.is_contradiction() || other.is_tautology() {
            return true;
        }
        let classes = self.equivalence_classes();
        other
            .atoms
            .iter()
            .all(|atom| self.implies_consistently(&classes, atom))
    }

    /// Whether some substitution of the variables of `other` that do not occur in this
    /// conjunction by terms of this conjunction makes `other` implied, e.g. `R(z, z) AND C(z)`
    /// implies `R(x, y) AND R(y, z)` with `x` and `y` replaced by `z`.
    pub fn implies_under_some_substitution(&self, other: &FlatConjunction) -> bool {
        if self.is_contradiction() || other.is_tautology() {
            return true;
        }
        let terms = self.terms();
        let variables: Vec<&Variable> = other
            .predicate_atoms()
            .flat_map(PredicateAtom::variables)
            .filter(|variable| !terms.iter().any(|term| term.as_variable() == Some(*variable)))
            .unique()
            .collect();
        if variables.is_empty() {
            return self.implies(other);
        }
        (0..variables.len())
            .map(|_| terms.iter())
            .multi_cartesian_product()
            .any(|combination| {
                let substitution: FxHashMap<&Variable, &Term> = variables
                    .iter()
                    .copied()
                    .zip(combination.into_iter().copied())
                    .collect();
                self.implies(&other.substituted(&substitution))
            })
    }

    fn substituted(&self, substitution: &FxHashMap<&Variable, &Term>) -> FlatConjunction {
        FlatConjunction::new(self.atoms.iter().map(|atom| {
            let mut atom = atom.clone();
            for term in atom.terms_mut() {
                let replacement = term
                    .as_variable()
                    .and_then(|variable| substitution.get(variable));
                if let Some(replacement) = replacement {
                    *term = (*replacement).clone();
                }
            }
            atom
        }))
    }

    pub fn into_formula(self) -> Formula {
        Formula::and(self.atoms.into_iter().map(Formula::from).collect())
    }
}

impl Display for FlatConjunction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.atoms.iter().join(" AND "))
    }
}

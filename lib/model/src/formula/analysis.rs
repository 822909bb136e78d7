use crate::{Atom, Formula, Term, TermType, Variable, VariableAlphabet};
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::BTreeSet;

impl Formula {
    /// The atoms of the formula, in depth-first order.
    pub fn atoms(&self) -> Vec<&Atom> {
        let mut atoms = Vec::new();
        self.collect_atoms(&mut atoms);
        atoms
    }

    fn collect_atoms<'a>(&'a self, atoms: &mut Vec<&'a Atom>) {
        match self {
            Formula::Atom(atom) => atoms.push(atom),
            Formula::Conjunction(children) | Formula::Disjunction(children) => {
                for child in children {
                    child.collect_atoms(atoms);
                }
            }
            Formula::Negation(content) => content.collect_atoms(atoms),
            Formula::Exist { body, .. } | Formula::ForAll { body, .. } => {
                body.collect_atoms(atoms);
            }
        }
    }

    pub(crate) fn atoms_mut(&mut self) -> Vec<&mut Atom> {
        let mut atoms = Vec::new();
        self.collect_atoms_mut(&mut atoms);
        atoms
    }

    fn collect_atoms_mut<'a>(&'a mut self, atoms: &mut Vec<&'a mut Atom>) {
        match self {
            Formula::Atom(atom) => atoms.push(atom),
            Formula::Conjunction(children) | Formula::Disjunction(children) => {
                for child in children {
                    child.collect_atoms_mut(atoms);
                }
            }
            Formula::Negation(content) => content.collect_atoms_mut(atoms),
            Formula::Exist { body, .. } | Formula::ForAll { body, .. } => {
                body.collect_atoms_mut(atoms);
            }
        }
    }

    /// All terms occurring in the atoms of the formula.
    pub fn terms(&self) -> Vec<&Term> {
        self.atoms().into_iter().flat_map(Atom::terms).collect()
    }

    /// All variables occurring in the atoms of the formula, bound or not.
    pub fn variables(&self) -> BTreeSet<Variable> {
        self.terms()
            .into_iter()
            .filter_map(Term::as_variable)
            .cloned()
            .collect()
    }

    /// The variables that are not bound by a quantifier.
    ///
    /// Blank variables are never free.
    pub fn free_variables(&self) -> BTreeSet<Variable> {
        match self {
            Formula::Atom(atom) => atom
                .terms()
                .into_iter()
                .filter_map(Term::as_variable)
                .filter(|variable| !variable.is_blank())
                .cloned()
                .collect(),
            Formula::Conjunction(children) | Formula::Disjunction(children) => children
                .iter()
                .flat_map(Formula::free_variables)
                .collect(),
            Formula::Negation(content) => content.free_variables(),
            Formula::Exist { variables, body } | Formula::ForAll { variables, body } => {
                let mut free = body.free_variables();
                free.retain(|variable| !variables.contains(variable));
                free
            }
        }
    }

    /// The variables bound by any quantifier of the formula.
    pub fn bound_variables(&self) -> BTreeSet<Variable> {
        match self {
            Formula::Atom(_) => BTreeSet::new(),
            Formula::Conjunction(children) | Formula::Disjunction(children) => children
                .iter()
                .flat_map(Formula::bound_variables)
                .collect(),
            Formula::Negation(content) => content.bound_variables(),
            Formula::Exist { variables, body } | Formula::ForAll { variables, body } => {
                let mut bound = body.bound_variables();
                bound.extend(variables.iter().cloned());
                bound
            }
        }
    }

    /// The names of all variables, including the quantified ones.
    pub fn variable_names(&self) -> FxHashSet<String> {
        self.variables()
            .into_iter()
            .chain(self.bound_variables())
            .map(|variable| variable.name().to_owned())
            .collect()
    }

    /// The alphabet of the characters used in the variable names, without the blank symbol.
    ///
    /// Falls back to the latin alphabet if the formula has no variables.
    pub fn active_alphabet(&self) -> VariableAlphabet {
        let symbols: BTreeSet<String> = self
            .variable_names()
            .iter()
            .flat_map(|name| name.chars())
            .filter(|c| *c != '_')
            .map(String::from)
            .collect();
        VariableAlphabet::new(symbols).unwrap_or_default()
    }

    /// The variables that are free in at least two conjuncts of a conjunction.
    ///
    /// Any other formula has no shared variables.
    pub fn shared_variables(&self) -> BTreeSet<Variable> {
        let Formula::Conjunction(children) = self else {
            return BTreeSet::new();
        };
        let mut occurrences: FxHashMap<Variable, usize> = FxHashMap::default();
        for variable in children.iter().flat_map(Formula::free_variables) {
            *occurrences.entry(variable).or_default() += 1;
        }
        occurrences
            .into_iter()
            .filter(|(_, count)| *count > 1)
            .map(|(variable, _)| variable)
            .collect()
    }

    /// Atoms have depth 0. A container is one level deeper than its deepest child.
    pub fn depth(&self) -> usize {
        match self {
            Formula::Atom(_) => 0,
            Formula::Conjunction(children) | Formula::Disjunction(children) => {
                children.iter().map(Formula::depth).max().unwrap_or(0) + 1
            }
            Formula::Negation(content) => content.depth() + 1,
            Formula::Exist { body, .. } | Formula::ForAll { body, .. } => body.depth() + 1,
        }
    }

    /// Whether the formula is valid. Sound but not complete.
    pub fn is_tautology(&self) -> bool {
        match self {
            Formula::Atom(atom) => atom.is_tautology(),
            Formula::Conjunction(children) => children.iter().all(Formula::is_tautology),
            Formula::Disjunction(children) => children.iter().any(Formula::is_tautology),
            Formula::Negation(content) => content.is_contradiction(),
            Formula::Exist { .. } => false,
            Formula::ForAll { body, .. } => body.is_tautology(),
        }
    }

    /// Whether the formula is unsatisfiable. Sound but not complete.
    pub fn is_contradiction(&self) -> bool {
        match self {
            Formula::Atom(atom) => atom.is_contradiction(),
            Formula::Conjunction(children) => children.iter().any(Formula::is_contradiction),
            Formula::Disjunction(children) => children.iter().all(Formula::is_contradiction),
            Formula::Negation(content) => content.is_tautology(),
            Formula::Exist { body, .. } => body.is_contradiction(),
            Formula::ForAll { .. } => false,
        }
    }

    /// Gives every occurrence of a variable the type of its first typed occurrence.
    pub fn infer_variable_types(&mut self) {
        let mut types: FxHashMap<Variable, TermType> = FxHashMap::default();
        for term in self.terms() {
            if let Term::Variable(variable) = term {
                if variable.term_type() != TermType::Undefined {
                    types
                        .entry(variable.clone())
                        .or_insert(variable.term_type());
                }
            }
        }

        for atom in self.atoms_mut() {
            for term in atom.terms_mut() {
                let Term::Variable(variable) = term else {
                    continue;
                };
                let Some(inferred) = types.get(variable).copied() else {
                    continue;
                };
                if variable.term_type() != TermType::Undefined && variable.term_type() != inferred {
                    tracing::warn!(
                        "Overwriting type {} of variable {variable} with {inferred}",
                        variable.term_type()
                    );
                }
                variable.set_term_type(inferred);
            }
        }
    }
}

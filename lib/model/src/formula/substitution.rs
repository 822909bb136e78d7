use crate::{Formula, Term, Variable, VariableAlphabet};
use rustc_hash::FxHashMap;
use std::collections::BTreeSet;

impl Formula {
    /// Replaces all variables of the substitution at once.
    ///
    /// Quantified variables are renamed when replaced by another variable and unbound when replaced
    /// by a constant.
    #[must_use]
    pub fn replace_variables(self, substitution: &FxHashMap<Variable, Term>) -> Formula {
        if substitution.is_empty() {
            return self;
        }
        match self {
            Formula::Atom(mut atom) => {
                for term in atom.terms_mut() {
                    if let Term::Variable(variable) = term {
                        if let Some(replacement) = substitution.get(variable) {
                            *term = replacement.clone();
                        }
                    }
                }
                Formula::Atom(atom)
            }
            Formula::Conjunction(children) => Formula::Conjunction(
                children
                    .into_iter()
                    .map(|child| child.replace_variables(substitution))
                    .collect(),
            ),
            Formula::Disjunction(children) => Formula::Disjunction(
                children
                    .into_iter()
                    .map(|child| child.replace_variables(substitution))
                    .collect(),
            ),
            Formula::Negation(content) => Formula::not(content.replace_variables(substitution)),
            Formula::Exist { variables, body } => Formula::Exist {
                variables: substitute_quantified(variables, substitution),
                body: Box::new(body.replace_variables(substitution)),
            },
            Formula::ForAll { variables, body } => Formula::ForAll {
                variables: substitute_quantified(variables, substitution),
                body: Box::new(body.replace_variables(substitution)),
            },
        }
    }

    #[must_use]
    pub fn replace_variable(self, variable: &Variable, term: &Term) -> Formula {
        let mut substitution = FxHashMap::default();
        substitution.insert(variable.clone(), term.clone());
        self.replace_variables(&substitution)
    }

    /// Applies the replacements one after the other, so that a later replacement also rewrites the
    /// terms introduced by an earlier one.
    #[must_use]
    pub fn replace_variables_chained(self, substitution: &[(Variable, Term)]) -> Formula {
        substitution
            .iter()
            .fold(self, |formula, (variable, term)| {
                formula.replace_variable(variable, term)
            })
    }

    /// Gives every occurrence of the blank variable its own fresh name.
    #[must_use]
    pub fn explicit_variables(mut self, alphabet: &VariableAlphabet) -> Formula {
        let mut reserved = self.variable_names();
        for atom in self.atoms_mut() {
            for term in atom.terms_mut() {
                let Term::Variable(variable) = term else {
                    continue;
                };
                if variable.is_blank() {
                    let name = alphabet.fresh_name(&reserved);
                    reserved.insert(name.clone());
                    let renamed = variable.renamed(name);
                    *variable = renamed;
                }
            }
        }
        self
    }
}

fn substitute_quantified(
    variables: BTreeSet<Variable>,
    substitution: &FxHashMap<Variable, Term>,
) -> BTreeSet<Variable> {
    variables
        .into_iter()
        .filter_map(|variable| match substitution.get(&variable) {
            Some(Term::Variable(replacement)) => Some(replacement.clone()),
            Some(_) => None,
            None => Some(variable),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use crate::{DataConstant, Formula, PredicateAtom, Term, Variable, VariableAlphabet};

    fn var(name: &str) -> Term {
        Variable::new(name).into()
    }

    fn atom(predicate: &str, terms: Vec<Term>) -> Formula {
        Formula::predicate(PredicateAtom::new(predicate, terms))
    }

    #[test]
    fn simultaneous_replacement() {
        let formula = atom("R", vec![var("x"), var("y")]);
        let substitution = [
            (Variable::new("x"), var("y")),
            (Variable::new("y"), var("z")),
        ]
        .into_iter()
        .collect();
        assert_eq!(
            formula.replace_variables(&substitution).to_string(),
            "R(y, z)"
        );
    }

    #[test]
    fn chained_replacement() {
        let formula = atom("R", vec![var("x"), var("y")]);
        let substitution = [
            (Variable::new("x"), var("y")),
            (Variable::new("y"), var("z")),
        ];
        assert_eq!(
            formula.replace_variables_chained(&substitution).to_string(),
            "R(z, z)"
        );
    }

    #[test]
    fn constants_unbind_quantified_variables() {
        let formula = Formula::exists(
            [Variable::new("x"), Variable::new("y")],
            atom("R", vec![var("x"), var("y")]),
        );
        let replaced = formula.replace_variable(&Variable::new("y"), &DataConstant::string("v").into());
        assert_eq!(replaced.to_string(), "\\exists x (R(x, \"v\"))");
    }

    #[test]
    fn blank_variables_become_explicit() {
        let formula = Formula::and(vec![
            atom("R", vec![var("a"), Variable::blank().into()]),
            atom("S", vec![Variable::blank().into()]),
        ]);
        assert_eq!(
            formula
                .explicit_variables(&VariableAlphabet::default())
                .to_string(),
            "R(a, b) AND S(c)"
        );
    }
}

//! Rewrites that bring formulas into the canonical shapes expected by the compilers.

use crate::{Atom, ContainerKind, Formula, QuantifierKind, Variable, VariableAlphabet};
use itertools::Itertools;
use rustc_hash::FxHashSet;
use std::collections::BTreeSet;

impl Formula {
    /// Collapses double negations, containers with a single child and quantifiers without
    /// variables.
    #[must_use]
    pub fn remove_unnecessary_container(self) -> Formula {
        let mut formula = self;
        loop {
            formula = match formula {
                Formula::Negation(content) => match *content {
                    Formula::Negation(inner) => *inner,
                    content => return Formula::not(content),
                },
                Formula::Conjunction(mut children) | Formula::Disjunction(mut children)
                    if children.len() == 1 =>
                {
                    children.swap_remove(0)
                }
                Formula::Exist { variables, body } | Formula::ForAll { variables, body }
                    if variables.is_empty() =>
                {
                    *body
                }
                formula => return formula,
            };
        }
    }

    /// Merges nested containers and quantifiers of the same kind into their parent.
    ///
    /// If `recursive` is set, the whole tree is flattened. Otherwise only the children of the root
    /// are merged.
    #[must_use]
    pub fn flatten(self, recursive: bool) -> Formula {
        let prepare = |child: Formula| {
            let child = if recursive { child.flatten(true) } else { child };
            child.remove_unnecessary_container()
        };

        let flattened = match self {
            Formula::Atom(_) => self,
            Formula::Conjunction(children) => Formula::Conjunction(splice(
                ContainerKind::Conjunction,
                children.into_iter().map(prepare),
            )),
            Formula::Disjunction(children) => Formula::Disjunction(splice(
                ContainerKind::Disjunction,
                children.into_iter().map(prepare),
            )),
            Formula::Negation(content) => Formula::not(prepare(*content)),
            Formula::Exist { variables, body } => {
                merge_quantifiers(QuantifierKind::Exist, variables, prepare(*body))
            }
            Formula::ForAll { variables, body } => {
                merge_quantifiers(QuantifierKind::ForAll, variables, prepare(*body))
            }
        };
        flattened.remove_unnecessary_container()
    }

    /// Simplifies the formula until it does not change anymore.
    ///
    /// Besides flattening and deduplication, a few heuristics remove redundant sub-formulas:
    /// - `A AND B AND (C OR B)` becomes `A AND B`,
    /// - `A AND B AND NOT (C AND B)` becomes `A AND B AND NOT (C)`,
    /// - tautological conjuncts and contradictory disjuncts are dropped,
    /// - quantified variables that do not occur free in the body are dropped.
    ///
    /// The heuristics are neither complete nor sound with respect to variable capture.
    #[must_use]
    pub fn optimize(self) -> Formula {
        let mut current = self;
        loop {
            let next = current.clone().optimize_step();
            if next == current {
                return next;
            }
            current = next;
        }
    }

    fn optimize_step(self) -> Formula {
        match self {
            Formula::Atom(_) => self,
            Formula::Negation(content) => {
                Formula::not(content.optimize_step().remove_unnecessary_container())
                    .remove_unnecessary_container()
            }
            Formula::Conjunction(children) => {
                optimize_container(ContainerKind::Conjunction, children)
            }
            Formula::Disjunction(children) => {
                optimize_container(ContainerKind::Disjunction, children)
            }
            Formula::Exist { variables, body } => {
                optimize_quantifier(QuantifierKind::Exist, variables, *body)
            }
            Formula::ForAll { variables, body } => {
                optimize_quantifier(QuantifierKind::ForAll, variables, *body)
            }
        }
    }

    /// Pushes negations down to the atoms (De Morgan).
    #[must_use]
    pub fn push_down_negation(self) -> Formula {
        self.push_down_negation_aux(false)
    }

    fn push_down_negation_aux(self, negated: bool) -> Formula {
        match self {
            Formula::Atom(Atom::True) if negated => Formula::falsity(),
            Formula::Atom(Atom::False) if negated => Formula::truth(),
            Formula::Atom(_) if negated => Formula::not(self),
            Formula::Atom(_) => self,
            Formula::Conjunction(children) => push_down_container(
                ContainerKind::Conjunction,
                children,
                negated,
            ),
            Formula::Disjunction(children) => push_down_container(
                ContainerKind::Disjunction,
                children,
                negated,
            ),
            Formula::Negation(content) => content.push_down_negation_aux(!negated),
            Formula::Exist { variables, body } => {
                push_down_quantifier(QuantifierKind::Exist, variables, *body, negated)
            }
            Formula::ForAll { variables, body } => {
                push_down_quantifier(QuantifierKind::ForAll, variables, *body, negated)
            }
        }
    }

    /// Renames quantified variables so that no two quantifiers bind the same name and no
    /// quantifier binds the name of a free variable.
    ///
    /// Fresh names avoid every variable name of the formula, bound ones included, so a renamed
    /// variable is never captured by a nested quantifier.
    #[must_use]
    pub fn distinguish_quantified_variables(self, alphabet: &VariableAlphabet) -> Formula {
        let mut names = Renaming {
            alphabet,
            bound: self
                .free_variables()
                .into_iter()
                .map(|variable| variable.name().to_owned())
                .collect(),
            taken: self.variable_names(),
        };
        self.distinguish_aux(&mut names)
    }

    fn distinguish_aux(self, names: &mut Renaming<'_>) -> Formula {
        match self {
            Formula::Atom(_) => self,
            Formula::Conjunction(children) => Formula::Conjunction(
                children
                    .into_iter()
                    .map(|child| child.distinguish_aux(names))
                    .collect(),
            ),
            Formula::Disjunction(children) => Formula::Disjunction(
                children
                    .into_iter()
                    .map(|child| child.distinguish_aux(names))
                    .collect(),
            ),
            Formula::Negation(content) => Formula::not(content.distinguish_aux(names)),
            Formula::Exist { variables, body } => {
                distinguish_quantifier(QuantifierKind::Exist, variables, *body, names)
            }
            Formula::ForAll { variables, body } => {
                distinguish_quantifier(QuantifierKind::ForAll, variables, *body, names)
            }
        }
    }

    /// Moves all quantifiers in front of a quantifier-free matrix.
    ///
    /// Quantified variables are renamed apart first. The quantifiers of the children of a
    /// container are gathered into one existential quantifier wrapping one universal quantifier.
    #[must_use]
    pub fn prenex_form(self, alphabet: &VariableAlphabet) -> Formula {
        self.distinguish_quantified_variables(alphabet).prenex_aux()
    }

    fn prenex_aux(self) -> Formula {
        match self {
            Formula::Atom(_) => self,
            Formula::Exist { variables, body } => {
                Formula::quantifier(QuantifierKind::Exist, variables, body.prenex_aux())
                    .flatten(false)
            }
            Formula::ForAll { variables, body } => {
                Formula::quantifier(QuantifierKind::ForAll, variables, body.prenex_aux())
                    .flatten(false)
            }
            Formula::Negation(content) => {
                let (prefix, matrix) = content.prenex_aux().split_prefix();
                prefix.into_iter().rev().fold(
                    Formula::not(matrix).remove_unnecessary_container(),
                    |formula, (kind, variables)| Formula::quantifier(kind.dual(), variables, formula),
                )
            }
            Formula::Conjunction(children) => prenex_container(ContainerKind::Conjunction, children),
            Formula::Disjunction(children) => prenex_container(ContainerKind::Disjunction, children),
        }
    }

    /// Splits the leading quantifiers (outermost first) from the rest of the formula.
    fn split_prefix(self) -> (Vec<(QuantifierKind, BTreeSet<Variable>)>, Formula) {
        let mut prefix = Vec::new();
        let mut current = self;
        loop {
            current = match current {
                Formula::Exist { variables, body } => {
                    prefix.push((QuantifierKind::Exist, variables));
                    *body
                }
                Formula::ForAll { variables, body } => {
                    prefix.push((QuantifierKind::ForAll, variables));
                    *body
                }
                matrix => return (prefix, matrix),
            };
        }
    }

    /// Rewrites `\forall x (φ)` as `NOT (\exists x (NOT (φ)))` everywhere.
    ///
    /// A universal quantifier over a tautology becomes `TRUE`.
    #[must_use]
    pub fn eliminate_universal_quantifiers(self) -> Formula {
        match self {
            Formula::Atom(_) => self,
            Formula::Conjunction(children) => Formula::Conjunction(
                children
                    .into_iter()
                    .map(Formula::eliminate_universal_quantifiers)
                    .collect(),
            ),
            Formula::Disjunction(children) => Formula::Disjunction(
                children
                    .into_iter()
                    .map(Formula::eliminate_universal_quantifiers)
                    .collect(),
            ),
            Formula::Negation(content) => Formula::not(content.eliminate_universal_quantifiers()),
            Formula::Exist { variables, body } => Formula::Exist {
                variables,
                body: Box::new(body.eliminate_universal_quantifiers()),
            },
            Formula::ForAll { variables, body } => {
                let body = body.eliminate_universal_quantifiers();
                if body.is_tautology() {
                    Formula::truth()
                } else {
                    Formula::quantifier(QuantifierKind::Exist, variables, body.negate()).negate()
                }
            }
        }
    }

    /// Strips any number of leading existential quantifiers.
    fn strip_exists(&self) -> &Formula {
        let mut formula = self;
        while let Formula::Exist { body, .. } = formula {
            formula = body.as_ref();
        }
        formula
    }
}

fn splice(kind: ContainerKind, children: impl Iterator<Item = Formula>) -> Vec<Formula> {
    let mut spliced = Vec::new();
    for child in children {
        match (child, kind) {
            (Formula::Conjunction(nested), ContainerKind::Conjunction)
            | (Formula::Disjunction(nested), ContainerKind::Disjunction) => spliced.extend(nested),
            (child, _) => spliced.push(child),
        }
    }
    spliced
}

fn merge_quantifiers(kind: QuantifierKind, mut variables: BTreeSet<Variable>, body: Formula) -> Formula {
    let mut body = body;
    loop {
        body = match (body, kind) {
            (Formula::Exist { variables: nested, body: inner }, QuantifierKind::Exist)
            | (Formula::ForAll { variables: nested, body: inner }, QuantifierKind::ForAll) => {
                variables.extend(nested);
                *inner
            }
            (body, _) => return Formula::quantifier(kind, variables, body),
        };
    }
}

fn optimize_container(kind: ContainerKind, children: Vec<Formula>) -> Formula {
    let children = children
        .into_iter()
        .map(|child| child.optimize_step().remove_unnecessary_container())
        .collect();
    let children = match Formula::container(kind, children).flatten(false) {
        Formula::Conjunction(children) if kind == ContainerKind::Conjunction => children,
        Formula::Disjunction(children) if kind == ContainerKind::Disjunction => children,
        other => return other,
    };
    let children = children.into_iter().unique().collect();
    Formula::container(kind, remove_redundant_formulas(kind, children))
        .remove_unnecessary_container()
}

/// Applies the redundancy heuristics to the children of a container.
fn remove_redundant_formulas(kind: ContainerKind, children: Vec<Formula>) -> Vec<Formula> {
    let atoms: Vec<Formula> = children
        .iter()
        .filter(|child| child.as_predicate().is_some())
        .cloned()
        .collect();
    let contains_atom = |formulas: &[Formula]| formulas.iter().any(|f| atoms.contains(f));

    children
        .into_iter()
        .filter(|child| {
            !child
                .strip_exists()
                .container_children(kind.dual())
                .is_some_and(contains_atom)
        })
        .map(|child| match child {
            Formula::Negation(content) => {
                let content = match *content {
                    Formula::Exist { variables, body } => Formula::Exist {
                        variables,
                        body: Box::new(remove_atoms(kind, *body, &atoms)),
                    },
                    content => remove_atoms(kind, content, &atoms),
                };
                Formula::not(content.remove_unnecessary_container()).remove_unnecessary_container()
            }
            child => child,
        })
        .filter(|child| match kind {
            ContainerKind::Conjunction => !child.is_tautology(),
            ContainerKind::Disjunction => !child.is_contradiction(),
        })
        .collect()
}

fn remove_atoms(kind: ContainerKind, formula: Formula, atoms: &[Formula]) -> Formula {
    match (formula, kind) {
        (Formula::Conjunction(children), ContainerKind::Conjunction)
        | (Formula::Disjunction(children), ContainerKind::Disjunction) => Formula::container(
            kind,
            children
                .into_iter()
                .filter(|child| !atoms.contains(child))
                .collect(),
        ),
        (formula, _) => formula,
    }
}

fn optimize_quantifier(kind: QuantifierKind, variables: BTreeSet<Variable>, body: Formula) -> Formula {
    let body = body.optimize_step().remove_unnecessary_container();
    match Formula::quantifier(kind, variables, body).flatten(false) {
        Formula::Exist { variables, body } => {
            restrict_quantified(QuantifierKind::Exist, variables, *body)
        }
        Formula::ForAll { variables, body } => {
            restrict_quantified(QuantifierKind::ForAll, variables, *body)
        }
        other => other,
    }
}

fn restrict_quantified(kind: QuantifierKind, mut variables: BTreeSet<Variable>, body: Formula) -> Formula {
    let free = body.free_variables();
    variables.retain(|variable| free.contains(variable));
    Formula::quantifier(kind, variables, body).remove_unnecessary_container()
}

fn push_down_container(kind: ContainerKind, children: Vec<Formula>, negated: bool) -> Formula {
    let kind = if negated { kind.dual() } else { kind };
    Formula::container(
        kind,
        children
            .into_iter()
            .map(|child| child.push_down_negation_aux(negated))
            .collect(),
    )
}

fn push_down_quantifier(
    kind: QuantifierKind,
    variables: BTreeSet<Variable>,
    body: Formula,
    negated: bool,
) -> Formula {
    let kind = if negated { kind.dual() } else { kind };
    Formula::quantifier(kind, variables, body.push_down_negation_aux(negated))
}

/// The names seen while renaming quantified variables apart.
struct Renaming<'a> {
    alphabet: &'a VariableAlphabet,
    /// Free names and names bound by the quantifiers visited so far.
    bound: FxHashSet<String>,
    /// Every name a fresh variable must not use.
    taken: FxHashSet<String>,
}

fn distinguish_quantifier(
    kind: QuantifierKind,
    variables: BTreeSet<Variable>,
    body: Formula,
    names: &mut Renaming<'_>,
) -> Formula {
    let mut body = body;
    let mut distinguished = BTreeSet::new();
    for variable in variables {
        if names.bound.contains(variable.name()) {
            let name = names.alphabet.fresh_name(&names.taken);
            names.taken.insert(name.clone());
            names.bound.insert(name.clone());
            let fresh = variable.renamed(name);
            body = body.replace_variable(&variable, &fresh.clone().into());
            distinguished.insert(fresh);
        } else {
            names.bound.insert(variable.name().to_owned());
            distinguished.insert(variable);
        }
    }
    Formula::quantifier(kind, distinguished, body.distinguish_aux(names))
}

fn prenex_container(kind: ContainerKind, children: Vec<Formula>) -> Formula {
    let mut existential = BTreeSet::new();
    let mut universal = BTreeSet::new();
    let matrices = children
        .into_iter()
        .map(|child| {
            let (prefix, matrix) = child.prenex_aux().split_prefix();
            for (kind, variables) in prefix {
                match kind {
                    QuantifierKind::Exist => existential.extend(variables),
                    QuantifierKind::ForAll => universal.extend(variables),
                }
            }
            matrix
        })
        .collect();

    let mut result = Formula::container(kind, matrices);
    if !universal.is_empty() {
        result = Formula::quantifier(QuantifierKind::ForAll, universal, result);
    }
    if !existential.is_empty() {
        result = Formula::quantifier(QuantifierKind::Exist, existential, result);
    }
    result
}

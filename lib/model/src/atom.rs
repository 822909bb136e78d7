use crate::{Formula, ModelError, Term, TermType, Variable, VariableAlphabet};
use itertools::Itertools;
use rustc_hash::{FxHashMap, FxHashSet, FxHasher};
use std::fmt::{Display, Formatter};
use std::hash::{Hash, Hasher};

/// The ontological role of a predicate.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PredicateKind {
    /// A plain relation of any arity, without term type constraints.
    #[default]
    Undefined,
    /// A unary predicate over individuals.
    Concept,
    /// A binary predicate between two individuals.
    Role,
    /// A binary predicate between an individual and a literal value.
    Attribute,
}

impl PredicateKind {
    /// The arity required by this kind, if any.
    pub fn arity(self) -> Option<usize> {
        match self {
            PredicateKind::Undefined => None,
            PredicateKind::Concept => Some(1),
            PredicateKind::Role | PredicateKind::Attribute => Some(2),
        }
    }
}

impl Display for PredicateKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            PredicateKind::Undefined => "predicate",
            PredicateKind::Concept => "concept",
            PredicateKind::Role => "role",
            PredicateKind::Attribute => "attribute",
        })
    }
}

/// Classifies predicate identifiers, usually by looking them up in an ontology.
pub trait Signature {
    /// Returns the kind of the predicate or [None] if the predicate is unknown.
    fn predicate_kind(&self, predicate: &str) -> Option<PredicateKind>;
}

/// A [Signature] backed by an in-memory table.
#[derive(Debug, Default, Clone)]
pub struct StaticSignature {
    kinds: FxHashMap<String, PredicateKind>,
}

impl StaticSignature {
    /// Creates a new empty [StaticSignature].
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, predicate: impl Into<String>, kind: PredicateKind) {
        self.kinds.insert(predicate.into(), kind);
    }

    #[must_use]
    pub fn with_concept(mut self, predicate: impl Into<String>) -> Self {
        self.insert(predicate, PredicateKind::Concept);
        self
    }

    #[must_use]
    pub fn with_role(mut self, predicate: impl Into<String>) -> Self {
        self.insert(predicate, PredicateKind::Role);
        self
    }

    #[must_use]
    pub fn with_attribute(mut self, predicate: impl Into<String>) -> Self {
        self.insert(predicate, PredicateKind::Attribute);
        self
    }
}

impl Signature for StaticSignature {
    fn predicate_kind(&self, predicate: &str) -> Option<PredicateKind> {
        self.kinds.get(predicate).copied()
    }
}

/// An atom `P(t1, ..., tn)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PredicateAtom {
    identifier: String,
    terms: Vec<Term>,
    kind: PredicateKind,
}

impl PredicateAtom {
    /// Creates a new unclassified [PredicateAtom]. No arity or type checks are applied.
    pub fn new(identifier: impl Into<String>, terms: Vec<Term>) -> Self {
        Self {
            identifier: identifier.into(),
            terms,
            kind: PredicateKind::Undefined,
        }
    }

    /// Creates a new [PredicateAtom] whose kind is guessed from its arity and the type of its
    /// second term.
    pub fn classified(identifier: impl Into<String>, terms: Vec<Term>) -> Result<Self, ModelError> {
        let kind = match terms.as_slice() {
            [_] => PredicateKind::Concept,
            [_, second] => match second.term_type() {
                TermType::Object => PredicateKind::Role,
                TermType::Data => PredicateKind::Attribute,
                TermType::Undefined => PredicateKind::Undefined,
            },
            _ => PredicateKind::Undefined,
        };
        Self::with_kind(identifier, terms, kind)
    }

    /// Creates a new [PredicateAtom] of the given kind, checking arity and term types.
    ///
    /// The type tags of the variables are fixed by the positions they occur in.
    pub fn with_kind(
        identifier: impl Into<String>,
        mut terms: Vec<Term>,
        kind: PredicateKind,
    ) -> Result<Self, ModelError> {
        let identifier = identifier.into();
        if let Some(expected) = kind.arity() {
            if terms.len() != expected {
                return ModelError::arity(identifier, kind, expected, terms.len());
            }
        }

        let required = |position: usize| match (kind, position) {
            (PredicateKind::Undefined, _) => None,
            (_, 0) | (PredicateKind::Role, 1) => Some(TermType::Object),
            (PredicateKind::Attribute, 1) => Some(TermType::Data),
            _ => None,
        };
        for (position, term) in terms.iter_mut().enumerate() {
            let Some(expected) = required(position) else {
                continue;
            };
            match term {
                Term::Variable(variable) if variable.is_blank() => {}
                Term::Variable(variable) if variable.term_type() == TermType::Undefined => {
                    variable.set_term_type(expected);
                }
                _ if term.term_type() != expected => {
                    return Err(ModelError::TermType {
                        predicate: identifier,
                        term: term.to_string(),
                        expected,
                        actual: term.term_type(),
                    });
                }
                _ => {}
            }
        }

        Ok(Self {
            identifier,
            terms,
            kind,
        })
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    pub(crate) fn terms_mut(&mut self) -> &mut [Term] {
        &mut self.terms
    }

    pub fn kind(&self) -> PredicateKind {
        self.kind
    }

    pub fn arity(&self) -> usize {
        self.terms.len()
    }

    pub fn variables(&self) -> impl Iterator<Item = &Variable> {
        self.terms.iter().filter_map(Term::as_variable)
    }

    /// Computes the substitution of this atom's variables that turns it into `other`.
    ///
    /// Returns [None] if the atoms have different predicates or cannot be unified.
    pub fn unification_mapping(&self, other: &PredicateAtom) -> Option<FxHashMap<Variable, Term>> {
        if self.identifier != other.identifier || self.arity() != other.arity() {
            return None;
        }

        let mut mapping = FxHashMap::default();
        for (own, target) in self.terms.iter().zip(&other.terms) {
            match own {
                Term::Variable(variable) => {
                    if let Some(bound) = mapping.get(variable) {
                        if bound != target {
                            return None;
                        }
                    } else {
                        mapping.insert(variable.clone(), target.clone());
                    }
                }
                constant if constant != target => return None,
                _ => {}
            }
        }
        Some(mapping)
    }

    /// Moves constants and repeated variables into explicit equalities.
    ///
    /// For example, `R(x, x, "a")` becomes `\exists b, c (R(x, b, c) AND b = x AND c = "a")`.
    pub fn explode(&self, alphabet: &VariableAlphabet) -> Formula {
        let mut reserved: FxHashSet<String> = self
            .variables()
            .map(|variable| variable.name().to_owned())
            .collect();
        let mut seen = FxHashSet::default();
        let mut terms = Vec::with_capacity(self.terms.len());
        let mut quantified = Vec::new();
        let mut equalities = Vec::new();

        for term in &self.terms {
            let keep = match term {
                Term::Variable(variable) => variable.is_blank() || seen.insert(variable.clone()),
                _ => false,
            };
            if keep {
                terms.push(term.clone());
                continue;
            }

            let name = alphabet.fresh_name(&reserved);
            reserved.insert(name.clone());
            let fresh = Variable::new(name).with_type(term.term_type());
            equalities.push(Formula::equal(fresh.clone().into(), term.clone()));
            terms.push(fresh.clone().into());
            quantified.push(fresh);
        }

        let atom = Formula::predicate(Self {
            identifier: self.identifier.clone(),
            terms,
            kind: self.kind,
        });
        if quantified.is_empty() {
            return atom;
        }
        Formula::exists(
            quantified,
            Formula::and([atom].into_iter().chain(equalities).collect()),
        )
    }
}

impl Display for PredicateAtom {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.identifier, self.terms.iter().join(", "))
    }
}

/// The operator of a [ComparisonAtom].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComparisonOperator {
    Equal,
    NotEqual,
}

impl ComparisonOperator {
    pub fn symbol(self) -> &'static str {
        match self {
            ComparisonOperator::Equal => "=",
            ComparisonOperator::NotEqual => "!=",
        }
    }

    /// Whether swapping the operands preserves the meaning of the comparison.
    pub fn is_symmetric(self) -> bool {
        match self {
            ComparisonOperator::Equal | ComparisonOperator::NotEqual => true,
        }
    }

    #[must_use]
    pub fn negate(self) -> Self {
        match self {
            ComparisonOperator::Equal => ComparisonOperator::NotEqual,
            ComparisonOperator::NotEqual => ComparisonOperator::Equal,
        }
    }
}

/// A comparison `left <op> right` between two terms.
#[derive(Debug, Clone)]
pub struct ComparisonAtom {
    operator: ComparisonOperator,
    left: Term,
    right: Term,
}

impl ComparisonAtom {
    pub fn new(operator: ComparisonOperator, left: Term, right: Term) -> Self {
        Self {
            operator,
            left,
            right,
        }
    }

    /// Creates a new equality.
    pub fn equal(left: Term, right: Term) -> Self {
        Self::new(ComparisonOperator::Equal, left, right)
    }

    /// Creates a new strict inequality.
    pub fn not_equal(left: Term, right: Term) -> Self {
        Self::new(ComparisonOperator::NotEqual, left, right)
    }

    pub fn operator(&self) -> ComparisonOperator {
        self.operator
    }

    pub fn left(&self) -> &Term {
        &self.left
    }

    pub fn right(&self) -> &Term {
        &self.right
    }

    pub(crate) fn terms_mut(&mut self) -> [&mut Term; 2] {
        [&mut self.left, &mut self.right]
    }

    /// Returns the comparison with the opposite operator.
    #[must_use]
    pub fn negate(&self) -> Self {
        Self::new(self.operator.negate(), self.left.clone(), self.right.clone())
    }

    pub fn is_tautology(&self) -> bool {
        self.operator == ComparisonOperator::Equal && self.left == self.right
    }

    pub fn is_contradiction(&self) -> bool {
        self.operator == ComparisonOperator::NotEqual && self.left == self.right
    }
}

impl PartialEq for ComparisonAtom {
    fn eq(&self, other: &Self) -> bool {
        self.operator == other.operator
            && ((self.left == other.left && self.right == other.right)
                || (self.operator.is_symmetric()
                    && self.left == other.right
                    && self.right == other.left))
    }
}

impl Eq for ComparisonAtom {}

impl Hash for ComparisonAtom {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.operator.hash(state);
        if self.operator.is_symmetric() {
            let left = term_hash(&self.left);
            let right = term_hash(&self.right);
            state.write_u64(left.min(right));
            state.write_u64(left.max(right));
        } else {
            self.left.hash(state);
            self.right.hash(state);
        }
    }
}

fn term_hash(term: &Term) -> u64 {
    let mut hasher = FxHasher::default();
    term.hash(&mut hasher);
    hasher.finish()
}

impl Display for ComparisonAtom {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {}", self.left, self.operator.symbol(), self.right)
    }
}

/// The atomic formulas.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Atom {
    Predicate(PredicateAtom),
    Comparison(ComparisonAtom),
    True,
    False,
}

impl Atom {
    pub fn terms(&self) -> Vec<&Term> {
        match self {
            Atom::Predicate(atom) => atom.terms().iter().collect(),
            Atom::Comparison(atom) => vec![atom.left(), atom.right()],
            Atom::True | Atom::False => Vec::new(),
        }
    }

    pub(crate) fn terms_mut(&mut self) -> Vec<&mut Term> {
        match self {
            Atom::Predicate(atom) => atom.terms_mut().iter_mut().collect(),
            Atom::Comparison(atom) => atom.terms_mut().into_iter().collect(),
            Atom::True | Atom::False => Vec::new(),
        }
    }

    pub fn is_tautology(&self) -> bool {
        match self {
            Atom::Predicate(_) | Atom::False => false,
            Atom::Comparison(atom) => atom.is_tautology(),
            Atom::True => true,
        }
    }

    pub fn is_contradiction(&self) -> bool {
        match self {
            Atom::Predicate(_) | Atom::True => false,
            Atom::Comparison(atom) => atom.is_contradiction(),
            Atom::False => true,
        }
    }
}

impl Display for Atom {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Atom::Predicate(atom) => atom.fmt(f),
            Atom::Comparison(atom) => atom.fmt(f),
            Atom::True => f.write_str("TRUE"),
            Atom::False => f.write_str("FALSE"),
        }
    }
}

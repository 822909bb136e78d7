use crate::{PredicateKind, TermType};

/// Errors raised while building terms, atoms and formulas.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ModelError {
    /// The number of terms does not fit the kind of the predicate.
    #[error("The {kind} {predicate} expects {expected} term(s) but {actual} were given.")]
    PredicateArity {
        predicate: String,
        kind: PredicateKind,
        expected: usize,
        actual: usize,
    },
    /// A term occurs in a position that requires the other term type.
    #[error("The term {term} of {predicate} has type {actual} but type {expected} is required.")]
    TermType {
        predicate: String,
        term: String,
        expected: TermType,
        actual: TermType,
    },
    /// A variable alphabet must contain at least one symbol.
    #[error("A variable alphabet cannot be empty.")]
    EmptyAlphabet,
}

impl ModelError {
    /// Creates a new [ModelError::PredicateArity].
    pub fn arity<T>(
        predicate: impl Into<String>,
        kind: PredicateKind,
        expected: usize,
        actual: usize,
    ) -> Result<T, Self> {
        Err(Self::PredicateArity {
            predicate: predicate.into(),
            kind,
            expected,
            actual,
        })
    }
}

pub type SparqlResult<T> = Result<T, SparqlCompilationError>;

/// An error raised while compiling a formula into SPARQL.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum SparqlCompilationError {
    /// Only classes and properties can be expressed as triple patterns.
    #[error("The predicate {predicate} has arity {arity}, only unary and binary predicates can be expressed in SPARQL.")]
    UnsupportedArity { predicate: String, arity: usize },
    #[error("Internal error while compiling into SPARQL: {0}. This is likely a bug.")]
    Internal(String),
}

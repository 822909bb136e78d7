use fol_query_model::{Formula, Variable};
use itertools::Itertools;
use std::collections::BTreeSet;

pub type SqlResult<T> = Result<T, SqlificationError>;

/// An error raised while compiling a formula into SQL.
///
/// Every variant except [SqlificationError::Internal] carries the compiled formula after
/// preprocessing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum SqlificationError {
    /// The schema does not map the predicate to a table.
    #[error("Error with query:\n{query}\nNo SQL table has been associated to predicate {predicate}.")]
    NoSqlTableFound { query: Formula, predicate: String },
    #[error(
        "Error with query:\n{query}\nAtom {atom} and table {table} have different arities \
         (respectively, {atom_arity} and {table_arity})."
    )]
    ArityMismatch {
        query: Formula,
        atom: String,
        table: String,
        atom_arity: usize,
        table_arity: usize,
    },
    /// Some free variables cannot be projected by any sub-query, so the formula is not
    /// domain-independent in the required shape.
    #[error(
        "Error with query:\n{query}\nSome free variables can't be actually selected: {}\n\
         You may need to add a quantifier for such variables. Please reformulate the query.",
        .variables.iter().join(", ")
    )]
    UnsafeQuery {
        query: Formula,
        variables: BTreeSet<Variable>,
    },
    /// Variables of a conjunction that must be projected or joined are not selectable from
    /// any conjunct that can be joined.
    #[error(
        "Error with query:\n{query}\nImpossible to select or join variables {} within \
         conjunction {conjunction}\nYou may need to rephrase such conjunction (maybe distributing it).",
        .variables.iter().join(", ")
    )]
    UnselectableVariables {
        query: Formula,
        variables: BTreeSet<Variable>,
        conjunction: Formula,
    },
    #[error("Internal error while compiling into SQL: {0}. This is likely a bug.")]
    Internal(String),
}

use fol_query_compiler::{SchemaError, SparqlCompilationError, SqlificationError};
use fol_query_parser::ParseError;

/// An error raised by a [`QueryCompiler`](crate::QueryCompiler).
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum CompilationError {
    /// The query text could not be parsed.
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Schema(#[from] SchemaError),
    /// The formula cannot be expressed in SQL.
    #[error(transparent)]
    Sql(#[from] SqlificationError),
    /// The formula cannot be expressed in SPARQL.
    #[error(transparent)]
    Sparql(#[from] SparqlCompilationError),
}

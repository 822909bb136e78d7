//! Parses the Datalog surface syntax of conjunctive queries into [fol_query_model::Formula]s.

mod datalog;
mod error;
mod lexer;
mod query;

pub use datalog::DatalogParser;
pub use error::*;
pub use query::ConjunctiveQuery;

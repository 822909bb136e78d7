//! Compilers that turn domain-independent FOL formulas into query text.
//!
//! The [SqlCompiler] needs a [DbSchema] that maps every predicate to a table. The
//! [SparqlCompiler] uses the predicates as classes and properties directly.

mod sparql;
mod sql;

pub use sparql::*;
pub use sql::*;

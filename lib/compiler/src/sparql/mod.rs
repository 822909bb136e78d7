mod compiler;
mod error;

pub use compiler::{SparqlCompiler, SparqlRewriting};
pub use error::*;

//! The first-order logic model of fol-query: terms, atoms, formulas and the rewrites that
//! normalize them before they are compiled into SQL or SPARQL.

mod atom;
mod error;
mod flat;
mod formula;
mod naming;
mod term;

pub use atom::*;
pub use error::*;
pub use flat::*;
pub use formula::*;
pub use naming::*;
pub use term::*;

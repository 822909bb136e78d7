mod compiler;
mod error;
mod schema;
mod text;

pub use compiler::SqlCompiler;
pub use error::*;
pub use schema::*;

#![doc = include_str!("../README.md")]
#![doc(test(attr(deny(warnings))))]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

mod config;
mod error;
mod pipeline;

pub use config::CompilerConfig;
pub use error::CompilationError;
pub use pipeline::QueryCompiler;

pub mod model {
    pub use fol_query_model::*;
}

pub mod parser {
    pub use fol_query_parser::*;
}

pub mod compiler {
    pub use fol_query_compiler::*;
}

use clap::{Parser, Subcommand, ValueHint};
use std::path::PathBuf;

#[derive(Parser)]
#[command(about, version, name = "fol-query")]
/// Compiles first-order logic queries into SQL and SPARQL
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

/// Where the Datalog query is read from.
#[derive(clap::Args)]
pub struct QueryInput {
    /// The query, e.g. "Q(x) :- C(x), R(x, y) ."
    #[arg(short, long, conflicts_with = "file")]
    pub query: Option<String>,
    /// File containing the query
    ///
    /// If neither a query nor a file is given, stdin is read.
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    pub file: Option<PathBuf>,
    /// Do not remove redundant sub-formulas before compiling
    #[arg(long)]
    pub no_optimize: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Compile a query into a SQL statement
    Sql {
        #[command(flatten)]
        input: QueryInput,
        /// CSV file that maps tables to their columns
        ///
        /// Every line has the form "table,column1[,column2...]". Predicates are mapped to the
        /// table with the same name.
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        schema: PathBuf,
        /// Allow duplicate rows in the result
        #[arg(long)]
        no_distinct: bool,
        /// Rename the projected columns to <prefix>0, <prefix>1, ...
        #[arg(long)]
        alias_columns: bool,
        /// The prefix of the column aliases [default: X]
        #[arg(long, requires = "alias_columns")]
        alias_prefix: Option<String>,
    },
    /// Compile a query into a SPARQL query
    Sparql {
        #[command(flatten)]
        input: QueryInput,
    },
    /// Print the normalized formula of a query
    Normalize {
        #[command(flatten)]
        input: QueryInput,
        /// Push negations down to the atoms
        #[arg(long)]
        push_negation: bool,
        /// Move all quantifiers to the front
        #[arg(long)]
        prenex: bool,
    },
}

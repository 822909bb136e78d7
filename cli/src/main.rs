#![allow(clippy::print_stdout, reason = "the compiled queries are written to stdout")]
use crate::cli::{Args, Command, QueryInput};
use anyhow::{bail, Context};
use clap::Parser;
use fol_query::compiler::DbSchema;
use fol_query::model::Formula;
use fol_query::{CompilerConfig, QueryCompiler};
use std::fs;
use std::io::{stdin, Read};
use tracing_subscriber::EnvFilter;

mod cli;

pub fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let matches = Args::parse();
    match matches.command {
        Command::Sql {
            input,
            schema,
            no_distinct,
            alias_columns,
            alias_prefix,
        } => {
            let schema = DbSchema::from_path(&schema).with_context(|| {
                format!("Could not load the schema mapping {}", schema.display())
            })?;
            let mut config = config(&input)
                .with_distinct(!no_distinct)
                .with_alias_columns(alias_columns);
            if let Some(prefix) = alias_prefix {
                config = config.with_column_alias_prefix(prefix);
            }
            let compiler = QueryCompiler::new(config);
            let formula = parse(&compiler, &input)?;
            println!("{}", compiler.compile_sql(&formula, &schema)?);
        }
        Command::Sparql { input } => {
            let compiler = QueryCompiler::new(config(&input));
            let formula = parse(&compiler, &input)?;
            println!("{}", compiler.compile_sparql(&formula)?);
        }
        Command::Normalize {
            input,
            push_negation,
            prenex,
        } => {
            let compiler = QueryCompiler::new(config(&input));
            let mut formula = parse(&compiler, &input)?;
            if push_negation {
                formula = compiler.push_down_negation(&formula);
            }
            formula = compiler.normalize(&formula);
            if prenex {
                formula = compiler.prenex_form(&formula);
            }
            println!("{formula}");
        }
    }
    Ok(())
}

fn config(input: &QueryInput) -> CompilerConfig {
    CompilerConfig::default().with_optimize(!input.no_optimize)
}

fn parse(compiler: &QueryCompiler, input: &QueryInput) -> anyhow::Result<Formula> {
    let query = read_query(input)?;
    compiler
        .parse(&query)
        .with_context(|| format!("Invalid query {}", query.trim()))
}

fn read_query(input: &QueryInput) -> anyhow::Result<String> {
    if let Some(query) = &input.query {
        return Ok(query.clone());
    }
    if let Some(file) = &input.file {
        return fs::read_to_string(file)
            .with_context(|| format!("Could not read the query file {}", file.display()));
    }
    let mut query = String::new();
    stdin()
        .lock()
        .read_to_string(&mut query)
        .context("Could not read the query from stdin")?;
    if query.trim().is_empty() {
        bail!("No query given, use --query, --file or stdin")
    }
    Ok(query)
}

#[cfg(test)]
#[allow(clippy::panic_in_result_fn, reason = "assertions in tests")]
mod tests {
    use anyhow::Result;
    use assert_cmd::Command;
    use assert_fs::prelude::*;
    use assert_fs::NamedTempFile;
    use predicates::prelude::*;

    const SCHEMA: &str = "C,attribute\nD,attribute\nR,subject,object\n";

    fn cli_command() -> Command {
        let mut command = Command::new(env!("CARGO"));
        command.arg("run").arg("--bin").arg("fol-query");
        command.arg("--");
        command
    }

    fn schema_file() -> Result<NamedTempFile> {
        let file = NamedTempFile::new("schema.csv")?;
        file.write_str(SCHEMA)?;
        Ok(file)
    }

    #[test]
    fn cli_help() {
        cli_command()
            .assert()
            .failure()
            .stdout("")
            .stderr(predicate::str::contains("Usage"));
    }

    #[test]
    fn cli_sql_from_argument() -> Result<()> {
        let schema = schema_file()?;
        cli_command()
            .arg("sql")
            .arg("--schema")
            .arg(schema.path())
            .arg("--query")
            .arg("Q(x) :- C(x) .")
            .assert()
            .success()
            .stdout("SELECT DISTINCT attribute AS x FROM \"C\" C1\n");
        Ok(())
    }

    #[test]
    fn cli_sql_with_aliases_from_stdin() -> Result<()> {
        let schema = schema_file()?;
        cli_command()
            .arg("sql")
            .arg("--schema")
            .arg(schema.path())
            .arg("--no-distinct")
            .arg("--alias-columns")
            .arg("--alias-prefix")
            .arg("col")
            .write_stdin("Q(x, y) :- R(x, y) .")
            .assert()
            .success()
            .stdout("SELECT object AS col1, subject AS col0 FROM \"R\" R1\n");
        Ok(())
    }

    #[test]
    fn cli_sql_from_file() -> Result<()> {
        let schema = schema_file()?;
        let query = NamedTempFile::new("query.dl")?;
        query.write_str("Q() :- C(x), D(x) .\n")?;
        cli_command()
            .arg("sql")
            .arg("--schema")
            .arg(schema.path())
            .arg("--file")
            .arg(query.path())
            .assert()
            .success()
            .stdout(
                predicate::str::contains("\"D\" D1").and(predicate::str::ends_with("LIMIT 1\n")),
            );
        Ok(())
    }

    #[test]
    fn cli_sql_reports_missing_tables() -> Result<()> {
        let schema = schema_file()?;
        cli_command()
            .arg("sql")
            .arg("--schema")
            .arg(schema.path())
            .arg("--query")
            .arg("Q(x) :- E(x) .")
            .assert()
            .failure()
            .stderr(predicate::str::contains(
                "No SQL table has been associated to predicate E",
            ));
        Ok(())
    }

    #[test]
    fn cli_sparql() {
        cli_command()
            .arg("sparql")
            .arg("--query")
            .arg("Q(x) :- C(x) .")
            .assert()
            .success()
            .stdout("SELECT DISTINCT ?x {\n?x a <C> .\n}\n");
    }

    #[test]
    fn cli_normalize() {
        cli_command()
            .arg("normalize")
            .arg("--query")
            .arg("Q(x) :- C(x), C(x), R(x, y) .")
            .assert()
            .success()
            .stdout("\\exists y (C(x) AND R(x, y))\n");
    }

    #[test]
    fn cli_rejects_invalid_queries() {
        cli_command()
            .arg("sparql")
            .arg("--query")
            .arg("Q(z) :- C(x) .")
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid query"));
    }
}

//! Layout helpers for the generated SQL text.

use itertools::Itertools;

const INDENT: &str = "    ";

/// The projection of boolean queries.
pub(super) const BOOLEAN_WILDCARD: &str = "1";

pub(super) fn indent(text: &str) -> String {
    text.split('\n').map(|line| format!("{INDENT}{line}")).join("\n")
}

/// Parenthesizes `text`, either on the same line or as an indented block.
pub(super) fn wrap(text: &str, inline: bool) -> String {
    if inline {
        format!("( {text} )")
    } else {
        format!("(\n{}\n)", indent(text))
    }
}

pub(super) fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Joins the columns of a projection in case-insensitive alphabetical order.
pub(super) fn sorted_columns(mut columns: Vec<String>) -> String {
    columns.sort_by_cached_key(|column| column.to_lowercase());
    columns.join(", ")
}

/// The parts of a single `SELECT` statement.
#[derive(Default)]
pub(super) struct Select {
    pub(super) projection: Option<String>,
    pub(super) from: Option<String>,
    pub(super) filter: Option<String>,
    pub(super) distinct: bool,
    pub(super) limit_one: bool,
}

impl Select {
    pub(super) fn render(self) -> String {
        let mut sql = String::from("SELECT ");
        if self.distinct {
            sql.push_str("DISTINCT ");
        }
        sql.push_str(self.projection.as_deref().unwrap_or(BOOLEAN_WILDCARD));
        if let Some(from) = &self.from {
            // A list of joins starts on its own line.
            sql.push_str(if from.starts_with('\n') { " FROM" } else { " FROM " });
            sql.push_str(from);
        }
        if let Some(filter) = &self.filter {
            sql.push_str(if self.from.is_some() { "\nWHERE " } else { " WHERE " });
            sql.push_str(filter);
        }
        if self.limit_one {
            sql.push_str("\nLIMIT 1");
        }
        sql
    }
}

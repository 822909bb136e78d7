use crate::ModelError;
use itertools::Itertools;
use rustc_hash::FxHashSet;
use std::collections::BTreeSet;

/// The symbols used for fresh variable names when no other alphabet is given.
pub const LC_LATIN_ALPHABET: [&str; 23] = [
    "a", "b", "c", "d", "e", "f", "g", "h", "i", "j", "k", "l", "m", "n", "o", "p", "q", "r", "s",
    "t", "u", "v", "z",
];

/// Words that cannot be used as unquoted SQL identifiers.
pub const SQL_RESERVED_WORDS: &[&str] = &[
    "ABS", "ALL", "ALLOCATE", "ALTER", "AND", "ANY", "ARE", "ARRAY", "AS", "ASC", "ASENSITIVE",
    "ASYMMETRIC", "AT", "ATOMIC", "AUTHORIZATION", "AVG", "BEGIN", "BETWEEN", "BIGINT", "BINARY",
    "BLOB", "BOOLEAN", "BOTH", "BY", "CALL", "CALLED", "CASCADED", "CASE", "CAST", "CEIL",
    "CHAR", "CHARACTER", "CHECK", "CLOB", "CLOSE", "COLLATE", "COLUMN", "COMMIT", "CONDITION",
    "CONNECT", "CONSTRAINT", "CONVERT", "CORRESPONDING", "COUNT", "CREATE", "CROSS", "CUBE",
    "CURRENT", "CURSOR", "CYCLE", "DATE", "DAY", "DEALLOCATE", "DEC", "DECIMAL", "DECLARE",
    "DEFAULT", "DELETE", "DEREF", "DESC", "DESCRIBE", "DETERMINISTIC", "DISCONNECT", "DISTINCT",
    "DO", "DOUBLE", "DROP", "DYNAMIC", "EACH", "ELEMENT", "ELSE", "END", "ESCAPE", "EXCEPT",
    "EXEC", "EXECUTE", "EXISTS", "EXTERNAL", "FALSE", "FETCH", "FILTER", "FLOAT", "FOR",
    "FOREIGN", "FREE", "FROM", "FULL", "FUNCTION", "GET", "GLOBAL", "GRANT", "GROUP", "GROUPING",
    "HAVING", "HOLD", "HOUR", "IDENTITY", "IF", "IN", "INDICATOR", "INNER", "INOUT",
    "INSENSITIVE", "INSERT", "INT", "INTEGER", "INTERSECT", "INTERVAL", "INTO", "IS", "JOIN",
    "LANGUAGE", "LARGE", "LATERAL", "LEADING", "LEFT", "LIKE", "LIMIT", "LOCAL", "LOCALTIME",
    "MATCH", "MAX", "MEMBER", "MERGE", "METHOD", "MIN", "MINUTE", "MOD", "MODIFIES", "MODULE",
    "MONTH", "MULTISET", "NATIONAL", "NATURAL", "NCHAR", "NCLOB", "NEW", "NO", "NONE", "NOT",
    "NULL", "NUMERIC", "OF", "OFFSET", "OLD", "ON", "ONLY", "OPEN", "OR", "ORDER", "OUT",
    "OUTER", "OVER", "OVERLAPS", "PARAMETER", "PARTITION", "POSITION", "PRECISION", "PREPARE",
    "PRIMARY", "PROCEDURE", "RANGE", "READS", "REAL", "RECURSIVE", "REF", "REFERENCES",
    "REFERENCING", "RELEASE", "RETURN", "RETURNS", "REVOKE", "RIGHT", "ROLLBACK", "ROLLUP",
    "ROW", "ROWS", "SAVEPOINT", "SCOPE", "SCROLL", "SEARCH", "SECOND", "SELECT", "SENSITIVE",
    "SESSION_USER", "SET", "SIMILAR", "SMALLINT", "SOME", "SPECIFIC", "SQL", "SQLEXCEPTION",
    "SQLSTATE", "SQLWARNING", "START", "STATIC", "SUBMULTISET", "SUM", "SYMMETRIC", "SYSTEM",
    "SYSTEM_USER", "TABLE", "THEN", "TIME", "TIMESTAMP", "TO", "TRAILING", "TRANSLATION",
    "TREAT", "TRIGGER", "TRUE", "UNION", "UNIQUE", "UNKNOWN", "UNNEST", "UPDATE", "USER",
    "USING", "VALUE", "VALUES", "VARCHAR", "VARYING", "WHEN", "WHENEVER", "WHERE", "WINDOW",
    "WITH", "WITHIN", "WITHOUT", "YEAR",
];

/// Whether `word` is a reserved SQL keyword, ignoring case.
pub fn is_sql_reserved_word(word: &str) -> bool {
    SQL_RESERVED_WORDS
        .iter()
        .any(|reserved| reserved.eq_ignore_ascii_case(word))
}

/// The symbols fresh variable names are built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableAlphabet {
    symbols: BTreeSet<String>,
}

impl VariableAlphabet {
    /// Creates a new [VariableAlphabet]. Empty symbols are ignored.
    pub fn new<S: Into<String>>(symbols: impl IntoIterator<Item = S>) -> Result<Self, ModelError> {
        let symbols: BTreeSet<String> = symbols
            .into_iter()
            .map(Into::into)
            .filter(|symbol| !symbol.is_empty())
            .collect();
        if symbols.is_empty() {
            return Err(ModelError::EmptyAlphabet);
        }
        Ok(Self { symbols })
    }

    /// Creates the alphabet of [LC_LATIN_ALPHABET].
    pub fn latin() -> Self {
        Self {
            symbols: LC_LATIN_ALPHABET.iter().map(|s| (*s).to_owned()).collect(),
        }
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.symbols.iter().map(String::as_str)
    }

    /// Returns the lexicographically-first name that is neither reserved (ignoring case) nor an
    /// SQL keyword.
    ///
    /// When every name of the current length is taken, candidates are extended by one symbol.
    pub fn fresh_name(&self, reserved: &FxHashSet<String>) -> String {
        let reserved: FxHashSet<String> = reserved.iter().map(|name| name.to_lowercase()).collect();
        let mut candidates = self.symbols.clone();
        loop {
            let found = candidates.iter().find(|candidate| {
                !reserved.contains(&candidate.to_lowercase()) && !is_sql_reserved_word(candidate)
            });
            if let Some(found) = found {
                return found.clone();
            }
            candidates = candidates
                .iter()
                .cartesian_product(&self.symbols)
                .map(|(prefix, symbol)| format!("{prefix}{symbol}"))
                .collect();
        }
    }
}

impl Default for VariableAlphabet {
    fn default() -> Self {
        Self::latin()
    }
}

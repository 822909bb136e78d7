use rustc_hash::FxHashMap;
use std::fmt::{Display, Formatter};
use std::io::Read;
use std::path::Path;

/// An error raised while building a [DbSchema].
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum SchemaError {
    #[error("Could not read the schema mapping: {0}")]
    Csv(#[from] csv::Error),
    /// A record of the mapping file names a table without columns.
    #[error("The table {0} has no columns.")]
    MissingColumns(String),
    #[error("The table {0} is declared more than once.")]
    DuplicateTable(String),
    /// A predicate was mapped onto a table that has not been declared.
    #[error("The table {0} does not exist.")]
    UnknownTable(String),
}

/// A relational table with its ordered columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    name: String,
    columns: Vec<String>,
}

impl Table {
    pub fn new(name: impl Into<String>, columns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            name: name.into(),
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn arity(&self) -> usize {
        self.columns.len()
    }
}

impl Display for Table {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.name, self.columns.join(", "))
    }
}

/// Maps predicates to the tables that store their extension.
///
/// Every table is reachable through its own name. [DbSchema::map_predicate] binds further
/// predicate names to a table.
#[derive(Debug, Default, Clone)]
pub struct DbSchema {
    tables: FxHashMap<String, Table>,
    predicates: FxHashMap<String, String>,
}

impl DbSchema {
    /// Creates a new empty [DbSchema].
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a schema from header-less CSV records of the form `table,column1[,column2...]`.
    pub fn from_csv_reader(reader: impl Read) -> Result<Self, SchemaError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .comment(Some(b'#'))
            .from_reader(reader);

        let mut schema = Self::new();
        for record in reader.records() {
            let record = record?;
            let mut fields = record.iter().filter(|field| !field.is_empty());
            let Some(name) = fields.next() else {
                continue;
            };
            let columns: Vec<&str> = fields.collect();
            if columns.is_empty() {
                return Err(SchemaError::MissingColumns(name.to_owned()));
            }
            schema.add_table(Table::new(name, columns))?;
        }
        tracing::debug!(tables = schema.tables.len(), "Loaded schema mapping");
        Ok(schema)
    }

    /// Loads a schema from a CSV file. See [DbSchema::from_csv_reader].
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SchemaError> {
        let file = std::fs::File::open(path).map_err(csv::Error::from)?;
        Self::from_csv_reader(file)
    }

    pub fn add_table(&mut self, table: Table) -> Result<(), SchemaError> {
        if self.tables.contains_key(table.name()) {
            return Err(SchemaError::DuplicateTable(table.name.clone()));
        }
        self.tables.insert(table.name.clone(), table);
        Ok(())
    }

    pub fn with_table(mut self, table: Table) -> Result<Self, SchemaError> {
        self.add_table(table)?;
        Ok(self)
    }

    /// Makes `predicate` refer to the table `table`.
    pub fn map_predicate(
        &mut self,
        predicate: impl Into<String>,
        table: &str,
    ) -> Result<(), SchemaError> {
        if !self.tables.contains_key(table) {
            return Err(SchemaError::UnknownTable(table.to_owned()));
        }
        self.predicates.insert(predicate.into(), table.to_owned());
        Ok(())
    }

    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.tables.values()
    }

    /// Looks up the table of a predicate.
    ///
    /// If nothing is mapped to the full identifier, the local name after the last `#`, `/` or
    /// `:` is tried.
    pub fn table(&self, predicate: &str) -> Option<&Table> {
        self.lookup(predicate).or_else(|| {
            let local = predicate.rsplit(['#', '/', ':']).next()?;
            if local == predicate {
                None
            } else {
                self.lookup(local)
            }
        })
    }

    fn lookup(&self, name: &str) -> Option<&Table> {
        let name = self.predicates.get(name).map_or(name, String::as_str);
        self.tables.get(name)
    }
}

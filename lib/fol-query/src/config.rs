use fol_query_model::VariableAlphabet;

/// The options of a [`QueryCompiler`](crate::QueryCompiler).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerConfig {
    alphabet: Option<VariableAlphabet>,
    distinct: bool,
    optimize: bool,
    column_alias_prefix: String,
    alias_columns: bool,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            alphabet: None,
            distinct: true,
            optimize: true,
            column_alias_prefix: "X".to_owned(),
            alias_columns: false,
        }
    }
}

impl CompilerConfig {
    /// The alphabet used to rename quantified variables.
    ///
    /// Without an explicit alphabet, the characters of the variable names of each formula are
    /// used.
    pub fn alphabet(&self) -> Option<&VariableAlphabet> {
        self.alphabet.as_ref()
    }

    pub fn distinct(&self) -> bool {
        self.distinct
    }

    /// Whether formulas are optimized before they are compiled.
    pub fn optimize(&self) -> bool {
        self.optimize
    }

    pub fn column_alias_prefix(&self) -> &str {
        &self.column_alias_prefix
    }

    /// Whether the projected columns of SQL queries are renamed to `<prefix><n>`.
    pub fn alias_columns(&self) -> bool {
        self.alias_columns
    }

    #[must_use]
    pub fn with_alphabet(mut self, alphabet: VariableAlphabet) -> Self {
        self.alphabet = Some(alphabet);
        self
    }

    #[must_use]
    pub fn with_distinct(mut self, distinct: bool) -> Self {
        self.distinct = distinct;
        self
    }

    #[must_use]
    pub fn with_optimize(mut self, optimize: bool) -> Self {
        self.optimize = optimize;
        self
    }

    #[must_use]
    pub fn with_column_alias_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.column_alias_prefix = prefix.into();
        self
    }

    #[must_use]
    pub fn with_alias_columns(mut self, alias_columns: bool) -> Self {
        self.alias_columns = alias_columns;
        self
    }
}

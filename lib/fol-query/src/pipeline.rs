use crate::{CompilationError, CompilerConfig};
use fol_query_compiler::{DbSchema, SparqlCompiler, SqlCompiler};
use fol_query_model::{Formula, Variable, VariableAlphabet};
use fol_query_parser::DatalogParser;
use rustc_hash::FxHashMap;

/// Normalizes formulas and compiles them into SQL or SPARQL according to a [CompilerConfig].
#[derive(Debug, Clone, Default)]
pub struct QueryCompiler {
    config: CompilerConfig,
}

impl QueryCompiler {
    pub fn new(config: CompilerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// Parses a Datalog conjunctive query into a formula whose free variables are the head
    /// variables.
    pub fn parse(&self, query: &str) -> Result<Formula, CompilationError> {
        let query = DatalogParser::new().parse_query(query)?;
        Ok(query.to_formula())
    }

    /// Flattens the formula and, if enabled, optimizes it.
    pub fn normalize(&self, formula: &Formula) -> Formula {
        let formula = formula.clone().flatten(true);
        let normalized = if self.config.optimize() {
            formula.optimize()
        } else {
            formula
        };
        tracing::debug!(formula = %normalized, "Normalized formula");
        normalized
    }

    /// Pushes all negations down to the atoms.
    pub fn push_down_negation(&self, formula: &Formula) -> Formula {
        formula.clone().push_down_negation()
    }

    /// Moves all quantifiers to the front, renaming quantified variables with the configured
    /// alphabet.
    pub fn prenex_form(&self, formula: &Formula) -> Formula {
        let alphabet = self.alphabet(formula);
        formula.clone().prenex_form(&alphabet)
    }

    pub fn compile_sql(
        &self,
        formula: &Formula,
        schema: &DbSchema,
    ) -> Result<String, CompilationError> {
        let formula = self.normalize(formula);
        let aliases = self.column_aliases(&formula);
        let sql = SqlCompiler::new(schema).sqlify(&formula, &aliases, self.config.distinct())?;
        Ok(sql)
    }

    pub fn compile_sparql(&self, formula: &Formula) -> Result<String, CompilationError> {
        let formula = self.normalize(formula);
        Ok(SparqlCompiler::new().compile(&formula)?)
    }

    fn alphabet(&self, formula: &Formula) -> VariableAlphabet {
        self.config
            .alphabet()
            .cloned()
            .unwrap_or_else(|| formula.active_alphabet())
    }

    /// Names the free variables `<prefix>0`, `<prefix>1`, ... in the order of their names.
    fn column_aliases(&self, formula: &Formula) -> FxHashMap<Variable, String> {
        if !self.config.alias_columns() {
            return FxHashMap::default();
        }
        let prefix = self.config.column_alias_prefix();
        formula
            .free_variables()
            .into_iter()
            .enumerate()
            .map(|(index, variable)| (variable, format!("{prefix}{index}")))
            .collect()
    }
}

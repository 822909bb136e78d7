use crate::sql::text::{indent, quote_identifier, sorted_columns, wrap, Select};
use crate::{DbSchema, SqlResult, SqlificationError, Table};
use fol_query_model::{Atom, ComparisonAtom, Formula, PredicateAtom, Term, Variable};
use itertools::Itertools;
use rustc_hash::FxHashMap;
use std::collections::BTreeSet;

const TRUE_VALUE: &str = "TRUE";
const FALSE_VALUE: &str = "FALSE";

/// Maps distinguished variables to the sub-formula whose sub-query projects them.
///
/// Sub-formulas are identified by their position in the compiled tree, not by their value: two
/// equal atoms at different places are different sub-queries.
type Distinguished<'q> = FxHashMap<Variable, &'q Formula>;

/// Compiles formulas into SQL queries over the tables of a [DbSchema].
///
/// The compiled formula must be domain-independent. Some domain-independent formulas still
/// have to be rephrased by the caller, e.g. `A(x) AND (A(y) OR R(x, y))` has to be distributed
/// into `(A(x) OR A(y)) AND (A(x) OR R(x, y))`.
///
/// Terminology:
/// - A *requested* variable must be projected by the `SELECT` of a sub-query.
/// - A *distinguished* variable is bound outside the sub-query that uses it and is referenced
///   through the alias of the sub-query that binds it.
/// - A *shared* variable occurs free in more than one conjunct of a conjunction.
#[derive(Debug, Clone, Copy)]
pub struct SqlCompiler<'a> {
    schema: &'a DbSchema,
}

impl<'a> SqlCompiler<'a> {
    pub fn new(schema: &'a DbSchema) -> Self {
        Self { schema }
    }

    /// Compiles `formula` into a single SQL statement that projects all free variables.
    ///
    /// `aliases` renames the columns of the outermost projection. With `distinct`, the outermost
    /// statement is a `SELECT DISTINCT`. A formula without free variables compiles into an
    /// existence probe with `LIMIT 1`.
    pub fn sqlify(
        &self,
        formula: &Formula,
        aliases: &FxHashMap<Variable, String>,
        distinct: bool,
    ) -> SqlResult<String> {
        let query = formula
            .clone()
            .eliminate_universal_quantifiers()
            .flatten(true)
            .remove_unnecessary_container();
        let _span = tracing::debug_span!("sqlify", formula = %query).entered();

        let free = query.free_variables();
        let selectable = selectable_variables(&query);
        if !selectable.is_subset(&free) {
            return Err(SqlificationError::Internal(format!(
                "the selectable variables of {query} are not free"
            )));
        }
        let unsafe_variables: BTreeSet<Variable> =
            free.difference(&selectable).cloned().collect();
        if !unsafe_variables.is_empty() {
            return Err(SqlificationError::UnsafeQuery {
                query,
                variables: unsafe_variables,
            });
        }

        let mut instance = SqlificationInstance::new(self.schema, &query, aliases, distinct);
        let sql = instance.sqlify(&query, &free, &Distinguished::default())?;
        tracing::debug!("Compiled into SQL:\n{sql}");
        Ok(sql)
    }

    /// Compiles `formula` without column aliases and without `DISTINCT`.
    pub fn sqlify_default(&self, formula: &Formula) -> SqlResult<String> {
        self.sqlify(formula, &FxHashMap::default(), false)
    }
}

/// The variables that can be projected by the SQL query of `formula`.
///
/// A variable selectable from a disjunction must be selectable from every disjunct.
fn selectable_variables(formula: &Formula) -> BTreeSet<Variable> {
    match formula {
        Formula::Atom(Atom::Predicate(atom)) => atom
            .variables()
            .filter(|variable| !variable.is_blank())
            .cloned()
            .collect(),
        Formula::Conjunction(children) => children.iter().flat_map(selectable_variables).collect(),
        Formula::Disjunction(children) => children
            .iter()
            .map(selectable_variables)
            .reduce(|left, right| left.intersection(&right).cloned().collect())
            .unwrap_or_default(),
        Formula::Exist { variables, body } | Formula::ForAll { variables, body } => {
            let mut selectable = selectable_variables(body);
            selectable.retain(|variable| !variables.contains(variable));
            selectable
        }
        Formula::Atom(_) | Formula::Negation(_) => BTreeSet::new(),
    }
}

/// The state of a single compilation.
struct SqlificationInstance<'q> {
    schema: &'q DbSchema,
    query: &'q Formula,
    aliases: &'q FxHashMap<Variable, String>,
    distinct: bool,
    outermost: bool,
    table_counters: FxHashMap<String, usize>,
    query_aliases: FxHashMap<*const Formula, String>,
}

impl<'q> SqlificationInstance<'q> {
    fn new(
        schema: &'q DbSchema,
        query: &'q Formula,
        aliases: &'q FxHashMap<Variable, String>,
        distinct: bool,
    ) -> Self {
        Self {
            schema,
            query,
            aliases,
            distinct,
            outermost: true,
            table_counters: FxHashMap::default(),
            query_aliases: FxHashMap::default(),
        }
    }

    fn sqlify(
        &mut self,
        formula: &'q Formula,
        requested: &BTreeSet<Variable>,
        distinguished: &Distinguished<'q>,
    ) -> SqlResult<String> {
        match formula {
            Formula::Atom(Atom::Predicate(atom)) => {
                self.predicate(formula, atom, requested, distinguished)
            }
            Formula::Atom(Atom::Comparison(atom)) => Ok(self.comparison(atom, distinguished)),
            Formula::Atom(Atom::True) => Ok(self.select_if_outermost(TRUE_VALUE, self.outermost)),
            Formula::Atom(Atom::False) => Ok(self.select_if_outermost(FALSE_VALUE, self.outermost)),
            Formula::Conjunction(children) => {
                self.conjunction(formula, children, requested, distinguished)
            }
            Formula::Disjunction(children) => {
                self.disjunction(formula, children, requested, distinguished)
            }
            Formula::Negation(content) => self.negation(content, distinguished),
            Formula::Exist { variables, body } => {
                let requested = requested
                    .iter()
                    .filter(|variable| !variables.contains(*variable))
                    .cloned()
                    .collect();
                let mut distinguished = distinguished.clone();
                distinguished.retain(|variable, _| !variables.contains(variable));
                self.sqlify(body, &requested, &distinguished)
            }
            Formula::ForAll { .. } => Err(SqlificationError::Internal(format!(
                "the universal quantifier {formula} has not been eliminated"
            ))),
        }
    }

    fn comparison(&mut self, atom: &ComparisonAtom, distinguished: &Distinguished<'q>) -> String {
        let left = self.term(atom.left(), distinguished);
        let right = self.term(atom.right(), distinguished);
        let sql = format!("{left} {} {right}", atom.operator().symbol());
        self.select_if_outermost(&sql, self.outermost)
    }

    fn predicate(
        &mut self,
        formula: &'q Formula,
        atom: &'q PredicateAtom,
        requested: &BTreeSet<Variable>,
        distinguished: &Distinguished<'q>,
    ) -> SqlResult<String> {
        let outermost = std::mem::replace(&mut self.outermost, false);
        let table = self.table(atom)?;

        let mut first_columns: FxHashMap<&Variable, &str> = FxHashMap::default();
        let mut projection = Vec::new();
        let mut equalities = Vec::new();
        for (term, column) in atom.terms().iter().zip(table.columns()) {
            match term {
                Term::Variable(variable) if variable.is_blank() => {}
                Term::Variable(variable) => {
                    if let Some(first) = first_columns.get(variable) {
                        // Self-join inside the atom.
                        equalities.push(format!("{column}={first}"));
                        continue;
                    }
                    first_columns.insert(variable, column.as_str());
                    if requested.contains(variable) {
                        let alias = self.column_alias(variable, outermost);
                        projection.push(format!("{column} AS {alias}"));
                    }
                    if distinguished
                        .get(variable)
                        .is_some_and(|bound_by| !std::ptr::eq(*bound_by, formula))
                    {
                        let reference = self.term(term, distinguished);
                        equalities.push(format!("{column}={reference}"));
                    }
                }
                constant => equalities.push(format!("{column}={}", constant.to_sql())),
            }
        }

        let from = format!(
            "{} {}",
            quote_identifier(table.name()),
            self.table_alias(table.name())
        );
        let filter = (!equalities.is_empty()).then(|| equalities.join(" AND "));
        Ok(self.select(projection, Some(from), filter, outermost))
    }

    /// Compiles a conjunction as
    ///
    /// ```text
    /// SELECT X FROM
    ///     ( join_1 ) q1
    ///     NATURAL JOIN
    ///     ( join_2 ) q2
    /// WHERE (
    ///     filter_1 AND filter_2
    /// )
    /// ```
    ///
    /// Conjuncts that project all their requested variables are joined. Every other conjunct is
    /// a filter that refers to the joined sub-queries through their aliases.
    fn conjunction(
        &mut self,
        formula: &'q Formula,
        children: &'q [Formula],
        requested: &BTreeSet<Variable>,
        distinguished: &Distinguished<'q>,
    ) -> SqlResult<String> {
        match children {
            [] => return Ok(self.select_if_outermost(TRUE_VALUE, self.outermost)),
            [child] => return self.sqlify(child, requested, distinguished),
            _ => {}
        }
        let outermost = std::mem::replace(&mut self.outermost, false);

        // The requested variables plus the join keys that are not distinguished yet.
        let joinable = formula
            .shared_variables()
            .intersection(&selectable_variables(formula))
            .filter(|variable| !distinguished.contains_key(*variable))
            .cloned()
            .collect::<BTreeSet<_>>();
        let to_request: BTreeSet<Variable> = requested.union(&joinable).cloned().collect();

        let mut filter_distinguished = distinguished.clone();
        let mut joins = Vec::new();
        let mut filters = Vec::new();
        for child in children.iter().unique() {
            let child_requested: BTreeSet<Variable> = child
                .free_variables()
                .intersection(&to_request)
                .cloned()
                .collect();
            if child_requested.is_empty()
                || !child_requested.is_subset(&selectable_variables(child))
            {
                filters.push(child);
            } else {
                joins.push(child);
                for variable in child.free_variables() {
                    filter_distinguished.entry(variable).or_insert(child);
                }
            }
        }

        let requestable: BTreeSet<Variable> = joins
            .iter()
            .flat_map(|child| child.free_variables())
            .collect();
        let missing: BTreeSet<Variable> = to_request.difference(&requestable).cloned().collect();
        if !missing.is_empty() {
            return Err(SqlificationError::UnselectableVariables {
                query: self.query.clone(),
                variables: missing,
                conjunction: formula.clone(),
            });
        }

        let mut join_queries = Vec::with_capacity(joins.len());
        for child in joins {
            let child_requested = to_request
                .intersection(&selectable_variables(child))
                .cloned()
                .collect();
            let sql = self.sqlify(child, &child_requested, distinguished)?;
            let inline = matches!(child, Formula::Atom(Atom::Predicate(_)));
            join_queries.push(format!("{} {}", wrap(&sql, inline), self.query_alias(child)));
        }

        let several_filters = filters.len() > 1;
        let mut filter_queries = Vec::with_capacity(filters.len());
        for child in filters {
            let sql = self.sqlify(child, &BTreeSet::new(), &filter_distinguished)?;
            if several_filters && child.container_kind().is_some() {
                filter_queries.push(wrap(&sql, false));
            } else {
                filter_queries.push(sql);
            }
        }
        let filter =
            (!filter_queries.is_empty()).then(|| wrap(&filter_queries.join(" AND "), false));

        let from = match join_queries.len() {
            0 => {
                let filter = filter.ok_or_else(|| {
                    SqlificationError::Internal(format!("the conjunction {formula} is empty"))
                })?;
                return Ok(self.select_if_outermost(&filter, outermost));
            }
            1 => join_queries.swap_remove(0),
            _ => format!("\n{}", indent(&join_queries.join("\nNATURAL JOIN\n"))),
        };
        let projection = self.projected_variables(requested, outermost);
        Ok(self.select(projection, Some(from), filter, outermost))
    }

    /// Compiles a disjunction into a `UNION ALL` of its disjuncts if variables are requested.
    /// A boolean disjunction becomes an `OR` of boolean sub-queries.
    fn disjunction(
        &mut self,
        formula: &'q Formula,
        children: &'q [Formula],
        requested: &BTreeSet<Variable>,
        distinguished: &Distinguished<'q>,
    ) -> SqlResult<String> {
        match children {
            [] => return Ok(self.select_if_outermost(FALSE_VALUE, self.outermost)),
            [child] => return self.sqlify(child, requested, distinguished),
            _ => {}
        }
        let outermost = std::mem::replace(&mut self.outermost, false);

        let mut queries = Vec::with_capacity(children.len());
        for child in children {
            queries.push(self.sqlify(child, requested, distinguished)?);
        }

        if requested.is_empty() {
            return Ok(self.select_if_outermost(&queries.join(" OR "), outermost));
        }
        let union = queries.join("\nUNION ALL\n");
        if !outermost {
            return Ok(union);
        }
        // A view needs a single top-level SELECT around the union.
        let from = format!("{} {}", wrap(&union, false), self.query_alias(formula));
        let projection = self.projected_variables(requested, true);
        Ok(self.select(projection, Some(from), None, true))
    }

    fn negation(
        &mut self,
        content: &'q Formula,
        distinguished: &Distinguished<'q>,
    ) -> SqlResult<String> {
        let outermost = std::mem::replace(&mut self.outermost, false);
        let none = BTreeSet::new();
        let sql = match content {
            Formula::Atom(Atom::Comparison(atom)) => self.comparison(&atom.negate(), distinguished),
            Formula::Negation(inner) => self.sqlify(inner, &none, distinguished)?,
            Formula::Conjunction(_) | Formula::Disjunction(_) => {
                let sql = self.sqlify(content, &none, distinguished)?;
                format!("NOT {}", wrap(&sql, false))
            }
            // Some parsers require parentheses after NOT even around a single term.
            _ => format!("NOT ({})", self.sqlify(content, &none, distinguished)?),
        };
        Ok(self.select_if_outermost(&sql, outermost))
    }

    fn table(&self, atom: &PredicateAtom) -> SqlResult<&'q Table> {
        let schema = self.schema;
        let table = schema.table(atom.identifier()).ok_or_else(|| {
            SqlificationError::NoSqlTableFound {
                query: self.query.clone(),
                predicate: atom.identifier().to_owned(),
            }
        })?;
        if table.arity() != atom.arity() {
            return Err(SqlificationError::ArityMismatch {
                query: self.query.clone(),
                atom: atom.to_string(),
                table: table.to_string(),
                atom_arity: atom.arity(),
                table_arity: table.arity(),
            });
        }
        Ok(table)
    }

    /// Renders a term, referencing distinguished variables through the alias of their sub-query.
    fn term(&mut self, term: &Term, distinguished: &Distinguished<'q>) -> String {
        match term {
            Term::Variable(variable) => match distinguished.get(variable) {
                Some(&bound_by) => format!("{}.{variable}", self.query_alias(bound_by)),
                None => variable.name().to_owned(),
            },
            constant => constant.to_sql(),
        }
    }

    fn query_alias(&mut self, formula: &'q Formula) -> String {
        let next = self.query_aliases.len();
        self.query_aliases
            .entry(std::ptr::from_ref(formula))
            .or_insert_with(|| format!("q{next}"))
            .clone()
    }

    /// Table aliases are numbered per table, starting at 1.
    fn table_alias(&mut self, table: &str) -> String {
        let counter = self.table_counters.entry(table.to_owned()).or_default();
        *counter += 1;
        format!("{table}{counter}")
    }

    fn column_alias(&self, variable: &Variable, outermost: bool) -> String {
        match self.aliases.get(variable) {
            Some(alias) if outermost && !alias.is_empty() => alias.clone(),
            _ => variable.name().to_owned(),
        }
    }

    fn projected_variables(&self, variables: &BTreeSet<Variable>, outermost: bool) -> Vec<String> {
        variables
            .iter()
            .map(|variable| {
                let alias = self.column_alias(variable, outermost);
                if alias == variable.name() {
                    alias
                } else {
                    format!("{variable} AS {alias}")
                }
            })
            .collect()
    }

    /// Builds a `SELECT` statement. A statement without projection is boolean: it is limited to
    /// one row if it is the outermost one and wrapped into `EXISTS` otherwise.
    fn select(
        &self,
        projection: Vec<String>,
        from: Option<String>,
        filter: Option<String>,
        outermost: bool,
    ) -> String {
        let boolean = projection.is_empty();
        let sql = Select {
            projection: (!boolean).then(|| sorted_columns(projection)),
            from,
            filter,
            distinct: self.distinct && outermost,
            limit_one: boolean && outermost,
        }
        .render();
        if boolean && !outermost {
            format!("EXISTS {}", wrap(&sql, false))
        } else {
            sql
        }
    }

    /// Wraps a boolean expression into a `SELECT` if it is the outermost query.
    fn select_if_outermost(&self, sql: &str, outermost: bool) -> String {
        if outermost {
            self.select(Vec::new(), None, Some(sql.to_owned()), true)
        } else {
            sql.to_owned()
        }
    }
}

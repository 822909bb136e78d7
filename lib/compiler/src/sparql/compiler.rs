use crate::{SparqlCompilationError, SparqlResult};
use fol_query_model::{Atom, Formula, PredicateAtom, Term, Variable};
use itertools::Itertools;
use std::collections::BTreeSet;

/// The projection of a query without variables.
const DUMMY_PROJECTION: &str = "(1 AS ?dummy)";

/// A graph pattern together with the variables it binds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SparqlRewriting {
    pattern: String,
    variables: BTreeSet<Variable>,
}

impl SparqlRewriting {
    fn new(pattern: String, variables: BTreeSet<Variable>) -> Self {
        Self { pattern, variables }
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// The variables projected by the pattern, ordered by name.
    pub fn variables(&self) -> &BTreeSet<Variable> {
        &self.variables
    }

    /// Wraps the pattern into a `SELECT DISTINCT` query.
    pub fn into_query(self) -> String {
        format!(
            "SELECT DISTINCT {} {{\n{}\n}}",
            projection(&self.variables),
            self.pattern
        )
    }
}

/// Compiles formulas into SPARQL queries.
///
/// Unary predicates are used as classes and binary predicates as properties. Negations become
/// `MINUS` patterns and existential quantifiers become sub-queries that project the remaining
/// variables.
#[derive(Debug, Default, Clone, Copy)]
pub struct SparqlCompiler;

impl SparqlCompiler {
    pub fn new() -> Self {
        Self
    }

    /// Compiles `formula` into a `SELECT DISTINCT` query over the variables it binds.
    pub fn compile(&self, formula: &Formula) -> SparqlResult<String> {
        let query = self.rewrite(formula)?.into_query();
        tracing::debug!("Compiled into SPARQL:\n{query}");
        Ok(query)
    }

    /// Compiles `formula` into a graph pattern. Universal quantifiers are eliminated first.
    pub fn rewrite(&self, formula: &Formula) -> SparqlResult<SparqlRewriting> {
        let formula = formula
            .clone()
            .eliminate_universal_quantifiers()
            .flatten(true)
            .remove_unnecessary_container();
        let _span = tracing::debug_span!("sparql", formula = %formula).entered();
        rewrite(&formula)
    }
}

fn rewrite(formula: &Formula) -> SparqlResult<SparqlRewriting> {
    match formula {
        Formula::Atom(Atom::Predicate(atom)) => predicate(atom),
        Formula::Atom(Atom::Comparison(atom)) => Ok(SparqlRewriting::new(
            format!(
                "FILTER({} {} {})",
                atom.left().to_sparql(),
                atom.operator().symbol(),
                atom.right().to_sparql()
            ),
            BTreeSet::new(),
        )),
        Formula::Atom(Atom::True) => Ok(SparqlRewriting::new("{}".to_owned(), BTreeSet::new())),
        Formula::Atom(Atom::False) => Ok(SparqlRewriting::new(
            "FILTER(false)".to_owned(),
            BTreeSet::new(),
        )),
        Formula::Conjunction(children) => {
            // MINUS only removes solutions whose variables are bound at that point.
            let (negative, positive): (Vec<&Formula>, Vec<&Formula>) = children
                .iter()
                .partition(|child| matches!(child, Formula::Negation(_)));
            let mut patterns = Vec::with_capacity(children.len());
            let mut variables = BTreeSet::new();
            for child in positive.into_iter().chain(negative) {
                let rewriting = rewrite(child)?;
                variables.extend(rewriting.variables);
                patterns.push(rewriting.pattern);
            }
            if patterns.is_empty() {
                return rewrite(&Formula::truth());
            }
            Ok(SparqlRewriting::new(patterns.join("\n"), variables))
        }
        Formula::Disjunction(children) => {
            let mut patterns = Vec::with_capacity(children.len());
            let mut variables = BTreeSet::new();
            for child in children {
                let rewriting = rewrite(child)?;
                variables.extend(rewriting.variables);
                patterns.push(format!("{{ {} }}", rewriting.pattern));
            }
            if patterns.is_empty() {
                return rewrite(&Formula::falsity());
            }
            Ok(SparqlRewriting::new(patterns.join(" UNION "), variables))
        }
        Formula::Negation(content) => {
            let rewriting = rewrite(content)?;
            Ok(SparqlRewriting::new(
                format!("MINUS {{ {} }}", rewriting.pattern),
                BTreeSet::new(),
            ))
        }
        Formula::Exist { variables, body } => {
            let rewriting = rewrite(body)?;
            let mut remaining = rewriting.variables;
            remaining.retain(|variable| !variables.contains(variable));
            let pattern = format!(
                "{{ SELECT DISTINCT {} {{ {} }} }}",
                projection(&remaining),
                rewriting.pattern
            );
            Ok(SparqlRewriting::new(pattern, remaining))
        }
        Formula::ForAll { .. } => Err(SparqlCompilationError::Internal(format!(
            "the universal quantifier {formula} has not been eliminated"
        ))),
    }
}

fn predicate(atom: &PredicateAtom) -> SparqlResult<SparqlRewriting> {
    let variables = atom
        .variables()
        .filter(|variable| !variable.is_blank())
        .cloned()
        .collect();
    let pattern = match atom.terms() {
        [subject] => format!("{} a <{}> .", term(subject), atom.identifier()),
        [subject, object] => format!(
            "{} <{}> {} .",
            term(subject),
            atom.identifier(),
            term(object)
        ),
        terms => {
            return Err(SparqlCompilationError::UnsupportedArity {
                predicate: atom.identifier().to_owned(),
                arity: terms.len(),
            })
        }
    };
    Ok(SparqlRewriting::new(pattern, variables))
}

/// Renders a term of a triple pattern. Blank variables become anonymous blank nodes.
fn term(term: &Term) -> String {
    match term {
        Term::Variable(variable) if variable.is_blank() => "[]".to_owned(),
        term => term.to_sparql(),
    }
}

fn projection(variables: &BTreeSet<Variable>) -> String {
    if variables.is_empty() {
        DUMMY_PROJECTION.to_owned()
    } else {
        variables.iter().map(Variable::to_sparql).join(" ")
    }
}

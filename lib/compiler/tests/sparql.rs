#![cfg(test)]

use fol_query_compiler::{SparqlCompilationError, SparqlCompiler, SparqlResult};
use fol_query_model::{DataConstant, Datatype, Formula, PredicateAtom, Term, Variable};

fn var(name: &str) -> Term {
    Variable::new(name).into()
}

fn atom(predicate: &str, terms: Vec<Term>) -> Formula {
    Formula::predicate(PredicateAtom::new(predicate, terms))
}

fn concept(predicate: &str, variable: &str) -> Formula {
    atom(predicate, vec![var(variable)])
}

fn role(predicate: &str, subject: &str, object: &str) -> Formula {
    atom(predicate, vec![var(subject), var(object)])
}

fn compile(formula: &Formula) -> SparqlResult<String> {
    SparqlCompiler::new().compile(formula)
}

#[test]
fn compiles_conjunctive_query() -> SparqlResult<()> {
    let formula = Formula::and(vec![
        concept("http://example.com/C", "x"),
        role("http://example.com/R", "x", "y"),
    ]);
    insta::assert_snapshot!(compile(&formula)?, @r"
    SELECT DISTINCT ?x ?y {
    ?x a <http://example.com/C> .
    ?x <http://example.com/R> ?y .
    }
    ");
    Ok(())
}

#[test]
fn moves_negations_to_the_end() -> SparqlResult<()> {
    let formula = Formula::and(vec![
        Formula::not(Formula::exists([Variable::new("y")], role("R", "x", "y"))),
        concept("C", "x"),
    ]);
    insta::assert_snapshot!(compile(&formula)?, @r"
    SELECT DISTINCT ?x {
    ?x a <C> .
    MINUS { { SELECT DISTINCT ?x { ?x <R> ?y . } } }
    }
    ");
    Ok(())
}

#[test]
fn compiles_disjunction_into_union() -> SparqlResult<()> {
    let formula = Formula::or(vec![concept("A", "x"), concept("B", "x")]);
    insta::assert_snapshot!(compile(&formula)?, @r"
    SELECT DISTINCT ?x {
    { ?x a <A> . } UNION { ?x a <B> . }
    }
    ");
    Ok(())
}

#[test]
fn compiles_boolean_query() -> SparqlResult<()> {
    let formula = Formula::exists([Variable::new("x")], concept("C", "x"));
    insta::assert_snapshot!(compile(&formula)?, @r"
    SELECT DISTINCT (1 AS ?dummy) {
    { SELECT DISTINCT (1 AS ?dummy) { ?x a <C> . } }
    }
    ");
    Ok(())
}

#[test]
fn compiles_constants_and_comparisons() -> SparqlResult<()> {
    let formula = Formula::and(vec![
        atom(
            "age",
            vec![var("x"), DataConstant::new("42", Datatype::Integer).into()],
        ),
        role("knows", "x", "y"),
        Formula::not_equal(var("x"), var("y")),
    ]);
    insta::assert_snapshot!(compile(&formula)?, @r#"
    SELECT DISTINCT ?x ?y {
    ?x <age> "42"^^<http://www.w3.org/2001/XMLSchema#integer> .
    ?x <knows> ?y .
    FILTER(?x != ?y)
    }
    "#);
    Ok(())
}

#[test]
fn eliminates_universal_quantifiers() -> SparqlResult<()> {
    let formula = Formula::and(vec![
        concept("C", "x"),
        Formula::for_all([Variable::new("y")], Formula::not(role("R", "x", "y"))),
    ]);
    let rewriting = SparqlCompiler::new().rewrite(&formula)?;
    assert_eq!(
        rewriting.pattern(),
        "?x a <C> .\nMINUS { { SELECT DISTINCT ?x { ?x <R> ?y . } } }"
    );
    assert!(rewriting.variables().iter().map(Variable::name).eq(["x"]));
    Ok(())
}

#[test]
fn renders_blank_variables_as_blank_nodes() -> SparqlResult<()> {
    let formula = atom("R", vec![var("x"), Variable::blank().into()]);
    insta::assert_snapshot!(compile(&formula)?, @r"
    SELECT DISTINCT ?x {
    ?x <R> [] .
    }
    ");
    Ok(())
}

#[test]
fn rejects_ternary_predicates() {
    let formula = atom("T", vec![var("x"), var("y"), var("z")]);
    assert_eq!(
        compile(&formula),
        Err(SparqlCompilationError::UnsupportedArity {
            predicate: "T".to_owned(),
            arity: 3
        })
    );
}

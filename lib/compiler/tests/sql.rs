#![cfg(test)]

use fol_query_compiler::{DbSchema, SqlCompiler, SqlResult, SqlificationError, Table};
use fol_query_model::{
    DataConstant, Datatype, Formula, ObjectConstant, PredicateAtom, Term, Variable,
};
use rustc_hash::FxHashMap;

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

fn schema() -> DbSchema {
    let mut schema = DbSchema::new();
    for concept in ["A", "B", "C", "D"] {
        schema
            .add_table(Table::new(concept, ["attribute"]))
            .unwrap();
    }
    for role in ["R", "S"] {
        schema
            .add_table(Table::new(role, ["subject", "object"]))
            .unwrap();
    }
    schema
}

fn sqlify(formula: &Formula) -> SqlResult<String> {
    SqlCompiler::new(&schema()).sqlify_default(formula)
}

#[test]
fn compiles_concept() -> SqlResult<()> {
    insta::assert_snapshot!(sqlify(&concept("C", "x"))?, @r#"SELECT attribute AS x FROM "C" C1"#);
    Ok(())
}

#[test]
fn compiles_with_aliases_and_distinct() -> SqlResult<()> {
    let schema = schema();
    let aliases: FxHashMap<Variable, String> =
        [(Variable::new("x"), "X0".to_owned())].into_iter().collect();
    let sql = SqlCompiler::new(&schema).sqlify(&concept("C", "x"), &aliases, true)?;
    insta::assert_snapshot!(sql, @r#"SELECT DISTINCT attribute AS X0 FROM "C" C1"#);
    Ok(())
}

#[test]
fn compiles_negated_conjunct_as_filter() -> SqlResult<()> {
    let formula = Formula::and(vec![
        concept("C", "x"),
        Formula::not(concept("D", "x")),
    ]);
    insta::assert_snapshot!(sqlify(&formula)?, @r#"
    SELECT x FROM ( SELECT attribute AS x FROM "C" C1 ) q0
    WHERE (
        NOT (EXISTS (
            SELECT 1 FROM "D" D1
            WHERE attribute=q0.x
        ))
    )
    "#);
    Ok(())
}

#[test]
fn does_not_project_quantified_variables() -> SqlResult<()> {
    let formula = Formula::exists([Variable::new("y")], role("R", "x", "y"));
    insta::assert_snapshot!(sqlify(&formula)?, @r#"SELECT subject AS x FROM "R" R1"#);
    Ok(())
}

#[test]
fn compiles_disjunction_into_union() -> SqlResult<()> {
    let formula = Formula::or(vec![concept("A", "x"), concept("B", "x")]);
    insta::assert_snapshot!(sqlify(&formula)?, @r#"
    SELECT x FROM (
        SELECT attribute AS x FROM "A" A1
        UNION ALL
        SELECT attribute AS x FROM "B" B1
    ) q0
    "#);
    Ok(())
}

#[test]
fn joins_conjuncts_on_shared_variables() -> SqlResult<()> {
    let formula = Formula::exists(
        [Variable::new("y")],
        Formula::and(vec![role("R", "x", "y"), concept("C", "y")]),
    );
    insta::assert_snapshot!(sqlify(&formula)?, @r#"
    SELECT x FROM
        ( SELECT object AS y, subject AS x FROM "R" R1 ) q0
        NATURAL JOIN
        ( SELECT attribute AS y FROM "C" C1 ) q1
    "#);
    Ok(())
}

#[test]
fn compiles_constants_and_self_joins() -> SqlResult<()> {
    let constant = atom(
        "R",
        vec![var("x"), ObjectConstant::new("http://example.com/a").into()],
    );
    insta::assert_snapshot!(sqlify(&constant)?, @r#"
    SELECT subject AS x FROM "R" R1
    WHERE object='http://example.com/a'
    "#);

    insta::assert_snapshot!(sqlify(&role("R", "x", "x"))?, @r#"
    SELECT subject AS x FROM "R" R1
    WHERE object=subject
    "#);

    let attribute = atom(
        "S",
        vec![var("x"), DataConstant::new("42", Datatype::Integer).into()],
    );
    insta::assert_snapshot!(sqlify(&attribute)?, @r#"
    SELECT subject AS x FROM "S" S1
    WHERE object=42
    "#);
    Ok(())
}

#[test]
fn compiles_boolean_queries() -> SqlResult<()> {
    let exists = Formula::exists([Variable::new("x")], concept("C", "x"));
    insta::assert_snapshot!(sqlify(&exists)?, @r#"
    SELECT 1 FROM "C" C1
    LIMIT 1
    "#);

    let either = Formula::exists(
        [Variable::new("x")],
        Formula::or(vec![concept("A", "x"), concept("B", "x")]),
    );
    insta::assert_snapshot!(sqlify(&either)?, @r#"
    SELECT 1 WHERE EXISTS (
        SELECT 1 FROM "A" A1
    ) OR EXISTS (
        SELECT 1 FROM "B" B1
    )
    LIMIT 1
    "#);

    insta::assert_snapshot!(sqlify(&Formula::truth())?, @r"
    SELECT 1 WHERE TRUE
    LIMIT 1
    ");
    Ok(())
}

#[test]
fn eliminates_universal_quantifiers() -> SqlResult<()> {
    let formula = Formula::and(vec![
        concept("C", "x"),
        Formula::for_all([Variable::new("y")], Formula::not(role("R", "x", "y"))),
    ]);
    insta::assert_snapshot!(sqlify(&formula)?, @r#"
    SELECT x FROM ( SELECT attribute AS x FROM "C" C1 ) q0
    WHERE (
        NOT (EXISTS (
            SELECT 1 FROM "R" R1
            WHERE subject=q0.x
        ))
    )
    "#);
    Ok(())
}

#[test]
fn compiles_comparisons_against_joined_columns() -> SqlResult<()> {
    let formula = Formula::and(vec![
        role("R", "x", "y"),
        Formula::not_equal(var("x"), var("y")),
    ]);
    insta::assert_snapshot!(sqlify(&formula)?, @r#"
    SELECT x, y FROM ( SELECT object AS y, subject AS x FROM "R" R1 ) q0
    WHERE (
        q0.x != q0.y
    )
    "#);
    Ok(())
}

#[test]
fn negated_comparisons_flip_their_operator() -> SqlResult<()> {
    let formula = Formula::and(vec![
        role("R", "x", "y"),
        Formula::not(Formula::equal(var("x"), var("y"))),
    ]);
    insta::assert_snapshot!(sqlify(&formula)?, @r#"
    SELECT x, y FROM ( SELECT object AS y, subject AS x FROM "R" R1 ) q0
    WHERE (
        q0.x != q0.y
    )
    "#);
    Ok(())
}

#[test]
fn joins_nested_unions() -> SqlResult<()> {
    let formula = Formula::and(vec![
        concept("C", "x"),
        Formula::or(vec![concept("A", "x"), concept("B", "x")]),
    ]);
    insta::assert_snapshot!(sqlify(&formula)?, @r#"
    SELECT x FROM
        ( SELECT attribute AS x FROM "C" C1 ) q0
        NATURAL JOIN
        (
            SELECT attribute AS x FROM "A" A1
            UNION ALL
            SELECT attribute AS x FROM "B" B1
        ) q1
    "#);
    Ok(())
}

#[test]
fn negates_conjunctions_as_blocks() -> SqlResult<()> {
    let formula = Formula::and(vec![
        concept("C", "x"),
        Formula::not(Formula::and(vec![concept("A", "x"), concept("B", "x")])),
    ]);
    insta::assert_snapshot!(sqlify(&formula)?, @r#"
    SELECT x FROM ( SELECT attribute AS x FROM "C" C1 ) q0
    WHERE (
        NOT (
            (
                EXISTS (
                    SELECT 1 FROM "A" A1
                    WHERE attribute=q0.x
                ) AND EXISTS (
                    SELECT 1 FROM "B" B1
                    WHERE attribute=q0.x
                )
            )
        )
    )
    "#);
    Ok(())
}

#[test]
fn correlates_equal_atoms_in_negated_subqueries() -> SqlResult<()> {
    let formula = Formula::and(vec![
        role("R", "x", "y"),
        Formula::not(Formula::exists(
            [Variable::new("y")],
            Formula::and(vec![role("R", "x", "y"), concept("C", "y")]),
        )),
    ]);
    insta::assert_snapshot!(sqlify(&formula)?, @r#"
    SELECT x, y FROM ( SELECT object AS y, subject AS x FROM "R" R1 ) q0
    WHERE (
        NOT (EXISTS (
            SELECT 1 FROM
                ( SELECT object AS y FROM "R" R2
                WHERE subject=q0.x ) q1
                NATURAL JOIN
                ( SELECT attribute AS y FROM "C" C1 ) q2
        ))
    )
    "#);
    Ok(())
}

#[test]
fn rejects_unsafe_queries() {
    let formula = Formula::and(vec![
        role("R", "x", "y"),
        role("S", "y", "z"),
        Formula::not(concept("C", "w")),
    ]);
    let error = sqlify(&formula).unwrap_err();
    assert!(
        matches!(
            &error,
            SqlificationError::UnsafeQuery { variables, .. }
                if variables.iter().map(Variable::name).eq(["w"])
        ),
        "w is only used in a negation: {error}"
    );
    assert!(error.to_string().starts_with("Error with query:\n"));
}

#[test]
fn rejects_conjunctions_that_must_be_distributed() {
    let formula = Formula::and(vec![
        concept("A", "x"),
        Formula::or(vec![concept("A", "y"), role("R", "x", "y")]),
    ]);
    let error = sqlify(&formula).unwrap_err();
    assert!(
        matches!(
            &error,
            SqlificationError::UnselectableVariables { variables, .. }
                if variables.iter().map(Variable::name).eq(["y"])
        ),
        "y cannot be selected from the disjunction: {error}"
    );
}

#[test]
fn rejects_schema_mismatches() {
    assert!(matches!(
        sqlify(&concept("E", "x")),
        Err(SqlificationError::NoSqlTableFound { predicate, .. }) if predicate == "E"
    ));
    assert!(matches!(
        sqlify(&role("C", "x", "y")),
        Err(SqlificationError::ArityMismatch {
            atom_arity: 2,
            table_arity: 1,
            ..
        })
    ));
}

#[test]
fn resolves_iris_through_local_names() -> SqlResult<()> {
    let formula = concept("http://example.com/onto#C", "x");
    insta::assert_snapshot!(sqlify(&formula)?, @r#"SELECT attribute AS x FROM "C" C1"#);
    Ok(())
}

#[test]
fn compilation_is_deterministic() -> SqlResult<()> {
    let formula = Formula::exists(
        [Variable::new("z")],
        Formula::and(vec![
            role("R", "x", "y"),
            role("S", "y", "z"),
            concept("C", "x"),
            Formula::not(concept("D", "y")),
        ]),
    );
    let first = sqlify(&formula)?;
    let second = sqlify(&formula)?;
    assert_eq!(first, second);
    Ok(())
}

#![cfg(test)]

use fol_query_model::{
    Atom, ComparisonOperator, Formula, PredicateAtom, Term, Variable, VariableAlphabet,
};

fn var(name: &str) -> Term {
    Variable::new(name).into()
}

fn atom(predicate: &str, variables: &[&str]) -> Formula {
    Formula::predicate(PredicateAtom::new(
        predicate,
        variables.iter().map(|name| var(name)).collect(),
    ))
}

fn a() -> Formula {
    atom("A", &["x"])
}

fn b() -> Formula {
    atom("B", &["x"])
}

fn c() -> Formula {
    atom("C", &["x"])
}

fn assert_flat(formula: &Formula) {
    match formula {
        Formula::Atom(_) => {}
        Formula::Conjunction(children) | Formula::Disjunction(children) => {
            for child in children {
                assert_ne!(
                    child.container_kind(),
                    formula.container_kind(),
                    "{formula} has a nested container of the same kind"
                );
                assert_flat(child);
            }
        }
        Formula::Negation(content) => assert_flat(content),
        Formula::Exist { body, .. } | Formula::ForAll { body, .. } => assert_flat(body),
    }
}

#[test]
fn flatten_merges_nested_containers() {
    let nested = Formula::and(vec![
        a(),
        Formula::and(vec![b(), Formula::and(vec![c(), atom("D", &["x"])])]),
    ]);
    let flattened = nested.flatten(true);
    insta::assert_snapshot!(flattened, @"A(x) AND B(x) AND C(x) AND D(x)");
    assert_flat(&flattened);
}

#[test]
fn flatten_unwraps_singletons_before_merging() {
    let formula = Formula::and(vec![Formula::or(vec![Formula::and(vec![a(), b()])]), c()]);
    let flattened = formula.flatten(true);
    insta::assert_snapshot!(flattened, @"A(x) AND B(x) AND C(x)");
    assert_flat(&flattened);
}

#[test]
fn flatten_merges_quantifiers() {
    let formula = Formula::exists(
        [Variable::new("y")],
        Formula::exists([Variable::new("z")], atom("R", &["y", "z"])),
    );
    insta::assert_snapshot!(formula.flatten(true), @r"\exists y, z (R(y, z))");
}

#[test]
fn optimize_drops_absorbed_disjunction() {
    let formula = Formula::and(vec![a(), b(), Formula::or(vec![c(), b()])]);
    insta::assert_snapshot!(formula.optimize(), @"A(x) AND B(x)");
}

#[test]
fn optimize_strips_atoms_from_negated_conjunction() {
    let formula = Formula::and(vec![a(), b(), Formula::not(Formula::and(vec![c(), b()]))]);
    insta::assert_snapshot!(formula.optimize(), @"A(x) AND B(x) AND NOT (C(x))");
}

#[test]
fn optimize_strips_atoms_below_negated_exist() {
    let formula = Formula::and(vec![
        a(),
        Formula::not(Formula::exists(
            [Variable::new("y")],
            Formula::and(vec![atom("R", &["x", "y"]), a()]),
        )),
    ]);
    insta::assert_snapshot!(formula.optimize(), @r"A(x) AND NOT (\exists y (R(x, y)))");
}

#[test]
fn optimize_applies_dual_heuristics_to_disjunctions() {
    let formula = Formula::or(vec![a(), b(), Formula::and(vec![c(), b()])]);
    insta::assert_snapshot!(formula.optimize(), @"A(x) OR B(x)");

    let formula = Formula::or(vec![a(), b(), Formula::not(Formula::or(vec![c(), b()]))]);
    insta::assert_snapshot!(formula.optimize(), @"A(x) OR B(x) OR NOT (C(x))");
}

#[test]
fn optimize_removes_duplicates_and_trivial_children() {
    let formula = Formula::and(vec![a(), b(), a(), Formula::equal(var("x"), var("x"))]);
    insta::assert_snapshot!(formula.optimize(), @"A(x) AND B(x)");

    let formula = Formula::or(vec![a(), Formula::not_equal(var("x"), var("x"))]);
    insta::assert_snapshot!(formula.optimize(), @"A(x)");

    let formula = Formula::not(Formula::not(a()));
    insta::assert_snapshot!(formula.optimize(), @"A(x)");
}

#[test]
fn optimize_drops_unused_quantified_variables() {
    let formula = Formula::exists([Variable::new("x"), Variable::new("y")], a());
    insta::assert_snapshot!(formula.optimize(), @r"\exists x (A(x))");

    let formula = Formula::exists([Variable::new("y")], a());
    insta::assert_snapshot!(formula.optimize(), @"A(x)");
}

#[test]
fn push_down_negation_applies_de_morgan() {
    let formula = Formula::not(Formula::and(vec![a(), b()]));
    insta::assert_snapshot!(formula.push_down_negation(), @"NOT (A(x)) OR NOT (B(x))");

    let formula = Formula::not(Formula::or(vec![a(), b()]));
    insta::assert_snapshot!(formula.push_down_negation(), @"NOT (A(x)) AND NOT (B(x))");

    let formula = Formula::not(Formula::not(a()));
    insta::assert_snapshot!(formula.push_down_negation(), @"A(x)");

    let formula = Formula::not(Formula::exists([Variable::new("y")], atom("R", &["x", "y"])));
    insta::assert_snapshot!(formula.push_down_negation(), @r"\forall y (NOT (R(x, y)))");

    let formula = Formula::not(Formula::and(vec![a(), Formula::truth()]));
    insta::assert_snapshot!(formula.push_down_negation(), @"NOT (A(x)) OR FALSE");
}

#[test]
fn distinguish_renames_clashing_variables() {
    let formula = Formula::and(vec![
        atom("C", &["y"]),
        Formula::exists([Variable::new("y")], atom("R", &["x", "y"])),
    ]);
    let distinguished = formula.distinguish_quantified_variables(&VariableAlphabet::default());
    insta::assert_snapshot!(distinguished, @r"C(y) AND \exists a (R(x, a))");
}

#[test]
fn prenex_form_hoists_quantifiers() {
    let alphabet = VariableAlphabet::default();

    let formula = Formula::and(vec![
        Formula::exists([Variable::new("y")], atom("R", &["x", "y"])),
        Formula::exists([Variable::new("y")], atom("S", &["x", "y"])),
    ]);
    insta::assert_snapshot!(formula.prenex_form(&alphabet), @r"\exists a, y (R(x, y) AND S(x, a))");

    let formula = Formula::and(vec![
        Formula::not(Formula::exists([Variable::new("y")], atom("R", &["x", "y"]))),
        c(),
    ]);
    insta::assert_snapshot!(formula.prenex_form(&alphabet), @r"\forall y (NOT (R(x, y)) AND C(x))");

    let formula = Formula::and(vec![
        Formula::exists([Variable::new("y")], atom("R", &["x", "y"])),
        Formula::for_all([Variable::new("z")], atom("S", &["x", "z"])),
    ]);
    insta::assert_snapshot!(
        formula.prenex_form(&alphabet),
        @r"\exists y (\forall z (R(x, y) AND S(x, z)))"
    );
}

#[test]
fn prenex_form_does_not_capture_nested_variables() {
    let alphabet = VariableAlphabet::default();
    let formula = Formula::and(vec![
        Formula::exists([Variable::new("y")], atom("A", &["y"])),
        Formula::exists(
            [Variable::new("y")],
            Formula::exists([Variable::new("a")], atom("R", &["y", "a"])),
        ),
    ]);

    let distinguished = formula.clone().distinguish_quantified_variables(&alphabet);
    insta::assert_snapshot!(
        distinguished,
        @r"\exists y (A(y)) AND \exists b (\exists a (R(b, a)))"
    );

    let prenex = formula.prenex_form(&alphabet);
    insta::assert_snapshot!(prenex, @r"\exists a, b, y (A(y) AND R(b, a))");
    let Formula::Exist { body, .. } = &prenex else {
        panic!("{prenex} is not existentially quantified");
    };
    let Formula::Conjunction(children) = body.as_ref() else {
        panic!("{body} is not a conjunction");
    };
    let Some(role) = children.get(1).and_then(Formula::as_predicate) else {
        panic!("{body} has no second atom");
    };
    assert_ne!(
        role.terms().first(),
        role.terms().get(1),
        "the subject and object of {role} must stay distinct variables"
    );
}

#[test]
fn universal_quantifiers_are_eliminated() {
    let formula = Formula::for_all([Variable::new("y")], atom("R", &["x", "y"]));
    insta::assert_snapshot!(
        formula.eliminate_universal_quantifiers(),
        @r"NOT (\exists y (NOT (R(x, y))))"
    );

    let formula = Formula::for_all(
        [Variable::new("y")],
        Formula::not(atom("R", &["x", "y"])),
    );
    insta::assert_snapshot!(
        formula.eliminate_universal_quantifiers(),
        @r"NOT (\exists y (R(x, y)))"
    );

    let formula = Formula::for_all([Variable::new("y")], Formula::equal(var("y"), var("y")));
    insta::assert_snapshot!(formula.eliminate_universal_quantifiers(), @"TRUE");
}

/// Negations of `left` plus conjunctions and disjunctions of every pair from `left` and `right`.
fn combine(left: &[Formula], right: &[Formula]) -> Vec<Formula> {
    let mut combined: Vec<Formula> = left.iter().cloned().map(Formula::not).collect();
    for l in left {
        for r in right {
            combined.push(Formula::and(vec![l.clone(), r.clone()]));
            combined.push(Formula::or(vec![l.clone(), r.clone()]));
        }
    }
    combined
}

/// Quantifier-free formulas over `A(x)`, `B(x)`, `x = x` and `x != x` up to depth two.
fn generated_formulas() -> Vec<Formula> {
    let leaves = vec![
        a(),
        b(),
        Formula::equal(var("x"), var("x")),
        Formula::not_equal(var("x"), var("x")),
    ];
    let first = combine(&leaves, &leaves);
    let second = combine(&first, &leaves);
    leaves.into_iter().chain(first).chain(second).collect()
}

/// Evaluates a quantifier-free formula where `A(x)` is `a` and `B(x)` is `b`.
fn evaluate(formula: &Formula, a: bool, b: bool) -> bool {
    match formula {
        Formula::Atom(Atom::Predicate(atom)) => {
            if atom.identifier() == "A" {
                a
            } else {
                b
            }
        }
        Formula::Atom(Atom::Comparison(atom)) => match atom.operator() {
            ComparisonOperator::Equal => atom.left() == atom.right(),
            ComparisonOperator::NotEqual => atom.left() != atom.right(),
        },
        Formula::Atom(Atom::True) => true,
        Formula::Atom(Atom::False) => false,
        Formula::Conjunction(children) => children.iter().all(|child| evaluate(child, a, b)),
        Formula::Disjunction(children) => children.iter().any(|child| evaluate(child, a, b)),
        Formula::Negation(content) => !evaluate(content, a, b),
        Formula::Exist { body, .. } | Formula::ForAll { body, .. } => evaluate(body, a, b),
    }
}

const INTERPRETATIONS: [(bool, bool); 4] = [(false, false), (false, true), (true, false), (true, true)];

#[test]
fn optimize_is_idempotent() {
    for formula in generated_formulas() {
        let optimized = formula.clone().optimize();
        assert_eq!(
            optimized.clone().optimize(),
            optimized,
            "optimizing {formula} twice changes the result"
        );
        assert_flat(&optimized);
    }
}

#[test]
fn rewrites_preserve_meaning() {
    for formula in generated_formulas() {
        let optimized = formula.clone().optimize();
        let pushed = formula.clone().push_down_negation();
        for (a, b) in INTERPRETATIONS {
            let expected = evaluate(&formula, a, b);
            assert_eq!(evaluate(&optimized, a, b), expected, "optimize changed {formula}");
            assert_eq!(evaluate(&pushed, a, b), expected, "push down changed {formula}");
        }
    }
}

#[test]
fn tautology_checks_are_sound() {
    for formula in generated_formulas() {
        if formula.is_tautology() {
            assert!(
                INTERPRETATIONS.iter().all(|(a, b)| evaluate(&formula, *a, *b)),
                "{formula} is not a tautology"
            );
        }
        if formula.is_contradiction() {
            assert!(
                INTERPRETATIONS.iter().all(|(a, b)| !evaluate(&formula, *a, *b)),
                "{formula} is not a contradiction"
            );
        }
    }
}

//! Arithmetic evaluation over the calculator grammar's token tree.

use std::sync::Arc;

use rayon::prelude::*;
use rstest::rstest;

use crate::helpers::grammars::{calculator, eval};

fn evaluate(input: &str) -> Option<f64> {
    let def = calculator();
    let m = def.match_at(input, 0).unwrap()?;
    Some(eval(&def, &m.tree, input, m.root()?))
}

#[test]
fn test_parenthesized_product() {
    assert_eq!(evaluate("(-12+34)*(56-78)"), Some(-484.0));
}

#[rstest]
#[case("1", 1.0)]
#[case("1+2*3", 7.0)]
#[case("(1+2)*3", 9.0)]
#[case("8/2/2", 2.0)]
#[case("10-4-3", 3.0)]
#[case("-3*-3", 9.0)]
fn test_operator_precedence(#[case] input: &str, #[case] expected: f64) {
    assert_eq!(evaluate(input), Some(expected));
}

#[test]
fn test_unbalanced_parenthesis_does_not_match() {
    assert_eq!(evaluate("(1+2"), None);
}

#[test]
fn test_shared_definition_across_threads() {
    let def = Arc::new(calculator());
    let inputs: Vec<String> = (0..64).map(|n| format!("({n}+1)*2-{n}")).collect();

    let results: Vec<f64> = inputs
        .par_iter()
        .map(|input| {
            let def = Arc::clone(&def);
            let m = def.match_at(input.as_str(), 0).unwrap().unwrap();
            assert_eq!(m.end, input.len());
            eval(&def, &m.tree, input, m.root().unwrap())
        })
        .collect();

    for (n, value) in results.into_iter().enumerate() {
        assert_eq!(value, n as f64 + 2.0);
    }
}

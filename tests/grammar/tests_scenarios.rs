//! End-to-end matches over the sample grammars.

use rstest::rstest;
use syntax::grammar::expr::*;
use syntax::{DefinitionBuilder, GrammarError};

use crate::helpers::grammars::{boolean, float, integer};
use crate::helpers::tree_assertions::child_names;

#[test]
fn test_integer_prefix_match() {
    let def = integer();
    let m = def.match_at("-123abc", 0).unwrap().unwrap();
    assert_eq!(m.range(), 0..4);

    let root = m.tree.root_token().unwrap();
    assert_eq!(root.rule_name(), "integer");
    assert_eq!(root.range(), 0..4);
    assert!(!root.has_children());
    assert_eq!(m.tree.to_string(), "integer [0, 4)\n");
}

#[rstest]
#[case("abc")]
#[case("-")]
#[case("")]
fn test_integer_rejects(#[case] input: &str) {
    assert_eq!(integer().match_at(input, 0).unwrap(), None);
}

#[rstest]
#[case("On", "true", 2)]
#[case("YES", "true", 3)]
#[case("false", "false", 5)]
#[case("oFf", "false", 3)]
fn test_boolean_case_insensitive(#[case] input: &str, #[case] rule: &str, #[case] end: usize) {
    let def = boolean();
    let m = def.match_at(input, 0).unwrap().unwrap();
    assert_eq!(m.end, end);

    let root = m.root().unwrap();
    assert_eq!(child_names(&m.tree, root), vec![rule]);
    let child = m.tree.children(root).next().unwrap();
    let expected = def.rule_by_name(rule).unwrap();
    assert_eq!(m.tree[child].rule(), expected);
    assert_eq!(m.tree[child].token_type(), expected.as_token_type());
}

#[test]
fn test_boolean_rejects_other_words() {
    assert_eq!(boolean().match_at("maybe", 0).unwrap(), None);
}

#[rstest]
#[case("3.25", Some(4))]
#[case("-0.5e-3", Some(7))]
#[case(".5", Some(2))]
#[case("7.", Some(2))]
#[case("1e", None)]
#[case("12abc", None)]
fn test_float(#[case] input: &str, #[case] end: Option<usize>) {
    let m = float().match_at(input, 0).unwrap();
    assert_eq!(m.map(|m| m.end), end);
}

#[test]
fn test_void_rule_children_are_spliced() {
    let mut g = DefinitionBuilder::new("pairs");
    g.define("list", many(reference("pair")));
    g.define_void(
        "pair",
        glue([
            reference("item"),
            ch(','),
            reference("item"),
            optional(ch(';')),
        ]),
    );
    g.define("item", many1(range('a', 'z')));
    let def = g.build().unwrap();

    let m = def.match_at("a,b;c,d", 0).unwrap().unwrap();
    assert_eq!(m.end, 7);
    let root = m.root().unwrap();
    assert_eq!(child_names(&m.tree, root), vec!["item"; 4]);
    let ranges: Vec<_> = m.tree.children(root).map(|c| m.tree[c].range()).collect();
    assert_eq!(ranges, vec![0..1, 2..3, 4..5, 6..7]);
    for child in m.tree.children(root) {
        assert_eq!(m.tree[child].parent(), Some(root));
    }
    assert_eq!(m.tree.count_reachable(), 5);
    assert_eq!(m.tree.len(), 5);
}

#[test]
fn test_find_scans_forward() {
    let mut g = DefinitionBuilder::new("foo");
    g.define("foo", string("foo"));
    let def = g.build().unwrap();

    let m = def.find("xxfooyy", 0).unwrap().unwrap();
    assert_eq!((m.start, m.end), (2, 5));
    assert_eq!(m.tree.root_token().unwrap().range(), 2..5);
    assert_eq!(def.find("xxfoo", 3).unwrap(), None);
    assert_eq!(def.find("", 0).unwrap(), None);
}

#[test]
fn test_find_node_extends_match() {
    let mut g = DefinitionBuilder::new("to_foo");
    g.define("to_foo", find(string("foo")));
    let def = g.build().unwrap();

    let m = def.match_at("xxfooyy", 0).unwrap().unwrap();
    assert_eq!((m.start, m.end), (0, 5));
    assert_eq!(def.match_at("xxbaryy", 0).unwrap(), None);
}

#[test]
fn test_undefined_reference_is_a_build_error() {
    let mut g = DefinitionBuilder::new("broken");
    g.define("start", glue([ch('a'), reference("missingRule")]));
    let err = g.build().unwrap_err();
    assert_eq!(
        err,
        GrammarError::UndefinedRule {
            grammar: "broken".into(),
            name: "missingRule".into(),
        }
    );
}

#[test]
fn test_entry_can_be_chosen() {
    let mut g = DefinitionBuilder::new("pick");
    g.define("letters", many1(range('a', 'z')));
    g.define("digits", many1(range('0', '9')));
    g.entry("digits");
    let def = g.build().unwrap();
    assert_eq!(def.entry(), def.rule_by_name("digits").unwrap());
    assert_eq!(def.match_at("42x", 0).unwrap().map(|m| m.end), Some(2));
}

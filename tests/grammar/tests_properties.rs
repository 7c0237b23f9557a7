//! Matching semantics of the individual node kinds.

use rstest::rstest;
use syntax::grammar::expr::*;
use syntax::{Definition, DefinitionBuilder, Text};

use crate::helpers::grammars::calculator;
use crate::helpers::tree_assertions::assert_well_nested;

fn single(expr: Expr) -> Definition {
    let mut g = DefinitionBuilder::new("single");
    g.define("single", expr);
    g.build().unwrap()
}

fn end_of(def: &Definition, input: &str) -> Option<usize> {
    def.match_at(input, 0).unwrap().map(|m| m.end)
}

#[test]
fn test_keyword_maximal_munch() {
    let def = single(keyword("on one"));
    let m = def.match_at("one", 0).unwrap().unwrap();
    assert_eq!(m.end, 3);
    let root = m.tree.root_token().unwrap();
    assert_eq!(Some(root.token_type()), def.keyword_by_name("one"));
    assert_eq!(end_of(&def, "onx"), Some(2));
    assert_eq!(end_of(&def, "o"), None);
}

#[test]
fn test_keyword_casefree() {
    let def = single(keyword_casefree("select from"));
    let m = def.match_at("SELECT *", 0).unwrap().unwrap();
    assert_eq!(m.end, 6);
    assert_eq!(
        Some(m.tree.root_token().unwrap().token_type()),
        def.keyword_by_name("select")
    );
}

#[test]
fn test_ordered_choice_commits_to_first_success() {
    let def = single(or(string("a"), string("ab")));
    assert_eq!(end_of(&def, "ab"), Some(1));
    let def = single(or(string("ab"), string("a")));
    assert_eq!(end_of(&def, "ab"), Some(2));
}

#[test]
fn test_no_backtracking_into_completed_choice() {
    let def = single(glue([or(string("a"), string("ab")), ch('c')]));
    assert_eq!(end_of(&def, "abc"), None);
    assert_eq!(end_of(&def, "ac"), Some(2));
}

#[rstest]
#[case("", None)]
#[case("a", None)]
#[case("aa", Some(2))]
#[case("aaa", Some(3))]
#[case("aaaa", Some(3))]
fn test_repeat_bounds(#[case] input: &str, #[case] end: Option<usize>) {
    let def = single(repeat(2, 3, ch('a')));
    assert_eq!(end_of(&def, input), end);
}

#[test]
fn test_repeat_stops_on_empty_iteration() {
    assert_eq!(end_of(&single(many(optional(ch('a')))), "aab"), Some(2));
    assert_eq!(end_of(&single(many(pass())), "b"), Some(0));
    assert_eq!(end_of(&single(repeat(3, 5, pass())), "b"), None);
}

#[rstest]
#[case("abc", Some(3))]
#[case("a", Some(1))]
#[case("abcd", None)]
fn test_length_bounds(#[case] input: &str, #[case] end: Option<usize>) {
    let def = single(length(1, 3, many1(range('a', 'z'))));
    assert_eq!(end_of(&def, input), end);
}

#[test]
fn test_lookahead_is_zero_width() {
    let def = single(glue([ahead(string("ab")), ch('a')]));
    assert_eq!(end_of(&def, "ab"), Some(1));
    assert_eq!(end_of(&def, "ac"), None);

    let def = single(glue([not(ch('x')), any()]));
    assert_eq!(end_of(&def, "y"), Some(1));
    assert_eq!(end_of(&def, "x"), None);
    assert_eq!(end_of(&def, ""), None);
}

#[test]
fn test_any_but_scans_to_delimiter() {
    let def = single(glue([ch('"'), many(any_but(ch('"'))), ch('"')]));
    assert_eq!(end_of(&def, "\"abc\" tail"), Some(5));
    assert_eq!(end_of(&def, "\"abc"), None);
}

#[test]
fn test_char_sets_and_ranges() {
    assert_eq!(end_of(&single(many(none_of(" \t"))), "ab c"), Some(2));
    assert_eq!(end_of(&single(many(except('0', '9'))), "ab1"), Some(2));
    assert_eq!(end_of(&single(other('x')), "x"), None);
    assert_eq!(end_of(&single(class(CharClass::Whitespace)), "\t"), Some(1));
}

#[test]
fn test_begin_and_end_of_input() {
    let def = single(glue([boi(), ch('a')]));
    assert_eq!(def.match_at("ba", 1).unwrap(), None);
    assert_eq!(end_of(&def, "ab"), Some(1));

    let def = single(glue([many(ch('a')), eoi()]));
    assert_eq!(end_of(&def, "aa"), Some(2));
    assert_eq!(end_of(&def, "aab"), None);
    assert_eq!(end_of(&def, ""), Some(0));
}

#[test]
fn test_is_match_requires_whole_input() {
    let def = single(many1(range('0', '9')));
    assert!(def.is_match("123"));
    assert!(!def.is_match("123x"));
    assert!(!def.is_match("x"));
}

#[test]
fn test_call_hook() {
    let def = single(glue([
        call(|media, i, _state| {
            let mut j = i;
            while media.get(j) == Some('a') {
                j += 1;
            }
            (j > i).then_some(j)
        }),
        ch('!'),
    ]));
    assert_eq!(end_of(&def, "aaa!"), Some(4));
    assert_eq!(end_of(&def, "!"), None);
}

#[test]
fn test_echo_passes_through() {
    let def = single(glue([echo("before a"), ch('a')]));
    assert_eq!(end_of(&def, "a"), Some(1));
}

#[test]
fn test_inline_produces_no_token() {
    let mut g = DefinitionBuilder::new("inline");
    g.define("outer", glue([inline("digits"), ch(';')]));
    g.define("digits", many1(range('0', '9')));
    let def = g.build().unwrap();
    let m = def.match_at("42;", 0).unwrap().unwrap();
    assert_eq!(m.end, 3);
    assert_eq!(m.tree.count_reachable(), 1);
}

#[test]
fn test_char_indexed_media() {
    let def = single(many1(class(CharClass::Alpha)));
    let text = Text::from("héllo wörld");
    assert_eq!(def.match_at(&text, 0).unwrap().map(|m| m.end), Some(5));
    let m = def.match_at(&text, 6).unwrap().unwrap();
    assert_eq!(m.tree.text(&text, m.root().unwrap()), "wörld");

    let chars: Vec<char> = "ünï".chars().collect();
    assert_eq!(def.match_at(&chars, 0).unwrap().map(|m| m.end), Some(3));
}

#[rstest]
#[case("1+2*3")]
#[case("(-12+34)*(56-78)")]
#[case("((1))")]
#[case("7/-7-1")]
fn test_spans_are_well_nested(#[case] input: &str) {
    let def = calculator();
    let m = def.match_at(input, 0).unwrap().unwrap();
    assert_eq!(m.end, input.len());
    assert_well_nested(&m.tree);
    let root = m.tree.root_token().unwrap();
    assert_eq!(root.range(), 0..input.len());
    assert_eq!(root.parent(), None);
}

#[test]
fn test_matching_is_deterministic() {
    let def = calculator();
    let first = def.match_at("(1+2)*3-4/5", 0).unwrap();
    let second = def.match_at("(1+2)*3-4/5", 0).unwrap();
    assert!(first.is_some());
    assert_eq!(first, second);
}

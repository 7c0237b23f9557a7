//! Context-sensitive matching through flags, chars, strings and nested grammars.

use std::sync::Arc;

use rstest::rstest;
use syntax::grammar::expr::*;
use syntax::{DefinitionBuilder, MatchConfig, MatchError};

use crate::helpers::grammars::{integer, quoted};

#[rstest]
#[case("\"it's\"", true)]
#[case("'say \"hi\"'", true)]
#[case("\"it\"s\"", false)]
#[case("\"open", false)]
#[case("plain", false)]
fn test_quoted_string_closes_with_opening_quote(#[case] input: &str, #[case] accepted: bool) {
    assert_eq!(quoted().is_match(input), accepted);
}

#[test]
fn test_state_slots_are_declared_in_order() {
    let def = quoted();
    assert!(def.is_stateful());
    assert_eq!(def.char_id("quote"), Some(0));
    assert_eq!(def.flag_id("quote"), None);

    let state = def.new_state();
    assert_eq!(state.num_chars(), 1);
    assert_eq!(state.character(0), '"');
    assert!(!integer().is_stateful());
}

#[test]
fn test_flags_guard_optional_suffix() {
    let mut g = DefinitionBuilder::new("bang");
    g.state_flag("negative", false);
    g.define(
        "bang",
        glue([
            optional(glue([ch('-'), set("negative", true)])),
            many1(range('0', '9')),
            if_flag("negative", ch('!')),
        ]),
    );
    let def = g.build().unwrap();

    assert!(def.is_match("-5!"));
    assert_eq!(def.match_at("-5", 0).unwrap(), None);
    assert!(def.is_match("5"));
    assert!(!def.is_match("5!"));
}

#[test]
fn test_failed_alternative_discards_state_changes() {
    let mut g = DefinitionBuilder::new("undo");
    g.state_flag("seen", false);
    g.define(
        "undo",
        or(
            glue([set("seen", true), ch('a')]),
            if_else("seen", ch('X'), ch('b')),
        ),
    );
    let def = g.build().unwrap();
    assert!(def.is_match("b"));
    assert!(!def.is_match("X"));
}

#[test]
fn test_caller_state_survives_the_match() {
    let mut g = DefinitionBuilder::new("capture");
    g.state_char("last", '?');
    g.define("capture", many1(get_char("last")));
    let def = g.build().unwrap();

    let config = MatchConfig::default();
    let mut state = def.new_state();
    let mut factory = config.token_factory();
    let end = def.match_with("xyz", 0, &mut state, &mut factory, &config).unwrap();
    assert_eq!(end, Some(3));
    assert_eq!(state.character(def.char_id("last").unwrap()), 'z');
    assert_eq!(factory.tree().root_token().unwrap().range(), 0..3);
}

#[test]
fn test_heredoc_terminator_is_captured() {
    let mut g = DefinitionBuilder::new("heredoc");
    g.state_string("tag", "");
    g.define(
        "heredoc",
        glue([
            string("<<"),
            get_string("tag", many1(range('A', 'Z'))),
            ch('\n'),
            find(glue([ch('\n'), var_string("tag")])),
            eoi(),
        ]),
    );
    let def = g.build().unwrap();

    assert!(def.is_match("<<EOF\nhello\nEOF"));
    assert!(!def.is_match("<<EOF\nhello\nEND"));
    assert!(def.is_match("<<END\nEOF\nEND"));
}

#[test]
fn test_set_string_and_set_char() {
    let mut g = DefinitionBuilder::new("preset");
    g.state_string("word", "none");
    g.state_char("sep", ',');
    g.define(
        "preset",
        glue([
            set_string("word", "ok"),
            var_string("word"),
            set_char("sep", ';'),
            var_char("sep"),
        ]),
    );
    let def = g.build().unwrap();
    assert!(def.is_match("ok;"));
    assert!(!def.is_match("ok,"));
    assert!(!def.is_match("none;"));
}

#[test]
fn test_foreign_state_is_rejected() {
    let def = quoted();
    let other = integer();
    let config = MatchConfig::default();
    let mut state = other.new_state();
    let mut factory = config.token_factory();
    assert_eq!(
        def.match_with("\"a\"", 0, &mut state, &mut factory, &config),
        Err(MatchError::StateMismatch {
            grammar: "quoted".into()
        })
    );
}

#[test]
fn test_invoke_nests_foreign_tokens() {
    let digits = Arc::new(integer());
    let mut g = DefinitionBuilder::new("assign");
    g.define(
        "assign",
        glue([
            many1(range('a', 'z')),
            ch('='),
            invoke(digits.clone()),
            eoi(),
        ]),
    );
    let def = g.build().unwrap();

    let m = def.match_at("x=42", 0).unwrap().unwrap();
    assert_eq!(m.end, 4);
    let root = m.root().unwrap();
    let child = m.tree.children(root).next().unwrap();
    let token = &m.tree[child];
    assert_eq!(token.rule_name(), "integer");
    assert_eq!(token.language(), digits.language());
    assert_ne!(token.language(), def.language());
    assert_eq!(token.range(), 2..4);

    assert_eq!(def.match_at("x=", 0).unwrap(), None);
}

#[test]
fn test_invoke_within_covered_window() {
    let mut whole = DefinitionBuilder::new("whole");
    whole.define_self(glue([many1(range('0', '9')), eoi()]));
    let whole = Arc::new(whole.build().unwrap());

    let mut g = DefinitionBuilder::new("field");
    g.define(
        "field",
        glue([
            ch('"'),
            invoke_within(whole.clone(), many(other('"'))),
            ch('"'),
        ]),
    );
    let def = g.build().unwrap();

    // eoi inside the nested grammar sees the end of the covered window
    let m = def.match_at("\"12\" rest", 0).unwrap().unwrap();
    assert_eq!(m.end, 4);
    let root = m.root().unwrap();
    let child = m.tree.children(root).next().unwrap();
    assert_eq!(m.tree[child].range(), 1..3);

    // the coverage alone decides success
    let m = def.match_at("\"ab\"", 0).unwrap().unwrap();
    assert_eq!(m.end, 4);
    assert_eq!(m.tree.children(m.root().unwrap()).count(), 0);
}

#[test]
fn test_child_state_is_reused_per_language() {
    let mut g = DefinitionBuilder::new("inner");
    g.state_flag("inner_flag", true);
    g.define("inner", ch('i'));
    let inner = g.build().unwrap();

    let outer = quoted();
    let mut state = outer.new_state();
    *inner.new_child_state(&mut state).flag_mut(0) = false;
    assert!(!state.child_for(&inner).flag(0));
    assert!(state.child_for(&integer()).is_stateless());
}

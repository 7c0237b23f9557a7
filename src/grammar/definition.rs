//! Linked, immutable grammar definitions and their match entry points.

use std::ops::Range;

use indexmap::IndexMap;
use smol_str::SmolStr;

use super::config::MatchConfig;
use super::errors::MatchError;
use super::matcher::Matcher;
use super::node::{Node, Rule};
use crate::base::Media;
use crate::state::State;
use crate::token::{LanguageId, RuleId, TokenFactory, TokenId, TokenTree};
use crate::trie::{KeywordMap, PrefixTree};

/// A built grammar.
///
/// Definitions are immutable after [`DefinitionBuilder::build`](super::DefinitionBuilder::build)
/// and may be shared across threads; every match call brings its own
/// [`State`] and [`TokenFactory`].
#[derive(Debug)]
pub struct Definition {
    pub(crate) name: SmolStr,
    pub(crate) language: LanguageId,
    pub(crate) nodes: Vec<Node>,
    pub(crate) rules: Vec<Rule>,
    pub(crate) rule_by_name: PrefixTree<char, RuleId>,
    pub(crate) keywords: KeywordMap,
    pub(crate) entry: RuleId,
    pub(crate) flags: IndexMap<SmolStr, bool>,
    pub(crate) chars: IndexMap<SmolStr, char>,
    pub(crate) strings: IndexMap<SmolStr, Box<[char]>>,
}

/// A successful match: the matched span and its token tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    pub start: usize,
    pub end: usize,
    pub tree: TokenTree,
}

impl Match {
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Token of the entry rule.
    pub fn root(&self) -> Option<TokenId> {
        self.tree.root()
    }
}

impl Definition {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn language(&self) -> LanguageId {
        self.language
    }

    pub fn entry(&self) -> RuleId {
        self.entry
    }

    pub fn rule(&self, id: RuleId) -> Option<&Rule> {
        self.rules.get(id.index())
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn rule_by_name(&self, name: &str) -> Option<RuleId> {
        self.rule_by_name.get(name.chars()).copied()
    }

    /// Id of a keyword declared by any `keyword` node, in declaration order.
    pub fn keyword_by_name(&self, name: &str) -> Option<u32> {
        self.keywords.get(name.chars()).copied()
    }

    pub fn num_keywords(&self) -> usize {
        self.keywords.len()
    }

    pub fn flag_id(&self, name: &str) -> Option<usize> {
        self.flags.get_index_of(name)
    }

    pub fn char_id(&self, name: &str) -> Option<usize> {
        self.chars.get_index_of(name)
    }

    pub fn string_id(&self, name: &str) -> Option<usize> {
        self.strings.get_index_of(name)
    }

    /// True if the grammar declares any state slot.
    pub fn is_stateful(&self) -> bool {
        !(self.flags.is_empty() && self.chars.is_empty() && self.strings.is_empty())
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Fresh state with every slot at its declared default.
    pub fn new_state(&self) -> State {
        State::new(
            self.language,
            self.flags.values().copied().collect(),
            self.chars.values().copied().collect(),
            self.strings.values().map(|s| s.to_vec()).collect(),
        )
    }

    /// Fresh state installed in `parent`'s child slot.
    pub fn new_child_state<'s>(&self, parent: &'s mut State) -> &'s mut State {
        parent.set_child(self.new_state());
        parent.child_for(self)
    }

    /// Match the entry rule at `i0` with a fresh state and default limits.
    pub fn match_at<M: Media + ?Sized>(&self, media: &M, i0: usize) -> Result<Option<Match>, MatchError> {
        self.match_with_config(media, i0, &MatchConfig::default())
    }

    pub fn match_with_config<M: Media + ?Sized>(
        &self,
        media: &M,
        i0: usize,
        config: &MatchConfig,
    ) -> Result<Option<Match>, MatchError> {
        let mut state = self.new_state();
        let mut factory = config.token_factory();
        let end = self.match_with(media, i0, &mut state, &mut factory, config)?;
        Ok(end.map(|end| Match {
            start: i0,
            end,
            tree: factory.into_tree(),
        }))
    }

    /// Match the entry rule at `i0` using caller-owned state and tokens.
    ///
    /// On success the factory's root is the entry rule's token. Tokens of a
    /// failed attempt are reclaimed before this returns.
    pub fn match_with<M: Media + ?Sized>(
        &self,
        media: &M,
        i0: usize,
        state: &mut State,
        factory: &mut TokenFactory,
        config: &MatchConfig,
    ) -> Result<Option<usize>, MatchError> {
        if state.language() != self.language {
            return Err(MatchError::StateMismatch {
                grammar: self.name.clone(),
            });
        }
        let media: &dyn Media = &media;
        let mark = factory.len();
        let result = Matcher::new(self, media, factory, config).match_rule(self.entry, i0, None, state);
        match result {
            Ok(Some(end)) => {
                if factory.len() > mark {
                    factory.set_root(Some(TokenId(mark as u32)));
                }
                Ok(Some(end))
            }
            Ok(None) => Ok(None),
            Err(err) => {
                tracing::warn!("[MATCH] '{}' aborted at {}: {}", self.name, i0, err);
                Err(err)
            }
        }
    }

    /// First match at or after `i0`.
    pub fn find<M: Media + ?Sized>(&self, media: &M, i0: usize) -> Result<Option<Match>, MatchError> {
        let config = MatchConfig::default();
        let mut state = self.new_state();
        let mut factory = config.token_factory();
        let found = self.find_with(media, i0, &mut state, &mut factory, &config)?;
        Ok(found.map(|range| Match {
            start: range.start,
            end: range.end,
            tree: factory.into_tree(),
        }))
    }

    /// Try [`match_with`](Self::match_with) at every offset from `i0` until one succeeds.
    ///
    /// State changes of failed attempts are discarded.
    pub fn find_with<M: Media + ?Sized>(
        &self,
        media: &M,
        i0: usize,
        state: &mut State,
        factory: &mut TokenFactory,
        config: &MatchConfig,
    ) -> Result<Option<Range<usize>>, MatchError> {
        let snapshot = (!state.is_stateless()).then(|| state.clone());
        for i in i0..=Media::len(media) {
            if let Some(end) = self.match_with(media, i, state, factory, config)? {
                return Ok(Some(i..end));
            }
            if let Some(snapshot) = &snapshot {
                state.copy_from(snapshot);
            }
        }
        Ok(None)
    }

    /// True if the entry rule matches the whole of `media`.
    pub fn is_match<M: Media + ?Sized>(&self, media: &M) -> bool {
        matches!(self.match_at(media, 0), Ok(Some(m)) if m.end == Media::len(media))
    }
}

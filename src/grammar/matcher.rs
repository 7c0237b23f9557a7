//! The matching engine.
//!
//! A [`Matcher`] walks the node graph of one definition over one media
//! window. Each step returns `Ok(Some(end))` on success, `Ok(None)` when the
//! input does not match (the caller backtracks) and `Err` when the whole
//! match must be aborted.
//!
//! Token bookkeeping: every step takes a factory checkpoint before it runs
//! and rolls back to it when it or any of its continuations fail, so a
//! failed branch leaves neither tokens nor child links behind. State is
//! snapshotted only at choice points (choices, repeat iterations, find
//! attempts, length checks and lookaheads), and only when the state has
//! any slots at all.

use tracing::{debug, trace, warn};

use super::config::MatchConfig;
use super::definition::Definition;
use super::errors::MatchError;
use super::node::{NodeId, NodeKind, Rule};
use crate::base::{Media, Position, Window};
use crate::state::State;
use crate::token::{RuleId, TokenFactory, TokenId};
use crate::trie::fold_case;

type Step = Result<Option<usize>, MatchError>;

/// Remaining stack below which a rule activation moves to a fresh segment.
const RED_ZONE: usize = 128 * 1024;
/// Size of each fresh stack segment.
const STACK_PER_RULE: usize = 1024 * 1024;

pub(crate) struct Matcher<'a> {
    definition: &'a Definition,
    media: &'a dyn Media,
    /// Elements at or past `end` are out of reach.
    end: usize,
    factory: &'a mut TokenFactory,
    config: &'a MatchConfig,
    depth: usize,
    /// Cleared inside lookaheads and coverage matches, which produce no tokens.
    building: bool,
}

impl<'a> Matcher<'a> {
    pub(crate) fn new(
        definition: &'a Definition,
        media: &'a dyn Media,
        factory: &'a mut TokenFactory,
        config: &'a MatchConfig,
    ) -> Self {
        Self {
            definition,
            media,
            end: media.len(),
            factory,
            config,
            depth: 0,
            building: true,
        }
    }

    #[inline]
    fn get(&self, i: usize) -> Option<char> {
        if i < self.end { self.media.get(i) } else { None }
    }

    /// Activate rule `id` at `i`, producing its token under `parent`.
    pub(crate) fn match_rule(
        &mut self,
        id: RuleId,
        i: usize,
        parent: Option<TokenId>,
        state: &mut State,
    ) -> Step {
        let definition = self.definition;
        let rule = &definition.rules[id.index()];
        self.enter(rule)?;
        let result = stacker::maybe_grow(RED_ZONE, STACK_PER_RULE, || {
            self.activate(rule, i, parent, state)
        });
        self.depth -= 1;
        result
    }

    fn enter(&mut self, rule: &Rule) -> Result<(), MatchError> {
        if self.depth >= self.config.max_depth {
            warn!(
                "[MATCH] '{}': nesting limit {} reached at rule '{}'",
                self.definition.name, self.config.max_depth, rule.name
            );
            return Err(MatchError::RecursionLimit {
                rule: rule.name.clone(),
                max_depth: self.config.max_depth,
            });
        }
        self.depth += 1;
        Ok(())
    }

    fn activate(
        &mut self,
        rule: &'a Rule,
        i: usize,
        parent: Option<TokenId>,
        state: &mut State,
    ) -> Step {
        if !self.building {
            return self.match_next(rule.entry, i, None, state);
        }

        // void rules add their children straight to the enclosing token
        if let (true, Some(parent)) = (rule.is_void, parent) {
            let token_type = self.factory.tree()[parent].token_type();
            let result = self.match_next(rule.entry, i, Some(parent), state)?;
            if result.is_some() {
                self.factory.set_token_type(parent, token_type);
            }
            return Ok(result);
        }

        let checkpoint = self.factory.checkpoint(parent);
        let token = self.factory.produce(i)?;
        self.factory.join(
            token,
            parent,
            rule.name.clone(),
            self.definition.language,
            rule.id,
            rule.token_type,
            i,
        );
        trace!("[MATCH] enter '{}' at {}", rule.name, i);

        let result = self.match_next(rule.entry, i, Some(token), state)?;
        match result {
            Some(h) => {
                self.factory.set_end(token, h);
                trace!("[MATCH] '{}' matched [{}, {})", rule.name, i, h);
            }
            None => {
                self.factory.rollback(checkpoint);
                trace!("[MATCH] '{}' failed at {}", rule.name, i);
            }
        }
        Ok(result)
    }

    /// Match node `id` and then the rest of its sequence.
    fn match_next(
        &mut self,
        id: NodeId,
        i: usize,
        parent: Option<TokenId>,
        state: &mut State,
    ) -> Step {
        let definition = self.definition;
        let node = &definition.nodes[id.index()];
        let checkpoint = self.factory.checkpoint(parent);

        let mut result = self.match_node(&node.kind, i, parent, state)?;
        if let (Some(h), Some(next)) = (result, node.next) {
            result = self.match_next(next, h, parent, state)?;
        }
        if result.is_none() {
            self.factory.rollback(checkpoint);
        }
        Ok(result)
    }

    fn match_node(
        &mut self,
        kind: &'a NodeKind,
        i: usize,
        parent: Option<TokenId>,
        state: &mut State,
    ) -> Step {
        let next = i + 1;
        Ok(match kind {
            NodeKind::Char { ch, invert } => self
                .get(i)
                .filter(|c| (c == ch) != *invert)
                .map(|_| next),
            NodeKind::Any => self.get(i).map(|_| next),
            NodeKind::Range { a, b, invert } => self
                .get(i)
                .filter(|c| (a..=b).contains(&c) != *invert)
                .map(|_| next),
            NodeKind::Set { chars, invert } => self
                .get(i)
                .filter(|c| chars.contains(c) != *invert)
                .map(|_| next),
            NodeKind::Class(class) => self
                .get(i)
                .filter(|&c| class.contains(c))
                .map(|_| next),
            NodeKind::String { text, fold } => {
                let matched = text.iter().enumerate().all(|(k, &t)| {
                    self.get(i + k)
                        .is_some_and(|c| if *fold { fold_case(c) == t } else { c == t })
                });
                matched.then_some(i + text.len())
            }
            NodeKind::Keyword { map } => {
                let found = map
                    .longest_match((i..).map_while(|j| self.get(j)))
                    .map(|(n, &keyword)| (n, keyword));
                match found {
                    Some((n, keyword)) => {
                        if self.building {
                            if let Some(parent) = parent {
                                self.factory.set_token_type(parent, keyword);
                            }
                        }
                        Some(i + n)
                    }
                    None => None,
                }
            }
            NodeKind::Repeat { min, max, entry } => {
                self.match_repeat(*min, *max, *entry, i, parent, state)?
            }
            NodeKind::Boi => (i == 0).then_some(i),
            NodeKind::Eoi => (i == self.end).then_some(i),
            NodeKind::Pass => Some(i),
            NodeKind::Fail => None,
            NodeKind::Ahead { entry, invert } => {
                let snapshot = snapshot(state);
                let building = std::mem::replace(&mut self.building, false);
                let result = self.match_next(*entry, i, parent, state);
                self.building = building;
                restore(state, &snapshot);
                (result?.is_some() != *invert).then_some(i)
            }
            NodeKind::Find { entry } => {
                let snapshot = snapshot(state);
                let mut found = None;
                for j in i..=self.end {
                    if let Some(h) = self.match_next(*entry, j, parent, state)? {
                        found = Some(h);
                        break;
                    }
                    restore(state, &snapshot);
                }
                found
            }
            NodeKind::Or { first, second } => {
                let snapshot = snapshot(state);
                match self.match_next(*first, i, parent, state)? {
                    Some(h) => Some(h),
                    None => {
                        restore(state, &snapshot);
                        let result = self.match_next(*second, i, parent, state)?;
                        if result.is_none() {
                            restore(state, &snapshot);
                        }
                        result
                    }
                }
            }
            NodeKind::Length { min, max, entry } => {
                let snapshot = snapshot(state);
                let result = self
                    .match_next(*entry, i, parent, state)?
                    .filter(|h| (*min..=*max).contains(&(h - i)));
                if result.is_none() {
                    restore(state, &snapshot);
                }
                result
            }
            NodeKind::Ref { rule } => self.match_rule(*rule, i, parent, state)?,
            NodeKind::Inline { rule } => {
                let definition = self.definition;
                let rule = &definition.rules[rule.index()];
                self.enter(rule)?;
                let result = stacker::maybe_grow(RED_ZONE, STACK_PER_RULE, || {
                    self.match_next(rule.entry, i, parent, state)
                });
                self.depth -= 1;
                result?
            }
            NodeKind::Previous { rule, keyword } => {
                let language = self.definition.language;
                let preceding = parent.and_then(|parent| self.factory.previous_sibling(parent));
                preceding
                    .is_some_and(|token| {
                        token.language() == language
                            && token.rule() == *rule
                            && keyword.is_none_or(|keyword| token.token_type() == keyword)
                    })
                    .then_some(i)
            }
            NodeKind::Call(callback) => {
                let window = Window {
                    media: self.media,
                    end: self.end,
                };
                (callback.0)(&window, i, state).filter(|&h| h >= i && h <= self.end)
            }
            NodeKind::SetFlag { flag, value } => {
                *state.flag_mut(*flag) = *value;
                Some(i)
            }
            NodeKind::IfFlag {
                flag,
                then,
                otherwise,
            } => {
                if state.flag(*flag) {
                    self.match_next(*then, i, parent, state)?
                } else {
                    match otherwise {
                        Some(otherwise) => self.match_next(*otherwise, i, parent, state)?,
                        None => Some(i),
                    }
                }
            }
            NodeKind::GetChar { slot } => self.get(i).map(|c| {
                *state.character_mut(*slot) = c;
                next
            }),
            NodeKind::SetChar { slot, value } => {
                *state.character_mut(*slot) = *value;
                Some(i)
            }
            NodeKind::VarChar { slot, invert } => self
                .get(i)
                .filter(|&c| (c == state.character(*slot)) != *invert)
                .map(|_| next),
            NodeKind::GetString { slot, coverage } => {
                let building = std::mem::replace(&mut self.building, false);
                let result = self.match_next(*coverage, i, parent, state);
                self.building = building;
                let result = result?;
                if let Some(h) = result {
                    let captured: Vec<char> = (i..h).map_while(|j| self.get(j)).collect();
                    *state.string_mut(*slot) = captured;
                }
                result
            }
            NodeKind::SetString { slot, value } => {
                let slot = state.string_mut(*slot);
                slot.clear();
                slot.extend_from_slice(value);
                Some(i)
            }
            NodeKind::VarString { slot } => {
                let text = state.string(*slot);
                let matched = text
                    .iter()
                    .enumerate()
                    .all(|(k, &t)| self.get(i + k) == Some(t));
                matched.then_some(i + text.len())
            }
            NodeKind::Invoke {
                definition,
                coverage,
            } => self.invoke(definition, *coverage, i, parent, state)?,
            NodeKind::Echo(message) => {
                debug!(target: "syntax::echo", "[ECHO] {} at {}", message, i);
                Some(i)
            }
            NodeKind::Error(message) => {
                return Err(MatchError::Syntax {
                    message: message.to_string(),
                    offset: i,
                    position: Position::at(self.media, i),
                });
            }
        })
    }

    fn match_repeat(
        &mut self,
        min: usize,
        max: usize,
        entry: NodeId,
        i: usize,
        parent: Option<TokenId>,
        state: &mut State,
    ) -> Step {
        let mut count = 0;
        let mut pos = i;
        while count < max {
            let snapshot = snapshot(state);
            match self.match_next(entry, pos, parent, state)? {
                Some(h) => {
                    count += 1;
                    let advanced = h > pos;
                    pos = h;
                    if !advanced {
                        break;
                    }
                }
                None => {
                    restore(state, &snapshot);
                    break;
                }
            }
        }
        Ok((count >= min).then_some(pos))
    }

    /// Match `sub`'s entry rule with its own child state.
    ///
    /// With a coverage expression the coverage alone decides success and
    /// extent; the nested grammar only annotates the covered window.
    fn invoke(
        &mut self,
        sub: &'a Definition,
        coverage: Option<NodeId>,
        i: usize,
        parent: Option<TokenId>,
        state: &mut State,
    ) -> Step {
        let covered = match coverage {
            Some(coverage) => {
                let building = std::mem::replace(&mut self.building, false);
                let result = self.match_next(coverage, i, parent, state);
                self.building = building;
                match result? {
                    Some(h) => Some(h),
                    None => return Ok(None),
                }
            }
            None => None,
        };

        let child = state.child_for(sub);
        let mut nested = Matcher {
            definition: sub,
            media: self.media,
            end: covered.unwrap_or(self.end),
            factory: &mut *self.factory,
            config: self.config,
            depth: self.depth,
            building: self.building,
        };
        let result = nested.match_rule(sub.entry, i, parent, child)?;
        Ok(covered.or(result))
    }
}

fn snapshot(state: &State) -> Option<State> {
    (!state.is_stateless()).then(|| state.clone())
}

fn restore(state: &mut State, snapshot: &Option<State>) {
    if let Some(snapshot) = snapshot {
        state.copy_from(snapshot);
    }
}

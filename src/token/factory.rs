//! Per-match token allocator.
//!
//! Tokens are bump-allocated into the factory's arena. Every matcher step
//! takes a [`Checkpoint`] first and rewinds to it when the step fails, so
//! tokens produced by abandoned alternatives are reclaimed immediately and
//! never become visible in the parent's child list.

use smol_str::SmolStr;

use super::tree::{LanguageId, RuleId, Token, TokenId, TokenTree};
use crate::grammar::MatchError;

/// Saved allocation watermark plus the parent's mutable fields.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Checkpoint {
    mark: usize,
    parent: Option<ParentSnapshot>,
}

#[derive(Debug, Clone, Copy)]
struct ParentSnapshot {
    id: TokenId,
    last_child: Option<TokenId>,
    token_type: u32,
}

/// Allocator for the tokens of one match call.
///
/// A factory created with [`TokenFactory::with_capacity`] works on a fixed
/// buffer and fails the match with [`MatchError::TokenBufferExhausted`] once
/// the buffer is full. [`TokenFactory::new`] grows on demand.
#[derive(Debug, Default)]
pub struct TokenFactory {
    tree: TokenTree,
    capacity: Option<usize>,
}

impl TokenFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Factory limited to `capacity` live tokens.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            tree: TokenTree::with_capacity(capacity),
            capacity: Some(capacity),
        }
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    /// Tokens currently allocated.
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    pub fn tree(&self) -> &TokenTree {
        &self.tree
    }

    pub fn root(&self) -> Option<TokenId> {
        self.tree.root()
    }

    /// Hand the produced tree to the caller.
    pub fn into_tree(self) -> TokenTree {
        self.tree
    }

    /// Forget every token so the buffer can serve another match.
    pub fn reset(&mut self) {
        self.tree.truncate(0);
    }

    /// Allocate a blank token.
    pub(crate) fn produce(&mut self, i0: usize) -> Result<TokenId, MatchError> {
        if let Some(capacity) = self.capacity {
            if self.tree.len() >= capacity {
                return Err(MatchError::TokenBufferExhausted { capacity });
            }
        }
        Ok(self
            .tree
            .push(Token::new(SmolStr::default(), RuleId(0), 0, LanguageId(0), i0)))
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn join(
        &mut self,
        token: TokenId,
        parent: Option<TokenId>,
        rule_name: SmolStr,
        language: LanguageId,
        rule: RuleId,
        token_type: u32,
        i0: usize,
    ) {
        self.tree
            .join(token, parent, rule_name, language, rule, i0, i0);
        self.tree.get_mut(token).set_token_type(token_type);
    }

    pub(crate) fn set_end(&mut self, token: TokenId, i1: usize) {
        self.tree.get_mut(token).set_end(i1);
    }

    pub(crate) fn set_token_type(&mut self, token: TokenId, token_type: u32) {
        self.tree.get_mut(token).set_token_type(token_type);
    }

    pub(crate) fn set_root(&mut self, root: Option<TokenId>) {
        self.tree.set_root(root);
    }

    pub(crate) fn previous_sibling(&self, token: TokenId) -> Option<&Token> {
        self.tree[token].previous_sibling().map(|id| &self.tree[id])
    }

    pub(crate) fn checkpoint(&self, parent: Option<TokenId>) -> Checkpoint {
        Checkpoint {
            mark: self.tree.len(),
            parent: parent.map(|id| {
                let token = &self.tree[id];
                ParentSnapshot {
                    id,
                    last_child: token.last_child(),
                    token_type: token.token_type(),
                }
            }),
        }
    }

    /// Undo everything done since `checkpoint` was taken.
    pub(crate) fn rollback(&mut self, checkpoint: Checkpoint) {
        if let Some(parent) = checkpoint.parent {
            self.tree.truncate_children(parent.id, parent.last_child);
            self.tree.get_mut(parent.id).set_token_type(parent.token_type);
        }
        self.tree.truncate(checkpoint.mark);
    }
}

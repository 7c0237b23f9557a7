//! Token arena and parse-tree navigation.
//!
//! Tokens are stored in one vector and linked by index: parent, first/last
//! child and next/previous sibling. Links are non-owning, the arena owns
//! every token, so there are no reference cycles to break.

use std::fmt;

use smol_str::SmolStr;
use text_size::{TextRange, TextSize};

use crate::base::{Media, collect};

/// Index of a token within its [`TokenTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TokenId(pub(crate) u32);

impl TokenId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Dense id of a rule within its definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RuleId(pub(crate) u32);

impl RuleId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Default token type of tokens produced by this rule.
    #[inline]
    pub fn as_token_type(self) -> u32 {
        self.0
    }
}

/// Tag distinguishing definitions, carried by every token they produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LanguageId(pub(crate) u32);

impl LanguageId {
    #[inline]
    pub fn get(self) -> u32 {
        self.0
    }
}

/// A parse-tree node recording a matched span `[i0, i1)` and the rule that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    parent: Option<TokenId>,
    first_child: Option<TokenId>,
    last_child: Option<TokenId>,
    next_sibling: Option<TokenId>,
    previous_sibling: Option<TokenId>,
    i0: usize,
    i1: usize,
    rule_name: SmolStr,
    rule: RuleId,
    token_type: u32,
    language: LanguageId,
}

impl Token {
    pub(crate) fn new(rule_name: SmolStr, rule: RuleId, token_type: u32, language: LanguageId, i0: usize) -> Self {
        Self {
            parent: None,
            first_child: None,
            last_child: None,
            next_sibling: None,
            previous_sibling: None,
            i0,
            i1: i0,
            rule_name,
            rule,
            token_type,
            language,
        }
    }

    pub fn parent(&self) -> Option<TokenId> {
        self.parent
    }

    pub fn first_child(&self) -> Option<TokenId> {
        self.first_child
    }

    pub fn last_child(&self) -> Option<TokenId> {
        self.last_child
    }

    pub fn next_sibling(&self) -> Option<TokenId> {
        self.next_sibling
    }

    pub fn previous_sibling(&self) -> Option<TokenId> {
        self.previous_sibling
    }

    pub fn has_children(&self) -> bool {
        self.first_child.is_some()
    }

    pub fn i0(&self) -> usize {
        self.i0
    }

    pub fn i1(&self) -> usize {
        self.i1
    }

    pub fn range(&self) -> std::ops::Range<usize> {
        self.i0..self.i1
    }

    /// The span as a `TextRange`, saturating offsets that do not fit in 32 bits.
    pub fn text_range(&self) -> TextRange {
        let at = |i: usize| TextSize::new(u32::try_from(i).unwrap_or(u32::MAX));
        TextRange::new(at(self.i0), at(self.i1))
    }

    pub fn len(&self) -> usize {
        self.i1 - self.i0
    }

    pub fn is_empty(&self) -> bool {
        self.i0 == self.i1
    }

    pub fn rule_name(&self) -> &str {
        &self.rule_name
    }

    pub fn rule(&self) -> RuleId {
        self.rule
    }

    /// Rule id unless a keyword match overrode it.
    pub fn token_type(&self) -> u32 {
        self.token_type
    }

    pub fn language(&self) -> LanguageId {
        self.language
    }

    pub(crate) fn set_token_type(&mut self, token_type: u32) {
        self.token_type = token_type;
    }

    pub(crate) fn set_end(&mut self, i1: usize) {
        self.i1 = i1;
    }
}

/// Arena of tokens forming (at most) one parse tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenTree {
    tokens: Vec<Token>,
    root: Option<TokenId>,
}

impl TokenTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            tokens: Vec::with_capacity(capacity),
            root: None,
        }
    }

    /// Root token of a successful match.
    pub fn root(&self) -> Option<TokenId> {
        self.root
    }

    pub fn root_token(&self) -> Option<&Token> {
        self.root.map(|id| &self[id])
    }

    pub fn get(&self, id: TokenId) -> Option<&Token> {
        self.tokens.get(id.index())
    }

    /// Number of tokens held by the arena.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Direct children of `id`, left to right.
    pub fn children(&self, id: TokenId) -> Children<'_> {
        Children {
            tree: self,
            next: self[id].first_child,
        }
    }

    /// `id` and everything below it in pre-order.
    pub fn descendants(&self, id: TokenId) -> Descendants<'_> {
        Descendants {
            tree: self,
            root: id,
            next: Some(id),
        }
    }

    /// Source text spanned by `id`.
    pub fn text<M: Media + ?Sized>(&self, media: &M, id: TokenId) -> String {
        let media: &dyn Media = &media;
        let token = &self[id];
        collect(media, token.i0, token.i1)
    }

    /// Number of tokens reachable from the root.
    pub fn count_reachable(&self) -> usize {
        self.root.map_or(0, |root| self.descendants(root).count())
    }

    // Mutation, used by the token factory while matching.

    pub(crate) fn set_root(&mut self, root: Option<TokenId>) {
        self.root = root;
    }

    pub(crate) fn push(&mut self, token: Token) -> TokenId {
        let id = TokenId(self.tokens.len() as u32);
        self.tokens.push(token);
        id
    }

    pub(crate) fn get_mut(&mut self, id: TokenId) -> &mut Token {
        &mut self.tokens[id.index()]
    }

    /// Attach `child` under `parent` and fill its descriptive fields.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn join(
        &mut self,
        child: TokenId,
        parent: Option<TokenId>,
        rule_name: SmolStr,
        language: LanguageId,
        rule: RuleId,
        i0: usize,
        i1: usize,
    ) {
        {
            let token = self.get_mut(child);
            token.rule_name = rule_name;
            token.language = language;
            token.rule = rule;
            token.i0 = i0;
            token.i1 = i1;
        }
        if let Some(parent) = parent {
            self.append_child(parent, child);
        }
    }

    pub(crate) fn append_child(&mut self, parent: TokenId, child: TokenId) {
        let last = self[parent].last_child;
        {
            let token = self.get_mut(child);
            token.parent = Some(parent);
            token.previous_sibling = last;
            token.next_sibling = None;
        }
        match last {
            Some(last) => self.get_mut(last).next_sibling = Some(child),
            None => self.get_mut(parent).first_child = Some(child),
        }
        self.get_mut(parent).last_child = Some(child);
    }

    /// Drop every child of `parent` after `keep` (all of them if `keep` is `None`).
    pub(crate) fn truncate_children(&mut self, parent: TokenId, keep: Option<TokenId>) {
        match keep {
            Some(keep) => self.get_mut(keep).next_sibling = None,
            None => self.get_mut(parent).first_child = None,
        }
        self.get_mut(parent).last_child = keep;
    }

    /// Free every token allocated at or after `len`.
    pub(crate) fn truncate(&mut self, len: usize) {
        self.tokens.truncate(len);
        if self.root.is_some_and(|root| root.index() >= len) {
            self.root = None;
        }
    }

    fn fmt_token(&self, f: &mut fmt::Formatter<'_>, id: TokenId, depth: usize) -> fmt::Result {
        let token = &self[id];
        writeln!(
            f,
            "{:indent$}{} [{}, {})",
            "",
            token.rule_name,
            token.i0,
            token.i1,
            indent = depth * 2
        )?;
        for child in self.children(id) {
            self.fmt_token(f, child, depth + 1)?;
        }
        Ok(())
    }
}

impl std::ops::Index<TokenId> for TokenTree {
    type Output = Token;

    fn index(&self, id: TokenId) -> &Token {
        &self.tokens[id.index()]
    }
}

/// Indented dump of the tree, one `name [i0, i1)` line per token.
impl fmt::Display for TokenTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.root {
            Some(root) => self.fmt_token(f, root, 0),
            None => Ok(()),
        }
    }
}

pub struct Children<'a> {
    tree: &'a TokenTree,
    next: Option<TokenId>,
}

impl Iterator for Children<'_> {
    type Item = TokenId;

    fn next(&mut self) -> Option<TokenId> {
        let current = self.next?;
        self.next = self.tree[current].next_sibling;
        Some(current)
    }
}

pub struct Descendants<'a> {
    tree: &'a TokenTree,
    root: TokenId,
    next: Option<TokenId>,
}

impl Iterator for Descendants<'_> {
    type Item = TokenId;

    fn next(&mut self) -> Option<TokenId> {
        let current = self.next?;
        let token = &self.tree[current];
        self.next = match token.first_child {
            Some(child) => Some(child),
            None => {
                // climb until a sibling exists, never above the starting token
                let mut cursor = current;
                loop {
                    if cursor == self.root {
                        break None;
                    }
                    let t = &self.tree[cursor];
                    if let Some(sibling) = t.next_sibling {
                        break Some(sibling);
                    }
                    match t.parent {
                        Some(parent) => cursor = parent,
                        None => break None,
                    }
                }
            }
        };
        Some(current)
    }
}

//! Per-match scratchpad for context-sensitive rules.
//!
//! A [`State`] holds the flag, char and string slots declared by one
//! definition, addressed by the dense ids assigned at declaration time.
//! Nested grammars get their own state, cached in the single child slot so
//! repeated invocations of the same grammar reuse it.

use crate::grammar::Definition;
use crate::token::LanguageId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct State {
    language: LanguageId,
    flags: Vec<bool>,
    chars: Vec<char>,
    strings: Vec<Vec<char>>,
    child: Option<Box<State>>,
}

impl State {
    pub(crate) fn new(
        language: LanguageId,
        flags: Vec<bool>,
        chars: Vec<char>,
        strings: Vec<Vec<char>>,
    ) -> Self {
        Self {
            language,
            flags,
            chars,
            strings,
            child: None,
        }
    }

    /// Language of the definition this state was built for.
    pub fn language(&self) -> LanguageId {
        self.language
    }

    pub fn num_flags(&self) -> usize {
        self.flags.len()
    }

    pub fn num_chars(&self) -> usize {
        self.chars.len()
    }

    pub fn num_strings(&self) -> usize {
        self.strings.len()
    }

    pub fn flag(&self, id: usize) -> bool {
        self.flags[id]
    }

    pub fn flag_mut(&mut self, id: usize) -> &mut bool {
        &mut self.flags[id]
    }

    pub fn character(&self, id: usize) -> char {
        self.chars[id]
    }

    pub fn character_mut(&mut self, id: usize) -> &mut char {
        &mut self.chars[id]
    }

    pub fn string(&self, id: usize) -> &[char] {
        &self.strings[id]
    }

    pub fn string_mut(&mut self, id: usize) -> &mut Vec<char> {
        &mut self.strings[id]
    }

    pub fn child(&self) -> Option<&State> {
        self.child.as_deref()
    }

    pub fn child_mut(&mut self) -> Option<&mut State> {
        self.child.as_deref_mut()
    }

    pub fn set_child(&mut self, child: State) {
        self.child = Some(Box::new(child));
    }

    pub fn take_child(&mut self) -> Option<State> {
        self.child.take().map(|child| *child)
    }

    /// Child state for a nested `definition`, reusing the cached one when it
    /// belongs to the same language.
    pub fn child_for(&mut self, definition: &Definition) -> &mut State {
        let child = match self.child.take() {
            Some(child) if child.language == definition.language() => child,
            _ => Box::new(definition.new_state()),
        };
        self.child.insert(child)
    }

    /// True when there is nothing a speculative branch could modify.
    pub fn is_stateless(&self) -> bool {
        self.flags.is_empty()
            && self.chars.is_empty()
            && self.strings.is_empty()
            && self.child.is_none()
    }

    /// Overwrite this state with `other`, reusing allocations.
    pub fn copy_from(&mut self, other: &State) {
        self.language = other.language;
        self.flags.clone_from(&other.flags);
        self.chars.clone_from(&other.chars);
        self.strings.clone_from(&other.strings);
        self.child.clone_from(&other.child);
    }
}

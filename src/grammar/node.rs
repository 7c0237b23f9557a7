//! Linked node graph of a built definition.
//!
//! Every [`Node`] lives in the definition's flat arena and is addressed by a
//! [`NodeId`]. A node carries the id of the node that continues the sequence
//! after it, so a rule body is a chain of nodes that the matcher walks by
//! following `next` links. Branching nodes (choices, repeats, lookaheads)
//! hold the ids of their own sub-chains.

use std::sync::Arc;

use smol_str::SmolStr;

use super::definition::Definition;
use super::expr::{Callback, CharClass};
use crate::token::RuleId;
use crate::trie::KeywordMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct NodeId(pub(crate) u32);

impl NodeId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug)]
pub(crate) struct Node {
    pub(crate) kind: NodeKind,
    pub(crate) next: Option<NodeId>,
}

#[derive(Debug)]
pub(crate) enum NodeKind {
    Char { ch: char, invert: bool },
    Any,
    Range { a: char, b: char, invert: bool },
    Set { chars: Box<[char]>, invert: bool },
    Class(CharClass),
    /// `fold` compares case-insensitively; `text` is stored folded then.
    String { text: Box<[char]>, fold: bool },
    Keyword { map: Box<KeywordMap> },
    Repeat { min: usize, max: usize, entry: NodeId },
    Boi,
    Eoi,
    Pass,
    Fail,
    Ahead { entry: NodeId, invert: bool },
    Find { entry: NodeId },
    Or { first: NodeId, second: NodeId },
    Length { min: usize, max: usize, entry: NodeId },
    Ref { rule: RuleId },
    Inline { rule: RuleId },
    /// `keyword` is patched in once every keyword of the definition is known.
    Previous { rule: RuleId, keyword: Option<u32> },
    Call(Callback),
    SetFlag { flag: usize, value: bool },
    IfFlag { flag: usize, then: NodeId, otherwise: Option<NodeId> },
    GetChar { slot: usize },
    SetChar { slot: usize, value: char },
    VarChar { slot: usize, invert: bool },
    GetString { slot: usize, coverage: NodeId },
    SetString { slot: usize, value: Box<[char]> },
    VarString { slot: usize },
    Invoke { definition: Arc<Definition>, coverage: Option<NodeId> },
    Echo(SmolStr),
    Error(SmolStr),
}

/// A named rule of a definition.
#[derive(Debug, Clone)]
pub struct Rule {
    pub(crate) name: SmolStr,
    pub(crate) id: RuleId,
    pub(crate) entry: NodeId,
    pub(crate) is_void: bool,
    pub(crate) token_type: u32,
}

impl Rule {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id(&self) -> RuleId {
        self.id
    }

    /// Void rules hand their children to the enclosing token instead of producing one.
    pub fn is_void(&self) -> bool {
        self.is_void
    }

    /// Type stamped on tokens this rule produces, unless a keyword overrides it.
    pub fn token_type(&self) -> u32 {
        self.token_type
    }
}

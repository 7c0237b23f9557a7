//! Error types for grammar construction and matching.
//!
//! A plain non-match is not an error: matchers report it as `Ok(None)` and
//! it is absorbed by choices, repeats and finds. Everything here terminates
//! the attempt immediately.

use smol_str::SmolStr;
use thiserror::Error;

use crate::base::{MediaError, Position};

/// Grammar-authoring defects, detected by the linking pass in
/// [`DefinitionBuilder::build`](super::DefinitionBuilder::build).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GrammarError {
    /// A `reference`, `inline` or `previous` names a rule that was never defined.
    #[error("undefined rule '{name}' referenced in '{grammar}'")]
    UndefinedRule { grammar: SmolStr, name: SmolStr },

    /// Two rules share a name.
    #[error("redefinition of rule '{name}' in '{grammar}'")]
    DuplicateRule { grammar: SmolStr, name: SmolStr },

    /// A state node names a slot that was never declared.
    #[error("undefined state {kind} '{name}' referenced in '{grammar}'")]
    UndefinedState {
        grammar: SmolStr,
        kind: &'static str,
        name: SmolStr,
    },

    /// A state slot was declared twice.
    #[error("redeclaration of state {kind} '{name}' in '{grammar}'")]
    DuplicateState {
        grammar: SmolStr,
        kind: &'static str,
        name: SmolStr,
    },

    /// `previous_keyword` names a keyword no `keyword` node declares.
    #[error("undefined keyword '{name}' referenced in '{grammar}'")]
    UndefinedKeyword { grammar: SmolStr, name: SmolStr },

    /// No rule was defined, so there is nothing to match.
    #[error("grammar '{grammar}' has no entry rule")]
    MissingEntry { grammar: SmolStr },

    /// `repeat` or `length` bounds with `min > max`.
    #[error("invalid bounds {min}..={max} in '{grammar}'")]
    InvalidBounds {
        grammar: SmolStr,
        min: usize,
        max: usize,
    },
}

/// Non-backtrackable failures while matching.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatchError {
    /// A fixed-size token buffer ran out mid-match.
    #[error("token buffer exhausted (capacity {capacity})")]
    TokenBufferExhausted { capacity: usize },

    /// Rule nesting exceeded the configured depth, usually left recursion.
    #[error("rule nesting exceeded {max_depth} levels at rule '{rule}'")]
    RecursionLimit { rule: SmolStr, max_depth: usize },

    /// The state passed in was built for another definition.
    #[error("state belongs to another grammar than '{grammar}'")]
    StateMismatch { grammar: SmolStr },

    /// An `error` node was reached: the grammar committed to a syntax error.
    #[error("{position}: {message}")]
    Syntax {
        message: String,
        offset: usize,
        position: Position,
    },
}

impl MatchError {
    /// Offset of a committed syntax error.
    pub fn offset(&self) -> Option<usize> {
        match self {
            Self::Syntax { offset, .. } => Some(*offset),
            _ => None,
        }
    }
}

/// Any error the crate produces.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error(transparent)]
    Grammar(#[from] GrammarError),

    #[error(transparent)]
    Match(#[from] MatchError),

    #[error(transparent)]
    Media(#[from] MediaError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

//! # syntax-engine
//!
//! PEG-style grammar engine: grammars are authored as expression trees,
//! linked once into an immutable node graph, and matched against any
//! random-access character media to produce a parse tree of tokens.
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! grammar   → Expr authoring, DefinitionBuilder, Definition, matcher
//!   ↓
//! state     → Per-match flags, chars and strings, nested child state
//!   ↓
//! token     → Token arena, TokenTree, rewindable TokenFactory
//!   ↓
//! trie      → PrefixTree for keywords and rule names
//!   ↓
//! base      → Media trait, Text, Position
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use syntax::grammar::expr::*;
//! use syntax::grammar::DefinitionBuilder;
//!
//! let mut g = DefinitionBuilder::new("integer");
//! g.define_self(glue([optional(one_of("+-")), many1(range('0', '9'))]));
//! let integer = g.build()?;
//!
//! let m = integer.match_at("-123abc", 0)?.unwrap();
//! assert_eq!(m.range(), 0..4);
//! ```

// ============================================================================
// MODULES (dependency order: base → trie → token → state → grammar)
// ============================================================================

/// Foundation types: Media, Text, Position
pub mod base;

/// Prefix trees for keyword and rule-name lookup
pub mod trie;

/// Tokens, token trees and the token factory
pub mod token;

/// Per-match state for context-sensitive rules
pub mod state;

/// Grammar authoring, linking and matching
pub mod grammar;

// Re-export commonly needed items
pub use base::{Media, Position, Text};
pub use grammar::{Definition, DefinitionBuilder, Error, GrammarError, Match, MatchConfig, MatchError, Result};
pub use state::State;
pub use token::{LanguageId, RuleId, Token, TokenFactory, TokenId, TokenTree};
pub use trie::PrefixTree;

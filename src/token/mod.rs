//! Parse-tree tokens and their per-match allocator.
//!
//! - [`TokenTree`] - arena of [`Token`]s linked by [`TokenId`]
//! - [`TokenFactory`] - bounded or growable, rewindable token allocator

mod factory;
mod tree;

pub use factory::TokenFactory;
pub use tree::{Children, Descendants, LanguageId, RuleId, Token, TokenId, TokenTree};

//! Grammar definitions and the matching engine.
//!
//! - [`expr`] - authoring functions building [`Expr`] trees
//! - [`DefinitionBuilder`] - rule registration and linking
//! - [`Definition`] - immutable, shareable grammar with the match entry points
//! - [`MatchConfig`] - per-call limits

mod builder;
mod config;
mod definition;
mod errors;
pub mod expr;
mod matcher;
mod node;

pub use builder::DefinitionBuilder;
pub use config::{DEFAULT_MAX_DEPTH, MatchConfig};
pub use definition::{Definition, Match};
pub use errors::{Error, GrammarError, MatchError, Result};
pub use expr::{CharClass, Expr};
pub use node::Rule;

//! Foundation types for the grammar engine.
//!
//! This module provides the input side of matching:
//! - [`Media`] - the random-access input contract
//! - [`Text`] - UTF-8 decoded, char-indexed media
//! - [`Position`] - line/column lookup for offsets
//!
//! This module has NO dependencies on other modules of the crate.

mod media;
mod position;

pub use media::{Media, MediaError, Text, collect};
pub use position::Position;

pub(crate) use media::Window;

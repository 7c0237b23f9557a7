//! Line/column lookup for media offsets
//!
//! Used when reporting committed syntax errors.

use super::media::Media;

/// A position in media (0-indexed)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }

    /// Compute the position of `offset` by counting `'\n'` from the start of `media`.
    ///
    /// Offsets past the end clamp to the end of the media.
    pub fn at(media: &dyn Media, offset: usize) -> Self {
        let mut position = Position::default();
        let mut i = 0;
        while i < offset {
            match media.get(i) {
                Some('\n') => {
                    position.line += 1;
                    position.column = 0;
                }
                Some(_) => position.column += 1,
                None => break,
            }
            i += 1;
        }
        position
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line + 1, self.column + 1)
    }
}

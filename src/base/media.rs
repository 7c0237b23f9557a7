//! Input media the grammar engine matches against.
//!
//! A [`Media`] is any bounds-checked, random-access sequence of `char`s.
//! The engine never mutates it and all token offsets index into it.

use thiserror::Error;

/// Random-access input sequence.
///
/// `get` returns `None` past the end, which is how every matcher detects
/// end of input.
pub trait Media {
    /// Element at `index`, or `None` when out of bounds.
    fn get(&self, index: usize) -> Option<char>;

    /// Number of addressable elements.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Media + ?Sized> Media for &T {
    #[inline]
    fn get(&self, index: usize) -> Option<char> {
        (**self).get(index)
    }

    #[inline]
    fn len(&self) -> usize {
        (**self).len()
    }
}

// Byte-indexed media surface every byte as the Latin-1 char of the same value,
// so offsets stay byte offsets.

impl Media for [u8] {
    #[inline]
    fn get(&self, index: usize) -> Option<char> {
        <[u8]>::get(self, index).map(|&b| char::from(b))
    }

    #[inline]
    fn len(&self) -> usize {
        <[u8]>::len(self)
    }
}

impl Media for str {
    #[inline]
    fn get(&self, index: usize) -> Option<char> {
        Media::get(self.as_bytes(), index)
    }

    #[inline]
    fn len(&self) -> usize {
        str::len(self)
    }
}

impl Media for String {
    #[inline]
    fn get(&self, index: usize) -> Option<char> {
        Media::get(self.as_bytes(), index)
    }

    #[inline]
    fn len(&self) -> usize {
        String::len(self)
    }
}

impl Media for [char] {
    #[inline]
    fn get(&self, index: usize) -> Option<char> {
        <[char]>::get(self, index).copied()
    }

    #[inline]
    fn len(&self) -> usize {
        <[char]>::len(self)
    }
}

impl Media for Vec<char> {
    #[inline]
    fn get(&self, index: usize) -> Option<char> {
        self.as_slice().get(index).copied()
    }

    #[inline]
    fn len(&self) -> usize {
        Vec::len(self)
    }
}

/// Errors raised while turning raw input into media.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MediaError {
    /// The input is not valid UTF-8.
    #[error("invalid UTF-8 at byte offset {offset}")]
    InvalidUtf8 { offset: usize },
}

/// Char-indexed media decoded from UTF-8.
///
/// Unlike `str`, offsets count Unicode scalar values, so non-ASCII grammars
/// see whole characters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Text {
    chars: Vec<char>,
}

impl Text {
    /// Decode `bytes` as UTF-8.
    pub fn decode(bytes: &[u8]) -> Result<Self, MediaError> {
        let s = std::str::from_utf8(bytes).map_err(|e| MediaError::InvalidUtf8 {
            offset: e.valid_up_to(),
        })?;
        Ok(Self::from(s))
    }

    pub fn as_chars(&self) -> &[char] {
        &self.chars
    }

    /// Collect `range` back into a `String`.
    pub fn slice(&self, range: std::ops::Range<usize>) -> String {
        self.chars[range].iter().collect()
    }
}

impl From<&str> for Text {
    fn from(s: &str) -> Self {
        Self {
            chars: s.chars().collect(),
        }
    }
}

impl Media for Text {
    #[inline]
    fn get(&self, index: usize) -> Option<char> {
        self.chars.as_slice().get(index).copied()
    }

    #[inline]
    fn len(&self) -> usize {
        self.chars.len()
    }
}

/// View of `media` truncated at `end`.
///
/// Used for nested grammars invoked over a covered window.
pub(crate) struct Window<'a> {
    pub(crate) media: &'a dyn Media,
    pub(crate) end: usize,
}

impl Media for Window<'_> {
    #[inline]
    fn get(&self, index: usize) -> Option<char> {
        if index < self.end {
            self.media.get(index)
        } else {
            None
        }
    }

    #[inline]
    fn len(&self) -> usize {
        self.end.min(self.media.len())
    }
}

/// Collect `media[start..end]` into a `String`.
pub fn collect(media: &dyn Media, start: usize, end: usize) -> String {
    (start..end).map_while(|i| media.get(i)).collect()
}

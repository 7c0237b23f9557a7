//! Grammar authoring surface.
//!
//! Grammars are written as [`Expr`] trees with the free functions below and
//! registered as rules on a [`DefinitionBuilder`](super::DefinitionBuilder).
//! Sequencing is [`glue`]; there is no separate sequence node once the
//! grammar is linked, each node simply continues with the next one.
//!
//! ```ignore
//! use syntax::grammar::*;
//!
//! let mut g = DefinitionBuilder::new("integer");
//! g.define_self(glue([
//!     optional(one_of("+-")),
//!     many1(range('0', '9')),
//! ]));
//! let integer = g.build()?;
//! ```

use std::fmt;
use std::sync::Arc;

use smol_str::SmolStr;

use super::definition::Definition;
use crate::base::Media;
use crate::state::State;

/// User hook invoked by [`call`]: returns the end offset on success.
#[derive(Clone)]
pub struct Callback(pub(crate) Arc<dyn Fn(&dyn Media, usize, &mut State) -> Option<usize> + Send + Sync>);

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Callback")
    }
}

/// Predefined character classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CharClass {
    /// ASCII `0-9`
    Digit,
    /// Unicode alphabetic
    Alpha,
    /// Unicode alphanumeric
    Alnum,
    /// Unicode whitespace
    Whitespace,
    /// Unicode identifier start (`XID_Start`)
    XidStart,
    /// Unicode identifier continuation (`XID_Continue`)
    XidContinue,
}

impl CharClass {
    pub fn contains(self, c: char) -> bool {
        match self {
            Self::Digit => c.is_ascii_digit(),
            Self::Alpha => c.is_alphabetic(),
            Self::Alnum => c.is_alphanumeric(),
            Self::Whitespace => c.is_whitespace(),
            Self::XidStart => unicode_ident::is_xid_start(c),
            Self::XidContinue => unicode_ident::is_xid_continue(c),
        }
    }
}

/// A grammar expression, lowered into the node graph when the definition is built.
#[derive(Debug, Clone)]
pub enum Expr {
    Char { ch: char, invert: bool },
    Any,
    Range { a: char, b: char, invert: bool },
    Set { chars: Box<[char]>, invert: bool },
    Class(CharClass),
    String { text: Box<[char]>, case_sensitive: Option<bool> },
    Keyword { words: Vec<SmolStr>, case_sensitive: Option<bool> },
    Repeat { min: usize, max: usize, entry: Box<Expr> },
    Boi,
    Eoi,
    Pass,
    Fail,
    Ahead { entry: Box<Expr>, invert: bool },
    Find(Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Glue(Vec<Expr>),
    Length { min: usize, max: usize, entry: Box<Expr> },
    Ref(SmolStr),
    Inline(SmolStr),
    Previous { rule: SmolStr, keyword: Option<SmolStr> },
    Call(Callback),
    SetFlag { name: SmolStr, value: bool },
    IfFlag { name: SmolStr, then: Box<Expr>, otherwise: Option<Box<Expr>> },
    GetChar(SmolStr),
    SetChar { name: SmolStr, value: char },
    VarChar { name: SmolStr, invert: bool },
    GetString { name: SmolStr, coverage: Box<Expr> },
    SetString { name: SmolStr, value: SmolStr },
    VarString(SmolStr),
    Invoke { definition: Arc<Definition>, coverage: Option<Box<Expr>> },
    Echo(SmolStr),
    Error(SmolStr),
}

impl From<char> for Expr {
    fn from(c: char) -> Self {
        ch(c)
    }
}

impl From<&str> for Expr {
    fn from(s: &str) -> Self {
        string(s)
    }
}

// --- single elements -------------------------------------------------------

/// One element equal to `c`.
pub fn ch(c: char) -> Expr {
    Expr::Char { ch: c, invert: false }
}

/// One element different from `c`.
pub fn other(c: char) -> Expr {
    Expr::Char { ch: c, invert: true }
}

/// Any one element.
pub fn any() -> Expr {
    Expr::Any
}

/// One element in `a..=b`.
pub fn range(a: char, b: char) -> Expr {
    Expr::Range { a, b, invert: false }
}

/// One element outside `a..=b`.
pub fn except(a: char, b: char) -> Expr {
    Expr::Range { a, b, invert: true }
}

/// One element out of `chars`.
pub fn one_of(chars: &str) -> Expr {
    Expr::Set {
        chars: chars.chars().collect(),
        invert: false,
    }
}

/// One element not in `chars`.
pub fn none_of(chars: &str) -> Expr {
    Expr::Set {
        chars: chars.chars().collect(),
        invert: true,
    }
}

pub fn class(class: CharClass) -> Expr {
    Expr::Class(class)
}

/// `text` verbatim, case handling per the definition's `case_sensitive` option.
pub fn string(text: &str) -> Expr {
    Expr::String {
        text: text.chars().collect(),
        case_sensitive: None,
    }
}

/// `text` ignoring case.
pub fn casefree(text: &str) -> Expr {
    Expr::String {
        text: text.chars().collect(),
        case_sensitive: Some(false),
    }
}

/// Longest of the whitespace-separated `words`; sets the enclosing token's type to the keyword id.
pub fn keyword(words: &str) -> Expr {
    Expr::Keyword {
        words: words.split_whitespace().map(SmolStr::new).collect(),
        case_sensitive: None,
    }
}

pub fn keyword_casefree(words: &str) -> Expr {
    Expr::Keyword {
        words: words.split_whitespace().map(SmolStr::new).collect(),
        case_sensitive: Some(false),
    }
}

// --- repetition and anchors ------------------------------------------------

/// Greedily apply `entry` between `min` and `max` times.
pub fn repeat(min: usize, max: usize, entry: Expr) -> Expr {
    Expr::Repeat {
        min,
        max,
        entry: Box::new(entry),
    }
}

pub fn optional(entry: Expr) -> Expr {
    repeat(0, 1, entry)
}

pub fn many(entry: Expr) -> Expr {
    repeat(0, usize::MAX, entry)
}

pub fn many1(entry: Expr) -> Expr {
    repeat(1, usize::MAX, entry)
}

/// Begin of input.
pub fn boi() -> Expr {
    Expr::Boi
}

/// End of input.
pub fn eoi() -> Expr {
    Expr::Eoi
}

pub fn pass() -> Expr {
    Expr::Pass
}

pub fn fail() -> Expr {
    Expr::Fail
}

// --- lookahead, search, choice ---------------------------------------------

/// Succeeds without consuming if `entry` matches here.
pub fn ahead(entry: Expr) -> Expr {
    Expr::Ahead {
        entry: Box::new(entry),
        invert: false,
    }
}

/// Succeeds without consuming if `entry` does not match here.
pub fn not(entry: Expr) -> Expr {
    Expr::Ahead {
        entry: Box::new(entry),
        invert: true,
    }
}

/// One element, provided `entry` does not match here.
pub fn any_but(entry: Expr) -> Expr {
    glue([not(entry), any()])
}

/// Scan forward to the first position where `entry` matches.
pub fn find(entry: Expr) -> Expr {
    Expr::Find(Box::new(entry))
}

/// Ordered choice: `a`, or `b` if `a` fails.
pub fn or(a: Expr, b: Expr) -> Expr {
    Expr::Or(Box::new(a), Box::new(b))
}

/// Ordered choice over any number of alternatives.
pub fn choice<I: IntoIterator<Item = Expr>>(alternatives: I) -> Expr {
    let mut alternatives: Vec<Expr> = alternatives.into_iter().collect();
    let Some(mut tail) = alternatives.pop() else {
        return fail();
    };
    while let Some(head) = alternatives.pop() {
        tail = or(head, tail);
    }
    tail
}

/// Sequence.
pub fn glue<I: IntoIterator<Item = Expr>>(items: I) -> Expr {
    Expr::Glue(items.into_iter().collect())
}

/// `entry`, provided it spans between `min` and `max` elements.
pub fn length(min: usize, max: usize, entry: Expr) -> Expr {
    Expr::Length {
        min,
        max,
        entry: Box::new(entry),
    }
}

// --- rules -----------------------------------------------------------------

/// Match rule `name`, producing its token.
pub fn reference(name: &str) -> Expr {
    Expr::Ref(name.into())
}

/// Match the body of rule `name` in place, without a token of its own.
pub fn inline(name: &str) -> Expr {
    Expr::Inline(name.into())
}

/// Succeeds without consuming if the token preceding the enclosing one was produced by rule `name`.
pub fn previous(name: &str) -> Expr {
    Expr::Previous {
        rule: name.into(),
        keyword: None,
    }
}

/// Like [`previous`], additionally requiring that token to carry `keyword`'s type.
pub fn previous_keyword(name: &str, keyword: &str) -> Expr {
    Expr::Previous {
        rule: name.into(),
        keyword: Some(keyword.into()),
    }
}

pub fn call<F>(f: F) -> Expr
where
    F: Fn(&dyn Media, usize, &mut State) -> Option<usize> + Send + Sync + 'static,
{
    Expr::Call(Callback(Arc::new(f)))
}

// --- state -----------------------------------------------------------------

pub fn set(flag: &str, value: bool) -> Expr {
    Expr::SetFlag {
        name: flag.into(),
        value,
    }
}

/// `then` if `flag` is set, otherwise succeed without consuming.
pub fn if_flag(flag: &str, then: Expr) -> Expr {
    Expr::IfFlag {
        name: flag.into(),
        then: Box::new(then),
        otherwise: None,
    }
}

pub fn if_else(flag: &str, then: Expr, otherwise: Expr) -> Expr {
    Expr::IfFlag {
        name: flag.into(),
        then: Box::new(then),
        otherwise: Some(Box::new(otherwise)),
    }
}

/// Consume one element and capture it in char slot `name`.
pub fn get_char(name: &str) -> Expr {
    Expr::GetChar(name.into())
}

pub fn set_char(name: &str, value: char) -> Expr {
    Expr::SetChar {
        name: name.into(),
        value,
    }
}

/// One element equal to the char captured in `name`.
pub fn var_char(name: &str) -> Expr {
    Expr::VarChar {
        name: name.into(),
        invert: false,
    }
}

/// One element different from the char captured in `name`.
pub fn var_other(name: &str) -> Expr {
    Expr::VarChar {
        name: name.into(),
        invert: true,
    }
}

/// Capture the span matched by `coverage` in string slot `name`.
pub fn get_string(name: &str, coverage: Expr) -> Expr {
    Expr::GetString {
        name: name.into(),
        coverage: Box::new(coverage),
    }
}

pub fn set_string(name: &str, value: &str) -> Expr {
    Expr::SetString {
        name: name.into(),
        value: value.into(),
    }
}

/// The string captured in `name`, verbatim.
pub fn var_string(name: &str) -> Expr {
    Expr::VarString(name.into())
}

// --- nesting and diagnostics -----------------------------------------------

/// Match `definition`'s entry rule here with its own state.
pub fn invoke(definition: Arc<Definition>) -> Expr {
    Expr::Invoke {
        definition,
        coverage: None,
    }
}

/// Let `coverage` decide the extent, then annotate that window with `definition`.
pub fn invoke_within(definition: Arc<Definition>, coverage: Expr) -> Expr {
    Expr::Invoke {
        definition,
        coverage: Some(Box::new(coverage)),
    }
}

/// Emit a debug event and continue.
pub fn echo(message: &str) -> Expr {
    Expr::Echo(message.into())
}

/// Abort the match with a syntax error at the current offset.
pub fn error(message: &str) -> Expr {
    Expr::Error(message.into())
}

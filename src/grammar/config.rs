//! Match-time configuration.

/// Default limit on nested rule activations.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Limits applied to one match call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchConfig {
    /// Maximum number of nested rule activations before the match aborts
    /// with [`MatchError::RecursionLimit`](super::MatchError::RecursionLimit).
    pub max_depth: usize,
    /// Size of the fixed token buffer; `None` grows on demand.
    pub token_capacity: Option<usize>,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            token_capacity: None,
        }
    }
}

impl MatchConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_token_capacity(mut self, capacity: usize) -> Self {
        self.token_capacity = Some(capacity);
        self
    }

    /// Token factory matching this configuration.
    pub fn token_factory(&self) -> crate::token::TokenFactory {
        match self.token_capacity {
            Some(capacity) => crate::token::TokenFactory::with_capacity(capacity),
            None => crate::token::TokenFactory::new(),
        }
    }
}

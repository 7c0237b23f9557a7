//! Prefix tree with maximal-munch lookup.
//!
//! Used for rule-name resolution and for keyword/operator recognition.
//! Nodes live in a single arena; each node maps the next key element to a
//! child index through an `FxHashMap`.

use rustc_hash::FxHashMap;

/// Keyword lookup table: keyword text to dense keyword id.
pub type KeywordMap = PrefixTree<char, u32>;

#[derive(Debug, Clone)]
struct TrieNode<K, V> {
    children: FxHashMap<K, u32>,
    value: Option<V>,
}

impl<K, V> Default for TrieNode<K, V> {
    fn default() -> Self {
        Self {
            children: FxHashMap::default(),
            value: None,
        }
    }
}

/// Trie over sequences of `K`.
///
/// Every key element is passed through the tree's normaliser before it is
/// stored or compared, which is how case-insensitive maps are built.
#[derive(Debug, Clone)]
pub struct PrefixTree<K, V> {
    nodes: Vec<TrieNode<K, V>>,
    normalize: fn(K) -> K,
    len: usize,
}

fn identity<K>(k: K) -> K {
    k
}

impl<K, V> Default for PrefixTree<K, V>
where
    K: Copy + Eq + std::hash::Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> PrefixTree<K, V>
where
    K: Copy + Eq + std::hash::Hash,
{
    pub fn new() -> Self {
        Self::with_normalizer(identity)
    }

    /// Tree whose keys are compared after applying `normalize`.
    pub fn with_normalizer(normalize: fn(K) -> K) -> Self {
        Self {
            nodes: vec![TrieNode::default()],
            normalize,
            len: 0,
        }
    }

    /// Number of keys stored.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Insert `value` under `key` unless the key is already mapped.
    ///
    /// Returns `None` when the value was inserted, or the value already stored
    /// for the key (which is kept).
    pub fn insert<I>(&mut self, key: I, value: V) -> Option<&V>
    where
        I: IntoIterator<Item = K>,
    {
        let mut node = 0usize;
        for k in key {
            let k = (self.normalize)(k);
            node = match self.nodes[node].children.get(&k) {
                Some(&child) => child as usize,
                None => {
                    let child = self.nodes.len();
                    self.nodes.push(TrieNode::default());
                    self.nodes[node].children.insert(k, child as u32);
                    child
                }
            };
        }

        if self.nodes[node].value.is_some() {
            return self.nodes[node].value.as_ref();
        }
        self.nodes[node].value = Some(value);
        self.len += 1;
        None
    }

    /// Exact lookup.
    pub fn get<I>(&self, key: I) -> Option<&V>
    where
        I: IntoIterator<Item = K>,
    {
        let mut node = 0usize;
        for k in key {
            node = *self.nodes[node].children.get(&(self.normalize)(k))? as usize;
        }
        self.nodes[node].value.as_ref()
    }

    /// Walk `input` from its start and return the longest key that prefixes it.
    ///
    /// Yields the number of elements the key spans together with its value,
    /// or `None` if no terminal node was passed.
    pub fn longest_match<I>(&self, input: I) -> Option<(usize, &V)>
    where
        I: IntoIterator<Item = K>,
    {
        let mut node = 0usize;
        let mut best = None;
        for (n, k) in input.into_iter().enumerate() {
            match self.nodes[node].children.get(&(self.normalize)(k)) {
                Some(&child) => node = child as usize,
                None => break,
            }
            if let Some(value) = &self.nodes[node].value {
                best = Some((n + 1, value));
            }
        }
        best
    }
}

impl<V> PrefixTree<char, V> {
    /// Char tree that ignores case.
    pub fn case_insensitive() -> Self {
        Self::with_normalizer(fold_case)
    }
}

/// Simple case folding used by case-insensitive strings and keywords.
pub(crate) fn fold_case(c: char) -> char {
    if c.is_ascii() {
        c.to_ascii_lowercase()
    } else {
        c.to_lowercase().next().unwrap_or(c)
    }
}

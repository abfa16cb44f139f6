//! Memoizing parse cache.
//!
//! [`ParseCache`] maps expression strings to their parsed trees. Only
//! successful parses are stored. The backing store is a bounded
//! least-recently-used map; once full, inserting evicts the entry that was
//! touched longest ago.
//!
//! A process-wide instance is available through [`ParseCache::global`], but
//! nothing requires it: callers and tests can build their own caches.

use std::borrow::Borrow;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

use indexmap::IndexMap;
use tracing::{debug, trace};

use super::ast::Node;
use super::lexer::Lexer;
use super::parser::{ParseOptions, Parser};
use super::token::Token;
use crate::error::XPathError;

/// Capacity of the global cache.
pub const DEFAULT_CACHE_CAPACITY: usize = 1024;

/// A parse result as stored in the cache. `None` is the empty expression.
pub type CachedTree = Option<Arc<Node>>;

static GLOBAL: OnceLock<ParseCache> = OnceLock::new();

/// A bounded map with least-recently-used eviction.
///
/// Entries are kept in recency order: the front is the least recently used,
/// the back the most recently used.
///
/// Reordering on a hit and evicting from the front both shift the entries
/// behind the touched slot, so each costs O(capacity). That is cheap at the
/// sizes a parse cache runs at ([`DEFAULT_CACHE_CAPACITY`] and below); the
/// type is not meant for very large capacities.
#[derive(Debug, Clone)]
pub struct LruCache<K, V> {
    entries: IndexMap<K, V>,
    capacity: usize,
}

impl<K: Hash + Eq, V> LruCache<K, V> {
    /// Creates an empty cache holding at most `capacity` entries.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: IndexMap::with_capacity(capacity.min(DEFAULT_CACHE_CAPACITY)),
            capacity,
        }
    }

    /// Looks up `key`, marking it most recently used.
    pub fn get<Q>(&mut self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let index = self.entries.get_index_of(key)?;
        let last = self.entries.len() - 1;
        self.entries.move_index(index, last);
        self.entries.get_index(last).map(|(_, value)| value)
    }

    /// Inserts or replaces `key`, marking it most recently used.
    ///
    /// Returns the evicted entry, if the insert pushed one out.
    pub fn insert(&mut self, key: K, value: V) -> Option<(K, V)> {
        if self.capacity == 0 {
            return None;
        }

        if let Some(index) = self.entries.get_index_of(&key) {
            let last = self.entries.len() - 1;
            self.entries.move_index(index, last);
            if let Some((_, slot)) = self.entries.get_index_mut(last) {
                *slot = value;
            }
            return None;
        }

        let evicted = if self.entries.len() >= self.capacity {
            self.entries.shift_remove_index(0)
        } else {
            None
        };
        self.entries.insert(key, value);
        evicted
    }

    /// Returns `true` if `key` is present, without touching its recency.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.contains_key(key)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the cache holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of entries.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Removes every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Thread-safe memoizing front end to the parser.
///
/// The lock is never held while parsing, so two threads may parse the same
/// uncached string concurrently; the last one to finish wins.
///
/// # Examples
///
/// ```
/// use xpathoxide::xpath::cache::ParseCache;
///
/// let cache = ParseCache::new(16);
/// let first = cache.get_or_parse("a/b").unwrap();
/// let second = cache.get_or_parse("a/b").unwrap();
/// assert_eq!(first, second);
/// assert_eq!(cache.len(), 1);
/// ```
#[derive(Debug)]
pub struct ParseCache {
    entries: Mutex<LruCache<String, CachedTree>>,
    options: ParseOptions,
}

impl ParseCache {
    /// Creates a cache with default parse options.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self::with_options(capacity, ParseOptions::default())
    }

    /// Creates a cache whose misses are parsed with `options`.
    #[must_use]
    pub fn with_options(capacity: usize, options: ParseOptions) -> Self {
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            options,
        }
    }

    /// The process-wide cache, created on first use.
    pub fn global() -> &'static ParseCache {
        GLOBAL.get_or_init(|| ParseCache::new(DEFAULT_CACHE_CAPACITY))
    }

    /// Returns the cached tree for `input`, parsing and storing it on a miss.
    ///
    /// # Errors
    ///
    /// Returns the parse error on a miss that fails to parse. Failures are
    /// not cached.
    pub fn get_or_parse(&self, input: &str) -> Result<CachedTree, XPathError> {
        self.get_or_parse_with(input, Lexer::new)
    }

    /// Like [`ParseCache::get_or_parse`], but tokenizes misses with `lex`.
    ///
    /// `lex` is only called on a cache miss.
    ///
    /// # Errors
    ///
    /// Returns the parse error on a miss that fails to parse.
    pub fn get_or_parse_with<'a, F, T>(&self, input: &'a str, lex: F) -> Result<CachedTree, XPathError>
    where
        F: FnOnce(&'a str) -> T,
        T: IntoIterator<Item = Result<Token, XPathError>>,
    {
        if let Some(tree) = self.lock().get(input) {
            trace!(expression = input, "xpath cache hit");
            return Ok(tree.clone());
        }

        let parsed = Parser::with_options(lex(input), self.options.clone())
            .parse()?
            .map(Arc::new);
        debug!(expression = input, empty = parsed.is_none(), "xpath cache miss");

        if let Some((evicted, _)) = self.lock().insert(input.to_string(), parsed.clone()) {
            trace!(expression = %evicted, "xpath cache eviction");
        }
        Ok(parsed)
    }

    /// Returns `true` if `input` has a cached parse.
    pub fn contains(&self, input: &str) -> bool {
        self.lock().contains_key(input)
    }

    /// Number of cached expressions.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns `true` if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Drops every cached expression.
    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<String, CachedTree>> {
        // The map is always left consistent, so a poisoned lock is still usable.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_lru_evicts_least_recently_used() {
        let mut cache = LruCache::new(2);
        assert_eq!(cache.insert("a", 1), None);
        assert_eq!(cache.insert("b", 2), None);
        assert_eq!(cache.get("a"), Some(&1));
        assert_eq!(cache.insert("c", 3), Some(("b", 2)));
        assert!(cache.contains_key("a"));
        assert!(cache.contains_key("c"));
        assert!(!cache.contains_key("b"));
    }

    #[test]
    fn test_lru_replace_refreshes_recency() {
        let mut cache = LruCache::new(2);
        cache.insert("a", 1);
        cache.insert("b", 2);
        assert_eq!(cache.insert("a", 10), None);
        assert_eq!(cache.insert("c", 3), Some(("b", 2)));
        assert_eq!(cache.get("a"), Some(&10));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_lru_churn_at_default_capacity() {
        let mut cache = LruCache::new(DEFAULT_CACHE_CAPACITY);
        for i in 0..DEFAULT_CACHE_CAPACITY {
            cache.insert(i, i);
        }
        // Touch the oldest half so the newer half becomes the eviction front.
        for i in 0..DEFAULT_CACHE_CAPACITY / 2 {
            assert_eq!(cache.get(&i), Some(&i));
        }
        let evicted = DEFAULT_CACHE_CAPACITY / 2;
        assert_eq!(
            cache.insert(DEFAULT_CACHE_CAPACITY, 0),
            Some((evicted, evicted))
        );
        assert!(cache.contains_key(&0));
        assert_eq!(cache.len(), DEFAULT_CACHE_CAPACITY);
    }

    #[test]
    fn test_lru_zero_capacity_stores_nothing() {
        let mut cache = LruCache::new(0);
        assert_eq!(cache.insert("a", 1), None);
        assert!(cache.is_empty());
        assert_eq!(cache.capacity(), 0);
    }

    #[test]
    fn test_second_lookup_does_not_lex() {
        let cache = ParseCache::new(8);
        let lexed = Cell::new(0);
        let counting = |input: &'static str| {
            lexed.set(lexed.get() + 1);
            Lexer::new(input)
        };

        let first = cache.get_or_parse_with("a/b[1]", counting).unwrap();
        let second = cache.get_or_parse_with("a/b[1]", counting).unwrap();

        assert_eq!(lexed.get(), 1);
        assert_eq!(first, second);
        assert!(Arc::ptr_eq(first.as_ref().unwrap(), second.as_ref().unwrap()));
    }

    #[test]
    fn test_failures_are_not_cached() {
        let cache = ParseCache::new(8);
        assert!(cache.get_or_parse("1 +").is_err());
        assert!(!cache.contains("1 +"));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_empty_expression_is_cached() {
        let cache = ParseCache::new(8);
        assert_eq!(cache.get_or_parse("").unwrap(), None);
        assert!(cache.contains(""));
    }

    #[test]
    fn test_cache_uses_its_options() {
        let cache = ParseCache::with_options(8, ParseOptions::default().max_depth(1));
        assert!(matches!(
            cache.get_or_parse("(1)"),
            Err(XPathError::TooDeep { limit: 1, .. })
        ));
        assert!(cache.get_or_parse("1").is_ok());
    }

    #[test]
    fn test_capacity_bounds_cache() {
        let cache = ParseCache::new(2);
        for input in ["a", "b", "c"] {
            cache.get_or_parse(input).unwrap();
        }
        assert_eq!(cache.len(), 2);
        assert!(!cache.contains("a"));
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_global_is_shared() {
        let first = ParseCache::global();
        let second = ParseCache::global();
        assert!(std::ptr::eq(first, second));
    }

    #[test]
    fn test_cache_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ParseCache>();
    }
}

//! Memoization of compiled patterns and parsed attributes.

use std::collections::HashMap;
use std::sync::{Arc, LazyLock, PoisonError, RwLock};

use crate::{Attrs, ShortcodeConfig, ShortcodeError, TagPattern};

static GLOBAL: LazyLock<Arc<ShortcodeCache>> = LazyLock::new(|| Arc::new(ShortcodeCache::new()));

/// Cache of compiled tag patterns and parsed attribute lists.
///
/// Entries are written once per key and never evicted: the first compile for
/// a tag wins and later requests return the same [`Arc`]. Tag cardinality is
/// expected to be small, so growth is bounded by the set of tags in use.
///
/// Stored values are immutable, so a lock poisoned by a panicking writer is
/// recovered rather than propagated.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use rw_shortcode::{ShortcodeCache, ShortcodeConfig};
///
/// let cache = ShortcodeCache::new();
/// let config = ShortcodeConfig::default();
/// let a = cache.pattern("gallery", &config).unwrap();
/// let b = cache.pattern("gallery", &config).unwrap();
/// assert!(Arc::ptr_eq(&a, &b));
/// ```
#[derive(Debug, Default)]
pub struct ShortcodeCache {
    patterns: RwLock<HashMap<String, Arc<TagPattern>>>,
    attrs: RwLock<HashMap<String, Attrs>>,
}

impl ShortcodeCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide shared cache.
    #[must_use]
    pub fn global() -> Arc<Self> {
        Arc::clone(&GLOBAL)
    }

    /// Get the compiled pattern for `tag`, compiling it on first use.
    ///
    /// # Errors
    ///
    /// Propagates [`TagPattern::compile`] errors. Failed compiles are not cached.
    pub fn pattern(
        &self,
        tag: &str,
        config: &ShortcodeConfig,
    ) -> Result<Arc<TagPattern>, ShortcodeError> {
        if let Some(pattern) = self
            .patterns
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(tag)
        {
            return Ok(Arc::clone(pattern));
        }

        let compiled = Arc::new(TagPattern::compile(tag, config)?);
        let mut patterns = self
            .patterns
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        Ok(Arc::clone(
            patterns.entry(tag.to_owned()).or_insert(compiled),
        ))
    }

    /// Parse an attribute list, reusing the result for identical text.
    pub fn attrs(&self, text: &str) -> Attrs {
        if let Some(attrs) = self
            .attrs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(text)
        {
            return attrs.clone();
        }

        let parsed = Attrs::parse(text);
        self.attrs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(text.to_owned())
            .or_insert(parsed)
            .clone()
    }

    /// Number of compiled patterns held.
    #[must_use]
    pub fn pattern_count(&self) -> usize {
        self.patterns
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether `tag` has a compiled pattern.
    #[must_use]
    pub fn contains_pattern(&self, tag: &str) -> bool {
        self.patterns
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(tag)
    }
}

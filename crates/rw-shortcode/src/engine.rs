//! Engine facade tying the cache, configuration and scanner together.

use std::future::Future;
use std::sync::Arc;

use crate::error::BoxError;
use crate::scanner::{Matches, Scan};
use crate::{
    Attrs, Replacement, Shortcode, ShortcodeCache, ShortcodeConfig, ShortcodeError, TagMatch,
    TagPattern,
};

/// Shortcode matcher and substitution engine.
///
/// Holds a shared [`ShortcodeCache`] and a [`ShortcodeConfig`]. Engines are
/// cheap to create; [`ShortcodeEngine::new`] uses the process-wide cache.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use rw_shortcode::{ShortcodeCache, ShortcodeEngine, ShortcodeType};
///
/// let engine = ShortcodeEngine::new().with_cache(Arc::new(ShortcodeCache::new()));
/// let m = engine.next("img", r#"see [img src="a.png" /]"#, 0).unwrap().unwrap();
/// assert_eq!(m.offset, 4);
/// assert_eq!(m.shortcode.kind(), ShortcodeType::SelfClosing);
/// assert_eq!(m.shortcode.get("src"), Some("a.png"));
/// ```
#[derive(Debug, Clone)]
pub struct ShortcodeEngine {
    cache: Arc<ShortcodeCache>,
    config: ShortcodeConfig,
}

impl Default for ShortcodeEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ShortcodeEngine {
    /// Create an engine with default configuration and the global cache.
    #[must_use]
    pub fn new() -> Self {
        Self {
            cache: ShortcodeCache::global(),
            config: ShortcodeConfig::default(),
        }
    }

    /// Use a dedicated cache instead of the global one.
    #[must_use]
    pub fn with_cache(mut self, cache: Arc<ShortcodeCache>) -> Self {
        self.cache = cache;
        self
    }

    /// Set the configuration.
    #[must_use]
    pub fn with_config(mut self, config: ShortcodeConfig) -> Self {
        self.config = config;
        self
    }

    /// Cache used by this engine.
    #[must_use]
    pub fn cache(&self) -> &Arc<ShortcodeCache> {
        &self.cache
    }

    /// Configuration used by this engine.
    #[must_use]
    pub fn config(&self) -> &ShortcodeConfig {
        &self.config
    }

    /// Get the (cached) compiled pattern for `tag`.
    ///
    /// # Errors
    ///
    /// Returns [`ShortcodeError::InvalidTagName`] for empty or malformed tags.
    pub fn compile(&self, tag: &str) -> Result<Arc<TagPattern>, ShortcodeError> {
        self.cache.pattern(tag, &self.config)
    }

    /// Parse an attribute list, memoized when enabled in the configuration.
    pub fn parse_attrs(&self, text: &str) -> Attrs {
        if self.config.memoize_attrs {
            self.cache.attrs(text)
        } else {
            Attrs::parse(text)
        }
    }

    /// Find the next non-escaped occurrence of `tag` at or after byte `from`.
    ///
    /// Fully escaped occurrences (`[[tag]]`) are skipped. A lone leading `[`
    /// or trailing `]` is not part of the reported match.
    ///
    /// # Errors
    ///
    /// Returns [`ShortcodeError::InvalidTagName`] for malformed tags and
    /// [`ShortcodeError::Scan`] if matching exceeds the backtrack limit.
    pub fn next(
        &self,
        tag: &str,
        text: &str,
        from: usize,
    ) -> Result<Option<TagMatch>, ShortcodeError> {
        self.find_from(tag, text, from)?.next().transpose()
    }

    /// Iterate over all non-escaped occurrences of `tag` in `text`.
    ///
    /// # Errors
    ///
    /// Returns [`ShortcodeError::InvalidTagName`] for malformed tags; scan
    /// errors surface through the iterator.
    pub fn find_all<'e, 't>(
        &'e self,
        tag: &str,
        text: &'t str,
    ) -> Result<Matches<'e, 't>, ShortcodeError> {
        self.find_from(tag, text, 0)
    }

    /// Parse text consisting of exactly one non-escaped shortcode.
    ///
    /// The tag name is read from the text itself; the pattern for it is
    /// compiled through this engine's cache.
    ///
    /// # Errors
    ///
    /// Returns [`ShortcodeError::NotAShortcode`] unless one occurrence spans
    /// the whole text, and [`ShortcodeError::Scan`] if matching exceeds the
    /// backtrack limit.
    ///
    /// # Example
    ///
    /// ```
    /// use rw_shortcode::{ShortcodeEngine, ShortcodeType};
    ///
    /// let code = ShortcodeEngine::new().parse_one("[b]bold[/b]").unwrap();
    /// assert_eq!(code.kind(), ShortcodeType::Closed);
    /// assert_eq!(code.content(), Some("bold"));
    /// ```
    pub fn parse_one(&self, text: &str) -> Result<Shortcode, ShortcodeError> {
        let not_a_shortcode = || ShortcodeError::NotAShortcode(text.to_owned());

        let rest = text.strip_prefix('[').ok_or_else(not_a_shortcode)?;
        let name_len = rest
            .find(|c: char| !(c.is_alphanumeric() || c == '_' || c == '-'))
            .unwrap_or(rest.len());
        if name_len == 0 {
            return Err(not_a_shortcode());
        }

        match self.next(&rest[..name_len], text, 0)? {
            Some(m) if m.offset == 0 && m.text.len() == text.len() => Ok(m.shortcode),
            _ => Err(not_a_shortcode()),
        }
    }

    fn find_from<'e, 't>(
        &'e self,
        tag: &str,
        text: &'t str,
        from: usize,
    ) -> Result<Matches<'e, 't>, ShortcodeError> {
        Ok(Matches::new(self.scan(tag, text, from)?))
    }

    pub(crate) fn scan<'e, 't>(
        &'e self,
        tag: &str,
        text: &'t str,
        from: usize,
    ) -> Result<Scan<'e, 't>, ShortcodeError> {
        let pattern = self.compile(tag)?;
        Ok(Scan::new(self, pattern, text, from))
    }
}

/// Compile (or fetch from the global cache) the pattern for `tag`.
///
/// # Errors
///
/// Returns [`ShortcodeError::InvalidTagName`] for empty or malformed tags.
pub fn compile_pattern(tag: &str) -> Result<Arc<TagPattern>, ShortcodeError> {
    ShortcodeEngine::new().compile(tag)
}

/// Find the next occurrence of `tag` using the global cache.
///
/// # Errors
///
/// See [`ShortcodeEngine::next`].
///
/// # Example
///
/// ```
/// assert!(rw_shortcode::next("x", "[[x]]", 0).unwrap().is_none());
/// let m = rw_shortcode::next("x", "[[x]", 0).unwrap().unwrap();
/// assert_eq!((m.offset, m.text.as_str()), (1, "[x]"));
/// ```
pub fn next(tag: &str, text: &str, from: usize) -> Result<Option<TagMatch>, ShortcodeError> {
    ShortcodeEngine::new().next(tag, text, from)
}

/// Replace all occurrences of `tag` using the global cache.
///
/// # Errors
///
/// See [`ShortcodeEngine::replace_all`].
pub async fn replace_all<F, Fut, E>(
    tag: &str,
    text: &str,
    replacer: F,
) -> Result<String, ShortcodeError>
where
    F: FnMut(Shortcode) -> Fut,
    Fut: Future<Output = Result<Replacement, E>>,
    E: Into<BoxError>,
{
    ShortcodeEngine::new().replace_all(tag, text, replacer).await
}

/// Parse an attribute list (memoized in the global cache).
pub fn parse_attrs(text: &str) -> Attrs {
    ShortcodeEngine::new().parse_attrs(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ShortcodeType;
    use std::convert::Infallible;

    fn isolated() -> ShortcodeEngine {
        ShortcodeEngine::new().with_cache(Arc::new(ShortcodeCache::new()))
    }

    #[test]
    fn test_compile_is_memoized_per_engine_cache() {
        let engine = isolated();
        let a = engine.compile("x").unwrap();
        let b = engine.compile("x").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(engine.cache().pattern_count(), 1);
    }

    #[test]
    fn test_compile_rejects_invalid_names() {
        let engine = isolated();
        assert!(matches!(
            engine.compile(""),
            Err(ShortcodeError::InvalidTagName(_))
        ));
        assert!(matches!(
            engine.next("a(b", "[a(b]", 0),
            Err(ShortcodeError::InvalidTagName(_))
        ));
    }

    #[test]
    fn test_parse_attrs_without_memoization() {
        let engine = isolated().with_config(ShortcodeConfig::new().with_attr_memoization(false));
        let attrs = engine.parse_attrs("a=1");
        assert_eq!(attrs.named_value("a"), Some("1"));
    }

    #[test]
    fn test_two_scans_of_same_tag_are_independent() {
        let engine = isolated();
        let text = "[t 1] [t 2]";
        let mut first = engine.find_all("t", text).unwrap();
        let mut second = engine.find_all("t", text).unwrap();

        let a = first.next().unwrap().unwrap();
        let b = second.next().unwrap().unwrap();
        assert_eq!(a, b);
        assert_eq!(first.next().unwrap().unwrap().offset, 6);
        assert!(first.next().is_none());
        assert_eq!(second.next().unwrap().unwrap().offset, 6);
    }

    #[test]
    fn test_backtrack_limit_surfaces_scan_error() {
        let engine = isolated().with_config(ShortcodeConfig::new().with_backtrack_limit(1));
        let text = format!("[q]{}", "[x".repeat(64));
        let result = engine.next("q", &text, 0);
        assert!(matches!(result, Err(ShortcodeError::Scan { .. })));
    }

    #[test]
    fn test_parse_one_uses_engine_cache() {
        let engine = isolated();
        let code = engine.parse_one(r#"[note kind="warn"]x[/note]"#).unwrap();
        assert_eq!(code.get("kind"), Some("warn"));
        assert!(engine.cache().contains_pattern("note"));
        assert_eq!(engine.cache().pattern_count(), 1);
    }

    #[test]
    fn test_parse_one_rejects_partial_text() {
        let engine = isolated();
        assert!(matches!(
            engine.parse_one("[x] tail"),
            Err(ShortcodeError::NotAShortcode(text)) if text == "[x] tail"
        ));
        assert!(matches!(
            engine.parse_one("[ x]"),
            Err(ShortcodeError::NotAShortcode(_))
        ));
        assert_eq!(engine.cache().pattern_count(), 1);
    }

    #[test]
    fn test_megabyte_unclosed_tag_is_single() {
        let engine = isolated();
        let text = format!("[b]{}", "a".repeat(1_000_000));
        let m = engine.next("b", &text, 0).unwrap().unwrap();
        assert_eq!(m.offset, 0);
        assert_eq!(m.text, "[b]");
        assert_eq!(m.shortcode.kind(), ShortcodeType::Single);
    }

    #[test]
    fn test_free_functions() {
        assert!(compile_pattern("gallery").is_ok());
        assert_eq!(parse_attrs("a b").numeric(), ["a", "b"]);
        let m = next("b", "x [b]y[/b]", 0).unwrap().unwrap();
        assert_eq!(m.offset, 2);

        let output = tokio_test::block_on(replace_all("b", "x [b]y[/b]", |code| async move {
            Ok::<_, Infallible>(Replacement::Text(format!(
                "<b>{}</b>",
                code.content().unwrap_or_default()
            )))
        }))
        .unwrap();
        assert_eq!(output, "x <b>y</b>");
    }
}

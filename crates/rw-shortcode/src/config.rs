//! Engine configuration.

/// Default backtracking budget for a single match attempt.
const DEFAULT_BACKTRACK_LIMIT: usize = 1_000_000;

/// Configuration for [`ShortcodeEngine`](crate::ShortcodeEngine).
///
/// Patterns are cached by tag name only, so when several engines share a
/// [`ShortcodeCache`](crate::ShortcodeCache) the configuration of whichever
/// engine compiles a tag first is the one baked into its pattern.
///
/// # Example
///
/// ```
/// use rw_shortcode::ShortcodeConfig;
///
/// let config = ShortcodeConfig::new()
///     .with_backtrack_limit(10_000)
///     .with_attr_memoization(false);
/// assert_eq!(config.backtrack_limit, 10_000);
/// assert!(!config.memoize_attrs);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize), serde(default))]
pub struct ShortcodeConfig {
    /// Maximum backtracking steps per match attempt before scanning fails.
    ///
    /// Default: 1 000 000
    pub backtrack_limit: usize,
    /// Route attribute parsing through the cache, keyed by raw attribute text.
    ///
    /// Default: `true`
    pub memoize_attrs: bool,
}

impl Default for ShortcodeConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ShortcodeConfig {
    /// Create a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            backtrack_limit: DEFAULT_BACKTRACK_LIMIT,
            memoize_attrs: true,
        }
    }

    /// Set the backtracking budget.
    #[must_use]
    pub fn with_backtrack_limit(mut self, limit: usize) -> Self {
        self.backtrack_limit = limit;
        self
    }

    /// Enable or disable attribute memoization.
    #[must_use]
    pub fn with_attr_memoization(mut self, enabled: bool) -> Self {
        self.memoize_attrs = enabled;
        self
    }
}

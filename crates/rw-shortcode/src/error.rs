//! Error types for shortcode matching and substitution.

/// Boxed error produced by a caller-supplied replacer.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Error from shortcode operations.
///
/// Missing matches and malformed attribute text are not errors: scanning
/// returns `None` and attribute parsing degrades to best-effort values.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ShortcodeError {
    /// Tag name is empty or contains characters outside `[A-Za-z0-9_-]`.
    #[error("invalid shortcode tag name: {0:?}")]
    InvalidTagName(String),

    /// Generated pattern failed to compile.
    #[error("failed to compile pattern for tag `{tag}`")]
    Pattern {
        /// Tag the pattern was built for.
        tag: String,
        /// Underlying regex error.
        #[source]
        source: fancy_regex::Error,
    },

    /// Matching aborted at runtime (e.g. backtrack limit exceeded).
    #[error("failed to scan text for tag `{tag}`")]
    Scan {
        /// Tag being scanned for.
        tag: String,
        /// Underlying regex error.
        #[source]
        source: fancy_regex::Error,
    },

    /// A replacer reported failure; the whole pass was aborted.
    #[error("replacement for tag `{tag}` at byte {offset} failed")]
    Replacer {
        /// Tag being replaced.
        tag: String,
        /// Byte offset of the occurrence whose replacement failed.
        offset: usize,
        /// Error returned by the replacer.
        #[source]
        source: BoxError,
    },

    /// Text is not exactly one shortcode.
    #[error("not a shortcode: {0:?}")]
    NotAShortcode(String),
}

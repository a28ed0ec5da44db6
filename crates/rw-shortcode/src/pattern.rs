//! Per-tag pattern compilation.
//!
//! A compiled pattern recognizes one occurrence of a tag in seven capture
//! groups:
//!
//! ```text
//! [ ( [? ) ( tag ) (?![\w-]) ( attrs ) (?: ( / ) ] | ] (?: ( content ) ( [/tag] ) )? ) ( ]? )
//!     1        2                  3            4             5          6             7
//! ```
//!
//! Groups 1 and 7 are escape brackets. Attribute text may contain `/` as long
//! as it is not followed by `]`. Content runs up to the first `[/tag]`; other
//! `[` characters, including nested opens of the same tag, are allowed.

use fancy_regex::{Captures, Regex, RegexBuilder};

use crate::{ShortcodeConfig, ShortcodeError};

/// Capture group indices of a compiled tag pattern.
pub(crate) mod group {
    pub(crate) const ESCAPE_OPEN: usize = 1;
    pub(crate) const TAG: usize = 2;
    pub(crate) const ATTRS: usize = 3;
    pub(crate) const SELF_CLOSING: usize = 4;
    pub(crate) const CONTENT: usize = 5;
    pub(crate) const CLOSING_TAG: usize = 6;
    pub(crate) const ESCAPE_CLOSE: usize = 7;
}

/// Compiled matcher for a single tag name.
///
/// Immutable once built; scanning state lives in the caller, so one pattern
/// can serve any number of concurrent scans.
#[derive(Debug)]
pub struct TagPattern {
    tag: String,
    regex: Regex,
}

impl TagPattern {
    /// Compile the pattern for `tag`.
    ///
    /// # Errors
    ///
    /// Returns [`ShortcodeError::InvalidTagName`] if `tag` is empty or contains
    /// characters other than alphanumerics, `_` and `-`, and
    /// [`ShortcodeError::Pattern`] if the regex fails to build.
    pub fn compile(tag: &str, config: &ShortcodeConfig) -> Result<Self, ShortcodeError> {
        if !is_valid_tag_name(tag) {
            return Err(ShortcodeError::InvalidTagName(tag.to_owned()));
        }

        let source = build_pattern_source(tag);
        let regex = RegexBuilder::new(&source)
            .backtrack_limit(config.backtrack_limit)
            .build()
            .map_err(|source| ShortcodeError::Pattern {
                tag: tag.to_owned(),
                source,
            })?;

        tracing::debug!(tag, "Compiled shortcode pattern");

        Ok(Self {
            tag: tag.to_owned(),
            regex,
        })
    }

    /// Tag name this pattern matches.
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Regex source of the compiled pattern.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    /// Find the first occurrence starting at byte `pos`.
    pub(crate) fn captures_from<'t>(
        &self,
        text: &'t str,
        pos: usize,
    ) -> Result<Option<Captures<'t>>, ShortcodeError> {
        if pos > text.len() {
            return Ok(None);
        }

        self.regex
            .captures_from_pos(text, pos)
            .map_err(|source| ShortcodeError::Scan {
                tag: self.tag.clone(),
                source,
            })
    }
}

/// Build the regex source recognizing occurrences of `tag`.
///
/// # Example
///
/// ```
/// use rw_shortcode::build_pattern_source;
///
/// let source = build_pattern_source("b");
/// assert!(source.contains(r"(\[/b\])"));
/// ```
#[must_use]
pub fn build_pattern_source(tag: &str) -> String {
    let tag = fancy_regex::escape(tag);
    format!(
        concat!(
            r"\[(\[?)({tag})(?![\w-])",
            r"((?>[^\]/]*)(?:/(?!\])(?>[^\]/]*))*?)",
            r"(?:(/)\]|\](?:((?>[^\[]*)(?:\[(?!/{tag}\])(?>[^\[]*))*)(\[/{tag}\]))?)",
            r"(\]?)",
        ),
        tag = tag
    )
}

/// Check if a name can be used as a shortcode tag.
///
/// Valid names are non-empty and contain only alphanumerics, `_` and `-`.
pub(crate) fn is_valid_tag_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '-')
}

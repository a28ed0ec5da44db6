//! Occurrence scanning.
//!
//! Walks a text buffer with a compiled [`TagPattern`], resolving escape
//! brackets and building a [`Shortcode`] per occurrence.

use std::sync::Arc;

use fancy_regex::Captures;

use crate::pattern::group;
use crate::{Shortcode, ShortcodeEngine, ShortcodeError, ShortcodeType, TagPattern};

/// A non-escaped occurrence found in a text buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TagMatch {
    /// Byte offset where the occurrence begins, after stripping a lone
    /// leading `[`.
    pub offset: usize,
    /// Matched text, without a lone leading `[` or trailing `]`.
    pub text: String,
    /// Parsed shortcode.
    pub shortcode: Shortcode,
}

impl TagMatch {
    /// Byte offset just past the matched text.
    #[must_use]
    pub fn end(&self) -> usize {
        self.offset + self.text.len()
    }
}

/// One regex match, either escaped (`[[...]]`) or a real occurrence.
#[derive(Debug)]
pub(crate) enum Occurrence {
    /// Fully escaped span `start..end`, including both extra brackets.
    Escaped { start: usize, end: usize },
    /// Real occurrence.
    Tag(TagMatch),
}

/// Sequence of occurrences, each search starting where the previous full
/// match ended.
pub(crate) struct Scan<'e, 't> {
    engine: &'e ShortcodeEngine,
    pattern: Arc<TagPattern>,
    text: &'t str,
    pos: usize,
    done: bool,
}

impl<'e, 't> Scan<'e, 't> {
    pub(crate) fn new(
        engine: &'e ShortcodeEngine,
        pattern: Arc<TagPattern>,
        text: &'t str,
        from: usize,
    ) -> Self {
        Self {
            engine,
            pattern,
            text,
            pos: ceil_char_boundary(text, from),
            done: false,
        }
    }

    fn occurrence(&self, caps: &Captures<'_>) -> Option<Occurrence> {
        let whole = caps.get(0)?;
        let escape_open = is_present(caps, group::ESCAPE_OPEN);
        let escape_close = is_present(caps, group::ESCAPE_CLOSE);

        if escape_open && escape_close {
            return Some(Occurrence::Escaped {
                start: whole.start(),
                end: whole.end(),
            });
        }

        let mut offset = whole.start();
        let mut text = whole.as_str();
        if escape_open {
            offset += 1;
            text = &text[1..];
        }
        if escape_close {
            text = &text[..text.len() - 1];
        }

        Some(Occurrence::Tag(TagMatch {
            offset,
            text: text.to_owned(),
            shortcode: self.shortcode(caps),
        }))
    }

    fn shortcode(&self, caps: &Captures<'_>) -> Shortcode {
        let text_of = |i: usize| caps.get(i).map(|m| m.as_str());

        let kind = if text_of(group::SELF_CLOSING).is_some() {
            ShortcodeType::SelfClosing
        } else if text_of(group::CLOSING_TAG).is_some() {
            ShortcodeType::Closed
        } else {
            ShortcodeType::Single
        };

        let attrs = self.engine.parse_attrs(text_of(group::ATTRS).unwrap_or_default());
        let tag = text_of(group::TAG).unwrap_or_else(|| self.pattern.tag());
        let content = text_of(group::CONTENT).map(str::to_owned);

        Shortcode::from_parts(tag, attrs, kind, content)
    }
}

impl Iterator for Scan<'_, '_> {
    type Item = Result<Occurrence, ShortcodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let caps = match self.pattern.captures_from(self.text, self.pos) {
            Ok(Some(caps)) => caps,
            Ok(None) => {
                self.done = true;
                return None;
            }
            Err(e) => {
                self.done = true;
                return Some(Err(e));
            }
        };

        let occurrence = self.occurrence(&caps)?;
        // Matches always consume at least `[` and the tag name
        self.pos = caps.get(0).map_or(self.text.len(), |m| m.end());
        Some(Ok(occurrence))
    }
}

/// Iterator over the non-escaped occurrences of a tag.
///
/// Created by [`ShortcodeEngine::find_all`]. Escaped occurrences are skipped.
/// Yields an error at most once, after which iteration ends.
pub struct Matches<'e, 't> {
    scan: Scan<'e, 't>,
}

impl<'e, 't> Matches<'e, 't> {
    pub(crate) fn new(scan: Scan<'e, 't>) -> Self {
        Self { scan }
    }
}

impl Iterator for Matches<'_, '_> {
    type Item = Result<TagMatch, ShortcodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.scan.next()? {
                Ok(Occurrence::Escaped { start, .. }) => {
                    tracing::trace!(
                        tag = self.scan.pattern.tag(),
                        offset = start,
                        "Skipping escaped shortcode"
                    );
                }
                Ok(Occurrence::Tag(m)) => return Some(Ok(m)),
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

/// Whether an escape group matched a bracket (rather than the empty string).
fn is_present(caps: &Captures<'_>, index: usize) -> bool {
    caps.get(index).is_some_and(|m| !m.as_str().is_empty())
}

/// Smallest char boundary at or after `pos`, clamped to `text.len() + 1` so
/// out-of-range offsets stay out of range.
fn ceil_char_boundary(text: &str, pos: usize) -> usize {
    if pos > text.len() {
        return pos;
    }
    (pos..=text.len())
        .find(|&i| text.is_char_boundary(i))
        .unwrap_or(text.len())
}

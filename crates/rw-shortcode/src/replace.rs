//! Ordered shortcode substitution.
//!
//! All occurrences are located up front, then replaced strictly left to
//! right. With an async replacer each future is awaited before the next
//! occurrence is handed out, so replacer side effects happen in source order
//! and the output is assembled without re-sorting.

use std::future::Future;

use crate::error::BoxError;
use crate::scanner::Occurrence;
use crate::{Shortcode, ShortcodeEngine, ShortcodeError};

/// Result of a replacer for one occurrence.
///
/// # Example
///
/// ```
/// use rw_shortcode::Replacement;
///
/// let output = Replacement::text("<b>hi</b>");
/// assert_eq!(output, Replacement::Text("<b>hi</b>".to_owned()));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Replacement {
    /// Substitute this text for the occurrence.
    Text(String),
    /// Leave the matched text unchanged.
    Keep,
}

impl Replacement {
    /// Create a text replacement.
    #[must_use]
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }
}

impl From<String> for Replacement {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&str> for Replacement {
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}

/// Copies unmatched spans of the source while occurrences are substituted.
struct Splicer<'t> {
    text: &'t str,
    output: String,
    cursor: usize,
}

impl<'t> Splicer<'t> {
    fn new(text: &'t str) -> Self {
        Self {
            text,
            output: String::with_capacity(text.len()),
            cursor: 0,
        }
    }

    /// Copy source text up to `pos`.
    fn copy_to(&mut self, pos: usize) {
        self.output.push_str(&self.text[self.cursor..pos]);
        self.cursor = pos;
    }

    /// Emit `replacement` for the source span ending at `end`.
    fn splice(&mut self, end: usize, replacement: &str) {
        self.output.push_str(replacement);
        self.cursor = end;
    }

    /// Emit an escaped span with one layer of brackets removed.
    fn unescape(&mut self, start: usize, end: usize) {
        self.copy_to(start);
        self.output.push_str(&self.text[start + 1..end - 1]);
        self.cursor = end;
    }

    fn finish(mut self) -> String {
        self.output.push_str(&self.text[self.cursor..]);
        self.output
    }
}

impl ShortcodeEngine {
    /// Replace every occurrence of `tag` in `text` using an async replacer.
    ///
    /// The replacer is called once per non-escaped occurrence, in source
    /// order, and each call's future is awaited before the next call is made.
    /// Fully escaped occurrences (`[[tag]]`) are emitted with one layer of
    /// brackets removed and never reach the replacer. A lone leading `[` or
    /// trailing `]` stays in the output around the replacement.
    ///
    /// # Errors
    ///
    /// Returns [`ShortcodeError::Replacer`] for the first replacer failure, in
    /// which case no output is produced, and propagates pattern and scan errors.
    ///
    /// # Example
    ///
    /// ```
    /// use rw_shortcode::{Replacement, ShortcodeEngine};
    ///
    /// # tokio_test::block_on(async {
    /// let engine = ShortcodeEngine::new();
    /// let output = engine
    ///     .replace_all("shout", "Hello [shout loud]world[/shout]!", |code| async move {
    ///         let content = code.content().unwrap_or_default().to_uppercase();
    ///         Ok::<_, std::convert::Infallible>(Replacement::Text(content))
    ///     })
    ///     .await
    ///     .unwrap();
    /// assert_eq!(output, "Hello WORLD!");
    /// # });
    /// ```
    pub async fn replace_all<F, Fut, E>(
        &self,
        tag: &str,
        text: &str,
        mut replacer: F,
    ) -> Result<String, ShortcodeError>
    where
        F: FnMut(Shortcode) -> Fut,
        Fut: Future<Output = Result<Replacement, E>>,
        E: Into<BoxError>,
    {
        let occurrences = self.occurrences(tag, text)?;
        let mut splicer = Splicer::new(text);

        for occurrence in occurrences {
            match occurrence {
                Occurrence::Escaped { start, end } => splicer.unescape(start, end),
                Occurrence::Tag(m) => {
                    let (offset, end) = (m.offset, m.end());
                    splicer.copy_to(offset);
                    let result = replacer(m.shortcode).await;
                    let replacement = resolve(tag, offset, result)?;
                    splicer.splice(end, replacement.as_deref().unwrap_or(&text[offset..end]));
                }
            }
        }

        Ok(splicer.finish())
    }

    /// Synchronous form of [`replace_all`](Self::replace_all).
    ///
    /// # Errors
    ///
    /// Same as [`replace_all`](Self::replace_all).
    pub fn replace_all_sync<F, E>(
        &self,
        tag: &str,
        text: &str,
        mut replacer: F,
    ) -> Result<String, ShortcodeError>
    where
        F: FnMut(Shortcode) -> Result<Replacement, E>,
        E: Into<BoxError>,
    {
        let occurrences = self.occurrences(tag, text)?;
        let mut splicer = Splicer::new(text);

        for occurrence in occurrences {
            match occurrence {
                Occurrence::Escaped { start, end } => splicer.unescape(start, end),
                Occurrence::Tag(m) => {
                    let (offset, end) = (m.offset, m.end());
                    splicer.copy_to(offset);
                    let replacement = resolve(tag, offset, replacer(m.shortcode))?;
                    splicer.splice(end, replacement.as_deref().unwrap_or(&text[offset..end]));
                }
            }
        }

        Ok(splicer.finish())
    }

    /// Scan all of `text`, escaped occurrences included.
    fn occurrences(&self, tag: &str, text: &str) -> Result<Vec<Occurrence>, ShortcodeError> {
        let occurrences = self.scan(tag, text, 0)?.collect::<Result<Vec<_>, _>>()?;
        tracing::debug!(tag, occurrences = occurrences.len(), "Replacing shortcodes");
        Ok(occurrences)
    }
}

/// Turn a replacer result into replacement text (`None` keeps the match).
fn resolve<E: Into<BoxError>>(
    tag: &str,
    offset: usize,
    result: Result<Replacement, E>,
) -> Result<Option<String>, ShortcodeError> {
    match result {
        Ok(Replacement::Text(text)) => Ok(Some(text)),
        Ok(Replacement::Keep) => Ok(None),
        Err(e) => {
            let source = e.into();
            tracing::warn!(tag, offset, error = %source, "Shortcode replacer failed");
            Err(ShortcodeError::Replacer {
                tag: tag.to_owned(),
                offset,
                source,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::convert::Infallible;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    fn upper_content(code: Shortcode) -> Result<Replacement, Infallible> {
        Ok(Replacement::text(
            code.content().unwrap_or_default().to_uppercase(),
        ))
    }

    #[tokio::test]
    async fn test_end_to_end_shout() {
        let output = ShortcodeEngine::new()
            .replace_all("shout", "Hello [shout loud]world[/shout]!", |code| async move {
                upper_content(code)
            })
            .await
            .unwrap();
        assert_eq!(output, "Hello WORLD!");
    }

    #[tokio::test]
    async fn test_preserves_order_when_completion_is_reversed() {
        let text = "<[n 1]|[n 2]|[n 3]>";
        let started = Arc::new(Mutex::new(Vec::new()));
        let in_flight = Arc::new(AtomicUsize::new(0));
        let max_in_flight = Arc::new(AtomicUsize::new(0));

        let output = ShortcodeEngine::new()
            .replace_all("n", text, |code| {
                let started = Arc::clone(&started);
                let in_flight = Arc::clone(&in_flight);
                let max_in_flight = Arc::clone(&max_in_flight);
                async move {
                    let n: u64 = code.get(0).unwrap_or_default().parse().unwrap_or(0);
                    started.lock().unwrap().push(n);
                    let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    max_in_flight.fetch_max(now, Ordering::SeqCst);
                    // Earlier occurrences take longer to resolve
                    tokio::time::sleep(Duration::from_millis(40 - n * 10)).await;
                    in_flight.fetch_sub(1, Ordering::SeqCst);
                    Ok::<_, Infallible>(Replacement::Text(format!("#{n}")))
                }
            })
            .await
            .unwrap();

        assert_eq!(output, "<#1|#2|#3>");
        assert_eq!(*started.lock().unwrap(), vec![1, 2, 3]);
        assert_eq!(max_in_flight.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_first_failure_aborts_without_output() {
        let calls = Arc::new(AtomicUsize::new(0));
        let result = ShortcodeEngine::new()
            .replace_all("x", "[x a] [x fail] [x c]", |code| {
                let calls = Arc::clone(&calls);
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    if code.get(0) == Some("fail") {
                        Err("replacer exploded")
                    } else {
                        Ok(Replacement::text("ok"))
                    }
                }
            })
            .await;

        let Err(ShortcodeError::Replacer { tag, offset, source }) = result else {
            panic!("expected replacer error");
        };
        assert_eq!(tag, "x");
        assert_eq!(offset, 6);
        assert_eq!(source.to_string(), "replacer exploded");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_escaped_pass_through_unwrapped_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let output = ShortcodeEngine::new()
            .replace_all("x", "a [[x]] b [[[x]]] c [x]", |_| {
                let calls = Arc::clone(&calls);
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, Infallible>(Replacement::text("X"))
                }
            })
            .await
            .unwrap();
        assert_eq!(output, "a [x] b [[x]] c X");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_escaped_closed_occurrence_keeps_content() {
        let calls = Arc::new(AtomicUsize::new(0));
        let output = ShortcodeEngine::new()
            .replace_all("x", "see [[x]c[/x]] here", |_| {
                let calls = Arc::clone(&calls);
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, Infallible>(Replacement::text("X"))
                }
            })
            .await
            .unwrap();
        assert_eq!(output, "see [x]c[/x] here");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_keep_leaves_match_unchanged() {
        let text = "[a]1[/a] [a]2[/a]";
        let output = tokio_test::block_on(ShortcodeEngine::new().replace_all(
            "a",
            text,
            |code| async move {
                if code.content() == Some("1") {
                    Ok::<_, Infallible>(Replacement::Keep)
                } else {
                    Ok(Replacement::text("two"))
                }
            },
        ))
        .unwrap();
        assert_eq!(output, "[a]1[/a] two");
    }

    #[test]
    fn test_lone_brackets_survive_replacement() {
        let output = ShortcodeEngine::new()
            .replace_all_sync("x", "([[x] and [x]])", |_| Ok::<_, Infallible>(Replacement::text("X")))
            .unwrap();
        assert_eq!(output, "([X and X])");
    }

    #[test]
    fn test_sync_replacement_and_unmatched_spans() {
        let output = ShortcodeEngine::new()
            .replace_all_sync("b", "no tags here", upper_content)
            .unwrap();
        assert_eq!(output, "no tags here");

        let output = ShortcodeEngine::new()
            .replace_all_sync("b", "x [b]y[/b] z [bb]w[/bb]", upper_content)
            .unwrap();
        assert_eq!(output, "x Y z [bb]w[/bb]");
    }

    #[test]
    fn test_sync_failure_propagates() {
        let result = ShortcodeEngine::new().replace_all_sync("x", "[x]", |_| {
            Err::<Replacement, _>(std::io::Error::other("nope"))
        });
        assert!(matches!(result, Err(ShortcodeError::Replacer { offset: 0, .. })));
    }

    #[test]
    fn test_invalid_tag_fails_before_replacing() {
        let result = ShortcodeEngine::new().replace_all_sync("", "[x]", upper_content);
        assert!(matches!(result, Err(ShortcodeError::InvalidTagName(_))));
    }

    #[test]
    fn test_replacement_from_impls() {
        assert_eq!(Replacement::from("a"), Replacement::Text("a".to_owned()));
        assert_eq!(
            Replacement::from(String::from("b")),
            Replacement::Text("b".to_owned())
        );
    }
}

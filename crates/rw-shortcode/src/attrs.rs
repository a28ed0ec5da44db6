//! Shortcode attribute parsing.
//!
//! Parses the attribute list of `[tag a="1" b='2' c=3 "four" five]` into
//! named and positional ("numeric") values.

use std::sync::LazyLock;

use fancy_regex::Regex;

/// One attribute token per match, first alternative wins:
///
/// 1. `name="value"` (groups 1, 2)
/// 2. `name='value'` (groups 3, 4)
/// 3. `name=value` (groups 5, 6)
/// 4. `"value"` (group 7)
/// 5. any other non-whitespace run (group 8)
static ATTR_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r#"([\w-]+)\s*=\s*"([^"]*)"(?:\s|$)"#,
        r#"|([\w-]+)\s*=\s*'([^']*)'(?:\s|$)"#,
        r#"|([\w-]+)\s*=\s*([^\s'"]+)(?:\s|$)"#,
        r#"|"([^"]*)"(?:\s|$)"#,
        r"|(\S+)(?:\s|$)",
    ))
    .expect("invalid attribute regex")
});

/// Parsed shortcode attributes.
///
/// Named keys are lower-cased and kept in insertion order; numeric values keep
/// their order of appearance, duplicates included.
///
/// # Example
///
/// ```
/// use rw_shortcode::Attrs;
///
/// let attrs = Attrs::parse(r#"a="1" "two" 3"#);
/// assert_eq!(attrs.named_value("a"), Some("1"));
/// assert_eq!(attrs.numeric(), ["two", "3"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(from = "RawAttrs")
)]
pub struct Attrs {
    named: Vec<(String, String)>,
    numeric: Vec<String>,
}

/// Deserialized form of [`Attrs`], normalized through [`Attrs::set_named`].
#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct RawAttrs {
    #[serde(default)]
    named: Vec<(String, String)>,
    #[serde(default)]
    numeric: Vec<String>,
}

#[cfg(feature = "serde")]
impl From<RawAttrs> for Attrs {
    fn from(raw: RawAttrs) -> Self {
        let mut attrs = Self {
            named: Vec::with_capacity(raw.named.len()),
            numeric: raw.numeric,
        };
        for (key, value) in raw.named {
            attrs.set_named(&key, value);
        }
        attrs
    }
}

impl Attrs {
    /// Create an empty attribute set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a raw attribute list.
    ///
    /// Never fails: text that fits none of the named forms ends up in the
    /// numeric bucket. Non-breaking and zero-width spaces count as whitespace.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let mut attrs = Self::new();
        let text = text.replace(['\u{00a0}', '\u{200b}'], " ");

        for caps in ATTR_PATTERN.captures_iter(&text) {
            let caps = match caps {
                Ok(caps) => caps,
                Err(e) => {
                    tracing::warn!(error = %e, "Attribute scan aborted");
                    break;
                }
            };

            let group = |i: usize| caps.get(i).map(|m| m.as_str());

            if let (Some(key), Some(value)) = (group(1), group(2)) {
                attrs.set_named(key, value);
            } else if let (Some(key), Some(value)) = (group(3), group(4)) {
                attrs.set_named(key, value);
            } else if let (Some(key), Some(value)) = (group(5), group(6)) {
                attrs.set_named(key, value);
            } else if let Some(value) = group(7).or_else(|| group(8)) {
                attrs.numeric.push(value.to_owned());
            }
        }

        attrs
    }

    /// Add a named value (builder form of [`set_named`](Self::set_named)).
    #[must_use]
    pub fn with_named(mut self, key: &str, value: impl Into<String>) -> Self {
        self.set_named(key, value);
        self
    }

    /// Append a numeric value.
    #[must_use]
    pub fn with_numeric(mut self, value: impl Into<String>) -> Self {
        self.numeric.push(value.into());
        self
    }

    /// Named entries in insertion order.
    pub fn named(&self) -> impl Iterator<Item = (&str, &str)> {
        self.named.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Numeric values in order of appearance.
    #[must_use]
    pub fn numeric(&self) -> &[String] {
        &self.numeric
    }

    /// Look up a named value. The key is matched case-insensitively.
    #[must_use]
    pub fn named_value(&self, key: &str) -> Option<&str> {
        let key = key.to_lowercase();
        self.named
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Look up a numeric value by position.
    #[must_use]
    pub fn numeric_value(&self, index: usize) -> Option<&str> {
        self.numeric.get(index).map(String::as_str)
    }

    /// Set a named value, overwriting in place if the key already exists.
    pub fn set_named(&mut self, key: &str, value: impl Into<String>) {
        let key = key.to_lowercase();
        let value = value.into();
        match self.named.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.named.push((key, value)),
        }
    }

    /// Set a numeric value. Positions past the end are filled with empty strings.
    pub fn set_numeric(&mut self, index: usize, value: impl Into<String>) {
        if index >= self.numeric.len() {
            self.numeric.resize(index + 1, String::new());
        }
        self.numeric[index] = value.into();
    }

    /// Whether there are no named or numeric values.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.named.is_empty() && self.numeric.is_empty()
    }
}

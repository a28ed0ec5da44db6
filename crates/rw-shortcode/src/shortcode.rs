//! The shortcode value type and its canonical serialization.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::{Attrs, ShortcodeEngine, ShortcodeError};

/// Structural form of a shortcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "kebab-case")
)]
pub enum ShortcodeType {
    /// No content and no closing tag: `[tag]`
    Single,
    /// Closes itself: `[tag /]`
    SelfClosing,
    /// Wraps content with a closing tag: `[tag]content[/tag]`
    Closed,
}

/// Attribute input for [`Shortcode::new`].
///
/// Usually produced through `From`: a string is parsed, an [`Attrs`] is taken
/// as-is, and key/value pairs are applied one by one through
/// [`Shortcode::set`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrSource {
    /// Raw attribute text, e.g. `src="a.png" 1`.
    Raw(String),
    /// Already parsed attributes.
    Structured(Attrs),
    /// Flat key/value pairs, all treated as named.
    Pairs(Vec<(String, String)>),
}

impl Default for AttrSource {
    fn default() -> Self {
        Self::Structured(Attrs::default())
    }
}

impl From<&str> for AttrSource {
    fn from(text: &str) -> Self {
        Self::Raw(text.to_owned())
    }
}

impl From<String> for AttrSource {
    fn from(text: String) -> Self {
        Self::Raw(text)
    }
}

impl From<Attrs> for AttrSource {
    fn from(attrs: Attrs) -> Self {
        Self::Structured(attrs)
    }
}

impl<K: Into<String>, V: Into<String>> From<Vec<(K, V)>> for AttrSource {
    fn from(pairs: Vec<(K, V)>) -> Self {
        Self::Pairs(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl<K: Into<String>, V: Into<String>, const N: usize> From<[(K, V); N]> for AttrSource {
    fn from(pairs: [(K, V); N]) -> Self {
        Self::from(Vec::from(pairs))
    }
}

impl<K: Into<String>, V: Into<String>> From<BTreeMap<K, V>> for AttrSource {
    fn from(map: BTreeMap<K, V>) -> Self {
        Self::from(map.into_iter().collect::<Vec<_>>())
    }
}

/// Attribute address for [`Shortcode::get`] and [`Shortcode::set`].
///
/// Indices address numeric values, names address named values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrKey<'a> {
    /// Position in the numeric values.
    Index(usize),
    /// Named attribute (matched case-insensitively).
    Name(&'a str),
}

impl From<usize> for AttrKey<'_> {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

impl<'a> From<&'a str> for AttrKey<'a> {
    fn from(name: &'a str) -> Self {
        Self::Name(name)
    }
}

impl<'a> From<&'a String> for AttrKey<'a> {
    fn from(name: &'a String) -> Self {
        Self::Name(name)
    }
}

/// A shortcode: tag name, attributes, structural type and content.
///
/// `tag` and `kind` are fixed at construction; attributes can be changed
/// through [`set`](Self::set). Content is only ever present for
/// [`ShortcodeType::Closed`].
///
/// # Example
///
/// ```
/// use rw_shortcode::{Shortcode, ShortcodeType};
///
/// let mut code = Shortcode::new("img", [("src", "a.png")], ShortcodeType::SelfClosing);
/// code.set("alt", "A picture").set(0, "left");
/// assert_eq!(code.to_string(), r#"[img left src="a.png" alt="A picture" /]"#);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(from = "RawShortcode")
)]
pub struct Shortcode {
    tag: String,
    attrs: Attrs,
    kind: ShortcodeType,
    content: Option<String>,
}

/// Deserialized form of [`Shortcode`], rebuilt through [`Shortcode::from_parts`].
#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct RawShortcode {
    tag: String,
    #[serde(default)]
    attrs: Attrs,
    kind: ShortcodeType,
    #[serde(default)]
    content: Option<String>,
}

#[cfg(feature = "serde")]
impl From<RawShortcode> for Shortcode {
    fn from(raw: RawShortcode) -> Self {
        Self::from_parts(raw.tag, raw.attrs, raw.kind, raw.content)
    }
}

impl Shortcode {
    /// Create a shortcode without content.
    pub fn new(tag: impl Into<String>, attrs: impl Into<AttrSource>, kind: ShortcodeType) -> Self {
        Self::from_parts(tag, attrs, kind, None)
    }

    /// Create a [`ShortcodeType::Closed`] shortcode wrapping `content`.
    pub fn closed(
        tag: impl Into<String>,
        attrs: impl Into<AttrSource>,
        content: impl Into<String>,
    ) -> Self {
        Self::from_parts(tag, attrs, ShortcodeType::Closed, Some(content.into()))
    }

    /// Create a shortcode from all of its parts.
    ///
    /// `content` is dropped unless `kind` is [`ShortcodeType::Closed`].
    pub fn from_parts(
        tag: impl Into<String>,
        attrs: impl Into<AttrSource>,
        kind: ShortcodeType,
        content: Option<String>,
    ) -> Self {
        let mut shortcode = Self {
            tag: tag.into(),
            attrs: Attrs::new(),
            kind,
            content: content.filter(|_| kind == ShortcodeType::Closed),
        };

        match attrs.into() {
            AttrSource::Raw(text) => shortcode.attrs = Attrs::parse(&text),
            AttrSource::Structured(attrs) => shortcode.attrs = attrs,
            AttrSource::Pairs(pairs) => {
                for (key, value) in pairs {
                    shortcode.set(key.as_str(), value);
                }
            }
        }

        shortcode
    }

    /// Tag name.
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Structural type.
    #[must_use]
    pub fn kind(&self) -> ShortcodeType {
        self.kind
    }

    /// Inner content of a closed shortcode.
    #[must_use]
    pub fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }

    /// All attributes.
    #[must_use]
    pub fn attrs(&self) -> &Attrs {
        &self.attrs
    }

    /// Mutable access to the attributes.
    pub fn attrs_mut(&mut self) -> &mut Attrs {
        &mut self.attrs
    }

    /// Get a numeric (by index) or named (by name) attribute.
    pub fn get<'a>(&self, key: impl Into<AttrKey<'a>>) -> Option<&str> {
        match key.into() {
            AttrKey::Index(index) => self.attrs.numeric_value(index),
            AttrKey::Name(name) => self.attrs.named_value(name),
        }
    }

    /// Set a numeric (by index) or named (by name) attribute, overwriting any
    /// previous value. Returns `self` for chaining.
    pub fn set<'a>(&mut self, key: impl Into<AttrKey<'a>>, value: impl Into<String>) -> &mut Self {
        match key.into() {
            AttrKey::Index(index) => self.attrs.set_numeric(index, value),
            AttrKey::Name(name) => self.attrs.set_named(name, value),
        }
        self
    }
}

impl fmt::Display for Shortcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}", self.tag)?;

        for value in self.attrs.numeric() {
            if value.is_empty() || value.chars().any(char::is_whitespace) {
                write!(f, r#" "{value}""#)?;
            } else {
                write!(f, " {value}")?;
            }
        }

        for (key, value) in self.attrs.named() {
            write!(f, r#" {key}="{value}""#)?;
        }

        match self.kind {
            ShortcodeType::Single => f.write_str("]"),
            ShortcodeType::SelfClosing => f.write_str(" /]"),
            ShortcodeType::Closed => {
                f.write_str("]")?;
                if let Some(content) = &self.content {
                    f.write_str(content)?;
                }
                write!(f, "[/{}]", self.tag)
            }
        }
    }
}

impl FromStr for Shortcode {
    type Err = ShortcodeError;

    /// Parse text consisting of exactly one shortcode, using the global cache.
    ///
    /// See [`ShortcodeEngine::parse_one`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ShortcodeEngine::new().parse_one(s)
    }
}

/// Serialize a shortcode from its parts.
///
/// # Example
///
/// ```
/// use rw_shortcode::{serialize, ShortcodeType};
///
/// let text = serialize("img", [("src", "a.png")], ShortcodeType::SelfClosing, None);
/// assert_eq!(text, r#"[img src="a.png" /]"#);
/// ```
pub fn serialize(
    tag: &str,
    attrs: impl Into<AttrSource>,
    kind: ShortcodeType,
    content: Option<&str>,
) -> String {
    Shortcode::from_parts(tag, attrs, kind, content.map(str::to_owned)).to_string()
}

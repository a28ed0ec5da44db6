//! Bracket shortcode matching, attribute parsing and ordered substitution.
//!
//! Recognizes shortcodes embedded in free-form text:
//!
//! - `[tag]` - single
//! - `[tag attr="value" /]` - self-closing
//! - `[tag 1 two="2"]content[/tag]` - closed, wrapping content
//!
//! Doubling the brackets (`[[tag]]`) escapes an occurrence.
//!
//! # Architecture
//!
//! - [`TagPattern`]: compiled matcher for one tag name, memoized in a
//!   [`ShortcodeCache`]
//! - [`Attrs`]: named and positional attribute values
//! - [`Shortcode`]: structured tag value with a canonical [`Display`](std::fmt::Display) form
//! - [`ShortcodeEngine`]: scanning ([`next`](ShortcodeEngine::next),
//!   [`find_all`](ShortcodeEngine::find_all)) and in-order substitution
//!   ([`replace_all`](ShortcodeEngine::replace_all))
//!
//! # Example
//!
//! ```
//! use rw_shortcode::{Replacement, ShortcodeEngine};
//!
//! let engine = ShortcodeEngine::new();
//! let html = engine
//!     .replace_all_sync("b", "plain [b]bold[/b] [[b]]", |code| {
//!         let inner = code.content().unwrap_or_default();
//!         Ok::<_, std::convert::Infallible>(Replacement::Text(format!("<b>{inner}</b>")))
//!     })
//!     .unwrap();
//! assert_eq!(html, "plain <b>bold</b> [b]");
//! ```

mod attrs;
mod cache;
mod config;
mod engine;
mod error;
mod pattern;
mod replace;
mod scanner;
mod shortcode;

pub use attrs::Attrs;
pub use cache::ShortcodeCache;
pub use config::ShortcodeConfig;
pub use engine::{ShortcodeEngine, compile_pattern, next, parse_attrs, replace_all};
pub use error::{BoxError, ShortcodeError};
pub use pattern::{TagPattern, build_pattern_source};
pub use replace::Replacement;
pub use scanner::{Matches, TagMatch};
pub use shortcode::{AttrKey, AttrSource, Shortcode, ShortcodeType, serialize};

//! Locator grammar: prefixed locator strings and their xpath expansion.
//!
//! A locator string is `strategy=body` where `strategy` is one of the
//! keywords below, or a bare xpath expression when no keyword prefix is
//! present.
//!
//! ```text
//! css=.container label        -> (Css, ".container label")
//! id=submit                   -> (Id, "submit")
//! //div[@role='row'][2]       -> (XPath, "//div[@role='row'][2]")
//! ```
//!
//! # Splitting rule
//!
//! The string is split on the first `=` that is not escaped with a
//! backslash and sits outside `[...]`, `(...)` and quotes. The left side is
//! a keyword candidate only if it reads like a word (letters, digits, `_`,
//! `-`, inner spaces). Anything else, e.g. `//a[@href='x']`, stays a plain
//! xpath expression. A word-shaped keyword that is not recognized is an
//! [`LocusError::UnsupportedLocatorStrategy`].

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::result::{LocusError, LocusResult};

/// Locator strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// XPath expression (default when no prefix is given)
    #[default]
    XPath,
    /// CSS selector
    Css,
    /// `id` attribute
    Id,
    /// `class` attribute (exact match)
    Class,
    /// Anchor with exactly this text
    LinkText,
    /// Any element whose text contains the body
    ContainsText,
    /// `name` attribute
    Name,
}

impl Strategy {
    /// All strategies
    pub const ALL: [Self; 7] = [
        Self::XPath,
        Self::Css,
        Self::Id,
        Self::Class,
        Self::LinkText,
        Self::ContainsText,
        Self::Name,
    ];

    /// Canonical keyword
    #[must_use]
    pub const fn keyword(&self) -> &'static str {
        match self {
            Self::XPath => "xpath",
            Self::Css => "css",
            Self::Id => "id",
            Self::Class => "class",
            Self::LinkText => "link-text",
            Self::ContainsText => "contains-text",
            Self::Name => "name",
        }
    }

    /// Look up a keyword (case-insensitive, `link` and `text` accepted as aliases)
    #[must_use]
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword.trim().to_ascii_lowercase().as_str() {
            "xpath" => Some(Self::XPath),
            "css" => Some(Self::Css),
            "id" => Some(Self::Id),
            "class" => Some(Self::Class),
            "link-text" | "link" => Some(Self::LinkText),
            "contains-text" | "text" => Some(Self::ContainsText),
            "name" => Some(Self::Name),
            _ => None,
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// A parsed `(strategy, body)` pair
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParsedLocator {
    /// Strategy used to interpret `body`
    pub strategy: Strategy,
    /// Strategy-specific matcher
    pub body: String,
}

impl ParsedLocator {
    /// Create a locator from its parts
    #[must_use]
    pub fn new(strategy: Strategy, body: impl Into<String>) -> Self {
        Self {
            strategy,
            body: body.into(),
        }
    }

    /// Parse a prefixed locator string.
    ///
    /// A blank input or a keyword with a blank body is
    /// [`LocusError::EmptyLocator`].
    pub fn parse(input: &str) -> LocusResult<Self> {
        if input.trim().is_empty() {
            return Err(LocusError::EmptyLocator);
        }
        let Some(split) = find_separator(input) else {
            return Ok(Self::new(Strategy::XPath, input));
        };

        let candidate = input[..split].trim();
        if !is_keyword_shaped(candidate) {
            return Ok(Self::new(Strategy::XPath, input));
        }

        let strategy =
            Strategy::from_keyword(candidate).ok_or_else(|| LocusError::UnsupportedLocatorStrategy {
                keyword: candidate.to_string(),
            })?;

        let body = input[split + 1..].trim();
        if body.is_empty() {
            return Err(LocusError::EmptyLocator);
        }
        Ok(Self::new(strategy, body))
    }

    /// Expansion into a pure xpath expression, `None` for css.
    ///
    /// Xpath bodies are returned unchanged; use [`Self::xpath_segment`]
    /// when the locator is a child in a composed chain.
    #[must_use]
    pub fn to_xpath(&self) -> Option<String> {
        let body = self.body.as_str();
        match self.strategy {
            Strategy::Css => None,
            Strategy::XPath => Some(body.to_string()),
            Strategy::Id => Some(format!("//*[@id={}]", xpath_literal(body))),
            Strategy::Class => Some(format!("//*[@class={}]", xpath_literal(body))),
            Strategy::LinkText => Some(format!("//a[text()={}]", xpath_literal(body))),
            Strategy::ContainsText => {
                Some(format!("//*[contains(text(),{})]", xpath_literal(body)))
            }
            Strategy::Name => Some(format!("//*[@name={}]", xpath_literal(body))),
        }
    }

    /// Xpath expansion used for a child segment: a relative xpath has its
    /// leading `.` removed so it can be appended to the parent expression.
    #[must_use]
    pub fn xpath_segment(&self) -> Option<String> {
        match self.strategy {
            Strategy::XPath => Some(
                self.body
                    .strip_prefix('.')
                    .unwrap_or(&self.body)
                    .to_string(),
            ),
            _ => self.to_xpath(),
        }
    }

    /// W3C WebDriver `(using, value)` pair for a Find Element command
    #[must_use]
    pub fn to_w3c(&self) -> (&'static str, String) {
        let body = self.body.as_str();
        match self.strategy {
            Strategy::Css => ("css selector", body.to_string()),
            Strategy::XPath => ("xpath", body.to_string()),
            Strategy::LinkText => ("link text", body.to_string()),
            Strategy::Id => ("css selector", format!("[id={}]", css_string(body))),
            Strategy::Name => ("css selector", format!("[name={}]", css_string(body))),
            Strategy::Class => ("css selector", format!("[class={}]", css_string(body))),
            Strategy::ContainsText => (
                "xpath",
                format!(".//*[contains(text(),{})]", xpath_literal(body)),
            ),
        }
    }

    /// JSON body of a W3C Find Element request
    #[must_use]
    pub fn to_w3c_json(&self) -> serde_json::Value {
        let (using, value) = self.to_w3c();
        serde_json::json!({ "using": using, "value": value })
    }
}

impl fmt::Display for ParsedLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.strategy, self.body)
    }
}

impl std::str::FromStr for ParsedLocator {
    type Err = LocusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Byte index of the first unescaped `=` outside brackets and quotes
fn find_separator(input: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (idx, ch) in input.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match (quote, ch) {
            (_, '\\') => escaped = true,
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(ch),
            (None, '[' | '(') => depth += 1,
            (None, ']' | ')') => depth = depth.saturating_sub(1),
            (None, '=') if depth == 0 => return Some(idx),
            _ => {}
        }
    }
    None
}

fn is_keyword_shaped(candidate: &str) -> bool {
    let mut chars = candidate.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | ' '))
}

/// Quote a value as an xpath string literal.
///
/// Single quotes are preferred; values containing both quote kinds are
/// built with `concat()`.
#[must_use]
pub fn xpath_literal(value: &str) -> String {
    if !value.contains('\'') {
        return format!("'{value}'");
    }
    if !value.contains('"') {
        return format!("\"{value}\"");
    }
    let parts: Vec<String> = value
        .split('\'')
        .map(|part| format!("'{part}'"))
        .collect();
    format!("concat({})", parts.join(", \"'\", "))
}

fn css_string(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

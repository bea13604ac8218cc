//! Marker selectors: which elements the walker discovers.

use std::{fmt, str::FromStr};
use unfurl_core::{ConfigError, NodeView};

/// A single simple selector.
///
/// Supported forms: `[attr]`, `[attr=value]` (value optionally quoted),
/// `.class` and a bare tag name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkerSelector {
    /// Attribute present, optionally with an exact value.
    Attribute {
        /// Attribute name.
        name: String,
        /// Required value.
        value: Option<String>,
    },
    /// Class list contains the class.
    Class(String),
    /// Tag name equals.
    Tag(String),
}

impl MarkerSelector {
    /// Whether `node` matches.
    pub fn matches(&self, node: &NodeView<'_>) -> bool {
        match self {
            MarkerSelector::Attribute { name, value: None } => node.attribute(name).is_some(),
            MarkerSelector::Attribute {
                name,
                value: Some(expected),
            } => node.attribute(name) == Some(expected.as_str()),
            MarkerSelector::Class(class) => node.has_class(class),
            MarkerSelector::Tag(tag) => node.tag() == tag,
        }
    }
}

fn is_name(s: &str) -> bool {
    !s.is_empty()
        && s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':'))
}

impl FromStr for MarkerSelector {
    type Err = ConfigError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let s = raw.trim();
        let invalid = || ConfigError::InvalidSelector(raw.to_owned());

        if let Some(inner) = s.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
            let (name, value) = match inner.split_once('=') {
                Some((name, value)) => {
                    let value = value.trim();
                    let unquoted = value
                        .strip_prefix('"')
                        .and_then(|v| v.strip_suffix('"'))
                        .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
                        .unwrap_or(value);
                    (name.trim(), Some(unquoted.to_owned()))
                }
                None => (inner.trim(), None),
            };
            if !is_name(name) {
                return Err(invalid());
            }
            return Ok(MarkerSelector::Attribute {
                name: name.to_ascii_lowercase(),
                value,
            });
        }
        if let Some(class) = s.strip_prefix('.') {
            return if is_name(class) {
                Ok(MarkerSelector::Class(class.to_owned()))
            } else {
                Err(invalid())
            };
        }
        if is_name(s) {
            return Ok(MarkerSelector::Tag(s.to_ascii_lowercase()));
        }
        Err(invalid())
    }
}

impl fmt::Display for MarkerSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarkerSelector::Attribute { name, value: None } => write!(f, "[{name}]"),
            MarkerSelector::Attribute {
                name,
                value: Some(value),
            } => write!(f, "[{name}=\"{value}\"]"),
            MarkerSelector::Class(class) => write!(f, ".{class}"),
            MarkerSelector::Tag(tag) => f.write_str(tag),
        }
    }
}

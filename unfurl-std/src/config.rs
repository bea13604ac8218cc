//! Loader configuration.

use crate::selector::MarkerSelector;
use serde::{Deserialize, Serialize};
use unfurl_core::{ConfigError, NodeView};

/// Tunables of a [`Loader`](crate::loader::Loader).
///
/// Every field has a default, so a partial TOML document only overrides
/// what it names:
///
/// ```toml
/// marker_selectors = ["[data-widget]"]
/// processed_marker = "is-enhanced"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Selectors marking elements to discover.
    pub marker_selectors: Vec<String>,
    /// Class added to every discovered element.
    pub processed_marker: String,
    /// Prefix of metadata attributes: `data-<prefix>-<key>`.
    pub data_prefix: String,
    /// Log only the code and message of each report.
    pub simple_logs: bool,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            marker_selectors: vec![
                "[data-ds-component]".to_owned(),
                "[data-ds-components]".to_owned(),
            ],
            processed_marker: "js-ds-loaded".to_owned(),
            data_prefix: "ds".to_owned(),
            simple_logs: false,
        }
    }
}

impl LoaderConfig {
    /// Parse a TOML document, filling unnamed fields with defaults.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        toml::from_str(source).map_err(|e| ConfigError::Parse(Box::new(e)))
    }

    /// Validate and compile into [`ScanRules`].
    pub fn rules(&self) -> Result<ScanRules, ConfigError> {
        if self.marker_selectors.is_empty() {
            return Err(ConfigError::NoSelectors);
        }
        let marker = self.processed_marker.as_str();
        if marker.is_empty() || marker.chars().any(char::is_whitespace) {
            return Err(ConfigError::InvalidMarker(marker.to_owned()));
        }
        let selectors = self
            .marker_selectors
            .iter()
            .map(|s| s.parse())
            .collect::<Result<Vec<MarkerSelector>, _>>()?;
        Ok(ScanRules {
            selectors,
            processed_marker: marker.to_owned(),
            data_prefix: self.data_prefix.clone(),
        })
    }
}

/// Compiled discovery rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanRules {
    selectors: Vec<MarkerSelector>,
    processed_marker: String,
    data_prefix: String,
}

impl ScanRules {
    /// Whether `node` is marked and not yet processed.
    pub fn is_candidate(&self, node: &NodeView<'_>) -> bool {
        !node.has_class(&self.processed_marker) && self.selectors.iter().any(|s| s.matches(node))
    }

    /// The compiled selectors.
    pub fn selectors(&self) -> &[MarkerSelector] {
        &self.selectors
    }

    /// The processed-marker class.
    pub fn processed_marker(&self) -> &str {
        &self.processed_marker
    }

    /// The metadata attribute prefix.
    pub fn data_prefix(&self) -> &str {
        &self.data_prefix
    }
}

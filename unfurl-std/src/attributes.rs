//! Attribute reader: turns an element's `data-*` attributes into metadata.

use regex::Regex;
use serde_json::Value;
use unfurl_core::{Element, ErrorKind, Metadata, Report, Reporter};

/// Read `data-` attributes of `element` whose name matches `name`.
///
/// `name` may contain `*` wildcards. With a `prefix`, only `data-<prefix>-*`
/// attributes are considered and the prefix is stripped from the keys.
/// Values are JSON-decoded when they parse and kept as strings otherwise;
/// empty values are skipped.
///
/// A missing element is reported as [`ErrorKind::DataHelperElementNotDefined`]
/// and yields an empty mapping.
pub fn data(
    element: Option<&Element>,
    name: &str,
    prefix: Option<&str>,
    reporter: &dyn Reporter,
) -> Metadata {
    let Some(element) = element else {
        reporter.report(Report::new(ErrorKind::DataHelperElementNotDefined));
        return Metadata::new();
    };

    let prefix = match prefix {
        Some(prefix) => format!("data-{prefix}-"),
        None => "data-".to_owned(),
    };
    let Some(pattern) = name_pattern(&prefix, name) else {
        return Metadata::new();
    };

    let mut metadata = Metadata::new();
    for (attribute, value) in element.attributes() {
        if value.is_empty() || !pattern.is_match(&attribute) {
            continue;
        }
        let Some(key) = attribute.strip_prefix(&prefix) else {
            continue;
        };
        let value = serde_json::from_str(&value).unwrap_or(Value::String(value));
        metadata.insert(key.to_owned(), value);
    }
    metadata
}

fn name_pattern(prefix: &str, name: &str) -> Option<Regex> {
    let glob = format!("{prefix}{name}");
    let body: Vec<String> = glob.split('*').map(regex::escape).collect();
    match Regex::new(&format!("^{}$", body.join(".*"))) {
        Ok(pattern) => Some(pattern),
        Err(err) => {
            tracing::warn!(%name, error = %err, "attribute pattern rejected");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingReporter;
    use serde_json::json;
    use unfurl_core::Document;

    fn node() -> Element {
        let doc = Document::new();
        doc.root().append_child(
            "div",
            [
                ("id", "TestNode"),
                ("data-t1", "t1"),
                ("data-json", r#"{"bestanden":true}"#),
                ("data-prefix-t1", "t1"),
                ("data-prefix-json", r#"{"bestanden":true}"#),
                ("data-empty", ""),
            ],
        )
    }

    #[test]
    fn test_single_attribute() {
        let reporter = RecordingReporter::new();
        let result = data(Some(&node()), "t1", None, &reporter);
        assert_eq!(result.get("t1"), Some(&json!("t1")));
        assert_eq!(result.len(), 1);
    }

    #[test]
    fn test_all_attributes_parse_json() {
        let reporter = RecordingReporter::new();
        let result = data(Some(&node()), "*", None, &reporter);
        assert_eq!(
            Value::Object(result),
            json!({
                "t1": "t1",
                "json": {"bestanden": true},
                "prefix-t1": "t1",
                "prefix-json": {"bestanden": true},
            })
        );
    }

    #[test]
    fn test_wildcard_and_prefix() {
        let reporter = RecordingReporter::new();
        let all = data(Some(&node()), "*js*", None, &reporter);
        assert_eq!(all.len(), 2);
        assert!(all.contains_key("prefix-json"));

        let prefixed = data(Some(&node()), "*js*", Some("prefix"), &reporter);
        assert_eq!(Value::Object(prefixed), json!({"json": {"bestanden": true}}));

        let stripped = data(Some(&node()), "*", Some("prefix"), &reporter);
        assert_eq!(
            Value::Object(stripped),
            json!({"t1": "t1", "json": {"bestanden": true}})
        );
    }

    #[test]
    fn test_missing_attribute_is_empty() {
        let reporter = RecordingReporter::new();
        assert!(data(Some(&node()), "does-not-exist", None, &reporter).is_empty());
        assert!(reporter.is_empty());
    }

    #[test]
    fn test_missing_element_reports() {
        let reporter = RecordingReporter::new();
        assert!(data(None, "*", None, &reporter).is_empty());
        assert_eq!(reporter.count(ErrorKind::DataHelperElementNotDefined), 1);
    }
}

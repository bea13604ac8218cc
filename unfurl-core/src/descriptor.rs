//! Component descriptors: one record per discovered element.

use crate::{
    behavior::Options,
    component::ComponentInstance,
    markup::Element,
};
use serde_json::Value;
use std::{
    fmt,
    sync::{Arc, Mutex, MutexGuard, PoisonError, Weak},
};

/// Attribute metadata read from an element, keyed by attribute name without prefix.
pub type Metadata = serde_json::Map<String, Value>;

/// Metadata keys whose string values list behavior module paths, in order.
pub const BEHAVIOR_KEYS: [&str; 2] = ["component", "components"];

/// Metadata key naming the load condition.
pub const CONDITION_KEY: &str = "condition";

/// Metadata key holding the options object.
pub const OPTIONS_KEY: &str = "options";

/// Describes one discovered element: its metadata, behaviors and linkage.
///
/// Descriptors are only created through [`discover`](Self::discover), which
/// marks the element processed before returning. An element therefore gets
/// at most one descriptor, and a tree walk that re-queries for unprocessed
/// elements always makes progress.
pub struct ComponentDescriptor {
    element: Element,
    metadata: Metadata,
    behavior_paths: Vec<String>,
    parent: Option<Weak<ComponentDescriptor>>,
    children: Mutex<Vec<Arc<ComponentDescriptor>>>,
    instances: Mutex<Vec<Arc<ComponentInstance>>>,
}

impl ComponentDescriptor {
    /// Describe `element` and mark it processed with the `processed_marker` class.
    pub fn discover(
        element: Element,
        metadata: Metadata,
        parent: Option<&Arc<ComponentDescriptor>>,
        processed_marker: &str,
    ) -> Arc<Self> {
        element.add_class(processed_marker);
        let behavior_paths = behavior_paths(&metadata);
        Arc::new(Self {
            element,
            metadata,
            behavior_paths,
            parent: parent.map(Arc::downgrade),
            children: Mutex::new(Vec::new()),
            instances: Mutex::new(Vec::new()),
        })
    }

    /// The described element.
    pub fn element(&self) -> &Element {
        &self.element
    }

    /// All metadata read from the element.
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Behavior module paths, deduplicated, in instantiation order.
    pub fn behavior_paths(&self) -> &[String] {
        &self.behavior_paths
    }

    /// The load condition name, if the element declares one as a string.
    pub fn condition(&self) -> Option<&str> {
        self.metadata.get(CONDITION_KEY).and_then(Value::as_str)
    }

    /// The `options` metadata, if it is an object.
    pub fn options(&self) -> Option<&Options> {
        self.metadata.get(OPTIONS_KEY).and_then(Value::as_object)
    }

    /// The enclosing descriptor, while it is alive.
    pub fn parent(&self) -> Option<Arc<ComponentDescriptor>> {
        self.parent.as_ref().and_then(Weak::upgrade)
    }

    /// Linked child descriptors, in link order.
    pub fn children(&self) -> Vec<Arc<ComponentDescriptor>> {
        lock(&self.children).clone()
    }

    /// Link `child` under this descriptor. Linking the same child twice is a no-op.
    pub fn link_child(&self, child: Arc<ComponentDescriptor>) {
        let mut children = lock(&self.children);
        if !children.iter().any(|c| Arc::ptr_eq(c, &child)) {
            children.push(child);
        }
    }

    /// The last-applied instance.
    pub fn instance(&self) -> Option<Arc<ComponentInstance>> {
        lock(&self.instances).last().cloned()
    }

    /// Every instance constructed against this descriptor, in construction order.
    pub fn instances(&self) -> Vec<Arc<ComponentInstance>> {
        lock(&self.instances).clone()
    }

    /// Record a constructed instance; it becomes "the" instance.
    pub fn set_instance(&self, instance: Arc<ComponentInstance>) {
        lock(&self.instances).push(instance);
    }

    /// Short label for logs and reports.
    pub fn label(&self) -> String {
        if self.behavior_paths.is_empty() {
            format!("<{}>", self.element.tag_name())
        } else {
            self.behavior_paths.join(",")
        }
    }
}

impl fmt::Debug for ComponentDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentDescriptor")
            .field("element", &self.element)
            .field("behavior_paths", &self.behavior_paths)
            .field("has_parent", &self.parent.is_some())
            .field("children", &lock(&self.children).len())
            .field("instances", &lock(&self.instances).len())
            .finish()
    }
}

impl fmt::Display for ComponentDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn behavior_paths(metadata: &Metadata) -> Vec<String> {
    let mut paths: Vec<String> = Vec::new();
    for key in BEHAVIOR_KEYS {
        let Some(list) = metadata.get(key).and_then(Value::as_str) else {
            continue;
        };
        let compact: String = list.chars().filter(|c| !c.is_whitespace()).collect();
        for path in compact.split(',').filter(|p| !p.is_empty()) {
            if !paths.iter().any(|p| p == path) {
                paths.push(path.to_owned());
            }
        }
    }
    paths
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::Document;
    use serde_json::json;

    fn metadata(value: Value) -> Metadata {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn test_discover_marks_processed() {
        let doc = Document::new();
        let el = doc.root().append_child("div", [("data-ds-component", "a")]);
        let descriptor =
            ComponentDescriptor::discover(el.clone(), metadata(json!({"component": "a"})), None, "done");
        assert!(el.has_class("done"));
        assert!(descriptor.instance().is_none());
        assert!(descriptor.parent().is_none());
    }

    #[test]
    fn test_behavior_paths_merge_and_dedupe() {
        let doc = Document::new();
        let el = doc.root().append_child("div", Vec::<(String, String)>::new());
        let descriptor = ComponentDescriptor::discover(
            el,
            metadata(json!({
                "components": "b, a ,c",
                "component": "a",
            })),
            None,
            "done",
        );
        assert_eq!(descriptor.behavior_paths(), ["a", "b", "c"]);
        assert_eq!(descriptor.label(), "a,b,c");
    }

    #[test]
    fn test_non_string_paths_ignored() {
        let doc = Document::new();
        let el = doc.root().append_child("section", Vec::<(String, String)>::new());
        let descriptor = ComponentDescriptor::discover(
            el,
            metadata(json!({"component": 5, "condition": true, "options": "x"})),
            None,
            "done",
        );
        assert!(descriptor.behavior_paths().is_empty());
        assert!(descriptor.condition().is_none());
        assert!(descriptor.options().is_none());
        assert_eq!(descriptor.label(), "<section>");
    }

    #[test]
    fn test_parent_link_is_weak() {
        let doc = Document::new();
        let outer = doc.root().append_child("div", Vec::<(String, String)>::new());
        let inner = outer.append_child("div", Vec::<(String, String)>::new());
        let parent = ComponentDescriptor::discover(outer, Metadata::new(), None, "done");
        let child = ComponentDescriptor::discover(inner, Metadata::new(), Some(&parent), "done");

        parent.link_child(child.clone());
        parent.link_child(child.clone());
        assert_eq!(parent.children().len(), 1);
        assert!(Arc::ptr_eq(&child.parent().unwrap(), &parent));

        drop(parent);
        assert!(child.parent().is_none());
    }
}

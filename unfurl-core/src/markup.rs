//! # Markup Tree
//!
//! A minimal, shared element tree that the host document and the loader both
//! operate on. Only what discovery and enhancement need is modelled: tag
//! names, ordered attributes, the class list, parent/child structure and a
//! per-node visibility flag with one-shot observers.
//!
//! [`Document`] and [`Element`] are cheap handles over the same tree; cloning
//! them never copies nodes. Every accessor takes the tree lock for the
//! duration of the call only, so handles can be used freely from behaviors
//! and condition callbacks.

use std::{
    fmt,
    sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

/// Tag name given to the synthetic root of every [`Document`].
pub const ROOT_TAG: &str = "#document";

type VisibilityObserver = Box<dyn FnOnce() + Send + Sync>;

/// Index of a node inside its document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

struct NodeData {
    tag: String,
    attributes: Vec<(String, String)>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    visible: bool,
    observers: Vec<VisibilityObserver>,
}

impl NodeData {
    fn new(tag: String, parent: Option<NodeId>) -> Self {
        Self {
            tag,
            attributes: Vec::new(),
            parent,
            children: Vec::new(),
            visible: false,
            observers: Vec::new(),
        }
    }

    fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    fn set_attribute(&mut self, name: &str, value: String) {
        match self.attributes.iter_mut().find(|(key, _)| key == name) {
            Some((_, slot)) => *slot = value,
            None => self.attributes.push((name.to_owned(), value)),
        }
    }

    fn has_class(&self, class: &str) -> bool {
        self.attribute("class")
            .is_some_and(|list| list.split_whitespace().any(|c| c == class))
    }
}

struct Tree {
    nodes: Vec<NodeData>,
}

impl Tree {
    fn node(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.0]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut NodeData {
        &mut self.nodes[id.0]
    }
}

/// A shared handle to a markup tree.
#[derive(Clone)]
pub struct Document {
    tree: Arc<RwLock<Tree>>,
}

impl Document {
    /// Create an empty document holding only its root node.
    pub fn new() -> Self {
        let root = NodeData::new(ROOT_TAG.to_owned(), None);
        Self {
            tree: Arc::new(RwLock::new(Tree { nodes: vec![root] })),
        }
    }

    /// The synthetic root element.
    pub fn root(&self) -> Element {
        self.element(NodeId(0))
    }

    /// The first `body` element in document order, if any.
    pub fn body(&self) -> Option<Element> {
        self.root().query_first(|node| node.tag() == "body")
    }

    /// Total number of nodes, root included.
    pub fn len(&self) -> usize {
        self.read().nodes.len()
    }

    /// Whether the document holds nothing but its root.
    pub fn is_empty(&self) -> bool {
        self.len() == 1
    }

    fn element(&self, id: NodeId) -> Element {
        Element {
            document: self.clone(),
            id,
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Tree> {
        self.tree.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Tree> {
        self.tree.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.tree, &other.tree)
    }
}

impl Eq for Document {}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document").field("nodes", &self.len()).finish()
    }
}

/// A read-only view of one node, handed to tree queries while the tree is locked.
pub struct NodeView<'a> {
    data: &'a NodeData,
}

impl NodeView<'_> {
    /// Lowercase tag name.
    pub fn tag(&self) -> &str {
        &self.data.tag
    }

    /// Value of the named attribute.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.data.attribute(name)
    }

    /// Whether the class list contains `class`.
    pub fn has_class(&self, class: &str) -> bool {
        self.data.has_class(class)
    }
}

/// A handle to one element of a [`Document`].
#[derive(Clone)]
pub struct Element {
    document: Document,
    id: NodeId,
}

impl Element {
    /// The node's index in its document.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// The document this element belongs to.
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Lowercase tag name.
    pub fn tag_name(&self) -> String {
        self.document.read().node(self.id).tag.clone()
    }

    /// Value of the named attribute.
    pub fn attribute(&self, name: &str) -> Option<String> {
        self.document
            .read()
            .node(self.id)
            .attribute(name)
            .map(str::to_owned)
    }

    /// Whether the named attribute is present.
    pub fn has_attribute(&self, name: &str) -> bool {
        self.document.read().node(self.id).attribute(name).is_some()
    }

    /// All attributes in source order.
    pub fn attributes(&self) -> Vec<(String, String)> {
        self.document.read().node(self.id).attributes.clone()
    }

    /// Set an attribute, keeping its position if it already exists.
    pub fn set_attribute(&self, name: &str, value: impl Into<String>) {
        self.document
            .write()
            .node_mut(self.id)
            .set_attribute(name, value.into());
    }

    /// Remove an attribute. Returns its previous value.
    pub fn remove_attribute(&self, name: &str) -> Option<String> {
        let mut tree = self.document.write();
        let attributes = &mut tree.node_mut(self.id).attributes;
        let index = attributes.iter().position(|(key, _)| key == name)?;
        Some(attributes.remove(index).1)
    }

    /// Whether the class list contains `class`.
    pub fn has_class(&self, class: &str) -> bool {
        self.document.read().node(self.id).has_class(class)
    }

    /// Add `class` to the class list. No-op if already present.
    pub fn add_class(&self, class: &str) {
        let mut tree = self.document.write();
        let node = tree.node_mut(self.id);
        if node.has_class(class) {
            return;
        }
        let list = match node.attribute("class") {
            Some(existing) if !existing.trim().is_empty() => format!("{} {class}", existing.trim()),
            _ => class.to_owned(),
        };
        node.set_attribute("class", list);
    }

    /// The enclosing element, `None` for the document root.
    pub fn parent(&self) -> Option<Element> {
        let parent = self.document.read().node(self.id).parent?;
        Some(self.document.element(parent))
    }

    /// Direct children in document order.
    pub fn children(&self) -> Vec<Element> {
        let children = self.document.read().node(self.id).children.clone();
        children
            .into_iter()
            .map(|id| self.document.element(id))
            .collect()
    }

    /// Append a new child element and return it.
    pub fn append_child<I, K, V>(&self, tag: &str, attributes: I) -> Element
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut tree = self.document.write();
        let id = NodeId(tree.nodes.len());
        let mut node = NodeData::new(tag.to_ascii_lowercase(), Some(self.id));
        for (key, value) in attributes {
            node.set_attribute(&key.into(), value.into());
        }
        tree.nodes.push(node);
        tree.node_mut(self.id).children.push(id);
        drop(tree);
        self.document.element(id)
    }

    /// First descendant in pre-order (self excluded) accepted by `predicate`.
    pub fn query_first(&self, mut predicate: impl FnMut(&NodeView<'_>) -> bool) -> Option<Element> {
        let tree = self.document.read();
        let mut stack: Vec<NodeId> = tree.node(self.id).children.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            let data = tree.node(id);
            if predicate(&NodeView { data }) {
                drop(tree);
                return Some(self.document.element(id));
            }
            stack.extend(data.children.iter().rev().copied());
        }
        None
    }

    /// All descendants in pre-order (self excluded) accepted by `predicate`.
    pub fn query_all(&self, mut predicate: impl FnMut(&NodeView<'_>) -> bool) -> Vec<Element> {
        let tree = self.document.read();
        let mut found = Vec::new();
        let mut stack: Vec<NodeId> = tree.node(self.id).children.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            let data = tree.node(id);
            if predicate(&NodeView { data }) {
                found.push(id);
            }
            stack.extend(data.children.iter().rev().copied());
        }
        drop(tree);
        found
            .into_iter()
            .map(|id| self.document.element(id))
            .collect()
    }

    /// Whether the host currently reports this element as visible.
    pub fn is_visible(&self) -> bool {
        self.document.read().node(self.id).visible
    }

    /// Update visibility. Becoming visible fires and clears every pending observer.
    pub fn set_visible(&self, visible: bool) {
        let fired = {
            let mut tree = self.document.write();
            let node = tree.node_mut(self.id);
            node.visible = visible;
            if visible {
                std::mem::take(&mut node.observers)
            } else {
                Vec::new()
            }
        };
        for observer in fired {
            observer();
        }
    }

    /// Run `observer` once the element is visible; immediately if it already is.
    pub fn observe_visibility(&self, observer: impl FnOnce() + Send + Sync + 'static) {
        {
            let mut tree = self.document.write();
            let node = tree.node_mut(self.id);
            if !node.visible {
                node.observers.push(Box::new(observer));
                return;
            }
        }
        observer();
    }

    /// Number of observers still waiting for this element to become visible.
    pub fn pending_observers(&self) -> usize {
        self.document.read().node(self.id).observers.len()
    }
}

impl PartialEq for Element {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.document == other.document
    }
}

impl Eq for Element {}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tree = self.document.read();
        let node = tree.node(self.id);
        write!(f, "<{}", node.tag)?;
        for (key, value) in &node.attributes {
            write!(f, " {key}=\"{value}\"")?;
        }
        write!(f, "> #{}", self.id.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_query_first_is_preorder() {
        let doc = Document::new();
        let a = doc.root().append_child("div", [("id", "a")]);
        a.append_child("span", [("id", "a1")]);
        doc.root().append_child("div", [("id", "b")]);

        let first_div = doc.root().query_first(|n| n.tag() == "div").unwrap();
        assert_eq!(first_div.attribute("id").as_deref(), Some("a"));

        let ids: Vec<_> = doc
            .root()
            .query_all(|_| true)
            .iter()
            .filter_map(|e| e.attribute("id"))
            .collect();
        assert_eq!(ids, vec!["a", "a1", "b"]);
    }

    #[test]
    fn test_query_excludes_scope() {
        let doc = Document::new();
        let div = doc.root().append_child("div", Vec::<(String, String)>::new());
        assert!(div.query_first(|n| n.tag() == "div").is_none());
    }

    #[test]
    fn test_add_class_is_idempotent() {
        let doc = Document::new();
        let div = doc.root().append_child("div", [("class", "card")]);
        div.add_class("loaded");
        div.add_class("loaded");
        assert_eq!(div.attribute("class").as_deref(), Some("card loaded"));
        assert!(div.has_class("loaded"));
        assert!(!div.has_class("load"));
    }

    #[test]
    fn test_visibility_observers_fire_once() {
        let doc = Document::new();
        let div = doc.root().append_child("div", Vec::<(String, String)>::new());
        let fired = Arc::new(AtomicUsize::new(0));

        let counter = fired.clone();
        div.observe_visibility(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(div.pending_observers(), 1);

        div.set_visible(true);
        div.set_visible(false);
        div.set_visible(true);
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(div.pending_observers(), 0);

        let counter = fired.clone();
        div.observe_visibility(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(fired.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_body_lookup() {
        let doc = Document::new();
        assert!(doc.body().is_none());
        let html = doc.root().append_child("HTML", Vec::<(String, String)>::new());
        let body = html.append_child("body", Vec::<(String, String)>::new());
        assert_eq!(doc.body(), Some(body));
        assert_eq!(html.tag_name(), "html");
    }
}

//! Depth-first discovery of marked elements.

use crate::{attributes::data, config::ScanRules};
use std::{iter::FusedIterator, sync::Arc};
use unfurl_core::{ComponentDescriptor, Element, Reporter};

struct Frame {
    scope: Element,
    parent: Option<Arc<ComponentDescriptor>>,
}

/// Walks a subtree and yields one descriptor per unprocessed marked element.
///
/// The walker keeps a stack of scopes. Each step asks the top scope for its
/// first unprocessed marked descendant; a hit is described (which marks it
/// processed), becomes the parent of whatever is found beneath it and is
/// pushed as the new top. A miss pops the scope. Because every query is
/// answered against the live tree, elements inserted while walking are
/// still found, and no element is ever yielded twice.
pub struct TreeWalker<'a> {
    rules: &'a ScanRules,
    reporter: &'a dyn Reporter,
    stack: Vec<Frame>,
}

impl<'a> TreeWalker<'a> {
    /// Walk the descendants of `root`. `parent` becomes the parent of the
    /// top-level descriptors found.
    pub fn new(
        root: Element,
        parent: Option<Arc<ComponentDescriptor>>,
        rules: &'a ScanRules,
        reporter: &'a dyn Reporter,
    ) -> Self {
        Self {
            rules,
            reporter,
            stack: vec![Frame {
                scope: root,
                parent,
            }],
        }
    }
}

impl Iterator for TreeWalker<'_> {
    type Item = Arc<ComponentDescriptor>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(frame) = self.stack.last() {
            let Some(found) = frame.scope.query_first(|node| self.rules.is_candidate(node)) else {
                self.stack.pop();
                continue;
            };
            let metadata = data(
                Some(&found),
                "*",
                Some(self.rules.data_prefix()),
                self.reporter,
            );
            let descriptor = ComponentDescriptor::discover(
                found.clone(),
                metadata,
                frame.parent.as_ref(),
                self.rules.processed_marker(),
            );
            tracing::trace!(component = %descriptor, "discovered");
            self.stack.push(Frame {
                scope: found,
                parent: Some(descriptor.clone()),
            });
            return Some(descriptor);
        }
        None
    }
}

impl FusedIterator for TreeWalker<'_> {}

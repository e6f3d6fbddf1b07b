#![forbid(unsafe_code)]

//! Host page abstraction.
//!
//! The engine never touches a browser API directly. Everything it needs from
//! the page goes through [`PageDom`]: attribute and class access, reparenting
//! of existing nodes, element creation for engine-owned chrome (dividers,
//! control strips), and bounding boxes for drag hit-testing.
//!
//! [`MemoryDom`] is an arena-backed implementation used by headless hosts and
//! tests. A browser host implements the trait over real DOM nodes and keeps
//! its own `NodeId` ↔ element table.
//!
//! # Invariants
//!
//! 1. A node has at most one parent; inserting an attached node moves it.
//! 2. `insert_before` with the node already in the requested slot is a no-op.
//! 3. Nodes are never destroyed, only detached, so a `NodeId` stays valid for
//!    the lifetime of the page instance.

use std::collections::BTreeMap;

use crate::geometry::Bounds;

/// Opaque handle to one page node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u32);

impl NodeId {
    /// Construct a handle from a raw index.
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Raw index of this handle.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

/// Page operations the layout engine depends on.
pub trait PageDom {
    /// Document root.
    fn root(&self) -> NodeId;

    /// Lower-case tag name, if the node exists.
    fn tag(&self, node: NodeId) -> Option<String>;

    fn attribute(&self, node: NodeId, name: &str) -> Option<String>;

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str);

    fn remove_attribute(&mut self, node: NodeId, name: &str);

    fn has_class(&self, node: NodeId, class: &str) -> bool;

    fn add_class(&mut self, node: NodeId, class: &str);

    fn remove_class(&mut self, node: NodeId, class: &str);

    /// Direct children in document order.
    fn children(&self, node: NodeId) -> Vec<NodeId>;

    fn parent(&self, node: NodeId) -> Option<NodeId>;

    /// Create a detached element.
    fn create_element(&mut self, tag: &str) -> NodeId;

    /// Insert `node` into `parent` before `reference`, or at the end when
    /// `reference` is `None` or not a child of `parent`.
    fn insert_before(&mut self, parent: NodeId, node: NodeId, reference: Option<NodeId>);

    /// Remove `node` from its parent, keeping it alive.
    fn detach(&mut self, node: NodeId);

    /// Current layout box, if the host can measure the node.
    fn bounds(&self, node: NodeId) -> Option<Bounds>;

    fn append_child(&mut self, parent: NodeId, node: NodeId) {
        self.insert_before(parent, node, None);
    }

    fn next_sibling(&self, node: NodeId) -> Option<NodeId> {
        let parent = self.parent(node)?;
        let siblings = self.children(parent);
        let idx = siblings.iter().position(|&n| n == node)?;
        siblings.get(idx + 1).copied()
    }

    /// All descendants of `node` in pre-order, excluding `node`.
    fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(node).into_iter().rev().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).into_iter().rev());
        }
        out
    }

    fn find_first_by_class(&self, scope: NodeId, class: &str) -> Option<NodeId> {
        self.descendants(scope)
            .into_iter()
            .find(|&n| self.has_class(n, class))
    }

    fn find_first_by_tag(&self, scope: NodeId, tag: &str) -> Option<NodeId> {
        self.descendants(scope)
            .into_iter()
            .find(|&n| self.tag(n).as_deref() == Some(tag))
    }

    /// `node` itself or its nearest ancestor carrying `class`.
    fn closest_with_class(&self, node: NodeId, class: &str) -> Option<NodeId> {
        let mut cursor = Some(node);
        while let Some(current) = cursor {
            if self.has_class(current, class) {
                return Some(current);
            }
            cursor = self.parent(current);
        }
        None
    }
}

// ---------------------------------------------------------------------------
// In-memory implementation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
struct NodeData {
    tag: String,
    attributes: BTreeMap<String, String>,
    classes: Vec<String>,
    text: String,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
    bounds: Option<Bounds>,
}

/// Arena-backed page model.
///
/// Every mutation that changes observable state bumps [`revision`], which
/// lets callers assert that an operation left the page untouched.
///
/// [`revision`]: MemoryDom::revision
#[derive(Debug, Clone)]
pub struct MemoryDom {
    nodes: Vec<NodeData>,
    revision: u64,
}

impl Default for MemoryDom {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDom {
    /// Create a document containing only a `body` root.
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: vec![NodeData {
                tag: "body".to_owned(),
                ..NodeData::default()
            }],
            revision: 0,
        }
    }

    /// Mutation counter.
    #[must_use]
    pub const fn revision(&self) -> u64 {
        self.revision
    }

    /// Number of nodes ever created, attached or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Text content of the node itself (not its descendants).
    #[must_use]
    pub fn text(&self, node: NodeId) -> Option<&str> {
        self.node(node).map(|n| n.text.as_str())
    }

    pub fn set_text(&mut self, node: NodeId, text: impl Into<String>) {
        if let Some(n) = self.node_mut(node) {
            n.text = text.into();
            self.revision += 1;
        }
    }

    pub fn set_bounds(&mut self, node: NodeId, bounds: Bounds) {
        if let Some(n) = self.node_mut(node) {
            n.bounds = Some(bounds);
        }
    }

    /// Assign stacked boxes of `row_height` to the children of `parent` in
    /// document order, mimicking a single-column flow layout.
    pub fn stack_children(&mut self, parent: NodeId, row_height: f64) {
        let children = self.children(parent);
        for (idx, child) in children.into_iter().enumerate() {
            let y = idx as f64 * row_height;
            self.set_bounds(child, Bounds::new(0.0, y, 600.0, row_height));
        }
    }

    /// Create an element with classes and append it to `parent`.
    pub fn append_element(&mut self, parent: NodeId, tag: &str, classes: &[&str]) -> NodeId {
        let node = self.create_element(tag);
        for class in classes {
            self.add_class(node, class);
        }
        self.append_child(parent, node);
        node
    }

    /// Nodes under `scope` (inclusive) that carry `class`.
    #[must_use]
    pub fn nodes_with_class(&self, scope: NodeId, class: &str) -> Vec<NodeId> {
        let mut out = Vec::new();
        if self.has_class(scope, class) {
            out.push(scope);
        }
        out.extend(
            self.descendants(scope)
                .into_iter()
                .filter(|&n| self.has_class(n, class)),
        );
        out
    }

    fn node(&self, node: NodeId) -> Option<&NodeData> {
        self.nodes.get(node.0 as usize)
    }

    fn node_mut(&mut self, node: NodeId) -> Option<&mut NodeData> {
        self.nodes.get_mut(node.0 as usize)
    }

    fn unlink(&mut self, node: NodeId) -> bool {
        let Some(parent) = self.node(node).and_then(|n| n.parent) else {
            return false;
        };
        if let Some(p) = self.node_mut(parent) {
            p.children.retain(|&c| c != node);
        }
        if let Some(n) = self.node_mut(node) {
            n.parent = None;
        }
        true
    }

    fn is_ancestor_or_self(&self, candidate: NodeId, node: NodeId) -> bool {
        let mut cursor = Some(node);
        while let Some(current) = cursor {
            if current == candidate {
                return true;
            }
            cursor = self.node(current).and_then(|n| n.parent);
        }
        false
    }
}

impl PageDom for MemoryDom {
    fn root(&self) -> NodeId {
        NodeId(0)
    }

    fn tag(&self, node: NodeId) -> Option<String> {
        self.node(node).map(|n| n.tag.clone())
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.node(node)?.attributes.get(name).cloned()
    }

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) {
        let Some(n) = self.node_mut(node) else {
            return;
        };
        if n.attributes.get(name).map(String::as_str) == Some(value) {
            return;
        }
        n.attributes.insert(name.to_owned(), value.to_owned());
        self.revision += 1;
    }

    fn remove_attribute(&mut self, node: NodeId, name: &str) {
        if let Some(n) = self.node_mut(node)
            && n.attributes.remove(name).is_some()
        {
            self.revision += 1;
        }
    }

    fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.node(node)
            .is_some_and(|n| n.classes.iter().any(|c| c == class))
    }

    fn add_class(&mut self, node: NodeId, class: &str) {
        let Some(n) = self.node_mut(node) else {
            return;
        };
        if n.classes.iter().any(|c| c == class) {
            return;
        }
        n.classes.push(class.to_owned());
        self.revision += 1;
    }

    fn remove_class(&mut self, node: NodeId, class: &str) {
        let Some(n) = self.node_mut(node) else {
            return;
        };
        let before = n.classes.len();
        n.classes.retain(|c| c != class);
        if n.classes.len() != before {
            self.revision += 1;
        }
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.node(node)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.node(node)?.parent
    }

    fn create_element(&mut self, tag: &str) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(NodeData {
            tag: tag.to_ascii_lowercase(),
            ..NodeData::default()
        });
        self.revision += 1;
        id
    }

    fn insert_before(&mut self, parent: NodeId, node: NodeId, reference: Option<NodeId>) {
        if self.node(parent).is_none() || self.node(node).is_none() {
            return;
        }
        // A node cannot become its own ancestor.
        if self.is_ancestor_or_self(node, parent) {
            return;
        }
        let reference = reference.filter(|&r| r != node && self.parent(r) == Some(parent));

        if self.parent(node) == Some(parent) {
            let siblings = &self.nodes[parent.0 as usize].children;
            let idx = siblings.iter().position(|&c| c == node);
            let next = idx.and_then(|i| siblings.get(i + 1)).copied();
            if next == reference {
                return;
            }
        }

        self.unlink(node);
        let Some(p) = self.node_mut(parent) else {
            return;
        };
        let slot = reference
            .and_then(|r| p.children.iter().position(|&c| c == r))
            .unwrap_or(p.children.len());
        p.children.insert(slot, node);
        if let Some(n) = self.node_mut(node) {
            n.parent = Some(parent);
        }
        self.revision += 1;
    }

    fn detach(&mut self, node: NodeId) {
        if self.unlink(node) {
            self.revision += 1;
        }
    }

    fn bounds(&self, node: NodeId) -> Option<Bounds> {
        self.node(node)?.bounds
    }
}

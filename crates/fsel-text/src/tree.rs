#![forbid(unsafe_code)]

//! Arena node tree.
//!
//! Node ids index into a slot vector; removed subtrees leave `None` slots so
//! stale ids never alias a newer node.

use fsel_core::{EditingStyle, NodeId, TextDirection};

/// Outer display type of an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Display {
    #[default]
    Block,
    Inline,
}

/// Element attributes relevant to selection.
#[derive(Debug, Clone, Default)]
pub struct ElementData {
    pub display: Display,
    /// `Some(true)` makes the subtree editable, `Some(false)` opts out,
    /// `None` inherits.
    pub editable: Option<bool>,
    /// Explicit base direction; `None` inherits or auto-detects.
    pub dir: Option<TextDirection>,
    pub style: EditingStyle,
    pub password: bool,
}

impl ElementData {
    pub fn block() -> Self {
        Self::default()
    }

    pub fn inline() -> Self {
        Self {
            display: Display::Inline,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn editable(mut self, editable: bool) -> Self {
        self.editable = Some(editable);
        self
    }

    #[must_use]
    pub fn dir(mut self, dir: TextDirection) -> Self {
        self.dir = Some(dir);
        self
    }

    #[must_use]
    pub fn style(mut self, style: EditingStyle) -> Self {
        self.style = style;
        self
    }

    #[must_use]
    pub fn password(mut self) -> Self {
        self.password = true;
        self
    }
}

#[derive(Debug, Clone)]
pub enum NodeKind {
    Element(ElementData),
    Text(String),
}

#[derive(Debug, Clone)]
pub(crate) struct NodeData {
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) kind: NodeKind,
}

#[derive(Debug, Clone)]
pub(crate) struct Tree {
    slots: Vec<Option<NodeData>>,
    root: NodeId,
}

impl Tree {
    pub(crate) fn new(root: ElementData) -> Self {
        Self {
            slots: vec![Some(NodeData {
                parent: None,
                children: Vec::new(),
                kind: NodeKind::Element(root),
            })],
            root: NodeId(0),
        }
    }

    pub(crate) fn root(&self) -> NodeId {
        self.root
    }

    pub(crate) fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn get(&self, id: NodeId) -> Option<&NodeData> {
        self.slots.get(id.0 as usize).and_then(Option::as_ref)
    }

    fn get_mut(&mut self, id: NodeId) -> Option<&mut NodeData> {
        self.slots.get_mut(id.0 as usize).and_then(Option::as_mut)
    }

    pub(crate) fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    pub(crate) fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.parent)
    }

    pub(crate) fn element(&self, id: NodeId) -> Option<&ElementData> {
        match &self.get(id)?.kind {
            NodeKind::Element(e) => Some(e),
            NodeKind::Text(_) => None,
        }
    }

    pub(crate) fn text(&self, id: NodeId) -> Option<&str> {
        match &self.get(id)?.kind {
            NodeKind::Text(t) => Some(t),
            NodeKind::Element(_) => None,
        }
    }

    /// Ancestors of `id`, nearest first, excluding `id` itself.
    pub(crate) fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), move |&n| self.parent(n))
    }

    pub(crate) fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        if !self.contains(node) {
            return false;
        }
        node == ancestor || self.ancestors(node).any(|a| a == ancestor)
    }

    /// Append a child; `None` if the parent is missing or is a text node.
    pub(crate) fn append(&mut self, parent: NodeId, kind: NodeKind) -> Option<NodeId> {
        self.element(parent)?;
        let id = NodeId(u32::try_from(self.slots.len()).ok()?);
        self.slots.push(Some(NodeData {
            parent: Some(parent),
            children: Vec::new(),
            kind,
        }));
        self.get_mut(parent)?.children.push(id);
        Some(id)
    }

    /// Detach and drop a subtree. The root cannot be removed.
    pub(crate) fn remove(&mut self, id: NodeId) -> bool {
        if id == self.root {
            return false;
        }
        let Some(parent) = self.parent(id) else {
            return false;
        };
        if let Some(p) = self.get_mut(parent) {
            p.children.retain(|&c| c != id);
        }
        let mut stack = vec![id];
        while let Some(n) = stack.pop() {
            if let Some(data) = self.slots.get_mut(n.0 as usize).and_then(Option::take) {
                stack.extend(data.children);
            }
        }
        true
    }

    pub(crate) fn text_mut(&mut self, id: NodeId) -> Option<&mut String> {
        match &mut self.get_mut(id)?.kind {
            NodeKind::Text(t) => Some(t),
            NodeKind::Element(_) => None,
        }
    }

    pub(crate) fn element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        match &mut self.get_mut(id)?.kind {
            NodeKind::Element(e) => Some(e),
            NodeKind::Text(_) => None,
        }
    }

    /// Pre-order traversal from the root.
    pub(crate) fn preorder(&self) -> Vec<NodeId> {
        let mut out = Vec::with_capacity(self.slots.len());
        let mut stack = vec![self.root];
        while let Some(n) = stack.pop() {
            out.push(n);
            if let Some(data) = self.get(n) {
                stack.extend(data.children.iter().rev().copied());
            }
        }
        out
    }

    /// Nearest block ancestor of a node (the root is always a block).
    pub(crate) fn containing_block(&self, id: NodeId) -> NodeId {
        self.ancestors(id)
            .find(|&a| {
                self.element(a)
                    .is_some_and(|e| e.display == Display::Block)
            })
            .unwrap_or(self.root)
    }
}

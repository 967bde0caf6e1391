//! Live document arena.
//!
//! Nodes live in a flat `Vec` and refer to each other by [`NodeId`]. Removed
//! nodes stay allocated so that mutation records can still describe them.
//! Only child-list changes are recorded; attribute writes are silent.

use crate::errors::DomError;
use crate::geometry::Rect;
use indexmap::IndexMap;
use tandem_semantics::{generate_uuid, DOM_CLASS_ATTRIBUTE, OID_ATTRIBUTE, UUID_ATTRIBUTE};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Document,
    Element(ElementData),
    Text(String),
    Comment(String),
    ShadowRoot { host: NodeId },
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ElementData {
    /// Lowercase tag name
    pub tag: String,
    pub attributes: IndexMap<String, String>,
    pub shadow_root: Option<NodeId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Display {
    #[default]
    Block,
    Inline,
    Flex,
    Grid {
        columns: usize,
        rows: usize,
    },
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    #[default]
    Visible,
    Hidden,
}

/// The computed style properties the mirror reads
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Style {
    pub display: Display,
    pub visibility: Visibility,
}

impl Style {
    pub fn hidden() -> Self {
        Self {
            display: Display::None,
            ..Self::default()
        }
    }

    pub fn grid(columns: usize, rows: usize) -> Self {
        Self {
            display: Display::Grid { columns, rows },
            ..Self::default()
        }
    }

    pub fn is_hidden(&self) -> bool {
        self.display == Display::None || self.visibility == Visibility::Hidden
    }
}

/// One child-list change on `target`
#[derive(Debug, Clone, PartialEq)]
pub struct MutationRecord {
    pub target: NodeId,
    pub added: Vec<NodeId>,
    pub removed: Vec<NodeId>,
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    rect: Rect,
    style: Style,
}

impl Node {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            parent: None,
            children: Vec::new(),
            rect: Rect::default(),
            style: Style::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LiveDocument {
    nodes: Vec<Node>,
    body: NodeId,
    records: Vec<MutationRecord>,
}

impl Default for LiveDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl LiveDocument {
    /// A document holding `html > body`
    pub fn new() -> Self {
        let mut doc = Self {
            nodes: vec![Node::new(NodeKind::Document)],
            body: NodeId(0),
            records: Vec::new(),
        };
        let html = doc.create_element("html");
        let body = doc.create_element("body");
        doc.attach(doc.root(), html, None);
        doc.attach(html, body, None);
        doc.body = body;
        doc
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn body(&self) -> NodeId {
        self.body
    }

    // ---------------------------------------------------------------------
    // Node creation
    // ---------------------------------------------------------------------

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.alloc(NodeKind::Element(ElementData {
            tag: tag.to_ascii_lowercase(),
            ..ElementData::default()
        }))
    }

    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.alloc(NodeKind::Text(text.to_string()))
    }

    pub fn create_comment(&mut self, text: &str) -> NodeId {
        self.alloc(NodeKind::Comment(text.to_string()))
    }

    /// Attach an open shadow root to `host`, or return the existing one
    pub fn attach_shadow(&mut self, host: NodeId) -> Result<NodeId, DomError> {
        if let Some(existing) = self.shadow_root(host) {
            return Ok(existing);
        }
        if !self.is_element(host) {
            return Err(DomError::UnknownNode(host));
        }
        let shadow = self.alloc(NodeKind::ShadowRoot { host });
        if let Some(NodeKind::Element(data)) = self.nodes.get_mut(host.0).map(|n| &mut n.kind) {
            data.shadow_root = Some(shadow);
        }
        Ok(shadow)
    }

    fn alloc(&mut self, kind: NodeKind) -> NodeId {
        self.nodes.push(Node::new(kind));
        NodeId(self.nodes.len() - 1)
    }

    // ---------------------------------------------------------------------
    // Tree mutation
    // ---------------------------------------------------------------------

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        self.insert_before(parent, child, None)
    }

    /// Insert `child` before `reference`, or at the end when `reference` is
    /// `None`. A child that already has a parent is moved.
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> Result<(), DomError> {
        self.node(parent)?;
        self.node(child)?;
        if self.contains(child, parent) || matches!(self.kind(child), Some(NodeKind::Document)) {
            return Err(DomError::HierarchyRequest { parent, child });
        }
        if let Some(reference) = reference {
            if self.parent(reference) != Some(parent) {
                return Err(DomError::NotAChild {
                    parent,
                    child: reference,
                });
            }
            if reference == child {
                return Ok(());
            }
        }

        if let Some(old_parent) = self.parent(child) {
            self.detach(old_parent, child);
        }
        self.attach(parent, child, reference);
        Ok(())
    }

    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        if self.parent(child) != Some(parent) {
            return Err(DomError::NotAChild { parent, child });
        }
        self.detach(parent, child);
        Ok(())
    }

    /// Detach `node` from its parent, if any
    pub fn remove(&mut self, node: NodeId) {
        if let Some(parent) = self.parent(node) {
            self.detach(parent, node);
        }
    }

    /// Change the value of a text node in place. Not a child-list change.
    pub fn set_text(&mut self, node: NodeId, text: &str) -> Result<(), DomError> {
        match self.nodes.get_mut(node.0).map(|n| &mut n.kind) {
            Some(NodeKind::Text(value)) => {
                *value = text.to_string();
                Ok(())
            }
            _ => Err(DomError::UnknownNode(node)),
        }
    }

    fn attach(&mut self, parent: NodeId, child: NodeId, reference: Option<NodeId>) {
        let position = reference
            .and_then(|r| self.nodes[parent.0].children.iter().position(|c| *c == r))
            .unwrap_or(self.nodes[parent.0].children.len());
        self.nodes[parent.0].children.insert(position, child);
        self.nodes[child.0].parent = Some(parent);
        self.records.push(MutationRecord {
            target: parent,
            added: vec![child],
            removed: Vec::new(),
        });
    }

    fn detach(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[parent.0].children.retain(|c| *c != child);
        self.nodes[child.0].parent = None;
        self.records.push(MutationRecord {
            target: parent,
            added: Vec::new(),
            removed: vec![child],
        });
    }

    /// Drain the child-list records accumulated since the last call
    pub fn take_records(&mut self) -> Vec<MutationRecord> {
        std::mem::take(&mut self.records)
    }

    // ---------------------------------------------------------------------
    // Node access
    // ---------------------------------------------------------------------

    fn node(&self, id: NodeId) -> Result<&Node, DomError> {
        self.nodes.get(id.0).ok_or(DomError::UnknownNode(id))
    }

    fn element(&self, id: NodeId) -> Option<&ElementData> {
        match self.kind(id)? {
            NodeKind::Element(data) => Some(data),
            _ => None,
        }
    }

    fn element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        match self.nodes.get_mut(id.0).map(|n| &mut n.kind)? {
            NodeKind::Element(data) => Some(data),
            _ => None,
        }
    }

    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.nodes.get(id.0).map(|n| &n.kind)
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        self.element(id).is_some()
    }

    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|data| data.tag.as_str())
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id.0)?.parent
    }

    /// Parent in the flattened tree: a shadow root resolves to its host
    pub fn composed_parent(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        match self.kind(parent)? {
            NodeKind::ShadowRoot { host } => Some(*host),
            _ => Some(parent),
        }
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id.0)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn element_children(&self, id: NodeId) -> Vec<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .filter(|c| self.is_element(*c))
            .collect()
    }

    /// Position of `id` among its parent's element children
    pub fn element_index(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.element_children(parent).iter().position(|c| *c == id)
    }

    /// Whether `node` is `ancestor` or one of its light-tree descendants
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// Whether `node` is connected to the document root
    pub fn is_connected(&self, node: NodeId) -> bool {
        let mut current = node;
        loop {
            match self.kind(current) {
                Some(NodeKind::Document) => return true,
                Some(NodeKind::ShadowRoot { host }) => current = *host,
                Some(_) => match self.parent(current) {
                    Some(parent) => current = parent,
                    None => return false,
                },
                None => return false,
            }
        }
    }

    /// Light-tree descendants of `id` in document order, `id` excluded
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev().copied());
        }
        out
    }

    /// Text of the direct text children, concatenated
    pub fn direct_text(&self, id: NodeId) -> String {
        self.children(id)
            .iter()
            .filter_map(|c| match self.kind(*c) {
                Some(NodeKind::Text(text)) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// First direct text child holding more than whitespace
    pub fn first_text_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).iter().copied().find(|c| {
            matches!(self.kind(*c), Some(NodeKind::Text(text)) if !text.trim().is_empty())
        })
    }

    /// Value of a text node
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match self.kind(id)? {
            NodeKind::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Text of every descendant text node, concatenated
    pub fn text_content(&self, id: NodeId) -> String {
        self.descendants(id)
            .into_iter()
            .filter_map(|c| match self.kind(c) {
                Some(NodeKind::Text(text)) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    // ---------------------------------------------------------------------
    // Attributes
    // ---------------------------------------------------------------------

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id)?.attributes.get(name).map(String::as_str)
    }

    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) {
        if let Some(data) = self.element_mut(id) {
            data.attributes.insert(name.to_string(), value.to_string());
        }
    }

    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> Option<String> {
        self.element_mut(id)?.attributes.shift_remove(name)
    }

    pub fn has_attribute(&self, id: NodeId, name: &str) -> bool {
        self.attribute(id, name).is_some()
    }

    pub fn classes(&self, id: NodeId) -> impl Iterator<Item = &str> {
        self.attribute(id, DOM_CLASS_ATTRIBUTE)
            .unwrap_or_default()
            .split_whitespace()
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.classes(id).any(|c| c == class)
    }

    pub fn oid(&self, id: NodeId) -> Option<&str> {
        self.attribute(id, OID_ATTRIBUTE)
    }

    // ---------------------------------------------------------------------
    // Layout
    // ---------------------------------------------------------------------

    pub fn set_rect(&mut self, id: NodeId, rect: Rect) {
        if let Some(node) = self.nodes.get_mut(id.0) {
            node.rect = rect;
        }
    }

    pub fn rect(&self, id: NodeId) -> Rect {
        self.nodes.get(id.0).map(|n| n.rect).unwrap_or_default()
    }

    pub fn set_style(&mut self, id: NodeId, style: Style) {
        if let Some(node) = self.nodes.get_mut(id.0) {
            node.style = style;
        }
    }

    pub fn style(&self, id: NodeId) -> Style {
        self.nodes.get(id.0).map(|n| n.style).unwrap_or_default()
    }

    // ---------------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------------

    pub fn shadow_root(&self, host: NodeId) -> Option<NodeId> {
        self.element(host)?.shadow_root
    }

    /// First connected element carrying `name="value"`, shadow trees included
    pub fn find_by_attribute(&self, name: &str, value: &str) -> Option<NodeId> {
        let mut stack = vec![self.root()];
        while let Some(id) = stack.pop() {
            if self.attribute(id, name) == Some(value) {
                return Some(id);
            }
            let children = self.children(id);
            stack.extend(children.iter().rev().copied());
            if let Some(shadow) = self.shadow_root(id) {
                stack.push(shadow);
            }
        }
        None
    }

    pub fn find_by_oid(&self, oid: &str) -> Option<NodeId> {
        self.find_by_attribute(OID_ATTRIBUTE, oid)
    }

    pub fn find_by_uuid(&self, uuid: &str) -> Option<NodeId> {
        self.find_by_attribute(UUID_ATTRIBUTE, uuid)
    }

    /// Every connected element whose attribute `name` is present
    pub fn elements_with_attribute(&self, name: &str) -> Vec<NodeId> {
        self.descendants(self.root())
            .into_iter()
            .filter(|id| self.has_attribute(*id, name))
            .collect()
    }

    /// Topmost visible element under the point within `scope`.
    ///
    /// Later elements in document order paint over earlier ones. Probing a
    /// shadow root that has nothing under the point yields its host when the
    /// host itself is under the point.
    pub fn element_from_point(&self, scope: NodeId, x: f64, y: f64) -> Option<NodeId> {
        let hit = self
            .descendants(scope)
            .into_iter()
            .filter(|id| self.is_element(*id))
            .filter(|id| !self.is_hidden_in_tree(*id, scope))
            .filter(|id| self.rect(*id).contains(x, y))
            .last();

        match (hit, self.kind(scope)) {
            (Some(hit), _) => Some(hit),
            (None, Some(NodeKind::ShadowRoot { host })) if self.rect(*host).contains(x, y) => {
                Some(*host)
            }
            _ => None,
        }
    }

    /// Hit test that descends through nested open shadow roots
    pub fn deep_element_from_point(&self, x: f64, y: f64) -> Option<NodeId> {
        let mut element = self.element_from_point(self.root(), x, y)?;
        while let Some(shadow) = self.shadow_root(element) {
            match self.element_from_point(shadow, x, y) {
                Some(inner) if inner != element => element = inner,
                _ => break,
            }
        }
        Some(element)
    }

    fn is_hidden_in_tree(&self, id: NodeId, scope: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if node == scope {
                return false;
            }
            if self.style(node).is_hidden() {
                return true;
            }
            current = self.parent(node);
        }
        false
    }
}

/// Return the runtime id of `node`, assigning a fresh one on first sight
pub fn ensure_uuid(doc: &mut LiveDocument, node: NodeId) -> Option<String> {
    if !doc.is_element(node) {
        return None;
    }
    if let Some(existing) = doc.attribute(node, UUID_ATTRIBUTE) {
        return Some(existing.to_string());
    }
    let uuid = generate_uuid();
    doc.set_attribute(node, UUID_ATTRIBUTE, &uuid);
    Some(uuid)
}

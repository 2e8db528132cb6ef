//! Arena-allocated document tree for page markup.
//!
//! Nodes live in one vector and link to each other by index, so the tree
//! can be walked and queried without reference counting. Node ids are
//! allocation order, not document order; use [`Dom::descendants`] for the
//! latter.

use html5ever::{LocalName, QualName, ns};

/// Index of a node in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Sentinel for a missing link.
    pub const NONE: NodeId = NodeId(u32::MAX);

    pub fn is_some(&self) -> bool {
        self.0 != u32::MAX
    }

    pub fn is_none(&self) -> bool {
        self.0 == u32::MAX
    }
}

/// Payload of a node.
#[derive(Debug, Clone)]
pub enum NodeData {
    Document,
    Element {
        name: QualName,
        attrs: Vec<Attribute>,
    },
    Text(String),
    Comment(String),
    Doctype {
        name: String,
    },
}

/// Element attribute. `name.prefix` is kept for `xlink:href` and friends.
#[derive(Debug, Clone)]
pub struct Attribute {
    pub name: QualName,
    pub value: String,
}

impl Attribute {
    /// Attribute name as written in markup (`prefix:local`).
    pub fn qualified_name(&self) -> String {
        match &self.name.prefix {
            Some(prefix) => format!("{}:{}", prefix, self.name.local),
            None => self.name.local.to_string(),
        }
    }
}

#[derive(Debug)]
pub struct Node {
    pub data: NodeData,
    pub parent: NodeId,
    pub first_child: NodeId,
    pub last_child: NodeId,
    pub prev_sibling: NodeId,
    pub next_sibling: NodeId,
}

impl Node {
    fn new(data: NodeData) -> Self {
        Self {
            data,
            parent: NodeId::NONE,
            first_child: NodeId::NONE,
            last_child: NodeId::NONE,
            prev_sibling: NodeId::NONE,
            next_sibling: NodeId::NONE,
        }
    }
}

/// Parsed page markup.
#[derive(Debug)]
pub struct Dom {
    nodes: Vec<Node>,
    document: NodeId,
}

impl Dom {
    /// Empty tree holding only the document root.
    pub fn new() -> Self {
        let mut dom = Self {
            nodes: Vec::new(),
            document: NodeId::NONE,
        };
        dom.document = dom.alloc(Node::new(NodeData::Document));
        dom
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    pub fn document(&self) -> NodeId {
        self.document
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        if id.is_none() {
            return None;
        }
        self.nodes.get(id.0 as usize)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        if id.is_none() {
            return None;
        }
        self.nodes.get_mut(id.0 as usize)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when only the document root exists.
    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    // ------------------------------------------------------------------
    // Construction
    // ------------------------------------------------------------------

    pub fn create_element(&mut self, name: QualName, attrs: Vec<Attribute>) -> NodeId {
        self.alloc(Node::new(NodeData::Element { name, attrs }))
    }

    /// Create an HTML-namespace element by local name.
    pub fn create_html_element(&mut self, local: &str) -> NodeId {
        self.create_element(QualName::new(None, ns!(html), LocalName::from(local)), Vec::new())
    }

    pub fn create_text(&mut self, text: String) -> NodeId {
        self.alloc(Node::new(NodeData::Text(text)))
    }

    pub fn create_comment(&mut self, text: String) -> NodeId {
        self.alloc(Node::new(NodeData::Comment(text)))
    }

    pub fn create_doctype(&mut self, name: String) -> NodeId {
        self.alloc(Node::new(NodeData::Doctype { name }))
    }

    /// Append `child` as the last child of `parent`.
    pub fn append(&mut self, parent: NodeId, child: NodeId) {
        let last_child = self.get(parent).map(|n| n.last_child).unwrap_or(NodeId::NONE);

        if let Some(node) = self.get_mut(child) {
            node.parent = parent;
            node.prev_sibling = last_child;
            node.next_sibling = NodeId::NONE;
        }
        if let Some(last) = self.get_mut(last_child) {
            last.next_sibling = child;
        }
        if let Some(parent_node) = self.get_mut(parent) {
            if parent_node.first_child.is_none() {
                parent_node.first_child = child;
            }
            parent_node.last_child = child;
        }
    }

    /// Insert `new_node` immediately before `sibling`.
    pub fn insert_before(&mut self, sibling: NodeId, new_node: NodeId) {
        let (parent, prev) = match self.get(sibling) {
            Some(n) => (n.parent, n.prev_sibling),
            None => return,
        };

        if let Some(node) = self.get_mut(new_node) {
            node.parent = parent;
            node.prev_sibling = prev;
            node.next_sibling = sibling;
        }
        if let Some(sib) = self.get_mut(sibling) {
            sib.prev_sibling = new_node;
        }
        if prev.is_some() {
            if let Some(p) = self.get_mut(prev) {
                p.next_sibling = new_node;
            }
        } else if let Some(par) = self.get_mut(parent) {
            par.first_child = new_node;
        }
    }

    /// Append text, merging into a trailing text node when there is one.
    pub fn append_text(&mut self, parent: NodeId, text: &str) {
        let last_child = self.get(parent).map(|n| n.last_child).unwrap_or(NodeId::NONE);
        if let Some(last) = self.get_mut(last_child)
            && let NodeData::Text(existing) = &mut last.data
        {
            existing.push_str(text);
            return;
        }

        let text_node = self.create_text(text.to_string());
        self.append(parent, text_node);
    }

    /// Unlink `target` from its parent and siblings. The subtree stays intact.
    pub fn detach(&mut self, target: NodeId) {
        let (parent, prev, next) = match self.get(target) {
            Some(n) => (n.parent, n.prev_sibling, n.next_sibling),
            None => return,
        };

        if prev.is_some() {
            if let Some(p) = self.get_mut(prev) {
                p.next_sibling = next;
            }
        } else if let Some(p) = self.get_mut(parent) {
            p.first_child = next;
        }

        if next.is_some() {
            if let Some(n) = self.get_mut(next) {
                n.prev_sibling = prev;
            }
        } else if let Some(p) = self.get_mut(parent) {
            p.last_child = prev;
        }

        if let Some(node) = self.get_mut(target) {
            node.parent = NodeId::NONE;
            node.prev_sibling = NodeId::NONE;
            node.next_sibling = NodeId::NONE;
        }
    }

    /// Move every child of `node` to the end of `new_parent`.
    pub fn reparent_children(&mut self, node: NodeId, new_parent: NodeId) {
        let children: Vec<_> = self.children(node).collect();
        for child in children {
            self.detach(child);
            self.append(new_parent, child);
        }
    }

    // ------------------------------------------------------------------
    // Traversal
    // ------------------------------------------------------------------

    pub fn children(&self, parent: NodeId) -> Children<'_> {
        let first = self.get(parent).map(|n| n.first_child).unwrap_or(NodeId::NONE);
        Children {
            dom: self,
            current: first,
        }
    }

    /// Element children only.
    pub fn element_children(&self, parent: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children(parent).filter(|&c| self.is_element(c))
    }

    /// All descendants of `root` in document (pre-)order, `root` excluded.
    pub fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(root).collect();
        stack.reverse();
        while let Some(id) = stack.pop() {
            out.push(id);
            let mut children: Vec<_> = self.children(id).collect();
            children.reverse();
            stack.extend(children);
        }
        out
    }

    /// True if `ancestor` is a proper ancestor of `node`.
    pub fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = self.get(node).map(|n| n.parent).unwrap_or(NodeId::NONE);
        while current.is_some() {
            if current == ancestor {
                return true;
            }
            current = self.get(current).map(|n| n.parent).unwrap_or(NodeId::NONE);
        }
        false
    }

    /// First node in document order matching `predicate`.
    pub fn find<F>(&self, predicate: F) -> Option<NodeId>
    where
        F: Fn(&Dom, NodeId) -> bool,
    {
        self.descendants(self.document)
            .into_iter()
            .find(|&id| predicate(self, id))
    }

    /// First element with local name `tag`.
    pub fn find_by_tag(&self, tag: &str) -> Option<NodeId> {
        self.find(|dom, id| dom.element_name(id) == Some(tag))
    }

    /// Elements under `root` with local name `tag`, in document order.
    pub fn find_all_by_tag(&self, root: NodeId, tag: &str) -> Vec<NodeId> {
        self.descendants(root)
            .into_iter()
            .filter(|&id| self.element_name(id) == Some(tag))
            .collect()
    }

    /// Elements under `root` carrying `class`, in document order.
    pub fn find_all_by_class(&self, root: NodeId, class: &str) -> Vec<NodeId> {
        self.descendants(root)
            .into_iter()
            .filter(|&id| self.has_class(id, class))
            .collect()
    }

    // ------------------------------------------------------------------
    // Element accessors
    // ------------------------------------------------------------------

    /// Local name of an element.
    pub fn element_name(&self, id: NodeId) -> Option<&str> {
        self.get(id).and_then(|n| match &n.data {
            NodeData::Element { name, .. } => Some(name.local.as_ref()),
            _ => None,
        })
    }

    pub fn attrs(&self, id: NodeId) -> &[Attribute] {
        self.get(id)
            .and_then(|n| match &n.data {
                NodeData::Element { attrs, .. } => Some(attrs.as_slice()),
                _ => None,
            })
            .unwrap_or(&[])
    }

    /// Attribute value by local name (`href` also matches `xlink:href`).
    pub fn attr(&self, id: NodeId, local: &str) -> Option<&str> {
        self.attrs(id)
            .iter()
            .find(|a| a.name.local.as_ref() == local)
            .map(|a| a.value.as_str())
    }

    /// Overwrite the attribute with local name `local`, or add it.
    pub fn set_attr(&mut self, id: NodeId, local: &str, value: impl Into<String>) {
        let value = value.into();
        if let Some(node) = self.get_mut(id)
            && let NodeData::Element { attrs, .. } = &mut node.data
        {
            match attrs.iter_mut().find(|a| a.name.local.as_ref() == local) {
                Some(attr) => attr.value = value,
                None => attrs.push(Attribute {
                    name: QualName::new(None, ns!(), LocalName::from(local)),
                    value,
                }),
            }
        }
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.attr(id, "class")
            .is_some_and(|classes| classes.split_ascii_whitespace().any(|c| c == class))
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        self.get(id)
            .is_some_and(|n| matches!(n.data, NodeData::Element { .. }))
    }

    /// Concatenated text of `id` and its descendants.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        if let Some(NodeData::Text(text)) = self.get(id).map(|n| &n.data) {
            out.push_str(text);
        }
        for node in self.descendants(id) {
            if let Some(NodeData::Text(text)) = self.get(node).map(|n| &n.data) {
                out.push_str(text);
            }
        }
        out
    }

    /// The `<body>` element, if the document has one.
    pub fn body(&self) -> Option<NodeId> {
        self.find_by_tag("body")
    }

    /// Trimmed text of the document's `<title>`, if non-empty.
    pub fn title(&self) -> Option<String> {
        let title = self.find_by_tag("title")?;
        let text = self.text_content(title);
        let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
        (!text.is_empty()).then_some(text)
    }
}

impl Default for Dom {
    fn default() -> Self {
        Self::new()
    }
}

pub struct Children<'a> {
    dom: &'a Dom,
    current: NodeId,
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current.is_none() {
            return None;
        }
        let id = self.current;
        self.current = self.dom.get(id).map(|n| n.next_sibling).unwrap_or(NodeId::NONE);
        Some(id)
    }
}

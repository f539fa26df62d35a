//! Arena document tree.
//!
//! A small stand-in for the browser DOM: elements, text nodes and zero-size
//! chunk markers, addressed by [`NodeId`]. It provides exactly the operations
//! the chunker and highlighter rely on: parsing, document-order traversal,
//! splitting text nodes and splicing nodes in between.
//!
//! Detached nodes stay in the arena (ids are never reused) but are no longer
//! reachable from the root.

mod token;

pub use token::{decode_entities, is_void, tokenize, Token};

use crate::render::escape_html;

/// Index of a node in its [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// Which side of a chunk a marker delimits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerKind {
    Start,
    End,
}

impl MarkerKind {
    fn class(self) -> &'static str {
        match self {
            MarkerKind::Start => "chunk-start",
            MarkerKind::End => "chunk-end",
        }
    }
}

/// Zero-size anchor recording a chunk boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Marker {
    pub kind: MarkerKind,
    pub chunk: usize,
}

impl Marker {
    pub fn start(chunk: usize) -> Self {
        Self {
            kind: MarkerKind::Start,
            chunk,
        }
    }

    pub fn end(chunk: usize) -> Self {
        Self {
            kind: MarkerKind::End,
            chunk,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attrs: Vec<(String, String)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Element(Element),
    Text(String),
    Marker(Marker),
}

#[derive(Debug, Clone)]
struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    kind: NodeKind,
}

/// A parsed document fragment hanging off a synthetic container root.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    const ROOT: NodeId = NodeId(0);

    /// Empty document containing only the container root.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                parent: None,
                children: Vec::new(),
                kind: NodeKind::Element(Element {
                    name: "#container".to_string(),
                    attrs: Vec::new(),
                }),
            }],
        }
    }

    /// Parse an HTML fragment.
    pub fn parse(html: &str) -> Self {
        Self::from_tokens(&tokenize(html)).0
    }

    /// Build a tree from tokens.
    ///
    /// Returns the document plus, for every token, the node it produced
    /// (text and open tags map to nodes; close tags map to `None`).
    pub fn from_tokens(tokens: &[Token]) -> (Self, Vec<Option<NodeId>>) {
        let mut doc = Self::new();
        let mut map = Vec::with_capacity(tokens.len());
        let mut stack: Vec<(NodeId, String)> = Vec::new();

        for token in tokens {
            let parent = stack.last().map(|(id, _)| *id).unwrap_or(Self::ROOT);
            match token {
                Token::Text(text) => {
                    map.push(Some(doc.append_child(parent, NodeKind::Text(text.clone()))));
                }
                Token::Open {
                    name,
                    attrs,
                    self_closing,
                } => {
                    let id = doc.append_child(
                        parent,
                        NodeKind::Element(Element {
                            name: name.clone(),
                            attrs: attrs.clone(),
                        }),
                    );
                    if !*self_closing && !is_void(name) {
                        stack.push((id, name.clone()));
                    }
                    map.push(Some(id));
                }
                Token::Close { name } => {
                    if let Some(pos) = stack.iter().rposition(|(_, open)| open == name) {
                        stack.truncate(pos);
                    }
                    map.push(None);
                }
            }
        }
        (doc, map)
    }

    pub fn root(&self) -> NodeId {
        Self::ROOT
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.0].kind
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// Text of a text node.
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id.0].kind {
            NodeKind::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn marker(&self, id: NodeId) -> Option<Marker> {
        match self.nodes[id.0].kind {
            NodeKind::Marker(marker) => Some(marker),
            _ => None,
        }
    }

    fn alloc(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            parent: None,
            children: Vec::new(),
            kind,
        });
        id
    }

    pub fn append_child(&mut self, parent: NodeId, kind: NodeKind) -> NodeId {
        let id = self.alloc(kind);
        self.nodes[id.0].parent = Some(parent);
        self.nodes[parent.0].children.push(id);
        id
    }

    pub fn prepend_child(&mut self, parent: NodeId, kind: NodeKind) -> NodeId {
        let id = self.alloc(kind);
        self.nodes[id.0].parent = Some(parent);
        self.nodes[parent.0].children.insert(0, id);
        id
    }

    /// Insert a new node immediately before `reference`.
    pub fn insert_before(&mut self, reference: NodeId, kind: NodeKind) -> Option<NodeId> {
        let parent = self.parent(reference)?;
        let pos = self.position_in_parent(reference)?;
        let id = self.alloc(kind);
        self.nodes[id.0].parent = Some(parent);
        self.nodes[parent.0].children.insert(pos, id);
        Some(id)
    }

    /// Insert a new node immediately after `reference`.
    pub fn insert_after(&mut self, reference: NodeId, kind: NodeKind) -> Option<NodeId> {
        let parent = self.parent(reference)?;
        let pos = self.position_in_parent(reference)?;
        let id = self.alloc(kind);
        self.nodes[id.0].parent = Some(parent);
        self.nodes[parent.0].children.insert(pos + 1, id);
        Some(id)
    }

    /// Remove a node (and its subtree) from the tree.
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.0].parent.take() {
            self.nodes[parent.0].children.retain(|c| *c != id);
        }
    }

    fn position_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.nodes[parent.0].children.iter().position(|c| *c == id)
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let pos = self.position_in_parent(id)?;
        self.nodes[parent.0].children.get(pos + 1).copied()
    }

    /// Split a text node at a byte offset.
    ///
    /// The original node keeps `[..offset]`; a new sibling holding
    /// `[offset..]` is inserted right after it and returned. Offsets that are
    /// out of range or not on a char boundary are rejected.
    pub fn split_text(&mut self, id: NodeId, offset: usize) -> Option<NodeId> {
        let text = self.text(id)?;
        if offset > text.len() || !text.is_char_boundary(offset) {
            return None;
        }
        let tail = text[offset..].to_string();
        let head = text[..offset].to_string();
        self.nodes[id.0].kind = NodeKind::Text(head);
        self.insert_after(id, NodeKind::Text(tail))
    }

    /// All attached nodes below the root, in document order.
    pub fn descendants(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(Self::ROOT).iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.children(id).iter().rev().copied());
        }
        out
    }

    /// Find an attached marker node.
    pub fn find_marker(&self, marker: Marker) -> Option<NodeId> {
        self.descendants()
            .into_iter()
            .find(|id| self.marker(*id) == Some(marker))
    }

    /// All attached markers in document order.
    pub fn markers(&self) -> Vec<(NodeId, Marker)> {
        self.descendants()
            .into_iter()
            .filter_map(|id| self.marker(id).map(|m| (id, m)))
            .collect()
    }

    /// Concatenated text of all attached text nodes.
    pub fn text_content(&self) -> String {
        self.descendants()
            .into_iter()
            .filter_map(|id| self.text(id))
            .collect()
    }

    /// Serialize the container's children back to HTML.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        for child in self.children(Self::ROOT) {
            self.write_node(*child, &mut out);
        }
        out
    }

    fn write_node(&self, id: NodeId, out: &mut String) {
        match &self.nodes[id.0].kind {
            NodeKind::Text(text) => out.push_str(&escape_html(text)),
            NodeKind::Marker(marker) => {
                out.push_str(&format!(
                    "<span class=\"{}\" data-chunk=\"{}\"></span>",
                    marker.kind.class(),
                    marker.chunk
                ));
            }
            NodeKind::Element(element) => {
                out.push('<');
                out.push_str(&element.name);
                for (key, value) in &element.attrs {
                    out.push(' ');
                    out.push_str(key);
                    out.push_str("=\"");
                    out.push_str(&escape_html(value));
                    out.push('"');
                }
                out.push('>');
                if is_void(&element.name) {
                    return;
                }
                for child in self.children(id) {
                    self.write_node(*child, out);
                }
                out.push_str("</");
                out.push_str(&element.name);
                out.push('>');
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_serialize_round_trip() {
        let html = "<div class=\"buffer-text\"><span class=\"s-normal\">Hello</span><br></div>";
        assert_eq!(Document::parse(html).to_html(), html);
    }

    #[test]
    fn unclosed_elements_are_closed_on_serialize() {
        let doc = Document::parse("<div><span>open");
        assert_eq!(doc.to_html(), "<div><span>open</span></div>");
    }

    #[test]
    fn stray_close_tag_is_ignored() {
        let doc = Document::parse("a</span>b");
        assert_eq!(doc.text_content(), "ab");
    }

    #[test]
    fn token_map_points_at_nodes() {
        let tokens = tokenize("<p>one</p>two");
        let (doc, map) = Document::from_tokens(&tokens);
        assert_eq!(map.len(), 4);
        assert_eq!(doc.text(map[1].unwrap()), Some("one"));
        assert!(map[2].is_none());
        assert_eq!(doc.text(map[3].unwrap()), Some("two"));
    }

    #[test]
    fn split_text_inserts_sibling() {
        let mut doc = Document::parse("<p>Hello world</p>");
        let text = doc
            .descendants()
            .into_iter()
            .find(|id| doc.text(*id).is_some())
            .unwrap();
        let tail = doc.split_text(text, 5).unwrap();
        assert_eq!(doc.text(text), Some("Hello"));
        assert_eq!(doc.text(tail), Some(" world"));
        assert_eq!(doc.next_sibling(text), Some(tail));
        assert_eq!(doc.text_content(), "Hello world");
    }

    #[test]
    fn split_text_rejects_bad_offsets() {
        let mut doc = Document::parse("héllo");
        let text = doc.children(doc.root())[0];
        assert!(doc.split_text(text, 2).is_none());
        assert!(doc.split_text(text, 99).is_none());
    }

    #[test]
    fn markers_serialize_as_empty_spans() {
        let mut doc = Document::parse("text");
        let root = doc.root();
        doc.prepend_child(root, NodeKind::Marker(Marker::start(0)));
        assert_eq!(
            doc.to_html(),
            "<span class=\"chunk-start\" data-chunk=\"0\"></span>text"
        );
        assert!(doc.find_marker(Marker::start(0)).is_some());
        assert!(doc.find_marker(Marker::end(0)).is_none());
    }

    #[test]
    fn detached_nodes_are_unreachable() {
        let mut doc = Document::parse("<b>x</b>y");
        let bold = doc.children(doc.root())[0];
        doc.detach(bold);
        assert_eq!(doc.text_content(), "y");
    }
}

//! Arena-backed node tree shared by the reader, printer and rule loader.
//!
//! A [`Document`] owns every [`Node`] produced by one read operation. Nodes
//! reference their children by [`NodeId`], so the reader's open-collection
//! stack is a plain stack of indices and no node ever points back at its
//! parent. [`NodeRef`] is the borrowed cursor callers use to walk the tree.

use serde::{Serialize, Serializer};
use std::fmt;

/// Index of a node inside its owning [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Position of the node in the document arena.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// Type tag of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// The `nil` atom.
    Nil,
    /// `true` or `false`.
    Bool,
    /// A character literal such as `\a` or `\newline`.
    Char,
    /// An integer literal.
    Int,
    /// A floating point literal.
    Float,
    /// A double-quoted string.
    String,
    /// A bare identifier.
    Symbol,
    /// A `:`-prefixed identifier.
    Keyword,
    /// `( ... )`
    List,
    /// `[ ... ]`
    Vector,
    /// `{ ... }`, read as alternating keys and values.
    Map,
    /// `#{ ... }`
    Set,
}

impl NodeKind {
    /// Lower-case type name used in diagnostics.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Nil => "nil",
            Self::Bool => "bool",
            Self::Char => "char",
            Self::Int => "int",
            Self::Float => "float",
            Self::String => "string",
            Self::Symbol => "symbol",
            Self::Keyword => "keyword",
            Self::List => "list",
            Self::Vector => "vector",
            Self::Map => "map",
            Self::Set => "set",
        }
    }

    /// Whether nodes of this kind own child nodes.
    #[must_use]
    pub const fn is_collection(self) -> bool {
        matches!(self, Self::List | Self::Vector | Self::Map | Self::Set)
    }

    /// Opening and closing delimiters of a collection kind.
    #[must_use]
    pub const fn delimiters(self) -> Option<(&'static str, &'static str)> {
        match self {
            Self::List => Some(("(", ")")),
            Self::Vector => Some(("[", "]")),
            Self::Map => Some(("{", "}")),
            Self::Set => Some(("#{", "}")),
            _ => None,
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One parsed value.
///
/// Collection variants hold the ids of their children in source order. A
/// [`Node::Map`] holds keys and values alternately.
#[derive(Debug, Clone)]
pub enum Node {
    /// The `nil` atom.
    Nil,
    /// A boolean atom.
    Bool(bool),
    /// A character atom.
    Char(char),
    /// An integer atom.
    Int(i64),
    /// A floating point atom.
    Float(f64),
    /// A string atom with escapes already resolved.
    String(String),
    /// A symbol; dotted names such as `a.b.c` stay whole.
    Symbol(String),
    /// A keyword, stored without its leading colon.
    Keyword(String),
    /// A list of children.
    List(Vec<NodeId>),
    /// A vector of children.
    Vector(Vec<NodeId>),
    /// Alternating keys and values.
    Map(Vec<NodeId>),
    /// A set of children.
    Set(Vec<NodeId>),
}

static FALLBACK: Node = Node::Nil;

impl Node {
    /// Type tag of this node.
    #[must_use]
    pub const fn kind(&self) -> NodeKind {
        match self {
            Self::Nil => NodeKind::Nil,
            Self::Bool(_) => NodeKind::Bool,
            Self::Char(_) => NodeKind::Char,
            Self::Int(_) => NodeKind::Int,
            Self::Float(_) => NodeKind::Float,
            Self::String(_) => NodeKind::String,
            Self::Symbol(_) => NodeKind::Symbol,
            Self::Keyword(_) => NodeKind::Keyword,
            Self::List(_) => NodeKind::List,
            Self::Vector(_) => NodeKind::Vector,
            Self::Map(_) => NodeKind::Map,
            Self::Set(_) => NodeKind::Set,
        }
    }

    /// An empty collection of `kind`, or `None` for atom kinds.
    #[must_use]
    pub const fn empty(kind: NodeKind) -> Option<Self> {
        match kind {
            NodeKind::List => Some(Self::List(Vec::new())),
            NodeKind::Vector => Some(Self::Vector(Vec::new())),
            NodeKind::Map => Some(Self::Map(Vec::new())),
            NodeKind::Set => Some(Self::Set(Vec::new())),
            _ => None,
        }
    }

    fn child_ids(&self) -> &[NodeId] {
        match self {
            Self::List(ids) | Self::Vector(ids) | Self::Map(ids) | Self::Set(ids) => ids,
            _ => &[],
        }
    }

    fn child_ids_mut(&mut self) -> Option<&mut Vec<NodeId>> {
        match self {
            Self::List(ids) | Self::Vector(ids) | Self::Map(ids) | Self::Set(ids) => Some(ids),
            _ => None,
        }
    }

    /// Copy of this node with any children detached.
    fn detached(&self) -> Self {
        match self {
            Self::List(_) => Self::List(Vec::new()),
            Self::Vector(_) => Self::Vector(Vec::new()),
            Self::Map(_) => Self::Map(Vec::new()),
            Self::Set(_) => Self::Set(Vec::new()),
            atom => atom.clone(),
        }
    }
}

/// An arena of nodes with a designated root.
///
/// Documents produced by the reader always have a [`NodeKind::Vector`] root
/// wrapping the top-level forms of the input.
///
/// # Examples
///
/// ```
/// use aa::eden::{Document, Node, NodeKind};
///
/// let mut doc = Document::default();
/// let list = doc.push(doc.root_id(), Node::List(Vec::new())).expect("root is a vector");
/// doc.push(list, Node::Symbol("a".into())).expect("list accepts children");
/// assert_eq!(doc.forms().next().map(|n| n.kind()), Some(NodeKind::List));
/// ```
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    root: NodeId,
}

impl Default for Document {
    fn default() -> Self {
        Self::new(Node::Vector(Vec::new()))
    }
}

impl Document {
    /// Create a document whose root is `root`.
    ///
    /// Collection roots start empty; any ids they carry are discarded.
    #[must_use]
    pub fn new(root: Node) -> Self {
        Self {
            nodes: vec![root.detached()],
            root: NodeId(0),
        }
    }

    /// Id of the root node.
    #[must_use]
    pub const fn root_id(&self) -> NodeId {
        self.root
    }

    /// Cursor on the root node.
    #[must_use]
    pub fn root(&self) -> NodeRef<'_> {
        self.get(self.root).unwrap_or(NodeRef {
            doc: self,
            id: self.root,
            node: &FALLBACK,
        })
    }

    /// Cursor on the node `id`, if it belongs to this document.
    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<NodeRef<'_>> {
        self.nodes.get(id.0).map(|node| NodeRef {
            doc: self,
            id,
            node,
        })
    }

    /// Children of the root, i.e. the top-level forms of a read document.
    pub fn forms(&self) -> Children<'_> {
        self.root().children()
    }

    /// Number of nodes in the arena.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Documents always hold at least their root.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Append `node` as the last child of `parent`.
    ///
    /// Collection nodes are attached empty; populate them with further
    /// pushes. Returns `None` when `parent` is not a collection of this
    /// document.
    pub fn push(&mut self, parent: NodeId, node: Node) -> Option<NodeId> {
        let id = NodeId(self.nodes.len());
        self.nodes
            .get_mut(parent.0)
            .and_then(Node::child_ids_mut)?
            .push(id);
        self.nodes.push(node.detached());
        Some(id)
    }

    /// Deep-copy the subtree rooted at `id` into a standalone document.
    #[must_use]
    pub fn extract(&self, id: NodeId) -> Option<Self> {
        self.get(id).map(NodeRef::to_document)
    }

    fn copy_children(&mut self, parent: NodeId, source: NodeRef<'_>) {
        for child in source.children() {
            if let Some(id) = self.push(parent, child.node.detached()) {
                self.copy_children(id, child);
            }
        }
    }
}

impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        self.root() == other.root()
    }
}

impl Serialize for Document {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::printer::print(self.root(), 1))
    }
}

/// Borrowed view of one node inside a [`Document`].
#[derive(Clone, Copy)]
pub struct NodeRef<'a> {
    doc: &'a Document,
    id: NodeId,
    node: &'a Node,
}

impl<'a> NodeRef<'a> {
    /// Id of the node in its document.
    #[must_use]
    pub const fn id(self) -> NodeId {
        self.id
    }

    /// The underlying node.
    #[must_use]
    pub const fn node(self) -> &'a Node {
        self.node
    }

    /// Type tag of the node.
    #[must_use]
    pub const fn kind(self) -> NodeKind {
        self.node.kind()
    }

    /// Payload of a [`NodeKind::String`] node.
    #[must_use]
    pub fn as_str(self) -> Option<&'a str> {
        match self.node {
            Node::String(text) => Some(text),
            _ => None,
        }
    }

    /// Payload of a [`NodeKind::Symbol`] node.
    #[must_use]
    pub fn as_symbol(self) -> Option<&'a str> {
        match self.node {
            Node::Symbol(text) => Some(text),
            _ => None,
        }
    }

    /// Payload of a [`NodeKind::Keyword`] node, without the colon.
    #[must_use]
    pub fn as_keyword(self) -> Option<&'a str> {
        match self.node {
            Node::Keyword(text) => Some(text),
            _ => None,
        }
    }

    /// Text of a string or symbol, the two forms names may take.
    #[must_use]
    pub fn as_name(self) -> Option<&'a str> {
        self.as_str().or_else(|| self.as_symbol())
    }

    /// Payload of a [`NodeKind::Char`] node.
    #[must_use]
    pub const fn as_char(self) -> Option<char> {
        match self.node {
            Node::Char(c) => Some(*c),
            _ => None,
        }
    }

    /// Payload of a [`NodeKind::Int`] node.
    #[must_use]
    pub const fn as_int(self) -> Option<i64> {
        match self.node {
            Node::Int(value) => Some(*value),
            _ => None,
        }
    }

    /// Payload of a [`NodeKind::Float`] node.
    #[must_use]
    pub const fn as_float(self) -> Option<f64> {
        match self.node {
            Node::Float(value) => Some(*value),
            _ => None,
        }
    }

    /// Payload of a [`NodeKind::Bool`] node.
    #[must_use]
    pub const fn as_bool(self) -> Option<bool> {
        match self.node {
            Node::Bool(value) => Some(*value),
            _ => None,
        }
    }

    /// Children in source order; empty for atoms.
    #[must_use]
    pub fn children(self) -> Children<'a> {
        Children {
            doc: self.doc,
            ids: self.node.child_ids().iter(),
        }
    }

    /// Number of children; zero for atoms.
    #[must_use]
    pub fn len(self) -> usize {
        self.node.child_ids().len()
    }

    /// Whether the node has no children.
    #[must_use]
    pub fn is_empty(self) -> bool {
        self.node.child_ids().is_empty()
    }

    /// Deep copy of this subtree as a standalone document.
    #[must_use]
    pub fn to_document(self) -> Document {
        let mut copy = Document::new(self.node.detached());
        let root = copy.root;
        copy.copy_children(root, self);
        copy
    }

    /// Children consumed two at a time as key/value pairs.
    ///
    /// A trailing key without a value is yielded with `None`.
    #[must_use]
    pub fn pairs(self) -> Pairs<'a> {
        Pairs {
            children: self.children(),
        }
    }
}

impl fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&super::printer::print(*self, 1))
    }
}

impl PartialEq for NodeRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        let atoms_match = match (self.node, other.node) {
            (Node::Nil, Node::Nil) => true,
            (Node::Bool(a), Node::Bool(b)) => a == b,
            (Node::Char(a), Node::Char(b)) => a == b,
            (Node::Int(a), Node::Int(b)) => a == b,
            (Node::Float(a), Node::Float(b)) => a.to_bits() == b.to_bits(),
            (Node::String(a), Node::String(b))
            | (Node::Symbol(a), Node::Symbol(b))
            | (Node::Keyword(a), Node::Keyword(b)) => a == b,
            (a, b) => a.kind() == b.kind(),
        };
        atoms_match && self.len() == other.len() && self.children().eq(other.children())
    }
}

/// Iterator over the children of a collection node.
#[derive(Clone)]
pub struct Children<'a> {
    doc: &'a Document,
    ids: std::slice::Iter<'a, NodeId>,
}

impl<'a> Iterator for Children<'a> {
    type Item = NodeRef<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let id = *self.ids.next()?;
        self.doc.get(id)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.ids.size_hint()
    }
}

/// Iterator over the key/value pairs of a map node.
#[derive(Clone)]
pub struct Pairs<'a> {
    children: Children<'a>,
}

impl<'a> Iterator for Pairs<'a> {
    type Item = (NodeRef<'a>, Option<NodeRef<'a>>);

    fn next(&mut self) -> Option<Self::Item> {
        let key = self.children.next()?;
        Some((key, self.children.next()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Document {
        let mut doc = Document::default();
        let root = doc.root_id();
        let map = doc.push(root, Node::Map(Vec::new())).expect("map");
        doc.push(map, Node::Keyword("a".into())).expect("key");
        doc.push(map, Node::Int(1)).expect("value");
        doc.push(map, Node::Keyword("dangling".into())).expect("key");
        doc
    }

    #[test]
    fn push_rejects_atom_parents() {
        let mut doc = Document::default();
        let sym = doc
            .push(doc.root_id(), Node::Symbol("x".into()))
            .expect("symbol");
        assert!(doc.push(sym, Node::Nil).is_none());
    }

    #[test]
    fn pushed_collections_start_empty() {
        let mut doc = Document::default();
        let bogus = vec![NodeId(42)];
        let list = doc.push(doc.root_id(), Node::List(bogus)).expect("list");
        assert!(doc.get(list).expect("list node").is_empty());
    }

    #[test]
    fn pairs_report_dangling_key() {
        let doc = sample();
        let map = doc.forms().next().expect("map form");
        let pairs: Vec<_> = map
            .pairs()
            .map(|(k, v)| (k.as_keyword(), v.and_then(NodeRef::as_int)))
            .collect();
        assert_eq!(pairs, vec![(Some("a"), Some(1)), (Some("dangling"), None)]);
    }

    #[test]
    fn extract_copies_subtree() {
        let doc = sample();
        let map_id = doc.forms().next().expect("map form").id();
        let copy = doc.extract(map_id).expect("extract");
        assert_eq!(copy.root().kind(), NodeKind::Map);
        assert_eq!(copy.root().len(), 3);
        assert_eq!(copy.root(), doc.get(map_id).expect("map"));
    }

    #[test]
    fn equality_is_structural() {
        let mut a = Document::default();
        a.push(a.root_id(), Node::Int(1)).expect("int");
        let mut b = Document::default();
        b.push(b.root_id(), Node::Int(1)).expect("int");
        assert_eq!(a, b);
        b.push(b.root_id(), Node::Int(2)).expect("int");
        assert_ne!(a, b);
    }

    #[test]
    fn accessors_reject_mismatched_kinds() {
        let mut doc = Document::default();
        let id = doc
            .push(doc.root_id(), Node::Keyword("k".into()))
            .expect("keyword");
        let node = doc.get(id).expect("node");
        assert_eq!(node.as_keyword(), Some("k"));
        assert_eq!(node.as_str(), None);
        assert_eq!(node.as_symbol(), None);
        assert_eq!(node.children().count(), 0);
    }
}

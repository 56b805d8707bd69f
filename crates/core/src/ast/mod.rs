//! The Courier abstract syntax tree.
//!
//! Nodes live in a flat arena owned by [`Ast`] and refer to each other by
//! [`NodeId`]. Every node except the root records its parent; a node's
//! structural children and its leading comments are kept in separate lists
//! so comments can be enumerated first.
//!
//! The parser allocates a node as soon as a production is confirmed and
//! attaches it to its parent only when the production completes. Nodes of a
//! failed production are removed again with [`Ast::discard_from`].

mod dump;
mod visit;

pub use visit::{Phase, Visitor};

use serde::Serialize;
use std::fmt;

use crate::token::Location;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Private,
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Visibility::Public => f.write_str("public"),
            Visibility::Private => f.write_str("private"),
        }
    }
}

/// Every kind of node, with its scalar payload. Structural children are
/// held by the [`Node`], not by the payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind")]
pub enum NodeKind {
    Comment { text: String },

    // -- Values ---------------------------------------------------
    IntegerLiteral { value: String },
    DecimalLiteral { value: String },
    HexLiteral { value: String },
    BinaryLiteral { value: String },
    BooleanLiteral { value: String },
    StringLiteral { value: String },
    /// Children: the elements, in order.
    ArrayLiteral,
    Nil,
    Variable { name: String, type_name: Option<String> },
    /// A receiver or operand; a dotted chain `a.b.c` is one instance.
    Instance { name: String, type_name: Option<String> },
    Tuple { fields: Vec<String> },
    NamedTuple { fields: Vec<(String, String)> },

    // -- Expressions ----------------------------------------------
    /// Children: the wrapped expression.
    GroupedExpression,
    /// Children: the parameters. The optional return value is filled in by
    /// later passes, see [`Ast::set_return_value`].
    Message {
        name: String,
        #[serde(skip)]
        return_value: Option<NodeId>,
    },
    /// Children: receiver, then the `Message`.
    SendMessage,
    /// Children: target `Variable` or `Instance`, then a `:=` `Message`
    /// holding exactly one parameter.
    Assignment,
    /// Children: the returned value.
    ReturnExpression,

    // -- Declarations and blocks ----------------------------------
    Param { name: String, type_name: String },
    /// `name` is `None` for closures. Children: the `Param`s, then an
    /// optional `Tuple`/`NamedTuple` return type.
    MessageDeclaration { name: Option<String> },
    /// Children: the `MessageDeclaration`, then the `StatementsBlock`.
    MessageBlock,
    /// Children: member `Variable`s.
    Scope { visibility: Visibility },
    /// Children: `Scope`s and `MessageBlock`s in source order.
    ClassBlock { name: String, superclass: Option<String> },
    /// Children: member `Variable`s.
    RecordBlock { name: String, superclass: Option<String> },
    StatementsBlock,
    /// Children: nested namespaces, or a single `StatementsBlock`.
    NamespaceBlock { name: String },
    /// Children: namespaces, or a single `StatementsBlock`.
    CodeFragmentBlock,
    /// Children: the `CodeFragmentBlock`.
    ModuleBlock { name: String, version: Option<String> },
}

impl NodeKind {
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Comment { .. } => "Comment",
            NodeKind::IntegerLiteral { .. } => "IntegerLiteral",
            NodeKind::DecimalLiteral { .. } => "DecimalLiteral",
            NodeKind::HexLiteral { .. } => "HexLiteral",
            NodeKind::BinaryLiteral { .. } => "BinaryLiteral",
            NodeKind::BooleanLiteral { .. } => "BooleanLiteral",
            NodeKind::StringLiteral { .. } => "StringLiteral",
            NodeKind::ArrayLiteral => "ArrayLiteral",
            NodeKind::Nil => "Nil",
            NodeKind::Variable { .. } => "Variable",
            NodeKind::Instance { .. } => "Instance",
            NodeKind::Tuple { .. } => "Tuple",
            NodeKind::NamedTuple { .. } => "NamedTuple",
            NodeKind::GroupedExpression => "GroupedExpression",
            NodeKind::Message { .. } => "Message",
            NodeKind::SendMessage => "SendMessage",
            NodeKind::Assignment => "Assignment",
            NodeKind::ReturnExpression => "ReturnExpression",
            NodeKind::Param { .. } => "Param",
            NodeKind::MessageDeclaration { .. } => "MessageDeclaration",
            NodeKind::MessageBlock => "MessageBlock",
            NodeKind::Scope { .. } => "Scope",
            NodeKind::ClassBlock { .. } => "ClassBlock",
            NodeKind::RecordBlock { .. } => "RecordBlock",
            NodeKind::StatementsBlock => "StatementsBlock",
            NodeKind::NamespaceBlock { .. } => "NamespaceBlock",
            NodeKind::CodeFragmentBlock => "CodeFragmentBlock",
            NodeKind::ModuleBlock { .. } => "ModuleBlock",
        }
    }

    /// Kinds visited a second time, with [`Phase::Exit`], after their
    /// children.
    pub fn is_container(&self) -> bool {
        matches!(
            self,
            NodeKind::MessageBlock
                | NodeKind::Scope { .. }
                | NodeKind::ClassBlock { .. }
                | NodeKind::RecordBlock { .. }
                | NodeKind::StatementsBlock
                | NodeKind::NamespaceBlock { .. }
                | NodeKind::CodeFragmentBlock
                | NodeKind::ModuleBlock { .. }
        )
    }

    /// Kinds that collect the comments met while they are being parsed.
    pub fn accepts_comments(&self) -> bool {
        self.is_container()
    }

    /// One-line description used in tree dumps.
    pub fn describe(&self) -> String {
        match self {
            NodeKind::Comment { text } => format!("Comment {}", text),
            NodeKind::IntegerLiteral { value }
            | NodeKind::DecimalLiteral { value }
            | NodeKind::HexLiteral { value }
            | NodeKind::BinaryLiteral { value }
            | NodeKind::BooleanLiteral { value } => format!("{} {}", self.name(), value),
            NodeKind::StringLiteral { value } => format!("StringLiteral \"{}\"", value),
            NodeKind::Variable { name, type_name } | NodeKind::Instance { name, type_name } => {
                match type_name {
                    Some(t) => format!("{} {} : {}", self.name(), name, t),
                    None => format!("{} {}", self.name(), name),
                }
            }
            NodeKind::Tuple { fields } => format!("Tuple [{}]", fields.join(", ")),
            NodeKind::NamedTuple { fields } => {
                let fields: Vec<String> = fields.iter().map(|(n, t)| format!("{}:{}", n, t)).collect();
                format!("NamedTuple [{}]", fields.join(", "))
            }
            NodeKind::Message { name, .. } => format!("Message {}", name),
            NodeKind::Param { name, type_name } => format!("Param {} : {}", name, type_name),
            NodeKind::MessageDeclaration { name } => {
                format!("MessageDeclaration {}", name.as_deref().unwrap_or("closure"))
            }
            NodeKind::Scope { visibility } => format!("Scope {}", visibility),
            NodeKind::ClassBlock { name, superclass } | NodeKind::RecordBlock { name, superclass } => {
                match superclass {
                    Some(s) => format!("{} {} inherits {}", self.name(), name, s),
                    None => format!("{} {}", self.name(), name),
                }
            }
            NodeKind::NamespaceBlock { name } => format!("NamespaceBlock {}", name),
            NodeKind::ModuleBlock { name, version } => match version {
                Some(v) => format!("ModuleBlock {} {}", name, v),
                None => format!("ModuleBlock {}", name),
            },
            _ => self.name().to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    kind: NodeKind,
    location: Location,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    comments: Vec<NodeId>,
    flags: Option<Vec<String>>,
}

impl Node {
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn location(&self) -> Location {
        self.location
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Structural children in declaration order. A message's return value,
    /// when set, comes after its parameters.
    pub fn children(&self) -> impl Iterator<Item = NodeId> + '_ {
        let extra = match &self.kind {
            NodeKind::Message { return_value, .. } => *return_value,
            _ => None,
        };
        self.children.iter().copied().chain(extra)
    }

    pub fn comments(&self) -> &[NodeId] {
        &self.comments
    }

    /// Compiler flags given with an `@` prefix; `Some(&[])` for a bare `@`.
    pub fn flags(&self) -> Option<&[String]> {
        self.flags.as_deref()
    }
}

/// The tree for one compilation unit.
#[derive(Debug, Clone, PartialEq)]
pub struct Ast {
    file: String,
    nodes: Vec<Node>,
    root: Option<NodeId>,
}

impl Ast {
    pub fn new(file: &str) -> Self {
        Ast {
            file: file.to_owned(),
            nodes: Vec::new(),
            root: None,
        }
    }

    pub fn file(&self) -> &str {
        &self.file
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    /// Panics if `id` does not belong to this tree.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.node(id).kind
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.node(id).children().collect()
    }

    /// Children of `id` whose kind name is `kind`, e.g. `"Scope"`.
    pub fn children_named(&self, id: NodeId, kind: &str) -> Vec<NodeId> {
        self.node(id)
            .children()
            .filter(|c| self.kind(*c).name() == kind)
            .collect()
    }

    pub fn comments(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).comments
    }

    pub fn flags(&self, id: NodeId) -> Option<&[String]> {
        self.node(id).flags()
    }

    /// All node ids, in allocation order.
    pub fn ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.nodes.len() as u32).map(NodeId)
    }

    /// Fill the return-value slot of a `Message`. `value` must be a detached
    /// node of this tree. Returns `false` and leaves the tree untouched
    /// otherwise.
    pub fn set_return_value(&mut self, message: NodeId, value: NodeId) -> bool {
        if message == value
            || self.get(value).map_or(true, |n| n.parent.is_some())
            || Some(value) == self.root
        {
            return false;
        }
        match self.nodes.get_mut(message.index()).map(|n| &mut n.kind) {
            Some(NodeKind::Message { return_value, .. }) if return_value.is_none() => {
                *return_value = Some(value);
            }
            _ => return false,
        }
        self.nodes[value.index()].parent = Some(message);
        true
    }

    // -- Construction (parser only) ------------------------------

    pub(crate) fn alloc(&mut self, kind: NodeKind, location: Location) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            kind,
            location,
            parent: None,
            children: Vec::new(),
            comments: Vec::new(),
            flags: None,
        });
        id
    }

    /// Transfer ownership of `child` to `parent`.
    pub(crate) fn attach(&mut self, parent: NodeId, child: NodeId) {
        debug_assert!(self.nodes[child.index()].parent.is_none());
        self.nodes[child.index()].parent = Some(parent);
        self.nodes[parent.index()].children.push(child);
    }

    pub(crate) fn attach_comment(&mut self, parent: NodeId, comment: NodeId) {
        self.nodes[comment.index()].parent = Some(parent);
        self.nodes[parent.index()].comments.push(comment);
    }

    pub(crate) fn set_flags(&mut self, id: NodeId, flags: Vec<String>) {
        self.nodes[id.index()].flags = Some(flags);
    }

    pub(crate) fn set_root(&mut self, id: NodeId) {
        self.root = Some(id);
    }

    /// Destroy every node allocated at or after `mark`, together with any
    /// reference older nodes hold to them. Returns the kind name of the
    /// first destroyed node.
    pub(crate) fn discard_from(&mut self, mark: usize) -> Option<&'static str> {
        if mark >= self.nodes.len() {
            return None;
        }
        let first = self.nodes[mark].kind.name();
        self.nodes.truncate(mark);
        let live = |id: &NodeId| id.index() < mark;
        for node in &mut self.nodes {
            node.children.retain(live);
            node.comments.retain(live);
            if let NodeKind::Message { return_value, .. } = &mut node.kind {
                if return_value.is_some_and(|v| !live(&v)) {
                    *return_value = None;
                }
            }
        }
        if self.root.is_some_and(|r| !live(&r)) {
            self.root = None;
        }
        Some(first)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc() -> Location {
        Location::default()
    }

    #[test]
    fn attach_sets_parent_and_order() {
        let mut ast = Ast::new("t.cour");
        let block = ast.alloc(NodeKind::StatementsBlock, loc());
        let a = ast.alloc(NodeKind::Nil, loc());
        let b = ast.alloc(NodeKind::Nil, loc());
        ast.attach(block, a);
        ast.attach(block, b);
        assert_eq!(ast.children(block), vec![a, b]);
        assert_eq!(ast.parent(a), Some(block));
        assert_eq!(ast.parent(block), None);
    }

    #[test]
    fn discard_scrubs_references_to_removed_nodes() {
        let mut ast = Ast::new("t.cour");
        let outer = ast.alloc(NodeKind::StatementsBlock, loc());
        ast.set_root(outer);
        let kept = ast.alloc(NodeKind::Nil, loc());
        ast.attach(outer, kept);
        let mark = ast.len();
        let class = ast.alloc(
            NodeKind::ClassBlock {
                name: "A".into(),
                superclass: None,
            },
            loc(),
        );
        let comment = ast.alloc(NodeKind::Comment { text: "# c".into() }, loc());
        ast.attach_comment(outer, comment);
        let scope = ast.alloc(
            NodeKind::Scope {
                visibility: Visibility::Public,
            },
            loc(),
        );
        ast.attach(class, scope);

        assert_eq!(ast.discard_from(mark), Some("ClassBlock"));
        assert_eq!(ast.len(), 2);
        assert!(ast.comments(outer).is_empty());
        assert_eq!(ast.children(outer), vec![kept]);
        assert_eq!(ast.root(), Some(outer));
        assert_eq!(ast.discard_from(10), None);
    }

    #[test]
    fn return_value_slot_is_listed_after_params() {
        let mut ast = Ast::new("t.cour");
        let msg = ast.alloc(
            NodeKind::Message {
                name: "foo".into(),
                return_value: None,
            },
            loc(),
        );
        let param = ast.alloc(NodeKind::Nil, loc());
        ast.attach(msg, param);
        let ret = ast.alloc(
            NodeKind::Instance {
                name: "r".into(),
                type_name: None,
            },
            loc(),
        );
        assert!(ast.set_return_value(msg, ret));
        assert_eq!(ast.children(msg), vec![param, ret]);
        assert_eq!(ast.parent(ret), Some(msg));
        // already owned
        assert!(!ast.set_return_value(msg, ret));
        // not a message
        let other = ast.alloc(NodeKind::Nil, loc());
        assert!(!ast.set_return_value(param, other));
    }

    #[test]
    fn describe_lines() {
        let class = NodeKind::ClassBlock {
            name: "A".into(),
            superclass: Some("B".into()),
        };
        assert_eq!(class.describe(), "ClassBlock A inherits B");
        let var = NodeKind::Variable {
            name: "x".into(),
            type_name: Some("int32".into()),
        };
        assert_eq!(var.describe(), "Variable x : int32");
        assert_eq!(
            NodeKind::MessageDeclaration { name: None }.describe(),
            "MessageDeclaration closure"
        );
        assert_eq!(NodeKind::SendMessage.describe(), "SendMessage");
    }

    #[test]
    fn containers_are_exactly_the_block_kinds() {
        assert!(NodeKind::StatementsBlock.is_container());
        assert!(NodeKind::MessageBlock.is_container());
        assert!(!NodeKind::SendMessage.is_container());
        assert!(!NodeKind::Nil.is_container());
    }
}

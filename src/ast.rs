use std::fmt;

pub use self::mnemonic::{Mnemonic, OperandClass};

/// Instruction mnemonics and their operand classes.
mod mnemonic;

/// Indented rendering of the tree.
mod display;

/// Index of a node inside an [`Ast`].
///
/// Ids are only meaningful for the tree that produced them.
#[derive(Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Clone, Copy)]
pub struct NodeId(usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What a label denotes.
///
/// The parser always leaves labels unclassified; the classification is filled in afterwards by
/// an external pass that looks at the surrounding source.
#[derive(Debug, Default, Eq, PartialEq, Clone, Copy, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum LabelType {
    #[default]
    None,
    Alias,
    Code,
    Data,
}

/// The shape of a node and the ids of the nodes it owns.
#[derive(Debug, Eq, PartialEq, Clone)]
pub enum NodeKind {
    /// Top-level declarations and label sections in source order.
    Root(Vec<NodeId>),
    /// One cell of a forward linked list. A chain of cells forms the ordered list used for code
    /// blocks and data expressions.
    List { item: NodeId, next: Option<NodeId> },
    /// `.db` with the head of its expression list
    Data8(NodeId),
    /// `.dw` with the head of its expression list
    Data16(NodeId),
    /// `NAME = expression`
    Decl { name: String, expression: NodeId },
    /// A label, its section content and its classification.
    ///
    /// The child is either a nested label or the head of a code block list.
    Label {
        name: String,
        child: Option<NodeId>,
        label_type: LabelType,
    },
    Name(String),
    /// Numeric literal text as written, e.g. `$1F`, `%1010` or `42`.
    Const(String),
    /// `#expr`
    Immediate(NodeId),
    /// `(expr)`
    Indirect(NodeId),
    /// `expr,x`
    IndexedX(NodeId),
    /// `expr,y`
    IndexedY(NodeId),
    /// `<expr`
    LoByte(NodeId),
    /// `>expr`
    HiByte(NodeId),
    Add(NodeId, NodeId),
    Subtract(NodeId, NodeId),
    Instruction {
        mnemonic: Mnemonic,
        operand: Option<NodeId>,
    },
}

impl NodeKind {
    /// Ids of the nodes directly owned by this node, in source order.
    pub fn children(&self) -> Vec<NodeId> {
        match self {
            NodeKind::Root(items) => items.clone(),
            NodeKind::List { item, next } => std::iter::once(*item).chain(*next).collect(),
            NodeKind::Data8(list) | NodeKind::Data16(list) => vec![*list],
            NodeKind::Decl { expression, .. } => vec![*expression],
            NodeKind::Label { child, .. } => child.iter().copied().collect(),
            NodeKind::Name(_) | NodeKind::Const(_) => vec![],
            NodeKind::Immediate(child)
            | NodeKind::Indirect(child)
            | NodeKind::IndexedX(child)
            | NodeKind::IndexedY(child)
            | NodeKind::LoByte(child)
            | NodeKind::HiByte(child) => vec![*child],
            NodeKind::Add(lhs, rhs) | NodeKind::Subtract(lhs, rhs) => vec![*lhs, *rhs],
            NodeKind::Instruction { operand, .. } => operand.iter().copied().collect(),
        }
    }
}

/// A single node in the tree.
#[derive(Debug, Eq, PartialEq, Clone)]
pub struct Node {
    pub kind: NodeKind,
    /// Line in the source file the node was parsed from, 1-based.
    pub line: usize,
    /// Back-reference to the owning node. Never used to decide ownership.
    pub parent: Option<NodeId>,
}

/// The syntax tree of one compilation unit.
///
/// All nodes live in an arena and refer to each other by [`NodeId`]. Node 0 is always the root.
#[derive(Debug, Eq, PartialEq, Clone)]
pub struct Ast {
    nodes: Vec<Node>,
}

impl Default for Ast {
    fn default() -> Self {
        Self::new()
    }
}

impl Ast {
    pub fn new() -> Ast {
        Ast {
            nodes: vec![Node {
                kind: NodeKind::Root(Vec::new()),
                line: 0,
                parent: None,
            }],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.root_items().is_empty()
    }

    /// Add a node to the arena and point the parent links of its children at it.
    pub fn add(&mut self, kind: NodeKind, line: usize) -> NodeId {
        let id = NodeId(self.nodes.len());
        for child in kind.children() {
            self.nodes[child.0].parent = Some(id);
        }
        self.nodes.push(Node {
            kind,
            line,
            parent: None,
        });
        id
    }

    /// Append a top-level item to the root.
    pub fn push_item(&mut self, item: NodeId) {
        let root = self.root();
        if let NodeKind::Root(items) = &mut self.nodes[root.0].kind {
            items.push(item);
        }
        self.nodes[item.0].parent = Some(root);
    }

    /// Build a linked list from `items`, preserving their order, and return its head.
    pub fn add_list(&mut self, items: &[NodeId]) -> Option<NodeId> {
        let mut next = None;
        for item in items.iter().rev() {
            let line = self.nodes[item.0].line;
            next = Some(self.add(NodeKind::List { item: *item, next }, line));
        }
        next
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.0].kind
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub(crate) fn set_parent(&mut self, id: NodeId, parent: Option<NodeId>) {
        self.nodes[id.0].parent = parent;
    }

    pub fn root_items(&self) -> &[NodeId] {
        match &self.nodes[0].kind {
            NodeKind::Root(items) => items,
            _ => &[],
        }
    }

    /// Iterate over the items of the list starting at `head`.
    pub fn list_items(&self, head: NodeId) -> ListItems<'_> {
        ListItems {
            ast: self,
            cell: Some(head),
        }
    }

    /// Find the first label named `name`, searching nested labels too.
    pub fn find_label(&self, name: &str) -> Option<NodeId> {
        let mut stack: Vec<NodeId> = self.root_items().iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            if let NodeKind::Label {
                name: label, child, ..
            } = self.kind(id)
            {
                if label == name {
                    return Some(id);
                }
                if let Some(child) = child {
                    stack.push(*child);
                }
            }
        }
        None
    }

    /// Record the classification of a label. Returns `false` if `id` is not a label.
    pub fn set_label_type(&mut self, id: NodeId, new_type: LabelType) -> bool {
        match &mut self.nodes[id.0].kind {
            NodeKind::Label { label_type, .. } => {
                *label_type = new_type;
                true
            }
            _ => false,
        }
    }
}

/// Iterator over the items of a linked list, see [`Ast::list_items`].
pub struct ListItems<'a> {
    ast: &'a Ast,
    cell: Option<NodeId>,
}

impl<'a> Iterator for ListItems<'a> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let cell = self.cell?;
        match self.ast.kind(cell) {
            NodeKind::List { item, next } => {
                self.cell = *next;
                Some(*item)
            }
            _ => {
                self.cell = None;
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    #[test]
    fn test_list_keeps_order() {
        let mut ast = Ast::new();
        let items: Vec<NodeId> = ["$01", "$02", "$03"]
            .iter()
            .map(|text| ast.add(NodeKind::Const(text.to_string()), 1))
            .collect();
        let head = ast.add_list(&items).unwrap();

        assert_eq!(ast.list_items(head).collect::<Vec<_>>(), items);
        for item in items {
            let cell = ast.parent(item).unwrap();
            assert!(matches!(ast.kind(cell), NodeKind::List { item: i, .. } if *i == item));
        }
    }

    #[test]
    fn test_empty_list() {
        let mut ast = Ast::new();
        assert_eq!(ast.add_list(&[]), None);
    }

    #[test]
    fn test_push_item_sets_parent() {
        let mut ast = Ast::new();
        let label = ast.add(
            NodeKind::Label {
                name: "Start".to_string(),
                child: None,
                label_type: LabelType::None,
            },
            1,
        );
        ast.push_item(label);

        assert_eq!(ast.root_items(), &[label]);
        assert_eq!(ast.parent(label), Some(ast.root()));
        assert!(!ast.is_empty());
    }

    #[test]
    fn test_label_classification() {
        let mut ast = Ast::new();
        let inner = ast.add(
            NodeKind::Label {
                name: "Inner".to_string(),
                child: None,
                label_type: LabelType::None,
            },
            2,
        );
        let outer = ast.add(
            NodeKind::Label {
                name: "Outer".to_string(),
                child: Some(inner),
                label_type: LabelType::None,
            },
            1,
        );
        ast.push_item(outer);

        assert_eq!(ast.find_label("Inner"), Some(inner));
        assert_eq!(ast.find_label("Missing"), None);
        assert!(ast.set_label_type(inner, LabelType::Data));
        assert!(matches!(
            ast.kind(inner),
            NodeKind::Label {
                label_type: LabelType::Data,
                ..
            }
        ));
        assert!(!ast.set_label_type(ast.root(), LabelType::Code));
    }
}

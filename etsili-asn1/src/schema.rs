//! Generic schema-tree types
//!
//! A schema tree ("dumper" tree) tells the walkers how to interpret
//! context-tagged fields: for each container node, a table of member
//! actions indexed by context identifier, plus a single anonymous-sequence
//! action used when a universal-constructed item is met inside that
//! container.
//!
//! The ETSI tree is cyclic (an encrypted payload contains a full Payload),
//! so nodes reference each other by [`NodeId`] index into the tree rather
//! than by pointer.

/// Index of a node within an [`ElementTree`].
pub type NodeId = u16;

/// How one member of a container is to be treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemberAction {
    pub name: &'static str,
    /// Child schema to walk into when this member is constructed.
    pub descend: Option<NodeId>,
    /// Interpret-as tag for the member's value (see `etsili_core::tag`).
    pub interpret: u8,
}

/// Placeholder for identifiers that carry no meaning in a table.
pub const NOACTION: MemberAction = MemberAction {
    name: "None",
    descend: None,
    interpret: etsili_core::tag::NULL,
};

/// One container's interpretation table.
#[derive(Debug, Clone)]
pub struct ElementNode {
    pub members: Vec<MemberAction>,
    pub sequence: MemberAction,
}

impl Default for ElementNode {
    fn default() -> Self {
        ElementNode {
            members: Vec::new(),
            sequence: NOACTION,
        }
    }
}

/// A complete schema tree.
#[derive(Debug, Clone, Default)]
pub struct ElementTree {
    nodes: Vec<ElementNode>,
}

impl ElementTree {
    /// Tree with `count` empty nodes, to be filled in with [`Self::set`].
    pub fn with_nodes(count: usize) -> Self {
        ElementTree {
            nodes: vec![ElementNode::default(); count],
        }
    }

    pub fn set(&mut self, id: NodeId, node: ElementNode) {
        self.nodes[id as usize] = node;
    }

    pub fn node(&self, id: NodeId) -> &ElementNode {
        &self.nodes[id as usize]
    }

    /// The member action for a context identifier, if the table covers it.
    pub fn member(&self, id: NodeId, ident: u32) -> Option<&MemberAction> {
        self.nodes[id as usize].members.get(ident as usize)
    }
}

//! Arena-backed decision tree with stable node ids and parent-labeled edges.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use generational_arena::{Arena, Index};
use serde::Serialize;
use tracing::instrument;

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-wide node identity. Never reused, not derived from content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct NodeId(u64);

impl NodeId {
    /// Allocate the next identity.
    pub fn fresh() -> Self {
        NodeId(NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// Split on a variable; `condition` labels the edge leaving this node
    Split { condition: String },
    /// Leaf carrying the predicted class/range key
    Terminal { class_key: String },
}

/// Data payload for decision tree nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeData {
    /// Variable name or terminal prediction text
    pub label: String,
    /// 0-based level, the clause position within its path
    pub depth: usize,
    /// Fill color (hex)
    pub color: String,
    pub kind: NodeKind,
}

impl NodeData {
    pub fn is_terminal(&self) -> bool {
        matches!(self.kind, NodeKind::Terminal { .. })
    }

    /// Condition text of a split node, empty for terminals.
    pub fn condition(&self) -> &str {
        match &self.kind {
            NodeKind::Split { condition } => condition,
            NodeKind::Terminal { .. } => "",
        }
    }
}

impl fmt::Display for NodeData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label.replace('\n', " "))
    }
}

/// Tree node in the arena-based hierarchy structure.
#[derive(Debug)]
pub struct TreeNode {
    pub id: NodeId,
    pub data: NodeData,
    /// Index of parent node in the arena, None for depth-0 nodes
    pub parent: Option<Index>,
    /// Indices of child nodes in the arena, in insertion order
    pub children: Vec<Index>,
}

/// Parent/child relation with the condition text shown at its midpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Edge {
    pub parent: NodeId,
    pub child: NodeId,
    pub label: String,
}

/// Arena-based decision tree.
///
/// A forest really: several depth-0 nodes may exist, one per top split.
/// Nodes and edges keep insertion order, which is the order renderers see.
#[derive(Debug, Default)]
pub struct DecisionTree {
    arena: Arena<TreeNode>,
    order: Vec<Index>,
    roots: Vec<Index>,
    edges: Vec<Edge>,
}

impl DecisionTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node with a fresh identity below `parent` (or as a root).
    ///
    /// The edge from the parent is labeled with the parent's condition text.
    #[instrument(level = "trace", skip(self))]
    pub fn insert_node(&mut self, data: NodeData, parent: Option<Index>) -> Index {
        let id = NodeId::fresh();
        let node_idx = self.arena.insert(TreeNode {
            id,
            data,
            parent,
            children: Vec::new(),
        });
        self.order.push(node_idx);

        match parent.and_then(|p| self.arena.get_mut(p)) {
            Some(parent_node) => {
                parent_node.children.push(node_idx);
                self.edges.push(Edge {
                    parent: parent_node.id,
                    child: id,
                    label: parent_node.data.condition().to_string(),
                });
            }
            None => self.roots.push(node_idx),
        }

        node_idx
    }

    pub fn get_node(&self, idx: Index) -> Option<&TreeNode> {
        self.arena.get(idx)
    }

    pub fn find(&self, id: NodeId) -> Option<&TreeNode> {
        self.nodes().find(|n| n.id == id)
    }

    /// Nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &TreeNode> + '_ {
        self.order.iter().filter_map(|&idx| self.arena.get(idx))
    }

    pub fn node_ids(&self) -> Vec<NodeId> {
        self.nodes().map(|n| n.id).collect()
    }

    pub fn roots(&self) -> &[Index] {
        &self.roots
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Parallel start/end id lists for a graph renderer's edge source.
    pub fn node_relations(&self) -> (Vec<NodeId>, Vec<NodeId>) {
        self.edges.iter().map(|e| (e.parent, e.child)).unzip()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Number of levels (0 for an empty tree).
    #[instrument(level = "debug", skip(self))]
    pub fn depth(&self) -> usize {
        self.nodes().map(|n| n.data.depth + 1).max().unwrap_or(0)
    }

    /// Depth-first walk over the forest, roots and children in insertion order.
    pub fn iter(&self) -> TreeIterator<'_> {
        TreeIterator::new(self)
    }

    /// Labels of all nodes without children, in depth-first order.
    #[instrument(level = "debug", skip(self))]
    pub fn leaf_nodes(&self) -> Vec<String> {
        self.iter()
            .filter(|(_, node)| node.children.is_empty())
            .map(|(_, node)| node.data.label.clone())
            .collect()
    }
}

pub struct TreeIterator<'a> {
    tree: &'a DecisionTree,
    stack: Vec<Index>,
}

impl<'a> TreeIterator<'a> {
    fn new(tree: &'a DecisionTree) -> Self {
        let stack = tree.roots.iter().rev().copied().collect();
        Self { tree, stack }
    }
}

impl<'a> Iterator for TreeIterator<'a> {
    type Item = (Index, &'a TreeNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(current_idx) = self.stack.pop() {
            if let Some(node) = self.tree.get_node(current_idx) {
                // Push children in reverse order for left-to-right traversal
                for &child in node.children.iter().rev() {
                    self.stack.push(child);
                }
                return Some((current_idx, node));
            }
        }
        None
    }
}

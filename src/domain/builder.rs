//! Tree builder turning decision-path tables into a merged decision tree.

use std::collections::HashMap;

use generational_arena::Index;
use tracing::{debug, instrument};

use crate::domain::arena::{DecisionTree, NodeData, NodeId, NodeKind};
use crate::domain::error::DomainResult;
use crate::domain::palette::{ClassPalette, INTERNAL_NODE_COLOR};
use crate::domain::path::{PathRow, Prediction, TargetKind};

/// Registry key deciding when a path re-enters an existing node.
///
/// Besides depth, label and condition the key carries the parent, so two
/// chains that diverged once never merge again further down.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct NodeKey {
    parent: Option<NodeId>,
    depth: usize,
    label: String,
    condition: String,
}

/// Constructs decision trees from decision-path rows.
pub struct TreeBuilder {
    palette: ClassPalette,
    kind: TargetKind,
    registry: HashMap<NodeKey, Index>,
}

impl TreeBuilder {
    pub fn new(palette: ClassPalette, kind: TargetKind) -> Self {
        Self {
            palette,
            kind,
            registry: HashMap::new(),
        }
    }

    /// Build a tree from all rows.
    ///
    /// Fails on the first malformed clause or on a terminal class that has no
    /// palette color; no partial tree is returned.
    #[instrument(level = "debug", skip(self, rows), fields(rows = rows.len()))]
    pub fn build(&mut self, rows: &[PathRow]) -> DomainResult<DecisionTree> {
        // Reset state for a fresh build
        self.registry.clear();
        let mut tree = DecisionTree::new();

        for row in rows {
            let clauses = row.clauses()?;
            let mut previous: Option<Index> = None;

            for (depth, clause) in clauses.iter().enumerate() {
                let data = NodeData {
                    label: clause.variable.clone(),
                    depth,
                    color: INTERNAL_NODE_COLOR.to_string(),
                    kind: NodeKind::Split {
                        condition: clause.condition.clone(),
                    },
                };
                previous = Some(self.order_nodes(&mut tree, data, previous));
            }

            let prediction = Prediction::parse(&row.prediction, self.kind)?;
            let color = self.palette.color_for(&prediction.key)?.to_string();
            let terminal = NodeData {
                label: prediction.label,
                depth: clauses.len(),
                color,
                kind: NodeKind::Terminal {
                    class_key: prediction.key,
                },
            };
            self.order_nodes(&mut tree, terminal, previous);
        }

        debug!(
            "built tree: {} nodes, {} edges, {} roots",
            tree.len(),
            tree.edges().len(),
            tree.roots().len()
        );
        Ok(tree)
    }

    /// Attach `data` below `parent`, reusing a structurally identical node when
    /// one was already created by an earlier row with the same prefix.
    fn order_nodes(
        &mut self,
        tree: &mut DecisionTree,
        data: NodeData,
        parent: Option<Index>,
    ) -> Index {
        let key = NodeKey {
            parent: parent.and_then(|p| tree.get_node(p)).map(|n| n.id),
            depth: data.depth,
            label: data.label.clone(),
            condition: data.condition().to_string(),
        };
        if let Some(&existing) = self.registry.get(&key) {
            return existing;
        }
        let idx = tree.insert_node(data, parent);
        self.registry.insert(key, idx);
        idx
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn class_builder() -> TreeBuilder {
        TreeBuilder::new(ClassPalette::tree_default(), TargetKind::Class)
    }

    #[test]
    fn given_single_path_when_building_then_creates_chain_with_terminal() {
        let rows = vec![PathRow::new("A > 5 & B < 2", "cluster_0")];
        let tree = class_builder().build(&rows).unwrap();

        let labels: Vec<_> = tree.nodes().map(|n| n.data.label.as_str()).collect();
        assert_eq!(labels, vec!["A", "B", "cluster_0"]);
        let depths: Vec<_> = tree.nodes().map(|n| n.data.depth).collect();
        assert_eq!(depths, vec![0, 1, 2]);
        assert_eq!(tree.edges().len(), 2);
    }

    #[test]
    fn given_duplicate_rows_when_building_then_terminal_is_merged() {
        let rows = vec![
            PathRow::new("A > 5", "cluster_1"),
            PathRow::new("A > 5", "cluster_1"),
        ];
        let tree = class_builder().build(&rows).unwrap();
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn given_unmapped_class_when_building_then_fails() {
        let rows = vec![PathRow::new("A > 5", "cluster_7")];
        assert!(class_builder().build(&rows).is_err());
    }
}

//! Layout assignment: node coordinates plus node and edge text positions.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::domain::arena::{DecisionTree, NodeId};

/// Drawing frame the tree is laid out into.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutFrame {
    pub x_min: f64,
    pub x_max: f64,
    /// y of depth 0
    pub y_top: f64,
    /// y limit approached by the deepest level
    pub y_bottom: f64,
}

impl Default for LayoutFrame {
    fn default() -> Self {
        Self {
            x_min: -1.0,
            x_max: 1.0,
            y_top: 1.0,
            y_bottom: 0.0,
        }
    }
}

/// Text anchored at a plot coordinate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextLabel {
    pub x: f64,
    pub y: f64,
    pub text: String,
}

/// Edge segment between two laid-out nodes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Segment {
    pub start: NodeId,
    pub end: NodeId,
    pub xs: [f64; 2],
    pub ys: [f64; 2],
}

/// Positions for one tree, parallel to the tree's node id list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreeLayout {
    pub node_ids: Vec<NodeId>,
    pub colors: Vec<String>,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub node_labels: Vec<TextLabel>,
    pub edge_labels: Vec<TextLabel>,
    pub segments: Vec<Segment>,
}

impl TreeLayout {
    /// Spread each depth level evenly across the frame width and map depth
    /// monotonically from `y_top` towards `y_bottom`.
    ///
    /// Within a level, nodes follow the depth-first order of the forest so
    /// children line up under their parents.
    #[instrument(level = "debug", skip(tree))]
    pub fn compute(tree: &DecisionTree, frame: LayoutFrame) -> Self {
        let levels = tree.depth();
        let mut by_level: Vec<Vec<NodeId>> = vec![Vec::new(); levels];
        for (_, node) in tree.iter() {
            by_level[node.data.depth].push(node.id);
        }

        let width = frame.x_max - frame.x_min;
        let step_y = if levels == 0 {
            0.0
        } else {
            (frame.y_top - frame.y_bottom) / levels as f64
        };

        let mut positions: BTreeMap<NodeId, (f64, f64)> = BTreeMap::new();
        for (depth, ids) in by_level.iter().enumerate() {
            let slot = width / ids.len() as f64;
            let y = frame.y_top - depth as f64 * step_y;
            for (i, id) in ids.iter().enumerate() {
                let x = frame.x_min + (i as f64 + 0.5) * slot;
                positions.insert(*id, (x, y));
            }
        }

        let mut layout = TreeLayout {
            node_ids: Vec::with_capacity(tree.len()),
            colors: Vec::with_capacity(tree.len()),
            x: Vec::with_capacity(tree.len()),
            y: Vec::with_capacity(tree.len()),
            node_labels: Vec::with_capacity(tree.len()),
            edge_labels: Vec::with_capacity(tree.edges().len()),
            segments: Vec::with_capacity(tree.edges().len()),
        };

        for node in tree.nodes() {
            let (x, y) = positions[&node.id];
            layout.node_ids.push(node.id);
            layout.colors.push(node.data.color.clone());
            layout.x.push(x);
            layout.y.push(y);
            layout.node_labels.push(TextLabel {
                x,
                y,
                text: node.data.label.clone(),
            });
        }

        for edge in tree.edges() {
            let (x0, y0) = positions[&edge.parent];
            let (x1, y1) = positions[&edge.child];
            layout.edge_labels.push(TextLabel {
                x: (x0 + x1) / 2.0,
                y: (y0 + y1) / 2.0,
                text: edge.label.clone(),
            });
            layout.segments.push(Segment {
                start: edge.parent,
                end: edge.child,
                xs: [x0, x1],
                ys: [y0, y1],
            });
        }

        layout
    }

    /// Lookup table node id -> (x, y), as a static layout provider expects.
    pub fn graph_layout(&self) -> BTreeMap<NodeId, (f64, f64)> {
        self.node_ids
            .iter()
            .copied()
            .zip(self.x.iter().copied().zip(self.y.iter().copied()))
            .collect()
    }

    pub fn position(&self, id: NodeId) -> Option<(f64, f64)> {
        self.node_ids
            .iter()
            .position(|n| *n == id)
            .map(|i| (self.x[i], self.y[i]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::builder::TreeBuilder;
    use crate::domain::palette::ClassPalette;
    use crate::domain::path::{PathRow, TargetKind};

    fn sample_tree() -> DecisionTree {
        let rows = vec![
            PathRow::new("A > 5 & B < 2", "cluster_0"),
            PathRow::new("A > 5 & C = 1", "cluster_1"),
        ];
        TreeBuilder::new(ClassPalette::tree_default(), TargetKind::Class)
            .build(&rows)
            .unwrap()
    }

    #[test]
    fn given_empty_tree_when_computing_then_layout_is_empty() {
        let layout = TreeLayout::compute(&DecisionTree::new(), LayoutFrame::default());
        assert!(layout.node_ids.is_empty());
        assert!(layout.edge_labels.is_empty());
    }

    #[test]
    fn given_tree_when_computing_then_levels_spread_evenly() {
        let tree = sample_tree();
        let layout = TreeLayout::compute(&tree, LayoutFrame::default());

        // A alone on level 0, B and C on level 1, two terminals on level 2
        assert_eq!(layout.x[0], 0.0);
        assert_eq!(layout.y[0], 1.0);
        let level1: Vec<f64> = (0..tree.len())
            .filter(|&i| layout.y[i] < 1.0 && layout.y[i] > 0.5)
            .map(|i| layout.x[i])
            .collect();
        assert_eq!(level1, vec![-0.5, 0.5]);
    }

    #[test]
    fn given_edge_when_computing_then_label_sits_at_midpoint() {
        let tree = sample_tree();
        let layout = TreeLayout::compute(&tree, LayoutFrame::default());
        let edge = &tree.edges()[0];
        let (x0, y0) = layout.position(edge.parent).unwrap();
        let (x1, y1) = layout.position(edge.child).unwrap();

        assert_eq!(layout.edge_labels[0].x, (x0 + x1) / 2.0);
        assert_eq!(layout.edge_labels[0].y, (y0 + y1) / 2.0);
        assert_eq!(layout.edge_labels[0].text, "> 5");
    }
}

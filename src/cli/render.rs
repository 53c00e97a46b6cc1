//! Terminal rendering of decision trees and chart summaries.

use colored::{ColoredString, Colorize};
use generational_arena::Index;
use termtree::Tree;

use crate::domain::{DecisionTree, NodeKind, TreeNode};

/// Conversion into termtree values, one per depth-0 node.
pub trait ToTermTree {
    fn to_term_trees(&self) -> Vec<Tree<String>>;
}

impl ToTermTree for DecisionTree {
    fn to_term_trees(&self) -> Vec<Tree<String>> {
        fn build(tree: &DecisionTree, idx: Index) -> Option<Tree<String>> {
            let node = tree.get_node(idx)?;
            let leaves: Vec<_> = node
                .children
                .iter()
                .filter_map(|&child| build(tree, child))
                .collect();
            Some(Tree::new(node_text(node)).with_leaves(leaves))
        }

        self.roots()
            .iter()
            .filter_map(|&root| build(self, root))
            .collect()
    }
}

/// Split nodes read `Variable condition`; terminals show their class in its fill color.
fn node_text(node: &TreeNode) -> String {
    match &node.data.kind {
        NodeKind::Split { condition } => {
            format!("{} {}", node.data.label.bold(), condition.dimmed())
        }
        NodeKind::Terminal { .. } => paint(&node.data.to_string(), &node.data.color).to_string(),
    }
}

/// Color `text` with a `#rrggbb` color; other spellings stay uncolored.
pub fn paint(text: &str, hex: &str) -> ColoredString {
    match hex_rgb(hex) {
        Some((r, g, b)) => text.truecolor(r, g, b),
        None => text.normal(),
    }
}

pub fn hex_rgb(hex: &str) -> Option<(u8, u8, u8)> {
    let digits = hex.strip_prefix('#')?;
    if digits.len() != 6 || !digits.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
    Some((channel(0)?, channel(2)?, channel(4)?))
}

/// Horizontal bar of `width` cells scaled to `value / max`.
pub fn bar(value: f64, max: f64, width: usize) -> String {
    if max <= 0.0 || value <= 0.0 {
        return String::new();
    }
    let cells = ((value / max) * width as f64).round() as usize;
    "█".repeat(cells.min(width))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ClassPalette, PathRow, TargetKind, TreeBuilder};

    #[test]
    fn given_shared_prefix_when_rendering_then_one_tree_with_two_branches() {
        let rows = vec![
            PathRow::new("A > 5 & B < 2", "cluster_0"),
            PathRow::new("A > 5 & C = 1", "cluster_1"),
        ];
        let tree = TreeBuilder::new(ClassPalette::tree_default(), TargetKind::Class)
            .build(&rows)
            .unwrap();

        let rendered = tree.to_term_trees();
        assert_eq!(rendered.len(), 1);
        assert_eq!(rendered[0].leaves.len(), 2);
        let text = rendered[0].to_string();
        assert!(text.contains("> 5"));
        assert!(text.contains("cluster_1"));
    }

    #[test]
    fn given_hex_colors_when_parsing_then_only_six_digit_form_is_accepted() {
        assert_eq!(hex_rgb("#c2e8e0"), Some((0xc2, 0xe8, 0xe0)));
        assert_eq!(hex_rgb("c2e8e0"), None);
        assert_eq!(hex_rgb("#fff"), None);
    }

    #[test]
    fn given_values_when_drawing_bar_then_scales_to_width() {
        assert_eq!(bar(5.0, 10.0, 10).chars().count(), 5);
        assert_eq!(bar(0.0, 10.0, 10), "");
    }
}

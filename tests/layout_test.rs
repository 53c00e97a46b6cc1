//! Tests for TreeLayout

use dtviz::domain::{ClassPalette, DecisionTree, LayoutFrame, PathRow, TargetKind, TreeBuilder, TreeLayout};

fn sample_tree() -> DecisionTree {
    let rows = vec![
        PathRow::new("A > 5 & B < 2", "cluster_0"),
        PathRow::new("A > 5 & C = 1", "cluster_1"),
    ];
    TreeBuilder::new(ClassPalette::tree_default(), TargetKind::Class)
        .build(&rows)
        .unwrap()
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn given_tree_when_laying_out_then_levels_spread_across_frame() {
    // Arrange
    let tree = sample_tree();

    // Act
    let layout = TreeLayout::compute(&tree, LayoutFrame::default());

    // Assert: A, B, cluster_0, C, cluster_1 in insertion order
    assert_eq!(layout.node_ids, tree.node_ids());
    let expected = [
        (0.0, 1.0),
        (-0.5, 2.0 / 3.0),
        (-0.5, 1.0 / 3.0),
        (0.5, 2.0 / 3.0),
        (0.5, 1.0 / 3.0),
    ];
    for (i, (x, y)) in expected.iter().enumerate() {
        assert!(close(layout.x[i], *x), "x[{i}] = {}", layout.x[i]);
        assert!(close(layout.y[i], *y), "y[{i}] = {}", layout.y[i]);
    }
}

#[test]
fn given_tree_when_laying_out_then_edge_labels_sit_at_midpoints() {
    let tree = sample_tree();
    let layout = TreeLayout::compute(&tree, LayoutFrame::default());

    assert_eq!(layout.edge_labels.len(), tree.edges().len());
    assert_eq!(layout.segments.len(), tree.edges().len());

    let first = &layout.edge_labels[0];
    assert_eq!(first.text, "> 5");
    assert!(close(first.x, -0.25));
    assert!(close(first.y, (1.0 + 2.0 / 3.0) / 2.0));

    for segment in &layout.segments {
        let start = layout.position(segment.start).unwrap();
        let end = layout.position(segment.end).unwrap();
        assert_eq!(segment.xs, [start.0, end.0]);
        assert!(end.1 < start.1, "children are drawn below parents");
    }
}

#[test]
fn given_same_tree_when_laying_out_twice_then_positions_are_identical() {
    let tree = sample_tree();
    let frame = LayoutFrame {
        x_min: 0.0,
        x_max: 800.0,
        y_top: 600.0,
        y_bottom: 0.0,
    };

    let first = TreeLayout::compute(&tree, frame);
    let second = TreeLayout::compute(&tree, frame);

    assert_eq!(first, second);
    assert!(first.x.iter().all(|x| (0.0..=800.0).contains(x)));
    assert!(first.y.iter().all(|y| (0.0..=600.0).contains(y)));
}

#[test]
fn given_layout_when_reading_graph_layout_then_maps_every_node() {
    let tree = sample_tree();
    let layout = TreeLayout::compute(&tree, LayoutFrame::default());

    let graph = layout.graph_layout();

    assert_eq!(graph.len(), tree.len());
    for node in tree.nodes() {
        assert_eq!(graph.get(&node.id).copied(), layout.position(node.id));
    }
    assert_eq!(layout.colors.len(), tree.len());
}

#[test]
fn given_empty_tree_when_laying_out_then_layout_is_empty() {
    let layout = TreeLayout::compute(&DecisionTree::new(), LayoutFrame::default());
    assert!(layout.node_ids.is_empty());
    assert!(layout.segments.is_empty());
}

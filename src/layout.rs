//! Deterministic layered auto-layout for the workflow canvas.
//!
//! Assigns every node to a horizontal rank so edges flow left-to-right,
//! then stacks the nodes of each rank vertically. Same input always yields
//! the same positions; ties are broken by input order. Cycles are
//! tolerated by bounding rank relaxation at `nodes.len()` passes.

use std::collections::HashMap;

use crate::constants::{
    LAYOUT_MARGIN_X, LAYOUT_MARGIN_Y, LAYOUT_NODE_HEIGHT, LAYOUT_NODE_SEP, LAYOUT_NODE_WIDTH,
    LAYOUT_RANK_SEP,
};
use crate::models::{Position, WorkflowEdge, WorkflowNode};

/// Spacing knobs. All separations must be strictly positive; the fixed
/// footprint only has to be large enough that same-rank stacks never
/// overlap - the rendered card may be smaller.
#[derive(Clone, Copy, Debug)]
pub struct LayoutConfig {
    pub node_width: f64,
    pub node_height: f64,
    pub rank_sep: f64,
    pub node_sep: f64,
    pub margin_x: f64,
    pub margin_y: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            node_width: LAYOUT_NODE_WIDTH,
            node_height: LAYOUT_NODE_HEIGHT,
            rank_sep: LAYOUT_RANK_SEP,
            node_sep: LAYOUT_NODE_SEP,
            margin_x: LAYOUT_MARGIN_X,
            margin_y: LAYOUT_MARGIN_Y,
        }
    }
}

/// Returns the nodes with `position` populated. `data`, `id` and the edge
/// list are never touched. An empty node list is returned unchanged.
pub fn apply_auto_layout(
    mut nodes: Vec<WorkflowNode>,
    edges: &[WorkflowEdge],
    config: &LayoutConfig,
) -> Vec<WorkflowNode> {
    if nodes.is_empty() {
        return nodes;
    }

    let positions = compute_positions(&nodes, edges, config);
    for node in &mut nodes {
        if let Some(pos) = positions.get(&node.id) {
            node.position = *pos;
        }
    }
    nodes
}

/// Core placement: node id -> top-left coordinates.
pub fn compute_positions(
    nodes: &[WorkflowNode],
    edges: &[WorkflowEdge],
    config: &LayoutConfig,
) -> HashMap<String, Position> {
    let index: HashMap<&str, usize> = nodes
        .iter()
        .enumerate()
        .map(|(i, n)| (n.id.as_str(), i))
        .collect();

    // Edges whose endpoints are missing are dropped silently, matching the
    // renderer's tolerance for transiently inconsistent graphs.
    let resolved: Vec<(usize, usize)> = edges
        .iter()
        .filter_map(|e| {
            let s = *index.get(e.source.as_str())?;
            let t = *index.get(e.target.as_str())?;
            Some((s, t))
        })
        .collect();

    // Longest-path ranking: relax until fixpoint, bounded by the node
    // count so cyclic inputs terminate with finite ranks.
    let n = nodes.len();
    let mut rank = vec![0usize; n];
    for _ in 0..n {
        let mut changed = false;
        for &(s, t) in &resolved {
            if s != t && rank[t] < rank[s] + 1 {
                rank[t] = rank[s] + 1;
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }

    // Stack each rank in input order; shorter columns are centered against
    // the tallest one so the flow reads as a band, not a staircase.
    let mut columns: Vec<Vec<usize>> = Vec::new();
    for (i, &r) in rank.iter().enumerate() {
        if columns.len() <= r {
            columns.resize_with(r + 1, Vec::new);
        }
        columns[r].push(i);
    }
    let tallest = columns.iter().map(Vec::len).max().unwrap_or(0);

    let step_x = config.node_width + config.rank_sep;
    let step_y = config.node_height + config.node_sep;

    let mut positions = HashMap::with_capacity(n);
    for (r, column) in columns.iter().enumerate() {
        let y_offset = (tallest - column.len()) as f64 * step_y / 2.0;
        for (row, &i) in column.iter().enumerate() {
            positions.insert(
                nodes[i].id.clone(),
                Position {
                    x: config.margin_x + r as f64 * step_x,
                    y: config.margin_y + y_offset + row as f64 * step_y,
                },
            );
        }
    }
    positions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NodeData;
    use proptest::prelude::*;

    fn node(id: &str) -> WorkflowNode {
        WorkflowNode::new(id, NodeData::default())
    }

    fn edge(source: &str, target: &str) -> WorkflowEdge {
        WorkflowEdge::new(source, target)
    }

    fn chain() -> (Vec<WorkflowNode>, Vec<WorkflowEdge>) {
        (
            vec![node("1"), node("2"), node("3")],
            vec![edge("1", "2"), edge("2", "3")],
        )
    }

    #[test]
    fn empty_input_is_returned_unchanged() {
        let out = apply_auto_layout(Vec::new(), &[], &LayoutConfig::default());
        assert!(out.is_empty());
    }

    #[test]
    fn layout_is_deterministic() {
        let (nodes, edges) = chain();
        let cfg = LayoutConfig::default();
        let a = apply_auto_layout(nodes.clone(), &edges, &cfg);
        let b = apply_auto_layout(nodes, &edges, &cfg);
        for (x, y) in a.iter().zip(&b) {
            assert_eq!(x.position, y.position, "node {}", x.id);
        }
    }

    #[test]
    fn chain_flows_left_to_right_without_overlap() {
        let (nodes, edges) = chain();
        let cfg = LayoutConfig::default();
        let out = apply_auto_layout(nodes, &edges, &cfg);

        let x: Vec<f64> = out.iter().map(|n| n.position.x).collect();
        assert!(x[0] < x[1] && x[1] < x[2]);

        for (i, a) in out.iter().enumerate() {
            for b in &out[i + 1..] {
                let apart_x = (a.position.x - b.position.x).abs() >= cfg.node_width;
                let apart_y = (a.position.y - b.position.y).abs() >= cfg.node_height;
                assert!(apart_x || apart_y, "{} overlaps {}", a.id, b.id);
            }
        }
    }

    #[test]
    fn disconnected_nodes_land_in_rank_zero() {
        let nodes = vec![node("a"), node("b"), node("lonely")];
        let edges = vec![edge("a", "b")];
        let pos = compute_positions(&nodes, &edges, &LayoutConfig::default());
        assert_eq!(pos["a"].x, pos["lonely"].x);
        assert!(pos["b"].x > pos["a"].x);
    }

    #[test]
    fn dangling_edges_are_ignored() {
        let nodes = vec![node("a"), node("b")];
        let edges = vec![edge("a", "ghost"), edge("a", "b")];
        let pos = compute_positions(&nodes, &edges, &LayoutConfig::default());
        assert_eq!(pos.len(), 2);
        assert!(pos["b"].x > pos["a"].x);
    }

    #[test]
    fn cyclic_input_terminates() {
        let nodes = vec![node("a"), node("b")];
        let edges = vec![edge("a", "b"), edge("b", "a")];
        let pos = compute_positions(&nodes, &edges, &LayoutConfig::default());
        assert_eq!(pos.len(), 2);
    }

    #[test]
    fn branch_siblings_share_a_rank() {
        let nodes = vec![node("root"), node("yes"), node("no")];
        let edges = vec![edge("root", "yes"), edge("root", "no")];
        let pos = compute_positions(&nodes, &edges, &LayoutConfig::default());
        assert_eq!(pos["yes"].x, pos["no"].x);
        assert_ne!(pos["yes"].y, pos["no"].y);
    }

    proptest! {
        /// For arbitrary DAGs (edges only point from lower to higher
        /// index), every edge target sits strictly right of its source and
        /// repeated runs agree.
        #[test]
        fn ranks_are_monotone_over_random_dags(
            n in 1usize..12,
            raw in proptest::collection::vec((0usize..12, 0usize..12), 0..30)
        ) {
            let nodes: Vec<WorkflowNode> =
                (0..n).map(|i| node(&format!("n{i}"))).collect();
            let edges: Vec<WorkflowEdge> = raw
                .into_iter()
                .filter(|(a, b)| a < b && *b < n)
                .map(|(a, b)| edge(&format!("n{a}"), &format!("n{b}")))
                .collect();

            let cfg = LayoutConfig::default();
            let pos = compute_positions(&nodes, &edges, &cfg);
            let again = compute_positions(&nodes, &edges, &cfg);
            prop_assert_eq!(&pos, &again);

            for e in &edges {
                prop_assert!(pos[&e.target].x > pos[&e.source].x);
            }
        }
    }
}

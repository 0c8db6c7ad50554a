use crate::graph::{HostGraph, NodeKey, Position};
use std::collections::{HashSet, VecDeque};

/// Positions nodes a rewrite just inserted.
pub trait Placement {
    /// `anchors` are already placed; every node in `inserted` may be moved.
    fn place(&mut self, graph: &mut HostGraph, inserted: &HashSet<NodeKey>, anchors: &[NodeKey]);
}

/// Leaves inserted nodes where they were spawned.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeepSpawnPosition;

impl Placement for KeepSpawnPosition {
    fn place(&mut self, _: &mut HostGraph, _: &HashSet<NodeKey>, _: &[NodeKey]) {}
}

/// Breadth-first from the anchors, each inserted node moves to the mean
/// position of its neighbors that are already placed.
///
/// Inserted nodes unreachable from any anchor keep their spawn position.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeighborAverage;

impl Placement for NeighborAverage {
    fn place(&mut self, graph: &mut HostGraph, inserted: &HashSet<NodeKey>, anchors: &[NodeKey]) {
        let mut placed = HashSet::new();
        let mut queue = anchors.iter().copied().collect::<VecDeque<_>>();
        while let Some(current) = queue.pop_front() {
            let mut fresh = graph
                .neighbors(current)
                .filter(|n| inserted.contains(n) && !placed.contains(n))
                .collect::<Vec<_>>();
            fresh.sort();
            for node in fresh {
                let positions = graph
                    .neighbors(node)
                    .filter(|n| !inserted.contains(n) || placed.contains(n))
                    .filter_map(|n| graph.position(n))
                    .collect::<Vec<_>>();
                if positions.is_empty() {
                    continue;
                }
                let sum = positions
                    .iter()
                    .fold(Position::default(), |acc, &p| acc + p);
                let mean = sum.scaled(1.0 / positions.len() as f64);
                if let Some(attr) = graph.get_mut_node_attr(node) {
                    attr.position = mean;
                }
                placed.insert(node);
                queue.push_back(node);
            }
        }
    }
}

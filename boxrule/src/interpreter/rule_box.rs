use crate::graph::{HostGraph, NodeKey, Position};
use crate::rule::compile::is_meta_node;
use derive_more::From;
use std::collections::HashMap;

/// Vertical gap between a rule box and the nodes its rule spawns.
pub const SPAWN_MARGIN: f64 = 40.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, From)]
pub struct RuleBoxId(pub u32);

/// Axis-aligned rectangle, `min` is the top left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub min: Position,
    pub max: Position,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Rect {
            min: Position::new(x, y),
            max: Position::new(x + width, y + height),
        }
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    pub fn contains(&self, p: Position) -> bool {
        self.min.x <= p.x && p.x <= self.max.x && self.min.y <= p.y && p.y <= self.max.y
    }
}

/// A rectangular region of the canvas. The nodes inside it form a rule.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleBox {
    pub id: RuleBoxId,
    pub bounds: Rect,
}

impl RuleBox {
    pub fn new(id: RuleBoxId, bounds: Rect) -> Self {
        RuleBox { id, bounds }
    }

    pub fn name(&self) -> String {
        format!("box {}", self.id.0)
    }

    /// Nodes positioned inside the bounds, sorted by key.
    pub fn contained_nodes(&self, graph: &HostGraph) -> Vec<NodeKey> {
        let mut nodes = graph
            .nodes()
            .filter(|(_, attr)| self.bounds.contains(attr.position))
            .map(|(key, _)| key)
            .collect::<Vec<_>>();
        nodes.sort();
        nodes
    }

    /// Where a spawned node lands relative to where it was drawn: just below the box.
    pub fn spawn_offset(&self) -> Position {
        Position::new(0.0, self.bounds.height() + SPAWN_MARGIN)
    }
}

/// Which node belongs to which box, taken once per driving step.
///
/// A node inside overlapping boxes belongs to the first of them.
#[derive(Debug, Clone, Default)]
pub struct BoxLayout {
    membership: HashMap<NodeKey, RuleBoxId>,
    members: HashMap<RuleBoxId, Vec<NodeKey>>,
}

impl BoxLayout {
    pub fn new(graph: &HostGraph, boxes: &[RuleBox]) -> Self {
        let mut layout = BoxLayout::default();
        for rule_box in boxes {
            let members = rule_box
                .contained_nodes(graph)
                .into_iter()
                .filter(|key| !layout.membership.contains_key(key))
                .collect::<Vec<_>>();
            for &key in &members {
                layout.membership.insert(key, rule_box.id);
            }
            layout.members.entry(rule_box.id).or_default().extend(members);
        }
        layout
    }

    pub fn box_of(&self, node: NodeKey) -> Option<RuleBoxId> {
        self.membership.get(&node).copied()
    }

    pub fn members(&self, id: RuleBoxId) -> &[NodeKey] {
        self.members.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Nodes rules are searched in: outside every box, and not program structure.
    pub fn search_pool(&self, graph: &HostGraph) -> Vec<NodeKey> {
        let mut pool = graph
            .node_keys()
            .filter(|key| !self.membership.contains_key(key) && !is_meta_node(graph, *key))
            .collect::<Vec<_>>();
        pool.sort();
        pool
    }
}

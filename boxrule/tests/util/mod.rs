#![allow(dead_code)]

use boxrule::{EdgeData, HostGraph, Label, NodeData, NodeKey, Position, Rect, RuleBox, RuleBoxId};

/// Host data lives far below the rule boxes.
pub const DATA_Y: f64 = 1000.0;
pub const BOX_SIZE: f64 = 100.0;

/// A canvas with rule boxes side by side along the top.
pub struct Canvas {
    pub graph: HostGraph,
    pub boxes: Vec<RuleBox>,
    data_x: f64,
}

/// Handles to the nodes of one drawn box.
pub struct DrawnBox {
    pub id: RuleBoxId,
    origin: Position,
    next: f64,
}

impl Canvas {
    pub fn new() -> Self {
        Canvas {
            graph: HostGraph::new(),
            boxes: Vec::new(),
            data_x: 0.0,
        }
    }

    pub fn rule_box(&mut self) -> DrawnBox {
        let id = RuleBoxId(self.boxes.len() as u32);
        let origin = Position::new(self.boxes.len() as f64 * 2.0 * BOX_SIZE, 0.0);
        self.boxes.push(RuleBox::new(
            id,
            Rect::new(origin.x, origin.y, BOX_SIZE, BOX_SIZE),
        ));
        DrawnBox {
            id,
            origin,
            next: 5.0,
        }
    }

    /// A node inside `drawn`, on the next free spot.
    pub fn draw(&mut self, drawn: &mut DrawnBox, label: &str) -> NodeKey {
        let x = drawn.next % 90.0;
        let y = 5.0 + (drawn.next / 90.0).floor() * 10.0;
        drawn.next += 10.0;
        self.graph
            .add_node(NodeData::new(label, drawn.origin + Position::new(x, y)))
    }

    /// A node outside every box.
    pub fn data(&mut self, label: &str) -> NodeKey {
        self.data_x += 30.0;
        self.graph
            .add_node(NodeData::new(label, Position::new(self.data_x, DATA_Y)))
    }

    pub fn data_chain(&mut self, labels: &[&str]) -> Vec<NodeKey> {
        let keys = labels.iter().map(|l| self.data(l)).collect::<Vec<_>>();
        for pair in keys.windows(2) {
            self.edge(pair[0], pair[1]);
        }
        keys
    }

    /// A pointer attached to `port`, placed between the boxes and the data.
    pub fn pointer(&mut self, port: NodeKey) -> NodeKey {
        self.data_x += 30.0;
        let pointer = self
            .graph
            .add_node(NodeData::new("pointer", Position::new(self.data_x, DATA_Y / 2.0)));
        self.edge(pointer, port);
        pointer
    }

    pub fn edge(&mut self, a: NodeKey, b: NodeKey) {
        self.graph.add_edge(a, b, EdgeData::default()).unwrap();
    }

    pub fn members(&self, drawn: &DrawnBox) -> Vec<NodeKey> {
        self.boxes[drawn.id.0 as usize].contained_nodes(&self.graph)
    }

    pub fn box_of(&self, drawn: &DrawnBox) -> &RuleBox {
        &self.boxes[drawn.id.0 as usize]
    }

    /// Nodes with `label` that are outside every box.
    pub fn outside_labeled(&self, label: &str) -> Vec<NodeKey> {
        let label = Label::from(label);
        let mut keys = self
            .graph
            .nodes()
            .filter(|(_, attr)| attr.label == label)
            .filter(|(_, attr)| !self.boxes.iter().any(|b| b.bounds.contains(attr.position)))
            .map(|(key, _)| key)
            .collect::<Vec<_>>();
        keys.sort();
        keys
    }

    /// The port a pointer is attached to.
    pub fn pointer_port(&self, pointer: NodeKey) -> Option<NodeKey> {
        self.graph.neighbors(pointer).next()
    }
}

/// All node keys, sorted.
pub fn all_nodes(graph: &HostGraph) -> Vec<NodeKey> {
    let mut keys = graph.node_keys().collect::<Vec<_>>();
    keys.sort();
    keys
}

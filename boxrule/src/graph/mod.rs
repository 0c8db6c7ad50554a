use crate::label::Label;
use derive_more::From;
use petgraph::Undirected;
use petgraph::graphmap::GraphMap;
use std::collections::HashMap;
use std::hash::RandomState;
use thiserror::Error;

pub mod dot;

pub use dot::DotCollector;

#[derive(Hash, Eq, PartialEq, derive_more::Debug, Clone, Copy, PartialOrd, Ord, From)]
#[debug("N({_0})")]
pub struct NodeKey(pub u32);
pub type EdgeKey = (NodeKey, NodeKey);

/// A point on the canvas. Matching never looks at it; placement does.
#[derive(Debug, Clone, Copy, PartialEq, Default, derive_more::Add, derive_more::AddAssign)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Position { x, y }
    }

    pub fn scaled(self, factor: f64) -> Self {
        Position {
            x: self.x * factor,
            y: self.y * factor,
        }
    }
}

/// Anything that can sit in a node and be matched by label.
pub trait Labeled {
    fn label(&self) -> Label;
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodeData {
    pub label: Label,
    pub position: Position,
}

impl NodeData {
    pub fn new(label: impl Into<Label>, position: Position) -> Self {
        NodeData {
            label: label.into(),
            position,
        }
    }
}

impl Labeled for NodeData {
    fn label(&self) -> Label {
        self.label
    }
}

impl Labeled for Label {
    fn label(&self) -> Label {
        *self
    }
}

/// Edge geometry. Only the layout reads the length.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeData {
    pub length: f64,
}

impl EdgeData {
    pub const DEFAULT_LENGTH: f64 = 80.0;

    pub fn new(length: f64) -> Self {
        EdgeData { length }
    }
}

impl Default for EdgeData {
    fn default() -> Self {
        EdgeData::new(EdgeData::DEFAULT_LENGTH)
    }
}

/// The live graph that rules are searched in and applied to.
pub type HostGraph = Graph<NodeData, EdgeData>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("node {0:?} does not exist")]
    UnknownNode(NodeKey),
    #[error("self loops are not allowed, got one on {0:?}")]
    SelfLoop(NodeKey),
}

/// An undirected graph with arbitrary associated node and edge data.
///
/// There is at most one edge between two nodes and no edge from a node to itself.
/// Node keys are never reused, so a key taken before a deletion can not silently
/// start referring to a different node.
#[derive(Clone, Debug)]
pub struct Graph<NodeAttr, EdgeAttr> {
    pub(crate) graph: GraphMap<NodeKey, EdgeAttr, Undirected, RandomState>,
    max_node_key: NodeKey,
    pub(crate) node_attr_map: HashMap<NodeKey, NodeAttr>,
}

impl<NodeAttr, EdgeAttr> Default for Graph<NodeAttr, EdgeAttr> {
    fn default() -> Self {
        Graph::new()
    }
}

impl<NodeAttr, EdgeAttr> Graph<NodeAttr, EdgeAttr> {
    pub fn new() -> Self {
        Graph {
            graph: GraphMap::new(),
            max_node_key: NodeKey(0),
            node_attr_map: HashMap::new(),
        }
    }

    pub fn add_node(&mut self, node_attr: NodeAttr) -> NodeKey {
        let node_key = self.graph.add_node(self.max_node_key);
        self.node_attr_map.insert(node_key, node_attr);
        self.max_node_key.0 += 1;
        node_key
    }

    /// Returns the old `EdgeAttr` if the edge already existed.
    pub fn add_edge(
        &mut self,
        source: impl Into<NodeKey>,
        target: impl Into<NodeKey>,
        edge_attr: EdgeAttr,
    ) -> Result<Option<EdgeAttr>, GraphError> {
        let source = source.into();
        let target = target.into();
        for key in [source, target] {
            if !self.contains_node(key) {
                return Err(GraphError::UnknownNode(key));
            }
        }
        if source == target {
            return Err(GraphError::SelfLoop(source));
        }
        Ok(self.graph.add_edge(source, target, edge_attr))
    }

    /// Adds an edge between two distinct nodes the caller just created or copied.
    pub(crate) fn link(&mut self, source: NodeKey, target: NodeKey, edge_attr: EdgeAttr) {
        debug_assert!(self.contains_node(source) && self.contains_node(target));
        debug_assert_ne!(source, target);
        self.graph.add_edge(source, target, edge_attr);
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeKey, &NodeAttr)> {
        self.graph
            .nodes()
            .filter_map(|key| self.node_attr_map.get(&key).map(|attr| (key, attr)))
    }

    pub fn node_keys(&self) -> impl Iterator<Item = NodeKey> + '_ {
        self.graph.nodes()
    }

    pub fn edges(&self) -> impl Iterator<Item = (NodeKey, NodeKey, &EdgeAttr)> {
        self.graph.all_edges()
    }

    pub fn neighbors(&self, node_key: NodeKey) -> impl Iterator<Item = NodeKey> + '_ {
        self.graph.neighbors(node_key)
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn contains_node(&self, node_key: NodeKey) -> bool {
        self.graph.contains_node(node_key)
    }

    pub fn contains_edge(&self, a: NodeKey, b: NodeKey) -> bool {
        self.graph.contains_edge(a, b)
    }

    pub fn remove_node(&mut self, node_key: NodeKey) -> Option<NodeAttr> {
        let node_attr = self.node_attr_map.remove(&node_key)?;
        self.graph.remove_node(node_key);
        Some(node_attr)
    }

    pub fn remove_edge(&mut self, (a, b): EdgeKey) -> Option<EdgeAttr> {
        self.graph.remove_edge(a, b)
    }

    pub fn get_edge_attr(&self, (a, b): EdgeKey) -> Option<&EdgeAttr> {
        self.graph.edge_weight(a, b)
    }

    pub fn get_node_attr(&self, node_key: NodeKey) -> Option<&NodeAttr> {
        self.node_attr_map.get(&node_key)
    }

    pub fn get_mut_node_attr(&mut self, node_key: NodeKey) -> Option<&mut NodeAttr> {
        self.node_attr_map.get_mut(&node_key)
    }

    /// Sets the node attribute for the given node key that already exists in the graph.
    pub fn set_node_attr(&mut self, node_key: NodeKey, node_attr: NodeAttr) -> Option<NodeAttr> {
        let attr = self.node_attr_map.get_mut(&node_key)?;
        Some(std::mem::replace(attr, node_attr))
    }
}

impl<EdgeAttr> Graph<NodeData, EdgeAttr> {
    pub fn label(&self, node_key: NodeKey) -> Option<Label> {
        self.get_node_attr(node_key).map(|attr| attr.label)
    }

    pub fn position(&self, node_key: NodeKey) -> Option<Position> {
        self.get_node_attr(node_key).map(|attr| attr.position)
    }

    pub fn set_label(&mut self, node_key: NodeKey, label: Label) -> Option<Label> {
        let attr = self.get_mut_node_attr(node_key)?;
        Some(std::mem::replace(&mut attr.label, label))
    }

    pub fn nodes_labeled(&self, label: Label) -> impl Iterator<Item = NodeKey> + '_ {
        self.nodes()
            .filter(move |(_, attr)| attr.label == label)
            .map(|(key, _)| key)
    }
}

use crate::graph::{Graph, Labeled};
use petgraph::dot;
use petgraph::dot::Dot;
use std::fmt::Debug;

impl<NA: Labeled, EA: Debug> Graph<NA, EA> {
    /// Renders the graph in DOT syntax, one `key|label` record per node.
    pub fn dot(&self) -> String {
        format!(
            "{:?}",
            Dot::with_attr_getters(
                &self.graph,
                &[dot::Config::EdgeNoLabel, dot::Config::NodeNoLabel],
                &|_g, (_src, _target, attr)| {
                    let dbg_attr_format = format!("{attr:?}");
                    let dbg_attr_replaced = dbg_attr_format.escape_debug();
                    format!("label = \"{dbg_attr_replaced}\"")
                },
                &|_g, (node, _)| {
                    let label = self
                        .node_attr_map
                        .get(&node)
                        .map(|attr| attr.label().to_string())
                        .unwrap_or_default();
                    let label_escaped = label.escape_debug();
                    format!("label = \"{}|{label_escaped}\"", node.0)
                }
            )
        )
    }
}

/// Collects several DOT renderings into one `---`-separated document, e.g. one
/// frame per driving step.
pub struct DotCollector {
    dot: String,
}

impl Default for DotCollector {
    fn default() -> Self {
        DotCollector::new()
    }
}

impl DotCollector {
    pub fn new() -> Self {
        DotCollector { dot: String::new() }
    }

    pub fn collect<NA: Labeled, EA: Debug>(&mut self, graph: &Graph<NA, EA>) {
        self.collect_raw(&graph.dot());
    }

    pub fn collect_raw(&mut self, dot: &str) {
        if !self.dot.is_empty() {
            self.dot.push_str("\n---\n");
        }
        self.dot.push_str(dot);
    }

    pub fn finalize(&self) -> String {
        self.dot.clone()
    }
}

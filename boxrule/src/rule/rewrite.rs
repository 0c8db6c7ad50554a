use crate::graph::{EdgeData, HostGraph, NodeData, NodeKey, Position};
use crate::placement::Placement;
use crate::rule::{RewriteError, RewriteResult, RuleMatch};
use error_stack::{ResultExt, bail, report};
use std::collections::{HashMap, HashSet};

/// An edge between an inserted node and an invariant (matched) node.
///
/// The inserted endpoint always comes first.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CrossEdge {
    pub inserted: NodeKey,
    pub invariant: NodeKey,
    pub length: f64,
}

/// What a compiled rule adds to the host for every match.
#[derive(Debug, Clone)]
pub struct RewriteTemplate {
    /// Operator and operand nodes with the edges among them. Keys are the rule
    /// graph's own keys, not host keys.
    pub(crate) inserted: HostGraph,
    pub(crate) cross_edges: Vec<CrossEdge>,
    /// Added to each drawn position before placement.
    pub(crate) spawn_offset: Position,
}

impl RewriteTemplate {
    pub fn inserted(&self) -> &HostGraph {
        &self.inserted
    }

    pub fn cross_edges(&self) -> &[CrossEdge] {
        &self.cross_edges
    }

    pub fn spawn_offset(&self) -> Position {
        self.spawn_offset
    }

    pub fn is_empty(&self) -> bool {
        self.inserted.node_count() == 0
    }

    pub(crate) fn apply(
        &self,
        host: &mut HostGraph,
        rule_match: &RuleMatch,
        placement: &mut dyn Placement,
    ) -> RewriteResult<Vec<NodeKey>> {
        let mut clones = HashMap::new();
        let mut template_keys = self.inserted.node_keys().collect::<Vec<_>>();
        template_keys.sort();
        for key in template_keys {
            let Some(attr) = self.inserted.get_node_attr(key) else {
                continue;
            };
            let label = rule_match.context.substitute(attr.label);
            let clone = host.add_node(NodeData::new(label, attr.position + self.spawn_offset));
            clones.insert(key, clone);
        }

        let clone_of = |key: NodeKey| {
            clones
                .get(&key)
                .copied()
                .ok_or_else(|| report!(RewriteError::UnmatchedPatternNode(key)))
        };

        for (a, b, edge) in self.inserted.edges() {
            let (a, b) = (clone_of(a)?, clone_of(b)?);
            if host
                .add_edge(a, b, *edge)
                .change_context(RewriteError::Graph)?
                .is_some()
            {
                bail!(RewriteError::DuplicateEdge(a, b));
            }
        }

        for cross in &self.cross_edges {
            let inserted = clone_of(cross.inserted)?;
            let invariant = *rule_match
                .mapping
                .get(&cross.invariant)
                .ok_or_else(|| report!(RewriteError::UnmatchedPatternNode(cross.invariant)))?;
            if host
                .add_edge(inserted, invariant, EdgeData::new(cross.length))
                .change_context(RewriteError::Graph)
                .attach_printable_lazy(|| format!("cross edge {cross:?}"))?
                .is_some()
            {
                bail!(RewriteError::DuplicateEdge(inserted, invariant));
            }
        }

        let mut anchors = rule_match.mapping.values().copied().collect::<Vec<_>>();
        anchors.sort();
        let mut new_nodes = clones.into_values().collect::<Vec<_>>();
        new_nodes.sort();
        let inserted = new_nodes.iter().copied().collect::<HashSet<_>>();
        placement.place(host, &inserted, &anchors);
        Ok(new_nodes)
    }
}

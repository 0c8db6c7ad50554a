use crate::graph::{Graph, Labeled, NodeKey};
use crate::pattern_match::unify::LabelMatcher;
use crate::pattern_match::{InjectiveMatch, Matcher, find_injective_matches};
use crate::util::bimap::BiMap;

/// Finds monomorphisms of a pattern graph into a host graph.
///
/// A candidate host node is accepted for a pattern node if the labels match
/// and every already-assigned pattern neighbor is assigned to a host neighbor
/// of the candidate. The host may have edges the pattern does not.
///
/// Negative edges are pattern node pairs whose images must *not* be adjacent.
pub struct SubgraphMatcher<'g, N, E, L> {
    pattern: &'g Graph<N, E>,
    host: &'g Graph<N, E>,
    labels: L,
    negative_edges: Vec<(NodeKey, NodeKey)>,
}

impl<'g, N: Labeled, E, L: LabelMatcher> SubgraphMatcher<'g, N, E, L> {
    pub fn new(pattern: &'g Graph<N, E>, host: &'g Graph<N, E>, labels: L) -> Self {
        SubgraphMatcher {
            pattern,
            host,
            labels,
            negative_edges: Vec::new(),
        }
    }

    pub fn with_negative_edges(
        mut self,
        negative_edges: impl IntoIterator<Item = (NodeKey, NodeKey)>,
    ) -> Self {
        self.negative_edges.extend(negative_edges);
        self
    }

    /// Runs the search with the given pattern node order over the given host nodes.
    pub fn find_matches(
        &self,
        pool: &[NodeKey],
        order: &[NodeKey],
    ) -> Vec<InjectiveMatch<NodeKey, NodeKey, L::Context>> {
        find_injective_matches(pool, order, self)
    }

    fn labels_match(&self, pattern: NodeKey, candidate: NodeKey, context: &L::Context) -> bool {
        let (Some(pattern_attr), Some(host_attr)) = (
            self.pattern.get_node_attr(pattern),
            self.host.get_node_attr(candidate),
        ) else {
            return false;
        };
        self.labels
            .check(&pattern_attr.label(), &host_attr.label(), context)
    }

    fn neighbors_consistent(
        &self,
        pattern: NodeKey,
        candidate: NodeKey,
        partial: &BiMap<NodeKey, NodeKey>,
    ) -> bool {
        self.pattern.neighbors(pattern).all(|pattern_neighbor| {
            partial
                .get_left(&pattern_neighbor)
                .is_none_or(|&image| self.host.contains_edge(candidate, image))
        })
    }

    fn negative_edges_respected(
        &self,
        pattern: NodeKey,
        candidate: NodeKey,
        partial: &BiMap<NodeKey, NodeKey>,
    ) -> bool {
        self.negative_edges.iter().all(|&(a, b)| {
            let other = if a == pattern {
                b
            } else if b == pattern {
                a
            } else {
                return true;
            };
            partial
                .get_left(&other)
                .is_none_or(|&image| !self.host.contains_edge(candidate, image))
        })
    }
}

impl<N: Labeled, E, L: LabelMatcher> Matcher<NodeKey, NodeKey> for SubgraphMatcher<'_, N, E, L> {
    type Context = L::Context;

    fn check(
        &self,
        pattern: &NodeKey,
        candidate: &NodeKey,
        partial: &BiMap<NodeKey, NodeKey>,
        context: &Self::Context,
    ) -> bool {
        self.labels_match(*pattern, *candidate, context)
            && self.neighbors_consistent(*pattern, *candidate, partial)
            && self.negative_edges_respected(*pattern, *candidate, partial)
    }

    fn updated(
        &self,
        pattern: &NodeKey,
        candidate: &NodeKey,
        context: &Self::Context,
    ) -> Self::Context {
        match (
            self.pattern.get_node_attr(*pattern),
            self.host.get_node_attr(*candidate),
        ) {
            (Some(pattern_attr), Some(host_attr)) => {
                self.labels
                    .updated(&pattern_attr.label(), &host_attr.label(), context)
            }
            // unreachable after a successful check
            _ => context.clone(),
        }
    }

    fn empty(&self) -> Self::Context {
        self.labels.empty()
    }
}

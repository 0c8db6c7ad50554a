//! Rules: a pattern to search for plus what to do with each match.
//!
//! Rules come from two places. Rule boxes drawn by the user are compiled into
//! rewrite rules by [`compile`]; they insert fresh nodes, among them operator
//! nodes. The built-in rules of [`operator`] then execute those operator nodes.

pub mod cache;
pub mod compile;
pub mod operator;
pub mod rewrite;

use crate::graph::{HostGraph, NodeKey};
use crate::label::Label;
use crate::pattern_match::{Bindings, InjectiveMatch, SubgraphMatcher, VariableUnifier, still_accepted};
use crate::placement::Placement;
use crate::util::log;
use error_stack::{bail, report};
use operator::OperatorAction;
use rewrite::RewriteTemplate;
use std::collections::{HashMap, HashSet};
use thiserror::Error;

/// An embedding of a rule's pattern into the host, plus the variable bindings it produced.
pub type RuleMatch = InjectiveMatch<NodeKey, NodeKey, Bindings>;

pub type RewriteResult<T> = error_stack::Result<T, RewriteError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RewriteError {
    #[error("pattern node {0:?} has no image in the match")]
    UnmatchedPatternNode(NodeKey),
    #[error("host node {0:?} is not in the graph")]
    MissingHostNode(NodeKey),
    #[error("host node {0:?} is the image of more than one pattern node")]
    NonInjectiveEmbedding(NodeKey),
    #[error("edge between {0:?} and {1:?} already exists")]
    DuplicateEdge(NodeKey, NodeKey),
    #[error("graph store rejected a mutation")]
    Graph,
}

pub(crate) enum RuleAction {
    Rewrite(RewriteTemplate),
    Operator(OperatorAction),
}

pub struct Rule {
    name: String,
    pattern: HostGraph,
    unifier: VariableUnifier,
    negative_edges: Vec<(NodeKey, NodeKey)>,
    action: RuleAction,
}

impl Rule {
    pub(crate) fn new(
        name: impl Into<String>,
        pattern: HostGraph,
        unifier: VariableUnifier,
        negative_edges: Vec<(NodeKey, NodeKey)>,
        action: RuleAction,
    ) -> Self {
        Rule {
            name: name.into(),
            pattern,
            unifier,
            negative_edges,
            action,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pattern(&self) -> &HostGraph {
        &self.pattern
    }

    pub fn variables(&self) -> &HashSet<Label> {
        self.unifier.variables()
    }

    pub fn excluded_domain(&self) -> Option<&HashSet<Label>> {
        self.unifier.excluded_domain()
    }

    pub fn negative_edges(&self) -> &[(NodeKey, NodeKey)] {
        &self.negative_edges
    }

    /// The insertion half of a compiled rule. `None` for built-in operator rules.
    pub fn template(&self) -> Option<&RewriteTemplate> {
        match &self.action {
            RuleAction::Rewrite(template) => Some(template),
            RuleAction::Operator(_) => None,
        }
    }

    /// A rule without pattern nodes fires unconditionally, exactly once per search.
    pub fn is_unconditional(&self) -> bool {
        self.pattern.node_count() == 0
    }

    /// Pattern nodes with the rarest labels first, so dead branches die early.
    ///
    /// Wildcards and variables can match anything and go last.
    pub fn search_order(&self, frequencies: &LabelFrequencies) -> Vec<NodeKey> {
        let mut order = self
            .pattern
            .nodes()
            .map(|(key, attr)| {
                let weight = if self.unifier.is_open(&attr.label) {
                    frequencies.total()
                } else {
                    frequencies.get(&attr.label)
                };
                (weight, key)
            })
            .collect::<Vec<_>>();
        order.sort();
        order.into_iter().map(|(_, key)| key).collect()
    }

    /// All matches of this rule among the `pool` nodes of `host`.
    pub fn find_matches(
        &self,
        host: &HostGraph,
        pool: &[NodeKey],
        frequencies: &LabelFrequencies,
    ) -> Vec<RuleMatch> {
        if self.is_unconditional() {
            return vec![RuleMatch {
                mapping: HashMap::new(),
                context: Bindings::new(),
            }];
        }
        let order = self.search_order(frequencies);
        let matches = SubgraphMatcher::new(&self.pattern, host, &self.unifier)
            .with_negative_edges(self.negative_edges.iter().copied())
            .find_matches(pool, &order);
        log::trace!("rule `{}` has {} matches", self.name, matches.len());
        matches
    }

    /// Whether `rule_match` is still a match of this rule in `host`.
    ///
    /// Re-checks labels, adjacency and negative edges of the stored embedding,
    /// so a match invalidated by relabelling or new edges is rejected too.
    pub fn still_matches(&self, host: &HostGraph, rule_match: &RuleMatch) -> bool {
        if self.is_unconditional() {
            return true;
        }
        let mut order = self.pattern.node_keys().collect::<Vec<_>>();
        order.sort();
        if order.iter().any(|key| rule_match.get(key).is_none_or(|&n| !host.contains_node(n))) {
            return false;
        }
        let matcher = SubgraphMatcher::new(&self.pattern, host, &self.unifier)
            .with_negative_edges(self.negative_edges.iter().copied());
        still_accepted(&order, rule_match, &matcher)
    }

    /// Applies the rule at `rule_match`. Returns the nodes inserted into `host`.
    pub fn apply(
        &self,
        host: &mut HostGraph,
        rule_match: &RuleMatch,
        placement: &mut dyn Placement,
    ) -> RewriteResult<Vec<NodeKey>> {
        self.validate_embedding(host, rule_match)?;
        log::debug!("applying rule `{}` at {:?}", self.name, rule_match.mapping);
        match &self.action {
            RuleAction::Rewrite(template) => template.apply(host, rule_match, placement),
            RuleAction::Operator(action) => {
                action.apply(host, &rule_match.mapping)?;
                Ok(Vec::new())
            }
        }
    }

    fn validate_embedding(&self, host: &HostGraph, rule_match: &RuleMatch) -> RewriteResult<()> {
        let mut images = HashSet::new();
        for key in self.pattern.node_keys() {
            let image = *rule_match
                .mapping
                .get(&key)
                .ok_or_else(|| report!(RewriteError::UnmatchedPatternNode(key)))?;
            if !host.contains_node(image) {
                bail!(RewriteError::MissingHostNode(image));
            }
            if !images.insert(image) {
                bail!(RewriteError::NonInjectiveEmbedding(image));
            }
        }
        Ok(())
    }
}

/// How often each label occurs among the searchable host nodes.
#[derive(Debug, Clone, Default)]
pub struct LabelFrequencies {
    counts: HashMap<Label, usize>,
    total: usize,
}

impl LabelFrequencies {
    pub fn count(host: &HostGraph, pool: &[NodeKey]) -> Self {
        let mut counts = HashMap::new();
        for label in pool.iter().filter_map(|&key| host.label(key)) {
            *counts.entry(label).or_insert(0) += 1;
        }
        LabelFrequencies {
            counts,
            total: pool.len(),
        }
    }

    pub fn get(&self, label: &Label) -> usize {
        self.counts.get(label).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.total
    }
}

//! Built-in rules that execute operator nodes.
//!
//! A compiled rule never edits existing host content directly: it only
//! inserts operator nodes next to the nodes it matched. The rules in here then
//! find those operator nodes and carry them out, removing each operator as it
//! fires. Repeating that until nothing matches is called settling.

use crate::graph::{EdgeData, HostGraph, NodeData, NodeKey, Position};
use crate::label::{Label, Operator, WILDCARD};
use crate::pattern_match::VariableUnifier;
use crate::placement::Placement;
use crate::rule::{LabelFrequencies, RewriteError, RewriteResult, Rule, RuleAction, RuleMatch};
use crate::util::log;
use error_stack::{ResultExt, bail, report};
use rand::Rng;
use rand::seq::IndexedRandom;
use std::collections::HashMap;

/// What a built-in rule does with the host images of its pattern nodes.
///
/// The keys are pattern node keys.
#[derive(Debug, Clone, Copy)]
pub(crate) enum OperatorAction {
    Retire {
        op: NodeKey,
    },
    Delete {
        op: NodeKey,
        target: NodeKey,
    },
    Set {
        op: NodeKey,
        value: NodeKey,
        target: NodeKey,
    },
    Connect {
        op: NodeKey,
        a: NodeKey,
        b: NodeKey,
    },
    Disconnect {
        op: NodeKey,
        a: NodeKey,
        b: NodeKey,
    },
}

impl OperatorAction {
    pub(crate) fn apply(
        self,
        host: &mut HostGraph,
        mapping: &HashMap<NodeKey, NodeKey>,
    ) -> RewriteResult<()> {
        let image = |key: NodeKey| {
            mapping
                .get(&key)
                .copied()
                .ok_or_else(|| report!(RewriteError::UnmatchedPatternNode(key)))
        };
        match self {
            OperatorAction::Retire { op } => {
                remove(host, image(op)?)?;
            }
            OperatorAction::Delete { op, target } => {
                remove(host, image(target)?)?;
                remove(host, image(op)?)?;
            }
            OperatorAction::Set { op, value, target } => {
                let (value, target) = (image(value)?, image(target)?);
                let label = host
                    .label(value)
                    .ok_or_else(|| report!(RewriteError::MissingHostNode(value)))?;
                host.set_label(target, label)
                    .ok_or_else(|| report!(RewriteError::MissingHostNode(target)))?;
                remove(host, value)?;
                remove(host, image(op)?)?;
            }
            OperatorAction::Connect { op, a, b } => {
                let (op, a, b) = (image(op)?, image(a)?, image(b)?);
                let length = [a, b]
                    .into_iter()
                    .filter_map(|end| host.get_edge_attr((op, end)))
                    .map(|edge| edge.length)
                    .fold(EdgeData::DEFAULT_LENGTH, f64::max);
                if host
                    .add_edge(a, b, EdgeData::new(length))
                    .change_context(RewriteError::Graph)?
                    .is_some()
                {
                    bail!(RewriteError::DuplicateEdge(a, b));
                }
                remove(host, op)?;
            }
            OperatorAction::Disconnect { op, a, b } => {
                let (op, a, b) = (image(op)?, image(a)?, image(b)?);
                host.remove_edge((a, b));
                remove(host, op)?;
            }
        }
        Ok(())
    }
}

fn remove(host: &mut HostGraph, key: NodeKey) -> RewriteResult<NodeData> {
    host.remove_node(key)
        .ok_or_else(|| report!(RewriteError::MissingHostNode(key)))
}

/// Small helper for hand-built patterns.
#[derive(Default)]
struct PatternBuilder {
    graph: HostGraph,
}

impl PatternBuilder {
    fn node(&mut self, label: impl Into<Label>) -> NodeKey {
        self.graph.add_node(NodeData::new(label, Position::default()))
    }

    fn edge(&mut self, a: NodeKey, b: NodeKey) {
        self.graph.link(a, b, EdgeData::default());
    }
}

fn builtin_rules(operator: Operator) -> Vec<Rule> {
    let mut p = PatternBuilder::default();
    let op = p.node(operator.label());
    match operator {
        Operator::New => vec![Rule::new(
            "new",
            p.graph,
            VariableUnifier::default(),
            Vec::new(),
            RuleAction::Operator(OperatorAction::Retire { op }),
        )],
        Operator::Delete => {
            let target = p.node(WILDCARD);
            p.edge(op, target);
            vec![Rule::new(
                "delete",
                p.graph,
                VariableUnifier::default(),
                Vec::new(),
                RuleAction::Operator(OperatorAction::Delete { op, target }),
            )]
        }
        Operator::Set => {
            let value = p.node("val");
            let target = p.node("target");
            p.edge(op, value);
            p.edge(value, target);
            vec![Rule::new(
                "set",
                p.graph,
                VariableUnifier::new([Label::from("val"), Label::from("target")]),
                Vec::new(),
                RuleAction::Operator(OperatorAction::Set { op, value, target }),
            )]
        }
        Operator::Connect => {
            let a = p.node(WILDCARD);
            let b = p.node(WILDCARD);
            p.edge(a, op);
            p.edge(op, b);
            let connect = Rule::new(
                "connect",
                p.graph.clone(),
                VariableUnifier::default(),
                vec![(a, b)],
                RuleAction::Operator(OperatorAction::Connect { op, a, b }),
            );
            p.edge(a, b);
            let redundant = Rule::new(
                "connect (already connected)",
                p.graph,
                VariableUnifier::default(),
                Vec::new(),
                RuleAction::Operator(OperatorAction::Retire { op }),
            );
            vec![connect, redundant]
        }
        Operator::Disconnect => {
            let a = p.node(WILDCARD);
            let b = p.node(WILDCARD);
            p.edge(a, op);
            p.edge(op, b);
            vec![Rule::new(
                "disconnect",
                p.graph,
                VariableUnifier::default(),
                Vec::new(),
                RuleAction::Operator(OperatorAction::Disconnect { op, a, b }),
            )]
        }
    }
}

/// The built-in rules for every operator.
pub struct OperatorRules {
    rules: Vec<Rule>,
}

impl Default for OperatorRules {
    fn default() -> Self {
        OperatorRules::new()
    }
}

impl OperatorRules {
    pub fn new() -> Self {
        OperatorRules {
            rules: Operator::ALL.into_iter().flat_map(builtin_rules).collect(),
        }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn rule(&self, name: &str) -> Option<&Rule> {
        self.rules.iter().find(|rule| rule.name() == name)
    }

    /// Every match of every built-in rule.
    pub fn find_matches<'r>(&'r self, host: &HostGraph, pool: &[NodeKey]) -> Vec<(&'r Rule, RuleMatch)> {
        let frequencies = LabelFrequencies::count(host, pool);
        self.rules
            .iter()
            .flat_map(|rule| {
                rule.find_matches(host, pool, &frequencies)
                    .into_iter()
                    .map(move |m| (rule, m))
            })
            .collect()
    }

    /// Fires randomly chosen operator matches until none are left.
    ///
    /// `pool` is asked for the searchable nodes anew after every firing.
    /// Returns how many rules fired.
    pub fn settle<R: Rng + ?Sized>(
        &self,
        host: &mut HostGraph,
        pool: impl Fn(&HostGraph) -> Vec<NodeKey>,
        placement: &mut dyn Placement,
        rng: &mut R,
    ) -> RewriteResult<usize> {
        let mut fired = 0;
        loop {
            let candidates = self.find_matches(&*host, &pool(&*host));
            let Some((rule, chosen)) = candidates.choose(rng) else {
                break;
            };
            rule.apply(host, chosen, placement)
                .attach_printable_lazy(|| format!("operator rule `{}`", rule.name()))?;
            fired += 1;
        }
        if fired > 0 {
            log::debug!("settled {fired} operator nodes");
        }
        Ok(fired)
    }
}

//! Turns the graph drawn inside a rule box into a [`Rule`].
//!
//! Nodes of a rule box fall into three groups:
//! - meta nodes (quantifier anchors, control ports, pointers, error markers
//!   and their messages), which are dropped;
//! - inserted nodes: operator nodes plus the operands hanging off `new` and
//!   `set`, which are added to the host for every match;
//! - invariant nodes: everything else, which forms the pattern.

use crate::graph::{HostGraph, NodeKey, Position};
use crate::label::{Label, Operator};
use crate::pattern_match::VariableUnifier;
use crate::rule::rewrite::{CrossEdge, RewriteTemplate};
use crate::rule::{Rule, RuleAction};
use crate::util::log;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompileOptions {
    /// Forbid variables from binding to any constant label drawn in the same rule.
    ///
    /// Keeps `∀ x` rules from unifying `x` with labels the rule itself uses,
    /// which is usually what a drawn rule means. Not always, so it can be
    /// switched off.
    pub exclude_rule_constants: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        CompileOptions {
            exclude_rule_constants: true,
        }
    }
}

/// Whether `key` only structures the program: a meta label, or a message attached to an error marker.
pub fn is_meta_node(graph: &HostGraph, key: NodeKey) -> bool {
    let Some(label) = graph.label(key) else {
        return false;
    };
    label.is_meta()
        || graph
            .neighbors(key)
            .any(|n| graph.label(n).is_some_and(|l| l.is_error()))
}

/// Compiles the subgraph of `graph` induced by `members`.
///
/// Inserted nodes are spawned at their drawn position plus `spawn_offset`
/// before placement runs.
pub fn compile_rule(
    name: impl Into<String>,
    graph: &HostGraph,
    members: &[NodeKey],
    spawn_offset: Position,
    options: &CompileOptions,
) -> Rule {
    let name = name.into();
    let member_set = members.iter().copied().collect::<HashSet<_>>();
    let mut members = members
        .iter()
        .copied()
        .filter(|&key| graph.contains_node(key))
        .collect::<Vec<_>>();
    members.sort();
    members.dedup();
    let in_box = &member_set;
    let label = |key: NodeKey| graph.label(key);
    let box_neighbors =
        move |key: NodeKey| graph.neighbors(key).filter(move |n| in_box.contains(n));

    // free variables: labels of the quantifier anchors' neighbors
    let mut variables = HashSet::new();
    for &anchor in members
        .iter()
        .filter(|&&key| label(key).is_some_and(|l| l.is_quantifier()))
    {
        variables.extend(
            box_neighbors(anchor)
                .filter_map(label)
                .filter(|l| !l.is_meta() && !l.is_wildcard()),
        );
    }

    let normal = members
        .iter()
        .copied()
        .filter(|&key| !is_meta_node(graph, key))
        .collect::<Vec<_>>();
    let normal_set = normal.iter().copied().collect::<HashSet<_>>();

    let operators = normal
        .iter()
        .filter_map(|&key| label(key)?.operator().map(|op| (key, op)))
        .collect::<HashMap<NodeKey, Operator>>();
    let mut inserted = operators.keys().copied().collect::<HashSet<_>>();
    for (&op_key, op) in &operators {
        if op.introduces_operands() {
            inserted.extend(
                box_neighbors(op_key).filter(|n| normal_set.contains(n) && !operators.contains_key(n)),
            );
        }
    }

    // pattern and template are copies, later edits to the box do not reach them
    let mut pattern = HostGraph::new();
    let mut template = HostGraph::new();
    let mut to_pattern = HashMap::new();
    let mut to_template = HashMap::new();
    for &key in &normal {
        let Some(attr) = graph.get_node_attr(key) else {
            continue;
        };
        if inserted.contains(&key) {
            to_template.insert(key, template.add_node(attr.clone()));
        } else {
            to_pattern.insert(key, pattern.add_node(attr.clone()));
        }
    }

    let mut cross_edges = Vec::new();
    for (a, b, edge) in graph.edges() {
        if !normal_set.contains(&a) || !normal_set.contains(&b) {
            continue;
        }
        match (to_pattern.get(&a), to_pattern.get(&b)) {
            (Some(&pa), Some(&pb)) => pattern.link(pa, pb, *edge),
            (None, None) => {
                if let (Some(&ta), Some(&tb)) = (to_template.get(&a), to_template.get(&b)) {
                    template.link(ta, tb, *edge);
                }
            }
            (Some(&invariant), None) | (None, Some(&invariant)) => {
                let outside = if to_pattern.contains_key(&a) { b } else { a };
                if let Some(&fresh) = to_template.get(&outside) {
                    cross_edges.push(CrossEdge {
                        inserted: fresh,
                        invariant,
                        length: edge.length,
                    });
                }
            }
        }
    }
    cross_edges.sort_by_key(|cross| (cross.inserted, cross.invariant));

    let mut negative_edges = Vec::new();
    for (&op_key, op) in &operators {
        if *op != Operator::Connect {
            continue;
        }
        let arguments = box_neighbors(op_key)
            .filter_map(|n| to_pattern.get(&n).copied())
            .collect::<Vec<_>>();
        if let [a, b] = arguments[..] {
            negative_edges.push((a.min(b), a.max(b)));
        }
    }
    negative_edges.sort();
    negative_edges.dedup();

    let mut unifier = VariableUnifier::new(variables);
    if options.exclude_rule_constants {
        let excluded = members
            .iter()
            .filter_map(|&key| label(key))
            .filter(|l| !l.is_wildcard() && !unifier.is_variable(l))
            .collect::<HashSet<Label>>();
        unifier = unifier.with_excluded_domain(excluded);
    }

    log::debug!(
        "compiled rule `{name}`: {} pattern nodes, {} inserted nodes, {} cross edges, {} variables, {} negative edges",
        pattern.node_count(),
        template.node_count(),
        cross_edges.len(),
        unifier.variables().len(),
        negative_edges.len()
    );

    Rule::new(
        name,
        pattern,
        unifier,
        negative_edges,
        RuleAction::Rewrite(RewriteTemplate {
            inserted: template,
            cross_edges,
            spawn_offset,
        }),
    )
}

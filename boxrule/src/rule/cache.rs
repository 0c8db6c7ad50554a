use crate::graph::{HostGraph, NodeKey};
use crate::interpreter::rule_box::{RuleBox, RuleBoxId};
use crate::rule::Rule;
use crate::rule::compile::{CompileOptions, compile_rule};
use crate::util::log;
use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, HashSet};
use std::hash::{Hash, Hasher};
use std::rc::Rc;

struct CachedRule {
    fingerprint: u64,
    rule: Rc<Rule>,
}

/// Compiled rules per rule box, recompiled only when the box's content changes.
#[derive(Default)]
pub struct RuleCache {
    entries: HashMap<RuleBoxId, CachedRule>,
    hits: usize,
    misses: usize,
}

impl RuleCache {
    pub fn new() -> Self {
        RuleCache::default()
    }

    /// The rule drawn in `rule_box`, whose nodes are `members`.
    pub fn get_or_compile(
        &mut self,
        graph: &HostGraph,
        rule_box: &RuleBox,
        members: &[NodeKey],
        options: &CompileOptions,
    ) -> Rc<Rule> {
        let fingerprint = fingerprint(graph, rule_box, members, options);
        if let Some(cached) = self.entries.get(&rule_box.id) {
            if cached.fingerprint == fingerprint {
                self.hits += 1;
                return Rc::clone(&cached.rule);
            }
            log::debug!("{} changed, recompiling", rule_box.name());
        }
        self.misses += 1;
        let rule = Rc::new(compile_rule(
            rule_box.name(),
            graph,
            members,
            rule_box.spawn_offset(),
            options,
        ));
        self.entries.insert(
            rule_box.id,
            CachedRule {
                fingerprint,
                rule: Rc::clone(&rule),
            },
        );
        rule
    }

    pub fn invalidate(&mut self, id: RuleBoxId) {
        self.entries.remove(&id);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Drops entries of boxes that no longer exist.
    pub fn retain_boxes(&mut self, boxes: &[RuleBox]) {
        let live = boxes.iter().map(|b| b.id).collect::<HashSet<_>>();
        self.entries.retain(|id, _| live.contains(id));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hits(&self) -> usize {
        self.hits
    }

    pub fn misses(&self) -> usize {
        self.misses
    }
}

/// Everything compilation reads: member keys, labels, positions, internal
/// edges, box bounds and options.
fn fingerprint(
    graph: &HostGraph,
    rule_box: &RuleBox,
    members: &[NodeKey],
    options: &CompileOptions,
) -> u64 {
    let mut hasher = DefaultHasher::new();
    let mut sorted = members.to_vec();
    sorted.sort();
    let member_set = sorted.iter().copied().collect::<HashSet<_>>();

    options.exclude_rule_constants.hash(&mut hasher);
    for bound in [
        rule_box.bounds.min.x,
        rule_box.bounds.min.y,
        rule_box.bounds.max.x,
        rule_box.bounds.max.y,
    ] {
        bound.to_bits().hash(&mut hasher);
    }
    for &key in &sorted {
        key.hash(&mut hasher);
        if let Some(attr) = graph.get_node_attr(key) {
            attr.label.as_str().hash(&mut hasher);
            attr.position.x.to_bits().hash(&mut hasher);
            attr.position.y.to_bits().hash(&mut hasher);
        }
        let mut neighbors = graph
            .neighbors(key)
            .filter(|n| *n > key && member_set.contains(n))
            .collect::<Vec<_>>();
        neighbors.sort();
        for n in neighbors {
            n.hash(&mut hasher);
            if let Some(edge) = graph.get_edge_attr((key, n)) {
                edge.length.to_bits().hash(&mut hasher);
            }
        }
        // error markers next to a member change what counts as meta
        graph
            .neighbors(key)
            .any(|n| graph.label(n).is_some_and(|l| l.is_error()))
            .hash(&mut hasher);
    }
    hasher.finish()
}

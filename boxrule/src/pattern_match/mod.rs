//! Backtracking search for injective assignments of pattern elements to host elements.
//!
//! The search itself knows nothing about graphs or labels. Everything domain
//! specific goes through a [`Matcher`]: it decides whether a candidate is
//! acceptable given the assignment so far, and threads a context (for example
//! variable bindings) through the search. [`subgraph::SubgraphMatcher`]
//! specializes this to graph monomorphisms, [`unify`] supplies label matching.

use crate::util::bimap::BiMap;
use crate::util::log;
use std::collections::HashMap;
use std::hash::Hash;

pub mod subgraph;
pub mod unify;

pub use subgraph::SubgraphMatcher;
pub use unify::{Bindings, ExactLabels, LabelMatcher, VariableUnifier};

/// Acceptance and context protocol driving [`find_injective_matches`].
pub trait Matcher<P, H> {
    type Context;

    /// Can `candidate` be assigned to `pattern`?
    ///
    /// `partial` holds the assignments made so far and does *not* yet contain
    /// `pattern`. `context` is the context produced by those assignments.
    fn check(&self, pattern: &P, candidate: &H, partial: &BiMap<P, H>, context: &Self::Context)
    -> bool;

    /// The context after assigning `candidate` to `pattern`.
    ///
    /// Must not modify `context`: sibling branches of the search still hold it.
    fn updated(&self, pattern: &P, candidate: &H, context: &Self::Context) -> Self::Context;

    /// The context before anything has been assigned.
    fn empty(&self) -> Self::Context;
}

/// A complete, injective assignment together with the context it produced.
#[derive(Debug, Clone)]
pub struct InjectiveMatch<P, H, C> {
    pub mapping: HashMap<P, H>,
    pub context: C,
}

impl<P: Eq + Hash, H, C> InjectiveMatch<P, H, C> {
    pub fn get(&self, pattern: &P) -> Option<&H> {
        self.mapping.get(pattern)
    }
}

struct Frame<H, C> {
    /// Untried candidates for this position, tried from the back.
    remaining: Vec<H>,
    /// Context produced by the positions before this one.
    context: C,
}

impl<H: Copy, C> Frame<H, C> {
    fn new(pool: &[H], context: C) -> Self {
        Frame {
            remaining: pool.iter().rev().copied().collect(),
            context,
        }
    }
}

/// Returns every complete injective assignment of `pattern` into `pool` that
/// `matcher` accepts.
///
/// Each position of `pattern` owns one search frame. The order of `pattern`
/// only affects how early dead branches are cut, never the set of results.
///
/// An empty `pattern` yields no matches at all, not a single empty one.
pub fn find_injective_matches<P, H, M>(
    pool: &[H],
    pattern: &[P],
    matcher: &M,
) -> Vec<InjectiveMatch<P, H, M::Context>>
where
    P: Copy + Eq + Hash,
    H: Copy + Eq + Hash,
    M: Matcher<P, H>,
{
    let mut matches = Vec::new();
    if pattern.is_empty() || pattern.len() > pool.len() {
        return matches;
    }

    let mut partial: BiMap<P, H> = BiMap::new();
    let mut frames = vec![Frame::new(pool, matcher.empty())];
    #[cfg(feature = "log")]
    let mut checked = 0usize;

    while !frames.is_empty() {
        let depth = frames.len() - 1;
        let pattern_elem = pattern[depth];
        // unwind whatever this position held on the previous iteration
        partial.remove_left(&pattern_elem);

        let frame = &mut frames[depth];
        let Some(candidate) = frame.remaining.pop() else {
            frames.pop();
            continue;
        };
        if partial.contains_right(&candidate) {
            continue;
        }
        #[cfg(feature = "log")]
        {
            checked += 1;
        }
        if !matcher.check(&pattern_elem, &candidate, &partial, &frame.context) {
            continue;
        }

        let context = matcher.updated(&pattern_elem, &candidate, &frame.context);
        partial.insert(pattern_elem, candidate);
        if depth + 1 == pattern.len() {
            matches.push(InjectiveMatch {
                mapping: partial.left_map().clone(),
                context,
            });
        } else {
            frames.push(Frame::new(pool, context));
        }
    }

    log::trace!(
        "injective search over {} candidates for {} positions: {} checks, {} matches",
        pool.len(),
        pattern.len(),
        checked,
        matches.len()
    );
    matches
}

/// Replays `order` through `matcher` along an existing assignment.
///
/// True if every element of `order` is assigned in `found`, each assignment
/// would still be accepted in that order, and the replayed context equals the
/// stored one.
pub fn still_accepted<P, H, M>(order: &[P], found: &InjectiveMatch<P, H, M::Context>, matcher: &M) -> bool
where
    P: Copy + Eq + Hash,
    H: Copy + Eq + Hash,
    M: Matcher<P, H>,
    M::Context: PartialEq,
{
    let mut partial = BiMap::new();
    let mut context = matcher.empty();
    for elem in order {
        let Some(&candidate) = found.get(elem) else {
            return false;
        };
        if partial.contains_right(&candidate) || !matcher.check(elem, &candidate, &partial, &context) {
            return false;
        }
        context = matcher.updated(elem, &candidate, &context);
        partial.insert(*elem, candidate);
    }
    context == found.context
}

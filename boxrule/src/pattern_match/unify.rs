//! Label matching with free variables.
//!
//! A pattern label is one of three things: the wildcard, which accepts any
//! label and binds nothing; a declared variable, which binds to the first label
//! it meets and must meet the same label everywhere else; or a constant, which
//! only accepts itself.

use crate::label::Label;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

/// Label-level half of a [`Matcher`](super::Matcher).
pub trait LabelMatcher {
    type Context: Clone;

    fn check(&self, pattern: &Label, candidate: &Label, context: &Self::Context) -> bool;

    fn updated(&self, pattern: &Label, candidate: &Label, context: &Self::Context)
    -> Self::Context;

    fn empty(&self) -> Self::Context;
}

impl<L: LabelMatcher> LabelMatcher for &L {
    type Context = L::Context;

    fn check(&self, pattern: &Label, candidate: &Label, context: &Self::Context) -> bool {
        (**self).check(pattern, candidate, context)
    }

    fn updated(
        &self,
        pattern: &Label,
        candidate: &Label,
        context: &Self::Context,
    ) -> Self::Context {
        (**self).updated(pattern, candidate, context)
    }

    fn empty(&self) -> Self::Context {
        (**self).empty()
    }
}

/// Constants and the wildcard, no variables.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactLabels;

impl LabelMatcher for ExactLabels {
    type Context = ();

    fn check(&self, pattern: &Label, candidate: &Label, _context: &()) -> bool {
        pattern.is_wildcard() || pattern == candidate
    }

    fn updated(&self, _pattern: &Label, _candidate: &Label, _context: &()) {}

    fn empty(&self) {}
}

/// Variable bindings of one match attempt.
///
/// Persistent: [`Bindings::with_binding`] returns a new value and leaves the
/// receiver alone, so backtracking never has to undo anything and two sibling
/// branches can not observe each other's bindings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bindings(Rc<HashMap<Label, Label>>);

impl Bindings {
    pub fn new() -> Self {
        Bindings::default()
    }

    pub fn get(&self, variable: &Label) -> Option<Label> {
        self.0.get(variable).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Label, &Label)> {
        self.0.iter()
    }

    #[must_use]
    pub fn with_binding(&self, variable: Label, value: Label) -> Self {
        let mut map = HashMap::clone(&self.0);
        map.insert(variable, value);
        Bindings(Rc::new(map))
    }

    /// Replaces `label` by its bound value if it is a bound variable.
    pub fn substitute(&self, label: Label) -> Label {
        self.get(&label).unwrap_or(label)
    }
}

/// Label matching with declared free variables.
#[derive(Debug, Clone, Default)]
pub struct VariableUnifier {
    variables: HashSet<Label>,
    /// Labels no variable may bind to, if set.
    excluded_domain: Option<HashSet<Label>>,
}

impl VariableUnifier {
    pub fn new(variables: impl IntoIterator<Item = Label>) -> Self {
        VariableUnifier {
            variables: variables.into_iter().collect(),
            excluded_domain: None,
        }
    }

    pub fn with_excluded_domain(mut self, excluded: impl IntoIterator<Item = Label>) -> Self {
        self.excluded_domain = Some(excluded.into_iter().collect());
        self
    }

    pub fn is_variable(&self, label: &Label) -> bool {
        self.variables.contains(label)
    }

    pub fn variables(&self) -> &HashSet<Label> {
        &self.variables
    }

    pub fn excluded_domain(&self) -> Option<&HashSet<Label>> {
        self.excluded_domain.as_ref()
    }

    /// Whether `label` can match more than one distinct host label.
    pub fn is_open(&self, label: &Label) -> bool {
        label.is_wildcard() || self.is_variable(label)
    }
}

impl LabelMatcher for VariableUnifier {
    type Context = Bindings;

    fn check(&self, pattern: &Label, candidate: &Label, context: &Bindings) -> bool {
        if pattern.is_wildcard() {
            return true;
        }
        if !self.is_variable(pattern) {
            return pattern == candidate;
        }
        if self
            .excluded_domain
            .as_ref()
            .is_some_and(|excluded| excluded.contains(candidate))
        {
            return false;
        }
        match context.get(pattern) {
            Some(bound) => bound == *candidate,
            None => true,
        }
    }

    fn updated(&self, pattern: &Label, candidate: &Label, context: &Bindings) -> Bindings {
        if pattern.is_wildcard() || !self.is_variable(pattern) || context.get(pattern).is_some() {
            return context.clone();
        }
        context.with_binding(*pattern, *candidate)
    }

    fn empty(&self) -> Bindings {
        Bindings::new()
    }
}

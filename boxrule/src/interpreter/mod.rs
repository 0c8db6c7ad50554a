//! Drives rule boxes with program pointers.
//!
//! A program pointer is a `pointer` node attached by one edge to a control
//! port. Attached to a box's `in` port, it asks that box's rule for matches.
//! If there are any, one is applied and the pointer moves to the box's `step`
//! port, otherwise it moves to the `exhausted` port. An out port wired to the
//! `in` port of another box hands the pointer over to that box.
//!
//! A box lacking the port a pointer needs gets an `error` marker next to the
//! pointer. While any error marker exists, nothing runs.

pub mod rule_box;

use crate::graph::{EdgeData, GraphError, HostGraph, NodeData, NodeKey, Position};
use crate::label::{ControlPort, ERROR, Label, POINTER};
use crate::placement::{NeighborAverage, Placement};
use crate::rule::cache::RuleCache;
use crate::rule::compile::{CompileOptions, compile_rule};
use crate::rule::operator::OperatorRules;
use crate::rule::{LabelFrequencies, Rule, RuleMatch};
use crate::util::log;
use error_stack::{ResultExt, bail};
use rand::Rng;
use rand::seq::IndexedRandom;
use rule_box::{BoxLayout, RuleBox, RuleBoxId};
use std::rc::Rc;
use thiserror::Error;

pub type InterpreterResult<T> = error_stack::Result<T, InterpreterError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InterpreterError {
    #[error("pointer {pointer:?} is not attached to {port:?}")]
    MissingPointerEdge { pointer: NodeKey, port: NodeKey },
    #[error("pointer {pointer:?} is already attached to {port:?}")]
    PointerAlreadyAttached { pointer: NodeKey, port: NodeKey },
    #[error("failed to apply rule `{0}`")]
    RuleApplication(String),
    #[error("failed to settle operator nodes")]
    OperatorSettling,
    #[error("failed to place an error marker at {0:?}")]
    ErrorMarker(NodeKey),
}

/// Where a pointer is and where it goes next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlTransfer {
    pub pointer: NodeKey,
    /// The port the pointer is attached to now.
    pub from: NodeKey,
    /// The `in` port of the box making the decision. Equal to `from` unless
    /// the pointer sits on an out port wired to it.
    pub in_port: NodeKey,
    pub rule_box: RuleBoxId,
    /// The chosen out port.
    pub to: NodeKey,
}

pub struct StepAction {
    pub rule: Rc<Rule>,
    pub matches: Vec<RuleMatch>,
    pub control: ControlTransfer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExhaustedAction {
    pub control: ControlTransfer,
}

pub enum ActionToken {
    Step(StepAction),
    Exhausted(ExhaustedAction),
}

impl ActionToken {
    pub fn control(&self) -> &ControlTransfer {
        match self {
            ActionToken::Step(step) => &step.control,
            ActionToken::Exhausted(exhausted) => &exhausted.control,
        }
    }

    pub fn port(&self) -> ControlPort {
        match self {
            ActionToken::Step(_) => ControlPort::Step,
            ActionToken::Exhausted(_) => ControlPort::Exhausted,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    pub compile: CompileOptions,
    /// Reuse compiled rules of boxes whose content did not change.
    pub cache_rules: bool,
    /// Run the built-in operator rules after every step rewrite.
    pub settle_operators: bool,
    /// Where an error marker goes, relative to the port it complains about.
    pub error_offset: Position,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            compile: CompileOptions::default(),
            cache_rules: true,
            settle_operators: true,
            error_offset: Position::new(24.0, -24.0),
        }
    }
}

pub struct Engine {
    config: EngineConfig,
    cache: RuleCache,
    operators: OperatorRules,
    placement: Box<dyn Placement>,
}

impl Default for Engine {
    fn default() -> Self {
        Engine::new(EngineConfig::default())
    }
}

/// Whether the graph contains an error marker.
pub fn has_error(graph: &HostGraph) -> bool {
    graph.nodes().any(|(_, attr)| attr.label.is_error())
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Engine {
            config,
            cache: RuleCache::new(),
            operators: OperatorRules::new(),
            placement: Box::new(NeighborAverage),
        }
    }

    pub fn with_placement(mut self, placement: impl Placement + 'static) -> Self {
        self.placement = Box::new(placement);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn cache(&self) -> &RuleCache {
        &self.cache
    }

    fn rule_for(&mut self, graph: &HostGraph, rule_box: &RuleBox, members: &[NodeKey]) -> Rc<Rule> {
        if self.config.cache_rules {
            self.cache
                .get_or_compile(graph, rule_box, members, &self.config.compile)
        } else {
            Rc::new(compile_rule(
                rule_box.name(),
                graph,
                members,
                rule_box.spawn_offset(),
                &self.config.compile,
            ))
        }
    }

    /// One token per pointer that can move.
    ///
    /// A pointer whose box lacks the port it needs gets an error marker, and
    /// then nothing is returned for any pointer. Once any error marker exists,
    /// returns nothing.
    pub fn find_possible_actions<R: Rng + ?Sized>(
        &mut self,
        graph: &mut HostGraph,
        boxes: &[RuleBox],
        rng: &mut R,
    ) -> InterpreterResult<Vec<ActionToken>> {
        if has_error(graph) {
            log::debug!("error marker present, no actions");
            return Ok(Vec::new());
        }
        if self.config.cache_rules {
            self.cache.retain_boxes(boxes);
        }

        let layout = BoxLayout::new(graph, boxes);
        let pool = layout.search_pool(graph);
        let frequencies = LabelFrequencies::count(graph, &pool);

        let mut pointers = graph.nodes_labeled(Label::from(POINTER)).collect::<Vec<_>>();
        pointers.sort();

        let mut tokens = Vec::new();
        for pointer in pointers {
            let Some((from, in_port)) = resolve_pointer(graph, pointer, rng) else {
                continue;
            };
            let Some(rule_box) = layout
                .box_of(in_port)
                .and_then(|id| boxes.iter().find(|b| b.id == id))
            else {
                log::warn!("in port {in_port:?} is not inside any rule box");
                continue;
            };
            let members = layout.members(rule_box.id);

            let rule = self.rule_for(graph, rule_box, members);
            let matches = rule.find_matches(graph, &pool, &frequencies);
            let wanted = if matches.is_empty() {
                ControlPort::Exhausted
            } else {
                ControlPort::Step
            };
            let ports = members
                .iter()
                .copied()
                .filter(|&key| graph.label(key).and_then(|l| l.control_port()) == Some(wanted))
                .collect::<Vec<_>>();
            let Some(&to) = ports.choose(rng) else {
                let message = format!("{} has no {} port", rule_box.name(), wanted.tag());
                inject_error(graph, from, &message, self.config.error_offset)
                    .change_context(InterpreterError::ErrorMarker(from))?;
                return Ok(Vec::new());
            };
            if ports.len() > 1 {
                log::debug!(
                    "{} has {} {} ports, picked {to:?}",
                    rule_box.name(),
                    ports.len(),
                    wanted.tag()
                );
            }

            let control = ControlTransfer {
                pointer,
                from,
                in_port,
                rule_box: rule_box.id,
                to,
            };
            tokens.push(if matches.is_empty() {
                ActionToken::Exhausted(ExhaustedAction { control })
            } else {
                ActionToken::Step(StepAction {
                    rule,
                    matches,
                    control,
                })
            });
        }
        Ok(tokens)
    }

    /// Applies `chosen`, moves the pointer to the step port, then settles operators.
    pub fn execute_step_action<R: Rng + ?Sized>(
        &mut self,
        graph: &mut HostGraph,
        boxes: &[RuleBox],
        step: &StepAction,
        chosen: &RuleMatch,
        rng: &mut R,
    ) -> InterpreterResult<()> {
        let inserted = step
            .rule
            .apply(graph, chosen, self.placement.as_mut())
            .change_context_lazy(|| InterpreterError::RuleApplication(step.rule.name().to_owned()))?;
        log::debug!(
            "rule `{}` fired, inserted {} nodes",
            step.rule.name(),
            inserted.len()
        );
        move_pointer(graph, &step.control)?;
        if self.config.settle_operators {
            self.operators
                .settle(
                    graph,
                    |g| BoxLayout::new(g, boxes).search_pool(g),
                    self.placement.as_mut(),
                    rng,
                )
                .change_context(InterpreterError::OperatorSettling)?;
        }
        Ok(())
    }

    pub fn execute_exhausted_action(
        &mut self,
        graph: &mut HostGraph,
        exhausted: &ExhaustedAction,
    ) -> InterpreterResult<()> {
        move_pointer(graph, &exhausted.control)
    }

    /// One driving step: finds a token for every pointer and executes them all.
    ///
    /// Step tokens apply a uniformly chosen match. Matches that an earlier
    /// token of the same step invalidated are skipped, whether their nodes
    /// were removed or just relabelled. Returns whether any
    /// token was found.
    pub fn run_random_action<R: Rng + ?Sized>(
        &mut self,
        graph: &mut HostGraph,
        boxes: &[RuleBox],
        rng: &mut R,
    ) -> InterpreterResult<bool> {
        let tokens = self.find_possible_actions(graph, boxes, rng)?;
        if tokens.is_empty() {
            return Ok(false);
        }
        for token in &tokens {
            match token {
                ActionToken::Step(step) => {
                    let live = step
                        .matches
                        .iter()
                        .filter(|m| step.rule.still_matches(graph, m))
                        .collect::<Vec<_>>();
                    let Some(&chosen) = live.choose(rng) else {
                        log::debug!(
                            "all matches of `{}` went stale, pointer {:?} waits",
                            step.rule.name(),
                            step.control.pointer
                        );
                        continue;
                    };
                    self.execute_step_action(graph, boxes, step, chosen, rng)?;
                }
                ActionToken::Exhausted(exhausted) => {
                    self.execute_exhausted_action(graph, exhausted)?;
                }
            }
        }
        Ok(true)
    }
}

/// The port a pointer is attached to, and the `in` port that decides next.
///
/// `None` if the pointer is detached, or sits on an out port wired to no
/// `in` port, which is how a program ends.
fn resolve_pointer<R: Rng + ?Sized>(
    graph: &HostGraph,
    pointer: NodeKey,
    rng: &mut R,
) -> Option<(NodeKey, NodeKey)> {
    let mut attached = graph
        .neighbors(pointer)
        .filter_map(|n| Some((n, graph.label(n)?.control_port()?)))
        .collect::<Vec<_>>();
    attached.sort_by_key(|(key, _)| *key);
    let &(from, port) = attached.first()?;
    if attached.len() > 1 {
        log::warn!("pointer {pointer:?} touches {} ports, using {from:?}", attached.len());
    }
    if !port.is_out() {
        return Some((from, from));
    }
    let mut wired = graph
        .neighbors(from)
        .filter(|&n| graph.label(n).and_then(|l| l.control_port()) == Some(ControlPort::In))
        .collect::<Vec<_>>();
    wired.sort();
    let &in_port = wired.choose(rng)?;
    Some((from, in_port))
}

fn move_pointer(graph: &mut HostGraph, control: &ControlTransfer) -> InterpreterResult<()> {
    let ControlTransfer {
        pointer, from, to, ..
    } = *control;
    let Some(edge) = graph.remove_edge((pointer, from)) else {
        bail!(InterpreterError::MissingPointerEdge {
            pointer,
            port: from
        });
    };
    let previous = graph
        .add_edge(pointer, to, edge)
        .change_context(InterpreterError::MissingPointerEdge { pointer, port: to })?;
    if previous.is_some() {
        bail!(InterpreterError::PointerAlreadyAttached { pointer, port: to });
    }
    log::trace!("pointer {pointer:?} moved {from:?} -> {to:?}");
    Ok(())
}

/// Adds an error marker next to `at` with a message node hanging off it.
fn inject_error(
    graph: &mut HostGraph,
    at: NodeKey,
    message: &str,
    offset: Position,
) -> Result<NodeKey, GraphError> {
    let origin = graph.position(at).ok_or(GraphError::UnknownNode(at))?;
    let error = graph.add_node(NodeData::new(ERROR, origin + offset));
    graph.add_edge(error, at, EdgeData::default())?;
    let text = graph.add_node(NodeData::new(message, origin + offset + offset));
    graph.add_edge(text, error, EdgeData::default())?;
    log::info!("error at {at:?}: {message}");
    log::trace!("graph after error:\n{}", graph.dot());
    Ok(error)
}

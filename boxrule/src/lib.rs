//! Graph pattern matching and rewriting, driven by rule boxes and program pointers.
//!
//! Rules are graphs drawn inside rectangular boxes on a canvas. Plain nodes in
//! a box form a pattern to find in the graph outside all boxes. Operator nodes
//! (`new`, `delete`, `set`, `connect`, `disconnect`) describe what to change
//! at every match. A `pointer` node attached to a box's `in` port makes the
//! [`Engine`] try that box's rule and move the pointer on to the `step` or
//! `exhausted` port depending on the outcome.

pub mod graph;
pub mod interpreter;
pub mod label;
pub mod pattern_match;
pub mod placement;
pub mod rule;
pub mod util;

pub use graph::{EdgeData, Graph, GraphError, HostGraph, NodeData, NodeKey, Position};
pub use interpreter::rule_box::{Rect, RuleBox, RuleBoxId};
pub use interpreter::{
    ActionToken, ControlTransfer, Engine, EngineConfig, ExhaustedAction, InterpreterError,
    InterpreterResult, StepAction, has_error,
};
pub use label::{ControlPort, Label, Operator};
pub use rule::compile::{CompileOptions, compile_rule};
pub use rule::{RewriteError, RewriteResult, Rule, RuleMatch};

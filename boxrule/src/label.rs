//! Node labels and the reserved vocabulary of the rule language.
//!
//! Everything a user draws is a label on a node. A handful of labels are
//! reserved: they mark rule-box structure (quantifier anchors, control ports),
//! the program pointer, error markers, and the rewrite verbs.

use crate::interned_string_newtype;
use crate::util::InternString;
use derive_more::From;
use std::fmt::Display;

#[derive(derive_more::Debug, Clone, Copy, PartialEq, Eq, Hash, From)]
#[debug("{_0}")]
pub struct Label(InternString);
interned_string_newtype!(Label);

impl Label {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_wildcard(&self) -> bool {
        self.as_str() == WILDCARD
    }

    pub fn is_quantifier(&self) -> bool {
        self.as_str() == QUANTIFIER
    }

    pub fn is_pointer(&self) -> bool {
        self.as_str() == POINTER
    }

    pub fn is_error(&self) -> bool {
        self.as_str() == ERROR
    }

    pub fn control_port(&self) -> Option<ControlPort> {
        ControlPort::from_label(self)
    }

    pub fn operator(&self) -> Option<Operator> {
        Operator::from_label(self)
    }

    /// Labels that structure a program rather than describe data.
    ///
    /// Nodes carrying these never take part in matching.
    pub fn is_meta(&self) -> bool {
        self.is_quantifier() || self.is_pointer() || self.is_error() || self.control_port().is_some()
    }
}

impl Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Matches any label and binds nothing.
pub const WILDCARD: &str = "*";
/// Declares its neighbors' labels as free variables of the enclosing rule.
pub const QUANTIFIER: &str = "∀";
pub const POINTER: &str = "pointer";
pub const ERROR: &str = "error";

/// The rewrite verbs.
///
/// Only `New` and `Set` introduce content: their neighbors are operands that
/// get inserted along with them. The other verbs only reference nodes that
/// already exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    New,
    Delete,
    Set,
    Connect,
    Disconnect,
}

impl Operator {
    pub const ALL: [Operator; 5] = [
        Operator::New,
        Operator::Delete,
        Operator::Set,
        Operator::Connect,
        Operator::Disconnect,
    ];

    pub fn from_label(label: &Label) -> Option<Self> {
        Operator::ALL
            .into_iter()
            .find(|op| op.tag() == label.as_str())
    }

    pub fn tag(self) -> &'static str {
        match self {
            Operator::New => "new",
            Operator::Delete => "delete",
            Operator::Set => "set",
            Operator::Connect => "connect",
            Operator::Disconnect => "disconnect",
        }
    }

    pub fn label(self) -> Label {
        Label::from(self.tag())
    }

    pub fn introduces_operands(self) -> bool {
        match self {
            Operator::New | Operator::Set => true,
            Operator::Delete | Operator::Connect | Operator::Disconnect => false,
        }
    }
}

/// Control ports of a rule box.
///
/// A program pointer enters a box through `In` and leaves through `Step` if
/// the box's rule matched, or `Exhausted` if it did not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlPort {
    In,
    Step,
    Exhausted,
}

impl ControlPort {
    pub fn from_label(label: &Label) -> Option<Self> {
        match label.as_str() {
            "in" => Some(ControlPort::In),
            "step" => Some(ControlPort::Step),
            "exhausted" => Some(ControlPort::Exhausted),
            _ => None,
        }
    }

    pub fn tag(self) -> &'static str {
        match self {
            ControlPort::In => "in",
            ControlPort::Step => "step",
            ControlPort::Exhausted => "exhausted",
        }
    }

    pub fn label(self) -> Label {
        Label::from(self.tag())
    }

    pub fn is_out(self) -> bool {
        !matches!(self, ControlPort::In)
    }
}

//! Values flowing through an episode: references, arguments, tool results

use crate::types::{EntityId, EntitySet, Literal, RelationId, RelationSet, ReturnType};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Handle to the result of a committed step. Rendered as `#3` or `#3.1`.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct MemoryRef {
    pub step: usize,
    pub slot: usize,
}

impl MemoryRef {
    pub fn new(step: usize) -> Self {
        Self { step, slot: 0 }
    }

    pub fn with_slot(step: usize, slot: usize) -> Self {
        Self { step, slot }
    }

    /// Parse `#<step>` or `#<step>.<slot>`.
    pub fn parse(s: &str) -> Option<Self> {
        let body = s.trim().strip_prefix('#')?;
        match body.split_once('.') {
            Some((step, slot)) => Some(Self::with_slot(step.parse().ok()?, slot.parse().ok()?)),
            None => Some(Self::new(body.parse().ok()?)),
        }
    }
}

impl fmt::Display for MemoryRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.slot == 0 {
            write!(f, "#{}", self.step)
        } else {
            write!(f, "#{}.{}", self.step, self.slot)
        }
    }
}

impl Serialize for MemoryRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MemoryRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        MemoryRef::parse(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("not a memory reference: {}", s)))
    }
}

/// An argument as the model wrote it. Strings starting with `#` are references.
///
/// Serialized untagged. Text that would read back as a reference is
/// written as `{"text": "#3"}` so it stays text.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(from = "ArgumentRepr")]
pub enum Argument {
    Ref(MemoryRef),
    Bool(bool),
    Number(f64),
    Text(String),
    List(Vec<String>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ArgumentRepr {
    Ref(MemoryRef),
    Bool(bool),
    Number(f64),
    Text(String),
    List(Vec<String>),
    QuotedText { text: String },
}

impl From<ArgumentRepr> for Argument {
    fn from(repr: ArgumentRepr) -> Self {
        match repr {
            ArgumentRepr::Ref(r) => Self::Ref(r),
            ArgumentRepr::Bool(b) => Self::Bool(b),
            ArgumentRepr::Number(n) => Self::Number(n),
            ArgumentRepr::Text(s) | ArgumentRepr::QuotedText { text: s } => Self::Text(s),
            ArgumentRepr::List(items) => Self::List(items),
        }
    }
}

impl Serialize for Argument {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;
        match self {
            Self::Ref(r) => r.serialize(serializer),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Number(n) => serializer.serialize_f64(*n),
            Self::Text(s) if MemoryRef::parse(s).is_some() => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("text", s)?;
                map.end()
            }
            Self::Text(s) => serializer.serialize_str(s),
            Self::List(items) => items.serialize(serializer),
        }
    }
}

impl Argument {
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    pub fn as_memory_ref(&self) -> Option<MemoryRef> {
        match self {
            Self::Ref(r) => Some(*r),
            _ => None,
        }
    }
}

impl From<MemoryRef> for Argument {
    fn from(r: MemoryRef) -> Self {
        Self::Ref(r)
    }
}

impl From<&str> for Argument {
    fn from(s: &str) -> Self {
        MemoryRef::parse(s)
            .map(Self::Ref)
            .unwrap_or_else(|| Self::Text(s.to_string()))
    }
}

impl From<f64> for Argument {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<bool> for Argument {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl fmt::Display for Argument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ref(r) => write!(f, "{}", r),
            Self::Bool(b) => write!(f, "{}", b),
            Self::Number(n) => write!(f, "{}", Literal::Number(*n)),
            Self::Text(s) => write!(f, "{:?}", s),
            Self::List(items) => {
                let inner: Vec<String> = items.iter().map(|s| format!("{:?}", s)).collect();
                write!(f, "[{}]", inner.join(", "))
            }
        }
    }
}

/// A concrete argument after references are substituted and types checked.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    Entity(EntityId),
    Relation(RelationId),
    EntitySet(EntitySet),
    RelationSet(RelationSet),
    Literal(Literal),
    Boolean(bool),
}

impl Value {
    pub fn as_entity(&self) -> Option<&EntityId> {
        match self {
            Self::Entity(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_relation(&self) -> Option<&RelationId> {
        match self {
            Self::Relation(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_entity_set(&self) -> Option<&EntitySet> {
        match self {
            Self::EntitySet(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_literal(&self) -> Option<&Literal> {
        match self {
            Self::Literal(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Entity(e) => write!(f, "{}", e),
            Self::Relation(r) => write!(f, "{}", r),
            Self::EntitySet(s) => write_set(f, s.iter()),
            Self::RelationSet(s) => write_set(f, s.iter()),
            Self::Literal(l) => write!(f, "{}", l),
            Self::Boolean(b) => write!(f, "{}", b),
        }
    }
}

fn write_set<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: impl Iterator<Item = T>) -> fmt::Result {
    let items: Vec<String> = items.map(|i| i.to_string()).collect();
    write!(f, "{{{}}}", items.join(", "))
}

/// Recoverable failure categories. Recorded in memory, never raised.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum FaultKind {
    ArgumentError,
    NotGrounded,
    DanglingRef,
    UnknownTool,
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ArgumentError => write!(f, "argument_error"),
            Self::NotGrounded => write!(f, "not_grounded"),
            Self::DanglingRef => write!(f, "dangling_ref"),
            Self::UnknownTool => write!(f, "unknown_tool"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolFault {
    pub kind: FaultKind,
    pub message: String,
}

impl ToolFault {
    pub fn new(kind: FaultKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn not_grounded(message: impl Into<String>) -> Self {
        Self::new(FaultKind::NotGrounded, message)
    }

    pub fn argument(message: impl Into<String>) -> Self {
        Self::new(FaultKind::ArgumentError, message)
    }
}

impl fmt::Display for ToolFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

/// Tagged result of one step.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ToolResult {
    EntitySet(EntitySet),
    RelationSet(RelationSet),
    Literal(Literal),
    Boolean(bool),
    Error(ToolFault),
}

impl ToolResult {
    pub fn error(kind: FaultKind, message: impl Into<String>) -> Self {
        Self::Error(ToolFault::new(kind, message))
    }

    pub fn not_grounded(message: impl Into<String>) -> Self {
        Self::Error(ToolFault::not_grounded(message))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    pub fn fault(&self) -> Option<&ToolFault> {
        match self {
            Self::Error(f) => Some(f),
            _ => None,
        }
    }

    /// `None` for errors.
    pub fn kind(&self) -> Option<ReturnType> {
        match self {
            Self::EntitySet(_) => Some(ReturnType::EntitySet),
            Self::RelationSet(_) => Some(ReturnType::RelationSet),
            Self::Literal(_) => Some(ReturnType::Literal),
            Self::Boolean(_) => Some(ReturnType::Boolean),
            Self::Error(_) => None,
        }
    }

    pub fn to_value(&self) -> Option<Value> {
        match self {
            Self::EntitySet(s) => Some(Value::EntitySet(s.clone())),
            Self::RelationSet(s) => Some(Value::RelationSet(s.clone())),
            Self::Literal(l) => Some(Value::Literal(l.clone())),
            Self::Boolean(b) => Some(Value::Boolean(*b)),
            Self::Error(_) => None,
        }
    }
}

impl From<ToolFault> for ToolResult {
    fn from(fault: ToolFault) -> Self {
        Self::Error(fault)
    }
}

/// How a step ended. Only `Ok` steps are addressable by reference.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    /// Tool ran and produced a value.
    Ok,
    /// Tool ran (or grounding failed) and produced an error result.
    Error,
    /// Decision failed validation; nothing was executed.
    Rejected,
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok => write!(f, "ok"),
            Self::Error => write!(f, "error"),
            Self::Rejected => write!(f, "rejected"),
        }
    }
}

/// Final answer of an episode: what the model wrote and what it resolved to.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub expression: Argument,
    pub value: Value,
}

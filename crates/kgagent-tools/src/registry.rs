//! Toolbox and tool trait definitions
//!
//! Each builtin tool is a self-contained module implementing the Tool trait.
//! A Toolbox is assembled once with ToolboxBuilder and is immutable after
//! that; it is shared between episodes behind an `Arc`.

use kgagent_core::{
    Argument, EntityId, EntitySet, Error, FaultKind, KnowledgeGraph, Literal, MemoryRef,
    ParamType, RelationId, Result, ReturnType, ToolFault, ToolResult, Value,
};
use kgagent_llm::{ParamSchema, ToolSchema};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use thiserror::Error as ThisError;
use tokio_util::sync::CancellationToken;

/// One typed parameter of a tool.
#[derive(Clone, Debug, PartialEq)]
pub struct Param {
    pub name: String,
    pub ty: ParamType,
}

/// Static description of a tool: name, typed signature, purity.
#[derive(Clone, Debug, PartialEq)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub params: Vec<Param>,
    pub returns: ReturnType,
    pub pure: bool,
}

impl ToolSpec {
    pub fn new(name: impl Into<String>, description: impl Into<String>, returns: ReturnType) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            params: Vec::new(),
            returns,
            pure: true,
        }
    }

    pub fn param(mut self, name: impl Into<String>, ty: ParamType) -> Self {
        self.params.push(Param {
            name: name.into(),
            ty,
        });
        self
    }

    pub fn impure(mut self) -> Self {
        self.pure = false;
        self
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }

    pub fn to_schema(&self) -> ToolSchema {
        ToolSchema {
            name: self.name.clone(),
            description: self.description.clone(),
            params: self
                .params
                .iter()
                .map(|p| ParamSchema {
                    name: p.name.clone(),
                    ty: p.ty,
                })
                .collect(),
            returns: self.returns,
        }
    }
}

/// A KG operation. Tools receive arguments that already passed validation
/// and grounding, so they only deal with concrete values.
///
/// To add a tool: create a file in tools/, implement this trait, register it
/// in `builtin()` in lib.rs.
#[async_trait::async_trait]
pub trait Tool: Send + Sync {
    fn spec(&self) -> &ToolSpec;

    fn name(&self) -> &str {
        &self.spec().name
    }

    /// Run against a graph snapshot. Data-dependent misses come back as
    /// `ToolResult::Error`, never as a panic.
    async fn execute(&self, args: &[Value], graph: &dyn KnowledgeGraph) -> ToolResult;

    /// Race `execute` against cancellation. `None` means cancelled.
    async fn execute_cancellable(
        &self,
        args: &[Value],
        graph: &dyn KnowledgeGraph,
        cancel: CancellationToken,
    ) -> Option<ToolResult> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            result = self.execute(args, graph) => Some(result),
        }
    }

    fn to_schema(&self) -> ToolSchema {
        self.spec().to_schema()
    }
}

/// Why a decision was rejected before execution.
#[derive(ThisError, Debug, Clone, PartialEq)]
pub enum ArgumentError {
    #[error("unknown tool '{0}'")]
    UnknownTool(String),

    #[error("{tool} expects {expected} argument(s), got {got}")]
    Arity {
        tool: String,
        expected: usize,
        got: usize,
    },

    #[error("parameter '{param}' expects {expected}, got {found}")]
    Type {
        param: String,
        expected: ParamType,
        found: String,
    },

    #[error("{0} is not a committed step with a usable result")]
    DanglingRef(MemoryRef),
}

impl ArgumentError {
    pub fn kind(&self) -> FaultKind {
        match self {
            Self::UnknownTool(_) => FaultKind::UnknownTool,
            Self::DanglingRef(_) => FaultKind::DanglingRef,
            Self::Arity { .. } | Self::Type { .. } => FaultKind::ArgumentError,
        }
    }
}

impl From<ArgumentError> for ToolFault {
    fn from(e: ArgumentError) -> Self {
        ToolFault::new(e.kind(), e.to_string())
    }
}

/// Looks up the value behind a memory reference. `None` means dangling.
pub trait RefResolver {
    fn resolve_ref(&self, r: MemoryRef) -> Option<Value>;
}

/// Step results indexed by position; handy for tests and replays.
impl RefResolver for Vec<ToolResult> {
    fn resolve_ref(&self, r: MemoryRef) -> Option<Value> {
        if r.slot != 0 {
            return None;
        }
        self.get(r.step).and_then(ToolResult::to_value)
    }
}

/// Resolver for contexts with no memory at all.
pub struct NoMemory;

impl RefResolver for NoMemory {
    fn resolve_ref(&self, _r: MemoryRef) -> Option<Value> {
        None
    }
}

/// The closed set of operations an episode may call.
pub struct Toolbox {
    tools: BTreeMap<String, Arc<dyn Tool>>,
}

impl Toolbox {
    pub fn builder() -> ToolboxBuilder {
        ToolboxBuilder::new()
    }

    pub fn lookup(&self, name: &str) -> Option<&ToolSpec> {
        self.tools.get(name).map(|t| t.spec())
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Tool names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Schemas for the decision context, sorted by name.
    pub fn schemas(&self) -> Vec<ToolSchema> {
        self.tools.values().map(|t| t.to_schema()).collect()
    }

    /// Check arity and types, substitute references, and apply the
    /// documented coercions. The result lines up with the tool's params.
    pub fn validate(
        &self,
        name: &str,
        args: &[Argument],
        memory: &dyn RefResolver,
    ) -> std::result::Result<Vec<Value>, ArgumentError> {
        let spec = self
            .lookup(name)
            .ok_or_else(|| ArgumentError::UnknownTool(name.to_string()))?;
        if args.len() != spec.arity() {
            return Err(ArgumentError::Arity {
                tool: spec.name.clone(),
                expected: spec.arity(),
                got: args.len(),
            });
        }
        spec.params
            .iter()
            .zip(args)
            .map(|(param, arg)| coerce(param, arg, memory))
            .collect()
    }
}

fn coerce(
    param: &Param,
    arg: &Argument,
    memory: &dyn RefResolver,
) -> std::result::Result<Value, ArgumentError> {
    let mismatch = |found: String| ArgumentError::Type {
        param: param.name.clone(),
        expected: param.ty,
        found,
    };

    if let Argument::Ref(r) = arg {
        let value = memory
            .resolve_ref(*r)
            .ok_or(ArgumentError::DanglingRef(*r))?;
        return match (param.ty, value) {
            (ParamType::MemoryRef, v) => Ok(v),
            (ParamType::EntitySet, v @ Value::EntitySet(_)) => Ok(v),
            (ParamType::Literal, v @ Value::Literal(_)) => Ok(v),
            (ParamType::Boolean, v @ Value::Boolean(_)) => Ok(v),
            (ParamType::Entity, Value::EntitySet(set)) if set.len() == 1 => {
                Ok(Value::Entity(set.into_iter().next().ok_or_else(|| {
                    mismatch(format!("{} (empty set)", r))
                })?))
            }
            (_, v) => Err(mismatch(format!("{} holding {}", r, value_kind(&v)))),
        };
    }

    match (param.ty, arg) {
        (ParamType::Entity, Argument::Text(s)) if !s.trim().is_empty() => {
            Ok(Value::Entity(EntityId::new(s.trim())))
        }
        (ParamType::Relation, Argument::Text(s)) if !s.trim().is_empty() => {
            Ok(Value::Relation(RelationId::new(s.trim())))
        }
        (ParamType::EntitySet, Argument::Text(s)) if !s.trim().is_empty() => {
            Ok(Value::EntitySet(EntitySet::from([EntityId::new(s.trim())])))
        }
        (ParamType::EntitySet, Argument::List(items)) => Ok(Value::EntitySet(
            items
                .iter()
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .map(EntityId::new)
                .collect(),
        )),
        (ParamType::Literal, Argument::Number(n)) => Ok(Value::Literal(Literal::Number(*n))),
        (ParamType::Literal, Argument::Bool(b)) => Ok(Value::Literal(Literal::Bool(*b))),
        (ParamType::Literal, Argument::Text(s)) => Ok(Value::Literal(Literal::text(s.as_str()))),
        (ParamType::Boolean, Argument::Bool(b)) => Ok(Value::Boolean(*b)),
        (_, other) => Err(mismatch(argument_kind(other).to_string())),
    }
}

fn argument_kind(arg: &Argument) -> &'static str {
    match arg {
        Argument::Ref(_) => "a reference",
        Argument::Bool(_) => "a boolean",
        Argument::Number(_) => "a number",
        Argument::Text(s) if s.trim().is_empty() => "an empty string",
        Argument::Text(_) => "a string",
        Argument::List(_) => "a list",
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Entity(_) => "an entity",
        Value::Relation(_) => "a relation",
        Value::EntitySet(s) if s.is_empty() => "an empty entity set",
        Value::EntitySet(_) => "an entity set",
        Value::RelationSet(_) => "a relation set",
        Value::Literal(_) => "a literal",
        Value::Boolean(_) => "a boolean",
    }
}

/// Collects tools, then checks the set is consistent.
#[derive(Default)]
pub struct ToolboxBuilder {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolboxBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, tool: impl Tool + 'static) -> &mut Self {
        self.tools.push(Arc::new(tool));
        self
    }

    pub fn register_arc(&mut self, tool: Arc<dyn Tool>) -> &mut Self {
        self.tools.push(tool);
        self
    }

    pub fn build(self) -> Result<Toolbox> {
        if self.tools.is_empty() {
            return Err(Error::misconfigured("toolbox has no tools"));
        }
        let mut tools = BTreeMap::new();
        for tool in self.tools {
            let spec = tool.spec();
            if spec.name.trim().is_empty() {
                return Err(Error::misconfigured("tool with an empty name"));
            }
            let mut seen = HashSet::new();
            for p in &spec.params {
                if !seen.insert(p.name.as_str()) {
                    return Err(Error::misconfigured(format!(
                        "tool '{}' declares parameter '{}' twice",
                        spec.name, p.name
                    )));
                }
            }
            let name = spec.name.clone();
            if tools.insert(name.clone(), tool).is_some() {
                return Err(Error::misconfigured(format!("duplicate tool name '{}'", name)));
            }
        }
        Ok(Toolbox { tools })
    }
}

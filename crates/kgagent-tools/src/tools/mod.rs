pub mod attribute;
pub mod compare;
pub mod count;
pub mod exists;
pub mod filter;
pub mod neighbors;
pub mod relation;
pub mod relations;
pub mod sets;

use kgagent_core::{EntityId, EntitySet, Literal, RelationId, ToolFault, Value};

// Accessors for validated arguments. A mismatch here means a tool was called
// without going through Toolbox::validate.

pub(crate) fn entity_arg(args: &[Value], i: usize) -> Result<&EntityId, ToolFault> {
    args.get(i)
        .and_then(Value::as_entity)
        .ok_or_else(|| ToolFault::argument(format!("argument {} is not an entity", i)))
}

pub(crate) fn relation_arg(args: &[Value], i: usize) -> Result<&RelationId, ToolFault> {
    args.get(i)
        .and_then(Value::as_relation)
        .ok_or_else(|| ToolFault::argument(format!("argument {} is not a relation", i)))
}

pub(crate) fn set_arg(args: &[Value], i: usize) -> Result<&EntitySet, ToolFault> {
    args.get(i)
        .and_then(Value::as_entity_set)
        .ok_or_else(|| ToolFault::argument(format!("argument {} is not an entity set", i)))
}

pub(crate) fn literal_arg(args: &[Value], i: usize) -> Result<&Literal, ToolFault> {
    args.get(i)
        .and_then(Value::as_literal)
        .ok_or_else(|| ToolFault::argument(format!("argument {} is not a literal", i)))
}

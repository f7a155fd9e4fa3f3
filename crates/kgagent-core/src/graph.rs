//! Read-only knowledge graph capability consumed by the KG executor.
//!
//! The core never mutates a graph and never assumes a storage format.
//! Backends implement the primitive lookups; set operations and multi-hop
//! neighbor expansion have provided implementations built on them, which a
//! backend with native support (e.g. a SPARQL endpoint) may override.

use crate::types::{EntityId, EntitySet, Literal, RelationId, RelationSet};
use std::collections::VecDeque;

/// Size summary for logging.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GraphStats {
    pub entities: usize,
    pub relations: usize,
    pub edges: usize,
    pub attributes: usize,
}

/// Implementations must be safe for concurrent reads: one snapshot is shared
/// by every episode in the process.
#[async_trait::async_trait]
pub trait KnowledgeGraph: Send + Sync {
    /// Backend name, for logs.
    fn name(&self) -> &str {
        "kg"
    }

    fn stats(&self) -> GraphStats {
        GraphStats::default()
    }

    async fn has_entity(&self, entity: &EntityId) -> bool;

    async fn has_relation(&self, relation: &RelationId) -> bool;

    /// Objects `t` of edges `(head, relation, t)`.
    async fn tails(&self, head: &EntityId, relation: &RelationId) -> EntitySet;

    /// Subjects `h` of edges `(h, relation, tail)`.
    async fn heads(&self, tail: &EntityId, relation: &RelationId) -> EntitySet;

    /// Outgoing relations of an entity, edge and attribute relations alike.
    async fn relations_of(&self, entity: &EntityId) -> RelationSet;

    /// Attribute values of `(entity, relation)`, sorted.
    async fn attributes(&self, entity: &EntityId, relation: &RelationId) -> Vec<Literal>;

    async fn has_edge(&self, head: &EntityId, relation: &RelationId, tail: &EntityId) -> bool;

    async fn intersect(&self, left: &EntitySet, right: &EntitySet) -> EntitySet {
        left.intersection(right).cloned().collect()
    }

    async fn union(&self, left: &EntitySet, right: &EntitySet) -> EntitySet {
        left.union(right).cloned().collect()
    }

    /// Members with an attribute equal to `value`, or an edge to an entity named `value`.
    async fn filter_by_value(
        &self,
        entities: &EntitySet,
        relation: &RelationId,
        value: &Literal,
    ) -> EntitySet {
        let target = match value {
            Literal::Text(s) => Some(EntityId::new(s.as_str())),
            Literal::Number(_) => Some(EntityId::new(value.to_string())),
            Literal::Bool(_) => None,
        };
        let mut kept = EntitySet::new();
        for entity in entities {
            let by_attribute = self
                .attributes(entity, relation)
                .await
                .iter()
                .any(|v| v.matches(value));
            let by_edge = match &target {
                Some(t) => self.has_edge(entity, relation, t).await,
                None => false,
            };
            if by_attribute || by_edge {
                kept.insert(entity.clone());
            }
        }
        kept
    }

    /// Entities reachable from `start` within `depth` outgoing hops, excluding `start`.
    async fn neighbors(&self, start: &EntityId, depth: usize) -> EntitySet {
        let mut seen = EntitySet::new();
        let mut queue: VecDeque<(EntityId, usize)> = VecDeque::new();
        seen.insert(start.clone());
        queue.push_back((start.clone(), 0));

        while let Some((node, hops)) = queue.pop_front() {
            if hops >= depth {
                continue;
            }
            for relation in self.relations_of(&node).await {
                for next in self.tails(&node, &relation).await {
                    if seen.insert(next.clone()) {
                        queue.push_back((next, hops + 1));
                    }
                }
            }
        }

        seen.remove(start);
        seen
    }
}

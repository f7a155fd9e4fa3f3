//! In-memory knowledge graph snapshot.
//!
//! Uses `petgraph` for the edge structure and plain maps for id → node and
//! attribute lookups. A `TripleStore` is immutable once built, so any number
//! of episodes can read it concurrently without locking.

use kgagent_core::{
    EntityId, EntitySet, GraphStats, KnowledgeGraph, Literal, RelationId, RelationSet,
};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

/// Accumulates triples and attributes, then freezes them into a `TripleStore`.
#[derive(Default)]
pub struct TripleStoreBuilder {
    name: Option<String>,
    graph: DiGraph<EntityId, RelationId>,
    node_index: HashMap<EntityId, NodeIndex>,
    edges: HashSet<(NodeIndex, RelationId, NodeIndex)>,
    attributes: HashMap<(EntityId, RelationId), Vec<Literal>>,
}

impl TripleStoreBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    fn ensure_node(&mut self, entity: EntityId) -> NodeIndex {
        if let Some(idx) = self.node_index.get(&entity) {
            return *idx;
        }
        let idx = self.graph.add_node(entity.clone());
        self.node_index.insert(entity, idx);
        idx
    }

    /// Add the edge `(subject, predicate, object)`. Duplicate edges are ignored.
    pub fn add_triple(
        &mut self,
        subject: impl Into<EntityId>,
        predicate: impl Into<RelationId>,
        object: impl Into<EntityId>,
    ) -> &mut Self {
        let s = self.ensure_node(subject.into());
        let o = self.ensure_node(object.into());
        let p = predicate.into();
        if self.edges.insert((s, p.clone(), o)) {
            self.graph.add_edge(s, o, p);
        }
        self
    }

    /// Add a literal attribute value. The subject becomes a known entity.
    pub fn add_attribute(
        &mut self,
        subject: impl Into<EntityId>,
        predicate: impl Into<RelationId>,
        value: impl Into<Literal>,
    ) -> &mut Self {
        let subject = subject.into();
        self.ensure_node(subject.clone());
        let values = self
            .attributes
            .entry((subject, predicate.into()))
            .or_default();
        let value = value.into();
        if !values.contains(&value) {
            values.push(value);
        }
        self
    }

    pub fn load_triples<I, S, P, O>(&mut self, triples: I) -> &mut Self
    where
        I: IntoIterator<Item = (S, P, O)>,
        S: Into<EntityId>,
        P: Into<RelationId>,
        O: Into<EntityId>,
    {
        for (s, p, o) in triples {
            self.add_triple(s, p, o);
        }
        self
    }

    pub fn build(self) -> TripleStore {
        let mut relations: HashSet<RelationId> =
            self.graph.edge_weights().cloned().collect();
        let mut attributes: HashMap<EntityId, BTreeMap<RelationId, Vec<Literal>>> = HashMap::new();
        for ((entity, relation), mut values) in self.attributes {
            values.sort_by(|a, b| {
                a.sort_key()
                    .partial_cmp(&b.sort_key())
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
            relations.insert(relation.clone());
            attributes.entry(entity).or_default().insert(relation, values);
        }
        TripleStore {
            name: self.name.unwrap_or_else(|| "triple-store".to_string()),
            graph: self.graph,
            node_index: self.node_index,
            relations,
            attributes,
        }
    }
}

/// Immutable triple store. Nodes are entities, edges carry the relation.
pub struct TripleStore {
    name: String,
    graph: DiGraph<EntityId, RelationId>,
    node_index: HashMap<EntityId, NodeIndex>,
    relations: HashSet<RelationId>,
    attributes: HashMap<EntityId, BTreeMap<RelationId, Vec<Literal>>>,
}

impl TripleStore {
    pub fn builder() -> TripleStoreBuilder {
        TripleStoreBuilder::new()
    }

    pub fn renamed(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    fn node(&self, entity: &EntityId) -> Option<NodeIndex> {
        self.node_index.get(entity).copied()
    }

    fn edge_targets(&self, idx: NodeIndex, direction: Direction, relation: &RelationId) -> EntitySet {
        self.graph
            .edges_directed(idx, direction)
            .filter(|e| e.weight() == relation)
            .filter_map(|e| {
                let other = match direction {
                    Direction::Outgoing => e.target(),
                    Direction::Incoming => e.source(),
                };
                self.graph.node_weight(other).cloned()
            })
            .collect()
    }

    pub fn entity_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Every entity in the store, sorted.
    pub fn entities(&self) -> EntitySet {
        self.node_index.keys().cloned().collect()
    }
}

#[async_trait::async_trait]
impl KnowledgeGraph for TripleStore {
    fn name(&self) -> &str {
        &self.name
    }

    fn stats(&self) -> GraphStats {
        GraphStats {
            entities: self.graph.node_count(),
            relations: self.relations.len(),
            edges: self.graph.edge_count(),
            attributes: self.attributes.values().map(|m| m.len()).sum(),
        }
    }

    async fn has_entity(&self, entity: &EntityId) -> bool {
        self.node_index.contains_key(entity)
    }

    async fn has_relation(&self, relation: &RelationId) -> bool {
        self.relations.contains(relation)
    }

    async fn tails(&self, head: &EntityId, relation: &RelationId) -> EntitySet {
        match self.node(head) {
            Some(idx) => self.edge_targets(idx, Direction::Outgoing, relation),
            None => EntitySet::new(),
        }
    }

    async fn heads(&self, tail: &EntityId, relation: &RelationId) -> EntitySet {
        match self.node(tail) {
            Some(idx) => self.edge_targets(idx, Direction::Incoming, relation),
            None => EntitySet::new(),
        }
    }

    async fn relations_of(&self, entity: &EntityId) -> RelationSet {
        let mut out = RelationSet::new();
        if let Some(idx) = self.node(entity) {
            out.extend(
                self.graph
                    .edges_directed(idx, Direction::Outgoing)
                    .map(|e| e.weight().clone()),
            );
        }
        if let Some(attrs) = self.attributes.get(entity) {
            out.extend(attrs.keys().cloned());
        }
        out
    }

    async fn attributes(&self, entity: &EntityId, relation: &RelationId) -> Vec<Literal> {
        self.attributes
            .get(entity)
            .and_then(|m| m.get(relation))
            .cloned()
            .unwrap_or_default()
    }

    async fn has_edge(&self, head: &EntityId, relation: &RelationId, tail: &EntityId) -> bool {
        match (self.node(head), self.node(tail)) {
            (Some(h), Some(t)) => self
                .graph
                .edges_connecting(h, t)
                .any(|e| e.weight() == relation),
            _ => false,
        }
    }

    /// BFS over node indices, without going through the per-relation lookups.
    async fn neighbors(&self, start: &EntityId, depth: usize) -> EntitySet {
        let Some(origin) = self.node(start) else {
            return EntitySet::new();
        };
        let mut seen = HashSet::from([origin]);
        let mut queue = VecDeque::from([(origin, 0usize)]);
        while let Some((idx, hops)) = queue.pop_front() {
            if hops >= depth {
                continue;
            }
            for next in self.graph.neighbors_directed(idx, Direction::Outgoing) {
                if seen.insert(next) {
                    queue.push_back((next, hops + 1));
                }
            }
        }
        seen.remove(&origin);
        seen.into_iter()
            .filter_map(|idx| self.graph.node_weight(idx).cloned())
            .collect()
    }
}

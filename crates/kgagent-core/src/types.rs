//! Core types for KG-Agent

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

macro_rules! symbol_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
        pub struct $name(Arc<str>);

        impl $name {
            pub fn new(s: impl Into<String>) -> Self {
                Self(Arc::from(s.into()))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self::new(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self::new(s)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.0)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                String::deserialize(deserializer).map(Self::new)
            }
        }
    };
}

symbol_id!(
    /// Entity identifier - cheaply cloneable
    EntityId
);

symbol_id!(
    /// Relation (predicate) identifier - cheaply cloneable
    RelationId
);

/// Unordered set semantics, lexicographic iteration.
pub type EntitySet = BTreeSet<EntityId>;

pub type RelationSet = BTreeSet<RelationId>;

/// Scalar value: attribute values in the KG and literal tool results.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Literal {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl Literal {
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => s.trim().parse().ok(),
            Self::Bool(_) => None,
        }
    }

    /// Equality that lets a numeric string match a number (`"1999" == 1999`).
    pub fn matches(&self, other: &Literal) -> bool {
        match (self, other) {
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            _ => match (self.as_number(), other.as_number()) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            },
        }
    }

    /// Total order used for deterministic attribute selection.
    pub fn sort_key(&self) -> (u8, f64, &str) {
        match self {
            Self::Bool(b) => (0, f64::from(u8::from(*b)), ""),
            Self::Number(n) => (1, *n, ""),
            Self::Text(s) => (2, 0.0, s.as_str()),
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{}", b),
            Self::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{}", *n as i64),
            Self::Number(n) => write!(f, "{}", n),
            Self::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<f64> for Literal {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<usize> for Literal {
    fn from(n: usize) -> Self {
        Self::Number(n as f64)
    }
}

impl From<bool> for Literal {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<&str> for Literal {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

/// Semantic type of a tool parameter
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ParamType {
    Entity,
    EntitySet,
    Relation,
    Literal,
    Boolean,
    /// Accepts only a reference, of any non-error tag.
    MemoryRef,
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Entity => write!(f, "Entity"),
            Self::EntitySet => write!(f, "EntitySet"),
            Self::Relation => write!(f, "Relation"),
            Self::Literal => write!(f, "Literal"),
            Self::Boolean => write!(f, "Boolean"),
            Self::MemoryRef => write!(f, "MemoryRef"),
        }
    }
}

/// Tag of a non-error tool result
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ReturnType {
    EntitySet,
    RelationSet,
    Literal,
    Boolean,
}

impl fmt::Display for ReturnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EntitySet => write!(f, "EntitySet"),
            Self::RelationSet => write!(f, "RelationSet"),
            Self::Literal => write!(f, "Literal"),
            Self::Boolean => write!(f, "Boolean"),
        }
    }
}

/// The question an episode answers. Immutable once the episode starts.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub seeds: Vec<EntityId>,
}

impl Question {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            seeds: Vec::new(),
        }
    }

    pub fn with_seeds<I, E>(mut self, seeds: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: Into<EntityId>,
    {
        for seed in seeds {
            let seed = seed.into();
            if !self.seeds.contains(&seed) {
                self.seeds.push(seed);
            }
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_display_integral_number() {
        assert_eq!(Literal::Number(2.0).to_string(), "2");
        assert_eq!(Literal::Number(2.5).to_string(), "2.5");
    }

    #[test]
    fn literal_matches_numeric_text() {
        assert!(Literal::text("1999").matches(&Literal::Number(1999.0)));
        assert!(!Literal::text("x").matches(&Literal::Number(1.0)));
    }

    #[test]
    fn question_seeds_deduplicated() {
        let q = Question::new("q").with_seeds(["a", "b", "a"]);
        assert_eq!(q.seeds.len(), 2);
    }
}

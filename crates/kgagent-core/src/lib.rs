//! KG-Agent Core - Types, graph capability, and error handling

pub mod error;
pub mod graph;
pub mod types;
pub mod value;

pub use error::{Error, Result};
pub use graph::{GraphStats, KnowledgeGraph};
pub use types::*;
pub use value::*;

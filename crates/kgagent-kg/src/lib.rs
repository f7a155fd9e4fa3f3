//! KG-Agent KG - in-memory graph snapshot, triple loading, and the executor
//! that grounds tool calls into graph operations.

pub mod executor;
pub mod loader;
pub mod store;

pub use executor::{Discovered, Execution, KgExecutor};
pub use loader::{load_path, parse_json, parse_tsv};
pub use store::{TripleStore, TripleStoreBuilder};

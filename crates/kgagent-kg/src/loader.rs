//! Triple loading from JSON or TSV.
//!
//! JSON: `{"triples": [["D", "acted_in", "F1"]], "attributes": [["F1", "release_year", 1999]]}`
//!
//! TSV: one `subject<TAB>predicate<TAB>object` per line. `#` starts a comment
//! line, blank lines are skipped. An object in double quotes, a number, or
//! `true`/`false` is stored as an attribute value; anything else is an entity.

use crate::store::{TripleStore, TripleStoreBuilder};
use anyhow::{Context, Result};
use kgagent_core::{Error, KnowledgeGraph, Literal};
use serde::Deserialize;
use std::path::Path;
use tracing::info;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TripleDocument {
    triples: Vec<(String, String, String)>,
    attributes: Vec<(String, String, Literal)>,
}

pub fn parse_json(text: &str) -> Result<TripleStore> {
    let doc: TripleDocument = serde_json::from_str(text).map_err(Error::from)?;
    let mut builder = TripleStoreBuilder::new();
    for (s, p, o) in doc.triples {
        builder.add_triple(s, p, o);
    }
    for (s, p, v) in doc.attributes {
        builder.add_attribute(s, p, v);
    }
    Ok(builder.build())
}

pub fn parse_tsv(text: &str) -> Result<TripleStore> {
    let mut builder = TripleStoreBuilder::new();
    for (i, raw) in text.lines().enumerate() {
        let line_no = i + 1;
        let line = raw.trim_end_matches('\r');
        if line.trim().is_empty() || line.trim_start().starts_with('#') {
            continue;
        }
        let fields: Vec<&str> = line.split('\t').map(str::trim).collect();
        let [s, p, o] = fields.as_slice() else {
            return Err(Error::graph_load(
                line_no,
                format!("expected 3 tab-separated fields, found {}", fields.len()),
            )
            .into());
        };
        if s.is_empty() || p.is_empty() || o.is_empty() {
            return Err(Error::graph_load(line_no, "empty field").into());
        }
        match object_literal(o) {
            Some(value) => builder.add_attribute(*s, *p, value),
            None => builder.add_triple(*s, *p, *o),
        };
    }
    Ok(builder.build())
}

fn object_literal(field: &str) -> Option<Literal> {
    if let Some(inner) = field
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
    {
        return Some(Literal::text(inner));
    }
    match field {
        "true" => return Some(Literal::Bool(true)),
        "false" => return Some(Literal::Bool(false)),
        _ => {}
    }
    field
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .map(Literal::Number)
}

/// Load a snapshot from disk; the format follows the extension (`.json`,
/// otherwise TSV).
pub fn load_path(path: impl AsRef<Path>) -> Result<TripleStore> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let is_json = path
        .extension()
        .map(|e| e.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    let builder_name = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "triple-store".to_string());

    let store = if is_json {
        parse_json(&text)
    } else {
        parse_tsv(&text)
    }
    .with_context(|| format!("loading {}", path.display()))?
    .renamed(builder_name);

    let stats = store.stats();
    info!(
        path = %path.display(),
        entities = stats.entities,
        relations = stats.relations,
        edges = stats.edges,
        attributes = stats.attributes,
        "Loaded knowledge graph"
    );
    Ok(store)
}

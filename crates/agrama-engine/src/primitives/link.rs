//! `link` — upsert a typed edge, creating missing endpoints.

use std::collections::BTreeMap;

use serde_json::{json, Value};

use agrama_core::errors::AgramaResult;
use agrama_core::models::{GraphNode, NodeId, NodeKind, Relation};

use crate::context::PrimitiveContext;
use crate::value::{optional_f64, required_str};

pub fn run(ctx: &PrimitiveContext<'_>, args: &Value) -> AgramaResult<Value> {
    let from = required_str(args, "from")?;
    let to = required_str(args, "to")?;
    let relation = Relation::parse(required_str(args, "relation")?);

    let metadata = args.get("metadata").cloned().unwrap_or(Value::Null);
    let weight = optional_f64(&metadata, "weight", 1.0);
    let mut attrs: BTreeMap<String, Value> = BTreeMap::new();
    if let Some(map) = metadata.as_object() {
        for (k, v) in map {
            if k != "weight" {
                attrs.insert(k.clone(), v.clone());
            }
        }
    }

    let from_id = ensure_node(ctx, from);
    let to_id = ensure_node(ctx, to);

    ctx.deadline.checkpoint()?;
    let created = ctx.graph().add_edge(from_id, to_id, relation.clone(), weight, attrs)?;

    Ok(json!({
        "created": created,
        "from": from,
        "to": to,
        "relation": relation.as_str(),
        "weight": weight,
    }))
}

/// Upsert a missing endpoint as a file node when the key names stored
/// content (or is explicitly file-prefixed), a concept node otherwise.
fn ensure_node(ctx: &PrimitiveContext<'_>, key: &str) -> NodeId {
    let id = NodeId::from_name(key);
    if !ctx.graph().contains(id) {
        let kind = if ctx.content().contains(key) || key.starts_with("file:") {
            NodeKind::File
        } else {
            NodeKind::Concept
        };
        ctx.graph().upsert_node(GraphNode {
            id,
            kind,
            name: key.to_string(),
            attrs: BTreeMap::new(),
        });
    }
    ctx.remember_name(id, key);
    id
}

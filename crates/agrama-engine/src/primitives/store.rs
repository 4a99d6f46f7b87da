//! `store` — write versioned content, indexing text worth searching.

use std::collections::BTreeMap;

use serde_json::{json, Value};

use agrama_core::constants::INDEXING_THRESHOLD_BYTES;
use agrama_core::errors::{AgramaResult, ValidationError};
use agrama_core::models::NodeId;

use crate::context::PrimitiveContext;
use crate::value::{required_str, value_to_bytes};

pub fn run(ctx: &PrimitiveContext<'_>, args: &Value) -> AgramaResult<Value> {
    let key = required_str(args, "key")?;
    let value = args.get("value").ok_or_else(|| ValidationError::MalformedArgument {
        name: "value".to_string(),
        reason: "required".to_string(),
    })?;
    let bytes = value_to_bytes(value)?;
    let metadata = metadata_from(args)?;

    let version = ctx
        .content()
        .put(key, bytes.clone(), ctx.agent_id, metadata)?;
    // Any cached search result may now be stale.
    ctx.caches().invalidate_searches();

    ctx.deadline.checkpoint()?;

    // Text long enough to be worth finding gets both indices.
    let mut indexed = false;
    if let Ok(text) = std::str::from_utf8(&bytes) {
        if text.len() > INDEXING_THRESHOLD_BYTES {
            let node = NodeId::from_name(&version.path);
            ctx.remember_name(node, &version.path);

            let embedding_key = blake3::hash(text.as_bytes()).to_hex().to_string();
            let vector = match ctx.caches().embedding(&embedding_key) {
                Some(v) => v,
                None => {
                    let v = ctx.embedder().embed(text)?;
                    ctx.caches().store_embedding(embedding_key, v.clone());
                    v
                }
            };
            ctx.hnsw().insert(node, &vector)?;
            ctx.bm25().index(node, &ctx.tokenizer().tokenize(text));
            indexed = true;
        }
    }

    Ok(json!({
        "success": true,
        "indexed": indexed,
        "key": version.path,
        "timestamp_us": version.timestamp_us,
    }))
}

fn metadata_from(args: &Value) -> AgramaResult<BTreeMap<String, Vec<u8>>> {
    let mut metadata = BTreeMap::new();
    if let Some(map) = args.get("metadata").and_then(Value::as_object) {
        for (k, v) in map {
            metadata.insert(k.clone(), value_to_bytes(v)?);
        }
    }
    Ok(metadata)
}

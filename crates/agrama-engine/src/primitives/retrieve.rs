//! `retrieve` — current content plus an optional history slice.

use serde_json::{json, Map, Value};

use agrama_core::constants::MAX_RETRIEVE_HISTORY;
use agrama_core::errors::AgramaResult;
use agrama_core::models::ContentVersion;

use crate::context::PrimitiveContext;
use crate::value::{bytes_to_value, optional_bool, required_str};

pub fn run(ctx: &PrimitiveContext<'_>, args: &Value) -> AgramaResult<Value> {
    let key = required_str(args, "key")?;
    let include_history = optional_bool(args, "include_history", false);

    let current = ctx.content().get_version(key)?;
    let mut result = json!({
        "key": current.path,
        "value": bytes_to_value(&current.bytes),
        "metadata": metadata_value(&current),
        "agent": current.agent,
        "timestamp_us": current.timestamp_us,
    });

    if include_history {
        ctx.deadline.checkpoint()?;
        let versions = ctx.content().history(key, MAX_RETRIEVE_HISTORY)?;
        let history: Vec<Value> = versions
            .iter()
            .map(|v| {
                json!({
                    "value": bytes_to_value(&v.bytes),
                    "agent": v.agent,
                    "timestamp_us": v.timestamp_us,
                })
            })
            .collect();
        result["history"] = Value::Array(history);
    }
    Ok(result)
}

fn metadata_value(version: &ContentVersion) -> Value {
    let mut map = Map::new();
    for (k, v) in &version.metadata {
        map.insert(k.clone(), bytes_to_value(v));
    }
    Value::Object(map)
}

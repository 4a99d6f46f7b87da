//! `transform` — dispatch into the deterministic transform registry.

use std::time::Instant;

use serde_json::{json, Value};

use agrama_core::errors::AgramaResult;

use crate::cache::cache_key;
use crate::context::PrimitiveContext;
use crate::value::required_str;

pub fn run(ctx: &PrimitiveContext<'_>, args: &Value) -> AgramaResult<Value> {
    let op = required_str(args, "op")?;
    let data = required_str(args, "data")?;
    let options = args.get("options").cloned().unwrap_or(Value::Null);

    let started = Instant::now();
    let key = cache_key("transform", args);
    let output = match ctx.caches().transform(&key) {
        Some(cached) => cached,
        None => {
            let output = ctx.transforms().apply(op, data, &options)?;
            ctx.caches().store_transform(key, output.clone());
            output
        }
    };

    Ok(json!({
        "op": op,
        "output": output,
        "elapsed_us": started.elapsed().as_micros() as u64,
    }))
}

//! Lossless-enough text compression for context windows: strip trailing
//! whitespace, fold blank-line runs, and collapse consecutive duplicate
//! lines.

use serde_json::{json, Value};

use agrama_core::errors::AgramaResult;

use super::Transform;

pub struct CompressText;

impl Transform for CompressText {
    fn name(&self) -> &'static str {
        "compress_text"
    }

    fn apply(&self, data: &str, _options: &Value) -> AgramaResult<Value> {
        let mut out_lines: Vec<&str> = Vec::new();
        let mut blank_run = false;
        let mut previous: Option<&str> = None;

        for raw in data.lines() {
            let line = raw.trim_end();
            if line.is_empty() {
                if !blank_run && !out_lines.is_empty() {
                    out_lines.push("");
                }
                blank_run = true;
                previous = None;
                continue;
            }
            blank_run = false;
            if previous == Some(line) {
                continue;
            }
            previous = Some(line);
            out_lines.push(line);
        }
        while out_lines.last() == Some(&"") {
            out_lines.pop();
        }

        let output = out_lines.join("\n");
        let ratio = if data.is_empty() {
            1.0
        } else {
            output.len() as f64 / data.len() as f64
        };
        Ok(json!({
            "output": output,
            "original_bytes": data.len(),
            "compressed_bytes": output.len(),
            "ratio": ratio,
        }))
    }
}

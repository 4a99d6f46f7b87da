//! Tool descriptions for `tools/list`: the five primitives plus the
//! `stats` observability tool.

use serde_json::{json, Value};

pub fn descriptions() -> Value {
    json!([
        {
            "name": "store",
            "description": "Store versioned content under a key; long text is also indexed for semantic and lexical search",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "key": { "type": "string", "description": "Relative path identifying the content" },
                    "value": { "description": "Text, byte array, or structured value to store" },
                    "metadata": { "type": "object", "description": "Optional opaque metadata" }
                },
                "required": ["key", "value"]
            }
        },
        {
            "name": "retrieve",
            "description": "Read the current value for a key, optionally with its recent version history",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "key": { "type": "string" },
                    "include_history": { "type": "boolean", "description": "Include up to 10 recent versions" }
                },
                "required": ["key"]
            }
        },
        {
            "name": "search",
            "description": "Search stored knowledge: semantic, lexical, graph, temporal, or hybrid fusion",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "query": { "type": "string" },
                    "mode": { "type": "string", "enum": ["semantic", "lexical", "graph", "temporal", "hybrid"] },
                    "k": { "type": "integer", "minimum": 0 },
                    "alpha": { "type": "number", "description": "Lexical weight (hybrid)" },
                    "beta": { "type": "number", "description": "Semantic weight (hybrid)" },
                    "gamma": { "type": "number", "description": "Graph weight (hybrid)" },
                    "context": { "type": "string", "description": "Context node key (hybrid graph component)" },
                    "root": { "type": "string", "description": "Root node key (graph mode)" },
                    "direction": { "type": "string", "enum": ["forward", "reverse", "bidirectional"] },
                    "max_depth": { "type": "integer" },
                    "resolution": { "type": "integer", "description": "Matryoshka prefix dimension (semantic mode)" },
                    "start_us": { "type": "integer", "description": "Range start (temporal mode)" },
                    "end_us": { "type": "integer", "description": "Range end (temporal mode)" }
                },
                "required": []
            }
        },
        {
            "name": "link",
            "description": "Create or update a typed, weighted edge between two entities, creating endpoints as needed",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "from": { "type": "string" },
                    "to": { "type": "string" },
                    "relation": { "type": "string", "description": "contains, depends_on, calls, evolved_into, similar_to, references, or a custom label" },
                    "metadata": { "type": "object", "description": "Edge attributes; 'weight' sets the traversal weight" }
                },
                "required": ["from", "to", "relation"]
            }
        },
        {
            "name": "transform",
            "description": "Run a registered transform: parse_functions, extract_imports, generate_summary, compress_text",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "op": { "type": "string" },
                    "data": { "type": "string" },
                    "options": { "type": "object" }
                },
                "required": ["op", "data"]
            }
        },
        {
            "name": "stats",
            "description": "Engine statistics: stores, indices, pools, caches, sessions",
            "inputSchema": { "type": "object", "properties": {}, "required": [] }
        }
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_every_primitive() {
        let tools = descriptions();
        let names: Vec<&str> = tools
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["name"].as_str().unwrap())
            .collect();
        for expected in ["store", "retrieve", "search", "link", "transform", "stats"] {
            assert!(names.contains(&expected), "missing tool {expected}");
        }
    }

    #[test]
    fn every_tool_has_a_schema() {
        for tool in descriptions().as_array().unwrap() {
            assert!(tool["inputSchema"]["type"] == "object");
        }
    }
}

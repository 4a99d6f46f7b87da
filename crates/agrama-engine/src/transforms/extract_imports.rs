//! Extract import/dependency statements from source text.

use regex::Regex;
use serde_json::{json, Value};

use agrama_core::errors::AgramaResult;

use super::Transform;

pub struct ExtractImports {
    patterns: Vec<Regex>,
}

impl ExtractImports {
    pub fn new() -> Self {
        let sources = [
            // Rust
            r"(?m)^\s*use\s+(?P<target>[A-Za-z_][A-Za-z0-9_:]*)",
            // Python
            r"(?m)^\s*(?:from\s+(?P<target>[A-Za-z_][A-Za-z0-9_.]*)\s+import|import\s+(?P<target2>[A-Za-z_][A-Za-z0-9_.]*))",
            // JS/TS import … from '…' and require('…')
            r#"(?m)(?:import\s+[^;]*?from\s+|require\()\s*['"](?P<target>[^'"]+)['"]"#,
        ];
        let patterns = sources
            .into_iter()
            .filter_map(|src| Regex::new(src).ok())
            .collect();
        Self { patterns }
    }
}

impl Transform for ExtractImports {
    fn name(&self) -> &'static str {
        "extract_imports"
    }

    fn apply(&self, data: &str, _options: &Value) -> AgramaResult<Value> {
        let mut imports: Vec<String> = Vec::new();
        let mut seen = std::collections::HashSet::new();
        for re in &self.patterns {
            for caps in re.captures_iter(data) {
                let target = caps
                    .name("target")
                    .or_else(|| caps.name("target2"))
                    .map(|m| m.as_str().to_string());
                if let Some(target) = target {
                    if seen.insert(target.clone()) {
                        imports.push(target);
                    }
                }
            }
        }
        Ok(json!({ "imports": imports, "count": imports.len() }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_rust_use_paths() {
        let src = "use std::collections::HashMap;\nuse serde::Serialize;";
        let out = ExtractImports::new().apply(src, &Value::Null).unwrap();
        let imports = out["imports"].as_array().unwrap();
        assert_eq!(imports[0], "std::collections::HashMap");
        assert_eq!(imports[1], "serde::Serialize");
    }

    #[test]
    fn extracts_python_imports() {
        let src = "import os\nfrom collections import deque";
        let out = ExtractImports::new().apply(src, &Value::Null).unwrap();
        let imports = out["imports"].as_array().unwrap();
        assert!(imports.iter().any(|v| v == "os"));
        assert!(imports.iter().any(|v| v == "collections"));
    }

    #[test]
    fn extracts_js_module_specifiers() {
        let src = "import { x } from './util';\nconst fs = require('fs');";
        let out = ExtractImports::new().apply(src, &Value::Null).unwrap();
        let imports = out["imports"].as_array().unwrap();
        assert!(imports.iter().any(|v| v == "./util"));
        assert!(imports.iter().any(|v| v == "fs"));
    }

    #[test]
    fn duplicates_are_collapsed() {
        let src = "use serde::Serialize;\nuse serde::Serialize;";
        let out = ExtractImports::new().apply(src, &Value::Null).unwrap();
        assert_eq!(out["count"], 1);
    }
}

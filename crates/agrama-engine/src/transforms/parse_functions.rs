//! Extract function definitions from source text.

use regex::Regex;
use serde_json::{json, Value};

use agrama_core::errors::AgramaResult;

use super::Transform;

pub struct ParseFunctions {
    patterns: Vec<(&'static str, Regex)>,
}

impl ParseFunctions {
    pub fn new() -> Self {
        // One pattern per language family; the capture named `name` is the
        // function identifier.
        let sources: [(&'static str, &'static str); 4] = [
            ("rust", r"(?m)^\s*(?:pub(?:\([^)]*\))?\s+)?(?:async\s+)?fn\s+(?P<name>[A-Za-z_][A-Za-z0-9_]*)"),
            ("python", r"(?m)^\s*(?:async\s+)?def\s+(?P<name>[A-Za-z_][A-Za-z0-9_]*)"),
            ("javascript", r"(?m)^\s*(?:export\s+)?(?:async\s+)?function\s*\*?\s*(?P<name>[A-Za-z_$][A-Za-z0-9_$]*)"),
            ("javascript_arrow", r"(?m)^\s*(?:export\s+)?(?:const|let|var)\s+(?P<name>[A-Za-z_$][A-Za-z0-9_$]*)\s*=\s*(?:async\s+)?(?:\([^)]*\)|[A-Za-z_$][A-Za-z0-9_$]*)\s*=>"),
        ];
        let patterns = sources
            .into_iter()
            .filter_map(|(lang, src)| Regex::new(src).ok().map(|re| (lang, re)))
            .collect();
        Self { patterns }
    }
}

impl Transform for ParseFunctions {
    fn name(&self) -> &'static str {
        "parse_functions"
    }

    fn apply(&self, data: &str, options: &Value) -> AgramaResult<Value> {
        let language = options.get("language").and_then(Value::as_str);

        let mut functions: Vec<Value> = Vec::new();
        let mut seen = std::collections::HashSet::new();
        for (lang, re) in &self.patterns {
            if language.is_some_and(|l| !lang.starts_with(l)) {
                continue;
            }
            for caps in re.captures_iter(data) {
                let Some(name) = caps.name("name") else {
                    continue;
                };
                let line = data[..name.start()].matches('\n').count() + 1;
                if seen.insert((name.as_str().to_string(), line)) {
                    functions.push(json!({
                        "name": name.as_str(),
                        "line": line,
                        "language": lang,
                    }));
                }
            }
        }
        Ok(json!({ "functions": functions, "count": functions.len() }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_rust_functions_with_lines() {
        let src = "pub fn alpha() {}\n\nasync fn beta() {}\nfn gamma_3() {}";
        let out = ParseFunctions::new().apply(src, &Value::Null).unwrap();
        let functions = out["functions"].as_array().unwrap();
        let names: Vec<&str> = functions.iter().map(|f| f["name"].as_str().unwrap()).collect();
        assert_eq!(names, vec!["alpha", "beta", "gamma_3"]);
        assert_eq!(functions[1]["line"], 3);
    }

    #[test]
    fn finds_python_and_js() {
        let src = "def handler(x):\n    pass\nconst onClick = async () => {}\nfunction main() {}";
        let out = ParseFunctions::new().apply(src, &Value::Null).unwrap();
        let names: Vec<String> = out["functions"]
            .as_array()
            .unwrap()
            .iter()
            .map(|f| f["name"].as_str().unwrap().to_string())
            .collect();
        assert!(names.contains(&"handler".to_string()));
        assert!(names.contains(&"onClick".to_string()));
        assert!(names.contains(&"main".to_string()));
    }

    #[test]
    fn language_option_narrows_patterns() {
        let src = "fn rusty() {}\ndef snaky():\n    pass";
        let out = ParseFunctions::new()
            .apply(src, &serde_json::json!({"language": "python"}))
            .unwrap();
        assert_eq!(out["count"], 1);
        assert_eq!(out["functions"][0]["name"], "snaky");
    }

    #[test]
    fn empty_input_yields_empty_list() {
        let out = ParseFunctions::new().apply("", &Value::Null).unwrap();
        assert_eq!(out["count"], 0);
    }
}

//! The transform registry: deterministic data → data operations exposed
//! through the `transform` primitive. Dispatch is name → boxed transform;
//! unknown names fail with `UnknownTransform`.

mod compress_text;
mod extract_imports;
mod generate_summary;
mod parse_functions;

use std::collections::HashMap;

use serde_json::Value;

use agrama_core::errors::{AgramaResult, ValidationError};

/// A registered transform.
pub trait Transform: Send + Sync {
    fn name(&self) -> &'static str;

    /// Run the transform. `data` is the input text; `options` carries
    /// transform-specific knobs.
    fn apply(&self, data: &str, options: &Value) -> AgramaResult<Value>;
}

/// Name → transform table.
pub struct TransformRegistry {
    transforms: HashMap<&'static str, Box<dyn Transform>>,
}

impl TransformRegistry {
    /// The built-in transform set.
    pub fn standard() -> Self {
        let mut registry = Self {
            transforms: HashMap::new(),
        };
        registry.add(Box::new(parse_functions::ParseFunctions::new()));
        registry.add(Box::new(extract_imports::ExtractImports::new()));
        registry.add(Box::new(generate_summary::GenerateSummary));
        registry.add(Box::new(compress_text::CompressText));
        registry
    }

    pub fn add(&mut self, transform: Box<dyn Transform>) {
        self.transforms.insert(transform.name(), transform);
    }

    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.transforms.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Dispatch by name.
    ///
    /// # Errors
    /// `UnknownTransform` for names not in the table.
    pub fn apply(&self, name: &str, data: &str, options: &Value) -> AgramaResult<Value> {
        let transform = self
            .transforms
            .get(name)
            .ok_or_else(|| ValidationError::UnknownTransform {
                name: name.to_string(),
            })?;
        transform.apply(data, options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_set_is_complete() {
        let reg = TransformRegistry::standard();
        assert_eq!(
            reg.names(),
            vec![
                "compress_text",
                "extract_imports",
                "generate_summary",
                "parse_functions"
            ]
        );
    }

    #[test]
    fn unknown_transform_is_rejected() {
        let reg = TransformRegistry::standard();
        let err = reg.apply("minify", "data", &Value::Null).unwrap_err();
        assert_eq!(err.kind(), "validation");
    }
}

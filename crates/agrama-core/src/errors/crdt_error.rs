/// Collaborative-document errors.
#[derive(Debug, thiserror::Error)]
pub enum CrdtError {
    #[error("no collaborative document at path: {path}")]
    DocumentNotFound { path: String },

    #[error("operation {op_id} is missing causal dependencies (buffered)")]
    MissingDependency { op_id: String },

    #[error("operation {op_id} references unknown element {element}")]
    UnknownElement { op_id: String, element: String },
}

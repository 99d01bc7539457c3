use crate::{NodeKind, OperationKind};

/// Declaration errors. Every one of them means the schema or the selection written against
/// it is broken, none of them is transient.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchemaError {
    #[error("model `{0}` is referenced but was never registered")]
    UnresolvedModel(String),
    #[error("input `{0}` is referenced but was never registered")]
    UnresolvedInput(String),
    #[error("two different models are registered under the name `{0}`")]
    DuplicateModel(String),
    #[error("two different inputs are registered under the name `{0}`")]
    DuplicateInput(String),
    #[error("`{type_name}` has no field named `{field}`")]
    UnknownField { type_name: String, field: String },
    #[error("{kind} `{name}` is not declared")]
    UnknownRootField { kind: OperationKind, name: String },
    #[error("a {0} node cannot be used in input position")]
    OutputNodeInInputPosition(NodeKind),
    #[error("invalid schema descriptor at `{path}`: {message}")]
    InvalidDescriptor { path: String, message: String },
    #[error("invalid selection: {0}")]
    InvalidSelection(String),
}

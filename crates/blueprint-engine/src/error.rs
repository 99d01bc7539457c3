use blueprint_schema::{OperationKind, SchemaError};

use crate::{DatastoreError, ValidationError};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Datastore(#[from] DatastoreError),
    #[error("resolver for `{type_name}.{field}` failed: {message}")]
    Resolver {
        type_name: String,
        field: String,
        message: String,
    },
    #[error("context resolver `{key}` failed: {message}")]
    Context { key: String, message: String },
    #[error("`{type_name}.{field}` cannot be null")]
    NullValue { type_name: String, field: String },
    #[error("`{type_name}.{field}` does not accept arguments")]
    UnexpectedArguments { type_name: String, field: String },
    #[error("a resolver is already registered for {kind} `{name}`")]
    DuplicateResolver { kind: OperationKind, name: String },
    #[error("batch for `{type_name}.{field}` returned {returned} values for {expected} keys")]
    BatchLength {
        type_name: String,
        field: String,
        expected: usize,
        returned: usize,
    },
    #[error("model `{0}` is bound to storage but no datastore is configured")]
    MissingDatastore(String),
    #[error("invalid configuration: {0}")]
    Configuration(String),
    #[error("invalid operation: {0}")]
    Document(String),
}

impl EngineError {
    pub(crate) fn resolver(type_name: &str, field: &str, error: &anyhow::Error) -> Self {
        EngineError::Resolver {
            type_name: type_name.to_owned(),
            field: field.to_owned(),
            message: format!("{error:#}"),
        }
    }
}

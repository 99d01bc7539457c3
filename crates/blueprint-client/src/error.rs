use blueprint_schema::{SchemaError, ShapeMismatch};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("no transport client is configured")]
    MissingTransport,
    #[error("transport failed: {0:#}")]
    Request(anyhow::Error),
    /// Every error of the response, in order.
    #[error("the operation failed: {}", .0.join("; "))]
    Transport(Vec<String>),
    #[error("unexpected response shape: {0}")]
    UnexpectedShape(#[from] ShapeMismatch),
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

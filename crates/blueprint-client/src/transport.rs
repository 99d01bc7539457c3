use std::sync::Arc;

use serde_json::Value;

/// Body of a transport response, GraphQL style.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct TransportResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<Value>>,
}

impl TransportResponse {
    pub fn data(data: Value) -> Self {
        TransportResponse {
            data: Some(data),
            errors: None,
        }
    }

    /// Messages of every reported error, `message` field first and the raw error otherwise.
    pub fn error_messages(&self) -> Vec<String> {
        self.errors
            .iter()
            .flatten()
            .map(|error| match error.get("message").and_then(Value::as_str) {
                Some(message) => message.to_owned(),
                None => error.to_string(),
            })
            .collect()
    }
}

/// Sends a query document somewhere and returns its response.
#[async_trait::async_trait]
pub trait TransportClient: Send + Sync {
    async fn fetch(&self, document: String) -> anyhow::Result<TransportResponse>;
}

#[derive(Clone)]
pub struct Transport(Arc<dyn TransportClient>);

impl Transport {
    pub fn new(inner: impl TransportClient + 'static) -> Self {
        Self(Arc::new(inner))
    }
}

impl std::ops::Deref for Transport {
    type Target = dyn TransportClient;
    fn deref(&self) -> &Self::Target {
        self.0.deref()
    }
}

impl std::fmt::Debug for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transport").finish_non_exhaustive()
    }
}

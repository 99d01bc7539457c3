use std::sync::{Arc, Mutex, PoisonError};

use blueprint_client::{TransportClient, TransportResponse};
use blueprint_engine::{Engine, InboundRequest};

/// Sends client documents straight to an engine, recording each of them.
pub struct InProcessTransport {
    engine: Engine,
    request: InboundRequest,
    documents: Arc<Mutex<Vec<String>>>,
}

impl InProcessTransport {
    pub fn new(engine: Engine) -> Self {
        InProcessTransport {
            engine,
            request: InboundRequest::default(),
            documents: Arc::default(),
        }
    }

    #[must_use]
    pub fn with_request(mut self, request: InboundRequest) -> Self {
        self.request = request;
        self
    }

    /// Documents sent so far, readable after the transport moved into a client.
    pub fn documents(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.documents)
    }
}

#[async_trait::async_trait]
impl TransportClient for InProcessTransport {
    async fn fetch(&self, document: String) -> anyhow::Result<TransportResponse> {
        self.documents
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(document.clone());

        let response = self.engine.execute_document(&document, None, &self.request).await;
        Ok(serde_json::from_value(response.into_json())?)
    }
}

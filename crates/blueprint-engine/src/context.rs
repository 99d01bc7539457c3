use std::{
    collections::HashMap,
    future::Future,
    sync::{Arc, Mutex, PoisonError},
};

use futures_util::{future::BoxFuture, FutureExt};
use http::{HeaderMap, HeaderName, HeaderValue};
use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::{loader::BatchLoader, EngineError};

/// The request an operation was received with.
#[derive(Debug, Clone, Default)]
pub struct InboundRequest {
    pub headers: HeaderMap,
}

impl InboundRequest {
    pub fn new(headers: HeaderMap) -> Self {
        InboundRequest { headers }
    }

    #[must_use]
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }
}

pub type ContextResolverFn = Arc<dyn Fn(&InboundRequest) -> BoxFuture<'static, anyhow::Result<Value>> + Send + Sync>;

pub fn context_resolver<F, Fut>(f: F) -> ContextResolverFn
where
    F: Fn(&InboundRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<Value>> + Send + 'static,
{
    Arc::new(move |request: &InboundRequest| f(request).boxed())
}

/// State shared by every resolver of one operation: the values of the context resolvers
/// and the batch loaders.
pub struct RequestContext {
    request: InboundRequest,
    values: Map<String, Value>,
    max_batch_size: Option<usize>,
    loaders: Mutex<HashMap<String, Arc<BatchLoader>>>,
}

impl RequestContext {
    pub fn new(request: InboundRequest, values: Map<String, Value>, max_batch_size: Option<usize>) -> Self {
        RequestContext {
            request,
            values,
            max_batch_size,
            loaders: Mutex::default(),
        }
    }

    /// Runs every context resolver once and builds the context of an operation.
    pub(crate) async fn resolve(
        request: InboundRequest,
        resolvers: &IndexMap<String, ContextResolverFn>,
        max_batch_size: Option<usize>,
    ) -> Result<Self, EngineError> {
        let futures = resolvers.iter().map(|(key, resolver)| {
            resolver(&request).map(move |result| {
                result.map(|value| (key.clone(), value)).map_err(|error| EngineError::Context {
                    key: key.clone(),
                    message: format!("{error:#}"),
                })
            })
        });

        let values = futures_util::future::join_all(futures)
            .await
            .into_iter()
            .collect::<Result<Map<_, _>, _>>()?;

        Ok(RequestContext::new(request, values, max_batch_size))
    }

    pub fn request(&self) -> &InboundRequest {
        &self.request
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }

    /// The loader registered under `key`, created by `create` on first use.
    pub(crate) fn loader(
        &self,
        key: String,
        create: impl FnOnce(Option<usize>) -> BatchLoader,
    ) -> Arc<BatchLoader> {
        let mut loaders = self.loaders.lock().unwrap_or_else(PoisonError::into_inner);
        loaders
            .entry(key)
            .or_insert_with(|| Arc::new(create(self.max_batch_size)))
            .clone()
    }
}

impl std::fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestContext")
            .field("request", &self.request)
            .field("values", &self.values)
            .finish_non_exhaustive()
    }
}

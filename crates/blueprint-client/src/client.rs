use std::sync::Arc;

use blueprint_schema::{infer_operation, AppSchema, OperationKind, SelectSet, Selection};
use serde_json::{Map, Value};

use crate::{build_document, ClientError, Transport, TransportClient};

/// Entry point to send operations to a blueprint application.
#[derive(Debug, Clone, Default)]
pub struct Client {
    transport: Option<Transport>,
    schema: Option<Arc<AppSchema>>,
}

impl Client {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_transport(mut self, transport: impl TransportClient + 'static) -> Self {
        self.transport = Some(Transport::new(transport));
        self
    }

    /// Responses are checked against the shape inferred from this schema.
    #[must_use]
    pub fn with_schema(mut self, schema: Arc<AppSchema>) -> Self {
        self.schema = Some(schema);
        self
    }

    pub fn schema(&self) -> Option<&AppSchema> {
        self.schema.as_deref()
    }

    pub fn query(&self, name: impl Into<String>) -> Selector<'_> {
        Selector::new(self, OperationKind::Query, name.into())
    }

    pub fn mutation(&self, name: impl Into<String>) -> Selector<'_> {
        Selector::new(self, OperationKind::Mutation, name.into())
    }
}

/// An operation being built against one root field.
#[derive(Debug)]
pub struct Selector<'a> {
    client: &'a Client,
    kind: OperationKind,
    name: String,
    selection: Selection,
}

impl<'a> Selector<'a> {
    fn new(client: &'a Client, kind: OperationKind, name: String) -> Self {
        Selector {
            client,
            kind,
            name,
            selection: Selection::default(),
        }
    }

    #[must_use]
    pub fn args(mut self, args: Map<String, Value>) -> Self {
        self.selection.args = Some(args);
        self
    }

    #[must_use]
    pub fn arg(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.selection = self.selection.arg(name, value);
        self
    }

    #[must_use]
    pub fn select(mut self, select: SelectSet) -> Self {
        self.selection.select = Some(select);
        self
    }

    /// Replaces the whole selection, arguments and aliases included.
    #[must_use]
    pub fn selection(mut self, selection: Selection) -> Self {
        self.selection = selection;
        self
    }

    /// Fetches the root field under `alias`, with its own arguments and selection.
    #[must_use]
    pub fn alias(mut self, alias: impl Into<String>, selection: Selection) -> Self {
        self.selection.aliases.insert(alias.into(), selection);
        self
    }

    pub fn document(&self) -> String {
        build_document(self.kind, &self.name, &self.selection)
    }

    pub async fn fetch(self) -> Result<Value, ClientError> {
        execute_query(self.client, self.kind, &self.name, &self.selection).await
    }
}

/// Sends one root field operation and returns `data[name]`, or an object keyed by alias
/// when the selection aliases the root field.
///
/// Without a transport the returned future fails on its first poll.
pub async fn execute_query(
    client: &Client,
    kind: OperationKind,
    name: &str,
    selection: &Selection,
) -> Result<Value, ClientError> {
    let transport = client.transport.as_ref().ok_or(ClientError::MissingTransport)?;

    let document = build_document(kind, name, selection);
    tracing::debug!(%kind, name, document = document.as_str(), "sending operation");

    let response = transport.fetch(document).await.map_err(ClientError::Request)?;

    let messages = response.error_messages();
    if !messages.is_empty() {
        return Err(ClientError::Transport(messages));
    }

    let mut data = match response.data {
        Some(Value::Object(data)) => data,
        _ => Map::new(),
    };

    let value = if selection.has_aliases() {
        let fields = selection
            .aliases
            .keys()
            .map(|alias| (alias.clone(), data.remove(alias).unwrap_or(Value::Null)))
            .collect();
        Value::Object(fields)
    } else {
        data.remove(name).unwrap_or(Value::Null)
    };

    if let Some(schema) = &client.schema {
        infer_operation(schema, kind, name, selection)?.check(&value)?;
    }

    Ok(value)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use blueprint_schema::{args, input, model, nullable, Blueprint, Primitive};
    use futures::FutureExt;
    use serde_json::json;

    use super::*;
    use crate::TransportResponse;

    #[derive(Default)]
    struct Recorded {
        documents: Arc<Mutex<Vec<String>>>,
        response: TransportResponse,
    }

    #[async_trait::async_trait]
    impl TransportClient for Recorded {
        async fn fetch(&self, document: String) -> anyhow::Result<TransportResponse> {
            self.documents.lock().unwrap().push(document);
            Ok(self.response.clone())
        }
    }

    fn schema() -> Arc<AppSchema> {
        let post = model(
            "Post",
            Blueprint::new()
                .field("id", Primitive::Number)
                .field("name", Primitive::String),
        );
        let schema = AppSchema::builder()
            .query(
                "post",
                args(nullable(post), input("PostId", Blueprint::new().field("id", Primitive::Number))),
            )
            .build()
            .unwrap();
        Arc::new(schema)
    }

    #[test]
    fn missing_transport_fails_on_first_poll() {
        let client = Client::new();
        let result = client.query("post").arg("id", 1).fetch().now_or_never();
        assert!(matches!(result, Some(Err(ClientError::MissingTransport))));
    }

    #[tokio::test]
    async fn sends_the_document_and_extracts_the_field() {
        let documents = Arc::new(Mutex::new(Vec::new()));
        let client = Client::new().with_schema(schema()).with_transport(Recorded {
            documents: documents.clone(),
            response: TransportResponse::data(json!({ "post": { "id": 1, "name": "hello" } })),
        });

        let post = client
            .query("post")
            .arg("id", 1)
            .selection(Selection::new().arg("id", 1).fields(["id", "name"]))
            .fetch()
            .await
            .unwrap();

        assert_eq!(post, json!({ "id": 1, "name": "hello" }));
        assert_eq!(
            documents.lock().unwrap().as_slice(),
            ["query { post(id: 1) { id name } }"]
        );
    }

    #[tokio::test]
    async fn errors_are_aggregated() {
        let client = Client::new().with_transport(Recorded {
            response: TransportResponse {
                data: None,
                errors: Some(vec![json!({ "message": "first" }), json!("second")]),
            },
            ..Recorded::default()
        });

        let error = client.query("post").fetch().await.unwrap_err();
        insta::assert_snapshot!(error, @r#"the operation failed: first; "second""#);
    }

    #[tokio::test]
    async fn responses_are_checked_against_the_selection() {
        let client = Client::new().with_schema(schema()).with_transport(Recorded {
            response: TransportResponse::data(json!({ "post": { "id": 1, "name": "hello" } })),
            ..Recorded::default()
        });

        let error = client
            .query("post")
            .selection(Selection::new().arg("id", 1).field("id"))
            .fetch()
            .await
            .unwrap_err();

        insta::assert_snapshot!(error, @"unexpected response shape: expected no value at `name`, found an unselected key");
    }

    #[tokio::test]
    async fn root_aliases_are_keyed_by_alias() {
        let client = Client::new().with_transport(Recorded {
            response: TransportResponse::data(json!({ "first": { "id": 1 }, "second": null })),
            ..Recorded::default()
        });

        let value = client
            .query("post")
            .alias("first", Selection::new().arg("id", 1).field("id"))
            .alias("second", Selection::new().arg("id", 2).field("id"))
            .fetch()
            .await
            .unwrap();

        assert_eq!(value, json!({ "first": { "id": 1 }, "second": null }));
    }
}

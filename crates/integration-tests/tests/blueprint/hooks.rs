use std::sync::{Arc, Mutex};

use blueprint_engine::{resolver, EngineError, Hooks, InboundRequest, ModelResolvers, ResolverInput};
use blueprint_schema::OperationKind;
use integration_tests::{blog, runtime};
use serde_json::Value;

#[derive(Default)]
struct Recording(Mutex<Vec<String>>);

impl Hooks for Recording {
    fn on_root_success(&self, kind: OperationKind, field: &str, _: &Value) {
        self.0.lock().unwrap().push(format!("{kind} {field} ok"));
    }

    fn on_root_error(&self, kind: OperationKind, field: &str, _: &EngineError) {
        self.0.lock().unwrap().push(format!("{kind} {field} failed"));
    }

    fn on_field_success(&self, type_name: &str, field: &str, _: &Value) {
        self.0.lock().unwrap().push(format!("{type_name}.{field} ok"));
    }

    fn on_field_error(&self, type_name: &str, field: &str, _: &EngineError) {
        self.0.lock().unwrap().push(format!("{type_name}.{field} failed"));
    }
}

#[test]
fn every_resolved_field_is_reported_once() {
    let hooks = Arc::new(Recording::default());

    let response = runtime().block_on(async {
        let engine = blog::engine(&blog::datastore())
            .resolver(ModelResolvers::new("Post").field(
                "likes",
                resolver(|_: ResolverInput| async { Err(anyhow::anyhow!("likes are hidden")) }),
            ))
            .hooks(hooks.clone())
            .build()
            .unwrap();

        engine
            .execute_document(
                "query { post(id: 1) { name author { firstName } likes } }",
                None,
                &InboundRequest::default(),
            )
            .await
    });

    assert_eq!(response.errors.len(), 1);
    insta::assert_snapshot!(response.errors[0].message, @"resolver for `Post.likes` failed: likes are hidden");

    let mut events = hooks.0.lock().unwrap().clone();
    events.sort();
    // `name` and `firstName` are read from their parent and are not reported.
    assert_eq!(events, ["Post.author ok", "Post.likes failed", "query post ok"]);
}

#[test]
fn mutations_are_reported_in_order() {
    let hooks = Arc::new(Recording::default());

    let response = runtime().block_on(async {
        let engine = blog::engine(&blog::datastore())
            .hooks(hooks.clone())
            .build()
            .unwrap();

        engine
            .execute_document(
                r#"mutation { postSave(input: { name: "Drafts" }) { id } postRemove(where: { id: 4 }) }"#,
                None,
                &InboundRequest::default(),
            )
            .await
    });

    assert!(response.is_ok(), "{response:?}");
    assert_eq!(
        *hooks.0.lock().unwrap(),
        ["mutation postSave ok", "mutation postRemove ok"]
    );
}

use std::sync::{Arc, PoisonError};

use blueprint_client::{Client, ClientError};
use blueprint_engine::{resolver, ModelResolvers, ResolverInput};
use blueprint_schema::Selection;
use integration_tests::{blog, runtime, InProcessTransport};
use serde_json::json;

#[test]
fn likes_are_resolved_end_to_end() {
    let (post, documents) = runtime().block_on(async {
        let engine = blog::engine(&blog::datastore())
            .resolver(ModelResolvers::new("Post").field("likes", resolver(|_: ResolverInput| async { Ok(json!(100)) })))
            .build()
            .unwrap();

        let transport = InProcessTransport::new(engine.clone());
        let documents = transport.documents();
        let client = Client::new()
            .with_transport(transport)
            .with_schema(Arc::new(engine.schema().clone()));

        let post = client
            .query("post")
            .selection(Selection::new().arg("id", 1).fields(["id", "name", "likes"]))
            .fetch()
            .await
            .unwrap();

        let documents = documents.lock().unwrap_or_else(PoisonError::into_inner).clone();
        (post, documents)
    });

    assert_eq!(post, json!({ "id": 1, "name": "Hello", "likes": 100 }));
    assert_eq!(documents, ["query { post(id: 1) { id name likes } }"]);
}

#[test]
fn missing_transport_fails_fast() {
    let error = runtime().block_on(async {
        Client::new()
            .query("post")
            .selection(Selection::new().arg("id", 1).field("id"))
            .fetch()
            .await
            .unwrap_err()
    });

    assert!(matches!(error, ClientError::MissingTransport));
}

#[test]
fn aliases_carry_their_own_arguments() {
    let post = runtime().block_on(async {
        let engine = blog::engine(&blog::datastore()).build().unwrap();
        let client = Client::new()
            .with_schema(Arc::new(engine.schema().clone()))
            .with_transport(InProcessTransport::new(engine));

        client
            .query("post")
            .selection(
                Selection::new()
                    .arg("id", 2)
                    .alias("album", "albumWithId", Selection::new().arg("limit", 1).field("id"))
                    .alias("album", "albumWithFilename", Selection::new().arg("limit", 2).field("filename"))
                    .alias("mainPhoto", "cat", Selection::new().arg("keyword", "cat").field("url"))
                    .alias("mainPhoto", "dog", Selection::new().arg("keyword", "dog").field("url")),
            )
            .fetch()
            .await
            .unwrap()
    });

    assert_eq!(
        post,
        json!({
            "albumWithId": [{ "id": 1 }],
            "albumWithFilename": [{ "filename": "photo-1.jpg" }, { "filename": "photo-2.jpg" }],
            "cat": { "url": "https://photos.test/cat/2" },
            "dog": { "url": "https://photos.test/dog/2" }
        })
    );
}

#[test]
fn root_aliases_fetch_the_field_once_per_alias() {
    let posts = runtime().block_on(async {
        let engine = blog::engine(&blog::datastore()).build().unwrap();
        let client = Client::new()
            .with_schema(Arc::new(engine.schema().clone()))
            .with_transport(InProcessTransport::new(engine));

        client
            .query("post")
            .alias("first", Selection::new().arg("id", 1).field("name"))
            .alias("missing", Selection::new().arg("id", 42).field("name"))
            .fetch()
            .await
            .unwrap()
    });

    assert_eq!(posts, json!({ "first": { "name": "Hello" }, "missing": null }));
}

#[test]
fn objects_without_selection_match_their_inferred_shape() {
    let datastore = blog::datastore();

    let post = runtime().block_on(async {
        let engine = blog::engine(&datastore).build().unwrap();
        let client = Client::new()
            .with_schema(Arc::new(engine.schema().clone()))
            .with_transport(InProcessTransport::new(engine));

        client
            .query("post")
            .selection(Selection::new().arg("id", 1).field("author"))
            .fetch()
            .await
            .unwrap()
    });

    // The stored author only: `posts` is a relation and is not loaded.
    assert_eq!(post, json!({ "author": { "id": 1, "firstName": "Ada" } }));
    assert_eq!(datastore.calls(), ["load_relation_ids posts->users x1", "find users"]);
}

#[test]
fn serialized_documents() {
    let client = Client::new();

    let document = client
        .query("posts")
        .selection(
            Selection::new()
                .arg("where", json!({ "likes": 3, "name": "x" }))
                .arg("take", 2)
                .field("id")
                .nested("author", Selection::new().field("firstName")),
        )
        .document();

    insta::assert_snapshot!(
        document,
        @r#"query { posts(where: { likes: 3, name: "x" }, take: 2) { id author { firstName } } }"#
    );
}

#[test]
fn engine_errors_reach_the_client() {
    let error = runtime().block_on(async {
        let engine = blog::engine(&blog::datastore()).build().unwrap();
        let client = Client::new().with_transport(InProcessTransport::new(engine));

        client
            .query("post")
            .selection(Selection::new().arg("id", 1).field("title"))
            .fetch()
            .await
            .unwrap_err()
    });

    insta::assert_snapshot!(error, @"the operation failed: `Post` has no field named `title`");
}

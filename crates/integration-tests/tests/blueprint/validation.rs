use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};

use blueprint_engine::{
    batch, validation::field_validator, BatchInput, Constraint, InboundRequest, ModelResolvers, ValidationError,
};
use integration_tests::{blog, runtime};
use rstest::rstest;
use serde_json::{json, Value};

#[test]
fn arguments_are_checked_before_the_resolver_runs() {
    let response = runtime().block_on(async {
        let engine = blog::engine(&blog::datastore())
            .field_constraints("PostId", "id", vec![Constraint::range(Some(1.0), None)])
            .build()
            .unwrap();

        engine
            .execute_document("query { post(id: 0) { id } }", None, &InboundRequest::default())
            .await
    });

    insta::assert_json_snapshot!(response, @r#"
    {
      "data": {
        "post": null
      },
      "errors": [
        {
          "message": "`id` does not satisfy range: must be at least 1, got 0",
          "path": [
            "post"
          ]
        }
      ]
    }
    "#);
}

#[rstest]
#[case::wrong_type(r#"query { post(id: "1") { id } }"#, r#"`id` does not satisfy type: expected Number, found "1""#)]
#[case::unknown(
    "query { post(id: 1, bogus: 1) { id } }",
    "`bogus` does not satisfy unknown: no such argument is declared"
)]
#[case::missing("query { post { id } }", "`id` does not satisfy required: a value is required")]
fn malformed_arguments_are_rejected_without_a_validator(#[case] query: &str, #[case] message: &str) {
    let response = runtime().block_on(async {
        let engine = blog::engine(&blog::datastore()).build().unwrap();
        engine.execute_document(query, None, &InboundRequest::default()).await
    });

    assert_eq!(response.data.unwrap(), json!({ "post": null }));
    assert_eq!(response.errors.len(), 1);
    assert_eq!(response.errors[0].message, message);
}

#[test]
fn batch_functions_receive_validated_arguments() {
    let seen = Arc::new(Mutex::new(Vec::new()));

    let response = runtime().block_on(async {
        let recorded = Arc::clone(&seen);
        let engine = blog::posts(&blog::datastore())
            .resolver(ModelResolvers::new("Post").loader(
                "album",
                batch(move |input: BatchInput| {
                    recorded.lock().unwrap().push(input.args.clone().unwrap_or_default());

                    let limit = input
                        .args
                        .as_ref()
                        .and_then(|args| args["limit"].as_u64())
                        .unwrap_or_default();
                    let albums: Vec<Value> = input
                        .parents
                        .iter()
                        .map(|parent| {
                            let photos = (1..=limit)
                                .map(|index| {
                                    let url = format!("https://photos.test/{}/{index}", parent["id"]);
                                    json!({ "id": index, "url": url })
                                })
                                .collect();
                            Value::Array(photos)
                        })
                        .collect();

                    async move { Ok(albums) }
                }),
            ))
            .field_validator(
                "AlbumLimit",
                "limit",
                field_validator(|input| async move {
                    // Albums hold two photos at most.
                    Ok(input.value.as_u64().filter(|limit| *limit > 2).map(|_| Value::from(2)))
                }),
            )
            .build()
            .unwrap();

        engine
            .execute_document(
                "query { latestPosts { id album(limit: 99) { id } } }",
                None,
                &InboundRequest::default(),
            )
            .await
    });

    assert!(response.is_ok(), "{response:?}");
    assert_eq!(
        response.data.unwrap()["latestPosts"][0],
        json!({ "id": 3, "album": [{ "id": 1 }, { "id": 2 }] })
    );
    assert_eq!(*seen.lock().unwrap(), [json!({ "limit": 2 })]);
}

#[test]
fn field_functions_may_replace_results() {
    let response = runtime().block_on(async {
        let engine = blog::engine(&blog::datastore())
            .field_validator(
                "Post",
                "name",
                field_validator(|input| async move {
                    Ok(input.value.as_str().map(|name| Value::from(name.to_uppercase())))
                }),
            )
            .build()
            .unwrap();

        engine
            .execute_document("query { latestPosts { name } }", None, &InboundRequest::default())
            .await
    });

    assert!(response.is_ok(), "{response:?}");
    assert_eq!(
        response.data.unwrap(),
        json!({ "latestPosts": [{ "name": "BATCHES" }, { "name": "CYCLES" }, { "name": "HELLO" }] })
    );
}

#[test]
fn absent_and_null_values_are_not_validated() {
    let calls = Arc::new(AtomicUsize::new(0));

    let response = runtime().block_on(async {
        let counted = Arc::clone(&calls);
        let engine = blog::engine(&blog::datastore())
            .field_validator(
                "Photo",
                "filename",
                field_validator(move |_| {
                    counted.fetch_add(1, Ordering::SeqCst);
                    async { Err(ValidationError::new("filename", "never", "filenames are rejected")) }
                }),
            )
            .build()
            .unwrap();

        engine
            .execute_document(
                r#"query { post(id: 3) { mainPhoto(keyword: "cat") { url filename } } }"#,
                None,
                &InboundRequest::default(),
            )
            .await
    });

    assert!(response.is_ok(), "{response:?}");
    // `filename` is optional and was never set, so it is left out.
    assert_eq!(
        response.data.unwrap(),
        json!({ "post": { "mainPhoto": { "url": "https://photos.test/cat/3" } } })
    );
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn failing_results_report_the_rule() {
    let response = runtime().block_on(async {
        let engine = blog::engine(&blog::datastore())
            .field_constraints("Photo", "filename", vec![Constraint::pattern(r"\.png$")])
            .build()
            .unwrap();

        engine
            .execute_document(
                "query { post(id: 1) { album(limit: 1) { filename } } }",
                None,
                &InboundRequest::default(),
            )
            .await
    });

    assert_eq!(response.data.unwrap(), json!({ "post": null }));
    insta::assert_snapshot!(
        response.errors[0].message,
        @r"`filename` does not satisfy pattern: must match `\.png$`"
    );
}

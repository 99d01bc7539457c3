use blueprint_engine::InboundRequest;
use blueprint_schema::{OperationKind, Selection};
use integration_tests::{blog, runtime};
use serde_json::json;

#[test]
fn many_to_one_is_loaded_once_per_batch() {
    let datastore = blog::datastore();

    let posts = runtime().block_on(async {
        let engine = blog::engine(&datastore).build().unwrap();
        engine
            .execute(
                OperationKind::Query,
                "latestPosts",
                &Selection::new()
                    .field("id")
                    .nested("author", Selection::new().field("firstName")),
                &InboundRequest::default(),
            )
            .await
            .unwrap()
    });

    assert_eq!(
        posts,
        json!([
            { "id": 3, "author": { "firstName": "Ada" } },
            { "id": 2, "author": { "firstName": "Grace" } },
            { "id": 1, "author": { "firstName": "Ada" } }
        ])
    );
    assert_eq!(datastore.calls(), ["load_relation_ids posts->users x3", "find users"]);
}

#[test]
fn one_to_many_follows_the_inverse_column() {
    let datastore = blog::datastore();

    let response = runtime().block_on(async {
        let engine = blog::engine(&datastore).build().unwrap();
        engine
            .execute_document(
                "query { post(id: 1) { author { firstName posts { id name } } } }",
                None,
                &InboundRequest::default(),
            )
            .await
    });

    insta::assert_json_snapshot!(response, @r#"
    {
      "data": {
        "post": {
          "author": {
            "firstName": "Ada",
            "posts": [
              {
                "id": 1,
                "name": "Hello"
              },
              {
                "id": 3,
                "name": "Batches"
              }
            ]
          }
        }
      }
    }
    "#);
    assert_eq!(
        datastore.calls(),
        [
            "load_relation_ids posts->users x1",
            "find users",
            "load_relation_ids users->posts x1",
            "find posts"
        ]
    );
}

#[test]
fn unselected_relations_are_not_loaded() {
    let datastore = blog::datastore();

    let (post, materialised) = runtime().block_on(async {
        let engine = blog::engine(&datastore).build().unwrap();
        let post = engine
            .execute(
                OperationKind::Query,
                "post",
                &Selection::new().arg("id", 2),
                &InboundRequest::default(),
            )
            .await
            .unwrap();

        (post, engine.binding("User").unwrap().is_materialised())
    });

    assert_eq!(post, json!({ "id": 2, "name": "Cycles", "likes": 7 }));
    assert!(!materialised);
    assert!(datastore.calls().is_empty());
}

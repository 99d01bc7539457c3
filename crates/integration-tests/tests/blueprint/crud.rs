use blueprint_engine::InboundRequest;
use blueprint_schema::{Node, OperationKind, Primitive};
use indoc::indoc;
use integration_tests::{blog, runtime};
use serde_json::json;

#[test]
fn generated_root_fields() {
    let engine = blog::engine(&blog::datastore()).build().unwrap();
    let schema = engine.schema();

    // `post` is declared by the application and keeps its own arguments.
    assert_eq!(
        schema.queries().names().collect::<Vec<_>>(),
        ["post", "latestPosts", "posts", "postCount"]
    );
    assert_eq!(schema.mutations().names().collect::<Vec<_>>(), ["postSave", "postRemove"]);
    assert!(schema.input("PostId").is_some());
    assert!(schema.input("PostWhere").is_some());
    assert!(schema.input("UserWhere").is_none());

    let count = schema.root_field(OperationKind::Query, "postCount").unwrap();
    assert_eq!(count.value_node(), &Node::Primitive(Primitive::Number));
}

#[test]
fn queries_filter_order_and_page() {
    let response = runtime().block_on(async {
        let engine = blog::engine(&blog::datastore()).build().unwrap();

        let query = indoc! {r#"
            query {
                top: posts(order: { likes: "desc" }, take: 2) { id name likes }
                batches: posts(where: { name: "Batches" }) { id }
                postCount
            }
        "#};

        engine.execute_document(query, None, &InboundRequest::default()).await
    });

    insta::assert_json_snapshot!(response, @r#"
    {
      "data": {
        "top": [
          {
            "id": 2,
            "name": "Cycles",
            "likes": 7
          },
          {
            "id": 1,
            "name": "Hello",
            "likes": 3
          }
        ],
        "batches": [
          {
            "id": 3
          }
        ],
        "postCount": 3
      }
    }
    "#);
}

#[test]
fn mutations_write_through_the_datastore_in_order() {
    let datastore = blog::datastore();

    let (response, count) = runtime().block_on(async {
        let engine = blog::engine(&datastore).build().unwrap();

        let mutation = indoc! {r#"
            mutation($title: String) {
                created: postSave(input: { name: $title, likes: 0 }) { id name }
                renamed: postSave(input: { id: 2, name: "Loops" }) { id name likes }
                removed: postRemove(where: { id: 1 })
            }
        "#};
        let variables = json!({ "title": "Drafts" }).as_object().cloned();
        let response = engine
            .execute_document(mutation, variables, &InboundRequest::default())
            .await;

        let count = engine
            .execute_document("query { postCount }", None, &InboundRequest::default())
            .await;

        (response, count)
    });

    assert!(response.is_ok(), "{response:?}");
    assert_eq!(
        response.data.unwrap(),
        json!({
            "created": { "id": 4, "name": "Drafts" },
            "renamed": { "id": 2, "name": "Loops", "likes": 7 },
            "removed": 1
        })
    );
    assert_eq!(count.data.unwrap(), json!({ "postCount": 3 }));

    let titles = datastore
        .rows("posts")
        .iter()
        .map(|row| row["title"].clone())
        .collect::<Vec<_>>();
    assert_eq!(titles, [json!("Loops"), json!("Batches"), json!("Drafts")]);

    assert_eq!(
        datastore.calls(),
        ["save posts", "save posts", "remove posts", "count posts"]
    );
}

#[test]
fn failing_root_fields_do_not_fail_their_siblings() {
    let response = runtime().block_on(async {
        let engine = blog::engine(&blog::datastore()).build().unwrap();

        let query = indoc! {r#"
            query {
                postCount
                posts(order: { likes: "sideways" }) { id }
            }
        "#};

        engine.execute_document(query, None, &InboundRequest::default()).await
    });

    insta::assert_json_snapshot!(response, @r#"
    {
      "data": {
        "postCount": 3,
        "posts": null
      },
      "errors": [
        {
          "message": "resolver for `Query.posts` failed: invalid order direction \"sideways\" for `likes`",
          "path": [
            "posts"
          ]
        }
      ]
    }
    "#);
}

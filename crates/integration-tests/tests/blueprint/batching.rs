use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
};

use blueprint_config::Config;
use blueprint_engine::{batch, BatchInput, Engine, InboundRequest, ModelResolvers};
use blueprint_schema::{OperationKind, Selection};
use integration_tests::{blog, runtime};
use rstest::rstest;
use serde_json::{json, Value};

/// Likes computed for the whole batch at once, in reverse order, then handed back in the
/// order of the parents.
fn likes(dispatches: &Arc<AtomicUsize>, sizes: &Arc<Mutex<Vec<usize>>>) -> ModelResolvers {
    let (dispatches, sizes) = (Arc::clone(dispatches), Arc::clone(sizes));

    ModelResolvers::new("Post").loader(
        "likes",
        batch(move |input: BatchInput| {
            dispatches.fetch_add(1, Ordering::SeqCst);
            sizes.lock().unwrap().push(input.parents.len());

            async move {
                let computed = input
                    .parents
                    .iter()
                    .rev()
                    .map(|parent| (parent["id"].to_string(), parent["id"].as_i64().unwrap_or_default() * 10))
                    .collect::<HashMap<_, _>>();

                Ok(input
                    .parents
                    .iter()
                    .map(|parent| Value::from(computed[&parent["id"].to_string()]))
                    .collect())
            }
        }),
    )
}

fn engine(config: Config, dispatches: &Arc<AtomicUsize>, sizes: &Arc<Mutex<Vec<usize>>>) -> Engine {
    blog::engine(&blog::datastore())
        .config(config)
        .resolver(likes(dispatches, sizes))
        .build()
        .unwrap()
}

#[test]
fn one_dispatch_per_tick_in_parent_order() {
    let dispatches = Arc::new(AtomicUsize::new(0));
    let sizes = Arc::default();

    let posts = runtime().block_on(async {
        let engine = engine(blog::config(), &dispatches, &sizes);
        engine
            .execute(
                OperationKind::Query,
                "latestPosts",
                &Selection::new().fields(["id", "likes"]),
                &InboundRequest::default(),
            )
            .await
            .unwrap()
    });

    assert_eq!(
        posts,
        json!([
            { "id": 3, "likes": 30 },
            { "id": 2, "likes": 20 },
            { "id": 1, "likes": 10 }
        ])
    );
    assert_eq!(dispatches.load(Ordering::SeqCst), 1);
}

#[rstest]
#[case::unbounded(None, vec![3])]
#[case::pairs(Some(2), vec![2, 1])]
#[case::singles(Some(1), vec![1, 1, 1])]
fn batches_are_capped(#[case] max_batch_size: Option<usize>, #[case] expected: Vec<usize>) {
    let dispatches = Arc::new(AtomicUsize::new(0));
    let sizes = Arc::default();

    let mut config = blog::config();
    config.engine.max_batch_size = max_batch_size;

    let posts = runtime().block_on(async {
        let engine = engine(config, &dispatches, &sizes);
        engine
            .execute(
                OperationKind::Query,
                "latestPosts",
                &Selection::new().field("likes"),
                &InboundRequest::default(),
            )
            .await
            .unwrap()
    });

    assert_eq!(posts, json!([{ "likes": 30 }, { "likes": 20 }, { "likes": 10 }]));
    assert_eq!(*sizes.lock().unwrap(), expected);
}

#[test]
fn aliases_share_the_loader_of_their_field() {
    let dispatches = Arc::new(AtomicUsize::new(0));
    let sizes = Arc::default();

    let response = runtime().block_on(async {
        let engine = engine(blog::config(), &dispatches, &sizes);
        engine
            .execute_document(
                "query { latestPosts { id likes again: likes } }",
                None,
                &InboundRequest::default(),
            )
            .await
    });

    assert!(response.is_ok(), "{response:?}");
    assert_eq!(
        response.data.unwrap()["latestPosts"][0],
        json!({ "id": 3, "likes": 30, "again": 30 })
    );
    assert_eq!(dispatches.load(Ordering::SeqCst), 1);
    assert_eq!(*sizes.lock().unwrap(), [6]);
}

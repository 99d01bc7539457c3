//! A small blog application shared by the tests: posts with an author and photos.

use std::sync::Arc;

use blueprint_config::Config;
use blueprint_engine::{resolver, Engine, EngineBuilder, ModelResolvers, ResolverInput, ResolverRegistration};
use blueprint_schema::{args, array, input, model, nullable, optional, reference, AppSchema, Blueprint, Primitive};
use serde_json::{json, Value};

use crate::MemoryDatastore;

pub const CONFIG: &str = r#"
[engine]
max_batch_size = 10

[entities.Post]
table = "posts"
crud = true
auto_resolve = ["author"]
columns = { name = "title" }
relations = { author = { target = "User", kind = "many_to_one", join_column = "author_id" } }

[entities.User]
table = "users"
auto_resolve = "all"
relations = { posts = { target = "Post", kind = "one_to_many", inverse_column = "author_id" } }
"#;

pub fn schema() -> AppSchema {
    let user = model(
        "User",
        Blueprint::new()
            .field("id", Primitive::Number)
            .field("firstName", Primitive::String)
            .field("posts", array(reference("Post"))),
    );
    let photo = model(
        "Photo",
        Blueprint::new()
            .field("id", Primitive::Number)
            .field("url", Primitive::String)
            .field("filename", optional(Primitive::String)),
    );
    let keyword = input("PhotoKeyword", Blueprint::new().field("keyword", Primitive::String));
    let limit = input("AlbumLimit", Blueprint::new().field("limit", Primitive::Number));
    let by_id = input("PostId", Blueprint::new().field("id", Primitive::Number));

    let post = model(
        "Post",
        Blueprint::new()
            .field("id", Primitive::Number)
            .field("name", Primitive::String)
            .field("likes", Primitive::Number)
            .field("author", nullable(&user))
            .field("mainPhoto", args(nullable(&photo), keyword))
            .field("album", args(array(&photo), limit)),
    );

    AppSchema::builder()
        .query("post", args(nullable(&post), by_id))
        .query("latestPosts", array(&post))
        .build()
        .expect("the blog schema is valid")
}

pub fn config() -> Config {
    Config::from_toml(CONFIG).expect("the blog configuration is valid")
}

pub fn datastore() -> Arc<MemoryDatastore> {
    let datastore = MemoryDatastore::new()
        .with_rows(
            "users",
            [
                json!({ "id": 1, "firstName": "Ada" }),
                json!({ "id": 2, "firstName": "Grace" }),
            ],
        )
        .with_rows(
            "posts",
            [
                json!({ "id": 1, "title": "Hello", "likes": 3, "author_id": 1 }),
                json!({ "id": 2, "title": "Cycles", "likes": 7, "author_id": 2 }),
                json!({ "id": 3, "title": "Batches", "likes": 0, "author_id": 1 }),
            ],
        );
    Arc::new(datastore)
}

/// Photos derived from the post id, so that every alias can be told apart.
pub fn photos() -> ModelResolvers {
    ModelResolvers::new("Post")
        .field(
            "mainPhoto",
            resolver(|input: ResolverInput| async move {
                let keyword = input.args.as_ref().map_or(Value::Null, |args| args["keyword"].clone());
                Ok(json!({
                    "id": input.parent["id"],
                    "url": format!("https://photos.test/{}/{}", keyword.as_str().unwrap_or("any"), input.parent["id"]),
                }))
            }),
        )
        .field(
            "album",
            resolver(|input: ResolverInput| async move {
                let limit = input
                    .args
                    .as_ref()
                    .and_then(|args| args["limit"].as_u64())
                    .unwrap_or_default();
                let photos = (1..=limit)
                    .map(|index| {
                        json!({
                            "id": index,
                            "url": format!("https://photos.test/album/{index}"),
                            "filename": format!("photo-{index}.jpg"),
                        })
                    })
                    .collect();
                Ok(Value::Array(photos))
            }),
        )
}

/// Root queries reading the posts table directly, plus the photo resolvers.
pub fn engine(datastore: &Arc<MemoryDatastore>) -> EngineBuilder {
    posts(datastore).resolver(photos())
}

/// Root queries reading the posts table directly, without any model resolver.
pub fn posts(datastore: &Arc<MemoryDatastore>) -> EngineBuilder {
    let by_id = Arc::clone(datastore);
    let latest = Arc::clone(datastore);

    Engine::builder(schema())
        .config(config())
        .datastore(Arc::clone(datastore) as _)
        .resolver(ResolverRegistration::query(
            "post",
            resolver(move |input: ResolverInput| {
                let datastore = Arc::clone(&by_id);
                async move {
                    let id = input.args.as_ref().map_or(Value::Null, |args| args["id"].clone());
                    let row = datastore.rows("posts").into_iter().find(|row| row["id"] == id);
                    Ok(row.map_or(Value::Null, post_fields))
                }
            }),
        ))
        .resolver(ResolverRegistration::query(
            "latestPosts",
            resolver(move |_: ResolverInput| {
                let datastore = Arc::clone(&latest);
                async move {
                    let mut rows = datastore.rows("posts");
                    rows.reverse();
                    Ok(Value::Array(rows.into_iter().map(post_fields).collect()))
                }
            }),
        ))
}

/// Rows of the posts table store the name under `title`.
fn post_fields(mut row: Value) -> Value {
    if let Some(fields) = row.as_object_mut() {
        if let Some(title) = fields.remove("title") {
            fields.insert("name".to_owned(), title);
        }
    }
    row
}

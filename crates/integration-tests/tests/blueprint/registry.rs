use blueprint_engine::{TypeRegistry, TypeState};
use blueprint_schema::{Blueprint, Primitive};
use integration_tests::blog;

#[test]
fn every_named_type_is_built_once() {
    let engine = blog::engine(&blog::datastore()).build().unwrap();
    let registry = engine.registry();

    let names = registry.iter().map(|ty| ty.name.as_str()).collect::<Vec<_>>();
    assert_eq!(names, ["Query", "Post", "User", "Photo", "Mutation"]);
    assert_eq!(registry.build_count(), registry.len());

    for name in names {
        assert!(matches!(registry.state(name), TypeState::Cached(_)), "{name}");
    }
    assert_eq!(registry.state("Comment"), TypeState::Uncreated);
}

#[test]
fn taking_an_existing_type_returns_its_id() {
    let schema = blog::schema();
    let mut registry = TypeRegistry::build(&schema).unwrap();
    let built = registry.build_count();

    let post = schema.model("Post").unwrap();
    let id = registry.take_type(&schema, "Post", post.blueprint()).unwrap();
    // A different blueprint under a known name does not rebuild the type either.
    let again = registry
        .take_type(&schema, "Post", &Blueprint::new().field("id", Primitive::String))
        .unwrap();

    assert_eq!(Some(id), registry.get("Post"));
    assert_eq!(id, again);
    assert_eq!(registry.build_count(), built);
}

#[test]
fn cyclic_models_point_at_each_other() {
    let schema = blog::schema();
    let registry = TypeRegistry::build(&schema).unwrap();

    let post = registry.iter().find(|ty| ty.name == "Post").unwrap();
    let user = registry.iter().find(|ty| ty.name == "User").unwrap();

    assert_eq!(post.fields["author"].target, registry.get("User"));
    assert_eq!(user.fields["posts"].target, registry.get("Post"));
}

use blueprint_schema::{AppSchema, Blueprint, Node};
use serde_json::{Map, Value};

use super::ValidationError;

/// Checks the arguments of `field` against their declared input node: every required key
/// present, no undeclared key, scalars of the declared primitive.
///
/// Runs whether or not a [`Validator`](super::Validator) is configured. Missing arguments
/// are checked as an empty object when the node describes one.
pub fn check_input(schema: &AppSchema, field: &str, node: &Node, args: Option<&Value>) -> Result<(), ValidationError> {
    let empty = Value::Object(Map::new());
    let args = args.or_else(|| is_object(node).then_some(&empty));

    InputCheck {
        schema,
        field,
        path: Vec::new(),
    }
    .check(node, args)
}

fn is_object(node: &Node) -> bool {
    matches!(node, Node::Blueprint(_) | Node::Input(_) | Node::InputReference(_))
}

struct InputCheck<'a> {
    schema: &'a AppSchema,
    field: &'a str,
    path: Vec<String>,
}

impl InputCheck<'_> {
    fn check(&mut self, node: &Node, value: Option<&Value>) -> Result<(), ValidationError> {
        match (node, value) {
            (Node::Optional(_), None | Some(Value::Null)) | (Node::Nullable(_), Some(Value::Null)) => Ok(()),
            (Node::Optional(inner) | Node::Nullable(inner), value) => self.check(inner, value),
            (Node::Args(args), value) => self.check(&args.value, value),
            (_, None | Some(Value::Null)) => Err(self.error("required", "a value is required")),
            (Node::Primitive(primitive), Some(value)) if primitive.accepts(value) => Ok(()),
            (Node::Primitive(primitive), Some(value)) => {
                Err(self.error("type", format!("expected {primitive}, found {value}")))
            }
            (Node::Array(inner) | Node::InputArray(inner), Some(Value::Array(items))) => {
                for (index, item) in items.iter().enumerate() {
                    self.path.push(index.to_string());
                    self.check(inner, Some(item))?;
                    self.path.pop();
                }
                Ok(())
            }
            (Node::Array(_) | Node::InputArray(_), Some(value)) => {
                Err(self.error("type", format!("expected a list, found {value}")))
            }
            (Node::Blueprint(blueprint), Some(value)) => self.object(blueprint, value),
            (Node::Input(input), Some(value)) => self.object(input.blueprint(), value),
            (Node::InputReference(reference), Some(value)) => match self.schema.resolve_input(reference) {
                Ok(input) => self.object(input.blueprint(), value),
                // Unresolvable references are rejected when the schema is built.
                Err(_) => Ok(()),
            },
            // Output nodes never sit in an argument position.
            (Node::Model(_) | Node::ModelReference(_) | Node::Selection(_), Some(_)) => Ok(()),
        }
    }

    fn object(&mut self, blueprint: &Blueprint, value: &Value) -> Result<(), ValidationError> {
        let Value::Object(map) = value else {
            return Err(self.error("type", format!("expected an object, found {value}")));
        };

        if let Some(unknown) = map.keys().find(|key| !blueprint.contains(key)) {
            self.path.push(unknown.clone());
            return Err(self.error("unknown", "no such argument is declared"));
        }

        for (key, node) in blueprint.iter() {
            self.path.push(key.to_owned());
            self.check(node, map.get(key))?;
            self.path.pop();
        }

        Ok(())
    }

    fn error(&self, constraint: &str, message: impl Into<String>) -> ValidationError {
        let key = if self.path.is_empty() {
            self.field.to_owned()
        } else {
            self.path.join(".")
        };
        ValidationError::new(key, constraint, message)
    }
}

#[cfg(test)]
mod tests {
    use blueprint_schema::{input, input_array, input_reference, model, nullable, optional, Primitive};
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    fn schema() -> AppSchema {
        let filter = input(
            "PostFilter",
            Blueprint::new()
                .field("likes", optional(Primitive::Number))
                .field("tags", optional(input_array(Primitive::String).into_node())),
        );
        let post = model("Post", Blueprint::new().field("id", Primitive::Number));

        AppSchema::builder()
            .query("posts", blueprint_schema::args(post, filter))
            .build()
            .unwrap()
    }

    fn arguments() -> Node {
        Blueprint::new()
            .field("id", Primitive::Number)
            .field("cursor", nullable(Primitive::String))
            .field("filter", optional(input_reference("PostFilter")))
            .into()
    }

    #[rstest]
    #[case::complete(json!({ "id": 1, "cursor": null }))]
    #[case::nested(json!({ "id": 1, "cursor": "a", "filter": { "likes": 3, "tags": ["x"] } }))]
    #[case::null_optional(json!({ "id": 1, "cursor": null, "filter": null }))]
    fn accepts_declared_arguments(#[case] args: Value) {
        assert_eq!(check_input(&schema(), "posts", &arguments(), Some(&args)), Ok(()));
    }

    #[rstest]
    #[case::missing(json!({ "cursor": null }), "id", "required")]
    #[case::null(json!({ "id": null, "cursor": null }), "id", "required")]
    #[case::absent_nullable(json!({ "id": 1 }), "cursor", "required")]
    #[case::unknown(json!({ "id": 1, "cursor": null, "bogus": 1 }), "bogus", "unknown")]
    #[case::wrong_primitive(json!({ "id": "1", "cursor": null }), "id", "type")]
    #[case::nested_unknown(json!({ "id": 1, "cursor": null, "filter": { "title": "x" } }), "filter.title", "unknown")]
    #[case::list_element(json!({ "id": 1, "cursor": null, "filter": { "tags": ["x", 2] } }), "filter.tags.1", "type")]
    fn rejects_malformed_arguments(#[case] args: Value, #[case] key: &str, #[case] constraint: &str) {
        let error = check_input(&schema(), "posts", &arguments(), Some(&args)).unwrap_err();
        assert_eq!((error.key.as_str(), error.constraint.as_str()), (key, constraint));
    }

    #[test]
    fn missing_arguments_are_an_empty_object() {
        let error = check_input(&schema(), "posts", &arguments(), None).unwrap_err();
        insta::assert_snapshot!(error, @"`id` does not satisfy required: a value is required");

        let all_optional = Node::from(Blueprint::new().field("take", optional(Primitive::Number)));
        assert_eq!(check_input(&schema(), "posts", &all_optional, None), Ok(()));
    }

    #[test]
    fn scalar_arguments_are_keyed_by_field() {
        let error = check_input(&schema(), "post", &Node::Primitive(Primitive::Number), Some(&json!({ "id": 1 })))
            .unwrap_err();
        insta::assert_snapshot!(error, @r#"`post` does not satisfy type: expected Number, found {"id":1}"#);
    }
}

use serde_json::{Map, Value};

use crate::{
    ArgsNode, AppSchema, Blueprint, Input, InputNode, InputReference, Model, ModelReference, Node, NodeKind,
    OperationKind, Primitive, SchemaError, SelectSet, SelectionNode,
};

/// Tagged descriptor keys, checked in this order before the plain-object fallback.
const TAGS: &[(&str, NodeKind)] = &[
    ("$optional", NodeKind::Optional),
    ("$nullable", NodeKind::Nullable),
    ("$array", NodeKind::Array),
    ("$inputArray", NodeKind::InputArray),
    ("$args", NodeKind::Args),
    ("$model", NodeKind::Model),
    ("$ref", NodeKind::ModelReference),
    ("$input", NodeKind::Input),
    ("$inputRef", NodeKind::InputReference),
    ("$selection", NodeKind::Selection),
];

/// Classifies a JSON schema descriptor.
///
/// A string is a primitive. An object carrying one of the `$` tags is the tagged kind,
/// any other object is a plain blueprint.
pub fn classify_descriptor(descriptor: &Value) -> Result<NodeKind, SchemaError> {
    classify(descriptor, "")
}

fn classify(descriptor: &Value, path: &str) -> Result<NodeKind, SchemaError> {
    match descriptor {
        Value::String(name) => match name.parse::<Primitive>() {
            Ok(_) => Ok(NodeKind::Primitive),
            Err(_) => Err(invalid(path, format!("unknown primitive `{name}`"))),
        },
        Value::Object(object) => {
            let mut tags = object.keys().filter(|key| key.starts_with('$'));

            let Some(tag) = tags.next() else {
                return Ok(NodeKind::Blueprint);
            };
            if let Some(other) = tags.next() {
                return Err(invalid(path, format!("both `{tag}` and `{other}` are set")));
            }

            TAGS.iter()
                .find(|(name, _)| *name == tag.as_str())
                .map(|(_, kind)| *kind)
                .ok_or_else(|| invalid(path, format!("unknown tag `{tag}`")))
        }
        other => Err(invalid(path, format!("expected a string or an object, found `{other}`"))),
    }
}

impl Node {
    /// Builds a node from its JSON descriptor.
    pub fn from_descriptor(descriptor: &Value) -> Result<Node, SchemaError> {
        node(descriptor, "")
    }
}

impl AppSchema {
    /// Builds a whole application schema from
    /// `{ "queries": {..}, "mutations": {..}, "models": [..], "inputs": [..] }`.
    ///
    /// `models` and `inputs` hold model and input descriptors that are only reached
    /// through references.
    pub fn from_descriptor(descriptor: &Value) -> Result<AppSchema, SchemaError> {
        let object = descriptor
            .as_object()
            .ok_or_else(|| invalid("", "an application schema must be an object"))?;

        if let Some(key) = object
            .keys()
            .find(|key| !matches!(key.as_str(), "queries" | "mutations" | "models" | "inputs"))
        {
            return Err(invalid(key, "unexpected key"));
        }

        let mut builder = AppSchema::builder();

        for (kind, key) in [(OperationKind::Query, "queries"), (OperationKind::Mutation, "mutations")] {
            if let Some(fields) = object.get(key) {
                let fields = fields
                    .as_object()
                    .ok_or_else(|| invalid(key, "expected an object of root fields"))?;
                for (name, field) in fields {
                    let field = node(field, &join(key, name))?;
                    builder.root_mut(kind).insert(name.clone(), field);
                }
            }
        }

        for (index, model) in list(object, "models")?.iter().enumerate() {
            match node(model, &join("models", &index.to_string()))? {
                Node::Model(model) => builder = builder.model(model),
                other => return Err(invalid("models", format!("expected a model, found a {} node", other.kind()))),
            }
        }
        for (index, input) in list(object, "inputs")?.iter().enumerate() {
            match node(input, &join("inputs", &index.to_string()))? {
                Node::Input(input) => builder = builder.input(input),
                other => return Err(invalid("inputs", format!("expected an input, found a {} node", other.kind()))),
            }
        }

        builder.build()
    }
}

fn node(descriptor: &Value, path: &str) -> Result<Node, SchemaError> {
    let kind = classify(descriptor, path)?;

    let node = match (kind, descriptor) {
        (NodeKind::Primitive, Value::String(name)) => {
            let primitive = name
                .parse::<Primitive>()
                .map_err(|_| invalid(path, format!("unknown primitive `{name}`")))?;
            Node::Primitive(primitive)
        }
        (NodeKind::Blueprint, Value::Object(object)) => Node::Blueprint(blueprint(object, path)?),
        (NodeKind::Optional, Value::Object(object)) => {
            Node::Optional(Box::new(node(tagged(object, "$optional"), &join(path, "$optional"))?))
        }
        (NodeKind::Nullable, Value::Object(object)) => {
            Node::Nullable(Box::new(node(tagged(object, "$nullable"), &join(path, "$nullable"))?))
        }
        (NodeKind::Array, Value::Object(object)) => {
            Node::Array(Box::new(node(tagged(object, "$array"), &join(path, "$array"))?))
        }
        (NodeKind::InputArray, Value::Object(object)) => {
            let path = join(path, "$inputArray");
            let inner = input_node(tagged(object, "$inputArray"), &path)?;
            Node::InputArray(Box::new(inner.into_node()))
        }
        (NodeKind::Args, Value::Object(object)) => {
            let path = join(path, "$args");
            let args = tagged(object, "$args")
                .as_object()
                .ok_or_else(|| invalid(&path, "expected `{ value, args }`"))?;
            let value = args.get("value").ok_or_else(|| invalid(&path, "missing `value`"))?;
            let accepted = args.get("args").ok_or_else(|| invalid(&path, "missing `args`"))?;

            Node::Args(Box::new(ArgsNode {
                value: node(value, &join(&path, "value"))?,
                args: input_node(accepted, &join(&path, "args"))?,
            }))
        }
        (NodeKind::Model, Value::Object(object)) => {
            let name = tag_name(object, "$model", path)?;
            let mut model = Model::new(name, fields(object, path)?);
            if let Some(description) = object.get("description").and_then(Value::as_str) {
                model = model.with_description(description);
            }
            Node::Model(model.into())
        }
        (NodeKind::ModelReference, Value::Object(object)) => {
            Node::ModelReference(ModelReference::new(tag_name(object, "$ref", path)?))
        }
        (NodeKind::Input, Value::Object(object)) => {
            let name = tag_name(object, "$input", path)?;
            let mut input = Input::new(name, fields(object, path)?);
            if let Some(description) = object.get("description").and_then(Value::as_str) {
                input = input.with_description(description);
            }
            Node::Input(input.into())
        }
        (NodeKind::InputReference, Value::Object(object)) => {
            Node::InputReference(InputReference::new(tag_name(object, "$inputRef", path)?))
        }
        (NodeKind::Selection, Value::Object(object)) => {
            let path = join(path, "$selection");
            let selection = tagged(object, "$selection")
                .as_object()
                .ok_or_else(|| invalid(&path, "expected `{ model, select }`"))?;
            let model = selection.get("model").ok_or_else(|| invalid(&path, "missing `model`"))?;
            let select = selection.get("select").ok_or_else(|| invalid(&path, "missing `select`"))?;
            let select: SelectSet =
                serde_json::from_value(select.clone()).map_err(|err| invalid(&join(&path, "select"), err.to_string()))?;

            Node::Selection(Box::new(SelectionNode {
                model: node(model, &join(&path, "model"))?,
                select,
            }))
        }
        (kind, _) => return Err(invalid(path, format!("malformed {kind} descriptor"))),
    };

    Ok(node)
}

fn input_node(descriptor: &Value, path: &str) -> Result<InputNode, SchemaError> {
    InputNode::try_from(node(descriptor, path)?)
}

fn blueprint(object: &Map<String, Value>, path: &str) -> Result<Blueprint, SchemaError> {
    let mut blueprint = Blueprint::new();
    for (name, field) in object {
        blueprint.insert(name.clone(), node(field, &join(path, name))?);
    }
    Ok(blueprint)
}

fn fields(object: &Map<String, Value>, path: &str) -> Result<Blueprint, SchemaError> {
    match object.get("fields") {
        Some(Value::Object(fields)) => blueprint(fields, &join(path, "fields")),
        Some(_) => Err(invalid(path, "`fields` must be an object")),
        None => Ok(Blueprint::new()),
    }
}

fn tagged<'a>(object: &'a Map<String, Value>, tag: &str) -> &'a Value {
    object.get(tag).unwrap_or(&Value::Null)
}

fn tag_name<'a>(object: &'a Map<String, Value>, tag: &str, path: &str) -> Result<&'a str, SchemaError> {
    tagged(object, tag)
        .as_str()
        .ok_or_else(|| invalid(path, format!("`{tag}` must be a name")))
}

fn list<'a>(object: &'a Map<String, Value>, key: &str) -> Result<&'a [Value], SchemaError> {
    match object.get(key) {
        Some(Value::Array(items)) => Ok(items.as_slice()),
        Some(_) => Err(invalid(key, "expected a list")),
        None => Ok(&[][..]),
    }
}

fn join(path: &str, segment: &str) -> String {
    if path.is_empty() {
        segment.to_owned()
    } else {
        format!("{path}.{segment}")
    }
}

fn invalid(path: &str, message: impl Into<String>) -> SchemaError {
    SchemaError::InvalidDescriptor {
        path: path.to_owned(),
        message: message.into(),
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    #[rstest]
    #[case(json!("String"), NodeKind::Primitive)]
    #[case(json!({ "id": "Number" }), NodeKind::Blueprint)]
    #[case(json!({}), NodeKind::Blueprint)]
    #[case(json!({ "$optional": "String" }), NodeKind::Optional)]
    #[case(json!({ "$nullable": "String" }), NodeKind::Nullable)]
    #[case(json!({ "$array": "String" }), NodeKind::Array)]
    #[case(json!({ "$inputArray": "String" }), NodeKind::InputArray)]
    #[case(json!({ "$args": { "value": "String", "args": "Number" } }), NodeKind::Args)]
    #[case(json!({ "$model": "Post", "fields": { "id": "Number" } }), NodeKind::Model)]
    #[case(json!({ "$ref": "Post" }), NodeKind::ModelReference)]
    #[case(json!({ "$input": "PostWhere", "fields": {} }), NodeKind::Input)]
    #[case(json!({ "$inputRef": "PostWhere" }), NodeKind::InputReference)]
    #[case(json!({ "$selection": { "model": { "$ref": "Post" }, "select": { "id": true } } }), NodeKind::Selection)]
    fn classifies_descriptors(#[case] descriptor: Value, #[case] expected: NodeKind) {
        assert_eq!(classify_descriptor(&descriptor), Ok(expected));
        assert_eq!(Node::from_descriptor(&descriptor).map(|node| node.kind()), Ok(expected));
    }

    #[test]
    fn tags_win_over_the_blueprint_fallback() {
        // `fields` would make a fine blueprint field, the tag decides.
        let descriptor = json!({ "$model": "Post", "fields": { "fields": "String" } });
        let Node::Model(model) = Node::from_descriptor(&descriptor).unwrap() else {
            unreachable!()
        };
        assert_eq!(model.blueprint().names().collect::<Vec<_>>(), ["fields"]);
    }

    #[test]
    fn rejects_unknown_and_ambiguous_tags() {
        let unknown = classify_descriptor(&json!({ "$maybe": "String" })).unwrap_err();
        insta::assert_snapshot!(unknown, @"invalid schema descriptor at ``: unknown tag `$maybe`");

        let ambiguous = classify_descriptor(&json!({ "$optional": "String", "$nullable": "String" })).unwrap_err();
        insta::assert_snapshot!(ambiguous, @"invalid schema descriptor at ``: both `$optional` and `$nullable` are set");
    }

    #[test]
    fn reports_the_path_of_nested_errors() {
        let error = Node::from_descriptor(&json!({ "author": { "$nullable": { "name": "Text" } } })).unwrap_err();
        insta::assert_snapshot!(error, @"invalid schema descriptor at `author.$nullable.name`: unknown primitive `Text`");
    }

    #[test]
    fn args_must_be_input_nodes() {
        let error = Node::from_descriptor(&json!({
            "$args": { "value": "String", "args": { "$ref": "Post" } }
        }))
        .unwrap_err();
        assert_eq!(error, SchemaError::OutputNodeInInputPosition(NodeKind::ModelReference));
    }

    #[test]
    fn builds_an_application_schema() {
        let schema = AppSchema::from_descriptor(&json!({
            "queries": {
                "post": {
                    "$args": {
                        "value": { "$nullable": { "$ref": "Post" } },
                        "args": { "id": "Number" }
                    }
                }
            },
            "mutations": {
                "like": { "$args": { "value": "Number", "args": { "id": "Number" } } }
            },
            "models": [
                {
                    "$model": "Post",
                    "description": "A blog post",
                    "fields": { "id": "Number", "likes": "Number", "author": { "$ref": "User" } }
                },
                { "$model": "User", "fields": { "id": "Number", "posts": { "$array": { "$ref": "Post" } } } }
            ]
        }))
        .unwrap();

        assert_eq!(schema.queries().names().collect::<Vec<_>>(), ["post"]);
        assert_eq!(schema.mutations().names().collect::<Vec<_>>(), ["like"]);
        assert_eq!(schema.model("Post").and_then(|post| post.description()), Some("A blog post"));
        assert!(schema.model("User").is_some());
    }
}

use itertools::Itertools;
use serde_json::{Map, Value};

/// Serializes field arguments into the textual form of a query document:
/// `a: 1, b: "x", c: { d: 2 }`.
///
/// Keys keep their insertion order. Strings are quoted the JSON way, objects and lists are
/// serialized recursively, any other value is written as is.
pub fn transform_args(args: &Map<String, Value>) -> String {
    args.iter()
        .map(|(key, value)| format!("{key}: {}", transform_value(value)))
        .join(", ")
}

fn transform_value(value: &Value) -> String {
    match value {
        Value::Object(object) if object.is_empty() => "{}".to_owned(),
        Value::Object(object) => format!("{{ {} }}", transform_args(object)),
        Value::Array(items) => format!("[{}]", items.iter().map(transform_value).join(", ")),
        // JSON already quotes strings and writes the literal form of everything else.
        Value::String(_) | Value::Null | Value::Bool(_) | Value::Number(_) => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn args(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(object) => object,
            _ => unreachable!(),
        }
    }

    #[test]
    fn scalars_and_nested_objects() {
        let rendered = transform_args(&args(json!({ "a": 1, "b": "x", "c": { "d": 2 } })));
        assert_eq!(rendered, r#"a: 1, b: "x", c: { d: 2 }"#);
    }

    #[test]
    fn lists_are_bracketed() {
        let rendered = transform_args(&args(json!({
            "ids": [1, 2, 3],
            "where": { "tags": ["a", "b\"c"], "published": true, "deletedAt": null },
            "empty": {}
        })));
        insta::assert_snapshot!(
            rendered,
            @r#"ids: [1, 2, 3], where: { tags: ["a", "b\"c"], published: true, deletedAt: null }, empty: {}"#
        );
    }

    #[test]
    fn no_arguments() {
        assert_eq!(transform_args(&Map::new()), "");
    }
}

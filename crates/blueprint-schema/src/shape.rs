use std::fmt;

use indexmap::IndexMap;
use serde_json::Value;

use crate::Primitive;

/// Shape of the data a schema node produces for a given selection.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Shape {
    Scalar(Primitive),
    /// May be absent (or null on the wire).
    Optional(Box<Shape>),
    Nullable(Box<Shape>),
    List(Box<Shape>),
    Object(ShapeObject),
    /// A model inferred without selection, see [`InferredShape::named`].
    Named(String),
}

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct ShapeObject {
    pub fields: IndexMap<String, Shape>,
}

/// Result of an inference: the root shape and every named model shape it points to.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct InferredShape {
    pub root: Shape,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub named: IndexMap<String, ShapeObject>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("expected {expected} at `{path}`, found {found}")]
pub struct ShapeMismatch {
    pub path: String,
    pub expected: String,
    pub found: String,
}

impl Shape {
    /// Whether the key holding this shape may be missing from its parent object.
    pub fn is_optional(&self) -> bool {
        matches!(self, Shape::Optional(_))
    }

    /// Marks the shape as possibly missing, once.
    pub fn into_optional(self) -> Self {
        match self {
            Shape::Optional(_) => self,
            shape => Shape::Optional(Box::new(shape)),
        }
    }
}

impl InferredShape {
    /// Checks that `value` has exactly this shape: no extra keys, every required key
    /// present, scalars of the declared primitive.
    pub fn check(&self, value: &Value) -> Result<(), ShapeMismatch> {
        let mut path = Vec::new();
        self.check_shape(&self.root, Some(value), &mut path)
    }

    fn check_shape(&self, shape: &Shape, value: Option<&Value>, path: &mut Vec<String>) -> Result<(), ShapeMismatch> {
        match (shape, value) {
            (Shape::Optional(_), None | Some(Value::Null)) => Ok(()),
            (Shape::Optional(inner), value) => self.check_shape(inner, value, path),
            (_, None) => Err(mismatch(path, shape, "nothing")),
            (Shape::Nullable(_), Some(Value::Null)) => Ok(()),
            (Shape::Nullable(inner), value) => self.check_shape(inner, value, path),
            (Shape::Scalar(primitive), Some(value)) if primitive.accepts(value) => Ok(()),
            (Shape::List(inner), Some(Value::Array(items))) => {
                for (index, item) in items.iter().enumerate() {
                    path.push(index.to_string());
                    self.check_shape(inner, Some(item), path)?;
                    path.pop();
                }
                Ok(())
            }
            (Shape::Object(object), Some(Value::Object(map))) => self.check_object(object, map, path),
            (Shape::Named(name), Some(Value::Object(map))) => match self.named.get(name) {
                Some(object) => self.check_object(object, map, path),
                None => Err(mismatch(path, shape, "an unknown model")),
            },
            (_, Some(value)) => Err(mismatch(path, shape, describe(value))),
        }
    }

    fn check_object(
        &self,
        object: &ShapeObject,
        map: &serde_json::Map<String, Value>,
        path: &mut Vec<String>,
    ) -> Result<(), ShapeMismatch> {
        if let Some(extra) = map.keys().find(|key| !object.fields.contains_key(key.as_str())) {
            path.push(extra.clone());
            let error = ShapeMismatch {
                path: path.join("."),
                expected: "no value".to_owned(),
                found: "an unselected key".to_owned(),
            };
            return Err(error);
        }

        for (key, shape) in &object.fields {
            path.push(key.clone());
            self.check_shape(shape, map.get(key), path)?;
            path.pop();
        }

        Ok(())
    }
}

fn mismatch(path: &[String], shape: &Shape, found: &str) -> ShapeMismatch {
    ShapeMismatch {
        path: path.join("."),
        expected: shape.to_string(),
        found: found.to_owned(),
    }
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shape::Scalar(primitive) => write!(f, "{primitive}"),
            Shape::Optional(inner) => write!(f, "{inner}?"),
            Shape::Nullable(inner) => write!(f, "{inner} | null"),
            Shape::List(inner) => write!(f, "[{inner}]"),
            Shape::Named(name) => f.write_str(name),
            Shape::Object(object) => {
                f.write_str("{ ")?;
                for (key, shape) in &object.fields {
                    write!(f, "{key}: {shape} ")?;
                }
                f.write_str("}")
            }
        }
    }
}

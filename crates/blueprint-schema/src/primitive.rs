use serde_json::Value;

/// Leaf types of a schema.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    serde::Serialize,
    serde::Deserialize,
    strum::Display,
    strum::AsRefStr,
    strum::EnumString,
    strum::EnumIter,
)]
pub enum Primitive {
    String,
    Number,
    Float,
    Boolean,
}

impl Primitive {
    /// Whether a non-null dynamic value is an instance of this primitive.
    pub fn accepts(self, value: &Value) -> bool {
        match self {
            Primitive::String => value.is_string(),
            Primitive::Number | Primitive::Float => value.is_number(),
            Primitive::Boolean => value.is_boolean(),
        }
    }
}

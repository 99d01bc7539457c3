use serde_json::Value;

use crate::EngineError;

/// Result of a textual operation, GraphQL style.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct Response {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ResponseError>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ResponseError {
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub path: Vec<String>,
}

impl Response {
    pub(crate) fn error(error: &EngineError) -> Self {
        Response {
            data: None,
            errors: vec![ResponseError {
                message: error.to_string(),
                path: Vec::new(),
            }],
        }
    }

    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn into_json(self) -> Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

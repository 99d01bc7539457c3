use blueprint_schema::OperationKind;
use serde_json::Value;

use crate::EngineError;

/// Notified once per resolved field. Root fields go to the root hooks, model fields to the
/// field hooks. Every method defaults to doing nothing.
pub trait Hooks: Send + Sync {
    fn on_root_success(&self, _kind: OperationKind, _field: &str, _value: &Value) {}

    fn on_root_error(&self, _kind: OperationKind, _field: &str, _error: &EngineError) {}

    fn on_field_success(&self, _type_name: &str, _field: &str, _value: &Value) {}

    fn on_field_error(&self, _type_name: &str, _field: &str, _error: &EngineError) {}
}

pub struct NoopHooks;

impl Hooks for NoopHooks {}

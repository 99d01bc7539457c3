//! Argument and result validation.
//!
//! Rules are registered per type name: object validators see the whole object, field rules
//! see one field. A field rule is either a list of [`Constraint`]s handed to the configured
//! [`Validator`] or a function that may replace the value. Arguments are also checked
//! structurally against their declared input node, see [`check_input`].

mod constraint;
mod input;

use std::{collections::HashMap, future::Future, sync::Arc};

use async_recursion::async_recursion;
use blueprint_schema::{AppSchema, Blueprint, Node};
use futures_util::{future::BoxFuture, FutureExt};
use serde_json::Value;

pub use constraint::{Constraint, ConstraintValidator, LengthConstraint, RangeConstraint};
pub use input::check_input;

use crate::{registry::anonymous_name, RequestContext};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("`{key}` does not satisfy {constraint}: {message}")]
pub struct ValidationError {
    pub key: String,
    pub constraint: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(key: impl Into<String>, constraint: impl Into<String>, message: impl Into<String>) -> Self {
        ValidationError {
            key: key.into(),
            constraint: constraint.into(),
            message: message.into(),
        }
    }
}

/// Low-level check of one value against the constraints registered for its field.
#[async_trait::async_trait]
pub trait Validator: Send + Sync {
    async fn validate(&self, key: &str, value: &Value, constraints: &[Constraint]) -> Result<(), ValidationError>;
}

/// What a field validator function receives.
pub struct FieldValidation {
    pub value: Value,
    /// The object holding the field.
    pub parent: Value,
    pub context: Arc<RequestContext>,
}

pub type ObjectValidatorFn =
    Arc<dyn Fn(Value, Arc<RequestContext>) -> BoxFuture<'static, Result<(), ValidationError>> + Send + Sync>;

/// Returning `Some` replaces the value of the field.
pub type FieldValidatorFn =
    Arc<dyn Fn(FieldValidation) -> BoxFuture<'static, Result<Option<Value>, ValidationError>> + Send + Sync>;

pub fn object_validator<F, Fut>(f: F) -> ObjectValidatorFn
where
    F: Fn(Value, Arc<RequestContext>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), ValidationError>> + Send + 'static,
{
    Arc::new(move |value: Value, context: Arc<RequestContext>| f(value, context).boxed())
}

pub fn field_validator<F, Fut>(f: F) -> FieldValidatorFn
where
    F: Fn(FieldValidation) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Option<Value>, ValidationError>> + Send + 'static,
{
    Arc::new(move |input: FieldValidation| f(input).boxed())
}

#[derive(Clone)]
pub enum FieldRule {
    Constraints(Vec<Constraint>),
    Function(FieldValidatorFn),
}

/// Every validation rule of an engine.
#[derive(Clone, Default)]
pub struct Validation {
    validator: Option<Arc<dyn Validator>>,
    objects: HashMap<String, Vec<ObjectValidatorFn>>,
    fields: HashMap<(String, String), FieldRule>,
}

impl Validation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_validator(&mut self, validator: Arc<dyn Validator>) {
        self.validator = Some(validator);
    }

    pub fn has_validator(&self) -> bool {
        self.validator.is_some()
    }

    pub fn has_rules(&self) -> bool {
        !self.objects.is_empty() || !self.fields.is_empty()
    }

    pub fn add_object(&mut self, type_name: impl Into<String>, validator: ObjectValidatorFn) {
        self.objects.entry(type_name.into()).or_default().push(validator);
    }

    /// Replaces any rule previously set on the field.
    pub fn set_field(&mut self, type_name: impl Into<String>, field: impl Into<String>, rule: FieldRule) {
        self.fields.insert((type_name.into(), field.into()), rule);
    }

    /// Validates `value` against `node` and returns it, with the replacements made by
    /// field functions. `scope` names the type of an anonymous blueprint at the top.
    pub async fn validate(
        &self,
        schema: &AppSchema,
        node: &Node,
        value: Value,
        scope: &str,
        context: &Arc<RequestContext>,
    ) -> Result<Value, ValidationError> {
        if self.validator.is_none() {
            return Ok(value);
        }
        self.walk(schema, node, value, scope, context).await
    }

    #[async_recursion]
    async fn walk(
        &self,
        schema: &AppSchema,
        node: &Node,
        value: Value,
        scope: &str,
        context: &Arc<RequestContext>,
    ) -> Result<Value, ValidationError> {
        if value.is_null() {
            return Ok(value);
        }

        match node {
            Node::Primitive(_) => Ok(value),
            Node::Optional(inner) | Node::Nullable(inner) => self.walk(schema, inner, value, scope, context).await,
            Node::Args(args) => self.walk(schema, &args.value, value, scope, context).await,
            Node::Selection(selection) => self.walk(schema, &selection.model, value, scope, context).await,
            Node::Array(inner) | Node::InputArray(inner) => match value {
                Value::Array(items) => {
                    let mut validated = Vec::with_capacity(items.len());
                    for item in items {
                        validated.push(self.walk(schema, inner, item, scope, context).await?);
                    }
                    Ok(Value::Array(validated))
                }
                other => Ok(other),
            },
            Node::Blueprint(blueprint) => self.object(schema, scope, blueprint, value, context).await,
            Node::Model(model) => self.object(schema, model.name(), model.blueprint(), value, context).await,
            Node::Input(input) => self.object(schema, input.name(), input.blueprint(), value, context).await,
            Node::ModelReference(reference) => match schema.resolve_model(reference) {
                Ok(model) => self.object(schema, model.name(), model.blueprint(), value, context).await,
                // Unresolvable references are rejected when the schema is built.
                Err(_) => Ok(value),
            },
            Node::InputReference(reference) => match schema.resolve_input(reference) {
                Ok(input) => self.object(schema, input.name(), input.blueprint(), value, context).await,
                Err(_) => Ok(value),
            },
        }
    }

    async fn object(
        &self,
        schema: &AppSchema,
        type_name: &str,
        blueprint: &Blueprint,
        value: Value,
        context: &Arc<RequestContext>,
    ) -> Result<Value, ValidationError> {
        let Value::Object(mut map) = value else {
            return Ok(value);
        };

        for validator in self.objects.get(type_name).into_iter().flatten() {
            validator(Value::Object(map.clone()), context.clone()).await?;
        }

        for (key, node) in blueprint.iter() {
            let Some(mut current) = map.get(key).filter(|value| !value.is_null()).cloned() else {
                continue;
            };

            match self.fields.get(&(type_name.to_owned(), key.to_owned())) {
                Some(FieldRule::Constraints(constraints)) => {
                    if let Some(validator) = &self.validator {
                        validator.validate(key, &current, constraints).await?;
                    }
                }
                Some(FieldRule::Function(function)) => {
                    let replaced = function(FieldValidation {
                        value: current.clone(),
                        parent: Value::Object(map.clone()),
                        context: context.clone(),
                    })
                    .await?;
                    if let Some(replaced) = replaced {
                        current = replaced;
                    }
                }
                None => {}
            }

            let current = self
                .walk(schema, node, current, &anonymous_name(type_name, key), context)
                .await?;
            if let Some(slot) = map.get_mut(key) {
                *slot = current;
            }
        }

        Ok(Value::Object(map))
    }
}

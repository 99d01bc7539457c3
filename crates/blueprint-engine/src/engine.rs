use std::sync::Arc;

use blueprint_config::Config;
use blueprint_schema::{AppSchema, OperationKind, SchemaError, Selection};
use futures_util::future::join_all;
use indexmap::IndexMap;
use serde_json::{Map, Value};
use tracing::Instrument;

use crate::{
    context::ContextResolverFn,
    crud, document,
    execute::Executor,
    resolver::Resolvers,
    validation::{Constraint, FieldRule, FieldValidatorFn, ObjectValidatorFn, Validation},
    ConstraintValidator, Datastore, EngineError, EntityBinding, Hooks, InboundRequest, NoopHooks, RequestContext,
    ResolverRegistration, Response, ResponseError, TypeRegistry, Validator,
};

pub(crate) struct EngineInner {
    pub(crate) schema: AppSchema,
    pub(crate) config: Config,
    pub(crate) registry: TypeRegistry,
    pub(crate) resolvers: Resolvers,
    pub(crate) bindings: IndexMap<String, Arc<EntityBinding>>,
    pub(crate) datastore: Option<Arc<dyn Datastore>>,
    pub(crate) validation: Validation,
    pub(crate) hooks: Arc<dyn Hooks>,
    pub(crate) context_resolvers: IndexMap<String, ContextResolverFn>,
}

/// A built application, cheap to clone.
#[derive(Clone)]
pub struct Engine(Arc<EngineInner>);

pub struct EngineBuilder {
    schema: AppSchema,
    config: Config,
    registrations: Vec<ResolverRegistration>,
    datastore: Option<Arc<dyn Datastore>>,
    validation: Validation,
    hooks: Option<Arc<dyn Hooks>>,
    context_resolvers: IndexMap<String, ContextResolverFn>,
}

impl EngineBuilder {
    #[must_use]
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn resolver(mut self, registration: impl Into<ResolverRegistration>) -> Self {
        self.registrations.push(registration.into());
        self
    }

    #[must_use]
    pub fn datastore(mut self, datastore: Arc<dyn Datastore>) -> Self {
        self.datastore = Some(datastore);
        self
    }

    /// Checks the constraint lists registered with [`Self::field_constraints`]. Defaults
    /// to a [`ConstraintValidator`] as soon as any rule is registered.
    #[must_use]
    pub fn validator(mut self, validator: Arc<dyn Validator>) -> Self {
        self.validation.set_validator(validator);
        self
    }

    #[must_use]
    pub fn object_validator(mut self, type_name: impl Into<String>, validator: ObjectValidatorFn) -> Self {
        self.validation.add_object(type_name, validator);
        self
    }

    #[must_use]
    pub fn field_constraints(
        mut self,
        type_name: impl Into<String>,
        field: impl Into<String>,
        constraints: Vec<Constraint>,
    ) -> Self {
        self.validation
            .set_field(type_name, field, FieldRule::Constraints(constraints));
        self
    }

    #[must_use]
    pub fn field_validator(
        mut self,
        type_name: impl Into<String>,
        field: impl Into<String>,
        validator: FieldValidatorFn,
    ) -> Self {
        self.validation.set_field(type_name, field, FieldRule::Function(validator));
        self
    }

    #[must_use]
    pub fn hooks(mut self, hooks: Arc<dyn Hooks>) -> Self {
        self.hooks = Some(hooks);
        self
    }

    /// Adds `key` to the context of every operation, computed from the inbound request.
    #[must_use]
    pub fn context_resolver(mut self, key: impl Into<String>, resolver: ContextResolverFn) -> Self {
        self.context_resolvers.insert(key.into(), resolver);
        self
    }

    pub fn build(self) -> Result<Engine, EngineError> {
        let EngineBuilder {
            schema,
            config,
            registrations,
            datastore,
            mut validation,
            hooks,
            context_resolvers,
        } = self;

        let mut resolvers = Resolvers::default();
        for registration in registrations {
            resolvers.register(registration)?;
        }

        let mut bindings = IndexMap::with_capacity(config.entities.len());
        for (model, entity) in &config.entities {
            if schema.model(model).is_none() {
                return Err(EngineError::Configuration(format!(
                    "entity `{model}` does not name a registered model"
                )));
            }
            bindings.insert(model.clone(), Arc::new(EntityBinding::new(model.clone(), entity.clone())));
        }
        if let (Some(model), None) = (bindings.keys().next(), &datastore) {
            return Err(EngineError::MissingDatastore(model.clone()));
        }

        let schema = if config.engine.generate_crud {
            crud::generate(schema, &config.naming, &bindings, datastore.as_ref(), &mut resolvers)?
        } else {
            schema
        };

        let registry = TypeRegistry::build(&schema)?;

        for (kind, name) in resolvers.roots() {
            schema.root_field(kind, name)?;
        }
        for model in resolvers.models() {
            let ty = registry
                .get(&model.model)
                .map(|id| &registry[id])
                .ok_or_else(|| SchemaError::UnresolvedModel(model.model.clone()))?;
            for field in model.fields.keys().chain(model.loaders.keys()) {
                if !ty.fields.contains_key(field) {
                    return Err(SchemaError::UnknownField {
                        type_name: model.model.clone(),
                        field: field.clone(),
                    }
                    .into());
                }
            }
        }

        if validation.has_rules() && !validation.has_validator() {
            validation.set_validator(Arc::new(ConstraintValidator::new()));
        }

        tracing::debug!(
            types = registry.len(),
            entities = bindings.len(),
            context = context_resolvers.len(),
            "engine built"
        );

        Ok(Engine(Arc::new(EngineInner {
            schema,
            config,
            registry,
            resolvers,
            bindings,
            datastore,
            validation,
            hooks: hooks.unwrap_or_else(|| Arc::new(NoopHooks)),
            context_resolvers,
        })))
    }
}

impl Engine {
    pub fn builder(schema: AppSchema) -> EngineBuilder {
        EngineBuilder {
            schema,
            config: Config::default(),
            registrations: Vec::new(),
            datastore: None,
            validation: Validation::default(),
            hooks: None,
            context_resolvers: IndexMap::new(),
        }
    }

    /// The schema executed, generated fields included.
    pub fn schema(&self) -> &AppSchema {
        &self.0.schema
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.0.registry
    }

    pub fn config(&self) -> &Config {
        &self.0.config
    }

    pub fn binding(&self, model: &str) -> Option<&Arc<EntityBinding>> {
        self.0.bindings.get(model)
    }

    /// Resolves root field `name` for `selection`.
    pub async fn execute(
        &self,
        kind: OperationKind,
        name: &str,
        selection: &Selection,
        request: &InboundRequest,
    ) -> Result<Value, EngineError> {
        let span = tracing::info_span!("operation", %kind, name);
        async move {
            let context = self.context(request).await?;
            Executor::new(&self.0, context).root(kind, name, selection).await
        }
        .instrument(span)
        .await
    }

    /// Executes a textual query or mutation. Each root field fails on its own: its key is
    /// set to null and the error is reported with the key as path.
    pub async fn execute_document(
        &self,
        document: &str,
        variables: Option<Map<String, Value>>,
        request: &InboundRequest,
    ) -> Response {
        let variables = variables.unwrap_or_default();
        let operation = match document::parse(document, &variables) {
            Ok(operation) => operation,
            Err(error) => return Response::error(&error),
        };

        let span = tracing::info_span!("operation", kind = %operation.kind, fields = operation.fields.len());
        async move {
            let context = match self.context(request).await {
                Ok(context) => context,
                Err(error) => return Response::error(&error),
            };
            let executor = Executor::new(&self.0, context);

            let results = match operation.kind {
                OperationKind::Query => {
                    join_all(
                        operation
                            .fields
                            .iter()
                            .map(|field| executor.root(operation.kind, &field.name, &field.selection)),
                    )
                    .await
                }
                // Mutations run one after the other, in document order.
                OperationKind::Mutation => {
                    let mut results = Vec::with_capacity(operation.fields.len());
                    for field in &operation.fields {
                        results.push(executor.root(operation.kind, &field.name, &field.selection).await);
                    }
                    results
                }
            };

            let mut data = Map::with_capacity(operation.fields.len());
            let mut errors = Vec::new();
            for (field, result) in operation.fields.iter().zip(results) {
                let value = result.unwrap_or_else(|error| {
                    errors.push(ResponseError {
                        message: error.to_string(),
                        path: vec![field.response_key.clone()],
                    });
                    Value::Null
                });
                data.insert(field.response_key.clone(), value);
            }

            Response {
                data: Some(Value::Object(data)),
                errors,
            }
        }
        .instrument(span)
        .await
    }

    async fn context(&self, request: &InboundRequest) -> Result<Arc<RequestContext>, EngineError> {
        let context = RequestContext::resolve(
            request.clone(),
            &self.0.context_resolvers,
            self.0.config.engine.max_batch_size,
        )
        .await?;
        Ok(Arc::new(context))
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("types", &self.0.registry.len())
            .field("entities", &self.0.bindings.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

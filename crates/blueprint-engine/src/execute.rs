//! Field resolution and completion.
//!
//! Resolution produces the raw value of one field, trying in order an explicit resolver
//! function, a batch function, an automatic entity relation and finally the property of
//! the parent with the same name. Completion then projects that value onto the selection,
//! resolving nested fields the same way.

use std::{collections::HashMap, sync::Arc};

use async_recursion::async_recursion;
use blueprint_schema::{FieldSelection, Node, OperationKind, SchemaError, SelectSet, Selection};
use futures_util::{future::join_all, FutureExt, TryFutureExt};
use serde_json::{Map, Value};
use tracing::Instrument;

use crate::{
    engine::EngineInner,
    loader::{BatchLoader, Dispatch},
    registry::anonymous_name,
    validation::check_input,
    BatchFn, BatchInput, Datastore, EngineError, EntityBinding, OutputField, OutputTypeId, RelationQuery,
    RequestContext, ResolverInput, ValidationError,
};

pub(crate) struct Executor<'a> {
    engine: &'a EngineInner,
    context: Arc<RequestContext>,
}

impl<'a> Executor<'a> {
    pub(crate) fn new(engine: &'a EngineInner, context: Arc<RequestContext>) -> Self {
        Executor { engine, context }
    }

    /// Resolves and completes one root field. Aliases on `selection` produce an object
    /// keyed by alias.
    pub(crate) async fn root(
        &self,
        kind: OperationKind,
        name: &str,
        selection: &Selection,
    ) -> Result<Value, EngineError> {
        let registry = &self.engine.registry;
        let field = registry
            .root(kind)
            .and_then(|id| registry[id].fields.get(name))
            .ok_or_else(|| SchemaError::UnknownRootField {
                kind,
                name: name.to_owned(),
            })?;

        if !selection.has_aliases() {
            let value = self.field(kind.type_name(), Some(kind), field, &Value::Null, selection).await?;
            return Ok(value.unwrap_or(Value::Null));
        }

        let mut object = Map::with_capacity(selection.aliases.len());
        for (alias, aliased) in &selection.aliases {
            let value = self.field(kind.type_name(), Some(kind), field, &Value::Null, aliased).await?;
            object.insert(alias.clone(), value.unwrap_or(Value::Null));
        }

        Ok(Value::Object(object))
    }

    /// `None` when an optional field has no value: the key is left out of its object.
    async fn field(
        &self,
        type_name: &str,
        root: Option<OperationKind>,
        field: &OutputField,
        parent: &Value,
        selection: &Selection,
    ) -> Result<Option<Value>, EngineError> {
        let value = match self.resolve(type_name, root, field, parent, selection).await? {
            Some(value) => value,
            None if field.node.value_node().is_optional() => return Ok(None),
            None => Value::Null,
        };

        self.complete(type_name, field, &field.node, value, selection.select.as_ref())
            .await
            .map(Some)
    }

    async fn resolve(
        &self,
        type_name: &str,
        root: Option<OperationKind>,
        field: &OutputField,
        parent: &Value,
        selection: &Selection,
    ) -> Result<Option<Value>, EngineError> {
        let args = selection.args_value();
        if args.is_some() && field.node.args().is_none() {
            return Err(EngineError::UnexpectedArguments {
                type_name: type_name.to_owned(),
                field: field.name.clone(),
            });
        }

        let resolvers = &self.engine.resolvers;
        let explicit = match root {
            Some(kind) => resolvers.root(kind, &field.name),
            None => resolvers.field(type_name, &field.name),
        };

        let step = if let Some(resolver) = explicit {
            let resolver = Arc::clone(resolver);
            async move {
                let args = self.validate_args(type_name, field, args).await?;
                resolver(ResolverInput {
                    parent: parent.clone(),
                    args,
                    context: Arc::clone(&self.context),
                })
                .await
                .map_err(|error| EngineError::resolver(type_name, &field.name, &error))
            }
            .boxed()
        } else if let Some(batch) = resolvers.loader(type_name, &field.name) {
            let batch = Arc::clone(batch);
            async move {
                // The loader is keyed on the validated arguments, replacements included.
                let args = self.validate_args(type_name, field, args).await?;
                let loader = self.batch_loader(type_name, field, batch, args);
                loader.load(parent.clone(), &self.context).await
            }
            .boxed()
        } else if let Some(loader) = self.relation_loader(type_name, field)? {
            async move {
                self.validate_args(type_name, field, args).await?;
                loader.load(parent.clone(), &self.context).await
            }
            .boxed()
        } else {
            if let Some(node) = field.node.args() {
                check_input(&self.engine.schema, &field.name, node.node(), args.as_ref())?;
            }
            return Ok(parent.get(&field.name).cloned());
        };

        let span = tracing::info_span!("resolver", type_name, field = field.name.as_str());
        let result = async move {
            let value = step.await?;
            let scope = anonymous_name(type_name, &field.name);
            let validated = self
                .engine
                .validation
                .validate(&self.engine.schema, field.node.value_node(), value, &scope, &self.context)
                .await?;
            Ok::<_, EngineError>(validated)
        }
        .inspect_err(|error| {
            tracing::error!(%error, "resolver failed");
        })
        .instrument(span)
        .await;

        self.report(type_name, root, &field.name, &result);

        result.map(Some)
    }

    async fn validate_args(
        &self,
        type_name: &str,
        field: &OutputField,
        args: Option<Value>,
    ) -> Result<Option<Value>, EngineError> {
        let Some(node) = field.node.args() else {
            return Ok(None);
        };
        check_input(&self.engine.schema, &field.name, node.node(), args.as_ref())?;
        let Some(args) = args else {
            return Ok(None);
        };

        let scope = format!("{}Args", anonymous_name(type_name, &field.name));
        let validated = self
            .engine
            .validation
            .validate(&self.engine.schema, node.node(), args, &scope, &self.context)
            .await?;

        Ok(Some(validated))
    }

    fn report(&self, type_name: &str, root: Option<OperationKind>, field: &str, result: &Result<Value, EngineError>) {
        let hooks = &self.engine.hooks;
        match (root, result) {
            (Some(kind), Ok(value)) => hooks.on_root_success(kind, field, value),
            (Some(kind), Err(error)) => hooks.on_root_error(kind, field, error),
            (None, Ok(value)) => hooks.on_field_success(type_name, field, value),
            (None, Err(error)) => hooks.on_field_error(type_name, field, error),
        }
    }

    /// One loader per field and arguments, for the lifetime of the request.
    fn batch_loader(
        &self,
        type_name: &str,
        field: &OutputField,
        batch: BatchFn,
        args: Option<Value>,
    ) -> Arc<BatchLoader> {
        let name = format!("{type_name}.{}", field.name);
        let key = format!("{name}({})", args.as_ref().map(Value::to_string).unwrap_or_default());

        let (type_name, field_name) = (type_name.to_owned(), field.name.clone());
        self.context.loader(key, move |max_batch_size| {
            let dispatch: Dispatch = Arc::new(move |parents: Vec<Value>, context: Arc<RequestContext>| {
                let future = batch(BatchInput {
                    parents,
                    args: args.clone(),
                    context,
                });
                let (type_name, field_name) = (type_name.clone(), field_name.clone());
                async move {
                    future
                        .await
                        .map_err(|error| EngineError::resolver(&type_name, &field_name, &error))
                }
                .boxed()
            });
            BatchLoader::new(name, max_batch_size, dispatch)
        })
    }

    /// Loader of a relation resolved from storage, when the binding of `type_name`
    /// resolves `field` automatically.
    fn relation_loader(&self, type_name: &str, field: &OutputField) -> Result<Option<Arc<BatchLoader>>, EngineError> {
        let Some(binding) = self.engine.bindings.get(type_name) else {
            return Ok(None);
        };
        let Some(relation) = binding.auto_relation(&field.name) else {
            return Ok(None);
        };

        let target = self.engine.bindings.get(&relation.target).ok_or_else(|| {
            EngineError::Configuration(format!(
                "relation `{type_name}.{}` targets `{}`, which is not bound to storage",
                field.name, relation.target
            ))
        })?;
        let datastore = self
            .engine
            .datastore
            .clone()
            .ok_or_else(|| EngineError::MissingDatastore(type_name.to_owned()))?;
        let Some(query) = binding.relation_query(&field.name, target) else {
            return Ok(None);
        };

        let name = format!("{type_name}.{}", field.name);
        let (owner, target, many) = (Arc::clone(binding), Arc::clone(target), relation.kind.is_many());
        let loader = self.context.loader(name.clone(), move |max_batch_size| {
            let dispatch: Dispatch = Arc::new(move |parents: Vec<Value>, _: Arc<RequestContext>| {
                load_related(
                    Arc::clone(&owner),
                    Arc::clone(&target),
                    query.clone(),
                    Arc::clone(&datastore),
                    many,
                    parents,
                )
                .boxed()
            });
            BatchLoader::new(name, max_batch_size, dispatch)
        });

        Ok(Some(loader))
    }

    #[async_recursion]
    async fn complete(
        &self,
        type_name: &str,
        field: &OutputField,
        node: &Node,
        value: Value,
        select: Option<&'async_recursion SelectSet>,
    ) -> Result<Value, EngineError> {
        match node {
            Node::Args(args) => self.complete(type_name, field, &args.value, value, select).await,
            Node::Optional(_) | Node::Nullable(_) if value.is_null() => Ok(Value::Null),
            Node::Optional(inner) | Node::Nullable(inner) => {
                self.complete(type_name, field, inner, value, select).await
            }
            _ if value.is_null() => Err(EngineError::NullValue {
                type_name: type_name.to_owned(),
                field: field.name.clone(),
            }),
            Node::Primitive(primitive) if primitive.accepts(&value) => Ok(value),
            Node::Primitive(primitive) => Err(mismatch(field, &primitive.to_string(), &value)),
            Node::Array(inner) | Node::InputArray(inner) => {
                let Value::Array(items) = value else {
                    return Err(mismatch(field, "a list", &value));
                };
                let completed = join_all(
                    items
                        .into_iter()
                        .map(|item| self.complete(type_name, field, inner, item, select)),
                )
                .await;
                Ok(Value::Array(completed.into_iter().collect::<Result<_, _>>()?))
            }
            Node::Selection(selection) => {
                let select = select.unwrap_or(&selection.select);
                self.complete(type_name, field, &selection.model, value, Some(select)).await
            }
            Node::Blueprint(_) | Node::Model(_) | Node::ModelReference(_) => match field.target {
                Some(target) => self.object(target, field, value, select).await,
                None => Ok(value),
            },
            Node::Input(_) | Node::InputReference(_) => Ok(value),
        }
    }

    async fn object(
        &self,
        id: OutputTypeId,
        field: &OutputField,
        value: Value,
        select: Option<&SelectSet>,
    ) -> Result<Value, EngineError> {
        let Value::Object(parent) = value else {
            return Err(mismatch(field, "an object", &value));
        };
        let ty = &self.engine.registry[id];

        let Some(select) = select else {
            // Without a selection the stored value is projected as is, no resolver runs.
            let mut projected = Map::with_capacity(ty.fields.len());
            for (name, field) in &ty.fields {
                if let Some(value) = parent.get(name) {
                    let value = self.complete(&ty.name, field, &field.node, value.clone(), None).await?;
                    projected.insert(name.clone(), value);
                }
            }
            return Ok(Value::Object(projected));
        };

        let parent = Value::Object(parent);
        let mut pending = Vec::with_capacity(select.len());
        for (key, selection) in select {
            let field = ty.fields.get(key).ok_or_else(|| SchemaError::UnknownField {
                type_name: ty.name.clone(),
                field: key.clone(),
            })?;

            match selection {
                FieldSelection::Include(false) => {}
                FieldSelection::Include(true) => pending.push((key.as_str(), field, Selection::default())),
                FieldSelection::Object(object) if object.has_aliases() => {
                    for (alias, aliased) in &object.aliases {
                        pending.push((alias.as_str(), field, aliased.clone()));
                    }
                }
                FieldSelection::Object(object) => pending.push((key.as_str(), field, object.clone())),
            }
        }

        let values = join_all(
            pending
                .iter()
                .map(|(_, field, selection)| self.field(&ty.name, None, field, &parent, selection)),
        )
        .await;

        pending
            .iter()
            .zip(values)
            .filter_map(|((key, _, _), value)| Some(value.transpose()?.map(|value| ((*key).to_owned(), value))))
            .collect::<Result<Map<_, _>, EngineError>>()
            .map(Value::Object)
    }
}

async fn load_related(
    owner: Arc<EntityBinding>,
    target: Arc<EntityBinding>,
    query: RelationQuery,
    datastore: Arc<dyn Datastore>,
    many: bool,
    parents: Vec<Value>,
) -> Result<Vec<Value>, EngineError> {
    let owner_ids = parents
        .iter()
        .map(|parent| parent.get(owner.primary_key()).cloned().unwrap_or(Value::Null))
        .collect::<Vec<_>>();

    let related = datastore.load_relation_ids(&query, &owner_ids).await?;

    let mut ids = Vec::new();
    for id in related.iter().flatten() {
        if !ids.contains(id) {
            ids.push(id.clone());
        }
    }

    let rows = if ids.is_empty() {
        Vec::new()
    } else {
        target.repository(&datastore).find_by_ids(ids).await?
    };

    let by_id = rows
        .into_iter()
        .map(|row| {
            let id = row.get(target.primary_key()).map(Value::to_string).unwrap_or_default();
            (id, row)
        })
        .collect::<HashMap<_, _>>();

    Ok(related
        .into_iter()
        .map(|ids| {
            let mut found = ids.iter().filter_map(|id| by_id.get(&id.to_string()).cloned());
            if many {
                Value::Array(found.collect())
            } else {
                found.next().unwrap_or(Value::Null)
            }
        })
        .collect())
}

fn mismatch(field: &OutputField, expected: &str, found: &Value) -> EngineError {
    ValidationError::new(field.name.as_str(), "type", format!("expected {expected}, found {found}")).into()
}

use std::sync::Arc;

use blueprint_config::NamingConfig;
use blueprint_schema::{
    args, array, input, input_reference, nullable, optional, AppSchema, Blueprint, InputNode, Model, Node,
    OperationKind, Primitive,
};
use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::{
    resolver, resolver::Resolvers, Datastore, EngineError, EntityBinding, OrderDirection, ResolverFn, ResolverInput,
    ResolverRegistration,
};

/// Adds the generated root fields of every entity with `crud` enabled, together with the
/// inputs they accept. Declared root fields are left alone and explicit resolvers replace
/// the generated ones.
pub(crate) fn generate(
    schema: AppSchema,
    naming: &NamingConfig,
    bindings: &IndexMap<String, Arc<EntityBinding>>,
    datastore: Option<&Arc<dyn Datastore>>,
    resolvers: &mut Resolvers,
) -> Result<AppSchema, EngineError> {
    let entities = bindings
        .values()
        .filter(|binding| binding.config().crud)
        .map(|binding| {
            let model = schema
                .model(binding.model())
                .cloned()
                .ok_or_else(|| EngineError::Configuration(format!("entity `{}` is not a model", binding.model())))?;
            Ok((model, Arc::clone(binding)))
        })
        .collect::<Result<Vec<_>, EngineError>>()?;

    if entities.is_empty() {
        return Ok(schema);
    }

    let existing_inputs = schema.inputs().map(|input| input.name().to_owned()).collect::<Vec<_>>();
    let mut builder = schema.into_builder();

    for (model, binding) in entities {
        let datastore = datastore.ok_or_else(|| EngineError::MissingDatastore(model.name().to_owned()))?;
        let generated = Generated::new(naming, &model);

        for (name, blueprint) in [
            (&generated.where_input, generated.where_blueprint()),
            (&generated.order_input, generated.order_blueprint()),
            (&generated.save_input, generated.save_blueprint()),
        ] {
            if !existing_inputs.contains(name) {
                builder = builder.input(input(name.clone(), blueprint));
            }
        }

        let fields = [
            (
                OperationKind::Query,
                naming.one(model.name()),
                generated.one_node()?,
                one(Arc::clone(&binding), Arc::clone(datastore)),
            ),
            (
                OperationKind::Query,
                naming.many(model.name()),
                generated.many_node()?,
                many(Arc::clone(&binding), Arc::clone(datastore)),
            ),
            (
                OperationKind::Query,
                naming.count(model.name()),
                generated.count_node()?,
                count(Arc::clone(&binding), Arc::clone(datastore)),
            ),
            (
                OperationKind::Mutation,
                naming.save(model.name()),
                generated.save_node()?,
                save(Arc::clone(&binding), Arc::clone(datastore)),
            ),
            (
                OperationKind::Mutation,
                naming.remove(model.name()),
                generated.remove_node()?,
                remove(Arc::clone(&binding), Arc::clone(datastore)),
            ),
        ];

        for (kind, name, node, resolver) in fields {
            if builder.root_mut(kind).contains(&name) {
                tracing::debug!(%kind, field = name.as_str(), "keeping the declared root field");
                continue;
            }

            tracing::debug!(%kind, field = name.as_str(), model = model.name(), "generating root field");
            builder.root_mut(kind).insert(name.clone(), node);
            if !resolvers.has_root(kind, &name) {
                resolvers.register(ResolverRegistration::Root { kind, name, resolver })?;
            }
        }
    }

    Ok(builder.build()?)
}

/// Names and shapes generated for one model.
struct Generated {
    model: Arc<Model>,
    scalars: Vec<(String, Primitive)>,
    where_input: String,
    order_input: String,
    save_input: String,
}

impl Generated {
    fn new(naming: &NamingConfig, model: &Arc<Model>) -> Self {
        let scalars = model
            .blueprint()
            .iter()
            .filter_map(|(name, node)| scalar(node).map(|primitive| (name.to_owned(), primitive)))
            .collect();

        Generated {
            model: Arc::clone(model),
            scalars,
            where_input: naming.where_input(model.name()),
            order_input: naming.order_input(model.name()),
            save_input: naming.save_input(model.name()),
        }
    }

    fn where_blueprint(&self) -> Blueprint {
        self.scalars
            .iter()
            .map(|(name, primitive)| (name.clone(), optional(*primitive)))
            .collect()
    }

    /// Field to `"asc"` or `"desc"`.
    fn order_blueprint(&self) -> Blueprint {
        self.scalars
            .iter()
            .map(|(name, _)| (name.clone(), optional(Primitive::String)))
            .collect()
    }

    fn save_blueprint(&self) -> Blueprint {
        self.where_blueprint()
    }

    fn one_node(&self) -> Result<Node, EngineError> {
        let accepted = Blueprint::new().field("where", input_reference(&self.where_input));
        Ok(args(nullable(&self.model), InputNode::blueprint(accepted)?))
    }

    fn many_node(&self) -> Result<Node, EngineError> {
        let accepted = Blueprint::new()
            .field("where", optional(input_reference(&self.where_input)))
            .field("order", optional(input_reference(&self.order_input)))
            .field("skip", optional(Primitive::Number))
            .field("take", optional(Primitive::Number));
        Ok(args(array(&self.model), InputNode::blueprint(accepted)?))
    }

    fn count_node(&self) -> Result<Node, EngineError> {
        let accepted = Blueprint::new().field("where", optional(input_reference(&self.where_input)));
        Ok(args(Primitive::Number, InputNode::blueprint(accepted)?))
    }

    fn save_node(&self) -> Result<Node, EngineError> {
        let accepted = Blueprint::new().field("input", input_reference(&self.save_input));
        Ok(args(&self.model, InputNode::blueprint(accepted)?))
    }

    fn remove_node(&self) -> Result<Node, EngineError> {
        let accepted = Blueprint::new().field("where", input_reference(&self.where_input));
        Ok(args(Primitive::Number, InputNode::blueprint(accepted)?))
    }
}

fn scalar(node: &Node) -> Option<Primitive> {
    match node {
        Node::Primitive(primitive) => Some(*primitive),
        Node::Optional(inner) | Node::Nullable(inner) => scalar(inner),
        _ => None,
    }
}

/// The object argument `name`, without its null entries.
fn object_arg(input: &ResolverInput, name: &str) -> Map<String, Value> {
    input
        .args
        .as_ref()
        .and_then(|args| args.get(name))
        .and_then(Value::as_object)
        .map(|object| {
            object
                .iter()
                .filter(|(_, value)| !value.is_null())
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect()
        })
        .unwrap_or_default()
}

fn usize_arg(input: &ResolverInput, name: &str) -> Option<usize> {
    input
        .args
        .as_ref()
        .and_then(|args| args.get(name))
        .and_then(Value::as_u64)
        .and_then(|value| usize::try_from(value).ok())
}

fn one(binding: Arc<EntityBinding>, datastore: Arc<dyn Datastore>) -> ResolverFn {
    resolver(move |input: ResolverInput| {
        let binding = Arc::clone(&binding);
        let datastore = Arc::clone(&datastore);
        async move {
            let by = object_arg(&input, "where");
            let found = binding.repository(&datastore).find_one(&by).await?;
            Ok::<_, anyhow::Error>(found.unwrap_or(Value::Null))
        }
    })
}

fn many(binding: Arc<EntityBinding>, datastore: Arc<dyn Datastore>) -> ResolverFn {
    resolver(move |input: ResolverInput| {
        let binding = Arc::clone(&binding);
        let datastore = Arc::clone(&datastore);
        async move {
            let by = object_arg(&input, "where");
            let order = object_arg(&input, "order")
                .into_iter()
                .map(|(field, direction)| {
                    let direction = direction
                        .as_str()
                        .and_then(|direction| direction.parse::<OrderDirection>().ok())
                        .ok_or_else(|| anyhow::anyhow!("invalid order direction {direction} for `{field}`"))?;
                    Ok((field, direction))
                })
                .collect::<anyhow::Result<Vec<_>>>()?;

            let rows = binding
                .repository(&datastore)
                .find(&by, &order, usize_arg(&input, "skip"), usize_arg(&input, "take"))
                .await?;
            Ok::<_, anyhow::Error>(Value::Array(rows))
        }
    })
}

fn count(binding: Arc<EntityBinding>, datastore: Arc<dyn Datastore>) -> ResolverFn {
    resolver(move |input: ResolverInput| {
        let binding = Arc::clone(&binding);
        let datastore = Arc::clone(&datastore);
        async move {
            let by = object_arg(&input, "where");
            let count = binding.repository(&datastore).count(&by).await?;
            Ok::<_, anyhow::Error>(Value::from(count))
        }
    })
}

fn save(binding: Arc<EntityBinding>, datastore: Arc<dyn Datastore>) -> ResolverFn {
    resolver(move |input: ResolverInput| {
        let binding = Arc::clone(&binding);
        let datastore = Arc::clone(&datastore);
        async move {
            let entity = object_arg(&input, "input");
            let saved = binding.repository(&datastore).save(Value::Object(entity)).await?;
            Ok::<_, anyhow::Error>(saved)
        }
    })
}

fn remove(binding: Arc<EntityBinding>, datastore: Arc<dyn Datastore>) -> ResolverFn {
    resolver(move |input: ResolverInput| {
        let binding = Arc::clone(&binding);
        let datastore = Arc::clone(&datastore);
        async move {
            let by = object_arg(&input, "where");
            let removed = binding.repository(&datastore).remove(&by).await?;
            Ok::<_, anyhow::Error>(Value::from(removed))
        }
    })
}

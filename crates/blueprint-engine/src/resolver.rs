use std::{collections::HashMap, future::Future, sync::Arc};

use blueprint_schema::OperationKind;
use futures_util::{future::BoxFuture, FutureExt};
use indexmap::IndexMap;
use serde_json::Value;

use crate::{EngineError, RequestContext};

/// What a resolver function receives.
pub struct ResolverInput {
    /// The object owning the field, `null` for root fields.
    pub parent: Value,
    /// `None` when the field declares no arguments.
    pub args: Option<Value>,
    pub context: Arc<RequestContext>,
}

/// What a batch function receives: every parent that asked for the field with the same
/// arguments during one tick.
pub struct BatchInput {
    pub parents: Vec<Value>,
    pub args: Option<Value>,
    pub context: Arc<RequestContext>,
}

pub type ResolverFn = Arc<dyn Fn(ResolverInput) -> BoxFuture<'static, anyhow::Result<Value>> + Send + Sync>;

/// Returns one value per parent, in the order of the parents.
pub type BatchFn = Arc<dyn Fn(BatchInput) -> BoxFuture<'static, anyhow::Result<Vec<Value>>> + Send + Sync>;

pub fn resolver<F, Fut>(f: F) -> ResolverFn
where
    F: Fn(ResolverInput) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<Value>> + Send + 'static,
{
    Arc::new(move |input| f(input).boxed())
}

pub fn batch<F, Fut>(f: F) -> BatchFn
where
    F: Fn(BatchInput) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<Vec<Value>>> + Send + 'static,
{
    Arc::new(move |input| f(input).boxed())
}

pub enum ResolverRegistration {
    Root {
        kind: OperationKind,
        name: String,
        resolver: ResolverFn,
    },
    Model(ModelResolvers),
}

impl ResolverRegistration {
    pub fn query(name: impl Into<String>, resolver: ResolverFn) -> Self {
        ResolverRegistration::Root {
            kind: OperationKind::Query,
            name: name.into(),
            resolver,
        }
    }

    pub fn mutation(name: impl Into<String>, resolver: ResolverFn) -> Self {
        ResolverRegistration::Root {
            kind: OperationKind::Mutation,
            name: name.into(),
            resolver,
        }
    }
}

impl From<ModelResolvers> for ResolverRegistration {
    fn from(resolvers: ModelResolvers) -> Self {
        ResolverRegistration::Model(resolvers)
    }
}

/// Field resolvers and batch functions of one model.
#[derive(Clone)]
pub struct ModelResolvers {
    pub model: String,
    pub fields: IndexMap<String, ResolverFn>,
    pub loaders: IndexMap<String, BatchFn>,
}

impl ModelResolvers {
    pub fn new(model: impl Into<String>) -> Self {
        ModelResolvers {
            model: model.into(),
            fields: IndexMap::new(),
            loaders: IndexMap::new(),
        }
    }

    #[must_use]
    pub fn field(mut self, name: impl Into<String>, resolver: ResolverFn) -> Self {
        self.fields.insert(name.into(), resolver);
        self
    }

    #[must_use]
    pub fn loader(mut self, name: impl Into<String>, batch: BatchFn) -> Self {
        self.loaders.insert(name.into(), batch);
        self
    }
}

/// Every registration, merged.
#[derive(Clone, Default)]
pub(crate) struct Resolvers {
    roots: HashMap<(OperationKind, String), ResolverFn>,
    models: HashMap<String, ModelResolvers>,
}

impl Resolvers {
    /// Model registrations merge field by field, the later one winning. Root fields can
    /// only be registered once.
    pub(crate) fn register(&mut self, registration: ResolverRegistration) -> Result<(), EngineError> {
        match registration {
            ResolverRegistration::Root { kind, name, resolver } => {
                if self.roots.contains_key(&(kind, name.clone())) {
                    return Err(EngineError::DuplicateResolver { kind, name });
                }
                self.roots.insert((kind, name), resolver);
            }
            ResolverRegistration::Model(resolvers) => {
                let merged = self
                    .models
                    .entry(resolvers.model.clone())
                    .or_insert_with(|| ModelResolvers::new(resolvers.model.clone()));
                merged.fields.extend(resolvers.fields);
                merged.loaders.extend(resolvers.loaders);
            }
        }

        Ok(())
    }

    pub(crate) fn has_root(&self, kind: OperationKind, name: &str) -> bool {
        self.roots.contains_key(&(kind, name.to_owned()))
    }

    pub(crate) fn roots(&self) -> impl Iterator<Item = (OperationKind, &str)> + '_ {
        self.roots.keys().map(|(kind, name)| (*kind, name.as_str()))
    }

    pub(crate) fn root(&self, kind: OperationKind, name: &str) -> Option<&ResolverFn> {
        self.roots.get(&(kind, name.to_owned()))
    }

    pub(crate) fn field(&self, model: &str, field: &str) -> Option<&ResolverFn> {
        self.models.get(model)?.fields.get(field)
    }

    pub(crate) fn loader(&self, model: &str, field: &str) -> Option<&BatchFn> {
        self.models.get(model)?.loaders.get(field)
    }

    pub(crate) fn models(&self) -> impl Iterator<Item = &ModelResolvers> + '_ {
        self.models.values()
    }
}

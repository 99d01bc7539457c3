//! Resolution engine of a blueprint application.
//!
//! An [`Engine`] is built once from an [`AppSchema`](blueprint_schema::AppSchema), resolver
//! registrations, entity bindings and a [`Config`](blueprint_config::Config). It owns an
//! immutable [`TypeRegistry`] and resolves selections against it, batching loads within a
//! request and validating arguments and results on the way.

mod context;
mod crud;
mod datastore;
mod document;
mod engine;
mod entity;
mod error;
mod execute;
mod hooks;
mod ids;
mod loader;
mod registry;
mod resolver;
mod response;
pub mod validation;

pub use context::{context_resolver, ContextResolverFn, InboundRequest, RequestContext};
pub use datastore::{Condition, Datastore, DatastoreError, Filter, FindOptions, OrderDirection, RelationQuery};
pub use engine::{Engine, EngineBuilder};
pub use entity::{EntityBinding, Repository};
pub use error::EngineError;
pub use hooks::{Hooks, NoopHooks};
pub use ids::OutputTypeId;
pub use registry::{OutputField, OutputType, TypeRegistry, TypeState};
pub use resolver::{
    batch, resolver, BatchFn, BatchInput, ModelResolvers, ResolverFn, ResolverInput, ResolverRegistration,
};
pub use response::{Response, ResponseError};
pub use validation::{Constraint, ConstraintValidator, ValidationError, Validator};

//! Declarative schema for blueprint applications.
//!
//! A schema is declared once out of [`Node`]s: primitives, plain [`Blueprint`]s, named
//! [`Model`]s and [`Input`]s, and the wrappers around them. Models refer to each other by
//! name through [`ModelReference`] nodes, which is the only way to express a cycle. The
//! [`AppSchema`] registry resolves those names.
//!
//! Callers describe what they want back with a [`Selection`] and [`infer`] computes the
//! exact [`Shape`] of the data such a selection produces.

mod app;
mod blueprint;
mod descriptor;
mod error;
mod infer;
mod model;
mod node;
mod primitive;
mod selection;
mod shape;

pub use app::*;
pub use blueprint::Blueprint;
pub use descriptor::classify_descriptor;
pub use error::SchemaError;
pub use infer::*;
pub use model::*;
pub use node::*;
pub use primitive::Primitive;
pub use selection::*;
pub use shape::*;

/// The kind of root operation a field is declared under.
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
    strum::EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum OperationKind {
    Query,
    Mutation,
}

impl OperationKind {
    /// Name of the root output type holding the fields of this kind.
    pub fn type_name(self) -> &'static str {
        match self {
            OperationKind::Query => "Query",
            OperationKind::Mutation => "Mutation",
        }
    }
}

//! Client side of a blueprint application.
//!
//! Selections are serialized into query documents by [`transform_args`] and
//! [`SelectToQueryStringTransformer`], sent through a [`TransportClient`] and, when the
//! client knows the application schema, checked against the shape inferred for them.

mod args;
mod client;
pub mod codegen;
mod document;
mod error;
mod select;
mod transport;

pub use args::transform_args;
pub use client::{execute_query, Client, Selector};
pub use document::build_document;
pub use error::ClientError;
pub use select::SelectToQueryStringTransformer;
pub use transport::{Transport, TransportClient, TransportResponse};

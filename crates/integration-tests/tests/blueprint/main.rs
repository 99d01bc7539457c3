#![allow(unused_crate_dependencies)]

mod batching;
mod client;
mod crud;
mod hooks;
mod registry;
mod relations;
mod validation;

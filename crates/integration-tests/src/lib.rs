#![allow(unused_crate_dependencies, clippy::panic)]

pub mod blog;
pub mod datastore;
pub mod transport;

use std::sync::OnceLock;

pub use datastore::MemoryDatastore;
use tokio::runtime::Runtime;
pub use transport::InProcessTransport;

#[ctor::ctor]
fn setup_logging() {
    let directives = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "blueprint_schema=debug,blueprint_client=debug,blueprint_engine=debug".to_owned());
    let filter = tracing_subscriber::filter::EnvFilter::builder().parse(directives).unwrap();
    tracing_subscriber::fmt()
        .pretty()
        .with_env_filter(filter)
        .with_file(true)
        .with_line_number(true)
        .with_target(true)
        .without_time()
        .with_test_writer()
        .init();
}

pub fn runtime() -> &'static Runtime {
    static RUNTIME: OnceLock<Runtime> = OnceLock::new();
    RUNTIME.get_or_init(|| {
        tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
            .unwrap()
    })
}

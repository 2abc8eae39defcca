pub mod cache;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod http;
pub mod models;
pub mod query;
pub mod reporter;

pub use cache::{Cache, CacheKey, DiskCache};
pub use config::Config;
pub use error::{Error, QueryError, Result};
pub use http::{HttpClient, RetryPolicy, Transport};
pub use models::{AccumulatedResult, QueryRequest, QueryResponse, TimeRange};
pub use query::{
    Endpoints, LogSearch, NameResolver, ProgressSink, QueryPoller, SearchOptions, SilentProgress,
    SpinnerProgress,
};
pub use reporter::{ConsoleReporter, JsonExporter};

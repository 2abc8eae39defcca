//! Asynchronous LEQL queries: name resolution, URL construction, and the
//! poll-then-paginate loop that collects results.

mod endpoints;
pub mod leql;
mod poller;
mod progress;
mod resolver;
mod search;

#[cfg(test)]
mod testing;

pub use endpoints::Endpoints;
pub use poller::{PROCESSING_POLL_INTERVAL, QueryPoller, RESULT_PAGE_INTERVAL};
pub use progress::{ProgressSink, SilentProgress, SpinnerProgress, progress_sink};
pub use resolver::{NameResolver, fetch_logs, is_uuid, match_log_id, match_logset_id};
pub use search::{
    LogSearch, SearchOptions, SearchOutcome, all_logsets_query_url, log_query_url,
    logset_query_url,
};

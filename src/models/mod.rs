mod log;
mod method;
mod query;
mod response;

pub use log::{LogEntry, LogsListing, LogsetInfo};
pub use method::HttpMethod;
pub use query::{
    AccumulatedResult, DEFAULT_QUERY_TIMEOUT, DEFAULT_TIME_RANGE, QueryRequest, QueryResponse,
    TimeRange,
};
pub use response::ApiResponse;

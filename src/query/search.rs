use std::collections::{BTreeMap, BTreeSet};
use std::num::NonZeroU32;
use std::time::Duration;

use super::resolver::{NameResolver, fetch_logs};
use super::{Endpoints, ProgressSink, QueryPoller};
use crate::cache::{Cache, CacheKey, QUERY_NAMESPACE};
use crate::error::{QueryError, Result};
use crate::http::Transport;
use crate::models::{
    DEFAULT_QUERY_TIMEOUT, LogEntry, LogsetInfo, QueryRequest, QueryResponse, TimeRange,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchOptions {
    pub time_range: TimeRange,
    pub max_result_pages: Option<NonZeroU32>,
    pub query_timeout: Duration,
    pub use_cache: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            time_range: TimeRange::default(),
            max_result_pages: None,
            query_timeout: DEFAULT_QUERY_TIMEOUT,
            use_cache: true,
        }
    }
}

impl SearchOptions {
    fn budget_label(&self) -> String {
        self.max_result_pages
            .map(|n| n.to_string())
            .unwrap_or_else(|| "all".to_string())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    pub response: QueryResponse,
    pub from_cache: bool,
}

/// Entry points for LEQL searches. Each one turns the caller's target into a
/// query URL, then either answers from the result cache or runs the poller.
pub struct LogSearch<'a, T: Transport + ?Sized> {
    transport: &'a T,
    endpoints: &'a Endpoints,
    cache: Option<&'a dyn Cache>,
    cache_ttl: Duration,
}

impl<'a, T: Transport + ?Sized> LogSearch<'a, T> {
    pub fn new(transport: &'a T, endpoints: &'a Endpoints) -> Self {
        Self {
            transport,
            endpoints,
            cache: None,
            cache_ttl: Duration::ZERO,
        }
    }

    pub fn with_cache(mut self, cache: Option<&'a dyn Cache>, ttl: Duration) -> Self {
        self.cache = cache;
        self.cache_ttl = ttl;
        self
    }

    fn resolver(&self) -> NameResolver<'a, T> {
        NameResolver::new(self.transport, self.endpoints).with_cache(self.cache, self.cache_ttl)
    }

    pub async fn query_log(
        &self,
        log: &str,
        query: &str,
        options: &SearchOptions,
        progress: &dyn ProgressSink,
    ) -> Result<SearchOutcome> {
        let log_id = self.resolver().resolve_log(log).await?;
        let key = Self::cache_key("log", Some(&log_id), query, options);
        if let Some(hit) = self.cached(&key, options) {
            return Ok(hit);
        }

        let url = log_query_url(self.endpoints, &log_id, query, &options.time_range);
        self.run(&key, &url, options, progress).await
    }

    pub async fn query_logset(
        &self,
        logset: &str,
        query: &str,
        options: &SearchOptions,
        progress: &dyn ProgressSink,
    ) -> Result<SearchOutcome> {
        let logset_id = self.resolver().resolve_logset(logset).await?;
        let key = Self::cache_key("logset", Some(&logset_id), query, options);
        if let Some(hit) = self.cached(&key, options) {
            return Ok(hit);
        }

        let url = logset_query_url(self.endpoints, &logset_id, query, &options.time_range);
        self.run(&key, &url, options, progress).await
    }

    /// One combined server-side query over every logset in the organization.
    pub async fn query_all_logsets(
        &self,
        query: &str,
        options: &SearchOptions,
        progress: &dyn ProgressSink,
    ) -> Result<SearchOutcome> {
        let key = Self::cache_key("all_logsets", None, query, options);
        if let Some(hit) = self.cached(&key, options) {
            return Ok(hit);
        }

        let logs = fetch_logs(self.transport, self.endpoints).await?;
        let names = logset_names(&logs);
        if names.is_empty() {
            return Err(QueryError::NoLogsets.into());
        }
        tracing::info!("querying {} logsets: {:?}", names.len(), names);

        let url = all_logsets_query_url(self.endpoints, &names, query, &options.time_range);
        self.run(&key, &url, options, progress).await
    }

    pub async fn list_logs(&self) -> Result<Vec<LogEntry>> {
        let mut logs = fetch_logs(self.transport, self.endpoints).await?;
        logs.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        Ok(logs)
    }

    /// Every logset referenced by any log, once each, ordered by name.
    pub async fn list_logsets(&self) -> Result<Vec<LogsetInfo>> {
        let logs = fetch_logs(self.transport, self.endpoints).await?;
        let by_id: BTreeMap<&str, &LogsetInfo> = logs
            .iter()
            .flat_map(|log| &log.logsets_info)
            .filter(|ls| !ls.name.is_empty())
            .map(|ls| (ls.id.as_str(), ls))
            .collect();

        let mut logsets: Vec<LogsetInfo> = by_id.into_values().cloned().collect();
        logsets.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(logsets)
    }

    fn cache_key(kind: &str, target: Option<&str>, query: &str, options: &SearchOptions) -> String {
        let mut fields = vec![
            ("query", query.to_string()),
            ("time_range", options.time_range.to_string()),
            ("max_result_pages", options.budget_label()),
        ];
        if let Some(target) = target {
            fields.push(("target", target.to_string()));
        }
        CacheKey::for_query(kind, &fields)
    }

    fn cached(&self, key: &str, options: &SearchOptions) -> Option<SearchOutcome> {
        let cache = self.cache.filter(|_| options.use_cache)?;
        let value = cache.get(QUERY_NAMESPACE, key)?;
        match QueryResponse::from_cache_value(value) {
            Ok(response) => {
                tracing::info!("using cached query result");
                Some(SearchOutcome {
                    response,
                    from_cache: true,
                })
            }
            Err(e) => {
                tracing::debug!("ignoring unreadable cached result: {}", e);
                None
            }
        }
    }

    async fn run(
        &self,
        key: &str,
        url: &str,
        options: &SearchOptions,
        progress: &dyn ProgressSink,
    ) -> Result<SearchOutcome> {
        tracing::info!("query URL: {}", url);
        let request = QueryRequest::new(url)
            .with_max_result_pages(options.max_result_pages)
            .with_query_timeout(options.query_timeout);
        let response = QueryPoller::new(self.transport).poll(&request, progress).await?;

        if options.use_cache {
            if let Some(cache) = self.cache {
                cache.set(QUERY_NAMESPACE, key, &response.to_cache_value(), self.cache_ttl);
            }
        }

        Ok(SearchOutcome {
            response,
            from_cache: false,
        })
    }
}

fn logset_names(logs: &[LogEntry]) -> Vec<String> {
    logs.iter()
        .flat_map(LogEntry::logset_names)
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn encode_pairs<'p>(pairs: impl IntoIterator<Item = (&'p str, &'p str)>) -> String {
    pairs
        .into_iter()
        .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

/// `query` is always sent for a single log, even when empty.
pub fn log_query_url(
    endpoints: &Endpoints,
    log_id: &str,
    query: &str,
    time_range: &TimeRange,
) -> String {
    let time = time_range.query_pairs();
    let pairs = time
        .iter()
        .map(|(k, v)| (*k, v.as_str()))
        .chain([("query", query)]);
    format!("{}?{}", endpoints.log_query(log_id), encode_pairs(pairs))
}

pub fn logset_query_url(
    endpoints: &Endpoints,
    logset_id: &str,
    query: &str,
    time_range: &TimeRange,
) -> String {
    let time = time_range.query_pairs();
    let pairs = (!query.is_empty())
        .then_some(("query", query))
        .into_iter()
        .chain(time.iter().map(|(k, v)| (*k, v.as_str())));
    format!("{}?{}", endpoints.logset_query(logset_id), encode_pairs(pairs))
}

pub fn all_logsets_query_url(
    endpoints: &Endpoints,
    logset_names: &[String],
    query: &str,
    time_range: &TimeRange,
) -> String {
    let time = time_range.query_pairs();
    let pairs = logset_names
        .iter()
        .map(|name| ("logset_name", name.as_str()))
        .chain(time.iter().map(|(k, v)| (*k, v.as_str())))
        .chain((!query.is_empty()).then_some(("query", query)));
    format!("{}?{}", endpoints.all_logsets_query(), encode_pairs(pairs))
}

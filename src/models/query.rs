use std::fmt;
use std::num::NonZeroU32;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::QueryError;

pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(300);
pub const DEFAULT_TIME_RANGE: &str = "Last 30 days";

/// One submit-poll-paginate lifecycle, built fresh per command invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRequest {
    pub url: String,
    pub max_result_pages: Option<NonZeroU32>,
    pub query_timeout: Duration,
}

impl QueryRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_result_pages: None,
            query_timeout: DEFAULT_QUERY_TIMEOUT,
        }
    }

    pub fn with_max_result_pages(mut self, pages: Option<NonZeroU32>) -> Self {
        self.max_result_pages = pages;
        self
    }

    pub fn with_query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = timeout;
        self
    }

    pub fn validate(&self) -> Result<(), QueryError> {
        if self.url.trim().is_empty() {
            return Err(QueryError::InvalidRequest("query URL is empty".to_string()));
        }
        if self.query_timeout.is_zero() {
            return Err(QueryError::InvalidRequest(
                "query timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Whether `pages` Phase-2 fetches still leave room in the budget.
    pub fn allows_page(&self, pages: u32) -> bool {
        self.max_result_pages.is_none_or(|max| pages < max.get())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeRange {
    Relative(String),
    Absolute { from: i64, to: i64 },
}

impl TimeRange {
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        match self {
            TimeRange::Relative(range) => vec![("time_range", range.clone())],
            TimeRange::Absolute { from, to } => {
                vec![("from", from.to_string()), ("to", to.to_string())]
            }
        }
    }
}

impl Default for TimeRange {
    fn default() -> Self {
        TimeRange::Relative(DEFAULT_TIME_RANGE.to_string())
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeRange::Relative(range) => write!(f, "{}", range),
            TimeRange::Absolute { from, to } => write!(f, "{}..{}", from, to),
        }
    }
}

/// Events and statistics gathered across every page of one query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccumulatedResult {
    pub events: Vec<Value>,
    pub statistics: Option<Value>,
}

impl AccumulatedResult {
    /// Appends the page's events in arrival order; a non-null `statistics`
    /// replaces the previous one since each page carries the full aggregate.
    pub fn merge_page(&mut self, page: &Value) {
        if let Some(events) = page.get("events").and_then(Value::as_array) {
            self.events.extend(events.iter().cloned());
        }
        if let Some(stats) = page.get("statistics").filter(|s| !s.is_null()) {
            self.statistics = Some(stats.clone());
        }
    }

    pub fn is_populated(&self) -> bool {
        !self.events.is_empty() || self.statistics.is_some()
    }
}

/// What a poll call hands back. `RawPage` only appears when nothing was
/// accumulated but the server did answer, so callers see its body as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryResponse {
    Accumulated(AccumulatedResult),
    RawPage(Value),
}

impl QueryResponse {
    pub fn events(&self) -> &[Value] {
        match self {
            QueryResponse::Accumulated(result) => &result.events,
            QueryResponse::RawPage(page) => page
                .get("events")
                .and_then(Value::as_array)
                .map(Vec::as_slice)
                .unwrap_or(&[]),
        }
    }

    pub fn statistics(&self) -> Option<&Value> {
        match self {
            QueryResponse::Accumulated(result) => result.statistics.as_ref(),
            QueryResponse::RawPage(page) => page.get("statistics").filter(|s| !s.is_null()),
        }
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// Tagged form for the result cache. The untagged output shape cannot
    /// tell a raw page carrying `events` apart from an accumulator.
    pub fn to_cache_value(&self) -> Value {
        let stored = match self {
            QueryResponse::Accumulated(result) => StoredResponse::Accumulated(result),
            QueryResponse::RawPage(page) => StoredResponse::RawPage(page),
        };
        serde_json::to_value(stored).unwrap_or(Value::Null)
    }

    pub fn from_cache_value(value: Value) -> serde_json::Result<Self> {
        Ok(match serde_json::from_value(value)? {
            CachedResponse::Accumulated(result) => QueryResponse::Accumulated(result),
            CachedResponse::RawPage(page) => QueryResponse::RawPage(page),
        })
    }
}

#[derive(Serialize)]
#[serde(tag = "kind", content = "body", rename_all = "snake_case")]
enum StoredResponse<'a> {
    Accumulated(&'a AccumulatedResult),
    RawPage(&'a Value),
}

#[derive(Deserialize)]
#[serde(tag = "kind", content = "body", rename_all = "snake_case")]
enum CachedResponse {
    Accumulated(AccumulatedResult),
    RawPage(Value),
}

impl Default for QueryResponse {
    fn default() -> Self {
        QueryResponse::Accumulated(AccumulatedResult::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_merge_appends_events_and_overwrites_statistics() {
        let mut acc = AccumulatedResult::default();
        acc.merge_page(&json!({"events": [{"m": 1}], "statistics": {"count": 1}}));
        acc.merge_page(&json!({"events": [{"m": 2}, {"m": 3}], "statistics": {"count": 7}}));

        assert_eq!(acc.events, vec![json!({"m": 1}), json!({"m": 2}), json!({"m": 3})]);
        assert_eq!(acc.statistics, Some(json!({"count": 7})));
    }

    #[test]
    fn test_merge_ignores_null_statistics() {
        let mut acc = AccumulatedResult::default();
        acc.merge_page(&json!({"statistics": {"count": 3}}));
        acc.merge_page(&json!({"statistics": null, "events": []}));

        assert_eq!(acc.statistics, Some(json!({"count": 3})));
        assert!(acc.is_populated());
    }

    #[test]
    fn test_page_budget() {
        let unbounded = QueryRequest::new("https://x/q");
        assert!(unbounded.allows_page(10_000));

        let bounded = QueryRequest::new("https://x/q").with_max_result_pages(NonZeroU32::new(2));
        assert!(bounded.allows_page(0));
        assert!(bounded.allows_page(1));
        assert!(!bounded.allows_page(2));
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let req = QueryRequest::new("https://x/q").with_query_timeout(Duration::ZERO);
        assert!(matches!(req.validate(), Err(QueryError::InvalidRequest(_))));
        assert!(QueryRequest::new("  ").validate().is_err());
    }

    #[test]
    fn test_cached_response_round_trips_to_accumulated() {
        let original = QueryResponse::Accumulated(AccumulatedResult {
            events: vec![json!({"message": "a"})],
            statistics: None,
        });
        let restored = QueryResponse::from_cache_value(original.to_cache_value()).unwrap();
        assert_eq!(restored, original);
    }

    #[test]
    fn test_cached_raw_page_keeps_its_body() {
        let page = json!({"events": [], "leql": {"statement": "where(x)"}, "progress": 100});
        let original = QueryResponse::RawPage(page.clone());

        let restored = QueryResponse::from_cache_value(original.to_cache_value()).unwrap();
        assert_eq!(restored, original);
        assert_eq!(restored.to_value(), page);
    }

    #[test]
    fn test_untagged_cache_value_is_rejected() {
        let untagged = json!({"events": [], "statistics": null});
        assert!(QueryResponse::from_cache_value(untagged).is_err());
    }

    #[test]
    fn test_raw_page_exposes_its_events() {
        let raw = QueryResponse::RawPage(json!({"progress": 40, "events": [{"m": 1}]}));
        assert_eq!(raw.events().len(), 1);
        assert!(raw.statistics().is_none());
    }

    #[test]
    fn test_time_range_pairs() {
        let rel = TimeRange::default();
        assert_eq!(rel.query_pairs(), vec![("time_range", "Last 30 days".to_string())]);

        let abs = TimeRange::Absolute { from: 1, to: 2 };
        assert_eq!(
            abs.query_pairs(),
            vec![("from", "1".to_string()), ("to", "2".to_string())]
        );
    }
}

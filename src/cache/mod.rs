//! Result cache used around the poller and by name resolution.
//!
//! The poller never touches the cache; callers decide what to store and for
//! how long.

mod disk;

pub use disk::{CacheStats, DEFAULT_MAX_BYTES, DEFAULT_MAX_ENTRIES, DiskCache};

use std::collections::BTreeMap;
use std::time::Duration;

use serde_json::Value;

pub const QUERY_NAMESPACE: &str = "leql_query";
pub const LOG_LOOKUP_NAMESPACE: &str = "log_lookup";
pub const LOGSET_LOOKUP_NAMESPACE: &str = "logset_lookup";

pub trait Cache {
    fn get(&self, namespace: &str, key: &str) -> Option<Value>;

    fn set(&self, namespace: &str, key: &str, value: &Value, ttl: Duration);
}

pub struct CacheKey;

impl CacheKey {
    /// Canonical key for a query: the fields sorted by name so that the same
    /// parameters always produce the same key regardless of argument order.
    pub fn for_query(kind: &str, fields: &[(&str, String)]) -> String {
        let mut map: BTreeMap<&str, &str> = fields.iter().map(|(k, v)| (*k, v.as_str())).collect();
        map.insert("type", kind);
        serde_json::to_string(&map).unwrap_or_else(|_| format!("{}:{:?}", kind, fields))
    }

    pub fn log_name(name: &str) -> String {
        format!("log_name_to_id_{}", name.to_lowercase())
    }

    pub fn logset_name(name: &str) -> String {
        format!("logset_name_to_id_{}", name.to_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_key_ignores_field_order() {
        let a = CacheKey::for_query(
            "log",
            &[("query", "where(x)".to_string()), ("time_range", "Last 1 day".to_string())],
        );
        let b = CacheKey::for_query(
            "log",
            &[("time_range", "Last 1 day".to_string()), ("query", "where(x)".to_string())],
        );
        assert_eq!(a, b);
    }

    #[test]
    fn test_query_key_distinguishes_page_budget() {
        let a = CacheKey::for_query("log", &[("max_result_pages", "1".to_string())]);
        let b = CacheKey::for_query("log", &[("max_result_pages", "2".to_string())]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_name_keys_are_case_insensitive() {
        assert_eq!(CacheKey::log_name("Auth"), CacheKey::log_name("AUTH"));
        assert_ne!(CacheKey::log_name("Auth"), CacheKey::logset_name("Auth"));
    }
}

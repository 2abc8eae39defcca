use std::collections::BTreeSet;
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use serde_json::Value;

use super::Endpoints;
use crate::cache::{Cache, CacheKey, LOG_LOOKUP_NAMESPACE, LOGSET_LOOKUP_NAMESPACE};
use crate::error::{Error, QueryError, Result};
use crate::http::Transport;
use crate::models::{LogEntry, LogsListing};

static UUID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}$")
        .expect("valid uuid regex")
});

pub fn is_uuid(value: &str) -> bool {
    UUID.is_match(value)
}

pub async fn fetch_logs<T: Transport + ?Sized>(
    transport: &T,
    endpoints: &Endpoints,
) -> Result<Vec<LogEntry>> {
    let response = transport.get(&endpoints.logs_listing()).await?;
    if response.status != 200 {
        return Err(Error::Api {
            status: response.status,
            message: format!("Error fetching logs: {}", response.error_message()),
        });
    }
    let listing: LogsListing = serde_json::from_str(&response.text)?;
    Ok(listing.logs)
}

pub fn match_log_id(name: &str, logs: &[LogEntry]) -> std::result::Result<String, QueryError> {
    let wanted = name.to_lowercase();
    let matches: Vec<&str> = logs
        .iter()
        .filter(|log| log.name.to_lowercase() == wanted)
        .map(|log| log.id.as_str())
        .collect();

    match matches.as_slice() {
        [] => Err(QueryError::LogNotFound(name.to_string())),
        [id] => Ok(id.to_string()),
        _ => Err(QueryError::AmbiguousLog(name.to_string())),
    }
}

/// A logset is listed once under each of its logs, so ids are collapsed
/// before deciding whether the name is ambiguous.
pub fn match_logset_id(name: &str, logs: &[LogEntry]) -> std::result::Result<String, QueryError> {
    let wanted = name.to_lowercase();
    let ids: BTreeSet<&str> = logs
        .iter()
        .flat_map(|log| &log.logsets_info)
        .filter(|logset| logset.name.to_lowercase() == wanted)
        .map(|logset| logset.id.as_str())
        .collect();

    let mut iter = ids.into_iter();
    match (iter.next(), iter.next()) {
        (None, _) => Err(QueryError::LogsetNotFound(name.to_string())),
        (Some(id), None) => Ok(id.to_string()),
        (Some(_), Some(_)) => Err(QueryError::AmbiguousLogset(name.to_string())),
    }
}

/// Turns human-readable log and logset names into ids, remembering each
/// answer in the cache for `ttl`.
pub struct NameResolver<'a, T: Transport + ?Sized> {
    transport: &'a T,
    endpoints: &'a Endpoints,
    cache: Option<&'a dyn Cache>,
    ttl: Duration,
}

impl<'a, T: Transport + ?Sized> NameResolver<'a, T> {
    pub fn new(transport: &'a T, endpoints: &'a Endpoints) -> Self {
        Self {
            transport,
            endpoints,
            cache: None,
            ttl: Duration::ZERO,
        }
    }

    pub fn with_cache(mut self, cache: Option<&'a dyn Cache>, ttl: Duration) -> Self {
        self.cache = cache;
        self.ttl = ttl;
        self
    }

    pub async fn resolve_log(&self, name_or_id: &str) -> Result<String> {
        if is_uuid(name_or_id) {
            return Ok(name_or_id.to_string());
        }
        let key = CacheKey::log_name(name_or_id);
        self.resolve(LOG_LOOKUP_NAMESPACE, &key, |logs| match_log_id(name_or_id, logs))
            .await
    }

    pub async fn resolve_logset(&self, name_or_id: &str) -> Result<String> {
        if is_uuid(name_or_id) {
            return Ok(name_or_id.to_string());
        }
        let key = CacheKey::logset_name(name_or_id);
        self.resolve(LOGSET_LOOKUP_NAMESPACE, &key, |logs| {
            match_logset_id(name_or_id, logs)
        })
        .await
    }

    async fn resolve<F>(&self, namespace: &str, key: &str, find: F) -> Result<String>
    where
        F: FnOnce(&[LogEntry]) -> std::result::Result<String, QueryError>,
    {
        if let Some(cache) = self.cache {
            if let Some(Value::String(id)) = cache.get(namespace, key) {
                tracing::debug!("resolved {} from cache", key);
                return Ok(id);
            }
        }

        let logs = fetch_logs(self.transport, self.endpoints).await?;
        let id = find(&logs)?;

        if let Some(cache) = self.cache {
            cache.set(namespace, key, &Value::String(id.clone()), self.ttl);
        }
        Ok(id)
    }
}

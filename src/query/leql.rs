use std::num::NonZeroU32;
use std::sync::LazyLock;

use regex::Regex;

static LIMIT_CLAUSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)limit\s*\(\s*(\d+)\s*\)").expect("valid limit regex"));

/// The `N` of a `limit(N)` clause, if the query has one.
pub fn parse_limit(query: &str) -> Option<u32> {
    LIMIT_CLAUSE
        .captures(query)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Page budget for a query when the user did not give one: a `limit(N)`
/// clause needs few pages (about five events per page, capped at three),
/// anything else gets the configured default.
pub fn smart_max_pages(query: &str, default_pages: NonZeroU32) -> NonZeroU32 {
    match parse_limit(query) {
        Some(limit) => NonZeroU32::new((limit / 5 + 1).clamp(1, 3)).unwrap_or(NonZeroU32::MIN),
        None => default_pages,
    }
}

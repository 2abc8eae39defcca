/// Base URLs of the two log-search hosts for one region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    log_search: String,
    query: String,
}

impl Endpoints {
    pub fn for_region(region: &str) -> Self {
        Self {
            log_search: format!("https://{}.api.insight.rapid7.com/log_search", region),
            query: format!("https://{}.rest.logs.insight.rapid7.com", region),
        }
    }

    pub fn with_bases(log_search: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            log_search: log_search.into().trim_end_matches('/').to_string(),
            query: query.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn log_search_base(&self) -> &str {
        &self.log_search
    }

    pub fn query_base(&self) -> &str {
        &self.query
    }

    pub fn logs_listing(&self) -> String {
        format!("{}/management/logs", self.log_search)
    }

    pub fn log_query(&self, log_id: &str) -> String {
        format!("{}/query/logs/{}", self.query, log_id)
    }

    pub fn logset_query(&self, logset_id: &str) -> String {
        format!("{}/query/logsets/{}", self.query, logset_id)
    }

    pub fn all_logsets_query(&self) -> String {
        format!("{}/query/logsets", self.query)
    }
}

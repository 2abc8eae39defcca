use serde::{Deserialize, Serialize};

/// Body of the management `logs` listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogsListing {
    #[serde(default)]
    pub logs: Vec<LogEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub logsets_info: Vec<LogsetInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LogsetInfo {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
}

impl LogEntry {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            logsets_info: Vec::new(),
        }
    }

    pub fn with_logset(mut self, id: impl Into<String>, name: impl Into<String>) -> Self {
        self.logsets_info.push(LogsetInfo {
            id: id.into(),
            name: name.into(),
        });
        self
    }

    pub fn logset_names(&self) -> Vec<&str> {
        self.logsets_info
            .iter()
            .map(|ls| ls.name.as_str())
            .filter(|name| !name.is_empty())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_listing_tolerates_missing_logsets() {
        let listing: LogsListing = serde_json::from_value(json!({
            "logs": [
                {"id": "A1", "name": "Auth"},
                {"id": "F1", "name": "Firewall", "logsets_info": [{"id": "S1", "name": "Network"}]}
            ]
        }))
        .unwrap();

        assert_eq!(listing.logs.len(), 2);
        assert!(listing.logs[0].logsets_info.is_empty());
        assert_eq!(listing.logs[1].logset_names(), vec!["Network"]);
    }
}

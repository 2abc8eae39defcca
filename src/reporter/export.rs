use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::QueryResponse;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedQuery {
    pub saved_at: String,
    pub target: String,
    pub query: String,
    pub time_range: String,
    pub result: Value,
}

pub struct JsonExporter;

impl JsonExporter {
    pub fn export(
        path: &Path,
        target: &str,
        query: &str,
        time_range: &str,
        response: &QueryResponse,
    ) -> Result<()> {
        let output = SavedQuery {
            saved_at: Utc::now().to_rfc3339(),
            target: target.to_string(),
            query: query.to_string(),
            time_range: time_range.to_string(),
            result: response.to_value(),
        };

        let json = serde_json::to_string_pretty(&output)?;
        fs::write(path, json).with_context(|| format!("Failed to write to {}", path.display()))?;
        Ok(())
    }
}

use colored::Colorize;
use serde_json::Value;
use tabled::{
    Table, Tabled,
    builder::Builder,
    settings::{Alignment, Modify, Style, object::Rows},
};

use super::stats::{GroupTable, MAX_GROUP_ROWS, global_timeseries};
use super::{format_timestamp, truncate_chars};
use crate::cache::CacheStats;
use crate::models::{LogEntry, LogsetInfo, QueryResponse};

pub const MAX_EVENT_ROWS: usize = 50;

pub struct ConsoleReporter {
    max_chars: usize,
}

#[derive(Tabled)]
struct EventRow {
    #[tabled(rename = "Time")]
    time: String,
    #[tabled(rename = "Raw Log")]
    raw: String,
}

#[derive(Tabled)]
struct LogRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Logsets")]
    logsets: String,
}

#[derive(Tabled)]
struct LogsetRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "ID")]
    id: String,
}

#[derive(Tabled)]
struct StatRow {
    #[tabled(rename = "Stat")]
    stat: String,
    #[tabled(rename = "Value")]
    value: String,
}

fn styled(mut table: Table) -> String {
    table
        .with(Style::rounded())
        .with(Modify::new(Rows::first()).with(Alignment::center()))
        .to_string()
}

impl ConsoleReporter {
    pub fn new(max_chars: usize) -> Self {
        Self { max_chars }
    }

    /// Events first; statistics only when the query returned no events.
    pub fn print_response(&self, title: &str, response: &QueryResponse) {
        let events = response.events();
        let statistics = response.statistics().filter(|s| !is_empty_statistics(s));

        if !events.is_empty() {
            println!("\n{}", title.bold().underline());
            println!("{}", self.events_table(events));
            let hidden = events.len().saturating_sub(MAX_EVENT_ROWS);
            if hidden > 0 {
                let note = format!("... and {} more events (use --output json to see all)", hidden);
                println!("{}", note.dimmed());
            }
            println!("{}", format!("Retrieved {} events", events.len()).dimmed());
        } else if let Some(stats) = statistics {
            self.print_statistics(title, stats);
        } else {
            println!("{}", "No results found".yellow());
        }
    }

    pub fn print_statistics(&self, title: &str, statistics: &Value) {
        if let Some(groups) = GroupTable::from_statistics(statistics) {
            println!("\n{}", format!("Group Results - {}", title).bold().underline());
            println!("{}", groups_table(&groups));
            if groups.overflow() > 0 {
                println!(
                    "{}",
                    format!(
                        "... and {} more groups (use --output json to see all)",
                        groups.overflow()
                    )
                    .dimmed()
                );
            }
            return;
        }

        let pairs = global_timeseries(statistics);
        if pairs.is_empty() {
            println!("{}", "No statistics data to display".yellow());
            return;
        }

        let rows: Vec<StatRow> = pairs
            .into_iter()
            .map(|(stat, value)| StatRow {
                stat: stat.cyan().to_string(),
                value: value.yellow().to_string(),
            })
            .collect();
        println!("\n{}", "Query Statistics".bold().underline());
        println!("{}", styled(Table::new(rows)));
    }

    pub fn events_table(&self, events: &[Value]) -> String {
        let rows: Vec<EventRow> = events
            .iter()
            .take(MAX_EVENT_ROWS)
            .map(|event| {
                let content = match event.get("message") {
                    Some(Value::String(m)) if !m.is_empty() => m.clone(),
                    _ => event.to_string(),
                };
                EventRow {
                    time: format_timestamp(event.get("timestamp")),
                    raw: truncate_chars(&content, self.max_chars),
                }
            })
            .collect();

        styled(Table::new(rows))
    }

    pub fn print_logs(&self, logs: &[LogEntry]) {
        if logs.is_empty() {
            println!("{}", "No logs found".yellow());
            return;
        }

        let rows: Vec<LogRow> = logs
            .iter()
            .map(|log| LogRow {
                name: log.name.cyan().to_string(),
                id: log.id.clone(),
                logsets: log.logset_names().join(", "),
            })
            .collect();

        println!("{}", styled(Table::new(rows)));
        println!("{} logs", logs.len());
    }

    pub fn print_logsets(&self, logsets: &[LogsetInfo]) {
        if logsets.is_empty() {
            println!("{}", "No logsets found".yellow());
            return;
        }

        let rows: Vec<LogsetRow> = logsets
            .iter()
            .map(|ls| LogsetRow {
                name: ls.name.cyan().to_string(),
                id: ls.id.clone(),
            })
            .collect();

        println!("{}", styled(Table::new(rows)));
        println!("{} logsets", logsets.len());
    }

    pub fn print_cache_stats(&self, location: &str, stats: &CacheStats) {
        println!("\n{}", "Cache".bold().underline());
        println!("  {}: {}", "Location".cyan(), location);
        println!("  {}: {}", "Entries".cyan(), stats.entries);
        println!("  {}: {}", "Size".cyan(), format_bytes(stats.bytes));
    }
}

impl Default for ConsoleReporter {
    fn default() -> Self {
        Self::new(super::DEFAULT_MAX_CHARS)
    }
}

fn groups_table(groups: &GroupTable) -> String {
    let mut builder = Builder::default();
    let header = std::iter::once("Group".to_string())
        .chain(groups.metric_keys.iter().map(|k| capitalize(k)));
    builder.push_record(header);

    for row in groups.rows.iter().take(MAX_GROUP_ROWS) {
        let values = groups
            .metric_keys
            .iter()
            .map(|k| format!("{:.0}", row.metric(k)));
        builder.push_record(std::iter::once(row.group.clone()).chain(values));
    }

    styled(builder.build())
}

fn is_empty_statistics(stats: &Value) -> bool {
    match stats {
        Value::Null => true,
        Value::Object(obj) => obj.is_empty(),
        _ => false,
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}

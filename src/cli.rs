use std::num::NonZeroU32;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::models::{DEFAULT_TIME_RANGE, TimeRange};

#[derive(Parser)]
#[command(name = "r7")]
#[command(version, about = "Search Rapid7 InsightIDR logs with LEQL from the command line")]
#[command(propagate_version = true)]
pub struct Cli {
    /// API key (falls back to R7_API_KEY)
    #[arg(long, env = "R7_API_KEY", global = true, hide_env_values = true)]
    pub api_key: Option<String>,

    /// Region override: us, eu, ca, ap, au
    #[arg(long, global = true)]
    pub region: Option<String>,

    /// Path to the config file [default: ~/.rapid7_config.json]
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, env = "R7_LOG_SEARCH_URL", global = true, hide = true)]
    pub log_search_url: Option<String>,

    #[arg(long, env = "R7_QUERY_URL", global = true, hide = true)]
    pub query_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Query and list logs
    #[command(subcommand)]
    Logs(LogsCommand),

    /// View and modify configuration
    #[command(subcommand)]
    Config(ConfigCommand),

    /// Inspect or clear the local result cache
    #[command(subcommand)]
    Cache(CacheCommand),
}

#[derive(Subcommand)]
pub enum LogsCommand {
    /// Run a LEQL query against a single log (name or UUID)
    Query {
        log: String,

        #[arg(default_value = "")]
        query: String,

        #[command(flatten)]
        options: QueryArgs,
    },

    /// Run a LEQL query against a logset (name or UUID)
    QueryLogset {
        logset: String,

        #[arg(default_value = "")]
        query: String,

        #[command(flatten)]
        options: QueryArgs,
    },

    /// Run a LEQL query across every logset in the organization
    QueryAll {
        #[arg(default_value = "")]
        query: String,

        #[command(flatten)]
        options: QueryArgs,
    },

    /// List all logs
    List {
        #[arg(short, long, value_enum)]
        output: Option<OutputFormat>,
    },

    /// List all logsets
    Logsets {
        #[arg(short, long, value_enum)]
        output: Option<OutputFormat>,
    },
}

#[derive(Args, Debug, Clone)]
pub struct QueryArgs {
    /// Relative time range [default: "Last 30 days"]
    #[arg(long, conflicts_with_all = ["from", "to"])]
    pub time_range: Option<String>,

    /// Start of an absolute range, epoch milliseconds
    #[arg(long, requires = "to")]
    pub from: Option<i64>,

    /// End of an absolute range, epoch milliseconds
    #[arg(long, requires = "from")]
    pub to: Option<i64>,

    #[arg(short, long, value_enum)]
    pub output: Option<OutputFormat>,

    /// Print the complete result instead of just the event messages
    #[arg(long)]
    pub full_output: bool,

    /// Result pages to fetch after the query completes (at least 1)
    #[arg(long)]
    pub max_result_pages: Option<NonZeroU32>,

    #[arg(long)]
    pub no_cache: bool,

    /// Characters shown per log line
    #[arg(long)]
    pub max_chars: Option<usize>,

    /// Also write the result to this JSON file
    #[arg(long)]
    pub save: Option<PathBuf>,
}

impl QueryArgs {
    pub fn time_range(&self) -> TimeRange {
        match (self.from, self.to, &self.time_range) {
            (Some(from), Some(to), _) => TimeRange::Absolute { from, to },
            (_, _, Some(range)) => TimeRange::Relative(range.clone()),
            _ => TimeRange::Relative(DEFAULT_TIME_RANGE.to_string()),
        }
    }
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set { key: String, value: String },
    /// Reset configuration to defaults
    Reset,
    /// Show configuration file path
    Path,
}

#[derive(Subcommand)]
pub enum CacheCommand {
    /// Remove every cached entry
    Clear,
    /// Show cache location, entry count and size
    Stats,
    /// Remove expired entries only
    Cleanup,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_query_defaults() {
        let cli = Cli::try_parse_from(["r7", "logs", "query", "Auth"]).unwrap();
        match cli.command {
            Commands::Logs(LogsCommand::Query { log, query, options }) => {
                assert_eq!(log, "Auth");
                assert_eq!(query, "");
                assert_eq!(options.time_range(), TimeRange::default());
                assert!(options.max_result_pages.is_none());
            }
            _ => panic!("expected logs query"),
        }
    }

    #[test]
    fn test_absolute_range() {
        let cli = Cli::try_parse_from([
            "r7", "logs", "query-all", "where(x)", "--from", "1", "--to", "2",
        ])
        .unwrap();
        match cli.command {
            Commands::Logs(LogsCommand::QueryAll { options, .. }) => {
                assert_eq!(options.time_range(), TimeRange::Absolute { from: 1, to: 2 });
            }
            _ => panic!("expected logs query-all"),
        }
    }

    #[test]
    fn test_zero_page_budget_is_rejected() {
        let args = ["r7", "logs", "query", "Auth", "--max-result-pages", "0"];
        let result = Cli::try_parse_from(args);
        assert!(result.is_err());
    }

    #[test]
    fn test_time_range_conflicts_with_absolute_range() {
        let result = Cli::try_parse_from([
            "r7", "logs", "query", "Auth", "--time-range", "Last 1 day", "--from", "1", "--to", "2",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_from_requires_to() {
        assert!(Cli::try_parse_from(["r7", "logs", "query", "Auth", "--from", "1"]).is_err());
    }
}

//! Command handlers. Each returns the process exit code; failures travel as
//! `anyhow::Error` and are mapped to a code by [`exit_code`].

pub mod cache;
pub mod config;
pub mod logs;

use std::path::PathBuf;

use anyhow::Result;

use crate::cache::DiskCache;
use crate::cli::{Cli, Commands};
use crate::config::Config;
use crate::error::Error;
use crate::http::HttpClient;
use crate::query::Endpoints;

pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    /// Failure outside the categories below
    pub const GENERAL_ERROR: i32 = 1;
    /// Configuration, input, or query error
    pub const CONFIG_ERROR: i32 = 2;
    /// API or network error
    pub const NETWORK_ERROR: i32 = 3;
    pub const RATE_LIMITED: i32 = 4;
    pub const AUTH_FAILED: i32 = 5;
}

/// Per-request timeout of every API call.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Everything a command needs that comes from flags, environment, or the
/// config file.
pub struct AppContext {
    pub config: Config,
    pub config_path: PathBuf,
    pub region: String,
    api_key: Option<String>,
    log_search_url: Option<String>,
    query_url: Option<String>,
}

impl AppContext {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let config_path = match &cli.config {
            Some(path) => path.clone(),
            None => Config::default_path()?,
        };
        let config = Config::load(&config_path)?;
        let region = match &cli.region {
            Some(region) => Config::validate_region(region)?,
            None => config.region.clone(),
        };

        Ok(Self {
            config,
            config_path,
            region,
            api_key: cli.api_key.clone(),
            log_search_url: cli.log_search_url.clone(),
            query_url: cli.query_url.clone(),
        })
    }

    pub fn client(&self) -> Result<HttpClient> {
        let key = self.api_key.as_deref().unwrap_or_default();
        if key.trim().is_empty() {
            return Err(Error::Authentication(
                "API key is required; pass --api-key or set R7_API_KEY".to_string(),
            )
            .into());
        }
        Ok(HttpClient::new(key, REQUEST_TIMEOUT_SECS)?)
    }

    pub fn endpoints(&self) -> Endpoints {
        let regional = Endpoints::for_region(&self.region);
        Endpoints::with_bases(
            self.log_search_url.as_deref().unwrap_or(regional.log_search_base()),
            self.query_url.as_deref().unwrap_or(regional.query_base()),
        )
    }

    /// The result cache, or `None` when caching is disabled or the cache
    /// directory is unusable.
    pub fn cache(&self) -> Option<DiskCache> {
        if !self.config.cache_enabled {
            return None;
        }
        match DiskCache::open_default() {
            Ok(cache) => Some(cache),
            Err(e) => {
                tracing::warn!("cache disabled: {}", e);
                None
            }
        }
    }
}

pub async fn run(ctx: &AppContext, command: &Commands) -> Result<i32> {
    match command {
        Commands::Logs(cmd) => logs::run(ctx, cmd).await,
        Commands::Config(cmd) => config::run(ctx, cmd),
        Commands::Cache(cmd) => cache::run(ctx, cmd),
    }
}

pub fn exit_code(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<Error>() {
        Some(Error::Authentication(_)) => exit_codes::AUTH_FAILED,
        Some(Error::RateLimited { .. }) => exit_codes::RATE_LIMITED,
        Some(Error::Api { .. } | Error::Transport(_) | Error::Poll { .. } | Error::Json(_)) => {
            exit_codes::NETWORK_ERROR
        }
        Some(Error::Query(_) | Error::Config(_)) => exit_codes::CONFIG_ERROR,
        Some(Error::Io(_)) | None => exit_codes::GENERAL_ERROR,
    }
}

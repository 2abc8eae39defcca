use anyhow::Result;
use colored::Colorize;

use super::{AppContext, exit_codes};
use crate::cache::DiskCache;
use crate::cli::CacheCommand;
use crate::reporter::ConsoleReporter;

pub fn run(ctx: &AppContext, command: &CacheCommand) -> Result<i32> {
    let cache = DiskCache::open_default()?;

    match command {
        CacheCommand::Clear => {
            let removed = cache.clear()?;
            println!("{} {} cached entries", "✓ Removed".green(), removed);
        }
        CacheCommand::Stats => {
            let stats = cache.stats()?;
            let location = cache.root().display().to_string();
            ConsoleReporter::new(ctx.config.max_chars).print_cache_stats(&location, &stats);
            if !ctx.config.cache_enabled {
                println!("{}", "Caching is disabled in the configuration".yellow());
            }
        }
        CacheCommand::Cleanup => {
            let removed = cache.cleanup_expired()?;
            println!("{} {} expired entries", "✓ Removed".green(), removed);
        }
    }

    Ok(exit_codes::SUCCESS)
}

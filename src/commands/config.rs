use anyhow::{Context, Result};
use colored::Colorize;

use super::{AppContext, exit_codes};
use crate::cli::ConfigCommand;
use crate::config::Config;

pub fn run(ctx: &AppContext, command: &ConfigCommand) -> Result<i32> {
    match command {
        ConfigCommand::Show => show_config(ctx),
        ConfigCommand::Set { key, value } => set_config(ctx, key, value),
        ConfigCommand::Reset => reset_config(ctx),
        ConfigCommand::Path => {
            println!("{}", ctx.config_path.display());
            Ok(exit_codes::SUCCESS)
        }
    }
}

fn show_config(ctx: &AppContext) -> Result<i32> {
    println!("{}", "Current Configuration".bold().underline());
    let values = serde_json::to_value(&ctx.config)?;
    if let Some(map) = values.as_object() {
        for (key, value) in map {
            println!("  {}: {}", key.cyan(), value);
        }
    }
    if ctx.region != ctx.config.region {
        println!("  {}: {} (from --region)", "effective region".cyan(), ctx.region);
    }
    Ok(exit_codes::SUCCESS)
}

fn set_config(ctx: &AppContext, key: &str, value: &str) -> Result<i32> {
    let mut config = ctx.config.clone();
    config.set(key, value)?;
    config
        .save(&ctx.config_path)
        .with_context(|| format!("Failed to save {}", ctx.config_path.display()))?;
    println!("{} {} = {}", "✓ Set".green(), key, value);
    Ok(exit_codes::SUCCESS)
}

fn reset_config(ctx: &AppContext) -> Result<i32> {
    Config::default().save(&ctx.config_path)?;
    println!("{}", "✓ Configuration reset to defaults".green());
    Ok(exit_codes::SUCCESS)
}

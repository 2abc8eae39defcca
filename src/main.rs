use clap::Parser;
use colored::Colorize;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use rapid7_cli::cli::Cli;
use rapid7_cli::commands::{self, AppContext};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let ctx = AppContext::from_cli(&cli);

    init_tracing(cli.verbose || ctx.as_ref().is_ok_and(|c| c.config.verbose));

    let result = match ctx {
        Ok(ctx) => commands::run(&ctx, &cli.command).await,
        Err(e) => Err(e),
    };

    let exit_code = match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            commands::exit_code(&e)
        }
    };

    std::process::exit(exit_code);
}

/// Logs go to stderr so JSON on stdout stays parseable. `RUST_LOG` wins
/// over `--verbose`.
fn init_tracing(verbose: bool) {
    let default = if verbose { "warn,rapid7_cli=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).without_time().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

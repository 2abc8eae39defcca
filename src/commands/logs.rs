use anyhow::Result;
use colored::Colorize;

use super::{AppContext, exit_codes};
use crate::cache::Cache;
use crate::cli::{LogsCommand, OutputFormat, QueryArgs};
use crate::query::{LogSearch, SearchOptions, SearchOutcome, leql, progress_sink};
use crate::reporter::{ConsoleReporter, JsonExporter, event_messages};

enum Target<'a> {
    Log(&'a str),
    Logset(&'a str),
    AllLogsets,
}

impl Target<'_> {
    fn label(&self) -> String {
        match self {
            Target::Log(name) => name.to_string(),
            Target::Logset(name) => format!("logset {}", name),
            Target::AllLogsets => "all logsets".to_string(),
        }
    }
}

pub async fn run(ctx: &AppContext, command: &LogsCommand) -> Result<i32> {
    match command {
        LogsCommand::Query { log, query, options } => {
            run_query(ctx, Target::Log(log), query, options).await
        }
        LogsCommand::QueryLogset {
            logset,
            query,
            options,
        } => run_query(ctx, Target::Logset(logset), query, options).await,
        LogsCommand::QueryAll { query, options } => {
            run_query(ctx, Target::AllLogsets, query, options).await
        }
        LogsCommand::List { output } => list_logs(ctx, wants_json(ctx, *output)).await,
        LogsCommand::Logsets { output } => list_logsets(ctx, wants_json(ctx, *output)).await,
    }
}

fn wants_json(ctx: &AppContext, output: Option<OutputFormat>) -> bool {
    match output {
        Some(format) => format == OutputFormat::Json,
        None => ctx.config.prefers_json(),
    }
}

async fn run_query(
    ctx: &AppContext,
    target: Target<'_>,
    query: &str,
    args: &QueryArgs,
) -> Result<i32> {
    let use_json = wants_json(ctx, args.output);
    let client = ctx.client()?;
    let endpoints = ctx.endpoints();

    let max_result_pages = match args.max_result_pages {
        Some(pages) => pages,
        None => {
            let pages = leql::smart_max_pages(query, ctx.config.max_result_pages());
            if let Some(limit) = leql::parse_limit(query) {
                if !use_json {
                    let note = format!("Detected LEQL limit({}), using {} pages max", limit, pages);
                    println!("{}", note.dimmed());
                }
            }
            pages
        }
    };

    let options = SearchOptions {
        time_range: args.time_range(),
        max_result_pages: Some(max_result_pages),
        query_timeout: ctx.config.query_timeout(),
        use_cache: !args.no_cache,
    };

    let cache = ctx.cache();
    let search = LogSearch::new(&client, &endpoints)
        .with_cache(cache.as_ref().map(|c| c as &dyn Cache), ctx.config.cache_ttl());

    let outcome = {
        let progress = progress_sink(!use_json);
        let progress = progress.as_ref();
        match &target {
            Target::Log(log) => search.query_log(log, query, &options, progress).await?,
            Target::Logset(logset) => search.query_logset(logset, query, &options, progress).await?,
            Target::AllLogsets => search.query_all_logsets(query, &options, progress).await?,
        }
    };

    if let Some(path) = &args.save {
        JsonExporter::export(
            path,
            &target.label(),
            query,
            &options.time_range.to_string(),
            &outcome.response,
        )?;
        if !use_json {
            println!("{} {}", "Saved results to".green(), path.display());
        }
    }

    if use_json {
        print_json(&outcome, args.full_output)?;
    } else {
        let max_chars = args.max_chars.unwrap_or(ctx.config.max_chars);
        let title = format!("Query Results: {}", target.label());
        ConsoleReporter::new(max_chars).print_response(&title, &outcome.response);
        if outcome.from_cache {
            println!("{}", "(served from cache; use --no-cache to refresh)".dimmed());
        }
    }

    Ok(exit_codes::SUCCESS)
}

fn print_json(outcome: &SearchOutcome, full_output: bool) -> Result<()> {
    let rendered = if full_output {
        serde_json::to_string_pretty(&outcome.response.to_value())?
    } else {
        serde_json::to_string(&event_messages(outcome.response.events()))?
    };
    println!("{}", rendered);
    Ok(())
}

async fn list_logs(ctx: &AppContext, use_json: bool) -> Result<i32> {
    let client = ctx.client()?;
    let endpoints = ctx.endpoints();
    let logs = LogSearch::new(&client, &endpoints).list_logs().await?;

    if use_json {
        println!("{}", serde_json::to_string_pretty(&logs)?);
    } else {
        ConsoleReporter::new(ctx.config.max_chars).print_logs(&logs);
    }
    Ok(exit_codes::SUCCESS)
}

async fn list_logsets(ctx: &AppContext, use_json: bool) -> Result<i32> {
    let client = ctx.client()?;
    let endpoints = ctx.endpoints();
    let logsets = LogSearch::new(&client, &endpoints).list_logsets().await?;

    if use_json {
        println!("{}", serde_json::to_string_pretty(&logsets)?);
    } else {
        ConsoleReporter::new(ctx.config.max_chars).print_logsets(&logsets);
    }
    Ok(exit_codes::SUCCESS)
}

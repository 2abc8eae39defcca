use std::time::Duration;

use serde_json::Value;
use tokio::time::{Instant, sleep};

use super::ProgressSink;
use crate::error::{Error, PollStage, Result};
use crate::http::Transport;
use crate::models::{AccumulatedResult, QueryRequest, QueryResponse};

/// Pause between polls while the server reports the job as still running.
pub const PROCESSING_POLL_INTERVAL: Duration = Duration::from_secs(2);
/// Pause before each result page fetch.
pub const RESULT_PAGE_INTERVAL: Duration = Duration::from_secs(1);

/// How the waiting phase ended.
enum Completion {
    Complete(Value),
    TimedOut(Option<Value>),
}

/// Why pagination stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PaginationEnd {
    NoMoreLinks,
    BudgetExhausted,
}

/// Drives one asynchronous log query to completion: waits for the job,
/// then follows the server's `links` chain collecting events and
/// statistics.
///
/// The same state machine serves interactive and quiet callers; only the
/// [`ProgressSink`] differs.
pub struct QueryPoller<'a, T: Transport + ?Sized> {
    transport: &'a T,
}

impl<'a, T: Transport + ?Sized> QueryPoller<'a, T> {
    pub fn new(transport: &'a T) -> Self {
        Self { transport }
    }

    /// Any status other than 200/202 aborts the call and drops what was
    /// gathered so far. Running past `query_timeout` while waiting does not
    /// fail; the call returns with whatever it has.
    pub async fn poll(
        &self,
        request: &QueryRequest,
        progress: &dyn ProgressSink,
    ) -> Result<QueryResponse> {
        request.validate()?;
        let start = Instant::now();
        let mut accumulated = AccumulatedResult::default();

        progress.update("Waiting for query to complete...");

        let last_page = match self.wait_for_completion(request, start, progress).await? {
            Completion::Complete(page) => {
                accumulated.merge_page(&page);
                let (end, pages, last) = self
                    .paginate(page, request, &mut accumulated, progress)
                    .await?;

                let count = accumulated.events.len();
                match end {
                    PaginationEnd::BudgetExhausted => progress.finish(&format!(
                        "Retrieved {} result pages ({} events)",
                        pages, count
                    )),
                    PaginationEnd::NoMoreLinks => {
                        progress.finish(&format!("Query completed! ({} events)", count))
                    }
                }
                tracing::info!(
                    "query finished: {} events across {} result pages in {:.1}s",
                    count,
                    pages,
                    start.elapsed().as_secs_f64()
                );
                Some(last)
            }
            Completion::TimedOut(last) => {
                let secs = request.query_timeout.as_secs();
                progress.finish(&format!("Query timeout after {}s", secs));
                tracing::warn!("query did not complete within {}s", secs);
                last
            }
        };

        Ok(match last_page {
            _ if accumulated.is_populated() => QueryResponse::Accumulated(accumulated),
            Some(page) => QueryResponse::RawPage(page),
            None => QueryResponse::Accumulated(accumulated),
        })
    }

    async fn wait_for_completion(
        &self,
        request: &QueryRequest,
        start: Instant,
        progress: &dyn ProgressSink,
    ) -> Result<Completion> {
        // The server's own link keeps the time anchoring stable across polls,
        // so the URL is rebound from every response.
        let mut poll_url = request.url.clone();
        let mut last_page = None;

        loop {
            if start.elapsed() > request.query_timeout {
                return Ok(Completion::TimedOut(last_page));
            }

            let (status, page) = self.fetch(&poll_url, PollStage::Polling).await?;
            tracing::debug!("polled {} -> {}: {}", poll_url, status, page);

            if let Some(next) = first_link(&page) {
                poll_url = next.to_string();
            }

            let job_progress = page.get("progress").and_then(Value::as_f64).unwrap_or(100.0);
            if job_progress < 100.0 && status == 202 {
                progress.update(&format!("Query processing... {}%", job_progress.floor()));
                last_page = Some(page);
                sleep(PROCESSING_POLL_INTERVAL).await;
                continue;
            }

            return Ok(Completion::Complete(page));
        }
    }

    async fn paginate(
        &self,
        mut page: Value,
        request: &QueryRequest,
        accumulated: &mut AccumulatedResult,
        progress: &dyn ProgressSink,
    ) -> Result<(PaginationEnd, u32, Value)> {
        let mut pages = 0u32;

        while let Some(next) = first_link(&page).map(str::to_string) {
            if !request.allows_page(pages) {
                return Ok((PaginationEnd::BudgetExhausted, pages, page));
            }

            pages += 1;
            progress.update(&format!(
                "Fetching results page {}... ({} events)",
                pages,
                accumulated.events.len()
            ));
            sleep(RESULT_PAGE_INTERVAL).await;

            let (_, next_page) = self.fetch(&next, PollStage::Pagination).await?;
            accumulated.merge_page(&next_page);
            page = next_page;
        }

        Ok((PaginationEnd::NoMoreLinks, pages, page))
    }

    async fn fetch(&self, url: &str, stage: PollStage) -> Result<(u16, Value)> {
        let response = self.transport.get(url).await?;
        if !response.is_query_status() {
            return Err(Error::Poll {
                stage,
                status: response.status,
                body: response.text,
            });
        }
        Ok((response.status, response.json()?))
    }
}

fn first_link(page: &Value) -> Option<&str> {
    page.get("links")
        .and_then(Value::as_array)
        .and_then(|links| links.first())
        .and_then(|link| link.get("href"))
        .and_then(Value::as_str)
}

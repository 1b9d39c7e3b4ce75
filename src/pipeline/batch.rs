//! Batch runner for analyzing many URLs concurrently
//!
//! This module handles:
//! - Global concurrency limiting via a semaphore
//! - Collecting results back into request order
//! - Cancelling every in-flight analysis at once

use crate::pipeline::coordinator::Analyzer;
use crate::pipeline::result::{AnalysisRequest, AnalysisResult};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// Runs independent analyses with a bound on how many are in flight
///
/// Each analysis holds a semaphore permit for its whole duration, so at
/// most `max_concurrent` URLs are being fetched or decoded at any time.
pub struct BatchRunner {
    analyzer: Analyzer,
    semaphore: Arc<Semaphore>,
    cancel: CancellationToken,
}

impl BatchRunner {
    /// Creates a runner; a zero limit is raised to one
    pub fn new(analyzer: Analyzer, max_concurrent: usize) -> Self {
        Self {
            analyzer,
            semaphore: Arc::new(Semaphore::new(max_concurrent.max(1))),
            cancel: CancellationToken::new(),
        }
    }

    /// Token that cancels every analysis started by this runner
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Analyzes every request, returning results in request order
    pub async fn run(&self, requests: Vec<AnalysisRequest>) -> Vec<AnalysisResult> {
        let mut slots: Vec<Option<AnalysisResult>> = vec![None; requests.len()];
        let mut tasks = JoinSet::new();

        for (index, request) in requests.iter().cloned().enumerate() {
            let analyzer = self.analyzer.clone();
            let semaphore = Arc::clone(&self.semaphore);
            let cancel = self.cancel.clone();

            tasks.spawn(async move {
                // The semaphore is never closed
                let _permit = semaphore.acquire_owned().await.ok();
                (index, analyzer.analyze_url_with_cancel(request, &cancel).await)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, result)) => slots[index] = Some(result),
                Err(e) => tracing::warn!("Analysis task failed: {}", e),
            }
        }

        let succeeded = slots.iter().flatten().filter(|r| r.is_success()).count();
        tracing::info!(
            "Batch complete: {}/{} analyses fetched successfully",
            succeeded,
            requests.len()
        );

        slots
            .into_iter()
            .zip(requests.iter())
            .map(|(slot, request)| {
                slot.unwrap_or_else(|| {
                    AnalysisResult::new(request).failed("analysis task failed")
                })
            })
            .collect()
    }
}

//! Fan-out of independent analyses
//!
//! Runs the same analysis N times concurrently (useful with non-zero
//! temperature to compare valuations). Results are collected in completion
//! order, each tagged with the index of the request that produced it.

use crate::document::Document;
use crate::error::{Result, ValuationError};
use crate::pipeline::ValuationPipeline;
use crate::result::ValuationResult;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// One completed analysis
#[derive(Debug)]
pub struct Sample {
    /// Request index, `0..n`
    pub index: usize,
    pub outcome: Result<ValuationResult>,
}

/// Run `n` analyses of the same documents, at most `max_concurrency` at once
///
/// A failing sample does not affect the others. When `shutdown` resolves,
/// every outstanding call is aborted and `Cancelled` is returned.
pub async fn sample<F>(
    pipeline: Arc<ValuationPipeline>,
    documents: Arc<[Document]>,
    n: usize,
    max_concurrency: usize,
    shutdown: F,
) -> Result<Vec<Sample>>
where
    F: Future<Output = ()>,
{
    if n == 0 {
        return Err(ValuationError::Configuration(
            "sample count must be at least 1".to_string(),
        ));
    }
    if documents.is_empty() {
        return Err(ValuationError::EmptyInput);
    }

    let semaphore = Arc::new(Semaphore::new(max_concurrency.max(1)));
    let mut set = JoinSet::new();
    let mut task_index = HashMap::with_capacity(n);

    info!(samples = n, max_concurrency, "Starting sampled valuation");

    for index in 0..n {
        let pipeline = Arc::clone(&pipeline);
        let documents = Arc::clone(&documents);
        let semaphore = Arc::clone(&semaphore);

        let handle = set.spawn(async move {
            let outcome = match semaphore.acquire_owned().await {
                Ok(_permit) => pipeline.analyze(&documents).await,
                Err(_) => Err(ValuationError::Cancelled),
            };
            (index, outcome)
        });
        task_index.insert(handle.id(), index);
    }

    tokio::pin!(shutdown);
    let mut samples = Vec::with_capacity(n);

    loop {
        tokio::select! {
            biased;

            () = &mut shutdown => {
                warn!(completed = samples.len(), outstanding = set.len(), "Sampling cancelled");
                set.abort_all();
                while set.join_next().await.is_some() {}
                return Err(ValuationError::Cancelled);
            }

            joined = set.join_next() => match joined {
                Some(Ok((index, outcome))) => {
                    debug!(index, ok = outcome.is_ok(), "Sample finished");
                    samples.push(Sample { index, outcome });
                }
                Some(Err(e)) => {
                    let index = task_index.get(&e.id()).copied().unwrap_or(usize::MAX);
                    warn!(index, "Sample task failed: {}", e);
                    samples.push(Sample {
                        index,
                        outcome: Err(ValuationError::TaskFailed(e.to_string())),
                    });
                }
                None => break,
            },
        }
    }

    Ok(samples)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condense::CondenseConfig;
    use crate::config::ValuationConfig;
    use async_trait::async_trait;
    use finagent_llm::{
        CompletionRequest, CompletionResponse, LLMError, LLMProvider, Message, StopReason,
        TokenUsage,
    };
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Answers call `k` after a delay that shrinks with `k`, so later calls
    /// finish first; fails every third call
    struct CountingProvider {
        calls: AtomicUsize,
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    impl CountingProvider {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                in_flight: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl LLMProvider for CountingProvider {
        async fn complete(
            &self,
            _request: CompletionRequest,
        ) -> finagent_llm::Result<CompletionResponse> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);

            tokio::time::sleep(Duration::from_millis(50 * (10 - call as u64))).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if call % 3 == 2 {
                return Err(LLMError::RequestFailed("boom".to_string()));
            }
            Ok(CompletionResponse {
                message: Message::assistant(format!("{{\"sample\": {call}}}")),
                stop_reason: StopReason::EndTurn,
                usage: TokenUsage::default(),
                reasoning: None,
            })
        }

        fn name(&self) -> &str {
            "counting"
        }
    }

    struct HangingProvider;

    #[async_trait]
    impl LLMProvider for HangingProvider {
        async fn complete(
            &self,
            _request: CompletionRequest,
        ) -> finagent_llm::Result<CompletionResponse> {
            std::future::pending().await
        }

        fn name(&self) -> &str {
            "hanging"
        }
    }

    fn pipeline(provider: Arc<dyn LLMProvider>) -> Arc<ValuationPipeline> {
        let config = ValuationConfig::builder()
            .condense(CondenseConfig::off())
            .request_timeout(Duration::from_secs(600))
            .build()
            .unwrap();
        Arc::new(ValuationPipeline::with_provider(provider, config).unwrap())
    }

    fn documents() -> Arc<[Document]> {
        vec![Document::new("Revenue: $10M", "acme.txt")].into()
    }

    #[tokio::test(start_paused = true)]
    async fn test_all_samples_tagged() {
        let provider = Arc::new(CountingProvider::new());
        let samples = sample(
            pipeline(provider.clone()),
            documents(),
            6,
            3,
            std::future::pending(),
        )
        .await
        .unwrap();

        assert_eq!(samples.len(), 6);
        let mut indices: Vec<usize> = samples.iter().map(|s| s.index).collect();
        indices.sort_unstable();
        assert_eq!(indices, vec![0, 1, 2, 3, 4, 5]);

        // Failures stay local to their sample
        let failures = samples.iter().filter(|s| s.outcome.is_err()).count();
        assert_eq!(failures, 2);

        assert!(provider.peak.load(Ordering::SeqCst) <= 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_completion_order() {
        let provider = Arc::new(CountingProvider::new());
        let samples = sample(pipeline(provider), documents(), 2, 2, std::future::pending())
            .await
            .unwrap();

        // The second call sleeps less, so it completes first
        assert_eq!(samples[0].index, 1);
        assert_eq!(samples[1].index, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_cancels() {
        let shutdown = tokio::time::sleep(Duration::from_secs(1));
        let result = sample(pipeline(Arc::new(HangingProvider)), documents(), 4, 2, shutdown).await;
        assert!(matches!(result, Err(ValuationError::Cancelled)));
    }

    #[tokio::test]
    async fn test_zero_samples() {
        let result = sample(
            pipeline(Arc::new(HangingProvider)),
            documents(),
            0,
            1,
            std::future::pending(),
        )
        .await;
        assert!(matches!(result, Err(ValuationError::Configuration(_))));
    }
}

use futures::future::join_all;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::{QUERY_MAX_TOKENS, QUERY_TEMPERATURE};
use crate::error::AnalysisError;
use crate::llm::generate_llm_response;
use crate::progress::{ProgressEvent, ProgressTracker, QueryStatus};
use crate::types::{Category, ModelResponse};
use crate::{LLMClient, LLMParams, TARGET_PIPELINE};

/// Fan one prompt out to every source concurrently and join on all of them.
///
/// Failures never cancel sibling queries: a failed source comes back as a
/// `ModelResponse` with `error` set and `content` empty. Each source gets a
/// `Requesting` event before its call starts and exactly one terminal event
/// when it finishes.
pub async fn run_queries(
    client: &LLMClient,
    prompt: &str,
    category: Category,
    source_ids: &[String],
    tracker: &ProgressTracker,
) -> Vec<ModelResponse> {
    let queries = source_ids.iter().map(|source_id| {
        let params = LLMParams {
            llm_client: client.clone(),
            model: source_id.clone(),
            temperature: QUERY_TEMPERATURE,
            max_tokens: QUERY_MAX_TOKENS,
        };

        async move {
            tracker.record(ProgressEvent::requesting(source_id, category));
            let started = Instant::now();

            match generate_llm_response(prompt, &params).await {
                Ok(content) => {
                    let elapsed = round_elapsed(started.elapsed().as_secs_f64());
                    debug!(
                        target: TARGET_PIPELINE,
                        "{} answered {} query in {:.2}s", source_id, category, elapsed
                    );
                    tracker.record(ProgressEvent::terminal(
                        source_id,
                        category,
                        QueryStatus::Success,
                        elapsed,
                    ));
                    ModelResponse {
                        source_id: source_id.clone(),
                        category,
                        content: Some(content),
                        error: None,
                        elapsed_seconds: elapsed,
                    }
                }
                Err(e) => {
                    let elapsed = round_elapsed(started.elapsed().as_secs_f64());
                    warn!(
                        target: TARGET_PIPELINE,
                        "{} failed {} query after {:.2}s: {}", source_id, category, elapsed, e
                    );
                    tracker.record(ProgressEvent::terminal(
                        source_id,
                        category,
                        QueryStatus::Error,
                        elapsed,
                    ));
                    ModelResponse {
                        source_id: source_id.clone(),
                        category,
                        content: None,
                        error: Some(e.to_string()),
                        elapsed_seconds: elapsed,
                    }
                }
            }
        }
    });

    let responses = join_all(queries).await;

    let failures = responses.iter().filter(|r| r.error.is_some()).count();
    info!(
        target: TARGET_PIPELINE,
        "{} fan-out complete: {}/{} sources succeeded",
        category,
        responses.len() - failures,
        responses.len()
    );

    responses
}

/// Escalate to a total failure only when every response in the batch failed,
/// which usually means a bad credential rather than flaky endpoints.
pub fn ensure_partial_success(responses: &[ModelResponse]) -> Result<(), AnalysisError> {
    if !responses.is_empty() && responses.iter().all(|r| r.error.is_some()) {
        return Err(AnalysisError::TotalFailure {
            attempted: responses.len(),
        });
    }
    Ok(())
}

/// Wall-clock seconds at two-decimal precision, as reported to progress
/// observers and retained as per-source latency.
fn round_elapsed(seconds: f64) -> f64 {
    (seconds * 100.0).round() / 100.0
}

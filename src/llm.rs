use anyhow::{anyhow, Result};
use async_openai::types::{
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
};
use ollama_rs::generation::completion::request::GenerationRequest;
use ollama_rs::generation::options::GenerationOptions;
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tracing::{debug, warn};

use crate::{LLMClient, LLMParams, TARGET_LLM_REQUEST};

const MAX_RETRIES: usize = 3;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Send one prompt to one model and return the raw text of its reply.
///
/// Retries transient failures with exponential backoff; a timed-out call is
/// retried like any other failure. The error from the final attempt is
/// returned so the caller can record it per source.
pub async fn generate_llm_response(prompt: &str, params: &LLMParams) -> Result<String> {
    let mut backoff = 2;
    let mut last_error = anyhow!("no response generated");

    debug!(
        target: TARGET_LLM_REQUEST,
        "Requesting completion from {} ({} prompt chars)",
        params.model,
        prompt.len()
    );

    for retry_count in 0..MAX_RETRIES {
        let attempt = timeout(REQUEST_TIMEOUT, request_completion(prompt, params)).await;

        match attempt {
            Ok(Ok(response)) if !response.trim().is_empty() => {
                debug!(
                    target: TARGET_LLM_REQUEST,
                    "Received {} chars from {}",
                    response.len(),
                    params.model
                );
                return Ok(response);
            }
            Ok(Ok(_)) => {
                last_error = anyhow!("empty response from {}", params.model);
                warn!(target: TARGET_LLM_REQUEST, "Empty response from {}", params.model);
            }
            Ok(Err(e)) => {
                warn!(
                    target: TARGET_LLM_REQUEST,
                    "Error from {}: {} (attempt {}/{})",
                    params.model, e, retry_count + 1, MAX_RETRIES
                );
                last_error = e;
            }
            Err(_) => {
                warn!(
                    target: TARGET_LLM_REQUEST,
                    "Request to {} timed out after {}s (attempt {}/{})",
                    params.model,
                    REQUEST_TIMEOUT.as_secs(),
                    retry_count + 1,
                    MAX_RETRIES
                );
                last_error = anyhow!("request to {} timed out", params.model);
            }
        }

        if retry_count < MAX_RETRIES - 1 {
            sleep(Duration::from_secs(backoff)).await;
            backoff *= 2;
        }
    }

    Err(last_error)
}

async fn request_completion(prompt: &str, params: &LLMParams) -> Result<String> {
    match &params.llm_client {
        LLMClient::Ollama(ollama) => {
            let mut request = GenerationRequest::new(params.model.clone(), prompt.to_string());
            request.options = Some(
                GenerationOptions::default()
                    .temperature(params.temperature)
                    .num_predict(params.max_tokens as i32),
            );

            let response = ollama
                .generate(request)
                .await
                .map_err(|e| anyhow!("ollama error: {}", e))?;
            Ok(response.response)
        }
        LLMClient::OpenAI(client) => {
            let request = CreateChatCompletionRequestArgs::default()
                .model(&params.model)
                .messages([ChatCompletionRequestUserMessageArgs::default()
                    .content(prompt)
                    .build()?
                    .into()])
                .temperature(params.temperature)
                .max_tokens(params.max_tokens)
                .build()?;

            let response = client.chat().create(request).await?;
            response
                .choices
                .first()
                .and_then(|choice| choice.message.content.clone())
                .ok_or_else(|| {
                    anyhow!("missing expected content field from {}", params.model)
                })
        }
    }
}

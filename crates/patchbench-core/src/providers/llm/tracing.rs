use crate::model::LlmResponse;
use crate::providers::llm::LlmClient;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info_span, Instrument};

/// Wraps a client in a `gen_ai.client.request` span carrying model, token
/// usage and error fields.
pub struct TracingLlmClient {
    inner: Arc<dyn LlmClient>,
}

impl TracingLlmClient {
    pub fn new(inner: Arc<dyn LlmClient>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl LlmClient for TracingLlmClient {
    async fn complete(&self, model: &str, prompt: &str) -> anyhow::Result<LlmResponse> {
        let span = info_span!(
            "gen_ai.client.request",
            "patchbench.provider" = self.inner.provider_name(),
            "gen_ai.request.model" = model,
            "gen_ai.prompt.bytes" = prompt.len() as u64,
            "gen_ai.response.model" = tracing::field::Empty,
            "gen_ai.usage.total_tokens" = tracing::field::Empty,
            "duration_ms" = tracing::field::Empty,
            "error" = tracing::field::Empty,
            "error.message" = tracing::field::Empty
        );

        async move {
            let start = std::time::Instant::now();
            let result = self.inner.complete(model, prompt).await;

            let span = tracing::Span::current();
            span.record("duration_ms", start.elapsed().as_millis() as u64);
            match &result {
                Ok(resp) => {
                    span.record("gen_ai.response.model", resp.model.as_str());
                    span.record("gen_ai.usage.total_tokens", resp.total_tokens());
                }
                Err(e) => {
                    span.record("error", true);
                    span.record("error.message", e.to_string().as_str());
                }
            }
            result
        }
        .instrument(span)
        .await
    }

    fn provider_name(&self) -> &'static str {
        self.inner.provider_name()
    }
}

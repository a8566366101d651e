use super::LlmClient;
use crate::model::{LlmResponse, TokenUsage};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

const DEFAULT_RESPONSE: &str = "def noop(self):\n    return None";

/// Offline client. Returns scripted replies in order, then the fixed response.
#[derive(Debug, Default)]
pub struct FakeClient {
    fixed_response: Option<String>,
    script: Mutex<VecDeque<Result<(String, u64), String>>>,
}

impl FakeClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_response(mut self, response: String) -> Self {
        self.fixed_response = Some(response);
        self
    }

    /// Queue a successful reply reporting `total_tokens` of usage.
    pub fn then_reply(self, text: impl Into<String>, total_tokens: u64) -> Self {
        self.push(Ok((text.into(), total_tokens)))
    }

    /// Queue a failed call.
    pub fn then_fail(self, message: impl Into<String>) -> Self {
        self.push(Err(message.into()))
    }

    fn push(mut self, item: Result<(String, u64), String>) -> Self {
        self.script
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(item);
        self
    }
}

#[async_trait]
impl LlmClient for FakeClient {
    async fn complete(&self, model: &str, _prompt: &str) -> anyhow::Result<LlmResponse> {
        let next = self
            .script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        let (text, total_tokens) = match next {
            Some(Ok(reply)) => reply,
            Some(Err(message)) => anyhow::bail!(message),
            None => (
                self.fixed_response
                    .clone()
                    .unwrap_or_else(|| DEFAULT_RESPONSE.to_string()),
                0,
            ),
        };

        Ok(LlmResponse {
            text,
            provider: "fake".to_string(),
            model: model.to_string(),
            usage: Some(TokenUsage {
                total_tokens,
                ..TokenUsage::default()
            }),
        })
    }

    fn provider_name(&self) -> &'static str {
        "fake"
    }
}

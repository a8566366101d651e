use super::LlmClient;
use crate::errors::BenchError;
use crate::model::{LlmResponse, TokenUsage};
use async_trait::async_trait;
use serde_json::json;

/// Client for OpenAI-compatible chat completion endpoints (OpenAI, Groq, ...).
pub struct OpenAIClient {
    pub base_url: String,
    pub api_key: String,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    pub client: reqwest::Client,
}

impl OpenAIClient {
    pub fn new(
        base_url: String,
        api_key: String,
        temperature: f32,
        max_tokens: Option<u32>,
    ) -> Self {
        Self {
            base_url,
            api_key,
            temperature,
            max_tokens,
            client: reqwest::Client::new(),
        }
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }

    fn request_body(&self, model: &str, prompt: &str) -> serde_json::Value {
        let mut body = json!({
            "model": model,
            "messages": [{ "role": "user", "content": prompt }],
            "temperature": self.temperature,
        });
        if let Some(max) = self.max_tokens {
            body["max_tokens"] = json!(max);
        }
        body
    }
}

/// Pull `choices[0].message.content` and `usage` out of a chat completion.
pub(crate) fn parse_completion(
    json: &serde_json::Value,
    model: &str,
) -> Result<LlmResponse, BenchError> {
    let text = json
        .pointer("/choices/0/message/content")
        .and_then(|v| v.as_str())
        .ok_or_else(|| BenchError::provider(None, "chat API response missing content"))?
        .to_string();

    let usage = json.get("usage").map(|u| {
        let field = |k: &str| u.get(k).and_then(|v| v.as_u64()).unwrap_or(0);
        TokenUsage {
            prompt_tokens: field("prompt_tokens"),
            completion_tokens: field("completion_tokens"),
            total_tokens: field("total_tokens"),
        }
    });

    Ok(LlmResponse {
        text,
        provider: "openai".to_string(),
        model: json
            .get("model")
            .and_then(|v| v.as_str())
            .unwrap_or(model)
            .to_string(),
        usage,
    })
}

#[async_trait]
impl LlmClient for OpenAIClient {
    async fn complete(&self, model: &str, prompt: &str) -> anyhow::Result<LlmResponse> {
        let url = self.completions_url();
        let body = self.request_body(model, prompt);

        let resp = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                BenchError::provider(None, format!("request to {} failed: {}", url, e))
            })?;

        let status = resp.status();
        if !status.is_success() {
            let error_text = resp.text().await.unwrap_or_else(|_| String::new());
            return Err(BenchError::provider(Some(status.as_u16()), error_text).into());
        }

        let json: serde_json::Value = resp.json().await?;
        Ok(parse_completion(&json, model)?)
    }

    fn provider_name(&self) -> &'static str {
        "openai"
    }
}

pub mod fake;
pub mod openai;
pub mod tracing;

use crate::config::{BenchConfig, ProviderKind};
use crate::errors::BenchError;
use crate::model::LlmResponse;
use async_trait::async_trait;
use std::sync::Arc;

#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send `prompt` as a single user message to `model`.
    async fn complete(&self, model: &str, prompt: &str) -> anyhow::Result<LlmResponse>;

    fn provider_name(&self) -> &'static str;
}

/// Read the API key from `var` via `lookup`; empty values count as missing.
pub fn resolve_api_key(
    var: &str,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<String, BenchError> {
    lookup(var)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| BenchError::MissingCredential {
            var: var.to_string(),
        })
}

/// Build the client described by `cfg.provider`, wrapped in request tracing.
pub fn build_client(
    cfg: &BenchConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<Arc<dyn LlmClient>, BenchError> {
    let p = &cfg.provider;
    let inner: Arc<dyn LlmClient> = match p.kind {
        ProviderKind::Openai => {
            let api_key = resolve_api_key(&p.api_key_env, lookup)?;
            Arc::new(openai::OpenAIClient::new(
                p.base_url.clone(),
                api_key,
                cfg.temperature,
                p.max_tokens,
            ))
        }
        ProviderKind::Fake => {
            let client = match &p.fake_response {
                Some(text) => fake::FakeClient::new().with_response(text.clone()),
                None => fake::FakeClient::new(),
            };
            Arc::new(client)
        }
    };
    Ok(Arc::new(tracing::TracingLlmClient::new(inner)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;

    const CFG: &str = r#"
version: 1
task:
  prompt: "p"
  target_file: app.py
candidates:
  - { name: "A", model: a-1 }
"#;

    #[test]
    fn api_key_must_be_present_and_non_empty() {
        let err = resolve_api_key("GROQ_API_KEY", |_| None).unwrap_err();
        assert!(matches!(err, BenchError::MissingCredential { ref var } if var == "GROQ_API_KEY"));

        assert!(resolve_api_key("K", |_| Some("   ".into())).is_err());
        assert_eq!(
            resolve_api_key("K", |_| Some(" gsk_123 ".into())).unwrap(),
            "gsk_123"
        );
    }

    #[test]
    fn openai_provider_needs_credential() {
        let cfg = parse_config(CFG).unwrap();
        let res = build_client(&cfg, |_| None);
        assert!(matches!(res, Err(BenchError::MissingCredential { .. })));

        let client = build_client(&cfg, |_| Some("key".into())).unwrap();
        assert_eq!(client.provider_name(), "openai");
    }

    #[tokio::test]
    async fn fake_provider_needs_no_credential() {
        let raw = format!("{}provider:\n  kind: fake\n  fake_response: \"def f(): pass\"\n", CFG);
        let cfg = parse_config(&raw).unwrap();
        let client = build_client(&cfg, |_| None).unwrap();
        assert_eq!(client.provider_name(), "fake");

        let resp = client.complete("a-1", "p").await.unwrap();
        assert_eq!(resp.text, "def f(): pass");
        assert_eq!(resp.model, "a-1");
    }
}

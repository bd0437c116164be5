//! Messages-API client for contract analysis, with a deterministic offline mode.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::{DEFAULT_MAX_TOKENS, ModelConfig};

/// Model identifier reported by offline replies.
pub const OFFLINE_MODEL: &str = "mock";

const ANTHROPIC_VERSION: &str = "2023-06-01";
const ERROR_BODY_LIMIT: usize = 200;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("model API error: {status} {message}")]
    Upstream { status: u16, message: String },
    #[error("model request timed out after {0:?}")]
    Timeout(Duration),
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
}

impl ModelError {
    /// Whether a repeat of the same request could reasonably succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Upstream { status, .. } => *status == 429 || *status >= 500,
            Self::Timeout(_) => true,
            Self::Http(e) => e.is_connect() || e.is_timeout() || e.is_request(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelRequest {
    pub prompt: String,
    pub model: String,
    pub max_tokens: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelReply {
    pub text: String,
    /// Model that actually served the request.
    pub model: String,
}

/// Anything that can answer an analysis prompt.
#[async_trait]
pub trait Model: Send + Sync {
    /// Model identifier requests are addressed to.
    fn model_id(&self) -> &str;

    fn max_tokens(&self) -> u32 {
        DEFAULT_MAX_TOKENS
    }

    async fn complete(&self, request: &ModelRequest) -> Result<ModelReply, ModelError>;

    fn request(&self, prompt: String) -> ModelRequest {
        ModelRequest {
            prompt,
            model: self.model_id().to_string(),
            max_tokens: self.max_tokens(),
        }
    }
}

// ── Wire types ──

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: [Message<'a>; 1],
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
    #[serde(default)]
    model: String,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: Option<String>,
}

/// Stateless client for the configured model endpoint.
///
/// Performs exactly one HTTP request per call; retry policy belongs to the
/// caller.
pub struct ModelClient {
    client: reqwest::Client,
    config: ModelConfig,
}

impl ModelClient {
    pub fn new(config: ModelConfig) -> Result<Self, ModelError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        if config.is_offline() {
            info!("no model API key configured; using offline replies");
        }
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    async fn call_live(&self, api_key: &str, request: &ModelRequest) -> Result<ModelReply, ModelError> {
        let body = MessagesRequest {
            model: &request.model,
            max_tokens: request.max_tokens,
            messages: [Message {
                role: "user",
                content: &request.prompt,
            }],
        };

        debug!(url = %self.config.api_url, model = %request.model, "calling model");
        let resp = self
            .client
            .post(&self.config.api_url)
            .header("x-api-key", api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let message = if body.trim().is_empty() {
                status.canonical_reason().unwrap_or("unknown status").to_string()
            } else {
                body.chars().take(ERROR_BODY_LIMIT).collect()
            };
            return Err(ModelError::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: MessagesResponse = resp.json().await.map_err(|e| self.classify(e))?;
        let text = parsed
            .content
            .into_iter()
            .filter_map(|b| b.text)
            .collect::<Vec<_>>()
            .join("\n");
        let model = if parsed.model.is_empty() {
            request.model.clone()
        } else {
            parsed.model
        };
        info!(model = %model, chars = text.len(), "model reply received");
        Ok(ModelReply { text, model })
    }

    fn classify(&self, e: reqwest::Error) -> ModelError {
        if e.is_timeout() {
            ModelError::Timeout(self.config.timeout)
        } else {
            ModelError::Http(e)
        }
    }
}

#[async_trait]
impl Model for ModelClient {
    fn model_id(&self) -> &str {
        &self.config.model
    }

    fn max_tokens(&self) -> u32 {
        self.config.max_tokens
    }

    async fn complete(&self, request: &ModelRequest) -> Result<ModelReply, ModelError> {
        match self.config.api_key.as_deref() {
            Some(key) => self.call_live(key, request).await,
            None => Ok(offline_reply()),
        }
    }
}

/// Fixed, well-formed reply used when no API key is configured.
fn offline_reply() -> ModelReply {
    let payload = json!({
        "summary": "This is a mock analysis summary. Configure CLAUDE_API_KEY for real analysis.",
        "keyTerms": [
            {"term": "Parties", "value": "Mock parties", "confidence": 95},
            {"term": "Value", "value": "Mock value", "confidence": 90}
        ],
        "risks": [{
            "type": "Medium",
            "title": "Mock Risk",
            "description": "This is a mock risk assessment.",
            "clause": "Section 1",
            "recommendation": "Configure Claude API for real analysis"
        }],
        "obligations": [{
            "party": "Party A",
            "obligation": "Mock obligation",
            "deadline": "30 days",
            "status": "active"
        }],
        "clauses": [{
            "category": "General",
            "status": "standard",
            "text": "Mock clause analysis"
        }],
        "confidence": 50
    });
    ModelReply {
        text: payload.to_string(),
        model: OFFLINE_MODEL.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    use super::*;
    use crate::parse_reply;

    /// Serve one HTTP exchange with a canned response; returns the URL and
    /// a handle yielding the raw request text.
    async fn serve_once(
        status_line: &'static str,
        body: String,
    ) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            let mut raw = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = sock.read(&mut buf).await.unwrap();
                raw.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&raw).to_string();
                if let Some(end) = text.find("\r\n\r\n") {
                    let len = text[..end]
                        .lines()
                        .find_map(|l| {
                            let (k, v) = l.split_once(':')?;
                            k.eq_ignore_ascii_case("content-length")
                                .then(|| v.trim().parse::<usize>().ok())
                                .flatten()
                        })
                        .unwrap_or(0);
                    if raw.len() >= end + 4 + len {
                        break;
                    }
                }
                if n == 0 {
                    break;
                }
            }
            let response = format!(
                "{status_line}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            sock.write_all(response.as_bytes()).await.unwrap();
            sock.shutdown().await.ok();
            String::from_utf8_lossy(&raw).to_string()
        });
        (format!("http://{addr}/v1/messages"), handle)
    }

    fn live_config(url: String) -> ModelConfig {
        ModelConfig {
            api_url: url,
            ..ModelConfig::default()
        }
        .with_api_key(Some("sk-test".into()))
    }

    #[tokio::test]
    async fn offline_mode_returns_fixed_reply() {
        let client = ModelClient::new(ModelConfig::default()).unwrap();
        let reply = client.complete(&client.request("anything".into())).await.unwrap();
        assert_eq!(reply.model, OFFLINE_MODEL);
        let result = parse_reply(&reply.text);
        assert_eq!(result.confidence, 50);
        assert_eq!(result.key_terms.len(), 2);
        assert_eq!(result.risks[0].title, "Mock Risk");
        assert!(!result.is_degraded());
    }

    #[tokio::test]
    async fn request_uses_configured_model_and_budget() {
        let cfg = ModelConfig {
            model: "claude-test".into(),
            max_tokens: 512,
            ..ModelConfig::default()
        };
        let client = ModelClient::new(cfg).unwrap();
        let req = client.request("p".into());
        assert_eq!(req.model, "claude-test");
        assert_eq!(req.max_tokens, 512);
    }

    #[tokio::test]
    async fn live_mode_posts_messages_request() {
        let body = json!({
            "content": [{"type": "text", "text": "{\"summary\": \"live\", \"confidence\": 77}"}],
            "model": "claude-3-sonnet-20240229"
        })
        .to_string();
        let (url, server) = serve_once("HTTP/1.1 200 OK", body).await;
        let client = ModelClient::new(live_config(url)).unwrap();

        let reply = client.complete(&client.request("Analyze this".into())).await.unwrap();
        assert_eq!(reply.model, "claude-3-sonnet-20240229");
        assert_eq!(parse_reply(&reply.text).confidence, 77);

        let raw = server.await.unwrap();
        let lower = raw.to_ascii_lowercase();
        assert!(raw.starts_with("POST /v1/messages"));
        assert!(lower.contains("x-api-key: sk-test"));
        assert!(lower.contains("anthropic-version: 2023-06-01"));
        assert!(raw.contains("\"max_tokens\":4096"));
        assert!(raw.contains("Analyze this"));
    }

    #[tokio::test]
    async fn non_success_status_is_upstream_error() {
        let (url, _server) =
            serve_once("HTTP/1.1 529 Overloaded", r#"{"error":"overloaded"}"#.to_string()).await;
        let client = ModelClient::new(live_config(url)).unwrap();
        let err = client.complete(&client.request("p".into())).await.unwrap_err();
        match &err {
            ModelError::Upstream { status, message } => {
                assert_eq!(*status, 529);
                assert!(message.contains("overloaded"));
            }
            other => panic!("expected upstream error, got {other:?}"),
        }
        assert!(err.is_transient());
        assert!(err.to_string().starts_with("model API error: 529"));
    }

    #[tokio::test]
    async fn slow_endpoint_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let _server = tokio::spawn(async move {
            let (_sock, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(30)).await;
        });
        let cfg = ModelConfig {
            timeout: Duration::from_millis(200),
            ..live_config(format!("http://{addr}/v1/messages"))
        };
        let client = ModelClient::new(cfg).unwrap();
        let err = client.complete(&client.request("p".into())).await.unwrap_err();
        assert!(matches!(err, ModelError::Timeout(_)), "got {err:?}");
    }

    #[test]
    fn client_errors_are_not_transient() {
        let err = ModelError::Upstream {
            status: 401,
            message: "invalid x-api-key".into(),
        };
        assert!(!err.is_transient());
        assert!(ModelError::Upstream { status: 429, message: String::new() }.is_transient());
    }
}

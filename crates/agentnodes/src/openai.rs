//! OpenAI-compatible chat-completion client.

use agentcore::{ChatClient, ChatRequest, ClientError, EchoChatClient};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub base_url: String,
    pub org_id: Option<String>,
    pub timeout: Duration,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            org_id: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl OpenAiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Self::default()
        }
    }

    /// Read `OPENAI_API_KEY`, `OPENAI_BASE_URL`, `OPENAI_ORG_ID` and
    /// `OPENAI_TIMEOUT_SECS`. Returns `None` when no key is set.
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())?;

        let mut config = Self::new(api_key);
        if let Ok(base_url) = std::env::var("OPENAI_BASE_URL") {
            config.base_url = base_url;
        }
        config.org_id = std::env::var("OPENAI_ORG_ID").ok();
        if let Some(secs) = std::env::var("OPENAI_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
        {
            config.timeout = Duration::from_secs(secs);
        }
        Some(config)
    }
}

pub struct OpenAiClient {
    config: OpenAiConfig,
    client: reqwest::Client,
}

impl OpenAiClient {
    pub fn new(config: OpenAiConfig) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ClientError::Network(e.to_string()))?;
        Ok(Self { config, client })
    }

    /// Client for the environment's provider, or the echo client when
    /// `OPENAI_API_KEY` is unset.
    pub fn from_env_or_echo() -> Result<Arc<dyn ChatClient>, ClientError> {
        Self::or_echo(OpenAiConfig::from_env())
    }

    pub fn or_echo(config: Option<OpenAiConfig>) -> Result<Arc<dyn ChatClient>, ClientError> {
        match config {
            Some(config) => {
                info!("Using OpenAI-compatible client at {}", config.base_url);
                Ok(Arc::new(Self::new(config)?))
            }
            None => {
                warn!("OPENAI_API_KEY is not set; llm nodes will echo their input");
                Ok(Arc::new(EchoChatClient))
            }
        }
    }

    pub fn config(&self) -> &OpenAiConfig {
        &self.config
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        )
    }

    fn map_error(status: u16, body: &str) -> ClientError {
        match status {
            401 | 403 => ClientError::Authentication(body.to_string()),
            429 => ClientError::RateLimited,
            _ => ClientError::Api {
                status,
                message: body.to_string(),
            },
        }
    }

    fn parse_content(body: &Value) -> Result<String, ClientError> {
        body.get("choices")
            .and_then(|v| v.as_array())
            .and_then(|arr| arr.first())
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or_else(|| {
                ClientError::InvalidResponse("missing choices[0].message.content".to_string())
            })
    }
}

#[async_trait]
impl ChatClient for OpenAiClient {
    fn id(&self) -> &str {
        "openai"
    }

    async fn chat_completion(&self, request: ChatRequest) -> Result<String, ClientError> {
        debug!("POST {} (model {})", self.endpoint(), request.model);

        let mut builder = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.config.api_key)
            .json(&request);
        if let Some(org) = &self.config.org_id {
            builder = builder.header("OpenAI-Organization", org);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;
        if !status.is_success() {
            return Err(Self::map_error(status.as_u16(), &text));
        }

        let body: Value = serde_json::from_str(&text)
            .map_err(|e| ClientError::InvalidResponse(e.to_string()))?;
        Self::parse_content(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_config_falls_back_to_echo() {
        assert_eq!(OpenAiClient::or_echo(None).unwrap().id(), "echo");

        let client = OpenAiClient::or_echo(Some(OpenAiConfig::new("sk-test"))).unwrap();
        assert_eq!(client.id(), "openai");
    }

    #[test]
    fn test_status_mapping() {
        assert!(matches!(
            OpenAiClient::map_error(401, "bad key"),
            ClientError::Authentication(_)
        ));
        assert!(matches!(
            OpenAiClient::map_error(429, ""),
            ClientError::RateLimited
        ));
        assert!(matches!(
            OpenAiClient::map_error(500, "oops"),
            ClientError::Api { status: 500, .. }
        ));
    }

    #[test]
    fn test_parse_content() {
        let body = json!({"choices": [{"message": {"role": "assistant", "content": "hi"}}]});
        assert_eq!(OpenAiClient::parse_content(&body).unwrap(), "hi");
        assert!(OpenAiClient::parse_content(&json!({"choices": []})).is_err());
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let mut config = OpenAiConfig::new("k");
        config.base_url = "http://localhost:9999/v1/".to_string();
        let client = OpenAiClient::new(config).unwrap();
        assert_eq!(client.endpoint(), "http://localhost:9999/v1/chat/completions");
    }
}

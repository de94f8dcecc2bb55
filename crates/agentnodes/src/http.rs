use agentcore::{NodeError, NodeSpec, NodeType};
use agentruntime::{NodeContext, NodeHandler};
use async_trait::async_trait;
use serde_json::json;
use std::time::Duration;
use tracing::warn;

pub const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(10);

/// Posts the value as `{"data": <value>}` to the configured URL and
/// continues with the response body. The status code is not inspected.
pub struct WebhookNode {
    client: reqwest::Client,
    timeout: Duration,
}

impl WebhookNode {
    pub fn new() -> Self {
        Self::with_timeout(WEBHOOK_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            timeout,
        }
    }

    async fn post(&self, url: &str, input: &str) -> reqwest::Result<String> {
        let response = self
            .client
            .post(url)
            .timeout(self.timeout)
            .json(&json!({ "data": input }))
            .send()
            .await?;
        response.text().await
    }
}

impl Default for WebhookNode {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NodeHandler for WebhookNode {
    fn node_type(&self) -> NodeType {
        NodeType::Webhook
    }

    async fn execute(
        &self,
        node: &NodeSpec,
        input: &str,
        ctx: &NodeContext,
    ) -> Result<String, NodeError> {
        let url = node.prop_str("url", "");
        if url.is_empty() {
            return Ok(input.to_string());
        }

        ctx.events.info(format!("POST {}", url));

        match self.post(&url, input).await {
            Ok(body) => Ok(body),
            Err(e) => {
                warn!("Webhook request to {} failed: {}", url, e);
                ctx.events.warn(format!("Webhook request failed: {}", e));
                Ok(format!("Webhook error for URL: {}", url))
            }
        }
    }
}

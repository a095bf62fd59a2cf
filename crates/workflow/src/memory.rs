//! In-memory context implementations.
//!
//! Used by the CLI host and by tests; parameters, credentials and webhook
//! URLs are plain maps filled in up front.

use std::collections::HashMap;

use {
    async_trait::async_trait,
    serde_json::{Map, Value},
};

use crate::{Error, ExecuteContext, HookContext, NodeItem, Result, WebhookContext};

/// Execute context backed by maps.
///
/// Parameters set with [`with_parameter`](Self::with_parameter) apply to
/// every item; per-item overrides take precedence.
#[derive(Debug, Clone, Default)]
pub struct StaticExecuteContext {
    items: Vec<NodeItem>,
    parameters: Map<String, Value>,
    item_parameters: HashMap<usize, Map<String, Value>>,
    credentials: HashMap<String, Value>,
    continue_on_fail: bool,
}

impl StaticExecuteContext {
    pub fn new(items: Vec<NodeItem>) -> Self {
        Self {
            items,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_parameter(mut self, name: impl Into<String>, value: Value) -> Self {
        self.parameters.insert(name.into(), value);
        self
    }

    /// Replace all shared parameters with the fields of a JSON object.
    #[must_use]
    pub fn with_parameters(mut self, parameters: Map<String, Value>) -> Self {
        self.parameters = parameters;
        self
    }

    #[must_use]
    pub fn with_item_parameter(
        mut self,
        item_index: usize,
        name: impl Into<String>,
        value: Value,
    ) -> Self {
        self.item_parameters
            .entry(item_index)
            .or_default()
            .insert(name.into(), value);
        self
    }

    #[must_use]
    pub fn with_credentials(mut self, name: impl Into<String>, value: Value) -> Self {
        self.credentials.insert(name.into(), value);
        self
    }

    #[must_use]
    pub fn with_continue_on_fail(mut self, enabled: bool) -> Self {
        self.continue_on_fail = enabled;
        self
    }
}

#[async_trait]
impl ExecuteContext for StaticExecuteContext {
    fn input_items(&self) -> &[NodeItem] {
        &self.items
    }

    fn node_parameter(&self, name: &str, item_index: usize) -> Option<Value> {
        self.item_parameters
            .get(&item_index)
            .and_then(|params| params.get(name))
            .or_else(|| self.parameters.get(name))
            .cloned()
    }

    async fn credentials(&self, name: &str) -> Result<Value> {
        self.credentials
            .get(name)
            .cloned()
            .ok_or_else(|| Error::missing_credentials(name))
    }

    fn continue_on_fail(&self) -> bool {
        self.continue_on_fail
    }
}

/// Hook context backed by maps.
#[derive(Debug, Clone, Default)]
pub struct StaticHookContext {
    webhook_urls: HashMap<String, String>,
    credentials: HashMap<String, Value>,
}

impl StaticHookContext {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_webhook_url(mut self, webhook_name: impl Into<String>, url: impl Into<String>) -> Self {
        self.webhook_urls.insert(webhook_name.into(), url.into());
        self
    }

    #[must_use]
    pub fn with_credentials(mut self, name: impl Into<String>, value: Value) -> Self {
        self.credentials.insert(name.into(), value);
        self
    }
}

#[async_trait]
impl HookContext for StaticHookContext {
    fn node_webhook_url(&self, webhook_name: &str) -> Option<String> {
        self.webhook_urls.get(webhook_name).cloned()
    }

    async fn credentials(&self, name: &str) -> Result<Value> {
        self.credentials
            .get(name)
            .cloned()
            .ok_or_else(|| Error::missing_credentials(name))
    }
}

/// A webhook request whose body has already been parsed.
#[derive(Debug, Clone)]
pub struct StaticWebhookContext {
    body: Value,
}

impl StaticWebhookContext {
    pub fn new(body: Value) -> Self {
        Self { body }
    }
}

impl WebhookContext for StaticWebhookContext {
    fn body_data(&self) -> &Value {
        &self.body
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, serde_json::json};

    #[test]
    fn item_parameter_overrides_shared_value() {
        let ctx = StaticExecuteContext::new(vec![NodeItem::default(); 2])
            .with_parameter("chatId", json!("100"))
            .with_item_parameter(1, "chatId", json!("200"));

        assert_eq!(ctx.node_parameter("chatId", 0), Some(json!("100")));
        assert_eq!(ctx.node_parameter("chatId", 1), Some(json!("200")));
        assert_eq!(ctx.node_parameter("text", 0), None);
    }

    #[tokio::test]
    async fn missing_credentials_error() {
        let ctx = StaticExecuteContext::default();
        let err = ctx.credentials("baleMessengerApi").await.unwrap_err();
        assert!(matches!(err, Error::MissingCredentials { .. }));
    }

    #[tokio::test]
    async fn hook_context_serves_urls_and_credentials() {
        let ctx = StaticHookContext::new()
            .with_webhook_url("default", "https://example.com/webhook")
            .with_credentials("baleMessengerApi", json!({"token": "t"}));

        assert_eq!(
            ctx.node_webhook_url("default").as_deref(),
            Some("https://example.com/webhook")
        );
        assert!(ctx.node_webhook_url("other").is_none());
        assert_eq!(
            ctx.credentials("baleMessengerApi").await.unwrap()["token"],
            "t"
        );
    }
}

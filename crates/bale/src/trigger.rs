//! The BaleMessenger trigger node: starts workflows from bot updates
//! delivered to a webhook.

use {
    async_trait::async_trait,
    serde_json::Value,
    tracing::{info, warn},
};

use baleflow_workflow::{
    CredentialRequirement, HookContext, HttpMethod, NodeDescription, NodeGroup, ResponseMode,
    TriggerNode, WebhookContext, WebhookDescription, WebhookResponse, json_array_items,
};

use crate::credentials::{BaleApiCredentials, CREDENTIAL_NAME};

/// Name of the trigger's only webhook.
pub const WEBHOOK_NAME: &str = "default";

pub const DESCRIPTION: NodeDescription = NodeDescription {
    name: "baleMessengerTrigger",
    display_name: "BaleMessenger Trigger",
    description: "Starts the workflow on a BaleMessenger update",
    group: NodeGroup::Trigger,
    version: 1,
    credentials: &[CredentialRequirement {
        name: CREDENTIAL_NAME,
        required: true,
    }],
    webhooks: &[WebhookDescription {
        name: WEBHOOK_NAME,
        http_method: HttpMethod::Post,
        response_mode: ResponseMode::OnReceived,
        path: "webhook",
    }],
};

#[derive(Debug, Clone, Copy, Default)]
pub struct BaleMessengerTrigger;

impl BaleMessengerTrigger {
    pub fn new() -> Self {
        Self
    }
}

fn webhook_url(ctx: &dyn HookContext) -> baleflow_workflow::Result<String> {
    ctx.node_webhook_url(WEBHOOK_NAME).ok_or_else(|| {
        baleflow_workflow::Error::invalid_parameter(
            "webhookUrl",
            "no public url for webhook 'default'",
        )
    })
}

#[async_trait]
impl TriggerNode for BaleMessengerTrigger {
    fn description(&self) -> &NodeDescription {
        &DESCRIPTION
    }

    async fn check_exists(&self, ctx: &dyn HookContext) -> baleflow_workflow::Result<bool> {
        let expected = webhook_url(ctx)?;
        let client = BaleApiCredentials::from_hook_context(ctx).await?.client()?;
        let info = client.get_webhook_info().await?;
        Ok(info.get("url").and_then(Value::as_str) == Some(expected.as_str()))
    }

    async fn create(&self, ctx: &dyn HookContext) -> baleflow_workflow::Result<bool> {
        let url = webhook_url(ctx)?;
        let client = BaleApiCredentials::from_hook_context(ctx).await?.client()?;
        client.set_webhook(&url).await?;
        info!(url = %url, "bale webhook registered");
        Ok(true)
    }

    async fn delete(&self, ctx: &dyn HookContext) -> baleflow_workflow::Result<bool> {
        let client = BaleApiCredentials::from_hook_context(ctx).await?.client()?;
        match client.delete_webhook().await {
            Ok(_) => {
                info!("bale webhook removed");
                Ok(true)
            },
            Err(e) => {
                warn!(error = %e, "failed to remove bale webhook");
                Ok(false)
            },
        }
    }

    async fn webhook(
        &self,
        ctx: &dyn WebhookContext,
    ) -> baleflow_workflow::Result<WebhookResponse> {
        Ok(WebhookResponse {
            workflow_data: vec![json_array_items(ctx.body_data().clone())],
        })
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::test_support::MockBaleApi,
        baleflow_workflow::memory::{StaticHookContext, StaticWebhookContext},
        rstest::rstest,
        serde_json::json,
    };

    const URL: &str = "https://flows.example.com/webhook";

    fn hook_context(mock: &MockBaleApi) -> StaticHookContext {
        StaticHookContext::new()
            .with_webhook_url(WEBHOOK_NAME, URL)
            .with_credentials(CREDENTIAL_NAME, mock.credentials())
    }

    #[test]
    fn description_declares_post_webhook() {
        let desc = BaleMessengerTrigger.description();
        assert_eq!(desc.name, "baleMessengerTrigger");
        assert_eq!(desc.group, NodeGroup::Trigger);
        let hook = desc.webhooks[0];
        assert_eq!(hook.name, "default");
        assert_eq!(hook.http_method, HttpMethod::Post);
        assert_eq!(hook.response_mode, ResponseMode::OnReceived);
        assert_eq!(hook.path, "webhook");
    }

    #[rstest]
    #[case("", false)]
    #[case("https://elsewhere.example.com/hook", false)]
    #[case(URL, true)]
    #[tokio::test]
    async fn check_exists_compares_urls(#[case] registered: &str, #[case] expected: bool) {
        let mock = MockBaleApi::start().await;
        mock.set_webhook_url(registered);
        let exists = BaleMessengerTrigger
            .check_exists(&hook_context(&mock))
            .await
            .unwrap();
        assert_eq!(exists, expected);
        assert_eq!(mock.calls()[0].method, "getWebhookInfo");
    }

    #[tokio::test]
    async fn create_registers_node_url() {
        let mock = MockBaleApi::start().await;
        let ctx = hook_context(&mock);

        assert!(BaleMessengerTrigger.create(&ctx).await.unwrap());
        assert_eq!(mock.webhook_url(), URL);
        assert_eq!(mock.calls()[0].json, json!({"url": URL}));
        assert!(BaleMessengerTrigger.check_exists(&ctx).await.unwrap());
    }

    #[tokio::test]
    async fn create_without_webhook_url_fails() {
        let mock = MockBaleApi::start().await;
        let ctx = StaticHookContext::new().with_credentials(CREDENTIAL_NAME, mock.credentials());

        assert!(BaleMessengerTrigger.create(&ctx).await.is_err());
        assert!(mock.calls().is_empty());
    }

    #[tokio::test]
    async fn create_propagates_api_error() {
        let mock = MockBaleApi::start().await;
        mock.fail_method("setWebhook", 400, "Bad Request: bad webhook");

        let err = BaleMessengerTrigger
            .create(&hook_context(&mock))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("bad webhook"));
    }

    #[tokio::test]
    async fn delete_clears_registration() {
        let mock = MockBaleApi::start().await;
        mock.set_webhook_url(URL);

        assert!(BaleMessengerTrigger.delete(&hook_context(&mock)).await.unwrap());
        assert_eq!(mock.webhook_url(), "");
    }

    #[tokio::test]
    async fn delete_failure_returns_false() {
        let mock = MockBaleApi::start().await;
        mock.fail_method("deleteWebhook", 401, "Unauthorized");

        assert!(!BaleMessengerTrigger.delete(&hook_context(&mock)).await.unwrap());
    }

    #[tokio::test]
    async fn webhook_object_body_becomes_one_item() {
        let ctx = StaticWebhookContext::new(json!({
            "update_id": 10,
            "message": {"message_id": 3, "text": "/start", "chat": {"id": 77}}
        }));
        let response = BaleMessengerTrigger.webhook(&ctx).await.unwrap();

        assert_eq!(response.workflow_data.len(), 1);
        let items = &response.workflow_data[0];
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].json["update_id"], 10);
        assert_eq!(items[0].json["message"]["text"], "/start");
    }

    #[tokio::test]
    async fn webhook_array_body_becomes_many_items() {
        let ctx = StaticWebhookContext::new(json!([{"update_id": 1}, {"update_id": 2}]));
        let response = BaleMessengerTrigger.webhook(&ctx).await.unwrap();

        let ids: Vec<_> = response.workflow_data[0]
            .iter()
            .map(|item| item.json["update_id"].clone())
            .collect();
        assert_eq!(ids, vec![json!(1), json!(2)]);
    }
}

//! CLI commands for the trigger's webhook registration.

use {anyhow::Context, clap::Subcommand};

use {
    baleflow_bale::{
        credentials::CREDENTIAL_NAME,
        trigger::{DESCRIPTION, WEBHOOK_NAME},
    },
    baleflow_config::BaleflowConfig,
    baleflow_workflow::{NodeRegistry, TriggerNode, memory::StaticHookContext},
};

#[derive(Subcommand)]
pub enum WebhookAction {
    /// Show whether Bale delivers updates to the configured URL.
    Status,
    /// Point the bot's webhook at the configured URL.
    Register,
    /// Remove the bot's webhook.
    Unregister,
}

/// Hook context built from config: stored credentials plus the public
/// webhook URL, when one is configured.
pub fn hook_context(config: &BaleflowConfig) -> anyhow::Result<StaticHookContext> {
    let credentials = config
        .credentials
        .to_value()
        .context("no bot token configured (set credentials.token or BALEFLOW_TOKEN)")?;
    let mut ctx = StaticHookContext::new().with_credentials(CREDENTIAL_NAME, credentials);
    if let Some(url) = config.server.webhook_url() {
        ctx = ctx.with_webhook_url(WEBHOOK_NAME, url);
    }
    Ok(ctx)
}

pub fn trigger(registry: &NodeRegistry) -> anyhow::Result<&dyn TriggerNode> {
    registry
        .trigger(DESCRIPTION.name)
        .with_context(|| format!("trigger '{}' is not registered", DESCRIPTION.name))
}

fn require_public_url(config: &BaleflowConfig) -> anyhow::Result<String> {
    config
        .server
        .webhook_url()
        .context("no public url configured (set server.public_url or BALEFLOW_PUBLIC_URL)")
}

pub async fn handle_webhook(
    action: WebhookAction,
    config: &BaleflowConfig,
    registry: &NodeRegistry,
) -> anyhow::Result<()> {
    let trigger = trigger(registry)?;
    let ctx = hook_context(config)?;

    match action {
        WebhookAction::Status => {
            let url = require_public_url(config)?;
            if trigger.check_exists(&ctx).await? {
                println!("registered: {url}");
            } else {
                println!("not registered: {url}");
            }
        },
        WebhookAction::Register => {
            let url = require_public_url(config)?;
            if trigger.check_exists(&ctx).await? {
                println!("already registered: {url}");
            } else {
                trigger.create(&ctx).await?;
                println!("registered: {url}");
            }
        },
        WebhookAction::Unregister => {
            if !trigger.delete(&ctx).await? {
                anyhow::bail!("bale did not remove the webhook; see the log for details");
            }
            println!("webhook removed");
        },
    }

    Ok(())
}

//! `baleflow serve`: receive bot updates on the trigger webhook.
//!
//! Each update is run through the trigger node and the produced items are
//! printed to stdout as JSON lines. The webhook is registered on start and
//! removed again on Ctrl-C unless `--no-register` is given.

use std::sync::Arc;

use {
    axum::{Json, Router, extract::State, http::StatusCode, routing::post},
    clap::Args,
    serde_json::Value,
    tokio::sync::mpsc,
    tokio_util::sync::CancellationToken,
    tracing::{info, warn},
};

use {
    baleflow_bale::trigger::DESCRIPTION,
    baleflow_config::BaleflowConfig,
    baleflow_workflow::{NodeItem, NodeRegistry, memory::StaticWebhookContext},
};

use crate::webhook_commands;

#[derive(Args)]
pub struct ServeArgs {
    /// Address to bind to (overrides server.bind).
    #[arg(long)]
    bind: Option<String>,

    /// Serve without registering or removing the webhook with Bale.
    #[arg(long, default_value_t = false)]
    no_register: bool,
}

#[derive(Clone)]
struct ServeState {
    registry: Arc<NodeRegistry>,
    items: mpsc::UnboundedSender<NodeItem>,
}

/// Router answering `POST {route}` with the trigger node.
fn router(
    route: &str,
    registry: Arc<NodeRegistry>,
    items: mpsc::UnboundedSender<NodeItem>,
) -> Router {
    Router::new()
        .route(route, post(handle_update))
        .with_state(ServeState { registry, items })
}

async fn handle_update(State(state): State<ServeState>, Json(body): Json<Value>) -> StatusCode {
    let Some(trigger) = state.registry.trigger(DESCRIPTION.name) else {
        warn!(trigger = DESCRIPTION.name, "trigger not registered");
        return StatusCode::INTERNAL_SERVER_ERROR;
    };

    let ctx = StaticWebhookContext::new(body);
    match trigger.webhook(&ctx).await {
        Ok(response) => {
            for item in response.workflow_data.into_iter().flatten() {
                if state.items.send(item).is_err() {
                    warn!("item printer stopped, dropping update");
                    return StatusCode::SERVICE_UNAVAILABLE;
                }
            }
            StatusCode::OK
        },
        Err(e) => {
            warn!(error = %e, "failed to handle webhook update");
            StatusCode::BAD_REQUEST
        },
    }
}

pub async fn handle_serve(
    args: ServeArgs,
    config: &BaleflowConfig,
    registry: Arc<NodeRegistry>,
) -> anyhow::Result<()> {
    let bind = args.bind.unwrap_or_else(|| config.server.bind.clone());
    let route = config.server.route();

    let hook_ctx = if args.no_register {
        None
    } else {
        Some(webhook_commands::hook_context(config)?)
    };
    if let Some(ctx) = &hook_ctx {
        let trigger = webhook_commands::trigger(&registry)?;
        if !trigger.check_exists(ctx).await? {
            trigger.create(ctx).await?;
        }
    }

    let (tx, mut rx) = mpsc::unbounded_channel::<NodeItem>();
    let printer = tokio::spawn(async move {
        while let Some(item) = rx.recv().await {
            match serde_json::to_string(&item) {
                Ok(line) => println!("{line}"),
                Err(e) => warn!(error = %e, "failed to encode item"),
            }
        }
    });

    let app = router(&route, Arc::clone(&registry), tx);
    let listener = tokio::net::TcpListener::bind(&bind).await?;
    info!(addr = %listener.local_addr()?, route = %route, "webhook server listening");

    let cancel = CancellationToken::new();
    let shutdown = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutting down");
            cancel.cancel();
        }
    });

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;
    printer.await?;

    if let Some(ctx) = &hook_ctx {
        let trigger = webhook_commands::trigger(&registry)?;
        if !trigger.delete(ctx).await? {
            warn!("webhook is still registered with bale");
        }
    }

    Ok(())
}

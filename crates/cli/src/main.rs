mod execute_commands;
mod serve_commands;
mod webhook_commands;

use std::{path::PathBuf, sync::Arc};

use {
    clap::{Parser, Subcommand},
    tracing::info,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

use {
    baleflow_bale::{BaleMessengerNode, BaleMessengerTrigger},
    baleflow_config::BaleflowConfig,
    baleflow_workflow::NodeRegistry,
};

#[derive(Parser)]
#[command(name = "baleflow", about = "baleflow: Bale Messenger workflow nodes")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Config file (overrides discovery of baleflow.{toml,yaml,yml,json}).
    #[arg(long, global = true, env = "BALEFLOW_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the BaleMessenger node over a set of input items.
    Execute(execute_commands::ExecuteArgs),
    /// Manage the trigger's webhook registration with Bale.
    Webhook {
        #[command(subcommand)]
        action: webhook_commands::WebhookAction,
    },
    /// Serve the trigger webhook and print received updates as JSON lines.
    Serve(serve_commands::ServeArgs),
    /// List the registered nodes.
    Nodes,
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    // Logs go to stderr so stdout carries only node output.
    let registry = tracing_subscriber::registry().with(filter);
    if cli.json_logs {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<BaleflowConfig> {
    let config = match &cli.config {
        Some(path) => baleflow_config::load_config(path)?,
        None => baleflow_config::discover_and_load(),
    };
    Ok(baleflow_config::apply_env_overrides(config))
}

fn node_registry() -> NodeRegistry {
    let mut registry = NodeRegistry::new();
    registry.register(Box::new(BaleMessengerNode::new()));
    registry.register_trigger(Box::new(BaleMessengerTrigger::new()));
    registry
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_telemetry(&cli);

    info!(version = env!("CARGO_PKG_VERSION"), "baleflow starting");

    let config = load_config(&cli)?;
    let registry = node_registry();

    match cli.command {
        Commands::Execute(args) => {
            execute_commands::handle_execute(args, &config, &registry).await
        },
        Commands::Webhook { action } => {
            webhook_commands::handle_webhook(action, &config, &registry).await
        },
        Commands::Serve(args) => {
            serve_commands::handle_serve(args, &config, Arc::new(registry)).await
        },
        Commands::Nodes => {
            for name in registry.list() {
                println!("{name}");
            }
            Ok(())
        },
    }
}

//! `baleflow execute`: run the action node once over a set of items.

use std::path::{Path, PathBuf};

use {
    anyhow::Context,
    clap::Args,
    serde_json::Value,
    tracing::info,
};

use {
    baleflow_bale::{credentials::CREDENTIAL_NAME, node::DESCRIPTION},
    baleflow_config::BaleflowConfig,
    baleflow_workflow::{BinaryData, NodeItem, NodeRegistry, memory::StaticExecuteContext},
};

#[derive(Args)]
pub struct ExecuteArgs {
    /// Node parameters (TOML, YAML or JSON object).
    #[arg(long)]
    parameters: PathBuf,

    /// Input items (TOML, YAML or JSON). Defaults to a single empty item.
    #[arg(long)]
    items: Option<PathBuf>,

    /// Attach this file as binary data to every input item.
    #[arg(long)]
    binary_file: Option<PathBuf>,

    /// Binary property the attached file is stored under.
    #[arg(long, default_value = "data")]
    binary_property: String,

    /// Emit an error item for failing items instead of aborting.
    #[arg(long, default_value_t = false)]
    continue_on_fail: bool,
}

pub async fn handle_execute(
    args: ExecuteArgs,
    config: &BaleflowConfig,
    registry: &NodeRegistry,
) -> anyhow::Result<()> {
    let parameters = match baleflow_config::load_value(&args.parameters)? {
        Value::Object(map) => map,
        other => anyhow::bail!("parameters must be an object, got {other}"),
    };

    let mut items = match &args.items {
        Some(path) => parse_items(baleflow_config::load_value(path)?)?,
        None => vec![NodeItem::default()],
    };
    if let Some(path) = &args.binary_file {
        let binary = read_binary(path)?;
        items = items
            .into_iter()
            .map(|item| item.with_binary(args.binary_property.clone(), binary.clone()))
            .collect();
    }

    let credentials = config
        .credentials
        .to_value()
        .context("no bot token configured (set credentials.token or BALEFLOW_TOKEN)")?;

    let ctx = StaticExecuteContext::new(items)
        .with_parameters(parameters)
        .with_credentials(CREDENTIAL_NAME, credentials)
        .with_continue_on_fail(args.continue_on_fail);

    let node = registry
        .get(DESCRIPTION.name)
        .with_context(|| format!("node '{}' is not registered", DESCRIPTION.name))?;
    let output = node.execute(&ctx).await?;

    let count: usize = output.iter().map(Vec::len).sum();
    info!(node = DESCRIPTION.name, items = count, "node executed");
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// Parse an items file. Elements with a `json` object are full items
/// (optionally carrying `binary`); anything else is wrapped as item JSON.
fn parse_items(value: Value) -> anyhow::Result<Vec<NodeItem>> {
    let values = match value {
        Value::Array(values) => values,
        other => vec![other],
    };
    values
        .into_iter()
        .map(|value| {
            if is_full_item(&value) {
                serde_json::from_value::<NodeItem>(value).context("invalid item")
            } else {
                Ok(NodeItem::from_value(value))
            }
        })
        .collect()
}

fn is_full_item(value: &Value) -> bool {
    value
        .as_object()
        .and_then(|obj| obj.get("json"))
        .is_some_and(Value::is_object)
}

fn read_binary(path: &Path) -> anyhow::Result<BinaryData> {
    let bytes =
        std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string);
    Ok(BinaryData::from_bytes(&bytes, "application/octet-stream", file_name))
}

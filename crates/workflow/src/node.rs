use {async_trait::async_trait, serde::Serialize};

use crate::{ExecuteContext, HookContext, NodeItem, Result, WebhookContext};

/// Which palette group a node belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeGroup {
    Input,
    Output,
    Transform,
    Trigger,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
}

/// When the host answers an inbound webhook request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ResponseMode {
    /// Respond as soon as the request has been received.
    OnReceived,
    /// Respond once the last node of the workflow has run.
    LastNode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CredentialRequirement {
    pub name: &'static str,
    pub required: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookDescription {
    pub name: &'static str,
    pub http_method: HttpMethod,
    pub response_mode: ResponseMode,
    pub path: &'static str,
}

/// Static metadata the host uses to list and wire up a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDescription {
    /// Internal node type name (e.g. "baleMessenger").
    pub name: &'static str,
    pub display_name: &'static str,
    pub description: &'static str,
    pub group: NodeGroup,
    pub version: u32,
    pub credentials: &'static [CredentialRequirement],
    pub webhooks: &'static [WebhookDescription],
}

/// Items produced by a trigger for a single inbound request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WebhookResponse {
    /// One item list per node output.
    pub workflow_data: Vec<Vec<NodeItem>>,
}

/// A node that runs once per workflow execution over its input items.
#[async_trait]
pub trait Node: Send + Sync {
    fn description(&self) -> &NodeDescription;

    /// Process the input items; returns one item list per node output.
    async fn execute(&self, ctx: &dyn ExecuteContext) -> Result<Vec<Vec<NodeItem>>>;
}

/// A node that starts workflows from inbound webhook requests.
#[async_trait]
pub trait TriggerNode: Send + Sync {
    fn description(&self) -> &NodeDescription;

    /// Whether the external service already points at this node's webhook.
    async fn check_exists(&self, ctx: &dyn HookContext) -> Result<bool>;

    /// Register this node's webhook with the external service.
    async fn create(&self, ctx: &dyn HookContext) -> Result<bool>;

    /// Remove the registration. Returns `false` when removal failed.
    async fn delete(&self, ctx: &dyn HookContext) -> Result<bool>;

    /// Turn an inbound request into workflow items.
    async fn webhook(&self, ctx: &dyn WebhookContext) -> Result<WebhookResponse>;
}

//! Host contract for workflow nodes.
//!
//! A workflow host hands each node a context (input items, configured
//! parameters, stored credentials) and collects the items the node produces.
//! Trigger nodes additionally manage a webhook registration and turn inbound
//! requests into items.

pub mod context;
pub mod error;
pub mod item;
pub mod memory;
pub mod node;
pub mod registry;

pub use {
    context::{ExecuteContext, HookContext, ParameterExt, WebhookContext},
    error::{Error, Result},
    item::{BinaryData, NodeItem, PairedItem, json_array_items},
    node::{
        CredentialRequirement, HttpMethod, Node, NodeDescription, NodeGroup, ResponseMode,
        TriggerNode, WebhookDescription, WebhookResponse,
    },
    registry::NodeRegistry,
};

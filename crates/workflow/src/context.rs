use {
    async_trait::async_trait,
    serde::de::DeserializeOwned,
    serde_json::Value,
};

use crate::{Error, NodeItem, Result};

/// What the host exposes to an action node while it runs.
#[async_trait]
pub trait ExecuteContext: Send + Sync {
    /// Items received on the node's main input.
    fn input_items(&self) -> &[NodeItem];

    /// Configured value of a parameter for the given item, if any.
    fn node_parameter(&self, name: &str, item_index: usize) -> Option<Value>;

    /// Stored credentials of the given type.
    async fn credentials(&self, name: &str) -> Result<Value>;

    /// Whether a failing item should produce an error item instead of
    /// aborting the run.
    fn continue_on_fail(&self) -> bool {
        false
    }
}

/// What the host exposes to a trigger node while it manages its webhook.
#[async_trait]
pub trait HookContext: Send + Sync {
    /// Public URL the host serves for the named webhook.
    fn node_webhook_url(&self, webhook_name: &str) -> Option<String>;

    async fn credentials(&self, name: &str) -> Result<Value>;
}

/// An inbound webhook request handed to a trigger node.
pub trait WebhookContext: Send + Sync {
    fn body_data(&self) -> &Value;
}

/// Typed parameter access on top of [`ExecuteContext::node_parameter`].
pub trait ParameterExt {
    /// Read and deserialize a parameter; absent or `null` is an error.
    fn parameter<T: DeserializeOwned>(&self, name: &str, item_index: usize) -> Result<T>;

    /// Read and deserialize a parameter, falling back to `default` when
    /// it is absent or `null`.
    fn parameter_or<T: DeserializeOwned>(
        &self,
        name: &str,
        item_index: usize,
        default: T,
    ) -> Result<T>;
}

impl<C: ExecuteContext + ?Sized> ParameterExt for C {
    fn parameter<T: DeserializeOwned>(&self, name: &str, item_index: usize) -> Result<T> {
        match self.node_parameter(name, item_index) {
            None | Some(Value::Null) => Err(Error::missing_parameter(name)),
            Some(value) => {
                serde_json::from_value(value).map_err(|e| Error::invalid_parameter(name, e))
            },
        }
    }

    fn parameter_or<T: DeserializeOwned>(
        &self,
        name: &str,
        item_index: usize,
        default: T,
    ) -> Result<T> {
        match self.node_parameter(name, item_index) {
            None | Some(Value::Null) => Ok(default),
            Some(value) => {
                serde_json::from_value(value).map_err(|e| Error::invalid_parameter(name, e))
            },
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, crate::memory::StaticExecuteContext, serde_json::json};

    fn context() -> StaticExecuteContext {
        StaticExecuteContext::new(vec![NodeItem::default()])
            .with_parameter("text", json!("hello"))
            .with_parameter("binaryData", json!(true))
            .with_parameter("replyToMessageId", Value::Null)
    }

    #[test]
    fn typed_parameter() {
        let ctx = context();
        let text: String = ctx.parameter("text", 0).unwrap();
        assert_eq!(text, "hello");
        assert!(ctx.parameter::<bool>("binaryData", 0).unwrap());
    }

    #[test]
    fn missing_parameter_is_an_error() {
        let ctx = context();
        let err = ctx.parameter::<String>("chatId", 0).unwrap_err();
        assert!(matches!(err, Error::MissingParameter { ref name } if name == "chatId"));
    }

    #[test]
    fn null_parameter_uses_default() {
        let ctx = context();
        assert_eq!(ctx.parameter_or("replyToMessageId", 0, 0i64).unwrap(), 0);
        assert_eq!(ctx.parameter_or("fileId", 0, String::new()).unwrap(), "");
    }

    #[test]
    fn wrong_type_is_invalid_parameter() {
        let ctx = context();
        let err = ctx.parameter::<i64>("text", 0).unwrap_err();
        assert!(matches!(err, Error::InvalidParameter { ref name, .. } if name == "text"));
    }

    #[test]
    fn works_through_trait_object() {
        let ctx = context();
        let dyn_ctx: &dyn ExecuteContext = &ctx;
        let text: String = dyn_ctx.parameter("text", 0).unwrap();
        assert_eq!(text, "hello");
    }
}

//! The BaleMessenger action node.

use {
    async_trait::async_trait,
    serde_json::{Map, Value, json},
    tracing::{info, warn},
};

use baleflow_workflow::{
    CredentialRequirement, ExecuteContext, Node, NodeDescription, NodeGroup, NodeItem,
    ParameterExt,
};

use crate::{
    Error, Result,
    api::{
        BaleClient, DeleteMessage, EditMessageText, InputFile, MediaOptions, SendChatAction,
        SendMessage, SendSticker,
    },
    credentials::{BaleApiCredentials, CREDENTIAL_NAME},
    markup::reply_markup_for_item,
    operation::{ChatAction, MediaKind, MessageType, Operation, Resource, params},
};

pub const DESCRIPTION: NodeDescription = NodeDescription {
    name: "baleMessenger",
    display_name: "BaleMessenger",
    description: "Sends data to BaleMessenger",
    group: NodeGroup::Output,
    version: 1,
    credentials: &[CredentialRequirement {
        name: CREDENTIAL_NAME,
        required: true,
    }],
    webhooks: &[],
};

/// Default binary property holding the file to upload.
const DEFAULT_BINARY_PROPERTY: &str = "data";

#[derive(Debug, Clone, Copy, Default)]
pub struct BaleMessengerNode;

impl BaleMessengerNode {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Node for BaleMessengerNode {
    fn description(&self) -> &NodeDescription {
        &DESCRIPTION
    }

    async fn execute(
        &self,
        ctx: &dyn ExecuteContext,
    ) -> baleflow_workflow::Result<Vec<Vec<NodeItem>>> {
        let resource: String = ctx.parameter_or(params::RESOURCE, 0, "message".into())?;
        let Resource::Message = resource.parse::<Resource>()?;
        let operation: String =
            ctx.parameter_or(params::OPERATION, 0, Operation::SendMessage.as_str().into())?;
        let operation = operation.parse::<Operation>()?;

        let client = BaleApiCredentials::from_execute_context(ctx).await?.client()?;

        let item_count = ctx.input_items().len();
        let mut output = Vec::with_capacity(item_count);
        for item_index in 0..item_count {
            match run_operation(&client, ctx, operation, item_index).await {
                Ok(json) => {
                    info!(
                        operation = operation.as_str(),
                        item_index, "bale operation completed"
                    );
                    output.push(NodeItem::from_value(json).paired_with(item_index));
                },
                Err(e) if ctx.continue_on_fail() => {
                    warn!(
                        operation = operation.as_str(),
                        item_index,
                        error = %e,
                        "bale operation failed, continuing"
                    );
                    output.push(
                        NodeItem::from_value(json!({ "error": e.to_string() }))
                            .paired_with(item_index),
                    );
                },
                Err(e) => return Err(baleflow_workflow::Error::node(item_index, e)),
            }
        }

        Ok(vec![output])
    }
}

async fn run_operation(
    client: &BaleClient,
    ctx: &dyn ExecuteContext,
    operation: Operation,
    i: usize,
) -> Result<Value> {
    match operation {
        Operation::SendMessage => {
            let chat_id = chat_id(ctx, i)?;
            let text: String = ctx.parameter(params::TEXT, i)?;
            let reply_markup = reply_markup_for_item(ctx, i)?;
            client
                .send_message(&SendMessage {
                    chat_id: &chat_id,
                    text: &text,
                    reply_to_message_id: reply_to_message_id(ctx, i)?,
                    reply_markup: reply_markup.as_ref(),
                })
                .await
        },
        Operation::EditMessageText => edit_message_text(client, ctx, i).await,
        Operation::DeleteMessage => {
            let chat_id = chat_id(ctx, i)?;
            let message_id = required_integer(ctx, params::MESSAGE_ID, i)?;
            client
                .delete_message(&DeleteMessage {
                    chat_id: &chat_id,
                    message_id,
                })
                .await?;
            Ok(json!({ "messageDeleted": true }))
        },
        Operation::SendChatAction => {
            let chat_id = chat_id(ctx, i)?;
            let action: ChatAction = ctx.parameter_or(params::ACTION, i, ChatAction::default())?;
            client
                .send_chat_action(&SendChatAction {
                    chat_id: &chat_id,
                    action: action.as_str(),
                })
                .await?;
            Ok(json!({ "chatActionSent": true, "action": action.as_str() }))
        },
        Operation::SendSticker => {
            let chat_id = chat_id(ctx, i)?;
            let sticker: String = ctx.parameter(params::STICKER_ID, i)?;
            client
                .send_sticker(&SendSticker {
                    chat_id: &chat_id,
                    sticker: &sticker,
                    reply_to_message_id: reply_to_message_id(ctx, i)?,
                })
                .await
        },
        Operation::SendDocument
        | Operation::SendPhoto
        | Operation::SendAudio
        | Operation::SendVideo => {
            let kind = operation
                .media_kind()
                .ok_or_else(|| Error::UnknownOperation(operation.as_str().into()))?;
            send_media(client, ctx, kind, i).await
        },
    }
}

async fn edit_message_text(
    client: &BaleClient,
    ctx: &dyn ExecuteContext,
    i: usize,
) -> Result<Value> {
    let message_type: MessageType =
        ctx.parameter_or(params::MESSAGE_TYPE, i, MessageType::Message)?;
    let text: String = ctx.parameter(params::TEXT, i)?;
    let reply_markup = reply_markup_for_item(ctx, i)?;

    let (chat_id, message_id, inline_message_id) = match message_type {
        MessageType::Message => (
            Some(chat_id(ctx, i)?),
            Some(required_integer(ctx, params::MESSAGE_ID, i)?),
            None,
        ),
        MessageType::InlineMessage => {
            let id: String = ctx.parameter(params::INLINE_MESSAGE_ID, i)?;
            (None, None, Some(id))
        },
    };

    client
        .edit_message_text(&EditMessageText {
            chat_id: chat_id.as_deref(),
            message_id,
            inline_message_id: inline_message_id.as_deref(),
            text: &text,
            reply_markup: reply_markup.as_ref(),
        })
        .await?;

    let mut out = Map::new();
    out.insert("text".into(), Value::String(text));
    if let Some(chat_id) = chat_id {
        out.insert("chat_id".into(), Value::String(chat_id));
    }
    if let Some(message_id) = message_id {
        out.insert("message_id".into(), message_id.into());
    }
    if let Some(inline_message_id) = inline_message_id {
        out.insert("inline_message_id".into(), Value::String(inline_message_id));
    }
    Ok(Value::Object(out))
}

async fn send_media(
    client: &BaleClient,
    ctx: &dyn ExecuteContext,
    kind: MediaKind,
    i: usize,
) -> Result<Value> {
    let chat_id = chat_id(ctx, i)?;
    let binary_data: bool = ctx.parameter_or(params::BINARY_DATA, i, false)?;

    let file = if binary_data {
        let property: String =
            ctx.parameter_or(params::BINARY_PROPERTY_NAME, i, DEFAULT_BINARY_PROPERTY.into())?;
        let binary = ctx
            .input_items()
            .get(i)
            .and_then(|item| item.binary.get(&property))
            .ok_or_else(|| baleflow_workflow::Error::MissingBinaryData {
                item_index: i,
                property: property.clone(),
            })?;
        InputFile::Memory {
            bytes: binary.decode()?,
            file_name: binary
                .file_name
                .clone()
                .unwrap_or_else(|| kind.default_file_name().into()),
            mime_type: binary.mime_type.clone(),
        }
    } else {
        InputFile::FileId(ctx.parameter(params::FILE_ID, i)?)
    };

    let caption: String = ctx.parameter_or(params::CAPTION, i, String::new())?;
    let reply_markup = reply_markup_for_item(ctx, i)?;
    let options = MediaOptions {
        caption: (!caption.is_empty()).then_some(caption.as_str()),
        reply_to_message_id: reply_to_message_id(ctx, i)?,
        reply_markup: reply_markup.as_ref(),
    };

    client.send_media(kind, &chat_id, file, &options).await
}

/// Chat id as a string; numeric values are accepted.
fn chat_id(ctx: &dyn ExecuteContext, i: usize) -> Result<String> {
    match ctx.node_parameter(params::CHAT_ID, i) {
        Some(Value::String(id)) if !id.trim().is_empty() => Ok(id.trim().to_string()),
        Some(Value::Number(id)) => Ok(id.to_string()),
        None | Some(Value::Null) | Some(Value::String(_)) => {
            Err(baleflow_workflow::Error::missing_parameter(params::CHAT_ID).into())
        },
        Some(other) => Err(baleflow_workflow::Error::invalid_parameter(
            params::CHAT_ID,
            format!("expected a string or number, got {other}"),
        )
        .into()),
    }
}

/// An integer parameter given as a number or a numeric string.
fn integer_parameter(ctx: &dyn ExecuteContext, name: &str, i: usize) -> Result<Option<i64>> {
    let invalid = |message: String| -> Error {
        baleflow_workflow::Error::invalid_parameter(name, message).into()
    };
    match ctx.node_parameter(name, i) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_i64()
            .map(Some)
            .ok_or_else(|| invalid(format!("{n} is not an integer"))),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => s
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|e| invalid(format!("'{s}': {e}"))),
        Some(other) => Err(invalid(format!("expected an integer, got {other}"))),
    }
}

fn required_integer(ctx: &dyn ExecuteContext, name: &str, i: usize) -> Result<i64> {
    integer_parameter(ctx, name, i)?
        .ok_or_else(|| baleflow_workflow::Error::missing_parameter(name).into())
}

/// `0` means the message is not a reply.
fn reply_to_message_id(ctx: &dyn ExecuteContext, i: usize) -> Result<Option<i64>> {
    Ok(integer_parameter(ctx, params::REPLY_TO_MESSAGE_ID, i)?.filter(|id| *id != 0))
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::test_support::MockBaleApi,
        baleflow_workflow::{BinaryData, memory::StaticExecuteContext},
        rstest::rstest,
    };

    fn context(mock: &MockBaleApi, operation: &str, items: usize) -> StaticExecuteContext {
        StaticExecuteContext::new(vec![NodeItem::default(); items])
            .with_credentials(CREDENTIAL_NAME, mock.credentials())
            .with_parameter(params::OPERATION, json!(operation))
            .with_parameter(params::CHAT_ID, json!("4242"))
    }

    async fn run(ctx: &StaticExecuteContext) -> baleflow_workflow::Result<Vec<NodeItem>> {
        let mut outputs = BaleMessengerNode::new().execute(ctx).await?;
        assert_eq!(outputs.len(), 1);
        Ok(outputs.remove(0))
    }

    #[test]
    fn description_metadata() {
        let desc = BaleMessengerNode.description();
        assert_eq!(desc.name, "baleMessenger");
        assert_eq!(desc.group, NodeGroup::Output);
        assert_eq!(desc.credentials[0].name, "baleMessengerApi");
        assert!(desc.credentials[0].required);
        assert!(desc.webhooks.is_empty());
    }

    #[tokio::test]
    async fn send_message_per_item_with_markup() {
        let mock = MockBaleApi::start().await;
        let ctx = context(&mock, "sendMessage", 2)
            .with_parameter(params::TEXT, json!("hello"))
            .with_item_parameter(1, params::TEXT, json!("second"))
            .with_parameter("replyMarkup", json!("inlineKeyboard"))
            .with_parameter(
                "inlineKeyboard",
                json!({"rows": [{"row": {"buttons": [
                    {"text": "Open", "additionalFields": {"url": "https://ble.ir"}}
                ]}}]}),
            )
            .with_parameter(params::REPLY_TO_MESSAGE_ID, json!(0));

        let items = run(&ctx).await.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].json["text"], "hello");
        assert_eq!(items[1].json["text"], "second");
        assert_eq!(items[1].paired_item.unwrap().item, 1);

        let calls = mock.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].method, "sendMessage");
        assert_eq!(
            calls[0].json,
            json!({
                "chat_id": "4242",
                "text": "hello",
                "reply_markup": {"inline_keyboard": [[{"text": "Open", "url": "https://ble.ir"}]]}
            })
        );
    }

    #[tokio::test]
    async fn edit_message_in_chat() {
        let mock = MockBaleApi::start().await;
        let ctx = context(&mock, "editMessageText", 1)
            .with_parameter(params::TEXT, json!("updated"))
            .with_parameter(params::MESSAGE_ID, json!("17"));

        let items = run(&ctx).await.unwrap();
        assert_eq!(
            Value::Object(items[0].json.clone()),
            json!({"text": "updated", "chat_id": "4242", "message_id": 17})
        );
        assert_eq!(
            mock.calls()[0].json,
            json!({"chat_id": "4242", "message_id": 17, "text": "updated"})
        );
    }

    #[tokio::test]
    async fn edit_inline_message() {
        let mock = MockBaleApi::start().await;
        let ctx = context(&mock, "editMessageText", 1)
            .with_parameter(params::MESSAGE_TYPE, json!("inlineMessage"))
            .with_parameter(params::INLINE_MESSAGE_ID, json!("AAQ-inline"))
            .with_parameter(params::TEXT, json!("updated"))
            .with_parameter("replyMarkup", json!("forceReply"))
            .with_parameter("forceReply", json!({"force_reply": true}));

        let items = run(&ctx).await.unwrap();
        assert_eq!(items[0].json["inline_message_id"], "AAQ-inline");
        assert!(!items[0].json.contains_key("chat_id"));

        let call = &mock.calls()[0];
        assert_eq!(call.json["inline_message_id"], "AAQ-inline");
        assert_eq!(call.json["reply_markup"], json!({"force_reply": true}));
        assert!(call.json.get("chat_id").is_none());
    }

    #[tokio::test]
    async fn delete_message() {
        let mock = MockBaleApi::start().await;
        let ctx = context(&mock, "deleteMessage", 1).with_parameter(params::MESSAGE_ID, json!(99));

        let items = run(&ctx).await.unwrap();
        assert_eq!(items[0].json["messageDeleted"], true);
        assert_eq!(mock.calls()[0].json, json!({"chat_id": "4242", "message_id": 99}));
    }

    #[rstest]
    #[case(None, "typing")]
    #[case(Some("record_audio"), "record_audio")]
    #[case(Some("upload_document"), "upload_document")]
    #[tokio::test]
    async fn chat_action(#[case] configured: Option<&str>, #[case] expected: &str) {
        let mock = MockBaleApi::start().await;
        let mut ctx = context(&mock, "sendChatAction", 1);
        if let Some(action) = configured {
            ctx = ctx.with_parameter(params::ACTION, json!(action));
        }

        let items = run(&ctx).await.unwrap();
        assert_eq!(items[0].json["chatActionSent"], true);
        assert_eq!(items[0].json["action"], expected);
        assert_eq!(mock.calls()[0].json["action"], expected);
    }

    #[tokio::test]
    async fn send_sticker() {
        let mock = MockBaleApi::start().await;
        let ctx = context(&mock, "sendSticker", 1)
            .with_parameter(params::STICKER_ID, json!("CAACAgIAAxk"))
            .with_parameter(params::REPLY_TO_MESSAGE_ID, json!(5));

        run(&ctx).await.unwrap();
        assert_eq!(
            mock.calls()[0].json,
            json!({"chat_id": "4242", "sticker": "CAACAgIAAxk", "reply_to_message_id": 5})
        );
    }

    #[tokio::test]
    async fn upload_reads_binary_of_each_item() {
        let mock = MockBaleApi::start().await;
        let items = vec![
            NodeItem::default().with_binary(
                "data",
                BinaryData::from_bytes(b"first-file", "text/plain", Some("a.txt".into())),
            ),
            NodeItem::default().with_binary(
                "data",
                BinaryData::from_bytes(b"second-file", "text/plain", None),
            ),
        ];
        let ctx = StaticExecuteContext::new(items)
            .with_credentials(CREDENTIAL_NAME, mock.credentials())
            .with_parameter(params::OPERATION, json!("sendDocument"))
            .with_parameter(params::CHAT_ID, json!(4242))
            .with_parameter(params::BINARY_DATA, json!(true))
            .with_parameter(params::CAPTION, json!("weekly report"));

        let out = run(&ctx).await.unwrap();
        assert_eq!(out.len(), 2);

        let calls = mock.calls();
        assert_eq!(calls[0].method, "sendDocument");
        assert!(calls[0].raw.contains("filename=\"a.txt\""));
        assert!(calls[0].raw.contains("first-file"));
        assert!(calls[0].raw.contains("weekly report"));
        assert!(calls[1].raw.contains("filename=\"document\""));
        assert!(calls[1].raw.contains("second-file"));
    }

    #[tokio::test]
    async fn send_photo_by_file_id_skips_empty_caption() {
        let mock = MockBaleApi::start().await;
        let ctx = context(&mock, "sendPhoto", 1)
            .with_parameter(params::FILE_ID, json!("AgACAgQ"))
            .with_parameter(params::CAPTION, json!(""));

        run(&ctx).await.unwrap();
        assert_eq!(
            mock.calls()[0].json,
            json!({"chat_id": "4242", "photo": "AgACAgQ"})
        );
    }

    #[tokio::test]
    async fn missing_binary_property_is_reported() {
        let mock = MockBaleApi::start().await;
        let ctx = context(&mock, "sendVideo", 1)
            .with_parameter(params::BINARY_DATA, json!(true))
            .with_parameter(params::BINARY_PROPERTY_NAME, json!("clip"));

        let err = run(&ctx).await.unwrap_err();
        assert!(matches!(
            err,
            baleflow_workflow::Error::Node { item_index: 0, .. }
        ));
        assert!(err.to_string().contains("clip"));
        assert!(mock.calls().is_empty());
    }

    #[tokio::test]
    async fn api_error_aborts_with_item_index() {
        let mock = MockBaleApi::start().await;
        mock.fail_method("sendMessage", 403, "Forbidden: bot was blocked by the user");
        let ctx = context(&mock, "sendMessage", 2).with_parameter(params::TEXT, json!("hi"));

        let err = run(&ctx).await.unwrap_err();
        assert!(matches!(err, baleflow_workflow::Error::Node { item_index: 0, .. }));
        assert!(err.to_string().contains("bot was blocked"));
        assert_eq!(mock.calls().len(), 1);
    }

    #[tokio::test]
    async fn continue_on_fail_emits_error_items() {
        let mock = MockBaleApi::start().await;
        let ctx = context(&mock, "sendMessage", 2)
            .with_parameter(params::TEXT, json!("hi"))
            .with_item_parameter(0, params::CHAT_ID, json!(""))
            .with_continue_on_fail(true);

        let items = run(&ctx).await.unwrap();
        assert_eq!(items.len(), 2);
        assert!(
            items[0].json["error"]
                .as_str()
                .unwrap()
                .contains("chatId")
        );
        assert_eq!(items[0].paired_item.unwrap().item, 0);
        assert_eq!(items[1].json["text"], "hi");
        assert_eq!(mock.calls().len(), 1);
    }

    #[tokio::test]
    async fn unknown_operation_is_invalid_parameter() {
        let mock = MockBaleApi::start().await;
        let ctx = context(&mock, "sendPoll", 1);

        let err = run(&ctx).await.unwrap_err();
        assert!(matches!(
            err,
            baleflow_workflow::Error::InvalidParameter { ref name, .. } if name == "operation"
        ));
    }

    #[tokio::test]
    async fn unknown_markup_mode_fails_item() {
        let mock = MockBaleApi::start().await;
        let ctx = context(&mock, "sendMessage", 1)
            .with_parameter(params::TEXT, json!("hi"))
            .with_parameter("replyMarkup", json!("sideways"));

        let err = run(&ctx).await.unwrap_err();
        assert!(err.to_string().contains("sideways"));
        assert!(mock.calls().is_empty());
    }

    #[tokio::test]
    async fn missing_credentials() {
        let ctx = StaticExecuteContext::new(vec![NodeItem::default()])
            .with_parameter(params::OPERATION, json!("sendMessage"));

        let err = BaleMessengerNode.execute(&ctx).await.unwrap_err();
        assert!(matches!(
            err,
            baleflow_workflow::Error::MissingCredentials { ref name } if name == "baleMessengerApi"
        ));
    }

    #[rstest]
    #[case(json!(12), Some(12))]
    #[case(json!("34"), Some(34))]
    #[case(json!(""), None)]
    #[case(json!(null), None)]
    fn integer_parameters_accept_numbers_and_strings(
        #[case] raw: Value,
        #[case] expected: Option<i64>,
    ) {
        let ctx = StaticExecuteContext::default().with_parameter(params::MESSAGE_ID, raw);
        assert_eq!(integer_parameter(&ctx, params::MESSAGE_ID, 0).unwrap(), expected);
    }

    #[test]
    fn non_numeric_message_id_rejected() {
        let ctx = StaticExecuteContext::default().with_parameter(params::MESSAGE_ID, json!("abc"));
        assert!(integer_parameter(&ctx, params::MESSAGE_ID, 0).is_err());
    }
}

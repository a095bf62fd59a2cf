//! Minimal Bale Bot API client.
//!
//! Every method is `POST {base}/bot{token}/{method}` with a JSON body or,
//! for file uploads, a multipart form. Results are returned as raw JSON so
//! message objects reach the workflow unchanged.

use {
    reqwest::multipart::{Form, Part},
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
    serde_json::Value,
    tracing::{debug, info},
    url::Url,
};

use crate::{Error, Result, markup::ReplyMarkup, operation::MediaKind};

#[derive(Debug, Serialize)]
pub struct SendMessage<'a> {
    pub chat_id: &'a str,
    pub text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to_message_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<&'a ReplyMarkup>,
}

/// Either `chat_id` + `message_id` or `inline_message_id` is set.
#[derive(Debug, Serialize)]
pub struct EditMessageText<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chat_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inline_message_id: Option<&'a str>,
    pub text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<&'a ReplyMarkup>,
}

#[derive(Debug, Serialize)]
pub struct DeleteMessage<'a> {
    pub chat_id: &'a str,
    pub message_id: i64,
}

#[derive(Debug, Serialize)]
pub struct SendChatAction<'a> {
    pub chat_id: &'a str,
    pub action: &'a str,
}

#[derive(Debug, Serialize)]
pub struct SendSticker<'a> {
    pub chat_id: &'a str,
    pub sticker: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to_message_id: Option<i64>,
}

#[derive(Debug, Serialize)]
struct SetWebhook<'a> {
    url: &'a str,
}

/// Shared fields of the media upload methods.
#[derive(Debug, Default)]
pub struct MediaOptions<'a> {
    pub caption: Option<&'a str>,
    pub reply_to_message_id: Option<i64>,
    pub reply_markup: Option<&'a ReplyMarkup>,
}

/// A file to send: either already stored on Bale or uploaded from memory.
#[derive(Clone)]
pub enum InputFile {
    FileId(String),
    Memory {
        bytes: Vec<u8>,
        file_name: String,
        mime_type: String,
    },
}

impl std::fmt::Debug for InputFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FileId(id) => f.debug_tuple("FileId").field(id).finish(),
            Self::Memory {
                bytes,
                file_name,
                mime_type,
            } => f
                .debug_struct("Memory")
                .field("len", &bytes.len())
                .field("file_name", file_name)
                .field("mime_type", mime_type)
                .finish(),
        }
    }
}

/// The Bot API response envelope.
#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    error_code: Option<i64>,
}

/// Client bound to one bot token.
#[derive(Clone)]
pub struct BaleClient {
    http: reqwest::Client,
    api_url: Url,
    token: Secret<String>,
}

impl std::fmt::Debug for BaleClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BaleClient")
            .field("api_url", &self.api_url.as_str())
            .field("token", &"[REDACTED]")
            .finish()
    }
}

impl BaleClient {
    pub fn new(api_url: &str, token: Secret<String>) -> Result<Self> {
        Ok(Self {
            http: reqwest::Client::new(),
            api_url: Url::parse(api_url)?,
            token,
        })
    }

    pub fn api_url(&self) -> &Url {
        &self.api_url
    }

    fn method_url(&self, method: &str) -> String {
        format!(
            "{}/bot{}/{method}",
            self.api_url.as_str().trim_end_matches('/'),
            self.token.expose_secret()
        )
    }

    /// Call a method with a JSON body and return its `result`.
    pub async fn call<T: Serialize + ?Sized>(&self, method: &str, body: &T) -> Result<Value> {
        debug!(method, "bale api request");
        let resp = self
            .http
            .post(self.method_url(method))
            .json(body)
            .send()
            .await
            .map_err(reqwest::Error::without_url)?;
        Self::unwrap_response(method, resp).await
    }

    /// Call a method with a multipart body and return its `result`.
    pub async fn call_multipart(&self, method: &str, form: Form) -> Result<Value> {
        debug!(method, "bale api multipart request");
        let resp = self
            .http
            .post(self.method_url(method))
            .multipart(form)
            .send()
            .await
            .map_err(reqwest::Error::without_url)?;
        Self::unwrap_response(method, resp).await
    }

    async fn unwrap_response(method: &str, resp: reqwest::Response) -> Result<Value> {
        let status = resp.status();
        let body = resp.text().await.map_err(reqwest::Error::without_url)?;

        let envelope: ApiResponse = match serde_json::from_str(&body) {
            Ok(envelope) => envelope,
            Err(_) if !status.is_success() => {
                return Err(Error::api(method, i64::from(status.as_u16()), body));
            },
            Err(e) => return Err(e.into()),
        };

        if !envelope.ok || !status.is_success() {
            let code = envelope
                .error_code
                .unwrap_or_else(|| i64::from(status.as_u16()));
            let description = envelope
                .description
                .unwrap_or_else(|| "request failed".into());
            return Err(Error::api(method, code, description));
        }

        info!(method, "bale api call succeeded");
        Ok(envelope.result.unwrap_or(Value::Null))
    }

    pub async fn send_message(&self, request: &SendMessage<'_>) -> Result<Value> {
        self.call("sendMessage", request).await
    }

    pub async fn edit_message_text(&self, request: &EditMessageText<'_>) -> Result<Value> {
        self.call("editMessageText", request).await
    }

    pub async fn delete_message(&self, request: &DeleteMessage<'_>) -> Result<Value> {
        self.call("deleteMessage", request).await
    }

    pub async fn send_chat_action(&self, request: &SendChatAction<'_>) -> Result<Value> {
        self.call("sendChatAction", request).await
    }

    pub async fn send_sticker(&self, request: &SendSticker<'_>) -> Result<Value> {
        self.call("sendSticker", request).await
    }

    /// Send a document, photo, audio or video.
    ///
    /// A file id is sent as a JSON body; in-memory bytes are uploaded as
    /// multipart, with `reply_markup` encoded as a JSON string field.
    pub async fn send_media(
        &self,
        kind: MediaKind,
        chat_id: &str,
        file: InputFile,
        options: &MediaOptions<'_>,
    ) -> Result<Value> {
        match file {
            InputFile::FileId(file_id) => {
                let mut body = serde_json::Map::new();
                body.insert("chat_id".into(), Value::String(chat_id.into()));
                body.insert(kind.field().into(), Value::String(file_id));
                if let Some(caption) = options.caption {
                    body.insert("caption".into(), Value::String(caption.into()));
                }
                if let Some(reply_to) = options.reply_to_message_id {
                    body.insert("reply_to_message_id".into(), reply_to.into());
                }
                if let Some(markup) = options.reply_markup {
                    body.insert("reply_markup".into(), serde_json::to_value(markup)?);
                }
                self.call(kind.method(), &body).await
            },
            InputFile::Memory {
                bytes,
                file_name,
                mime_type,
            } => {
                let part = Part::bytes(bytes)
                    .file_name(file_name)
                    .mime_str(&mime_type)
                    .map_err(|e| Error::external(format!("invalid mime type '{mime_type}'"), e))?;
                let mut form = Form::new()
                    .text("chat_id", chat_id.to_string())
                    .part(kind.field(), part);
                if let Some(caption) = options.caption {
                    form = form.text("caption", caption.to_string());
                }
                if let Some(reply_to) = options.reply_to_message_id {
                    form = form.text("reply_to_message_id", reply_to.to_string());
                }
                if let Some(markup) = options.reply_markup {
                    form = form.text("reply_markup", serde_json::to_string(markup)?);
                }
                self.call_multipart(kind.method(), form).await
            },
        }
    }

    pub async fn get_webhook_info(&self) -> Result<Value> {
        self.call("getWebhookInfo", &serde_json::Map::new()).await
    }

    pub async fn set_webhook(&self, url: &str) -> Result<Value> {
        self.call("setWebhook", &SetWebhook { url }).await
    }

    pub async fn delete_webhook(&self) -> Result<Value> {
        self.call("deleteWebhook", &serde_json::Map::new()).await
    }
}

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Parameter names the action node reads from the host.
pub mod params {
    pub const RESOURCE: &str = "resource";
    pub const OPERATION: &str = "operation";
    pub const CHAT_ID: &str = "chatId";
    pub const TEXT: &str = "text";
    pub const CAPTION: &str = "caption";
    pub const MESSAGE_TYPE: &str = "messageType";
    pub const MESSAGE_ID: &str = "messageId";
    pub const INLINE_MESSAGE_ID: &str = "inlineMessageId";
    pub const REPLY_TO_MESSAGE_ID: &str = "replyToMessageId";
    pub const STICKER_ID: &str = "stickerId";
    pub const ACTION: &str = "action";
    pub const BINARY_DATA: &str = "binaryData";
    pub const BINARY_PROPERTY_NAME: &str = "binaryPropertyName";
    pub const FILE_ID: &str = "fileId";
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Resource {
    #[default]
    Message,
}

impl FromStr for Resource {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "message" => Ok(Self::Message),
            other => Err(Error::message(format!("unknown resource: {other}"))),
        }
    }
}

/// What the action node does for each input item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Operation {
    DeleteMessage,
    EditMessageText,
    SendAudio,
    SendChatAction,
    SendDocument,
    #[default]
    SendMessage,
    SendPhoto,
    SendSticker,
    SendVideo,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DeleteMessage => "deleteMessage",
            Self::EditMessageText => "editMessageText",
            Self::SendAudio => "sendAudio",
            Self::SendChatAction => "sendChatAction",
            Self::SendDocument => "sendDocument",
            Self::SendMessage => "sendMessage",
            Self::SendPhoto => "sendPhoto",
            Self::SendSticker => "sendSticker",
            Self::SendVideo => "sendVideo",
        }
    }

    /// The kind of file an upload operation sends.
    pub fn media_kind(self) -> Option<MediaKind> {
        match self {
            Self::SendDocument => Some(MediaKind::Document),
            Self::SendPhoto => Some(MediaKind::Photo),
            Self::SendAudio => Some(MediaKind::Audio),
            Self::SendVideo => Some(MediaKind::Video),
            _ => None,
        }
    }
}

impl FromStr for Operation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "deleteMessage" => Ok(Self::DeleteMessage),
            "editMessageText" => Ok(Self::EditMessageText),
            "sendAudio" => Ok(Self::SendAudio),
            "sendChatAction" => Ok(Self::SendChatAction),
            "sendDocument" => Ok(Self::SendDocument),
            "sendMessage" => Ok(Self::SendMessage),
            "sendPhoto" => Ok(Self::SendPhoto),
            "sendSticker" => Ok(Self::SendSticker),
            "sendVideo" => Ok(Self::SendVideo),
            other => Err(Error::UnknownOperation(other.to_string())),
        }
    }
}

/// Which message `editMessageText` targets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MessageType {
    /// A message sent via inline mode, addressed by its inline message id.
    InlineMessage,
    /// A chat message, addressed by chat id and message id.
    #[default]
    Message,
}

/// Status broadcast by `sendChatAction`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatAction {
    FindLocation,
    RecordAudio,
    RecordVideo,
    RecordVideoNote,
    #[default]
    Typing,
    UploadAudio,
    UploadDocument,
    UploadPhoto,
    UploadVideo,
    UploadVideoNote,
}

impl ChatAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FindLocation => "find_location",
            Self::RecordAudio => "record_audio",
            Self::RecordVideo => "record_video",
            Self::RecordVideoNote => "record_video_note",
            Self::Typing => "typing",
            Self::UploadAudio => "upload_audio",
            Self::UploadDocument => "upload_document",
            Self::UploadPhoto => "upload_photo",
            Self::UploadVideo => "upload_video",
            Self::UploadVideoNote => "upload_video_note",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Document,
    Photo,
    Audio,
    Video,
}

impl MediaKind {
    /// Bot API method that sends this kind of file.
    pub fn method(self) -> &'static str {
        match self {
            Self::Document => "sendDocument",
            Self::Photo => "sendPhoto",
            Self::Audio => "sendAudio",
            Self::Video => "sendVideo",
        }
    }

    /// Request field carrying the file.
    pub fn field(self) -> &'static str {
        match self {
            Self::Document => "document",
            Self::Photo => "photo",
            Self::Audio => "audio",
            Self::Video => "video",
        }
    }

    /// File name used when the binary payload has none.
    pub fn default_file_name(self) -> &'static str {
        match self {
            Self::Document => "document",
            Self::Photo => "photo.jpg",
            Self::Audio => "audio.mp3",
            Self::Video => "video.mp4",
        }
    }
}

//! Reply markup (keyboards attached to outgoing messages).
//!
//! The host stores the selected mode under `replyMarkup` and the keyboard
//! for that mode under a parameter named after the mode itself
//! (`inlineKeyboard`, `replyKeyboard`, `replyKeyboardRemove`, `forceReply`).
//! [`build_reply_markup`] turns those values into the `reply_markup` field
//! of a Bot API request.

use std::str::FromStr;

use {
    serde::{Deserialize, Serialize},
    serde_json::{Map, Value},
    tracing::warn,
};

use baleflow_workflow::{ExecuteContext, ParameterExt};

use crate::{Error, Result};

/// Parameter holding the selected [`MarkupMode`].
pub const REPLY_MARKUP: &str = "replyMarkup";

/// Which kind of reply interface is attached to a message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MarkupMode {
    #[default]
    None,
    InlineKeyboard,
    ReplyKeyboard,
    ReplyKeyboardRemove,
    ForceReply,
}

impl MarkupMode {
    /// Host value of the mode; also the name of the parameter carrying the
    /// mode's configuration.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::InlineKeyboard => "inlineKeyboard",
            Self::ReplyKeyboard => "replyKeyboard",
            Self::ReplyKeyboardRemove => "replyKeyboardRemove",
            Self::ForceReply => "forceReply",
        }
    }
}

impl FromStr for MarkupMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "none" => Ok(Self::None),
            "inlineKeyboard" => Ok(Self::InlineKeyboard),
            "replyKeyboard" => Ok(Self::ReplyKeyboard),
            "replyKeyboardRemove" => Ok(Self::ReplyKeyboardRemove),
            "forceReply" => Ok(Self::ForceReply),
            other => Err(Error::UnknownMarkupMode(other.to_string())),
        }
    }
}

/// Keyboard configuration as the host stores it:
/// `{ "rows": [ { "row": { "buttons": [ ... ] } } ] }`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeyboardSpec {
    #[serde(default)]
    pub rows: Vec<KeyboardRow>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeyboardRow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row: Option<RowButtons>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RowButtons {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buttons: Option<Vec<ButtonSpec>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ButtonSpec {
    #[serde(default)]
    pub text: String,
    #[serde(
        default,
        rename = "additionalFields",
        skip_serializing_if = "Option::is_none"
    )]
    pub additional_fields: Option<ButtonFields>,
}

/// Optional inline-button behaviour.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonFields {
    /// Payload of the callback query sent when the button is pressed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callback_data: Option<String>,
    /// Link opened when the button is pressed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl KeyboardSpec {
    /// Build a spec from rows; `None` stands for a row without buttons.
    pub fn from_rows(rows: impl IntoIterator<Item = Option<Vec<ButtonSpec>>>) -> Self {
        Self {
            rows: rows
                .into_iter()
                .map(|buttons| KeyboardRow {
                    row: Some(RowButtons { buttons }),
                })
                .collect(),
        }
    }
}

impl ButtonSpec {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            additional_fields: None,
        }
    }

    #[must_use]
    pub fn with_callback_data(mut self, data: impl Into<String>) -> Self {
        self.additional_fields
            .get_or_insert_with(ButtonFields::default)
            .callback_data = Some(data.into());
        self
    }

    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.additional_fields
            .get_or_insert_with(ButtonFields::default)
            .url = Some(url.into());
        self
    }
}

/// A button as sent to the Bot API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyboardButton {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback_data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// The `reply_markup` field of an outgoing message.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ReplyMarkup {
    InlineKeyboard {
        inline_keyboard: Vec<Vec<KeyboardButton>>,
    },
    Keyboard {
        keyboard: Vec<Vec<KeyboardButton>>,
    },
    /// Force-reply and keyboard-remove settings, sent as configured.
    Passthrough(Value),
}

/// Build the reply markup for `mode`.
///
/// `lookup` returns the configured value of a parameter for the current
/// item. A missing or malformed keyboard yields an empty keyboard; rows
/// without a button list are skipped.
pub fn build_reply_markup<F>(mode: MarkupMode, lookup: F) -> Option<ReplyMarkup>
where
    F: Fn(&str) -> Option<Value>,
{
    match mode {
        MarkupMode::None => None,
        MarkupMode::ForceReply | MarkupMode::ReplyKeyboardRemove => {
            let value = lookup(mode.as_str())
                .filter(|v| !v.is_null())
                .unwrap_or_else(|| Value::Object(Map::new()));
            Some(ReplyMarkup::Passthrough(value))
        },
        MarkupMode::InlineKeyboard | MarkupMode::ReplyKeyboard => {
            let spec = keyboard_spec(mode, lookup(mode.as_str()));
            Some(build_keyboard(mode, &spec))
        },
    }
}

/// Build a keyboard markup from a spec. Only inline keyboards carry the
/// buttons' additional fields.
pub fn build_keyboard(mode: MarkupMode, spec: &KeyboardSpec) -> ReplyMarkup {
    let inline = mode == MarkupMode::InlineKeyboard;
    let rows: Vec<Vec<KeyboardButton>> = spec
        .rows
        .iter()
        .filter_map(|row| row.row.as_ref()?.buttons.as_ref())
        .map(|buttons| {
            buttons
                .iter()
                .map(|button| keyboard_button(button, inline))
                .collect()
        })
        .collect();

    if inline {
        ReplyMarkup::InlineKeyboard {
            inline_keyboard: rows,
        }
    } else {
        ReplyMarkup::Keyboard { keyboard: rows }
    }
}

fn keyboard_button(button: &ButtonSpec, inline: bool) -> KeyboardButton {
    let mut out = KeyboardButton {
        text: button.text.clone(),
        callback_data: None,
        url: None,
    };
    if inline && let Some(fields) = &button.additional_fields {
        if let Some(data) = &fields.callback_data {
            out.callback_data = Some(data.clone());
        }
        if let Some(url) = &fields.url {
            out.url = Some(url.clone());
        }
    }
    out
}

fn keyboard_spec(mode: MarkupMode, value: Option<Value>) -> KeyboardSpec {
    match value {
        None | Some(Value::Null) => KeyboardSpec::default(),
        Some(value) => serde_json::from_value(value).unwrap_or_else(|e| {
            warn!(
                mode = mode.as_str(),
                error = %e,
                "malformed keyboard configuration, sending an empty keyboard"
            );
            KeyboardSpec::default()
        }),
    }
}

/// Reply markup configured for one input item.
///
/// An unset `replyMarkup` means no markup; an unrecognized value is an
/// error.
pub fn reply_markup_for_item(
    ctx: &dyn ExecuteContext,
    item_index: usize,
) -> Result<Option<ReplyMarkup>> {
    let mode: String =
        ctx.parameter_or(REPLY_MARKUP, item_index, MarkupMode::None.as_str().into())?;
    let mode = mode.parse::<MarkupMode>()?;
    Ok(build_reply_markup(mode, |name| ctx.node_parameter(name, item_index)))
}

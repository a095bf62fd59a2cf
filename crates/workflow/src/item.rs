use std::collections::BTreeMap;

use {
    base64::Engine,
    serde::{Deserialize, Serialize},
    serde_json::{Map, Value},
};

use crate::Result;

/// One unit of workflow data flowing between nodes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeItem {
    #[serde(default)]
    pub json: Map<String, Value>,

    /// Named binary payloads attached to the item (e.g. `data`).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub binary: BTreeMap<String, BinaryData>,

    /// Index of the input item this item was produced from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paired_item: Option<PairedItem>,
}

impl NodeItem {
    pub fn new(json: Map<String, Value>) -> Self {
        Self {
            json,
            ..Default::default()
        }
    }

    /// Wrap an arbitrary JSON value. Objects become the item's JSON directly;
    /// anything else is stored under a `data` key.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(json) => Self::new(json),
            other => {
                let mut json = Map::new();
                json.insert("data".into(), other);
                Self::new(json)
            },
        }
    }

    #[must_use]
    pub fn paired_with(mut self, item_index: usize) -> Self {
        self.paired_item = Some(PairedItem { item: item_index });
        self
    }

    #[must_use]
    pub fn with_binary(mut self, property: impl Into<String>, data: BinaryData) -> Self {
        self.binary.insert(property.into(), data);
        self
    }
}

/// Binary payload stored base64-encoded, as hosts keep it in item data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BinaryData {
    pub data: String,
    #[serde(default = "default_mime_type")]
    pub mime_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
}

fn default_mime_type() -> String {
    "application/octet-stream".into()
}

impl BinaryData {
    pub fn from_bytes(
        bytes: &[u8],
        mime_type: impl Into<String>,
        file_name: Option<String>,
    ) -> Self {
        Self {
            data: base64::engine::general_purpose::STANDARD.encode(bytes),
            mime_type: mime_type.into(),
            file_name,
        }
    }

    /// Decode the stored payload into raw bytes.
    pub fn decode(&self) -> Result<Vec<u8>> {
        Ok(base64::engine::general_purpose::STANDARD.decode(self.data.trim())?)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairedItem {
    pub item: usize,
}

/// Turn a JSON body into output items: one item per element of an array,
/// a single item otherwise.
pub fn json_array_items(value: Value) -> Vec<NodeItem> {
    match value {
        Value::Array(values) => values.into_iter().map(NodeItem::from_value).collect(),
        other => vec![NodeItem::from_value(other)],
    }
}

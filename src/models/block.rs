use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One typed unit of a story body, stored as a JSON object tagged by `type`.
///
/// Any tag this crate does not know deserializes into `Unknown`, which renders
/// as nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentBlock {
    Paragraph {
        #[serde(default)]
        text: String,
    },
    Heading {
        #[serde(default)]
        text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        level: Option<u8>,
    },
    Image {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        src: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        alt: Option<String>,
    },
    #[serde(other)]
    Unknown,
}

impl ContentBlock {
    pub fn paragraph(text: impl Into<String>) -> Self {
        ContentBlock::Paragraph { text: text.into() }
    }

    /// Decodes a stored block list. A value that is not an array yields no
    /// blocks and a malformed element becomes `Unknown`.
    pub fn list_from_value(value: Value) -> Vec<ContentBlock> {
        match value {
            Value::Array(items) => items
                .into_iter()
                .map(|item| serde_json::from_value(item).unwrap_or(ContentBlock::Unknown))
                .collect(),
            _ => Vec::new(),
        }
    }
}

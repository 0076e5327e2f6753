use serde::{Deserialize, Serialize};

use crate::downstream::types::Content;

/// Body of `POST /api/proxy`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProxyRequestBody {
    /// Informational only; logged, never branched on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<ProxyRequestData>,
}

impl ProxyRequestBody {
    pub fn contents(&self) -> &[Content] {
        self.data
            .as_ref()
            .map(|data| data.contents.as_slice())
            .unwrap_or_default()
    }

    pub fn config(&self) -> Option<&ProxyRequestConfig> {
        self.data.as_ref().and_then(|data| data.config.as_ref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProxyRequestData {
    #[serde(default)]
    pub contents: Vec<Content>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<ProxyRequestConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyRequestConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<SystemInstruction>,
}

/// The storefront sends a plain string; Gemini-style clients send a content
/// object. Both collapse to text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SystemInstruction {
    Text(String),
    Content(Content),
}

impl SystemInstruction {
    pub fn text(&self) -> String {
        match self {
            SystemInstruction::Text(text) => text.clone(),
            SystemInstruction::Content(content) => content
                .parts
                .iter()
                .filter_map(|part| part.get("text").and_then(|text| text.as_str()))
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

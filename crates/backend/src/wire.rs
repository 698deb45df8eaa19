//! Wire types for the opencode REST API.

use serde::Deserialize;

/// Shown in place of a reply that carried no text parts at all.
pub const NO_TEXT_PLACEHOLDER: &str = "(no text in response)";

/// `GET /global/health` response.
#[derive(Debug, Clone, Deserialize)]
pub struct Health {
    #[serde(default)]
    pub healthy: bool,
}

/// A conversational session on the server.
///
/// Older server builds capitalised the id key, hence the alias.
#[derive(Debug, Clone, Deserialize)]
pub struct Session {
    #[serde(alias = "ID")]
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
}

/// One part of an assistant reply.
///
/// Replies interleave plain text with tool activity; only the text parts
/// are ever shown to chat users. Unknown part kinds collapse into
/// [`Part::Other`] so new server-side part types cannot break decoding.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Part {
    Text {
        text: String,
    },
    #[serde(rename = "tool")]
    ToolCall {
        #[serde(default)]
        tool: Option<String>,
    },
    ToolResult {
        #[serde(default)]
        output: Option<String>,
    },
    #[serde(other)]
    Other,
}

/// `POST /session/{id}/message` response: message metadata plus the
/// ordered reply parts.
#[derive(Debug, Clone, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub info: serde_json::Value,
    #[serde(default)]
    pub parts: Vec<Part>,
}

/// Canonical reply text for a response: the text parts in order, joined by
/// newlines and trimmed. Falls back to [`NO_TEXT_PLACEHOLDER`] when the
/// reply contained no text (tool-only turns happen).
pub fn extract_text(response: &MessageResponse) -> String {
    let texts: Vec<&str> = response
        .parts
        .iter()
        .filter_map(|part| match part {
            Part::Text { text } => Some(text.as_str()),
            _ => None,
        })
        .collect();

    let joined = texts.join("\n");
    let trimmed = joined.trim();
    if trimmed.is_empty() {
        NO_TEXT_PLACEHOLDER.to_string()
    } else {
        trimmed.to_string()
    }
}

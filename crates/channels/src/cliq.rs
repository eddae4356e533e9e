//! Cliq webhook adapter: payload parsing, mention detection, and the
//! long-output card policy.

use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Cliq truncates messages past this length, so longer replies go out as
/// a card with a short pointer text.
pub const MESSAGE_LIMIT: usize = 4000;

/// Mention patterns that address the bot in a channel.
const BOT_TRIGGERS: [&str; 5] = ["@taskpilot", "@projects", "@bot", "projects bot", "taskpilot"];

/// Incoming webhook payload.
#[derive(Debug, Clone, Deserialize)]
pub struct CliqMessage {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub user: CliqUser,
    #[serde(default)]
    pub chat: CliqChat,
    #[serde(default)]
    pub mentions: Vec<CliqMention>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CliqUser {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub is_bot: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CliqChat {
    #[serde(rename = "type", default)]
    pub chat_type: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CliqMention {
    #[serde(rename = "type", default)]
    pub mention_type: Option<String>,
}

/// Outgoing webhook reply. An empty `text` with no card means "stay
/// silent" (the message was not addressed to the bot).
#[derive(Debug, Clone, Serialize)]
pub struct CliqResponse {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card: Option<Value>,
}

impl CliqResponse {
    pub fn silent() -> Self {
        Self {
            text: String::new(),
            card: None,
        }
    }
}

impl CliqMessage {
    /// Whether the bot should reply at all: never to bots or empty text,
    /// and in group chats only when explicitly addressed.
    pub fn should_respond(&self) -> bool {
        if self.user.is_bot || self.text.trim().is_empty() {
            return false;
        }
        let direct = matches!(self.chat.chat_type.as_deref(), Some("direct") | Some("bot"));
        direct || self.is_bot_mentioned()
    }

    pub fn is_bot_mentioned(&self) -> bool {
        if self
            .mentions
            .iter()
            .any(|m| m.mention_type.as_deref() == Some("bot"))
        {
            return true;
        }
        let lower = self.text.to_lowercase();
        BOT_TRIGGERS.iter().any(|t| lower.contains(t))
    }

    /// The utterance with mention patterns stripped and whitespace
    /// collapsed.
    pub fn clean_text(&self) -> String {
        let mut cleaned = self.text.clone();
        for trigger in BOT_TRIGGERS {
            cleaned = remove_ignore_ascii_case(&cleaned, trigger);
        }
        cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
    }
}

/// Delete every occurrence of an ASCII `needle`, matching case-insensitively.
/// ASCII bytes only case-fold against ASCII bytes, so matched regions always
/// end on char boundaries.
fn remove_ignore_ascii_case(haystack: &str, needle: &str) -> String {
    let bytes = haystack.as_bytes();
    let pattern = needle.as_bytes();
    let mut out = String::with_capacity(haystack.len());
    let mut i = 0;
    while i < bytes.len() {
        if i + pattern.len() <= bytes.len() && bytes[i..i + pattern.len()].eq_ignore_ascii_case(pattern)
        {
            i += pattern.len();
            continue;
        }
        match haystack[i..].chars().next() {
            Some(ch) => {
                out.push(ch);
                i += ch.len_utf8();
            }
            None => break,
        }
    }
    out
}

/// Apply the long-output policy: short replies go out as plain text, long
/// ones as a pointer plus a truncated card.
pub fn format_response(response: &str, user_name: &str) -> CliqResponse {
    if response.chars().count() <= MESSAGE_LIMIT {
        return CliqResponse {
            text: response.to_string(),
            card: None,
        };
    }

    let truncated: String = response.chars().take(MESSAGE_LIMIT).collect();
    CliqResponse {
        text: format!("Hi {user_name}! Here's the information you requested:"),
        card: Some(json!({
            "title": "Projects Assistant",
            "theme": "modern-inline",
            "sections": [{
                "id": 1,
                "elements": [{
                    "type": "text",
                    "text": format!("{truncated}...")
                }]
            }]
        })),
    }
}

/// Card shown when the bot is addressed with no actual question.
pub fn help_response() -> CliqResponse {
    let help_text = "Projects Assistant\n\n\
        I can help you manage your projects. Try:\n\n\
        Projects:\n\
        - \"Show me all my projects\"\n\
        - \"Create a new project called 'Website Redesign'\"\n\n\
        Tasks:\n\
        - \"Find tasks in the Marketing project\"\n\
        - \"Update task 12345 to 75% complete\"\n\n\
        Time tracking:\n\
        - \"Log 3 hours of work on task 12345\"\n\
        - \"Show my time logs for this week\"\n\n\
        Task lists:\n\
        - \"Show task lists in project 12345\"\n\n\
        Just mention me and ask your question naturally.";

    CliqResponse {
        text: String::new(),
        card: Some(json!({
            "title": "Projects Assistant",
            "theme": "modern-inline",
            "sections": [{
                "id": 1,
                "elements": [{ "type": "text", "text": help_text }]
            }]
        })),
    }
}

/// Validate a hex HMAC-SHA256 signature over the raw payload.
///
/// No configured secret means validation is off. Comparison is
/// constant-time via `verify_slice`.
pub fn validate_signature(secret: Option<&str>, payload: &[u8], signature: &str) -> bool {
    let Some(secret) = secret.filter(|s| !s.is_empty()) else {
        return true;
    };

    let sig_hex = signature.strip_prefix("sha256=").unwrap_or(signature);
    let provided = match hex::decode(sig_hex) {
        Ok(bytes) => bytes,
        Err(_) => return false,
    };

    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return false,
    };
    mac.update(payload);
    mac.verify_slice(&provided).is_ok()
}

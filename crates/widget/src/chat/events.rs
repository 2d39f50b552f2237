use parley_webhook::{WebhookError, WebhookReply};

use crate::chat::formatter::{format_reply, value_text};
use crate::chat::message::{ExchangeOutcomeKind, SubmissionId};

/// Shown when the endpoint answers successfully without usable `output`.
pub const FALLBACK_REPLY_TEXT: &str = "AI response received";
/// Shown when the endpoint answers 404.
pub const NOT_FOUND_ERROR_TEXT: &str = "Error: Webhook not found (404). Check n8n setup.";
/// Shown for every other failure: network, timeout, non-404 status.
pub const UNREACHABLE_ERROR_TEXT: &str = "Error: Could not reach AI";

/// Result of one outbound exchange.
#[derive(Debug)]
pub enum ExchangeOutcome {
    Replied(WebhookReply),
    Failed(WebhookError),
    /// The exchange task panicked before the endpoint answered.
    Aborted(String),
}

/// Delivered back to the controller when an exchange task finishes.
#[derive(Debug)]
pub struct ReplySettled {
    pub submission: SubmissionId,
    pub outcome: ExchangeOutcome,
}

impl ExchangeOutcome {
    pub fn kind(&self) -> ExchangeOutcomeKind {
        match self {
            Self::Replied(_) => ExchangeOutcomeKind::Replied,
            Self::Failed(_) | Self::Aborted(_) => ExchangeOutcomeKind::Failed,
        }
    }

    /// Text the assistant bubble should carry, before formatting.
    pub fn display_text(&self) -> String {
        match self {
            Self::Replied(reply) => reply_text(reply),
            Self::Failed(error) => failure_text(error).to_string(),
            Self::Aborted(_) => UNREACHABLE_ERROR_TEXT.to_string(),
        }
    }

    pub fn into_blocks(self) -> Vec<String> {
        format_reply(&self.display_text())
    }
}

/// Reply text, or the fallback literal when `output` is missing, null or empty.
pub fn reply_text(reply: &WebhookReply) -> String {
    reply
        .output
        .as_ref()
        .map(value_text)
        .filter(|text| !text.is_empty())
        .unwrap_or_else(|| FALLBACK_REPLY_TEXT.to_string())
}

pub fn failure_text(error: &WebhookError) -> &'static str {
    if error.is_not_found() {
        NOT_FOUND_ERROR_TEXT
    } else {
        UNREACHABLE_ERROR_TEXT
    }
}

use serde::{Deserialize, Serialize};

/// Delimiter placed between assistant blocks when they are flattened for storage.
///
/// Formatter output never contains a newline inside a block, so re-formatting
/// the flattened text splits it back into the same blocks.
pub const BLOCK_DELIMITER: &str = "\n";

/// Monotonic index of one user submission within a mounted widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubmissionId(pub u64);

impl SubmissionId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }
}

/// Chat speaker role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "user")]
    User,
    #[serde(rename = "ai", alias = "assistant")]
    Assistant,
}

/// Display content of one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageContent {
    /// What the user typed, shown verbatim.
    RawText(String),
    /// Reply text already split into display blocks.
    FormattedBlocks(Vec<String>),
}

impl MessageContent {
    /// Single-string form used for persistence.
    pub fn flatten(&self) -> String {
        match self {
            Self::RawText(text) => text.clone(),
            Self::FormattedBlocks(blocks) => blocks.join(BLOCK_DELIMITER),
        }
    }
}

/// One turn in the conversation. The role never changes after creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    role: Role,
    content: MessageContent,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: MessageContent::RawText(text.into()),
        }
    }

    pub fn assistant(blocks: Vec<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: MessageContent::FormattedBlocks(blocks),
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &MessageContent {
        &self.content
    }

    /// Blocks as they should be displayed; user text is a single block.
    pub fn blocks(&self) -> Vec<&str> {
        match &self.content {
            MessageContent::RawText(text) => vec![text.as_str()],
            MessageContent::FormattedBlocks(blocks) => blocks.iter().map(String::as_str).collect(),
        }
    }

    pub fn to_stored(&self) -> StoredMessage {
        StoredMessage {
            role: self.role,
            content: self.content.flatten(),
        }
    }
}

/// Durable form of a message; content is always one plain string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredMessage {
    pub role: Role,
    pub content: String,
}

/// Lifecycle of one outbound exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExchangeState {
    #[default]
    Idle,
    AwaitingReply,
    Settled(ExchangeOutcomeKind),
}

/// How an exchange settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExchangeOutcomeKind {
    Replied,
    Failed,
}

/// Transition input for the exchange lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeTransition {
    Dispatch,
    Settle(ExchangeOutcomeKind),
}

/// Rejection reason for illegal exchange transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeTransitionRejection {
    AlreadyDispatched,
    NotAwaitingReply,
}

pub type ExchangeTransitionResult = Result<ExchangeState, ExchangeTransitionRejection>;

impl ExchangeState {
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::AwaitingReply)
    }

    /// Applies one transition. An exchange is dispatched once and settles once.
    pub fn apply(&self, transition: ExchangeTransition) -> ExchangeTransitionResult {
        match (self, transition) {
            (Self::Idle, ExchangeTransition::Dispatch) => Ok(Self::AwaitingReply),
            (Self::AwaitingReply | Self::Settled(_), ExchangeTransition::Dispatch) => {
                Err(ExchangeTransitionRejection::AlreadyDispatched)
            }
            (Self::AwaitingReply, ExchangeTransition::Settle(kind)) => Ok(Self::Settled(kind)),
            (Self::Idle | Self::Settled(_), ExchangeTransition::Settle(_)) => {
                Err(ExchangeTransitionRejection::NotAwaitingReply)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stored_roles_use_widget_names() {
        let user = serde_json::to_string(&Message::user("Hello").to_stored()).unwrap();
        let reply =
            serde_json::to_string(&Message::assistant(vec!["Hi there.".to_string()]).to_stored())
                .unwrap();

        assert_eq!(user, r#"{"role":"user","content":"Hello"}"#);
        assert_eq!(reply, r#"{"role":"ai","content":"Hi there."}"#);
    }

    #[test]
    fn assistant_role_name_is_accepted_on_read() {
        let stored: StoredMessage =
            serde_json::from_str(r#"{"role":"assistant","content":"ok"}"#).unwrap();
        assert_eq!(stored.role, Role::Assistant);
    }

    #[test]
    fn multi_block_content_flattens_with_delimiter() {
        let message = Message::assistant(vec!["First.".to_string(), "Second.".to_string()]);
        assert_eq!(message.to_stored().content, "First.\nSecond.");
        assert_eq!(message.blocks(), vec!["First.", "Second."]);
    }

    #[test]
    fn exchange_dispatches_once_and_settles_once() {
        let dispatched = ExchangeState::Idle
            .apply(ExchangeTransition::Dispatch)
            .unwrap();
        assert!(dispatched.is_pending());
        assert_eq!(
            dispatched.apply(ExchangeTransition::Dispatch),
            Err(ExchangeTransitionRejection::AlreadyDispatched)
        );

        let settled = dispatched
            .apply(ExchangeTransition::Settle(ExchangeOutcomeKind::Failed))
            .unwrap();
        assert_eq!(settled, ExchangeState::Settled(ExchangeOutcomeKind::Failed));
        assert_eq!(
            settled.apply(ExchangeTransition::Settle(ExchangeOutcomeKind::Replied)),
            Err(ExchangeTransitionRejection::NotAwaitingReply)
        );
    }
}

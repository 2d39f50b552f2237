pub mod controller;
/// Settlement events and the user-visible texts they map to.
pub mod events;
pub mod formatter;
/// Domain entities and the exchange lifecycle.
pub mod message;
pub mod presentation;
pub mod session;
pub mod store;

#[cfg(test)]
pub(crate) mod test_support;

pub use controller::ConversationController;
pub use events::{
    ExchangeOutcome, FALLBACK_REPLY_TEXT, NOT_FOUND_ERROR_TEXT, ReplySettled,
    UNREACHABLE_ERROR_TEXT, failure_text, reply_text,
};
pub use formatter::{LONG_REPLY_THRESHOLD, format_reply, format_value};
pub use message::{
    BLOCK_DELIMITER, ExchangeOutcomeKind, ExchangeState, ExchangeTransition,
    ExchangeTransitionRejection, ExchangeTransitionResult, Message, MessageContent, Role,
    StoredMessage, SubmissionId,
};
pub use presentation::{ScrollFollow, Viewport, WidgetPresentation};
pub use session::{SESSION_ID_KEY, SESSION_ID_LEN, SessionIdentity, generate_session_id};
pub use store::{MESSAGES_KEY, MessageStore};

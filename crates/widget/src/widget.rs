use std::sync::Arc;

use parley_storage::KeyValueStore;
use parley_webhook::{ReplyTransport, WebhookError, create_transport};

use crate::chat::{
    ConversationController, Message, MessageStore, SessionIdentity, SubmissionId,
    WidgetPresentation,
};
use crate::settings::WidgetSettings;

/// One mounted chat widget: visibility, input buffer and the conversation.
pub struct ChatWidget {
    presentation: WidgetPresentation,
    input: String,
    controller: ConversationController,
}

impl ChatWidget {
    /// Mounts the widget against the configured webhook endpoint.
    pub fn mount(
        settings: &WidgetSettings,
        storage: Arc<dyn KeyValueStore>,
    ) -> Result<Self, WebhookError> {
        if !settings.is_configured() {
            tracing::warn!("webhook URL is not configured; every message will fail to send");
        }
        let transport = create_transport(settings.to_webhook_config())?;
        Ok(Self::mount_with_transport(storage, transport))
    }

    /// Resolves the session id and restores history from `storage`.
    pub fn mount_with_transport(
        storage: Arc<dyn KeyValueStore>,
        transport: Arc<dyn ReplyTransport>,
    ) -> Self {
        let session_id = SessionIdentity::new(Arc::clone(&storage)).get_or_create();
        let controller =
            ConversationController::new(MessageStore::new(storage), session_id, transport);

        Self {
            presentation: WidgetPresentation::new(),
            input: String::new(),
            controller,
        }
    }

    pub fn is_open(&self) -> bool {
        self.presentation.is_open()
    }

    pub fn open(&mut self) {
        self.presentation.open();
    }

    pub fn close(&mut self) {
        self.presentation.close();
    }

    pub fn toggle(&mut self) {
        self.presentation.toggle();
    }

    pub fn presentation(&self) -> &WidgetPresentation {
        &self.presentation
    }

    pub fn presentation_mut(&mut self) -> &mut WidgetPresentation {
        &mut self.presentation
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn set_input(&mut self, input: impl Into<String>) {
        self.input = input.into();
    }

    pub fn history(&self) -> &[Message] {
        self.controller.history()
    }

    pub fn session_id(&self) -> &str {
        self.controller.session_id()
    }

    pub fn controller(&self) -> &ConversationController {
        &self.controller
    }

    pub fn pending_count(&self) -> usize {
        self.controller.pending_count()
    }

    /// Submits the input buffer. Accepted input clears the buffer; blank input stays put.
    pub fn submit(&mut self) -> Option<SubmissionId> {
        let submission = self.controller.submit(&self.input)?;
        self.input.clear();
        self.presentation.history_changed();
        Some(submission)
    }

    /// Applies replies that already arrived, without waiting.
    pub fn poll_replies(&mut self) -> usize {
        let applied = self.controller.try_settle();
        if applied > 0 {
            self.presentation.history_changed();
        }
        applied
    }

    pub async fn next_reply(&mut self) -> Option<SubmissionId> {
        let submission = self.controller.settle_next().await?;
        self.presentation.history_changed();
        Some(submission)
    }

    pub async fn settle_all(&mut self) {
        while self.next_reply().await.is_some() {}
    }
}

#[cfg(test)]
mod tests {
    use parley_storage::MemoryStore;

    use super::*;
    use crate::chat::test_support::ScriptedTransport;
    use crate::chat::{MESSAGES_KEY, SESSION_ID_KEY, SESSION_ID_LEN};

    #[tokio::test]
    async fn fresh_profile_hello_round_trip() {
        let storage = Arc::new(MemoryStore::new());
        let transport = Arc::new(ScriptedTransport::replying("Hi there."));
        let mut widget = ChatWidget::mount_with_transport(storage.clone(), transport.clone());

        widget.open();
        widget.set_input("Hello");
        widget.submit().unwrap();

        assert_eq!(widget.input(), "");
        assert_eq!(widget.history(), &[Message::user("Hello")]);

        widget.settle_all().await;
        assert_eq!(
            widget.history(),
            &[
                Message::user("Hello"),
                Message::assistant(vec!["Hi there.".to_string()])
            ]
        );
        assert_eq!(
            storage.get(MESSAGES_KEY).unwrap().as_deref(),
            Some(r#"[{"role":"user","content":"Hello"},{"role":"ai","content":"Hi there."}]"#)
        );

        let session_id = storage.get(SESSION_ID_KEY).unwrap().unwrap();
        assert_eq!(session_id.len(), SESSION_ID_LEN);
        assert_eq!(widget.session_id(), session_id);
        assert_eq!(transport.requests()[0].session_id, session_id);
    }

    #[tokio::test]
    async fn blank_input_is_kept_and_not_sent() {
        let transport = Arc::new(ScriptedTransport::replying("unused"));
        let mut widget =
            ChatWidget::mount_with_transport(Arc::new(MemoryStore::new()), transport.clone());

        widget.set_input("   ");
        assert_eq!(widget.submit(), None);
        assert_eq!(widget.input(), "   ");
        assert!(widget.history().is_empty());
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn remount_restores_history_and_session() {
        let storage = Arc::new(MemoryStore::new());
        let mut first = ChatWidget::mount_with_transport(
            storage.clone(),
            Arc::new(ScriptedTransport::replying("First sentence. Second sentence.")),
        );
        first.set_input("Hello");
        first.submit().unwrap();
        first.settle_all().await;
        let session_id = first.session_id().to_string();
        let history = first.history().to_vec();
        drop(first);

        let second = ChatWidget::mount_with_transport(
            storage,
            Arc::new(ScriptedTransport::replying("unused")),
        );
        assert_eq!(second.session_id(), session_id);
        assert_eq!(second.history(), history.as_slice());
        assert!(!second.is_open());
    }

    #[tokio::test]
    async fn submissions_keep_the_view_on_the_latest_message() {
        let mut widget = ChatWidget::mount_with_transport(
            Arc::new(MemoryStore::new()),
            Arc::new(ScriptedTransport::replying("Hi there.")),
        );
        widget.open();
        assert!(widget.presentation_mut().scroll_mut().take_scroll_target().is_some());

        widget.set_input("Hello");
        widget.submit().unwrap();
        assert!(widget.presentation_mut().scroll_mut().take_scroll_target().is_some());

        widget.settle_all().await;
        assert!(widget.presentation().scroll().is_following_bottom());
    }

    #[tokio::test]
    async fn unconfigured_endpoint_surfaces_unreachable_notice() {
        let mut widget =
            ChatWidget::mount(&WidgetSettings::default(), Arc::new(MemoryStore::new())).unwrap();

        widget.set_input("Hello");
        widget.submit().unwrap();
        widget.settle_all().await;

        assert_eq!(
            widget.history()[1],
            Message::assistant(vec!["Error: Could not reach AI".to_string()])
        );
    }
}

use std::any::Any;
use std::collections::BTreeMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use parley_webhook::{ReplyTransport, WebhookRequest};
use tokio::sync::mpsc;

use crate::chat::events::{ExchangeOutcome, ReplySettled};
use crate::chat::message::{ExchangeState, ExchangeTransition, Message, SubmissionId};
use crate::chat::store::MessageStore;

/// Owns the conversation history and drives every exchange with the endpoint.
///
/// Submissions append the user turn immediately and dispatch the request on a
/// tokio task. Finished tasks report back over a channel and are applied by the
/// controller itself, so the history has exactly one writer. Several exchanges
/// may be in flight at once; replies land in the order they settle.
pub struct ConversationController {
    history: Vec<Message>,
    store: MessageStore,
    session_id: String,
    transport: Arc<dyn ReplyTransport>,
    exchanges: BTreeMap<SubmissionId, ExchangeState>,
    next_submission_id: u64,
    settled_tx: mpsc::UnboundedSender<ReplySettled>,
    settled_rx: mpsc::UnboundedReceiver<ReplySettled>,
}

impl ConversationController {
    /// Restores the stored history and binds the controller to a session.
    pub fn new(
        store: MessageStore,
        session_id: impl Into<String>,
        transport: Arc<dyn ReplyTransport>,
    ) -> Self {
        let history = store.load();
        let (settled_tx, settled_rx) = mpsc::unbounded_channel();
        tracing::debug!(restored = history.len(), "conversation controller ready");

        Self {
            history,
            store,
            session_id: session_id.into(),
            transport,
            exchanges: BTreeMap::new(),
            next_submission_id: 1,
            settled_tx,
            settled_rx,
        }
    }

    pub fn history(&self) -> &[Message] {
        &self.history
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// State of a submission; unknown ids read as `Idle`.
    pub fn exchange_state(&self, submission: SubmissionId) -> ExchangeState {
        self.exchanges
            .get(&submission)
            .copied()
            .unwrap_or_default()
    }

    pub fn pending_count(&self) -> usize {
        self.exchanges
            .values()
            .filter(|state| state.is_pending())
            .count()
    }

    /// Submits user input. Blank input is ignored and returns `None`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn submit(&mut self, input: &str) -> Option<SubmissionId> {
        if input.trim().is_empty() {
            return None;
        }

        let submission = self.alloc_submission_id();
        let state = match ExchangeState::Idle.apply(ExchangeTransition::Dispatch) {
            Ok(state) => state,
            Err(rejection) => {
                tracing::error!(?submission, ?rejection, "fresh exchange refused dispatch");
                return None;
            }
        };

        // The user's turn is visible and persisted before any network result.
        self.history.push(Message::user(input));
        self.persist();
        self.exchanges.insert(submission, state);

        self.dispatch(submission, WebhookRequest::new(input, self.session_id.clone()));
        Some(submission)
    }

    /// Applies every settlement that has already arrived, without waiting.
    pub fn try_settle(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(settled) = self.settled_rx.try_recv() {
            self.apply_settlement(settled);
            applied += 1;
        }
        applied
    }

    /// Waits for the next exchange to settle. Returns `None` when nothing is pending.
    pub async fn settle_next(&mut self) -> Option<SubmissionId> {
        if self.pending_count() == 0 {
            return None;
        }

        let settled = self.settled_rx.recv().await?;
        let submission = settled.submission;
        self.apply_settlement(settled);
        Some(submission)
    }

    /// Waits until every outstanding exchange has settled.
    pub async fn settle_all(&mut self) {
        while self.settle_next().await.is_some() {}
    }

    fn dispatch(&self, submission: SubmissionId, request: WebhookRequest) {
        let transport = Arc::clone(&self.transport);
        let settled_tx = self.settled_tx.clone();

        tracing::debug!(?submission, session_id = %request.session_id, "dispatching chat message");
        tokio::spawn(async move {
            // A panicking transport still settles, so the exchange never stays pending.
            let sent = AssertUnwindSafe(async { transport.send(request).await })
                .catch_unwind()
                .await;
            let outcome = match sent {
                Ok(Ok(reply)) => ExchangeOutcome::Replied(reply),
                Ok(Err(error)) => {
                    tracing::warn!(?submission, error = %error, "chat exchange failed");
                    ExchangeOutcome::Failed(error)
                }
                Err(panic) => {
                    let details = panic_details(panic.as_ref());
                    tracing::error!(?submission, details = %details, "chat exchange panicked");
                    ExchangeOutcome::Aborted(details)
                }
            };

            if settled_tx.send(ReplySettled { submission, outcome }).is_err() {
                tracing::debug!(?submission, "controller dropped before exchange settled");
            }
        });
    }

    fn apply_settlement(&mut self, settled: ReplySettled) {
        let ReplySettled {
            submission,
            outcome,
        } = settled;

        let current = self.exchange_state(submission);
        match current.apply(ExchangeTransition::Settle(outcome.kind())) {
            Ok(next) => {
                self.exchanges.insert(submission, next);
            }
            Err(rejection) => {
                tracing::warn!(?submission, ?rejection, "ignoring settlement for exchange");
                return;
            }
        }

        let blocks = outcome.into_blocks();
        tracing::debug!(?submission, blocks = blocks.len(), "exchange settled");
        self.history.push(Message::assistant(blocks));
        self.persist();
    }

    fn persist(&self) {
        self.store.save(&self.history);
    }

    fn alloc_submission_id(&mut self) -> SubmissionId {
        let id = SubmissionId::new(self.next_submission_id);
        self.next_submission_id = self.next_submission_id.saturating_add(1);
        id
    }
}

fn panic_details(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "exchange task panicked".to_string()
    }
}

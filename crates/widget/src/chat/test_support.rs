use std::collections::HashMap;
use std::sync::Mutex;

use futures::future::BoxFuture;
use parley_storage::{KeyValueStore, StorageError, StorageResult};
use parley_webhook::{ReplyTransport, WebhookError, WebhookReply, WebhookRequest, WebhookResult};
use tokio::sync::oneshot;

/// Store that fails every read and write, like a browser with storage disabled.
pub(crate) struct UnavailableStore;

impl KeyValueStore for UnavailableStore {
    fn get(&self, _key: &str) -> StorageResult<Option<String>> {
        Err(StorageError::unavailable("test-get", "storage disabled"))
    }

    fn set(&self, _key: &str, _value: &str) -> StorageResult<()> {
        Err(StorageError::unavailable("test-set", "storage disabled"))
    }

    fn remove(&self, _key: &str) -> StorageResult<()> {
        Err(StorageError::unavailable("test-remove", "storage disabled"))
    }
}

type Responder = Box<dyn Fn(&WebhookRequest) -> WebhookResult<WebhookReply> + Send + Sync>;

/// Answers immediately with whatever the responder returns and records requests.
pub(crate) struct ScriptedTransport {
    responder: Responder,
    requests: Mutex<Vec<WebhookRequest>>,
}

impl ScriptedTransport {
    pub(crate) fn new(
        responder: impl Fn(&WebhookRequest) -> WebhookResult<WebhookReply> + Send + Sync + 'static,
    ) -> Self {
        Self {
            responder: Box::new(responder),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn replying(output: &'static str) -> Self {
        Self::new(move |_| Ok(WebhookReply::with_output(output)))
    }

    pub(crate) fn failing_with_status(status: u16) -> Self {
        Self::new(move |_| {
            Err(WebhookError::Status {
                stage: "test-transport",
                status,
                body: String::new(),
            })
        })
    }

    pub(crate) fn requests(&self) -> Vec<WebhookRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl ReplyTransport for ScriptedTransport {
    fn send(&self, request: WebhookRequest) -> BoxFuture<'_, WebhookResult<WebhookReply>> {
        let result = (self.responder)(&request);
        self.requests.lock().unwrap().push(request);
        Box::pin(async move { result })
    }
}

/// Holds each reply until the test releases it, keyed by message text.
pub(crate) struct GatedTransport {
    gates: Mutex<HashMap<String, oneshot::Receiver<WebhookResult<WebhookReply>>>>,
}

impl GatedTransport {
    pub(crate) fn new() -> Self {
        Self {
            gates: Mutex::new(HashMap::new()),
        }
    }

    pub(crate) fn gate(&self, message: &str) -> oneshot::Sender<WebhookResult<WebhookReply>> {
        let (sender, receiver) = oneshot::channel();
        self.gates
            .lock()
            .unwrap()
            .insert(message.to_string(), receiver);
        sender
    }
}

impl ReplyTransport for GatedTransport {
    fn send(&self, request: WebhookRequest) -> BoxFuture<'_, WebhookResult<WebhookReply>> {
        let receiver = self.gates.lock().unwrap().remove(&request.message);
        Box::pin(async move {
            match receiver {
                Some(receiver) => receiver.await.unwrap_or_else(|_| {
                    Err(WebhookError::MissingUrl {
                        stage: "test-gate-dropped",
                    })
                }),
                None => Err(WebhookError::MissingUrl {
                    stage: "test-gate-missing",
                }),
            }
        })
    }
}

/// Panics while the exchange is in flight.
pub(crate) struct PanickingTransport;

impl ReplyTransport for PanickingTransport {
    fn send(&self, _request: WebhookRequest) -> BoxFuture<'_, WebhookResult<WebhookReply>> {
        Box::pin(async { panic!("transport blew up mid-exchange") })
    }
}

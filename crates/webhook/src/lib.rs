use std::sync::Arc;

mod http;
mod transport;

pub use http::HttpTransport;
pub use transport::{
    ReplyTransport, WebhookConfig, WebhookError, WebhookReply, WebhookRequest, WebhookResult,
};

/// Builds the default HTTP transport for a webhook endpoint.
pub fn create_transport(config: WebhookConfig) -> WebhookResult<Arc<dyn ReplyTransport>> {
    Ok(Arc::new(HttpTransport::new(config)?))
}

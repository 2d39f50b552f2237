use futures::future::BoxFuture;
use reqwest::Client;
use snafu::{ResultExt, ensure};

use super::transport::{
    BuildClientSnafu, MissingUrlSnafu, ReadBodySnafu, ReplyTransport, RequestSnafu, StatusSnafu,
    WebhookConfig, WebhookReply, WebhookRequest, WebhookResult,
};

/// Posts chat turns to the automation endpoint as JSON.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    config: WebhookConfig,
}

impl HttpTransport {
    pub fn new(config: WebhookConfig) -> WebhookResult<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().context(BuildClientSnafu {
            stage: "build-http-client",
        })?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &WebhookConfig {
        &self.config
    }

    async fn post(&self, request: WebhookRequest) -> WebhookResult<WebhookReply> {
        ensure!(
            !self.config.url.is_empty(),
            MissingUrlSnafu {
                stage: "post-webhook",
            }
        );

        let mut builder = self.client.post(&self.config.url).json(&request);
        if let Some(api_key) = &self.config.api_key {
            builder = builder.bearer_auth(api_key);
        }

        let response = builder.send().await.context(RequestSnafu {
            stage: "send-webhook-request",
        })?;
        let status = response.status();

        if !status.is_success() {
            // The status decides the failure; a truncated error body must not mask it.
            let body = match response.text().await {
                Ok(body) => body,
                Err(error) => {
                    tracing::debug!(error = %error, "discarding unreadable error body");
                    String::new()
                }
            };
            tracing::warn!(
                status = status.as_u16(),
                url = %self.config.url,
                "webhook answered with a non-success status"
            );
            return StatusSnafu {
                stage: "webhook-http-status",
                status: status.as_u16(),
                body,
            }
            .fail();
        }

        let body = response.text().await.context(ReadBodySnafu {
            stage: "read-webhook-response",
        })?;
        Ok(WebhookReply::from_body(&body))
    }
}

impl ReplyTransport for HttpTransport {
    fn send(&self, request: WebhookRequest) -> BoxFuture<'_, WebhookResult<WebhookReply>> {
        Box::pin(self.post(request))
    }
}

use std::time::Duration;

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use snafu::Snafu;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookConfig {
    pub url: String,
    pub api_key: Option<String>,
    pub timeout: Option<Duration>,
}

impl WebhookConfig {
    pub fn new(url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            url: url.into().trim().to_string(),
            api_key: api_key
                .map(|key| key.trim().to_string())
                .filter(|key| !key.is_empty()),
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Body posted to the automation endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookRequest {
    pub message: String,
    pub session_id: String,
}

impl WebhookRequest {
    pub fn new(message: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            session_id: session_id.into(),
        }
    }
}

/// Successful reply payload. `output` is kept as raw JSON because endpoints
/// are not consistent about returning a string.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct WebhookReply {
    #[serde(default)]
    pub output: Option<serde_json::Value>,
}

impl WebhookReply {
    pub fn with_output(output: impl Into<String>) -> Self {
        Self {
            output: Some(serde_json::Value::String(output.into())),
        }
    }

    /// Decodes a 2xx body. Anything that is not an object with `output`
    /// yields an empty reply rather than an error.
    pub fn from_body(body: &str) -> Self {
        match serde_json::from_str::<Self>(body) {
            Ok(reply) => reply,
            Err(error) => {
                tracing::warn!(
                    error = %error,
                    body_len = body.len(),
                    "webhook reply body is not a JSON object; treating as empty reply"
                );
                Self::default()
            }
        }
    }
}

pub type WebhookResult<T> = Result<T, WebhookError>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum WebhookError {
    #[snafu(display("webhook URL is not configured on `{stage}`"))]
    MissingUrl { stage: &'static str },
    #[snafu(display("failed to build http client on `{stage}`: {source}"))]
    BuildClient {
        stage: &'static str,
        source: reqwest::Error,
    },
    #[snafu(display("webhook request failed on `{stage}`: {source}"))]
    Request {
        stage: &'static str,
        source: reqwest::Error,
    },
    #[snafu(display("webhook returned status {status} on `{stage}`: {body}"))]
    Status {
        stage: &'static str,
        status: u16,
        body: String,
    },
    #[snafu(display("failed to read webhook response on `{stage}`: {source}"))]
    ReadBody {
        stage: &'static str,
        source: reqwest::Error,
    },
}

impl WebhookError {
    /// HTTP status carried by the failure, if the endpoint answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Request { source, .. } | Self::ReadBody { source, .. } => {
                source.status().map(|status| status.as_u16())
            }
            Self::MissingUrl { .. } | Self::BuildClient { .. } => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

/// Seam between the conversation controller and the automation endpoint.
pub trait ReplyTransport: Send + Sync {
    fn send(&self, request: WebhookRequest) -> BoxFuture<'_, WebhookResult<WebhookReply>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_serializes_with_camel_case_session_id() {
        let request = WebhookRequest::new("Hello", "abc");
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(
            json,
            serde_json::json!({ "message": "Hello", "sessionId": "abc" })
        );
    }

    #[test]
    fn blank_api_key_is_treated_as_absent() {
        let config = WebhookConfig::new(" https://hooks.test/chat ", Some("   ".to_string()));

        assert_eq!(config.url, "https://hooks.test/chat");
        assert_eq!(config.api_key, None);
    }

    #[test]
    fn reply_body_without_object_shape_decodes_empty() {
        assert_eq!(WebhookReply::from_body("\"plain\"").output, None);
        assert_eq!(WebhookReply::from_body("not json").output, None);
        assert_eq!(WebhookReply::from_body("{}").output, None);
        assert_eq!(
            WebhookReply::from_body(r#"{"output":"Hi there."}"#),
            WebhookReply::with_output("Hi there.")
        );
    }

    #[test]
    fn status_error_reports_not_found() {
        let not_found = WebhookError::Status {
            stage: "test",
            status: 404,
            body: String::new(),
        };
        let server_error = WebhookError::Status {
            stage: "test",
            status: 500,
            body: String::new(),
        };

        assert!(not_found.is_not_found());
        assert!(!server_error.is_not_found());
        assert!(!WebhookError::MissingUrl { stage: "test" }.is_not_found());
    }
}

/// SMS Client — the single point of entry for all outbound SMS in this
/// service.
///
/// ARCHITECTURAL RULE: No other module may call the SMS provider directly.
/// All sends MUST go through the `SmsGateway` trait so the fan-out and
/// verification paths can be exercised against a test double.
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

const GATEWAY_API_URL: &str = "https://api.afromessage.com/api/send";
/// Bounded per-send timeout so a large fan-out cannot stall indefinitely on
/// one slow gateway call.
const SEND_TIMEOUT_SECS: u64 = 15;

#[derive(Debug, Error)]
pub enum SmsError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("gateway error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("gateway rejected send: {0}")]
    Rejected(String),
}

#[derive(Debug, Serialize)]
struct SendRequest<'a> {
    to: &'a str,
    message: &'a str,
    sender_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct SendResponse {
    acknowledge: String,
    response: Option<SendResponseBody>,
}

#[derive(Debug, Deserialize)]
struct SendResponseBody {
    status: Option<String>,
    message_id: Option<String>,
    message: Option<String>,
}

/// Provider acknowledgement for a successfully accepted send.
#[derive(Debug, Clone)]
pub struct SmsReceipt {
    /// Provider-assigned message id, when the provider reports one.
    pub message_id: Option<String>,
    /// Provider-reported delivery status, lowercased.
    pub status: String,
}

/// Outbound SMS seam. Production uses `AfroMessageClient`; tests substitute
/// a recording double.
#[async_trait]
pub trait SmsGateway: Send + Sync {
    async fn send(&self, to: &str, message: &str) -> Result<SmsReceipt, SmsError>;
}

/// Bearer-token client for the AfroMessage send API.
#[derive(Clone)]
pub struct AfroMessageClient {
    client: Client,
    api_key: String,
    sender_id: String,
}

impl AfroMessageClient {
    pub fn new(api_key: String, sender_id: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(SEND_TIMEOUT_SECS))
                .build()
                .expect("Failed to build HTTP client"),
            api_key,
            sender_id,
        }
    }
}

#[async_trait]
impl SmsGateway for AfroMessageClient {
    /// Sends one SMS. Any non-2xx status or non-"success" acknowledgement is
    /// a send failure; there is no retry — a send is not idempotent, and the
    /// caller records the failure on the subscription instead.
    async fn send(&self, to: &str, message: &str) -> Result<SmsReceipt, SmsError> {
        let request_body = SendRequest {
            to,
            message,
            sender_id: &self.sender_id,
        };

        let response = self
            .client
            .post(GATEWAY_API_URL)
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SmsError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let ack: SendResponse = response.json().await?;

        if ack.acknowledge != "success" {
            let reason = ack
                .response
                .and_then(|r| r.message)
                .unwrap_or_else(|| "unknown error from gateway".to_string());
            return Err(SmsError::Rejected(reason));
        }

        let body = ack.response.unwrap_or(SendResponseBody {
            status: None,
            message_id: None,
            message: None,
        });

        let receipt = SmsReceipt {
            message_id: body.message_id,
            status: body
                .status
                .map(|s| s.to_lowercase())
                .unwrap_or_else(|| "sent".to_string()),
        };

        debug!(
            "SMS accepted by gateway: to={}, message_id={:?}, status={}",
            to, receipt.message_id, receipt.status
        );

        Ok(receipt)
    }
}

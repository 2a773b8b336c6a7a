//! Twilio WhatsApp adapter.
//!
//! Implements the core `MessagingPort` over the Twilio Messages API and
//! provides the webhook request-signature validator. Delivery never fails
//! the caller: errors are logged and a synthetic error receipt is returned.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;

use finbot_core::{
    domain::{DeliveryReceipt, DeliveryStatus, SenderId},
    errors::Error,
    ports::MessagingPort,
    Result,
};

pub mod signature;

pub use signature::RequestValidator;

#[derive(Clone)]
pub struct TwilioMessenger {
    account_sid: String,
    auth_token: String,
    from_number: String,
    http: reqwest::Client,
}

impl TwilioMessenger {
    pub fn new(
        account_sid: impl Into<String>,
        auth_token: impl Into<String>,
        from_number: impl Into<String>,
    ) -> Self {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .expect("reqwest client build");
        Self {
            account_sid: account_sid.into(),
            auth_token: auth_token.into(),
            from_number: from_number.into(),
            http,
        }
    }

    async fn try_send(&self, to: &SenderId, body: &str) -> Result<DeliveryReceipt> {
        let url = format!(
            "https://api.twilio.com/2010-04-01/Accounts/{}/Messages.json",
            self.account_sid
        );
        let params = [
            ("From", whatsapp_addr(&self.from_number)),
            ("To", whatsapp_addr(to.as_str())),
            ("Body", body.to_string()),
        ];

        let resp = self
            .http
            .post(&url)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&params)
            .send()
            .await
            .map_err(|e| Error::External(format!("twilio request error: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::External(format!(
                "twilio send failed: {status} {}",
                body.chars().take(200).collect::<String>()
            )));
        }

        let v: Value = resp
            .json()
            .await
            .map_err(|e| Error::External(format!("twilio json error: {e}")))?;

        let sid = v
            .get("sid")
            .and_then(Value::as_str)
            .unwrap_or("UNKNOWN")
            .to_string();
        let status = match v.get("status").and_then(Value::as_str) {
            Some("sent") | Some("delivered") => DeliveryStatus::Sent,
            _ => DeliveryStatus::Queued,
        };

        Ok(DeliveryReceipt {
            sid,
            status,
            to: to.as_str().to_string(),
        })
    }
}

#[async_trait]
impl MessagingPort for TwilioMessenger {
    async fn send(&self, to: &SenderId, body: &str) -> DeliveryReceipt {
        match self.try_send(to, body).await {
            Ok(receipt) => {
                tracing::info!(sid = %receipt.sid, to = %to, "message sent");
                receipt
            }
            Err(err) => {
                tracing::warn!(%err, to = %to, "WhatsApp delivery failed");
                DeliveryReceipt {
                    sid: format!("ERROR_{}", Utc::now().timestamp_millis()),
                    status: DeliveryStatus::Error,
                    to: to.as_str().to_string(),
                }
            }
        }
    }
}

/// Mock delivery, selected at startup when Twilio credentials are absent.
#[derive(Clone, Copy, Debug, Default)]
pub struct MockMessenger;

#[async_trait]
impl MessagingPort for MockMessenger {
    async fn send(&self, to: &SenderId, body: &str) -> DeliveryReceipt {
        tracing::info!(to = %to, body, "mock WhatsApp message sent");
        DeliveryReceipt {
            sid: format!("MOCK_MESSAGE_{}", Utc::now().timestamp_millis()),
            status: DeliveryStatus::Sent,
            to: to.as_str().to_string(),
        }
    }
}

fn whatsapp_addr(number: &str) -> String {
    if number.starts_with("whatsapp:") {
        number.to_string()
    } else {
        format!("whatsapp:{number}")
    }
}

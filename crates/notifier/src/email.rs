//! Email channel — delivery via the Resend HTTP API.

use async_trait::async_trait;
use serde_json::json;

use crate::{ChannelDeliveryError, ChannelSender, DeliveryRequest};

const RESEND_ENDPOINT: &str = "https://api.resend.com/emails";

pub struct EmailSender {
    http: reqwest::Client,
    api_key: String,
    from: String,
}

impl EmailSender {
    pub fn new(api_key: String, from: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key,
            from,
        }
    }
}

#[async_trait]
impl ChannelSender for EmailSender {
    async fn send(&self, request: &DeliveryRequest) -> Result<(), ChannelDeliveryError> {
        let to = request
            .email
            .as_deref()
            .ok_or(ChannelDeliveryError::MissingAddress("email"))?;

        let body = json!({
            "from": self.from,
            "to": [to],
            "subject": request.title,
            "text": request.content,
        });

        let response = self
            .http
            .post(RESEND_ENDPOINT)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ChannelDeliveryError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(ChannelDeliveryError::Rejected(format!(
                "{}: {}",
                status, detail
            )));
        }

        tracing::debug!(
            notification_id = %request.notification_id,
            user_id = %request.user_id,
            "Email notification sent"
        );
        Ok(())
    }
}

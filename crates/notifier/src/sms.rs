//! SMS channel — posts to the platform's SMS gateway.
//!
//! The gateway owns provider selection and phone number lookup; the engine
//! only hands over the recipient identity and the message text.

use async_trait::async_trait;
use serde_json::json;

use crate::{ChannelDeliveryError, ChannelSender, DeliveryRequest};

pub struct SmsSender {
    http: reqwest::Client,
    gateway_url: String,
}

impl SmsSender {
    pub fn new(gateway_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            gateway_url,
        }
    }
}

#[async_trait]
impl ChannelSender for SmsSender {
    async fn send(&self, request: &DeliveryRequest) -> Result<(), ChannelDeliveryError> {
        let body = json!({
            "user_id": request.user_id,
            "message": format!("{}: {}", request.title, request.content),
            "priority": request.priority,
        });

        let response = self
            .http
            .post(&self.gateway_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ChannelDeliveryError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ChannelDeliveryError::Rejected(
                response.status().to_string(),
            ));
        }

        tracing::debug!(
            notification_id = %request.notification_id,
            user_id = %request.user_id,
            "SMS notification sent"
        );
        Ok(())
    }
}

//! Push channel — posts to the platform's mobile push gateway.

use async_trait::async_trait;
use serde_json::json;

use crate::{ChannelDeliveryError, ChannelSender, DeliveryRequest};

pub struct PushSender {
    http: reqwest::Client,
    gateway_url: String,
}

impl PushSender {
    pub fn new(gateway_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            gateway_url,
        }
    }
}

#[async_trait]
impl ChannelSender for PushSender {
    async fn send(&self, request: &DeliveryRequest) -> Result<(), ChannelDeliveryError> {
        let body = json!({
            "user_id": request.user_id,
            "title": request.title,
            "body": request.content,
            "silent": request.silent,
            "data": {
                "notification_id": request.notification_id,
                "type": request.kind,
                "priority": request.priority,
            },
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
            "Push notification sent"
        );
        Ok(())
    }
}

//! Delivery transports for the notification engine.
//!
//! One sender per channel (web/email/sms/push). Senders perform transport
//! only; audience resolution, preference filtering and state tracking live
//! in the engine. A sender failure is reported back as a
//! `ChannelDeliveryError` and recorded on the channel row — it never aborts
//! the surrounding dispatch.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use sportiq_common::config::AppConfig;
use sportiq_common::types::{Channel, NotificationType, Priority};

pub mod email;
pub mod push;
pub mod sms;
pub mod web;

pub use email::EmailSender;
pub use push::PushSender;
pub use sms::SmsSender;
pub use web::WebSender;

/// Everything a transport needs to deliver one notification to one recipient.
#[derive(Debug, Clone, Serialize)]
pub struct DeliveryRequest {
    pub notification_id: Uuid,
    pub user_id: Uuid,
    pub username: String,
    pub email: Option<String>,
    pub title: String,
    pub content: String,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    pub priority: Priority,
    pub silent: bool,
}

/// A single channel send failure, localized to one (recipient, channel) pair.
#[derive(Debug, Error)]
pub enum ChannelDeliveryError {
    #[error("recipient has no {0} address")]
    MissingAddress(&'static str),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("gateway rejected request: {0}")]
    Rejected(String),
}

/// A delivery transport for one channel.
#[async_trait]
pub trait ChannelSender: Send + Sync {
    async fn send(&self, request: &DeliveryRequest) -> Result<(), ChannelDeliveryError>;
}

/// Channel → sender lookup used by the delivery orchestrator.
///
/// Channels without a registered sender (e.g. no SMS gateway configured)
/// fail their dispatches with an in-model error rather than erroring the
/// whole notification.
#[derive(Default)]
pub struct SenderRegistry {
    senders: HashMap<Channel, Arc<dyn ChannelSender>>,
}

impl SenderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, channel: Channel, sender: Arc<dyn ChannelSender>) -> Self {
        self.senders.insert(channel, sender);
        self
    }

    pub fn get(&self, channel: Channel) -> Option<Arc<dyn ChannelSender>> {
        self.senders.get(&channel).cloned()
    }

    /// Wire up every transport the configuration provides credentials for.
    pub fn from_config(config: &AppConfig, redis: ConnectionManager) -> Self {
        let mut registry = Self::new().register(Channel::Web, Arc::new(WebSender::new(redis)));

        if let (Some(api_key), Some(from)) = (&config.resend_api_key, &config.email_from) {
            registry = registry.register(
                Channel::Email,
                Arc::new(EmailSender::new(api_key.clone(), from.clone())),
            );
        } else {
            tracing::warn!("Email sender not configured (RESEND_API_KEY / EMAIL_FROM missing)");
        }

        if let Some(url) = &config.sms_gateway_url {
            registry = registry.register(Channel::Sms, Arc::new(SmsSender::new(url.clone())));
        }

        if let Some(url) = &config.push_gateway_url {
            registry = registry.register(Channel::Push, Arc::new(PushSender::new(url.clone())));
        }

        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoopSender;

    #[async_trait]
    impl ChannelSender for NoopSender {
        async fn send(&self, _request: &DeliveryRequest) -> Result<(), ChannelDeliveryError> {
            Ok(())
        }
    }

    #[test]
    fn test_registry_lookup() {
        let registry = SenderRegistry::new().register(Channel::Web, Arc::new(NoopSender));
        assert!(registry.get(Channel::Web).is_some());
        assert!(registry.get(Channel::Sms).is_none());
    }

    #[test]
    fn test_delivery_request_payload_shape() {
        let request = DeliveryRequest {
            notification_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            username: "coach_li".to_string(),
            email: None,
            title: "Training quiz".to_string(),
            content: "New quiz available".to_string(),
            kind: NotificationType::Assignment,
            priority: Priority::High,
            silent: false,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["type"], "assignment");
        assert_eq!(value["priority"], "high");
        assert_eq!(value["username"], "coach_li");
    }
}

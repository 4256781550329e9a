//! Web channel — publishes realtime notification events over Redis pub/sub.
//!
//! The platform's websocket gateway subscribes to the per-user topics and
//! forwards events to connected browser sessions. Recipients who are
//! offline still see the notification through the inbox endpoints, so a
//! successful publish counts as delivered.

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;

use crate::{ChannelDeliveryError, ChannelSender, DeliveryRequest};

pub struct WebSender {
    redis: ConnectionManager,
}

impl WebSender {
    pub fn new(redis: ConnectionManager) -> Self {
        Self { redis }
    }

    fn topic(request: &DeliveryRequest) -> String {
        format!("notifications:user:{}", request.user_id)
    }
}

#[async_trait]
impl ChannelSender for WebSender {
    async fn send(&self, request: &DeliveryRequest) -> Result<(), ChannelDeliveryError> {
        let payload = serde_json::to_string(request)
            .map_err(|e| ChannelDeliveryError::Transport(e.to_string()))?;

        let mut conn = self.redis.clone();
        conn.publish::<_, _, ()>(Self::topic(request), payload)
            .await
            .map_err(|e| ChannelDeliveryError::Transport(e.to_string()))?;

        tracing::debug!(
            notification_id = %request.notification_id,
            user_id = %request.user_id,
            "Web notification published"
        );
        Ok(())
    }
}

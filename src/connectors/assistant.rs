// src/connectors/assistant.rs
use crate::config::AssistantConfig;
use crate::connectors::messages::NotificationRequest;
use crate::connectors::traits::Notifier;
use crate::errors::{Result, StrategyError};
use async_trait::async_trait;
use reqwest::Client;
use tracing::error;
use url::Url;

pub struct AssistantClient {
    api_key: String,
    access_token: String,
    channel: String,
    http_client: Client,
    base_url: String,
}

impl AssistantClient {
    pub fn new(config: &AssistantConfig) -> Result<Self> {
        Ok(Self {
            api_key: config.api_key.clone(),
            access_token: config.access_token.clone(),
            channel: config.channel.clone(),
            http_client: Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Resolved per call so a service that never notifies needs no assistant url.
    fn notifications_url(&self) -> Result<Url> {
        if self.base_url.is_empty() {
            return Err(StrategyError::Notification(
                "no assistant url configured".to_string(),
            ));
        }
        Ok(Url::parse(&format!("{}/notifications", self.base_url))?)
    }
}

#[async_trait]
impl Notifier for AssistantClient {
    async fn notify(&self, correlation_id: &str, message: &str) -> Result<()> {
        let payload = NotificationRequest {
            message,
            webhook_channel: &self.channel,
        };

        let url = self.notifications_url()?;

        self.http_client
            .post(url)
            .header("x-correlation-id", correlation_id)
            .header("x-api-key", &self.api_key)
            .bearer_auth(&self.access_token)
            .json(&payload)
            .send()
            .await
            .and_then(|resp| resp.error_for_status())
            .map_err(|e| {
                error!(error = %e, correlation_id, "Could not send message to assistant");
                StrategyError::Notification(e.to_string())
            })?;

        Ok(())
    }
}

// src/connectors/queue.rs
use crate::config::QueueConfig;
use crate::connectors::messages::{Destination, OutboundMessage, QueueEnvelope};
use crate::connectors::traits::MessagePublisher;
use crate::errors::{Result, StrategyError};
use async_trait::async_trait;
use reqwest::Client;
use tracing::{error, info};

/// Publishes messages to queue gateway endpoints over HTTP.
pub struct HttpQueuePublisher {
    http_client: Client,
    risk_url: String,
    data_collection_url: String,
}

impl HttpQueuePublisher {
    pub fn new(config: &QueueConfig) -> Self {
        Self {
            http_client: Client::new(),
            risk_url: config.risk_url.clone(),
            data_collection_url: config.data_collection_url.clone(),
        }
    }

    fn url_for(&self, destination: Destination) -> Result<&str> {
        let url = match destination {
            Destination::Risk => &self.risk_url,
            Destination::DataCollection => &self.data_collection_url,
        };
        if url.is_empty() {
            return Err(StrategyError::Publish {
                destination: destination.as_str().to_string(),
                reason: "no queue url configured".to_string(),
            });
        }
        Ok(url)
    }
}

#[async_trait]
impl MessagePublisher for HttpQueuePublisher {
    async fn publish(&self, message: OutboundMessage) -> Result<()> {
        let url = self.url_for(message.destination)?;
        let envelope = QueueEnvelope {
            message_body: &message.body,
            message_attributes: &message.attributes,
        };

        let publish_error = |reason: String| StrategyError::Publish {
            destination: message.destination.as_str().to_string(),
            reason,
        };

        self.http_client
            .post(url)
            .json(&envelope)
            .send()
            .await
            .and_then(|resp| resp.error_for_status())
            .map_err(|e| {
                error!(error = %e, queue = message.destination.as_str(), "Queue publish failed");
                publish_error(e.to_string())
            })?;

        info!(queue = message.destination.as_str(), "Message published");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[tokio::test]
    async fn test_unconfigured_destination_is_rejected() {
        let publisher = HttpQueuePublisher::new(&QueueConfig {
            risk_url: "https://queues.example/risk".to_string(),
            data_collection_url: String::new(),
        });

        let err = publisher
            .publish(OutboundMessage {
                destination: Destination::DataCollection,
                body: serde_json::json!({}),
                attributes: BTreeMap::new(),
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            StrategyError::Publish { ref destination, .. } if destination == "data_collection"
        ));
    }
}

//! In-process pub/sub for component event streams.
//!
//! Each component gets its own broadcast channel under the topic
//! `fictions:{component_id}`. Payloads are the JSON form of `FictionEvent`.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value as JsonValue;
use tokio::sync::{broadcast, RwLock};

use crate::common::ComponentId;
use crate::domains::fictions::events::FictionEvent;

const DEFAULT_CAPACITY: usize = 256;

/// Thread-safe, cloneable topic hub.
#[derive(Clone)]
pub struct StreamHub {
    channels: Arc<RwLock<HashMap<String, broadcast::Sender<JsonValue>>>>,
    capacity: usize,
}

impl StreamHub {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            channels: Arc::new(RwLock::new(HashMap::new())),
            capacity,
        }
    }

    pub fn component_topic(component_id: ComponentId) -> String {
        format!("fictions:{}", component_id)
    }

    /// Publishes to the event's component topic. Dropped when nobody listens.
    pub async fn publish_event(&self, event: &FictionEvent) -> serde_json::Result<()> {
        let payload = serde_json::to_value(event)?;
        self.publish(&event.topic(), payload).await;
        Ok(())
    }

    pub async fn publish(&self, topic: &str, payload: JsonValue) {
        let channels = self.channels.read().await;
        if let Some(tx) = channels.get(topic) {
            // No receivers left is not an error.
            let _ = tx.send(payload);
        }
    }

    pub async fn subscribe_component(
        &self,
        component_id: ComponentId,
    ) -> broadcast::Receiver<JsonValue> {
        self.subscribe(&Self::component_topic(component_id)).await
    }

    pub async fn subscribe(&self, topic: &str) -> broadcast::Receiver<JsonValue> {
        let mut channels = self.channels.write().await;
        channels
            .entry(topic.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe()
    }

    /// Drops channels nobody subscribes to anymore.
    pub async fn cleanup(&self) {
        self.channels
            .write()
            .await
            .retain(|_, tx| tx.receiver_count() > 0);
    }
}

impl Default for StreamHub {
    fn default() -> Self {
        Self::new()
    }
}

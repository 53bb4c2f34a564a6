use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::alert::Alert;
use crate::error::RegistryError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscriber {
    pub device_token: String,
    pub user_id: Option<String>,
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("{channel} delivery failed: {message}")]
    Delivery {
        channel: &'static str,
        message: String,
    },
}

/// Delivers an alert to every current subscriber.
#[async_trait]
pub trait AlertDispatcher: Send + Sync {
    fn name(&self) -> &'static str;

    async fn notify(&self, alert: &Alert, subscribers: &[Subscriber]) -> Result<(), DispatchError>;
}

/// Stand-in dispatcher that only writes the alert to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogDispatcher;

#[async_trait]
impl AlertDispatcher for LogDispatcher {
    fn name(&self) -> &'static str {
        "log"
    }

    async fn notify(&self, alert: &Alert, subscribers: &[Subscriber]) -> Result<(), DispatchError> {
        info!(
            animal = alert.animal_type.as_deref().unwrap_or_default(),
            location = alert.location.as_deref().unwrap_or_default(),
            confidence = alert.confidence,
            subscribers = subscribers.len(),
            "alert sent to subscribers"
        );
        Ok(())
    }
}

/// Append-only list of push recipients, stored as sent. Registering the same token twice keeps
/// both entries.
pub struct SubscriberRegistry {
    subscribers: RwLock<Vec<Subscriber>>,
    dispatcher: Arc<dyn AlertDispatcher>,
}

impl SubscriberRegistry {
    pub fn new(dispatcher: Arc<dyn AlertDispatcher>) -> Self {
        Self {
            subscribers: RwLock::new(Vec::new()),
            dispatcher,
        }
    }

    pub async fn subscribe(
        &self,
        device_token: &str,
        user_id: Option<String>,
    ) -> Result<(), RegistryError> {
        if device_token.is_empty() {
            return Err(RegistryError::MissingDeviceToken);
        }

        let subscriber = Subscriber {
            device_token: device_token.to_string(),
            user_id,
        };

        let mut subscribers = self.subscribers.write().await;
        subscribers.push(subscriber);
        debug!(total = subscribers.len(), "subscriber added");
        Ok(())
    }

    pub async fn len(&self) -> usize {
        self.subscribers.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.subscribers.read().await.is_empty()
    }

    pub async fn snapshot(&self) -> Vec<Subscriber> {
        self.subscribers.read().await.clone()
    }

    /// Hands `alert` to the dispatcher together with the current subscribers. Delivery
    /// failures are logged and swallowed.
    pub async fn dispatch(&self, alert: &Alert) {
        let subscribers = self.snapshot().await;
        if let Err(err) = self.dispatcher.notify(alert, &subscribers).await {
            warn!(
                dispatcher = self.dispatcher.name(),
                error = %err,
                "alert dispatch failed"
            );
        }
    }
}

impl Default for SubscriberRegistry {
    fn default() -> Self {
        Self::new(Arc::new(LogDispatcher))
    }
}

impl std::fmt::Debug for SubscriberRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriberRegistry")
            .field("dispatcher", &self.dispatcher.name())
            .finish()
    }
}

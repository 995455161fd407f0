//! Best-effort notification sink.
//!
//! Delivers human-readable alerts over an optional webhook channel.
//! Delivery failures are logged and never propagated: a broken webhook
//! must not take down the trading loop.

use chrono::Utc;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Notification priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
        }
    }
}

/// Webhook channel settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookConfig {
    pub url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    10
}

/// Notification settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub webhook: Option<WebhookConfig>,
}

fn default_enabled() -> bool {
    true
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            webhook: None,
        }
    }
}

/// A delivered notification, retained by capturing notifiers in tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationRecord {
    pub title: String,
    pub message: String,
    pub priority: Priority,
}

#[derive(Serialize)]
struct WebhookPayload<'a> {
    title: &'a str,
    message: &'a str,
    priority: Priority,
    timestamp: String,
}

/// Multi-channel notifier.
pub struct Notifier {
    enabled: bool,
    webhook: Option<(reqwest::Client, String)>,
    capture: Option<Arc<Mutex<Vec<NotificationRecord>>>>,
}

impl Notifier {
    pub fn new(config: &NotifyConfig) -> Self {
        let webhook = config.webhook.as_ref().and_then(|wh| {
            let client = reqwest::Client::builder()
                .timeout(Duration::from_secs(wh.timeout_secs))
                .build();
            match client {
                Ok(client) => Some((client, wh.url.clone())),
                Err(e) => {
                    warn!(error = %e, "Failed to build webhook client, channel disabled");
                    None
                }
            }
        });
        Self {
            enabled: config.enabled,
            webhook,
            capture: None,
        }
    }

    /// A notifier that records every notification in memory.
    ///
    /// Used by tests to assert on emitted alerts.
    pub fn capturing() -> (Arc<Self>, Arc<Mutex<Vec<NotificationRecord>>>) {
        let buffer = Arc::new(Mutex::new(Vec::new()));
        let notifier = Self {
            enabled: true,
            webhook: None,
            capture: Some(buffer.clone()),
        };
        (Arc::new(notifier), buffer)
    }

    /// Send a notification through all configured channels.
    pub async fn send(&self, title: &str, message: &str, priority: Priority) {
        if !self.enabled {
            return;
        }

        info!(%priority, title, message, "Notification");

        if let Some(capture) = &self.capture {
            capture.lock().push(NotificationRecord {
                title: title.to_string(),
                message: message.to_string(),
                priority,
            });
        }

        if let Some((client, url)) = &self.webhook {
            let payload = WebhookPayload {
                title,
                message,
                priority,
                timestamp: Utc::now().to_rfc3339(),
            };
            match client.post(url).json(&payload).send().await {
                Ok(response) if response.status().is_success() => {}
                Ok(response) => {
                    warn!(status = %response.status(), "Webhook delivery rejected");
                }
                Err(e) => {
                    warn!(error = %e, "Webhook delivery failed");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_capturing_notifier_records() {
        let (notifier, records) = Notifier::capturing();
        notifier.send("Title", "Message", Priority::High).await;

        let records = records.lock();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "Title");
        assert_eq!(records[0].priority, Priority::High);
    }

    #[tokio::test]
    async fn test_disabled_notifier_is_silent() {
        let config = NotifyConfig {
            enabled: false,
            webhook: None,
        };
        let notifier = Notifier::new(&config);
        // No channels, disabled: must not panic or block.
        notifier.send("Title", "Message", Priority::Low).await;
    }
}

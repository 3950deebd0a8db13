//! Notification collaborator boundary.
//!
//! The engine emits [`NotificationIntent`] values and moves on; delivery is
//! someone else's job. A send failure is logged and never feeds back into
//! compliance state.

use async_trait::async_trait;
use reqwest::Client;

use crate::models::NotificationIntent;

/// Sink for notification intents.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, intent: &NotificationIntent) -> anyhow::Result<()>;
}

/// Notifier that writes intents to the structured log.
///
/// The default for local runs and the `check`/`sweep` CLI commands, where a
/// delivery pipeline is not wired up.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, intent: &NotificationIntent) -> anyhow::Result<()> {
        tracing::info!(
            notification_type = ?intent.notification_type,
            priority = ?intent.priority,
            project_id = %intent.project_id,
            deadline = %intent.deadline,
            remaining_hours = ?intent.remaining_hours,
            "notification intent"
        );
        Ok(())
    }
}

/// Notifier that POSTs each intent as JSON to a delivery webhook.
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    url: String,
    client: Client,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            client: Client::new(),
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn send(&self, intent: &NotificationIntent) -> anyhow::Result<()> {
        self.client
            .post(&self.url)
            .json(intent)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

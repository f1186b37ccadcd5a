use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{info, warn};

use crate::{entities::submission::ImageEvent, errors::NotificationError};

#[async_trait]
pub trait AdminNotifier: Send + Sync {
    async fn notify_admins(&self, subject: &str, body: &str) -> Result<(), NotificationError>;
}

#[derive(Debug, Serialize)]
struct RelayMessage<'a> {
    to: &'a [String],
    subject: &'a str,
    body: &'a str,
}

/// Sends admin mail through an HTTP mail relay
#[derive(Clone)]
pub struct MailRelayNotifier {
    client: reqwest::Client,
    endpoint: String,
    recipients: Vec<String>,
}

impl MailRelayNotifier {
    pub fn new(endpoint: String, recipients: Vec<String>) -> Self {
        MailRelayNotifier {
            client: reqwest::Client::new(),
            endpoint,
            recipients,
        }
    }
}

#[async_trait]
impl AdminNotifier for MailRelayNotifier {
    async fn notify_admins(&self, subject: &str, body: &str) -> Result<(), NotificationError> {
        let response = self.client
            .post(&self.endpoint)
            .json(&RelayMessage {
                to: &self.recipients,
                subject,
                body,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(NotificationError::Rejected(response.status().as_u16()));
        }

        Ok(())
    }
}

/// Used when no mail relay is configured
#[derive(Clone, Default)]
pub struct LogNotifier;

#[async_trait]
impl AdminNotifier for LogNotifier {
    async fn notify_admins(&self, subject: &str, body: &str) -> Result<(), NotificationError> {
        info!(subject, body, "Admin notification (no mail relay configured)");
        Ok(())
    }
}

/// Drains image events into admin notifications until every sender is gone.
/// Delivery failures are logged and dropped. Returns the number of
/// notifications that were delivered.
pub async fn run_notification_subscriber<N>(
    mut events: UnboundedReceiver<ImageEvent>,
    notifier: Arc<N>,
) -> usize
where
    N: AdminNotifier + ?Sized,
{
    let mut delivered = 0;

    while let Some(event) = events.recv().await {
        let (subject, body) = event.admin_message();

        match notifier.notify_admins(&subject, &body).await {
            Ok(()) => delivered += 1,
            Err(e) => warn!("Admin notification failed: {}", e),
        }
    }

    info!("Notification subscriber stopped after {} deliveries", delivered);
    delivered
}

use tokio::sync::mpsc::UnboundedSender;

use crate::entities::submission::ImageEvent;

/// Hands domain events to whoever delivers them. Publishing never fails
/// the calling operation.
pub trait EventPublisher: Send + Sync {
    fn publish(&self, event: ImageEvent);
}

impl EventPublisher for UnboundedSender<ImageEvent> {
    fn publish(&self, event: ImageEvent) {
        if let Err(e) = self.send(event) {
            tracing::warn!("Dropping image event, no subscriber running: {:?}", e.0);
        }
    }
}

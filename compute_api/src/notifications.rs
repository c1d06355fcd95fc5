// compute_api/src/notifications.rs

use log::debug;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// How many events a slow subscriber may lag behind before it starts losing
/// them.
pub const NOTIFICATION_CHANNEL_CAPACITY: usize = 64;

/// An event emitted by the compute subsystem when a node record changes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputeEvent {
    pub action: String,
    pub project_id: Uuid,
    pub node_id: Uuid,
}

/// Fan-out point for compute events. Emission is fire-and-forget: having no
/// subscribers is not an error.
#[derive(Clone)]
pub struct NotificationHub {
    tx: broadcast::Sender<ComputeEvent>,
}

impl NotificationHub {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(NOTIFICATION_CHANNEL_CAPACITY);
        NotificationHub { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ComputeEvent> {
        self.tx.subscribe()
    }

    pub fn emit(&self, action: &str, project_id: &Uuid, node_id: &Uuid) {
        let event = ComputeEvent {
            action: action.to_string(),
            project_id: *project_id,
            node_id: *node_id,
        };
        debug!("Emitting compute event {} for node {}", event.action, event.node_id);
        let _ = self.tx.send(event);
    }
}

impl Default for NotificationHub {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn emit_delivers_to_subscribers() {
        let hub = NotificationHub::new();
        let mut rx = hub.subscribe();
        let project_id = Uuid::new_v4();
        let node_id = Uuid::new_v4();

        hub.emit("node.updated", &project_id, &node_id);

        let event = rx.recv().await.unwrap();
        assert_eq!(event.action, "node.updated");
        assert_eq!(event.project_id, project_id);
        assert_eq!(event.node_id, node_id);
    }

    #[tokio::test]
    async fn emit_without_subscribers_is_a_no_op() {
        let hub = NotificationHub::new();
        hub.emit("node.stopped", &Uuid::new_v4(), &Uuid::new_v4());
    }
}

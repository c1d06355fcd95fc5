// instance_api/src/instance_registry.rs

use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use chrono::Utc;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex as TokioMutex;
use uuid::Uuid;

/// Metadata about the OS process backing a started node.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct InstanceMetadata {
    pub node_id: Uuid,
    pub project_id: Uuid,
    pub pid: u32,
    pub last_seen_nanos: i64, // Timestamp in nanoseconds since epoch
}

impl InstanceMetadata {
    pub fn new(node_id: Uuid, project_id: Uuid, pid: u32) -> Self {
        InstanceMetadata {
            node_id,
            project_id,
            pid,
            last_seen_nanos: Utc::now().timestamp_nanos_opt().unwrap_or(0),
        }
    }
}

/// In-memory registry of the instances this service has supervision over,
/// keyed by node id. At most one instance per node.
#[derive(Clone, Default)]
pub struct InstanceRegistry {
    store: Arc<TokioMutex<HashMap<Uuid, InstanceMetadata>>>,
}

impl InstanceRegistry {
    pub fn new() -> Self {
        InstanceRegistry {
            store: Arc::new(TokioMutex::new(HashMap::new())),
        }
    }

    /// Records the instance backing a node, replacing any previous entry for
    /// the same node.
    pub async fn register_instance(&self, metadata: InstanceMetadata) {
        let mut store = self.store.lock().await;
        if let Some(previous) = store.insert(metadata.node_id, metadata.clone()) {
            warn!(
                "Replacing registered instance for node {} (old PID {}, new PID {})",
                metadata.node_id, previous.pid, metadata.pid
            );
        } else {
            debug!("Registered instance PID {} for node {}", metadata.pid, metadata.node_id);
        }
    }

    /// Removes and returns the entry for a node, if any.
    pub async fn unregister_instance(&self, node_id: &Uuid) -> Option<InstanceMetadata> {
        let mut store = self.store.lock().await;
        let removed = store.remove(node_id);
        if let Some(ref metadata) = removed {
            debug!("Unregistered instance PID {} for node {}", metadata.pid, node_id);
        }
        removed
    }

    pub async fn get_instance(&self, node_id: &Uuid) -> Option<InstanceMetadata> {
        let store = self.store.lock().await;
        store.get(node_id).cloned()
    }

    pub async fn all_instances(&self) -> Vec<InstanceMetadata> {
        let store = self.store.lock().await;
        store.values().cloned().collect()
    }
}

/// Process-wide registry shared by the compute server binary.
pub static GLOBAL_INSTANCE_REGISTRY: LazyLock<InstanceRegistry> = LazyLock::new(InstanceRegistry::new);

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn register_and_lookup_instance() {
        let registry = InstanceRegistry::new();
        let node_id = Uuid::new_v4();
        let metadata = InstanceMetadata::new(node_id, Uuid::new_v4(), 4242);

        registry.register_instance(metadata.clone()).await;
        assert_eq!(registry.get_instance(&node_id).await, Some(metadata));
        assert_eq!(registry.all_instances().await.len(), 1);
    }

    #[tokio::test]
    async fn unregister_removes_the_entry() {
        let registry = InstanceRegistry::new();
        let node_id = Uuid::new_v4();
        registry
            .register_instance(InstanceMetadata::new(node_id, Uuid::new_v4(), 4242))
            .await;

        let removed = registry.unregister_instance(&node_id).await;
        assert_eq!(removed.map(|m| m.pid), Some(4242));
        assert!(registry.get_instance(&node_id).await.is_none());
        assert!(registry.unregister_instance(&node_id).await.is_none());
    }

    #[tokio::test]
    async fn register_replaces_previous_instance_for_the_same_node() {
        let registry = InstanceRegistry::new();
        let node_id = Uuid::new_v4();
        let project_id = Uuid::new_v4();

        registry.register_instance(InstanceMetadata::new(node_id, project_id, 1000)).await;
        registry.register_instance(InstanceMetadata::new(node_id, project_id, 2000)).await;

        assert_eq!(registry.get_instance(&node_id).await.map(|m| m.pid), Some(2000));
        assert_eq!(registry.all_instances().await.len(), 1);
    }
}

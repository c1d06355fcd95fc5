// compute_api/src/manager.rs

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use log::info;
use tokio::fs;
use tokio::sync::Mutex;
use uuid::Uuid;

use instance_api::{
    instance_pid_file_path, remove_pid_file, stop_instance, write_pid_file,
    DEFAULT_INSTANCE_RUN_DIR, InstanceError, InstanceMetadata, InstanceRegistry,
};
use models::{CloudNode, HostInterface, NodeStatus, PortMapping, ValidationError};

use crate::notifications::NotificationHub;

#[derive(Debug, thiserror::Error)]
pub enum ComputeError {
    #[error("node {node_id} in project {project_id} was not found")]
    NodeNotFound { project_id: Uuid, node_id: Uuid },
    #[error("node {node_id} is not in a stoppable state ({status})")]
    NotStoppable { node_id: Uuid, status: NodeStatus },
    #[error("node {node_id} already exists")]
    AlreadyExists { node_id: Uuid },
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Instance error: {0}")]
    Instance(#[from] InstanceError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Owns the cloud node records of this compute server.
///
/// All mutations go through one lock, so at most one mutation is in flight
/// at a time. The stop path keeps the lock across the instance shutdown so a
/// concurrent rename can never observe a half-stopped record.
#[derive(Clone)]
pub struct NodeManager {
    nodes: Arc<Mutex<HashMap<(Uuid, Uuid), CloudNode>>>,
    instances: InstanceRegistry,
    notifications: NotificationHub,
    projects_directory: PathBuf,
    run_directory: PathBuf,
}

impl NodeManager {
    pub fn new(
        projects_directory: impl Into<PathBuf>,
        instances: InstanceRegistry,
        notifications: NotificationHub,
    ) -> Self {
        NodeManager {
            nodes: Arc::new(Mutex::new(HashMap::new())),
            instances,
            notifications,
            projects_directory: projects_directory.into(),
            run_directory: PathBuf::from(DEFAULT_INSTANCE_RUN_DIR),
        }
    }

    /// Overrides where instance PID files are written.
    pub fn with_run_directory(mut self, run_directory: impl Into<PathBuf>) -> Self {
        self.run_directory = run_directory.into();
        self
    }

    /// Working storage of a node:
    /// `<projects_directory>/<project_id>/project-files/cloud/<node_id>`.
    pub fn node_working_directory(&self, project_id: &Uuid, node_id: &Uuid) -> PathBuf {
        self.projects_directory
            .join(project_id.to_string())
            .join("project-files")
            .join("cloud")
            .join(node_id.to_string())
    }

    /// Registers a node record with this compute server and creates its
    /// working directory. The record starts in the `started` state; `pid` is
    /// the OS process backing the simulated instance, when there is one.
    pub async fn add_node(
        &self,
        project_id: Uuid,
        node_id: Uuid,
        name: impl Into<String>,
        interfaces: Vec<HostInterface>,
        ports_mapping: Vec<PortMapping>,
        pid: Option<u32>,
    ) -> Result<CloudNode, ComputeError> {
        let mut nodes = self.nodes.lock().await;
        if nodes.contains_key(&(project_id, node_id)) {
            return Err(ComputeError::AlreadyExists { node_id });
        }

        let node_directory = self.node_working_directory(&project_id, &node_id);
        fs::create_dir_all(&node_directory).await?;

        let node = CloudNode::new(
            project_id,
            node_id,
            name,
            node_directory,
            interfaces,
            ports_mapping,
        )?;

        if let Some(pid) = pid {
            let pid_file = instance_pid_file_path(&self.run_directory, &node_id);
            write_pid_file(&pid_file, pid)?;
            self.instances
                .register_instance(InstanceMetadata::new(node_id, project_id, pid))
                .await;
        }

        nodes.insert((project_id, node_id), node.clone());
        info!("Registered cloud node {} in project {}", node_id, project_id);
        Ok(node)
    }

    pub async fn get_node(&self, project_id: &Uuid, node_id: &Uuid) -> Result<CloudNode, ComputeError> {
        let nodes = self.nodes.lock().await;
        nodes
            .get(&(*project_id, *node_id))
            .cloned()
            .ok_or(ComputeError::NodeNotFound {
                project_id: *project_id,
                node_id: *node_id,
            })
    }

    /// Replaces the node's display name and returns the full updated record.
    pub async fn rename_node(
        &self,
        project_id: &Uuid,
        node_id: &Uuid,
        name: &str,
    ) -> Result<CloudNode, ComputeError> {
        let mut nodes = self.nodes.lock().await;
        let node = nodes
            .get_mut(&(*project_id, *node_id))
            .ok_or(ComputeError::NodeNotFound {
                project_id: *project_id,
                node_id: *node_id,
            })?;

        node.set_name(name);
        let updated = node.clone();
        drop(nodes);

        info!("Renamed node {} to {:?}", node_id, updated.name);
        self.notifications.emit("node.updated", project_id, node_id);
        Ok(updated)
    }

    /// Transitions a started node to `stopped`, shutting down the backing
    /// instance first. Stopping a node that is not started is rejected.
    pub async fn stop_node(&self, project_id: &Uuid, node_id: &Uuid) -> Result<(), ComputeError> {
        let mut nodes = self.nodes.lock().await;
        let node = nodes
            .get_mut(&(*project_id, *node_id))
            .ok_or(ComputeError::NodeNotFound {
                project_id: *project_id,
                node_id: *node_id,
            })?;

        if node.status != NodeStatus::Started {
            return Err(ComputeError::NotStoppable {
                node_id: *node_id,
                status: node.status,
            });
        }

        if let Some(metadata) = self.instances.get_instance(node_id).await {
            stop_instance(metadata.pid).await?;
            self.instances.unregister_instance(node_id).await;
            remove_pid_file(&instance_pid_file_path(&self.run_directory, node_id));
        }

        node.status = NodeStatus::Stopped;
        drop(nodes);

        info!("Stopped node {} in project {}", node_id, project_id);
        self.notifications.emit("node.stopped", project_id, node_id);
        Ok(())
    }
}

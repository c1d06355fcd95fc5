use std::fs;
use std::path::{Path, PathBuf};

use log::{error, info, warn};
use nix::errno::Errno;
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid as NixPid;
use sysinfo::{Pid as SysinfoPid, ProcessesToUpdate, System};
use tokio::time::{sleep, Duration};
use uuid::Uuid;

pub mod instance_config;
pub mod instance_registry;

pub use instance_config::{
    DEFAULT_INSTANCE_RUN_DIR, INSTANCE_PID_FILE_NAME_PREFIX, INSTANCE_STOP_POLL_ATTEMPTS,
    INSTANCE_STOP_POLL_INTERVAL_MS,
};
pub use instance_registry::{GLOBAL_INSTANCE_REGISTRY, InstanceMetadata, InstanceRegistry};

#[derive(Debug, thiserror::Error)]
pub enum InstanceError {
    #[error("Signal error: {0}")]
    Signal(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Process error: {0}")]
    ProcessError(String),
}

/// Checks whether a process with the given PID is currently alive.
pub async fn is_process_running(pid: u32) -> bool {
    let mut sys = System::new();
    sys.refresh_processes(ProcessesToUpdate::Some(&[SysinfoPid::from_u32(pid)]), true);
    sys.process(SysinfoPid::from_u32(pid)).is_some()
}

/// Path of the PID file recording the instance backing a node.
pub fn instance_pid_file_path(run_dir: &Path, node_id: &Uuid) -> PathBuf {
    run_dir.join(format!("{}{}.pid", INSTANCE_PID_FILE_NAME_PREFIX, node_id))
}

pub fn write_pid_file(pid_file_path: &Path, pid: u32) -> Result<(), InstanceError> {
    fs::write(pid_file_path, format!("{}\n", pid))?;
    info!("Wrote PID file {} for PID {}", pid_file_path.display(), pid);
    Ok(())
}

pub fn remove_pid_file(pid_file_path: &Path) {
    if pid_file_path.exists() {
        if let Err(e) = fs::remove_file(pid_file_path) {
            error!("Failed to remove PID file {}: {}", pid_file_path.display(), e);
        } else {
            info!("Removed PID file {}", pid_file_path.display());
        }
    }
}

/// Shuts down the simulated instance with the given PID.
///
/// Sends SIGTERM first, polls for the process to exit, and escalates to
/// SIGKILL if it is still alive after `INSTANCE_STOP_POLL_ATTEMPTS` polls.
/// Signalling a process that is already gone counts as success.
pub async fn stop_instance(pid: u32) -> Result<(), InstanceError> {
    if !is_process_running(pid).await {
        info!("Instance PID {} is already not running", pid);
        return Ok(());
    }

    match kill(NixPid::from_raw(pid as i32), Signal::SIGTERM) {
        Ok(()) => info!("Sent SIGTERM to instance PID {}", pid),
        Err(Errno::ESRCH) => {
            info!("Instance PID {} exited before SIGTERM was delivered", pid);
            return Ok(());
        }
        Err(e) => {
            return Err(InstanceError::Signal(format!(
                "Failed to send SIGTERM to PID {}: {}",
                pid, e
            )));
        }
    }

    for _attempt in 0..INSTANCE_STOP_POLL_ATTEMPTS {
        sleep(Duration::from_millis(INSTANCE_STOP_POLL_INTERVAL_MS)).await;
        if !is_process_running(pid).await {
            info!("Instance PID {} exited after SIGTERM", pid);
            return Ok(());
        }
    }

    warn!("Instance PID {} did not exit after SIGTERM, sending SIGKILL", pid);
    match kill(NixPid::from_raw(pid as i32), Signal::SIGKILL) {
        Ok(()) | Err(Errno::ESRCH) => {}
        Err(e) => {
            return Err(InstanceError::Signal(format!(
                "Failed to send SIGKILL to PID {}: {}",
                pid, e
            )));
        }
    }

    sleep(Duration::from_millis(INSTANCE_STOP_POLL_INTERVAL_MS)).await;
    if is_process_running(pid).await {
        return Err(InstanceError::ProcessError(format!(
            "Instance PID {} survived SIGKILL",
            pid
        )));
    }

    info!("Instance PID {} exited after SIGKILL", pid);
    Ok(())
}

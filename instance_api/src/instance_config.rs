// instance_api/src/instance_config.rs

/// Prefix of the PID files written for running simulated instances.
/// A node's PID file is `<run dir>/<prefix><node_id>.pid`.
pub const INSTANCE_PID_FILE_NAME_PREFIX: &str = "netlab-instance-";

/// Default directory for instance PID files.
pub const DEFAULT_INSTANCE_RUN_DIR: &str = "/tmp";

/// Interval between liveness polls while waiting for a signalled instance to
/// exit.
pub const INSTANCE_STOP_POLL_INTERVAL_MS: u64 = 200;

/// How many liveness polls to run after SIGTERM before escalating to SIGKILL.
pub const INSTANCE_STOP_POLL_ATTEMPTS: u32 = 10;

//! Canonical structured event names used across `dhammer`.

// Orchestrator lifecycle events.
pub const HAMMER_INIT_START: &str = "hammer_init_start";
pub const HAMMER_INIT_OK: &str = "hammer_init_ok";
pub const HAMMER_INIT_FAILED: &str = "hammer_init_failed";
pub const SUBSYSTEM_INIT_OK: &str = "subsystem_init_ok";
pub const TASK_START: &str = "task_start";
pub const TASK_STOPPED: &str = "task_stopped";
pub const TASK_PANICKED: &str = "task_panicked";
pub const EXTERNAL_STOP: &str = "external_stop";
pub const EXTERNAL_STOP_FAILED: &str = "external_stop_failed";
pub const EXTERNAL_STOP_LATE: &str = "external_stop_late";

// Cascade teardown events.
pub const TEARDOWN_START: &str = "teardown_start";
pub const TEARDOWN_STEP_OK: &str = "teardown_step_ok";
pub const TEARDOWN_STEP_FAILED: &str = "teardown_step_failed";
pub const TEARDOWN_SKIPPED: &str = "teardown_skipped";
pub const TEARDOWN_OK: &str = "teardown_ok";
pub const CHANNEL_CLOSED: &str = "channel_closed";

// Fan-in reader events.
pub const REPORTED_ERROR: &str = "reported_error";
pub const REPORTED_LOG: &str = "reported_log";
pub const REPORTED_STAT: &str = "reported_stat";

// Control-plane events.
pub const CONTROL_BIND: &str = "control_bind";
pub const CONTROL_ACCESS: &str = "control_access";
pub const CONTROL_ACCEPT_FAILED: &str = "control_accept_failed";
pub const CONTROL_WRITE_FAILED: &str = "control_write_failed";
pub const CONTROL_ABANDONED: &str = "control_abandoned";
pub const CONTROL_STOPPED: &str = "control_stopped";

// Driver events.
pub const TRANSPORT_BOUND: &str = "transport_bound";
pub const TRANSPORT_NO_RECEIVER: &str = "transport_no_receiver";
pub const GENERATOR_UPDATED: &str = "generator_updated";
pub const GENERATOR_COMPLETED: &str = "generator_completed";

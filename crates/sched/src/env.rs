// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon.

use std::path::PathBuf;
use std::time::Duration;

/// Default scheduler service port.
pub const DEFAULT_SCHED_PORT: u16 = 15004;

/// Default resource-monitor port.
pub const DEFAULT_RM_PORT: u16 = 15003;

/// Daemon home: `BQ_HOME` or the packaged default.
pub fn home_dir() -> PathBuf {
    std::env::var_os("BQ_HOME").map(PathBuf::from).unwrap_or_else(|| PathBuf::from("/var/spool/bq"))
}

/// Scheduler service port override.
pub fn sched_port() -> Option<u16> {
    std::env::var("BQ_SCHED_PORT").ok().and_then(|s| s.parse().ok())
}

/// Primary server host in a failover pair.
pub fn primary_host() -> Option<String> {
    std::env::var("BQ_PRIMARY").ok().filter(|s| !s.is_empty())
}

/// Secondary server host in a failover pair.
pub fn secondary_host() -> Option<String> {
    std::env::var("BQ_SECONDARY").ok().filter(|s| !s.is_empty())
}

/// Explicit server host when failover is not configured.
pub fn server_host() -> Option<String> {
    std::env::var("BQ_SERVER_HOST").ok().filter(|s| !s.is_empty())
}

/// Bound on reading one scheduling command from the server.
pub fn cmd_timeout() -> Duration {
    std::env::var("BQ_CMD_TIMEOUT_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(30))
}

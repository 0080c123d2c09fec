// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Failover identity: are we the primary or the secondary scheduler?

use crate::error::SchedError;

/// Failover role of this daemon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Primary,
    Secondary,
}

impl Role {
    /// Name of the single-instance lock file for this role.
    pub fn lock_file_name(self) -> &'static str {
        match self {
            Role::Primary => "sched.lock",
            Role::Secondary => "sched.lock.secondary",
        }
    }
}

/// Decide our role from the configured failover hosts.
///
/// With neither host configured we are the sole primary. With both
/// configured, one of them must name this host. Anything else is a fatal
/// configuration error.
pub fn determine_role(
    primary: Option<&str>,
    secondary: Option<&str>,
    our_host: &str,
) -> Result<Role, SchedError> {
    match (primary, secondary) {
        (None, None) => Ok(Role::Primary),
        (Some(primary), Some(secondary)) => {
            if host_matches(primary, our_host) {
                Ok(Role::Primary)
            } else if host_matches(secondary, our_host) {
                Ok(Role::Secondary)
            } else {
                Err(SchedError::NoIdentity)
            }
        }
        _ => Err(SchedError::PartialFailover),
    }
}

/// Compare a configured host against ours, ignoring case, a port suffix,
/// and anything after the first comma.
fn host_matches(configured: &str, ours: &str) -> bool {
    let first = configured.split(',').next().unwrap_or(configured);
    let name = first.split(':').next().unwrap_or(first);
    name.eq_ignore_ascii_case(ours)
}

/// This machine's host name.
pub fn local_hostname() -> Result<String, SchedError> {
    let name = nix::unistd::gethostname().map_err(|_| SchedError::NoHostname)?;
    name.into_string().map_err(|_| SchedError::NoHostname)
}

#[cfg(test)]
#[path = "identity_tests.rs"]
mod tests;

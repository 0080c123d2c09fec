// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Crash handling: restart the daemon after a crash, unless it crashed
//! too soon after starting.
//!
//! Rather than handling `SIGSEGV` inside the crashing process, the
//! binary runs as a small supervising parent that spawns the real daemon
//! as a child and inspects how it died. The child dumps core as usual;
//! the parent applies the restart policy.

use std::os::unix::process::ExitStatusExt;
use std::process::Command;
use std::time::{Duration, Instant};

use nix::sys::signal::Signal;
use tracing::{error, info, warn};

use crate::error::SchedError;

/// Exit code for the unreachable respawn-failed path.
pub const EXIT_UNREACHABLE: i32 = 3;

/// Marker the parent sets on the child so it runs the daemon proper.
pub const SUPERVISED_ENV: &str = "BQSCHED_SUPERVISED";

/// What to do about an abnormal exit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrashAction {
    /// Crashed too soon after startup; give up rather than crash-loop.
    Abort,
    /// Wait out the restart delay, then start the daemon again.
    Restart,
}

/// The restart decision, kept separate from the process plumbing.
#[derive(Debug, Clone, Copy)]
pub struct RestartPolicy {
    min_uptime: Duration,
    restart_delay: Duration,
}

impl Default for RestartPolicy {
    fn default() -> Self {
        Self { min_uptime: Duration::from_secs(300), restart_delay: Duration::from_secs(10) }
    }
}

impl RestartPolicy {
    pub fn decide(&self, uptime: Duration) -> CrashAction {
        if uptime < self.min_uptime {
            CrashAction::Abort
        } else {
            CrashAction::Restart
        }
    }

    pub fn restart_delay(&self) -> Duration {
        self.restart_delay
    }
}

/// True when this process is the supervised child and should run the
/// daemon proper.
pub fn is_supervised_child() -> bool {
    std::env::var_os(SUPERVISED_ENV).is_some()
}

fn is_crash_signal(signal: i32) -> bool {
    signal == Signal::SIGSEGV as i32 || signal == Signal::SIGBUS as i32
}

/// Run the daemon as a supervised child until it exits normally.
/// Returns the exit code to propagate. With `outfile` set, the child's
/// stdout and stderr are appended there.
pub fn run_supervised(outfile: Option<&std::path::Path>) -> Result<i32, SchedError> {
    let exe = std::env::current_exe()?;
    let args: Vec<std::ffi::OsString> = std::env::args_os().skip(1).collect();
    let policy = RestartPolicy::default();
    let mut restarting = false;

    loop {
        let started = Instant::now();
        let mut command = Command::new(&exe);
        command.args(&args).env(SUPERVISED_ENV, "1");
        if let Some(path) = outfile {
            let out = std::fs::OpenOptions::new().create(true).append(true).open(path)?;
            command.stdout(out.try_clone()?).stderr(out);
        }
        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(e) if restarting => {
                error!(error = %e, "respawn after crash failed");
                return Ok(EXIT_UNREACHABLE);
            }
            Err(e) => return Err(e.into()),
        };
        if restarting {
            info!("scheduler restarted");
        }
        let status = child.wait()?;

        if let Some(code) = status.code() {
            return Ok(code);
        }
        match status.signal() {
            Some(signal) if is_crash_signal(signal) => match policy.decide(started.elapsed()) {
                CrashAction::Abort => {
                    error!(signal, "crashed within five minutes of start: aborting");
                    return Ok(1);
                }
                CrashAction::Restart => {
                    warn!(signal, "scheduler crashed; restarting shortly");
                    std::thread::sleep(policy.restart_delay());
                    restarting = true;
                }
            },
            other => {
                error!(signal = ?other, "scheduler terminated abnormally");
                return Ok(1);
            }
        }
    }
}

#[cfg(test)]
#[path = "crash_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[parameterized(
    immediately = { 0 },
    just_under = { 299 },
)]
fn early_crashes_abort(uptime_secs: u64) {
    let policy = RestartPolicy::default();
    assert_eq!(policy.decide(Duration::from_secs(uptime_secs)), CrashAction::Abort);
}

#[parameterized(
    at_the_boundary = { 300 },
    long_running = { 86_400 },
)]
fn established_daemons_restart(uptime_secs: u64) {
    let policy = RestartPolicy::default();
    assert_eq!(policy.decide(Duration::from_secs(uptime_secs)), CrashAction::Restart);
}

#[test]
fn restart_waits_ten_seconds() {
    assert_eq!(RestartPolicy::default().restart_delay(), Duration::from_secs(10));
}

#[test]
fn only_segv_and_bus_count_as_crashes() {
    assert!(is_crash_signal(Signal::SIGSEGV as i32));
    assert!(is_crash_signal(Signal::SIGBUS as i32));
    assert!(!is_crash_signal(Signal::SIGKILL as i32));
    assert!(!is_crash_signal(Signal::SIGTERM as i32));
}

#[test]
fn unreachable_exit_code_is_three() {
    assert_eq!(EXIT_UNREACHABLE, 3);
}

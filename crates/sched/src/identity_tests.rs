// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[test]
fn sole_server_is_primary() {
    assert_eq!(determine_role(None, None, "node-a").unwrap(), Role::Primary);
}

#[test]
fn listed_primary_wins() {
    let role = determine_role(Some("node-a"), Some("node-b"), "node-a").unwrap();
    assert_eq!(role, Role::Primary);
}

#[test]
fn listed_secondary_is_secondary() {
    let role = determine_role(Some("node-a"), Some("node-b"), "node-b").unwrap();
    assert_eq!(role, Role::Secondary);
}

#[test]
fn neither_host_is_fatal() {
    let err = determine_role(Some("node-a"), Some("node-b"), "node-c").unwrap_err();
    assert!(matches!(err, SchedError::NoIdentity));
}

#[parameterized(
    only_primary = { Some("node-a"), None },
    only_secondary = { None, Some("node-b") },
)]
fn half_configured_failover_is_fatal(primary: Option<&str>, secondary: Option<&str>) {
    let err = determine_role(primary, secondary, "node-a").unwrap_err();
    assert!(matches!(err, SchedError::PartialFailover));
}

#[parameterized(
    port_suffix = { "node-a:15001" },
    comma_list = { "node-a,node-a.cluster" },
    case = { "NODE-A" },
)]
fn host_decorations_are_ignored(configured: &str) {
    let role = determine_role(Some(configured), Some("node-b"), "node-a").unwrap();
    assert_eq!(role, Role::Primary);
}

#[test]
fn lock_file_names_differ_by_role() {
    assert_eq!(Role::Primary.lock_file_name(), "sched.lock");
    assert_eq!(Role::Secondary.lock_file_name(), "sched.lock.secondary");
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon error surface.

use std::path::PathBuf;

use thiserror::Error;

use crate::policy::PolicyError;

#[derive(Debug, Error)]
pub enum SchedError {
    #[error("another scheduler running (lock on {0})")]
    LockFailed(PathBuf, #[source] std::io::Error),

    #[error("invalid line in config file: {0}")]
    ConfigLine(String),

    #[error("host {0} not found")]
    HostNotFound(String),

    #[error("failover needs both primary and secondary hosts configured")]
    PartialFailover,

    #[error("neither primary nor secondary server")]
    NoIdentity,

    #[error("cannot determine our host name")]
    NoHostname,

    #[error("policy engine: {0}")]
    Policy(#[from] PolicyError),

    #[error("network: {0}")]
    Net(#[from] bq_net::NetError),

    #[error("protocol: {0}")]
    Protocol(#[from] bq_wire::ProtocolError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

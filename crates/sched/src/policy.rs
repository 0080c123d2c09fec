// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The scheduling policy engine contract.
//!
//! The engine is an external collaborator: the supervisor hands it one
//! command per cycle together with the server connection and drives
//! nothing else. Any worker-pool parallelism is private to the engine.

use async_trait::async_trait;
use bq_wire::SchedCommand;
use thiserror::Error;
use tracing::info;

use crate::link::ServerLink;

/// What the engine wants after a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    Continue,
    Quit,
}

#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("policy initialization failed: {0}")]
    Init(String),

    #[error("scheduling cycle failed: {0}")]
    Cycle(String),
}

/// One scheduling cycle per server command.
///
/// `link` is the connection the command arrived on; it is absent for
/// internally triggered cycles (reconfigure on SIGHUP).
#[async_trait]
pub trait PolicyEngine: Send {
    fn init(&mut self, nthreads: usize) -> Result<(), PolicyError>;

    async fn schedule(
        &mut self,
        cmd: SchedCommand,
        link: Option<&mut ServerLink>,
        job_id: Option<&str>,
    ) -> Result<CycleOutcome, PolicyError>;

    fn shutdown(&mut self);
}

/// Engine that accepts every command and schedules nothing. Useful for
/// bring-up and tests; a real policy replaces it at link time.
#[derive(Debug, Default)]
pub struct NullPolicy;

#[async_trait]
impl PolicyEngine for NullPolicy {
    fn init(&mut self, nthreads: usize) -> Result<(), PolicyError> {
        info!(nthreads, "policy engine ready");
        Ok(())
    }

    async fn schedule(
        &mut self,
        cmd: SchedCommand,
        _link: Option<&mut ServerLink>,
        job_id: Option<&str>,
    ) -> Result<CycleOutcome, PolicyError> {
        info!(?cmd, job_id, "scheduling cycle");
        Ok(match cmd {
            SchedCommand::Quit => CycleOutcome::Quit,
            _ => CycleOutcome::Continue,
        })
    }

    fn shutdown(&mut self) {
        info!("policy engine shut down");
    }
}

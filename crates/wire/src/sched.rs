// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scheduler command channel codec.
//!
//! The batch server delivers scheduling commands as a 4-byte big-endian
//! code followed by a 4-byte big-endian job-id length and the job-id
//! bytes. A zero length means no job id.

use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};

use crate::frame::{read_exact_or_closed, ProtocolError};

/// Longest accepted job id.
const MAX_JOB_ID_LEN: u32 = 4096;

/// Commands the batch server can send to the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedCommand {
    /// No-op keepalive.
    Null,
    /// A job was queued; schedule soon.
    NewJob,
    /// A job terminated.
    Term,
    /// Periodic cycle.
    Time,
    /// Re-run the last cycle.
    Recycle,
    /// Operator-requested cycle.
    Cmd,
    /// First cycle after a server restart.
    First,
    /// Re-read configuration before the next cycle.
    Configure,
    /// Shut down.
    Quit,
    /// Run a specific job as soon as possible.
    RunJobAsap,
    /// Schedule a specific job (job id follows the code).
    ScheduleJob,
    /// Preempt the cycle in progress.
    RestartCycle,
}

impl SchedCommand {
    pub fn code(self) -> u32 {
        match self {
            SchedCommand::Null => 0,
            SchedCommand::NewJob => 1,
            SchedCommand::Term => 2,
            SchedCommand::Time => 3,
            SchedCommand::Recycle => 4,
            SchedCommand::Cmd => 5,
            SchedCommand::First => 6,
            SchedCommand::Configure => 7,
            SchedCommand::Quit => 8,
            SchedCommand::RunJobAsap => 9,
            SchedCommand::ScheduleJob => 10,
            SchedCommand::RestartCycle => 11,
        }
    }

    pub fn from_code(code: u32) -> Option<Self> {
        const ALL: [SchedCommand; 12] = [
            SchedCommand::Null,
            SchedCommand::NewJob,
            SchedCommand::Term,
            SchedCommand::Time,
            SchedCommand::Recycle,
            SchedCommand::Cmd,
            SchedCommand::First,
            SchedCommand::Configure,
            SchedCommand::Quit,
            SchedCommand::RunJobAsap,
            SchedCommand::ScheduleJob,
            SchedCommand::RestartCycle,
        ];
        ALL.into_iter().find(|c| c.code() == code)
    }
}

/// Read one `(command, job id)` pair, bounded by `timeout`.
pub async fn read_sched_cmd<R>(
    reader: &mut R,
    timeout: Duration,
) -> Result<(SchedCommand, Option<String>), ProtocolError>
where
    R: AsyncRead + Unpin,
{
    tokio::time::timeout(timeout, read_sched_cmd_inner(reader))
        .await
        .map_err(|_| ProtocolError::Timeout)?
}

async fn read_sched_cmd_inner<R>(
    reader: &mut R,
) -> Result<(SchedCommand, Option<String>), ProtocolError>
where
    R: AsyncRead + Unpin,
{
    let mut word = [0u8; 4];
    read_exact_or_closed(reader, &mut word).await?;
    let code = u32::from_be_bytes(word);
    let cmd = SchedCommand::from_code(code).ok_or(ProtocolError::UnknownCommand(code))?;

    read_exact_or_closed(reader, &mut word).await?;
    let id_len = u32::from_be_bytes(word);
    if id_len == 0 {
        return Ok((cmd, None));
    }
    if id_len > MAX_JOB_ID_LEN {
        return Err(ProtocolError::FrameTooLarge(id_len));
    }

    let mut id_buf = vec![0u8; id_len as usize];
    read_exact_or_closed(reader, &mut id_buf).await?;
    let job_id = String::from_utf8(id_buf).map_err(|_| ProtocolError::InvalidJobId)?;
    Ok((cmd, Some(job_id)))
}

/// Write one `(command, job id)` pair, bounded by `timeout`.
pub async fn write_sched_cmd<W>(
    writer: &mut W,
    cmd: SchedCommand,
    job_id: Option<&str>,
    timeout: Duration,
) -> Result<(), ProtocolError>
where
    W: AsyncWrite + Unpin,
{
    let id = job_id.unwrap_or("");
    let mut buf = Vec::with_capacity(8 + id.len());
    buf.extend_from_slice(&cmd.code().to_be_bytes());
    buf.extend_from_slice(&(id.len() as u32).to_be_bytes());
    buf.extend_from_slice(id.as_bytes());

    tokio::time::timeout(timeout, async {
        writer.write_all(&buf).await?;
        writer.flush().await
    })
    .await
    .map_err(|_| ProtocolError::Timeout)??;
    Ok(())
}

#[cfg(test)]
#[path = "sched_tests.rs"]
mod tests;

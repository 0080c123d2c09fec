// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::time::Duration;
use yare::parameterized;

const TIMEOUT: Duration = Duration::from_secs(1);

#[parameterized(
    null = { SchedCommand::Null },
    new_job = { SchedCommand::NewJob },
    configure = { SchedCommand::Configure },
    quit = { SchedCommand::Quit },
    restart_cycle = { SchedCommand::RestartCycle },
)]
fn code_round_trips(cmd: SchedCommand) {
    assert_eq!(SchedCommand::from_code(cmd.code()), Some(cmd));
}

#[test]
fn unknown_code_is_none() {
    assert_eq!(SchedCommand::from_code(999), None);
}

#[tokio::test]
async fn command_without_job_id_round_trips() {
    let (mut a, mut b) = tokio::io::duplex(64);
    write_sched_cmd(&mut a, SchedCommand::Time, None, TIMEOUT).await.unwrap();

    let (cmd, job) = read_sched_cmd(&mut b, TIMEOUT).await.unwrap();
    assert_eq!(cmd, SchedCommand::Time);
    assert_eq!(job, None);
}

#[tokio::test]
async fn command_with_job_id_round_trips() {
    let (mut a, mut b) = tokio::io::duplex(64);
    write_sched_cmd(&mut a, SchedCommand::ScheduleJob, Some("123.svr0"), TIMEOUT).await.unwrap();

    let (cmd, job) = read_sched_cmd(&mut b, TIMEOUT).await.unwrap();
    assert_eq!(cmd, SchedCommand::ScheduleJob);
    assert_eq!(job.as_deref(), Some("123.svr0"));
}

#[tokio::test]
async fn unknown_command_code_is_protocol_error() {
    let (mut a, mut b) = tokio::io::duplex(64);
    tokio::io::AsyncWriteExt::write_all(&mut a, &77u32.to_be_bytes()).await.unwrap();
    tokio::io::AsyncWriteExt::write_all(&mut a, &0u32.to_be_bytes()).await.unwrap();

    let err = read_sched_cmd(&mut b, TIMEOUT).await.unwrap_err();
    assert!(matches!(err, ProtocolError::UnknownCommand(77)));
}

#[tokio::test]
async fn peer_close_is_connection_closed() {
    let (a, mut b) = tokio::io::duplex(64);
    drop(a);

    let err = read_sched_cmd(&mut b, TIMEOUT).await.unwrap_err();
    assert!(matches!(err, ProtocolError::ConnectionClosed));
}

#[tokio::test]
async fn oversize_job_id_is_rejected() {
    let (mut a, mut b) = tokio::io::duplex(64);
    tokio::io::AsyncWriteExt::write_all(&mut a, &SchedCommand::ScheduleJob.code().to_be_bytes())
        .await
        .unwrap();
    tokio::io::AsyncWriteExt::write_all(&mut a, &1_000_000u32.to_be_bytes()).await.unwrap();

    let err = read_sched_cmd(&mut b, TIMEOUT).await.unwrap_err();
    assert!(matches!(err, ProtocolError::FrameTooLarge(_)));
}

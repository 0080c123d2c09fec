// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::{BatchReply, BatchRequest, ParentObject};
use bq_core::StatusEntry;
use std::time::Duration;

const TIMEOUT: Duration = Duration::from_secs(1);

#[test]
fn encode_prefixes_payload_length() {
    let buf = encode(&BatchReply::Ok).unwrap();
    let len = u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]) as usize;
    assert_eq!(len, buf.len() - 4);
}

#[tokio::test]
async fn round_trip_through_duplex() {
    let (mut a, mut b) = tokio::io::duplex(1024);
    let request =
        BatchRequest::Status { object: ParentObject::Server, id: String::new(), criteria: vec![] };

    write_message(&mut a, &request, TIMEOUT).await.unwrap();
    let got: BatchRequest = read_message(&mut b, TIMEOUT).await.unwrap();
    assert_eq!(got, request);
}

#[tokio::test]
async fn read_after_close_is_connection_closed() {
    let (a, mut b) = tokio::io::duplex(1024);
    drop(a);

    let err = read_message::<_, BatchReply>(&mut b, TIMEOUT).await.unwrap_err();
    assert!(matches!(err, ProtocolError::ConnectionClosed));
}

#[tokio::test]
async fn oversize_frame_is_rejected_without_allocating() {
    let (mut a, mut b) = tokio::io::duplex(64);
    let bogus = (MAX_FRAME_LEN + 1).to_be_bytes();
    tokio::io::AsyncWriteExt::write_all(&mut a, &bogus).await.unwrap();

    let err = read_message::<_, BatchReply>(&mut b, TIMEOUT).await.unwrap_err();
    assert!(matches!(err, ProtocolError::FrameTooLarge(_)));
}

#[tokio::test]
async fn truncated_payload_is_connection_closed() {
    let (mut a, mut b) = tokio::io::duplex(64);
    // length says 10 bytes, deliver 3, then close
    tokio::io::AsyncWriteExt::write_all(&mut a, &10u32.to_be_bytes()).await.unwrap();
    tokio::io::AsyncWriteExt::write_all(&mut a, b"abc").await.unwrap();
    drop(a);

    let err = read_message::<_, BatchReply>(&mut b, TIMEOUT).await.unwrap_err();
    assert!(matches!(err, ProtocolError::ConnectionClosed));
}

#[tokio::test]
async fn garbage_payload_is_malformed() {
    let (mut a, mut b) = tokio::io::duplex(64);
    let mut buf = 4u32.to_be_bytes().to_vec();
    buf.extend_from_slice(b"!!!!");
    tokio::io::AsyncWriteExt::write_all(&mut a, &buf).await.unwrap();

    let err = read_message::<_, BatchReply>(&mut b, TIMEOUT).await.unwrap_err();
    assert!(matches!(err, ProtocolError::Malformed(_)));
}

#[tokio::test]
async fn stalled_reader_times_out() {
    let (_a, mut b) = tokio::io::duplex(64);
    let err = read_message::<_, BatchReply>(&mut b, Duration::from_millis(50)).await.unwrap_err();
    assert!(matches!(err, ProtocolError::Timeout));
}

#[test]
fn status_reply_round_trips_entries() {
    let reply = BatchReply::Status { entries: vec![StatusEntry::new("job.1")] };
    let buf = encode(&reply).unwrap();
    let got: BatchReply = decode(&buf[4..]).unwrap();
    assert_eq!(got, reply);
}

mod properties {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn encode_decode_round_trips_any_entry_name(name in ".*") {
            let reply = BatchReply::Status { entries: vec![StatusEntry::new(name)] };
            let buf = encode(&reply).unwrap();
            let got: BatchReply = decode(&buf[4..]).unwrap();
            prop_assert_eq!(got, reply);
        }
    }
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process fake batch servers for client tests.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bq_wire::{read_message, write_message, BatchReply, BatchRequest};

const TIMEOUT: Duration = Duration::from_secs(5);

/// Spawn a server that answers every request on every connection with
/// `reply_fn`. Returns its address.
pub async fn fake_server<F>(reply_fn: F) -> SocketAddr
where
    F: Fn(&BatchRequest) -> BatchReply + Send + Sync + 'static,
{
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let reply_fn = Arc::new(reply_fn);

    tokio::spawn(async move {
        loop {
            let Ok((mut stream, _)) = listener.accept().await else {
                break;
            };
            let reply_fn = Arc::clone(&reply_fn);
            tokio::spawn(async move {
                loop {
                    let request: BatchRequest = match read_message(&mut stream, TIMEOUT).await {
                        Ok(r) => r,
                        Err(_) => break,
                    };
                    let reply = reply_fn(&request);
                    if write_message(&mut stream, &reply, TIMEOUT).await.is_err() {
                        break;
                    }
                }
            });
        }
    });
    addr
}

/// An address nothing is listening on.
pub async fn dead_addr() -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixtures for connection-layer tests.

use std::io::ErrorKind;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::net::TcpStream;

use crate::auth::{AuthOutcome, Authenticator};
use crate::error::NetError;
use crate::registry::{ConnHandler, Registry, SocketId};

/// A connected client/server stream pair over loopback.
pub async fn tcp_pair() -> (TcpStream, TcpStream) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let client = TcpStream::connect(addr).await.unwrap();
    let (server, _) = listener.accept().await.unwrap();
    (client, server)
}

/// Authenticator that accepts everything.
pub struct OkAuth;

#[async_trait]
impl Authenticator for OkAuth {
    async fn authenticate(&self, _registry: &Registry, _sock: SocketId) -> AuthOutcome {
        AuthOutcome::Ok
    }
}

/// Data hook that records dispatch order and drains the socket. Closes
/// the connection on EOF.
pub struct Recorder {
    pub order: Arc<Mutex<Vec<SocketId>>>,
}

impl Recorder {
    pub fn new() -> (Arc<Self>, Arc<Mutex<Vec<SocketId>>>) {
        let order = Arc::new(Mutex::new(Vec::new()));
        (Arc::new(Self { order: Arc::clone(&order) }), order)
    }
}

#[async_trait]
impl ConnHandler for Recorder {
    async fn on_data(&self, registry: &mut Registry, sock: SocketId) -> Result<(), NetError> {
        self.order.lock().push(sock);

        let mut eof = false;
        if let Some(stream) = registry.stream_mut(sock) {
            let mut buf = [0u8; 256];
            loop {
                match stream.try_read(&mut buf) {
                    Ok(0) => {
                        eof = true;
                        break;
                    }
                    Ok(_) => {}
                    Err(ref e) if e.kind() == ErrorKind::WouldBlock => break,
                    Err(e) => return Err(e.into()),
                }
            }
        }
        if eof {
            registry.close(sock);
        }
        Ok(())
    }
}

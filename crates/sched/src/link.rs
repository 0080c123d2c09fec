// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The per-cycle connection back to the batch server.
//!
//! The server dials us to deliver a command; the accepted socket then
//! doubles as the channel for requests we make of the server during the
//! cycle, starting with the scheduler's self-describing attributes.

use std::net::SocketAddr;

use bq_wire::{read_message, write_message, BatchReply, BatchRequest, ProtocolError, SchedCommand};
use tokio::net::TcpStream;

use crate::env;

pub struct ServerLink {
    stream: TcpStream,
    peer: SocketAddr,
}

impl ServerLink {
    pub(crate) fn new(stream: TcpStream, peer: SocketAddr) -> Self {
        Self { stream, peer }
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    /// Read the scheduling command this connection was opened to deliver.
    pub(crate) async fn read_command(
        &mut self,
    ) -> Result<(SchedCommand, Option<String>), ProtocolError> {
        bq_wire::read_sched_cmd(&mut self.stream, env::cmd_timeout()).await
    }

    /// Send one request to the server.
    pub async fn send(&mut self, request: &BatchRequest) -> Result<(), ProtocolError> {
        write_message(&mut self.stream, request, env::cmd_timeout()).await
    }

    /// Read one reply from the server.
    pub async fn read_reply(&mut self) -> Result<BatchReply, ProtocolError> {
        read_message(&mut self.stream, env::cmd_timeout()).await
    }
}

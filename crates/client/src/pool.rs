// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Endpoint table and per-connection serialization.
//!
//! Endpoints are held in configuration order; the position in the table is
//! the index reported back to callers through the `server_index` reply
//! attribute. Every RPC takes the endpoint's connection lock across the
//! send and the reply read, so concurrent callers are serialized per
//! connection.

use std::net::SocketAddr;
use std::time::Duration;

use bq_wire::{read_message, write_message, BatchReply, BatchRequest};
use parking_lot::Mutex;
use rand::Rng;
use tokio::net::TcpStream;
use tracing::{debug, warn};

use crate::error::ClientError;

/// The synthetic index attribute is rendered with at most two digits.
pub const MAX_SERVERS: usize = 99;

/// Bound on one send+reply exchange.
const RPC_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection state of one endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointState {
    Disconnected,
    Connecting,
    Connected,
}

/// One configured batch server.
pub struct Endpoint {
    index: usize,
    addr: SocketAddr,
    state: Mutex<EndpointState>,
    /// The per-connection lock: held across send + reply for every RPC.
    conn: tokio::sync::Mutex<Option<TcpStream>>,
}

impl Endpoint {
    fn new(index: usize, addr: SocketAddr) -> Self {
        Self {
            index,
            addr,
            state: Mutex::new(EndpointState::Disconnected),
            conn: tokio::sync::Mutex::new(None),
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn state(&self) -> EndpointState {
        *self.state.lock()
    }

    /// Issue one request and read its reply, holding the connection lock
    /// throughout. A disconnected endpoint is redialed first; any failure
    /// recycles the socket and marks the endpoint disconnected.
    pub(crate) async fn rpc(&self, request: &BatchRequest) -> Result<BatchReply, ClientError> {
        let mut guard = self.conn.lock().await;
        if guard.is_none() {
            *self.state.lock() = EndpointState::Connecting;
            match TcpStream::connect(self.addr).await {
                Ok(stream) => {
                    if let Err(e) = stream.set_nodelay(true) {
                        debug!(endpoint = self.index, error = %e, "set_nodelay failed");
                    }
                    *guard = Some(stream);
                    *self.state.lock() = EndpointState::Connected;
                }
                Err(e) => {
                    *self.state.lock() = EndpointState::Disconnected;
                    warn!(endpoint = self.index, addr = %self.addr, error = %e, "connect failed");
                    return Err(e.into());
                }
            }
        }

        let result = async {
            let stream = guard.as_mut().ok_or(ClientError::NoServers)?;
            write_message(stream, request, RPC_TIMEOUT).await?;
            Ok::<BatchReply, ClientError>(read_message(stream, RPC_TIMEOUT).await?)
        }
        .await;

        if result.is_err() {
            // recycle the socket; the next attempt redials
            *guard = None;
            *self.state.lock() = EndpointState::Disconnected;
        }
        result
    }

    /// Dial the endpoint if it is not already connected.
    pub async fn connect(&self) -> Result<(), ClientError> {
        let mut guard = self.conn.lock().await;
        if guard.is_some() {
            return Ok(());
        }
        *self.state.lock() = EndpointState::Connecting;
        match TcpStream::connect(self.addr).await {
            Ok(stream) => {
                if let Err(e) = stream.set_nodelay(true) {
                    debug!(endpoint = self.index, error = %e, "set_nodelay failed");
                }
                *guard = Some(stream);
                *self.state.lock() = EndpointState::Connected;
                Ok(())
            }
            Err(e) => {
                *self.state.lock() = EndpointState::Disconnected;
                Err(e.into())
            }
        }
    }
}

/// Ordered table of configured servers.
pub struct ServerPool {
    endpoints: Vec<Endpoint>,
    /// Sticky endpoint preference for single-target requests. Reset
    /// before management requests so the next pick is fresh.
    shard_hint: Mutex<Option<usize>>,
    verify_attributes: bool,
}

impl ServerPool {
    pub fn new(addrs: Vec<SocketAddr>) -> Result<Self, ClientError> {
        if addrs.len() > MAX_SERVERS {
            return Err(ClientError::TooManyServers(addrs.len()));
        }
        let endpoints =
            addrs.into_iter().enumerate().map(|(i, addr)| Endpoint::new(i, addr)).collect();
        Ok(Self { endpoints, shard_hint: Mutex::new(None), verify_attributes: false })
    }

    /// Enable attribute syntax verification for management requests.
    pub fn with_attribute_verification(mut self, enabled: bool) -> Self {
        self.verify_attributes = enabled;
        self
    }

    pub(crate) fn verify_attributes(&self) -> bool {
        self.verify_attributes
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    pub fn endpoints(&self) -> &[Endpoint] {
        &self.endpoints
    }

    /// Try to connect every endpoint. Per-endpoint failures are logged
    /// and skipped.
    pub async fn connect_all(&self) {
        for endpoint in &self.endpoints {
            if let Err(e) = endpoint.connect().await {
                warn!(endpoint = endpoint.index, addr = %endpoint.addr, error = %e, "connect failed");
            }
        }
    }

    /// First connected endpoint in index order.
    pub(crate) fn first_connected(&self) -> Option<&Endpoint> {
        self.endpoints.iter().find(|e| e.state() == EndpointState::Connected)
    }

    /// Pick a connected endpoint: the sharding hint if still valid, else
    /// a uniform random pick, falling back to the first connected
    /// endpoint when the pick is not connected.
    pub(crate) fn pick_connected(&self) -> Result<&Endpoint, ClientError> {
        if self.endpoints.is_empty() {
            return Err(ClientError::NoServers);
        }
        if let Some(index) = *self.shard_hint.lock() {
            if let Some(hinted) = self.endpoints.get(index) {
                if hinted.state() == EndpointState::Connected {
                    return Ok(hinted);
                }
            }
        }
        let pick = rand::thread_rng().gen_range(0..self.endpoints.len());
        let chosen = if self.endpoints[pick].state() == EndpointState::Connected {
            &self.endpoints[pick]
        } else {
            self.first_connected().ok_or(ClientError::NoServers)?
        };
        *self.shard_hint.lock() = Some(chosen.index);
        Ok(chosen)
    }

    /// Drop the sticky endpoint preference so the next single-target
    /// request selects a fresh server.
    pub fn reset_shard_hint(&self) {
        *self.shard_hint.lock() = None;
    }
}

#[cfg(test)]
#[path = "pool_tests.rs"]
mod tests;

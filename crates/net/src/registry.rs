// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Connection records, keyed by socket identifier.
//!
//! One record exists per open socket, discoverable in O(1) by its
//! [`SocketId`]. Closing a record removes it, runs its close hook exactly
//! once, and drops the socket; `close` is idempotent and safe to call from
//! any hook.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::net::IpAddr;
use std::os::fd::{AsRawFd, RawFd};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use bq_core::Clock;
use futures_util::FutureExt;
use tokio::io::unix::AsyncFd;
use tokio::io::Interest;
use tokio::net::TcpStream;
use tracing::warn;

use crate::error::NetError;

/// Reap idle inbound connections after this long without traffic.
pub const DEFAULT_MAX_IDLE: Duration = Duration::from_secs(900);

/// Minimum interval between idle sweeps, in seconds.
const IDLE_SWEEP_INTERVAL: u64 = 60;

/// Source ports below this are reserved to privileged peers.
pub(crate) const RESERVED_PORT: u16 = 1024;

/// Stable identifier for a registered socket: the OS handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SocketId(pub RawFd);

impl fmt::Display for SocketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What a registered socket is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnKind {
    PrimaryListener,
    SecondaryListener,
    InboundClient,
    ChildPipe,
    TransportPeer,
}

impl ConnKind {
    /// Listener and transport sockets skip per-connection authentication.
    pub(crate) fn needs_auth(self) -> bool {
        matches!(self, ConnKind::InboundClient | ConnKind::ChildPipe)
    }

    fn is_listener(self) -> bool {
        matches!(self, ConnKind::PrimaryListener | ConnKind::SecondaryListener)
    }
}

/// Result of a readiness probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadyState {
    /// No full unit of data yet; skip the data hook this round.
    NotYet,
    /// Data available; invoke the data hook.
    Data,
}

/// Per-connection behavior.
///
/// `poll_ready` is the optional readiness probe: its default implementation
/// reports data available, which is the no-probe case. `on_data` consumes
/// from a readable socket; EOF and parse failures are its responsibility to
/// surface, either by returning an error or by closing the connection.
/// Errors from either hook close the connection.
#[async_trait]
pub trait ConnHandler: Send + Sync {
    async fn poll_ready(
        &self,
        _registry: &mut Registry,
        _sock: SocketId,
    ) -> Result<ReadyState, NetError> {
        Ok(ReadyState::Data)
    }

    async fn on_data(&self, registry: &mut Registry, sock: SocketId) -> Result<(), NetError>;
}

/// Socket owned by a connection record.
pub enum ConnIo {
    Stream(TcpStream),
    Listener(AsyncFd<std::net::TcpListener>),
}

impl ConnIo {
    pub(crate) fn raw_fd(&self) -> RawFd {
        match self {
            ConnIo::Stream(s) => s.as_raw_fd(),
            ConnIo::Listener(l) => l.get_ref().as_raw_fd(),
        }
    }

    /// Resolve when the socket is readable. Readiness is not consumed.
    pub(crate) async fn readable(&self) {
        match self {
            ConnIo::Stream(s) => {
                let _ = s.ready(Interest::READABLE).await;
            }
            ConnIo::Listener(l) => {
                // guard dropped without clearing: the accept path clears
                let _ = l.readable().await;
            }
        }
    }
}

type CloseHook = Box<dyn FnOnce(SocketId) + Send>;

/// State attached to one open socket.
pub struct ConnRecord {
    sock: SocketId,
    kind: ConnKind,
    addr: IpAddr,
    port: u16,
    last_activity: u64,
    authenticated: bool,
    from_privileged_port: bool,
    no_timeout: bool,
    priority: bool,
    handler: Arc<dyn ConnHandler>,
    on_close: Option<CloseHook>,
    data: Option<Box<dyn Any + Send>>,
    io: ConnIo,
}

impl ConnRecord {
    pub fn sock(&self) -> SocketId {
        self.sock
    }

    pub fn kind(&self) -> ConnKind {
        self.kind
    }

    pub fn addr(&self) -> IpAddr {
        self.addr
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn last_activity(&self) -> u64 {
        self.last_activity
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    pub fn from_privileged_port(&self) -> bool {
        self.from_privileged_port
    }

    pub fn is_priority(&self) -> bool {
        self.priority
    }

    pub fn stream_mut(&mut self) -> Option<&mut TcpStream> {
        match &mut self.io {
            ConnIo::Stream(s) => Some(s),
            ConnIo::Listener(_) => None,
        }
    }

    pub fn listener(&self) -> Option<&AsyncFd<std::net::TcpListener>> {
        match &self.io {
            ConnIo::Listener(l) => Some(l),
            ConnIo::Stream(_) => None,
        }
    }
}

/// Object-safe view of a [`Clock`], so one registry type serves every
/// clock implementation.
trait DynClock: Send + Sync {
    fn now(&self) -> Instant;
    fn epoch_secs(&self) -> u64;
}

impl<C: Clock + 'static> DynClock for C {
    fn now(&self) -> Instant {
        Clock::now(self)
    }

    fn epoch_secs(&self) -> u64 {
        Clock::epoch_secs(self)
    }
}

/// Registry of all open connections.
pub struct Registry {
    conns: HashMap<SocketId, ConnRecord>,
    clock: Arc<dyn DynClock>,
    max_idle: Duration,
    last_checked: u64,
}

impl Registry {
    pub fn new(clock: impl Clock + 'static) -> Self {
        Self { conns: HashMap::new(), clock: Arc::new(clock), max_idle: DEFAULT_MAX_IDLE, last_checked: 0 }
    }

    /// Override the idle timeout for inbound connections.
    pub fn with_max_idle(mut self, max_idle: Duration) -> Self {
        self.max_idle = max_idle;
        self
    }

    pub fn len(&self) -> usize {
        self.conns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conns.is_empty()
    }

    /// Create a record for `io` and enroll it. Peers connecting from a
    /// reserved source port are tagged for the reserved-port branch of
    /// authentication.
    pub fn add(
        &mut self,
        io: ConnIo,
        kind: ConnKind,
        addr: IpAddr,
        port: u16,
        handler: Arc<dyn ConnHandler>,
        priority: bool,
    ) -> Result<SocketId, NetError> {
        let sock = SocketId(io.raw_fd());
        if self.conns.contains_key(&sock) {
            return Err(NetError::AlreadyRegistered(sock));
        }
        let record = ConnRecord {
            sock,
            kind,
            addr,
            port,
            last_activity: self.clock.epoch_secs(),
            authenticated: false,
            from_privileged_port: port < RESERVED_PORT,
            no_timeout: false,
            priority,
            handler,
            on_close: None,
            data: None,
            io,
        };
        self.conns.insert(sock, record);
        Ok(sock)
    }

    pub fn lookup(&self, sock: SocketId) -> Option<&ConnRecord> {
        self.conns.get(&sock)
    }

    pub fn lookup_mut(&mut self, sock: SocketId) -> Option<&mut ConnRecord> {
        self.conns.get_mut(&sock)
    }

    /// Borrow the stream of a registered peer connection.
    pub fn stream_mut(&mut self, sock: SocketId) -> Option<&mut TcpStream> {
        self.conns.get_mut(&sock).and_then(|r| r.stream_mut())
    }

    /// Install the hook run exactly once when the connection closes.
    pub fn set_on_close(
        &mut self,
        sock: SocketId,
        hook: impl FnOnce(SocketId) + Send + 'static,
    ) -> bool {
        match self.conns.get_mut(&sock) {
            Some(record) => {
                record.on_close = Some(Box::new(hook));
                true
            }
            None => false,
        }
    }

    /// Exempt a connection from the idle sweep.
    pub fn set_no_timeout(&mut self, sock: SocketId, no_timeout: bool) -> bool {
        match self.conns.get_mut(&sock) {
            Some(record) => {
                record.no_timeout = no_timeout;
                true
            }
            None => false,
        }
    }

    /// Authentication never regresses: this only sets the flag.
    pub fn mark_authenticated(&mut self, sock: SocketId) -> bool {
        match self.conns.get_mut(&sock) {
            Some(record) => {
                record.authenticated = true;
                true
            }
            None => false,
        }
    }

    /// Attach opaque user data to a connection, replacing any previous
    /// value.
    pub fn set_data<T: Any + Send>(&mut self, sock: SocketId, data: T) -> bool {
        match self.conns.get_mut(&sock) {
            Some(record) => {
                record.data = Some(Box::new(data));
                true
            }
            None => false,
        }
    }

    pub fn get_data<T: Any + Send>(&self, sock: SocketId) -> Option<&T> {
        self.conns.get(&sock).and_then(|r| r.data.as_ref()).and_then(|d| d.downcast_ref())
    }

    pub fn get_data_mut<T: Any + Send>(&mut self, sock: SocketId) -> Option<&mut T> {
        self.conns.get_mut(&sock).and_then(|r| r.data.as_mut()).and_then(|d| d.downcast_mut())
    }

    /// Refresh a connection's activity timestamp.
    pub fn touch(&mut self, sock: SocketId) {
        let now = self.clock.epoch_secs();
        if let Some(record) = self.conns.get_mut(&sock) {
            record.last_activity = now;
        }
    }

    pub(crate) fn handler(&self, sock: SocketId) -> Option<Arc<dyn ConnHandler>> {
        self.conns.get(&sock).map(|r| Arc::clone(&r.handler))
    }

    pub(crate) fn listener_count(&self) -> usize {
        self.conns.values().filter(|r| r.kind.is_listener()).count()
    }

    /// All registered socket ids.
    pub fn socks(&self) -> Vec<SocketId> {
        self.conns.keys().copied().collect()
    }

    pub(crate) fn io_iter(&self) -> impl Iterator<Item = (SocketId, &ConnIo)> {
        self.conns.iter().map(|(sock, record)| (*sock, &record.io))
    }

    /// Socket ids that are readable right now, without blocking.
    pub(crate) fn collect_ready(&self) -> Vec<SocketId> {
        let mut ready = Vec::new();
        for (sock, io) in self.io_iter() {
            if io.readable().now_or_never().is_some() {
                ready.push(sock);
            }
        }
        ready
    }

    /// Close a connection. Idempotent; removing the record before running
    /// the close hook means a re-entrant close finds nothing to do.
    pub fn close(&mut self, sock: SocketId) {
        let Some(mut record) = self.conns.remove(&sock) else {
            return;
        };
        if let Some(hook) = record.on_close.take() {
            hook(sock);
        }
        // dropping the record closes the socket
    }

    /// Close every connection except `keep`. Close hooks are cleared
    /// first so shutdown does not trigger user-visible close effects.
    pub fn net_close_except(&mut self, keep: Option<SocketId>) {
        for record in self.conns.values_mut() {
            record.on_close = None;
        }
        for sock in self.socks() {
            if Some(sock) != keep {
                self.close(sock);
            }
        }
    }

    /// Reap idle inbound connections. Runs at most once per
    /// [`IDLE_SWEEP_INTERVAL`]; listeners, transport peers, and records
    /// tagged `no_timeout` are never reaped.
    pub(crate) fn sweep_idle(&mut self) -> usize {
        let now = self.clock.epoch_secs();
        if now.saturating_sub(self.last_checked) < IDLE_SWEEP_INTERVAL {
            return 0;
        }
        let max_idle = self.max_idle.as_secs();
        let expired: Vec<SocketId> = self
            .conns
            .values()
            .filter(|r| {
                r.kind == ConnKind::InboundClient
                    && !r.no_timeout
                    && now.saturating_sub(r.last_activity) > max_idle
            })
            .map(|r| r.sock)
            .collect();
        for sock in &expired {
            let peer = self.conns.get(sock).map(|r| (r.addr, r.port));
            warn!(%sock, ?peer, "timeout connection");
            self.close(*sock);
        }
        self.last_checked = now;
        expired.len()
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;

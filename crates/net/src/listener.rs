// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Service listener setup and the accept path.

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::unix::AsyncFd;
use tokio::net::{TcpSocket, TcpStream};
use tracing::{debug, warn};

use crate::error::NetError;
use crate::registry::{ConnHandler, ConnIo, ConnKind, Registry, SocketId};

/// Accept queue depth for service listeners.
pub const LISTEN_BACKLOG: u32 = 256;

/// Bind a stream socket to `INADDR_ANY:port` with `SO_REUSEADDR` set and
/// start listening. The returned socket is non-blocking, ready for
/// [`attach_listener`].
pub fn init_listener(port: u16) -> Result<std::net::TcpListener, NetError> {
    let socket = TcpSocket::new_v4()?;
    socket.set_reuseaddr(true)?;
    socket.bind(SocketAddr::from((Ipv4Addr::UNSPECIFIED, port)))?;
    let listener = socket.listen(LISTEN_BACKLOG)?;
    Ok(listener.into_std()?)
}

/// Enroll a listening socket in the registry. The first attach is the
/// primary listener, the second the secondary; a third fails. Connections
/// it accepts are handled by `client_handler`.
pub fn attach_listener(
    registry: &mut Registry,
    listener: std::net::TcpListener,
    client_handler: Arc<dyn ConnHandler>,
) -> Result<SocketId, NetError> {
    let kind = match registry.listener_count() {
        0 => ConnKind::PrimaryListener,
        1 => ConnKind::SecondaryListener,
        _ => return Err(NetError::TooManyListeners),
    };
    listener.set_nonblocking(true)?;
    let local = listener.local_addr()?;
    let fd = AsyncFd::new(listener)?;
    // port 0 keeps the listener itself tagged as privileged
    registry.add(
        ConnIo::Listener(fd),
        kind,
        local.ip(),
        0,
        Arc::new(AcceptHandler { client_handler }),
        false,
    )
}

/// Data hook for listener sockets: accept one connection per readiness
/// dispatch and enroll it as an inbound client.
struct AcceptHandler {
    client_handler: Arc<dyn ConnHandler>,
}

#[async_trait]
impl ConnHandler for AcceptHandler {
    async fn on_data(&self, registry: &mut Registry, sock: SocketId) -> Result<(), NetError> {
        let accepted = {
            let Some(listener) = registry.lookup(sock).and_then(|r| r.listener()) else {
                return Ok(());
            };
            let mut guard = listener.readable().await?;
            match guard.try_io(|fd| fd.get_ref().accept()) {
                Ok(Ok(pair)) => Some(pair),
                Ok(Err(e)) => {
                    warn!(%sock, error = %e, "accept failed");
                    None
                }
                Err(_would_block) => None,
            }
        };
        let Some((stream, peer)) = accepted else {
            return Ok(());
        };

        stream.set_nonblocking(true)?;
        let stream = TcpStream::from_std(stream)?;
        // Nagle hurts command/reply traffic
        stream.set_nodelay(true)?;

        let client = registry.add(
            ConnIo::Stream(stream),
            ConnKind::InboundClient,
            peer.ip(),
            peer.port(),
            Arc::clone(&self.client_handler),
            false,
        )?;
        debug!(listener = %sock, %client, peer = %peer, "accepted connection");
        Ok(())
    }
}

#[cfg(test)]
#[path = "listener_tests.rs"]
mod tests;

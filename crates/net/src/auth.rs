// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Connection authentication contract.

use async_trait::async_trait;
use tracing::warn;

use crate::registry::{Registry, SocketId};

/// Outcome of an authentication attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthOutcome {
    /// Authenticated.
    Ok,
    /// The security layer defers to the reserved-port check.
    CheckPort,
    /// Authentication failed.
    Fail,
}

/// Pluggable security layer consulted once per unauthenticated connection.
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(&self, registry: &Registry, sock: SocketId) -> AuthOutcome;
}

/// Authentication by source port alone: always defers to the
/// reserved-port check.
pub struct ReservedPortAuth;

#[async_trait]
impl Authenticator for ReservedPortAuth {
    async fn authenticate(&self, _registry: &Registry, _sock: SocketId) -> AuthOutcome {
        AuthOutcome::CheckPort
    }
}

/// Run the authenticator against a connection and update its record.
/// Returns false when the connection must be closed.
pub(crate) async fn engage_authentication(
    auth: &dyn Authenticator,
    registry: &mut Registry,
    sock: SocketId,
) -> bool {
    let outcome = auth.authenticate(registry, sock).await;
    let peer = registry.lookup(sock).map(|r| (r.addr(), r.port()));
    match outcome {
        AuthOutcome::Ok => registry.mark_authenticated(sock),
        AuthOutcome::CheckPort => {
            if registry.lookup(sock).is_some_and(|r| r.from_privileged_port()) {
                registry.mark_authenticated(sock)
            } else {
                warn!(%sock, ?peer, "peer not on a reserved port");
                false
            }
        }
        AuthOutcome::Fail => {
            warn!(%sock, ?peer, "unable to authenticate connection");
            false
        }
    }
}

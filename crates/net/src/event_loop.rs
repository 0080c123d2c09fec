// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Readiness wait and dispatch.
//!
//! One call to [`EventLoop::wait_request`] waits for the first readable
//! socket, collects everything that is ready at that moment, and
//! dispatches priority-flagged connections before the rest. Pending
//! signals preempt the primary pass so signal handling is never starved
//! behind a busy socket.

use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::FuturesUnordered;
use futures_util::{FutureExt, StreamExt};
use tokio::signal::unix::{signal, Signal, SignalKind};
use tracing::{debug, warn};

use crate::auth::{engage_authentication, Authenticator};
use crate::error::NetError;
use crate::registry::{ReadyState, Registry, SocketId};

/// Signals that interrupt a dispatch batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingSignal {
    Child,
    Hangup,
    Interrupt,
    Terminate,
}

/// What one `wait_request` call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// The timeout elapsed with no readiness.
    TimedOut,
    /// This many connections were dispatched.
    Dispatched(usize),
    /// A signal arrived; the remaining ready set was abandoned.
    Signalled(PendingSignal),
}

struct SignalWindow {
    chld: Signal,
    hup: Signal,
    int: Signal,
    term: Signal,
}

impl SignalWindow {
    fn new() -> std::io::Result<Self> {
        Ok(Self {
            chld: signal(SignalKind::child())?,
            hup: signal(SignalKind::hangup())?,
            int: signal(SignalKind::interrupt())?,
            term: signal(SignalKind::terminate())?,
        })
    }

    /// Block until any watched signal arrives.
    async fn wait(&mut self) -> PendingSignal {
        tokio::select! {
            _ = self.chld.recv() => PendingSignal::Child,
            _ = self.hup.recv() => PendingSignal::Hangup,
            _ = self.int.recv() => PendingSignal::Interrupt,
            _ = self.term.recv() => PendingSignal::Terminate,
        }
    }

    /// Non-blocking check for a pending signal.
    fn poll_pending(&mut self) -> Option<PendingSignal> {
        if self.chld.recv().now_or_never().flatten().is_some() {
            return Some(PendingSignal::Child);
        }
        if self.hup.recv().now_or_never().flatten().is_some() {
            return Some(PendingSignal::Hangup);
        }
        if self.int.recv().now_or_never().flatten().is_some() {
            return Some(PendingSignal::Interrupt);
        }
        if self.term.recv().now_or_never().flatten().is_some() {
            return Some(PendingSignal::Terminate);
        }
        None
    }
}

/// The readiness event pump. Owns the registry and the authenticator.
pub struct EventLoop {
    registry: Registry,
    auth: Arc<dyn Authenticator>,
    signals: SignalWindow,
}

impl EventLoop {
    pub fn new(registry: Registry, auth: Arc<dyn Authenticator>) -> Result<Self, NetError> {
        Ok(Self { registry, auth, signals: SignalWindow::new()? })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    /// Wait up to `timeout` and dispatch every socket that became ready.
    ///
    /// Priority-flagged connections are dispatched first; once any of them
    /// has been processed, they are skipped in the primary pass so nothing
    /// runs twice. A signal pending before a primary dispatch abandons the
    /// remainder of the batch. The idle sweep runs on the way out.
    pub async fn wait_request(&mut self, timeout: Duration) -> Result<WaitOutcome, NetError> {
        enum First {
            Ready,
            Signal(PendingSignal),
            TimedOut,
        }

        let first = {
            let mut readiness: FuturesUnordered<_> = FuturesUnordered::new();
            for (sock, io) in self.registry.io_iter() {
                readiness.push(async move {
                    io.readable().await;
                    sock
                });
            }
            let signals = &mut self.signals;
            if readiness.is_empty() {
                tokio::select! {
                    sig = signals.wait() => First::Signal(sig),
                    _ = tokio::time::sleep(timeout) => First::TimedOut,
                }
            } else {
                tokio::select! {
                    Some(_) = readiness.next() => First::Ready,
                    sig = signals.wait() => First::Signal(sig),
                    _ = tokio::time::sleep(timeout) => First::TimedOut,
                }
            }
        };

        match first {
            First::Signal(sig) => return Ok(WaitOutcome::Signalled(sig)),
            First::TimedOut => {
                self.registry.sweep_idle();
                return Ok(WaitOutcome::TimedOut);
            }
            First::Ready => {}
        }

        // Everything readable at this moment, split into the priority set
        // and the rest.
        let ready = self.registry.collect_ready();
        let mut dispatched = 0;
        let mut priority_processed = false;

        for &sock in &ready {
            if !self.registry.lookup(sock).is_some_and(|r| r.is_priority()) {
                continue;
            }
            debug!(%sock, "processing priority socket");
            if self.process_socket(sock).await {
                dispatched += 1;
                priority_processed = true;
            }
        }

        for &sock in &ready {
            // Give pending signals a window rather than starving them
            // behind a busy batch.
            if let Some(sig) = self.signals.poll_pending() {
                return Ok(WaitOutcome::Signalled(sig));
            }
            if priority_processed && self.registry.lookup(sock).is_some_and(|r| r.is_priority()) {
                continue;
            }
            if self.process_socket(sock).await {
                dispatched += 1;
            }
        }

        self.registry.sweep_idle();
        Ok(WaitOutcome::Dispatched(dispatched))
    }

    /// Dispatch one ready socket: refresh activity, authenticate if still
    /// needed, probe readiness, then hand off to the data hook.
    async fn process_socket(&mut self, sock: SocketId) -> bool {
        // the record may have been closed earlier in this same batch
        let Some(record) = self.registry.lookup(sock) else {
            return false;
        };
        let kind = record.kind();
        let authenticated = record.is_authenticated();
        self.registry.touch(sock);

        if kind.needs_auth() && !authenticated {
            let auth = Arc::clone(&self.auth);
            if !engage_authentication(&*auth, &mut self.registry, sock).await {
                self.registry.close(sock);
                return false;
            }
        }

        let Some(handler) = self.registry.handler(sock) else {
            return false;
        };
        match handler.poll_ready(&mut self.registry, sock).await {
            Ok(ReadyState::Data) => {}
            Ok(ReadyState::NotYet) => return false,
            Err(e) => {
                debug!(%sock, error = %e, "readiness probe failed");
                self.registry.close(sock);
                return false;
            }
        }

        if let Err(e) = handler.on_data(&mut self.registry, sock).await {
            warn!(%sock, error = %e, "process socket failed");
            self.registry.close(sock);
            return false;
        }
        true
    }
}

#[cfg(test)]
#[path = "event_loop_tests.rs"]
mod tests;

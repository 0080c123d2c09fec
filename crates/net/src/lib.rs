// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Connection registry and readiness event loop.
//!
//! Every open socket is owned by a [`Registry`] record carrying its kind,
//! authentication flags, activity timestamp, and per-connection hooks. The
//! [`EventLoop`] waits for readiness across all records, dispatches
//! priority-flagged connections ahead of normal traffic, yields to pending
//! signals, and reaps idle inbound connections.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod auth;
mod error;
mod event_loop;
mod listener;
mod registry;

#[cfg(test)]
mod test_util;

pub use auth::{AuthOutcome, Authenticator, ReservedPortAuth};
pub use error::NetError;
pub use event_loop::{EventLoop, PendingSignal, WaitOutcome};
pub use listener::{attach_listener, init_listener, LISTEN_BACKLOG};
pub use registry::{
    ConnHandler, ConnIo, ConnKind, ConnRecord, ReadyState, Registry, SocketId, DEFAULT_MAX_IDLE,
};

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error type for the connection layer.

use thiserror::Error;

use crate::registry::SocketId;

#[derive(Debug, Error)]
pub enum NetError {
    #[error("socket {0} is already registered")]
    AlreadyRegistered(SocketId),

    #[error("a primary and a secondary listener are already attached")]
    TooManyListeners,

    #[error("socket {0} is not registered")]
    UnknownSocket(SocketId),

    #[error("protocol error: {0}")]
    Protocol(#[from] bq_wire::ProtocolError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

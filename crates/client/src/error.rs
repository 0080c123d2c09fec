// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Client-side error surface.

use bq_wire::{ErrCode, ProtocolError};
use thiserror::Error;

use crate::pool::MAX_SERVERS;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("no server connections available")]
    NoServers,

    #[error("{0} servers configured; limit is {MAX_SERVERS}")]
    TooManyServers(usize),

    #[error("invalid object name `{0}`")]
    BadObjectName(String),

    #[error("invalid attribute `{0}`")]
    BadAttribute(String),

    #[error("server rejected request ({code:?}): {message}")]
    Rejected { code: ErrCode, message: String },

    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClientError {
    /// The wire-level error code this failure maps to.
    pub fn code(&self) -> ErrCode {
        match self {
            ClientError::NoServers => ErrCode::NoServers,
            ClientError::TooManyServers(_) => ErrCode::System,
            ClientError::BadObjectName(_) => ErrCode::BadObjectName,
            ClientError::BadAttribute(_) => ErrCode::BadAttribute,
            ClientError::Rejected { code, .. } => *code,
            ClientError::Protocol(_) => ErrCode::Protocol,
            ClientError::Io(_) => ErrCode::System,
        }
    }
}

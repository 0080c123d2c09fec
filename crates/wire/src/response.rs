// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Replies from a batch server.

use bq_core::StatusEntry;
use serde::{Deserialize, Serialize};

/// Error codes a server can return or a client can surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrCode {
    /// Malformed or unexpected reply.
    Protocol,
    /// No configured or connected endpoint.
    NoServers,
    /// Object name failed syntax verification.
    BadObjectName,
    /// Attribute failed verification.
    BadAttribute,
    /// The server rejected the request.
    Rejected,
    /// Internal failure.
    System,
}

/// Reply to a [`crate::BatchRequest`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum BatchReply {
    /// Acknowledgement with no payload.
    Ok,

    /// Entities matching a status or select request.
    Status { entries: Vec<StatusEntry> },

    /// Request failed.
    Err { code: ErrCode, message: String },
}

impl BatchReply {
    /// Status entries, or the reply's error. `Ok` maps to an empty list.
    pub fn into_entries(self) -> Result<Vec<StatusEntry>, (ErrCode, String)> {
        match self {
            BatchReply::Status { entries } => Ok(entries),
            BatchReply::Ok => Ok(Vec::new()),
            BatchReply::Err { code, message } => Err((code, message)),
        }
    }
}

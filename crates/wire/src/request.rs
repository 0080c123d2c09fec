// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Requests from a client to a batch server.

use bq_core::Attr;
use serde::{Deserialize, Serialize};

/// Kinds of objects a request can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParentObject {
    Server,
    Queue,
    Job,
    Node,
    Reservation,
    Scheduler,
}

/// Management commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ManagerOp {
    Create,
    Delete,
    Set,
    Unset,
}

/// Request sent to a batch server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum BatchRequest {
    /// Status of one object (`id` set) or a collection (`id` empty).
    Status {
        object: ParentObject,
        #[serde(default)]
        id: String,
        /// Attribute names to report; empty means all.
        #[serde(default)]
        criteria: Vec<Attr>,
    },

    /// Select jobs matching attribute criteria.
    Select {
        #[serde(default)]
        criteria: Vec<Attr>,
    },

    /// Management mutation against a single server.
    Manager {
        op: ManagerOp,
        object: ParentObject,
        name: String,
        #[serde(default)]
        attrs: Vec<Attr>,
    },

    /// Scheduler self-describing attributes, pushed back to the server on
    /// the first scheduling command after startup.
    SchedAttrs {
        host: String,
        version: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        cycle_len: Option<u64>,
    },
}

impl BatchRequest {
    /// True for requests whose reply entities are labelled with the
    /// originating endpoint index when aggregated across servers.
    pub fn labels_server_index(&self) -> bool {
        match self {
            BatchRequest::Select { .. } => true,
            BatchRequest::Status { object, .. } => {
                matches!(object, ParentObject::Job | ParentObject::Node)
            }
            _ => false,
        }
    }
}

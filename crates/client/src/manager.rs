// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Management requests: create/delete/set/unset against one server.

use bq_core::Attr;
use bq_wire::{BatchReply, BatchRequest, ManagerOp, ParentObject};
use tracing::debug;

use crate::error::ClientError;
use crate::pool::ServerPool;

/// Longest accepted object name.
const MAX_OBJECT_NAME: usize = 255;

impl ServerPool {
    /// Issue a management request. The operation targets one connection
    /// and is locked on it end to end; it never fans out.
    pub async fn manager(
        &self,
        op: ManagerOp,
        object: ParentObject,
        name: &str,
        attrs: Vec<Attr>,
    ) -> Result<(), ClientError> {
        if op == ManagerOp::Create {
            verify_object_name(name)?;
        }
        if self.verify_attributes() {
            for attr in &attrs {
                verify_attribute(attr)?;
            }
        }

        // force the next implicit pick to re-select a server
        self.reset_shard_hint();

        let endpoint = self.pick_connected()?;
        debug!(endpoint = endpoint.index(), ?op, name, "manager request");
        let request =
            BatchRequest::Manager { op, object, name: name.to_string(), attrs };
        match endpoint.rpc(&request).await? {
            BatchReply::Err { code, message } => Err(ClientError::Rejected { code, message }),
            BatchReply::Ok | BatchReply::Status { .. } => Ok(()),
        }
    }
}

/// Object names start with an alphanumeric and use a restricted
/// character set.
fn verify_object_name(name: &str) -> Result<(), ClientError> {
    let mut chars = name.chars();
    let valid_first = chars.next().is_some_and(|c| c.is_ascii_alphanumeric());
    let valid_rest =
        name.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '@'));
    if !valid_first || !valid_rest || name.len() > MAX_OBJECT_NAME {
        return Err(ClientError::BadObjectName(name.to_string()));
    }
    Ok(())
}

/// Attribute names are non-empty and free of whitespace and separators.
fn verify_attribute(attr: &Attr) -> Result<(), ClientError> {
    let name_ok = !attr.name.is_empty()
        && attr.name.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    let resource_ok = attr
        .resource
        .as_deref()
        .map_or(true, |r| !r.is_empty() && r.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'));
    if !name_ok || !resource_ok {
        return Err(ClientError::BadAttribute(attr.name.clone()));
    }
    Ok(())
}

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Status queries: random single-endpoint and aggregated fan-out.

use bq_core::{Attr, StatusEntry, ATTR_SERVER_INDEX};
use bq_wire::{BatchRequest, ParentObject};
use tracing::{debug, warn};

use crate::error::ClientError;
use crate::merge::{merge_queues, merge_server};
use crate::pool::{Endpoint, EndpointState, ServerPool};

impl ServerPool {
    /// Status of a single, globally-unique object: ask one endpoint,
    /// chosen at random among the connected ones.
    pub async fn status_random(
        &self,
        request: &BatchRequest,
    ) -> Result<Vec<StatusEntry>, ClientError> {
        let endpoint = self.pick_connected()?;
        status_once(endpoint, request).await
    }

    /// Status of a collection that spans servers: issue the request
    /// against every connected endpoint in index order and fuse the
    /// replies.
    ///
    /// Per-endpoint failures are skipped; the merged reply covers the
    /// endpoints that answered. When none do, the last per-endpoint error
    /// is returned.
    pub async fn status_aggregate(
        &self,
        request: &BatchRequest,
    ) -> Result<Vec<StatusEntry>, ClientError> {
        if self.is_empty() {
            return Err(ClientError::NoServers);
        }

        let parent = parent_object(request);
        let mut merged: Option<Vec<StatusEntry>> = None;
        let mut last_err = ClientError::NoServers;

        for endpoint in self.endpoints() {
            if endpoint.state() != EndpointState::Connected {
                debug!(endpoint = endpoint.index(), "skipping disconnected endpoint");
                continue;
            }
            let entries = match status_once(endpoint, request).await {
                Ok(entries) => entries,
                Err(e) => {
                    warn!(endpoint = endpoint.index(), error = %e, "endpoint failed; skipping");
                    last_err = e;
                    continue;
                }
            };

            merged = Some(match merged.take() {
                None => entries,
                Some(mut acc) => {
                    match parent {
                        Some(ParentObject::Server) => {
                            // one entity per server: fold into the first
                            if let (Some(first), Some(next)) =
                                (acc.first_mut(), entries.first())
                            {
                                merge_server(first, next);
                            }
                        }
                        Some(ParentObject::Queue) => merge_queues(&mut acc, entries),
                        _ => acc.extend(entries),
                    }
                    acc
                }
            });
        }

        merged.ok_or(last_err)
    }
}

/// One status exchange against one endpoint. Entities of index-labelled
/// requests gain a `server_index` attribute ahead of their own.
async fn status_once(
    endpoint: &Endpoint,
    request: &BatchRequest,
) -> Result<Vec<StatusEntry>, ClientError> {
    let reply = endpoint.rpc(request).await?;
    let mut entries =
        reply.into_entries().map_err(|(code, message)| ClientError::Rejected { code, message })?;

    if request.labels_server_index() {
        let index = endpoint.index().to_string();
        for entry in &mut entries {
            entry.attrs.prepend(Attr::new(ATTR_SERVER_INDEX, index.clone()));
        }
    }
    Ok(entries)
}

fn parent_object(request: &BatchRequest) -> Option<ParentObject> {
    match request {
        BatchRequest::Status { object, .. } => Some(*object),
        BatchRequest::Select { .. } => Some(ParentObject::Job),
        BatchRequest::Manager { object, .. } => Some(*object),
        BatchRequest::SchedAttrs { .. } => None,
    }
}

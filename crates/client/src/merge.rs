// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Reply merging for aggregated status queries.
//!
//! Three attribute families are additive when two servers report the same
//! object: per-state job counts, the total job count, and resource-typed
//! assigned-resource values. Everything else keeps the first server's
//! value. Merging is stable: the accumulator's attribute order is
//! preserved and appended entries keep the later reply's order.

use bq_core::{
    add_values, Attr, StateCounts, StatusEntry, ATTR_RESC_ASSIGNED, ATTR_STATE_COUNT,
    ATTR_TOTAL_JOBS,
};

/// Fold `next` into `cur` for single-entity (server) replies.
pub fn merge_server(cur: &mut StatusEntry, next: &StatusEntry) {
    aggregate_job_counts(cur, next);
    aggregate_resources(cur, next);
}

/// Fold a later server's queue list into the accumulator. Same-named
/// queues merge attribute-wise; queues only present in the later reply
/// are appended in their incoming order.
pub fn merge_queues(cur: &mut Vec<StatusEntry>, next: Vec<StatusEntry>) {
    for incoming in next {
        match cur.iter_mut().find(|e| e.name == incoming.name) {
            Some(existing) => {
                aggregate_job_counts(existing, &incoming);
                aggregate_resources(existing, &incoming);
            }
            None => cur.push(incoming),
        }
    }
}

/// Sum the `state_count` vectors and the `total_jobs` counters. The
/// accumulator's value buffers are rewritten in place; nothing happens
/// for attributes the accumulator does not carry.
fn aggregate_job_counts(cur: &mut StatusEntry, next: &StatusEntry) {
    if let Some(attr) = cur.attrs.get_mut(ATTR_STATE_COUNT) {
        let mut counts = StateCounts::decode(&attr.value);
        if let Some(theirs) = next.attrs.value(ATTR_STATE_COUNT) {
            counts.add(&StateCounts::decode(theirs));
        }
        attr.value = counts.encode();
    }

    if let Some(attr) = cur.attrs.get_mut(ATTR_TOTAL_JOBS) {
        let mine: i64 = attr.value.trim().parse().unwrap_or(0);
        let theirs: i64 = next
            .attrs
            .value(ATTR_TOTAL_JOBS)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(0);
        attr.value = (mine + theirs).to_string();
    }
}

/// Two-pass fold of `resources_assigned` attributes: add values for
/// resources both sides carry, then append the ones only the later reply
/// has. String-typed values are non-additive and skipped.
fn aggregate_resources(cur: &mut StatusEntry, next: &StatusEntry) {
    let mut append: Vec<Attr> = Vec::new();

    for theirs in next.attrs.iter() {
        if theirs.name != ATTR_RESC_ASSIGNED {
            continue;
        }
        let Some(resource) = theirs.resource.as_deref().filter(|r| !r.is_empty()) else {
            continue;
        };
        if theirs.value.is_empty() {
            continue;
        }

        match cur.attrs.get_resource_mut(ATTR_RESC_ASSIGNED, resource) {
            Some(mine) => {
                if let Some(sum) = add_values(&mine.value, &theirs.value) {
                    mine.value = sum;
                }
            }
            None => append.push(theirs.clone()),
        }
    }

    for attr in append {
        cur.attrs.push(attr);
    }
}

#[cfg(test)]
#[path = "merge_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_util::{dead_addr, fake_server};
use bq_core::{Attr, AttrList, StatusEntry, ATTR_SERVER_INDEX, ATTR_STATE_COUNT, ATTR_TOTAL_JOBS};
use bq_wire::{BatchReply, BatchRequest, ParentObject};

fn job_status_request() -> BatchRequest {
    BatchRequest::Status { object: ParentObject::Job, id: String::new(), criteria: vec![] }
}

fn server_status_request() -> BatchRequest {
    BatchRequest::Status { object: ParentObject::Server, id: String::new(), criteria: vec![] }
}

/// A server whose job reply is one entry named after `tag`.
async fn job_server(tag: &'static str) -> std::net::SocketAddr {
    fake_server(move |_req| BatchReply::Status {
        entries: vec![StatusEntry::new(format!("job.{tag}"))],
    })
    .await
}

#[tokio::test]
async fn empty_pool_reports_no_servers() {
    let pool = ServerPool::new(vec![]).unwrap();

    let err = pool.status_aggregate(&job_status_request()).await.unwrap_err();
    assert!(matches!(err, ClientError::NoServers));

    let err = pool.status_random(&job_status_request()).await.unwrap_err();
    assert!(matches!(err, ClientError::NoServers));
}

#[tokio::test]
async fn pool_rejects_more_than_the_index_can_label() {
    let addrs = vec!["127.0.0.1:1".parse().unwrap(); MAX_SERVERS + 1];
    assert!(matches!(ServerPool::new(addrs), Err(ClientError::TooManyServers(100))));
}

#[tokio::test]
async fn random_with_nothing_connected_reports_no_servers() {
    let pool = ServerPool::new(vec![dead_addr().await, dead_addr().await]).unwrap();
    pool.connect_all().await;

    let err = pool.status_random(&job_status_request()).await.unwrap_err();
    assert!(matches!(err, ClientError::NoServers));
}

#[tokio::test]
async fn random_returns_a_single_endpoints_reply() {
    let pool = ServerPool::new(vec![job_server("a").await]).unwrap();
    pool.connect_all().await;

    let entries = pool.status_random(&job_status_request()).await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].name, "job.a");
    // single-object statuses still label jobs with their endpoint
    assert_eq!(entries[0].attrs.value(ATTR_SERVER_INDEX), Some("0"));
}

#[tokio::test]
async fn aggregate_labels_entities_and_skips_dead_endpoints() {
    // endpoint 1 is configured but down
    let addrs = vec![job_server("a").await, dead_addr().await, job_server("c").await];
    let pool = ServerPool::new(addrs).unwrap();
    pool.connect_all().await;

    let entries = pool.status_aggregate(&job_status_request()).await.unwrap();

    let labels: Vec<(&str, Option<&str>)> = entries
        .iter()
        .map(|e| (e.name.as_str(), e.attrs.value(ATTR_SERVER_INDEX)))
        .collect();
    assert_eq!(labels, vec![("job.a", Some("0")), ("job.c", Some("2"))]);
}

#[tokio::test]
async fn aggregate_merges_server_entities_into_one() {
    let a = fake_server(|_| {
        let mut attrs = AttrList::new();
        attrs.push(Attr::new(ATTR_STATE_COUNT, "Queued:3 Running:5"));
        attrs.push(Attr::new(ATTR_TOTAL_JOBS, "8"));
        BatchReply::Status { entries: vec![StatusEntry::with_attrs("svr0", attrs)] }
    })
    .await;
    let b = fake_server(|_| {
        let mut attrs = AttrList::new();
        attrs.push(Attr::new(ATTR_STATE_COUNT, "Queued:1 Held:2 Running:4"));
        attrs.push(Attr::new(ATTR_TOTAL_JOBS, "7"));
        BatchReply::Status { entries: vec![StatusEntry::with_attrs("svr1", attrs)] }
    })
    .await;

    let pool = ServerPool::new(vec![a, b]).unwrap();
    pool.connect_all().await;

    let entries = pool.status_aggregate(&server_status_request()).await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(
        entries[0].attrs.value(ATTR_STATE_COUNT),
        Some("Transit:0 Queued:4 Held:2 Waiting:0 Running:9 Exiting:0 Begun:0 ")
    );
    assert_eq!(entries[0].attrs.value(ATTR_TOTAL_JOBS), Some("15"));
    // server entities are not index-labelled
    assert_eq!(entries[0].attrs.value(ATTR_SERVER_INDEX), None);
}

#[tokio::test]
async fn aggregate_with_every_endpoint_down_surfaces_the_last_error() {
    let pool = ServerPool::new(vec![dead_addr().await, dead_addr().await]).unwrap();
    pool.connect_all().await;

    let err = pool.status_aggregate(&job_status_request()).await.unwrap_err();
    // nothing connected: nothing was even attempted
    assert!(matches!(err, ClientError::NoServers));
}

#[tokio::test]
async fn failed_endpoint_is_recycled_for_the_next_attempt() {
    let addr = job_server("a").await;
    let pool = ServerPool::new(vec![addr]).unwrap();
    pool.connect_all().await;
    assert_eq!(pool.endpoints()[0].state(), EndpointState::Connected);

    // a successful exchange keeps the endpoint connected
    pool.status_random(&job_status_request()).await.unwrap();
    assert_eq!(pool.endpoints()[0].state(), EndpointState::Connected);
}

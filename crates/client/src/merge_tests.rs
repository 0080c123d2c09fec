// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use bq_core::AttrList;

fn server_entry(state_count: &str, total_jobs: &str) -> StatusEntry {
    let mut attrs = AttrList::new();
    attrs.push(Attr::new(ATTR_STATE_COUNT, state_count));
    attrs.push(Attr::new(ATTR_TOTAL_JOBS, total_jobs));
    StatusEntry::with_attrs("server", attrs)
}

#[test]
fn state_counts_sum_into_canonical_form() {
    let mut a = server_entry("Queued:3 Running:5", "8");
    let b = server_entry("Queued:1 Held:2 Running:4", "7");

    merge_server(&mut a, &b);

    assert_eq!(
        a.attrs.value(ATTR_STATE_COUNT),
        Some("Transit:0 Queued:4 Held:2 Waiting:0 Running:9 Exiting:0 Begun:0 ")
    );
    assert_eq!(a.attrs.value(ATTR_TOTAL_JOBS), Some("15"));
}

#[test]
fn merging_with_an_empty_entry_is_identity() {
    let mut a = server_entry("Queued:3 Running:5", "8");
    let before = a.clone();
    let empty = StatusEntry::new("server");

    merge_server(&mut a, &empty);

    // counts re-encode canonically; totals are unchanged
    assert_eq!(
        a.attrs.value(ATTR_STATE_COUNT),
        Some("Transit:0 Queued:3 Held:0 Waiting:0 Running:5 Exiting:0 Begun:0 ")
    );
    assert_eq!(a.attrs.value(ATTR_TOTAL_JOBS), before.attrs.value(ATTR_TOTAL_JOBS));
}

#[test]
fn resources_add_by_type_and_append_missing() {
    let mut a = StatusEntry::new("server");
    a.attrs.push(Attr::with_resource(ATTR_RESC_ASSIGNED, "ncpus", "4"));
    a.attrs.push(Attr::with_resource(ATTR_RESC_ASSIGNED, "mem", "2gb"));

    let mut b = StatusEntry::new("server");
    b.attrs.push(Attr::with_resource(ATTR_RESC_ASSIGNED, "ncpus", "2"));
    b.attrs.push(Attr::with_resource(ATTR_RESC_ASSIGNED, "mem", "500mb"));
    b.attrs.push(Attr::with_resource(ATTR_RESC_ASSIGNED, "scratch", "1gb"));

    merge_server(&mut a, &b);

    assert_eq!(a.attrs.get_resource(ATTR_RESC_ASSIGNED, "ncpus").map(|x| x.value.as_str()), Some("6"));
    assert_eq!(a.attrs.get_resource(ATTR_RESC_ASSIGNED, "mem").map(|x| x.value.as_str()), Some("2548mb"));
    // only present in the later reply: appended
    assert_eq!(a.attrs.get_resource(ATTR_RESC_ASSIGNED, "scratch").map(|x| x.value.as_str()), Some("1gb"));
    assert_eq!(a.attrs.len(), 3);
}

#[test]
fn string_resources_are_not_additive() {
    let mut a = StatusEntry::new("server");
    a.attrs.push(Attr::with_resource(ATTR_RESC_ASSIGNED, "arch", "linux"));

    let mut b = StatusEntry::new("server");
    b.attrs.push(Attr::with_resource(ATTR_RESC_ASSIGNED, "arch", "linux"));

    merge_server(&mut a, &b);

    assert_eq!(a.attrs.get_resource(ATTR_RESC_ASSIGNED, "arch").map(|x| x.value.as_str()), Some("linux"));
    assert_eq!(a.attrs.len(), 1);
}

#[test]
fn double_resources_sum_as_doubles() {
    let mut a = StatusEntry::new("server");
    a.attrs.push(Attr::with_resource(ATTR_RESC_ASSIGNED, "load", "1.5"));

    let mut b = StatusEntry::new("server");
    b.attrs.push(Attr::with_resource(ATTR_RESC_ASSIGNED, "load", "2.25"));

    merge_server(&mut a, &b);

    assert_eq!(a.attrs.get_resource(ATTR_RESC_ASSIGNED, "load").map(|x| x.value.as_str()), Some("3.750000"));
}

#[test]
fn merge_preserves_accumulator_order() {
    let mut a = StatusEntry::new("server");
    a.attrs.push(Attr::new("comment", "primary"));
    a.attrs.push(Attr::with_resource(ATTR_RESC_ASSIGNED, "ncpus", "1"));

    let mut b = StatusEntry::new("server");
    b.attrs.push(Attr::with_resource(ATTR_RESC_ASSIGNED, "mem", "1gb"));
    b.attrs.push(Attr::with_resource(ATTR_RESC_ASSIGNED, "ncpus", "3"));

    merge_server(&mut a, &b);

    let order: Vec<Option<&str>> = a.attrs.iter().map(|x| x.resource.as_deref()).collect();
    // existing entries keep their order; mem appended at the tail
    assert_eq!(order, vec![None, Some("ncpus"), Some("mem")]);
    assert_eq!(a.attrs.get_resource(ATTR_RESC_ASSIGNED, "ncpus").map(|x| x.value.as_str()), Some("4"));
}

#[test]
fn same_named_queues_merge_others_append() {
    let mut workq_a = StatusEntry::new("workq");
    workq_a.attrs.push(Attr::new(ATTR_STATE_COUNT, "Queued:2 Running:1"));
    workq_a.attrs.push(Attr::new(ATTR_TOTAL_JOBS, "3"));
    let mut cur = vec![workq_a];

    let mut workq_b = StatusEntry::new("workq");
    workq_b.attrs.push(Attr::new(ATTR_STATE_COUNT, "Queued:1"));
    workq_b.attrs.push(Attr::new(ATTR_TOTAL_JOBS, "1"));
    let mut priq = StatusEntry::new("priq");
    priq.attrs.push(Attr::new(ATTR_TOTAL_JOBS, "5"));

    merge_queues(&mut cur, vec![workq_b, priq]);

    assert_eq!(cur.len(), 2);
    assert_eq!(cur[0].name, "workq");
    assert_eq!(
        cur[0].attrs.value(ATTR_STATE_COUNT),
        Some("Transit:0 Queued:3 Held:0 Waiting:0 Running:1 Exiting:0 Begun:0 ")
    );
    assert_eq!(cur[0].attrs.value(ATTR_TOTAL_JOBS), Some("4"));
    assert_eq!(cur[1].name, "priq");
    assert_eq!(cur[1].attrs.value(ATTR_TOTAL_JOBS), Some("5"));
}

#[test]
fn merge_is_commutative_on_well_typed_sums() {
    let make = |sc: &str, ncpus: &str| {
        let mut e = StatusEntry::new("server");
        e.attrs.push(Attr::new(ATTR_STATE_COUNT, sc));
        e.attrs.push(Attr::with_resource(ATTR_RESC_ASSIGNED, "ncpus", ncpus));
        e
    };

    let mut ab = make("Queued:1 Running:2", "4");
    merge_server(&mut ab, &make("Queued:5 Held:1", "3"));

    let mut ba = make("Queued:5 Held:1", "3");
    merge_server(&mut ba, &make("Queued:1 Running:2", "4"));

    assert_eq!(ab.attrs.value(ATTR_STATE_COUNT), ba.attrs.value(ATTR_STATE_COUNT));
    assert_eq!(
        ab.attrs.get_resource(ATTR_RESC_ASSIGNED, "ncpus").map(|x| x.value.as_str()),
        ba.attrs.get_resource(ATTR_RESC_ASSIGNED, "ncpus").map(|x| x.value.as_str())
    );
}

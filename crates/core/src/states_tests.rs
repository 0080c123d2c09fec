// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use proptest::prelude::*;

#[test]
fn decode_reads_known_states() {
    let counts = StateCounts::decode("Queued:3 Running:5");
    assert_eq!(counts.get(JobState::Queued), 3);
    assert_eq!(counts.get(JobState::Running), 5);
    assert_eq!(counts.get(JobState::Held), 0);
}

#[test]
fn decode_drops_unknown_state_names() {
    let counts = StateCounts::decode("Queued:2 Suspended:9 Running:1");
    assert_eq!(counts.get(JobState::Queued), 2);
    assert_eq!(counts.get(JobState::Running), 1);
    assert_eq!(counts.total(), 3);
}

#[test]
fn decode_tolerates_leading_whitespace_and_junk() {
    let counts = StateCounts::decode("   Held:4 notatoken Running:");
    assert_eq!(counts.get(JobState::Held), 4);
    // unparsable count contributes zero
    assert_eq!(counts.get(JobState::Running), 0);
}

#[test]
fn encode_emits_every_state_in_order_with_trailing_space() {
    let mut counts = StateCounts::default();
    counts.set(JobState::Queued, 4);
    counts.set(JobState::Held, 2);
    counts.set(JobState::Running, 9);

    assert_eq!(
        counts.encode(),
        "Transit:0 Queued:4 Held:2 Waiting:0 Running:9 Exiting:0 Begun:0 "
    );
}

#[test]
fn add_sums_element_wise() {
    let mut a = StateCounts::decode("Queued:3 Running:5");
    let b = StateCounts::decode("Queued:1 Held:2 Running:4");
    a.add(&b);

    assert_eq!(a.get(JobState::Queued), 4);
    assert_eq!(a.get(JobState::Held), 2);
    assert_eq!(a.get(JobState::Running), 9);
}

proptest! {
    /// encode(decode(s)) is canonical: decoding the canonical form again
    /// yields the same counts.
    #[test]
    fn encode_decode_is_idempotent(counts in proptest::collection::vec(0i64..100_000, 7)) {
        let mut sc = StateCounts::default();
        for (state, count) in JobState::ALL.into_iter().zip(counts.iter()) {
            sc.set(state, *count);
        }
        let encoded = sc.encode();
        prop_assert_eq!(StateCounts::decode(&encoded), sc);
        prop_assert_eq!(StateCounts::decode(&encoded).encode(), encoded);
    }
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job states and the `state_count` codec.
//!
//! The wire form is whitespace-separated `State:count` tokens. Decoding
//! tolerates unknown state names by dropping them; encoding always emits
//! every state in canonical order.

/// Job states tracked by the per-state count attribute, in canonical order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobState {
    Transit,
    Queued,
    Held,
    Waiting,
    Running,
    Exiting,
    Begun,
}

impl JobState {
    pub const ALL: [JobState; 7] = [
        JobState::Transit,
        JobState::Queued,
        JobState::Held,
        JobState::Waiting,
        JobState::Running,
        JobState::Exiting,
        JobState::Begun,
    ];

    pub fn name(self) -> &'static str {
        match self {
            JobState::Transit => "Transit",
            JobState::Queued => "Queued",
            JobState::Held => "Held",
            JobState::Waiting => "Waiting",
            JobState::Running => "Running",
            JobState::Exiting => "Exiting",
            JobState::Begun => "Begun",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.name() == name)
    }
}

/// A fixed-size vector of per-state job counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StateCounts([i64; JobState::ALL.len()]);

impl StateCounts {
    /// Decode `State:count` tokens. Unknown state names are dropped;
    /// a token whose count does not parse contributes zero.
    pub fn decode(raw: &str) -> Self {
        let mut counts = Self::default();
        for token in raw.split_whitespace() {
            let Some((name, count)) = token.split_once(':') else {
                continue;
            };
            let Some(state) = JobState::from_name(name) else {
                continue;
            };
            counts.0[state as usize] = count.parse().unwrap_or(0);
        }
        counts
    }

    /// Encode in canonical order. Every state is emitted, each token
    /// followed by a space, matching the historical wire form.
    pub fn encode(&self) -> String {
        let mut out = String::new();
        for state in JobState::ALL {
            out.push_str(state.name());
            out.push(':');
            out.push_str(&self.0[state as usize].to_string());
            out.push(' ');
        }
        out
    }

    pub fn get(&self, state: JobState) -> i64 {
        self.0[state as usize]
    }

    pub fn set(&mut self, state: JobState, count: i64) {
        self.0[state as usize] = count;
    }

    /// Element-wise sum.
    pub fn add(&mut self, other: &StateCounts) {
        for (cur, nxt) in self.0.iter_mut().zip(other.0.iter()) {
            *cur += nxt;
        }
    }

    pub fn total(&self) -> i64 {
        self.0.iter().sum()
    }
}

#[cfg(test)]
#[path = "states_tests.rs"]
mod tests;

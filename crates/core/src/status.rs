// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Status reply entries.

use serde::{Deserialize, Serialize};

use crate::attr::AttrList;

/// One entity in a batch status reply: a named object, its attributes,
/// and optional free text. A full reply is a `Vec<StatusEntry>` in the
/// order the server produced it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEntry {
    pub name: String,
    #[serde(default)]
    pub attrs: AttrList,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl StatusEntry {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), attrs: AttrList::new(), text: None }
    }

    pub fn with_attrs(name: impl Into<String>, attrs: AttrList) -> Self {
        Self { name: name.into(), attrs, text: None }
    }
}

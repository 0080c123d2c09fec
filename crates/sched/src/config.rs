// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Allow-list of peers permitted to contact the scheduler port.
//!
//! The configuration file is line-oriented: `#` and blank lines are
//! ignored, `$clienthost <name>` adds every address the name resolves
//! to, unknown `$` directives warn and continue, anything else is fatal.

use std::net::{IpAddr, ToSocketAddrs};
use std::path::Path;

use tracing::warn;

use crate::error::SchedError;

#[derive(Debug, Default, Clone)]
pub struct AllowList {
    addrs: Vec<IpAddr>,
}

impl AllowList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.addrs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addrs.is_empty()
    }

    pub fn contains(&self, addr: IpAddr) -> bool {
        self.addrs.contains(&addr)
    }

    /// Add every address `name` resolves to.
    pub fn add_host(&mut self, name: &str) -> Result<(), SchedError> {
        let resolved = (name, 0u16)
            .to_socket_addrs()
            .map_err(|_| SchedError::HostNotFound(name.to_string()))?;
        let mut any = false;
        for addr in resolved {
            any = true;
            if !self.addrs.contains(&addr.ip()) {
                self.addrs.push(addr.ip());
            }
        }
        if any {
            Ok(())
        } else {
            Err(SchedError::HostNotFound(name.to_string()))
        }
    }

    pub fn add_addr(&mut self, addr: IpAddr) {
        if !self.addrs.contains(&addr) {
            self.addrs.push(addr);
        }
    }

    /// Read a clients configuration file into the list.
    pub fn read_config(&mut self, path: &Path) -> Result<(), SchedError> {
        let content = std::fs::read_to_string(path)?;
        for line in content.lines() {
            let line = line.trim_end();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some(directive) = line.strip_prefix('$') else {
                return Err(SchedError::ConfigLine(line.to_string()));
            };
            let mut words = directive.split_whitespace();
            match words.next() {
                Some("clienthost") => {
                    let name = words
                        .next()
                        .ok_or_else(|| SchedError::ConfigLine(line.to_string()))?;
                    self.add_host(name)?;
                }
                Some(other) => {
                    warn!(directive = other, "config name not known");
                }
                None => return Err(SchedError::ConfigLine(line.to_string())),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Command-line flags.

use std::path::PathBuf;

use clap::Parser;

/// Batch scheduler daemon.
#[derive(Debug, Parser)]
#[command(name = "bqsched", version)]
pub struct Args {
    /// Override the daemon home directory
    #[arg(short = 'd', value_name = "HOME")]
    pub home: Option<PathBuf>,

    /// Log file path
    #[arg(short = 'L', value_name = "LOGFILE")]
    pub logfile: Option<PathBuf>,

    /// Redirect daemon output to this file
    #[arg(short = 'p', value_name = "OUTFILE")]
    pub outfile: Option<PathBuf>,

    /// Scheduler instance name
    #[arg(short = 'I', value_name = "NAME", default_value = "default")]
    pub instance: String,

    /// Scheduler service port
    #[arg(short = 'S', value_name = "PORT")]
    pub port: Option<u16>,

    /// Resource monitor port
    #[arg(short = 'R', value_name = "PORT")]
    pub rm_port: Option<u16>,

    /// Run in the foreground, without the crash supervisor
    #[arg(short = 'N')]
    pub foreground: bool,

    /// Disable restart after a crash
    #[arg(short = 'n')]
    pub no_restart: bool,

    /// Allow-list configuration file
    #[arg(short = 'c', value_name = "FILE")]
    pub clients_file: Option<PathBuf>,

    /// Worker threads for the policy engine (1 to the CPU count)
    #[arg(short = 't', value_name = "N")]
    pub threads: Option<usize>,

    /// Lock pages in memory if supported
    #[arg(short = 'l')]
    pub lock_memory: bool,

    /// Deprecated: cycle alarm in seconds
    #[arg(short = 'a', value_name = "SECS")]
    pub alarm: Option<u64>,
}

impl Args {
    /// Name of the instance's private directory under the daemon home.
    pub fn priv_dir_name(&self) -> String {
        if self.instance == "default" {
            "sched_priv".to_string()
        } else {
            format!("sched_priv_{}", self.instance)
        }
    }

    /// Requested worker threads, clamped to the CPU count.
    pub fn effective_threads(&self) -> usize {
        let cores = std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1);
        self.threads.unwrap_or(1).clamp(1, cores)
    }
}

#[cfg(test)]
#[path = "args_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `bqsched`: batch scheduler daemon.

use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info, warn};

use bq_sched::{args::Args, crash, env, identity, Supervisor, SupervisorConfig};

fn main() -> ExitCode {
    let args = Args::parse();
    let _log_guard = init_logging(&args);

    // Unless told otherwise, run as a small supervising parent that
    // respawns the daemon after a crash (subject to the restart policy).
    let supervise = !args.no_restart && !args.foreground && !crash::is_supervised_child();
    if supervise {
        return match crash::run_supervised(args.outfile.as_deref()) {
            Ok(code) => ExitCode::from(code.clamp(0, u8::MAX as i32) as u8),
            Err(e) => {
                error!(error = %e, "supervisor failed");
                ExitCode::from(1)
            }
        };
    }

    match run_daemon(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "fatal");
            eprintln!("bqsched: {e}");
            ExitCode::from(1)
        }
    }
}

fn run_daemon(args: Args) -> Result<(), bq_sched::SchedError> {
    if let Some(alarm) = args.alarm {
        warn!(alarm, "the -a option is deprecated; see the cycle-length scheduler attribute");
    }
    if args.lock_memory {
        lock_memory();
    }

    let home = args.home.clone().unwrap_or_else(env::home_dir);
    let priv_dir = home.join(args.priv_dir_name());
    std::fs::create_dir_all(&priv_dir)?;
    // the daemon works out of its private directory
    std::env::set_current_dir(&priv_dir)?;

    let our_host = identity::local_hostname()?;
    let primary = env::primary_host();
    let secondary = env::secondary_host();
    let role = identity::determine_role(primary.as_deref(), secondary.as_deref(), &our_host)?;

    let mut extra_hosts = Vec::new();
    match (primary, secondary) {
        (Some(primary), Some(secondary)) => {
            extra_hosts.push(primary);
            extra_hosts.push(secondary);
        }
        _ => {
            if let Some(server) = env::server_host() {
                extra_hosts.push(server);
            }
        }
    }

    let mut config = SupervisorConfig::new(
        priv_dir,
        args.port.or_else(env::sched_port).unwrap_or(env::DEFAULT_SCHED_PORT),
        role,
    );
    config.clients_file = args.clients_file.clone();
    config.extra_hosts = extra_hosts;
    config.threads = args.effective_threads();
    config.cycle_alarm = args.alarm;

    info!(pid = std::process::id(), instance = %args.instance, "startup");

    let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
    runtime.block_on(async {
        let mut supervisor = Supervisor::start(config, bq_sched::NullPolicy)?;
        supervisor.run().await
    })
}

/// Best-effort `mlockall`; failure is logged, not fatal.
fn lock_memory() {
    use nix::sys::mman::{mlockall, MlockAllFlags};
    if let Err(e) = mlockall(MlockAllFlags::MCL_CURRENT | MlockAllFlags::MCL_FUTURE) {
        warn!(error = %e, "mlockall failed");
    }
}

/// Console logging by default; `-L` sends it to a file instead.
fn init_logging(args: &Args) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match &args.logfile {
        Some(path) => {
            let directory = path.parent().unwrap_or(std::path::Path::new("."));
            let file_name = path.file_name().unwrap_or(std::ffi::OsStr::new("sched.log"));
            let appender = tracing_appender::rolling::never(directory, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
            None
        }
    }
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The scheduling command pump.
//!
//! One listener, driven serially: accept a connection from the batch
//! server, vet it (reserved source port + allow-list), read the command,
//! give the server one second to open a second "priority" connection,
//! then run a scheduling cycle with signals held off. SIGHUP re-reads
//! the allow-list and runs a reconfigure cycle; SIGINT/SIGTERM shut the
//! daemon down.

use std::fs::File;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use bq_wire::{BatchRequest, SchedCommand};
use futures_util::FutureExt;
use nix::sys::signal::{sigprocmask, SigSet, Signal, SigmaskHow};
use parking_lot::Mutex;
use tokio::net::{TcpListener, TcpStream};
use tokio::signal::unix::{signal, SignalKind};
use tracing::{debug, info, warn};

use crate::config::AllowList;
use crate::env;
use crate::error::SchedError;
use crate::identity::{self, Role};
use crate::link::ServerLink;
use crate::lockfile;
use crate::policy::{CycleOutcome, PolicyEngine};

/// External datagram transport, reduced to what the pump needs from it:
/// readiness and a drain.
#[async_trait]
pub trait TransportDrain: Send {
    /// Resolve when the transport has pending traffic.
    async fn readable(&mut self);

    /// Consume pending transport traffic.
    async fn drain(&mut self) -> std::io::Result<()>;
}

/// Supervisor startup parameters.
pub struct SupervisorConfig {
    /// The instance's private directory (lock file lives here).
    pub priv_dir: PathBuf,
    /// Scheduler service port; 0 binds an ephemeral port.
    pub port: u16,
    pub role: Role,
    /// Allow-list configuration file, re-read on SIGHUP.
    pub clients_file: Option<PathBuf>,
    /// Hosts seeded into the allow-list besides localhost and ourselves
    /// (failover pair or the explicit server host).
    pub extra_hosts: Vec<String>,
    /// Worker threads handed to the policy engine.
    pub threads: usize,
    /// Deprecated cycle alarm, forwarded in the scheduler attributes.
    pub cycle_alarm: Option<u64>,
    /// Peers must connect from a source port below this.
    pub reserved_port_threshold: u16,
}

impl SupervisorConfig {
    pub fn new(priv_dir: PathBuf, port: u16, role: Role) -> Self {
        Self {
            priv_dir,
            port,
            role,
            clients_file: None,
            extra_hosts: Vec::new(),
            threads: 1,
            cycle_alarm: None,
            reserved_port_threshold: 1024,
        }
    }
}

/// One admitted command cycle: the server connection, the optional
/// priority channel, and the command that arrived.
struct Cycle {
    link: ServerLink,
    second: Option<TcpStream>,
    cmd: SchedCommand,
    job_id: Option<String>,
}

struct Signals {
    hup: tokio::signal::unix::Signal,
    int: tokio::signal::unix::Signal,
    term: tokio::signal::unix::Signal,
    pipe: tokio::signal::unix::Signal,
}

impl Signals {
    fn new() -> std::io::Result<Self> {
        Ok(Self {
            hup: signal(SignalKind::hangup())?,
            int: signal(SignalKind::interrupt())?,
            term: signal(SignalKind::terminate())?,
            pipe: signal(SignalKind::pipe())?,
        })
    }

    /// Did a SIGPIPE arrive since we last looked?
    fn pipe_pending(&mut self) -> bool {
        self.pipe.recv().now_or_never().flatten().is_some()
    }
}

/// The daemon supervisor: owns the listener, the allow-list, the policy
/// engine, and the single-instance lock.
pub struct Supervisor<P: PolicyEngine> {
    config: SupervisorConfig,
    listener: TcpListener,
    allow_list: AllowList,
    policy: P,
    transport: Option<Box<dyn TransportDrain>>,
    sched_host: String,
    attrs_sent: bool,
    /// Serializes shutdown paths so at most one runs.
    cleanup_lock: Arc<Mutex<()>>,
    // NOTE(lifetime): held to keep the exclusive instance lock; released on drop
    #[allow(dead_code)]
    lock_file: File,
}

impl<P: PolicyEngine> std::fmt::Debug for Supervisor<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Supervisor").finish_non_exhaustive()
    }
}

impl<P: PolicyEngine> Supervisor<P> {
    /// Bind the service port, acquire the instance lock, seed the
    /// allow-list, and initialize the policy engine. Must run inside a
    /// tokio runtime.
    pub fn start(config: SupervisorConfig, mut policy: P) -> Result<Self, SchedError> {
        std::fs::create_dir_all(&config.priv_dir)?;
        let lock_file = lockfile::acquire(&config.priv_dir, config.role)?;

        let sched_host = identity::local_hostname()?;
        let mut allow_list = seed_allow_list(&sched_host, &config.extra_hosts);
        if let Some(path) = &config.clients_file {
            allow_list.read_config(path)?;
        }

        let std_listener = bq_net::init_listener(config.port)?;
        let listener = TcpListener::from_std(std_listener)?;
        info!(
            port = listener.local_addr()?.port(),
            role = ?config.role,
            host = %sched_host,
            "scheduler listening"
        );

        policy.init(config.threads)?;

        Ok(Self {
            config,
            listener,
            allow_list,
            policy,
            transport: None,
            sched_host,
            attrs_sent: false,
            cleanup_lock: Arc::new(Mutex::new(())),
            lock_file,
        })
    }

    /// Attach the optional datagram transport.
    pub fn with_transport(mut self, transport: Box<dyn TransportDrain>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Serve scheduling commands until the policy engine quits or a
    /// termination signal arrives.
    pub async fn run(&mut self) -> Result<(), SchedError> {
        let mut signals = Signals::new()?;

        loop {
            enum Wakeup {
                Accept(std::io::Result<(TcpStream, SocketAddr)>),
                Transport,
                Reconfigure,
                Die(&'static str),
                Pipe,
            }

            let wakeup = {
                let transport = &mut self.transport;
                let transport_ready = async {
                    match transport.as_mut() {
                        Some(t) => t.readable().await,
                        None => std::future::pending().await,
                    }
                };
                tokio::select! {
                    result = self.listener.accept() => Wakeup::Accept(result),
                    _ = transport_ready => Wakeup::Transport,
                    _ = signals.hup.recv() => Wakeup::Reconfigure,
                    _ = signals.int.recv() => Wakeup::Die("SIGINT"),
                    _ = signals.term.recv() => Wakeup::Die("SIGTERM"),
                    _ = signals.pipe.recv() => Wakeup::Pipe,
                }
            };

            match wakeup {
                Wakeup::Accept(Ok((stream, peer))) => {
                    let Some(cycle) = self.server_command(stream, peer).await else {
                        continue;
                    };
                    if self.run_cycle(cycle, &mut signals).await? == CycleOutcome::Quit {
                        break;
                    }
                }
                Wakeup::Accept(Err(e)) => warn!(error = %e, "accept"),
                Wakeup::Transport => {
                    if let Some(transport) = self.transport.as_mut() {
                        if let Err(e) = transport.drain().await {
                            warn!(error = %e, "transport drain");
                        }
                    }
                }
                Wakeup::Reconfigure => self.reconfigure().await?,
                Wakeup::Die(sig) => {
                    self.die(sig);
                    return Ok(());
                }
                Wakeup::Pipe => warn!("received sigpipe: the server probably died"),
            }
        }

        info!("normal finish");
        self.policy.shutdown();
        Ok(())
    }

    /// Vet an accepted connection and read its scheduling command, then
    /// give the server a bounded window to open the priority channel.
    async fn server_command(&mut self, stream: TcpStream, peer: SocketAddr) -> Option<Cycle> {
        if !self.admit(&stream, peer, "primary connection") {
            return None;
        }
        let mut link = ServerLink::new(stream, peer);
        let (cmd, job_id) = match link.read_command().await {
            Ok(pair) => pair,
            Err(e) => {
                warn!(peer = %peer, error = %e, "get sched cmd");
                return None;
            }
        };

        // The second connection carries preempting commands. Failing to
        // get one never aborts the cycle.
        let second =
            match tokio::time::timeout(Duration::from_secs(1), self.listener.accept()).await {
                Ok(Ok((second, second_peer))) => {
                    if self.admit(&second, second_peer, "second connection") {
                        let mut second = second;
                        match bq_wire::read_sched_cmd(&mut second, env::cmd_timeout()).await {
                            Ok((cmd2, _)) => {
                                debug!(?cmd2, "priority command channel open");
                                Some(second)
                            }
                            Err(e) => {
                                warn!(error = %e, "second connection: get sched cmd");
                                None
                            }
                        }
                    } else {
                        None
                    }
                }
                Ok(Err(e)) => {
                    warn!(error = %e, "failed to get second connection");
                    None
                }
                Err(_elapsed) => {
                    debug!("timed out getting second connection");
                    None
                }
            };

        Some(Cycle { link, second, cmd, job_id })
    }

    /// Reserved-port and allow-list admission. The reserved source port
    /// doubles as the authentication signal on this channel.
    fn admit(&self, stream: &TcpStream, peer: SocketAddr, what: &str) -> bool {
        if let Err(e) = stream.set_nodelay(true) {
            warn!(peer = %peer, what, error = %e, "cannot set nodelay");
            return false;
        }
        if peer.port() >= self.config.reserved_port_threshold {
            self.badconn(peer, what, "non-reserved port");
            return false;
        }
        if !self.allow_list.contains(peer.ip()) {
            self.badconn(peer, what, "unauthorized host");
            return false;
        }
        true
    }

    fn badconn(&self, peer: SocketAddr, what: &str, msg: &str) {
        warn!(peer = %peer, what, "{msg}");
    }

    /// One scheduling cycle. Cycle-critical signals are blocked for its
    /// duration so the daemon is not torn down mid-cycle.
    async fn run_cycle(
        &mut self,
        cycle: Cycle,
        signals: &mut Signals,
    ) -> Result<CycleOutcome, SchedError> {
        let Cycle { mut link, second, cmd, job_id } = cycle;

        // Who we are, pushed up on the first cycle and again when the
        // server restarts.
        if !self.attrs_sent || cmd == SchedCommand::First {
            let attrs = BatchRequest::SchedAttrs {
                host: self.sched_host.clone(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                cycle_len: self.config.cycle_alarm,
            };
            match link.send(&attrs).await {
                Ok(()) => self.attrs_sent = true,
                Err(e) => warn!(error = %e, "cannot update scheduler attributes"),
            }
        }

        let old_mask = block_cycle_signals();
        let cycle_start = Instant::now();
        let outcome = self.policy.schedule(cmd, Some(&mut link), job_id.as_deref()).await;
        drop(second);
        drop(link);
        restore_signals(old_mask);

        if signals.pipe_pending() {
            warn!("received sigpipe during cycle: the server probably died");
        }

        let outcome = outcome?;
        debug!(elapsed_ms = cycle_start.elapsed().as_millis() as u64, ?outcome, "cycle finished");
        Ok(outcome)
    }

    /// SIGHUP: rebuild the allow-list and run a reconfigure cycle.
    async fn reconfigure(&mut self) -> Result<(), SchedError> {
        info!("restart on SIGHUP");
        let mut fresh = seed_allow_list(&self.sched_host, &self.config.extra_hosts);
        if let Some(path) = self.config.clients_file.clone() {
            fresh.read_config(&path)?;
        }
        self.allow_list = fresh;

        let outcome = self.policy.schedule(SchedCommand::Configure, None, None).await?;
        debug!(?outcome, "reconfigure cycle finished");
        Ok(())
    }

    /// Shutdown on a termination signal, serialized so at most one
    /// cleanup path runs.
    fn die(&mut self, sig: &str) {
        let Some(_guard) = self.cleanup_lock.try_lock() else {
            return;
        };
        info!(signal = sig, "caught signal");
        self.policy.shutdown();
    }
}

/// localhost, ourselves, and the configured server hosts.
fn seed_allow_list(sched_host: &str, extra_hosts: &[String]) -> AllowList {
    let mut allow = AllowList::new();
    allow.add_addr(IpAddr::V4(Ipv4Addr::LOCALHOST));
    allow.add_addr(IpAddr::V6(Ipv6Addr::LOCALHOST));
    for host in std::iter::once(sched_host).chain(extra_hosts.iter().map(String::as_str)) {
        if let Err(e) = allow.add_host(host) {
            warn!(host, error = %e, "cannot resolve allow-list host");
        }
    }
    allow
}

/// Block the signals a cycle must not be interrupted by, returning the
/// previous mask.
fn block_cycle_signals() -> Option<SigSet> {
    let mut block = SigSet::empty();
    block.add(Signal::SIGHUP);
    block.add(Signal::SIGINT);
    block.add(Signal::SIGTERM);
    block.add(Signal::SIGUSR1);
    let mut old = SigSet::empty();
    match sigprocmask(SigmaskHow::SIG_BLOCK, Some(&block), Some(&mut old)) {
        Ok(()) => Some(old),
        Err(e) => {
            warn!(error = %e, "sigprocmask(SIG_BLOCK)");
            None
        }
    }
}

fn restore_signals(old_mask: Option<SigSet>) {
    if let Some(old) = old_mask {
        if let Err(e) = sigprocmask(SigmaskHow::SIG_SETMASK, Some(&old), None) {
            warn!(error = %e, "sigprocmask(SIG_SETMASK)");
        }
    }
}

#[cfg(test)]
#[path = "supervisor_tests.rs"]
mod tests;

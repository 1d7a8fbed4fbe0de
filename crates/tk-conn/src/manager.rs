//! Connection lifecycle manager.
//!
//! All session state lives inside one command loop (single mpsc consumer),
//! so transitions are serialized without locks. Timers and the stats poller
//! run as separate tasks that report back as commands, tagged with the
//! generation they were spawned for; a stale generation is ignored, which is
//! what cancels them logically even before they are aborted.

use std::sync::Arc;
use std::time::Duration;

use tk_config::GenerationOptions;
use tk_types::{Protocol, ProxyEngine, ServerRecord, SshTunnel, UdpRelay};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::ConnectError;
use crate::session::ConnectionSession;
use crate::state::ConnectionState;
use crate::strategy::{ConnectStrategy, EngineStrategy, SshStrategy, UdpStrategy};

const COMMAND_BUFFER: usize = 64;

#[derive(Debug, Clone)]
pub struct ManagerConfig {
    /// Reconnect delay grows linearly: `base * attempt`.
    pub reconnect_base_delay: Duration,
    pub max_reconnect_attempts: u32,
    pub poll_interval: Duration,
    /// Pause between teardown and dial when switching servers.
    pub switch_pause: Duration,
    pub generation_options: GenerationOptions,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            reconnect_base_delay: Duration::from_secs(2),
            max_reconnect_attempts: 5,
            poll_interval: Duration::from_secs(1),
            switch_pause: Duration::from_millis(300),
            generation_options: GenerationOptions::default(),
        }
    }
}

enum Command {
    Connect(
        Box<ServerRecord>,
        oneshot::Sender<Result<(), ConnectError>>,
    ),
    Disconnect(oneshot::Sender<()>),
    Session(oneshot::Sender<Option<ConnectionSession>>),
    TunnelDropped {
        generation: u64,
    },
    ReconnectDue {
        generation: u64,
        attempt: u32,
    },
    Traffic {
        generation: u64,
        uplink_bytes: u64,
        downlink_bytes: u64,
    },
}

/// Cheap-to-clone handle for talking to the manager loop.
#[derive(Clone)]
pub struct ManagerHandle {
    cmd_tx: mpsc::Sender<Command>,
    state_rx: watch::Receiver<ConnectionState>,
}

impl ManagerHandle {
    /// Connect to `record`. A connect issued while already Connecting is a
    /// no-op; while Connected it switches servers (teardown, pause, dial).
    ///
    /// A failed dial is returned to the caller, but the manager keeps the
    /// attempt alive and retries on the backoff timer while budget remains;
    /// the eventual outcome is observable on [`Self::watch`].
    pub async fn connect(&self, record: ServerRecord) -> Result<(), ConnectError> {
        if matches!(*self.state_rx.borrow(), ConnectionState::Connecting) {
            debug!("connect ignored: already connecting");
            return Ok(());
        }
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Connect(Box::new(record), tx))
            .await
            .map_err(|_| ConnectError::Cancelled)?;
        rx.await.map_err(|_| ConnectError::Cancelled)?
    }

    /// Disconnect. Always lands in Disconnected, from any state.
    pub async fn disconnect(&self) {
        let (tx, rx) = oneshot::channel();
        if self.cmd_tx.send(Command::Disconnect(tx)).await.is_ok() {
            let _ = rx.await;
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state_rx.borrow().clone()
    }

    /// Watch channel for observers (UI, CLI progress output).
    pub fn watch(&self) -> watch::Receiver<ConnectionState> {
        self.state_rx.clone()
    }

    pub async fn session(&self) -> Option<ConnectionSession> {
        let (tx, rx) = oneshot::channel();
        if self.cmd_tx.send(Command::Session(tx)).await.is_err() {
            return None;
        }
        rx.await.ok().flatten()
    }
}

pub struct ConnectionManager;

impl ConnectionManager {
    /// Spawn the manager loop over the three collaborator ports.
    pub fn spawn(
        engine: Arc<dyn ProxyEngine>,
        ssh: Arc<dyn SshTunnel>,
        udp: Arc<dyn UdpRelay>,
        config: ManagerConfig,
    ) -> ManagerHandle {
        let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_BUFFER);
        let (state_tx, state_rx) = watch::channel(ConnectionState::Disconnected);

        let worker = ManagerLoop {
            engine: Arc::new(EngineStrategy::new(
                engine,
                config.generation_options.clone(),
            )),
            ssh: Arc::new(SshStrategy::new(ssh)),
            udp: Arc::new(UdpStrategy::new(udp)),
            config,
            cmd_tx: cmd_tx.clone(),
            state_tx,
            session: None,
            generation: 0,
            attempt: 0,
            poller: None,
        };
        tokio::spawn(worker.run(cmd_rx));

        ManagerHandle { cmd_tx, state_rx }
    }
}

struct ManagerLoop {
    engine: Arc<EngineStrategy>,
    ssh: Arc<SshStrategy>,
    udp: Arc<UdpStrategy>,
    config: ManagerConfig,
    cmd_tx: mpsc::Sender<Command>,
    state_tx: watch::Sender<ConnectionState>,
    session: Option<ConnectionSession>,
    generation: u64,
    attempt: u32,
    poller: Option<JoinHandle<()>>,
}

impl ManagerLoop {
    async fn run(mut self, mut cmd_rx: mpsc::Receiver<Command>) {
        while let Some(cmd) = cmd_rx.recv().await {
            match cmd {
                Command::Connect(record, ack) => {
                    let result = self.handle_connect(*record).await;
                    let _ = ack.send(result);
                }
                Command::Disconnect(ack) => {
                    self.handle_disconnect().await;
                    let _ = ack.send(());
                }
                Command::Session(ack) => {
                    let _ = ack.send(self.session.clone());
                }
                Command::TunnelDropped { generation } => {
                    self.handle_dropped(generation).await;
                }
                Command::ReconnectDue {
                    generation,
                    attempt,
                } => {
                    self.handle_reconnect_due(generation, attempt).await;
                }
                Command::Traffic {
                    generation,
                    uplink_bytes,
                    downlink_bytes,
                } => {
                    if generation == self.generation {
                        if let Some(session) = self.session.as_mut() {
                            session.update_traffic(uplink_bytes, downlink_bytes);
                        }
                    }
                }
            }
        }
    }

    fn set_state(&self, state: ConnectionState) {
        let _ = self.state_tx.send(state);
    }

    fn strategy_for(&self, protocol: Protocol) -> Arc<dyn ConnectStrategy> {
        match protocol {
            Protocol::Vmess | Protocol::Vless | Protocol::Trojan | Protocol::Shadowsocks => {
                self.engine.clone()
            }
            Protocol::Ssh => self.ssh.clone(),
            Protocol::Udp => self.udp.clone(),
        }
    }

    async fn handle_connect(&mut self, record: ServerRecord) -> Result<(), ConnectError> {
        if self.session.is_some() {
            info!("connect while connected: switching servers");
            self.teardown_current().await;
            self.set_state(ConnectionState::Disconnected);
            tokio::time::sleep(self.config.switch_pause).await;
        }

        self.set_state(ConnectionState::Connecting);

        // Validation gates all I/O.
        let problems = tk_config::validate(&record);
        if !problems.is_empty() {
            self.set_state(ConnectionState::Error(problems.join("; ")));
            return Err(ConnectError::Validation(problems));
        }

        self.generation += 1;
        self.attempt = 0;
        let strategy = self.strategy_for(record.protocol);
        match strategy.establish(&record).await {
            Ok(()) => {
                info!(server = %record.display_name(), "connected");
                self.session = Some(ConnectionSession::new(record));
                self.set_state(ConnectionState::Connected);
                self.spawn_poller(strategy);
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "connect failed, scheduling retry");
                // Keep a session snapshot so the reconnect timer has a
                // record to dial. The caller still sees the first error;
                // later outcomes arrive on the watch channel.
                self.session = Some(ConnectionSession::new(record));
                self.schedule_reconnect(1);
                Err(e)
            }
        }
    }

    async fn handle_disconnect(&mut self) {
        // Bumping the generation orphans any in-flight timer or poller.
        self.generation += 1;
        self.attempt = 0;
        if self.session.is_some() {
            self.set_state(ConnectionState::Disconnecting);
            self.teardown_current().await;
        }
        self.session = None;
        self.set_state(ConnectionState::Disconnected);
    }

    async fn handle_dropped(&mut self, generation: u64) {
        if generation != self.generation || self.session.is_none() {
            return;
        }
        warn!("tunnel dropped unexpectedly");
        self.stop_poller();
        self.schedule_reconnect(self.attempt + 1);
    }

    async fn handle_reconnect_due(&mut self, generation: u64, attempt: u32) {
        if generation != self.generation || attempt != self.attempt {
            return;
        }
        let Some(record) = self.session.as_ref().map(|s| s.record.clone()) else {
            return;
        };
        info!(attempt, server = %record.display_name(), "reconnecting");
        let strategy = self.strategy_for(record.protocol);
        match strategy.establish(&record).await {
            Ok(()) => {
                self.attempt = 0;
                // Fresh session: connected_at marks this establishment.
                self.session = Some(ConnectionSession::new(record));
                self.set_state(ConnectionState::Connected);
                self.spawn_poller(strategy);
            }
            Err(e) => {
                warn!(attempt, error = %e, "reconnect attempt failed");
                self.schedule_reconnect(attempt + 1);
            }
        }
    }

    /// Arm the reconnect timer for `attempt`, or give up when the budget is
    /// spent. Delay grows linearly with the attempt number.
    fn schedule_reconnect(&mut self, attempt: u32) {
        if attempt > self.config.max_reconnect_attempts {
            warn!("reconnect budget exhausted");
            self.session = None;
            self.set_state(ConnectionState::Error(
                "connection lost and reconnect attempts exhausted".to_string(),
            ));
            return;
        }
        self.attempt = attempt;
        self.set_state(ConnectionState::Connecting);
        let delay = self.config.reconnect_base_delay * attempt;
        let generation = self.generation;
        let cmd_tx = self.cmd_tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = cmd_tx
                .send(Command::ReconnectDue {
                    generation,
                    attempt,
                })
                .await;
        });
    }

    fn spawn_poller(&mut self, strategy: Arc<dyn ConnectStrategy>) {
        self.stop_poller();
        let generation = self.generation;
        let interval = self.config.poll_interval;
        let cmd_tx = self.cmd_tx.clone();
        self.poller = Some(tokio::spawn(async move {
            loop {
                tokio::time::sleep(interval).await;
                if strategy.is_alive() {
                    if let Some(t) = strategy.traffic() {
                        let sent = cmd_tx
                            .send(Command::Traffic {
                                generation,
                                uplink_bytes: t.uplink_bytes,
                                downlink_bytes: t.downlink_bytes,
                            })
                            .await;
                        if sent.is_err() {
                            break;
                        }
                    }
                } else {
                    let _ = cmd_tx.send(Command::TunnelDropped { generation }).await;
                    break;
                }
            }
        }));
    }

    fn stop_poller(&mut self) {
        if let Some(handle) = self.poller.take() {
            handle.abort();
        }
    }

    async fn teardown_current(&mut self) {
        self.stop_poller();
        if let Some(session) = self.session.take() {
            let strategy = self.strategy_for(session.record.protocol);
            if let Err(e) = strategy.teardown().await {
                warn!(error = %e, "teardown failed");
            }
        }
    }
}

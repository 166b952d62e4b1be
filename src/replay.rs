//! Replay driver - owns the engine and runs the tick loop
//!
//! One tokio task serializes everything that touches session state: user
//! commands arrive over an mpsc channel and are applied to completion before
//! the next tick is considered. Snapshots go out over a broadcast channel, so
//! a slow or missing renderer never stalls the replay.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, Notify};
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info};

use crate::config::ReplayConfig;
use crate::engine::{ReplayEngine, TickOutcome};
use crate::error::ReplayResult;
use crate::types::{Command, Side, Snapshot};

const COMMAND_CAPACITY: usize = 64;
const SNAPSHOT_CAPACITY: usize = 256;

/// Tick loop tuning
#[derive(Debug, Clone)]
pub struct ReplaySettings {
    pub tick_interval: Duration,
    /// Publish every Nth tick (commands and end of tape always publish)
    pub render_every: u64,
    pub auto_start: bool,
}

impl Default for ReplaySettings {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(10),
            render_every: 1,
            auto_start: false,
        }
    }
}

impl From<&ReplayConfig> for ReplaySettings {
    fn from(cfg: &ReplayConfig) -> Self {
        Self {
            tick_interval: Duration::from_millis(cfg.tick_interval_ms),
            render_every: cfg.render_every.max(1),
            auto_start: cfg.auto_start,
        }
    }
}

/// Command and snapshot endpoints for a running driver
#[derive(Debug, Clone)]
pub struct ReplayHandle {
    commands: mpsc::Sender<Command>,
    snapshots: broadcast::Sender<Snapshot>,
    stop: Arc<Notify>,
}

impl ReplayHandle {
    /// Queue a command; fails once the driver has stopped
    pub async fn send(&self, command: Command) -> anyhow::Result<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| anyhow::anyhow!("replay driver stopped"))
    }

    pub fn commands(&self) -> mpsc::Sender<Command> {
        self.commands.clone()
    }

    /// Receive every snapshot published from now on
    pub fn subscribe(&self) -> broadcast::Receiver<Snapshot> {
        self.snapshots.subscribe()
    }

    /// Ask the driver to stop after the command or tick in progress
    pub fn stop(&self) {
        self.stop.notify_one();
    }
}

pub struct ReplayDriver {
    engine: ReplayEngine,
    settings: ReplaySettings,
    commands: mpsc::Receiver<Command>,
    snapshots: broadcast::Sender<Snapshot>,
    stop: Arc<Notify>,
    ticks_since_start: u64,
}

impl ReplayDriver {
    pub fn new(engine: ReplayEngine, settings: ReplaySettings) -> (ReplayHandle, Self) {
        let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_CAPACITY);
        let (snap_tx, _) = broadcast::channel(SNAPSHOT_CAPACITY);
        let stop = Arc::new(Notify::new());

        let handle = ReplayHandle {
            commands: cmd_tx,
            snapshots: snap_tx.clone(),
            stop: stop.clone(),
        };
        let driver = Self {
            engine,
            settings,
            commands: cmd_rx,
            snapshots: snap_tx,
            stop,
            ticks_since_start: 0,
        };
        (handle, driver)
    }

    pub fn engine(&self) -> &ReplayEngine {
        &self.engine
    }

    /// Run until stopped or every command sender is dropped; returns the final engine
    pub async fn run(mut self) -> ReplayResult<ReplayEngine> {
        if self.settings.auto_start {
            self.engine.start();
        }
        info!(
            "▶️ Replay ready: {} ticks every {:?}{}",
            self.engine.len(),
            self.settings.tick_interval,
            if self.engine.is_running() {
                ""
            } else {
                " (send RESET to start)"
            }
        );
        self.publish()?;

        let mut interval = time::interval(self.settings.tick_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = self.stop.notified() => break,
                cmd = self.commands.recv() => match cmd {
                    Some(cmd) => self.apply(cmd)?,
                    None => break,
                },
                _ = interval.tick(), if self.engine.is_running() => {
                    self.advance()?;
                }
            }
        }

        debug!("Replay driver stopping at tick {}", self.engine.cursor());
        Ok(self.engine)
    }

    /// Apply one user command and publish the resulting state
    pub fn apply(&mut self, command: Command) -> ReplayResult<()> {
        debug!("Command {}", command);
        match command {
            Command::OpenLong => {
                self.engine.open(Side::Long)?;
            }
            Command::OpenShort => {
                self.engine.open(Side::Short)?;
            }
            Command::Close => {
                self.engine.close()?;
            }
            Command::Reset => {
                self.engine.reset();
                self.engine.start();
                self.ticks_since_start = 0;
                info!("⏮️ Replay reset, starting from tick 0");
            }
        }
        self.publish()
    }

    /// Advance one tick, publishing when the render cadence says so
    pub fn advance(&mut self) -> ReplayResult<TickOutcome> {
        let outcome = self.engine.tick()?;
        match outcome {
            TickOutcome::Advanced { .. } => {
                self.ticks_since_start += 1;
                if self.engine.is_finished() {
                    self.finish()?;
                } else if self.ticks_since_start % self.settings.render_every == 0 {
                    self.publish()?;
                }
            }
            TickOutcome::EndOfTape => self.finish()?,
            TickOutcome::Paused => {}
        }
        Ok(outcome)
    }

    fn finish(&mut self) -> ReplayResult<()> {
        self.engine.pause();
        info!(
            "⏹️ End of tape after {} ticks | cumulative {:+.2}%",
            self.engine.cursor(),
            self.engine.cumulative_return()
        );
        self.publish()
    }

    fn publish(&self) -> ReplayResult<()> {
        let snapshot = self.engine.snapshot()?;
        // No subscribers is fine
        let _ = self.snapshots.send(snapshot);
        Ok(())
    }
}

//! Periodic resource generators for EggWars.
//!
//! Each team owns one [`Generator`] anchored next to its spawn. While
//! running, the generator drops one unit of its resource into the world at
//! a fixed cadence set by the resource tier:
//!
//! | Kind    | Interval |
//! |---------|----------|
//! | Iron    | 2 s      |
//! | Gold    | 5 s      |
//! | Diamond | 10 s     |
//!
//! # Concurrency
//!
//! The spawn loop runs as its own Tokio task and only talks to the
//! [`World`] collaborator. It never touches arena state, so the arena may
//! call [`Generator::start`] and [`Generator::stop`] while holding its own
//! lock: neither call blocks or awaits anything.
//!
//! ```ignore
//! let mut generator = Generator::new(anchor, ResourceKind::Iron, world);
//! generator.start();   // inert → running, task spawned
//! generator.stop();    // running → inert, task exits at its next scheduling point
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use eggwars_protocol::{EntityHandle, ResourceKind, Vec3};
use tokio::sync::oneshot;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, trace, warn};

// ---------------------------------------------------------------------------
// World collaborator
// ---------------------------------------------------------------------------

/// The game world, as far as generators are concerned.
///
/// The engine adapter implements this; tests implement it with a recorder.
/// Called from the generator task, so implementations must be cheap and
/// must not call back into the arena.
pub trait World: Send + Sync + 'static {
    /// Drops `count` units of `kind` as an item entity at `position`.
    fn spawn_resource(
        &self,
        position: Vec3,
        kind: ResourceKind,
        count: u32,
    ) -> EntityHandle;
}

/// Fixed spawn interval for a resource tier.
pub fn tick_interval(kind: ResourceKind) -> Duration {
    match kind {
        ResourceKind::Iron => Duration::from_secs(2),
        ResourceKind::Gold => Duration::from_secs(5),
        ResourceKind::Diamond => Duration::from_secs(10),
    }
}

// ---------------------------------------------------------------------------
// Generator
// ---------------------------------------------------------------------------

/// A resource spawner bound to one position and one resource kind.
///
/// Created inert. Dropping a running generator stops its task: the task
/// observes the stop sender going away exactly like an explicit stop.
pub struct Generator {
    position: Vec3,
    kind: ResourceKind,
    interval: Duration,
    world: Arc<dyn World>,
    running: bool,
    /// Present only while running. Sending (or dropping) it ends the task.
    stop_tx: Option<oneshot::Sender<()>>,
    /// Units spawned across every run of this generator.
    spawned: Arc<AtomicU64>,
}

impl Generator {
    pub fn new(
        position: Vec3,
        kind: ResourceKind,
        world: Arc<dyn World>,
    ) -> Self {
        Self {
            position,
            kind,
            interval: tick_interval(kind),
            world,
            running: false,
            stop_tx: None,
            spawned: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Launches the spawn loop. No-op if already running.
    ///
    /// Must be called from within a Tokio runtime; outside one the
    /// generator logs a warning and stays inert.
    pub fn start(&mut self) {
        if self.running {
            return;
        }
        if tokio::runtime::Handle::try_current().is_err() {
            warn!(kind = %self.kind, "generator started outside a Tokio runtime, staying inert");
            return;
        }

        let (stop_tx, stop_rx) = oneshot::channel();
        self.stop_tx = Some(stop_tx);
        self.running = true;

        tokio::spawn(run_spawn_loop(
            self.position,
            self.kind,
            self.interval,
            Arc::clone(&self.world),
            Arc::clone(&self.spawned),
            stop_rx,
        ));

        debug!(
            kind = %self.kind,
            position = %self.position,
            interval_ms = self.interval.as_millis() as u64,
            "generator started"
        );
    }

    /// Signals the spawn loop to exit. No-op if not running.
    ///
    /// Never blocks and never waits for the task. The loop sees the signal
    /// at its next scheduling point and exits there. A spawn already in
    /// progress on another worker thread may still complete after this
    /// returns; no new tick starts once the signal has been observed.
    pub fn stop(&mut self) {
        if !self.running {
            return;
        }
        self.running = false;
        if let Some(tx) = self.stop_tx.take() {
            // The task may already be gone (runtime shutdown); that's fine.
            let _ = tx.send(());
        }
        debug!(kind = %self.kind, position = %self.position, "generator stopped");
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Total units this generator has spawned.
    pub fn spawned(&self) -> u64 {
        self.spawned.load(Ordering::Relaxed)
    }
}

impl std::fmt::Debug for Generator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Generator")
            .field("position", &self.position)
            .field("kind", &self.kind)
            .field("running", &self.running)
            .field("spawned", &self.spawned())
            .finish()
    }
}

async fn run_spawn_loop(
    position: Vec3,
    kind: ResourceKind,
    interval: Duration,
    world: Arc<dyn World>,
    spawned: Arc<AtomicU64>,
    mut stop_rx: oneshot::Receiver<()>,
) {
    // First unit one full interval after start, not immediately.
    let mut ticker = time::interval_at(Instant::now() + interval, interval);
    // A stalled runtime should not produce a burst of drops.
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;

            // Fires on an explicit stop and when the generator is dropped.
            _ = &mut stop_rx => break,

            _ = ticker.tick() => {
                let entity = world.spawn_resource(position, kind, 1);
                let total = spawned.fetch_add(1, Ordering::Relaxed) + 1;
                trace!(%kind, %entity, total, "resource spawned");
            }
        }
    }

    trace!(%kind, "generator task exited");
}

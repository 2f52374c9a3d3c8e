//! Durable per-player statistics.
//!
//! Updates land in memory right away. Persisting them is the job of a
//! background writer task: each update queues a save request, and the
//! writer collapses whatever is queued into one pretty-JSON rewrite of the
//! file. A failed write is logged and the in-memory numbers stay
//! authoritative, so a full disk never interrupts a match.
//!
//! ```text
//! record_*() ──► in-memory map
//!      │
//!      └──Save──► mpsc ──► writer task ──► stats.json
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use eggwars_arena::StatsRecorder;
use eggwars_protocol::{Codec, JsonCodec};
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};

use crate::EggwarsError;

type StatsMap = BTreeMap<String, PlayerStats>;

/// Lifetime numbers for one player.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerStats {
    pub kills: u32,
    pub deaths: u32,
    pub wins: u32,
    pub losses: u32,
    pub games: u32,
}

impl PlayerStats {
    /// Kills per death. With no deaths the ratio is the kill count.
    pub fn kd_ratio(&self) -> f64 {
        if self.deaths == 0 {
            f64::from(self.kills)
        } else {
            f64::from(self.kills) / f64::from(self.deaths)
        }
    }
}

#[derive(Debug)]
enum WriteRequest {
    Save,
    /// Write now and acknowledge once the file is on disk (or the write
    /// failed).
    Flush(oneshot::Sender<()>),
}

/// Stats for every player who ever played, optionally backed by a file.
#[derive(Debug)]
pub struct StatsManager {
    path: Option<PathBuf>,
    players: Arc<Mutex<StatsMap>>,
    writer: Option<mpsc::UnboundedSender<WriteRequest>>,
}

impl StatsManager {
    /// A manager that never touches the disk.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            players: Arc::new(Mutex::new(BTreeMap::new())),
            writer: None,
        }
    }

    /// Loads stats from `path` and starts the background writer. A missing
    /// file starts empty and is created on the first update.
    ///
    /// Outside a Tokio runtime no writer is started and the file is only
    /// written by an explicit [`save`](Self::save).
    ///
    /// # Errors
    /// Returns [`EggwarsError::Io`] if the file exists but can't be read, or
    /// [`EggwarsError::Protocol`] if it isn't valid stats JSON.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, EggwarsError> {
        let path = path.into();
        let players: StatsMap = match std::fs::read(&path) {
            Ok(bytes) => JsonCodec.decode(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "no stats file yet, starting empty");
                BTreeMap::new()
            }
            Err(e) => return Err(e.into()),
        };
        tracing::info!(path = %path.display(), players = players.len(), "stats loaded");

        let players = Arc::new(Mutex::new(players));
        let writer = match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let (tx, rx) = mpsc::unbounded_channel();
                handle.spawn(run_writer(path.clone(), Arc::clone(&players), rx));
                Some(tx)
            }
            Err(_) => {
                tracing::warn!(
                    path = %path.display(),
                    "no Tokio runtime, stats are written only on save()"
                );
                None
            }
        };

        Ok(Self {
            path: Some(path),
            players,
            writer,
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Current stats for `name`, zeroed if they never played.
    pub fn stats(&self, name: &str) -> PlayerStats {
        self.lock().get(name).copied().unwrap_or_default()
    }

    pub fn player_count(&self) -> usize {
        self.lock().len()
    }

    /// Writes every player's stats to the backing file, if there is one.
    ///
    /// Blocks on file I/O; meant for shutdown and runtime-less callers.
    /// Inside a runtime prefer [`flush`](Self::flush).
    ///
    /// # Errors
    /// Returns an error if encoding or writing fails.
    pub fn save(&self) -> Result<(), EggwarsError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let bytes = JsonCodec.encode(&*self.lock())?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    /// Waits until the writer has written everything queued so far.
    /// Returns immediately when there is no writer.
    pub async fn flush(&self) {
        let Some(writer) = &self.writer else {
            return;
        };
        let (ack_tx, ack_rx) = oneshot::channel();
        if writer.send(WriteRequest::Flush(ack_tx)).is_ok() {
            let _ = ack_rx.await;
        }
    }

    fn update(&self, name: &str, apply: impl FnOnce(&mut PlayerStats)) {
        apply(self.lock().entry(name.to_string()).or_default());
        if let Some(writer) = &self.writer {
            if writer.send(WriteRequest::Save).is_err() {
                tracing::warn!(player = %name, "stats writer stopped, update kept in memory");
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, StatsMap> {
        lock_players(&self.players)
    }
}

fn lock_players(players: &Mutex<StatsMap>) -> MutexGuard<'_, StatsMap> {
    players.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Drains save requests until every sender is gone. Requests that pile up
/// while a write is in flight are served by a single rewrite.
async fn run_writer(
    path: PathBuf,
    players: Arc<Mutex<StatsMap>>,
    mut requests: mpsc::UnboundedReceiver<WriteRequest>,
) {
    while let Some(first) = requests.recv().await {
        let mut acks = Vec::new();
        let mut pending = Some(first);
        while let Some(request) = pending {
            if let WriteRequest::Flush(ack) = request {
                acks.push(ack);
            }
            pending = requests.try_recv().ok();
        }

        if let Err(e) = write_snapshot(&path, &players).await {
            tracing::error!(path = %path.display(), error = %e, "failed to save stats");
        }
        for ack in acks {
            let _ = ack.send(());
        }
    }
    tracing::debug!(path = %path.display(), "stats writer stopped");
}

async fn write_snapshot(
    path: &Path,
    players: &Mutex<StatsMap>,
) -> Result<(), EggwarsError> {
    let bytes = {
        let players = lock_players(players);
        JsonCodec.encode(&*players)?
    };
    tokio::fs::write(path, bytes).await?;
    Ok(())
}

impl StatsRecorder for StatsManager {
    fn record_kill(&self, player: &str) {
        self.update(player, |s| s.kills += 1);
    }

    fn record_death(&self, player: &str) {
        self.update(player, |s| s.deaths += 1);
    }

    fn record_win(&self, player: &str) {
        self.update(player, |s| {
            s.wins += 1;
            s.games += 1;
        });
    }

    fn record_loss(&self, player: &str) {
        self.update(player, |s| {
            s.losses += 1;
            s.games += 1;
        });
    }
}

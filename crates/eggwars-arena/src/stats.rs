//! The statistics collaborator an arena reports match events to.

/// Receives per-player match events.
///
/// Called while the arena lock is held, so implementations must not call
/// back into the arena. Persistence failures are the implementation's
/// problem: they are logged there and never reach the match.
pub trait StatsRecorder: Send + Sync + 'static {
    fn record_kill(&self, player: &str);
    fn record_death(&self, player: &str);
    fn record_win(&self, player: &str);
    fn record_loss(&self, player: &str);
}

/// A recorder that drops everything. Handy for tests and demos.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopStats;

impl StatsRecorder for NoopStats {
    fn record_kill(&self, _: &str) {}
    fn record_death(&self, _: &str) {}
    fn record_win(&self, _: &str) {}
    fn record_loss(&self, _: &str) {}
}

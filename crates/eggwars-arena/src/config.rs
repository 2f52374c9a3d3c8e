//! Arena configuration and state machine.

use std::collections::BTreeMap;
use std::time::Duration;

use eggwars_protocol::{BlockPos, ResourceKind, TeamColor, Vec3};
use serde::{Deserialize, Serialize};

/// Delay between reaching `min_players` and the match starting.
pub const START_COUNTDOWN: Duration = Duration::from_secs(10);

/// Delay before a player whose egg survives comes back.
pub const RESPAWN_DELAY: Duration = Duration::from_secs(3);

/// Delay between the end of a match and the arena reset.
pub const RESET_DELAY: Duration = Duration::from_secs(10);

// ---------------------------------------------------------------------------
// TeamConfig
// ---------------------------------------------------------------------------

/// Layout of one team on the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamConfig {
    /// Where members appear when the match starts and after respawning.
    pub spawn: Vec3,

    /// Block position of the team's egg.
    pub egg: BlockPos,

    /// Anchor the team's generator drops resources at.
    pub generator: Vec3,

    /// Resource the team's generator produces.
    #[serde(default)]
    pub generator_kind: ResourceKind,
}

impl TeamConfig {
    /// A team layout with an iron generator.
    pub fn new(spawn: Vec3, egg: BlockPos, generator: Vec3) -> Self {
        Self {
            spawn,
            egg,
            generator,
            generator_kind: ResourceKind::Iron,
        }
    }
}

// ---------------------------------------------------------------------------
// ArenaConfig
// ---------------------------------------------------------------------------

/// Configuration for one arena.
///
/// Read once at construction and again on every reset, so edits to a
/// clone never leak into a running match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArenaConfig {
    /// Identifier of the world the arena is built in.
    pub world: String,

    /// Players needed before the start countdown begins.
    pub min_players: usize,

    /// Maximum players allowed in the arena.
    pub max_players: usize,

    /// Where players wait before the match and return to after it.
    pub lobby_spawn: Vec3,

    /// Configured teams. Only these colors exist in the arena.
    pub teams: BTreeMap<TeamColor, TeamConfig>,
}

impl ArenaConfig {
    /// The four-island layout: teams on the diagonals, lobby up high.
    pub fn islands() -> Self {
        let team = |x: f64, z: f64| {
            let toward_center = if x > 0.0 { -5.0 } else { 5.0 };
            let generator_shift = if x > 0.0 { -2.0 } else { 2.0 };
            TeamConfig::new(
                Vec3::new(x, 150.0, z),
                BlockPos::new((x + toward_center) as i32, 151, z as i32),
                Vec3::new(x + generator_shift, 150.0, z),
            )
        };

        Self {
            world: "islands".to_string(),
            min_players: 2,
            max_players: 8,
            lobby_spawn: Vec3::new(0.0, 150.0, 0.0),
            teams: BTreeMap::from([
                (TeamColor::Red, team(100.0, 100.0)),
                (TeamColor::Blue, team(-100.0, -100.0)),
                (TeamColor::Green, team(100.0, -100.0)),
                (TeamColor::Yellow, team(-100.0, 100.0)),
            ]),
        }
    }

    /// Clamps the player limits into a usable range.
    ///
    /// `max_players` is at least 1 and `min_players` lies in
    /// `1..=max_players`. Each adjustment is logged.
    pub fn validated(mut self) -> Self {
        if self.max_players == 0 {
            tracing::warn!(world = %self.world, "max_players was 0, using 1");
            self.max_players = 1;
        }
        let clamped = self.min_players.clamp(1, self.max_players);
        if clamped != self.min_players {
            tracing::warn!(
                world = %self.world,
                min_players = self.min_players,
                clamped,
                "min_players out of range, clamped"
            );
            self.min_players = clamped;
        }
        self
    }
}

impl Default for ArenaConfig {
    /// The classic layout: four teams at the compass points around a
    /// lobby at the origin.
    fn default() -> Self {
        Self {
            world: "world".to_string(),
            min_players: 2,
            max_players: 8,
            lobby_spawn: Vec3::new(0.0, 100.0, 0.0),
            teams: BTreeMap::from([
                (
                    TeamColor::Red,
                    TeamConfig::new(
                        Vec3::new(50.0, 100.0, 0.0),
                        BlockPos::new(45, 101, 0),
                        Vec3::new(48.0, 100.0, 0.0),
                    ),
                ),
                (
                    TeamColor::Blue,
                    TeamConfig::new(
                        Vec3::new(-50.0, 100.0, 0.0),
                        BlockPos::new(-45, 101, 0),
                        Vec3::new(-48.0, 100.0, 0.0),
                    ),
                ),
                (
                    TeamColor::Green,
                    TeamConfig::new(
                        Vec3::new(0.0, 100.0, 50.0),
                        BlockPos::new(0, 101, 45),
                        Vec3::new(0.0, 100.0, 48.0),
                    ),
                ),
                (
                    TeamColor::Yellow,
                    TeamConfig::new(
                        Vec3::new(0.0, 100.0, -50.0),
                        BlockPos::new(0, 101, -45),
                        Vec3::new(0.0, 100.0, -48.0),
                    ),
                ),
            ]),
        }
    }
}

// ---------------------------------------------------------------------------
// ArenaState
// ---------------------------------------------------------------------------

/// The lifecycle state of an arena.
///
/// ```text
///            join reaches min       countdown fires      ≤ 1 team alive
/// Waiting ──────────────────→ Starting ────────────→ Playing ──────────→ Ending
///    ↑                          │                                         │
///    └───── leave drops below min                                         │
///    └───────────────────────────────── reset (10 s) ─────────────────────┘
/// ```
///
/// - **Waiting**: accepting joins, not enough players yet.
/// - **Starting**: countdown running. Still accepting joins.
/// - **Playing**: match running, generators on. No joins.
/// - **Ending**: winner announced, reset pending. No joins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArenaState {
    Waiting,
    Starting,
    Playing,
    Ending,
}

impl ArenaState {
    /// Returns `true` if the arena is accepting new players.
    pub fn is_joinable(self) -> bool {
        matches!(self, Self::Waiting | Self::Starting)
    }

    /// Returns `true` if `target` is a legal next state.
    pub fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Waiting, Self::Starting)
                | (Self::Starting, Self::Waiting)
                | (Self::Starting, Self::Playing)
                | (Self::Playing, Self::Ending)
                | (Self::Ending, Self::Waiting)
        )
    }
}

impl std::fmt::Display for ArenaState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Waiting => write!(f, "Waiting"),
            Self::Starting => write!(f, "Starting"),
            Self::Playing => write!(f, "Playing"),
            Self::Ending => write!(f, "Ending"),
        }
    }
}

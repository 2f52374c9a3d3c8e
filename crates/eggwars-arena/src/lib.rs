//! Arena lifecycle management for EggWars.
//!
//! Each arena is one match session: players join teams in the lobby, a
//! countdown starts the match, teams defend their eggs while generators
//! drop resources, and the last team standing wins before the arena resets
//! itself for the next round.
//!
//! # Key types
//!
//! - [`Arena`]: the state machine, shared as `Arc<Arena>`
//! - [`ArenaManager`]: all arenas, looked up by name
//! - [`ArenaState`]: lifecycle state
//! - [`ArenaConfig`] / [`TeamConfig`]: map layout and player limits
//! - [`Team`]: egg state and roster
//! - [`StatsRecorder`]: where kills, deaths, wins and losses go

mod arena;
mod config;
mod error;
mod manager;
mod shop;
mod stats;
mod team;

pub use arena::{Arena, ArenaInfo};
pub use config::{
    ArenaConfig, ArenaState, RESET_DELAY, RESPAWN_DELAY, START_COUNTDOWN,
    TeamConfig,
};
pub use error::{ArenaError, JoinRejected, ShopError};
pub use manager::ArenaManager;
pub use shop::default_catalog;
pub use stats::{NoopStats, StatsRecorder};
pub use team::Team;

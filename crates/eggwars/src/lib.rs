//! # EggWars
//!
//! Team-based arena minigame orchestration.
//!
//! Players join an arena, get sorted into colored teams, and defend their
//! team's egg while resource generators pay out iron, gold and diamonds.
//! A team with a broken egg stops respawning; the last team standing
//! wins. This crate wires the pieces together: the [`GameManager`] routes
//! chat commands and engine events to arenas, [`StatsManager`] keeps
//! lifetime numbers, and [`config::load_or_create`] reads the arena
//! layouts.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use eggwars::prelude::*;
//!
//! # async fn run(world: Arc<dyn World>) -> Result<(), EggwarsError> {
//! eggwars::logging::init_logging(1);
//! let config = eggwars::config::load_or_create("arenas.json")?;
//! let stats = Arc::new(StatsManager::load("stats.json")?);
//! let game = GameManager::new(&config, world, stats);
//!
//! let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
//! game.connect("alice", tx).await?;
//! game.dispatch("alice", "/join islands").await?;
//! # Ok(())
//! # }
//! ```

mod command;
pub mod config;
mod error;
mod game;
pub mod logging;
mod stats;

pub use command::{Command, CommandError, CommandRegistry, CommandEntry};
pub use config::GameConfig;
pub use error::EggwarsError;
pub use game::{GameManager, SHOP_ITEM};
pub use stats::{PlayerStats, StatsManager};

/// Commonly used types, re-exported for convenience.
pub mod prelude {
    pub use crate::{
        Command, EggwarsError, GameConfig, GameManager, PlayerStats,
        StatsManager,
    };
    pub use eggwars_arena::{
        Arena, ArenaConfig, ArenaError, ArenaState, ShopError, StatsRecorder,
        TeamConfig,
    };
    pub use eggwars_generator::World;
    pub use eggwars_protocol::{
        BlockPos, EntityHandle, ResourceKind, ShopOffer, TeamColor, Vec3,
    };
    pub use eggwars_session::{PlayerOutbound, PlayerSender};
}

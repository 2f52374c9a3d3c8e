//! The game manager: routes player commands and engine events to arenas.
//!
//! ```text
//! engine ──► GameManager ──► sessions (lobby data, arena back-reference)
//!                  │
//!                  └────────► ArenaManager ──► Arena (state machine)
//! ```
//!
//! # Lock order
//!
//! The sessions mutex is always taken before any arena lock. Arenas never
//! call back into the game manager, so the order can't invert.
//!
//! # Stale back-references
//!
//! When a match resets, the arena drops its players without telling their
//! sessions. Every routed call first checks that the arena still counts
//! the player as a member and clears the session's back-reference when it
//! doesn't.

use std::sync::Arc;

use eggwars_arena::{
    Arena, ArenaError, ArenaManager, ArenaState, JoinRejected, ShopError,
    StatsRecorder,
};
use eggwars_generator::World;
use eggwars_protocol::{BlockPos, ResourceKind, ShopOffer, TeamColor};
use eggwars_session::{PlayerSender, Session, SessionManager};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::{Command, CommandRegistry, EggwarsError, GameConfig, StatsManager};

/// The item that opens the shop when used inside an arena.
pub const SHOP_ITEM: &str = "paper";

const HEADER_BAR: &str = "§6╔═══════════════════════════════╗";
const FOOTER_BAR: &str = "§6╚═══════════════════════════════╝";

/// Owns every session and arena on the server.
pub struct GameManager {
    sessions: Mutex<SessionManager>,
    arenas: ArenaManager,
    stats: Arc<StatsManager>,
    commands: CommandRegistry,
}

impl std::fmt::Debug for GameManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameManager")
            .field("arenas", &self.arenas)
            .finish_non_exhaustive()
    }
}

impl GameManager {
    /// Builds one arena per configured entry. Every arena reports to
    /// `stats` and drops resources into `world`.
    pub fn new(
        config: &GameConfig,
        world: Arc<dyn World>,
        stats: Arc<StatsManager>,
    ) -> Self {
        let recorder: Arc<dyn StatsRecorder> = stats.clone();
        let arenas = ArenaManager::from_configs(
            config.validated_arenas(),
            world,
            recorder,
            config.shop.clone(),
        );
        info!(arenas = arenas.arena_count(), "game manager ready");
        Self {
            sessions: Mutex::new(SessionManager::new()),
            arenas,
            stats,
            commands: CommandRegistry::new(),
        }
    }

    pub fn arenas(&self) -> &ArenaManager {
        &self.arenas
    }

    pub fn stats(&self) -> &StatsManager {
        &self.stats
    }

    pub fn commands(&self) -> &CommandRegistry {
        &self.commands
    }

    /// Looks up an arena by name.
    ///
    /// # Errors
    /// Returns [`ArenaError::NotFound`] for unknown names.
    pub fn arena(&self, name: &str) -> Result<Arc<Arena>, ArenaError> {
        self.arenas.get(name)
    }

    // -----------------------------------------------------------------
    // Connection lifecycle
    // -----------------------------------------------------------------

    /// Registers a player who just connected.
    ///
    /// # Errors
    /// Returns [`EggwarsError::Session`] if the name is already connected.
    pub async fn connect(
        &self,
        name: &str,
        sender: PlayerSender,
    ) -> Result<(), EggwarsError> {
        let mut sessions = self.sessions.lock().await;
        sessions.connect(name, sender)?;
        Ok(())
    }

    /// Removes a player, pulling them out of their arena first.
    ///
    /// # Errors
    /// Returns [`EggwarsError::Session`] if the player isn't connected.
    pub async fn disconnect(&self, name: &str) -> Result<(), EggwarsError> {
        let mut sessions = self.sessions.lock().await;
        let session = sessions.require_mut(name)?;
        self.leave_current(session).await;
        sessions.disconnect(name)?;
        Ok(())
    }

    pub async fn is_connected(&self, name: &str) -> bool {
        self.sessions.lock().await.is_connected(name)
    }

    /// The arena a player is currently in, after clearing a stale
    /// back-reference.
    pub async fn arena_of(&self, name: &str) -> Option<Arc<Arena>> {
        let mut sessions = self.sessions.lock().await;
        let session = sessions.get_mut(name)?;
        self.current_arena(session).await
    }

    // -----------------------------------------------------------------
    // Commands
    // -----------------------------------------------------------------

    /// Puts a player into an arena.
    ///
    /// Every refusal is explained to the player in chat before the error
    /// is returned.
    ///
    /// # Errors
    /// Returns [`EggwarsError::Session`] for unknown players and
    /// [`EggwarsError::Arena`] when the arena doesn't exist, the player is
    /// already in one, or the arena turns them away.
    pub async fn join_arena(
        &self,
        name: &str,
        arena_name: &str,
    ) -> Result<TeamColor, EggwarsError> {
        let mut sessions = self.sessions.lock().await;
        let session = sessions.require_mut(name)?;

        let arena = match self.arenas.get(arena_name) {
            Ok(arena) => arena,
            Err(e) => {
                session.send(format!("§c✗ Arena '{arena_name}' not found!"));
                session.send("§eUse /arenas to see available arenas.");
                return Err(e.into());
            }
        };

        if let Some(current) = self.current_arena(session).await {
            session.send(format!(
                "§c✗ You are already in arena '{}'! Use /leave first.",
                current.name()
            ));
            return Err(ArenaError::AlreadyMember(
                name.to_string(),
                current.name().to_string(),
            )
            .into());
        }

        match arena.join(session.take_data()).await {
            Ok(color) => {
                session.enter(arena.name());
                Ok(color)
            }
            Err(JoinRejected { reason, data }) => {
                session.restore(Some(data));
                session.send(format!("§c✗ Could not join arena '{arena_name}'."));
                session.send(rejection_reason(&arena, &reason).await);
                Err(reason.into())
            }
        }
    }

    /// Takes a player out of their arena.
    ///
    /// Returns `false` (after telling the player) if they weren't in one.
    ///
    /// # Errors
    /// Returns [`EggwarsError::Session`] for unknown players.
    pub async fn leave_arena(&self, name: &str) -> Result<bool, EggwarsError> {
        let mut sessions = self.sessions.lock().await;
        let session = sessions.require_mut(name)?;

        if self.current_arena(session).await.is_none() {
            session.send("§c✗ You are not in an arena!");
            return Ok(false);
        }
        if let Some(arena_name) = self.leave_current(session).await {
            session.send(format!("§a✓ You left arena '{arena_name}'."));
        }
        Ok(true)
    }

    /// Sends the arena list to a player.
    ///
    /// # Errors
    /// Returns [`EggwarsError::Session`] for unknown players.
    pub async fn list_arenas(&self, name: &str) -> Result<(), EggwarsError> {
        let mut sessions = self.sessions.lock().await;
        let session = sessions.require_mut(name)?;

        session.send(HEADER_BAR);
        session.send("§6║    Available EggWars Arenas   ║");
        session.send(FOOTER_BAR);
        session.send("");

        let infos = self.arenas.list().await;
        if infos.is_empty() {
            session.send("§eNo arenas configured yet.");
            session.send("");
            return Ok(());
        }

        for info in &infos {
            session.send(format!(
                "§f  {} §f{}{}",
                info.name,
                state_color(info.state),
                info.state
            ));
            session.send(format!(
                "    §7Players: {}/{} (min: {})",
                info.player_count, info.max_players, info.min_players
            ));
            session.send(format!("    §7Command: /join {}", info.name));
            session.send("");
        }

        if let Some(current) = self.current_arena(session).await {
            session.send(format!("§eℹ You are currently in: {}", current.name()));
            session.send("");
        }
        Ok(())
    }

    /// Sends a player their lifetime statistics.
    ///
    /// # Errors
    /// Returns [`EggwarsError::Session`] for unknown players.
    pub async fn show_stats(&self, name: &str) -> Result<(), EggwarsError> {
        let mut sessions = self.sessions.lock().await;
        let session = sessions.require_mut(name)?;
        let stats = self.stats.stats(name);

        session.send(HEADER_BAR);
        session.send(format!("§6║  Statistics for {name}"));
        session.send(FOOTER_BAR);
        session.send("");
        session.send(format!("§f  Kills:   §e{}", stats.kills));
        session.send(format!("§f  Deaths:  §e{}", stats.deaths));
        session.send(format!("§f  Wins:    §a{}", stats.wins));
        session.send(format!("§f  Losses:  §c{}", stats.losses));
        session.send(format!("§f  Games:   §8{}", stats.games));
        session.send("");

        let kd = stats.kd_ratio();
        session.send(format!("§f  K/D Ratio: {}{kd:.2}", kd_color(kd)));
        session.send("");
        Ok(())
    }

    /// Parses and runs one chat command.
    ///
    /// Parse failures are reported to the player in chat.
    ///
    /// # Errors
    /// Returns [`EggwarsError::Command`] for lines that don't parse, or the
    /// error of the command that ran.
    pub async fn dispatch(&self, name: &str, line: &str) -> Result<(), EggwarsError> {
        let command = match self.commands.parse(line) {
            Ok(command) => command,
            Err(e) => {
                debug!(player = %name, line, error = %e, "bad command");
                let mut sessions = self.sessions.lock().await;
                let session = sessions.require_mut(name)?;
                session.send(format!("§c✗ {e}"));
                session.send("§eUse /help to see available commands.");
                return Err(e.into());
            }
        };

        match command {
            Command::Join(arena) => self.join_arena(name, &arena).await.map(drop),
            Command::Leave => self.leave_arena(name).await.map(drop),
            Command::ListArenas => self.list_arenas(name).await,
            Command::ShowStats => self.show_stats(name).await,
            Command::Help => {
                let mut sessions = self.sessions.lock().await;
                let session = sessions.require_mut(name)?;
                for line in self.commands.help_lines() {
                    session.send(line);
                }
                Ok(())
            }
        }
    }

    // -----------------------------------------------------------------
    // Engine events
    // -----------------------------------------------------------------

    /// The player quit the game. Their session stays until
    /// [`disconnect`](Self::disconnect).
    pub async fn on_quit(&self, name: &str) {
        let mut sessions = self.sessions.lock().await;
        if let Some(session) = sessions.get_mut(name) {
            self.leave_current(session).await;
        }
    }

    /// The player died, optionally at another player's hands.
    pub async fn on_death(&self, name: &str, killer: Option<&str>) {
        if let Some(arena) = self.arena_of(name).await {
            arena.handle_player_death(name, killer).await;
        }
    }

    /// Whether the player may break the block at `pos`. Outside arenas
    /// everything is breakable.
    pub async fn on_block_break(&self, name: &str, pos: BlockPos) -> bool {
        match self.arena_of(name).await {
            Some(arena) => arena.can_break_block(name, pos).await,
            None => true,
        }
    }

    /// The player placed a block. Only tracked during a match.
    pub async fn on_block_place(&self, name: &str, pos: BlockPos) {
        if let Some(arena) = self.arena_of(name).await {
            arena.track_placed_block(pos).await;
        }
    }

    /// The player used an item. Returns `true` if the use was consumed
    /// (the shop opened).
    pub async fn on_item_use(&self, name: &str, item: &str) -> bool {
        if !item.eq_ignore_ascii_case(SHOP_ITEM) {
            return false;
        }
        let Some(arena) = self.arena_of(name).await else {
            return false;
        };
        arena.open_shop(name).await.is_ok()
    }

    /// The player picked shop entry `option`.
    ///
    /// # Errors
    /// Returns [`EggwarsError::Shop`] if the player isn't in an arena, the
    /// option doesn't exist, or they can't afford it.
    pub async fn on_shop_select(
        &self,
        name: &str,
        option: usize,
    ) -> Result<ShopOffer, EggwarsError> {
        let mut sessions = self.sessions.lock().await;
        let session = sessions.require_mut(name)?;
        let Some(arena) = self.current_arena(session).await else {
            session.send("§c✗ You are not in an arena!");
            return Err(ShopError::NotMember(name.to_string()).into());
        };
        Ok(arena.purchase(name, option).await?)
    }

    /// The player picked up generator drops.
    pub async fn on_resource_pickup(
        &self,
        name: &str,
        kind: ResourceKind,
        amount: u32,
    ) -> bool {
        match self.arena_of(name).await {
            Some(arena) => arena.collect_resource(name, kind, amount).await,
            None => false,
        }
    }

    // -----------------------------------------------------------------
    // Internal
    // -----------------------------------------------------------------

    /// Pulls the session's player out of whatever arena holds them and
    /// gives the data back to the session. Returns the arena's name.
    async fn leave_current(&self, session: &mut Session) -> Option<String> {
        let arena_name = session.arena()?.to_string();
        let data = match self.arenas.get(&arena_name) {
            Ok(arena) => arena.leave(session.name()).await,
            Err(_) => None,
        };
        session.restore(data);
        Some(arena_name)
    }

    async fn current_arena(&self, session: &mut Session) -> Option<Arc<Arena>> {
        let arena = match self.arenas.get(session.arena()?) {
            Ok(arena) => arena,
            Err(_) => {
                session.restore(None);
                return None;
            }
        };
        if arena.is_member(session.name()).await {
            Some(arena)
        } else {
            debug!(
                player = %session.name(),
                arena = %arena.name(),
                "clearing stale arena reference"
            );
            session.restore(None);
            None
        }
    }
}

async fn rejection_reason(arena: &Arena, reason: &ArenaError) -> String {
    match reason {
        ArenaError::NotJoinable(_, ArenaState::Ending) => {
            "§eReason: Game is ending.".to_string()
        }
        ArenaError::NotJoinable(..) => {
            "§eReason: Game is already in progress.".to_string()
        }
        ArenaError::Full(_) => format!(
            "§eReason: Arena is full ({}/{} players).",
            arena.player_count().await,
            arena.config().max_players
        ),
        ArenaError::NoTeams(_) => "§eReason: Arena has no teams.".to_string(),
        other => format!("§eReason: {other}."),
    }
}

fn state_color(state: ArenaState) -> &'static str {
    match state {
        ArenaState::Waiting => "§a",
        ArenaState::Starting => "§e",
        ArenaState::Playing => "§c",
        ArenaState::Ending => "§8",
    }
}

fn kd_color(kd: f64) -> &'static str {
    if kd >= 2.0 {
        "§a"
    } else if kd >= 1.0 {
        "§e"
    } else if kd > 0.0 {
        "§c"
    } else {
        "§8"
    }
}

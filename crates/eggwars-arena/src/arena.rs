//! The arena: one match session and its state machine.
//!
//! An [`Arena`] is shared as `Arc<Arena>`. Every mutable piece of it
//! (state, players, teams, generators, placed blocks) sits behind one
//! `tokio::sync::RwLock`. Mutations hold the write lock for their whole
//! critical section; pure reads like [`Arena::is_playing`] take the read
//! lock.
//!
//! # Deferred transitions
//!
//! The start countdown, respawns and the post-match reset are one-shot
//! Tokio tasks holding a `Weak<Arena>`. When they wake they take the write
//! lock and re-check that the world is still the one they were scheduled
//! for:
//!
//! ```text
//! countdown ── state == Starting && countdown_seq unchanged ──→ start_game
//! respawn   ── state == Playing && epoch unchanged && member ──→ revive
//! reset     ── state == Ending && epoch unchanged ───────────→ reset
//! ```
//!
//! Anything else is a stale timer and does nothing. The countdown is also
//! aborted outright when it is cancelled; the sequence check covers a task
//! that already woke and is waiting for the lock.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Weak};

use eggwars_generator::{Generator, World};
use eggwars_protocol::{
    Balances, BlockPos, ResourceKind, ShopOffer, TeamColor,
};
use eggwars_session::PlayerData;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time;
use tracing::{debug, info, warn};

use crate::{
    ArenaConfig, ArenaError, ArenaState, JoinRejected, RESET_DELAY,
    RESPAWN_DELAY, START_COUNTDOWN, ShopError, StatsRecorder, Team,
};

/// A snapshot of arena metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct ArenaInfo {
    pub name: String,
    pub world: String,
    pub state: ArenaState,
    pub player_count: usize,
    pub min_players: usize,
    pub max_players: usize,
}

/// Everything guarded by the arena lock.
struct ArenaInner {
    state: ArenaState,
    teams: BTreeMap<TeamColor, Team>,
    players: HashMap<String, PlayerData>,
    placed_blocks: HashSet<BlockPos>,
    generators: BTreeMap<TeamColor, Generator>,
    /// The pending start countdown, if any.
    countdown: Option<JoinHandle<()>>,
    /// Bumped whenever a countdown is scheduled or cancelled.
    countdown_seq: u64,
    /// Bumped on every reset. Respawn and reset timers carry the epoch
    /// they were scheduled in.
    epoch: u64,
}

impl ArenaInner {
    /// Waiting, with no teams or players.
    fn empty() -> Self {
        Self {
            state: ArenaState::Waiting,
            teams: BTreeMap::new(),
            players: HashMap::new(),
            placed_blocks: HashSet::new(),
            generators: BTreeMap::new(),
            countdown: None,
            countdown_seq: 0,
            epoch: 0,
        }
    }

    /// Moves to `next`. Every caller has already checked the current
    /// state, so an edge missing from the transition table is a bug.
    fn transition(&mut self, next: ArenaState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal arena transition {} -> {next}",
            self.state
        );
        self.state = next;
    }

    fn broadcast(&self, text: &str) {
        for player in self.players.values() {
            player.send(text);
        }
    }
}

/// One arena. See the module docs for the locking and timer model.
pub struct Arena {
    name: String,
    config: ArenaConfig,
    world: Arc<dyn World>,
    stats: Arc<dyn StatsRecorder>,
    shop: Vec<ShopOffer>,
    inner: RwLock<ArenaInner>,
    /// Handed to timer tasks so they never keep the arena alive.
    this: Weak<Arena>,
}

impl Arena {
    /// Builds an arena in the Waiting state with fresh teams and inert
    /// generators.
    pub fn new(
        name: impl Into<String>,
        config: ArenaConfig,
        world: Arc<dyn World>,
        stats: Arc<dyn StatsRecorder>,
        shop: Vec<ShopOffer>,
    ) -> Arc<Self> {
        let name = name.into();
        let config = config.validated();
        let teams = build_teams(&config);
        let generators = build_generators(&teams, &world);

        info!(
            arena = %name,
            world = %config.world,
            teams = teams.len(),
            min_players = config.min_players,
            max_players = config.max_players,
            "arena created"
        );

        Arc::new_cyclic(|this| Self {
            name,
            config,
            world,
            stats,
            shop,
            inner: RwLock::new(ArenaInner {
                teams,
                generators,
                ..ArenaInner::empty()
            }),
            this: this.clone(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &ArenaConfig {
        &self.config
    }

    pub fn shop(&self) -> &[ShopOffer] {
        &self.shop
    }

    // -----------------------------------------------------------------
    // Membership
    // -----------------------------------------------------------------

    /// Adds a player, assigning them to the smallest team.
    ///
    /// Ties go to the first color in Red, Blue, Green, Yellow order. On
    /// rejection nothing changes and the player's data comes back inside
    /// the error.
    pub async fn join(
        &self,
        mut data: PlayerData,
    ) -> Result<TeamColor, JoinRejected> {
        let mut inner = self.inner.write().await;

        let checked = if !inner.state.is_joinable() {
            Err(ArenaError::NotJoinable(self.name.clone(), inner.state))
        } else if inner.players.contains_key(&data.name) {
            Err(ArenaError::AlreadyMember(data.name.clone(), self.name.clone()))
        } else if inner.players.len() >= self.config.max_players {
            Err(ArenaError::Full(self.name.clone()))
        } else {
            smallest_team(&inner.teams)
                .ok_or_else(|| ArenaError::NoTeams(self.name.clone()))
        };
        let color = match checked {
            Ok(color) => color,
            Err(reason) => {
                debug!(arena = %self.name, player = %data.name, %reason, "join rejected");
                return Err(JoinRejected { reason, data });
            }
        };

        let Some(team) = inner.teams.get_mut(&color) else {
            return Err(JoinRejected {
                reason: ArenaError::NoTeams(self.name.clone()),
                data,
            });
        };
        team.add_player(&data.name);
        let tag = team.chat_tag();
        let team_name = team.display_name();

        data.attach(&self.name, color);
        data.teleport(self.config.lobby_spawn);
        data.send(format!(
            "§a✓ Joined arena '{}' as {tag}team {team_name}§a!",
            self.name
        ));

        let name = data.name.clone();
        inner.players.insert(name.clone(), data);
        let count = inner.players.len();
        inner.broadcast(&format!(
            "{tag}{name}§f joined the game! ({count}/{})",
            self.config.max_players
        ));

        info!(arena = %self.name, player = %name, team = %color, count, "player joined");

        if inner.state == ArenaState::Waiting
            && count >= self.config.min_players
        {
            self.start_countdown(&mut inner);
        }

        Ok(color)
    }

    /// Removes a player and hands back their detached data.
    ///
    /// Returns `None` if the player isn't a member.
    pub async fn leave(&self, name: &str) -> Option<PlayerData> {
        let mut inner = self.inner.write().await;

        let mut data = inner.players.remove(name)?;
        if let Some(team) = data.team.and_then(|c| inner.teams.get_mut(&c)) {
            team.remove_player(name);
        }
        data.detach();

        inner.broadcast(&format!("§e{name} left the game!"));
        info!(
            arena = %self.name,
            player = %name,
            state = %inner.state,
            remaining = inner.players.len(),
            "player left"
        );

        let state = inner.state;
        match state {
            ArenaState::Playing => self.check_win_condition(&mut inner),
            ArenaState::Starting
                if inner.players.len() < self.config.min_players =>
            {
                self.cancel_countdown(&mut inner);
            }
            _ => {}
        }

        Some(data)
    }

    // -----------------------------------------------------------------
    // Match events
    // -----------------------------------------------------------------

    /// Records a death during a match.
    ///
    /// With the team egg standing the player comes back at the team spawn
    /// after [`RESPAWN_DELAY`]. Without it they are out for the rest of
    /// the match and the win condition is checked straight away.
    pub async fn handle_player_death(&self, name: &str, killer: Option<&str>) {
        let mut inner = self.inner.write().await;
        if inner.state != ArenaState::Playing {
            debug!(arena = %self.name, player = %name, state = %inner.state, "death outside a match ignored");
            return;
        }
        let epoch = inner.epoch;

        let Some(victim) = inner.players.get_mut(name) else {
            return;
        };
        victim.deaths += 1;
        victim.alive = false;
        let team_color = victim.team;
        self.stats.record_death(name);

        if let Some(killer) = killer.filter(|k| *k != name) {
            if let Some(attacker) = inner.players.get_mut(killer) {
                attacker.kills += 1;
                self.stats.record_kill(killer);
            }
        }

        let Some(color) = team_color else {
            warn!(arena = %self.name, player = %name, "dead player has no team");
            return;
        };
        let ArenaInner { players, teams, .. } = &mut *inner;
        let Some(team) = teams.get_mut(&color) else {
            warn!(arena = %self.name, player = %name, team = %color, "dead player's team is missing");
            return;
        };

        if team.egg_alive {
            if let Some(victim) = players.get(name) {
                victim.send(format!(
                    "§cYou died! Respawning in {} seconds...",
                    RESPAWN_DELAY.as_secs()
                ));
            }
            debug!(arena = %self.name, player = %name, "respawn scheduled");
            self.schedule_respawn(name, epoch);
        } else {
            team.eliminate(name);
            let tag = team.chat_tag();
            inner.broadcast(&format!("{tag}{name}§f was eliminated!"));
            info!(arena = %self.name, player = %name, team = %color, "player eliminated");
            self.check_win_condition(&mut inner);
        }
    }

    /// Decides whether a player may break the block at `pos`.
    ///
    /// Player-placed blocks are always breakable. An enemy's live egg is
    /// destroyed (once) and breakable. A destroyed egg's position is
    /// breakable with no further effect. Everything else, including the
    /// player's own egg, is protected. Non-members can't break anything.
    pub async fn can_break_block(&self, name: &str, pos: BlockPos) -> bool {
        let mut inner = self.inner.write().await;

        let Some(breaker) = inner.players.get(name) else {
            return false;
        };
        let breaker_team = breaker.team;

        if inner.placed_blocks.contains(&pos) {
            return true;
        }

        let Some(target) = inner.teams.values_mut().find(|t| t.egg == pos)
        else {
            return false;
        };
        if !target.egg_alive {
            return true;
        }
        if breaker_team == Some(target.color) {
            if let Some(breaker) = inner.players.get(name) {
                breaker.send("§cYou can't break your own egg!");
            }
            return false;
        }

        target.break_egg();
        let (color, tag, team_name) =
            (target.color, target.chat_tag(), target.display_name());
        inner.broadcast(&format!(
            "§c{tag}Team {team_name}§c's egg was destroyed by {name}!"
        ));
        info!(arena = %self.name, player = %name, team = %color, "egg destroyed");

        // A team held up only by its egg is out now.
        self.check_win_condition(&mut inner);
        true
    }

    /// Remembers a player-placed block so it stays breakable. Ignored
    /// outside a match.
    pub async fn track_placed_block(&self, pos: BlockPos) {
        let mut inner = self.inner.write().await;
        if inner.state == ArenaState::Playing {
            inner.placed_blocks.insert(pos);
        }
    }

    /// Credits a picked-up resource to a member. Only counts during a
    /// match. Returns whether anything was credited.
    pub async fn collect_resource(
        &self,
        name: &str,
        kind: ResourceKind,
        amount: u32,
    ) -> bool {
        let mut inner = self.inner.write().await;
        if inner.state != ArenaState::Playing {
            return false;
        }
        match inner.players.get_mut(name) {
            Some(player) => {
                player.resources.credit(kind, amount);
                true
            }
            None => false,
        }
    }

    // -----------------------------------------------------------------
    // Shop
    // -----------------------------------------------------------------

    /// Shows the catalog and the player's balances.
    pub async fn open_shop(&self, name: &str) -> Result<(), ShopError> {
        let inner = self.inner.read().await;
        let player = inner
            .players
            .get(name)
            .ok_or_else(|| ShopError::NotMember(name.to_string()))?;
        player.present_shop(&self.shop);
        Ok(())
    }

    /// Buys catalog entry `index`, debiting the price only if every
    /// resource is covered.
    ///
    /// Members hear about the outcome either way; the shortfall message
    /// names each missing resource.
    pub async fn purchase(
        &self,
        name: &str,
        index: usize,
    ) -> Result<ShopOffer, ShopError> {
        let mut inner = self.inner.write().await;
        let player = inner
            .players
            .get_mut(name)
            .ok_or_else(|| ShopError::NotMember(name.to_string()))?;

        let Some(offer) = self.shop.get(index) else {
            let err = ShopError::UnknownOffer(index);
            player.send(format!("§c✗ {err}"));
            return Err(err);
        };

        match player.resources.try_debit(&offer.cost) {
            Ok(()) => {
                player.send(format!("§a✓ Purchased {}!", offer.name));
                info!(arena = %self.name, player = %name, item = %offer.name, "purchase");
                Ok(offer.clone())
            }
            Err(shortfalls) => {
                let err = ShopError::Insufficient {
                    offer: offer.name.clone(),
                    shortfalls,
                };
                player.send(format!("§c✗ {err}"));
                Err(err)
            }
        }
    }

    // -----------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------

    pub async fn state(&self) -> ArenaState {
        self.inner.read().await.state
    }

    pub async fn is_playing(&self) -> bool {
        self.inner.read().await.state == ArenaState::Playing
    }

    pub async fn info(&self) -> ArenaInfo {
        let inner = self.inner.read().await;
        ArenaInfo {
            name: self.name.clone(),
            world: self.config.world.clone(),
            state: inner.state,
            player_count: inner.players.len(),
            min_players: self.config.min_players,
            max_players: self.config.max_players,
        }
    }

    pub async fn is_member(&self, name: &str) -> bool {
        self.inner.read().await.players.contains_key(name)
    }

    pub async fn player_count(&self) -> usize {
        self.inner.read().await.players.len()
    }

    /// A copy of a member's data.
    pub async fn player(&self, name: &str) -> Option<PlayerData> {
        self.inner.read().await.players.get(name).cloned()
    }

    /// A copy of a team.
    pub async fn team(&self, color: TeamColor) -> Option<Team> {
        self.inner.read().await.teams.get(&color).cloned()
    }

    /// Copies of every team in color order.
    pub async fn teams(&self) -> Vec<Team> {
        self.inner.read().await.teams.values().cloned().collect()
    }

    /// Whether `color`'s generator is running. `None` if the team
    /// doesn't exist.
    pub async fn generator_running(&self, color: TeamColor) -> Option<bool> {
        self.inner
            .read()
            .await
            .generators
            .get(&color)
            .map(Generator::is_running)
    }

    pub async fn is_placed_block(&self, pos: BlockPos) -> bool {
        self.inner.read().await.placed_blocks.contains(&pos)
    }

    // -----------------------------------------------------------------
    // Transitions (called with the write lock held)
    // -----------------------------------------------------------------

    fn start_countdown(&self, inner: &mut ArenaInner) {
        inner.transition(ArenaState::Starting);
        inner.countdown_seq += 1;
        let seq = inner.countdown_seq;

        inner.broadcast(&format!(
            "§aGame starting in {} seconds!",
            START_COUNTDOWN.as_secs()
        ));
        info!(arena = %self.name, state = %inner.state, "countdown started");

        let weak = self.this.clone();
        inner.countdown = Some(tokio::spawn(async move {
            time::sleep(START_COUNTDOWN).await;
            if let Some(arena) = weak.upgrade() {
                arena.start_game(seq).await;
            }
        }));
    }

    fn cancel_countdown(&self, inner: &mut ArenaInner) {
        if let Some(handle) = inner.countdown.take() {
            handle.abort();
        }
        inner.countdown_seq += 1;
        inner.transition(ArenaState::Waiting);

        inner.broadcast("§cNot enough players! Countdown cancelled.");
        info!(arena = %self.name, state = %inner.state, "countdown cancelled");
    }

    async fn start_game(&self, seq: u64) {
        let mut inner = self.inner.write().await;
        if inner.state != ArenaState::Starting || inner.countdown_seq != seq {
            debug!(arena = %self.name, "stale countdown ignored");
            return;
        }
        inner.countdown = None;
        inner.transition(ArenaState::Playing);

        inner.broadcast("§6===== GAME STARTED! =====");
        inner.broadcast("§eProtect your egg and destroy others!");

        let ArenaInner {
            players,
            teams,
            generators,
            ..
        } = &mut *inner;

        for player in players.values_mut() {
            player.alive = true;
            player.resources = Balances::zeroed();
            match player.team.and_then(|c| teams.get(&c)) {
                Some(team) => {
                    player.teleport(team.spawn);
                    player.send(format!(
                        "{}You are in team {}!",
                        team.chat_tag(),
                        team.display_name()
                    ));
                }
                None => {
                    warn!(arena = %self.name, player = %player.name, "player has no team at match start");
                }
            }
        }

        for (color, generator) in generators.iter_mut() {
            if teams.get(color).is_some_and(|t| t.egg_alive) {
                generator.start();
            }
        }

        info!(
            arena = %self.name,
            state = %inner.state,
            players = inner.players.len(),
            "match started"
        );
    }

    fn schedule_respawn(&self, name: &str, epoch: u64) {
        let weak = self.this.clone();
        let name = name.to_string();
        tokio::spawn(async move {
            time::sleep(RESPAWN_DELAY).await;
            if let Some(arena) = weak.upgrade() {
                arena.respawn(&name, epoch).await;
            }
        });
    }

    async fn respawn(&self, name: &str, epoch: u64) {
        let mut inner = self.inner.write().await;
        if inner.epoch != epoch || inner.state != ArenaState::Playing {
            debug!(arena = %self.name, player = %name, "stale respawn ignored");
            return;
        }

        let ArenaInner { players, teams, .. } = &mut *inner;
        let Some(player) = players.get_mut(name) else {
            debug!(arena = %self.name, player = %name, "player left before respawn");
            return;
        };
        let Some(team) = player.team.and_then(|c| teams.get(&c)) else {
            warn!(arena = %self.name, player = %name, "respawning player has no team");
            return;
        };
        if team.is_eliminated(name) {
            return;
        }

        player.alive = true;
        player.teleport(team.spawn);
        player.send("§aYou respawned!");
        debug!(arena = %self.name, player = %name, "player respawned");
    }

    fn check_win_condition(&self, inner: &mut ArenaInner) {
        if inner.state != ArenaState::Playing {
            return;
        }
        let alive: Vec<TeamColor> = inner
            .teams
            .values()
            .filter(|t| t.is_alive())
            .map(|t| t.color)
            .collect();
        if alive.len() <= 1 {
            self.end_game(inner, alive.first().copied());
        }
    }

    fn end_game(&self, inner: &mut ArenaInner, winner: Option<TeamColor>) {
        inner.transition(ArenaState::Ending);
        for generator in inner.generators.values_mut() {
            generator.stop();
        }

        match winner.and_then(|c| inner.teams.get(&c)) {
            Some(team) => {
                let line = format!(
                    "{}Team {} wins!",
                    team.chat_tag(),
                    team.display_name()
                );
                inner.broadcast("§6===== GAME OVER! =====");
                inner.broadcast(&line);
            }
            None => inner.broadcast("§6Game ended with no winners!"),
        }

        for player in inner.players.values() {
            if winner.is_some() && player.team == winner {
                self.stats.record_win(&player.name);
            } else {
                self.stats.record_loss(&player.name);
            }
        }

        info!(
            arena = %self.name,
            state = %inner.state,
            winner = ?winner,
            "match ended"
        );

        let epoch = inner.epoch;
        let weak = self.this.clone();
        tokio::spawn(async move {
            time::sleep(RESET_DELAY).await;
            if let Some(arena) = weak.upgrade() {
                arena.reset(epoch).await;
            }
        });
    }

    async fn reset(&self, epoch: u64) {
        let mut inner = self.inner.write().await;
        if inner.epoch != epoch || inner.state != ArenaState::Ending {
            debug!(arena = %self.name, "stale reset ignored");
            return;
        }

        for generator in inner.generators.values_mut() {
            generator.stop();
        }
        for player in inner.players.values() {
            player.teleport(self.config.lobby_spawn);
            player.send("§eThe arena has been reset.");
        }

        let teams = build_teams(&self.config);
        inner.generators = build_generators(&teams, &self.world);
        inner.teams = teams;
        inner.players.clear();
        inner.placed_blocks.clear();
        inner.transition(ArenaState::Waiting);
        inner.epoch += 1;

        info!(arena = %self.name, state = %inner.state, epoch = inner.epoch, "arena reset");
    }
}

impl std::fmt::Debug for Arena {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Arena")
            .field("name", &self.name)
            .field("world", &self.config.world)
            .finish_non_exhaustive()
    }
}

fn build_teams(config: &ArenaConfig) -> BTreeMap<TeamColor, Team> {
    config
        .teams
        .iter()
        .map(|(color, team)| (*color, Team::new(*color, team)))
        .collect()
}

fn build_generators(
    teams: &BTreeMap<TeamColor, Team>,
    world: &Arc<dyn World>,
) -> BTreeMap<TeamColor, Generator> {
    teams
        .values()
        .map(|t| {
            (
                t.color,
                Generator::new(t.generator, t.generator_kind, Arc::clone(world)),
            )
        })
        .collect()
}

/// The team with the fewest members; the first color wins a tie.
fn smallest_team(teams: &BTreeMap<TeamColor, Team>) -> Option<TeamColor> {
    teams
        .values()
        .min_by_key(|t| t.player_count())
        .map(|t| t.color)
}

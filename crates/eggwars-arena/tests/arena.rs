//! Integration tests for the arena state machine.
//!
//! Every test runs with `start_paused = true`: Tokio jumps the clock to
//! the next timer whenever all tasks are idle, so the 10 s countdown, 3 s
//! respawn and 10 s reset resolve instantly and in a fixed order.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use eggwars_arena::{
    Arena, ArenaConfig, ArenaError, ArenaState, ShopError, StatsRecorder,
    default_catalog,
};
use eggwars_generator::World;
use eggwars_protocol::{
    Balances, BlockPos, EntityHandle, ResourceKind, TeamColor, Vec3,
};
use eggwars_session::{PlayerData, PlayerOutbound};
use tokio::sync::mpsc;

// =========================================================================
// Helpers
// =========================================================================

#[derive(Default)]
struct RecordingWorld {
    spawns: Mutex<Vec<(Vec3, ResourceKind)>>,
}

impl RecordingWorld {
    fn count(&self) -> usize {
        self.spawns.lock().unwrap().len()
    }
}

impl World for RecordingWorld {
    fn spawn_resource(&self, position: Vec3, kind: ResourceKind, _count: u32) -> EntityHandle {
        let mut spawns = self.spawns.lock().unwrap();
        spawns.push((position, kind));
        EntityHandle(spawns.len() as u64)
    }
}

#[derive(Default)]
struct RecordingStats {
    events: Mutex<Vec<(&'static str, String)>>,
}

impl RecordingStats {
    fn events(&self) -> Vec<(&'static str, String)> {
        self.events.lock().unwrap().clone()
    }

    fn push(&self, event: &'static str, player: &str) {
        self.events.lock().unwrap().push((event, player.to_string()));
    }
}

impl StatsRecorder for RecordingStats {
    fn record_kill(&self, player: &str) {
        self.push("kill", player);
    }
    fn record_death(&self, player: &str) {
        self.push("death", player);
    }
    fn record_win(&self, player: &str) {
        self.push("win", player);
    }
    fn record_loss(&self, player: &str) {
        self.push("loss", player);
    }
}

type Outbox = mpsc::UnboundedReceiver<PlayerOutbound>;

const RED_SPAWN: Vec3 = Vec3::new(50.0, 100.0, 0.0);
const BLUE_SPAWN: Vec3 = Vec3::new(-50.0, 100.0, 0.0);
const LOBBY: Vec3 = Vec3::new(0.0, 100.0, 0.0);
const RED_EGG: BlockPos = BlockPos::new(45, 101, 0);
const BLUE_EGG: BlockPos = BlockPos::new(-45, 101, 0);

/// The default layout trimmed to Red and Blue.
fn two_teams() -> ArenaConfig {
    let mut config = ArenaConfig::default();
    config
        .teams
        .retain(|c, _| matches!(c, TeamColor::Red | TeamColor::Blue));
    config
}

struct Fixture {
    arena: Arc<Arena>,
    world: Arc<RecordingWorld>,
    stats: Arc<RecordingStats>,
}

fn fixture(config: ArenaConfig) -> Fixture {
    let world = Arc::new(RecordingWorld::default());
    let stats = Arc::new(RecordingStats::default());
    let arena = Arena::new(
        "default",
        config,
        world.clone(),
        stats.clone(),
        default_catalog(),
    );
    Fixture { arena, world, stats }
}

fn player(name: &str) -> (PlayerData, Outbox) {
    let (tx, rx) = mpsc::unbounded_channel();
    (PlayerData::new(name, tx), rx)
}

fn drain(rx: &mut Outbox) -> Vec<PlayerOutbound> {
    let mut out = Vec::new();
    while let Ok(msg) = rx.try_recv() {
        out.push(msg);
    }
    out
}

fn messages(outbound: &[PlayerOutbound]) -> Vec<String> {
    outbound
        .iter()
        .filter_map(|o| match o {
            PlayerOutbound::Message(text) => Some(text.clone()),
            _ => None,
        })
        .collect()
}

fn last_teleport(outbound: &[PlayerOutbound]) -> Option<Vec3> {
    outbound.iter().rev().find_map(|o| match o {
        PlayerOutbound::Teleport(pos) => Some(*pos),
        _ => None,
    })
}

fn count_containing(lines: &[String], needle: &str) -> usize {
    lines.iter().filter(|l| l.contains(needle)).count()
}

async fn sleep_ms(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

/// Joins alice (Red) and bob (Blue) and lets the countdown run out.
async fn started(f: &Fixture) -> (Outbox, Outbox) {
    let (alice, a_rx) = player("alice");
    let (bob, b_rx) = player("bob");
    f.arena.join(alice).await.expect("alice joins");
    f.arena.join(bob).await.expect("bob joins");
    sleep_ms(10_100).await;
    assert_eq!(f.arena.state().await, ArenaState::Playing);
    (a_rx, b_rx)
}

// =========================================================================
// Joining and the countdown
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_two_players_start_a_match() {
    let f = fixture(two_teams());
    let (alice, mut a_rx) = player("alice");
    let (bob, mut b_rx) = player("bob");

    assert_eq!(f.arena.join(alice).await.unwrap(), TeamColor::Red);
    assert_eq!(f.arena.state().await, ArenaState::Waiting);
    assert_eq!(f.arena.join(bob).await.unwrap(), TeamColor::Blue);
    assert_eq!(f.arena.state().await, ArenaState::Starting);

    let joined = drain(&mut a_rx);
    assert_eq!(last_teleport(&joined), Some(LOBBY));
    assert_eq!(
        count_containing(&messages(&joined), "Game starting in 10 seconds"),
        1
    );

    sleep_ms(9_900).await;
    assert_eq!(f.arena.state().await, ArenaState::Starting);
    sleep_ms(200).await;
    assert!(f.arena.is_playing().await);

    let a_out = drain(&mut a_rx);
    let b_out = drain(&mut b_rx);
    assert_eq!(last_teleport(&a_out), Some(RED_SPAWN));
    assert_eq!(last_teleport(&b_out), Some(BLUE_SPAWN));
    assert_eq!(count_containing(&messages(&b_out), "GAME STARTED"), 1);

    for name in ["alice", "bob"] {
        let pd = f.arena.player(name).await.unwrap();
        assert!(pd.alive);
        assert_eq!(pd.resources, Balances::zeroed());
    }
    assert_eq!(f.arena.generator_running(TeamColor::Red).await, Some(true));
    assert_eq!(f.arena.generator_running(TeamColor::Blue).await, Some(true));
}

#[tokio::test(start_paused = true)]
async fn test_generators_drop_at_team_anchors_once_playing() {
    let f = fixture(two_teams());
    let _outboxes = started(&f).await;
    assert_eq!(f.world.count(), 0, "generators were inert before the start");

    sleep_ms(2_000).await;

    let spawns = f.world.spawns.lock().unwrap().clone();
    assert_eq!(spawns.len(), 2);
    assert!(spawns.contains(&(Vec3::new(48.0, 100.0, 0.0), ResourceKind::Iron)));
    assert!(spawns.contains(&(Vec3::new(-48.0, 100.0, 0.0), ResourceKind::Iron)));
}

#[tokio::test(start_paused = true)]
async fn test_join_while_starting_keeps_original_countdown() {
    let f = fixture(ArenaConfig::default());
    let (alice, _a) = player("alice");
    let (bob, _b) = player("bob");
    let (carol, mut c_rx) = player("carol");
    f.arena.join(alice).await.unwrap();
    f.arena.join(bob).await.unwrap();

    sleep_ms(6_000).await;
    f.arena.join(carol).await.unwrap();
    assert_eq!(
        count_containing(&messages(&drain(&mut c_rx)), "Game starting"),
        0,
        "no second countdown"
    );

    sleep_ms(4_100).await;
    assert!(f.arena.is_playing().await);
}

#[tokio::test(start_paused = true)]
async fn test_leave_below_minimum_cancels_countdown() {
    let f = fixture(two_teams());
    let (alice, mut a_rx) = player("alice");
    let (bob, _b) = player("bob");
    f.arena.join(alice).await.unwrap();
    f.arena.join(bob).await.unwrap();

    sleep_ms(5_000).await;
    f.arena.leave("bob").await.expect("bob was a member");
    assert_eq!(f.arena.state().await, ArenaState::Waiting);

    sleep_ms(20_000).await;
    assert_eq!(f.arena.state().await, ArenaState::Waiting);
    assert_eq!(
        count_containing(&messages(&drain(&mut a_rx)), "Countdown cancelled"),
        1
    );
    assert_eq!(f.arena.generator_running(TeamColor::Red).await, Some(false));
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_countdown_does_not_fire_after_rejoin() {
    let f = fixture(two_teams());
    let (alice, _a) = player("alice");
    let (bob, _b) = player("bob");
    f.arena.join(alice).await.unwrap();
    f.arena.join(bob).await.unwrap();

    sleep_ms(5_000).await;
    let bob = f.arena.leave("bob").await.unwrap();
    sleep_ms(1_000).await;
    f.arena.join(bob).await.unwrap();
    assert_eq!(f.arena.state().await, ArenaState::Starting);

    // The first countdown would have fired at 10 s.
    sleep_ms(4_500).await;
    assert_eq!(f.arena.state().await, ArenaState::Starting);

    sleep_ms(5_600).await;
    assert!(f.arena.is_playing().await);
}

#[tokio::test(start_paused = true)]
async fn test_full_arena_rejects_and_returns_data() {
    let config = ArenaConfig { max_players: 2, ..two_teams() };
    let f = fixture(config);
    let (alice, _a) = player("alice");
    let (bob, _b) = player("bob");
    let (carol, _c) = player("carol");
    f.arena.join(alice).await.unwrap();
    f.arena.join(bob).await.unwrap();

    let rejected = f.arena.join(carol).await.unwrap_err();

    assert_eq!(rejected.reason, ArenaError::Full("default".into()));
    assert_eq!(rejected.data.name, "carol");
    assert!(!rejected.data.is_attached());
    assert_eq!(f.arena.player_count().await, 2);
}

#[tokio::test(start_paused = true)]
async fn test_join_twice_is_rejected() {
    let f = fixture(two_teams());
    let (alice, _a) = player("alice");
    let (alice_again, _a2) = player("alice");
    f.arena.join(alice).await.unwrap();

    let rejected = f.arena.join(alice_again).await.unwrap_err();

    assert_eq!(
        rejected.reason,
        ArenaError::AlreadyMember("alice".into(), "default".into())
    );
    assert_eq!(f.arena.player_count().await, 1);
}

#[tokio::test(start_paused = true)]
async fn test_join_during_match_is_rejected() {
    let f = fixture(two_teams());
    let _outboxes = started(&f).await;
    let (carol, _c) = player("carol");

    let rejected = f.arena.join(carol).await.unwrap_err();

    assert_eq!(
        rejected.reason,
        ArenaError::NotJoinable("default".into(), ArenaState::Playing)
    );
}

#[tokio::test(start_paused = true)]
async fn test_arena_without_teams_rejects_joins() {
    let config = ArenaConfig { teams: Default::default(), ..ArenaConfig::default() };
    let f = fixture(config);
    let (alice, _a) = player("alice");

    let rejected = f.arena.join(alice).await.unwrap_err();

    assert_eq!(rejected.reason, ArenaError::NoTeams("default".into()));
}

#[tokio::test(start_paused = true)]
async fn test_team_assignment_balances_in_color_order() {
    let config = ArenaConfig { min_players: 8, ..ArenaConfig::default() };
    let f = fixture(config);

    let mut assigned = Vec::new();
    for name in ["p1", "p2", "p3", "p4", "p5", "p6"] {
        let (pd, _rx) = player(name);
        assigned.push(f.arena.join(pd).await.unwrap());
    }

    use TeamColor::*;
    assert_eq!(assigned, vec![Red, Blue, Green, Yellow, Red, Blue]);
    assert_eq!(f.arena.team(Red).await.unwrap().players(), &["p1".to_string(), "p5".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn test_player_count_never_exceeds_max() {
    let config = ArenaConfig { max_players: 3, min_players: 3, ..ArenaConfig::default() };
    let f = fixture(config);

    for i in 0..10 {
        let (pd, _rx) = player(&format!("p{i}"));
        let _ = f.arena.join(pd).await;
        assert!(f.arena.player_count().await <= 3);
    }
    assert_eq!(f.arena.player_count().await, 3);
}

// =========================================================================
// Leaving
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_leave_non_member_is_noop() {
    let f = fixture(two_teams());
    assert!(f.arena.leave("ghost").await.is_none());
    assert_eq!(f.arena.state().await, ArenaState::Waiting);
}

#[tokio::test(start_paused = true)]
async fn test_leave_returns_detached_data_and_updates_roster() {
    let f = fixture(two_teams());
    let (alice, _a) = player("alice");
    let (bob, mut b_rx) = player("bob");
    f.arena.join(alice).await.unwrap();
    f.arena.join(bob).await.unwrap();

    let data = f.arena.leave("alice").await.unwrap();

    assert_eq!(data.name, "alice");
    assert!(!data.is_attached());
    assert!(data.team.is_none());
    assert!(!f.arena.team(TeamColor::Red).await.unwrap().has_player("alice"));
    assert_eq!(
        count_containing(&messages(&drain(&mut b_rx)), "alice left the game"),
        1
    );
}

// =========================================================================
// Eggs and blocks
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_breaking_enemy_egg_destroys_it_once() {
    let f = fixture(two_teams());
    let (mut a_rx, _b) = started(&f).await;
    drain(&mut a_rx);

    assert!(f.arena.can_break_block("bob", RED_EGG).await);
    assert!(f.arena.can_break_block("bob", RED_EGG).await, "already destroyed stays breakable");

    assert!(!f.arena.team(TeamColor::Red).await.unwrap().egg_alive);
    assert_eq!(
        count_containing(&messages(&drain(&mut a_rx)), "egg was destroyed"),
        1,
        "no second destruction broadcast"
    );
    assert!(f.arena.is_playing().await, "red still has alice");
}

#[tokio::test(start_paused = true)]
async fn test_own_egg_is_protected() {
    let f = fixture(two_teams());
    let _outboxes = started(&f).await;

    assert!(!f.arena.can_break_block("alice", RED_EGG).await);
    assert!(f.arena.team(TeamColor::Red).await.unwrap().egg_alive);
}

#[tokio::test(start_paused = true)]
async fn test_terrain_protected_but_placed_blocks_breakable() {
    let f = fixture(two_teams());
    let _outboxes = started(&f).await;
    let pos = BlockPos::new(10, 100, 10);

    assert!(!f.arena.can_break_block("alice", pos).await);
    f.arena.track_placed_block(pos).await;
    assert!(f.arena.can_break_block("alice", pos).await);
    assert!(f.arena.can_break_block("bob", pos).await);
}

#[tokio::test(start_paused = true)]
async fn test_placed_blocks_not_tracked_outside_match() {
    let f = fixture(two_teams());
    let (alice, _a) = player("alice");
    f.arena.join(alice).await.unwrap();
    let pos = BlockPos::new(1, 100, 1);

    f.arena.track_placed_block(pos).await;

    assert!(!f.arena.is_placed_block(pos).await);
    assert!(!f.arena.can_break_block("alice", pos).await);
}

#[tokio::test(start_paused = true)]
async fn test_non_member_cannot_break_anything() {
    let f = fixture(two_teams());
    let _outboxes = started(&f).await;
    let pos = BlockPos::new(3, 100, 3);
    f.arena.track_placed_block(pos).await;

    assert!(!f.arena.can_break_block("mallory", RED_EGG).await);
    assert!(!f.arena.can_break_block("mallory", pos).await);
    assert!(f.arena.team(TeamColor::Red).await.unwrap().egg_alive);
}

// =========================================================================
// Deaths, elimination and the win condition
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_egg_destroyed_then_last_member_leaves_ends_match() {
    let f = fixture(two_teams());
    let (_a, mut b_rx) = started(&f).await;

    assert!(f.arena.can_break_block("bob", RED_EGG).await);
    f.arena.leave("alice").await.unwrap();

    assert_eq!(f.arena.state().await, ArenaState::Ending);
    let lines = messages(&drain(&mut b_rx));
    assert_eq!(count_containing(&lines, "Team Blue wins!"), 1);
    assert_eq!(f.arena.generator_running(TeamColor::Red).await, Some(false));
    assert_eq!(f.arena.generator_running(TeamColor::Blue).await, Some(false));
    assert!(f.stats.events().contains(&("win", "bob".to_string())));
}

#[tokio::test(start_paused = true)]
async fn test_death_with_egg_respawns_after_delay() {
    let f = fixture(two_teams());
    let (mut a_rx, _b) = started(&f).await;
    drain(&mut a_rx);

    f.arena.handle_player_death("alice", Some("bob")).await;

    let pd = f.arena.player("alice").await.unwrap();
    assert_eq!(pd.deaths, 1);
    assert!(!pd.alive);
    assert_eq!(f.arena.player("bob").await.unwrap().kills, 1);

    sleep_ms(2_900).await;
    assert!(!f.arena.player("alice").await.unwrap().alive);
    sleep_ms(200).await;

    assert!(f.arena.player("alice").await.unwrap().alive);
    let out = drain(&mut a_rx);
    assert_eq!(last_teleport(&out), Some(RED_SPAWN));
    assert_eq!(count_containing(&messages(&out), "You respawned"), 1);
    assert!(f.arena.is_playing().await);
    assert_eq!(
        f.stats.events(),
        vec![("death", "alice".to_string()), ("kill", "bob".to_string())]
    );
}

#[tokio::test(start_paused = true)]
async fn test_death_without_egg_eliminates_and_ends_immediately() {
    let f = fixture(two_teams());
    let (_a, mut b_rx) = started(&f).await;
    assert!(f.arena.can_break_block("bob", RED_EGG).await);
    drain(&mut b_rx);

    f.arena.handle_player_death("alice", Some("bob")).await;

    // No sleep: the win check ran inside the death handler.
    assert_eq!(f.arena.state().await, ArenaState::Ending);
    let alice = f.arena.player("alice").await.unwrap();
    assert!(!alice.alive);
    let red = f.arena.team(TeamColor::Red).await.unwrap();
    assert!(red.is_eliminated("alice"));
    assert!(red.has_player("alice"));

    let lines = messages(&drain(&mut b_rx));
    assert_eq!(count_containing(&lines, "alice§f was eliminated"), 1);
    assert_eq!(count_containing(&lines, "Team Blue wins!"), 1);

    let events = f.stats.events();
    assert!(events.contains(&("win", "bob".to_string())));
    assert!(events.contains(&("loss", "alice".to_string())));
}

#[tokio::test(start_paused = true)]
async fn test_elimination_with_teammate_left_keeps_playing() {
    let f = fixture(ArenaConfig { min_players: 3, ..two_teams() });
    let (alice, _a) = player("alice");
    let (bob, _b) = player("bob");
    let (carol, _c) = player("carol");
    f.arena.join(alice).await.unwrap();
    f.arena.join(bob).await.unwrap();
    assert_eq!(f.arena.join(carol).await.unwrap(), TeamColor::Red);
    sleep_ms(10_100).await;

    assert!(f.arena.can_break_block("bob", RED_EGG).await);
    f.arena.handle_player_death("alice", None).await;
    assert!(f.arena.is_playing().await, "carol still stands for red");

    f.arena.handle_player_death("carol", None).await;
    assert_eq!(f.arena.state().await, ArenaState::Ending);
}

#[tokio::test(start_paused = true)]
async fn test_breaking_last_standing_egg_ends_match() {
    let f = fixture(ArenaConfig::default());
    let _outboxes = started(&f).await;

    // Blue is empty now, but its egg keeps it in the game, as do the
    // eggs of the teams nobody joined.
    f.arena.leave("bob").await.unwrap();
    assert!(f.arena.is_playing().await);

    assert!(f.arena.can_break_block("alice", BLUE_EGG).await);
    assert!(f.arena.can_break_block("alice", BlockPos::new(0, 101, 45)).await);
    assert!(f.arena.is_playing().await, "yellow's egg still stands");

    assert!(f.arena.can_break_block("alice", BlockPos::new(0, 101, -45)).await);
    assert_eq!(f.arena.state().await, ArenaState::Ending);
}

#[tokio::test(start_paused = true)]
async fn test_leave_outside_match_never_ends_it() {
    let f = fixture(two_teams());
    let (alice, _a) = player("alice");
    f.arena.join(alice).await.unwrap();

    f.arena.leave("alice").await.unwrap();

    assert_eq!(f.arena.state().await, ArenaState::Waiting);
}

#[tokio::test(start_paused = true)]
async fn test_death_outside_match_is_ignored() {
    let f = fixture(two_teams());
    let (alice, _a) = player("alice");
    f.arena.join(alice).await.unwrap();

    f.arena.handle_player_death("alice", None).await;

    assert_eq!(f.arena.player("alice").await.unwrap().deaths, 0);
    assert!(f.stats.events().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_respawn_after_match_end_is_noop() {
    let f = fixture(two_teams());
    let (mut a_rx, _b) = started(&f).await;

    f.arena.handle_player_death("alice", None).await;
    assert!(f.arena.can_break_block("alice", BLUE_EGG).await);
    f.arena.leave("bob").await.unwrap();
    assert_eq!(f.arena.state().await, ArenaState::Ending);
    drain(&mut a_rx);

    sleep_ms(3_100).await;

    assert!(!f.arena.player("alice").await.unwrap().alive);
    assert_eq!(count_containing(&messages(&drain(&mut a_rx)), "You respawned"), 0);
}

#[tokio::test(start_paused = true)]
async fn test_respawn_after_leaving_is_noop() {
    let f = fixture(ArenaConfig { min_players: 2, ..ArenaConfig::default() });
    let (mut a_rx, _b) = started(&f).await;

    f.arena.handle_player_death("alice", None).await;
    f.arena.leave("alice").await.unwrap();
    drain(&mut a_rx);

    sleep_ms(3_100).await;

    assert!(drain(&mut a_rx).is_empty());
    assert!(f.arena.player("alice").await.is_none());
}

// =========================================================================
// Reset
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_reset_restores_fresh_arena() {
    let f = fixture(two_teams());
    let (_a, mut b_rx) = started(&f).await;
    let placed = BlockPos::new(5, 100, 5);
    f.arena.track_placed_block(placed).await;
    assert!(f.arena.can_break_block("bob", RED_EGG).await);
    f.arena.leave("alice").await.unwrap();
    assert_eq!(f.arena.state().await, ArenaState::Ending);
    let spawned_at_end = f.world.count();
    drain(&mut b_rx);

    sleep_ms(9_900).await;
    assert_eq!(f.arena.state().await, ArenaState::Ending);
    sleep_ms(200).await;

    assert_eq!(f.arena.state().await, ArenaState::Waiting);
    assert_eq!(f.arena.player_count().await, 0);
    assert!(!f.arena.is_placed_block(placed).await);
    for team in f.arena.teams().await {
        assert!(team.egg_alive);
        assert_eq!(team.player_count(), 0);
        assert_eq!(f.arena.generator_running(team.color).await, Some(false));
    }
    assert_eq!(f.world.count(), spawned_at_end, "nothing spawned after the end");
    assert_eq!(last_teleport(&drain(&mut b_rx)), Some(LOBBY));
}

#[tokio::test(start_paused = true)]
async fn test_arena_plays_again_after_reset() {
    let f = fixture(two_teams());
    let _first = started(&f).await;
    assert!(f.arena.can_break_block("bob", RED_EGG).await);
    f.arena.leave("alice").await.unwrap();
    sleep_ms(10_100).await;
    assert_eq!(f.arena.state().await, ArenaState::Waiting);

    let _second = started(&f).await;

    assert_eq!(f.arena.generator_running(TeamColor::Red).await, Some(true));
    assert!(f.arena.team(TeamColor::Red).await.unwrap().egg_alive);
}

#[tokio::test(start_paused = true)]
async fn test_ending_rejects_joins() {
    let f = fixture(two_teams());
    let _outboxes = started(&f).await;
    assert!(f.arena.can_break_block("bob", RED_EGG).await);
    f.arena.leave("alice").await.unwrap();
    let (carol, _c) = player("carol");

    let rejected = f.arena.join(carol).await.unwrap_err();

    assert_eq!(
        rejected.reason,
        ArenaError::NotJoinable("default".into(), ArenaState::Ending)
    );
}

// =========================================================================
// Resources and shop
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_purchase_debits_when_affordable() {
    let f = fixture(two_teams());
    let (mut a_rx, _b) = started(&f).await;
    assert!(f.arena.collect_resource("alice", ResourceKind::Iron, 12).await);
    drain(&mut a_rx);

    let bought = f.arena.purchase("alice", 0).await.unwrap();

    assert_eq!(bought.name, "Iron Helmet");
    let pd = f.arena.player("alice").await.unwrap();
    assert_eq!(pd.resources.get(ResourceKind::Iron), 2);
    assert_eq!(
        count_containing(&messages(&drain(&mut a_rx)), "Purchased Iron Helmet"),
        1
    );
}

#[tokio::test(start_paused = true)]
async fn test_purchase_shortfall_leaves_balances_unchanged() {
    let f = fixture(two_teams());
    let (mut a_rx, _b) = started(&f).await;
    f.arena.collect_resource("alice", ResourceKind::Iron, 4).await;
    f.arena.collect_resource("alice", ResourceKind::Gold, 5).await;
    drain(&mut a_rx);

    let err = f.arena.purchase("alice", 2).await.unwrap_err();

    match &err {
        ShopError::Insufficient { offer, shortfalls } => {
            assert_eq!(offer, "Shield");
            assert_eq!(shortfalls.len(), 1);
            assert_eq!(shortfalls[0].kind, ResourceKind::Iron);
            assert_eq!((shortfalls[0].needed, shortfalls[0].have), (10, 4));
        }
        other => panic!("expected Insufficient, got {other:?}"),
    }
    let pd = f.arena.player("alice").await.unwrap();
    assert_eq!(pd.resources.get(ResourceKind::Iron), 4);
    assert_eq!(pd.resources.get(ResourceKind::Gold), 5);
    assert_eq!(
        count_containing(&messages(&drain(&mut a_rx)), "Iron (need 10, have 4)"),
        1
    );
}

#[tokio::test(start_paused = true)]
async fn test_purchase_by_non_member_or_bad_index() {
    let f = fixture(two_teams());
    let _outboxes = started(&f).await;

    assert_eq!(
        f.arena.purchase("mallory", 0).await.unwrap_err(),
        ShopError::NotMember("mallory".into())
    );
    assert_eq!(
        f.arena.purchase("alice", 9).await.unwrap_err(),
        ShopError::UnknownOffer(9)
    );
}

#[tokio::test(start_paused = true)]
async fn test_open_shop_presents_balances_and_catalog() {
    let f = fixture(two_teams());
    let (mut a_rx, _b) = started(&f).await;
    f.arena.collect_resource("alice", ResourceKind::Diamond, 1).await;
    drain(&mut a_rx);

    f.arena.open_shop("alice").await.unwrap();

    match drain(&mut a_rx).pop() {
        Some(PlayerOutbound::ShopMenu { balances, offers }) => {
            assert_eq!(balances.get(ResourceKind::Diamond), 1);
            assert_eq!(offers, default_catalog());
        }
        other => panic!("expected ShopMenu, got {other:?}"),
    }
    assert!(matches!(
        f.arena.open_shop("mallory").await,
        Err(ShopError::NotMember(_))
    ));
}

#[tokio::test(start_paused = true)]
async fn test_resources_only_collected_during_match() {
    let f = fixture(two_teams());
    let (alice, _a) = player("alice");
    f.arena.join(alice).await.unwrap();

    assert!(!f.arena.collect_resource("alice", ResourceKind::Iron, 5).await);
    assert_eq!(
        f.arena.player("alice").await.unwrap().resources.get(ResourceKind::Iron),
        0
    );
}

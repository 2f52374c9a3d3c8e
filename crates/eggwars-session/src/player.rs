//! Per-player match data and the outbound channel to the player.
//!
//! The core never holds an engine player object. It holds a
//! [`PlayerSender`] and pushes [`PlayerOutbound`] values into it; the
//! engine adapter on the other end turns them into chat lines, teleports
//! and shop forms.

use eggwars_protocol::{Balances, ShopOffer, TeamColor, Vec3};
use tokio::sync::mpsc;

// ---------------------------------------------------------------------------
// Outbound channel
// ---------------------------------------------------------------------------

/// Something the core asks the engine to do for one player.
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerOutbound {
    /// A chat line. May contain `§` color codes.
    Message(String),
    /// Move the player to a world position.
    Teleport(Vec3),
    /// Show the shop: the player's balances and the numbered catalog.
    /// The engine answers with the selected index, if any.
    ShopMenu {
        balances: Balances,
        offers: Vec<ShopOffer>,
    },
}

/// Channel sender for delivering outbound actions to a player.
///
/// Unbounded: sends never block, so arena code can push messages while
/// holding its lock.
pub type PlayerSender = mpsc::UnboundedSender<PlayerOutbound>;

// ---------------------------------------------------------------------------
// PlayerData
// ---------------------------------------------------------------------------

/// A player's match record.
///
/// Created when the player connects. While the player is in an arena the
/// arena owns this value; otherwise the player's [`Session`](crate::Session)
/// holds it.
#[derive(Debug, Clone)]
pub struct PlayerData {
    pub name: String,
    pub sender: PlayerSender,
    /// Name of the arena holding this player, if any.
    pub arena: Option<String>,
    pub team: Option<TeamColor>,
    pub alive: bool,
    pub kills: u32,
    pub deaths: u32,
    pub resources: Balances,
}

impl PlayerData {
    /// A fresh, detached record.
    pub fn new(name: impl Into<String>, sender: PlayerSender) -> Self {
        Self {
            name: name.into(),
            sender,
            arena: None,
            team: None,
            alive: false,
            kills: 0,
            deaths: 0,
            resources: Balances::default(),
        }
    }

    /// Binds the record to an arena team for a new match.
    ///
    /// Counters reset and the player is alive. Balances carry over unless
    /// the record never had any, in which case every kind starts at zero.
    pub fn attach(&mut self, arena: &str, team: TeamColor) {
        self.arena = Some(arena.to_string());
        self.team = Some(team);
        self.alive = true;
        self.kills = 0;
        self.deaths = 0;
        if self.resources == Balances::default() {
            self.resources = Balances::zeroed();
        }
    }

    /// Clears the arena and team references.
    pub fn detach(&mut self) {
        self.arena = None;
        self.team = None;
        self.alive = false;
    }

    pub fn is_attached(&self) -> bool {
        self.arena.is_some()
    }

    /// Sends a chat line. A closed channel means the player is gone; the
    /// line is dropped.
    pub fn send(&self, text: impl Into<String>) {
        let _ = self.sender.send(PlayerOutbound::Message(text.into()));
    }

    pub fn teleport(&self, position: Vec3) {
        let _ = self.sender.send(PlayerOutbound::Teleport(position));
    }

    /// Presents the shop with the player's current balances.
    pub fn present_shop(&self, offers: &[ShopOffer]) {
        let _ = self.sender.send(PlayerOutbound::ShopMenu {
            balances: self.resources.clone(),
            offers: offers.to_vec(),
        });
    }
}

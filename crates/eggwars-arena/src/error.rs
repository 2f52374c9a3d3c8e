//! Error types for the arena layer.

use eggwars_protocol::Shortfall;
use eggwars_session::PlayerData;

use crate::ArenaState;

/// Errors that can occur during arena operations.
///
/// All of these are user-scoped: the game manager turns them into a chat
/// line for the player who asked.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ArenaError {
    /// No arena with this name exists.
    #[error("arena {0} not found")]
    NotFound(String),

    /// The arena is full: no more player slots available.
    #[error("arena {0} is full")]
    Full(String),

    /// The arena is mid-match or resetting.
    #[error("arena {0} is not accepting players ({1})")]
    NotJoinable(String, ArenaState),

    /// The player is already in this arena.
    #[error("player {0} already in arena {1}")]
    AlreadyMember(String, String),

    /// The arena was configured without any team.
    #[error("arena {0} has no teams")]
    NoTeams(String),
}

/// A refused join. Carries the player's data back to the caller
/// untouched.
#[derive(Debug, thiserror::Error)]
#[error("{reason}")]
pub struct JoinRejected {
    pub reason: ArenaError,
    pub data: PlayerData,
}

/// Errors from a shop purchase.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ShopError {
    /// The buyer is not a member of the arena.
    #[error("player {0} is not in an arena")]
    NotMember(String),

    /// The selected index is outside the catalog.
    #[error("no shop offer #{0}")]
    UnknownOffer(usize),

    /// The buyer can't afford the offer. Balances are untouched.
    #[error("not enough resources for {offer}: {}", list_shortfalls(.shortfalls))]
    Insufficient {
        offer: String,
        shortfalls: Vec<Shortfall>,
    },
}

fn list_shortfalls(shortfalls: &[Shortfall]) -> String {
    shortfalls
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

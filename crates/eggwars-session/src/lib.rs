//! Player sessions for EggWars.
//!
//! This crate knows who is connected and owns each player's match record
//! while they are outside an arena:
//!
//! 1. **Outbound channel**: how the core talks to a player
//!    ([`PlayerSender`], [`PlayerOutbound`])
//! 2. **Player data**: team, counters and resource balances ([`PlayerData`])
//! 3. **Session tracking**: the connected-player registry
//!    ([`SessionManager`])
//!
//! # How it fits in the stack
//!
//! ```text
//! Arena Layer (above)  ← takes PlayerData on join, hands it back on leave
//!     ↕
//! Session Layer (this crate)  ← player identity and outbound channel
//!     ↕
//! Protocol Layer (below)  ← TeamColor, Balances, Vec3
//! ```

mod error;
mod manager;
mod player;

pub use error::SessionError;
pub use manager::{Session, SessionManager};
pub use player::{PlayerData, PlayerOutbound, PlayerSender};

//! Unified error type for EggWars.

use eggwars_arena::{ArenaError, ShopError};
use eggwars_protocol::ProtocolError;
use eggwars_session::SessionError;

use crate::command::CommandError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant auto-generates `From` impls,
/// so the `?` operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum EggwarsError {
    /// Encoding or decoding persisted data failed.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Unknown player or duplicate connection.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// Arena not found, full, wrong state, not a member.
    #[error(transparent)]
    Arena(#[from] ArenaError),

    /// A purchase that couldn't go through.
    #[error(transparent)]
    Shop(#[from] ShopError),

    /// A chat command that couldn't be parsed.
    #[error(transparent)]
    Command(#[from] CommandError),

    /// Reading or writing a config or stats file failed.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

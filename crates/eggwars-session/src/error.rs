//! Error types for the session layer.

/// Errors that can occur during session management.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// No session exists for the given player name.
    /// This happens when an event arrives for a player who never
    /// connected (or already disconnected).
    #[error("no session for player {0}")]
    NotFound(String),

    /// A player with this name is already connected.
    /// Names are the identity key, so two live sessions can't share one.
    #[error("player {0} is already connected")]
    AlreadyConnected(String),
}

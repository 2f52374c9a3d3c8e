//! The session manager: tracks every connected player.
//!
//! A [`Session`] lives from connect to disconnect. While the player is in
//! the lobby the session holds their [`PlayerData`]; when they join an
//! arena the data moves into the arena and the session only remembers the
//! arena's name.
//!
//! ```text
//! connect() ──→ [holding data] ──take_data()──→ [in arena]
//!                     ↑                              │
//!                     └────────restore()─────────────┘
//!                                                    │
//!                 disconnect() ←─────────────────────┘
//! ```
//!
//! # Concurrency note
//!
//! `SessionManager` is a plain `HashMap`. The game manager owns it behind
//! a mutex; nothing in here locks.

use std::collections::HashMap;

use crate::{PlayerData, PlayerSender, SessionError};

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// One connected player.
#[derive(Debug)]
pub struct Session {
    name: String,
    sender: PlayerSender,
    /// Present while the player is outside any arena.
    data: Option<PlayerData>,
    /// The arena currently holding this player's data.
    arena: Option<String>,
}

impl Session {
    fn new(name: &str, sender: PlayerSender) -> Self {
        Self {
            name: name.to_string(),
            data: Some(PlayerData::new(name, sender.clone())),
            sender,
            arena: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sender(&self) -> &PlayerSender {
        &self.sender
    }

    /// Name of the arena this player joined, if any.
    pub fn arena(&self) -> Option<&str> {
        self.arena.as_deref()
    }

    /// Sends a chat line to this player.
    pub fn send(&self, text: impl Into<String>) {
        let _ = self
            .sender
            .send(crate::PlayerOutbound::Message(text.into()));
    }

    /// Takes the player's data to hand to an arena.
    ///
    /// Returns a fresh record if the data was lost (the arena was reset
    /// while holding it).
    pub fn take_data(&mut self) -> PlayerData {
        self.data
            .take()
            .unwrap_or_else(|| PlayerData::new(&self.name, self.sender.clone()))
    }

    /// Records that `arena` now holds this player's data.
    pub fn enter(&mut self, arena: &str) {
        self.arena = Some(arena.to_string());
        self.data = None;
    }

    /// Takes data back from an arena (or from a rejected join).
    ///
    /// `None` means the arena no longer had it; a fresh record replaces
    /// it so the player can join again.
    pub fn restore(&mut self, data: Option<PlayerData>) {
        let mut data = data
            .unwrap_or_else(|| PlayerData::new(&self.name, self.sender.clone()));
        data.detach();
        self.data = Some(data);
        self.arena = None;
    }

    /// The held data, if the player is in the lobby.
    pub fn data(&self) -> Option<&PlayerData> {
        self.data.as_ref()
    }
}

// ---------------------------------------------------------------------------
// SessionManager
// ---------------------------------------------------------------------------

/// Registry of connected players, keyed by name.
#[derive(Debug, Default)]
pub struct SessionManager {
    sessions: HashMap<String, Session>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a newly connected player.
    ///
    /// # Errors
    /// Returns [`SessionError::AlreadyConnected`] if the name is taken.
    pub fn connect(
        &mut self,
        name: &str,
        sender: PlayerSender,
    ) -> Result<&mut Session, SessionError> {
        if self.sessions.contains_key(name) {
            return Err(SessionError::AlreadyConnected(name.to_string()));
        }

        tracing::info!(player = %name, "session created");

        Ok(self
            .sessions
            .entry(name.to_string())
            .or_insert_with(|| Session::new(name, sender)))
    }

    /// Removes a player's session, returning it so the caller can pull
    /// them out of their arena first.
    ///
    /// # Errors
    /// Returns [`SessionError::NotFound`] if no session exists.
    pub fn disconnect(&mut self, name: &str) -> Result<Session, SessionError> {
        let session = self
            .sessions
            .remove(name)
            .ok_or_else(|| SessionError::NotFound(name.to_string()))?;

        tracing::info!(player = %name, "session removed");
        Ok(session)
    }

    pub fn get(&self, name: &str) -> Option<&Session> {
        self.sessions.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Session> {
        self.sessions.get_mut(name)
    }

    /// Like [`get_mut`](Self::get_mut) but as a `Result`, for the `?`
    /// operator.
    pub fn require_mut(
        &mut self,
        name: &str,
    ) -> Result<&mut Session, SessionError> {
        self.sessions
            .get_mut(name)
            .ok_or_else(|| SessionError::NotFound(name.to_string()))
    }

    pub fn is_connected(&self, name: &str) -> bool {
        self.sessions.contains_key(name)
    }

    /// Number of connected players.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

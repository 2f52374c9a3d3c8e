//! Teams: color, map layout, egg state and roster.
//!
//! A [`Team`] has no locking of its own. It lives inside the arena's
//! locked state and is only touched while that lock is held.

use std::collections::BTreeSet;

use eggwars_protocol::{BlockPos, ResourceKind, TeamColor, Vec3};

use crate::TeamConfig;

#[derive(Debug, Clone, PartialEq)]
pub struct Team {
    pub color: TeamColor,
    pub spawn: Vec3,
    pub egg: BlockPos,
    /// Starts `true`; only a reset (which rebuilds the team) brings it back.
    pub egg_alive: bool,
    pub generator: Vec3,
    pub generator_kind: ResourceKind,
    /// Member names in join order.
    players: Vec<String>,
    /// Members who died without an egg. They stay on the roster.
    eliminated: BTreeSet<String>,
}

impl Team {
    pub fn new(color: TeamColor, config: &TeamConfig) -> Self {
        Self {
            color,
            spawn: config.spawn,
            egg: config.egg,
            egg_alive: true,
            generator: config.generator,
            generator_kind: config.generator_kind,
            players: Vec::new(),
            eliminated: BTreeSet::new(),
        }
    }

    /// "Red", "Blue", ...
    pub fn display_name(&self) -> &'static str {
        self.color.display_name()
    }

    /// Chat color code prefix.
    pub fn chat_tag(&self) -> &'static str {
        self.color.chat_tag()
    }

    pub fn add_player(&mut self, name: &str) {
        if !self.has_player(name) {
            self.players.push(name.to_string());
        }
    }

    pub fn remove_player(&mut self, name: &str) {
        self.players.retain(|p| p != name);
        self.eliminated.remove(name);
    }

    pub fn has_player(&self, name: &str) -> bool {
        self.players.iter().any(|p| p == name)
    }

    pub fn players(&self) -> &[String] {
        &self.players
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    /// Marks a member as out for the rest of the match.
    pub fn eliminate(&mut self, name: &str) {
        if self.has_player(name) {
            self.eliminated.insert(name.to_string());
        }
    }

    pub fn is_eliminated(&self, name: &str) -> bool {
        self.eliminated.contains(name)
    }

    /// Still in the match: the egg stands, or someone on the roster
    /// hasn't been eliminated.
    pub fn is_alive(&self) -> bool {
        self.egg_alive
            || self.players.iter().any(|p| !self.eliminated.contains(p))
    }

    /// Destroys the egg. Returns `false` if it was already gone.
    pub fn break_egg(&mut self) -> bool {
        std::mem::replace(&mut self.egg_alive, false)
    }
}

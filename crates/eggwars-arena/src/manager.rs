//! Arena manager: owns the configured arenas and looks them up by name.
//!
//! Arenas are created once at startup and live for the whole process;
//! a finished match resets its arena in place instead of replacing it.

use std::collections::BTreeMap;
use std::sync::Arc;

use eggwars_generator::World;
use eggwars_protocol::ShopOffer;

use crate::{Arena, ArenaConfig, ArenaError, ArenaInfo, StatsRecorder};

/// Every arena on the server, keyed (and listed) by name.
#[derive(Debug, Default)]
pub struct ArenaManager {
    arenas: BTreeMap<String, Arc<Arena>>,
}

impl ArenaManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds one arena per configuration entry, all sharing the same
    /// world, stats recorder and shop catalog.
    pub fn from_configs(
        configs: impl IntoIterator<Item = (String, ArenaConfig)>,
        world: Arc<dyn World>,
        stats: Arc<dyn StatsRecorder>,
        shop: Vec<ShopOffer>,
    ) -> Self {
        let mut manager = Self::new();
        for (name, config) in configs {
            manager.create(
                name,
                config,
                Arc::clone(&world),
                Arc::clone(&stats),
                shop.clone(),
            );
        }
        manager
    }

    /// Creates an arena and registers it. An existing arena with the same
    /// name is replaced.
    pub fn create(
        &mut self,
        name: impl Into<String>,
        config: ArenaConfig,
        world: Arc<dyn World>,
        stats: Arc<dyn StatsRecorder>,
        shop: Vec<ShopOffer>,
    ) -> Arc<Arena> {
        let arena = Arena::new(name, config, world, stats, shop);
        if self
            .arenas
            .insert(arena.name().to_string(), Arc::clone(&arena))
            .is_some()
        {
            tracing::warn!(arena = %arena.name(), "arena replaced");
        }
        arena
    }

    /// Looks up an arena by name.
    ///
    /// # Errors
    /// Returns [`ArenaError::NotFound`] if no arena has that name.
    pub fn get(&self, name: &str) -> Result<Arc<Arena>, ArenaError> {
        self.arenas
            .get(name)
            .cloned()
            .ok_or_else(|| ArenaError::NotFound(name.to_string()))
    }

    /// Snapshot of every arena, sorted by name.
    pub async fn list(&self) -> Vec<ArenaInfo> {
        let mut infos = Vec::with_capacity(self.arenas.len());
        for arena in self.arenas.values() {
            infos.push(arena.info().await);
        }
        infos
    }

    pub fn names(&self) -> Vec<String> {
        self.arenas.keys().cloned().collect()
    }

    pub fn arena_count(&self) -> usize {
        self.arenas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arenas.is_empty()
    }
}

//! Server configuration: the arenas to host and the shop catalog.
//!
//! Stored as pretty JSON. A missing file is written out with the defaults
//! so operators have something to edit.

use std::collections::BTreeMap;
use std::path::Path;

use eggwars_arena::{ArenaConfig, default_catalog};
use eggwars_protocol::{Codec, JsonCodec, ShopOffer};
use serde::{Deserialize, Serialize};

use crate::EggwarsError;

/// Top-level configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub arenas: BTreeMap<String, ArenaConfig>,
    pub shop: Vec<ShopOffer>,
}

impl Default for GameConfig {
    fn default() -> Self {
        let mut arenas = BTreeMap::new();
        arenas.insert("default".to_string(), ArenaConfig::default());
        arenas.insert("islands".to_string(), ArenaConfig::islands());
        Self {
            arenas,
            shop: default_catalog(),
        }
    }
}

impl GameConfig {
    /// Arena configs with player limits clamped into range.
    pub fn validated_arenas(&self) -> impl Iterator<Item = (String, ArenaConfig)> + '_ {
        self.arenas
            .iter()
            .map(|(name, config)| (name.clone(), config.clone().validated()))
    }
}

/// Reads the config at `path`, or writes and returns the defaults if the
/// file doesn't exist.
///
/// # Errors
/// Returns [`EggwarsError::Io`] if the file can't be read or created, or
/// [`EggwarsError::Protocol`] if its contents aren't a valid config.
pub fn load_or_create(path: impl AsRef<Path>) -> Result<GameConfig, EggwarsError> {
    let path = path.as_ref();
    match std::fs::read(path) {
        Ok(bytes) => {
            let config: GameConfig = JsonCodec.decode(&bytes)?;
            tracing::info!(
                path = %path.display(),
                arenas = config.arenas.len(),
                offers = config.shop.len(),
                "config loaded"
            );
            Ok(config)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            let config = GameConfig::default();
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            std::fs::write(path, JsonCodec.encode(&config)?)?;
            tracing::info!(path = %path.display(), "wrote default config");
            Ok(config)
        }
        Err(e) => Err(e.into()),
    }
}

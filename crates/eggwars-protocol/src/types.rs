//! Core value types shared across EggWars crates.
//!
//! Positions, team identities and resource currencies. None of these know
//! about arenas or players; they are plain data with the derives needed to
//! be map keys, configuration values and log fields.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Positions
// ---------------------------------------------------------------------------

/// A point in world space (spawns, generator anchors, lobby).
///
/// Serialized as a three-element array so configuration files stay
/// compact: `"spawn": [50.0, 100.0, 0.0]`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "[f64; 3]", into = "[f64; 3]")]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

impl From<[f64; 3]> for Vec3 {
    fn from([x, y, z]: [f64; 3]) -> Self {
        Self { x, y, z }
    }
}

impl From<Vec3> for [f64; 3] {
    fn from(v: Vec3) -> Self {
        [v.x, v.y, v.z]
    }
}

impl fmt::Display for Vec3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.1}, {:.1}, {:.1})", self.x, self.y, self.z)
    }
}

/// An integer block coordinate (egg positions, player-placed blocks).
///
/// Unlike [`Vec3`] this is `Eq + Hash`, so it can live in a `HashSet`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
#[serde(from = "[i32; 3]", into = "[i32; 3]")]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPos {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }
}

impl From<[i32; 3]> for BlockPos {
    fn from([x, y, z]: [i32; 3]) -> Self {
        Self { x, y, z }
    }
}

impl From<BlockPos> for [i32; 3] {
    fn from(p: BlockPos) -> Self {
        [p.x, p.y, p.z]
    }
}

impl fmt::Display for BlockPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}, {}]", self.x, self.y, self.z)
    }
}

// ---------------------------------------------------------------------------
// TeamColor
// ---------------------------------------------------------------------------

/// The four team colors an arena can configure.
///
/// The declaration order is significant: `Ord` follows it, and arenas keep
/// their teams in a `BTreeMap<TeamColor, _>`. When several teams are tied
/// for fewest members, the join handler picks the first one in this order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize,
    Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum TeamColor {
    Red,
    Blue,
    Green,
    Yellow,
}

impl TeamColor {
    /// Every color, in tie-break order.
    pub const ALL: [TeamColor; 4] =
        [Self::Red, Self::Blue, Self::Green, Self::Yellow];

    /// Capitalized name for chat output ("Red").
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Red => "Red",
            Self::Blue => "Blue",
            Self::Green => "Green",
            Self::Yellow => "Yellow",
        }
    }

    /// Chat formatting code that colors the text following it.
    pub fn chat_tag(self) -> &'static str {
        match self {
            Self::Red => "§c",
            Self::Blue => "§9",
            Self::Green => "§a",
            Self::Yellow => "§e",
        }
    }

    fn key(self) -> &'static str {
        match self {
            Self::Red => "red",
            Self::Blue => "blue",
            Self::Green => "green",
            Self::Yellow => "yellow",
        }
    }
}

impl fmt::Display for TeamColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for TeamColor {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.key().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                ProtocolError::InvalidValue(format!("unknown team color '{s}'"))
            })
    }
}

// ---------------------------------------------------------------------------
// ResourceKind
// ---------------------------------------------------------------------------

/// A shop currency. Generators are tiered by kind: iron is frequent,
/// diamond is rare.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default,
    Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    #[default]
    Iron,
    Gold,
    Diamond,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 3] = [Self::Iron, Self::Gold, Self::Diamond];

    pub fn display_name(self) -> &'static str {
        match self {
            Self::Iron => "Iron",
            Self::Gold => "Gold",
            Self::Diamond => "Diamond",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Iron => f.write_str("iron"),
            Self::Gold => f.write_str("gold"),
            Self::Diamond => f.write_str("diamond"),
        }
    }
}

impl FromStr for ResourceKind {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.to_string().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                ProtocolError::InvalidValue(format!("unknown resource '{s}'"))
            })
    }
}

// ---------------------------------------------------------------------------
// Balances
// ---------------------------------------------------------------------------

/// A bag of resources: a player's wallet, or the price of a shop offer.
///
/// Kinds that were never credited read as zero.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Balances(BTreeMap<ResourceKind, u32>);

/// One resource a player is short of when paying a price.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shortfall {
    pub kind: ResourceKind,
    pub needed: u32,
    pub have: u32,
}

impl fmt::Display for Shortfall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (need {}, have {})",
            self.kind.display_name(),
            self.needed,
            self.have
        )
    }
}

impl Balances {
    /// An explicit zero for every kind.
    pub fn zeroed() -> Self {
        Self(ResourceKind::ALL.into_iter().map(|k| (k, 0)).collect())
    }

    /// Builds a bag from `(kind, amount)` pairs. Used for shop prices.
    pub fn of(items: &[(ResourceKind, u32)]) -> Self {
        let mut bag = Self::default();
        for &(kind, amount) in items {
            bag.credit(kind, amount);
        }
        bag
    }

    pub fn get(&self, kind: ResourceKind) -> u32 {
        self.0.get(&kind).copied().unwrap_or(0)
    }

    pub fn credit(&mut self, kind: ResourceKind, amount: u32) {
        let slot = self.0.entry(kind).or_insert(0);
        *slot = slot.saturating_add(amount);
    }

    /// Returns every kind in `cost` this bag cannot cover. Empty means
    /// affordable.
    pub fn shortfalls(&self, cost: &Balances) -> Vec<Shortfall> {
        cost.iter()
            .filter(|&(kind, needed)| self.get(kind) < needed)
            .map(|(kind, needed)| Shortfall {
                kind,
                needed,
                have: self.get(kind),
            })
            .collect()
    }

    /// Debits `cost` only if every kind is covered; otherwise leaves the
    /// bag untouched and reports what is missing.
    pub fn try_debit(&mut self, cost: &Balances) -> Result<(), Vec<Shortfall>> {
        let missing = self.shortfalls(cost);
        if !missing.is_empty() {
            return Err(missing);
        }
        for (kind, amount) in cost.iter() {
            if let Some(slot) = self.0.get_mut(&kind) {
                *slot -= amount;
            }
        }
        Ok(())
    }

    /// Non-zero entries in kind order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (ResourceKind, u32)> + '_ {
        self.0
            .iter()
            .filter(|(_, amount)| **amount > 0)
            .map(|(kind, amount)| (*kind, *amount))
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }
}

impl fmt::Display for Balances {
    /// "Iron: 3  Gold: 0  Diamond: 1". Always lists all three kinds.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for kind in ResourceKind::ALL {
            if !first {
                f.write_str("  ")?;
            }
            first = false;
            write!(f, "{}: {}", kind.display_name(), self.get(kind))?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// ShopOffer
// ---------------------------------------------------------------------------

/// One entry of the in-match shop: what it is called and what it costs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopOffer {
    pub name: String,
    pub cost: Balances,
}

impl ShopOffer {
    pub fn new(name: impl Into<String>, cost: &[(ResourceKind, u32)]) -> Self {
        Self {
            name: name.into(),
            cost: Balances::of(cost),
        }
    }

    /// Price label, e.g. "5 Gold + 10 Iron".
    pub fn price_label(&self) -> String {
        let parts: Vec<String> = self
            .cost
            .iter()
            .rev()
            .map(|(kind, amount)| format!("{amount} {}", kind.display_name()))
            .collect();
        if parts.is_empty() {
            "free".to_string()
        } else {
            parts.join(" + ")
        }
    }
}

// ---------------------------------------------------------------------------
// EntityHandle
// ---------------------------------------------------------------------------

/// Opaque handle for an entity the world collaborator spawned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityHandle(pub u64);

impl fmt::Display for EntityHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E-{}", self.0)
    }
}

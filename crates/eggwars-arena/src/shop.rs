//! The in-match shop catalog.
//!
//! Only the resource side of a purchase lives here. Handing out the item
//! itself is the engine's job once the arena reports success.

use eggwars_protocol::{ResourceKind, ShopOffer};

/// The catalog every arena starts with.
///
/// | # | Item          | Cost              |
/// |---|---------------|-------------------|
/// | 0 | Iron Helmet   | 10 Iron           |
/// | 1 | Diamond Sword | 5 Diamond         |
/// | 2 | Shield        | 5 Gold + 10 Iron  |
pub fn default_catalog() -> Vec<ShopOffer> {
    vec![
        ShopOffer::new("Iron Helmet", &[(ResourceKind::Iron, 10)]),
        ShopOffer::new("Diamond Sword", &[(ResourceKind::Diamond, 5)]),
        ShopOffer::new(
            "Shield",
            &[(ResourceKind::Gold, 5), (ResourceKind::Iron, 10)],
        ),
    ]
}

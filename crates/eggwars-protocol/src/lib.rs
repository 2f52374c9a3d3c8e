//! Shared vocabulary for EggWars.
//!
//! Every other crate in the workspace speaks in these types:
//!
//! - **Types** ([`Vec3`], [`BlockPos`], [`TeamColor`], [`ResourceKind`],
//!   [`Balances`], [`ShopOffer`], [`EntityHandle`]): positions, team
//!   identities, resource currencies and prices.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how persisted data
//!   (configuration, statistics) is converted to/from bytes.
//! - **Errors** ([`ProtocolError`]): what can go wrong during
//!   encoding/decoding.
//!
//! ```text
//! Generator / Session / Arena  →  Protocol (shared types, codec)
//! ```

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    Balances, BlockPos, EntityHandle, ResourceKind, ShopOffer, Shortfall,
    TeamColor, Vec3,
};

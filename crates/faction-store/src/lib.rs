//! Faction Store - Persistence Codec and Record Store
//!
//! Serializes factions and the territory registry to a structured JSON
//! tree and back. The codec round-trips every aggregate field; unknown
//! permission tags inside a grade are dropped rather than failing the
//! decode, and unknown tree fields are ignored, so records written by a
//! newer build stay readable.
//!
//! The store keeps one record per faction, addressed by faction name,
//! plus a single territory snapshot, and implements the governance
//! facade's durability sink.

#![forbid(unsafe_code)]

pub mod codec;
pub mod store;

pub use codec::{decode_faction, decode_territory, encode_faction, encode_territory};
pub use store::{bootstrap, FactionStore};

//! Faction Territory - Exclusive Cell Ownership
//!
//! This crate owns the shared territory registry: a map from discrete
//! spatial cells to their single occupant, which is either a faction claim
//! or a polymorphic zone instance (e.g. a war zone with its own rules).
//!
//! The registry guarantees exactly one owner per cell at any instant; all
//! mutators are compare-and-set under one lock so two concurrent claims of
//! the same cell yield exactly one success. It dispatches lifecycle calls
//! to whichever zone variant occupies a cell but knows nothing about the
//! host-world rules a zone applies to its occupants.

#![forbid(unsafe_code)]

pub mod cell;
pub mod registry;
pub mod zone;

pub use cell::{BlockPos, CellPos};
pub use registry::{Occupant, TerritoryRegistry};
pub use zone::{ZoneInstance, ZoneKind, ZoneRules};

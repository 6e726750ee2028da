//! Faction Core - Governance Model Foundation
//!
//! This crate provides the foundational types of the faction governance
//! system. It contains only pure data and decision logic, no shared state:
//!
//! - Identifiers: `ActorId`
//! - Configuration limits: `GovernanceConfig`
//! - The closed `Permission` tag set and the `PermissionSet` bitset
//! - The `Grade` model with the `Owner`/`Member` sentinels
//! - The pure authorization rule `can_affect`
//! - The unified error taxonomy `FactionError`
//!
//! Registries and aggregates live in higher-layer crates
//! (`faction-territory`, `faction-governance`); they call into this crate
//! before every mutation.

#![forbid(unsafe_code)]

pub mod config;
pub mod errors;
pub mod grade;
pub mod identifiers;
pub mod permission;

pub use config::GovernanceConfig;
pub use errors::{FactionError, Result};
pub use grade::{can_affect, Grade, MEMBER, OWNER};
pub use identifiers::ActorId;
pub use permission::{Permission, PermissionSet};

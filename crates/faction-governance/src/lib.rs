//! Faction Governance - Aggregates, Registry, and Command Facade
//!
//! This crate is the governance layer of the faction system:
//!
//! - [`Faction`]: the aggregate owning membership, the grade catalog,
//!   description, recruitment state, home, recruit link, and the record of
//!   claimed cells. Every mutation is authorized against the grade
//!   hierarchy before it applies.
//! - [`FactionRegistry`]: the shared name-to-faction map with a lock per
//!   faction, so an authorization check and its mutation are atomic with
//!   respect to other commands on the same faction.
//! - [`GovernanceService`]: the synchronous command surface the excluded
//!   CLI/event layer calls. It returns structured responses; rendering
//!   them into localized text is the caller's job.
//!
//! # Example
//!
//! ```
//! use faction_core::{ActorId, GovernanceConfig};
//! use faction_governance::{Command, GovernanceService};
//!
//! let service = GovernanceService::new(GovernanceConfig::default());
//! let founder = ActorId::new();
//!
//! let response = service
//!     .handle(founder, Command::Create {
//!         name: "Red".to_string(),
//!         description: "the red banner".to_string(),
//!     })
//!     .unwrap();
//! # let _ = response;
//! assert_eq!(service.faction_of(&founder).as_deref(), Some("Red"));
//! ```

#![forbid(unsafe_code)]

pub mod complete;
pub mod faction;
pub mod registry;
pub mod service;

pub use complete::complete;
pub use faction::{Faction, Recruitment};
pub use registry::FactionRegistry;
pub use service::{
    Command, FactionSink, FactionSummary, GovernanceService, GradeView, Response,
};

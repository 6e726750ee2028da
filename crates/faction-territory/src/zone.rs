//! Zone behaviors: non-faction territory occupants
//!
//! A zone occupies cells with its own interaction rules, independent of
//! any faction's lifecycle. Variants are a closed tagged set with a small
//! lifecycle dispatch, selected at creation time and stored with the
//! registry entry. The host-world integration consumes [`ZoneRules`];
//! the registry only guarantees exclusivity and dispatches the calls.

use crate::cell::CellPos;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// The closed set of zone variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ZoneKind {
    /// Combat-enabled zone, not owned by any faction
    War,
    /// Protected zone where no interaction is allowed
    Safe,
}

impl fmt::Display for ZoneKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ZoneKind::War => f.write_str("war"),
            ZoneKind::Safe => f.write_str("safe"),
        }
    }
}

/// Interaction rules a zone applies to the cells it occupies.
///
/// Enforcement (combat hooks, block protection) lives in the host
/// integration; the core only states the rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneRules {
    /// Whether actors may fight each other inside the zone
    pub combat_enabled: bool,
    /// Whether blocks inside the zone are protected from modification
    pub blocks_protected: bool,
}

/// A zone instance occupying one cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneInstance {
    /// Which variant this instance is
    pub kind: ZoneKind,
    /// Creation arguments, kept verbatim so the instance can be rebuilt
    #[serde(default)]
    pub config: String,
}

impl ZoneInstance {
    /// Create a zone instance of the given kind.
    pub fn new(kind: ZoneKind, config: impl Into<String>) -> Self {
        Self {
            kind,
            config: config.into(),
        }
    }

    /// The interaction rules for this instance.
    pub fn rules(&self) -> ZoneRules {
        match self.kind {
            ZoneKind::War => ZoneRules {
                combat_enabled: true,
                blocks_protected: false,
            },
            ZoneKind::Safe => ZoneRules {
                combat_enabled: false,
                blocks_protected: true,
            },
        }
    }

    /// Lifecycle: the instance took ownership of a cell.
    pub fn on_claimed(&self, cell: CellPos) {
        debug!(kind = %self.kind, %cell, "zone claimed cell");
    }

    /// Lifecycle: the instance released a cell.
    pub fn on_unclaimed(&self, cell: CellPos) {
        debug!(kind = %self.kind, %cell, "zone released cell");
    }

    /// Lifecycle: an external event reached the zone's cell.
    ///
    /// Returns whether the zone's rules swallow the event (the host
    /// integration cancels it) or let it through.
    pub fn on_external_event(&self, cell: CellPos, event: &str) -> bool {
        let rules = self.rules();
        let swallowed = match event {
            "combat" => !rules.combat_enabled,
            "block-change" => rules.blocks_protected,
            _ => false,
        };
        debug!(kind = %self.kind, %cell, event, swallowed, "zone external event");
        swallowed
    }
}

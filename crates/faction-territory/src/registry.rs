//! The shared territory registry
//!
//! Global map from cell to its single occupant. Every mutator takes the
//! registry lock, verifies the cell's current state, and applies the
//! change in one critical section — the compare-and-set discipline that
//! makes two concurrent claims of the same cell yield exactly one success.
//!
//! The lock never outlives a single call; callers must not need a second
//! registry update inside it.

use crate::cell::CellPos;
use crate::zone::{ZoneInstance, ZoneKind};
use faction_core::{FactionError, Result};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// The single owner of a cell: a faction claim or a zone instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Occupant {
    /// Ordinary faction territory
    Faction {
        /// Canonical name of the owning faction
        faction: String,
    },
    /// A zone with its own behavioral rules
    Zone {
        /// The occupying zone instance
        zone: ZoneInstance,
    },
}

/// Global cell-to-owner registry enforcing mutual exclusion.
#[derive(Debug, Default)]
pub struct TerritoryRegistry {
    cells: Mutex<BTreeMap<CellPos, Occupant>>,
}

impl TerritoryRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim a free cell for a faction.
    ///
    /// Fails with a state conflict when the cell already has an owner of
    /// either kind.
    pub fn claim(&self, cell: CellPos, faction: &str) -> Result<()> {
        let mut cells = self.cells.lock();
        if cells.contains_key(&cell) {
            return Err(FactionError::state_conflict(format!(
                "{cell} is already claimed"
            )));
        }
        cells.insert(
            cell,
            Occupant::Faction {
                faction: faction.to_string(),
            },
        );
        debug!(%cell, faction, "cell claimed");
        Ok(())
    }

    /// Release a cell held by the requesting faction.
    pub fn unclaim(&self, cell: CellPos, faction: &str) -> Result<()> {
        let mut cells = self.cells.lock();
        match cells.get(&cell) {
            None => Err(FactionError::state_conflict(format!(
                "{cell} is not claimed"
            ))),
            Some(Occupant::Zone { .. }) => Err(FactionError::state_conflict(format!(
                "{cell} is occupied by a zone, not a faction claim"
            ))),
            Some(Occupant::Faction { faction: owner }) if owner != faction => Err(
                FactionError::state_conflict(format!("{cell} is not claimed by {faction}")),
            ),
            Some(Occupant::Faction { .. }) => {
                cells.remove(&cell);
                debug!(%cell, faction, "cell unclaimed");
                Ok(())
            }
        }
    }

    /// Create a zone of the given kind on a free cell.
    pub fn create_zone(&self, cell: CellPos, kind: ZoneKind, config: &str) -> Result<ZoneInstance> {
        let mut cells = self.cells.lock();
        if cells.contains_key(&cell) {
            return Err(FactionError::state_conflict(format!(
                "{cell} is already claimed"
            )));
        }
        let zone = ZoneInstance::new(kind, config);
        zone.on_claimed(cell);
        cells.insert(cell, Occupant::Zone { zone: zone.clone() });
        debug!(%cell, %kind, "zone created");
        Ok(zone)
    }

    /// Remove the zone occupying a cell.
    ///
    /// Fails when the cell is free or holds a faction claim instead.
    pub fn remove_zone(&self, cell: CellPos) -> Result<ZoneInstance> {
        let mut cells = self.cells.lock();
        match cells.remove(&cell) {
            None => Err(FactionError::state_conflict(format!(
                "nothing to remove at {cell}"
            ))),
            Some(occupant @ Occupant::Faction { .. }) => {
                cells.insert(cell, occupant);
                Err(FactionError::state_conflict(format!(
                    "{cell} holds a faction claim, not a zone"
                )))
            }
            Some(Occupant::Zone { zone }) => {
                zone.on_unclaimed(cell);
                debug!(%cell, kind = %zone.kind, "zone removed");
                Ok(zone)
            }
        }
    }

    /// Resolve the owner of a cell, if any.
    pub fn owner_of(&self, cell: CellPos) -> Option<Occupant> {
        self.cells.lock().get(&cell).cloned()
    }

    /// All cells currently claimed by a faction, in key order.
    pub fn claims_of(&self, faction: &str) -> Vec<CellPos> {
        self.cells
            .lock()
            .iter()
            .filter_map(|(cell, occupant)| match occupant {
                Occupant::Faction { faction: owner } if owner == faction => Some(*cell),
                _ => None,
            })
            .collect()
    }

    /// Release every cell claimed by a faction (disband path).
    ///
    /// Returns the released cells.
    pub fn release_all(&self, faction: &str) -> Vec<CellPos> {
        let mut cells = self.cells.lock();
        let released: Vec<CellPos> = cells
            .iter()
            .filter_map(|(cell, occupant)| match occupant {
                Occupant::Faction { faction: owner } if owner == faction => Some(*cell),
                _ => None,
            })
            .collect();
        for cell in &released {
            cells.remove(cell);
        }
        debug!(faction, released = released.len(), "released all claims");
        released
    }

    /// Dispatch an external event to the zone occupying a cell.
    ///
    /// Returns `None` when the cell holds no zone, otherwise whether the
    /// zone swallowed the event.
    pub fn dispatch_event(&self, cell: CellPos, event: &str) -> Option<bool> {
        let occupant = self.cells.lock().get(&cell).cloned();
        match occupant {
            Some(Occupant::Zone { zone }) => Some(zone.on_external_event(cell, event)),
            _ => None,
        }
    }

    /// Snapshot the full registry for persistence.
    pub fn snapshot(&self) -> BTreeMap<CellPos, Occupant> {
        self.cells.lock().clone()
    }

    /// Replace the registry contents from a persisted snapshot.
    pub fn restore(&self, snapshot: BTreeMap<CellPos, Occupant>) {
        *self.cells.lock() = snapshot;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use faction_core::FactionError;

    #[test]
    fn test_claim_exclusivity() {
        let registry = TerritoryRegistry::new();
        let cell = CellPos::new(0, 5, 5);

        registry.claim(cell, "Red").unwrap();
        let err = registry.claim(cell, "Blue").unwrap_err();
        assert!(matches!(err, FactionError::StateConflict { .. }));
    }

    #[test]
    fn test_unclaim_requires_claim_and_owner() {
        let registry = TerritoryRegistry::new();
        let cell = CellPos::new(0, 1, 1);

        let err = registry.unclaim(cell, "Red").unwrap_err();
        assert!(matches!(err, FactionError::StateConflict { .. }));

        registry.claim(cell, "Red").unwrap();
        let err = registry.unclaim(cell, "Blue").unwrap_err();
        assert!(matches!(err, FactionError::StateConflict { .. }));

        registry.unclaim(cell, "Red").unwrap();
        assert!(registry.owner_of(cell).is_none());
    }

    #[test]
    fn test_claim_unclaim_claim_cycle() {
        let registry = TerritoryRegistry::new();
        let cell = CellPos::new(0, 2, 2);

        registry.claim(cell, "Red").unwrap();
        registry.unclaim(cell, "Red").unwrap();
        registry.claim(cell, "Blue").unwrap();
        assert_eq!(
            registry.owner_of(cell),
            Some(Occupant::Faction {
                faction: "Blue".to_string()
            })
        );
    }

    #[test]
    fn test_zone_excludes_claims_both_ways() {
        let registry = TerritoryRegistry::new();
        let cell = CellPos::new(0, 3, 3);

        registry.create_zone(cell, ZoneKind::War, "").unwrap();
        assert!(registry.claim(cell, "Red").is_err());
        assert!(registry.create_zone(cell, ZoneKind::War, "").is_err());

        let other = CellPos::new(0, 4, 4);
        registry.claim(other, "Red").unwrap();
        assert!(registry.create_zone(other, ZoneKind::War, "").is_err());
    }

    #[test]
    fn test_remove_zone_only_removes_zones() {
        let registry = TerritoryRegistry::new();
        let cell = CellPos::new(0, 6, 6);

        assert!(registry.remove_zone(cell).is_err());

        registry.claim(cell, "Red").unwrap();
        assert!(registry.remove_zone(cell).is_err());
        registry.unclaim(cell, "Red").unwrap();

        registry.create_zone(cell, ZoneKind::War, "").unwrap();
        let zone = registry.remove_zone(cell).unwrap();
        assert_eq!(zone.kind, ZoneKind::War);
        assert!(registry.owner_of(cell).is_none());
    }

    #[test]
    fn test_release_all() {
        let registry = TerritoryRegistry::new();
        registry.claim(CellPos::new(0, 0, 0), "Red").unwrap();
        registry.claim(CellPos::new(0, 0, 1), "Red").unwrap();
        registry.claim(CellPos::new(0, 0, 2), "Blue").unwrap();

        let released = registry.release_all("Red");
        assert_eq!(released.len(), 2);
        assert!(registry.claims_of("Red").is_empty());
        assert_eq!(registry.claims_of("Blue").len(), 1);
    }

    #[test]
    fn test_dispatch_event() {
        let registry = TerritoryRegistry::new();
        let cell = CellPos::new(0, 9, 9);

        assert_eq!(registry.dispatch_event(cell, "combat"), None);

        registry.create_zone(cell, ZoneKind::War, "").unwrap();
        assert_eq!(registry.dispatch_event(cell, "combat"), Some(false));

        registry.remove_zone(cell).unwrap();
        registry.claim(cell, "Red").unwrap();
        assert_eq!(registry.dispatch_event(cell, "combat"), None);
    }

    #[test]
    fn test_snapshot_restore() {
        let registry = TerritoryRegistry::new();
        registry.claim(CellPos::new(0, 1, 0), "Red").unwrap();
        registry.create_zone(CellPos::new(0, 2, 0), ZoneKind::War, "").unwrap();

        let snapshot = registry.snapshot();
        let restored = TerritoryRegistry::new();
        restored.restore(snapshot.clone());
        assert_eq!(restored.snapshot(), snapshot);
    }
}

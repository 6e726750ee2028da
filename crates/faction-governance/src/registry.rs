//! The shared faction registry
//!
//! Name-to-faction map plus the actor-to-faction index. Names are unique
//! case-insensitively; lookups go through the lowercase key while the
//! aggregate keeps the canonical spelling.
//!
//! Each faction sits behind its own `Mutex`, so commands against the same
//! faction serialize (an authorization check and its mutation are atomic)
//! while commands against different factions proceed in parallel. The
//! outer map lock is only held long enough to clone the `Arc`.

use crate::faction::Faction;
use faction_core::{ActorId, FactionError, GovernanceConfig, Result};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Shared handle to a single faction.
pub type FactionHandle = Arc<Mutex<Faction>>;

/// Global registry of factions, keyed case-insensitively by name.
#[derive(Debug, Default)]
pub struct FactionRegistry {
    factions: RwLock<HashMap<String, FactionHandle>>,
    by_actor: RwLock<HashMap<ActorId, String>>,
}

impl FactionRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a faction with `founder` as owner and sole member.
    ///
    /// Returns the handle and whether the description was truncated.
    pub fn create(
        &self,
        config: &GovernanceConfig,
        name: &str,
        description: &str,
        founder: ActorId,
    ) -> Result<(FactionHandle, bool)> {
        if name.is_empty() {
            return Err(FactionError::validation("faction name must not be empty"));
        }
        if name.chars().count() > config.faction_name_max_length {
            return Err(FactionError::validation(format!(
                "faction name exceeds {} characters",
                config.faction_name_max_length
            )));
        }
        if self.faction_of(&founder).is_some() {
            return Err(FactionError::state_conflict(format!(
                "{founder} is already in a faction"
            )));
        }

        let key = name.to_lowercase();
        let (description, truncated) = config.clamp_description(description);

        let mut factions = self.factions.write();
        if factions.contains_key(&key) {
            return Err(FactionError::validation(format!(
                "the name {name:?} is already taken"
            )));
        }
        let handle = Arc::new(Mutex::new(Faction::new(name, description, founder)));
        factions.insert(key, handle.clone());
        drop(factions);

        self.by_actor.write().insert(founder, name.to_string());
        debug!(faction = name, %founder, "faction created");
        Ok((handle, truncated))
    }

    /// Re-register a faction loaded from persistence, rebinding members.
    pub fn restore(&self, faction: Faction) -> Result<FactionHandle> {
        let key = faction.name().to_lowercase();
        let canonical = faction.name().to_string();
        let members: Vec<ActorId> = faction.member_ids().copied().collect();

        let mut factions = self.factions.write();
        if factions.contains_key(&key) {
            return Err(FactionError::state_conflict(format!(
                "faction {canonical:?} is already registered"
            )));
        }
        let handle = Arc::new(Mutex::new(faction));
        factions.insert(key, handle.clone());
        drop(factions);

        let mut by_actor = self.by_actor.write();
        for member in members {
            by_actor.insert(member, canonical.clone());
        }
        Ok(handle)
    }

    /// Resolve a faction by name, case-insensitively.
    pub fn get(&self, name: &str) -> Result<FactionHandle> {
        self.factions
            .read()
            .get(&name.to_lowercase())
            .cloned()
            .ok_or_else(|| FactionError::not_found(format!("no faction named {name:?}")))
    }

    /// Whether a faction with this name exists (case-insensitive).
    pub fn exists(&self, name: &str) -> bool {
        self.factions.read().contains_key(&name.to_lowercase())
    }

    /// Remove a faction and unbind all its members.
    pub fn remove(&self, name: &str) -> Result<()> {
        let handle = self.get(name)?;
        let members: Vec<ActorId> = handle.lock().member_ids().copied().collect();
        self.evict(name, &members)
    }

    /// Remove a faction, unbinding the given members, without touching
    /// the faction's own mutex.
    ///
    /// The disband path calls this while holding that mutex, so the
    /// members must be supplied by the caller.
    pub fn evict(&self, name: &str, members: &[ActorId]) -> Result<()> {
        {
            let mut factions = self.factions.write();
            factions
                .remove(&name.to_lowercase())
                .ok_or_else(|| FactionError::not_found(format!("no faction named {name:?}")))?;
        }
        let mut by_actor = self.by_actor.write();
        for member in members {
            by_actor.remove(member);
        }
        debug!(faction = name, "faction removed");
        Ok(())
    }

    /// The canonical name of the faction an actor belongs to.
    pub fn faction_of(&self, actor: &ActorId) -> Option<String> {
        self.by_actor.read().get(actor).cloned()
    }

    /// Bind an actor to a faction in the index (join path).
    pub fn bind(&self, actor: ActorId, faction: &str) {
        self.by_actor.write().insert(actor, faction.to_string());
    }

    /// Drop an actor from the index (leave/kick path).
    pub fn unbind(&self, actor: &ActorId) {
        self.by_actor.write().remove(actor);
    }

    /// Canonical faction names, sorted for deterministic listing.
    pub fn names(&self) -> Vec<String> {
        let handles: Vec<FactionHandle> = self.factions.read().values().cloned().collect();
        let mut names: Vec<String> = handles
            .iter()
            .map(|handle| handle.lock().name().to_string())
            .collect();
        names.sort();
        names
    }

    /// Number of registered factions.
    pub fn len(&self) -> usize {
        self.factions.read().len()
    }

    /// Whether no faction is registered.
    pub fn is_empty(&self) -> bool {
        self.factions.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_name_uniqueness_is_case_insensitive() {
        let registry = FactionRegistry::new();
        let config = GovernanceConfig::default();

        registry
            .create(&config, "Alpha", "", ActorId::new())
            .unwrap();
        let err = registry
            .create(&config, "alpha", "", ActorId::new())
            .unwrap_err();
        assert_matches!(err, FactionError::Validation { .. });
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let registry = FactionRegistry::new();
        let config = GovernanceConfig::default();
        registry
            .create(&config, "Alpha", "", ActorId::new())
            .unwrap();

        let handle = registry.get("ALPHA").unwrap();
        assert_eq!(handle.lock().name(), "Alpha");
        assert_matches!(registry.get("Beta"), Err(FactionError::NotFound { .. }));
    }

    #[test]
    fn test_name_length_limit() {
        let registry = FactionRegistry::new();
        let config = GovernanceConfig {
            faction_name_max_length: 4,
            ..Default::default()
        };
        assert_matches!(
            registry.create(&config, "Toolong", "", ActorId::new()),
            Err(FactionError::Validation { .. })
        );
        assert!(registry.create(&config, "Four", "", ActorId::new()).is_ok());
    }

    #[test]
    fn test_founder_cannot_found_twice() {
        let registry = FactionRegistry::new();
        let config = GovernanceConfig::default();
        let founder = ActorId::new();

        registry.create(&config, "Alpha", "", founder).unwrap();
        assert_matches!(
            registry.create(&config, "Beta", "", founder),
            Err(FactionError::StateConflict { .. })
        );
    }

    #[test]
    fn test_remove_unbinds_members() {
        let registry = FactionRegistry::new();
        let config = GovernanceConfig::default();
        let founder = ActorId::new();
        let member = ActorId::new();

        let (handle, _) = registry.create(&config, "Alpha", "", founder).unwrap();
        handle.lock().add_member(member).unwrap();
        registry.bind(member, "Alpha");

        registry.remove("alpha").unwrap();
        assert!(registry.faction_of(&founder).is_none());
        assert!(registry.faction_of(&member).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_names_sorted() {
        let registry = FactionRegistry::new();
        let config = GovernanceConfig::default();
        for name in ["Crimson", "Azure", "Bronze"] {
            registry.create(&config, name, "", ActorId::new()).unwrap();
        }
        assert_eq!(registry.names(), ["Azure", "Bronze", "Crimson"]);
    }
}

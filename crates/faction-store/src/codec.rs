//! Tree codec for factions and the territory snapshot
//!
//! The persisted form is a JSON tree mirroring the aggregate: grade
//! permission sets serialize as tag lists, membership as an id-to-grade
//! map. Decoding tolerates unknown permission tags (dropped, logged at
//! debug) and unknown fields (ignored).

use faction_core::{FactionError, Result};
use faction_governance::Faction;
use faction_territory::{CellPos, Occupant};
use serde_json::Value;
use std::collections::BTreeMap;

fn storage_err(err: serde_json::Error) -> FactionError {
    FactionError::storage(err.to_string())
}

/// Encode a faction into its persisted tree.
pub fn encode_faction(faction: &Faction) -> Result<Value> {
    serde_json::to_value(faction).map_err(storage_err)
}

/// Decode a faction from its persisted tree.
pub fn decode_faction(tree: &Value) -> Result<Faction> {
    serde_json::from_value(tree.clone()).map_err(storage_err)
}

/// Encode the territory snapshot: one entry per owned cell.
///
/// Cell keys flatten to `"dim,x,z"` strings so the tree stays a plain
/// object.
pub fn encode_territory(snapshot: &BTreeMap<CellPos, Occupant>) -> Result<Value> {
    let mut map = serde_json::Map::with_capacity(snapshot.len());
    for (cell, occupant) in snapshot {
        let key = format!("{},{},{}", cell.dim, cell.x, cell.z);
        map.insert(key, serde_json::to_value(occupant).map_err(storage_err)?);
    }
    Ok(Value::Object(map))
}

/// Decode the territory snapshot.
pub fn decode_territory(tree: &Value) -> Result<BTreeMap<CellPos, Occupant>> {
    let object = tree
        .as_object()
        .ok_or_else(|| FactionError::storage("territory snapshot must be an object"))?;

    let mut snapshot = BTreeMap::new();
    for (key, value) in object {
        let cell = parse_cell_key(key)?;
        let occupant: Occupant = serde_json::from_value(value.clone()).map_err(storage_err)?;
        snapshot.insert(cell, occupant);
    }
    Ok(snapshot)
}

fn parse_cell_key(key: &str) -> Result<CellPos> {
    let parts: Vec<&str> = key.split(',').collect();
    let &[dim, x, z] = parts.as_slice() else {
        return Err(FactionError::storage(format!(
            "malformed cell key {key:?}"
        )));
    };
    let parse = |s: &str| {
        s.parse::<i32>()
            .map_err(|_| FactionError::storage(format!("malformed cell key {key:?}")))
    };
    Ok(CellPos::new(parse(dim)?, parse(x)?, parse(z)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use faction_core::{ActorId, Grade, Permission, PermissionSet};
    use faction_territory::ZoneKind;
    use faction_territory::TerritoryRegistry;

    fn sample_faction() -> (Faction, ActorId) {
        let owner = ActorId::new();
        let mut faction = Faction::new("Red", "the red banner", owner);
        faction
            .set_grade(
                &owner,
                Grade::custom(
                    "Captain",
                    1,
                    [Permission::Invite, Permission::Kick]
                        .into_iter()
                        .collect::<PermissionSet>(),
                )
                .unwrap(),
            )
            .unwrap();
        let member = ActorId::new();
        faction.add_member(member).unwrap();
        faction.promote(&owner, &member, "Captain").unwrap();
        faction.open(&owner).unwrap();
        faction.set_recruit_link(&owner, "discord/red").unwrap();
        faction.record_claim(CellPos::new(0, 5, 5));
        (faction, owner)
    }

    #[test]
    fn test_faction_roundtrip() {
        let (faction, _) = sample_faction();
        let tree = encode_faction(&faction).unwrap();
        let decoded = decode_faction(&tree).unwrap();
        assert_eq!(decoded, faction);
    }

    #[test]
    fn test_unknown_permission_tags_dropped() {
        let (faction, _) = sample_faction();
        let mut tree = encode_faction(&faction).unwrap();

        // Inject an unknown tag into the Captain grade's permission list
        let permissions = tree
            .pointer_mut("/grades/Captain/permissions")
            .and_then(Value::as_array_mut)
            .expect("captain permissions");
        permissions.push(Value::String("teleport-anywhere".to_string()));

        let decoded = decode_faction(&tree).unwrap();
        assert_eq!(decoded, faction);
    }

    #[test]
    fn test_unknown_fields_ignored() {
        let (faction, _) = sample_faction();
        let mut tree = encode_faction(&faction).unwrap();
        tree.as_object_mut()
            .expect("faction tree")
            .insert("war_score".to_string(), Value::from(42));

        let decoded = decode_faction(&tree).unwrap();
        assert_eq!(decoded, faction);
    }

    #[test]
    fn test_territory_roundtrip() {
        let registry = TerritoryRegistry::new();
        registry.claim(CellPos::new(0, 1, -2), "Red").unwrap();
        registry
            .create_zone(CellPos::new(1, 0, 0), ZoneKind::War, "")
            .unwrap();

        let snapshot = registry.snapshot();
        let tree = encode_territory(&snapshot).unwrap();
        assert_eq!(decode_territory(&tree).unwrap(), snapshot);
    }

    #[test]
    fn test_malformed_cell_key() {
        let tree = serde_json::json!({ "not-a-cell": { "kind": "faction", "faction": "Red" } });
        assert!(decode_territory(&tree).is_err());
    }
}

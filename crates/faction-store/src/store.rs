//! Directory-backed record store
//!
//! One JSON file per faction, addressed by the lowercased faction name,
//! plus a single `territory.json` snapshot. Writes go through a temp
//! file and rename so a crash never leaves a half-written record.

use crate::codec;
use faction_core::{FactionError, Result};
use faction_governance::{Faction, FactionSink};
use faction_territory::{CellPos, Occupant};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const TERRITORY_FILE: &str = "territory.json";

/// Filesystem store for governance state.
#[derive(Debug)]
pub struct FactionStore {
    dir: PathBuf,
}

impl FactionStore {
    /// Open (creating if needed) a store rooted at `dir`.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .map_err(|err| FactionError::storage(format!("creating {}: {err}", dir.display())))?;
        Ok(Self { dir })
    }

    fn faction_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.json", name.to_lowercase()))
    }

    fn write_tree(&self, path: &Path, tree: &serde_json::Value) -> Result<()> {
        let text = serde_json::to_string_pretty(tree)
            .map_err(|err| FactionError::storage(err.to_string()))?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, text)
            .map_err(|err| FactionError::storage(format!("writing {}: {err}", tmp.display())))?;
        fs::rename(&tmp, path)
            .map_err(|err| FactionError::storage(format!("renaming {}: {err}", path.display())))?;
        Ok(())
    }

    /// Persist one faction record.
    pub fn save_faction(&self, faction: &Faction) -> Result<()> {
        let tree = codec::encode_faction(faction)?;
        self.write_tree(&self.faction_path(faction.name()), &tree)?;
        debug!(faction = faction.name(), "faction record saved");
        Ok(())
    }

    /// Delete a faction record; missing records are not an error.
    pub fn remove_faction(&self, name: &str) -> Result<()> {
        let path = self.faction_path(name);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(FactionError::storage(format!(
                "removing {}: {err}",
                path.display()
            ))),
        }
    }

    /// Load every faction record in the store.
    ///
    /// Unreadable records are skipped with a warning rather than failing
    /// the whole load.
    pub fn load_factions(&self) -> Result<Vec<Faction>> {
        let entries = fs::read_dir(&self.dir)
            .map_err(|err| FactionError::storage(format!("reading {}: {err}", self.dir.display())))?;

        let mut factions = Vec::new();
        for entry in entries {
            let entry =
                entry.map_err(|err| FactionError::storage(format!("reading store: {err}")))?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json")
                || path.file_name().and_then(|n| n.to_str()) == Some(TERRITORY_FILE)
            {
                continue;
            }
            match self.read_faction(&path) {
                Ok(faction) => factions.push(faction),
                Err(err) => {
                    warn!(path = %path.display(), %err, "skipping unreadable faction record");
                }
            }
        }
        Ok(factions)
    }

    fn read_faction(&self, path: &Path) -> Result<Faction> {
        let text = fs::read_to_string(path)
            .map_err(|err| FactionError::storage(format!("reading {}: {err}", path.display())))?;
        let tree: serde_json::Value = serde_json::from_str(&text)
            .map_err(|err| FactionError::storage(format!("parsing {}: {err}", path.display())))?;
        codec::decode_faction(&tree)
    }

    /// Persist the territory snapshot.
    pub fn save_territory(&self, snapshot: &BTreeMap<CellPos, Occupant>) -> Result<()> {
        let tree = codec::encode_territory(snapshot)?;
        self.write_tree(&self.dir.join(TERRITORY_FILE), &tree)
    }

    /// Load the territory snapshot; an absent file is an empty registry.
    pub fn load_territory(&self) -> Result<BTreeMap<CellPos, Occupant>> {
        let path = self.dir.join(TERRITORY_FILE);
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(BTreeMap::new())
            }
            Err(err) => {
                return Err(FactionError::storage(format!(
                    "reading {}: {err}",
                    path.display()
                )))
            }
        };
        let tree: serde_json::Value = serde_json::from_str(&text)
            .map_err(|err| FactionError::storage(format!("parsing {}: {err}", path.display())))?;
        codec::decode_territory(&tree)
    }
}

/// Load every persisted record into a fresh governance service.
///
/// Factions re-register (rebinding their members in the actor index) and
/// the territory registry is replaced by the stored snapshot.
pub fn bootstrap(store: &FactionStore, service: &faction_governance::GovernanceService) -> Result<()> {
    for faction in store.load_factions()? {
        service.factions().restore(faction)?;
    }
    service.territory().restore(store.load_territory()?);
    Ok(())
}

impl FactionSink for FactionStore {
    fn persist(&self, faction: &Faction) -> Result<()> {
        self.save_faction(faction)
    }

    fn remove(&self, name: &str) -> Result<()> {
        self.remove_faction(name)
    }

    fn persist_territory(&self, snapshot: &BTreeMap<CellPos, Occupant>) -> Result<()> {
        self.save_territory(snapshot)
    }
}

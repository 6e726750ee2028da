//! The synchronous governance command facade
//!
//! The excluded command layer resolves an actor and parsed arguments,
//! then calls [`GovernanceService::handle`]. The facade loads the faction
//! aggregate, lets it authorize and mutate, touches the territory
//! registry when relevant, persists through the attached sink, and
//! returns a structured [`Response`] for the caller to render.
//!
//! Every operation completes or fails before returning; there is no
//! cancellation. Locks nest in one fixed order (a faction's mutex, then
//! a registry map or the territory mutex), which lets disband evict the
//! faction and release its cells under the faction's own lock.

use crate::faction::Faction;
use crate::registry::{FactionHandle, FactionRegistry};
use faction_core::{
    ActorId, FactionError, GovernanceConfig, Grade, Permission, PermissionSet, Result,
    MEMBER, OWNER,
};
use faction_territory::{BlockPos, CellPos, Occupant, TerritoryRegistry, ZoneKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Durability seam: the facade persists through this after every
/// successful mutation. Implemented by `faction-store`.
pub trait FactionSink: Send + Sync {
    /// Persist the current state of a faction
    fn persist(&self, faction: &Faction) -> Result<()>;
    /// Drop the persisted record of a disbanded faction
    fn remove(&self, name: &str) -> Result<()>;
    /// Persist the territory snapshot after a territory mutation
    fn persist_territory(&self, snapshot: &BTreeMap<CellPos, Occupant>) -> Result<()>;
}

/// A parsed governance command, one per operation of the command surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "kebab-case")]
pub enum Command {
    /// Found a new faction; the actor becomes Owner and sole member
    Create {
        /// Faction name, globally unique case-insensitively
        name: String,
        /// Initial description, truncated to the configured limit
        description: String,
    },
    /// Dissolve the actor's faction, releasing all claims
    Disband,
    /// Record a pending invite for another actor
    Invite {
        /// The actor being invited
        target: ActorId,
    },
    /// Join a faction (open recruitment, or holding an invite)
    Join {
        /// Name of the faction to join
        faction: String,
    },
    /// Leave the actor's faction; a sole member disbands it
    Leave,
    /// Kick a junior member
    Kick {
        /// The member being kicked
        target: ActorId,
    },
    /// Create or overwrite a custom grade
    SetGrade {
        /// Grade name (reserved names rejected)
        name: String,
        /// Seniority priority, >= 1
        priority: i32,
        /// Permission set for the grade
        permissions: PermissionSet,
    },
    /// Remove a custom grade; holders fall back to Member
    RemoveGrade {
        /// Name of the grade to remove
        name: String,
    },
    /// List the faction's grades, sentinels included
    ListGrades,
    /// Assign a grade to a member ("Member" demotes)
    Promote {
        /// The member receiving the grade
        target: ActorId,
        /// Grade name to assign
        grade: String,
    },
    /// Open recruitment
    Open,
    /// Close recruitment
    Close,
    /// Replace the description (over-length input is truncated)
    SetDescription {
        /// New description text
        text: String,
    },
    /// Set or clear the recruit link (empty token clears)
    SetRecruitLink {
        /// The link token
        token: String,
    },
    /// Set the faction home point
    SetHome {
        /// The home position
        position: BlockPos,
    },
    /// Resolve the faction home point
    Home,
    /// Structured summary of any faction
    Info {
        /// Name of the faction to describe
        faction: String,
    },
    /// Claim a territory cell for the actor's faction
    Claim {
        /// The cell to claim
        cell: CellPos,
    },
    /// Release a cell claimed by the actor's faction
    Unclaim {
        /// The cell to release
        cell: CellPos,
    },
    /// Create a war zone on a free cell
    CreateWarZone {
        /// The cell the zone occupies
        cell: CellPos,
    },
    /// Remove the war zone occupying a cell
    RemoveWarZone {
        /// The cell to clear
        cell: CellPos,
    },
}

/// A grade as listed to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradeView {
    /// Grade name
    pub name: String,
    /// Seniority priority
    pub priority: i32,
    /// Stable space-joined permission tags
    pub permissions: String,
}

impl GradeView {
    fn of(grade: &Grade) -> Self {
        Self {
            name: grade.name().to_string(),
            priority: grade.priority(),
            permissions: grade.permissions_as_text(),
        }
    }
}

/// Structured faction summary for display by the excluded layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactionSummary {
    /// Canonical name
    pub name: String,
    /// Current description
    pub description: String,
    /// Owning actor
    pub owner: ActorId,
    /// Member count, owner included
    pub member_count: usize,
    /// Whether recruitment is open
    pub recruitment_open: bool,
    /// Number of claimed cells
    pub claim_count: usize,
    /// Recruit link, if set
    pub recruit_link: Option<String>,
}

/// Structured result of a successful command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Response {
    /// Faction founded
    Created {
        /// The new faction's name
        faction: String,
        /// Whether the initial description was truncated
        description_truncated: bool,
    },
    /// Faction dissolved
    Disbanded {
        /// The dissolved faction's name
        faction: String,
        /// How many cells were released
        released_claims: usize,
    },
    /// Invite recorded
    Invited {
        /// The faction extending the invite
        faction: String,
        /// The invited actor
        target: ActorId,
    },
    /// Actor joined a faction
    Joined {
        /// The joined faction
        faction: String,
    },
    /// Actor left their faction
    Left {
        /// The faction left behind
        faction: String,
    },
    /// Member kicked
    Kicked {
        /// The faction
        faction: String,
        /// The kicked member
        target: ActorId,
    },
    /// Grade created or overwritten
    GradeSet {
        /// The faction
        faction: String,
        /// The grade name
        grade: String,
    },
    /// Grade removed
    GradeRemoved {
        /// The faction
        faction: String,
        /// The removed grade's name
        grade: String,
        /// Members demoted back to Member
        demoted: usize,
    },
    /// Grade listing
    Grades {
        /// The faction
        faction: String,
        /// Grades in listing order, sentinels at the edges
        grades: Vec<GradeView>,
    },
    /// Member's grade changed
    Promoted {
        /// The faction
        faction: String,
        /// The affected member
        target: ActorId,
        /// The assigned grade's canonical name
        grade: String,
    },
    /// Recruitment toggled
    RecruitmentChanged {
        /// The faction
        faction: String,
        /// New state
        open: bool,
    },
    /// Description replaced
    DescriptionChanged {
        /// The faction
        faction: String,
        /// Whether the text was truncated to the limit
        truncated: bool,
    },
    /// Recruit link set or cleared
    RecruitLinkChanged {
        /// The faction
        faction: String,
        /// Whether the link is now cleared
        cleared: bool,
    },
    /// Home point set
    HomeChanged {
        /// The faction
        faction: String,
        /// The new home
        position: BlockPos,
    },
    /// Home point resolved
    Home {
        /// The faction
        faction: String,
        /// The home position to travel to
        position: BlockPos,
    },
    /// Faction summary
    Info(FactionSummary),
    /// Cell claimed
    Claimed {
        /// The owning faction
        faction: String,
        /// The claimed cell
        cell: CellPos,
    },
    /// Cell released
    Unclaimed {
        /// The former owner
        faction: String,
        /// The released cell
        cell: CellPos,
    },
    /// Zone created
    ZoneCreated {
        /// The occupied cell
        cell: CellPos,
        /// The zone variant
        zone: ZoneKind,
    },
    /// Zone removed
    ZoneRemoved {
        /// The cleared cell
        cell: CellPos,
        /// The removed zone's variant
        zone: ZoneKind,
    },
}

/// The governance service: registries, limits, and the durability sink.
pub struct GovernanceService {
    config: GovernanceConfig,
    factions: FactionRegistry,
    territory: Arc<TerritoryRegistry>,
    sink: Option<Arc<dyn FactionSink>>,
}

impl GovernanceService {
    /// Create a service with fresh registries.
    pub fn new(config: GovernanceConfig) -> Self {
        Self::with_territory(config, Arc::new(TerritoryRegistry::new()))
    }

    /// Create a service sharing an existing territory registry.
    pub fn with_territory(config: GovernanceConfig, territory: Arc<TerritoryRegistry>) -> Self {
        Self {
            config,
            factions: FactionRegistry::new(),
            territory,
            sink: None,
        }
    }

    /// Attach a durability sink; every successful mutation persists
    /// through it.
    pub fn with_sink(mut self, sink: Arc<dyn FactionSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// The configured limits
    pub fn config(&self) -> &GovernanceConfig {
        &self.config
    }

    /// The faction registry (restore path, tests)
    pub fn factions(&self) -> &FactionRegistry {
        &self.factions
    }

    /// The shared territory registry
    pub fn territory(&self) -> &Arc<TerritoryRegistry> {
        &self.territory
    }

    /// Execute one governance command on behalf of an actor.
    pub fn handle(&self, actor: ActorId, command: Command) -> Result<Response> {
        debug!(%actor, ?command, "handling governance command");
        match command {
            Command::Create { name, description } => {
                let (handle, truncated) =
                    self.factions.create(&self.config, &name, &description, actor)?;
                self.persist(&handle.lock())?;
                Ok(Response::Created {
                    faction: name,
                    description_truncated: truncated,
                })
            }

            Command::Disband => {
                let (name, handle) = self.resolve_own(&actor)?;
                let faction = handle.lock();
                faction.authorize(&actor, Permission::Disband)?;
                // Evict before releasing cells, and under the faction's
                // own mutex, so a claim racing with the disband either
                // lands before eviction (and is released below) or finds
                // the faction gone.
                let members: Vec<ActorId> = faction.member_ids().copied().collect();
                self.factions.evict(&name, &members)?;
                let released = self.territory.release_all(faction.name()).len();
                drop(faction);
                self.persist_territory()?;
                self.forget(&name)?;
                Ok(Response::Disbanded {
                    faction: name,
                    released_claims: released,
                })
            }

            Command::Invite { target } => {
                let (name, handle) = self.resolve_own(&actor)?;
                let mut faction = handle.lock();
                faction.invite(&actor, target)?;
                self.persist(&faction)?;
                Ok(Response::Invited {
                    faction: name,
                    target,
                })
            }

            Command::Join { faction: name } => {
                if let Some(current) = self.factions.faction_of(&actor) {
                    return Err(FactionError::state_conflict(format!(
                        "{actor} is already in {current}"
                    )));
                }
                let handle = self.factions.get(&name)?;
                let mut faction = handle.lock();
                if !faction.recruitment_open() && !faction.is_invited(&actor) {
                    return Err(FactionError::state_conflict(format!(
                        "recruitment of {} is closed",
                        faction.name()
                    )));
                }
                faction.add_member(actor)?;
                let canonical = faction.name().to_string();
                self.factions.bind(actor, &canonical);
                self.persist(&faction)?;
                Ok(Response::Joined { faction: canonical })
            }

            Command::Leave => {
                let (name, handle) = self.resolve_own(&actor)?;
                let mut faction = handle.lock();
                if faction.member_count() == 1 {
                    // Sole member: leaving dissolves the faction
                    self.factions.evict(&name, &[actor])?;
                    let released = self.territory.release_all(faction.name()).len();
                    drop(faction);
                    self.persist_territory()?;
                    self.forget(&name)?;
                    return Ok(Response::Disbanded {
                        faction: name,
                        released_claims: released,
                    });
                }
                if actor == faction.owner() {
                    return Err(FactionError::state_conflict(
                        "the owner must transfer or disband before leaving",
                    ));
                }
                faction.remove_member(&actor)?;
                self.factions.unbind(&actor);
                self.persist(&faction)?;
                Ok(Response::Left { faction: name })
            }

            Command::Kick { target } => {
                let (name, handle) = self.resolve_own(&actor)?;
                let mut faction = handle.lock();
                faction.kick(&actor, &target)?;
                self.factions.unbind(&target);
                self.persist(&faction)?;
                Ok(Response::Kicked {
                    faction: name,
                    target,
                })
            }

            Command::SetGrade {
                name,
                priority,
                permissions,
            } => {
                let (faction_name, handle) = self.resolve_own(&actor)?;
                let grade = Grade::custom(name, priority, permissions)?;
                let grade_name = grade.name().to_string();
                let mut faction = handle.lock();
                faction.set_grade(&actor, grade)?;
                self.persist(&faction)?;
                Ok(Response::GradeSet {
                    faction: faction_name,
                    grade: grade_name,
                })
            }

            Command::RemoveGrade { name } => {
                let (faction_name, handle) = self.resolve_own(&actor)?;
                let mut faction = handle.lock();
                let demoted = faction.remove_grade(&actor, &name)?;
                self.persist(&faction)?;
                Ok(Response::GradeRemoved {
                    faction: faction_name,
                    grade: name,
                    demoted,
                })
            }

            Command::ListGrades => {
                let (name, handle) = self.resolve_own(&actor)?;
                let faction = handle.lock();
                let mut grades = vec![GradeView::of(&OWNER)];
                grades.extend(faction.grades_sorted().into_iter().map(GradeView::of));
                grades.push(GradeView::of(&MEMBER));
                Ok(Response::Grades {
                    faction: name,
                    grades,
                })
            }

            Command::Promote { target, grade } => {
                let (name, handle) = self.resolve_own(&actor)?;
                let mut faction = handle.lock();
                let assigned = faction.promote(&actor, &target, &grade)?;
                self.persist(&faction)?;
                Ok(Response::Promoted {
                    faction: name,
                    target,
                    grade: assigned,
                })
            }

            Command::Open => {
                let (name, handle) = self.resolve_own(&actor)?;
                let mut faction = handle.lock();
                faction.open(&actor)?;
                self.persist(&faction)?;
                Ok(Response::RecruitmentChanged {
                    faction: name,
                    open: true,
                })
            }

            Command::Close => {
                let (name, handle) = self.resolve_own(&actor)?;
                let mut faction = handle.lock();
                faction.close(&actor)?;
                self.persist(&faction)?;
                Ok(Response::RecruitmentChanged {
                    faction: name,
                    open: false,
                })
            }

            Command::SetDescription { text } => {
                let (name, handle) = self.resolve_own(&actor)?;
                let mut faction = handle.lock();
                let truncated = faction.set_description(&actor, &text, &self.config)?;
                self.persist(&faction)?;
                Ok(Response::DescriptionChanged {
                    faction: name,
                    truncated,
                })
            }

            Command::SetRecruitLink { token } => {
                let (name, handle) = self.resolve_own(&actor)?;
                let mut faction = handle.lock();
                let cleared = faction.set_recruit_link(&actor, &token)?;
                self.persist(&faction)?;
                Ok(Response::RecruitLinkChanged {
                    faction: name,
                    cleared,
                })
            }

            Command::SetHome { position } => {
                let (name, handle) = self.resolve_own(&actor)?;
                let mut faction = handle.lock();
                faction.set_home(&actor, position)?;
                self.persist(&faction)?;
                Ok(Response::HomeChanged {
                    faction: name,
                    position,
                })
            }

            Command::Home => {
                let (name, handle) = self.resolve_own(&actor)?;
                let faction = handle.lock();
                let position = faction.home().ok_or_else(|| {
                    FactionError::not_found(format!("{name} has no home set"))
                })?;
                Ok(Response::Home {
                    faction: name,
                    position,
                })
            }

            Command::Info { faction: name } => {
                let handle = self.factions.get(&name)?;
                let faction = handle.lock();
                Ok(Response::Info(Self::summarize(&faction)))
            }

            Command::Claim { cell } => {
                let (name, handle) = self.resolve_own(&actor)?;
                let mut faction = handle.lock();
                // The faction may have been evicted while this command
                // waited for its mutex
                if !self.factions.exists(&name) {
                    return Err(FactionError::not_found(format!("no faction named {name:?}")));
                }
                faction.authorize(&actor, Permission::ClaimLand)?;
                self.territory.claim(cell, faction.name())?;
                faction.record_claim(cell);
                self.persist(&faction)?;
                self.persist_territory()?;
                Ok(Response::Claimed {
                    faction: name,
                    cell,
                })
            }

            Command::Unclaim { cell } => {
                let (name, handle) = self.resolve_own(&actor)?;
                let mut faction = handle.lock();
                self.territory.unclaim(cell, faction.name())?;
                faction.forget_claim(&cell);
                self.persist(&faction)?;
                self.persist_territory()?;
                Ok(Response::Unclaimed {
                    faction: name,
                    cell,
                })
            }

            Command::CreateWarZone { cell } => {
                let zone = self.territory.create_zone(cell, ZoneKind::War, "")?;
                self.persist_territory()?;
                Ok(Response::ZoneCreated {
                    cell,
                    zone: zone.kind,
                })
            }

            Command::RemoveWarZone { cell } => {
                let zone = self.territory.remove_zone(cell)?;
                self.persist_territory()?;
                Ok(Response::ZoneRemoved {
                    cell,
                    zone: zone.kind,
                })
            }
        }
    }

    // --- queries ---

    /// The canonical name of the faction an actor belongs to.
    pub fn faction_of(&self, actor: &ActorId) -> Option<String> {
        self.factions.faction_of(actor)
    }

    /// Structured summary of a faction.
    pub fn info(&self, name: &str) -> Result<FactionSummary> {
        let handle = self.factions.get(name)?;
        let faction = handle.lock();
        Ok(Self::summarize(&faction))
    }

    /// Resolve the owner of a territory cell.
    pub fn owner_of(&self, cell: CellPos) -> Option<Occupant> {
        self.territory.owner_of(cell)
    }

    // --- autocompletion listing sources ---

    /// Current faction names, sorted.
    pub fn faction_names(&self) -> Vec<String> {
        self.factions.names()
    }

    /// Grade names of a faction in listing order, `Member` included for
    /// the demotion path.
    pub fn grade_names(&self, faction: &str) -> Result<Vec<String>> {
        let handle = self.factions.get(faction)?;
        let faction = handle.lock();
        let mut names: Vec<String> = faction
            .grades_sorted()
            .into_iter()
            .map(|g| g.name().to_string())
            .collect();
        names.push(MEMBER.name().to_string());
        Ok(names)
    }

    /// The fixed permission tag set.
    pub fn permission_tags(&self) -> Vec<&'static str> {
        Permission::ALL.iter().map(|p| p.as_str()).collect()
    }

    // --- internals ---

    fn resolve_own(&self, actor: &ActorId) -> Result<(String, FactionHandle)> {
        let name = self.factions.faction_of(actor).ok_or_else(|| {
            FactionError::state_conflict(format!("{actor} is not in a faction"))
        })?;
        let handle = self.factions.get(&name)?;
        Ok((name, handle))
    }

    fn summarize(faction: &Faction) -> FactionSummary {
        FactionSummary {
            name: faction.name().to_string(),
            description: faction.description().to_string(),
            owner: faction.owner(),
            member_count: faction.member_count(),
            recruitment_open: faction.recruitment_open(),
            claim_count: faction.claims().len(),
            recruit_link: faction.recruit_link().map(str::to_string),
        }
    }

    fn persist(&self, faction: &Faction) -> Result<()> {
        if let Some(sink) = &self.sink {
            sink.persist(faction)?;
        }
        Ok(())
    }

    fn forget(&self, name: &str) -> Result<()> {
        if let Some(sink) = &self.sink {
            sink.remove(name)?;
        }
        Ok(())
    }

    fn persist_territory(&self) -> Result<()> {
        if let Some(sink) = &self.sink {
            sink.persist_territory(&self.territory.snapshot())?;
        }
        Ok(())
    }
}

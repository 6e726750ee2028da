//! The faction aggregate
//!
//! A faction owns its membership, grade catalog, description, recruitment
//! state, home point, recruit link, and the record of cells it claims.
//! Every operation that acts on another member or on the grade catalog
//! consults the authorization rules (`can_affect`, permission membership)
//! before mutating; a refusal surfaces as an `Authorization` error.
//!
//! Registry-level concerns (global name uniqueness, the actor-to-faction
//! index, territory exclusivity) live outside the aggregate.

use faction_core::grade::{can_affect, MEMBER_PRIORITY};
use faction_core::{
    ActorId, FactionError, GovernanceConfig, Grade, Permission, Result, MEMBER, OWNER,
};
use faction_territory::{BlockPos, CellPos};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Recruitment state machine: `Closed` initially, toggled by
/// `open`/`close`; joining without an invite is only valid while `Open`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Recruitment {
    /// Only invited actors may join
    #[default]
    Closed,
    /// Anyone without a faction may join
    Open,
}

/// A named group of actors with shared territory and an internal role
/// hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Faction {
    name: String,
    description: String,
    owner: ActorId,
    /// Member -> assigned custom grade name; `None` is the implicit
    /// `Member` grade
    members: BTreeMap<ActorId, Option<String>>,
    /// Custom grade catalog, keyed by case-sensitive name
    grades: BTreeMap<String, Grade>,
    #[serde(default)]
    recruitment: Recruitment,
    #[serde(default)]
    home: Option<BlockPos>,
    #[serde(default)]
    recruit_link: Option<String>,
    #[serde(default)]
    claims: BTreeSet<CellPos>,
    #[serde(default)]
    invites: BTreeSet<ActorId>,
}

impl Faction {
    /// Create a faction with its founder as `Owner` and sole member.
    ///
    /// Name and description validation belong to the registry/service;
    /// the aggregate stores what it is given.
    pub fn new(name: impl Into<String>, description: impl Into<String>, owner: ActorId) -> Self {
        let mut members = BTreeMap::new();
        members.insert(owner, None);
        Self {
            name: name.into(),
            description: description.into(),
            owner,
            members,
            grades: BTreeMap::new(),
            recruitment: Recruitment::default(),
            home: None,
            recruit_link: None,
            claims: BTreeSet::new(),
            invites: BTreeSet::new(),
        }
    }

    // --- accessors ---

    /// Canonical faction name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current description
    pub fn description(&self) -> &str {
        &self.description
    }

    /// The owning actor
    pub fn owner(&self) -> ActorId {
        self.owner
    }

    /// Whether recruitment is open
    pub fn recruitment_open(&self) -> bool {
        self.recruitment == Recruitment::Open
    }

    /// The faction home point, if set
    pub fn home(&self) -> Option<BlockPos> {
        self.home
    }

    /// The recruit link token, if set
    pub fn recruit_link(&self) -> Option<&str> {
        self.recruit_link.as_deref()
    }

    /// Cells this faction currently claims
    pub fn claims(&self) -> &BTreeSet<CellPos> {
        &self.claims
    }

    /// Number of members, owner included
    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    /// Iterate member ids
    pub fn member_ids(&self) -> impl Iterator<Item = &ActorId> {
        self.members.keys()
    }

    /// Whether an actor belongs to this faction
    pub fn is_member(&self, actor: &ActorId) -> bool {
        self.members.contains_key(actor)
    }

    /// Whether an actor holds a pending invite
    pub fn is_invited(&self, actor: &ActorId) -> bool {
        self.invites.contains(actor)
    }

    /// Resolve the grade an actor holds in this faction.
    ///
    /// The owner resolves to the `Owner` sentinel; members without an
    /// explicit custom grade (or whose grade was removed) resolve to the
    /// implicit `Member` sentinel.
    pub fn grade_of(&self, actor: &ActorId) -> &Grade {
        if *actor == self.owner {
            return &OWNER;
        }
        match self.members.get(actor) {
            Some(Some(name)) => self.grades.get(name).unwrap_or(&MEMBER),
            _ => &MEMBER,
        }
    }

    /// Custom grades sorted for listing: priority ascending, name
    /// tie-break.
    pub fn grades_sorted(&self) -> Vec<&Grade> {
        let mut grades: Vec<&Grade> = self.grades.values().collect();
        grades.sort_by(|a, b| a.listing_order(b));
        grades
    }

    /// Look up a custom grade by its case-sensitive name
    pub fn grade(&self, name: &str) -> Option<&Grade> {
        self.grades.get(name)
    }

    // --- authorization helpers ---

    fn require_member(&self, actor: &ActorId) -> Result<()> {
        if self.is_member(actor) {
            Ok(())
        } else {
            Err(FactionError::not_found(format!(
                "{actor} is not a member of {}",
                self.name
            )))
        }
    }

    /// Check that an actor's grade carries a permission.
    pub fn authorize(&self, actor: &ActorId, permission: Permission) -> Result<()> {
        self.require_member(actor)?;
        if self.grade_of(actor).has_permission(permission) {
            Ok(())
        } else {
            Err(FactionError::authorization(format!(
                "missing permission {permission}"
            )))
        }
    }

    // --- membership mutations ---

    /// Record a pending invite for an actor. Requires the `invite`
    /// permission; idempotent for an already-invited actor.
    pub fn invite(&mut self, executor: &ActorId, target: ActorId) -> Result<()> {
        self.authorize(executor, Permission::Invite)?;
        if self.is_member(&target) {
            return Err(FactionError::state_conflict(format!(
                "{target} is already a member of {}",
                self.name
            )));
        }
        self.invites.insert(target);
        Ok(())
    }

    /// Add an actor as an implicit `Member`, consuming any pending invite.
    ///
    /// The recruitment gate (open, or invited) is the caller's check; the
    /// aggregate only rejects duplicates.
    pub fn add_member(&mut self, actor: ActorId) -> Result<()> {
        if self.is_member(&actor) {
            return Err(FactionError::state_conflict(format!(
                "{actor} is already a member of {}",
                self.name
            )));
        }
        self.invites.remove(&actor);
        self.members.insert(actor, None);
        Ok(())
    }

    /// Remove a member without an authorization check (leave path).
    pub fn remove_member(&mut self, actor: &ActorId) -> Result<()> {
        self.require_member(actor)?;
        self.members.remove(actor);
        Ok(())
    }

    /// Kick a member: the executor's grade must be able to affect the
    /// target's grade.
    pub fn kick(&mut self, executor: &ActorId, target: &ActorId) -> Result<()> {
        self.require_member(executor)?;
        self.require_member(target)?;
        if !can_affect(self.grade_of(executor), self.grade_of(target)) {
            return Err(FactionError::authorization(format!(
                "{} cannot act on {}",
                self.grade_of(executor).name(),
                self.grade_of(target).name()
            )));
        }
        self.members.remove(target);
        self.invites.remove(target);
        Ok(())
    }

    // --- grade catalog mutations ---

    /// Create or overwrite a custom grade. Requires `manage-grades`.
    ///
    /// Reserved names and non-positive priorities are already rejected by
    /// [`Grade::custom`]; this path never touches the sentinels.
    pub fn set_grade(&mut self, executor: &ActorId, grade: Grade) -> Result<()> {
        self.authorize(executor, Permission::ManageGrades)?;
        self.grades.insert(grade.name().to_string(), grade);
        Ok(())
    }

    /// Remove a custom grade; holders fall back to the implicit `Member`.
    ///
    /// Returns how many members were demoted.
    pub fn remove_grade(&mut self, executor: &ActorId, name: &str) -> Result<usize> {
        self.authorize(executor, Permission::ManageGrades)?;
        if self.grades.remove(name).is_none() {
            return Err(FactionError::not_found(format!(
                "no grade named {name:?} in {}",
                self.name
            )));
        }
        let mut demoted = 0;
        for assigned in self.members.values_mut() {
            if assigned.as_deref() == Some(name) {
                *assigned = None;
                demoted += 1;
            }
        }
        Ok(demoted)
    }

    /// Assign a grade to a member.
    ///
    /// The executor must be able to affect both the target's current
    /// grade and the grade being assigned — nobody promotes a peer, and
    /// nobody hands out a grade senior to or level with their own. The
    /// `Member` sentinel's name demotes back to the implicit grade.
    pub fn promote(&mut self, executor: &ActorId, target: &ActorId, grade_name: &str) -> Result<String> {
        self.require_member(executor)?;
        self.require_member(target)?;

        let executor_grade = self.grade_of(executor).clone();
        if !can_affect(&executor_grade, self.grade_of(target)) {
            return Err(FactionError::authorization(format!(
                "{} cannot act on {}",
                executor_grade.name(),
                self.grade_of(target).name()
            )));
        }

        let new_grade = if grade_name.eq_ignore_ascii_case(MEMBER.name()) {
            MEMBER.clone()
        } else {
            self.grades
                .get(grade_name)
                .cloned()
                .ok_or_else(|| {
                    FactionError::not_found(format!(
                        "no grade named {grade_name:?} in {}",
                        self.name
                    ))
                })?
        };
        if !can_affect(&executor_grade, &new_grade) {
            return Err(FactionError::authorization(format!(
                "cannot assign grade {} from grade {}",
                new_grade.name(),
                executor_grade.name()
            )));
        }

        let assigned = if new_grade.priority() == MEMBER_PRIORITY {
            None
        } else {
            Some(new_grade.name().to_string())
        };
        self.members.insert(*target, assigned);
        Ok(new_grade.name().to_string())
    }

    // --- state mutations ---

    /// Open recruitment. Requires `open-recruitment`.
    pub fn open(&mut self, executor: &ActorId) -> Result<()> {
        self.authorize(executor, Permission::OpenRecruitment)?;
        self.recruitment = Recruitment::Open;
        Ok(())
    }

    /// Close recruitment. Requires `open-recruitment`.
    pub fn close(&mut self, executor: &ActorId) -> Result<()> {
        self.authorize(executor, Permission::OpenRecruitment)?;
        self.recruitment = Recruitment::Closed;
        Ok(())
    }

    /// Replace the description, truncating to the configured limit.
    ///
    /// Over-length input is never an error; the truncated text is what
    /// gets persisted and the return value reports that it happened.
    pub fn set_description(
        &mut self,
        executor: &ActorId,
        text: &str,
        config: &GovernanceConfig,
    ) -> Result<bool> {
        self.authorize(executor, Permission::ChangeDescription)?;
        let (text, truncated) = config.clamp_description(text);
        self.description = text;
        Ok(truncated)
    }

    /// Set or clear the recruit link. Requires `manage-recruit-link`; an
    /// empty token clears. Returns whether the link was cleared.
    pub fn set_recruit_link(&mut self, executor: &ActorId, token: &str) -> Result<bool> {
        self.authorize(executor, Permission::ManageRecruitLink)?;
        if token.is_empty() {
            self.recruit_link = None;
            Ok(true)
        } else {
            self.recruit_link = Some(token.to_string());
            Ok(false)
        }
    }

    /// Set the faction home point. Requires `set-home`.
    pub fn set_home(&mut self, executor: &ActorId, position: BlockPos) -> Result<()> {
        self.authorize(executor, Permission::SetHome)?;
        self.home = Some(position);
        Ok(())
    }

    /// Record a cell the territory registry granted to this faction.
    pub fn record_claim(&mut self, cell: CellPos) {
        self.claims.insert(cell);
    }

    /// Forget a cell released back to the territory registry.
    pub fn forget_claim(&mut self, cell: &CellPos) {
        self.claims.remove(cell);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use faction_core::PermissionSet;

    fn faction() -> (Faction, ActorId) {
        let owner = ActorId::new();
        (Faction::new("Red", "the red banner", owner), owner)
    }

    fn captain() -> Grade {
        Grade::custom(
            "Captain",
            1,
            [Permission::Invite].into_iter().collect::<PermissionSet>(),
        )
        .unwrap()
    }

    #[test]
    fn test_founder_is_owner_and_sole_member() {
        let (faction, owner) = faction();
        assert_eq!(faction.member_count(), 1);
        assert_eq!(faction.grade_of(&owner).name(), "Owner");
    }

    #[test]
    fn test_members_default_to_member_sentinel() {
        let (mut faction, _) = faction();
        let actor = ActorId::new();
        faction.add_member(actor).unwrap();
        assert_eq!(faction.grade_of(&actor).name(), "Member");
        assert_matches!(
            faction.add_member(actor),
            Err(FactionError::StateConflict { .. })
        );
    }

    #[test]
    fn test_invite_requires_permission() {
        let (mut faction, owner) = faction();
        let plain = ActorId::new();
        let target = ActorId::new();
        faction.add_member(plain).unwrap();

        assert_matches!(
            faction.invite(&plain, target),
            Err(FactionError::Authorization { .. })
        );
        faction.invite(&owner, target).unwrap();
        assert!(faction.is_invited(&target));

        // Joining consumes the invite
        faction.add_member(target).unwrap();
        assert!(!faction.is_invited(&target));
    }

    #[test]
    fn test_kick_follows_hierarchy() {
        let (mut faction, owner) = faction();
        let b = ActorId::new();
        faction.add_member(b).unwrap();
        faction.set_grade(&owner, captain()).unwrap();
        faction.promote(&owner, &b, "Captain").unwrap();

        assert_matches!(
            faction.kick(&b, &owner),
            Err(FactionError::Authorization { .. })
        );
        faction.kick(&owner, &b).unwrap();
        assert!(!faction.is_member(&b));
    }

    #[test]
    fn test_promote_rejects_senior_or_equal_assignment() {
        let (mut faction, owner) = faction();
        let b = ActorId::new();
        let c = ActorId::new();
        faction.add_member(b).unwrap();
        faction.add_member(c).unwrap();
        faction.set_grade(&owner, captain()).unwrap();
        faction.promote(&owner, &b, "Captain").unwrap();

        // A captain cannot mint another captain (equal priority)
        assert_matches!(
            faction.promote(&b, &c, "Captain"),
            Err(FactionError::Authorization { .. })
        );
        // The Member floor stays assignable
        let name = faction.promote(&b, &c, "Member").unwrap();
        assert_eq!(name, "Member");
    }

    #[test]
    fn test_promote_unknown_grade() {
        let (mut faction, owner) = faction();
        let b = ActorId::new();
        faction.add_member(b).unwrap();
        assert_matches!(
            faction.promote(&owner, &b, "General"),
            Err(FactionError::NotFound { .. })
        );
    }

    #[test]
    fn test_remove_grade_demotes_holders() {
        let (mut faction, owner) = faction();
        let b = ActorId::new();
        faction.add_member(b).unwrap();
        faction.set_grade(&owner, captain()).unwrap();
        faction.promote(&owner, &b, "Captain").unwrap();

        let demoted = faction.remove_grade(&owner, "Captain").unwrap();
        assert_eq!(demoted, 1);
        assert_eq!(faction.grade_of(&b).name(), "Member");
        assert_matches!(
            faction.remove_grade(&owner, "Captain"),
            Err(FactionError::NotFound { .. })
        );
    }

    #[test]
    fn test_description_truncation_reported() {
        let (mut faction, owner) = faction();
        let config = GovernanceConfig {
            faction_description_max_length: 10,
            ..Default::default()
        };
        let truncated = faction
            .set_description(&owner, "a very long description", &config)
            .unwrap();
        assert!(truncated);
        assert_eq!(faction.description(), "a very lon");
    }

    #[test]
    fn test_recruit_link_clear_on_empty() {
        let (mut faction, owner) = faction();
        assert!(!faction.set_recruit_link(&owner, "discord/red").unwrap());
        assert_eq!(faction.recruit_link(), Some("discord/red"));
        assert!(faction.set_recruit_link(&owner, "").unwrap());
        assert_eq!(faction.recruit_link(), None);
    }

    #[test]
    fn test_recruitment_state_machine() {
        let (mut faction, owner) = faction();
        assert!(!faction.recruitment_open());
        faction.open(&owner).unwrap();
        assert!(faction.recruitment_open());
        faction.close(&owner).unwrap();
        assert!(!faction.recruitment_open());
    }

    #[test]
    fn test_grades_sorted_for_listing() {
        let (mut faction, owner) = faction();
        for (name, priority) in [("Scout", 3), ("Captain", 1), ("Banner", 3)] {
            faction
                .set_grade(
                    &owner,
                    Grade::custom(name, priority, PermissionSet::empty()).unwrap(),
                )
                .unwrap();
        }
        let names: Vec<&str> = faction.grades_sorted().iter().map(|g| g.name()).collect();
        assert_eq!(names, ["Captain", "Banner", "Scout"]);
    }
}

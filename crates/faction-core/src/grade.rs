//! Grades: named ranks with a seniority priority and a permission set
//!
//! Two sentinel grades frame every faction's hierarchy: `Owner` (priority
//! 0, full permission set, always present) and `Member` (priority -1,
//! empty set, implicit — never stored in a grade catalog). Custom grades
//! sit between them with priority >= 1; a lower number is more senior.
//!
//! Seniority is decided only through [`can_affect`], never by comparing
//! raw priorities: `Member`'s -1 is the floor of the hierarchy despite
//! numerically sorting below `Owner`'s 0.

use crate::errors::{FactionError, Result};
use crate::permission::{Permission, PermissionSet};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Priority reserved for the `Owner` sentinel.
pub const OWNER_PRIORITY: i32 = 0;
/// Priority reserved for the implicit `Member` sentinel.
pub const MEMBER_PRIORITY: i32 = -1;

/// The `Owner` sentinel: full permission set, not removable, immutable.
pub static OWNER: Lazy<Grade> = Lazy::new(|| Grade {
    name: "Owner".to_string(),
    priority: OWNER_PRIORITY,
    permissions: PermissionSet::all(),
});

/// The `Member` sentinel: the implicit floor grade with no permissions.
pub static MEMBER: Lazy<Grade> = Lazy::new(|| Grade {
    name: "Member".to_string(),
    priority: MEMBER_PRIORITY,
    permissions: PermissionSet::empty(),
});

/// A named rank within a faction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grade {
    name: String,
    priority: i32,
    permissions: PermissionSet,
}

impl Grade {
    /// Create a custom grade.
    ///
    /// Rejects the reserved sentinel names (case-insensitively) and any
    /// priority below 1; sentinels are process-wide constants, never
    /// constructed through this path.
    pub fn custom(
        name: impl Into<String>,
        priority: i32,
        permissions: PermissionSet,
    ) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(FactionError::validation("grade name must not be empty"));
        }
        if name.eq_ignore_ascii_case("owner") || name.eq_ignore_ascii_case("member") {
            return Err(FactionError::validation(format!(
                "grade name {name:?} is reserved"
            )));
        }
        if priority < 1 {
            return Err(FactionError::validation(format!(
                "custom grade priority must be >= 1, got {priority}"
            )));
        }
        Ok(Self {
            name,
            priority,
            permissions,
        })
    }

    /// The grade's unique (per faction, case-sensitive) name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The seniority key; lower is more senior among customs
    pub fn priority(&self) -> i32 {
        self.priority
    }

    /// The permission set held by this grade
    pub fn permissions(&self) -> PermissionSet {
        self.permissions
    }

    /// Whether this is one of the two sentinel grades.
    pub fn is_sentinel(&self) -> bool {
        self.priority <= OWNER_PRIORITY
    }

    /// Membership test against this grade's permission set.
    pub fn has_permission(&self, permission: Permission) -> bool {
        self.permissions.contains(permission)
    }

    /// Add a permission to a custom grade.
    ///
    /// Sentinel grades are immutable; attempting to touch one is rejected.
    pub fn add_permission(&mut self, permission: Permission) -> Result<()> {
        if self.is_sentinel() {
            return Err(FactionError::validation(format!(
                "the {} grade cannot be modified",
                self.name
            )));
        }
        self.permissions.insert(permission);
        Ok(())
    }

    /// Remove a permission from a custom grade.
    ///
    /// The `Owner` sentinel's permission set can never be reduced.
    pub fn remove_permission(&mut self, permission: Permission) -> Result<()> {
        if self.is_sentinel() {
            return Err(FactionError::validation(format!(
                "the {} grade cannot be modified",
                self.name
            )));
        }
        self.permissions.remove(permission);
        Ok(())
    }

    /// Stable space-joined permission listing for display.
    pub fn permissions_as_text(&self) -> String {
        self.permissions.as_text()
    }

    /// Listing order: priority ascending, ties broken by name.
    pub fn listing_order(&self, other: &Grade) -> Ordering {
        self.priority
            .cmp(&other.priority)
            .then_with(|| self.name.cmp(&other.name))
    }
}

/// The hierarchy rule: may `executor` act upon a member holding `target`?
///
/// - Equal priority never affects equal priority, `Owner` vs `Owner`
///   included.
/// - The `Member` floor is affectable by anyone holding any other grade.
/// - Otherwise the more senior (numerically lower) priority wins.
pub fn can_affect(executor: &Grade, target: &Grade) -> bool {
    if executor.priority() == target.priority() {
        return false;
    }
    if target.priority() == MEMBER_PRIORITY {
        return true;
    }
    executor.priority() < target.priority()
}

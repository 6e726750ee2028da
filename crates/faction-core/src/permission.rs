//! The closed permission tag set and its bitset container
//!
//! Permissions are a fixed enumeration: identity is the tag, there is no
//! per-instance state. `PermissionSet` packs membership into a `u16` for
//! O(1) testing while serializing as a list of kebab-case tags.

use serde::de::{SeqAccess, Visitor};
use serde::ser::SerializeSeq;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// An enumerated capability a grade may hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Permission {
    /// Create, overwrite, and remove custom grades
    ManageGrades,
    /// Invite players into the faction
    Invite,
    /// Kick junior members out of the faction
    Kick,
    /// Claim territory cells for the faction
    ClaimLand,
    /// Open and close recruitment
    OpenRecruitment,
    /// Set the faction home point
    SetHome,
    /// Change the faction description
    ChangeDescription,
    /// Set or clear the recruit link token
    ManageRecruitLink,
    /// Access the shared faction chest (consumed by the host integration)
    ManageChest,
    /// Disband the faction
    Disband,
}

impl Permission {
    /// Every permission tag, in declaration order.
    pub const ALL: [Permission; 10] = [
        Permission::ManageGrades,
        Permission::Invite,
        Permission::Kick,
        Permission::ClaimLand,
        Permission::OpenRecruitment,
        Permission::SetHome,
        Permission::ChangeDescription,
        Permission::ManageRecruitLink,
        Permission::ManageChest,
        Permission::Disband,
    ];

    /// The stable kebab-case tag for this permission.
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::ManageGrades => "manage-grades",
            Permission::Invite => "invite",
            Permission::Kick => "kick",
            Permission::ClaimLand => "claim-land",
            Permission::OpenRecruitment => "open-recruitment",
            Permission::SetHome => "set-home",
            Permission::ChangeDescription => "change-description",
            Permission::ManageRecruitLink => "manage-recruit-link",
            Permission::ManageChest => "manage-chest",
            Permission::Disband => "disband",
        }
    }

    fn bit(self) -> u16 {
        1 << (self as u16)
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Permission {
    type Err = UnknownPermission;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Permission::ALL
            .iter()
            .copied()
            .find(|p| p.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownPermission(s.to_string()))
    }
}

/// A permission tag that is not part of the closed set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown permission tag: {0}")]
pub struct UnknownPermission(pub String);

/// A set of permission tags, packed into a bitset.
///
/// Serializes as a sequence of tags. Unknown tags encountered while
/// deserializing are dropped rather than failing the whole decode; this
/// tolerance keeps old records readable after a tag is retired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PermissionSet(u16);

impl PermissionSet {
    const FULL_MASK: u16 = (1 << Permission::ALL.len()) - 1;

    /// The empty set
    pub fn empty() -> Self {
        Self(0)
    }

    /// The full set, every tag present
    pub fn all() -> Self {
        Self(Self::FULL_MASK)
    }

    /// Add a permission; duplicates are a no-op
    pub fn insert(&mut self, permission: Permission) {
        self.0 |= permission.bit();
    }

    /// Remove a permission if present
    pub fn remove(&mut self, permission: Permission) {
        self.0 &= !permission.bit();
    }

    /// Membership test
    pub fn contains(&self, permission: Permission) -> bool {
        self.0 & permission.bit() != 0
    }

    /// Number of tags in the set
    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    /// Whether the set holds no tags
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Iterate the tags in declaration order
    pub fn iter(&self) -> impl Iterator<Item = Permission> + '_ {
        Permission::ALL.into_iter().filter(|p| self.contains(*p))
    }

    /// Stable space-joined tag listing for display.
    pub fn as_text(&self) -> String {
        self.iter()
            .map(|p| p.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl FromIterator<Permission> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = Permission>>(iter: I) -> Self {
        let mut set = Self::empty();
        for permission in iter {
            set.insert(permission);
        }
        set
    }
}

impl Serialize for PermissionSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.len()))?;
        for permission in self.iter() {
            seq.serialize_element(&permission)?;
        }
        seq.end()
    }
}

impl<'de> Deserialize<'de> for PermissionSet {
    fn deserialize<D: Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Self, D::Error> {
        struct SetVisitor;

        impl<'de> Visitor<'de> for SetVisitor {
            type Value = PermissionSet;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a sequence of permission tags")
            }

            fn visit_seq<A: SeqAccess<'de>>(
                self,
                mut seq: A,
            ) -> std::result::Result<Self::Value, A::Error> {
                let mut set = PermissionSet::empty();
                while let Some(tag) = seq.next_element::<String>()? {
                    match tag.parse::<Permission>() {
                        Ok(permission) => set.insert(permission),
                        Err(_) => {
                            debug!(tag = %tag, "dropping unknown permission tag");
                        }
                    }
                }
                Ok(set)
            }
        }

        deserializer.deserialize_seq(SetVisitor)
    }
}

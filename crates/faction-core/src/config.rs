//! Governance configuration limits

use serde::{Deserialize, Serialize};

/// Tunable limits for faction governance operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GovernanceConfig {
    /// Maximum length of a faction name, in characters.
    ///
    /// Names longer than this are rejected on creation.
    pub faction_name_max_length: usize,

    /// Maximum length of a faction description, in characters.
    ///
    /// Longer input is truncated and persisted truncated, never rejected.
    pub faction_description_max_length: usize,
}

impl Default for GovernanceConfig {
    fn default() -> Self {
        Self {
            faction_name_max_length: 16,
            faction_description_max_length: 120,
        }
    }
}

impl GovernanceConfig {
    /// Truncate a description to the configured limit.
    ///
    /// Returns the (possibly shortened) text and whether truncation
    /// occurred, so callers can report it.
    pub fn clamp_description(&self, text: &str) -> (String, bool) {
        let max = self.faction_description_max_length;
        if text.chars().count() > max {
            (text.chars().take(max).collect(), true)
        } else {
            (text.to_string(), false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_description() {
        let config = GovernanceConfig {
            faction_description_max_length: 5,
            ..Default::default()
        };

        let (text, truncated) = config.clamp_description("short");
        assert_eq!(text, "short");
        assert!(!truncated);

        let (text, truncated) = config.clamp_description("much too long");
        assert_eq!(text, "much ");
        assert!(truncated);
    }

    #[test]
    fn test_clamp_is_char_aware() {
        let config = GovernanceConfig {
            faction_description_max_length: 3,
            ..Default::default()
        };

        let (text, truncated) = config.clamp_description("héllo");
        assert_eq!(text, "hél");
        assert!(truncated);
    }
}

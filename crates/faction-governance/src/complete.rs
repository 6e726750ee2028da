//! Prefix completion over governance listing sources
//!
//! The command layer owns tab-completion; this module only supplies the
//! prefix filter and the listing sources come from
//! [`GovernanceService`](crate::GovernanceService) (faction names, grade
//! names, permission tags) or from the host (online actor names, passed
//! through unchanged).

/// Filter options down to those starting with `prefix`,
/// case-insensitively, preserving source order.
pub fn complete<I, S>(prefix: &str, options: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let prefix = prefix.to_lowercase();
    options
        .into_iter()
        .filter(|option| option.as_ref().to_lowercase().starts_with(&prefix))
        .map(|option| option.as_ref().to_string())
        .collect()
}

//! Update options and TTL reporting types.

use crate::cache::HydrateMode;
use crate::duration::Ttl;

/// What an update does to the entry's deadline.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RenewTtl {
    /// Leave the deadline as it is
    #[default]
    Keep,
    /// Restart the countdown with the entry's original TTL window
    Restart,
    /// Replace the deadline with `now + ttl`
    To(Ttl),
}

/// Options for [`CacheStore::update`](crate::cache::CacheStore::update).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateOptions {
    pub renew_ttl: RenewTtl,
    pub create_if_not_exists: bool,
    /// TTL used when the update creates the key
    pub create_with_ttl: Option<Ttl>,
    pub hydrate: bool,
    pub hydrate_mode: HydrateMode,
}

impl Default for UpdateOptions {
    fn default() -> Self {
        Self {
            renew_ttl: RenewTtl::Keep,
            create_if_not_exists: true,
            create_with_ttl: None,
            hydrate: false,
            hydrate_mode: HydrateMode::Shallow,
        }
    }
}

impl UpdateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn renew(mut self, renew_ttl: RenewTtl) -> Self {
        self.renew_ttl = renew_ttl;
        self
    }

    /// Fail instead of creating a missing key.
    pub fn no_create(mut self) -> Self {
        self.create_if_not_exists = false;
        self
    }

    pub fn create_with_ttl(mut self, ttl: impl Into<Ttl>) -> Self {
        self.create_with_ttl = Some(ttl.into());
        self
    }

    /// Merge into the stored value instead of replacing it.
    pub fn hydrate(mut self, mode: HydrateMode) -> Self {
        self.hydrate = true;
        self.hydrate_mode = mode;
        self
    }
}

/// Result of an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// Key was absent and has been created
    Created,
    /// Existing key was updated
    Updated,
    /// Key was absent and creation was disabled; nothing was written
    Missing,
}

impl UpdateOutcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, UpdateOutcome::Missing)
    }
}

/// Remaining lifetime of a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyTtl {
    /// Present without a deadline
    Never,
    /// Milliseconds left, always > 0
    Remaining(u64),
    /// Absent or already past its deadline
    Missing,
}

impl KeyTtl {
    /// `None` = never expires, `Some(ms)` = remaining, `Some(-1)` = missing.
    pub fn as_legacy(&self) -> Option<i64> {
        match self {
            KeyTtl::Never => None,
            KeyTtl::Remaining(ms) => Some(i64::try_from(*ms).unwrap_or(i64::MAX)),
            KeyTtl::Missing => Some(-1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_option_defaults() {
        let options = UpdateOptions::default();
        assert_eq!(options.renew_ttl, RenewTtl::Keep);
        assert!(options.create_if_not_exists);
        assert!(options.create_with_ttl.is_none());
        assert!(!options.hydrate);
        assert_eq!(options.hydrate_mode, HydrateMode::Shallow);
    }

    #[test]
    fn test_update_option_builders() {
        let options = UpdateOptions::new()
            .renew(RenewTtl::Restart)
            .no_create()
            .create_with_ttl("5m")
            .hydrate(HydrateMode::Deep);
        assert_eq!(options.renew_ttl, RenewTtl::Restart);
        assert!(!options.create_if_not_exists);
        assert_eq!(options.create_with_ttl, Some(Ttl::Expr("5m".into())));
        assert!(options.hydrate);
        assert_eq!(options.hydrate_mode, HydrateMode::Deep);
    }

    #[test]
    fn test_key_ttl_legacy_encoding() {
        assert_eq!(KeyTtl::Never.as_legacy(), None);
        assert_eq!(KeyTtl::Remaining(250).as_legacy(), Some(250));
        assert_eq!(KeyTtl::Missing.as_legacy(), Some(-1));
    }

    #[test]
    fn test_outcome_success() {
        assert!(UpdateOutcome::Created.is_success());
        assert!(UpdateOutcome::Updated.is_success());
        assert!(!UpdateOutcome::Missing.is_success());
    }
}

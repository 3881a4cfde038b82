//! Singleton conflict strategy flags.
//!
//! A `[Singleton]` type may carry a strategy that decides what happens when a
//! second instance registers while another one is current. The flags are plain
//! data; which combinations are legal is decided by [`SingletonStrategy::conflicting_flags`],
//! which the compile-time rule and the runtime registry both consult.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Conflict resolution flags for singleton registration.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct SingletonStrategy: u8 {
        /// The newly registered instance becomes current.
        const REPLACE = 1 << 0;
        /// The current instance stays, the newcomer is ignored.
        const KEEP_EXISTING = 1 << 1;
        /// Log a warning describing the conflict.
        const LOG_WARNING = 1 << 2;
        /// Log an error describing the conflict.
        const LOG_ERROR = 1 << 3;
        /// Fail the registration.
        const THROW = 1 << 4;
        /// Ask the host to destroy the losing instance.
        const DESTROY = 1 << 5;
    }
}

/// Flag names as they are spelled in source, in declaration order.
pub const STRATEGY_NAMES: &[(&str, SingletonStrategy)] = &[
    ("Replace", SingletonStrategy::REPLACE),
    ("KeepExisting", SingletonStrategy::KEEP_EXISTING),
    ("LogWarning", SingletonStrategy::LOG_WARNING),
    ("LogError", SingletonStrategy::LOG_ERROR),
    ("Throw", SingletonStrategy::THROW),
    ("Destroy", SingletonStrategy::DESTROY),
];

/// Pairs of flags that must not be combined.
const EXCLUSIVE_PAIRS: &[(SingletonStrategy, SingletonStrategy)] = &[
    (SingletonStrategy::REPLACE, SingletonStrategy::KEEP_EXISTING),
    (SingletonStrategy::THROW, SingletonStrategy::LOG_ERROR),
    (SingletonStrategy::THROW, SingletonStrategy::LOG_WARNING),
    (SingletonStrategy::LOG_ERROR, SingletonStrategy::LOG_WARNING),
    (SingletonStrategy::THROW, SingletonStrategy::DESTROY),
];

impl SingletonStrategy {
    /// Look up a single flag by its source spelling.
    pub fn from_source_name(name: &str) -> Option<Self> {
        STRATEGY_NAMES
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, flag)| *flag)
    }

    /// Source spelling of a single flag.
    pub fn name_of(flag: Self) -> Option<&'static str> {
        STRATEGY_NAMES
            .iter()
            .find(|(_, f)| *f == flag)
            .map(|(n, _)| *n)
    }

    /// Every flag that takes part in at least one illegal combination.
    pub fn conflicting_flags(self) -> Self {
        let mut out = Self::empty();
        for &(a, b) in EXCLUSIVE_PAIRS {
            if self.contains(a) && self.contains(b) {
                out |= a | b;
            }
        }
        out
    }

    /// Names of the conflicting flags, in declaration order.
    pub fn conflicts(self) -> Vec<&'static str> {
        let bad = self.conflicting_flags();
        STRATEGY_NAMES
            .iter()
            .filter(|(_, f)| bad.contains(*f))
            .map(|(n, _)| *n)
            .collect()
    }

    /// Whether the combination is legal.
    pub fn is_valid(self) -> bool {
        self.conflicting_flags().is_empty()
    }

    /// True when the newcomer should win a conflict.
    ///
    /// `KEEP_EXISTING` wins over the default; with neither flag set the
    /// newcomer replaces the current instance.
    pub fn newcomer_wins(self) -> bool {
        !self.contains(Self::KEEP_EXISTING)
    }
}

impl Default for SingletonStrategy {
    fn default() -> Self {
        Self::REPLACE | Self::LOG_WARNING
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(SingletonStrategy::default().is_valid());
    }

    #[test]
    fn test_replace_keep_existing_conflict() {
        let s = SingletonStrategy::REPLACE | SingletonStrategy::KEEP_EXISTING;
        assert_eq!(s.conflicts(), vec!["Replace", "KeepExisting"]);
    }

    #[test]
    fn test_log_levels_conflict() {
        let s = SingletonStrategy::LOG_WARNING
            | SingletonStrategy::LOG_ERROR
            | SingletonStrategy::REPLACE;
        assert_eq!(s.conflicts(), vec!["LogWarning", "LogError"]);
    }

    #[test]
    fn test_throw_destroy_conflict() {
        let s = SingletonStrategy::THROW
            | SingletonStrategy::DESTROY
            | SingletonStrategy::KEEP_EXISTING;
        assert_eq!(s.conflicts(), vec!["Throw", "Destroy"]);
    }

    #[test]
    fn test_replace_destroy_is_legal() {
        let s =
            SingletonStrategy::REPLACE | SingletonStrategy::DESTROY | SingletonStrategy::LOG_ERROR;
        assert!(s.is_valid());
    }

    #[test]
    fn test_name_lookup() {
        assert_eq!(SingletonStrategy::from_source_name("Throw"), Some(SingletonStrategy::THROW));
        assert_eq!(SingletonStrategy::from_source_name("Explode"), None);
        assert_eq!(SingletonStrategy::name_of(SingletonStrategy::DESTROY), Some("Destroy"));
    }
}

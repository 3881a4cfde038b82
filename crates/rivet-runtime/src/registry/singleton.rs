//! Singleton slot: at most one current instance per type or interface.

use tracing::{error, warn};

use crate::error::RegistryError;
use crate::strategy::SingletonStrategy;

/// Result of a successful singleton registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SingletonOutcome<H> {
    /// The slot was empty; the instance is now current.
    Registered,
    /// The instance was already current.
    AlreadyRegistered,
    /// The newcomer replaced `previous`.
    Replaced { previous: H, destroy: Option<H> },
    /// The current instance was kept and the newcomer ignored.
    Kept { current: H, destroy: Option<H> },
}

impl<H: Copy> SingletonOutcome<H> {
    /// The instance the host should destroy, if the strategy asked for it.
    pub fn to_destroy(&self) -> Option<H> {
        match *self {
            SingletonOutcome::Replaced { destroy, .. } | SingletonOutcome::Kept { destroy, .. } => {
                destroy
            }
            _ => None,
        }
    }
}

/// The current-instance slot for one singleton type or interface.
#[derive(Debug, Clone)]
pub struct SingletonSlot<H> {
    name: &'static str,
    current: Option<H>,
}

impl<H: Copy + Eq + std::fmt::Debug> SingletonSlot<H> {
    /// Create an empty slot. `name` is used in log and error messages.
    pub fn new(name: &'static str) -> Self {
        Self { name, current: None }
    }

    /// Slot name (usually the singleton type's name).
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Register `item`, resolving a conflict with `strategy`.
    pub fn register(
        &mut self,
        item: H,
        strategy: SingletonStrategy,
    ) -> Result<SingletonOutcome<H>, RegistryError> {
        let current = match self.current {
            None => {
                self.current = Some(item);
                return Ok(SingletonOutcome::Registered);
            }
            Some(current) if current == item => return Ok(SingletonOutcome::AlreadyRegistered),
            Some(current) => current,
        };

        if strategy.contains(SingletonStrategy::THROW) {
            return Err(RegistryError::SingletonConflict {
                registry: self.name,
            });
        }

        let replace = strategy.newcomer_wins();
        let (winner, loser) = if replace { (item, current) } else { (current, item) };
        if strategy.contains(SingletonStrategy::LOG_ERROR) {
            error!(
                singleton = self.name,
                ?winner,
                ?loser,
                "Singleton instance conflict: another instance is already registered"
            );
        } else if strategy.contains(SingletonStrategy::LOG_WARNING) {
            warn!(
                singleton = self.name,
                ?winner,
                ?loser,
                "Singleton instance conflict: another instance is already registered"
            );
        }

        let destroy = strategy
            .contains(SingletonStrategy::DESTROY)
            .then_some(loser);
        if replace {
            self.current = Some(item);
            Ok(SingletonOutcome::Replaced {
                previous: current,
                destroy,
            })
        } else {
            Ok(SingletonOutcome::Kept { current, destroy })
        }
    }

    /// Clear the slot if `item` is the current instance.
    ///
    /// Returns whether the slot was cleared. A disabled instance that lost a
    /// conflict earlier must not evict the winner.
    pub fn unregister(&mut self, item: H) -> bool {
        if self.current == Some(item) {
            self.current = None;
            true
        } else {
            false
        }
    }

    /// The current instance.
    pub fn get(&self) -> Option<H> {
        self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_registration() {
        let mut slot = SingletonSlot::new("GameManager");
        assert_eq!(
            slot.register(1u32, SingletonStrategy::default()),
            Ok(SingletonOutcome::Registered)
        );
        assert_eq!(slot.get(), Some(1));
    }

    #[test]
    fn test_same_instance_twice() {
        let mut slot = SingletonSlot::new("GameManager");
        slot.register(1u32, SingletonStrategy::default()).unwrap();
        assert_eq!(
            slot.register(1, SingletonStrategy::default()),
            Ok(SingletonOutcome::AlreadyRegistered)
        );
    }

    #[test]
    fn test_replace_strategy() {
        let mut slot = SingletonSlot::new("GameManager");
        slot.register(1u32, SingletonStrategy::REPLACE).unwrap();
        let outcome = slot.register(2, SingletonStrategy::REPLACE).unwrap();
        assert_eq!(outcome, SingletonOutcome::Replaced { previous: 1, destroy: None });
        assert_eq!(slot.get(), Some(2));
    }

    #[test]
    fn test_keep_existing_with_destroy() {
        let mut slot = SingletonSlot::new("GameManager");
        let strategy = SingletonStrategy::KEEP_EXISTING | SingletonStrategy::DESTROY;
        slot.register(1u32, strategy).unwrap();
        let outcome = slot.register(2, strategy).unwrap();
        assert_eq!(outcome.to_destroy(), Some(2));
        assert_eq!(slot.get(), Some(1));
    }

    #[test]
    fn test_throw_strategy_rejects() {
        let mut slot = SingletonSlot::new("GameManager");
        slot.register(1u32, SingletonStrategy::THROW).unwrap();
        let err = slot.register(2, SingletonStrategy::THROW).unwrap_err();
        assert_eq!(err, RegistryError::SingletonConflict { registry: "GameManager" });
        assert_eq!(slot.get(), Some(1));
    }

    #[test]
    fn test_loser_unregister_keeps_winner() {
        let mut slot = SingletonSlot::new("GameManager");
        slot.register(1u32, SingletonStrategy::REPLACE).unwrap();
        slot.register(2, SingletonStrategy::REPLACE).unwrap();
        assert!(!slot.unregister(1));
        assert_eq!(slot.get(), Some(2));
        assert!(slot.unregister(2));
        assert_eq!(slot.get(), None);
    }
}

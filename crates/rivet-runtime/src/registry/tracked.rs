//! Tracked-instance registry.
//!
//! Instances live in a dense vector. Removal swaps the last instance into the
//! vacated slot, so unregistering is O(1) when the caller knows the slot and
//! the moved instance is reported back so it can update its own slot index.

use crate::error::RegistryError;

/// An instance that was moved into a new slot by a swap-remove.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Moved<H> {
    /// The instance that moved.
    pub item: H,
    /// Its slot before the removal (always the old last slot).
    pub from: usize,
    /// Its slot after the removal.
    pub to: usize,
}

/// Implemented by host objects that remember their own tracked slot.
pub trait TrackedSlot {
    /// The slot this object currently occupies.
    fn tracked_slot(&self) -> usize;

    /// Called when a swap-remove moved this object.
    fn set_tracked_slot(&mut self, slot: usize);
}

/// Dense list of live instances for one type or interface.
#[derive(Debug, Clone)]
pub struct TrackedRegistry<H> {
    name: &'static str,
    items: Vec<H>,
}

impl<H: Copy + Eq> TrackedRegistry<H> {
    /// Create an empty registry. `name` is used in error messages.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            items: Vec::new(),
        }
    }

    /// Registry name (usually the tracked type's name).
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Append an instance and return its slot.
    ///
    /// Registering an instance that is already present returns its existing
    /// slot; enable/disable transitions are expected to pair up, but a
    /// double enable must not produce a duplicate entry.
    pub fn register(&mut self, item: H) -> usize {
        if let Some(slot) = self.slot_of(item) {
            return slot;
        }
        self.items.push(item);
        self.items.len() - 1
    }

    /// Remove an instance by value (linear search).
    ///
    /// Returns the swap-remove report, or `None` if the instance was not
    /// registered or was the last one.
    pub fn unregister(&mut self, item: H) -> Option<Moved<H>> {
        let slot = self.slot_of(item)?;
        self.swap_remove(slot)
    }

    /// Remove the instance at `slot` in O(1).
    pub fn unregister_at(&mut self, slot: usize) -> Result<Option<Moved<H>>, RegistryError> {
        if slot >= self.items.len() {
            return Err(RegistryError::SlotOutOfRange {
                registry: self.name,
                slot,
                len: self.items.len(),
            });
        }
        Ok(self.swap_remove(slot))
    }

    fn swap_remove(&mut self, slot: usize) -> Option<Moved<H>> {
        let last = self.items.len() - 1;
        self.items.swap_remove(slot);
        if slot == last {
            None
        } else {
            Some(Moved {
                item: self.items[slot],
                from: last,
                to: slot,
            })
        }
    }

    /// Slot of an instance, if registered.
    pub fn slot_of(&self, item: H) -> Option<usize> {
        self.items.iter().position(|&i| i == item)
    }

    /// All live instances, in slot order.
    pub fn instances(&self) -> &[H] {
        &self.items
    }

    /// Number of live instances.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if no instance is registered.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_assigns_dense_slots() {
        let mut reg = TrackedRegistry::new("Enemy");
        assert_eq!(reg.register(10u32), 0);
        assert_eq!(reg.register(11), 1);
        assert_eq!(reg.register(12), 2);
        assert_eq!(reg.instances(), &[10, 11, 12]);
    }

    #[test]
    fn test_double_register_is_idempotent() {
        let mut reg = TrackedRegistry::new("Enemy");
        reg.register(1u32);
        assert_eq!(reg.register(1), 0);
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn test_unregister_middle_moves_last() {
        let mut reg = TrackedRegistry::new("Enemy");
        reg.register(1u32);
        reg.register(2);
        reg.register(3);
        let moved = reg.unregister(2);
        assert_eq!(moved, Some(Moved { item: 3, from: 2, to: 1 }));
        assert_eq!(reg.instances(), &[1, 3]);
    }

    #[test]
    fn test_unregister_last_moves_nothing() {
        let mut reg = TrackedRegistry::new("Enemy");
        reg.register(1u32);
        reg.register(2);
        assert_eq!(reg.unregister(2), None);
        assert_eq!(reg.instances(), &[1]);
    }

    #[test]
    fn test_unregister_unknown_is_noop() {
        let mut reg = TrackedRegistry::new("Enemy");
        reg.register(1u32);
        assert_eq!(reg.unregister(9), None);
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn test_unregister_at_out_of_range() {
        let mut reg: TrackedRegistry<u32> = TrackedRegistry::new("Enemy");
        let err = reg.unregister_at(0).unwrap_err();
        assert_eq!(
            err,
            RegistryError::SlotOutOfRange {
                registry: "Enemy",
                slot: 0,
                len: 0
            }
        );
    }
}

//! Per-type registries for tracked instances and singletons.
//!
//! Generated enable/disable hooks call into a [`Registries`] value owned by
//! the host application (or scene). There is one tracked list and one
//! singleton slot per key type, where the key is any Rust type or trait
//! object type (`dyn Trait` for interface registrations).

pub mod singleton;
pub mod tracked;

use std::any::{type_name, TypeId};
use std::fmt::Debug;

use rustc_hash::FxHashMap;

use crate::error::RegistryError;
use crate::strategy::SingletonStrategy;

pub use singleton::{SingletonOutcome, SingletonSlot};
pub use tracked::{Moved, TrackedRegistry, TrackedSlot};

/// All registries of one application, keyed by role type.
///
/// `H` is the host's handle type for live objects.
#[derive(Debug)]
pub struct Registries<H> {
    tracked: FxHashMap<TypeId, TrackedRegistry<H>>,
    singletons: FxHashMap<TypeId, SingletonSlot<H>>,
}

impl<H> Default for Registries<H> {
    fn default() -> Self {
        Self {
            tracked: FxHashMap::default(),
            singletons: FxHashMap::default(),
        }
    }
}

impl<H: Copy + Eq + Debug> Registries<H> {
    /// Create an empty set of registries.
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------
    // Tracked instances
    // ------------------------------------------------------------------

    /// Add `item` to the tracked list of `T` and return its slot.
    pub fn register_tracked<T: ?Sized + 'static>(&mut self, item: H) -> usize {
        self.tracked
            .entry(TypeId::of::<T>())
            .or_insert_with(|| TrackedRegistry::new(type_name::<T>()))
            .register(item)
    }

    /// Remove `item` from the tracked list of `T`.
    pub fn unregister_tracked<T: ?Sized + 'static>(&mut self, item: H) -> Option<Moved<H>> {
        self.tracked
            .get_mut(&TypeId::of::<T>())
            .and_then(|reg| reg.unregister(item))
    }

    /// Remove the instance at `slot` from the tracked list of `T`.
    pub fn unregister_tracked_at<T: ?Sized + 'static>(
        &mut self,
        slot: usize,
    ) -> Result<Option<Moved<H>>, RegistryError> {
        match self.tracked.get_mut(&TypeId::of::<T>()) {
            Some(reg) => reg.unregister_at(slot),
            None => Err(RegistryError::SlotOutOfRange {
                registry: type_name::<T>(),
                slot,
                len: 0,
            }),
        }
    }

    /// Remove the instance at `slot` and report a moved instance to `on_moved`
    /// so its self-reported slot can be updated.
    pub fn unregister_tracked_at_with<T: ?Sized + 'static>(
        &mut self,
        slot: usize,
        on_moved: impl FnOnce(Moved<H>),
    ) -> Result<(), RegistryError> {
        if let Some(moved) = self.unregister_tracked_at::<T>(slot)? {
            on_moved(moved);
        }
        Ok(())
    }

    /// All live instances tracked under `T`.
    pub fn tracked<T: ?Sized + 'static>(&self) -> &[H] {
        self.tracked
            .get(&TypeId::of::<T>())
            .map(|reg| reg.instances())
            .unwrap_or(&[])
    }

    // ------------------------------------------------------------------
    // Singletons
    // ------------------------------------------------------------------

    /// Make `item` the current singleton of `T`, resolving conflicts with `strategy`.
    pub fn register_singleton<T: ?Sized + 'static>(
        &mut self,
        item: H,
        strategy: SingletonStrategy,
    ) -> Result<SingletonOutcome<H>, RegistryError> {
        self.singletons
            .entry(TypeId::of::<T>())
            .or_insert_with(|| SingletonSlot::new(type_name::<T>()))
            .register(item, strategy)
    }

    /// Clear the singleton of `T` if `item` is current.
    pub fn unregister_singleton<T: ?Sized + 'static>(&mut self, item: H) -> bool {
        self.singletons
            .get_mut(&TypeId::of::<T>())
            .is_some_and(|slot| slot.unregister(item))
    }

    /// The current singleton of `T`.
    pub fn singleton<T: ?Sized + 'static>(&self) -> Option<H> {
        self.singletons
            .get(&TypeId::of::<T>())
            .and_then(|slot| slot.get())
    }
}

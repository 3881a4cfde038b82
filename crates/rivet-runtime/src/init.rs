//! Initialization call table.
//!
//! Woven types implement their injection logic in an initialization method.
//! Hosts that need to trigger that logic without knowing the concrete type
//! register one function per type here and call [`InitTable::initialize`]
//! with a type-erased object.

use std::any::{type_name, Any, TypeId};

use rustc_hash::FxHashMap;
use tracing::trace;

type InitFn = Box<dyn Fn(&mut dyn Any) + Send + Sync>;

/// Per-type initialization functions.
#[derive(Default)]
pub struct InitTable {
    entries: FxHashMap<TypeId, (&'static str, InitFn)>,
}

impl InitTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the initializer for `T`. A later registration replaces an earlier one.
    pub fn register<T: Any>(&mut self, init: fn(&mut T)) {
        let erased: InitFn = Box::new(move |object: &mut dyn Any| {
            if let Some(object) = object.downcast_mut::<T>() {
                init(object);
            }
        });
        self.entries
            .insert(TypeId::of::<T>(), (type_name::<T>(), erased));
    }

    /// Whether `T` has an initializer.
    pub fn contains<T: Any>(&self) -> bool {
        self.entries.contains_key(&TypeId::of::<T>())
    }

    /// Run the initializer registered for the dynamic type of `object`.
    ///
    /// Returns `false` when the type has none.
    pub fn initialize(&self, object: &mut dyn Any) -> bool {
        let key = (*object).type_id();
        match self.entries.get(&key) {
            Some((name, init)) => {
                trace!(component = name, "running initializer");
                init(object);
                true
            }
            None => false,
        }
    }

    /// Number of registered types.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for InitTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<_> = self.entries.values().map(|(name, _)| *name).collect();
        names.sort_unstable();
        f.debug_struct("InitTable").field("types", &names).finish()
    }
}

//! Lifecycle method synthesis.
//!
//! Woven code goes into engine callbacks (`Awake`, `OnEnable`, `OnDisable`).
//! When a type does not declare the callback, one is synthesized that first
//! calls the nearest base implementation. Handles are cached per
//! `(type, name)` for the whole pass, and each handle keeps an insertion
//! cursor so code woven later lands after code woven earlier but before the
//! user's own statements.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::error::{WeaveError, WeaveResult};

use super::il::{IlModule, IlMethod, Instr, MethodFlags, MethodRef};

/// Interface implemented by every type with a synthesized initialization
/// method, so hosts can initialize objects polymorphically.
pub const INITIALIZABLE: &str = "Rivet.Internal.IInitializable";
pub const INITIALIZE: &str = "Initialize";

/// A method of a module type, stable for the lifetime of the module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MethodHandle {
    pub type_index: usize,
    pub method_index: usize,
}

pub struct LifecycleSynthesizer {
    init_method: String,
    handles: FxHashMap<(usize, String), MethodHandle>,
    cursors: FxHashMap<MethodHandle, usize>,
    synthesized: FxHashSet<MethodHandle>,
    /// `(type, callback)` pairs that received woven code or a base call.
    touched: FxHashSet<(usize, String)>,
    touched_names: Vec<String>,
}

impl LifecycleSynthesizer {
    pub fn new(init_method: impl Into<String>) -> Self {
        Self {
            init_method: init_method.into(),
            handles: FxHashMap::default(),
            cursors: FxHashMap::default(),
            synthesized: FxHashSet::default(),
            touched: FxHashSet::default(),
            touched_names: Vec::new(),
        }
    }

    /// The parameterless `void` method `name` of `type_name`, synthesized if
    /// the type does not declare one.
    pub fn get_or_create(
        &mut self,
        module: &mut IlModule,
        type_name: &str,
        name: &str,
    ) -> WeaveResult<MethodHandle> {
        let type_index = module
            .type_index(type_name)
            .ok_or_else(|| WeaveError::TypeNotFound(type_name.to_string()))?;
        if let Some(&handle) = self.handles.get(&(type_index, name.to_string())) {
            return Ok(handle);
        }

        let handle = match module.types[type_index].lifecycle_index(name) {
            Some(method_index) => {
                let handle = MethodHandle {
                    type_index,
                    method_index,
                };
                self.cursors.insert(handle, 0);
                handle
            }
            None => self.synthesize(module, type_index, name),
        };
        self.handles.insert((type_index, name.to_string()), handle);
        Ok(handle)
    }

    fn synthesize(&mut self, module: &mut IlModule, type_index: usize, name: &str) -> MethodHandle {
        let base_call = base_lifecycle(module, &module.types[type_index].full_name, name);
        let mut method = IlMethod::new(name);
        let mut cursor = 0;
        if let Some((target, is_virtual)) = base_call {
            if is_virtual {
                method.flags |= MethodFlags::VIRTUAL;
            }
            method.body = vec![Instr::LoadThis, Instr::Call(target), Instr::Return];
            cursor = 2;
        }

        if name == self.init_method {
            if !method.flags.contains(MethodFlags::VIRTUAL) {
                method.flags |= MethodFlags::VIRTUAL | MethodFlags::NEW_SLOT | MethodFlags::FINAL;
            }
            method.overrides.push(MethodRef::void(INITIALIZABLE, INITIALIZE));
            let ty = &mut module.types[type_index];
            if !ty.interfaces.iter().any(|i| i == INITIALIZABLE) {
                ty.interfaces.push(INITIALIZABLE.to_string());
            }
        }

        let ty = &mut module.types[type_index];
        tracing::trace!(
            ty = %ty.full_name,
            method = name,
            base_call = cursor > 0,
            "synthesized lifecycle method"
        );
        ty.methods.push(method);
        let handle = MethodHandle {
            type_index,
            method_index: ty.methods.len() - 1,
        };
        self.cursors.insert(handle, cursor);
        self.synthesized.insert(handle);
        handle
    }

    pub fn was_synthesized(&self, handle: MethodHandle) -> bool {
        self.synthesized.contains(&handle)
    }

    pub fn method<'m>(
        &self,
        module: &'m IlModule,
        handle: MethodHandle,
    ) -> WeaveResult<&'m IlMethod> {
        module
            .types
            .get(handle.type_index)
            .and_then(|t| t.methods.get(handle.method_index))
            .ok_or_else(|| WeaveError::Internal(format!("stale method handle {:?}", handle)))
    }

    /// Insert `code` at the handle's cursor and advance it.
    pub fn insert(
        &mut self,
        module: &mut IlModule,
        handle: MethodHandle,
        code: Vec<Instr>,
    ) -> WeaveResult<()> {
        let ty = module
            .types
            .get_mut(handle.type_index)
            .ok_or_else(|| WeaveError::Internal(format!("stale method handle {:?}", handle)))?;
        let method = ty
            .methods
            .get_mut(handle.method_index)
            .ok_or_else(|| WeaveError::Internal(format!("stale method handle {:?}", handle)))?;
        let cursor = self.cursors.entry(handle).or_insert(0);
        let at = (*cursor).min(method.body.len());
        let len = code.len();
        method.body.splice(at..at, code);
        *cursor = at + len;

        let name = method.name.clone();
        if !self.touched_names.contains(&name) {
            self.touched_names.push(name.clone());
        }
        self.touched.insert((handle.type_index, name));
        Ok(())
    }

    /// Give every user-declared callback that hides a woven base callback a
    /// call to it, so the base's woven code still runs. Returns the number
    /// of calls added; a second run adds none.
    pub fn ensure_base_calls(&mut self, module: &mut IlModule) -> usize {
        let order = module.base_first_order();
        let mut added = 0;
        for name in self.touched_names.clone() {
            for &type_index in &order {
                let Some(method_index) = module.types[type_index].lifecycle_index(&name) else {
                    continue;
                };
                let handle = MethodHandle {
                    type_index,
                    method_index,
                };
                if self.synthesized.contains(&handle) {
                    continue;
                }
                let owner = &module.types[type_index].full_name;
                let Some((target, _)) = base_lifecycle(module, owner, &name) else {
                    continue;
                };
                let reaches_woven = module
                    .type_index(&target.declaring_type)
                    .is_some_and(|base| self.touched.contains(&(base, name.clone())));
                if !reaches_woven {
                    continue;
                }
                let method = &mut module.types[type_index].methods[method_index];
                if !method.calls(&target) {
                    method.body.splice(0..0, [Instr::LoadThis, Instr::Call(target)]);
                    if let Some(cursor) = self.cursors.get_mut(&handle) {
                        *cursor += 2;
                    }
                    added += 1;
                }
                self.touched.insert((type_index, name.clone()));
            }
        }
        added
    }
}

/// The nearest callable base implementation of callback `name`, and whether
/// it is virtual.
fn base_lifecycle(module: &IlModule, type_name: &str, name: &str) -> Option<(MethodRef, bool)> {
    module.base_chain(type_name).into_iter().find_map(|ty| {
        ty.methods
            .iter()
            .find(|m| m.is_lifecycle(name))
            .filter(|m| !m.flags.intersects(MethodFlags::PRIVATE | MethodFlags::ABSTRACT))
            .map(|m| (m.reference(&ty.full_name), m.flags.contains(MethodFlags::VIRTUAL)))
    })
}

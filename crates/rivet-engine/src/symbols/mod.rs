//! Symbol table and semantic queries over a [`Compilation`].
//!
//! Every declared type (source and reference, nested included) gets a
//! [`SymbolId`]. Type references are resolved the way C# looks names up:
//! an exact fully-qualified match first, then outward through containing
//! types and enclosing namespaces. A reference that does not resolve is
//! simply `None`; queries treat it as "attribute absent" and never fail.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::syntax::names::{self, qualify};
use crate::syntax::{Attribute, Compilation, Member, TypeDecl, TypeKind, TypeRef};

/// Index of a type in the [`SymbolTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolId(u32);

impl SymbolId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A declared type and where it lives.
#[derive(Debug)]
pub struct TypeInfo<'c> {
    pub decl: &'c TypeDecl,
    pub full_name: String,
    pub containing: Option<SymbolId>,
    /// Index into `Compilation::files`; `None` for referenced types.
    pub file: Option<usize>,
}

impl TypeInfo<'_> {
    pub fn is_reference(&self) -> bool {
        self.file.is_none()
    }

    pub fn kind(&self) -> TypeKind {
        self.decl.kind
    }
}

/// All types of a compilation and the queries over them.
pub struct SymbolTable<'c> {
    compilation: &'c Compilation,
    types: Vec<TypeInfo<'c>>,
    by_name: FxHashMap<String, SymbolId>,
    engine_namespace: String,
}

impl<'c> SymbolTable<'c> {
    pub fn new(compilation: &'c Compilation, engine_namespace: &str) -> Self {
        let mut table = Self {
            compilation,
            types: Vec::new(),
            by_name: FxHashMap::default(),
            engine_namespace: engine_namespace.to_string(),
        };
        for (index, file) in compilation.files.iter().enumerate() {
            for decl in &file.types {
                table.declare(decl, None, Some(index));
            }
        }
        for decl in &compilation.references {
            table.declare(decl, None, None);
        }
        table
    }

    fn declare(&mut self, decl: &'c TypeDecl, containing: Option<SymbolId>, file: Option<usize>) {
        let full_name = match containing {
            Some(outer) => format!("{}.{}", self.types[outer.index()].full_name, decl.name),
            None => qualify(&decl.namespace, &decl.name),
        };
        let id = SymbolId(self.types.len() as u32);
        // Partial declarations split over files share a name; the first one wins lookups.
        self.by_name.entry(full_name.clone()).or_insert(id);
        self.types.push(TypeInfo {
            decl,
            full_name,
            containing,
            file,
        });
        for nested in &decl.nested {
            self.declare(nested, Some(id), file);
        }
    }

    pub fn compilation(&self) -> &'c Compilation {
        self.compilation
    }

    pub fn engine_namespace(&self) -> &str {
        &self.engine_namespace
    }

    pub fn get(&self, id: SymbolId) -> &TypeInfo<'c> {
        &self.types[id.index()]
    }

    pub fn decl(&self, id: SymbolId) -> &'c TypeDecl {
        self.types[id.index()].decl
    }

    pub fn full_name(&self, id: SymbolId) -> &str {
        &self.types[id.index()].full_name
    }

    /// Path of the file that declares `id`, or the assembly name for references.
    pub fn file_path(&self, id: SymbolId) -> &'c str {
        match self.types[id.index()].file {
            Some(index) => &self.compilation.files[index].path,
            None => &self.compilation.assembly,
        }
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Types declared in source, in declaration order (outer before nested).
    pub fn source_types(&self) -> impl Iterator<Item = SymbolId> + '_ {
        self.types
            .iter()
            .enumerate()
            .filter(|(_, info)| !info.is_reference())
            .map(|(i, _)| SymbolId(i as u32))
    }

    /// Exact lookup by fully-qualified name.
    pub fn lookup(&self, full_name: &str) -> Option<SymbolId> {
        let name = full_name.strip_prefix("global::").unwrap_or(full_name);
        self.by_name.get(name).copied()
    }

    /// Resolve a written type reference from inside `context`.
    ///
    /// Arrays resolve to their element type.
    pub fn resolve(&self, ty: &TypeRef, context: Option<SymbolId>) -> Option<SymbolId> {
        self.resolve_name(&ty.name, context)
    }

    pub fn resolve_name(&self, name: &str, context: Option<SymbolId>) -> Option<SymbolId> {
        if let Some(global) = name.strip_prefix("global::") {
            return self.lookup(global);
        }
        if let Some(id) = self.lookup(name) {
            return Some(id);
        }
        let context = context?;

        // Containing types, innermost first (the context itself included).
        let mut scope = Some(context);
        let mut outermost = context;
        while let Some(id) = scope {
            if let Some(found) = self.lookup(&format!("{}.{}", self.full_name(id), name)) {
                return Some(found);
            }
            outermost = id;
            scope = self.get(id).containing;
        }

        // Then the enclosing namespaces, innermost first.
        let mut namespace = self.decl(outermost).namespace.as_str();
        while !namespace.is_empty() {
            if let Some(found) = self.lookup(&qualify(namespace, name)) {
                return Some(found);
            }
            namespace = match namespace.rfind('.') {
                Some(dot) => &namespace[..dot],
                None => "",
            };
        }

        // Engine types are imported everywhere.
        self.lookup(&qualify(&self.engine_namespace, name))
    }

    // ------------------------------------------------------------------
    // Inheritance
    // ------------------------------------------------------------------

    pub fn base_of(&self, id: SymbolId) -> Option<SymbolId> {
        let decl = self.decl(id);
        let base = decl.base.as_ref()?;
        self.resolve(base, self.get(id).containing.or(Some(id)))
            .filter(|&b| b != id)
    }

    /// Base classes of `id`, nearest first, excluding `id`.
    pub fn base_chain(&self, id: SymbolId) -> Vec<SymbolId> {
        let mut chain = Vec::new();
        let mut seen = FxHashSet::default();
        seen.insert(id);
        let mut current = self.base_of(id);
        while let Some(base) = current {
            if !seen.insert(base) {
                break;
            }
            chain.push(base);
            current = self.base_of(base);
        }
        chain
    }

    /// Interfaces declared on `id` plus everything they extend, in first-seen order.
    pub fn interfaces_of(&self, id: SymbolId) -> Vec<SymbolId> {
        let mut out = Vec::new();
        let mut seen = FxHashSet::default();
        self.collect_interfaces(id, &mut out, &mut seen);
        out
    }

    fn collect_interfaces(
        &self,
        id: SymbolId,
        out: &mut Vec<SymbolId>,
        seen: &mut FxHashSet<SymbolId>,
    ) {
        for iface in &self.decl(id).interfaces {
            let Some(resolved) = self.resolve(iface, Some(id)) else {
                continue;
            };
            if self.decl(resolved).kind != TypeKind::Interface || !seen.insert(resolved) {
                continue;
            }
            out.push(resolved);
            self.collect_interfaces(resolved, out, seen);
        }
    }

    /// Every interface `id` implements, including through base classes.
    pub fn all_interfaces(&self, id: SymbolId) -> Vec<SymbolId> {
        let mut out = Vec::new();
        let mut seen = FxHashSet::default();
        self.collect_interfaces(id, &mut out, &mut seen);
        for base in self.base_chain(id) {
            self.collect_interfaces(base, &mut out, &mut seen);
        }
        out
    }

    /// Whether `id` is, or derives from, the type named `full_name`.
    pub fn derives_from(&self, id: SymbolId, full_name: &str) -> bool {
        if self.full_name(id) == full_name {
            return true;
        }
        self.base_chain(id)
            .into_iter()
            .any(|base| self.full_name(base) == full_name)
            || self
                .decl(id)
                .base
                .as_ref()
                .is_some_and(|b| self.resolve(b, Some(id)).is_none() && b.name == full_name)
    }

    /// Whether `id` derives from the engine's component base type.
    pub fn is_component(&self, id: SymbolId) -> bool {
        self.derives_from(id, &qualify(&self.engine_namespace, names::COMPONENT))
    }

    /// Whether `id` belongs to the engine's own namespace.
    pub fn is_engine_type(&self, id: SymbolId) -> bool {
        self.is_engine_name(self.full_name(id))
    }

    pub fn is_engine_name(&self, full_name: &str) -> bool {
        full_name
            .strip_prefix(self.engine_namespace.as_str())
            .is_some_and(|rest| rest.starts_with('.'))
    }

    // ------------------------------------------------------------------
    // Attributes
    // ------------------------------------------------------------------

    pub fn attribute(&self, id: SymbolId, canonical: &str) -> Option<&'c Attribute> {
        self.decl(id).attribute(canonical)
    }

    pub fn has_attribute(&self, id: SymbolId, canonical: &str) -> bool {
        self.attribute(id, canonical).is_some()
    }

    /// The type carrying `canonical`: `id` itself, then its base chain, then
    /// every implemented interface.
    pub fn find_attribute(&self, id: SymbolId, canonical: &str) -> Option<SymbolId> {
        if self.has_attribute(id, canonical) {
            return Some(id);
        }
        self.base_chain(id)
            .into_iter()
            .chain(self.all_interfaces(id))
            .find(|&t| self.has_attribute(t, canonical))
    }

    /// Nearest base class carrying `canonical`, excluding `id`.
    pub fn attribute_in_base_chain(&self, id: SymbolId, canonical: &str) -> Option<SymbolId> {
        self.base_chain(id)
            .into_iter()
            .find(|&t| self.has_attribute(t, canonical))
    }

    // ------------------------------------------------------------------
    // Members
    // ------------------------------------------------------------------

    /// Non-static declared members of `id` matching `pred`.
    pub fn instance_members(
        &self,
        id: SymbolId,
        pred: impl Fn(&Member) -> bool,
    ) -> Vec<&'c Member> {
        self.decl(id)
            .members
            .iter()
            .filter(|m| !m.is_static() && pred(m))
            .collect()
    }

    /// A member visible on `id` by name, searching base classes too.
    pub fn find_member(&self, id: SymbolId, name: &str) -> Option<(SymbolId, &'c Member)> {
        std::iter::once(id)
            .chain(self.base_chain(id))
            .find_map(|t| self.decl(t).member(name).map(|m| (t, m)))
    }

    /// Source types that declare `iface` among their interfaces (directly or
    /// through an interface they declare).
    pub fn implementors_of(&self, iface: SymbolId) -> Vec<SymbolId> {
        self.source_types()
            .filter(|&t| self.decl(t).kind != TypeKind::Interface)
            .filter(|&t| self.interfaces_of(t).contains(&iface))
            .collect()
    }

    /// Types declared directly inside `id`.
    pub fn nested_types(&self, id: SymbolId) -> Vec<SymbolId> {
        self.types
            .iter()
            .enumerate()
            .filter(|(_, info)| info.containing == Some(id))
            .map(|(i, _)| SymbolId(i as u32))
            .collect()
    }

    /// Containing types of `id`, outermost first.
    pub fn containing_chain(&self, id: SymbolId) -> Vec<SymbolId> {
        let mut chain = Vec::new();
        let mut current = self.get(id).containing;
        while let Some(outer) = current {
            chain.push(outer);
            current = self.get(outer).containing;
        }
        chain.reverse();
        chain
    }
}

impl std::fmt::Debug for SymbolTable<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SymbolTable")
            .field("assembly", &self.compilation.assembly)
            .field("types", &self.types.len())
            .finish()
    }
}

//! Structural analysis of tagged-union families.
//!
//! A *header* is a struct marked `[UnionHeader]` that declares one nested
//! public interface and (for a root header) a `TypeId` field of the
//! generated `TypeIds` enum. A *variant* is a struct marked `[Union]` whose
//! first instance field is a header. A header whose own first field is
//! another header is *nested*; it shares the root's type IDs.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::symbols::{SymbolId, SymbolTable};
use crate::syntax::names;
use crate::syntax::{Expression, FieldDecl, Modifier, TypeDecl, TypeKind};

pub fn is_header(symbols: &SymbolTable<'_>, id: SymbolId) -> bool {
    symbols.has_attribute(id, names::UNION_HEADER)
}

pub fn is_variant(symbols: &SymbolTable<'_>, id: SymbolId) -> bool {
    symbols.has_attribute(id, names::UNION)
}

pub fn first_instance_field(decl: &TypeDecl) -> Option<&FieldDecl> {
    decl.instance_fields().next()
}

/// The header type stored in the first instance field of `id`.
pub fn leading_header(symbols: &SymbolTable<'_>, id: SymbolId) -> Option<SymbolId> {
    let field = first_instance_field(symbols.decl(id))?;
    if field.ty.is_array() {
        return None;
    }
    symbols
        .resolve(&field.ty, Some(id))
        .filter(|&h| h != id && is_header(symbols, h))
}

/// The first instance field of `id` (after the first) whose type is a header.
pub fn misplaced_header_field<'c>(
    symbols: &SymbolTable<'c>,
    id: SymbolId,
) -> Option<&'c FieldDecl> {
    symbols
        .decl(id)
        .instance_fields()
        .skip(1)
        .find(|f| symbols.resolve(&f.ty, Some(id)).is_some_and(|h| is_header(symbols, h)))
}

/// Nested public interfaces of a header.
pub fn nested_interfaces(symbols: &SymbolTable<'_>, header: SymbolId) -> Vec<SymbolId> {
    symbols
        .nested_types(header)
        .into_iter()
        .filter(|&t| {
            let decl = symbols.decl(t);
            decl.kind == TypeKind::Interface && decl.has_modifier(Modifier::Public)
        })
        .collect()
}

/// The header's interface, when it declares exactly one.
pub fn header_interface(symbols: &SymbolTable<'_>, header: SymbolId) -> Option<SymbolId> {
    match nested_interfaces(symbols, header).as_slice() {
        [single] => Some(*single),
        _ => None,
    }
}

/// The header `iface` is the nested interface of.
pub fn interface_owner(symbols: &SymbolTable<'_>, iface: SymbolId) -> Option<SymbolId> {
    let owner = symbols.get(iface).containing?;
    (is_header(symbols, owner) && nested_interfaces(symbols, owner).contains(&iface))
        .then_some(owner)
}

/// The root header of a (possibly nested) header.
pub fn root_header(symbols: &SymbolTable<'_>, header: SymbolId) -> SymbolId {
    let mut seen = FxHashSet::default();
    let mut current = header;
    while seen.insert(current) {
        match leading_header(symbols, current) {
            Some(parent) => current = parent,
            None => break,
        }
    }
    current
}

/// Whether a root header declares its `TypeId` field.
pub fn has_type_id_field(decl: &TypeDecl) -> bool {
    decl.instance_fields()
        .any(|f| f.name == names::TYPE_ID_FIELD && f.ty.simple_name() == names::TYPE_IDS_ENUM)
}

// ============================================================================
// Per-declaration issues
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderIssue {
    /// Number of nested public interfaces found (must be one).
    InterfaceCount(usize),
    MissingTypeId,
    NotValueType,
}

pub fn header_issues(symbols: &SymbolTable<'_>, header: SymbolId) -> Vec<HeaderIssue> {
    let decl = symbols.decl(header);
    let mut issues = Vec::new();
    let count = nested_interfaces(symbols, header).len();
    if count != 1 {
        issues.push(HeaderIssue::InterfaceCount(count));
    }
    if leading_header(symbols, header).is_none() && !has_type_id_field(decl) {
        issues.push(HeaderIssue::MissingTypeId);
    }
    if !decl.is_value_type() {
        issues.push(HeaderIssue::NotValueType);
    }
    issues
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VariantIssue {
    MissingHeader,
    /// A header-typed field exists but is not the first instance field.
    HeaderNotFirst(String),
    /// The variant does not implement its header's interface.
    MissingInterface { header: SymbolId, interface: SymbolId },
    NotValueType,
}

pub fn variant_issues(symbols: &SymbolTable<'_>, variant: SymbolId) -> Vec<VariantIssue> {
    let decl = symbols.decl(variant);
    let mut issues = Vec::new();
    match leading_header(symbols, variant) {
        Some(header) => {
            if let Some(iface) = header_interface(symbols, header) {
                if !symbols.all_interfaces(variant).contains(&iface) {
                    issues.push(VariantIssue::MissingInterface {
                        header,
                        interface: iface,
                    });
                }
            }
        }
        None => match misplaced_header_field(symbols, variant) {
            Some(field) => issues.push(VariantIssue::HeaderNotFirst(field.name.clone())),
            None => issues.push(VariantIssue::MissingHeader),
        },
    }
    if !decl.is_value_type() {
        issues.push(VariantIssue::NotValueType);
    }
    issues
}

// ============================================================================
// Families and type IDs
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdIssue {
    /// 0 is reserved for the unset value.
    Reserved,
    /// Does not fit in 16 bits.
    OutOfRange(i64),
    /// Same explicit ID as an earlier variant.
    Duplicate { type_id: u16, first: SymbolId },
}

/// Explicit ID argument of a `[Union]` attribute.
pub fn explicit_id(symbols: &SymbolTable<'_>, variant: SymbolId) -> Option<i64> {
    symbols
        .attribute(variant, names::UNION)?
        .positional(0)
        .and_then(Expression::as_int)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VariantLayout {
    pub id: SymbolId,
    /// The header stored in the variant's first field.
    pub header: SymbolId,
    pub type_id: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FamilyLayout {
    pub root: SymbolId,
    /// Root first, then nested headers by name.
    pub headers: Vec<SymbolId>,
    /// Sorted by type ID.
    pub variants: Vec<VariantLayout>,
    pub id_issues: Vec<(SymbolId, IdIssue)>,
}

impl FamilyLayout {
    pub fn max_type_id(&self) -> u16 {
        self.variants.iter().map(|v| v.type_id).max().unwrap_or(0)
    }

    /// Variants whose header is `header` or a header nested under it.
    pub fn variants_under(
        &self,
        symbols: &SymbolTable<'_>,
        header: SymbolId,
    ) -> Vec<VariantLayout> {
        self.variants
            .iter()
            .copied()
            .filter(|v| header_chain(symbols, v.header).contains(&header))
            .collect()
    }

    /// Whether every header, variant and ID of the family is well-formed.
    pub fn is_valid(&self, symbols: &SymbolTable<'_>) -> bool {
        self.id_issues.is_empty()
            && self.headers.iter().all(|&h| header_issues(symbols, h).is_empty())
            && self.variants.iter().all(|v| variant_issues(symbols, v.id).is_empty())
    }
}

/// `header`, its parent header, and so on up to the root.
pub fn header_chain(symbols: &SymbolTable<'_>, header: SymbolId) -> Vec<SymbolId> {
    let mut chain = vec![header];
    let mut current = header;
    while let Some(parent) = leading_header(symbols, current) {
        if chain.contains(&parent) {
            break;
        }
        chain.push(parent);
        current = parent;
    }
    chain
}

/// Every union family declared in source, ordered by root name.
pub fn collect_families(symbols: &SymbolTable<'_>) -> Vec<FamilyLayout> {
    let by_name = |a: &SymbolId, b: &SymbolId| symbols.full_name(*a).cmp(symbols.full_name(*b));

    let mut headers: Vec<SymbolId> = symbols
        .source_types()
        .filter(|&t| is_header(symbols, t))
        .collect();
    headers.sort_by(by_name);
    let mut variants: Vec<SymbolId> = symbols
        .source_types()
        .filter(|&t| is_variant(symbols, t))
        .collect();
    variants.sort_by(by_name);

    let mut families: Vec<FamilyLayout> = Vec::new();
    let mut index_of_root: FxHashMap<SymbolId, usize> = FxHashMap::default();
    for &header in &headers {
        let root = root_header(symbols, header);
        if !index_of_root.contains_key(&root) {
            index_of_root.insert(root, families.len());
            families.push(FamilyLayout {
                root,
                headers: vec![root],
                variants: Vec::new(),
                id_issues: Vec::new(),
            });
        }
        let family = &mut families[index_of_root[&root]];
        if !family.headers.contains(&header) {
            family.headers.push(header);
        }
    }

    for &variant in &variants {
        let Some(header) = leading_header(symbols, variant) else {
            continue;
        };
        let root = root_header(symbols, header);
        if let Some(&index) = index_of_root.get(&root) {
            families[index].variants.push(VariantLayout {
                id: variant,
                header,
                type_id: 0,
            });
        }
    }

    for family in &mut families {
        assign_ids(symbols, family);
    }
    families.sort_by(|a, b| by_name(&a.root, &b.root));
    families
}

/// Explicit IDs are honoured (first by name wins on duplicates); the rest get
/// the lowest free ID starting at 1, in name order.
fn assign_ids(symbols: &SymbolTable<'_>, family: &mut FamilyLayout) {
    let mut used: FxHashMap<u16, SymbolId> = FxHashMap::default();
    let mut pending = Vec::new();
    for (index, variant) in family.variants.iter_mut().enumerate() {
        match explicit_id(symbols, variant.id) {
            Some(0) => family.id_issues.push((variant.id, IdIssue::Reserved)),
            Some(raw) => match u16::try_from(raw) {
                Ok(type_id) => match used.get(&type_id) {
                    Some(&first) => family
                        .id_issues
                        .push((variant.id, IdIssue::Duplicate { type_id, first })),
                    None => {
                        used.insert(type_id, variant.id);
                        variant.type_id = type_id;
                    }
                },
                Err(_) => family.id_issues.push((variant.id, IdIssue::OutOfRange(raw))),
            },
            None => pending.push(index),
        }
    }

    let mut next: u16 = 1;
    for index in pending {
        while used.contains_key(&next) {
            next = next.saturating_add(1);
        }
        family.variants[index].type_id = next;
        used.insert(next, family.variants[index].id);
    }

    family.variants.retain(|v| v.type_id != 0);
    family.variants.sort_by_key(|v| v.type_id);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::{Attribute, Compilation, Modifier};

    fn header(name: &str, iface: &str) -> TypeDecl {
        TypeDecl::new(name, TypeKind::Struct)
            .in_namespace("Game")
            .partial()
            .with_attr(Attribute::new("UnionHeader"))
            .with_member(FieldDecl::new("TypeId", "TypeIds"))
            .with_nested(
                TypeDecl::new(iface, TypeKind::Interface)
                    .in_namespace("Game")
                    .with_modifier(Modifier::Public),
            )
    }

    fn variant(name: &str, header: &str, iface: &str, id: Option<i64>) -> TypeDecl {
        let mut attr = Attribute::new("Union");
        if let Some(id) = id {
            attr = attr.with_arg(Expression::int(id));
        }
        TypeDecl::new(name, TypeKind::Struct)
            .in_namespace("Game")
            .partial()
            .with_attr(attr)
            .implements(format!("{}.{}", header, iface).as_str())
            .with_member(FieldDecl::new("Header", header))
    }

    fn compile(types: Vec<TypeDecl>) -> Compilation {
        Compilation::new("Game").with_file("Assets/Shapes.cs", types)
    }

    #[test]
    fn test_ids_assigned_by_name_after_explicit() {
        let c = compile(vec![
            header("ShapeHeader", "IShape"),
            variant("Square", "ShapeHeader", "IShape", None),
            variant("Circle", "ShapeHeader", "IShape", Some(1)),
            variant("Arc", "ShapeHeader", "IShape", None),
        ]);
        let symbols = SymbolTable::new(&c, "UnityEngine");
        let families = collect_families(&symbols);
        assert_eq!(families.len(), 1);
        let ids: Vec<_> = families[0]
            .variants
            .iter()
            .map(|v| (symbols.decl(v.id).name.as_str(), v.type_id))
            .collect();
        assert_eq!(ids, vec![("Circle", 1), ("Arc", 2), ("Square", 3)]);
        assert!(families[0].is_valid(&symbols));
    }

    #[test]
    fn test_duplicate_and_reserved_ids() {
        let c = compile(vec![
            header("ShapeHeader", "IShape"),
            variant("Circle", "ShapeHeader", "IShape", Some(2)),
            variant("Square", "ShapeHeader", "IShape", Some(2)),
            variant("Void", "ShapeHeader", "IShape", Some(0)),
        ]);
        let symbols = SymbolTable::new(&c, "UnityEngine");
        let family = &collect_families(&symbols)[0];
        let square = symbols.lookup("Game.Square").unwrap();
        let void = symbols.lookup("Game.Void").unwrap();
        let circle = symbols.lookup("Game.Circle").unwrap();
        let duplicate = IdIssue::Duplicate {
            type_id: 2,
            first: circle,
        };
        assert!(family.id_issues.contains(&(square, duplicate)));
        assert!(family.id_issues.contains(&(void, IdIssue::Reserved)));
        assert!(!family.is_valid(&symbols));
    }

    #[test]
    fn test_variant_issues() {
        let c = compile(vec![
            header("ShapeHeader", "IShape"),
            TypeDecl::new("Loose", TypeKind::Class)
                .in_namespace("Game")
                .with_attr(Attribute::new("Union"))
                .with_member(FieldDecl::new("Size", "float"))
                .with_member(FieldDecl::new("Header", "ShapeHeader")),
        ]);
        let symbols = SymbolTable::new(&c, "UnityEngine");
        let loose = symbols.lookup("Game.Loose").unwrap();
        assert_eq!(
            variant_issues(&symbols, loose),
            vec![VariantIssue::HeaderNotFirst("Header".into()), VariantIssue::NotValueType]
        );
    }

    #[test]
    fn test_nested_header_joins_root_family() {
        let nested = TypeDecl::new("ProjectileHeader", TypeKind::Struct)
            .in_namespace("Game")
            .partial()
            .with_attr(Attribute::new("UnionHeader"))
            .with_member(FieldDecl::new("Root", "ShapeHeader"))
            .with_nested(
                TypeDecl::new("IProjectile", TypeKind::Interface)
                    .in_namespace("Game")
                    .with_modifier(Modifier::Public),
            );
        let c = compile(vec![
            header("ShapeHeader", "IShape"),
            nested,
            variant("Circle", "ShapeHeader", "IShape", None),
            variant("Arrow", "ProjectileHeader", "IProjectile", None),
        ]);
        let symbols = SymbolTable::new(&c, "UnityEngine");
        let families = collect_families(&symbols);
        assert_eq!(families.len(), 1);
        let family = &families[0];
        assert_eq!(family.headers.len(), 2);
        assert_eq!(family.variants.len(), 2);
        let projectile = symbols.lookup("Game.ProjectileHeader").unwrap();
        assert_eq!(family.variants_under(&symbols, projectile).len(), 1);
        assert_eq!(family.variants_under(&symbols, family.root).len(), 2);
        assert!(header_issues(&symbols, projectile).is_empty());
        assert!(family.is_valid(&symbols));
    }
}

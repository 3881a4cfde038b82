//! Injection options parsed from `[Inject…]` attributes, and the table of
//! which member shapes each combination may be applied to.

use serde::{Deserialize, Serialize};

use crate::symbols::{SymbolId, SymbolTable};
use crate::syntax::names;
use crate::syntax::{Attribute, Member, TypeDecl, TypeRef};

use super::roles::{self, RoleTarget, Roles};

/// Where an injected value comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InjectSource {
    /// A component on the same object.
    Direct,
    /// The object and its children.
    FromChildren,
    /// The object and its parents.
    FromParents,
    /// The current singleton of the member's type.
    Single,
    /// All tracked instances of the member's element type.
    All,
}

/// How the generated code obtains the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InjectCategory {
    /// Assigned once during initialization.
    Eager,
    /// Looked up on every read.
    Lazy,
    /// Read from a singleton slot on every read.
    Singleton,
    /// Read from a tracked registry on every read.
    Collection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InjectOptions {
    pub source: InjectSource,
    pub lazy: bool,
    pub optional: bool,
    pub include_inactive: bool,
}

const ATTRIBUTE_FORMS: &[(&str, InjectSource, bool)] = &[
    ("Inject", InjectSource::Direct, false),
    ("Inject.FromChildren", InjectSource::FromChildren, false),
    ("Inject.FromParents", InjectSource::FromParents, false),
    ("Inject.Lazy", InjectSource::Direct, true),
    ("Inject.FromChildren.Lazy", InjectSource::FromChildren, true),
    ("Inject.FromParents.Lazy", InjectSource::FromParents, true),
    ("Inject.Single", InjectSource::Single, false),
    ("Inject.All", InjectSource::All, false),
];

impl InjectOptions {
    /// Parse an attribute; `None` if it is not an injection attribute.
    pub fn from_attribute(attr: &Attribute) -> Option<Self> {
        let canonical = attr.canonical_name();
        let &(_, source, lazy) = ATTRIBUTE_FORMS.iter().find(|(name, ..)| *name == canonical)?;
        Some(Self {
            source,
            lazy,
            optional: attr.flag("Optional"),
            include_inactive: attr.flag("IncludeInactive"),
        })
    }

    /// Canonical attribute spelling, for messages.
    pub fn attribute_name(&self) -> &'static str {
        ATTRIBUTE_FORMS
            .iter()
            .find(|&&(_, source, lazy)| source == self.source && lazy == self.lazy)
            .map(|(name, ..)| *name)
            .unwrap_or(names::INJECT)
    }

    pub fn category(&self) -> InjectCategory {
        match self.source {
            InjectSource::Single => InjectCategory::Singleton,
            InjectSource::All => InjectCategory::Collection,
            _ if self.lazy => InjectCategory::Lazy,
            _ => InjectCategory::Eager,
        }
    }

    /// Whether the lookup walks the object hierarchy.
    pub fn searches_hierarchy(&self) -> bool {
        matches!(self.source, InjectSource::FromChildren | InjectSource::FromParents)
    }
}

/// The parts of a member's declaration that decide which options are legal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemberShape {
    pub is_field: bool,
    pub is_array: bool,
    pub has_setter: bool,
    /// Auto-implemented getter (compiler-generated backing field).
    pub is_auto: bool,
}

impl MemberShape {
    pub fn of(member: &Member) -> Self {
        match member {
            Member::Field(f) => Self {
                is_field: true,
                is_array: f.ty.is_array(),
                has_setter: false,
                is_auto: false,
            },
            Member::Property(p) => Self {
                is_field: false,
                is_array: p.ty.is_array(),
                has_setter: p.has_setter(),
                is_auto: p.getter.as_ref().is_some_and(|g| g.body.is_none()),
            },
            Member::Method(m) => Self {
                is_field: false,
                is_array: m.return_type.is_array(),
                has_setter: false,
                is_auto: false,
            },
        }
    }
}

/// A member shape that an option combination cannot be applied to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeError {
    /// Registry-backed and lazy members are computed on read.
    FieldNotAllowed,
    /// Registry-backed and lazy members are read-only.
    SetterNotAllowed,
    /// Singleton lookup yields one instance.
    ArrayNotAllowed,
    /// Collection lookup yields every instance.
    RequiresArray,
    /// Eager members need somewhere to store the value.
    NoStorage,
}

impl ShapeError {
    pub fn message(&self, options: &InjectOptions, member: &str) -> String {
        let attr = options.attribute_name();
        match self {
            ShapeError::FieldNotAllowed => format!(
                "[{}] on '{}' requires a get-only property, not a field",
                attr, member
            ),
            ShapeError::SetterNotAllowed => format!(
                "[{}] on '{}' requires a get-only property; remove the setter",
                attr, member
            ),
            ShapeError::ArrayNotAllowed => format!(
                "[{}] on '{}' resolves a single instance and cannot be used on an array type",
                attr, member
            ),
            ShapeError::RequiresArray => format!(
                "[{}] on '{}' resolves every tracked instance and requires an array type",
                attr, member
            ),
            ShapeError::NoStorage => format!(
                "[{}] on '{}' needs a field, a setter or an auto-implemented getter",
                attr, member
            ),
        }
    }
}

/// Every legality violation of `options` applied to a member of `shape`.
pub fn shape_errors(options: &InjectOptions, shape: &MemberShape) -> Vec<ShapeError> {
    let mut errors = Vec::new();
    match options.category() {
        InjectCategory::Eager => {
            if !shape.is_field && !shape.has_setter && !shape.is_auto {
                errors.push(ShapeError::NoStorage);
            }
        }
        InjectCategory::Lazy | InjectCategory::Singleton | InjectCategory::Collection => {
            if shape.is_field {
                errors.push(ShapeError::FieldNotAllowed);
            } else if shape.has_setter {
                errors.push(ShapeError::SetterNotAllowed);
            }
        }
    }
    match options.category() {
        InjectCategory::Singleton if shape.is_array => errors.push(ShapeError::ArrayNotAllowed),
        InjectCategory::Collection if !shape.is_array => errors.push(ShapeError::RequiresArray),
        _ => {}
    }
    errors
}

/// Why `IncludeInactive` has no effect for `options`, if it does not.
pub fn include_inactive_ignored(
    options: &InjectOptions,
    parents_supported: bool,
) -> Option<&'static str> {
    if !options.include_inactive {
        return None;
    }
    match options.source {
        InjectSource::Direct => Some("components on the same object are always found"),
        InjectSource::Single | InjectSource::All => {
            Some("registry lookups only see registered instances")
        }
        InjectSource::FromParents if !parents_supported => {
            Some("the target engine does not support it for parent lookups")
        }
        InjectSource::FromParents | InjectSource::FromChildren => None,
    }
}

/// A field or property carrying an injection attribute.
#[derive(Debug, Clone, Copy)]
pub struct InjectedMember<'c> {
    pub member: &'c Member,
    pub attribute: &'c Attribute,
    pub options: InjectOptions,
}

impl<'c> InjectedMember<'c> {
    pub fn name(&self) -> &'c str {
        self.member.name()
    }

    pub fn declared_type(&self) -> &'c TypeRef {
        self.member.declared_type()
    }

    pub fn shape(&self) -> MemberShape {
        MemberShape::of(self.member)
    }

    /// The looked-up type: the element type for arrays.
    pub fn element_type(&self) -> TypeRef {
        self.declared_type().element()
    }

    pub fn is_valid(&self) -> bool {
        !self.member.is_static() && shape_errors(&self.options, &self.shape()).is_empty()
    }

    /// Whether code can be generated for the member: its shape is legal,
    /// its owner and target type fit the lookup, and registry lookups name a
    /// type carrying the matching role.
    pub fn is_generatable(&self, symbols: &SymbolTable<'_>, owner: SymbolId) -> bool {
        if !self.is_valid() {
            return false;
        }
        let element = self.element_type();
        match self.options.source {
            InjectSource::Single => matches!(
                roles::role_target(symbols, &element, owner, Roles::SINGLETON),
                RoleTarget::Registered(_)
            ),
            InjectSource::All => matches!(
                roles::role_target(symbols, &element, owner, Roles::TRACK),
                RoleTarget::Registered(_)
            ),
            _ => symbols.is_component(owner) && is_component_like(symbols, &element, owner),
        }
    }
}

/// Whether a component lookup can return `ty`: components and interfaces.
/// Types outside the compilation are given the benefit of the doubt.
pub fn is_component_like(symbols: &SymbolTable<'_>, ty: &TypeRef, context: SymbolId) -> bool {
    match symbols.resolve(&ty.element(), Some(context)) {
        Some(id) => symbols.decl(id).is_interface() || symbols.is_component(id),
        None => true,
    }
}

/// The injection attribute of a field or property. A member with several
/// injection attributes uses the first.
pub fn injected_member(member: &Member) -> Option<InjectedMember<'_>> {
    if matches!(member, Member::Method(_)) {
        return None;
    }
    member.attributes().iter().find_map(|attribute| {
        InjectOptions::from_attribute(attribute).map(|options| InjectedMember {
            member,
            attribute,
            options,
        })
    })
}

/// Fields and properties of `decl` carrying an injection attribute, static
/// ones included.
pub fn injected_members(decl: &TypeDecl) -> Vec<InjectedMember<'_>> {
    decl.members.iter().filter_map(injected_member).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::{Expression, FieldDecl, PropertyDecl};

    fn options(name: &str) -> InjectOptions {
        InjectOptions::from_attribute(&Attribute::new(name)).unwrap()
    }

    #[test]
    fn test_attribute_forms() {
        let lazy = options("Rivet.Inject.FromChildren.LazyAttribute");
        assert_eq!(lazy.source, InjectSource::FromChildren);
        assert!(lazy.lazy);
        assert_eq!(lazy.category(), InjectCategory::Lazy);
        assert_eq!(lazy.attribute_name(), "Inject.FromChildren.Lazy");
        assert_eq!(options("Inject.All").category(), InjectCategory::Collection);
        assert!(InjectOptions::from_attribute(&Attribute::new("Inject.Sometimes")).is_none());
    }

    #[test]
    fn test_named_flags() {
        let attr = Attribute::new("Inject.FromParents")
            .with_named("Optional", Expression::bool(true))
            .with_named("IncludeInactive", Expression::bool(true));
        let opts = InjectOptions::from_attribute(&attr).unwrap();
        assert!(opts.optional && opts.include_inactive);
        assert!(include_inactive_ignored(&opts, false).is_some());
        assert!(include_inactive_ignored(&opts, true).is_none());
    }

    #[test]
    fn test_collection_requires_array() {
        let member: Member = PropertyDecl::new("Enemies", "Enemy").get_only().into();
        assert_eq!(
            shape_errors(&options("Inject.All"), &MemberShape::of(&member)),
            vec![ShapeError::RequiresArray]
        );
    }

    #[test]
    fn test_singleton_rejects_setter_and_array() {
        let managers = crate::syntax::TypeRef::array_of("GameManager".into());
        let member: Member = PropertyDecl::new("Managers", managers).into();
        assert_eq!(
            shape_errors(&options("Inject.Single"), &MemberShape::of(&member)),
            vec![ShapeError::SetterNotAllowed, ShapeError::ArrayNotAllowed]
        );
    }

    #[test]
    fn test_generatable_requires_role_on_target() {
        use crate::syntax::build;
        let c = build::game(vec![
            build::behaviour("Enemy"),
            build::behaviour("Radar").with_member(
                PropertyDecl::new("Enemies", crate::syntax::TypeRef::array_of("Enemy".into()))
                    .get_only()
                    .with_attr(Attribute::new("Inject.All")),
            ),
        ]);
        let symbols = SymbolTable::new(&c, "UnityEngine");
        let radar = symbols.lookup("Game.Radar").unwrap();
        let members = injected_members(symbols.decl(radar));
        assert!(members[0].is_valid());
        assert!(!members[0].is_generatable(&symbols, radar));
    }

    #[test]
    fn test_lazy_rejects_field() {
        let member: Member = FieldDecl::new("Body", "Rigidbody").into();
        assert_eq!(
            shape_errors(&options("Inject.Lazy"), &MemberShape::of(&member)),
            vec![ShapeError::FieldNotAllowed]
        );
        assert!(shape_errors(&options("Inject"), &MemberShape::of(&member)).is_empty());
    }
}

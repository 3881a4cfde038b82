//! Declaration model of a host compilation.
//!
//! The host (an IDE plugin or build step) hands over the declarations of
//! every source file plus the declarations of referenced assemblies. Bodies
//! are kept only for methods and accessors; see [`super::body`].

use serde::{Deserialize, Serialize};

use super::body::{Block, Expression};
use super::names;
use super::span::Span;

// ============================================================================
// Compilation
// ============================================================================

/// One compilation: the assembly being built and its references.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Compilation {
    /// Name of the assembly being compiled.
    pub assembly: String,
    /// Source files of the assembly.
    #[serde(default)]
    pub files: Vec<SourceFile>,
    /// Declarations visible from referenced assemblies (engine types, libraries).
    #[serde(default)]
    pub references: Vec<TypeDecl>,
}

impl Compilation {
    pub fn new(assembly: impl Into<String>) -> Self {
        Self {
            assembly: assembly.into(),
            files: Vec::new(),
            references: Vec::new(),
        }
    }

    /// Add a source file with the given top-level types.
    pub fn with_file(mut self, path: impl Into<String>, types: Vec<TypeDecl>) -> Self {
        self.files.push(SourceFile {
            path: path.into(),
            types,
        });
        self
    }

    /// Add declarations from a referenced assembly.
    pub fn with_references(mut self, types: Vec<TypeDecl>) -> Self {
        self.references.extend(types);
        self
    }

    /// Load a compilation from the host's JSON export.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

/// A source file and the types declared at its top level.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SourceFile {
    pub path: String,
    #[serde(default)]
    pub types: Vec<TypeDecl>,
}

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeKind {
    Class,
    Struct,
    Interface,
}

impl TypeKind {
    /// C# keyword for the kind.
    pub fn keyword(self) -> &'static str {
        match self {
            TypeKind::Class => "class",
            TypeKind::Struct => "struct",
            TypeKind::Interface => "interface",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modifier {
    Public,
    Internal,
    Protected,
    Private,
    Static,
    Abstract,
    Sealed,
    Partial,
    Readonly,
    Virtual,
    Override,
    New,
    Unsafe,
}

/// A type declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeDecl {
    pub name: String,
    /// Enclosing namespace; empty for the global namespace. Nested types
    /// carry the namespace of their outermost containing type.
    #[serde(default)]
    pub namespace: String,
    pub kind: TypeKind,
    #[serde(default)]
    pub modifiers: Vec<Modifier>,
    #[serde(default)]
    pub type_params: Vec<String>,
    #[serde(default)]
    pub base: Option<TypeRef>,
    #[serde(default)]
    pub interfaces: Vec<TypeRef>,
    #[serde(default)]
    pub attributes: Vec<Attribute>,
    #[serde(default)]
    pub members: Vec<Member>,
    #[serde(default)]
    pub nested: Vec<TypeDecl>,
    #[serde(default)]
    pub span: Span,
    /// Span of the declaration header (`partial class Foo : Bar`).
    #[serde(default)]
    pub header_span: Span,
}

impl TypeDecl {
    pub fn new(name: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            name: name.into(),
            namespace: String::new(),
            kind,
            modifiers: Vec::new(),
            type_params: Vec::new(),
            base: None,
            interfaces: Vec::new(),
            attributes: Vec::new(),
            members: Vec::new(),
            nested: Vec::new(),
            span: Span::default(),
            header_span: Span::default(),
        }
    }

    pub fn has_modifier(&self, modifier: Modifier) -> bool {
        self.modifiers.contains(&modifier)
    }

    pub fn is_partial(&self) -> bool {
        self.has_modifier(Modifier::Partial)
    }

    pub fn is_static(&self) -> bool {
        self.has_modifier(Modifier::Static)
    }

    pub fn is_abstract(&self) -> bool {
        self.has_modifier(Modifier::Abstract)
    }

    pub fn is_interface(&self) -> bool {
        self.kind == TypeKind::Interface
    }

    pub fn is_value_type(&self) -> bool {
        self.kind == TypeKind::Struct
    }

    /// Attributes matching a canonical (normalized) name.
    pub fn attributes_named<'a>(
        &'a self,
        canonical: &'a str,
    ) -> impl Iterator<Item = &'a Attribute> {
        self.attributes.iter().filter(move |a| a.is(canonical))
    }

    pub fn attribute(&self, canonical: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.is(canonical))
    }

    pub fn has_attribute(&self, canonical: &str) -> bool {
        self.attribute(canonical).is_some()
    }

    pub fn fields(&self) -> impl Iterator<Item = &FieldDecl> {
        self.members.iter().filter_map(|m| match m {
            Member::Field(f) => Some(f),
            _ => None,
        })
    }

    /// Non-static fields in declaration order.
    pub fn instance_fields(&self) -> impl Iterator<Item = &FieldDecl> {
        self.fields().filter(|f| !f.is_static())
    }

    pub fn properties(&self) -> impl Iterator<Item = &PropertyDecl> {
        self.members.iter().filter_map(|m| match m {
            Member::Property(p) => Some(p),
            _ => None,
        })
    }

    pub fn methods(&self) -> impl Iterator<Item = &MethodDecl> {
        self.members.iter().filter_map(|m| match m {
            Member::Method(m) => Some(m),
            _ => None,
        })
    }

    /// A member with the given name, of any kind.
    pub fn member(&self, name: &str) -> Option<&Member> {
        self.members.iter().find(|m| m.name() == name)
    }

    // Builder helpers

    pub fn in_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn with_modifier(mut self, modifier: Modifier) -> Self {
        if !self.modifiers.contains(&modifier) {
            self.modifiers.push(modifier);
        }
        self
    }

    pub fn partial(self) -> Self {
        self.with_modifier(Modifier::Partial)
    }

    pub fn extends(mut self, base: impl Into<TypeRef>) -> Self {
        self.base = Some(base.into());
        self
    }

    pub fn implements(mut self, iface: impl Into<TypeRef>) -> Self {
        self.interfaces.push(iface.into());
        self
    }

    pub fn with_attr(mut self, attr: Attribute) -> Self {
        self.attributes.push(attr);
        self
    }

    pub fn with_member(mut self, member: impl Into<Member>) -> Self {
        self.members.push(member.into());
        self
    }

    pub fn with_nested(mut self, nested: TypeDecl) -> Self {
        self.nested.push(nested);
        self
    }

    pub fn at(mut self, span: Span) -> Self {
        self.span = span;
        self.header_span = span;
        self
    }

    pub fn with_header_span(mut self, span: Span) -> Self {
        self.header_span = span;
        self
    }
}

// ============================================================================
// Type references
// ============================================================================

/// A type as written in source: `Rigidbody`, `List<int>`, `Collider[]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeRef {
    /// Possibly qualified name, without type arguments.
    pub name: String,
    #[serde(default)]
    pub type_args: Vec<TypeRef>,
    /// 0 for non-arrays.
    #[serde(default)]
    pub array_rank: u8,
}

impl TypeRef {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_args: Vec::new(),
            array_rank: 0,
        }
    }

    pub fn array_of(element: TypeRef) -> Self {
        Self {
            array_rank: 1,
            ..element
        }
    }

    pub fn is_array(&self) -> bool {
        self.array_rank > 0
    }

    /// The element type of an array, or the type itself.
    pub fn element(&self) -> TypeRef {
        Self {
            array_rank: 0,
            ..self.clone()
        }
    }

    /// Last segment of the name.
    pub fn simple_name(&self) -> &str {
        names::last_segment(&self.name)
    }

    pub fn is_void(&self) -> bool {
        matches!(self.name.as_str(), "void" | "System.Void")
    }
}

impl From<&str> for TypeRef {
    fn from(name: &str) -> Self {
        TypeRef::named(name)
    }
}

impl std::fmt::Display for TypeRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.type_args.is_empty() {
            write!(f, "<")?;
            for (i, arg) in self.type_args.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", arg)?;
            }
            write!(f, ">")?;
        }
        for _ in 0..self.array_rank {
            write!(f, "[]")?;
        }
        Ok(())
    }
}

// ============================================================================
// Attributes
// ============================================================================

/// An attribute application: `[Inject.FromChildren(IncludeInactive = true)]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    /// Name as written (may be qualified, may carry the `Attribute` suffix).
    pub name: String,
    #[serde(default)]
    pub args: Vec<AttributeArg>,
    #[serde(default)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeArg {
    /// `Some` for named arguments (`Optional = true`).
    #[serde(default)]
    pub name: Option<String>,
    pub value: Expression,
}

impl Attribute {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
            span: Span::default(),
        }
    }

    /// The canonical name used for matching.
    pub fn canonical_name(&self) -> String {
        names::normalize_attribute_name(&self.name)
    }

    pub fn is(&self, canonical: &str) -> bool {
        self.canonical_name() == canonical
    }

    /// The `index`-th positional argument.
    pub fn positional(&self, index: usize) -> Option<&Expression> {
        self.args
            .iter()
            .filter(|a| a.name.is_none())
            .nth(index)
            .map(|a| &a.value)
    }

    /// A named argument.
    pub fn named(&self, name: &str) -> Option<&Expression> {
        self.args
            .iter()
            .find(|a| a.name.as_deref() == Some(name))
            .map(|a| &a.value)
    }

    /// A named boolean flag; absent means `false`.
    pub fn flag(&self, name: &str) -> bool {
        self.named(name).and_then(Expression::as_bool).unwrap_or(false)
    }

    pub fn with_arg(mut self, value: Expression) -> Self {
        self.args.push(AttributeArg { name: None, value });
        self
    }

    pub fn with_named(mut self, name: impl Into<String>, value: Expression) -> Self {
        self.args.push(AttributeArg {
            name: Some(name.into()),
            value,
        });
        self
    }

    pub fn at(mut self, span: Span) -> Self {
        self.span = span;
        self
    }
}

// ============================================================================
// Members
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Member {
    Field(FieldDecl),
    Property(PropertyDecl),
    Method(MethodDecl),
}

impl Member {
    pub fn name(&self) -> &str {
        match self {
            Member::Field(f) => &f.name,
            Member::Property(p) => &p.name,
            Member::Method(m) => &m.name,
        }
    }

    pub fn attributes(&self) -> &[Attribute] {
        match self {
            Member::Field(f) => &f.attributes,
            Member::Property(p) => &p.attributes,
            Member::Method(m) => &m.attributes,
        }
    }

    pub fn attribute(&self, canonical: &str) -> Option<&Attribute> {
        self.attributes().iter().find(|a| a.is(canonical))
    }

    pub fn modifiers(&self) -> &[Modifier] {
        match self {
            Member::Field(f) => &f.modifiers,
            Member::Property(p) => &p.modifiers,
            Member::Method(m) => &m.modifiers,
        }
    }

    pub fn is_static(&self) -> bool {
        self.modifiers().contains(&Modifier::Static)
    }

    /// Declared type of a field or property, return type of a method.
    pub fn declared_type(&self) -> &TypeRef {
        match self {
            Member::Field(f) => &f.ty,
            Member::Property(p) => &p.ty,
            Member::Method(m) => &m.return_type,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Member::Field(f) => f.span,
            Member::Property(p) => p.span,
            Member::Method(m) => m.span,
        }
    }
}

impl From<FieldDecl> for Member {
    fn from(f: FieldDecl) -> Self {
        Member::Field(f)
    }
}

impl From<PropertyDecl> for Member {
    fn from(p: PropertyDecl) -> Self {
        Member::Property(p)
    }
}

impl From<MethodDecl> for Member {
    fn from(m: MethodDecl) -> Self {
        Member::Method(m)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDecl {
    pub name: String,
    pub ty: TypeRef,
    #[serde(default)]
    pub modifiers: Vec<Modifier>,
    #[serde(default)]
    pub attributes: Vec<Attribute>,
    #[serde(default)]
    pub span: Span,
}

impl FieldDecl {
    pub fn new(name: impl Into<String>, ty: impl Into<TypeRef>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
            modifiers: Vec::new(),
            attributes: Vec::new(),
            span: Span::default(),
        }
    }

    pub fn is_static(&self) -> bool {
        self.modifiers.contains(&Modifier::Static)
    }

    pub fn with_attr(mut self, attr: Attribute) -> Self {
        self.attributes.push(attr);
        self
    }

    pub fn with_modifier(mut self, modifier: Modifier) -> Self {
        self.modifiers.push(modifier);
        self
    }

    pub fn at(mut self, span: Span) -> Self {
        self.span = span;
        self
    }
}

/// A property accessor. `body == None` is an auto-implemented accessor.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Accessor {
    #[serde(default)]
    pub body: Option<Block>,
    #[serde(default)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyDecl {
    pub name: String,
    pub ty: TypeRef,
    #[serde(default)]
    pub modifiers: Vec<Modifier>,
    #[serde(default)]
    pub attributes: Vec<Attribute>,
    #[serde(default)]
    pub getter: Option<Accessor>,
    #[serde(default)]
    pub setter: Option<Accessor>,
    /// `IShape.Area` style explicit implementation.
    #[serde(default)]
    pub explicit_interface: Option<TypeRef>,
    #[serde(default)]
    pub span: Span,
}

impl PropertyDecl {
    /// An auto-property with a getter and a setter.
    pub fn new(name: impl Into<String>, ty: impl Into<TypeRef>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
            modifiers: Vec::new(),
            attributes: Vec::new(),
            getter: Some(Accessor::default()),
            setter: Some(Accessor::default()),
            explicit_interface: None,
            span: Span::default(),
        }
    }

    pub fn get_only(mut self) -> Self {
        self.setter = None;
        self
    }

    pub fn has_setter(&self) -> bool {
        self.setter.is_some()
    }

    pub fn with_attr(mut self, attr: Attribute) -> Self {
        self.attributes.push(attr);
        self
    }

    pub fn with_modifier(mut self, modifier: Modifier) -> Self {
        self.modifiers.push(modifier);
        self
    }

    pub fn explicit(mut self, iface: impl Into<TypeRef>) -> Self {
        self.explicit_interface = Some(iface.into());
        self
    }

    pub fn at(mut self, span: Span) -> Self {
        self.span = span;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamModifier {
    #[default]
    None,
    Ref,
    Out,
    In,
    Params,
}

impl ParamModifier {
    /// Keyword used at a call site (`params` is not repeated there).
    pub fn call_keyword(self) -> Option<&'static str> {
        match self {
            ParamModifier::Ref => Some("ref"),
            ParamModifier::Out => Some("out"),
            ParamModifier::In => Some("in"),
            ParamModifier::None | ParamModifier::Params => None,
        }
    }

    pub fn decl_keyword(self) -> Option<&'static str> {
        match self {
            ParamModifier::Params => Some("params"),
            other => other.call_keyword(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    pub ty: TypeRef,
    #[serde(default)]
    pub modifier: ParamModifier,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodDecl {
    pub name: String,
    #[serde(default)]
    pub params: Vec<Param>,
    pub return_type: TypeRef,
    #[serde(default)]
    pub modifiers: Vec<Modifier>,
    #[serde(default)]
    pub attributes: Vec<Attribute>,
    #[serde(default)]
    pub type_params: Vec<String>,
    #[serde(default)]
    pub explicit_interface: Option<TypeRef>,
    #[serde(default)]
    pub body: Option<Block>,
    #[serde(default)]
    pub span: Span,
}

impl MethodDecl {
    /// A `void` method without parameters or body.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            return_type: TypeRef::named("void"),
            modifiers: Vec::new(),
            attributes: Vec::new(),
            type_params: Vec::new(),
            explicit_interface: None,
            body: None,
            span: Span::default(),
        }
    }

    pub fn is_static(&self) -> bool {
        self.modifiers.contains(&Modifier::Static)
    }

    pub fn returns(mut self, ty: impl Into<TypeRef>) -> Self {
        self.return_type = ty.into();
        self
    }

    pub fn param(mut self, name: impl Into<String>, ty: impl Into<TypeRef>) -> Self {
        self.params.push(Param {
            name: name.into(),
            ty: ty.into(),
            modifier: ParamModifier::None,
        });
        self
    }

    pub fn param_with(
        mut self,
        name: impl Into<String>,
        ty: impl Into<TypeRef>,
        modifier: ParamModifier,
    ) -> Self {
        self.params.push(Param {
            name: name.into(),
            ty: ty.into(),
            modifier,
        });
        self
    }

    pub fn with_attr(mut self, attr: Attribute) -> Self {
        self.attributes.push(attr);
        self
    }

    pub fn with_modifier(mut self, modifier: Modifier) -> Self {
        self.modifiers.push(modifier);
        self
    }

    pub fn with_body(mut self, body: Block) -> Self {
        self.body = Some(body);
        self
    }

    pub fn explicit(mut self, iface: impl Into<TypeRef>) -> Self {
        self.explicit_interface = Some(iface.into());
        self
    }

    pub fn at(mut self, span: Span) -> Self {
        self.span = span;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_ref_display() {
        let list = TypeRef {
            name: "List".into(),
            type_args: vec![TypeRef::named("int")],
            array_rank: 0,
        };
        assert_eq!(list.to_string(), "List<int>");
        assert_eq!(TypeRef::array_of(TypeRef::named("Collider")).to_string(), "Collider[]");
    }

    #[test]
    fn test_attribute_args() {
        let attr = Attribute::new("Rivet.InjectAttribute")
            .with_named("Optional", Expression::bool(true));
        assert!(attr.is("Inject"));
        assert!(attr.flag("Optional"));
        assert!(!attr.flag("IncludeInactive"));
        assert!(attr.positional(0).is_none());
    }

    #[test]
    fn test_attribute_lookup_on_type() {
        let decl = TypeDecl::new("Audio", TypeKind::Class)
            .with_attr(Attribute::new("Rivet.SingletonAttribute"))
            .with_attr(Attribute::new("Track"));
        let found = decl.attribute("Singleton").map(|a| a.name.as_str());
        assert_eq!(found, Some("Rivet.SingletonAttribute"));
        assert_eq!(decl.attributes_named("Track").count(), 1);
        assert!(decl.attribute("Union").is_none());
    }

    #[test]
    fn test_instance_fields_skip_static() {
        let decl = TypeDecl::new("Circle", TypeKind::Struct)
            .with_member(FieldDecl::new("Count", "int").with_modifier(Modifier::Static))
            .with_member(FieldDecl::new("Header", "ShapeHeader"));
        let first = decl.instance_fields().next().map(|f| f.name.as_str());
        assert_eq!(first, Some("Header"));
    }

    #[test]
    fn test_compilation_from_json() {
        let json = r#"{
            "assembly": "Game",
            "files": [{
                "path": "Assets/Player.cs",
                "types": [{
                    "name": "Player",
                    "namespace": "Game",
                    "kind": "class",
                    "modifiers": ["public", "partial"],
                    "base": { "name": "UnityEngine.MonoBehaviour" },
                    "members": [
                        { "kind": "property", "name": "Body", "ty": { "name": "Rigidbody" },
                          "attributes": [{ "name": "Inject" }],
                          "getter": {} }
                    ]
                }]
            }]
        }"#;
        let compilation = Compilation::from_json(json).unwrap();
        let player = &compilation.files[0].types[0];
        assert!(player.is_partial());
        assert_eq!(player.properties().count(), 1);
        assert!(!player.properties().next().unwrap().has_setter());
    }
}

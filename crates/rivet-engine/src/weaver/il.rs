//! IL model
//!
//! A compiled assembly reduced to what weaving reads and edits: types with
//! their base, interfaces, attributes, fields, properties and methods, and
//! method bodies as flat instruction lists.

use std::fmt;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Method attributes relevant to weaving.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct MethodFlags: u16 {
        const STATIC = 1 << 0;
        const VIRTUAL = 1 << 1;
        const ABSTRACT = 1 << 2;
        const PRIVATE = 1 << 3;
        /// Starts a new vtable slot instead of overriding.
        const NEW_SLOT = 1 << 4;
        /// Accessors and other compiler-named methods.
        const SPECIAL_NAME = 1 << 5;
        const FINAL = 1 << 6;
    }
}

/// A reference to a method on some type, used as a call target.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MethodRef {
    pub declaring_type: String,
    pub name: String,
    #[serde(default)]
    pub generic_args: Vec<String>,
    #[serde(default)]
    pub params: Vec<String>,
    pub return_type: String,
}

impl MethodRef {
    /// A parameterless `void` method.
    pub fn void(declaring_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            declaring_type: declaring_type.into(),
            name: name.into(),
            generic_args: Vec::new(),
            params: Vec::new(),
            return_type: VOID.to_string(),
        }
    }

    pub fn new(
        declaring_type: impl Into<String>,
        name: impl Into<String>,
        params: &[&str],
        return_type: impl Into<String>,
    ) -> Self {
        Self {
            declaring_type: declaring_type.into(),
            name: name.into(),
            generic_args: Vec::new(),
            params: params.iter().map(|p| p.to_string()).collect(),
            return_type: return_type.into(),
        }
    }

    pub fn with_generic(mut self, arg: impl Into<String>) -> Self {
        self.generic_args.push(arg.into());
        self
    }
}

/// A reference to a field, used by loads and stores.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldRef {
    pub declaring_type: String,
    pub name: String,
    pub ty: String,
}

/// Branch target inside one method body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Label(pub u32);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Instr {
    LoadThis,
    LoadNull,
    LoadStr(String),
    LoadInt(i64),
    LoadLocal(u16),
    StoreLocal(u16),
    LoadField(FieldRef),
    StoreField(FieldRef),
    Call(MethodRef),
    CallVirt(MethodRef),
    BranchTrue(Label),
    BranchFalse(Label),
    Label(Label),
    Pop,
    Dup,
    Return,
}

impl Instr {
    /// The method a `Call`/`CallVirt` targets.
    pub fn call_target(&self) -> Option<&MethodRef> {
        match self {
            Instr::Call(m) | Instr::CallVirt(m) => Some(m),
            _ => None,
        }
    }

    pub fn label(&self) -> Option<Label> {
        match self {
            Instr::BranchTrue(l) | Instr::BranchFalse(l) | Instr::Label(l) => Some(*l),
            _ => None,
        }
    }
}

pub const VOID: &str = "void";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IlParam {
    pub name: String,
    pub ty: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IlMethod {
    pub name: String,
    #[serde(default)]
    pub params: Vec<IlParam>,
    pub return_type: String,
    #[serde(default)]
    pub flags: MethodFlags,
    /// Interface methods this method explicitly implements.
    #[serde(default)]
    pub overrides: Vec<MethodRef>,
    /// Local variable types, indexed by `LoadLocal`/`StoreLocal`.
    #[serde(default)]
    pub locals: Vec<String>,
    #[serde(default)]
    pub body: Vec<Instr>,
}

impl IlMethod {
    /// A `void` method without parameters whose body only returns.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            return_type: VOID.to_string(),
            flags: MethodFlags::empty(),
            overrides: Vec::new(),
            locals: Vec::new(),
            body: vec![Instr::Return],
        }
    }

    pub fn returning(mut self, ty: impl Into<String>) -> Self {
        self.return_type = ty.into();
        self
    }

    pub fn param(mut self, name: impl Into<String>, ty: impl Into<String>) -> Self {
        self.params.push(IlParam {
            name: name.into(),
            ty: ty.into(),
        });
        self
    }

    pub fn with_flags(mut self, flags: MethodFlags) -> Self {
        self.flags |= flags;
        self
    }

    pub fn with_body(mut self, body: Vec<Instr>) -> Self {
        self.body = body;
        self
    }

    pub fn is_static(&self) -> bool {
        self.flags.contains(MethodFlags::STATIC)
    }

    /// Instance method named `name` taking nothing and returning `void`.
    pub fn is_lifecycle(&self, name: &str) -> bool {
        self.name == name && self.params.is_empty() && self.return_type == VOID && !self.is_static()
    }

    /// Whether the body already calls `target`.
    pub fn calls(&self, target: &MethodRef) -> bool {
        self.body.iter().any(|i| i.call_target() == Some(target))
    }

    /// A label not used anywhere in the body.
    pub fn fresh_label(&self) -> Label {
        let next = self.body.iter().filter_map(Instr::label).map(|l| l.0 + 1).max().unwrap_or(0);
        Label(next)
    }

    /// Add a local of type `ty` and return its index.
    pub fn add_local(&mut self, ty: impl Into<String>) -> u16 {
        self.locals.push(ty.into());
        (self.locals.len() - 1) as u16
    }

    pub fn reference(&self, declaring_type: &str) -> MethodRef {
        MethodRef {
            declaring_type: declaring_type.to_string(),
            name: self.name.clone(),
            generic_args: Vec::new(),
            params: self.params.iter().map(|p| p.ty.clone()).collect(),
            return_type: self.return_type.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IlField {
    pub name: String,
    pub ty: String,
    #[serde(default)]
    pub is_static: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IlProperty {
    pub name: String,
    pub ty: String,
    /// Name of the getter method, usually `get_Name`.
    #[serde(default)]
    pub getter: Option<String>,
    #[serde(default)]
    pub setter: Option<String>,
}

impl IlProperty {
    /// Compiler-generated backing field of an auto-implemented property.
    pub fn backing_field_name(&self) -> String {
        format!("<{}>k__BackingField", self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IlAttribute {
    pub type_name: String,
    #[serde(default)]
    pub args: Vec<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IlType {
    pub full_name: String,
    #[serde(default)]
    pub base: Option<String>,
    #[serde(default)]
    pub interfaces: Vec<String>,
    #[serde(default)]
    pub attributes: Vec<IlAttribute>,
    #[serde(default)]
    pub fields: Vec<IlField>,
    #[serde(default)]
    pub properties: Vec<IlProperty>,
    #[serde(default)]
    pub methods: Vec<IlMethod>,
}

impl IlType {
    pub fn new(full_name: impl Into<String>) -> Self {
        Self {
            full_name: full_name.into(),
            base: None,
            interfaces: Vec::new(),
            attributes: Vec::new(),
            fields: Vec::new(),
            properties: Vec::new(),
            methods: Vec::new(),
        }
    }

    pub fn extends(mut self, base: impl Into<String>) -> Self {
        self.base = Some(base.into());
        self
    }

    pub fn implements(mut self, iface: impl Into<String>) -> Self {
        self.interfaces.push(iface.into());
        self
    }

    pub fn with_field(mut self, name: impl Into<String>, ty: impl Into<String>) -> Self {
        self.fields.push(IlField {
            name: name.into(),
            ty: ty.into(),
            is_static: false,
        });
        self
    }

    /// An auto-implemented property: getter, optional setter and backing field.
    pub fn with_auto_property(mut self, name: &str, ty: &str, has_setter: bool) -> Self {
        let property = IlProperty {
            name: name.to_string(),
            ty: ty.to_string(),
            getter: Some(format!("get_{}", name)),
            setter: has_setter.then(|| format!("set_{}", name)),
        };
        let backing = FieldRef {
            declaring_type: self.full_name.clone(),
            name: property.backing_field_name(),
            ty: ty.to_string(),
        };
        self.fields.push(IlField {
            name: backing.name.clone(),
            ty: ty.to_string(),
            is_static: false,
        });
        self.methods.push(
            IlMethod::new(format!("get_{}", name))
                .returning(ty)
                .with_flags(MethodFlags::SPECIAL_NAME)
                .with_body(vec![Instr::LoadThis, Instr::LoadField(backing.clone()), Instr::Return]),
        );
        if has_setter {
            self.methods.push(
                IlMethod::new(format!("set_{}", name))
                    .param("value", ty)
                    .with_flags(MethodFlags::SPECIAL_NAME)
                    .with_body(vec![
                        Instr::LoadThis,
                        Instr::LoadLocal(0),
                        Instr::StoreField(backing),
                        Instr::Return,
                    ]),
            );
        }
        self.properties.push(property);
        self
    }

    pub fn with_method(mut self, method: IlMethod) -> Self {
        self.methods.push(method);
        self
    }

    pub fn with_attribute(mut self, type_name: impl Into<String>, args: Vec<i64>) -> Self {
        self.attributes.push(IlAttribute {
            type_name: type_name.into(),
            args,
        });
        self
    }

    pub fn has_attribute(&self, type_name: &str) -> bool {
        self.attributes.iter().any(|a| a.type_name == type_name)
    }

    pub fn field(&self, name: &str) -> Option<&IlField> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn field_ref(&self, name: &str) -> Option<FieldRef> {
        self.field(name).map(|f| FieldRef {
            declaring_type: self.full_name.clone(),
            name: f.name.clone(),
            ty: f.ty.clone(),
        })
    }

    pub fn property(&self, name: &str) -> Option<&IlProperty> {
        self.properties.iter().find(|p| p.name == name)
    }

    pub fn method(&self, name: &str) -> Option<&IlMethod> {
        self.methods.iter().find(|m| m.name == name)
    }

    pub fn method_index(&self, name: &str) -> Option<usize> {
        self.methods.iter().position(|m| m.name == name)
    }

    /// Index of the parameterless `void` instance method `name`.
    pub fn lifecycle_index(&self, name: &str) -> Option<usize> {
        self.methods.iter().position(|m| m.is_lifecycle(name))
    }
}

/// A compiled assembly plus the metadata of the assemblies it references.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct IlModule {
    pub name: String,
    #[serde(default)]
    pub types: Vec<IlType>,
    /// Referenced types; read for base-chain lookups, never edited.
    #[serde(default)]
    pub references: Vec<IlType>,
}

impl IlModule {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            types: Vec::new(),
            references: Vec::new(),
        }
    }

    pub fn with_type(mut self, ty: IlType) -> Self {
        self.types.push(ty);
        self
    }

    pub fn with_reference(mut self, ty: IlType) -> Self {
        self.references.push(ty);
        self
    }

    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn type_index(&self, full_name: &str) -> Option<usize> {
        self.types.iter().position(|t| t.full_name == full_name)
    }

    /// A module type or a referenced type.
    pub fn find_type(&self, full_name: &str) -> Option<&IlType> {
        self.types
            .iter()
            .chain(&self.references)
            .find(|t| t.full_name == full_name)
    }

    /// Base types of `full_name`, nearest first, as far as they are known.
    pub fn base_chain(&self, full_name: &str) -> Vec<&IlType> {
        let mut chain: Vec<&IlType> = Vec::new();
        let mut current = self.find_type(full_name).and_then(|t| t.base.as_deref());
        while let Some(name) = current {
            let Some(ty) = self.find_type(name) else {
                break;
            };
            if chain.iter().any(|t| t.full_name == ty.full_name) {
                break;
            }
            chain.push(ty);
            current = ty.base.as_deref();
        }
        chain
    }

    /// Whether `full_name` is `ancestor` or derives from it.
    pub fn derives_from(&self, full_name: &str, ancestor: &str) -> bool {
        full_name == ancestor || self.base_chain(full_name).iter().any(|t| t.full_name == ancestor)
    }

    /// Module types ordered so every type comes after its module-local bases.
    pub fn base_first_order(&self) -> Vec<usize> {
        let mut order: Vec<usize> = Vec::with_capacity(self.types.len());
        let mut placed = vec![false; self.types.len()];
        for start in 0..self.types.len() {
            let mut pending = vec![start];
            let mut current = self.types[start].base.as_deref();
            while let Some(base) = current {
                match self.type_index(base) {
                    Some(index) if !placed[index] && !pending.contains(&index) => {
                        pending.push(index);
                        current = self.types[index].base.as_deref();
                    }
                    _ => break,
                }
            }
            for index in pending.into_iter().rev() {
                if !placed[index] {
                    placed[index] = true;
                    order.push(index);
                }
            }
        }
        order
    }
}

impl fmt::Display for MethodRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}::{}", self.return_type, self.declaring_type, self.name)?;
        if !self.generic_args.is_empty() {
            write!(f, "<{}>", self.generic_args.join(", "))?;
        }
        write!(f, "({})", self.params.join(", "))
    }
}

impl fmt::Display for FieldRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}::{}", self.ty, self.declaring_type, self.name)
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IL_{}", self.0)
    }
}

impl fmt::Display for Instr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instr::LoadThis => write!(f, "ldarg.0"),
            Instr::LoadNull => write!(f, "ldnull"),
            Instr::LoadStr(s) => write!(f, "ldstr {:?}", s),
            Instr::LoadInt(n) => write!(f, "ldc.i4 {}", n),
            Instr::LoadLocal(n) => write!(f, "ldloc {}", n),
            Instr::StoreLocal(n) => write!(f, "stloc {}", n),
            Instr::LoadField(field) => write!(f, "ldfld {}", field),
            Instr::StoreField(field) => write!(f, "stfld {}", field),
            Instr::Call(m) => write!(f, "call {}", m),
            Instr::CallVirt(m) => write!(f, "callvirt {}", m),
            Instr::BranchTrue(l) => write!(f, "brtrue {}", l),
            Instr::BranchFalse(l) => write!(f, "brfalse {}", l),
            Instr::Label(l) => write!(f, "{}:", l),
            Instr::Pop => write!(f, "pop"),
            Instr::Dup => write!(f, "dup"),
            Instr::Return => write!(f, "ret"),
        }
    }
}

//! Weave plans: what the weaver must add to one compiled type.
//!
//! Plans are computed from the symbol table with the same analysis the
//! linter uses, so a member the linter rejects never gets a plan entry.
//! They are plain data and serialize to JSON for hosts that weave in a
//! separate step.

use rivet_runtime::SingletonStrategy;
use serde::{Deserialize, Serialize};

use crate::codegen::inject::{injected_members, InjectCategory, InjectSource, InjectedMember};
use crate::codegen::injection::injection_methods;
use crate::codegen::roles::{self, Roles};
use crate::codegen::{per_member, MemberFailure};
use crate::config::CodegenConfig;
use crate::error::GenResult;
use crate::symbols::{SymbolId, SymbolTable};
use crate::syntax::names;
use crate::syntax::{Span, TypeKind, TypeRef};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegistryKind {
    Singleton,
    Tracked,
}

/// Register in `OnEnable`, unregister in `OnDisable`, under `key`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    pub kind: RegistryKind,
    /// The type itself or one of its role-carrying interfaces.
    pub key: String,
    /// Conflict strategy; singletons only.
    #[serde(default)]
    pub strategy: Option<SingletonStrategy>,
}

/// How an eagerly injected member is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Storage {
    Field,
    Setter,
    /// Get-only auto property, written through its backing field.
    AutoProperty,
}

/// An eager lookup run in the initialization method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InjectionPlan {
    pub member: String,
    pub storage: Storage,
    pub element_type: String,
    pub is_array: bool,
    pub source: InjectSource,
    pub include_inactive: bool,
    pub optional: bool,
    /// Attribute as written in messages, e.g. `[Inject.FromChildren]`.
    pub attribute: String,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccessorKind {
    Lazy,
    Singleton,
    Collection,
}

/// A getter whose body is replaced by a lookup on every read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessorPlan {
    pub property: String,
    pub kind: AccessorKind,
    pub element_type: String,
    pub is_array: bool,
    pub source: InjectSource,
    pub include_inactive: bool,
    pub span: Span,
}

/// A call from the initialization method to an `[Inject]` method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitCall {
    pub method: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypePlan {
    pub type_name: String,
    pub file: String,
    pub span: Span,
    #[serde(default)]
    pub registrations: Vec<Registration>,
    #[serde(default)]
    pub injections: Vec<InjectionPlan>,
    #[serde(default)]
    pub accessors: Vec<AccessorPlan>,
    #[serde(default)]
    pub init_calls: Vec<InitCall>,
    /// Execution order attribute to add when the type has none.
    #[serde(default)]
    pub execution_order: Option<i32>,
}

impl TypePlan {
    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
            && self.injections.is_empty()
            && self.accessors.is_empty()
            && self.init_calls.is_empty()
            && self.execution_order.is_none()
    }
}

/// Fully qualified name of `ty` when it resolves, else the name as written.
fn qualified(symbols: &SymbolTable<'_>, ty: &TypeRef, context: SymbolId) -> String {
    match symbols.resolve(ty, Some(context)) {
        Some(id) => symbols.full_name(id).to_string(),
        None => ty.to_string(),
    }
}

/// Compute the plan for one type. Members whose planning fails are left out
/// of the plan and returned alongside it.
pub fn plan_type(
    symbols: &SymbolTable<'_>,
    id: SymbolId,
    config: &CodegenConfig,
) -> (TypePlan, Vec<MemberFailure>) {
    let decl = symbols.decl(id);
    let mut plan = TypePlan {
        type_name: symbols.full_name(id).to_string(),
        file: symbols.file_path(id).to_string(),
        span: decl.header_span,
        registrations: Vec::new(),
        injections: Vec::new(),
        accessors: Vec::new(),
        init_calls: Vec::new(),
        execution_order: None,
    };
    if decl.kind != TypeKind::Class {
        return (plan, Vec::new());
    }

    plan_registrations(symbols, id, config, &mut plan);

    let injected: Vec<_> = injected_members(decl)
        .into_iter()
        .filter(|m| m.is_generatable(symbols, id))
        .collect();
    let (members, mut failures) = per_member(
        &injected,
        |m| (m.name().to_string(), m.member.span()),
        |m| plan_member(symbols, id, m),
    );
    for member in members {
        match member {
            MemberPlan::Injection(injection) => plan.injections.push(injection),
            MemberPlan::Accessor(accessor) => plan.accessors.push(accessor),
        }
    }

    let methods: Vec<_> = injection_methods(decl)
        .into_iter()
        .filter(|m| m.params.is_empty() && m.return_type.is_void() && !m.is_static())
        .collect();
    let (init_calls, init_failures) = per_member(
        &methods,
        |m| (m.name.clone(), m.span),
        |m| {
            Ok(InitCall {
                method: m.name.clone(),
                span: m.span,
            })
        },
    );
    plan.init_calls = init_calls;
    failures.extend(init_failures);

    tracing::trace!(
        ty = %plan.type_name,
        registrations = plan.registrations.len(),
        injections = plan.injections.len(),
        accessors = plan.accessors.len(),
        init_calls = plan.init_calls.len(),
        failures = failures.len(),
        "planned type"
    );
    (plan, failures)
}

fn plan_registrations(
    symbols: &SymbolTable<'_>,
    id: SymbolId,
    config: &CodegenConfig,
    plan: &mut TypePlan,
) {
    let decl = symbols.decl(id);
    let mut carried = Roles::empty();
    for role in [Roles::SINGLETON, Roles::TRACK] {
        if roles::carries_role(symbols, id, role) {
            carried |= role;
        }
    }
    if carried.is_empty() || !carried.is_exclusive() || !Roles::of(decl).is_exclusive() {
        return;
    }

    let (kind, role, strategy) = if carried.contains(Roles::SINGLETON) {
        let strategy = symbols
            .attribute(id, names::SINGLETON)
            .or_else(|| {
                symbols
                    .attribute_in_base_chain(id, names::SINGLETON)
                    .and_then(|base| symbols.attribute(base, names::SINGLETON))
            })
            .map(|attr| roles::resolve_strategy(attr, config.default_strategy()))
            .unwrap_or_else(|| config.default_strategy());
        if !strategy.is_valid() {
            return;
        }
        if !decl.is_abstract() && roles::execution_order(decl, &config.engine_namespace).is_none() {
            plan.execution_order = Some(config.singleton_execution_order);
        }
        (RegistryKind::Singleton, Roles::SINGLETON, Some(strategy))
    } else {
        (RegistryKind::Tracked, Roles::TRACK, None)
    };

    // An inherited singleton role registers the type alone; RV1004 reports
    // the interfaces it misses.
    let interfaces = if roles::registers_under_interfaces(symbols, id, role) {
        roles::role_interfaces(symbols, id, role)
    } else {
        Vec::new()
    };
    let keys = std::iter::once(id).chain(interfaces);
    for key in keys {
        plan.registrations.push(Registration {
            kind,
            key: symbols.full_name(key).to_string(),
            strategy,
        });
    }
}

enum MemberPlan {
    Injection(InjectionPlan),
    Accessor(AccessorPlan),
}

fn plan_member(
    symbols: &SymbolTable<'_>,
    owner: SymbolId,
    injected: &InjectedMember<'_>,
) -> GenResult<MemberPlan> {
    let options = injected.options;
    let element_type = qualified(symbols, &injected.element_type(), owner);
    let is_array = injected.declared_type().is_array();
    let accessor = |kind| {
        MemberPlan::Accessor(AccessorPlan {
            property: injected.name().to_string(),
            kind,
            element_type: element_type.clone(),
            is_array,
            source: options.source,
            include_inactive: options.include_inactive,
            span: injected.member.span(),
        })
    };
    let planned = match options.category() {
        InjectCategory::Eager => {
            let shape = injected.shape();
            let storage = if shape.is_field {
                Storage::Field
            } else if shape.has_setter {
                Storage::Setter
            } else {
                Storage::AutoProperty
            };
            MemberPlan::Injection(InjectionPlan {
                member: injected.name().to_string(),
                storage,
                element_type: element_type.clone(),
                is_array,
                source: options.source,
                include_inactive: options.include_inactive,
                optional: options.optional,
                attribute: format!("[{}]", options.attribute_name()),
                span: injected.member.span(),
            })
        }
        InjectCategory::Lazy => accessor(AccessorKind::Lazy),
        InjectCategory::Singleton => accessor(AccessorKind::Singleton),
        InjectCategory::Collection => accessor(AccessorKind::Collection),
    };
    Ok(planned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::build::{behaviour, game, inject_method, interface, lookup};
    use crate::syntax::{Attribute, Expression, FieldDecl, PropertyDecl};

    fn plan(types: Vec<crate::syntax::TypeDecl>, name: &str) -> TypePlan {
        let c = game(types);
        let symbols = SymbolTable::new(&c, "UnityEngine");
        let id = symbols.lookup(name).unwrap();
        let (plan, failures) = plan_type(&symbols, id, &CodegenConfig::default());
        assert!(failures.is_empty(), "{:?}", failures);
        plan
    }

    #[test]
    fn test_tracked_registers_self_and_role_interfaces() {
        let p = plan(
            vec![
                interface("IDamageable").with_attr(Attribute::new("Track")),
                interface("IPlain"),
                behaviour("Crate")
                    .with_attr(Attribute::new("Track"))
                    .implements("IDamageable")
                    .implements("IPlain"),
            ],
            "Game.Crate",
        );
        let keys: Vec<_> = p.registrations.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["Game.Crate", "Game.IDamageable"]);
        assert!(p.registrations.iter().all(|r| r.kind == RegistryKind::Tracked));
        assert_eq!(p.execution_order, None);
    }

    #[test]
    fn test_singleton_strategy_and_order() {
        let strategy = Expression::ident("SingletonStrategy")
            .member("KeepExisting")
            .binary(
                crate::syntax::BinaryOp::BitOr,
                Expression::ident("SingletonStrategy").member("LogError"),
            );
        let p = plan(
            vec![behaviour("Audio").with_attr(Attribute::new("Singleton").with_arg(strategy))],
            "Game.Audio",
        );
        assert_eq!(p.execution_order, Some(-1));
        assert_eq!(
            p.registrations[0].strategy,
            Some(SingletonStrategy::KEEP_EXISTING | SingletonStrategy::LOG_ERROR)
        );
    }

    #[test]
    fn test_both_roles_plan_nothing() {
        let p = plan(
            vec![behaviour("Both")
                .with_attr(Attribute::new("Singleton"))
                .with_attr(Attribute::new("Track"))],
            "Game.Both",
        );
        assert!(p.registrations.is_empty());
        assert!(p.execution_order.is_none());
    }

    #[test]
    fn test_members_by_category() {
        let p = plan(
            vec![
                behaviour("Enemy").with_attr(Attribute::new("Track")),
                behaviour("Turret")
                    .with_member(
                        FieldDecl::new("body", "Rigidbody").with_attr(Attribute::new("Inject")),
                    )
                    .with_member(
                        PropertyDecl::new("Parts", TypeRef::array_of("Collider".into()))
                            .get_only()
                            .with_attr(Attribute::new("Inject.FromChildren.Lazy")),
                    )
                    .with_member(
                        PropertyDecl::new("Targets", TypeRef::array_of("Enemy".into()))
                            .get_only()
                            .with_attr(Attribute::new("Inject.All")),
                    )
                    .with_member(inject_method(
                        "Awake",
                        vec![Expression::ident("Anim")
                            .assign(lookup("GetComponent", "Animator"))
                            .stmt()],
                    )),
            ],
            "Game.Turret",
        );
        assert_eq!(p.injections.len(), 1);
        assert_eq!(p.injections[0].storage, Storage::Field);
        assert_eq!(p.injections[0].element_type, "UnityEngine.Rigidbody");
        assert_eq!(p.injections[0].attribute, "[Inject]");
        let kinds: Vec<_> = p.accessors.iter().map(|a| (a.property.as_str(), a.kind)).collect();
        assert_eq!(
            kinds,
            vec![("Parts", AccessorKind::Lazy), ("Targets", AccessorKind::Collection)]
        );
        assert_eq!(p.accessors[1].element_type, "Game.Enemy");
        assert_eq!(p.init_calls[0].method, "Awake");
    }

    #[test]
    fn test_inherited_singleton_skips_interfaces_it_is_warned_about() {
        let types = vec![
            interface("IAudio").with_attr(Attribute::new("Singleton")),
            behaviour("AudioBase").with_attr(Attribute::new("Singleton")),
            behaviour("Audio").extends("AudioBase").implements("IAudio"),
        ];
        let c = game(types.clone());
        let diags = crate::linter::Linter::new()
            .lint_compilation(&c, &CodegenConfig::default())
            .diagnostics;
        assert_eq!(diags.iter().filter(|d| d.code == "RV1004").count(), 1, "{:?}", diags);

        let p = plan(types, "Game.Audio");
        let keys: Vec<_> = p.registrations.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["Game.Audio"]);
    }

    #[test]
    fn test_inherited_track_registers_interfaces() {
        let p = plan(
            vec![
                interface("IDamageable").with_attr(Attribute::new("Track")),
                behaviour("Unit").with_attr(Attribute::new("Track")),
                behaviour("Soldier").extends("Unit").implements("IDamageable"),
            ],
            "Game.Soldier",
        );
        let keys: Vec<_> = p.registrations.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["Game.Soldier", "Game.IDamageable"]);
    }

    #[test]
    fn test_failing_member_leaves_siblings_planned() {
        let c = game(vec![behaviour("Turret")
            .with_member(FieldDecl::new("body", "Rigidbody").with_attr(Attribute::new("Inject")))
            .with_member(FieldDecl::new("anim", "Animator").with_attr(Attribute::new("Inject")))
            .with_member(FieldDecl::new("hit", "Collider").with_attr(Attribute::new("Inject")))]);
        let symbols = SymbolTable::new(&c, "UnityEngine");
        let id = symbols.lookup("Game.Turret").unwrap();
        let injected = injected_members(symbols.decl(id));
        let (planned, failures) = per_member(
            &injected,
            |m| (m.name().to_string(), m.member.span()),
            |m| {
                if m.name() == "anim" {
                    panic!("lookup table corrupted");
                }
                plan_member(&symbols, id, m)
            },
        );
        let names: Vec<_> = planned
            .iter()
            .map(|p| match p {
                MemberPlan::Injection(i) => i.member.as_str(),
                MemberPlan::Accessor(a) => a.property.as_str(),
            })
            .collect();
        assert_eq!(names, vec!["body", "hit"]);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].member, "anim");
        assert_eq!(failures[0].error, "lookup table corrupted");
    }

    #[test]
    fn test_untracked_collection_not_planned() {
        let p = plan(
            vec![
                behaviour("Enemy"),
                behaviour("Radar").with_member(
                    PropertyDecl::new("Enemies", crate::syntax::TypeRef::array_of("Enemy".into()))
                        .get_only()
                        .with_attr(Attribute::new("Inject.All")),
                ),
            ],
            "Game.Radar",
        );
        assert!(p.accessors.is_empty());
        assert!(p.is_empty());
    }
}

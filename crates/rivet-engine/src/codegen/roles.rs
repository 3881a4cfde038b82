//! Registration roles (`[Singleton]`, `[Track]`) and singleton strategies.

use bitflags::bitflags;
use rivet_runtime::SingletonStrategy;
use serde::{Deserialize, Serialize};

use crate::symbols::{SymbolId, SymbolTable};
use crate::syntax::names;
use crate::syntax::{Attribute, BinaryOp, Expression, Span, TypeDecl, TypeRef};

bitflags! {
    /// Registration roles carried by a type.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct Roles: u8 {
        const SINGLETON = 1 << 0;
        const TRACK = 1 << 1;
    }
}

impl Roles {
    /// Roles declared directly on `decl`.
    pub fn of(decl: &TypeDecl) -> Self {
        let mut roles = Roles::empty();
        if decl.has_attribute(names::SINGLETON) {
            roles |= Roles::SINGLETON;
        }
        if decl.has_attribute(names::TRACK) {
            roles |= Roles::TRACK;
        }
        roles
    }

    /// Attribute name of a single role.
    pub fn attribute_name(self) -> &'static str {
        if self == Roles::SINGLETON {
            names::SINGLETON
        } else {
            names::TRACK
        }
    }

    /// Whether the combination is usable (at most one role).
    pub fn is_exclusive(self) -> bool {
        self != Roles::all()
    }
}

/// Interfaces of `id` (declared, and the interfaces those extend) that carry `role`.
pub fn role_interfaces(symbols: &SymbolTable<'_>, id: SymbolId, role: Roles) -> Vec<SymbolId> {
    symbols
        .interfaces_of(id)
        .into_iter()
        .filter(|&iface| symbols.has_attribute(iface, role.attribute_name()))
        .collect()
}

/// Whether `id` carries `role` itself or through a base class.
pub fn carries_role(symbols: &SymbolTable<'_>, id: SymbolId, role: Roles) -> bool {
    symbols.has_attribute(id, role.attribute_name())
        || symbols.attribute_in_base_chain(id, role.attribute_name()).is_some()
}

/// Whether instances of `id` register under its `role` interfaces. The role
/// must be declared on `id` itself, except that a `[Track]` base class is
/// enough for tracked interfaces.
pub fn registers_under_interfaces(symbols: &SymbolTable<'_>, id: SymbolId, role: Roles) -> bool {
    let attr = role.attribute_name();
    symbols.has_attribute(id, attr)
        || (role == Roles::TRACK && symbols.attribute_in_base_chain(id, attr).is_some())
}

/// Whether a type named in a registry lookup can be found in the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleTarget {
    Registered(SymbolId),
    /// Unresolved, or resolved without the role.
    MissingRole,
    /// An engine type, which can never carry the role.
    EngineType,
}

pub fn role_target(
    symbols: &SymbolTable<'_>,
    ty: &TypeRef,
    context: SymbolId,
    role: Roles,
) -> RoleTarget {
    match symbols.resolve(ty, Some(context)) {
        Some(id) if carries_role(symbols, id, role) => RoleTarget::Registered(id),
        Some(id) if symbols.is_engine_type(id) => RoleTarget::EngineType,
        None if symbols.is_engine_name(&ty.name) => RoleTarget::EngineType,
        _ => RoleTarget::MissingRole,
    }
}

/// A strategy flag name as written, with its location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StrategyToken<'a> {
    pub name: &'a str,
    pub span: Span,
}

/// The strategy argument of a `[Singleton]` attribute.
pub fn strategy_argument(attr: &Attribute) -> Option<&Expression> {
    attr.named(names::STRATEGY_ARG).or_else(|| attr.positional(0))
}

/// Flag names of a strategy expression in source order:
/// `SingletonStrategy.Replace | SingletonStrategy.LogError` yields
/// `Replace`, `LogError`.
pub fn strategy_tokens(expr: &Expression) -> Vec<StrategyToken<'_>> {
    let mut out = Vec::new();
    collect_tokens(expr, &mut out);
    out
}

fn collect_tokens<'a>(expr: &'a Expression, out: &mut Vec<StrategyToken<'a>>) {
    match expr {
        Expression::Binary(b) if b.op == BinaryOp::BitOr => {
            collect_tokens(&b.left, out);
            collect_tokens(&b.right, out);
        }
        Expression::Member(m) => out.push(StrategyToken {
            name: &m.name,
            span: m.span,
        }),
        Expression::Identifier(id) => out.push(StrategyToken {
            name: &id.name,
            span: id.span,
        }),
        _ => {}
    }
}

/// Flag names in first-seen order, without duplicates.
pub fn unique_flag_names<'a>(tokens: &[StrategyToken<'a>]) -> Vec<&'a str> {
    let mut names: Vec<&'a str> = Vec::new();
    for token in tokens {
        if !names.contains(&token.name) {
            names.push(token.name);
        }
    }
    names
}

/// Flags named in the tokens; unknown names are ignored.
pub fn strategy_from_tokens(tokens: &[StrategyToken<'_>]) -> SingletonStrategy {
    tokens
        .iter()
        .filter_map(|t| SingletonStrategy::from_source_name(t.name))
        .fold(SingletonStrategy::empty(), |acc, flag| acc | flag)
}

/// Conflicting flag names of a strategy expression in first-seen order, each once.
pub fn conflicting_names<'a>(tokens: &[StrategyToken<'a>]) -> Vec<&'a str> {
    let bad = strategy_from_tokens(tokens).conflicting_flags();
    unique_flag_names(tokens)
        .into_iter()
        .filter(|name| {
            SingletonStrategy::from_source_name(name).is_some_and(|flag| bad.contains(flag))
        })
        .collect()
}

/// Strategy of a `[Singleton]` attribute, falling back to `default`.
pub fn resolve_strategy(attr: &Attribute, default: SingletonStrategy) -> SingletonStrategy {
    match strategy_argument(attr) {
        Some(expr) => {
            let flags = strategy_from_tokens(&strategy_tokens(expr));
            if flags.is_empty() {
                default
            } else {
                flags
            }
        }
        None => default,
    }
}

/// Explicit execution order of `decl`, if it carries the engine attribute.
pub fn execution_order(decl: &TypeDecl, engine_namespace: &str) -> Option<i64> {
    decl.attributes
        .iter()
        .find(|a| names::is_execution_order(&a.canonical_name(), engine_namespace))
        .map(|a| a.positional(0).and_then(Expression::as_int).unwrap_or(0))
}

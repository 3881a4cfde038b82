//! Recognised lookup calls: component queries and registry accessors.

use crate::syntax::names;
use crate::syntax::{Expression, Invocation, TypeRef};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LookupKind {
    Component,
    ComponentInChildren,
    ComponentInParent,
    Components,
    ComponentsInChildren,
    ComponentsInParent,
    /// `Find.Singleton<T>()`
    FindSingleton,
    /// `Find.Instances<T>()`
    FindInstances,
}

const COMPONENT_LOOKUPS: &[(&str, LookupKind)] = &[
    ("GetComponent", LookupKind::Component),
    ("GetComponentInChildren", LookupKind::ComponentInChildren),
    ("GetComponentInParent", LookupKind::ComponentInParent),
    ("GetComponents", LookupKind::Components),
    ("GetComponentsInChildren", LookupKind::ComponentsInChildren),
    ("GetComponentsInParent", LookupKind::ComponentsInParent),
];

impl LookupKind {
    pub fn method_name(self) -> &'static str {
        match self {
            LookupKind::FindSingleton => names::FIND_SINGLETON,
            LookupKind::FindInstances => names::FIND_INSTANCES,
            kind => COMPONENT_LOOKUPS
                .iter()
                .find(|(_, k)| *k == kind)
                .map(|(name, _)| *name)
                .unwrap_or("GetComponent"),
        }
    }

    pub fn returns_array(self) -> bool {
        matches!(
            self,
            LookupKind::Components
                | LookupKind::ComponentsInChildren
                | LookupKind::ComponentsInParent
                | LookupKind::FindInstances
        )
    }

    /// The enumerating counterpart of an array-allocating lookup.
    pub fn non_allocating(self) -> Option<&'static str> {
        match self {
            LookupKind::Components => Some("EnumerateComponents"),
            LookupKind::ComponentsInChildren => Some("EnumerateComponentsInChildren"),
            LookupKind::ComponentsInParent => Some("EnumerateComponentsInParent"),
            _ => None,
        }
    }

    pub fn is_component_lookup(self) -> bool {
        !matches!(self, LookupKind::FindSingleton | LookupKind::FindInstances)
    }
}

/// A recognised lookup call.
#[derive(Debug, Clone, Copy)]
pub struct LookupCall<'a> {
    pub kind: LookupKind,
    pub call: &'a Invocation,
    pub type_arg: Option<&'a TypeRef>,
}

impl LookupCall<'_> {
    /// Type of the call's result: the host's semantic type when present,
    /// otherwise derived from the type argument.
    pub fn result_type(&self) -> Option<TypeRef> {
        if let Some(ty) = &self.call.return_type {
            return Some(ty.clone());
        }
        let element = self.type_arg?.clone();
        Some(if self.kind.returns_array() {
            TypeRef::array_of(element)
        } else {
            element
        })
    }
}

/// Classify `expr` as a lookup call.
pub fn classify(expr: &Expression) -> Option<LookupCall<'_>> {
    let call = expr.as_invocation()?;
    let name = call.method_name()?;
    let kind = match name {
        names::FIND_SINGLETON | names::FIND_INSTANCES => {
            if !is_find_receiver(call.receiver()?) {
                return None;
            }
            if name == names::FIND_SINGLETON {
                LookupKind::FindSingleton
            } else {
                LookupKind::FindInstances
            }
        }
        _ => COMPONENT_LOOKUPS.iter().find(|(n, _)| *n == name)?.1,
    };
    Some(LookupCall {
        kind,
        call,
        type_arg: call.type_args.first(),
    })
}

fn is_find_receiver(expr: &Expression) -> bool {
    match expr {
        Expression::Identifier(id) => id.name == names::FIND,
        Expression::Member(m) => m.name == names::FIND,
        _ => false,
    }
}

/// Whether `expr` is the `.Optional()` marker call.
pub fn is_optional_marker(expr: &Expression) -> bool {
    expr.as_invocation().is_some_and(|call| {
        call.method_name() == Some(names::OPTIONAL_MARKER)
            && call.args.is_empty()
            && call.type_args.is_empty()
            && call.receiver().is_some()
    })
}

/// Strip a trailing `.Optional()` marker: `(inner, true)` if present.
pub fn strip_optional(expr: &Expression) -> (&Expression, bool) {
    if is_optional_marker(expr) {
        if let Some(inner) = expr.as_invocation().and_then(Invocation::receiver) {
            return (inner, true);
        }
    }
    (expr, false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generic(callee: Expression, ty: &str) -> Expression {
        callee.call_generic(vec![TypeRef::named(ty)], vec![])
    }

    #[test]
    fn test_classify_component_lookups() {
        let call = generic(Expression::ident("GetComponentsInChildren"), "Collider");
        let lookup = classify(&call).unwrap();
        assert_eq!(lookup.kind, LookupKind::ComponentsInChildren);
        assert_eq!(lookup.result_type().unwrap().to_string(), "Collider[]");
        assert_eq!(lookup.kind.non_allocating(), Some("EnumerateComponentsInChildren"));
    }

    #[test]
    fn test_classify_find_requires_receiver() {
        let find = generic(Expression::ident("Find").member("Singleton"), "GameManager");
        assert_eq!(classify(&find).unwrap().kind, LookupKind::FindSingleton);
        let qualified = generic(
            Expression::ident("Rivet").member("Find").member("Instances"),
            "Enemy",
        );
        assert_eq!(classify(&qualified).unwrap().kind, LookupKind::FindInstances);
        let other = generic(Expression::ident("Registry").member("Singleton"), "GameManager");
        assert!(classify(&other).is_none());
    }

    #[test]
    fn test_strip_optional() {
        let inner = generic(Expression::ident("GetComponent"), "Animator");
        let marked = inner.clone().member("Optional").call(vec![]);
        let (stripped, optional) = strip_optional(&marked);
        assert!(optional);
        assert_eq!(stripped, &inner);
        let (same, optional) = strip_optional(&inner);
        assert!(!optional);
        assert_eq!(same, &inner);
    }
}

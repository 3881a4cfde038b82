//! Well-known names and attribute-name normalization.
//!
//! Attributes are matched by canonical name: the optional `global::` and
//! `Rivet.` prefixes are dropped and every segment loses its `Attribute`
//! suffix, so `Rivet.InjectAttribute.FromChildrenAttribute` and
//! `Inject.FromChildren` are the same attribute.

pub const INJECT: &str = "Inject";
pub const SINGLETON: &str = "Singleton";
pub const TRACK: &str = "Track";
pub const UNION_HEADER: &str = "UnionHeader";
pub const UNION: &str = "Union";
/// Engine attribute; matched with and without the engine namespace.
pub const EXECUTION_ORDER: &str = "DefaultExecutionOrder";

/// The base type every injectable component derives from (engine-relative).
pub const COMPONENT: &str = "Component";

/// Conventional names inside a union header.
pub const TYPE_ID_FIELD: &str = "TypeId";
pub const TYPE_IDS_ENUM: &str = "TypeIds";

/// Registry lookup entry points: `Find.Singleton<T>()`, `Find.Instances<T>()`.
pub const FIND: &str = "Find";
pub const FIND_SINGLETON: &str = "Singleton";
pub const FIND_INSTANCES: &str = "Instances";

/// Marker call that makes an injected assignment optional.
pub const OPTIONAL_MARKER: &str = "Optional";

/// Strategy argument of `[Singleton]`.
pub const STRATEGY_ARG: &str = "Strategy";

/// Attribute prefixes that make a declaration a generation candidate.
pub const CANDIDATE_ROOTS: &[&str] = &[INJECT, SINGLETON, TRACK, UNION_HEADER, UNION];

pub fn normalize_attribute_name(name: &str) -> String {
    let name = name.strip_prefix("global::").unwrap_or(name);
    let name = name.strip_prefix("Rivet.").unwrap_or(name);
    name.split('.')
        .map(|segment| match segment.strip_suffix("Attribute") {
            Some(stem) if !stem.is_empty() => stem,
            _ => segment,
        })
        .collect::<Vec<_>>()
        .join(".")
}

/// First segment of a canonical attribute name (`Inject` for `Inject.Lazy`).
pub fn root_segment(canonical: &str) -> &str {
    canonical.split('.').next().unwrap_or(canonical)
}

pub fn last_segment(name: &str) -> &str {
    name.rsplit('.').next().unwrap_or(name)
}

/// Whether `canonical` names the engine's execution-order attribute.
pub fn is_execution_order(canonical: &str, engine_namespace: &str) -> bool {
    canonical == EXECUTION_ORDER
        || canonical
            .strip_prefix(engine_namespace)
            .and_then(|rest| rest.strip_prefix('.'))
            == Some(EXECUTION_ORDER)
}

/// Join a namespace and a name.
pub fn qualify(namespace: &str, name: &str) -> String {
    if namespace.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", namespace, name)
    }
}

//! Rule registry: all available lint rules.

pub mod cache_component;
pub mod conflicting_strategy_flags;
pub mod exclusive_roles;
pub mod include_inactive_ignored;
pub mod inject_requires_component;
pub mod injection_type_unknown;
pub mod invalid_injection_shape;
pub mod must_be_partial;
pub mod optional_outside_injection;
pub mod prefer_non_allocating;
pub mod requires_role;
pub mod role_interface_propagation;
pub mod static_injection;
pub mod union_header;
pub mod union_interface_without_variant;
pub mod union_invalid_id;
pub mod union_not_value_type;
pub mod union_variant;

use super::rule::{Category, LintDiagnostic, LintRule, RuleMeta, Severity};
use crate::syntax::Span;

/// Reported by the generator when transforming one unit fails. Not a
/// rule: it is never disabled or re-graded by configuration.
pub static INTERNAL_ERROR: RuleMeta = RuleMeta {
    name: "internal-error",
    code: "RV9001",
    description: "The generator failed while transforming a declaration",
    category: Category::Correctness,
    default_severity: Severity::Error,
    fixable: false,
};

/// An internal-error diagnostic carrying the failure text.
pub fn internal_error(
    file: &str,
    span: Span,
    subject: &str,
    error: impl std::fmt::Display,
) -> LintDiagnostic {
    LintDiagnostic::new(
        &INTERNAL_ERROR,
        file,
        span,
        format!("Code generation failed for '{}': {}", subject, error),
    )
}

/// Returns all available lint rules with their default configuration.
pub fn all_rules() -> Vec<Box<dyn LintRule>> {
    vec![
        // Roles
        Box::new(requires_role::SingletonRequiresAttribute),
        Box::new(requires_role::TrackedRequiresAttribute),
        Box::new(exclusive_roles::ExclusiveRoles),
        Box::new(role_interface_propagation::RoleInterfacePropagation),
        Box::new(conflicting_strategy_flags::ConflictingStrategyFlags),
        Box::new(must_be_partial::MustBePartial),
        Box::new(inject_requires_component::InjectRequiresComponent),
        // Injection
        Box::new(invalid_injection_shape::InvalidInjectionShape),
        Box::new(include_inactive_ignored::IncludeInactiveIgnored),
        Box::new(optional_outside_injection::OptionalOutsideInjection),
        Box::new(injection_type_unknown::InjectionTypeUnknown),
        Box::new(static_injection::StaticInjection),
        // Unions
        Box::new(union_header::MissingInterface),
        Box::new(union_header::MissingTypeId),
        Box::new(union_variant::MissingHeader),
        Box::new(union_variant::HeaderNotFirst),
        Box::new(union_variant::MissingVariantInterface),
        Box::new(union_interface_without_variant::UnionInterfaceWithoutVariant),
        Box::new(union_invalid_id::UnionInvalidId),
        Box::new(union_not_value_type::UnionNotValueType),
        // Performance
        Box::new(prefer_non_allocating::PreferNonAllocating),
        // Refactoring
        Box::new(cache_component::CacheInNewInjectionMethod),
        Box::new(cache_component::CacheInInjectionMethod),
        Box::new(cache_component::ReuseCachedComponent),
    ]
}

//! Rules: singleton-requires-attribute (RV1001), tracked-requires-attribute (RV1002)
//!
//! `Find.Singleton<T>()` and `[Inject.Single]` read the singleton registry
//! of `T`; `Find.Instances<T>()` and `[Inject.All]` read its tracked
//! registry. Nothing is ever registered there unless `T` carries the role.

use crate::codegen::inject::{injected_member, InjectSource};
use crate::codegen::lookup::{self, LookupKind};
use crate::codegen::roles::{role_target, RoleTarget, Roles};
use crate::linter::rule::*;
use crate::symbols::SymbolId;
use crate::syntax::{Expression, Member, Span, TypeRef};

pub struct SingletonRequiresAttribute;
pub struct TrackedRequiresAttribute;

static SINGLETON_META: RuleMeta = RuleMeta {
    name: "singleton-requires-attribute",
    code: "RV1001",
    description: "Singleton lookups require the target type to be marked [Singleton]",
    category: Category::Correctness,
    default_severity: Severity::Error,
    fixable: false,
};

static TRACKED_META: RuleMeta = RuleMeta {
    name: "tracked-requires-attribute",
    code: "RV1002",
    description: "Instance lookups require the target type to be marked [Track]",
    category: Category::Correctness,
    default_severity: Severity::Error,
    fixable: false,
};

fn check_target(
    meta: &RuleMeta,
    role: Roles,
    usage: &str,
    ty: &TypeRef,
    context: SymbolId,
    span: Span,
    ctx: &LintContext<'_>,
) -> Vec<LintDiagnostic> {
    let attr = role.attribute_name();
    let message = match role_target(ctx.symbols, ty, context, role) {
        RoleTarget::Registered(_) => return vec![],
        RoleTarget::EngineType => format!(
            "'{}' is an engine type and can never be marked [{}]; derive a class from it, mark that class [{}] and use it with {}",
            ty, attr, attr, usage
        ),
        RoleTarget::MissingRole => {
            format!("'{}' is used with {} but is not marked [{}]", ty, usage, attr)
        }
    };
    vec![LintDiagnostic::new(meta, ctx.file_path, span, message)]
}

fn check_find(
    meta: &RuleMeta,
    kind: LookupKind,
    role: Roles,
    expr: &Expression,
    scope: &BodyScope<'_>,
    ctx: &LintContext<'_>,
) -> Vec<LintDiagnostic> {
    let Some(call) = lookup::classify(expr).filter(|c| c.kind == kind) else {
        return vec![];
    };
    let Some(ty) = call.type_arg else {
        return vec![];
    };
    let usage = format!("Find.{}", kind.method_name());
    check_target(meta, role, &usage, ty, scope.owner, call.call.span, ctx)
}

fn check_injected(
    meta: &RuleMeta,
    source: InjectSource,
    role: Roles,
    owner: SymbolId,
    member: &Member,
    ctx: &LintContext<'_>,
) -> Vec<LintDiagnostic> {
    match injected_member(member) {
        Some(m) if m.options.source == source => {
            let usage = format!("[{}]", m.options.attribute_name());
            check_target(meta, role, &usage, &m.element_type(), owner, member.span(), ctx)
        }
        _ => vec![],
    }
}

impl LintRule for SingletonRequiresAttribute {
    fn meta(&self) -> &RuleMeta {
        &SINGLETON_META
    }

    fn check_member(
        &self,
        owner: SymbolId,
        member: &Member,
        ctx: &LintContext<'_>,
    ) -> Vec<LintDiagnostic> {
        check_injected(&SINGLETON_META, InjectSource::Single, Roles::SINGLETON, owner, member, ctx)
    }

    fn check_expression(
        &self,
        expr: &Expression,
        scope: &BodyScope<'_>,
        ctx: &LintContext<'_>,
    ) -> Vec<LintDiagnostic> {
        check_find(&SINGLETON_META, LookupKind::FindSingleton, Roles::SINGLETON, expr, scope, ctx)
    }
}

impl LintRule for TrackedRequiresAttribute {
    fn meta(&self) -> &RuleMeta {
        &TRACKED_META
    }

    fn check_member(
        &self,
        owner: SymbolId,
        member: &Member,
        ctx: &LintContext<'_>,
    ) -> Vec<LintDiagnostic> {
        check_injected(&TRACKED_META, InjectSource::All, Roles::TRACK, owner, member, ctx)
    }

    fn check_expression(
        &self,
        expr: &Expression,
        scope: &BodyScope<'_>,
        ctx: &LintContext<'_>,
    ) -> Vec<LintDiagnostic> {
        check_find(&TRACKED_META, LookupKind::FindInstances, Roles::TRACK, expr, scope, ctx)
    }
}

#[cfg(test)]
mod tests {
    use crate::config::CodegenConfig;
    use crate::linter::rule::LintDiagnostic;
    use crate::linter::Linter;
    use crate::syntax::build::{behaviour, find, game, interface, method};
    use crate::syntax::{Attribute, PropertyDecl, TypeDecl, TypeRef};

    fn lint(types: Vec<TypeDecl>) -> Vec<LintDiagnostic> {
        Linter::new()
            .lint_compilation(&game(types), &CodegenConfig::default())
            .diagnostics
    }

    fn has_rule(diags: &[LintDiagnostic], code: &str) -> bool {
        diags.iter().any(|d| d.code == code)
    }

    fn uses(call: crate::syntax::Expression) -> TypeDecl {
        behaviour("Hud").with_member(method("Update", vec![call.stmt()]))
    }

    #[test]
    fn test_find_singleton_without_attribute() {
        let diags = lint(vec![behaviour("GameManager"), uses(find("Singleton", "GameManager"))]);
        let d = diags.iter().find(|d| d.code == "RV1001").expect("RV1001");
        assert_eq!(
            d.message,
            "'GameManager' is used with Find.Singleton but is not marked [Singleton]"
        );
    }

    #[test]
    fn test_find_singleton_with_attribute_ok() {
        let diags = lint(vec![
            behaviour("GameManager").with_attr(Attribute::new("Singleton")),
            uses(find("Singleton", "GameManager")),
        ]);
        assert!(!has_rule(&diags, "RV1001"), "got: {:?}", diags);
    }

    #[test]
    fn test_singleton_interface_ok() {
        let diags = lint(vec![
            interface("IScore").with_attr(Attribute::new("Singleton")),
            uses(find("Singleton", "IScore")),
        ]);
        assert!(!has_rule(&diags, "RV1001"), "got: {:?}", diags);
    }

    #[test]
    fn test_engine_type_gets_specialized_message() {
        let diags = lint(vec![uses(find("Singleton", "Camera"))]);
        let d = diags.iter().find(|d| d.code == "RV1001").expect("RV1001");
        assert!(d.message.contains("engine type"), "got: {}", d.message);
    }

    #[test]
    fn test_find_instances_tracked_through_base() {
        let diags = lint(vec![
            behaviour("Enemy").with_attr(Attribute::new("Track")),
            behaviour("Boss").extends("Enemy"),
            uses(find("Instances", "Boss")),
        ]);
        assert!(!has_rule(&diags, "RV1002"), "got: {:?}", diags);
    }

    #[test]
    fn test_inject_all_without_track() {
        let diags = lint(vec![
            behaviour("Enemy"),
            behaviour("Radar").with_member(
                PropertyDecl::new("Enemies", TypeRef::array_of("Enemy".into()))
                    .get_only()
                    .with_attr(Attribute::new("Inject.All")),
            ),
        ]);
        let d = diags.iter().find(|d| d.code == "RV1002").expect("RV1002");
        assert_eq!(d.message, "'Enemy' is used with [Inject.All] but is not marked [Track]");
    }
}

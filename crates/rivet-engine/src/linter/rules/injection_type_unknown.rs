//! Rule: injection-type-unknown (RV2004)
//!
//! A member declared by an injection method takes the type of the value
//! assigned to it. When that cannot be worked out no member is generated.

use crate::codegen::injection;
use crate::linter::rule::*;

pub struct InjectionTypeUnknown;

static META: RuleMeta = RuleMeta {
    name: "injection-type-unknown",
    code: "RV2004",
    description: "Members declared in [Inject] methods need an inferable type",
    category: Category::Correctness,
    default_severity: Severity::Error,
    fixable: false,
};

impl LintRule for InjectionTypeUnknown {
    fn meta(&self) -> &RuleMeta {
        &META
    }

    fn check_body(&self, scope: &BodyScope<'_>, ctx: &LintContext<'_>) -> Vec<LintDiagnostic> {
        let Some(method) = scope.method.filter(|_| scope.is_injection_method) else {
            return vec![];
        };
        let decl = ctx.symbols.decl(scope.owner);
        injection::assignments(decl, method)
            .into_iter()
            .filter(|a| a.inferred_type().is_none())
            .map(|a| {
                LintDiagnostic::new(
                    &META,
                    ctx.file_path,
                    a.span,
                    format!(
                        "Cannot infer the type of '{}' from '{}'; assign a typed lookup such as GetComponent<T>()",
                        a.name,
                        a.value_text()
                    ),
                )
            })
            .collect()
    }
}
